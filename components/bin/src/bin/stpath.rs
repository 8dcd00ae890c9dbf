#![deny(trivial_numeric_casts)]
#![allow(
    clippy::too_many_arguments,
    clippy::implicit_hasher,
    clippy::module_inception,
    clippy::new_without_default
)]

#[macro_use]
extern crate log;

use std::io;

use structopt::StructOpt;

use bin::stpath::{stpath, PathBinError, StPathCmd};

fn run() -> Result<(), PathBinError> {
    env_logger::init();

    let st_path_cmd = StPathCmd::from_args();
    stpath(st_path_cmd, &mut io::stdout())
}

fn main() {
    if let Err(e) = run() {
        error!("run() error: {:?}", e);
        std::process::exit(-1);
    }
}
