#![deny(trivial_numeric_casts)]
#![allow(
    clippy::too_many_arguments,
    clippy::implicit_hasher,
    clippy::module_inception,
    clippy::new_without_default
)]

pub mod balance;
pub mod chain;
pub mod consts;
pub mod crypto;
pub mod fee;
pub mod path;
