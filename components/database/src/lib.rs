#![crate_type = "lib"]
#![deny(trivial_numeric_casts)]
#![allow(
    clippy::too_many_arguments,
    clippy::implicit_hasher,
    clippy::module_inception,
    clippy::new_without_default
)]

#[macro_use]
extern crate log;

mod fee_store;
mod mem_store;
mod sqlite_store;

pub use self::fee_store::{FeeRateStore, FeeStoreError};
pub use self::mem_store::MemFeeRateStore;
pub use self::sqlite_store::SqliteFeeRateStore;
