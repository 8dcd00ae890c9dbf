#![deny(trivial_numeric_casts)]
#![allow(
    clippy::too_many_arguments,
    clippy::implicit_hasher,
    clippy::module_inception
)]

pub mod hash;
pub mod identity;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CryptoError;

impl ::std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        f.write_str("crypto error")
    }
}

impl ::std::error::Error for CryptoError {}

impl From<ed25519_dalek::SignatureError> for CryptoError {
    fn from(_: ed25519_dalek::SignatureError) -> CryptoError {
        CryptoError
    }
}
