pub mod ser_b64;

pub use ser_b64::{from_base64, to_base64, FromBase64Error};
