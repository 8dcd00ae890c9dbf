use std::convert::TryFrom;
use std::fmt;
use std::marker::PhantomData;
use std::string::ToString;

use serde::de::{Error, Visitor};
use serde::ser::Serializer;
use serde::Deserializer;

use base64::{self, URL_SAFE_NO_PAD};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FromBase64Error {
    DecodeError,
    LengthMismatch,
}

impl fmt::Display for FromBase64Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FromBase64Error::DecodeError => f.write_str("invalid base64 string"),
            FromBase64Error::LengthMismatch => f.write_str("length mismatch"),
        }
    }
}

/// Encode a bytes like item as url safe base64, without padding.
pub fn to_base64<T>(item: &T) -> String
where
    T: AsRef<[u8]>,
{
    base64::encode_config(item.as_ref(), URL_SAFE_NO_PAD)
}

/// Decode a url safe base64 string (without padding) into a bytes like item.
pub fn from_base64<T>(str_item: &str) -> Result<T, FromBase64Error>
where
    T: for<'t> TryFrom<&'t [u8]>,
{
    let vec = base64::decode_config(str_item, URL_SAFE_NO_PAD)
        .map_err(|_| FromBase64Error::DecodeError)?;
    T::try_from(&vec[..]).map_err(|_| FromBase64Error::LengthMismatch)
}

pub fn serialize<T, S>(item: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: AsRef<[u8]>,
{
    serializer.serialize_str(&to_base64(item))
}

pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: for<'t> TryFrom<&'t [u8]>,
{
    struct ItemVisitor<T> {
        item: PhantomData<T>,
    }

    impl<'de, T> Visitor<'de> for ItemVisitor<T>
    where
        T: for<'t> TryFrom<&'t [u8]>,
    {
        type Value = T;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("A bytes like item")
        }

        fn visit_str<E>(self, str_item: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            from_base64(str_item).map_err(|err| Error::custom(err.to_string()))
        }
    }

    let visitor = ItemVisitor { item: PhantomData };
    deserializer.deserialize_str(visitor)
}
