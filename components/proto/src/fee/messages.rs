use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::cast::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::crypto::{Address, ChannelId, TokenAddress};

/// The rate a peer charges for forwarding credits.
/// The fee for forwarding `x` credits is `x * mul / 2^32 + add`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rate {
    /// Commission
    pub mul: u32,
    /// Flat rate
    pub add: u32,
}

impl Rate {
    pub fn new() -> Self {
        Rate { mul: 0, add: 0 }
    }

    /// Calculate the fee taken when forwarding `amount` credits.
    pub fn calc_fee(&self, amount: u128) -> Option<u128> {
        let mul_res = (BigUint::from(amount) * BigUint::from(self.mul)) >> 32;
        let res = mul_res + BigUint::from(self.add);
        res.to_u128()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRateError;

impl fmt::Display for ParseRateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("rate must be of the form MUL:ADD")
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.mul, self.add)
    }
}

impl FromStr for Rate {
    type Err = ParseRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(':');
        let mul = parts
            .next()
            .and_then(|part| part.parse::<u32>().ok())
            .ok_or(ParseRateError)?;
        let add = parts
            .next()
            .and_then(|part| part.parse::<u32>().ok())
            .ok_or(ParseRateError)?;
        if parts.next().is_some() {
            return Err(ParseRateError);
        }
        Ok(Rate { mul, add })
    }
}

/// Granularity at which a fee rate is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeScope {
    /// Rate for a single channel
    Channel(ChannelId),
    /// Rate for all channels of a token
    Token(TokenAddress),
    /// Rate for all channels of an account
    Account,
}

/// A persisted fee rate. The applicable rate at time `t` is the record with the latest
/// `effective_time <= t`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRateRecord {
    pub scope: FeeScope,
    pub peer_address: Address,
    pub fee_rate: Rate,
    /// Milliseconds since the unix epoch.
    pub effective_time: i64,
}
