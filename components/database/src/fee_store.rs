use std::fmt;

use proto::crypto::Address;
use proto::fee::messages::{FeeRateRecord, FeeScope, Rate};

#[derive(Debug)]
pub enum FeeStoreError {
    SqliteError(rusqlite::Error),
    /// A stored record could not be decoded
    CorruptRecord(String),
    LockPoisoned,
}

impl From<rusqlite::Error> for FeeStoreError {
    fn from(e: rusqlite::Error) -> Self {
        FeeStoreError::SqliteError(e)
    }
}

impl fmt::Display for FeeStoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FeeStoreError::SqliteError(e) => write!(f, "sqlite error: {}", e),
            FeeStoreError::CorruptRecord(desc) => write!(f, "corrupt fee record: {}", desc),
            FeeStoreError::LockPoisoned => f.write_str("fee store lock poisoned"),
        }
    }
}

impl ::std::error::Error for FeeStoreError {}

/// Persistent storage of fee rates.
///
/// Rates are append only: setting a rate adds a record with an effective time, and the rate in
/// effect at time `now` is the record with the latest `effective_time <= now`.
/// Implementations must be safe to query from several tasks at once.
pub trait FeeRateStore: Send + Sync {
    fn latest_rate(
        &self,
        scope: &FeeScope,
        peer_address: &Address,
        now: i64,
    ) -> Result<Option<FeeRateRecord>, FeeStoreError>;

    fn record_rate(
        &self,
        scope: &FeeScope,
        peer_address: &Address,
        fee_rate: &Rate,
        effective_time: i64,
    ) -> Result<(), FeeStoreError>;

    /// The rate in effect at time `now`, or a zero rate if nothing was ever recorded.
    fn rate_for(
        &self,
        scope: &FeeScope,
        peer_address: &Address,
        now: i64,
    ) -> Result<Rate, FeeStoreError> {
        Ok(self
            .latest_rate(scope, peer_address, now)?
            .map(|record| record.fee_rate)
            .unwrap_or_else(Rate::new))
    }
}
