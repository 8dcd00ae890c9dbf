use std::collections::HashMap;
use std::sync::Mutex;

use proto::crypto::Address;
use proto::fee::messages::{FeeRateRecord, FeeScope, Rate};

use crate::fee_store::{FeeRateStore, FeeStoreError};

/// An in memory fee rate store.
/// Used when no fee database is configured, and for testing.
#[derive(Debug, Default)]
pub struct MemFeeRateStore {
    /// (scope, peer) -> [(effective_time, rate)], in insertion order
    rates: Mutex<HashMap<(FeeScope, Address), Vec<(i64, Rate)>>>,
}

impl MemFeeRateStore {
    pub fn new() -> Self {
        MemFeeRateStore::default()
    }
}

impl FeeRateStore for MemFeeRateStore {
    fn latest_rate(
        &self,
        scope: &FeeScope,
        peer_address: &Address,
        now: i64,
    ) -> Result<Option<FeeRateRecord>, FeeStoreError> {
        let rates = self.rates.lock().map_err(|_| FeeStoreError::LockPoisoned)?;
        let entries = match rates.get(&(scope.clone(), *peer_address)) {
            Some(entries) => entries,
            None => return Ok(None),
        };

        // On equal effective times, prefer the entry recorded last:
        let mut opt_latest: Option<&(i64, Rate)> = None;
        for entry in entries.iter().filter(|(effective_time, _)| *effective_time <= now) {
            match opt_latest {
                Some((latest_time, _)) if *latest_time > entry.0 => {}
                _ => opt_latest = Some(entry),
            }
        }

        Ok(opt_latest.map(|(effective_time, fee_rate)| FeeRateRecord {
            scope: scope.clone(),
            peer_address: *peer_address,
            fee_rate: fee_rate.clone(),
            effective_time: *effective_time,
        }))
    }

    fn record_rate(
        &self,
        scope: &FeeScope,
        peer_address: &Address,
        fee_rate: &Rate,
        effective_time: i64,
    ) -> Result<(), FeeStoreError> {
        let mut rates = self.rates.lock().map_err(|_| FeeStoreError::LockPoisoned)?;
        rates
            .entry((scope.clone(), *peer_address))
            .or_insert_with(Vec::new)
            .push((effective_time, fee_rate.clone()));
        Ok(())
    }
}
