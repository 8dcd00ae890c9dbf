use std::sync::Arc;

use derive_more::From;

use database::{FeeRateStore, FeeStoreError};

use proto::crypto::{Address, ChannelId, TokenAddress};
use proto::fee::messages::{FeeRateRecord, FeeScope, Rate};

#[derive(Debug, From)]
pub enum FeePolicyError {
    FeeStoreError(FeeStoreError),
}

/// Current time, in milliseconds since the unix epoch.
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Resolves the fee rates charged by peers, on top of a fee rate history.
#[derive(Clone)]
pub struct FeePolicy {
    fee_store: Arc<dyn FeeRateStore>,
}

impl FeePolicy {
    pub fn new(fee_store: Arc<dyn FeeRateStore>) -> Self {
        FeePolicy { fee_store }
    }

    /// The rate `peer_address` currently charges inside `scope`.
    /// If no rate was ever recorded, this is the zero rate.
    pub fn rate_for(&self, scope: &FeeScope, peer_address: &Address) -> Result<Rate, FeePolicyError> {
        Ok(self.fee_store.rate_for(scope, peer_address, now_millis())?)
    }

    pub fn latest_rate(
        &self,
        scope: &FeeScope,
        peer_address: &Address,
    ) -> Result<Option<FeeRateRecord>, FeePolicyError> {
        Ok(self.fee_store.latest_rate(scope, peer_address, now_millis())?)
    }

    /// Set the rate of `peer_address` inside `scope`, effective immediately.
    pub fn record_rate(
        &self,
        scope: &FeeScope,
        peer_address: &Address,
        fee_rate: &Rate,
    ) -> Result<(), FeePolicyError> {
        self.record_rate_at(scope, peer_address, fee_rate, now_millis())
    }

    /// Set the rate of `peer_address` inside `scope`, starting from `effective_time`
    /// (milliseconds since the unix epoch).
    pub fn record_rate_at(
        &self,
        scope: &FeeScope,
        peer_address: &Address,
        fee_rate: &Rate,
        effective_time: i64,
    ) -> Result<(), FeePolicyError> {
        Ok(self
            .fee_store
            .record_rate(scope, peer_address, fee_rate, effective_time)?)
    }

    /// The rate charged by `peer_address` for credits it receives through `channel_id`.
    ///
    /// The most specific recorded rate wins: the channel rate, then the token rate and then
    /// the account rate of the peer. Falls back to the zero rate.
    pub fn hop_rate(
        &self,
        token_address: &TokenAddress,
        channel_id: &ChannelId,
        peer_address: &Address,
    ) -> Result<Rate, FeePolicyError> {
        let now = now_millis();
        let scopes = [
            FeeScope::Channel(*channel_id),
            FeeScope::Token(*token_address),
            FeeScope::Account,
        ];
        for scope in &scopes {
            if let Some(record) = self.fee_store.latest_rate(scope, peer_address, now)? {
                return Ok(record.fee_rate);
            }
        }
        Ok(Rate::new())
    }
}
