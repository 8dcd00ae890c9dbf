use proto::balance::messages::UpdateBalance;
use proto::crypto::{Address, ChannelId};

use crate::state::NetworkState;
use crate::token_network::TokenNetwork;

/// Reasons for rejecting a balance proof. All of them are caused by the request itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceProofError {
    /// The signer could not be recovered, or is not the partner of the requesting peer.
    InvalidSignature,
    ChannelNotFound,
    ChannelNotOpen,
    /// The nonce is not larger than the nonce of the last accepted proof.
    StaleNonce,
    /// The proof would leave the signer with a negative usable capacity.
    CapacityExceeded,
}

impl TokenNetwork {
    /// Replace the off-chain balance of `signer` inside a channel.
    /// `signer` must already be known to be a participant of the channel.
    pub(crate) fn apply_balance_proof(
        &mut self,
        channel_id: &ChannelId,
        signer: &Address,
        update_balance: &UpdateBalance,
    ) -> Result<(), BalanceProofError> {
        let balance_proof = &update_balance.balance_proof;
        let entry = self
            .channels
            .get_mut(channel_id)
            .ok_or(BalanceProofError::ChannelNotFound)?;
        if !entry.is_open() {
            return Err(BalanceProofError::ChannelNotOpen);
        }

        let state = entry
            .participant_mut(signer)
            .ok_or(BalanceProofError::InvalidSignature)?;
        if balance_proof.nonce <= state.nonce {
            return Err(BalanceProofError::StaleNonce);
        }

        let mut new_state = state.clone();
        new_state.nonce = balance_proof.nonce;
        new_state.transferred_amount = balance_proof.transferred_amount;
        new_state.locked_amount = update_balance.locks_amount;
        new_state.locksroot = balance_proof.locksroot;
        if new_state.usable_capacity().is_none() {
            return Err(BalanceProofError::CapacityExceeded);
        }

        *state = new_state;
        Ok(())
    }
}

impl NetworkState {
    /// Apply a balance proof submitted by `peer`.
    ///
    /// The proof must be signed by the partner of `peer` inside the channel (`opt_signer` is the
    /// recovered signer, `None` if recovery failed). On success, returns the address of the
    /// signer, which is the counterparty of `peer`.
    pub fn apply_balance_proof(
        &mut self,
        peer: &Address,
        update_balance: &UpdateBalance,
        opt_signer: Option<Address>,
    ) -> Result<Address, BalanceProofError> {
        let signer = opt_signer.ok_or(BalanceProofError::InvalidSignature)?;
        let channel_id = update_balance.balance_proof.channel_id;

        let token_network_address = self
            .channel_index
            .get(&channel_id)
            .ok_or(BalanceProofError::ChannelNotFound)?;
        let token_network = self
            .token_networks
            .get_mut(token_network_address)
            .ok_or(BalanceProofError::ChannelNotFound)?;

        let entry = token_network
            .channel(&channel_id)
            .ok_or(BalanceProofError::ChannelNotFound)?;
        if entry.partner(peer) != Some(&signer) {
            return Err(BalanceProofError::InvalidSignature);
        }

        token_network.apply_balance_proof(&channel_id, &signer, update_balance)?;
        debug!(
            "apply_balance_proof: channel={} signer={} nonce={}",
            channel_id, signer, update_balance.balance_proof.nonce
        );
        Ok(signer)
    }
}
