use serde::{Deserialize, Serialize};

use crate::crypto::{ChannelId, HashResult, Signature};

/// An off-chain statement, signed by a channel participant, about the amounts it has transferred
/// to its partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceProof {
    /// Strictly increasing for every new proof of the same participant.
    pub nonce: u64,
    /// Cumulative amount transferred by the signer.
    pub transferred_amount: u128,
    pub channel_id: ChannelId,
    /// Commitment to the currently pending locked transfers.
    pub locksroot: HashResult,
    pub additional_hash: HashResult,
    /// Signature{key=signer}(balance proof signature buffer)
    pub signature: Signature,
}

/// A request to update a channel with the latest balance proof of the requesting peer's partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBalance {
    pub balance_proof: BalanceProof,
    /// Total amount currently locked in pending transfers, as declared by the requester.
    pub locks_amount: u128,
}
