use serde::{Deserialize, Serialize};

use crate::crypto::{Address, BlockNumber, ChannelId, TokenAddress, TokenNetworkAddress};

/// A new token network contract was registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenNetworkAdded {
    pub token_address: TokenAddress,
    pub token_network_address: TokenNetworkAddress,
    pub block_number: BlockNumber,
    pub token_decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOpened {
    pub token_network_address: TokenNetworkAddress,
    pub channel_id: ChannelId,
    pub participant1: Address,
    pub participant2: Address,
    pub block_number: BlockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDeposit {
    pub token_network_address: TokenNetworkAddress,
    pub channel_id: ChannelId,
    pub participant: Address,
    /// Cumulative amount deposited by `participant` so far.
    pub total_deposit: u128,
    pub block_number: BlockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelWithdraw {
    pub token_network_address: TokenNetworkAddress,
    pub channel_id: ChannelId,
    pub participant1: Address,
    pub participant2: Address,
    /// Cumulative amount withdrawn by `participant1`.
    pub participant1_balance: u128,
    /// Cumulative amount withdrawn by `participant2`.
    pub participant2_balance: u128,
    pub block_number: BlockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelClosed {
    pub token_network_address: TokenNetworkAddress,
    pub channel_id: ChannelId,
    pub block_number: BlockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettled {
    pub token_network_address: TokenNetworkAddress,
    pub channel_id: ChannelId,
    pub block_number: BlockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCooperativeSettled {
    pub token_network_address: TokenNetworkAddress,
    pub channel_id: ChannelId,
    pub block_number: BlockNumber,
}

/// A decoded state change reported by the ledger.
/// Delivery is at least once, and not necessarily in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEvent {
    TokenNetworkAdded(TokenNetworkAdded),
    ChannelOpened(ChannelOpened),
    ChannelDeposit(ChannelDeposit),
    ChannelWithdraw(ChannelWithdraw),
    ChannelClosed(ChannelClosed),
    ChannelSettled(ChannelSettled),
    ChannelCooperativeSettled(ChannelCooperativeSettled),
    /// A new block was processed.
    BlockNumber(BlockNumber),
}

impl ChainEvent {
    /// The token network this event refers to, if any.
    pub fn token_network_address(&self) -> Option<&TokenNetworkAddress> {
        match self {
            ChainEvent::TokenNetworkAdded(inner) => Some(&inner.token_network_address),
            ChainEvent::ChannelOpened(inner) => Some(&inner.token_network_address),
            ChainEvent::ChannelDeposit(inner) => Some(&inner.token_network_address),
            ChainEvent::ChannelWithdraw(inner) => Some(&inner.token_network_address),
            ChainEvent::ChannelClosed(inner) => Some(&inner.token_network_address),
            ChainEvent::ChannelSettled(inner) => Some(&inner.token_network_address),
            ChainEvent::ChannelCooperativeSettled(inner) => Some(&inner.token_network_address),
            ChainEvent::BlockNumber(_) => None,
        }
    }

    /// The channel this event refers to, if any.
    pub fn channel_id(&self) -> Option<&ChannelId> {
        match self {
            ChainEvent::ChannelOpened(inner) => Some(&inner.channel_id),
            ChainEvent::ChannelDeposit(inner) => Some(&inner.channel_id),
            ChainEvent::ChannelWithdraw(inner) => Some(&inner.channel_id),
            ChainEvent::ChannelClosed(inner) => Some(&inner.channel_id),
            ChainEvent::ChannelSettled(inner) => Some(&inner.channel_id),
            ChainEvent::ChannelCooperativeSettled(inner) => Some(&inner.channel_id),
            ChainEvent::TokenNetworkAdded(_) | ChainEvent::BlockNumber(_) => None,
        }
    }
}
