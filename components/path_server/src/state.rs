use std::collections::HashMap;

use proto::chain::messages::ChainEvent;
use proto::consts::{MAX_PENDING_CHANNELS, MAX_PENDING_EVENTS_PER_CHANNEL};
use proto::crypto::{BlockNumber, ChannelId, TokenAddress, TokenNetworkAddress};

use crate::token_network::{ApplyError, TokenNetwork};

/// Channel events that arrived before the channel was opened.
#[derive(Debug, Default)]
pub(crate) struct PendingEvents {
    events: HashMap<ChannelId, Vec<ChainEvent>>,
}

impl PendingEvents {
    /// Keep an event until its channel is opened.
    pub fn park(&mut self, channel_id: ChannelId, event: ChainEvent) -> Result<(), ApplyError> {
        if !self.events.contains_key(&channel_id) && self.events.len() >= MAX_PENDING_CHANNELS {
            return Err(ApplyError::PendingOverflow(channel_id));
        }
        let channel_events = self.events.entry(channel_id).or_insert_with(Vec::new);
        if channel_events.len() >= MAX_PENDING_EVENTS_PER_CHANNEL {
            return Err(ApplyError::PendingOverflow(channel_id));
        }
        channel_events.push(event);
        Ok(())
    }

    /// Take all the events waiting for `channel_id`, in arrival order.
    pub fn take(&mut self, channel_id: &ChannelId) -> Vec<ChainEvent> {
        self.events.remove(channel_id).unwrap_or_default()
    }

    pub fn remove_token_network(&mut self, token_network_address: &TokenNetworkAddress) {
        for channel_events in self.events.values_mut() {
            channel_events.retain(|event| event.token_network_address() != Some(token_network_address));
        }
        self.events.retain(|_, channel_events| !channel_events.is_empty());
    }

    pub fn num_channels(&self) -> usize {
        self.events.len()
    }
}

/// All the token networks known to the service, together with the indices needed to
/// find them.
///
/// The state is rebuilt on start from the chain event log. `latest_block` starts from the
/// stored checkpoint and only moves forward.
#[derive(Debug)]
pub struct NetworkState {
    pub(crate) token_networks: HashMap<TokenNetworkAddress, TokenNetwork>,
    /// token -> token network
    token_index: HashMap<TokenAddress, TokenNetworkAddress>,
    /// channel -> token network
    pub(crate) channel_index: HashMap<ChannelId, TokenNetworkAddress>,
    pub(crate) latest_block: BlockNumber,
    pub(crate) pending: PendingEvents,
}

impl NetworkState {
    pub fn new(checkpoint: BlockNumber) -> Self {
        NetworkState {
            token_networks: HashMap::new(),
            token_index: HashMap::new(),
            channel_index: HashMap::new(),
            latest_block: checkpoint,
            pending: PendingEvents::default(),
        }
    }

    pub fn register_token_network(
        &mut self,
        token_address: TokenAddress,
        token_network_address: TokenNetworkAddress,
        token_decimals: u8,
    ) -> Result<(), ApplyError> {
        if self.token_networks.contains_key(&token_network_address) {
            return Err(ApplyError::StaleEvent);
        }
        if self.token_index.contains_key(&token_address) {
            return Err(ApplyError::TokenAlreadyRegistered(token_address));
        }
        self.token_index.insert(token_address, token_network_address);
        self.token_networks.insert(
            token_network_address,
            TokenNetwork::new(token_address, token_network_address, token_decimals),
        );
        Ok(())
    }

    /// Forget a token network and all of its channels.
    pub fn unregister_token_network(
        &mut self,
        token_network_address: &TokenNetworkAddress,
    ) -> Option<TokenNetwork> {
        let token_network = self.token_networks.remove(token_network_address)?;
        self.token_index.remove(&token_network.token_address);
        self.channel_index
            .retain(|_, channel_network| channel_network != token_network_address);
        self.pending.remove_token_network(token_network_address);
        Some(token_network)
    }

    pub fn token_network(&self, token_network_address: &TokenNetworkAddress) -> Option<&TokenNetwork> {
        self.token_networks.get(token_network_address)
    }

    pub fn token_network_by_token(&self, token_address: &TokenAddress) -> Option<&TokenNetwork> {
        let token_network_address = self.token_index.get(token_address)?;
        self.token_networks.get(token_network_address)
    }

    pub fn token_networks(&self) -> impl Iterator<Item = &TokenNetwork> {
        self.token_networks.values()
    }

    /// Snapshot of the token network of `token_address`, used for route searches.
    pub fn snapshot(&self, token_address: &TokenAddress) -> Option<TokenNetwork> {
        self.token_network_by_token(token_address)
            .map(TokenNetwork::snapshot)
    }

    /// Last processed block. Used to resume the chain event subscription.
    pub fn latest_block(&self) -> BlockNumber {
        self.latest_block
    }

    /// Amount of channels that have events waiting for them to open.
    pub fn num_pending_channels(&self) -> usize {
        self.pending.num_channels()
    }
}
