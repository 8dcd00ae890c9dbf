use im::hashmap::HashMap as ImHashMap;
use im::hashset::HashSet as ImHashSet;

use proto::crypto::{Address, BlockNumber, ChannelId, TokenAddress, TokenNetworkAddress};

use crate::channel::{ChannelLedgerEntry, ChannelStatus};

/// Reasons for not applying a chain event.
/// None of these are fatal: the state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// Duplicate or outdated fact
    StaleEvent,
    UnknownChannel(ChannelId),
    UnknownTokenNetwork(TokenNetworkAddress),
    /// Too many events are already waiting for this channel to open
    PendingOverflow(ChannelId),
    /// A channel with this id already exists in another token network
    ChannelIdConflict(ChannelId),
    /// The token already has a registered token network
    TokenAlreadyRegistered(TokenAddress),
    InvalidParticipants,
    NotParticipant(Address),
    ChannelNotOpen,
    /// A withdraw event reported a lower total than we already know of
    WithdrawDecrease,
    /// Applying the event would make a usable capacity negative
    CapacityViolation,
}

/// Off-chain mirror of a single token network contract.
///
/// Based on persistent maps, so cloning (see `snapshot()`) is cheap.
#[derive(Debug, Clone)]
pub struct TokenNetwork {
    pub token_address: TokenAddress,
    pub token_network_address: TokenNetworkAddress,
    pub token_decimals: u8,
    pub(crate) channels: ImHashMap<ChannelId, ChannelLedgerEntry>,
    /// address -> open channels of this address
    adjacency: ImHashMap<Address, ImHashSet<ChannelId>>,
}

impl TokenNetwork {
    pub fn new(
        token_address: TokenAddress,
        token_network_address: TokenNetworkAddress,
        token_decimals: u8,
    ) -> Self {
        TokenNetwork {
            token_address,
            token_network_address,
            token_decimals,
            channels: ImHashMap::new(),
            adjacency: ImHashMap::new(),
        }
    }

    pub fn channel(&self, channel_id: &ChannelId) -> Option<&ChannelLedgerEntry> {
        self.channels.get(channel_id)
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelLedgerEntry> {
        self.channels.values()
    }

    /// Open channels of `address`, sorted by channel id.
    pub fn channels_of(&self, address: &Address) -> Vec<&ChannelLedgerEntry> {
        let mut channels = match self.adjacency.get(address) {
            Some(channel_ids) => channel_ids
                .iter()
                .filter_map(|channel_id| self.channels.get(channel_id))
                .collect::<Vec<_>>(),
            None => Vec::new(),
        };
        channels.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));
        channels
    }

    /// A copy of the current state that is not affected by later mutations.
    pub fn snapshot(&self) -> TokenNetwork {
        self.clone()
    }

    fn add_adjacency(&mut self, address: Address, channel_id: ChannelId) {
        self.adjacency
            .entry(address)
            .or_insert_with(ImHashSet::new)
            .insert(channel_id);
    }

    fn remove_adjacency(&mut self, address: &Address, channel_id: &ChannelId) {
        let is_empty = match self.adjacency.get_mut(address) {
            Some(channel_ids) => {
                channel_ids.remove(channel_id);
                channel_ids.is_empty()
            }
            None => return,
        };
        if is_empty {
            self.adjacency.remove(address);
        }
    }

    /// Stop routing through a channel that is no longer open.
    fn unlink_channel(&mut self, channel_id: &ChannelId) {
        let (participant1, participant2) = match self.channels.get(channel_id) {
            Some(entry) => (entry.participant1, entry.participant2),
            None => return,
        };
        self.remove_adjacency(&participant1, channel_id);
        self.remove_adjacency(&participant2, channel_id);
    }

    fn channel_mut(&mut self, channel_id: &ChannelId) -> Result<&mut ChannelLedgerEntry, ApplyError> {
        self.channels
            .get_mut(channel_id)
            .ok_or_else(|| ApplyError::UnknownChannel(*channel_id))
    }

    /// Channel that may still have its balances changed.
    fn open_channel_mut(
        &mut self,
        channel_id: &ChannelId,
    ) -> Result<&mut ChannelLedgerEntry, ApplyError> {
        let entry = self.channel_mut(channel_id)?;
        if !entry.is_open() {
            return Err(ApplyError::ChannelNotOpen);
        }
        Ok(entry)
    }

    pub fn open_channel(
        &mut self,
        channel_id: ChannelId,
        participant1: Address,
        participant2: Address,
        block_number: BlockNumber,
    ) -> Result<(), ApplyError> {
        if self.channels.contains_key(&channel_id) {
            return Err(ApplyError::StaleEvent);
        }
        if participant1 == participant2 {
            return Err(ApplyError::InvalidParticipants);
        }
        let entry = ChannelLedgerEntry::new(channel_id, participant1, participant2, block_number);
        self.channels.insert(channel_id, entry);
        self.add_adjacency(participant1, channel_id);
        self.add_adjacency(participant2, channel_id);
        Ok(())
    }

    /// Set the cumulative deposit of `participant`.
    /// A total that is not larger than the known one is stale.
    pub fn update_deposit(
        &mut self,
        channel_id: &ChannelId,
        participant: &Address,
        total_deposit: u128,
    ) -> Result<(), ApplyError> {
        let entry = self.open_channel_mut(channel_id)?;
        let state = entry
            .participant_mut(participant)
            .ok_or_else(|| ApplyError::NotParticipant(*participant))?;
        if total_deposit <= state.deposit {
            return Err(ApplyError::StaleEvent);
        }
        state.deposit = total_deposit;
        Ok(())
    }

    /// Set the cumulative withdrawals of both participants.
    /// `participant1` and `participant2` may be given in any order.
    pub fn update_withdraw(
        &mut self,
        channel_id: &ChannelId,
        participant1: &Address,
        participant1_withdrawn: u128,
        participant2: &Address,
        participant2_withdrawn: u128,
    ) -> Result<(), ApplyError> {
        let entry = self.open_channel_mut(channel_id)?;
        if participant1 == participant2 {
            return Err(ApplyError::InvalidParticipants);
        }

        let mut state1 = entry
            .participant(participant1)
            .ok_or_else(|| ApplyError::NotParticipant(*participant1))?
            .clone();
        let mut state2 = entry
            .participant(participant2)
            .ok_or_else(|| ApplyError::NotParticipant(*participant2))?
            .clone();

        if participant1_withdrawn < state1.withdrawn || participant2_withdrawn < state2.withdrawn {
            return Err(ApplyError::WithdrawDecrease);
        }
        if participant1_withdrawn == state1.withdrawn && participant2_withdrawn == state2.withdrawn
        {
            return Err(ApplyError::StaleEvent);
        }

        state1.withdrawn = participant1_withdrawn;
        state2.withdrawn = participant2_withdrawn;
        if state1.usable_capacity().is_none() || state2.usable_capacity().is_none() {
            return Err(ApplyError::CapacityViolation);
        }

        // Both participants were found above:
        if let Some(state) = entry.participant_mut(participant1) {
            *state = state1;
        }
        if let Some(state) = entry.participant_mut(participant2) {
            *state = state2;
        }
        Ok(())
    }

    pub fn close_channel(
        &mut self,
        channel_id: &ChannelId,
        block_number: BlockNumber,
    ) -> Result<(), ApplyError> {
        let entry = self.channel_mut(channel_id)?;
        if !entry.is_open() {
            return Err(ApplyError::StaleEvent);
        }
        entry.status = ChannelStatus::Closed;
        entry.closed_at_block = Some(block_number);
        self.unlink_channel(channel_id);
        Ok(())
    }

    fn settle_as(
        &mut self,
        channel_id: &ChannelId,
        block_number: BlockNumber,
        status: ChannelStatus,
    ) -> Result<(), ApplyError> {
        let entry = self.channel_mut(channel_id)?;
        if entry.status.is_terminal() {
            return Err(ApplyError::StaleEvent);
        }
        entry.status = status;
        entry.settled_at_block = Some(block_number);
        self.unlink_channel(channel_id);
        Ok(())
    }

    pub fn settle_channel(
        &mut self,
        channel_id: &ChannelId,
        block_number: BlockNumber,
    ) -> Result<(), ApplyError> {
        self.settle_as(channel_id, block_number, ChannelStatus::Settled)
    }

    pub fn cooperative_settle(
        &mut self,
        channel_id: &ChannelId,
        block_number: BlockNumber,
    ) -> Result<(), ApplyError> {
        self.settle_as(channel_id, block_number, ChannelStatus::CooperativelySettled)
    }
}
