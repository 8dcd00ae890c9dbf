use proto::crypto::{Address, BlockNumber, ChannelId, HashResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Opened,
    Closed,
    Settled,
    CooperativelySettled,
}

impl ChannelStatus {
    /// Settled channels never change again.
    pub fn is_terminal(self) -> bool {
        match self {
            ChannelStatus::Opened | ChannelStatus::Closed => false,
            ChannelStatus::Settled | ChannelStatus::CooperativelySettled => true,
        }
    }
}

/// The facts we know about one side of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParticipantState {
    /// Cumulative on-chain deposit
    pub deposit: u128,
    /// Cumulative on-chain withdrawal
    pub withdrawn: u128,
    /// Latest accepted balance proof fields:
    pub transferred_amount: u128,
    pub locked_amount: u128,
    pub nonce: u64,
    pub locksroot: HashResult,
}

impl ParticipantState {
    /// Amount this participant can still send to its partner:
    /// `deposit - withdrawn - transferred_amount - locked_amount`.
    /// Returns `None` if the result would be negative.
    pub fn usable_capacity(&self) -> Option<u128> {
        self.deposit
            .checked_sub(self.withdrawn)?
            .checked_sub(self.transferred_amount)?
            .checked_sub(self.locked_amount)
    }
}

/// Everything we know about a single on-chain channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLedgerEntry {
    pub channel_id: ChannelId,
    pub participant1: Address,
    pub participant2: Address,
    pub state1: ParticipantState,
    pub state2: ParticipantState,
    pub status: ChannelStatus,
    pub opened_at_block: BlockNumber,
    pub closed_at_block: Option<BlockNumber>,
    pub settled_at_block: Option<BlockNumber>,
}

impl ChannelLedgerEntry {
    pub fn new(
        channel_id: ChannelId,
        participant1: Address,
        participant2: Address,
        opened_at_block: BlockNumber,
    ) -> Self {
        ChannelLedgerEntry {
            channel_id,
            participant1,
            participant2,
            state1: ParticipantState::default(),
            state2: ParticipantState::default(),
            status: ChannelStatus::Opened,
            opened_at_block,
            closed_at_block: None,
            settled_at_block: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == ChannelStatus::Opened
    }

    pub fn is_participant(&self, address: &Address) -> bool {
        &self.participant1 == address || &self.participant2 == address
    }

    /// The other side of the channel, from the point of view of `address`.
    pub fn partner(&self, address: &Address) -> Option<&Address> {
        if address == &self.participant1 {
            Some(&self.participant2)
        } else if address == &self.participant2 {
            Some(&self.participant1)
        } else {
            None
        }
    }

    pub fn participant(&self, address: &Address) -> Option<&ParticipantState> {
        if address == &self.participant1 {
            Some(&self.state1)
        } else if address == &self.participant2 {
            Some(&self.state2)
        } else {
            None
        }
    }

    pub fn participant_mut(&mut self, address: &Address) -> Option<&mut ParticipantState> {
        if address == &self.participant1 {
            Some(&mut self.state1)
        } else if address == &self.participant2 {
            Some(&mut self.state2)
        } else {
            None
        }
    }

    /// Amount `address` can send to its partner through this channel.
    /// Returns `None` if `address` is not a participant.
    pub fn usable_capacity(&self, address: &Address) -> Option<u128> {
        self.participant(address)?.usable_capacity()
    }

    /// Check the capacity invariant for both sides.
    pub fn is_consistent(&self) -> bool {
        self.state1.usable_capacity().is_some() && self.state2.usable_capacity().is_some()
    }
}
