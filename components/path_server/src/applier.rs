use proto::chain::messages::{ChainEvent, ChannelOpened};
use proto::crypto::{ChannelId, TokenNetworkAddress};

use crate::state::NetworkState;
use crate::token_network::{ApplyError, TokenNetwork};

impl NetworkState {
    /// Apply a single chain event.
    ///
    /// Failures leave the state unchanged. Channel events that arrive before their channel is
    /// opened are kept, and applied right after the channel is opened.
    pub fn apply_event(&mut self, event: ChainEvent) -> Result<(), ApplyError> {
        match event {
            ChainEvent::TokenNetworkAdded(token_network_added) => self.register_token_network(
                token_network_added.token_address,
                token_network_added.token_network_address,
                token_network_added.token_decimals,
            ),
            ChainEvent::ChannelOpened(channel_opened) => {
                let channel_id = channel_opened.channel_id;
                match self.open_channel(channel_opened) {
                    Ok(()) => {
                        self.replay_pending(&channel_id);
                        Ok(())
                    }
                    Err(e @ ApplyError::InvalidParticipants)
                    | Err(e @ ApplyError::ChannelIdConflict(_)) => {
                        // This channel will never open:
                        self.drop_pending(&channel_id);
                        Err(e)
                    }
                    Err(e) => Err(e),
                }
            }
            ChainEvent::BlockNumber(block_number) => {
                if block_number <= self.latest_block {
                    return Err(ApplyError::StaleEvent);
                }
                self.latest_block = block_number;
                Ok(())
            }
            channel_event => self.apply_channel_event(channel_event),
        }
    }

    fn open_channel(&mut self, channel_opened: ChannelOpened) -> Result<(), ApplyError> {
        let token_network_address = channel_opened.token_network_address;
        let channel_id = channel_opened.channel_id;
        if let Some(other_network) = self.channel_index.get(&channel_id) {
            if other_network != &token_network_address {
                return Err(ApplyError::ChannelIdConflict(channel_id));
            }
        }
        self.token_network_mut(&token_network_address)?.open_channel(
            channel_id,
            channel_opened.participant1,
            channel_opened.participant2,
            channel_opened.block_number,
        )?;
        self.channel_index.insert(channel_id, token_network_address);
        Ok(())
    }

    /// Apply an event that changes an existing channel.
    fn apply_channel_event(&mut self, event: ChainEvent) -> Result<(), ApplyError> {
        let (token_network_address, channel_id) =
            match (event.token_network_address(), event.channel_id()) {
                (Some(token_network_address), Some(channel_id)) => {
                    (*token_network_address, *channel_id)
                }
                _ => return Err(ApplyError::StaleEvent),
            };

        let is_opened = self
            .token_network_mut(&token_network_address)?
            .channel(&channel_id)
            .is_some();
        if !is_opened {
            // Wait for the `ChannelOpened` event:
            self.pending.park(channel_id, event)?;
            return Err(ApplyError::UnknownChannel(channel_id));
        }

        let token_network = self.token_network_mut(&token_network_address)?;
        match event {
            ChainEvent::ChannelDeposit(deposit) => token_network.update_deposit(
                &channel_id,
                &deposit.participant,
                deposit.total_deposit,
            ),
            ChainEvent::ChannelWithdraw(withdraw) => token_network.update_withdraw(
                &channel_id,
                &withdraw.participant1,
                withdraw.participant1_balance,
                &withdraw.participant2,
                withdraw.participant2_balance,
            ),
            ChainEvent::ChannelClosed(closed) => {
                token_network.close_channel(&channel_id, closed.block_number)
            }
            ChainEvent::ChannelSettled(settled) => {
                token_network.settle_channel(&channel_id, settled.block_number)
            }
            ChainEvent::ChannelCooperativeSettled(settled) => {
                token_network.cooperative_settle(&channel_id, settled.block_number)
            }
            ChainEvent::TokenNetworkAdded(_)
            | ChainEvent::ChannelOpened(_)
            | ChainEvent::BlockNumber(_) => Err(ApplyError::StaleEvent),
        }
    }

    /// Apply events that were waiting for `channel_id` to open.
    fn replay_pending(&mut self, channel_id: &ChannelId) {
        for event in self.pending.take(channel_id) {
            let event_desc = format!("{:?}", event);
            match self.apply_channel_event(event) {
                Ok(()) => debug!("replay_pending: applied {}", event_desc),
                Err(e) => log_apply_error(&event_desc, &e),
            }
        }
    }

    fn drop_pending(&mut self, channel_id: &ChannelId) {
        let dropped = self.pending.take(channel_id);
        if !dropped.is_empty() {
            warn!(
                "Opening channel {} was rejected, dropped {} waiting events",
                channel_id,
                dropped.len()
            );
        }
    }

    fn token_network_mut(
        &mut self,
        token_network_address: &TokenNetworkAddress,
    ) -> Result<&mut TokenNetwork, ApplyError> {
        self.token_networks
            .get_mut(token_network_address)
            .ok_or_else(|| ApplyError::UnknownTokenNetwork(*token_network_address))
    }
}

/// Log a failure to apply an event, according to its severity.
pub fn log_apply_error(event_desc: &str, apply_error: &ApplyError) {
    match apply_error {
        ApplyError::StaleEvent => debug!("Ignored stale event: {}", event_desc),
        ApplyError::UnknownChannel(channel_id) => warn!(
            "Event for unknown channel {}, waiting for it to open: {}",
            channel_id, event_desc
        ),
        ApplyError::UnknownTokenNetwork(token_network_address) => warn!(
            "Ignored event for unknown token network {}: {}",
            token_network_address, event_desc
        ),
        ApplyError::PendingOverflow(channel_id) => warn!(
            "Too many events waiting for channel {}, dropped: {}",
            channel_id, event_desc
        ),
        _ => error!("Rejected event {}: {:?}", event_desc, apply_error),
    }
}
