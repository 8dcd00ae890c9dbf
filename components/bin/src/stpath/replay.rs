use std::fs;
use std::io;
use std::path::Path;

use futures::channel::oneshot;
use futures::stream;

use proto::chain::messages::ChainEvent;

use path_server::{chain_listener, ChainListenerError, NetworkClient};

#[derive(Debug)]
pub enum ReplayError {
    IoError(io::Error),
    /// A line of the event log could not be parsed (line number starts from 1)
    ParseEventError(usize, serde_json::error::Error),
    ChainListenerError(ChainListenerError),
}

impl From<io::Error> for ReplayError {
    fn from(e: io::Error) -> Self {
        ReplayError::IoError(e)
    }
}

/// Read a newline delimited JSON log of chain events. Empty lines are skipped.
pub fn read_event_log(path: &Path) -> Result<Vec<ChainEvent>, ReplayError> {
    let data = fs::read_to_string(path)?;
    let mut events = Vec::new();
    for (index, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = serde_json::from_str(line)
            .map_err(|e| ReplayError::ParseEventError(index + 1, e))?;
        events.push(event);
    }
    Ok(events)
}

/// Feed all `events` to the network service, in order.
/// Returns after the last event was applied.
pub async fn replay_events(
    events: Vec<ChainEvent>,
    network_client: NetworkClient,
) -> Result<(), ReplayError> {
    let num_events = events.len();
    let (_stop_sender, stop_receiver) = oneshot::channel();
    match chain_listener(stream::iter(events), stop_receiver, network_client).await {
        // The end of the log is the end of the replay:
        Err(ChainListenerError::EventStreamClosed) | Ok(()) => {
            info!("replay_events: Replayed {} events", num_events);
            Ok(())
        }
        Err(e) => Err(ReplayError::ChainListenerError(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::executor::{block_on, ThreadPool};

    use tempfile::tempdir;

    use proto::chain::messages::{ChannelDeposit, ChannelOpened, TokenNetworkAdded};
    use proto::crypto::{Address, ChannelId};

    use path_server::{create_network_service, NetworkState};

    fn addr(i: u8) -> Address {
        Address::from(&[i; Address::len()])
    }

    fn sample_events() -> Vec<ChainEvent> {
        let channel_id = ChannelId::from(&[7; ChannelId::len()]);
        vec![
            ChainEvent::TokenNetworkAdded(TokenNetworkAdded {
                token_address: addr(0xe0),
                token_network_address: addr(0xe1),
                block_number: 1,
                token_decimals: 18,
            }),
            // Arrives before the channel is opened:
            ChainEvent::ChannelDeposit(ChannelDeposit {
                token_network_address: addr(0xe1),
                channel_id,
                participant: addr(2),
                total_deposit: 30,
                block_number: 3,
            }),
            ChainEvent::ChannelOpened(ChannelOpened {
                token_network_address: addr(0xe1),
                channel_id,
                participant1: addr(1),
                participant2: addr(2),
                block_number: 2,
            }),
            ChainEvent::BlockNumber(3),
        ]
    }

    fn write_event_log(path: &Path, events: &[ChainEvent]) {
        let mut data = String::new();
        for event in events {
            data.push_str(&serde_json::to_string(event).unwrap());
            data.push('\n');
            // Empty lines are allowed:
            data.push('\n');
        }
        fs::write(path, data).unwrap();
    }

    #[test]
    fn test_read_event_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let events = sample_events();
        write_event_log(&path, &events);

        assert_eq!(read_event_log(&path).unwrap(), events);
    }

    #[test]
    fn test_read_event_log_invalid_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        fs::write(&path, "{\"BlockNumber\":3}\n{\"BlockNumber\":\n").unwrap();

        match read_event_log(&path) {
            Err(ReplayError::ParseEventError(2, _)) => {}
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_replay_events() {
        let thread_pool = ThreadPool::new().unwrap();
        let mut network_client =
            create_network_service(NetworkState::new(0), thread_pool).unwrap();

        block_on(replay_events(sample_events(), network_client.clone())).unwrap();

        assert_eq!(block_on(network_client.latest_block()).unwrap(), 3);
        let channels = block_on(network_client.channels_of(addr(0xe0), addr(2))).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].usable_capacity(&addr(2)), Some(30));
        assert_eq!(channels[0].usable_capacity(&addr(1)), Some(0));
    }
}
