use futures::channel::{mpsc, oneshot};
use futures::{future, stream, SinkExt, Stream, StreamExt};

use proto::chain::messages::ChainEvent;

use crate::applier::log_apply_error;
use crate::service::{NetworkClient, NetworkClientError};

#[derive(Debug)]
pub enum ChainListenerError {
    /// The chain event stream ended
    EventStreamClosed,
    NetworkClientError(NetworkClientError),
}

enum ListenerEvent {
    Chain(ChainEvent),
    ChainClosed,
    Stop,
}

async fn inner_chain_listener<ES>(
    event_stream: ES,
    stop_receiver: oneshot::Receiver<()>,
    mut network_client: NetworkClient,
    // opt_debug_event_sender is used for testing:
    mut opt_debug_event_sender: Option<mpsc::Sender<()>>,
) -> Result<(), ChainListenerError>
where
    ES: Stream<Item = ChainEvent> + Unpin,
{
    let chain_events = event_stream
        .map(ListenerEvent::Chain)
        .chain(stream::once(future::ready(ListenerEvent::ChainClosed)));

    // A dropped stop sender is not a stop signal:
    let stop_events = stream::once(stop_receiver)
        .filter_map(|res| future::ready(res.ok().map(|()| ListenerEvent::Stop)));

    let mut incoming_events = stream::select(chain_events, stop_events);

    while let Some(event) = incoming_events.next().await {
        match event {
            ListenerEvent::Chain(chain_event) => {
                trace!("chain_listener: {:?}", chain_event);
                let event_desc = format!("{:?}", chain_event);
                if let Err(e) = network_client
                    .apply_event(chain_event)
                    .await
                    .map_err(ChainListenerError::NetworkClientError)?
                {
                    log_apply_error(&event_desc, &e);
                }
            }
            ListenerEvent::ChainClosed => {
                warn!("chain_listener: Chain event stream was closed");
                return Err(ChainListenerError::EventStreamClosed);
            }
            ListenerEvent::Stop => {
                info!("chain_listener: Stopped");
                return Ok(());
            }
        }
        // For testing:
        if let Some(ref mut debug_event_sender) = opt_debug_event_sender {
            let _ = debug_event_sender.send(()).await;
        }
    }
    Ok(())
}

/// Feed chain events into the network service, one event at a time.
///
/// Failures to apply a single event are logged and do not stop the listener. Returns `Ok(())`
/// once a stop signal is received (an event that is being applied is completed first), or
/// `Err(EventStreamClosed)` if the event stream ends.
pub async fn chain_listener<ES>(
    event_stream: ES,
    stop_receiver: oneshot::Receiver<()>,
    network_client: NetworkClient,
) -> Result<(), ChainListenerError>
where
    ES: Stream<Item = ChainEvent> + Unpin,
{
    // `opt_debug_event_sender` is not needed in production:
    inner_chain_listener(event_stream, stop_receiver, network_client, None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::executor::{block_on, ThreadPool};
    use futures::task::{Spawn, SpawnExt};

    use proto::chain::messages::{ChannelDeposit, ChannelOpened, TokenNetworkAdded};
    use proto::crypto::{Address, ChannelId};

    use crate::service::create_network_service;
    use crate::state::NetworkState;

    fn addr(i: u8) -> Address {
        Address::from(&[i; Address::len()])
    }

    fn chan(i: u8) -> ChannelId {
        ChannelId::from(&[i; ChannelId::len()])
    }

    fn token_network_added() -> ChainEvent {
        ChainEvent::TokenNetworkAdded(TokenNetworkAdded {
            token_address: addr(0xe0),
            token_network_address: addr(0xe1),
            block_number: 1,
            token_decimals: 18,
        })
    }

    fn opened(channel: u8) -> ChainEvent {
        ChainEvent::ChannelOpened(ChannelOpened {
            token_network_address: addr(0xe1),
            channel_id: chan(channel),
            participant1: addr(1),
            participant2: addr(2),
            block_number: 2,
        })
    }

    fn deposit(channel: u8, total_deposit: u128) -> ChainEvent {
        ChainEvent::ChannelDeposit(ChannelDeposit {
            token_network_address: addr(0xe1),
            channel_id: chan(channel),
            participant: addr(1),
            total_deposit,
            block_number: 3,
        })
    }

    async fn task_chain_listener_basic<S>(spawner: S)
    where
        S: Spawn,
    {
        let mut network_client = create_network_service(NetworkState::new(0), &spawner).unwrap();

        let (mut event_sender, event_receiver) = mpsc::channel(0);
        let (_stop_sender, stop_receiver) = oneshot::channel();
        let (debug_event_sender, mut debug_event_receiver) = mpsc::channel(0);

        let listener_handle = spawner
            .spawn_with_handle(inner_chain_listener(
                event_receiver,
                stop_receiver,
                network_client.clone(),
                Some(debug_event_sender),
            ))
            .unwrap();

        event_sender.send(token_network_added()).await.unwrap();
        debug_event_receiver.next().await.unwrap();

        // A bad event does not stop the listener:
        event_sender.send(deposit(9, 5)).await.unwrap();
        debug_event_receiver.next().await.unwrap();
        event_sender.send(token_network_added()).await.unwrap();
        debug_event_receiver.next().await.unwrap();

        event_sender.send(opened(1)).await.unwrap();
        debug_event_receiver.next().await.unwrap();
        event_sender.send(deposit(1, 100)).await.unwrap();
        debug_event_receiver.next().await.unwrap();
        event_sender.send(deposit(1, 40)).await.unwrap();
        debug_event_receiver.next().await.unwrap();
        event_sender.send(ChainEvent::BlockNumber(8)).await.unwrap();
        debug_event_receiver.next().await.unwrap();

        let snapshot = network_client.snapshot(addr(0xe0)).await.unwrap().unwrap();
        let entry = snapshot.channel(&chan(1)).unwrap();
        assert_eq!(entry.usable_capacity(&addr(1)), Some(100));
        // The early deposit to channel 9 is still waiting for the channel to open:
        assert!(snapshot.channel(&chan(9)).is_none());
        assert_eq!(network_client.latest_block().await.unwrap(), 8);

        // Closing the event stream ends the listener with an error:
        drop(event_sender);
        match listener_handle.await {
            Err(ChainListenerError::EventStreamClosed) => {}
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_chain_listener_basic() {
        let thread_pool = ThreadPool::new().unwrap();
        block_on(task_chain_listener_basic(thread_pool.clone()));
    }

    async fn task_chain_listener_stop<S>(spawner: S)
    where
        S: Spawn,
    {
        let mut network_client = create_network_service(NetworkState::new(0), &spawner).unwrap();

        let (mut event_sender, event_receiver) = mpsc::channel(0);
        let (stop_sender, stop_receiver) = oneshot::channel();
        let (debug_event_sender, mut debug_event_receiver) = mpsc::channel(0);

        let listener_handle = spawner
            .spawn_with_handle(inner_chain_listener(
                event_receiver,
                stop_receiver,
                network_client.clone(),
                Some(debug_event_sender),
            ))
            .unwrap();

        event_sender.send(token_network_added()).await.unwrap();
        debug_event_receiver.next().await.unwrap();

        stop_sender.send(()).unwrap();
        match listener_handle.await {
            Ok(()) => {}
            Err(_) => unreachable!(),
        }

        // Events after the stop signal are not applied:
        assert!(event_sender.send(opened(1)).await.is_err());
        let snapshot = network_client.snapshot(addr(0xe0)).await.unwrap().unwrap();
        assert!(snapshot.channel(&chan(1)).is_none());
    }

    #[test]
    fn test_chain_listener_stop() {
        let thread_pool = ThreadPool::new().unwrap();
        block_on(task_chain_listener_stop(thread_pool.clone()));
    }

    #[test]
    fn test_chain_listener_replay() {
        let thread_pool = ThreadPool::new().unwrap();
        let mut network_client = create_network_service(NetworkState::new(0), thread_pool).unwrap();

        // Events out of order: the deposit arrives before the channel is opened.
        let events = vec![token_network_added(), deposit(1, 70), opened(1)];
        let (_stop_sender, stop_receiver) = oneshot::channel();
        let res = block_on(chain_listener(
            stream::iter(events),
            stop_receiver,
            network_client.clone(),
        ));
        match res {
            Err(ChainListenerError::EventStreamClosed) => {}
            _ => unreachable!(),
        }

        let snapshot = block_on(network_client.snapshot(addr(0xe0))).unwrap().unwrap();
        assert_eq!(
            snapshot.channel(&chan(1)).unwrap().usable_capacity(&addr(1)),
            Some(70)
        );
    }
}
