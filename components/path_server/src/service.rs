use futures::channel::{mpsc, oneshot};
use futures::task::{Spawn, SpawnError, SpawnExt};
use futures::{SinkExt, StreamExt};

use proto::balance::messages::UpdateBalance;
use proto::chain::messages::ChainEvent;
use proto::crypto::{Address, BlockNumber, TokenAddress, TokenNetworkAddress};

use crate::balance_proof::BalanceProofError;
use crate::channel::ChannelLedgerEntry;
use crate::state::NetworkState;
use crate::token_network::{ApplyError, TokenNetwork};

pub enum NetworkRequest {
    /// Apply a chain event
    ApplyEvent(ChainEvent, oneshot::Sender<Result<(), ApplyError>>),
    /// Apply a balance proof submitted by a peer: (peer, update, recovered signer)
    ApplyBalanceProof(
        Address,
        UpdateBalance,
        Option<Address>,
        oneshot::Sender<Result<Address, BalanceProofError>>,
    ),
    /// Get a snapshot of the token network of a token
    Snapshot(TokenAddress, oneshot::Sender<Option<TokenNetwork>>),
    /// Open channels of an address inside the token network of a token
    ChannelsOf(
        TokenAddress,
        Address,
        oneshot::Sender<Vec<ChannelLedgerEntry>>,
    ),
    UnregisterTokenNetwork(TokenNetworkAddress, oneshot::Sender<bool>),
    LatestBlock(oneshot::Sender<BlockNumber>),
}

/// Process one NetworkRequest, and send the response through the provided sender.
fn process_request(network_state: &mut NetworkState, network_request: NetworkRequest) {
    match network_request {
        NetworkRequest::ApplyEvent(event, sender) => {
            let _ = sender.send(network_state.apply_event(event));
        }
        NetworkRequest::ApplyBalanceProof(peer, update_balance, opt_signer, sender) => {
            let _ = sender.send(network_state.apply_balance_proof(
                &peer,
                &update_balance,
                opt_signer,
            ));
        }
        NetworkRequest::Snapshot(token_address, sender) => {
            let _ = sender.send(network_state.snapshot(&token_address));
        }
        NetworkRequest::ChannelsOf(token_address, address, sender) => {
            let channels = match network_state.token_network_by_token(&token_address) {
                Some(token_network) => token_network
                    .channels_of(&address)
                    .into_iter()
                    .cloned()
                    .collect(),
                None => Vec::new(),
            };
            let _ = sender.send(channels);
        }
        NetworkRequest::UnregisterTokenNetwork(token_network_address, sender) => {
            let _ = sender.send(
                network_state
                    .unregister_token_network(&token_network_address)
                    .is_some(),
            );
        }
        NetworkRequest::LatestBlock(sender) => {
            let _ = sender.send(network_state.latest_block());
        }
    }
}

/// Owns the network state. All mutations are serialized through this loop.
async fn network_service_loop(
    mut network_state: NetworkState,
    mut incoming_requests: mpsc::Receiver<NetworkRequest>,
) {
    while let Some(network_request) = incoming_requests.next().await {
        process_request(&mut network_state, network_request);
    }
    info!("network_service_loop(): All clients are gone, closing");
}

#[derive(Debug)]
pub enum NetworkClientError {
    SendRequestError,
    ResponseReceiverClosed,
}

impl From<oneshot::Canceled> for NetworkClientError {
    fn from(_from: oneshot::Canceled) -> NetworkClientError {
        NetworkClientError::ResponseReceiverClosed
    }
}

impl From<mpsc::SendError> for NetworkClientError {
    fn from(_from: mpsc::SendError) -> NetworkClientError {
        NetworkClientError::SendRequestError
    }
}

#[derive(Clone)]
pub struct NetworkClient {
    requests_sender: mpsc::Sender<NetworkRequest>,
}

impl NetworkClient {
    pub fn new(requests_sender: mpsc::Sender<NetworkRequest>) -> Self {
        NetworkClient { requests_sender }
    }

    /// Apply a chain event. Returns after the event was applied.
    pub async fn apply_event(
        &mut self,
        event: ChainEvent,
    ) -> Result<Result<(), ApplyError>, NetworkClientError> {
        let (sender, receiver) = oneshot::channel();
        self.requests_sender
            .send(NetworkRequest::ApplyEvent(event, sender))
            .await?;
        Ok(receiver.await?)
    }

    /// Apply a balance proof submitted by `peer`, signed by `opt_signer`.
    pub async fn apply_balance_proof(
        &mut self,
        peer: Address,
        update_balance: UpdateBalance,
        opt_signer: Option<Address>,
    ) -> Result<Result<Address, BalanceProofError>, NetworkClientError> {
        let (sender, receiver) = oneshot::channel();
        self.requests_sender
            .send(NetworkRequest::ApplyBalanceProof(
                peer,
                update_balance,
                opt_signer,
                sender,
            ))
            .await?;
        Ok(receiver.await?)
    }

    /// Obtain a snapshot of the token network of `token_address`.
    /// Later changes to the state do not affect the snapshot.
    pub async fn snapshot(
        &mut self,
        token_address: TokenAddress,
    ) -> Result<Option<TokenNetwork>, NetworkClientError> {
        let (sender, receiver) = oneshot::channel();
        self.requests_sender
            .send(NetworkRequest::Snapshot(token_address, sender))
            .await?;
        Ok(receiver.await?)
    }

    pub async fn channels_of(
        &mut self,
        token_address: TokenAddress,
        address: Address,
    ) -> Result<Vec<ChannelLedgerEntry>, NetworkClientError> {
        let (sender, receiver) = oneshot::channel();
        self.requests_sender
            .send(NetworkRequest::ChannelsOf(token_address, address, sender))
            .await?;
        Ok(receiver.await?)
    }

    /// Returns true if the token network was registered.
    pub async fn unregister_token_network(
        &mut self,
        token_network_address: TokenNetworkAddress,
    ) -> Result<bool, NetworkClientError> {
        let (sender, receiver) = oneshot::channel();
        self.requests_sender
            .send(NetworkRequest::UnregisterTokenNetwork(
                token_network_address,
                sender,
            ))
            .await?;
        Ok(receiver.await?)
    }

    pub async fn latest_block(&mut self) -> Result<BlockNumber, NetworkClientError> {
        let (sender, receiver) = oneshot::channel();
        self.requests_sender
            .send(NetworkRequest::LatestBlock(sender))
            .await?;
        Ok(receiver.await?)
    }
}

/// Spawn a network service, returning a NetworkClient on success.
/// NetworkClient can be cloned to allow multiple clients.
pub fn create_network_service<S>(
    network_state: NetworkState,
    spawner: S,
) -> Result<NetworkClient, SpawnError>
where
    S: Spawn,
{
    let (requests_sender, requests_receiver) = mpsc::channel(0);
    spawner.spawn(network_service_loop(network_state, requests_receiver))?;
    Ok(NetworkClient::new(requests_sender))
}
