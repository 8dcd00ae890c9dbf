use derive_more::From;

use proto::balance::messages::UpdateBalance;
use proto::consts::MAX_ROUTES;
use proto::crypto::{Address, ChannelId, TokenAddress};
use proto::fee::messages::{FeeScope, Rate};
use proto::path::messages::{FindRoutes, RouteInfo};

use signature::verify::RecoverSigner;

use crate::balance_proof::BalanceProofError;
use crate::channel::ChannelLedgerEntry;
use crate::fee_policy::{FeePolicy, FeePolicyError};
use crate::route_finder::{find_token_routes, RouteFinderError};
use crate::service::{NetworkClient, NetworkClientError};

#[derive(Debug, From)]
pub enum UpdateBalanceError {
    BalanceProofError(BalanceProofError),
    NetworkClientError(NetworkClientError),
}

impl UpdateBalanceError {
    /// Was the request itself at fault (as opposed to the service)?
    pub fn is_client_error(&self) -> bool {
        match self {
            UpdateBalanceError::BalanceProofError(_) => true,
            UpdateBalanceError::NetworkClientError(_) => false,
        }
    }
}

#[derive(Debug, From)]
pub enum FindRoutesError {
    NetworkClientError(NetworkClientError),
    RouteFinderError(RouteFinderError),
}

/// Entry point for all the operations of the path finding service.
#[derive(Clone)]
pub struct Pathfinder<RS> {
    network_client: NetworkClient,
    fee_policy: FeePolicy,
    recover_signer: RS,
    /// Amount of routes returned when a query does not specify it
    default_max_routes: usize,
}

impl<RS> Pathfinder<RS>
where
    RS: RecoverSigner,
{
    pub fn new(
        network_client: NetworkClient,
        fee_policy: FeePolicy,
        recover_signer: RS,
        default_max_routes: usize,
    ) -> Self {
        Pathfinder {
            network_client,
            fee_policy,
            recover_signer,
            default_max_routes,
        }
    }

    /// Update a channel with a balance proof signed by the partner of `peer`.
    /// Returns the address of the partner.
    pub async fn update_balance(
        &mut self,
        peer: Address,
        update_balance: UpdateBalance,
    ) -> Result<Address, UpdateBalanceError> {
        let opt_signer = self
            .recover_signer
            .recover_signer(&update_balance.balance_proof);
        let channel_id = update_balance.balance_proof.channel_id;
        let res = self
            .network_client
            .apply_balance_proof(peer, update_balance, opt_signer)
            .await?;
        if let Err(e) = &res {
            warn!(
                "update_balance: Rejected balance proof from {} for channel {}: {:?}",
                peer, channel_id, e
            );
        }
        Ok(res?)
    }

    /// Find routes inside the token network of `find_routes.token_address`.
    /// An unknown token has no routes.
    pub async fn find_routes(
        &mut self,
        find_routes: FindRoutes,
    ) -> Result<Vec<RouteInfo>, FindRoutesError> {
        let max_routes = find_routes
            .opt_max_routes
            .unwrap_or(self.default_max_routes)
            .min(MAX_ROUTES);

        let token_network = match self
            .network_client
            .snapshot(find_routes.token_address)
            .await?
        {
            Some(token_network) => token_network,
            None => return Ok(Vec::new()),
        };

        // The search runs over the snapshot, without blocking the network service:
        Ok(find_token_routes(
            &token_network,
            &self.fee_policy,
            &find_routes.source,
            &find_routes.target,
            find_routes.amount,
            max_routes,
        )?)
    }

    /// Open channels of `address` for a token.
    pub async fn channels_of(
        &mut self,
        token_address: TokenAddress,
        address: Address,
    ) -> Result<Vec<ChannelLedgerEntry>, NetworkClientError> {
        self.network_client.channels_of(token_address, address).await
    }

    pub fn channel_rate(&self, channel_id: &ChannelId, peer: &Address) -> Result<Rate, FeePolicyError> {
        self.fee_policy.rate_for(&FeeScope::Channel(*channel_id), peer)
    }

    pub fn set_channel_rate(
        &self,
        channel_id: &ChannelId,
        peer: &Address,
        rate: &Rate,
    ) -> Result<(), FeePolicyError> {
        self.fee_policy
            .record_rate(&FeeScope::Channel(*channel_id), peer, rate)
    }

    pub fn token_rate(&self, token_address: &TokenAddress, peer: &Address) -> Result<Rate, FeePolicyError> {
        self.fee_policy.rate_for(&FeeScope::Token(*token_address), peer)
    }

    pub fn set_token_rate(
        &self,
        token_address: &TokenAddress,
        peer: &Address,
        rate: &Rate,
    ) -> Result<(), FeePolicyError> {
        self.fee_policy
            .record_rate(&FeeScope::Token(*token_address), peer, rate)
    }

    pub fn account_rate(&self, peer: &Address) -> Result<Rate, FeePolicyError> {
        self.fee_policy.rate_for(&FeeScope::Account, peer)
    }

    pub fn set_account_rate(&self, peer: &Address, rate: &Rate) -> Result<(), FeePolicyError> {
        self.fee_policy.record_rate(&FeeScope::Account, peer, rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use futures::executor::{block_on, ThreadPool};
    use futures::task::Spawn;

    use crypto::identity::{Identity, SoftwareEd25519Identity};
    use database::MemFeeRateStore;
    use proto::balance::messages::BalanceProof;
    use proto::chain::messages::{
        ChainEvent, ChannelClosed, ChannelDeposit, ChannelOpened, TokenNetworkAdded,
    };
    use proto::crypto::{HashResult, PrivateKey, Signature};
    use signature::signature_buff::sign_balance_proof;
    use signature::verify::Ed25519RecoverSigner;

    use crate::service::create_network_service;
    use crate::state::NetworkState;

    fn addr(i: u8) -> Address {
        Address::from(&[i; Address::len()])
    }

    fn chan(i: u8) -> ChannelId {
        ChannelId::from(&[i; ChannelId::len()])
    }

    fn identity(seed: u8) -> SoftwareEd25519Identity {
        SoftwareEd25519Identity::from_private_key(&PrivateKey::from(&[seed; PrivateKey::len()]))
            .unwrap()
    }

    const TOKEN: u8 = 0xe0;
    const TOKEN_NETWORK: u8 = 0xe1;

    fn create_pathfinder<S: Spawn>(spawner: S) -> Pathfinder<Ed25519RecoverSigner> {
        let network_client = create_network_service(NetworkState::new(0), spawner).unwrap();
        let fee_policy = FeePolicy::new(Arc::new(MemFeeRateStore::new()));
        Pathfinder::new(network_client, fee_policy, Ed25519RecoverSigner, 1)
    }

    async fn apply(pathfinder: &mut Pathfinder<Ed25519RecoverSigner>, event: ChainEvent) {
        pathfinder
            .network_client
            .apply_event(event)
            .await
            .unwrap()
            .unwrap();
    }

    async fn open_channel(
        pathfinder: &mut Pathfinder<Ed25519RecoverSigner>,
        channel: u8,
        a: Address,
        b: Address,
        deposit_a: u128,
    ) {
        apply(
            pathfinder,
            ChainEvent::ChannelOpened(ChannelOpened {
                token_network_address: addr(TOKEN_NETWORK),
                channel_id: chan(channel),
                participant1: a,
                participant2: b,
                block_number: 2,
            }),
        )
        .await;
        apply(
            pathfinder,
            ChainEvent::ChannelDeposit(ChannelDeposit {
                token_network_address: addr(TOKEN_NETWORK),
                channel_id: chan(channel),
                participant: a,
                total_deposit: deposit_a,
                block_number: 3,
            }),
        )
        .await;
    }

    async fn add_token_network(pathfinder: &mut Pathfinder<Ed25519RecoverSigner>) {
        apply(
            pathfinder,
            ChainEvent::TokenNetworkAdded(TokenNetworkAdded {
                token_address: addr(TOKEN),
                token_network_address: addr(TOKEN_NETWORK),
                block_number: 1,
                token_decimals: 18,
            }),
        )
        .await;
    }

    fn find_routes_request(source: Address, target: Address, amount: u128) -> FindRoutes {
        FindRoutes {
            token_address: addr(TOKEN),
            source,
            target,
            amount,
            opt_max_routes: None,
        }
    }

    async fn task_pathfinder_open_route_close<S>(spawner: S)
    where
        S: Spawn,
    {
        let mut pathfinder = create_pathfinder(spawner);
        let a = addr(0xa);
        let b = addr(0xb);

        // Unknown token:
        let routes = pathfinder
            .find_routes(find_routes_request(a, b, 50))
            .await
            .unwrap();
        assert!(routes.is_empty());

        add_token_network(&mut pathfinder).await;
        open_channel(&mut pathfinder, 1, a, b, 100).await;
        pathfinder
            .set_channel_rate(&chan(1), &b, &Rate { mul: 0, add: 1 })
            .unwrap();
        assert_eq!(
            pathfinder.channel_rate(&chan(1), &b).unwrap(),
            Rate { mul: 0, add: 1 }
        );

        let routes = pathfinder
            .find_routes(find_routes_request(a, b, 50))
            .await
            .unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path(), vec![a, b]);
        assert_eq!(routes[0].fee_total, 1);
        assert_eq!(routes[0].received_amount, 49);

        assert_eq!(
            pathfinder.channels_of(addr(TOKEN), a).await.unwrap().len(),
            1
        );

        apply(
            &mut pathfinder,
            ChainEvent::ChannelClosed(ChannelClosed {
                token_network_address: addr(TOKEN_NETWORK),
                channel_id: chan(1),
                block_number: 4,
            }),
        )
        .await;

        let routes = pathfinder
            .find_routes(find_routes_request(a, b, 50))
            .await
            .unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn test_pathfinder_open_route_close() {
        let thread_pool = ThreadPool::new().unwrap();
        block_on(task_pathfinder_open_route_close(thread_pool.clone()));
    }

    async fn task_pathfinder_two_hops<S>(spawner: S)
    where
        S: Spawn,
    {
        let mut pathfinder = create_pathfinder(spawner);
        let (a, b, c) = (addr(0xa), addr(0xb), addr(0xc));

        add_token_network(&mut pathfinder).await;
        open_channel(&mut pathfinder, 1, a, b, 100).await;
        open_channel(&mut pathfinder, 2, b, c, 40).await;

        let routes = pathfinder
            .find_routes(find_routes_request(a, c, 50))
            .await
            .unwrap();
        assert!(routes.is_empty());

        let routes = pathfinder
            .find_routes(find_routes_request(a, c, 30))
            .await
            .unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path(), vec![a, b, c]);

        // Asking for more routes than exist:
        let mut request = find_routes_request(a, c, 30);
        request.opt_max_routes = Some(1000);
        let routes = pathfinder.find_routes(request).await.unwrap();
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn test_pathfinder_two_hops() {
        let thread_pool = ThreadPool::new().unwrap();
        block_on(task_pathfinder_two_hops(thread_pool.clone()));
    }

    fn signed_update_balance<I: Identity>(
        identity: &I,
        nonce: u64,
        transferred_amount: u128,
    ) -> UpdateBalance {
        let mut balance_proof = BalanceProof {
            nonce,
            transferred_amount,
            channel_id: chan(1),
            locksroot: HashResult::default(),
            additional_hash: HashResult::default(),
            signature: Signature::default(),
        };
        sign_balance_proof(identity, &mut balance_proof);
        UpdateBalance {
            balance_proof,
            locks_amount: 0,
        }
    }

    async fn task_pathfinder_update_balance<S>(spawner: S)
    where
        S: Spawn,
    {
        let mut pathfinder = create_pathfinder(spawner);
        let identity_a = identity(1);
        let identity_b = identity(2);
        let a = identity_a.get_address();
        let b = identity_b.get_address();

        add_token_network(&mut pathfinder).await;
        open_channel(&mut pathfinder, 1, a, b, 100).await;

        // `b` submits a proof signed by `a`:
        let counterparty = pathfinder
            .update_balance(b, signed_update_balance(&identity_a, 5, 60))
            .await
            .unwrap();
        assert_eq!(counterparty, a);

        // The same nonce again:
        let err = pathfinder
            .update_balance(b, signed_update_balance(&identity_a, 5, 70))
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        match err {
            UpdateBalanceError::BalanceProofError(BalanceProofError::StaleNonce) => {}
            _ => unreachable!(),
        }

        // Signed by the submitter itself:
        match pathfinder
            .update_balance(b, signed_update_balance(&identity_b, 6, 10))
            .await
        {
            Err(UpdateBalanceError::BalanceProofError(BalanceProofError::InvalidSignature)) => {}
            _ => unreachable!(),
        }

        // Tampered proof:
        let mut update_balance = signed_update_balance(&identity_a, 6, 10);
        update_balance.balance_proof.transferred_amount = 0;
        match pathfinder.update_balance(b, update_balance).await {
            Err(UpdateBalanceError::BalanceProofError(BalanceProofError::InvalidSignature)) => {}
            _ => unreachable!(),
        }

        // Too much transferred:
        match pathfinder
            .update_balance(b, signed_update_balance(&identity_a, 6, 101))
            .await
        {
            Err(UpdateBalanceError::BalanceProofError(BalanceProofError::CapacityExceeded)) => {}
            _ => unreachable!(),
        }

        // a can now send only 40:
        let routes = pathfinder
            .find_routes(find_routes_request(a, b, 50))
            .await
            .unwrap();
        assert!(routes.is_empty());
        let routes = pathfinder
            .find_routes(find_routes_request(a, b, 40))
            .await
            .unwrap();
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn test_pathfinder_update_balance() {
        let thread_pool = ThreadPool::new().unwrap();
        block_on(task_pathfinder_update_balance(thread_pool.clone()));
    }

    #[test]
    fn test_pathfinder_rates() {
        let thread_pool = ThreadPool::new().unwrap();
        let pathfinder = create_pathfinder(thread_pool);
        let peer = addr(7);

        assert_eq!(pathfinder.account_rate(&peer).unwrap(), Rate::new());
        pathfinder
            .set_account_rate(&peer, &Rate { mul: 1, add: 2 })
            .unwrap();
        pathfinder
            .set_token_rate(&addr(TOKEN), &peer, &Rate { mul: 3, add: 4 })
            .unwrap();
        assert_eq!(
            pathfinder.account_rate(&peer).unwrap(),
            Rate { mul: 1, add: 2 }
        );
        assert_eq!(
            pathfinder.token_rate(&addr(TOKEN), &peer).unwrap(),
            Rate { mul: 3, add: 4 }
        );
        assert_eq!(pathfinder.channel_rate(&chan(1), &peer).unwrap(), Rate::new());
    }
}
