use std::collections::{HashMap, HashSet};

use derive_more::From;

use proto::crypto::{Address, ChannelId, TokenAddress};
use proto::fee::messages::Rate;
use proto::path::messages::{RouteHop, RouteInfo};

use crate::fee_policy::{FeePolicy, FeePolicyError};
use crate::graph::capacity_graph::{CapacityGraph, LinearRate};
use crate::graph::dijkstra::dijkstra;
use crate::token_network::TokenNetwork;

#[derive(Debug, From)]
pub enum RouteFinderError {
    FeePolicyError(FeePolicyError),
}

/// Rates charged for pushing credits along directed channel edges.
pub trait HopRates {
    type Rate: LinearRate<K = u128>;

    /// The rate charged when sending credits through `channel_id` to `to`.
    fn hop_rate(&mut self, channel_id: &ChannelId, to: &Address) -> Result<Self::Rate, FeePolicyError>;
}

/// Fee policy lookups for one token, cached for the duration of a single search.
pub struct CachedHopRates<'a> {
    fee_policy: &'a FeePolicy,
    token_address: TokenAddress,
    cache: HashMap<(ChannelId, Address), Rate>,
}

impl<'a> CachedHopRates<'a> {
    pub fn new(fee_policy: &'a FeePolicy, token_address: TokenAddress) -> Self {
        CachedHopRates {
            fee_policy,
            token_address,
            cache: HashMap::new(),
        }
    }
}

impl<'a> HopRates for CachedHopRates<'a> {
    type Rate = Rate;

    fn hop_rate(&mut self, channel_id: &ChannelId, to: &Address) -> Result<Rate, FeePolicyError> {
        if let Some(rate) = self.cache.get(&(*channel_id, *to)) {
            return Ok(rate.clone());
        }
        let rate = self
            .fee_policy
            .hop_rate(&self.token_address, channel_id, to)?;
        self.cache.insert((*channel_id, *to), rate.clone());
        Ok(rate)
    }
}

/// Compute the fees along a path, each hop taking its fee from the amount it forwards.
/// Returns `None` if the fees exceed the amount.
fn build_route<HR: HopRates>(
    source: &Address,
    path: &[(Address, ChannelId)],
    amount: u128,
    edge_capacities: &HashMap<(ChannelId, Address), u128>,
    hop_rates: &mut HR,
) -> Result<Option<RouteInfo>, FeePolicyError> {
    let mut hops = Vec::new();
    let mut forwarded = amount;
    let mut from = *source;

    for (to, channel_id) in path {
        let capacity = match edge_capacities.get(&(*channel_id, from)) {
            Some(capacity) => *capacity,
            None => return Ok(None),
        };
        let rate = hop_rates.hop_rate(channel_id, to)?;
        let fee = match rate.calc_fee(forwarded) {
            Some(fee) => fee,
            None => return Ok(None),
        };
        forwarded = match forwarded.checked_sub(fee) {
            Some(forwarded) => forwarded,
            None => return Ok(None),
        };
        hops.push(RouteHop {
            channel_id: *channel_id,
            from,
            to: *to,
            capacity,
            fee,
        });
        from = *to;
    }

    let capacity = hops.iter().map(|hop| hop.capacity).min().unwrap_or(0);
    Ok(Some(RouteInfo {
        hops,
        send_amount: amount,
        fee_total: amount - forwarded,
        received_amount: forwarded,
        capacity,
    }))
}

/// Find up to `max_routes` routes able to carry `amount` credits from `source` to `target`.
///
/// Only edges with capacity of at least `amount` are considered. The weight of an edge is the
/// fee charged on what is still forwarded when reaching it, which is `amount` minus the fees of
/// the previous hops, so the cost of a path is its `fee_total`. Every route after the first
/// avoids the directed edges of all previous routes. Routes are returned cheapest first; an
/// empty result means that no route exists.
pub fn find_routes<G, HR>(
    graph: &G,
    source: &Address,
    target: &Address,
    amount: u128,
    max_routes: usize,
    hop_rates: &mut HR,
) -> Result<Vec<RouteInfo>, RouteFinderError>
where
    G: CapacityGraph<Node = Address, Edge = ChannelId, Capacity = u128>,
    HR: HopRates,
{
    let mut routes = Vec::new();
    if source == target || max_routes == 0 {
        return Ok(routes);
    }

    // Directed edges, as (channel, sender):
    let mut excluded: HashSet<(ChannelId, Address)> = HashSet::new();
    let mut edge_capacities: HashMap<(ChannelId, Address), u128> = HashMap::new();

    while routes.len() < max_routes {
        let opt_path = dijkstra(source, target, |node, fees| -> Result<Vec<_>, FeePolicyError> {
            let mut edges = Vec::new();
            let forwarded = match amount.checked_sub(fees) {
                Some(forwarded) => forwarded,
                None => return Ok(edges),
            };
            for capacity_edge in graph.edges_from(node) {
                if capacity_edge.send_capacity < amount
                    || excluded.contains(&(capacity_edge.edge, *node))
                {
                    continue;
                }
                let rate = hop_rates.hop_rate(&capacity_edge.edge, &capacity_edge.to)?;
                let weight = match rate.calc_fee(forwarded) {
                    Some(weight) if weight <= forwarded => weight,
                    _ => continue,
                };
                edge_capacities.insert((capacity_edge.edge, *node), capacity_edge.send_capacity);
                edges.push((capacity_edge.edge, capacity_edge.to, weight));
            }
            Ok(edges)
        })?;

        let path = match opt_path {
            Some((_cost, path)) => path,
            None => break,
        };

        let mut from = *source;
        for (to, channel_id) in &path {
            excluded.insert((*channel_id, from));
            from = *to;
        }

        match build_route(source, &path, amount, &edge_capacities, hop_rates)? {
            Some(route_info) => routes.push(route_info),
            None => debug!("find_routes(): Fees exceed the amount along a path, skipping"),
        }
    }
    Ok(routes)
}

/// Search routes inside a snapshot of a token network, using the current fee rates.
pub fn find_token_routes(
    token_network: &TokenNetwork,
    fee_policy: &FeePolicy,
    source: &Address,
    target: &Address,
    amount: u128,
    max_routes: usize,
) -> Result<Vec<RouteInfo>, RouteFinderError> {
    let mut hop_rates = CachedHopRates::new(fee_policy, token_network.token_address);
    find_routes(
        token_network,
        source,
        target,
        amount,
        max_routes,
        &mut hop_rates,
    )
}
