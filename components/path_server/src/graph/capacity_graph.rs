use proto::crypto::{Address, ChannelId};
use proto::fee::messages::Rate;

use crate::token_network::TokenNetwork;

pub trait LinearRate
where
    Self: std::marker::Sized,
{
    /// Type used to count credits
    type K;

    /// The zero LinearRate:
    fn zero() -> Self;
    /// Calculate the fee for forwarding a certain amount of credits being passed.
    /// The resulting fee is also an amount of credits.
    fn calc_fee(&self, k: Self::K) -> Option<Self::K>;
}

impl LinearRate for Rate {
    type K = u128;

    fn zero() -> Self {
        Rate::new()
    }

    fn calc_fee(&self, k: u128) -> Option<u128> {
        Rate::calc_fee(self, k)
    }
}

/// A directed edge, leaving some node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityEdge<N, E, C> {
    /// Identifies the edge. There might be multiple edges between two nodes.
    pub edge: E,
    pub to: N,
    /// Amount of credits that can be pushed along this edge
    pub send_capacity: C,
}

pub trait CapacityGraph {
    type Node; // Node type
    type Edge; // Edge identifier
    type Capacity; // Directed capacity between two neighboring nodes

    /// All the edges leaving `a`
    fn edges_from(&self, a: &Self::Node) -> Vec<CapacityEdge<Self::Node, Self::Edge, Self::Capacity>>;
}

/// Every open channel contributes two directed edges, one per participant.
/// The capacity of an edge is the usable capacity of the sending participant.
impl CapacityGraph for TokenNetwork {
    type Node = Address;
    type Edge = ChannelId;
    type Capacity = u128;

    fn edges_from(&self, a: &Address) -> Vec<CapacityEdge<Address, ChannelId, u128>> {
        self.channels_of(a)
            .into_iter()
            .filter(|entry| entry.is_open())
            .filter_map(|entry| {
                let to = *entry.partner(a)?;
                let send_capacity = match entry.usable_capacity(a) {
                    Some(send_capacity) => send_capacity,
                    None => {
                        error!(
                            "edges_from(): Negative usable capacity in channel {}",
                            entry.channel_id
                        );
                        return None;
                    }
                };
                Some(CapacityEdge {
                    edge: entry.channel_id,
                    to,
                    send_capacity,
                })
            })
            .collect()
    }
}
