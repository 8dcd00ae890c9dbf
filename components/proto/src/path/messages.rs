use serde::{Deserialize, Serialize};

use crate::crypto::{Address, ChannelId, TokenAddress};

/// A request for routes from `source` to `target` able to carry `amount` credits of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindRoutes {
    pub token_address: TokenAddress,
    pub source: Address,
    pub target: Address,
    pub amount: u128,
    /// Maximum amount of routes to return. `None` means the configured default.
    pub opt_max_routes: Option<usize>,
}

/// A single hop of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHop {
    pub channel_id: ChannelId,
    pub from: Address,
    pub to: Address,
    /// Sending capacity of `from` inside the channel.
    pub capacity: u128,
    /// Fee deducted at this hop.
    pub fee: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub hops: Vec<RouteHop>,
    /// Amount requested to be sent.
    pub send_amount: u128,
    /// Sum of all fees deducted along the route.
    pub fee_total: u128,
    /// Amount arriving at the target: `send_amount - fee_total`.
    pub received_amount: u128,
    /// Capacity of the weakest hop.
    pub capacity: u128,
}

impl RouteInfo {
    /// All addresses along the route, starting with the source and ending with the target.
    pub fn path(&self) -> Vec<Address> {
        let mut path = Vec::new();
        if let Some(first_hop) = self.hops.first() {
            path.push(first_hop.from);
        }
        path.extend(self.hops.iter().map(|hop| hop.to));
        path
    }
}
