#![crate_type = "lib"]
#![deny(trivial_numeric_casts)]
#![allow(
    clippy::too_many_arguments,
    clippy::implicit_hasher,
    clippy::module_inception,
    clippy::new_without_default
)]

#[macro_use]
extern crate log;

mod applier;
mod balance_proof;
mod chain_listener;
mod channel;
mod fee_policy;
mod graph;
mod pathfinder;
mod route_finder;
mod service;
mod state;
mod token_network;

pub use self::applier::log_apply_error;
pub use self::balance_proof::BalanceProofError;
pub use self::chain_listener::{chain_listener, ChainListenerError};
pub use self::channel::{ChannelLedgerEntry, ChannelStatus, ParticipantState};
pub use self::fee_policy::{FeePolicy, FeePolicyError};
pub use self::pathfinder::{FindRoutesError, Pathfinder, UpdateBalanceError};
pub use self::route_finder::{find_token_routes, RouteFinderError};
pub use self::service::{create_network_service, NetworkClient, NetworkClientError};
pub use self::state::NetworkState;
pub use self::token_network::{ApplyError, TokenNetwork};
