use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use futures::executor::{block_on, ThreadPool};

use derive_more::From;

use structopt::StructOpt;

use proto::crypto::{Address, BlockNumber, ChannelId, TokenAddress};
use proto::fee::messages::Rate;
use proto::path::messages::FindRoutes;

use database::{FeeRateStore, FeeStoreError, MemFeeRateStore, SqliteFeeRateStore};
use signature::verify::Ed25519RecoverSigner;

use path_server::{
    create_network_service, FeePolicy, FeePolicyError, FindRoutesError, NetworkClient,
    NetworkClientError, NetworkState, Pathfinder,
};

use crate::stpath::checkpoint::{load_checkpoint, store_checkpoint, CheckpointError};
use crate::stpath::config::{load_config, ConfigError, PathConfig};
use crate::stpath::replay::{read_event_log, replay_events, ReplayError};

#[derive(Debug, From)]
pub enum PathBinError {
    CreateThreadPoolError,
    SpawnNetworkServiceError,
    /// A channel or token scope requires a key
    MissingScopeKey,
    InvalidScopeKey,
    WriteError,
    ConfigError(ConfigError),
    CheckpointError(CheckpointError),
    ReplayError(ReplayError),
    FeeStoreError(FeeStoreError),
    FeePolicyError(FeePolicyError),
    FindRoutesError(FindRoutesError),
    NetworkClientError(NetworkClientError),
    SerializeError(serde_json::error::Error),
}

/// Granularity of a fee rate, as given on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateScope {
    Channel,
    Token,
    Account,
}

impl FromStr for RateScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "channel" => Ok(RateScope::Channel),
            "token" => Ok(RateScope::Token),
            "account" => Ok(RateScope::Account),
            _ => Err(format!("invalid scope: {}", s)),
        }
    }
}

/// Find routes between two addresses
#[derive(Clone, Debug, StructOpt)]
pub struct RoutesCmd {
    /// Token address
    #[structopt(long = "token")]
    pub token: TokenAddress,
    /// Sending address
    #[structopt(long = "source")]
    pub source: Address,
    /// Receiving address
    #[structopt(long = "target")]
    pub target: Address,
    /// Amount of credits to send
    #[structopt(long = "amount")]
    pub amount: u128,
    /// Maximum amount of routes to return
    #[structopt(long = "max-routes")]
    pub max_routes: Option<usize>,
}

#[derive(Clone, Debug, StructOpt)]
pub struct SetRateCmd {
    /// channel, token or account
    #[structopt(long = "scope")]
    pub scope: RateScope,
    /// Channel id (channel scope) or token address (token scope)
    #[structopt(long = "key")]
    pub key: Option<String>,
    /// Address of the peer charging the rate
    #[structopt(long = "peer")]
    pub peer: Address,
    /// Rate, given as MUL:ADD
    #[structopt(long = "rate")]
    pub rate: Rate,
}

#[derive(Clone, Debug, StructOpt)]
pub struct GetRateCmd {
    /// channel, token or account
    #[structopt(long = "scope")]
    pub scope: RateScope,
    /// Channel id (channel scope) or token address (token scope)
    #[structopt(long = "key")]
    pub key: Option<String>,
    /// Address of the peer charging the rate
    #[structopt(long = "peer")]
    pub peer: Address,
}

#[derive(Clone, Debug, StructOpt)]
pub enum StPathSubcommand {
    /// Rebuild the network state from the event log and store a checkpoint
    #[structopt(name = "replay")]
    Replay,
    /// Rebuild the network state, then find routes
    #[structopt(name = "routes")]
    Routes(RoutesCmd),
    /// Record a fee rate
    #[structopt(name = "set-rate")]
    SetRate(SetRateCmd),
    /// Show the current fee rate
    #[structopt(name = "get-rate")]
    GetRate(GetRateCmd),
}

/// stpath: offchain PATH finding
/// Maintains a view of the payment channels of token networks from chain events, and finds
/// routes with enough capacity between addresses.
#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "stpath")]
pub struct StPathCmd {
    /// Configuration file path
    #[structopt(parse(from_os_str), short = "c", long = "config")]
    pub config: PathBuf,
    #[structopt(subcommand)]
    pub subcommand: StPathSubcommand,
}

/// Replay the event log into the network service and store the resulting checkpoint.
async fn replay_and_checkpoint(
    path_config: &PathConfig,
    mut network_client: NetworkClient,
) -> Result<BlockNumber, PathBinError> {
    let events = read_event_log(&path_config.event_log)?;
    replay_events(events, network_client.clone()).await?;
    let latest_block = network_client.latest_block().await?;
    store_checkpoint(&path_config.checkpoint, latest_block)?;
    Ok(latest_block)
}

fn parse_key<T: FromStr>(opt_key: &Option<String>) -> Result<T, PathBinError> {
    let key = opt_key.as_ref().ok_or(PathBinError::MissingScopeKey)?;
    key.parse().map_err(|_| PathBinError::InvalidScopeKey)
}

fn set_rate(
    pathfinder: &Pathfinder<Ed25519RecoverSigner>,
    set_rate_cmd: SetRateCmd,
) -> Result<(), PathBinError> {
    let SetRateCmd {
        scope,
        key,
        peer,
        rate,
    } = set_rate_cmd;

    match scope {
        RateScope::Channel => {
            let channel_id: ChannelId = parse_key(&key)?;
            pathfinder.set_channel_rate(&channel_id, &peer, &rate)?
        }
        RateScope::Token => {
            let token_address: TokenAddress = parse_key(&key)?;
            pathfinder.set_token_rate(&token_address, &peer, &rate)?
        }
        RateScope::Account => pathfinder.set_account_rate(&peer, &rate)?,
    }
    Ok(())
}

fn get_rate(
    pathfinder: &Pathfinder<Ed25519RecoverSigner>,
    get_rate_cmd: GetRateCmd,
) -> Result<Rate, PathBinError> {
    let GetRateCmd { scope, key, peer } = get_rate_cmd;

    Ok(match scope {
        RateScope::Channel => {
            let channel_id: ChannelId = parse_key(&key)?;
            pathfinder.channel_rate(&channel_id, &peer)?
        }
        RateScope::Token => {
            let token_address: TokenAddress = parse_key(&key)?;
            pathfinder.token_rate(&token_address, &peer)?
        }
        RateScope::Account => pathfinder.account_rate(&peer)?,
    })
}

pub fn stpath(st_path_cmd: StPathCmd, writer: &mut impl io::Write) -> Result<(), PathBinError> {
    let StPathCmd { config, subcommand } = st_path_cmd;

    let path_config = load_config(&config)?;

    let fee_store: Arc<dyn FeeRateStore> = match &path_config.fee_db {
        Some(fee_db) => Arc::new(SqliteFeeRateStore::open(fee_db)?),
        None => {
            info!("stpath: No fee_db configured, fee rates are kept in memory");
            Arc::new(MemFeeRateStore::new())
        }
    };

    let latest_block = load_checkpoint(&path_config.checkpoint)?;
    debug!("stpath: Loaded checkpoint: block {}", latest_block);

    let thread_pool = ThreadPool::new().map_err(|_| PathBinError::CreateThreadPoolError)?;
    let network_client = create_network_service(NetworkState::new(latest_block), thread_pool)
        .map_err(|_| PathBinError::SpawnNetworkServiceError)?;

    let mut pathfinder = Pathfinder::new(
        network_client.clone(),
        FeePolicy::new(fee_store),
        Ed25519RecoverSigner::default(),
        path_config.max_routes,
    );

    block_on(async move {
        match subcommand {
            StPathSubcommand::Replay => {
                let latest_block = replay_and_checkpoint(&path_config, network_client).await?;
                writeln!(writer, "Replayed up to block {}", latest_block)
                    .map_err(|_| PathBinError::WriteError)?;
            }
            StPathSubcommand::Routes(routes_cmd) => {
                replay_and_checkpoint(&path_config, network_client).await?;
                let find_routes = FindRoutes {
                    token_address: routes_cmd.token,
                    source: routes_cmd.source,
                    target: routes_cmd.target,
                    amount: routes_cmd.amount,
                    opt_max_routes: routes_cmd.max_routes,
                };
                let routes = pathfinder.find_routes(find_routes).await?;
                writeln!(writer, "{}", serde_json::to_string_pretty(&routes)?)
                    .map_err(|_| PathBinError::WriteError)?;
            }
            StPathSubcommand::SetRate(set_rate_cmd) => set_rate(&pathfinder, set_rate_cmd)?,
            StPathSubcommand::GetRate(get_rate_cmd) => {
                let rate = get_rate(&pathfinder, get_rate_cmd)?;
                writeln!(writer, "{}", rate).map_err(|_| PathBinError::WriteError)?;
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use proto::chain::messages::{ChainEvent, ChannelDeposit, ChannelOpened, TokenNetworkAdded};
    use proto::path::messages::RouteInfo;

    fn addr(i: u8) -> Address {
        Address::from(&[i; Address::len()])
    }

    fn chan(i: u8) -> ChannelId {
        ChannelId::from(&[i; ChannelId::len()])
    }

    /// A line of channels: 1 -- 2 -- 3, each funded by its first participant.
    fn write_event_log(path: &Path) {
        let mut events = vec![ChainEvent::TokenNetworkAdded(TokenNetworkAdded {
            token_address: addr(0xe0),
            token_network_address: addr(0xe1),
            block_number: 1,
            token_decimals: 18,
        })];
        for i in 1u8..3 {
            events.push(ChainEvent::ChannelOpened(ChannelOpened {
                token_network_address: addr(0xe1),
                channel_id: chan(i),
                participant1: addr(i),
                participant2: addr(i + 1),
                block_number: 2,
            }));
            events.push(ChainEvent::ChannelDeposit(ChannelDeposit {
                token_network_address: addr(0xe1),
                channel_id: chan(i),
                participant: addr(i),
                total_deposit: 100,
                block_number: 3,
            }));
        }
        events.push(ChainEvent::BlockNumber(5));

        let data = events
            .iter()
            .map(|event| serde_json::to_string(event).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(path, data).unwrap();
    }

    fn write_config(dir: &Path, with_fee_db: bool) -> PathBuf {
        let mut data = format!(
            "event_log = {:?}\ncheckpoint = {:?}\n",
            dir.join("events.jsonl"),
            dir.join("checkpoint.json")
        );
        if with_fee_db {
            data.push_str(&format!("fee_db = {:?}\n", dir.join("fees.db")));
        }
        let config_path = dir.join("stpath.toml");
        fs::write(&config_path, data).unwrap();
        config_path
    }

    fn run_stpath(config: &Path, subcommand: StPathSubcommand) -> String {
        let st_path_cmd = StPathCmd {
            config: config.to_path_buf(),
            subcommand,
        };
        let mut output = Vec::new();
        stpath(st_path_cmd, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_stpath_replay() {
        let dir = tempdir().unwrap();
        write_event_log(&dir.path().join("events.jsonl"));
        let config_path = write_config(dir.path(), false);

        let output = run_stpath(&config_path, StPathSubcommand::Replay);
        assert_eq!(output, "Replayed up to block 5\n");
        assert_eq!(
            load_checkpoint(&dir.path().join("checkpoint.json")).unwrap(),
            5
        );

        // Replaying again keeps the checkpoint:
        let output = run_stpath(&config_path, StPathSubcommand::Replay);
        assert_eq!(output, "Replayed up to block 5\n");
    }

    #[test]
    fn test_stpath_routes_with_fees() {
        let dir = tempdir().unwrap();
        write_event_log(&dir.path().join("events.jsonl"));
        let config_path = write_config(dir.path(), true);

        // Address 3 charges a flat fee of 2 for incoming credits on channel 2:
        run_stpath(
            &config_path,
            StPathSubcommand::SetRate(SetRateCmd {
                scope: RateScope::Channel,
                key: Some(to_base64_str(&chan(2))),
                peer: addr(3),
                rate: Rate { mul: 0, add: 2 },
            }),
        );
        let output = run_stpath(
            &config_path,
            StPathSubcommand::GetRate(GetRateCmd {
                scope: RateScope::Channel,
                key: Some(to_base64_str(&chan(2))),
                peer: addr(3),
            }),
        );
        assert_eq!(output, "0:2\n");

        let output = run_stpath(
            &config_path,
            StPathSubcommand::Routes(RoutesCmd {
                token: addr(0xe0),
                source: addr(1),
                target: addr(3),
                amount: 10,
                max_routes: None,
            }),
        );
        let routes: Vec<RouteInfo> = serde_json::from_str(&output).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path(), vec![addr(1), addr(2), addr(3)]);
        assert_eq!(routes[0].fee_total, 2);
        assert_eq!(routes[0].received_amount, 8);

        // No route is able to carry more than the weakest channel:
        let output = run_stpath(
            &config_path,
            StPathSubcommand::Routes(RoutesCmd {
                token: addr(0xe0),
                source: addr(1),
                target: addr(3),
                amount: 101,
                max_routes: None,
            }),
        );
        let routes: Vec<RouteInfo> = serde_json::from_str(&output).unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn test_stpath_rate_scope_key() {
        let dir = tempdir().unwrap();
        write_event_log(&dir.path().join("events.jsonl"));
        let config_path = write_config(dir.path(), false);

        let st_path_cmd = StPathCmd {
            config: config_path.clone(),
            subcommand: StPathSubcommand::GetRate(GetRateCmd {
                scope: RateScope::Token,
                key: None,
                peer: addr(3),
            }),
        };
        match stpath(st_path_cmd, &mut Vec::new()) {
            Err(PathBinError::MissingScopeKey) => {}
            _ => unreachable!(),
        }

        let st_path_cmd = StPathCmd {
            config: config_path.clone(),
            subcommand: StPathSubcommand::GetRate(GetRateCmd {
                scope: RateScope::Token,
                key: Some("not base64!".to_owned()),
                peer: addr(3),
            }),
        };
        match stpath(st_path_cmd, &mut Vec::new()) {
            Err(PathBinError::InvalidScopeKey) => {}
            _ => unreachable!(),
        }

        // Account scope needs no key, and unknown rates are zero:
        let output = run_stpath(
            &config_path,
            StPathSubcommand::GetRate(GetRateCmd {
                scope: RateScope::Account,
                key: None,
                peer: addr(3),
            }),
        );
        assert_eq!(output, "0:0\n");
    }

    #[test]
    fn test_rate_scope_from_str() {
        assert_eq!("channel".parse::<RateScope>().unwrap(), RateScope::Channel);
        assert_eq!("token".parse::<RateScope>().unwrap(), RateScope::Token);
        assert_eq!("account".parse::<RateScope>().unwrap(), RateScope::Account);
        assert!("global".parse::<RateScope>().is_err());
    }

    /// The command line representation of fixed size bytes
    fn to_base64_str<T: serde::Serialize>(item: &T) -> String {
        serde_json::to_string(item)
            .unwrap()
            .trim_matches('"')
            .to_owned()
    }
}
