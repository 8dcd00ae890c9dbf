mod checkpoint;
mod config;
mod replay;
mod stpathlib;

pub use self::checkpoint::{load_checkpoint, store_checkpoint, CheckpointError};
pub use self::config::{load_config, ConfigError, PathConfig};
pub use self::replay::{read_event_log, replay_events, ReplayError};
pub use self::stpathlib::{stpath, PathBinError, RateScope, StPathCmd, StPathSubcommand};
