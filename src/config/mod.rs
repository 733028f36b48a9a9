//! Configuration loading and validation.
//!
//! Settings are layered: built-in defaults, then `config/default.toml`,
//! then an environment-specific file, then `LEADERBOARD__*` environment
//! variables.

mod settings;

pub use settings::{
    AggregatorSettings, DatabaseSettings, LoggingSettings, MetricsSettings, Settings,
};
