//! Node configuration
//!
//! Settings are built from layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. The user settings file (`<data-dir>/user-settings.toml`)
//! 3. Invocation overrides (for example the data directory chosen on the CLI)

mod defaults;
mod merge;
mod node;
mod paths;

pub use defaults::{
    BuiltinDefaults, DEFAULT_BEACON_HTTP_PORT, DEFAULT_EXECUTION_HTTP_PORT, DEFAULT_MEV_BOOST_PORT,
    DEFAULT_PROJECT_NAME,
};
pub use merge::{deep_merge, merge_layers};
pub use node::{
    AddonToggle, AddonsConfig, BeaconNode, ClientMode, ConfigError, ExecutionClient,
    ExternalClientsConfig, LocalClientsConfig, MetricsConfig, MevBoostConfig, NodeConfig,
    SETTINGS_FILE,
};
pub use paths::{expand_home, PathConfig, DEFAULT_INSTALL_DIR};
