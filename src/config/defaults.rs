//! Built-in node defaults (layer 1)
//!
//! Hardcoded defaults for every setting. A node running on these alone is
//! not considered configured; see [`NodeConfig::is_new`](super::NodeConfig).

use serde::{Deserialize, Serialize};

/// Compose project name used when the settings file does not set one
pub const DEFAULT_PROJECT_NAME: &str = "rocketpool";

/// Local execution client HTTP port
pub const DEFAULT_EXECUTION_HTTP_PORT: u16 = 8545;

/// Local beacon node HTTP port
pub const DEFAULT_BEACON_HTTP_PORT: u16 = 5052;

/// Local MEV-Boost port
pub const DEFAULT_MEV_BOOST_PORT: u16 = 18550;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Compose project name (default: "rocketpool")
    pub project_name: String,

    /// Node data directory (default: "~/.rocketpool")
    pub data_directory: String,

    /// Validator data directory (default: "~/.rocketpool/data")
    pub user_data_path: String,

    /// Rewards tree directory (default: "~/.rocketpool/data/rewards-trees")
    pub rewards_tree_path: String,

    pub execution_http_port: u16,
    pub beacon_http_port: u16,
    pub mev_boost_port: u16,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            data_directory: "~/.rocketpool".to_string(),
            user_data_path: "~/.rocketpool/data".to_string(),
            rewards_tree_path: "~/.rocketpool/data/rewards-trees".to_string(),
            execution_http_port: DEFAULT_EXECUTION_HTTP_PORT,
            beacon_http_port: DEFAULT_BEACON_HTTP_PORT,
            mev_boost_port: DEFAULT_MEV_BOOST_PORT,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    ///
    /// Client selections start out as "unknown" and every optional service
    /// starts disabled.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "project_name": self.project_name,
            "data_directory": self.data_directory,
            "user_data_path": self.user_data_path,
            "rewards_tree_path": self.rewards_tree_path,
            "native_mode": false,
            "client_mode": "unknown",
            "execution_client": "unknown",
            "beacon_node": "unknown",
            "local": {
                "execution_http_port": self.execution_http_port,
                "beacon_http_port": self.beacon_http_port
            },
            "external": {
                "execution_http_url": "",
                "beacon_http_url": ""
            },
            "metrics": {
                "enabled": false
            },
            "mev_boost": {
                "enabled": false,
                "mode": "local",
                "port": self.mev_boost_port,
                "external_url": ""
            },
            "addons": {
                "graffiti_wall_writer": {
                    "enabled": false
                }
            }
        })
    }
}
