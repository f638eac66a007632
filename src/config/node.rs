//! Node settings and their loader

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use crate::services::ContainerId;

/// Name of the settings file inside the node data directory
pub const SETTINGS_FILE: &str = "user-settings.toml";

/// Whether a client runs as a managed container or is hosted elsewhere
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientMode {
    #[default]
    Unknown,
    Local,
    External,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionClient {
    #[default]
    Unknown,
    Geth,
    Nethermind,
    Besu,
    Reth,
}

impl ExecutionClient {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionClient::Unknown => "unknown",
            ExecutionClient::Geth => "geth",
            ExecutionClient::Nethermind => "nethermind",
            ExecutionClient::Besu => "besu",
            ExecutionClient::Reth => "reth",
        }
    }
}

impl fmt::Display for ExecutionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeaconNode {
    #[default]
    Unknown,
    Lighthouse,
    Lodestar,
    Nimbus,
    Prysm,
    Teku,
}

impl BeaconNode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BeaconNode::Unknown => "unknown",
            BeaconNode::Lighthouse => "lighthouse",
            BeaconNode::Lodestar => "lodestar",
            BeaconNode::Nimbus => "nimbus",
            BeaconNode::Prysm => "prysm",
            BeaconNode::Teku => "teku",
        }
    }
}

impl fmt::Display for BeaconNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ports for locally managed clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalClientsConfig {
    pub execution_http_port: u16,
    pub beacon_http_port: u16,
}

/// Endpoints for externally hosted clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalClientsConfig {
    pub execution_http_url: String,
    pub beacon_http_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MevBoostConfig {
    pub enabled: bool,
    pub mode: ClientMode,
    pub port: u16,
    pub external_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonToggle {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonsConfig {
    pub graffiti_wall_writer: AddonToggle,
}

/// Fully merged node settings
///
/// Loaded once per invocation and never mutated by the deployment engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub project_name: String,
    pub data_directory: String,
    pub user_data_path: String,
    pub rewards_tree_path: String,
    pub native_mode: bool,
    pub client_mode: ClientMode,
    pub execution_client: ExecutionClient,
    pub beacon_node: BeaconNode,
    pub local: LocalClientsConfig,
    pub external: ExternalClientsConfig,
    pub metrics: MetricsConfig,
    pub mev_boost: MevBoostConfig,
    pub addons: AddonsConfig,

    /// Set when no settings file existed and this instance is pure defaults
    #[serde(skip)]
    pub is_new: bool,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Path error: {0}")]
    PathError(String),
}

impl Default for NodeConfig {
    /// A freshly defaulted, uncommitted instance
    fn default() -> Self {
        let defaults = BuiltinDefaults::default();
        Self {
            project_name: defaults.project_name,
            data_directory: defaults.data_directory,
            user_data_path: defaults.user_data_path,
            rewards_tree_path: defaults.rewards_tree_path,
            native_mode: false,
            client_mode: ClientMode::Unknown,
            execution_client: ExecutionClient::Unknown,
            beacon_node: BeaconNode::Unknown,
            local: LocalClientsConfig {
                execution_http_port: defaults.execution_http_port,
                beacon_http_port: defaults.beacon_http_port,
            },
            external: ExternalClientsConfig {
                execution_http_url: String::new(),
                beacon_http_url: String::new(),
            },
            metrics: MetricsConfig { enabled: false },
            mev_boost: MevBoostConfig {
                enabled: false,
                mode: ClientMode::Local,
                port: defaults.mev_boost_port,
                external_url: String::new(),
            },
            addons: AddonsConfig {
                graffiti_wall_writer: AddonToggle { enabled: false },
            },
            is_new: true,
        }
    }
}

impl NodeConfig {
    /// Load the settings for a node data directory.
    ///
    /// The data directory itself is applied as the last layer so the
    /// directory the node was invoked with always wins over the file.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let settings = data_dir.join(SETTINGS_FILE);
        let invocation = serde_json::json!({
            "data_directory": data_dir.to_string_lossy(),
        });
        Self::build(&settings, Some(invocation))
    }

    /// Build settings from defaults, an optional settings file, and overrides
    pub fn build(settings_path: &Path, overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];

        let is_new = !settings_path.exists();
        if is_new {
            debug!(path = %settings_path.display(), "settings file not found, using defaults");
        } else {
            layers.push(Self::load_toml_file(settings_path)?);
        }

        if let Some(overrides) = overrides {
            layers.push(overrides);
        }

        let mut cfg = Self::from_layers(layers)?;
        cfg.is_new = is_new;
        Ok(cfg)
    }

    /// Parse committed settings from TOML text layered over the defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let value: toml::Value = toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
        Self::from_layers(vec![
            BuiltinDefaults::default().to_value(),
            toml_to_json(value),
        ])
    }

    fn from_layers(layers: Vec<Value>) -> Result<Self, ConfigError> {
        let merged = merge_layers(layers);
        let cfg: NodeConfig = serde_json::from_value(merged)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok(toml_to_json(value))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.project_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "project_name must not be empty".to_string(),
            ));
        }
        if self.data_directory.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "data_directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Execution and consensus clients run as local containers
    pub fn is_local_mode(&self) -> bool {
        self.client_mode == ClientMode::Local && !self.native_mode
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics.enabled
    }

    /// MEV-Boost runs as a local container
    pub fn is_local_mev_boost(&self) -> bool {
        self.mev_boost.enabled && self.mev_boost.mode == ClientMode::Local
    }

    /// Full name of a Docker container or volume (`<project>_<entity>`)
    pub fn docker_artifact_name(&self, entity: &str) -> String {
        format!("{}_{}", self.project_name, entity)
    }

    pub fn ec_http_endpoint(&self) -> String {
        if self.is_local_mode() {
            format!(
                "http://{}:{}",
                ContainerId::ExecutionClient.manifest_name(),
                self.local.execution_http_port
            )
        } else {
            self.external.execution_http_url.clone()
        }
    }

    pub fn bn_http_endpoint(&self) -> String {
        if self.is_local_mode() {
            format!(
                "http://{}:{}",
                ContainerId::BeaconNode.manifest_name(),
                self.local.beacon_http_port
            )
        } else {
            self.external.beacon_http_url.clone()
        }
    }

    /// Empty when MEV-Boost is disabled
    pub fn mev_boost_url(&self) -> String {
        if !self.mev_boost.enabled {
            return String::new();
        }
        if self.mev_boost.mode == ClientMode::Local {
            return format!(
                "http://{}:{}",
                ContainerId::MevBoost.manifest_name(),
                self.mev_boost.port
            );
        }
        self.mev_boost.external_url.clone()
    }

    /// Values available to manifest templates as `{{.Name}}`
    pub fn template_vars(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        let mut set = |key: &str, value: String| {
            vars.insert(key.to_string(), value);
        };

        set("ProjectName", self.project_name.clone());
        set("DataDirectory", self.data_directory.clone());
        set("UserDataPath", self.user_data_path.clone());
        set("RewardsTreePath", self.rewards_tree_path.clone());
        set("IsLocalMode", self.is_local_mode().to_string());
        set("ExecutionClient", self.execution_client.to_string());
        set("BeaconNode", self.beacon_node.to_string());
        set("EcHttpEndpoint", self.ec_http_endpoint());
        set("BnHttpEndpoint", self.bn_http_endpoint());
        set("MetricsEnabled", self.metrics.enabled.to_string());
        set("MevBoostUrl", self.mev_boost_url());
        set("MevBoostPort", self.mev_boost.port.to_string());
        set("ExecutionClientDataVolume", self.docker_artifact_name("ecdata"));
        set("BeaconNodeDataVolume", self.docker_artifact_name("bndata"));
        set("PrometheusDataVolume", self.docker_artifact_name("prometheus-data"));

        for id in ContainerId::ALL {
            set(
                &format!("{}ContainerName", id.template_key()),
                id.manifest_name().to_string(),
            );
        }

        vars
    }
}

/// Convert TOML Value to JSON Value
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
