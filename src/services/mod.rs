//! Service set resolution
//!
//! Maps configuration flags to the logical containers that must run. The
//! mapping is a rule table: each rule pairs a predicate over [`NodeConfig`]
//! with the containers it contributes. Rules are evaluated in order and the
//! order of the result is the render order.

use std::fmt;

use tracing::debug;

use crate::config::NodeConfig;

/// A logical service with its own manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerId {
    Daemon,
    ValidatorClient,
    ExecutionClient,
    BeaconNode,
    Grafana,
    Exporter,
    Prometheus,
    MevBoost,
    GraffitiWallWriter,
}

impl ContainerId {
    pub const ALL: [ContainerId; 9] = [
        ContainerId::Daemon,
        ContainerId::ValidatorClient,
        ContainerId::ExecutionClient,
        ContainerId::BeaconNode,
        ContainerId::Grafana,
        ContainerId::Exporter,
        ContainerId::Prometheus,
        ContainerId::MevBoost,
        ContainerId::GraffitiWallWriter,
    ];

    /// Canonical manifest and container name
    pub fn manifest_name(&self) -> &'static str {
        match self {
            ContainerId::Daemon => "node",
            ContainerId::ValidatorClient => "vc",
            ContainerId::ExecutionClient => "ec",
            ContainerId::BeaconNode => "bn",
            ContainerId::Grafana => "grafana",
            ContainerId::Exporter => "exporter",
            ContainerId::Prometheus => "prometheus",
            ContainerId::MevBoost => "mev-boost",
            ContainerId::GraffitiWallWriter => "gww",
        }
    }

    /// Prefix used for this container's template variables
    pub(crate) fn template_key(&self) -> &'static str {
        match self {
            ContainerId::Daemon => "Daemon",
            ContainerId::ValidatorClient => "ValidatorClient",
            ContainerId::ExecutionClient => "ExecutionClient",
            ContainerId::BeaconNode => "BeaconNode",
            ContainerId::Grafana => "Grafana",
            ContainerId::Exporter => "Exporter",
            ContainerId::Prometheus => "Prometheus",
            ContainerId::MevBoost => "MevBoost",
            ContainerId::GraffitiWallWriter => "GraffitiWallWriter",
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.manifest_name())
    }
}

/// One row of the resolution table
pub struct ServiceRule {
    pub name: &'static str,
    pub applies: fn(&NodeConfig) -> bool,
    pub containers: &'static [ContainerId],
}

/// Built-in rules for the base service set
pub const SERVICE_RULES: &[ServiceRule] = &[
    ServiceRule {
        name: "always",
        applies: |_| true,
        containers: &[ContainerId::Daemon, ContainerId::ValidatorClient],
    },
    ServiceRule {
        name: "local clients",
        applies: NodeConfig::is_local_mode,
        containers: &[ContainerId::ExecutionClient, ContainerId::BeaconNode],
    },
    ServiceRule {
        name: "metrics",
        applies: NodeConfig::metrics_enabled,
        containers: &[
            ContainerId::Grafana,
            ContainerId::Exporter,
            ContainerId::Prometheus,
        ],
    },
    ServiceRule {
        name: "local mev-boost",
        applies: NodeConfig::is_local_mev_boost,
        containers: &[ContainerId::MevBoost],
    },
];

/// Evaluates a rule table against a configuration
pub struct ServiceSetResolver<'a> {
    rules: &'a [ServiceRule],
}

impl Default for ServiceSetResolver<'static> {
    fn default() -> Self {
        Self::new(SERVICE_RULES)
    }
}

impl<'a> ServiceSetResolver<'a> {
    pub fn new(rules: &'a [ServiceRule]) -> Self {
        Self { rules }
    }

    /// Containers required by `cfg`, in render order.
    ///
    /// Pure and uncached: call it on every run so a disabled feature drops
    /// out of the next generated set.
    pub fn resolve(&self, cfg: &NodeConfig) -> Vec<ContainerId> {
        self.rules
            .iter()
            .filter(|rule| (rule.applies)(cfg))
            .inspect(|rule| debug!(rule = rule.name, "service rule matched"))
            .flat_map(|rule| rule.containers.iter().copied())
            .collect()
    }
}

/// Resolve with the built-in rules
pub fn resolve_services(cfg: &NodeConfig) -> Vec<ContainerId> {
    ServiceSetResolver::default().resolve(cfg)
}
