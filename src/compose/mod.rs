//! Compose invocation assembly
//!
//! Produces a single shell command of the form
//!
//! ```text
//! COMPOSE_PROJECT_NAME=<project> docker compose --project-directory <dir> -f <file>... <args>
//! ```
//!
//! Compose merges later `-f` files over earlier ones, so the order of the
//! file list is part of the contract.

mod quote;

pub use quote::shell_quote;

use std::path::{Path, PathBuf};

use crate::config::{expand_home, BeaconNode, ClientMode, ExecutionClient, NodeConfig};
use crate::error::DeployError;

/// Environment variable that scopes container, network and volume names
pub const PROJECT_NAME_ENV: &str = "COMPOSE_PROJECT_NAME";

/// Container runtime invocation used unless overridden
pub const DEFAULT_RUNTIME: &str = "docker compose";

const SETUP_HINT: &str = "Please run setup to configure your node before running this command.";

/// Builds the runnable compose command
#[derive(Debug, Clone)]
pub struct CommandAssembler {
    runtime: String,
}

impl Default for CommandAssembler {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
        }
    }
}

impl CommandAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different runtime invocation (for example `podman compose`)
    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self
    }

    /// Verify the settings can produce a compose command at all.
    ///
    /// Touches nothing on disk; callers run it before any staging.
    pub fn check(&self, cfg: &NodeConfig) -> Result<(), DeployError> {
        if cfg.native_mode {
            return Err(DeployError::Mode("Native Mode".to_string()));
        }

        if cfg.is_new {
            return Err(DeployError::Config(format!(
                "Settings file not found. {}",
                SETUP_HINT
            )));
        }

        if cfg.client_mode == ClientMode::Unknown {
            return Err(DeployError::Config(format!(
                "You haven't selected local or external mode for your clients yet.\n{}",
                SETUP_HINT
            )));
        }
        if cfg.is_local_mode() && cfg.execution_client == ExecutionClient::Unknown {
            return Err(DeployError::Config(format!(
                "No Execution Client selected. {}",
                SETUP_HINT
            )));
        }
        if cfg.is_local_mode() && cfg.beacon_node == BeaconNode::Unknown {
            return Err(DeployError::Config(format!(
                "No Beacon Node selected. {}",
                SETUP_HINT
            )));
        }

        Ok(())
    }

    /// Build the command with `manifests` followed by `extra_files`
    pub fn build(
        &self,
        cfg: &NodeConfig,
        manifests: &[PathBuf],
        extra_files: &[PathBuf],
        args: &str,
    ) -> Result<String, DeployError> {
        self.build_layered(cfg, &[manifests, extra_files], args)
    }

    /// Build the command with one `-f` per file, layer by layer, in order
    pub fn build_layered(
        &self,
        cfg: &NodeConfig,
        layers: &[&[PathBuf]],
        args: &str,
    ) -> Result<String, DeployError> {
        self.check(cfg)?;

        let project_dir = expand_home(&cfg.data_directory)?;

        let mut parts = vec![
            format!("{}={}", PROJECT_NAME_ENV, shell_quote(&cfg.project_name)),
            self.runtime.clone(),
            "--project-directory".to_string(),
            quote_path(&project_dir)?,
        ];
        for file in layers.iter().flat_map(|layer| layer.iter()) {
            parts.push(format!("-f {}", quote_path(file)?));
        }
        let args = args.trim();
        if !args.is_empty() {
            parts.push(args.to_string());
        }

        Ok(parts.join(" "))
    }
}

/// Quote a path for the shell, refusing any that would not survive as text
fn quote_path(path: &Path) -> Result<String, DeployError> {
    path.to_str()
        .map(shell_quote)
        .ok_or_else(|| DeployError::NonUtf8Path(path.to_path_buf()))
}
