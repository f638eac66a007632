//! Filesystem layout for a deployment
//!
//! [`PathConfig`] names the read-only installed roots and the user-writable
//! tree under the node data directory. It is passed explicitly to everything
//! that touches the filesystem so tests can point it at temporary directories.

use std::path::{Path, PathBuf};

use super::node::{ConfigError, NodeConfig};
use crate::render::PathSet;

/// Where packaged templates and stock files are installed
pub const DEFAULT_INSTALL_DIR: &str = "/usr/share/rocketpool";

const TEMPLATES_DIR: &str = "templates";
const ADDONS_DIR: &str = "addons";
const OVERRIDE_DIR: &str = "override";
const NATIVE_SCRIPTS_DIR: &str = "scripts/native";
const RUNTIME_DIR: &str = "runtime";
const EXTRA_SCRAPE_JOBS_DIR: &str = "extra-scrape-jobs";
const CUSTOM_KEYS_DIR: &str = "custom-keys";

/// Installed (read-only) and user (writable) roots for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    install_dir: PathBuf,
    data_dir: PathBuf,
}

impl PathConfig {
    pub fn new(install_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Layout rooted at the config's data directory, with `~` expanded
    pub fn for_config(install_dir: impl Into<PathBuf>, cfg: &NodeConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(install_dir, expand_home(&cfg.data_directory)?))
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn templates_source(&self) -> PathBuf {
        self.install_dir.join(TEMPLATES_DIR)
    }

    pub fn addons_source(&self) -> PathBuf {
        self.install_dir.join(ADDONS_DIR)
    }

    pub fn override_source(&self) -> PathBuf {
        self.install_dir.join(OVERRIDE_DIR)
    }

    pub fn native_scripts_source(&self) -> PathBuf {
        self.install_dir.join(NATIVE_SCRIPTS_DIR)
    }

    pub fn override_dir(&self) -> PathBuf {
        self.data_dir.join(OVERRIDE_DIR)
    }

    pub fn addons_dir(&self) -> PathBuf {
        self.data_dir.join(ADDONS_DIR)
    }

    pub fn native_scripts_dir(&self) -> PathBuf {
        self.data_dir.join(NATIVE_SCRIPTS_DIR)
    }

    pub fn runtime_dir(&self) -> PathBuf {
        self.data_dir.join(RUNTIME_DIR)
    }

    pub fn extra_scrape_jobs_dir(&self) -> PathBuf {
        self.data_dir.join(EXTRA_SCRAPE_JOBS_DIR)
    }

    /// Roots for the base service manifests
    pub fn base_paths(&self) -> PathSet {
        PathSet {
            runtime: self.runtime_dir(),
            template: self.templates_source(),
            override_dir: self.override_dir(),
        }
    }

    /// Roots for one addon, each under `addons/<name>` of the base roots
    pub fn addon_paths(&self, name: &str) -> PathSet {
        let base = self.base_paths();
        PathSet {
            runtime: base.runtime.join(ADDONS_DIR).join(name),
            template: base.template.join(ADDONS_DIR).join(name),
            override_dir: base.override_dir.join(ADDONS_DIR).join(name),
        }
    }

    /// Folder for validator keys created outside the node software
    pub fn custom_keys_dir(cfg: &NodeConfig) -> Result<PathBuf, ConfigError> {
        Ok(expand_home(&cfg.user_data_path)?.join(CUSTOM_KEYS_DIR))
    }

    pub fn rewards_tree_dir(cfg: &NodeConfig) -> Result<PathBuf, ConfigError> {
        expand_home(&cfg.rewards_tree_path)
    }
}

/// Expand a leading `~` and make the path absolute.
///
/// Only the current user's home (`~` or `~/...`) can be expanded.
pub fn expand_home(path: &str) -> Result<PathBuf, ConfigError> {
    let expanded = if path == "~" || path.starts_with("~/") {
        let home = dirs::home_dir().ok_or_else(|| {
            ConfigError::PathError("could not determine the home directory".to_string())
        })?;
        match path.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => home,
        }
    } else if path.starts_with('~') {
        return Err(ConfigError::PathError(format!(
            "cannot expand user-specific home dir in [{}]",
            path
        )));
    } else {
        PathBuf::from(path)
    };

    if expanded.is_absolute() {
        return Ok(expanded);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| ConfigError::PathError(format!("could not resolve [{}]: {}", path, e)))?;
    Ok(cwd.join(expanded))
}
