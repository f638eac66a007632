//! Deployment error taxonomy
//!
//! Every failure that aborts a deployment run is a [`DeployError`]. The
//! variants line up with the categories an operator needs to act on:
//! configuration problems, mode restrictions, filesystem failures and
//! template rendering failures.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::render::TemplateError;
use crate::runner::RunnerError;
use crate::services::ContainerId;

/// The filesystem operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Create,
    Read,
    List,
    Write,
    Delete,
}

impl IoOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            IoOp::Create => "creating",
            IoOp::Read => "reading",
            IoOp::List => "enumerating",
            IoOp::Write => "writing",
            IoOp::Delete => "deleting",
        }
    }
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of the deployment tree a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Override,
    Addon,
    NativeScript,
    Manifest,
    Runtime,
    ScrapeJobs,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Override => "override",
            FileCategory::Addon => "addons",
            FileCategory::NativeScript => "native scripts",
            FileCategory::Manifest => "manifest",
            FileCategory::Runtime => "runtime",
            FileCategory::ScrapeJobs => "extra-scrape-jobs",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a deployment attempt
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Settings are missing, unconfigured, or a required selection is unset
    #[error("{0}")]
    Config(String),

    /// The active mode cannot support the requested operation
    #[error("Command unavailable in {0}")]
    Mode(String),

    #[error("Error {op} {category} path [{}]: {source}", .path.display())]
    Io {
        op: IoOp,
        category: FileCategory,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Walk error in {category} folder: {source}")]
    Walk {
        category: FileCategory,
        #[source]
        source: walkdir::Error,
    },

    #[error("Could not create {container} container definition: {source}")]
    Render {
        container: ContainerId,
        #[source]
        source: TemplateError,
    },

    /// A path the shell command must carry byte-for-byte is not UTF-8
    #[error("Path [{}] is not valid UTF-8 and cannot be passed to the container runtime", .0.display())]
    NonUtf8Path(PathBuf),

    #[error(transparent)]
    Settings(#[from] ConfigError),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

impl DeployError {
    /// Build a mapper for `map_err` that tags an I/O error with its context
    pub fn io(op: IoOp, category: FileCategory, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| DeployError::Io {
            op,
            category,
            path,
            source,
        }
    }

    /// True for settings and selection problems the user fixes by running setup
    pub fn is_config(&self) -> bool {
        matches!(self, DeployError::Config(_) | DeployError::Settings(_))
    }
}
