//! Compose Deploy - container manifest deployment for a staking node
//!
//! This crate turns node settings into Docker Compose manifests on disk and
//! assembles the `docker compose` invocation that runs them. Stock files are
//! staged without clobbering user edits, generated manifests are rebuilt from
//! scratch every run, and optional addons are layered on last.

pub mod addons;
pub mod compose;
pub mod config;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod migrate;
pub mod render;
pub mod runner;
pub mod services;
pub mod stage;

pub use compose::{shell_quote, CommandAssembler};
pub use config::{NodeConfig, PathConfig};
pub use deploy::{Deployer, Deployment};
pub use error::DeployError;
pub use render::{PlaceholderEngine, TemplateEngine};
pub use runner::{CommandRunner, ShellRunner};
pub use services::{resolve_services, ContainerId};
