//! Optional addon services
//!
//! Each addon is independently gated by its own setting and renders into
//! its own sub-folder of the runtime, template and override roots. The
//! composer iterates a registered list, so a new addon is a new [`Addon`]
//! implementation and nothing else.

mod gww;

pub use gww::GraffitiWallWriter;

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::config::{NodeConfig, PathConfig};
use crate::error::{DeployError, FileCategory, IoOp};
use crate::render::{ManifestRenderer, PathSet};
use crate::services::ContainerId;

/// An optional service composed alongside the base set
pub trait Addon {
    /// Folder name under each `addons/` root
    fn name(&self) -> &'static str;

    fn container(&self) -> ContainerId;

    fn is_enabled(&self, cfg: &NodeConfig) -> bool;

    fn paths(&self, layout: &PathConfig) -> PathSet {
        layout.addon_paths(self.name())
    }
}

/// Addons shipped with the node software
pub fn builtin_addons() -> Vec<Box<dyn Addon>> {
    vec![Box::new(GraffitiWallWriter)]
}

/// Appends enabled addon manifests to a manifest list
pub struct AddonComposer<'a> {
    addons: &'a [Box<dyn Addon>],
    layout: &'a PathConfig,
    renderer: &'a ManifestRenderer<'a>,
}

impl<'a> AddonComposer<'a> {
    pub fn new(
        addons: &'a [Box<dyn Addon>],
        layout: &'a PathConfig,
        renderer: &'a ManifestRenderer<'a>,
    ) -> Self {
        Self {
            addons,
            layout,
            renderer,
        }
    }

    /// Render every enabled addon and append its files to `manifests`.
    ///
    /// The first failing addon aborts the whole composition.
    pub fn compose(
        &self,
        cfg: &NodeConfig,
        mut manifests: Vec<PathBuf>,
    ) -> Result<Vec<PathBuf>, DeployError> {
        for addon in self.addons.iter().filter(|a| a.is_enabled(cfg)) {
            let paths = addon.paths(self.layout);
            fs::create_dir_all(&paths.runtime)
                .map_err(DeployError::io(IoOp::Create, FileCategory::Addon, &paths.runtime))?;

            let files = self.renderer.render(addon.container(), &paths, cfg)?;
            info!(addon = addon.name(), files = files.len(), "composed addon");
            manifests.extend(files);
        }
        Ok(manifests)
    }
}
