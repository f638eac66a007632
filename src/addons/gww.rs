//! Graffiti Wall Writer addon

use super::Addon;
use crate::config::NodeConfig;
use crate::services::ContainerId;

/// Folder name under each `addons/` root
pub const FOLDER_NAME: &str = "gww";

/// Draws pixel art on the beaconcha.in graffiti wall through block graffiti
#[derive(Debug, Default, Clone, Copy)]
pub struct GraffitiWallWriter;

impl Addon for GraffitiWallWriter {
    fn name(&self) -> &'static str {
        FOLDER_NAME
    }

    fn container(&self) -> ContainerId {
        ContainerId::GraffitiWallWriter
    }

    fn is_enabled(&self, cfg: &NodeConfig) -> bool {
        cfg.addons.graffiti_wall_writer.enabled
    }
}
