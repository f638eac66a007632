//! Manifest rendering
//!
//! For each container the renderer reads `<template>/<name>.tmpl`, runs it
//! through a [`TemplateEngine`], and writes `<runtime>/<name>.yml`. The
//! user's `<override>/<name>.yml` is returned right after it so Compose
//! merges the customization over the generated file.

mod template;

pub use template::{PlaceholderEngine, TemplateEngine, TemplateError};

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::config::NodeConfig;
use crate::error::{DeployError, FileCategory, IoOp};
use crate::services::ContainerId;

/// Suffix of template files
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

/// Suffix of generated and override manifests
pub const MANIFEST_SUFFIX: &str = ".yml";

/// Roots for one deployment target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSet {
    /// Generated output, wiped every run
    pub runtime: PathBuf,
    /// Read-only template source
    pub template: PathBuf,
    /// User-editable layer
    pub override_dir: PathBuf,
}

/// Renders container manifests with a template engine
pub struct ManifestRenderer<'a> {
    engine: &'a dyn TemplateEngine,
}

impl<'a> ManifestRenderer<'a> {
    pub fn new(engine: &'a dyn TemplateEngine) -> Self {
        Self { engine }
    }

    /// Render the manifest(s) for `id` and return their paths in merge order
    pub fn render(
        &self,
        id: ContainerId,
        paths: &PathSet,
        cfg: &NodeConfig,
    ) -> Result<Vec<PathBuf>, DeployError> {
        let name = id.manifest_name();
        let template_path = paths.template.join(format!("{}{}", name, TEMPLATE_SUFFIX));
        let runtime_path = paths.runtime.join(format!("{}{}", name, MANIFEST_SUFFIX));
        let override_path = paths.override_dir.join(format!("{}{}", name, MANIFEST_SUFFIX));

        let render_err = |source: TemplateError| DeployError::Render {
            container: id,
            source,
        };

        let source = fs::read_to_string(&template_path).map_err(|e| {
            render_err(TemplateError::Io {
                path: template_path.clone(),
                source: e,
            })
        })?;
        let rendered = self.engine.render(&source, cfg).map_err(render_err)?;

        fs::write(&runtime_path, rendered)
            .map_err(DeployError::io(IoOp::Write, FileCategory::Manifest, &runtime_path))?;
        debug!(container = %id, path = %runtime_path.display(), "rendered manifest");

        let mut files = vec![runtime_path];
        if override_path.is_file() {
            files.push(override_path);
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        paths: PathSet,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let paths = PathSet {
            runtime: dir.path().join("runtime"),
            template: dir.path().join("templates"),
            override_dir: dir.path().join("override"),
        };
        fs::create_dir_all(&paths.runtime).unwrap();
        fs::create_dir_all(&paths.template).unwrap();
        fs::create_dir_all(&paths.override_dir).unwrap();
        Fixture { _dir: dir, paths }
    }

    #[test]
    fn test_render_with_override() {
        let fx = fixture();
        fs::write(
            fx.paths.template.join("ec.tmpl"),
            "services:\n  {{.ExecutionClientContainerName}}:\n    container_name: {{.ProjectName}}_ec\n",
        )
        .unwrap();
        fs::write(fx.paths.override_dir.join("ec.yml"), "services: {}\n").unwrap();

        let engine = PlaceholderEngine::new().unwrap();
        let cfg = NodeConfig::from_toml_str("project_name = \"rp\"").unwrap();
        let files = ManifestRenderer::new(&engine)
            .render(ContainerId::ExecutionClient, &fx.paths, &cfg)
            .unwrap();

        assert_eq!(
            files,
            vec![fx.paths.runtime.join("ec.yml"), fx.paths.override_dir.join("ec.yml")]
        );
        assert_eq!(
            fs::read_to_string(&files[0]).unwrap(),
            "services:\n  ec:\n    container_name: rp_ec\n"
        );
    }

    #[test]
    fn test_render_without_override() {
        let fx = fixture();
        fs::write(fx.paths.template.join("node.tmpl"), "services: {}\n").unwrap();

        let engine = PlaceholderEngine::new().unwrap();
        let files = ManifestRenderer::new(&engine)
            .render(ContainerId::Daemon, &fx.paths, &NodeConfig::default())
            .unwrap();

        assert_eq!(files, vec![fx.paths.runtime.join("node.yml")]);
    }

    #[test]
    fn test_missing_template_is_render_error() {
        let fx = fixture();
        let engine = PlaceholderEngine::new().unwrap();
        let err = ManifestRenderer::new(&engine)
            .render(ContainerId::Grafana, &fx.paths, &NodeConfig::default())
            .unwrap_err();

        match err {
            DeployError::Render { container, source } => {
                assert_eq!(container, ContainerId::Grafana);
                assert!(matches!(source, TemplateError::Io { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!fx.paths.runtime.join("grafana.yml").exists());
    }

    #[test]
    fn test_substitution_failure_names_container() {
        let fx = fixture();
        fs::write(fx.paths.template.join("vc.tmpl"), "x: {{.Missing}}\n").unwrap();

        let engine = PlaceholderEngine::new().unwrap();
        let err = ManifestRenderer::new(&engine)
            .render(ContainerId::ValidatorClient, &fx.paths, &NodeConfig::default())
            .unwrap_err();

        assert!(err.to_string().contains("vc container definition"));
    }

    struct Uppercase;

    impl TemplateEngine for Uppercase {
        fn render(&self, template: &str, _cfg: &NodeConfig) -> Result<String, TemplateError> {
            Ok(template.to_uppercase())
        }
    }

    #[test]
    fn test_custom_engine() {
        let fx = fixture();
        fs::write(fx.paths.template.join("bn.tmpl"), "bn\n").unwrap();

        let files = ManifestRenderer::new(&Uppercase)
            .render(ContainerId::BeaconNode, &fx.paths, &NodeConfig::default())
            .unwrap();
        assert_eq!(fs::read_to_string(&files[0]).unwrap(), "BN\n");
    }
}
