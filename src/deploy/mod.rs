//! Deployment orchestration
//!
//! One run, in order:
//! 1. Stage stock override, addon and native-script files into the data dir
//! 2. Strip obsolete schema fields from the staged overrides
//! 3. Delete and recreate the runtime folder
//! 4. Render every resolved container into the runtime folder
//! 5. Create convenience folders (best effort)
//! 6. Compose enabled addons
//!
//! Runs are not safe against concurrent invocations on the same data
//! directory; callers serialize them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::addons::{builtin_addons, Addon, AddonComposer};
use crate::compose::CommandAssembler;
use crate::config::{NodeConfig, PathConfig};
use crate::error::{DeployError, FileCategory, IoOp};
use crate::migrate::SchemaMigrator;
use crate::render::{ManifestRenderer, TemplateEngine};
use crate::runner::CommandRunner;
use crate::services::ServiceSetResolver;
use crate::stage::DirectoryStager;

/// Manifests produced by one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    manifests: Vec<PathBuf>,
    addon_start: usize,
}

impl Deployment {
    /// Base container manifests, in resolver order
    pub fn base(&self) -> &[PathBuf] {
        &self.manifests[..self.addon_start]
    }

    /// Addon manifests, in registration order
    pub fn addons(&self) -> &[PathBuf] {
        &self.manifests[self.addon_start..]
    }

    pub fn all(&self) -> &[PathBuf] {
        &self.manifests
    }
}

/// Turns node settings into manifests on disk and a compose command
pub struct Deployer {
    layout: PathConfig,
    engine: Box<dyn TemplateEngine>,
    addons: Vec<Box<dyn Addon>>,
    resolver: ServiceSetResolver<'static>,
    migrator: SchemaMigrator<'static>,
    assembler: CommandAssembler,
}

impl Deployer {
    pub fn new(layout: PathConfig, engine: Box<dyn TemplateEngine>) -> Self {
        Self {
            layout,
            engine,
            addons: builtin_addons(),
            resolver: ServiceSetResolver::default(),
            migrator: SchemaMigrator::default(),
            assembler: CommandAssembler::default(),
        }
    }

    /// Replace the registered addons
    pub fn with_addons(mut self, addons: Vec<Box<dyn Addon>>) -> Self {
        self.addons = addons;
        self
    }

    pub fn with_assembler(mut self, assembler: CommandAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn layout(&self) -> &PathConfig {
        &self.layout
    }

    pub fn resolver(&self) -> &ServiceSetResolver<'static> {
        &self.resolver
    }

    /// Reject settings that cannot produce a compose command
    pub fn check(&self, cfg: &NodeConfig) -> Result<(), DeployError> {
        self.assembler.check(cfg)
    }

    /// Deploy all manifests for `cfg` and return their paths
    pub fn deploy(&self, cfg: &NodeConfig) -> Result<Deployment, DeployError> {
        self.stage_stock_files()?;

        let override_dir = self.layout.override_dir();
        self.migrator.migrate(&override_dir)?;

        self.reset_runtime()?;

        let scrape_jobs = self.layout.extra_scrape_jobs_dir();
        fs::create_dir_all(&scrape_jobs)
            .map_err(DeployError::io(IoOp::Create, FileCategory::ScrapeJobs, &scrape_jobs))?;

        let renderer = ManifestRenderer::new(self.engine.as_ref());
        let base_paths = self.layout.base_paths();
        let mut manifests = Vec::new();
        for id in self.resolver.resolve(cfg) {
            manifests.extend(renderer.render(id, &base_paths, cfg)?);
        }

        self.create_convenience_dirs(cfg);

        let addon_start = manifests.len();
        let manifests =
            AddonComposer::new(&self.addons, &self.layout, &renderer).compose(cfg, manifests)?;

        info!(
            base = addon_start,
            addons = manifests.len() - addon_start,
            runtime = %self.layout.runtime_dir().display(),
            "deployed compose manifests"
        );
        Ok(Deployment {
            manifests,
            addon_start,
        })
    }

    /// Deploy and assemble the compose command for `args`.
    ///
    /// Settings are checked before anything on disk is touched. The `-f`
    /// order is base manifests, then `extra_files`, then addon manifests.
    pub fn compose_command(
        &self,
        cfg: &NodeConfig,
        extra_files: &[PathBuf],
        args: &str,
    ) -> Result<String, DeployError> {
        self.check(cfg)?;
        let deployment = self.deploy(cfg)?;
        self.assembler
            .build_layered(cfg, &[deployment.base(), extra_files, deployment.addons()], args)
    }

    /// Images referenced by the deployed manifests, as `repository:tag`
    pub fn compose_images(
        &self,
        cfg: &NodeConfig,
        runner: &dyn CommandRunner,
    ) -> Result<Vec<String>, DeployError> {
        let cmd = self.compose_command(cfg, &[], "config --images")?;
        let output = runner.read_output(&cmd)?;
        Ok(output.split_whitespace().map(str::to_string).collect())
    }

    fn stage_stock_files(&self) -> Result<(), DeployError> {
        let steps = [
            (FileCategory::Override, self.layout.override_source(), self.layout.override_dir()),
            (FileCategory::Addon, self.layout.addons_source(), self.layout.addons_dir()),
            (
                FileCategory::NativeScript,
                self.layout.native_scripts_source(),
                self.layout.native_scripts_dir(),
            ),
        ];
        for (category, source, dest) in steps {
            DirectoryStager::new(category).stage(&source, &dest)?;
        }
        Ok(())
    }

    fn reset_runtime(&self) -> Result<(), DeployError> {
        let runtime = self.layout.runtime_dir();
        match fs::remove_dir_all(&runtime) {
            Ok(()) => debug!(path = %runtime.display(), "cleared runtime folder"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DeployError::io(IoOp::Delete, FileCategory::Runtime, &runtime)(e));
            }
        }
        fs::create_dir_all(&runtime)
            .map_err(DeployError::io(IoOp::Create, FileCategory::Runtime, &runtime))
    }

    /// Folders the node works without; failures only warn
    fn create_convenience_dirs(&self, cfg: &NodeConfig) {
        match PathConfig::custom_keys_dir(cfg) {
            Ok(dir) => warn_on_failure(
                &dir,
                "You will not be able to recover any validator keys you created outside of the node software until you create this folder manually.",
            ),
            Err(e) => warn!(error = %e, "couldn't expand the custom validator key directory"),
        }

        match PathConfig::rewards_tree_dir(cfg) {
            Ok(dir) => warn_on_failure(
                &dir,
                "You will not be able to view or claim your rewards until you create this folder manually.",
            ),
            Err(e) => warn!(error = %e, "couldn't expand the rewards tree file directory"),
        }
    }
}

fn warn_on_failure(dir: &Path, consequence: &str) {
    if let Err(e) = fs::create_dir_all(dir) {
        warn!(path = %dir.display(), error = %e, "couldn't create folder. {}", consequence);
    }
}
