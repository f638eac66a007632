//! End-to-end deployment tests against a temporary install and data tree

use std::fs;
use std::path::{Path, PathBuf};

use compose_deploy::config::SETTINGS_FILE;
use compose_deploy::error::DeployError;
use compose_deploy::runner::RunnerError;
use compose_deploy::{
    CommandRunner, ContainerId, Deployer, NodeConfig, PathConfig, PlaceholderEngine,
};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    install: PathBuf,
    data: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let install = dir.path().join("install");
        let data = dir.path().join("node data");

        for id in ContainerId::ALL {
            let template_dir = if id == ContainerId::GraffitiWallWriter {
                install.join("templates/addons/gww")
            } else {
                install.join("templates")
            };
            write(
                &template_dir.join(format!("{}.tmpl", id.manifest_name())),
                &format!(
                    "services:\n  {name}:\n    image: example/{name}:latest\n    container_name: {{{{.ProjectName}}}}_{name}\n",
                    name = id.manifest_name()
                ),
            );
        }
        write(&install.join("override/node.yml"), "services: {}\n");
        write(&install.join("override/grafana.yml"), "# grafana\nversion: \"3.7\"\nservices: {}\n");
        write(&install.join("addons/gww/graffiti.json"), "{\"pixels\": []}\n");
        write(&install.join("scripts/native/start-bn.sh"), "#!/bin/sh\n");

        Self {
            _dir: dir,
            install,
            data,
        }
    }

    fn settings(&self, toml: &str) -> NodeConfig {
        write(&self.data.join(SETTINGS_FILE), toml);
        let mut cfg = NodeConfig::load(&self.data).unwrap();
        cfg.user_data_path = self.data.join("data").to_string_lossy().to_string();
        cfg.rewards_tree_path = self.data.join("data/rewards-trees").to_string_lossy().to_string();
        cfg
    }

    fn deployer(&self, cfg: &NodeConfig) -> Deployer {
        let layout = PathConfig::for_config(&self.install, cfg).unwrap();
        Deployer::new(layout, Box::new(PlaceholderEngine::new().unwrap()))
    }

    fn runtime(&self, name: &str) -> PathBuf {
        self.data.join("runtime").join(name)
    }
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

const LOCAL_WITH_METRICS: &str = r#"
client_mode = "local"
execution_client = "geth"
beacon_node = "lighthouse"

[metrics]
enabled = true
"#;

#[test]
fn test_local_metrics_command_lists_seven_containers_then_extras() {
    let fx = Fixture::new();
    let cfg = fx.settings(LOCAL_WITH_METRICS);
    let deployer = fx.deployer(&cfg);

    let extra = PathBuf::from("/opt/custom.yml");
    let cmd = deployer
        .compose_command(&cfg, &[extra], "up -d")
        .unwrap();

    let expected_files: Vec<String> = vec![
        fx.runtime("node.yml"),
        fx.data.join("override/node.yml"),
        fx.runtime("vc.yml"),
        fx.runtime("ec.yml"),
        fx.runtime("bn.yml"),
        fx.runtime("grafana.yml"),
        fx.data.join("override/grafana.yml"),
        fx.runtime("exporter.yml"),
        fx.runtime("prometheus.yml"),
        PathBuf::from("/opt/custom.yml"),
    ]
    .iter()
    .map(|p| format!("-f '{}'", p.display()).replace("'/opt/custom.yml'", "/opt/custom.yml"))
    .collect();

    let expected = format!(
        "COMPOSE_PROJECT_NAME=rocketpool docker compose --project-directory '{}' {} up -d",
        fx.data.display(),
        expected_files.join(" ")
    );
    assert_eq!(cmd, expected);

    let rendered = fs::read_to_string(fx.runtime("ec.yml")).unwrap();
    assert!(rendered.contains("container_name: rocketpool_ec"));
    assert!(!fx.runtime("mev-boost.yml").exists());
}

#[test]
fn test_disabling_metrics_removes_stale_manifests() {
    let fx = Fixture::new();
    let cfg = fx.settings(LOCAL_WITH_METRICS);
    fx.deployer(&cfg).deploy(&cfg).unwrap();
    assert!(fx.runtime("grafana.yml").exists());

    let cfg = fx.settings(
        "client_mode = \"local\"\nexecution_client = \"geth\"\nbeacon_node = \"lighthouse\"\n",
    );
    let deployment = fx.deployer(&cfg).deploy(&cfg).unwrap();

    for name in ["grafana.yml", "exporter.yml", "prometheus.yml"] {
        assert!(!fx.runtime(name).exists(), "{} survived", name);
    }
    assert!(deployment
        .all()
        .iter()
        .all(|p| !p.to_string_lossy().contains("grafana")));
}

#[test]
fn test_addon_manifests_follow_extra_files() {
    let fx = Fixture::new();
    let cfg = fx.settings(
        r#"
client_mode = "external"

[addons.graffiti_wall_writer]
enabled = true
"#,
    );
    let deployer = fx.deployer(&cfg);

    let cmd = deployer
        .compose_command(&cfg, &[PathBuf::from("/opt/extra.yml")], "ps")
        .unwrap();

    let extra_at = cmd.find("-f /opt/extra.yml").unwrap();
    let gww_at = cmd.find("runtime/addons/gww/gww.yml").unwrap();
    let vc_at = cmd.find("runtime/vc.yml").unwrap();
    assert!(vc_at < extra_at);
    assert!(extra_at < gww_at);
    assert!(!cmd.contains("runtime/ec.yml"));
}

#[test]
fn test_native_mode_touches_nothing() {
    let fx = Fixture::new();
    let cfg = fx.settings("native_mode = true\nclient_mode = \"local\"\n");
    let deployer = fx.deployer(&cfg);

    let err = deployer.compose_command(&cfg, &[], "up -d").unwrap_err();
    assert!(matches!(err, DeployError::Mode(_)));

    let entries: Vec<_> = fs::read_dir(&fx.data)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from(SETTINGS_FILE)]);
}

#[test]
fn test_missing_settings_file_requires_setup() {
    let fx = Fixture::new();
    let cfg = NodeConfig::load(&fx.data).unwrap();
    assert!(cfg.is_new);

    let err = fx.deployer(&cfg).compose_command(&cfg, &[], "up").unwrap_err();
    assert!(err.is_config());
    assert!(!fx.data.join("runtime").exists());
}

#[test]
fn test_staging_keeps_user_edits_across_runs() {
    let fx = Fixture::new();
    let cfg = fx.settings(LOCAL_WITH_METRICS);
    let deployer = fx.deployer(&cfg);

    deployer.deploy(&cfg).unwrap();
    let override_node = fx.data.join("override/node.yml");
    fs::write(&override_node, "services:\n  node:\n    restart: always\n").unwrap();
    fs::remove_file(fx.data.join("addons/gww/graffiti.json")).unwrap();

    deployer.deploy(&cfg).unwrap();

    assert_eq!(
        fs::read_to_string(&override_node).unwrap(),
        "services:\n  node:\n    restart: always\n"
    );
    assert!(fx.data.join("addons/gww/graffiti.json").exists());
    assert_eq!(
        fs::read_to_string(fx.data.join("override/grafana.yml")).unwrap(),
        "# grafana\n\nservices: {}\n"
    );
}

#[test]
fn test_unwritable_rewards_dir_only_warns() {
    let fx = Fixture::new();
    let mut cfg = fx.settings(LOCAL_WITH_METRICS);
    let blocker = fx.data.join("not-a-dir");
    write(&blocker, "");
    cfg.rewards_tree_path = blocker.join("rewards").to_string_lossy().to_string();

    let deployment = fx.deployer(&cfg).deploy(&cfg).unwrap();
    assert_eq!(deployment.base().len(), 9);
    assert!(fx.data.join("data/custom-keys").is_dir());
}

struct CannedRunner {
    stdout: &'static str,
}

impl CommandRunner for CannedRunner {
    fn run(&self, _cmd: &str) -> Result<(), RunnerError> {
        Ok(())
    }

    fn read_output(&self, cmd: &str) -> Result<String, RunnerError> {
        assert!(cmd.ends_with(" config --images"));
        Ok(self.stdout.to_string())
    }
}

#[test]
fn test_images_split_on_whitespace() {
    let fx = Fixture::new();
    let cfg = fx.settings(LOCAL_WITH_METRICS);
    let runner = CannedRunner {
        stdout: "example/node:latest\nexample/vc:latest\n  example/ec:latest\n",
    };

    let images = fx.deployer(&cfg).compose_images(&cfg, &runner).unwrap();
    assert_eq!(
        images,
        vec!["example/node:latest", "example/vc:latest", "example/ec:latest"]
    );
}

#[cfg(unix)]
#[test]
fn test_quoted_arguments_survive_the_shell() {
    use compose_deploy::{shell_quote, ShellRunner};

    let args = ["plain", "with space", "it's", "$HOME", "a;b", ""];
    let quoted: Vec<String> = args.iter().map(|a| shell_quote(a)).collect();
    let cmd = format!("printf '%s\\n' {}", quoted.join(" "));

    let out = ShellRunner.read_output(&cmd).unwrap();
    let lines: Vec<&str> = out.split('\n').collect();
    assert_eq!(&lines[..args.len()], &args[..]);
}
