//! Compose Deploy CLI
//!
//! Entry point for the `compose-deploy` command-line tool.

use clap::{Parser, Subcommand};
use compose_deploy::config::{expand_home, DEFAULT_INSTALL_DIR};
use compose_deploy::{
    logging, shell_quote, CommandRunner, Deployer, NodeConfig, PathConfig, PlaceholderEngine,
    ShellRunner,
};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "compose-deploy")]
#[command(about = "Deploy node container manifests and run Docker Compose", version)]
struct Cli {
    /// Node data directory holding user-settings.toml
    #[arg(long, global = true, default_value = "~/.rocketpool")]
    data_dir: String,

    /// Installed template root
    #[arg(long, global = true, default_value = DEFAULT_INSTALL_DIR)]
    install_dir: PathBuf,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy manifests and print the compose command without running it
    Command {
        /// Additional compose file, merged after the base manifests
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,

        /// Arguments passed to docker compose (after --)
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Deploy manifests and print their paths in merge order
    Deploy,

    /// Deploy manifests and start the node in the background
    Up {
        /// Additional compose file, merged after the base manifests
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,
    },

    /// List the container images the deployed manifests reference
    Images,

    /// Print the containers the current settings deploy
    Services,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let ctx = Context::load(&cli.data_dir, cli.install_dir);

    match cli.command {
        Commands::Command { files, args } => run_command(&ctx, &files, &args),
        Commands::Deploy => run_deploy(&ctx),
        Commands::Up { files } => run_up(&ctx, &files),
        Commands::Images => run_images(&ctx),
        Commands::Services => run_services(&ctx),
    }
}

struct Context {
    cfg: NodeConfig,
    deployer: Deployer,
}

impl Context {
    fn load(data_dir: &str, install_dir: PathBuf) -> Self {
        let data_dir = match expand_home(data_dir) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        };

        let cfg = match NodeConfig::load(&data_dir) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading settings: {}", e);
                process::exit(1);
            }
        };

        let layout = match PathConfig::for_config(install_dir, &cfg) {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        };

        let engine = match PlaceholderEngine::new() {
            Ok(e) => e,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        };

        Self {
            cfg,
            deployer: Deployer::new(layout, Box::new(engine)),
        }
    }
}

fn run_command(ctx: &Context, files: &[PathBuf], args: &[String]) {
    let args = args.iter().map(|a| shell_quote(a)).collect::<Vec<_>>().join(" ");
    match ctx.deployer.compose_command(&ctx.cfg, files, &args) {
        Ok(cmd) => println!("{}", cmd),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_deploy(ctx: &Context) {
    let result = ctx
        .deployer
        .check(&ctx.cfg)
        .and_then(|_| ctx.deployer.deploy(&ctx.cfg));
    match result {
        Ok(deployment) => {
            for path in deployment.all() {
                println!("{}", path.display());
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_up(ctx: &Context, files: &[PathBuf]) {
    let cmd = match ctx.deployer.compose_command(&ctx.cfg, files, "up -d") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = ShellRunner.run(&cmd) {
        eprintln!("Error starting the node: {}", e);
        process::exit(1);
    }
}

fn run_images(ctx: &Context) {
    match ctx.deployer.compose_images(&ctx.cfg, &ShellRunner) {
        Ok(images) => {
            for image in images {
                println!("{}", image);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_services(ctx: &Context) {
    if let Err(e) = ctx.deployer.check(&ctx.cfg) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    for id in ctx.deployer.resolver().resolve(&ctx.cfg) {
        println!("{}", id);
    }
}
