mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, plan::PlanArgs, task::TaskSubcommand};
use missionfit_core::config::StorageBackend;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "missionfit",
    about = "Fitness to-do list and AI workout/meal plan generator",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .missionfit/ or .git/)
    #[arg(long, global = true, env = "MISSIONFIT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config into the project
    Init {
        /// Task storage backend for a new config (json or redb)
        #[arg(long)]
        backend: Option<StorageBackend>,
    },

    /// Run the HTTP API
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage the task list
    Task {
        #[command(subcommand)]
        subcommand: TaskSubcommand,
    },

    /// Generate a workout plan, and optionally a meal plan, for a profile
    Plan(PlanArgs),

    /// Inspect and validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { backend } => cmd::init::run(&root, backend, cli.json),
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::Task { subcommand } => cmd::task::run(&root, subcommand, cli.json),
        Commands::Plan(args) => cmd::plan::run(&root, args, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
