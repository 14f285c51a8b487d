mod cmd;
mod locate;
mod output;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, jql::JqlSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "relsync",
    about = "Sync merges and release tags into ticket stage fields",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: relsync.yaml found upward from cwd, else built-in)
    #[arg(long, global = true, env = "RELSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Ticket store base URL, overriding the config
    #[arg(long, global = true, env = "RELSYNC_BASE_URL")]
    base_url: Option<String>,

    /// Ticket store user, overriding the config
    #[arg(long, global = true, env = "JIRA_USER")]
    user: Option<String>,

    /// Query the ticket store but do not update or comment
    #[arg(long, global = true)]
    dry_run: bool,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Promote tickets after a merge to the main branch
    Merge {
        /// Repository that was merged (owner/name)
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repo: String,
    },

    /// Tag and release tickets after a version tag push
    Release {
        /// Repository that was tagged (owner/name)
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repo: String,

        /// Tag reference, e.g. refs/tags/1.2.3
        #[arg(long = "ref", env = "GITHUB_REF")]
        git_ref: String,
    },

    /// Print the ticket filter a step would search with
    Jql {
        #[command(subcommand)]
        subcommand: JqlSubcommand,
    },

    /// Show or validate the effective configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Merge { .. } | Commands::Release { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level.as_str())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = locate::load_config(cli.config.as_deref()).and_then(|config| {
        let config = config.with_store_overrides(cli.base_url, cli.user);
        match cli.command {
            Commands::Merge { repo } => cmd::merge::run(&config, &repo, cli.dry_run, cli.json),
            Commands::Release { repo, git_ref } => {
                cmd::release::run(&config, &repo, &git_ref, cli.dry_run, cli.json)
            }
            Commands::Jql { subcommand } => cmd::jql::run(&config, subcommand, cli.json),
            Commands::Config { subcommand } => cmd::config::run(&config, subcommand, cli.json),
        }
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
