mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use rotor_core::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rotor",
    about = "Site rotation controller: periodically replace a hosted site with a fresh copy and redirect visitors to it",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./rotor.yaml when present)
    #[arg(long, global = true, env = "ROTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (rotate, status and update endpoints plus redirects)
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one rotation in-process against the configured store
    Rotate,

    /// Ask a running server to rotate and relay its response
    Trigger {
        /// Server base URL (default: server.url, else http://127.0.0.1:{port})
        #[arg(long)]
        server: Option<String>,
    },

    /// Trigger rotations on every interval boundary
    Schedule {
        /// Server base URL (default: server.url, else http://127.0.0.1:{port})
        #[arg(long)]
        server: Option<String>,

        /// Wait for the next boundary, trigger once, then exit
        #[arg(long)]
        once: bool,
    },

    /// Show the current site and rotation times
    Status,

    /// Point the rotation record at a site manually
    Update {
        /// Public URL of the site visitors should be sent to
        #[arg(long)]
        url: String,

        /// Platform site id (kept unchanged when omitted)
        #[arg(long)]
        site_id: Option<String>,
    },

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } | Commands::Schedule { .. } | Commands::Rotate => {
            tracing::Level::INFO
        }
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = Config::load(cli.config.as_deref())
        .map_err(anyhow::Error::from)
        .and_then(|config| match cli.command {
            Commands::Serve { port } => cmd::serve::run(config, port),
            Commands::Rotate => cmd::rotate::run(&config, cli.json),
            Commands::Trigger { server } => cmd::trigger::run(&config, server.as_deref()),
            Commands::Schedule { server, once } => {
                cmd::schedule::run(&config, server.as_deref(), once)
            }
            Commands::Status => cmd::status::run(&config, cli.json),
            Commands::Update { url, site_id } => {
                cmd::update::run(&config, &url, site_id.as_deref(), cli.json)
            }
            Commands::Config { subcommand } => cmd::config::run(&config, subcommand, cli.json),
        });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
