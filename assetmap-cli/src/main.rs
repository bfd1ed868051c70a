//! AssetMap CLI - resolve maintenance-asset location codes to map coordinates.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{map, resolve};

#[derive(Parser)]
#[command(name = "assetmap", version, about = "Resolve asset location codes against GIS map services")]
struct Cli {
    /// Path to the config file (default: ~/.assetmap/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximo API key (overrides ASSETMAP_API_KEY and the config file)
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve location codes to display names and WGS84 coordinates
    Resolve {
        /// Location codes to resolve
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// List a department's assets grouped by resolved location
    Map {
        /// Department name (see the [departments] config section)
        #[arg(long)]
        department: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Resolve { codes } => {
            resolve::run(resolve::ResolveArgs {
                codes,
                config: cli.config,
                api_key: cli.api_key,
            })
            .await
        }
        Command::Map { department } => {
            map::run(map::MapArgs {
                department,
                config: cli.config,
                api_key: cli.api_key,
            })
            .await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_auth() => {
            eprintln!("error: {err}");
            eprintln!("The API key was rejected. Check --api-key, ASSETMAP_API_KEY, or the [assets] api_key config entry.");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
