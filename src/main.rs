mod catalog;
mod cli;
mod config;
mod db;
mod feed;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "memlane", version, about = "Adaptive memory-lane feed for your inventory")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport)
    Serve,
    /// Print feed entries, delivered in paced batches
    Feed {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
        /// Seed the feed randomness for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
        /// Print one JSON object per entry
        #[arg(long)]
        json: bool,
    },
    /// Show the score breakdown for one item
    Inspect {
        /// Item ID
        id: String,
    },
    /// Show catalog statistics
    Stats,
    /// Import items from a JSON file ({"items": [...]})
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::LaneConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve_stdio(config).await?;
        }
        Command::Feed { count, seed, json } => {
            if seed.is_some() {
                config.feed.seed = seed;
            }
            cli::feed::feed(&config, count, json).await?;
        }
        Command::Inspect { id } => {
            cli::inspect::inspect(&config, &id).await?;
        }
        Command::Stats => {
            cli::stats::stats(&config)?;
        }
        Command::Import { file } => {
            cli::import::import(&config, &file)?;
        }
    }

    Ok(())
}
