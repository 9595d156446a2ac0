//! Recall CLI - inspect and maintain spaced-repetition card files.
//!
//! Cards are read from a JSON array of card descriptors, the same shape
//! `recall_core::Card` serializes to.
//!
//! # Configuration
//!
//! - `--config <path>` or `RECALL_CONFIG` - config file (`.toml`, `.json`,
//!   `.yaml`), defaults to `~/.recall/config.toml` when present
//! - `RECALL_BASE_EASE`, `RECALL_MAX_INTERVAL`, `RECALL_BURY_SIBLINGS`,
//!   `RECALL_RANDOMIZE`, `RECALL_LOAD_BALANCE` - override single settings
//! - `RUST_LOG` - log filter, logs go to stderr
//!
//! A `.env` file in the working directory is loaded first.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "recall", about = "Spaced-repetition deck tools", version)]
struct Cli {
    /// Config file (default: ~/.recall/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print the deck tree with due, new and total counts
    Decks {
        /// JSON card file
        cards: PathBuf,
    },

    /// Push back overdue cards that are still well retained
    Postpone {
        /// JSON card file
        cards: PathBuf,
        /// Make every postponed card due this many days from now
        #[arg(long)]
        days: Option<f64>,
        /// Write updated cards here instead of back to the input file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Report only, do not write
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the interval each response would give a card
    Preview {
        /// JSON card file
        cards: PathBuf,
        /// Card id
        id: u64,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Decks { cards } => commands::decks(&cards, cli.format),
        Command::Postpone {
            cards,
            days,
            output,
            dry_run,
        } => commands::postpone(&config, &cards, days, output.as_deref(), dry_run, cli.format),
        Command::Preview { cards, id } => commands::preview(&config, &cards, id, cli.format),
    }
}
