//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use recall_core::{
    Card, CardId, DeckSummary, DeckTree, DueDateHistogram, PostponeEngine, RecallConfig,
    SchedulingEngine,
};
use serde::Serialize;

use crate::OutputFormat;

/// Resolve and load configuration.
///
/// An explicit path must exist. Without one, `RECALL_CONFIG` and then
/// `~/.recall/config.toml` are tried, falling back to defaults. Environment
/// overrides apply last.
pub fn load_config(explicit: Option<&Path>) -> Result<RecallConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::var("RECALL_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(default_config_path)
            .filter(|path| path.exists()),
    };

    let config = match path {
        Some(path) => {
            tracing::info!("Config file: {}", path.display());
            RecallConfig::from_file(&path)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => RecallConfig::default(),
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".recall").join("config.toml"))
}

/// Read a JSON array of cards.
pub fn read_cards(path: &Path) -> Result<Vec<Card>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let cards: Vec<Card> = serde_json::from_str(&text)
        .with_context(|| format!("parsing cards in {}", path.display()))?;
    tracing::debug!(count = cards.len(), "Loaded cards");
    Ok(cards)
}

/// Write cards as a pretty-printed JSON array.
pub fn write_cards(path: &Path, cards: &[Card]) -> Result<()> {
    let text = serde_json::to_string_pretty(cards)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Build the tree of today's queues.
///
/// Cards due later are not queued but still count towards deck totals.
pub fn build_tree(cards: Vec<Card>) -> DeckTree {
    let now = Utc::now();
    let (queued, waiting): (Vec<Card>, Vec<Card>) =
        cards.into_iter().partition(|c| c.due.map_or(true, |due| due <= now));

    let mut tree = DeckTree::from_cards(queued);
    for card in &waiting {
        tree.create_deck(&card.deck_path);
        if let Err(e) = tree.count_flashcard(&card.deck_path, 1) {
            tracing::debug!(error = %e, "Could not count waiting card");
        }
    }
    tree.sort_children();
    tracing::debug!(waiting = waiting.len(), "Built deck tree");
    tree
}

pub fn decks(cards: &Path, format: OutputFormat) -> Result<()> {
    let tree = build_tree(read_cards(cards)?);
    let summary = tree
        .summary(tree.root())
        .context("deck tree has no root")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Plain => {
            println!("{:<40} {:>6} {:>6} {:>6}", "Deck", "Due", "New", "Total");
            for child in &summary.children {
                print_deck(child, 0);
            }
        }
    }
    Ok(())
}

fn print_deck(deck: &DeckSummary, depth: usize) {
    let name = format!("{}{}", "  ".repeat(depth), deck.name);
    println!(
        "{:<40} {:>6} {:>6} {:>6}",
        name, deck.due_count, deck.new_count, deck.total_count
    );
    for child in &deck.children {
        print_deck(child, depth + 1);
    }
}

pub fn postpone(
    config: &RecallConfig,
    cards_path: &Path,
    days: Option<f64>,
    output: Option<&Path>,
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut cards = read_cards(cards_path)?;
    let engine = PostponeEngine::new(config.postpone.clone());
    let report = engine.postpone(&mut cards, days);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => println!(
            "Examined {} cards: {} overdue, {} below retention floor, {} postponed",
            report.examined,
            report.overdue,
            report.below_floor,
            report.postponed.len()
        ),
    }

    if dry_run || report.postponed.is_empty() {
        return Ok(());
    }
    let target = output.unwrap_or(cards_path);
    write_cards(target, &cards)?;
    tracing::info!("Wrote {} cards to {}", cards.len(), target.display());
    Ok(())
}

#[derive(Serialize)]
struct PreviewRow {
    response: String,
    interval: f64,
    ease: u32,
}

pub fn preview(
    config: &RecallConfig,
    cards_path: &Path,
    id: u64,
    format: OutputFormat,
) -> Result<()> {
    let cards = read_cards(cards_path)?;
    let card = cards
        .iter()
        .find(|c| c.id == CardId(id))
        .with_context(|| format!("no card with id {}", id))?;

    let today = Utc::now().date_naive();
    let histogram = DueDateHistogram::from_due_dates(
        cards
            .iter()
            .filter(|c| c.id != card.id)
            .filter_map(|c| c.due.map(|due| due.date_naive())),
        today,
    );

    let engine = SchedulingEngine::new(config.scheduling.clone());
    let rows: Vec<PreviewRow> = engine
        .preview(card, Some(&histogram))
        .into_iter()
        .map(|(kind, result)| PreviewRow {
            response: kind.to_string(),
            interval: result.interval,
            ease: result.ease,
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{:<8} {:>8} days  ease {}%", row.response, row.interval, row.ease);
            }
        }
    }
    Ok(())
}
