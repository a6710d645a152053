//! Headless Battle Runner
//!
//! Plays a battle without a chat: votes come from a scripted list and the
//! narration goes to the log. Prints a JSON report when the battle ends.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use party_battle::core::config::EngineConfig;
use party_battle::core::types::GroupId;
use party_battle::narration::TracingNarrator;
use party_battle::store::{BattleStore, JsonDirStore, MemoryStore};
use party_battle::vote::ScriptedVoteCollector;
use party_battle::{BattleSession, BattleSource};
use tracing_subscriber::EnvFilter;

/// Headless Battle Runner - scripted votes, logged narration
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run a party battle headless and print the report as JSON")]
struct Args {
    /// Battle document to play (JSON)
    #[arg(long, conflicts_with = "slot")]
    battle: Option<PathBuf>,

    /// Saved battle slot (1-5) to load from the store
    #[arg(long)]
    slot: Option<usize>,

    /// Store directory holding <group>/settings.json and battle files
    #[arg(long)]
    store: Option<PathBuf>,

    /// Group identifier
    #[arg(long, default_value = "local")]
    group: String,

    /// Engine configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated ballot answers; '-' abstains
    #[arg(long, default_value = "")]
    votes: String,

    /// Registered participants for quorum votes
    #[arg(long, default_value_t = 1)]
    participants: u32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_votes(list: &str) -> Vec<Option<usize>> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.parse().ok())
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("party_battle=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load_from_toml(path)?,
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let source = match (&args.battle, args.slot) {
        (Some(path), _) => BattleSource::Document(tokio::fs::read_to_string(path).await?),
        (None, Some(slot)) => BattleSource::Slot(slot),
        (None, None) => return Err("either --battle or --slot is required".into()),
    };

    let store: Arc<dyn BattleStore> = match &args.store {
        Some(dir) => Arc::new(JsonDirStore::new(dir)),
        None => Arc::new(MemoryStore::new()),
    };

    let session = BattleSession::new(
        GroupId(args.group.clone()),
        config,
        store,
        Arc::new(ScriptedVoteCollector::new(parse_votes(&args.votes))),
        Arc::new(TracingNarrator),
    )
    .with_participants(args.participants);

    let report = session.run(source).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
