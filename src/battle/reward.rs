//! End-of-battle rewards

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::core::types::Stat;
use crate::store::{BattleDefinition, RewardConfig, RewardMode, Settings};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardSummary {
    pub stats: Vec<Stat>,
    pub increment: i32,
    pub coins: u32,
}

/// Stats granted under `config`; `vote` is the participants' pick in Choice mode
pub fn select_stats<R: Rng + ?Sized>(
    config: &RewardConfig,
    vote: Option<usize>,
    rng: &mut R,
) -> Vec<Stat> {
    match config.set {
        RewardMode::All => config.items.clone(),
        RewardMode::Choice => config
            .items
            .get(vote.unwrap_or(0))
            .or_else(|| config.items.first())
            .copied()
            .into_iter()
            .collect(),
        RewardMode::Random => config.items.choose(rng).copied().into_iter().collect(),
    }
}

/// Coins for a win: HP + POW + DEF of every roster entry, defeated or not
pub fn roster_coins(definition: &BattleDefinition) -> u32 {
    let total: i64 = definition
        .enemies
        .iter()
        .map(|e| i64::from(e.stats.hp) + i64::from(e.stats.pow) + i64::from(e.stats.def))
        .sum();
    u32::try_from(total.max(0)).unwrap_or(u32::MAX)
}

/// Raise the stored player baseline and credit the coins
pub fn apply(settings: &mut Settings, stats: &[Stat], increment: i32, coins: u32) -> RewardSummary {
    for stat in stats {
        settings.player.stats.raise(*stat, increment);
    }
    settings.coins = settings.coins.saturating_add(coins);

    RewardSummary {
        stats: stats.to_vec(),
        increment,
        coins,
    }
}
