//! Engine configuration with documented constants
//!
//! Every tunable number of the battle rules lives here. The defaults reproduce
//! the original chat minigame; a TOML file can override any subset of them.

use std::path::Path;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a probability roll compares the uniform draw against its threshold
///
/// The original game compared a continuous draw with `==`, which makes miss,
/// extra-turn and parting-bonus rolls practically impossible. `Exact` keeps
/// that behaviour; `AtMost` turns the threshold into a real probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanceRule {
    #[default]
    Exact,
    AtMost,
}

impl ChanceRule {
    /// Draw once from `[0, 1)` and test it against `threshold`
    #[allow(clippy::float_cmp)]
    pub fn roll<R: Rng + ?Sized>(self, rng: &mut R, threshold: f64) -> bool {
        let draw: f64 = rng.gen();
        match self {
            ChanceRule::Exact => draw == threshold,
            ChanceRule::AtMost => draw < threshold,
        }
    }
}

/// The chance rule used by each kind of roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChanceRules {
    /// Target dodges an action (threshold `STACHE / 100` of the target)
    pub miss: ChanceRule,
    /// Actor acts again (threshold `SPEED / 100` of the actor)
    pub extra_turn: ChanceRule,
    /// Defeating an enemy rewards the actor (threshold `STACHE / 100`)
    pub parting_bonus: ChanceRule,
}

/// When the fractional turn counter advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnCounting {
    /// Every completed actor turn advances the counter, repeats included
    #[default]
    PerActorTurn,
    /// Repeats of the same actor advance the counter only once
    PerActor,
}

/// A purchasable sticker album offered before the battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumTier {
    pub name: String,
    pub cost: u32,
    /// Relative weights for Normal, Shiny, Flashy stickers
    pub odds: [u32; 3],
}

/// Configuration for a battle session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === VOTING ===
    /// How long a quorum vote stays open (seconds)
    pub vote_window_secs: u64,

    /// Extra time granted to a vote collector past its window before the
    /// engine gives up on it and takes the default choice (milliseconds)
    pub vote_grace_ms: u64,

    /// Share of registered participants that must agree on one option
    pub quorum: f64,

    // === RANDOMNESS ===
    /// Fixed seed for reproducible battles; entropy when absent
    pub seed: Option<u64>,

    pub chance: ChanceRules,

    pub turn_counting: TurnCounting,

    // === REWARDS ===
    /// Baseline increase for each granted reward stat
    pub reward_increment: i32,

    /// POW/DEF increase granted by a parting bonus
    pub parting_bonus_increment: i32,

    // === STICKERS ===
    /// Coins paid for one battle spinner
    pub spinner_cost: u32,

    /// Stickers drawn by one battle spinner
    pub spinner_draws: u32,

    /// Odds used by the spinner and the block bonus (Normal, Shiny, Flashy)
    pub sticker_odds: [u32; 3],

    /// Albums offered before the battle, cheapest first
    pub albums: Vec<AlbumTier>,

    /// Block bonus chance is `(base + scale * STACHE / 100) / 100`
    pub block_bonus_base: f64,
    pub block_bonus_scale: f64,

    // === SAFETY ===
    /// Rounds after which a battle is abandoned
    pub max_rounds: u32,

    /// Identity used for system narration between dialogue lines
    pub narrator_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vote_window_secs: 30,
            vote_grace_ms: 500,
            quorum: 0.75,
            seed: None,
            chance: ChanceRules::default(),
            turn_counting: TurnCounting::default(),
            reward_increment: 5,
            parting_bonus_increment: 2,
            spinner_cost: 15,
            spinner_draws: 3,
            sticker_odds: [75, 20, 5],
            albums: vec![
                AlbumTier {
                    name: "Normal Album".into(),
                    cost: 50,
                    odds: [75, 20, 5],
                },
                AlbumTier {
                    name: "Shiny Album".into(),
                    cost: 100,
                    odds: [50, 35, 15],
                },
                AlbumTier {
                    name: "Flashy Album".into(),
                    cost: 200,
                    odds: [40, 35, 25],
                },
            ],
            block_bonus_base: 25.0,
            block_bonus_scale: 50.0,
            max_rounds: 200,
            narrator_name: "Starlow".into(),
        }
    }
}

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vote_window(&self) -> Duration {
        Duration::from_secs(self.vote_window_secs)
    }

    /// Window plus grace: the hard deadline for one vote
    pub fn vote_deadline(&self) -> Duration {
        self.vote_window() + Duration::from_millis(self.vote_grace_ms)
    }

    /// Load a config from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse a config from a TOML string; missing keys keep their defaults
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.quorum > 0.0 && self.quorum <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "quorum ({}) must be in (0, 1]",
                self.quorum
            )));
        }

        if self.vote_window_secs == 0 {
            return Err(ConfigError::Invalid("vote_window_secs must be positive".into()));
        }

        if self.sticker_odds.iter().all(|w| *w == 0) {
            return Err(ConfigError::Invalid("sticker_odds must not all be zero".into()));
        }

        for album in &self.albums {
            if album.odds.iter().all(|w| *w == 0) {
                return Err(ConfigError::Invalid(format!(
                    "album '{}' has all-zero odds",
                    album.name
                )));
            }
        }

        // Albums are listed cheapest first so affordability is a prefix
        if self.albums.windows(2).any(|pair| pair[0].cost > pair[1].cost) {
            return Err(ConfigError::Invalid("albums must be ordered by cost".into()));
        }

        Ok(())
    }
}
