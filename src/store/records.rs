//! Battle definitions and group settings as stored records
//!
//! Every optional field defaults so that older or hand-written documents
//! (no custom moves, no FP, no dialogue) still load.

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::combat::{Combatant, StatBlock};
use crate::core::types::{EnemyId, Stat};
use crate::store::StoreError;

/// One enemy kind of a battle roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub name: String,
    #[serde(flatten)]
    pub stats: StatBlock,
    #[serde(default)]
    pub moves: Vec<Action>,
    #[serde(default)]
    pub spiny: bool,
    #[serde(default)]
    pub flying: bool,
}

impl EnemyTemplate {
    /// Fresh combatant for this roster entry
    pub fn spawn(&self, id: EnemyId) -> Combatant {
        Combatant::enemy(
            id,
            &self.name,
            self.stats,
            self.moves.clone(),
            self.spiny,
            self.flying,
        )
    }
}

/// Authored (trigger, result script) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub trigger: String,
    pub result: String,
}

impl PhaseRecord {
    pub fn new(trigger: &str, result: &str) -> Self {
        Self {
            trigger: trigger.to_string(),
            result: result.to_string(),
        }
    }
}

/// A dialogue speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// One line of a dialogue event; `speaker` is 1-based
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialogue {
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub events: Vec<Vec<DialogueLine>>,
}

/// A complete authored battle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleDefinition {
    #[serde(default)]
    pub enemies: Vec<EnemyTemplate>,
    #[serde(default)]
    pub phases: Vec<PhaseRecord>,
    #[serde(default)]
    pub dialogue: Dialogue,
}

impl BattleDefinition {
    /// Parse an uploaded battle document
    pub fn from_json(content: &str) -> Result<Self, StoreError> {
        serde_json::from_str(content).map_err(|e| StoreError::Corrupted(e.to_string()))
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&EnemyTemplate> {
        self.enemies.get(id.0)
    }
}

/// How end-of-battle rewards are distributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RewardMode {
    /// The participants vote for one option
    #[serde(alias = "choice")]
    Choice,
    /// Every option is granted
    #[default]
    #[serde(alias = "all")]
    All,
    /// One option is granted at random
    #[serde(alias = "random")]
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    #[serde(default = "default_reward_items")]
    pub items: Vec<Stat>,
    #[serde(default)]
    pub set: RewardMode,
}

fn default_reward_items() -> Vec<Stat> {
    vec![Stat::Hp]
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            items: default_reward_items(),
            set: RewardMode::All,
        }
    }
}

/// How FP is handled; only sticker mode is played by this engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleMode {
    #[default]
    Sticker,
    Badge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    #[serde(flatten)]
    pub stats: StatBlock,
}

impl Default for PlayerRecord {
    fn default() -> Self {
        Self {
            name: "Mario".into(),
            stats: StatBlock::new(10, 1, 0, 0, 0).with_fp(5),
        }
    }
}

/// Per-group settings: player baseline, coins, rewards and display options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: BattleMode,
    pub coins: u32,
    #[serde(rename = "hideHP")]
    pub hide_hp: bool,
    pub reward: RewardConfig,
    pub channel: String,
    pub player: PlayerRecord,
    /// Custom moves appended to the default sticker pool
    pub moves: Vec<Action>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: BattleMode::Sticker,
            coins: 100,
            hide_hp: false,
            reward: RewardConfig::default(),
            channel: String::new(),
            player: PlayerRecord::default(),
            moves: Vec::new(),
        }
    }
}
