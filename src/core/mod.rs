pub mod config;
pub mod error;
pub mod types;

pub use config::{ChanceRule, ChanceRules, EngineConfig, TurnCounting};
pub use error::{BattleError, Result};
pub use types::{ActionType, EnemyId, GroupId, MoveId, Rarity, Stat, TargetMode};
