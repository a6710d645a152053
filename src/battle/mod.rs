//! Battle system - turn-based party vs enemies with quorum votes
//!
//! The player's moves are decided by the chat participants; enemies pick at
//! random. Scripted phases can spawn enemies, force moves and end the battle.

pub mod execution;
pub mod reward;
pub mod state;
pub mod stickers;

pub use execution::{BattleContext, Decision, PartingBonus, Scheduler, SchedulerPhase};
pub use reward::{roster_coins, select_stats, RewardSummary};
pub use state::{BattleState, Outcome, TurnCounter};
pub use stickers::{draw_rarity, grant_stickers, random_sticker};
