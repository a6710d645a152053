//! Party Battle - turn-based party vs enemy battles for group chats

pub mod actions;
pub mod battle;
pub mod combat;
pub mod core;
pub mod narration;
pub mod phases;
pub mod session;
pub mod store;
pub mod vote;

pub use battle::Outcome;
pub use session::{BattleReport, BattleSession, BattleSource};
