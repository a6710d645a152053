//! Battle definition and settings storage
//!
//! The engine only needs three operations from persistence: read a battle
//! record, read a group's settings and write them back. Formats and
//! versioning belong to the implementations.

pub mod file;
pub mod memory;
pub mod records;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::GroupId;

pub use file::JsonDirStore;
pub use memory::MemoryStore;
pub use records::{
    BattleDefinition, BattleMode, Character, Dialogue, DialogueLine, EnemyTemplate, PhaseRecord,
    PlayerRecord, RewardConfig, RewardMode, Settings,
};

/// Number of battle slots a group can fill
pub const BATTLE_SLOTS: usize = 5;

/// Errors surfaced by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupted record: {0}")]
    Corrupted(String),

    #[error("battle slot {0} is out of range (1-{BATTLE_SLOTS})")]
    InvalidSlot(usize),
}

/// Read-only battle records plus read/write group settings
#[async_trait]
pub trait BattleStore: Send + Sync {
    /// Load the battle saved in a 1-based slot
    async fn load_battle(
        &self,
        group: &GroupId,
        slot: usize,
    ) -> Result<Option<BattleDefinition>, StoreError>;

    /// Load a group's settings, `None` when the group never saved any
    async fn load_settings(&self, group: &GroupId) -> Result<Option<Settings>, StoreError>;

    async fn save_settings(&self, group: &GroupId, settings: &Settings) -> Result<(), StoreError>;
}

pub(crate) fn check_slot(slot: usize) -> Result<(), StoreError> {
    if slot == 0 || slot > BATTLE_SLOTS {
        return Err(StoreError::InvalidSlot(slot));
    }
    Ok(())
}
