//! In-memory BattleStore implementation.

use ahash::AHashMap;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::types::GroupId;
use crate::store::{check_slot, BattleDefinition, BattleStore, Settings, StoreError};

/// Keeps records in process memory; used by tests and the headless runner
#[derive(Debug, Default)]
pub struct MemoryStore {
    battles: RwLock<AHashMap<(GroupId, usize), BattleDefinition>>,
    settings: RwLock<AHashMap<GroupId, Settings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_battle(
        &self,
        group: &GroupId,
        slot: usize,
        battle: BattleDefinition,
    ) -> Result<(), StoreError> {
        check_slot(slot)?;
        self.battles.write().await.insert((group.clone(), slot), battle);
        Ok(())
    }
}

#[async_trait]
impl BattleStore for MemoryStore {
    async fn load_battle(
        &self,
        group: &GroupId,
        slot: usize,
    ) -> Result<Option<BattleDefinition>, StoreError> {
        check_slot(slot)?;
        Ok(self.battles.read().await.get(&(group.clone(), slot)).cloned())
    }

    async fn load_settings(&self, group: &GroupId) -> Result<Option<Settings>, StoreError> {
        Ok(self.settings.read().await.get(group).cloned())
    }

    async fn save_settings(&self, group: &GroupId, settings: &Settings) -> Result<(), StoreError> {
        self.settings
            .write()
            .await
            .insert(group.clone(), settings.clone());
        Ok(())
    }
}
