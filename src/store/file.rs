//! File-based BattleStore implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::core::types::GroupId;
use crate::store::{check_slot, BattleDefinition, BattleStore, Settings, StoreError};

/// Stores each group under its own directory as JSON documents.
///
/// # File Layout
///
/// ```text
/// <base>/<group>/settings.json
/// <base>/<group>/battle_<slot>.json
/// ```
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    base_dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn group_dir(&self, group: &GroupId) -> PathBuf {
        self.base_dir.join(&group.0)
    }

    fn settings_path(&self, group: &GroupId) -> PathBuf {
        self.group_dir(group).join("settings.json")
    }

    fn battle_path(&self, group: &GroupId, slot: usize) -> PathBuf {
        self.group_dir(group).join(format!("battle_{}.json", slot))
    }

    async fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[async_trait]
impl BattleStore for JsonDirStore {
    async fn load_battle(
        &self,
        group: &GroupId,
        slot: usize,
    ) -> Result<Option<BattleDefinition>, StoreError> {
        check_slot(slot)?;
        let path = self.battle_path(group, slot);
        let Some(content) = Self::read_optional(&path).await? else {
            return Ok(None);
        };

        tracing::debug!("Loaded battle slot {} from {}", slot, path.display());
        BattleDefinition::from_json(&content).map(Some)
    }

    async fn load_settings(&self, group: &GroupId) -> Result<Option<Settings>, StoreError> {
        let Some(content) = Self::read_optional(&self.settings_path(group)).await? else {
            return Ok(None);
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Corrupted(e.to_string()))
    }

    async fn save_settings(&self, group: &GroupId, settings: &Settings) -> Result<(), StoreError> {
        let path = self.settings_path(group);
        let temp_path = path.with_extension("json.tmp");

        tokio::fs::create_dir_all(self.group_dir(group)).await?;
        let bytes = serde_json::to_vec_pretty(settings)
            .map_err(|e| StoreError::Corrupted(e.to_string()))?;

        // Write to temp file, then atomic rename
        tokio::fs::write(&temp_path, bytes).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        tracing::debug!("Saved settings for group {} to {}", group, path.display());
        Ok(())
    }
}
