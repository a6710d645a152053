//! Battle session entry point
//!
//! A session owns everything one battle needs: the group it runs for, the
//! engine configuration and the three collaborators. Nothing is global, so
//! several groups can run sessions side by side.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::actions::MoveCatalog;
use crate::battle::{BattleContext, Outcome, RewardSummary, Scheduler};
use crate::core::config::EngineConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::GroupId;
use crate::narration::NarrationSink;
use crate::store::{BattleDefinition, BattleStore};
use crate::vote::VoteCollector;

/// Where the battle definition comes from
#[derive(Debug, Clone)]
pub enum BattleSource {
    /// A saved battle slot of the group (1-based)
    Slot(usize),
    /// An uploaded JSON battle document
    Document(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct BattleReport {
    pub outcome: Outcome,
    pub rounds: u32,
    pub turn: u64,
    pub coins: u32,
    pub rewards: Option<RewardSummary>,
}

pub struct BattleSession {
    group: GroupId,
    config: EngineConfig,
    store: Arc<dyn BattleStore>,
    votes: Arc<dyn VoteCollector>,
    narrator: Arc<dyn NarrationSink>,
    participants: u32,
}

impl BattleSession {
    pub fn new(
        group: GroupId,
        config: EngineConfig,
        store: Arc<dyn BattleStore>,
        votes: Arc<dyn VoteCollector>,
        narrator: Arc<dyn NarrationSink>,
    ) -> Self {
        Self {
            group,
            config,
            store,
            votes,
            narrator,
            participants: 1,
        }
    }

    /// Number of registered participants quorum votes are measured against
    pub fn with_participants(mut self, participants: u32) -> Self {
        self.participants = participants.max(1);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn load_definition(&self, source: &BattleSource) -> Result<BattleDefinition> {
        match source {
            BattleSource::Slot(slot) => self
                .store
                .load_battle(&self.group, *slot)
                .await?
                .ok_or(BattleError::EmptySlot(*slot)),
            BattleSource::Document(content) => Ok(BattleDefinition::from_json(content)?),
        }
    }

    /// Play one battle to its end and persist the group's settings
    pub async fn run(&self, source: BattleSource) -> Result<BattleReport> {
        self.config.validate()?;

        let definition = self.load_definition(&source).await?;
        let settings = self
            .store
            .load_settings(&self.group)
            .await?
            .unwrap_or_default();
        let catalog = MoveCatalog::with_custom(&settings.moves);
        let rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let ctx = BattleContext {
            config: &self.config,
            definition: &definition,
            catalog: &catalog,
            votes: self.votes.as_ref(),
            narrator: self.narrator.as_ref(),
            store: self.store.as_ref(),
            group: &self.group,
            participants: self.participants,
        };
        let mut scheduler = Scheduler::new(ctx, settings, rng);
        let outcome = scheduler.run().await?;

        Ok(BattleReport {
            outcome,
            rounds: scheduler.state().round,
            turn: scheduler.state().turn.floor(),
            coins: scheduler.settings().coins,
            rewards: scheduler.rewards().cloned(),
        })
    }
}
