//! Narration events and sinks
//!
//! The engine describes what happened as [`NarrationEvent`]s and hands them to
//! a [`NarrationSink`]. Rendering (embeds, avatars, webhooks) belongs to the
//! sink; the engine never reads anything back.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::battle::{Outcome, PartingBonus};
use crate::combat::ResolutionOutcome;
use crate::core::types::Stat;

/// One combatant's line of a round status board
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub name: String,
    /// Hidden for enemies when the group turned HP display off
    pub hp: Option<i32>,
    pub max_hp: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NarrationEvent {
    BattleStart {
        player: String,
    },
    RoundStatus {
        round: u32,
        turn: u64,
        lineup: Vec<StatusLine>,
    },
    Action(ResolutionOutcome),
    System {
        speaker: String,
        text: String,
    },
    Dialogue {
        speaker: String,
        avatar: Option<String>,
        text: String,
    },
    Spawned {
        name: String,
    },
    ExtraTurn {
        actor: String,
    },
    PartingBonus {
        actor: String,
        bonus: PartingBonus,
    },
    Blocked,
    StickerGained {
        recipient: String,
        sticker: String,
    },
    Purchase {
        item: String,
        cost: u32,
        coins_left: u32,
    },
    Defeated {
        name: String,
    },
    BattleEnd {
        outcome: Outcome,
    },
    Rewards {
        stats: Vec<Stat>,
        increment: i32,
        coins: u32,
    },
}

impl NarrationEvent {
    pub fn system(speaker: &str, text: impl Into<String>) -> Self {
        Self::System {
            speaker: speaker.to_string(),
            text: text.into(),
        }
    }

    /// Plain-text rendering, one or more lines
    pub fn render(&self) -> String {
        match self {
            Self::BattleStart { player } => format!("{} enters the battle!", player),
            Self::RoundStatus {
                round,
                turn,
                lineup,
            } => {
                let board: Vec<String> = lineup
                    .iter()
                    .map(|line| match (line.hp, line.max_hp) {
                        (Some(hp), Some(max)) => format!("{} {}/{}", line.name, hp, max),
                        (Some(hp), None) => format!("{} {}", line.name, hp),
                        _ => format!("{} ?", line.name),
                    })
                    .collect();
                format!("Round {} (turn {}): {}", round, turn, board.join(", "))
            }
            Self::Action(outcome) => {
                let mut text = outcome.title();
                for line in &outcome.lines {
                    text.push('\n');
                    text.push_str(line);
                }
                text
            }
            Self::System { speaker, text } => format!("{}: {}", speaker, text),
            Self::Dialogue { speaker, text, .. } => format!("{}: {}", speaker, text),
            Self::Spawned { name } => format!("{} appeared!", name),
            Self::ExtraTurn { actor } => format!("One more! {} acts again.", actor),
            Self::PartingBonus { actor, bonus } => {
                format!("Parting bonus for {}: {}", actor, bonus.label())
            }
            Self::Blocked => "Blocked! Incoming damage is halved this round.".to_string(),
            Self::StickerGained { recipient, sticker } => {
                format!("{} got a {} sticker.", recipient, sticker)
            }
            Self::Purchase {
                item,
                cost,
                coins_left,
            } => format!("Bought {} for {} coins ({} left).", item, cost, coins_left),
            Self::Defeated { name } => format!("{} was defeated!", name),
            Self::BattleEnd { outcome } => match outcome {
                Outcome::Win => "You win!".to_string(),
                Outcome::Lose => "Game over.".to_string(),
                Outcome::Abandoned => "The battle was abandoned.".to_string(),
            },
            Self::Rewards {
                stats,
                increment,
                coins,
            } => {
                let stats: Vec<String> = stats
                    .iter()
                    .map(|stat| format!("+{}{}", increment, stat))
                    .collect();
                format!("Rewards: {} and {} coins", stats.join(" "), coins)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("narration sink unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait NarrationSink: Send + Sync {
    async fn emit(&self, event: NarrationEvent) -> Result<(), NarrationError>;
}

/// Writes every event as a structured log line
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNarrator;

#[async_trait]
impl NarrationSink for TracingNarrator {
    async fn emit(&self, event: NarrationEvent) -> Result<(), NarrationError> {
        for line in event.render().lines() {
            tracing::info!(target: "party_battle::narration", "{}", line);
        }
        Ok(())
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingNarrator {
    events: Mutex<Vec<NarrationEvent>>,
}

impl RecordingNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<NarrationEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl NarrationSink for RecordingNarrator {
    async fn emit(&self, event: NarrationEvent) -> Result<(), NarrationError> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_hides_unknown_hp() {
        let event = NarrationEvent::RoundStatus {
            round: 2,
            turn: 3,
            lineup: vec![
                StatusLine {
                    name: "Mario".into(),
                    hp: Some(8),
                    max_hp: Some(10),
                },
                StatusLine {
                    name: "Goomba".into(),
                    hp: None,
                    max_hp: None,
                },
            ],
        };
        assert_eq!(event.render(), "Round 2 (turn 3): Mario 8/10, Goomba ?");
    }

    #[test]
    fn test_events_serialize_with_kind_tag() {
        let json = serde_json::to_value(NarrationEvent::Defeated {
            name: "Goomba".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "defeated");
        assert_eq!(json["name"], "Goomba");
    }

    #[tokio::test]
    async fn test_recording_keeps_order() {
        let narrator = RecordingNarrator::new();
        narrator
            .emit(NarrationEvent::system("Starlow", "Begin"))
            .await
            .unwrap();
        narrator.emit(NarrationEvent::Blocked).await.unwrap();

        let events = narrator.events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].render(), "Starlow: Begin");
    }
}
