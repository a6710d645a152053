//! Result script directives and their execution

use rand::seq::SliceRandom;
use rand::Rng;

use crate::actions::Action;
use crate::battle::BattleState;
use crate::combat::resolve;
use crate::core::config::EngineConfig;
use crate::core::types::{EnemyId, TargetMode};
use crate::narration::NarrationEvent;
use crate::store::BattleDefinition;

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Win,
    Lose,
    /// Authored move `action` of roster enemy `enemy`, aimed at the player
    EnemyMove { enemy: usize, action: usize },
    /// Inline action aimed at enemies; `slot` picks the target of `One`
    InlineMove { action: Action, slot: Option<usize> },
    /// 1-based dialogue event
    Event(usize),
    System(String),
    Spawn { enemy: EnemyId, count: u32 },
}

/// Apply one directive, collecting what should be narrated
pub fn execute<R: Rng + ?Sized>(
    directive: &Directive,
    state: &mut BattleState,
    definition: &BattleDefinition,
    config: &EngineConfig,
    rng: &mut R,
    events: &mut Vec<NarrationEvent>,
) {
    match directive {
        Directive::Win => state.won = true,
        Directive::Lose => state.lost = true,
        Directive::EnemyMove { enemy, action } => {
            let Some(action) = definition
                .enemies
                .get(*enemy)
                .and_then(|template| template.moves.get(*action))
            else {
                tracing::warn!(enemy, action, "scripted move references an unknown move");
                return;
            };
            let Some(player) = state.player_index() else {
                return;
            };
            let outcome = resolve(
                action,
                &mut state.lineup,
                &[player],
                None,
                false,
                config.chance.miss,
                rng,
            );
            events.push(NarrationEvent::Action(outcome));
        }
        Directive::InlineMove { action, slot } => {
            let enemies = state.enemy_indices();
            let targets = match action.target {
                TargetMode::All => enemies,
                TargetMode::Random => enemies.choose(rng).copied().into_iter().collect(),
                TargetMode::One => match slot.and_then(|s| enemies.get(s).copied()) {
                    Some(target) => vec![target],
                    None => {
                        tracing::warn!(?slot, "scripted move has no target in that slot");
                        return;
                    }
                },
            };
            let outcome = resolve(
                action,
                &mut state.lineup,
                &targets,
                None,
                false,
                config.chance.miss,
                rng,
            );
            events.push(NarrationEvent::Action(outcome));
        }
        Directive::Event(n) => {
            let Some(lines) = n
                .checked_sub(1)
                .and_then(|i| definition.dialogue.events.get(i))
            else {
                tracing::warn!(event = n, "unknown dialogue event");
                return;
            };
            for line in lines {
                let speaker = line
                    .speaker
                    .checked_sub(1)
                    .and_then(|i| definition.dialogue.characters.get(i));
                if let Some(character) = speaker {
                    events.push(NarrationEvent::Dialogue {
                        speaker: character.name.clone(),
                        avatar: character.avatar.clone(),
                        text: line.text.clone(),
                    });
                }
            }
        }
        Directive::System(text) => {
            events.push(NarrationEvent::system(&config.narrator_name, text.clone()));
        }
        Directive::Spawn { enemy, count } => {
            let Some(template) = definition.enemy(*enemy) else {
                tracing::warn!(enemy = enemy.0 + 1, "spawn references an unknown enemy");
                return;
            };
            for _ in 0..*count {
                state.spawn(template.spawn(*enemy));
                events.push(NarrationEvent::Spawned {
                    name: template.name.clone(),
                });
            }
        }
    }
}
