//! Condition engine
//!
//! Phases are compiled once per battle. Each run scans them in declaration
//! order and fires the first whose trigger holds.

use rand::Rng;

use crate::battle::BattleState;
use crate::core::config::EngineConfig;
use crate::narration::NarrationEvent;
use crate::phases::ast::Trigger;
use crate::phases::parser::{parse_script, parse_trigger};
use crate::phases::script::{execute, Directive};
use crate::store::{BattleDefinition, PhaseRecord};

#[derive(Debug, Clone)]
pub struct CompiledPhase {
    pub trigger: Trigger,
    pub script: Vec<Directive>,
}

#[derive(Debug, Clone, Default)]
pub struct ConditionEngine {
    phases: Vec<CompiledPhase>,
}

impl ConditionEngine {
    pub fn compile(records: &[PhaseRecord]) -> Self {
        let phases = records
            .iter()
            .map(|record| {
                let phase = CompiledPhase {
                    trigger: parse_trigger(&record.trigger),
                    script: parse_script(&record.result),
                };
                tracing::debug!(
                    trigger = %record.trigger,
                    clauses = phase.trigger.clauses.len(),
                    directives = phase.script.len(),
                    "compiled phase"
                );
                phase
            })
            .collect();
        Self { phases }
    }

    pub fn phases(&self) -> &[CompiledPhase] {
        &self.phases
    }

    /// Index of the first phase whose trigger holds
    pub fn first_satisfied(&self, state: &BattleState) -> Option<usize> {
        self.phases.iter().position(|p| p.trigger.holds(state))
    }

    /// Fire the first satisfied phase, if any
    pub fn run<R: Rng + ?Sized>(
        &self,
        state: &mut BattleState,
        definition: &BattleDefinition,
        config: &EngineConfig,
        rng: &mut R,
    ) -> Vec<NarrationEvent> {
        let mut events = Vec::new();
        let Some(index) = self.first_satisfied(state) else {
            return events;
        };

        tracing::debug!(
            phase = index,
            turn = state.turn.floor(),
            scores = ?self.phases[index].trigger.scores(state),
            "phase fired"
        );
        for directive in &self.phases[index].script {
            execute(directive, state, definition, config, rng, &mut events);
        }
        events
    }
}
