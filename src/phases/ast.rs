//! Trigger expressions and their evaluation against the battle state

use crate::battle::BattleState;
use crate::core::types::{EnemyId, Stat};

/// Comparison operator of an enemy stat term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparison {
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Comparison::Eq => lhs == rhs,
            Comparison::Lt => lhs < rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Ge => lhs >= rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// No enemy is active
    Start,
    /// `T<n>`: the floored turn counter equals n
    Turn(u64),
    /// `T+<n>`: the floored turn counter is a positive multiple of n
    TurnMultiple(u64),
    /// `e<idx><op><value><STAT>` against the first active enemy with that id
    Enemy {
        id: EnemyId,
        cmp: Comparison,
        value: i64,
        stat: Stat,
    },
    /// Anything the grammar doesn't know; never holds
    Unrecognized(String),
}

impl Term {
    pub fn holds(&self, state: &BattleState) -> bool {
        match self {
            Term::Start => state.enemy_indices().is_empty(),
            Term::Turn(n) => state.turn.floor() == *n,
            Term::TurnMultiple(n) => {
                let turn = state.turn.floor();
                *n > 0 && turn > 0 && turn % n == 0
            }
            Term::Enemy {
                id,
                cmp,
                value,
                stat,
            } => state
                .find_enemy(*id)
                .and_then(|i| state.lineup[i].stat(*stat))
                .is_some_and(|current| cmp.holds(i64::from(current), *value)),
            Term::Unrecognized(_) => false,
        }
    }
}

/// Conjunction of terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub terms: Vec<Term>,
}

impl Clause {
    /// Share of terms that hold, for diagnostics
    pub fn score(&self, state: &BattleState) -> f64 {
        if self.terms.is_empty() {
            return 0.0;
        }
        let held = self.terms.iter().filter(|t| t.holds(state)).count();
        held as f64 / self.terms.len() as f64
    }

    pub fn holds(&self, state: &BattleState) -> bool {
        !self.terms.is_empty() && self.terms.iter().all(|t| t.holds(state))
    }
}

/// Disjunction of clauses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trigger {
    pub clauses: Vec<Clause>,
}

impl Trigger {
    pub fn holds(&self, state: &BattleState) -> bool {
        self.clauses.iter().any(|c| c.holds(state))
    }

    pub fn scores(&self, state: &BattleState) -> Vec<f64> {
        self.clauses.iter().map(|c| c.score(state)).collect()
    }
}
