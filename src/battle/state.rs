//! Battle state: lineup, turn counter and terminal flags
//!
//! Lineup indices stay stable for a whole round. Defeated enemies are only
//! marked; they leave the lineup when the next round starts, and spawned
//! enemies are appended behind the current round's actors.

use std::cmp::Reverse;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::combat::Combatant;
use crate::core::types::EnemyId;

/// How a battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Lose,
    /// No enemy ever showed up, or the round cap was hit
    Abandoned,
}

/// Exact rational turn counter
///
/// Starts at 1 and grows by `1/n` per completed actor turn with `n` active
/// combatants, so a full round adds exactly 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnCounter {
    num: u64,
    den: u64,
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl TurnCounter {
    pub fn new() -> Self {
        Self { num: 1, den: 1 }
    }

    pub fn advance(&mut self, active: usize) {
        let Ok(n) = u64::try_from(active) else {
            return;
        };
        if n == 0 {
            return;
        }
        let num = self.num * n + self.den;
        let den = self.den * n;
        let divisor = gcd(num, den);
        self.num = num / divisor;
        self.den = den / divisor;
    }

    pub fn floor(&self) -> u64 {
        self.num / self.den
    }

    pub fn ratio(&self) -> (u64, u64) {
        (self.num, self.den)
    }
}

impl Default for TurnCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct BattleState {
    pub lineup: Vec<Combatant>,
    pending_removal: AHashSet<usize>,
    pub turn: TurnCounter,
    pub won: bool,
    pub lost: bool,
    /// Group coin balance during the session
    pub coins: u32,
    /// Enemies that ever joined the lineup
    pub spawned: u32,
    pub round: u32,
    /// Result of this round's block vote, `None` until it ran
    pub blocked: Option<bool>,
}

impl BattleState {
    pub fn new(player: Combatant, coins: u32) -> Self {
        Self {
            lineup: vec![player],
            pending_removal: AHashSet::new(),
            turn: TurnCounter::new(),
            won: false,
            lost: false,
            coins,
            spawned: 0,
            round: 0,
            blocked: None,
        }
    }

    pub fn player_index(&self) -> Option<usize> {
        self.lineup.iter().position(Combatant::is_player)
    }

    pub fn player(&self) -> Option<&Combatant> {
        self.lineup.iter().find(|c| c.is_player())
    }

    pub fn player_mut(&mut self) -> Option<&mut Combatant> {
        self.lineup.iter_mut().find(|c| c.is_player())
    }

    pub fn is_active(&self, index: usize) -> bool {
        index < self.lineup.len() && !self.pending_removal.contains(&index)
    }

    pub fn active_indices(&self) -> Vec<usize> {
        (0..self.lineup.len()).filter(|i| self.is_active(*i)).collect()
    }

    pub fn active_len(&self) -> usize {
        self.lineup.len() - self.pending_removal.len()
    }

    /// Active enemies in lineup order
    pub fn enemy_indices(&self) -> Vec<usize> {
        self.active_indices()
            .into_iter()
            .filter(|i| self.lineup[*i].is_enemy())
            .collect()
    }

    /// First active enemy spawned from roster entry `id`
    pub fn find_enemy(&self, id: EnemyId) -> Option<usize> {
        self.active_indices()
            .into_iter()
            .find(|i| self.lineup[*i].enemy_id() == Some(id))
    }

    /// Flag a combatant for removal at the next round start
    pub fn mark_defeated(&mut self, index: usize) -> bool {
        index < self.lineup.len() && self.pending_removal.insert(index)
    }

    pub fn apply_removals(&mut self) {
        if self.pending_removal.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_removal);
        let mut index = 0;
        self.lineup.retain(|_| {
            let keep = !pending.contains(&index);
            index += 1;
            keep
        });
    }

    /// Stable sort by descending SPEED
    pub fn order_by_speed(&mut self) {
        self.apply_removals();
        self.lineup.sort_by_key(|c| Reverse(c.current.speed));
    }

    pub fn spawn(&mut self, enemy: Combatant) -> usize {
        self.lineup.push(enemy);
        self.spawned += 1;
        self.lineup.len() - 1
    }

    /// Terminal outcome so far; a loss wins over a simultaneous win
    pub fn outcome(&self) -> Option<Outcome> {
        if self.lost {
            Some(Outcome::Lose)
        } else if self.won {
            Some(Outcome::Win)
        } else {
            None
        }
    }
}
