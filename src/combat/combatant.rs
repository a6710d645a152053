//! Player and enemy fighters
//!
//! A combatant keeps two stat blocks: `baseline` is fixed at construction and
//! doubles as the HP/FP ceiling, `current` moves during the battle.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::core::types::{EnemyId, MoveId, Stat};

/// A full set of battle stats as stored in battle and settings records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    #[serde(rename = "HP")]
    pub hp: i32,
    /// Absent for combatants that don't use move-cost mechanics
    #[serde(rename = "FP", default, skip_serializing_if = "Option::is_none")]
    pub fp: Option<i32>,
    #[serde(rename = "POW")]
    pub pow: i32,
    #[serde(rename = "DEF")]
    pub def: i32,
    #[serde(rename = "SPEED")]
    pub speed: i32,
    #[serde(rename = "STACHE")]
    pub stache: i32,
}

impl StatBlock {
    pub fn new(hp: i32, pow: i32, def: i32, speed: i32, stache: i32) -> Self {
        Self {
            hp,
            fp: None,
            pow,
            def,
            speed,
            stache,
        }
    }

    pub fn with_fp(mut self, fp: i32) -> Self {
        self.fp = Some(fp);
        self
    }

    pub fn get(&self, stat: Stat) -> Option<i32> {
        match stat {
            Stat::Hp => Some(self.hp),
            Stat::Fp => self.fp,
            Stat::Pow => Some(self.pow),
            Stat::Def => Some(self.def),
            Stat::Speed => Some(self.speed),
            Stat::Stache => Some(self.stache),
        }
    }

    /// Overwrite a stat; FP is left untouched on blocks without FP
    pub fn set(&mut self, stat: Stat, value: i32) {
        match stat {
            Stat::Hp => self.hp = value,
            Stat::Fp => {
                if let Some(fp) = self.fp.as_mut() {
                    *fp = value;
                }
            }
            Stat::Pow => self.pow = value,
            Stat::Def => self.def = value,
            Stat::Speed => self.speed = value,
            Stat::Stache => self.stache = value,
        }
    }

    /// Permanent increase used by rewards; grants FP to blocks without it
    pub fn raise(&mut self, stat: Stat, by: i32) {
        match stat {
            Stat::Fp => self.fp = Some(self.fp.unwrap_or(0).saturating_add(by)),
            other => {
                let value = self.get(other).unwrap_or(0);
                self.set(other, value.saturating_add(by));
            }
        }
    }
}

/// Player or enemy, resolved once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatantKind {
    Player,
    Enemy {
        id: EnemyId,
        /// Aerial actions backfire on the attacker
        spiny: bool,
        /// Ground actions cannot connect
        flying: bool,
    },
}

/// A party member or opponent in the lineup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub kind: CombatantKind,
    pub current: StatBlock,
    pub baseline: StatBlock,
    /// Moves the combatant knows; stickers index into this list
    pub moves: Vec<Action>,
    inventory: AHashMap<MoveId, u32>,
}

impl Combatant {
    pub fn player(name: &str, stats: StatBlock, moves: Vec<Action>) -> Self {
        Self {
            name: name.to_string(),
            kind: CombatantKind::Player,
            current: stats,
            baseline: stats,
            moves,
            inventory: AHashMap::new(),
        }
    }

    pub fn enemy(
        id: EnemyId,
        name: &str,
        stats: StatBlock,
        moves: Vec<Action>,
        spiny: bool,
        flying: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind: CombatantKind::Enemy { id, spiny, flying },
            current: stats,
            baseline: stats,
            moves,
            inventory: AHashMap::new(),
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, CombatantKind::Player)
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self.kind, CombatantKind::Enemy { .. })
    }

    pub fn enemy_id(&self) -> Option<EnemyId> {
        match self.kind {
            CombatantKind::Enemy { id, .. } => Some(id),
            CombatantKind::Player => None,
        }
    }

    pub fn is_spiny(&self) -> bool {
        matches!(self.kind, CombatantKind::Enemy { spiny: true, .. })
    }

    pub fn is_flying(&self) -> bool {
        matches!(self.kind, CombatantKind::Enemy { flying: true, .. })
    }

    pub fn stat(&self, stat: Stat) -> Option<i32> {
        self.current.get(stat)
    }

    pub fn set_stat(&mut self, stat: Stat, value: i32) {
        self.current.set(stat, value);
    }

    /// Ceiling for increases of HP and FP; other stats are unbounded
    pub fn max_of(&self, stat: Stat) -> Option<i32> {
        match stat {
            Stat::Hp | Stat::Fp => self.baseline.get(stat),
            _ => None,
        }
    }

    pub fn hp(&self) -> i32 {
        self.current.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.baseline.hp
    }

    pub fn max_fp(&self) -> Option<i32> {
        self.baseline.fp
    }

    pub fn is_defeated(&self) -> bool {
        self.current.hp <= 0
    }

    pub fn restore_hp(&mut self) {
        self.current.hp = self.baseline.hp;
    }

    /// Add one sticker of `id`
    ///
    /// On FP-gated combatants every held sticker occupies one FP; nothing
    /// happens when FP is already exhausted. Returns whether it was added.
    pub fn add_sticker(&mut self, id: MoveId) -> bool {
        if let Some(fp) = self.current.fp.as_mut() {
            if *fp <= 0 {
                return false;
            }
            *fp -= 1;
        }
        *self.inventory.entry(id).or_insert(0) += 1;
        true
    }

    /// Consume one sticker of `id`, freeing its FP slot
    pub fn use_sticker(&mut self, id: MoveId) -> bool {
        let Some(count) = self.inventory.get_mut(&id) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.inventory.remove(&id);
        }
        if let (Some(fp), Some(max)) = (self.current.fp.as_mut(), self.baseline.fp) {
            *fp = (*fp + 1).min(max);
        }
        true
    }

    pub fn sticker_count(&self, id: MoveId) -> u32 {
        self.inventory.get(&id).copied().unwrap_or(0)
    }

    pub fn has_stickers(&self) -> bool {
        !self.inventory.is_empty()
    }

    /// Held stickers ordered by move id
    pub fn stickers(&self) -> Vec<(MoveId, u32)> {
        let mut held: Vec<_> = self.inventory.iter().map(|(id, n)| (*id, *n)).collect();
        held.sort_by_key(|(id, _)| *id);
        held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mario() -> Combatant {
        Combatant::player("Mario", StatBlock::new(10, 1, 0, 0, 0).with_fp(2), vec![])
    }

    #[test]
    fn test_current_starts_at_baseline() {
        let mut player = mario();
        assert_eq!(player.current, player.baseline);

        player.set_stat(Stat::Pow, 9);
        assert_eq!(player.baseline.pow, 1);
    }

    #[test]
    fn test_kind_queries() {
        let goomba = Combatant::enemy(
            EnemyId(0),
            "Spiny",
            StatBlock::new(5, 1, 0, 0, 0),
            vec![],
            true,
            false,
        );
        assert!(goomba.is_enemy());
        assert!(goomba.is_spiny());
        assert!(!goomba.is_flying());
        assert_eq!(goomba.enemy_id(), Some(EnemyId(0)));
        assert!(mario().is_player());
    }

    #[test]
    fn test_stickers_are_fp_gated() {
        let mut player = mario();
        assert!(player.add_sticker(MoveId(3)));
        assert!(player.add_sticker(MoveId(3)));
        assert!(!player.add_sticker(MoveId(1)));

        assert_eq!(player.sticker_count(MoveId(3)), 2);
        assert_eq!(player.stat(Stat::Fp), Some(0));
    }

    #[test]
    fn test_using_last_sticker_removes_entry() {
        let mut player = mario();
        player.add_sticker(MoveId(4));

        assert!(player.use_sticker(MoveId(4)));
        assert!(!player.has_stickers());
        assert_eq!(player.stat(Stat::Fp), Some(2));
        assert!(!player.use_sticker(MoveId(4)));
    }

    #[test]
    fn test_inventory_without_fp_is_ungated() {
        let mut player = Combatant::player("Luigi", StatBlock::new(10, 1, 0, 0, 0), vec![]);
        for _ in 0..10 {
            assert!(player.add_sticker(MoveId(0)));
        }
        assert_eq!(player.sticker_count(MoveId(0)), 10);
    }

    #[test]
    fn test_raise_grants_missing_fp() {
        let mut block = StatBlock::new(10, 1, 0, 0, 0);
        block.raise(Stat::Fp, 5);
        block.raise(Stat::Speed, 5);
        assert_eq!(block.fp, Some(5));
        assert_eq!(block.speed, 5);
    }

    #[test]
    fn test_raise_saturates() {
        let mut block = StatBlock::new(i32::MAX, 1, 0, 0, 0).with_fp(i32::MAX);
        block.raise(Stat::Hp, 5);
        block.raise(Stat::Fp, 5);
        assert_eq!(block.hp, i32::MAX);
        assert_eq!(block.fp, Some(i32::MAX));
    }
}
