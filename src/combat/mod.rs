pub mod combatant;
pub mod resolution;

pub use combatant::{Combatant, CombatantKind, StatBlock};
pub use resolution::{
    offensive_damage, resolve, Operator, ResolutionOutcome, TargetEffect, TargetOutcome,
    MAX_HIT_LINES,
};
