//! Action resolution
//!
//! Applies one action to its targets in the lineup. Per target the order is:
//! reflex outcomes (spines, flight), miss roll, then the stat change.
//! The resolver only mutates stats and reports what happened; rendering the
//! outcome is left to the narration sink.

use rand::Rng;
use serde::Serialize;

use crate::actions::Action;
use crate::combat::Combatant;
use crate::core::config::ChanceRule;
use crate::core::types::{ActionType, Stat, TargetMode};

/// Damage dealt back to an attacker by spines
pub const SPINE_RECOIL: i32 = 1;

/// Hit batches longer than this are narrated as one line with a count
pub const MAX_HIT_LINES: i32 = 10;

/// Sign of a stat change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Minus,
    Plus,
}

impl Operator {
    pub fn symbol(self) -> char {
        match self {
            Operator::Minus => '-',
            Operator::Plus => '+',
        }
    }
}

/// What happened to one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TargetOutcome {
    /// Spines hurt the sender; the target is untouched
    Reflected { recoil: i32 },
    /// A flying target can't be reached from the ground
    Evaded,
    Missed,
    /// The stat moved by `magnitude` per hit
    Changed { magnitude: i32, before: i32, after: i32 },
    /// The target lacks the affected stat (FP on a combatant without FP)
    Unaffected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetEffect {
    pub target: String,
    pub outcome: TargetOutcome,
}

/// Structured summary of one resolved action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionOutcome {
    pub action: String,
    pub sender: Option<String>,
    /// "all enemies" for area actions, otherwise the first target's name
    pub target_label: String,
    pub stat: Stat,
    pub operator: Operator,
    /// Per-hit magnitude of the last stat change
    pub magnitude: i32,
    pub hits: i32,
    pub effects: Vec<TargetEffect>,
    /// One narration line per reflex outcome or per hit
    pub lines: Vec<String>,
}

impl ResolutionOutcome {
    fn empty(action: &Action, sender: Option<String>) -> Self {
        Self {
            action: action.display_name().to_string(),
            sender,
            target_label: String::new(),
            stat: action.stat,
            operator: if action.offense {
                Operator::Minus
            } else {
                Operator::Plus
            },
            magnitude: 0,
            hits: action.hits,
            effects: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Nothing was attempted (no targets or no hits)
    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn title(&self) -> String {
        match &self.sender {
            Some(sender) => format!("{}: {} -> {}.", sender, self.action, self.target_label),
            None => format!("-> {}.", self.target_label),
        }
    }
}

/// Raw offensive damage for one hit batch
///
/// `round((pow + amount - def) * b)` with `b = 0.5` when blocked. Rounding is
/// half-to-even and applied once, before the hits multiplier.
pub fn offensive_damage(pow: i32, amount: i32, def: i32, blocked: bool) -> i32 {
    let raw = f64::from(pow) + f64::from(amount) - f64::from(def);
    let factor = if blocked { 0.5 } else { 1.0 };
    // `as` saturates at the i32 bounds
    (raw * factor).round_ties_even() as i32
}

/// Resolve `action` against `targets` (indices into `lineup`)
///
/// `sender` is `None` for environmental or scripted actions, which then
/// attack with 0 POW. Invalid target indices are ignored.
pub fn resolve<R: Rng + ?Sized>(
    action: &Action,
    lineup: &mut [Combatant],
    targets: &[usize],
    sender: Option<usize>,
    blocked: bool,
    miss_rule: ChanceRule,
    rng: &mut R,
) -> ResolutionOutcome {
    let sender_name = sender.and_then(|i| lineup.get(i)).map(|c| c.name.clone());
    let mut outcome = ResolutionOutcome::empty(action, sender_name.clone());

    let targets: Vec<usize> = targets
        .iter()
        .copied()
        .filter(|i| *i < lineup.len())
        .collect();
    if targets.is_empty() || action.hits <= 0 {
        return outcome;
    }

    outcome.target_label = if action.target == TargetMode::All && action.offense {
        "all enemies".to_string()
    } else {
        lineup[targets[0]].name.clone()
    };

    let attacker_pow = sender.and_then(|i| lineup.get(i)).map_or(0, |c| c.current.pow);
    let who = sender_name.unwrap_or_else(|| "The attack".to_string());

    for target in targets {
        let effect = resolve_one(
            action,
            lineup,
            target,
            sender,
            attacker_pow,
            blocked,
            miss_rule,
            rng,
        );

        match &effect {
            TargetOutcome::Reflected { recoil } => {
                outcome
                    .lines
                    .push(format!("{} got hurt by spines! -{}HP", who, recoil));
            }
            TargetOutcome::Evaded => outcome.lines.push(format!("{} can't reach!", who)),
            TargetOutcome::Missed => outcome.lines.push(format!("{} missed!", who)),
            TargetOutcome::Changed { magnitude, .. } => {
                outcome.magnitude = *magnitude;
                let line = format!("{}{}{}", outcome.operator.symbol(), magnitude, action.stat);
                if action.hits > MAX_HIT_LINES {
                    outcome.lines.push(format!("{} x{}", line, action.hits));
                } else {
                    for _ in 0..action.hits {
                        outcome.lines.push(line.clone());
                    }
                }
            }
            TargetOutcome::Unaffected => {}
        }

        outcome.effects.push(TargetEffect {
            target: lineup[target].name.clone(),
            outcome: effect,
        });
    }

    outcome
}

#[allow(clippy::too_many_arguments)]
fn resolve_one<R: Rng + ?Sized>(
    action: &Action,
    lineup: &mut [Combatant],
    target: usize,
    sender: Option<usize>,
    attacker_pow: i32,
    blocked: bool,
    miss_rule: ChanceRule,
    rng: &mut R,
) -> TargetOutcome {
    // Step 1: reflexes
    if lineup[target].is_spiny() && action.kind == ActionType::Aerial {
        if let Some(attacker) = sender.and_then(|i| lineup.get_mut(i)) {
            attacker.current.hp = attacker.current.hp.saturating_sub(SPINE_RECOIL);
        }
        return TargetOutcome::Reflected {
            recoil: SPINE_RECOIL,
        };
    }
    if lineup[target].is_flying() && action.kind == ActionType::Ground {
        return TargetOutcome::Evaded;
    }

    // Step 2: miss roll against the target's stache
    let miss_threshold = f64::from(lineup[target].current.stache) / 100.0;
    if miss_rule.roll(rng, miss_threshold) {
        return TargetOutcome::Missed;
    }

    // Step 3: stat change
    let person = &mut lineup[target];
    let Some(before) = person.stat(action.stat) else {
        return TargetOutcome::Unaffected;
    };

    let (magnitude, after) = if action.offense {
        let damage = offensive_damage(attacker_pow, action.amount, person.current.def, blocked);
        (damage, before.saturating_sub(damage.saturating_mul(action.hits)))
    } else {
        let raised = before.saturating_add(action.amount.saturating_mul(action.hits));
        let after = match person.max_of(action.stat) {
            Some(max) => raised.min(max),
            None => raised,
        };
        (action.amount, after)
    };
    // FP stays within 0..=max FP either way; other stats have no floor
    let after = match (action.stat, person.max_of(Stat::Fp)) {
        (Stat::Fp, Some(max)) => after.min(max).max(0),
        (Stat::Fp, None) => after.max(0),
        _ => after,
    };

    person.set_stat(action.stat, after);
    TargetOutcome::Changed {
        magnitude,
        before,
        after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::StatBlock;
    use crate::core::types::EnemyId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn player(pow: i32) -> Combatant {
        Combatant::player("Mario", StatBlock::new(10, pow, 0, 0, 0).with_fp(5), vec![])
    }

    fn enemy(hp: i32, def: i32, spiny: bool, flying: bool) -> Combatant {
        Combatant::enemy(
            EnemyId(0),
            "Goomba",
            StatBlock::new(hp, 1, def, 0, 0),
            vec![],
            spiny,
            flying,
        )
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    /// Resolve with the exact miss rule, which practically never misses
    fn strike(
        action: &Action,
        lineup: &mut [Combatant],
        targets: &[usize],
        sender: Option<usize>,
        blocked: bool,
    ) -> ResolutionOutcome {
        resolve(action, lineup, targets, sender, blocked, ChanceRule::Exact, &mut rng())
    }

    #[test]
    fn test_basic_attack_scenario() {
        let mut lineup = vec![player(1), enemy(5, 0, false, false)];
        let jump = Action::attack("Jump", ActionType::Aerial, 1, 1);

        let outcome = strike(&jump, &mut lineup, &[1], Some(0), false);

        assert_eq!(lineup[1].hp(), 3);
        assert_eq!(outcome.magnitude, 2);
        assert_eq!(outcome.lines, vec!["-2HP".to_string()]);
        assert_eq!(outcome.title(), "Mario: Jump -> Goomba.");
    }

    #[test]
    fn test_hits_multiply_rounded_damage() {
        let mut lineup = vec![player(2), enemy(20, 1, false, false)];
        let hops = Action::attack("Hopslipper", ActionType::Aerial, 2, 3);

        let outcome = strike(&hops, &mut lineup, &[1], Some(0), false);

        // (2 + 2 - 1) = 3 per hit, 3 hits
        assert_eq!(lineup[1].hp(), 11);
        assert_eq!(outcome.lines.len(), 3);
    }

    #[test]
    fn test_block_halves_before_hits() {
        // raw 3 -> 1.5 -> 2 (half to even), times 2 hits
        assert_eq!(offensive_damage(1, 3, 1, true), 2);
        // raw 5 -> 2.5 -> 2
        assert_eq!(offensive_damage(2, 3, 0, true), 2);

        let mut lineup = vec![enemy(5, 0, false, false), player(0)];
        lineup[0].current.pow = 1;
        let bite = Action::attack("Bite", ActionType::Ground, 2, 2);
        strike(&bite, &mut lineup, &[1], Some(0), true);

        assert_eq!(lineup[1].hp(), 10 - 2 * 2);
    }

    #[test]
    fn test_spiny_reflects_aerial() {
        let mut lineup = vec![player(1), enemy(5, 0, true, false)];
        let jump = Action::attack("Jump", ActionType::Aerial, 1, 1);

        let outcome = strike(&jump, &mut lineup, &[1], Some(0), false);

        assert_eq!(lineup[1].hp(), 5);
        assert_eq!(lineup[0].hp(), 9);
        assert_eq!(
            outcome.effects[0].outcome,
            TargetOutcome::Reflected { recoil: 1 }
        );
    }

    #[test]
    fn test_spiny_does_not_reflect_ground() {
        let mut lineup = vec![player(1), enemy(5, 0, true, false)];
        let hammer = Action::attack("Hammer", ActionType::Ground, 1, 1);

        strike(&hammer, &mut lineup, &[1], Some(0), false);

        assert_eq!(lineup[1].hp(), 3);
        assert_eq!(lineup[0].hp(), 10);
    }

    #[test]
    fn test_flying_evades_ground() {
        let mut lineup = vec![player(1), enemy(5, 0, false, true)];
        let hammer = Action::attack("Hammer", ActionType::Ground, 1, 1);

        let outcome = strike(&hammer, &mut lineup, &[1], Some(0), false);

        assert_eq!(lineup[1].hp(), 5);
        assert_eq!(outcome.effects[0].outcome, TargetOutcome::Evaded);
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let mut lineup = vec![player(1)];
        lineup[0].current.hp = 4;
        let shroom = Action::boost("Mushroom", Stat::Hp, 5);

        strike(&shroom, &mut lineup, &[0], Some(0), false);
        assert_eq!(lineup[0].hp(), 9);

        strike(&shroom, &mut lineup, &[0], Some(0), false);
        assert_eq!(lineup[0].hp(), 10);
    }

    #[test]
    fn test_buff_is_unbounded() {
        let mut lineup = vec![player(1)];
        let mut power_up = Action::boost("Power Up", Stat::Pow, 3);
        power_up.hits = 2;

        let outcome = strike(&power_up, &mut lineup, &[0], None, false);

        assert_eq!(lineup[0].current.pow, 7);
        assert_eq!(outcome.operator, Operator::Plus);
        assert_eq!(outcome.title(), "-> Mario.");
    }

    #[test]
    fn test_missing_sender_attacks_with_zero_pow() {
        let mut lineup = vec![player(5)];
        let rock = Action::attack("Rock", ActionType::Magic, 3, 1);

        strike(&rock, &mut lineup, &[0], None, false);

        assert_eq!(lineup[0].hp(), 7);
    }

    #[test]
    fn test_empty_targets_and_zero_hits_are_noops() {
        let mut lineup = vec![player(1), enemy(5, 0, false, false)];
        let jump = Action::attack("Jump", ActionType::Aerial, 1, 1);
        let zero = Action::attack("Whiff", ActionType::Aerial, 1, 0);

        assert!(strike(&jump, &mut lineup, &[], Some(0), false).is_noop());
        assert!(strike(&zero, &mut lineup, &[1], Some(0), false).is_noop());
        assert!(strike(&jump, &mut lineup, &[7], Some(0), false).is_noop());
        assert_eq!(lineup[1].hp(), 5);
    }

    #[test]
    fn test_miss_with_at_most_rule() {
        let mut lineup = vec![player(1), enemy(5, 0, false, false)];
        lineup[1].current.stache = 100;
        let jump = Action::attack("Jump", ActionType::Aerial, 1, 1);

        let mut rng = rng();
        let outcome = resolve(
            &jump,
            &mut lineup,
            &[1],
            Some(0),
            false,
            ChanceRule::AtMost,
            &mut rng,
        );

        assert_eq!(outcome.effects[0].outcome, TargetOutcome::Missed);
        assert_eq!(lineup[1].hp(), 5);
    }

    #[test]
    fn test_fp_action_on_target_without_fp() {
        let mut lineup = vec![enemy(5, 0, false, false)];
        let drain = Action::boost("Syrup", Stat::Fp, 3);

        let outcome = strike(&drain, &mut lineup, &[0], None, false);

        assert_eq!(outcome.effects[0].outcome, TargetOutcome::Unaffected);
    }

    #[test]
    fn test_area_label() {
        let mut lineup = vec![
            player(1),
            enemy(5, 0, false, false),
            enemy(5, 0, false, false),
        ];
        let fire =
            Action::attack("Fire Flower", ActionType::Magic, 3, 1).with_target(TargetMode::All);

        let outcome = strike(&fire, &mut lineup, &[1, 2], Some(0), false);

        assert_eq!(outcome.target_label, "all enemies");
        assert_eq!(lineup[1].hp(), 1);
        assert_eq!(lineup[2].hp(), 1);
    }

    #[test]
    fn test_fp_drain_stops_at_zero() {
        let mut lineup = vec![enemy(5, 0, false, false), player(0)];
        lineup[0].current.pow = 3;
        lineup[1].current.fp = Some(2);
        let mut drain = Action::attack("Drain", ActionType::Magic, 1, 1);
        drain.stat = Stat::Fp;

        let outcome = strike(&drain, &mut lineup, &[1], Some(0), false);

        assert_eq!(lineup[1].stat(Stat::Fp), Some(0));
        assert_eq!(
            outcome.effects[0].outcome,
            TargetOutcome::Changed {
                magnitude: 4,
                before: 2,
                after: 0
            }
        );
    }

    #[test]
    fn test_huge_authored_values_saturate() {
        let mut lineup = vec![player(1), enemy(5, 0, false, false)];
        let big = Action::attack("Big", ActionType::Magic, 100_000, 100_000);

        let outcome = strike(&big, &mut lineup, &[1], Some(0), false);

        // The hit batch saturates at i32::MAX
        assert_eq!(lineup[1].hp(), 5 - i32::MAX);
        assert_eq!(outcome.lines, vec!["-100001HP x100000".to_string()]);

        let mut feast = Action::boost("Feast", Stat::Pow, i32::MAX);
        feast.hits = i32::MAX;
        strike(&feast, &mut lineup, &[0], None, false);
        assert_eq!(lineup[0].current.pow, i32::MAX);
    }
}
