//! Battle execution loop
//!
//! Lobby -> RoundStart -> ActorTurn -> ActionResolution -> DefeatCheck ->
//! ... -> RoundEnd -> RoundStart, until a terminal outcome. The condition
//! engine runs before and after every actor turn, repeats included.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::actions::{Action, MoveCatalog};
use crate::battle::reward::{apply, roster_coins, select_stats, RewardSummary};
use crate::battle::state::{BattleState, Outcome};
use crate::battle::stickers::{grant_stickers, random_sticker};
use crate::combat::{resolve, Combatant};
use crate::core::config::{EngineConfig, TurnCounting};
use crate::core::error::Result;
use crate::core::types::{GroupId, MoveId, Stat, TargetMode};
use crate::narration::{NarrationEvent, NarrationSink, StatusLine};
use crate::phases::ConditionEngine;
use crate::store::{BattleDefinition, BattleStore, RewardMode, Settings};
use crate::vote::{Ballot, Quorum, VoteCollector, VoteOutcome};

/// Reward for the actor that finished off an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartingBonus {
    FullHp,
    Power,
    Defense,
    ExtraTurn,
}

impl PartingBonus {
    pub const ALL: [PartingBonus; 4] = [
        PartingBonus::FullHp,
        PartingBonus::Power,
        PartingBonus::Defense,
        PartingBonus::ExtraTurn,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PartingBonus::FullHp => "HP fully restored",
            PartingBonus::Power => "POW up",
            PartingBonus::Defense => "DEF up",
            PartingBonus::ExtraTurn => "one more turn",
        }
    }
}

/// An action picked for an actor, ready to resolve
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub targets: Vec<usize>,
    pub blocked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerPhase {
    Lobby,
    RoundStart,
    ActorTurn { slot: usize },
    ActionResolution { slot: usize, decision: Decision },
    DefeatCheck { slot: usize, repeat: bool },
    RoundEnd,
    Terminal(Outcome),
}

#[derive(Debug, Clone, Copy)]
enum PlayerOption {
    Basic(usize),
    Stickers,
    Spinner,
}

/// Collaborators and read-only data of one battle
#[derive(Clone, Copy)]
pub struct BattleContext<'a> {
    pub config: &'a EngineConfig,
    pub definition: &'a BattleDefinition,
    pub catalog: &'a MoveCatalog,
    pub votes: &'a dyn VoteCollector,
    pub narrator: &'a dyn NarrationSink,
    pub store: &'a dyn BattleStore,
    pub group: &'a GroupId,
    pub participants: u32,
}

pub struct Scheduler<'a> {
    ctx: BattleContext<'a>,
    state: BattleState,
    settings: Settings,
    phases: ConditionEngine,
    rng: ChaCha8Rng,
    /// Lineup length when the current round started
    round_len: usize,
    rewards: Option<RewardSummary>,
}

impl<'a> Scheduler<'a> {
    pub fn new(ctx: BattleContext<'a>, settings: Settings, rng: ChaCha8Rng) -> Self {
        let player = Combatant::player(
            &settings.player.name,
            settings.player.stats,
            ctx.catalog.all().to_vec(),
        );
        Self {
            state: BattleState::new(player, settings.coins),
            phases: ConditionEngine::compile(&ctx.definition.phases),
            ctx,
            settings,
            rng,
            round_len: 0,
            rewards: None,
        }
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn rewards(&self) -> Option<&RewardSummary> {
        self.rewards.as_ref()
    }

    /// Drive the battle to a terminal outcome
    pub async fn run(&mut self) -> Result<Outcome> {
        let mut phase = SchedulerPhase::Lobby;
        loop {
            phase = match phase {
                SchedulerPhase::Lobby => self.lobby().await?,
                SchedulerPhase::RoundStart => self.start_round().await?,
                SchedulerPhase::ActorTurn { slot } => self.actor_turn(slot).await?,
                SchedulerPhase::ActionResolution { slot, decision } => {
                    self.resolve_decision(slot, decision).await?
                }
                SchedulerPhase::DefeatCheck { slot, repeat } => {
                    self.check_defeats(slot, repeat).await?
                }
                SchedulerPhase::RoundEnd => SchedulerPhase::RoundStart,
                SchedulerPhase::Terminal(outcome) => {
                    self.finish(outcome).await?;
                    return Ok(outcome);
                }
            };
        }
    }

    async fn lobby(&mut self) -> Result<SchedulerPhase> {
        self.album_shop().await?;

        let player = self.state.player().map(|p| p.name.clone()).unwrap_or_default();
        tracing::info!(
            group = %self.ctx.group,
            player = %player,
            roster = self.ctx.definition.enemies.len(),
            phases = self.phases.phases().len(),
            "battle started"
        );
        self.emit(NarrationEvent::BattleStart { player }).await?;

        Ok(match self.run_conditions().await? {
            Some(outcome) => SchedulerPhase::Terminal(outcome),
            None => SchedulerPhase::RoundStart,
        })
    }

    async fn album_shop(&mut self) -> Result<()> {
        let config = self.ctx.config;
        let Some(player) = self.state.player_index() else {
            return Ok(());
        };
        let capacity = self.state.lineup[player].max_fp().unwrap_or(0);
        let coins = self.state.coins;
        let affordable: Vec<_> = config.albums.iter().filter(|a| a.cost <= coins).collect();
        if capacity <= 0 || affordable.is_empty() {
            return Ok(());
        }

        let mut options: Vec<String> = affordable
            .iter()
            .map(|a| format!("{} ({} coins)", a.name, a.cost))
            .collect();
        options.push("Don't buy".to_string());

        let pick = self
            .ask(format!("Buy a sticker album? ({} coins)", coins), options)
            .await?;
        let Some(album) = pick.and_then(|o| affordable.get(o.choice).copied()) else {
            tracing::debug!("no album bought");
            return Ok(());
        };

        self.state.coins -= album.cost;
        let draws = u32::try_from(capacity).unwrap_or(0);
        let granted = grant_stickers(
            &mut self.state.lineup[player],
            self.ctx.catalog,
            &album.odds,
            draws,
            &mut self.rng,
        );
        self.emit(NarrationEvent::Purchase {
            item: album.name.clone(),
            cost: album.cost,
            coins_left: self.state.coins,
        })
        .await?;
        self.announce_stickers(player, &granted).await?;
        self.persist_coins().await
    }

    async fn start_round(&mut self) -> Result<SchedulerPhase> {
        self.state.round += 1;
        if self.state.round > self.ctx.config.max_rounds {
            tracing::warn!(rounds = self.ctx.config.max_rounds, "round cap reached");
            return Ok(SchedulerPhase::Terminal(Outcome::Abandoned));
        }

        self.state.order_by_speed();
        self.state.blocked = None;

        if self.state.enemy_indices().is_empty() {
            let outcome = if self.state.spawned > 0 {
                Outcome::Win
            } else {
                Outcome::Abandoned
            };
            return Ok(SchedulerPhase::Terminal(outcome));
        }

        self.round_len = self.state.lineup.len();
        tracing::debug!(
            round = self.state.round,
            actors = self.round_len,
            player_slot = ?self.state.player_index(),
            "round started"
        );

        let hide_hp = self.settings.hide_hp;
        let lineup = self
            .state
            .lineup
            .iter()
            .map(|c| {
                let shown = c.is_player() || !hide_hp;
                StatusLine {
                    name: c.name.clone(),
                    hp: shown.then(|| c.hp()),
                    max_hp: shown.then(|| c.max_hp()),
                }
            })
            .collect();
        self.emit(NarrationEvent::RoundStatus {
            round: self.state.round,
            turn: self.state.turn.floor(),
            lineup,
        })
        .await?;

        Ok(SchedulerPhase::ActorTurn { slot: 0 })
    }

    async fn actor_turn(&mut self, slot: usize) -> Result<SchedulerPhase> {
        if slot >= self.round_len {
            return Ok(SchedulerPhase::RoundEnd);
        }
        if !self.state.is_active(slot) {
            return Ok(SchedulerPhase::ActorTurn { slot: slot + 1 });
        }

        if let Some(outcome) = self.run_conditions().await? {
            return Ok(SchedulerPhase::Terminal(outcome));
        }
        if !self.state.is_active(slot) {
            return Ok(SchedulerPhase::ActorTurn { slot: slot + 1 });
        }

        let decision = if self.state.lineup[slot].is_player() {
            self.player_decision(slot).await?
        } else {
            self.enemy_decision(slot).await?
        };

        match decision {
            Some(decision) => Ok(SchedulerPhase::ActionResolution { slot, decision }),
            None => self.end_turn(slot, false).await,
        }
    }

    async fn player_decision(&mut self, slot: usize) -> Result<Option<Decision>> {
        let basics = MoveCatalog::basic_moves();
        loop {
            let player = &self.state.lineup[slot];
            let mut labels = Vec::new();
            let mut options = Vec::new();
            for (i, basic) in basics.iter().enumerate() {
                labels.push(basic.display_name().to_string());
                options.push(PlayerOption::Basic(i));
            }
            if player.has_stickers() {
                labels.push("Stickers".to_string());
                options.push(PlayerOption::Stickers);
            }
            let has_fp = player.stat(Stat::Fp).is_some_and(|fp| fp > 0);
            if has_fp && self.state.coins >= self.ctx.config.spinner_cost {
                labels.push("Battle Spinner".to_string());
                options.push(PlayerOption::Spinner);
            }

            let prompt = format!("{}'s turn", player.name);
            let pick = self.ask(prompt, labels).await?.map_or(0, |o| o.choice);

            let action = match options.get(pick).copied().unwrap_or(PlayerOption::Basic(0)) {
                PlayerOption::Basic(i) => basics[i].clone(),
                PlayerOption::Stickers => match self.pick_sticker(slot).await? {
                    Some(action) => action,
                    None => continue,
                },
                PlayerOption::Spinner => {
                    self.spin(slot).await?;
                    continue;
                }
            };

            let targets = self.player_targets(slot, &action).await?;
            return Ok(Some(Decision {
                action,
                targets,
                blocked: false,
            }));
        }
    }

    async fn pick_sticker(&mut self, slot: usize) -> Result<Option<Action>> {
        let held = self.state.lineup[slot].stickers();
        let labels = held
            .iter()
            .map(|(id, count)| {
                let name = self.state.lineup[slot]
                    .moves
                    .get(id.0)
                    .map_or("Unknown sticker", Action::display_name);
                format!("{} x{}", name, count)
            })
            .collect();

        let pick = self
            .ask("Choose a sticker", labels)
            .await?
            .map_or(0, |o| o.choice);
        let Some((id, _)) = held.get(pick).copied() else {
            return Ok(None);
        };

        let player = &mut self.state.lineup[slot];
        let Some(action) = player.moves.get(id.0).cloned() else {
            return Ok(None);
        };
        player.use_sticker(id);
        Ok(Some(action))
    }

    async fn spin(&mut self, slot: usize) -> Result<()> {
        let config = self.ctx.config;
        self.state.coins = self.state.coins.saturating_sub(config.spinner_cost);
        let granted = grant_stickers(
            &mut self.state.lineup[slot],
            self.ctx.catalog,
            &config.sticker_odds,
            config.spinner_draws,
            &mut self.rng,
        );
        self.emit(NarrationEvent::Purchase {
            item: "Battle Spinner".to_string(),
            cost: config.spinner_cost,
            coins_left: self.state.coins,
        })
        .await?;
        self.announce_stickers(slot, &granted).await?;
        self.persist_coins().await
    }

    async fn player_targets(&mut self, slot: usize, action: &Action) -> Result<Vec<usize>> {
        if !action.offense {
            return Ok(vec![slot]);
        }

        let enemies = self.state.enemy_indices();
        let targets = match action.target {
            TargetMode::All => enemies,
            TargetMode::Random => {
                enemies.choose(&mut self.rng).copied().into_iter().collect()
            }
            TargetMode::One if enemies.len() > 1 => {
                let labels = enemies
                    .iter()
                    .enumerate()
                    .map(|(n, i)| format!("{}. {}", n + 1, self.state.lineup[*i].name))
                    .collect();
                let pick = self
                    .ask(format!("Target for {}", action.display_name()), labels)
                    .await?
                    .map_or(0, |o| o.choice);
                enemies.get(pick).copied().into_iter().collect()
            }
            TargetMode::One => enemies.first().copied().into_iter().collect(),
        };
        Ok(targets)
    }

    async fn enemy_decision(&mut self, slot: usize) -> Result<Option<Decision>> {
        // Scripted moves belong to the phase scripts only
        let usable: Vec<&Action> = self.state.lineup[slot]
            .moves
            .iter()
            .filter(|action| !action.scripted)
            .collect();
        let Some(action) = usable.choose(&mut self.rng).map(|action| (*action).clone()) else {
            let enemy = &self.state.lineup[slot].name;
            tracing::debug!(enemy = %enemy, "no usable moves, skipping turn");
            return Ok(None);
        };

        let blocked = self.block_vote().await?;
        let targets = if action.offense {
            self.state.player_index().into_iter().collect()
        } else {
            let enemies = self.state.enemy_indices();
            match action.target {
                TargetMode::All => enemies,
                _ => enemies.choose(&mut self.rng).copied().into_iter().collect(),
            }
        };

        Ok(Some(Decision {
            action,
            targets,
            blocked,
        }))
    }

    /// Shared block vote, held once per round before the first enemy acts
    async fn block_vote(&mut self) -> Result<bool> {
        if let Some(blocked) = self.state.blocked {
            return Ok(blocked);
        }

        let outcome = self.ask("Block!", vec!["Block".to_string()]).await?;
        let quorum = Quorum(self.ctx.config.quorum);
        let blocked = outcome.is_some_and(|o| quorum.is_met(o.votes, self.ctx.participants));
        self.state.blocked = Some(blocked);
        tracing::debug!(blocked, "block vote closed");

        if blocked {
            self.emit(NarrationEvent::Blocked).await?;
            self.block_bonus().await?;
        }
        Ok(blocked)
    }

    async fn block_bonus(&mut self) -> Result<()> {
        let config = self.ctx.config;
        let Some(player) = self.state.player_index() else {
            return Ok(());
        };
        let stache = f64::from(self.state.lineup[player].current.stache);
        let chance = (config.block_bonus_base + config.block_bonus_scale * stache / 100.0) / 100.0;
        let draw: f64 = self.rng.gen();
        if draw > chance {
            return Ok(());
        }

        let Some(id) = random_sticker(self.ctx.catalog, &config.sticker_odds, &mut self.rng) else {
            return Ok(());
        };
        if self.state.lineup[player].add_sticker(id) {
            self.announce_stickers(player, &[id]).await?;
        }
        Ok(())
    }

    async fn resolve_decision(
        &mut self,
        slot: usize,
        decision: Decision,
    ) -> Result<SchedulerPhase> {
        let outcome = resolve(
            &decision.action,
            &mut self.state.lineup,
            &decision.targets,
            Some(slot),
            decision.blocked,
            self.ctx.config.chance.miss,
            &mut self.rng,
        );
        tracing::debug!(
            actor = %self.state.lineup[slot].name,
            action = %outcome.action,
            targets = decision.targets.len(),
            blocked = decision.blocked,
            "action resolved"
        );
        self.emit(NarrationEvent::Action(outcome)).await?;

        let speed = f64::from(self.state.lineup[slot].current.speed) / 100.0;
        let repeat = self.ctx.config.chance.extra_turn.roll(&mut self.rng, speed);
        if repeat {
            let actor = self.state.lineup[slot].name.clone();
            self.emit(NarrationEvent::ExtraTurn { actor }).await?;
        }

        Ok(SchedulerPhase::DefeatCheck { slot, repeat })
    }

    async fn check_defeats(&mut self, slot: usize, repeat: bool) -> Result<SchedulerPhase> {
        let bonus_turn = self.defeat_check(Some(slot)).await?;
        if let Some(outcome) = self.state.outcome() {
            return Ok(SchedulerPhase::Terminal(outcome));
        }
        self.end_turn(slot, repeat || bonus_turn).await
    }

    /// Sweep the lineup for combatants at or below 0 HP
    ///
    /// The player is checked first so a simultaneous wipe is still a loss.
    /// Returns whether a parting bonus granted `actor` another turn.
    async fn defeat_check(&mut self, actor: Option<usize>) -> Result<bool> {
        if let Some(player) = self.state.player().filter(|p| p.is_defeated()) {
            let name = player.name.clone();
            self.state.lost = true;
            self.emit(NarrationEvent::Defeated { name }).await?;
            return Ok(false);
        }

        let fallen: Vec<usize> = self
            .state
            .enemy_indices()
            .into_iter()
            .filter(|i| self.state.lineup[*i].is_defeated())
            .collect();
        if fallen.is_empty() {
            return Ok(false);
        }

        let mut extra_turn = false;
        for index in fallen {
            self.state.mark_defeated(index);
            let name = self.state.lineup[index].name.clone();
            tracing::debug!(enemy = %name, "enemy defeated");
            self.emit(NarrationEvent::Defeated { name }).await?;

            if let Some(actor) = actor.filter(|a| self.state.is_active(*a)) {
                if let Some(bonus) = self.parting_bonus(actor) {
                    extra_turn |= bonus == PartingBonus::ExtraTurn;
                    let actor = self.state.lineup[actor].name.clone();
                    self.emit(NarrationEvent::PartingBonus { actor, bonus }).await?;
                }
            }
        }

        if self.state.active_len() == 1 {
            self.state.won = true;
        }
        Ok(extra_turn)
    }

    fn parting_bonus(&mut self, actor: usize) -> Option<PartingBonus> {
        let config = self.ctx.config;
        let stache = f64::from(self.state.lineup[actor].current.stache) / 100.0;
        if !config.chance.parting_bonus.roll(&mut self.rng, stache) {
            return None;
        }

        let bonus = *PartingBonus::ALL.choose(&mut self.rng)?;
        let combatant = &mut self.state.lineup[actor];
        let increment = config.parting_bonus_increment;
        match bonus {
            PartingBonus::FullHp => combatant.restore_hp(),
            PartingBonus::Power => combatant.current.raise(Stat::Pow, increment),
            PartingBonus::Defense => combatant.current.raise(Stat::Def, increment),
            PartingBonus::ExtraTurn => {}
        }
        Some(bonus)
    }

    async fn end_turn(&mut self, slot: usize, repeat: bool) -> Result<SchedulerPhase> {
        let advance = match self.ctx.config.turn_counting {
            TurnCounting::PerActorTurn => true,
            TurnCounting::PerActor => !repeat,
        };
        if advance {
            self.state.turn.advance(self.state.active_len());
        }

        if let Some(outcome) = self.run_conditions().await? {
            return Ok(SchedulerPhase::Terminal(outcome));
        }

        if repeat && self.state.is_active(slot) {
            Ok(SchedulerPhase::ActorTurn { slot })
        } else {
            Ok(SchedulerPhase::ActorTurn { slot: slot + 1 })
        }
    }

    /// One condition engine pass plus the defeats it caused
    async fn run_conditions(&mut self) -> Result<Option<Outcome>> {
        let events = self.phases.run(
            &mut self.state,
            self.ctx.definition,
            self.ctx.config,
            &mut self.rng,
        );
        for event in events {
            self.emit(event).await?;
        }
        self.defeat_check(None).await?;
        Ok(self.state.outcome())
    }

    async fn finish(&mut self, outcome: Outcome) -> Result<()> {
        tracing::info!(
            group = %self.ctx.group,
            ?outcome,
            rounds = self.state.round,
            turn = self.state.turn.floor(),
            "battle finished"
        );
        self.emit(NarrationEvent::BattleEnd { outcome }).await?;
        self.settings.coins = self.state.coins;

        if outcome == Outcome::Win {
            let vote = self.reward_vote().await?;
            let stats = select_stats(&self.settings.reward, vote, &mut self.rng);
            let coins = roster_coins(self.ctx.definition);
            let summary = apply(
                &mut self.settings,
                &stats,
                self.ctx.config.reward_increment,
                coins,
            );
            self.state.coins = self.settings.coins;
            self.emit(NarrationEvent::Rewards {
                stats: summary.stats.clone(),
                increment: summary.increment,
                coins: summary.coins,
            })
            .await?;
            self.rewards = Some(summary);
        }

        self.ctx
            .store
            .save_settings(self.ctx.group, &self.settings)
            .await?;
        Ok(())
    }

    async fn reward_vote(&mut self) -> Result<Option<usize>> {
        let reward = &self.settings.reward;
        if reward.set != RewardMode::Choice || reward.items.is_empty() {
            return Ok(None);
        }
        let labels = reward
            .items
            .iter()
            .map(|stat| format!("+{} {}", self.ctx.config.reward_increment, stat))
            .collect();
        Ok(self
            .ask("Choose your reward", labels)
            .await?
            .map(|o| o.choice))
    }

    async fn announce_stickers(&self, holder: usize, granted: &[MoveId]) -> Result<()> {
        let holder = &self.state.lineup[holder];
        for id in granted {
            let sticker = holder
                .moves
                .get(id.0)
                .map_or("Unknown sticker", Action::display_name)
                .to_string();
            self.emit(NarrationEvent::StickerGained {
                recipient: holder.name.clone(),
                sticker,
            })
            .await?;
        }
        Ok(())
    }

    async fn persist_coins(&mut self) -> Result<()> {
        self.settings.coins = self.state.coins;
        self.ctx
            .store
            .save_settings(self.ctx.group, &self.settings)
            .await?;
        Ok(())
    }

    /// Put a ballot to the participants under the hard vote deadline
    async fn ask(
        &self,
        prompt: impl Into<String>,
        options: Vec<String>,
    ) -> Result<Option<VoteOutcome>> {
        let ballot = Ballot::new(prompt, options);
        let config = self.ctx.config;
        let collect = self
            .ctx
            .votes
            .collect(&ballot, self.ctx.participants, config.vote_window());

        match tokio::time::timeout(config.vote_deadline(), collect).await {
            Ok(outcome) => Ok(outcome?.filter(|o| o.choice < ballot.options.len())),
            Err(_) => {
                tracing::warn!(prompt = %ballot.prompt, "vote collector missed its deadline");
                Ok(None)
            }
        }
    }

    async fn emit(&self, event: NarrationEvent) -> Result<()> {
        self.ctx.narrator.emit(event).await?;
        Ok(())
    }
}
