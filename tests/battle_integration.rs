//! Battle session integration tests

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use party_battle::actions::Action;
use party_battle::combat::{StatBlock, TargetOutcome};
use party_battle::core::config::{ChanceRule, EngineConfig, TurnCounting};
use party_battle::core::error::BattleError;
use party_battle::core::types::{ActionType, GroupId, Stat};
use party_battle::narration::{NarrationEvent, RecordingNarrator};
use party_battle::store::{
    BattleDefinition, BattleStore, EnemyTemplate, JsonDirStore, MemoryStore, PhaseRecord,
    PlayerRecord, RewardConfig, RewardMode, Settings, StoreError,
};
use party_battle::vote::{Ballot, ScriptedVoteCollector, VoteCollector, VoteError, VoteOutcome};
use party_battle::{BattleReport, BattleSession, BattleSource, Outcome};

fn group() -> GroupId {
    GroupId("test-group".into())
}

fn config() -> EngineConfig {
    EngineConfig {
        seed: Some(42),
        ..EngineConfig::default()
    }
}

/// Player without FP and too few coins for albums or the spinner
fn settings(hp: i32, speed: i32, coins: u32) -> Settings {
    Settings {
        coins,
        player: PlayerRecord {
            name: "Mario".into(),
            stats: StatBlock::new(hp, 1, 0, speed, 0),
        },
        ..Settings::default()
    }
}

fn goomba(hp: i32, speed: i32, moves: Vec<Action>) -> EnemyTemplate {
    EnemyTemplate {
        name: "Goomba".into(),
        stats: StatBlock::new(hp, 1, 0, speed, 0),
        moves,
        spiny: false,
        flying: false,
    }
}

fn battle(enemies: Vec<EnemyTemplate>, phases: &[(&str, &str)]) -> BattleDefinition {
    BattleDefinition {
        enemies,
        phases: phases.iter().map(|(t, r)| PhaseRecord::new(t, r)).collect(),
        ..Default::default()
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    votes: Arc<ScriptedVoteCollector>,
    narrator: Arc<RecordingNarrator>,
}

impl Harness {
    async fn new(settings: Settings, votes: Vec<Option<usize>>) -> Self {
        let store = Arc::new(MemoryStore::new());
        store.save_settings(&group(), &settings).await.unwrap();
        Self {
            store,
            votes: Arc::new(ScriptedVoteCollector::new(votes)),
            narrator: Arc::new(RecordingNarrator::new()),
        }
    }

    fn session(&self, config: EngineConfig) -> BattleSession {
        BattleSession::new(
            group(),
            config,
            self.store.clone(),
            self.votes.clone(),
            self.narrator.clone(),
        )
    }

    async fn play(&self, config: EngineConfig, definition: &BattleDefinition) -> BattleReport {
        let document = serde_json::to_string(definition).unwrap();
        self.session(config)
            .run(BattleSource::Document(document))
            .await
            .unwrap()
    }

    async fn saved_settings(&self) -> Settings {
        self.store.load_settings(&group()).await.unwrap().unwrap()
    }

    async fn prompts(&self) -> Vec<String> {
        self.votes
            .ballots()
            .await
            .into_iter()
            .map(|b| b.prompt)
            .collect()
    }
}

#[tokio::test]
async fn test_default_jumps_win_and_grant_rewards() {
    let harness = Harness::new(settings(10, 0, 10), vec![]).await;
    let definition = battle(vec![goomba(5, 0, vec![])], &[("start", "spawn:1,1")]);

    let report = harness.play(config(), &definition).await;

    assert_eq!(report.outcome, Outcome::Win);
    assert_eq!(report.rounds, 3);
    let rewards = report.rewards.unwrap();
    assert_eq!(rewards.stats, vec![Stat::Hp]);
    assert_eq!(rewards.coins, 6);

    let saved = harness.saved_settings().await;
    assert_eq!(saved.player.stats.hp, 15);
    assert_eq!(saved.coins, 16);

    // Jump deals 1 + 1 - 0 = 2 per turn: 5 -> 3 -> 1 -> -1
    let enemy_hp: Vec<i32> = harness
        .narrator
        .events()
        .await
        .iter()
        .filter_map(|e| match e {
            NarrationEvent::Action(outcome) => match outcome.effects[0].outcome {
                TargetOutcome::Changed { after, .. } => Some(after),
                _ => None,
            },
            _ => None,
        })
        .collect();
    assert_eq!(enemy_hp, vec![3, 1, -1]);
}

#[tokio::test]
async fn test_player_knocked_out_loses_without_rewards() {
    let headbonk = Action::attack("Headbonk", ActionType::Aerial, 2, 1);
    let harness = Harness::new(settings(3, 0, 0), vec![]).await;
    let definition = battle(vec![goomba(50, 1, vec![headbonk])], &[("start", "spawn:1,1")]);

    let report = harness.play(config(), &definition).await;

    assert_eq!(report.outcome, Outcome::Lose);
    assert!(report.rewards.is_none());
    assert_eq!(harness.prompts().await, vec!["Block!"]);

    let saved = harness.saved_settings().await;
    assert_eq!(saved.player.stats.hp, 3);
    assert_eq!(saved.coins, 0);
}

#[tokio::test]
async fn test_successful_block_halves_enemy_damage() {
    let headbonk = Action::attack("Headbonk", ActionType::Aerial, 2, 1);
    let harness = Harness::new(settings(10, 0, 0), vec![Some(0)]).await;
    let definition = battle(
        vec![goomba(50, 1, vec![headbonk])],
        &[("start", "spawn:1,1"), ("T2", "lose")],
    );

    let report = harness.play(config(), &definition).await;
    assert_eq!(report.outcome, Outcome::Lose);

    let events = harness.narrator.events().await;
    assert!(events.contains(&NarrationEvent::Blocked));
    let hit = events
        .iter()
        .find_map(|e| match e {
            NarrationEvent::Action(outcome) if outcome.sender.as_deref() == Some("Goomba") => {
                Some(outcome.effects[0].outcome.clone())
            }
            _ => None,
        })
        .unwrap();
    // round((1 + 2 - 0) * 0.5) = round(1.5) = 2
    assert_eq!(
        hit,
        TargetOutcome::Changed {
            magnitude: 2,
            before: 10,
            after: 8
        }
    );
}

#[tokio::test]
async fn test_scripted_win_with_reward_vote() {
    let mut settings = settings(10, 0, 0);
    settings.reward = RewardConfig {
        items: vec![Stat::Pow, Stat::Def],
        set: RewardMode::Choice,
    };
    let harness = Harness::new(settings, vec![None, None, None, None, Some(1)]).await;
    let definition = battle(
        vec![goomba(50, 0, vec![])],
        &[("start", "sys:Here they come! & spawn:1,2"), ("T3", "win")],
    );

    let report = harness.play(config(), &definition).await;

    assert_eq!(report.outcome, Outcome::Win);
    assert_eq!(report.turn, 3);
    assert_eq!(
        harness.prompts().await,
        vec![
            "Mario's turn",
            "Target for Jump",
            "Mario's turn",
            "Target for Jump",
            "Choose your reward",
        ]
    );

    let saved = harness.saved_settings().await;
    assert_eq!(saved.player.stats.def, 5);
    assert_eq!(saved.player.stats.pow, 1);
    assert_eq!(saved.coins, 50);

    let events = harness.narrator.events().await;
    assert!(events.contains(&NarrationEvent::system("Starlow", "Here they come!")));
}

#[tokio::test]
async fn test_battle_without_enemies_is_abandoned() {
    let harness = Harness::new(settings(10, 0, 0), vec![]).await;
    let definition = battle(vec![goomba(5, 0, vec![])], &[]);

    let report = harness.play(config(), &definition).await;

    assert_eq!(report.outcome, Outcome::Abandoned);
    assert!(report.rewards.is_none());
}

#[tokio::test]
async fn test_round_cap_abandons_stalemate() {
    let harness = Harness::new(settings(10, 0, 0), vec![]).await;
    let definition = battle(vec![goomba(10_000, 0, vec![])], &[("start", "spawn:1,1")]);
    let config = EngineConfig {
        max_rounds: 4,
        ..config()
    };

    let report = harness.play(config, &definition).await;
    assert_eq!(report.outcome, Outcome::Abandoned);
    assert_eq!(report.rounds, 5);
}

#[tokio::test]
async fn test_album_purchase_fills_fp_and_saves_coins() {
    let mut settings = settings(10, 0, 120);
    settings.player.stats = settings.player.stats.with_fp(2);
    let harness = Harness::new(settings, vec![Some(1)]).await;
    let definition = battle(vec![], &[]);

    harness.play(config(), &definition).await;

    let ballots = harness.votes.ballots().await;
    assert_eq!(
        ballots[0].options,
        vec![
            "Normal Album (50 coins)",
            "Shiny Album (100 coins)",
            "Don't buy"
        ]
    );

    let events = harness.narrator.events().await;
    let gained = events
        .iter()
        .filter(|e| matches!(e, NarrationEvent::StickerGained { .. }))
        .count();
    assert_eq!(gained, 2);
    assert!(events.iter().any(|e| matches!(
        e,
        NarrationEvent::Purchase {
            cost: 100,
            coins_left: 20,
            ..
        }
    )));
    assert_eq!(harness.saved_settings().await.coins, 20);
}

#[tokio::test]
async fn test_repeat_turns_advance_counter_by_default() {
    // SPEED 100 with the AtMost rule: the player always acts again
    let harness = Harness::new(settings(10, 100, 0), vec![]).await;
    let definition = battle(
        vec![goomba(6, 0, vec![])],
        &[("start", "spawn:1,1"), ("T2", "lose")],
    );
    let mut config = config();
    config.chance.extra_turn = ChanceRule::AtMost;

    let report = harness.play(config.clone(), &definition).await;
    assert_eq!(report.outcome, Outcome::Lose);

    config.turn_counting = TurnCounting::PerActor;
    let report = harness.play(config, &definition).await;
    assert_eq!(report.outcome, Outcome::Win);
}

fn enemy_moves(events: &[NarrationEvent], enemy: &str) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            NarrationEvent::Action(outcome) if outcome.sender.as_deref() == Some(enemy) => {
                Some(outcome.action.clone())
            }
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_enemies_never_pick_scripted_moves() {
    let mut meteor = Action::attack("Meteor", ActionType::Magic, 9, 1);
    meteor.scripted = true;
    let harness = Harness::new(settings(10, 0, 0), vec![]).await;
    let definition = battle(vec![goomba(4, 5, vec![meteor])], &[("start", "spawn:1,1")]);

    let report = harness.play(config(), &definition).await;

    assert_eq!(report.outcome, Outcome::Win);
    assert!(enemy_moves(&harness.narrator.events().await, "Goomba").is_empty());
    // An enemy with nothing to use holds no block vote
    assert!(!harness.prompts().await.contains(&"Block!".to_string()));
    assert_eq!(harness.saved_settings().await.player.stats.hp, 15);
}

#[tokio::test]
async fn test_drained_fp_hides_the_spinner() {
    let mut drain = Action::attack("Drain", ActionType::Magic, 5, 1);
    drain.stat = Stat::Fp;
    let mut settings = settings(10, 0, 20);
    settings.player.stats = settings.player.stats.with_fp(2);
    let harness = Harness::new(settings, vec![]).await;
    let definition = battle(vec![goomba(2, 5, vec![drain])], &[("start", "spawn:1,1")]);

    let report = harness.play(config(), &definition).await;
    assert_eq!(report.outcome, Outcome::Win);

    let events = harness.narrator.events().await;
    assert_eq!(enemy_moves(&events, "Goomba"), vec!["Drain"]);
    let drained = events
        .iter()
        .find_map(|e| match e {
            NarrationEvent::Action(outcome) if outcome.stat == Stat::Fp => {
                Some(outcome.effects[0].outcome.clone())
            }
            _ => None,
        })
        .unwrap();
    // 1 + 5 - 0 = 6 against 2 FP
    assert_eq!(
        drained,
        TargetOutcome::Changed {
            magnitude: 6,
            before: 2,
            after: 0
        }
    );

    let ballots = harness.votes.ballots().await;
    let turn = ballots.iter().find(|b| b.prompt == "Mario's turn").unwrap();
    assert_eq!(turn.options, vec!["Jump", "Hammer"]);
    assert_eq!(harness.saved_settings().await.coins, 20 + 3);
}

#[tokio::test]
async fn test_player_knockout_beats_simultaneous_enemy_wipe() {
    let crush = Action::attack("Crush", ActionType::Ground, 20, 1);
    let harness = Harness::new(settings(10, 0, 0), vec![]).await;
    let definition = battle(
        vec![goomba(5, 0, vec![crush])],
        &[("start", "spawn:1,1"), ("T1", "move:0,0 & move:99,1,2,1,0,1")],
    );

    let report = harness.play(config(), &definition).await;

    assert_eq!(report.outcome, Outcome::Lose);
    assert!(report.rewards.is_none());

    let events = harness.narrator.events().await;
    let defeated: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            NarrationEvent::Defeated { name } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(defeated, vec!["Mario"]);
    assert!(events.contains(&NarrationEvent::BattleEnd {
        outcome: Outcome::Lose
    }));

    let saved = harness.saved_settings().await;
    assert_eq!(saved.player.stats.hp, 10);
    assert_eq!(saved.coins, 0);
}

#[tokio::test]
async fn test_malformed_document_is_a_store_error() {
    let harness = Harness::new(settings(10, 0, 0), vec![]).await;

    let result = harness
        .session(config())
        .run(BattleSource::Document("{ not json".into()))
        .await;

    assert!(matches!(
        result,
        Err(BattleError::Store(StoreError::Corrupted(_)))
    ));
}

#[tokio::test]
async fn test_empty_slot_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let session = BattleSession::new(
        group(),
        config(),
        Arc::new(JsonDirStore::new(dir.path())),
        Arc::new(ScriptedVoteCollector::default()),
        Arc::new(RecordingNarrator::new()),
    );

    let result = session.run(BattleSource::Slot(3)).await;
    assert!(matches!(result, Err(BattleError::EmptySlot(3))));
}

#[tokio::test]
async fn test_saved_slot_is_played_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let definition = battle(vec![goomba(2, 0, vec![])], &[("start", "spawn:1,1")]);
    std::fs::create_dir_all(dir.path().join("test-group")).unwrap();
    std::fs::write(
        dir.path().join("test-group").join("battle_1.json"),
        serde_json::to_string(&definition).unwrap(),
    )
    .unwrap();

    let store = Arc::new(JsonDirStore::new(dir.path()));
    let session = BattleSession::new(
        group(),
        config(),
        store.clone(),
        Arc::new(ScriptedVoteCollector::default()),
        Arc::new(RecordingNarrator::new()),
    );

    let report = session.run(BattleSource::Slot(1)).await.unwrap();
    assert_eq!(report.outcome, Outcome::Win);

    // Fresh groups start from default settings and get them saved
    let saved = store.load_settings(&group()).await.unwrap().unwrap();
    assert_eq!(saved.player.stats.hp, 15);
}

/// Never answers; the engine must fall back to the default option
struct StalledCollector;

#[async_trait]
impl VoteCollector for StalledCollector {
    async fn collect(
        &self,
        _ballot: &Ballot,
        _participants: u32,
        _window: Duration,
    ) -> Result<Option<VoteOutcome>, VoteError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_stalled_votes_fall_back_to_defaults() {
    let store = Arc::new(MemoryStore::new());
    store
        .save_settings(&group(), &settings(10, 0, 0))
        .await
        .unwrap();
    let session = BattleSession::new(
        group(),
        config(),
        store,
        Arc::new(StalledCollector),
        Arc::new(RecordingNarrator::new()),
    );
    let definition = battle(vec![goomba(2, 0, vec![])], &[("start", "spawn:1,1")]);

    let report = session
        .run(BattleSource::Document(serde_json::to_string(&definition).unwrap()))
        .await
        .unwrap();
    assert_eq!(report.outcome, Outcome::Win);
}
