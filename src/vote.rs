//! Quorum votes among chat participants
//!
//! The engine asks a [`VoteCollector`] for a decision and never waits longer
//! than the configured deadline. Collectors report the winning option and how
//! many participants backed it; the engine applies quorum rules itself where a
//! decision depends on the count (the block vote).

use std::collections::VecDeque;
use std::time::Duration;

use ahash::AHashMap;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep_until, Instant};

/// A question put to the participants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    pub prompt: String,
    pub options: Vec<String>,
}

impl Ballot {
    pub fn new(prompt: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options,
        }
    }
}

/// Winning option of a closed ballot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub choice: usize,
    pub votes: u32,
}

#[derive(Debug, Error)]
pub enum VoteError {
    #[error("vote channel closed")]
    ChannelClosed,

    #[error("ballot '{0}' has no options")]
    EmptyBallot(String),
}

#[async_trait]
pub trait VoteCollector: Send + Sync {
    /// Run one ballot; `None` when nobody voted before `window` elapsed
    async fn collect(
        &self,
        ballot: &Ballot,
        participants: u32,
        window: Duration,
    ) -> Result<Option<VoteOutcome>, VoteError>;
}

/// Share of registered participants needed to settle a vote early
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quorum(pub f64);

impl Quorum {
    pub fn is_met(self, votes: u32, participants: u32) -> bool {
        votes > 0 && f64::from(votes) >= self.0 * f64::from(participants)
    }
}

impl Default for Quorum {
    fn default() -> Self {
        Self(0.75)
    }
}

/// Running count of one ballot
///
/// Each participant holds one vote; voting again moves it. Ties go to the
/// option that reached the tied count first.
#[derive(Debug, Clone)]
pub struct VoteTally {
    ballots: AHashMap<String, usize>,
    counts: Vec<u32>,
    reached_at: Vec<u64>,
    clock: u64,
}

impl VoteTally {
    pub fn new(options: usize) -> Self {
        Self {
            ballots: AHashMap::new(),
            counts: vec![0; options],
            reached_at: vec![0; options],
            clock: 0,
        }
    }

    /// Record a vote; out-of-range options are ignored
    pub fn cast(&mut self, participant: &str, option: usize) -> bool {
        if option >= self.counts.len() {
            return false;
        }
        if let Some(previous) = self.ballots.insert(participant.to_string(), option) {
            if previous == option {
                return true;
            }
            self.counts[previous] -= 1;
            self.touch(previous);
        }
        self.counts[option] += 1;
        self.touch(option);
        true
    }

    fn touch(&mut self, option: usize) {
        self.clock += 1;
        self.reached_at[option] = self.clock;
    }

    pub fn count(&self, option: usize) -> u32 {
        self.counts.get(option).copied().unwrap_or(0)
    }

    /// Plurality winner, `None` when no vote stands
    pub fn leader(&self) -> Option<VoteOutcome> {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .min_by_key(|(i, count)| (std::cmp::Reverse(**count), self.reached_at[*i]))
            .map(|(choice, votes)| VoteOutcome {
                choice,
                votes: *votes,
            })
    }
}

/// A single participant's vote as delivered by the chat layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub participant: String,
    pub option: usize,
}

/// Collects votes pushed through a tokio channel
///
/// Votes still queued when a ballot opens belong to an earlier ballot and are
/// discarded.
pub struct ChannelVoteCollector {
    receiver: Mutex<mpsc::Receiver<Vote>>,
    quorum: Quorum,
}

impl ChannelVoteCollector {
    pub fn new(quorum: Quorum, buffer: usize) -> (Self, mpsc::Sender<Vote>) {
        let (sender, receiver) = mpsc::channel(buffer);
        (
            Self {
                receiver: Mutex::new(receiver),
                quorum,
            },
            sender,
        )
    }
}

#[async_trait]
impl VoteCollector for ChannelVoteCollector {
    async fn collect(
        &self,
        ballot: &Ballot,
        participants: u32,
        window: Duration,
    ) -> Result<Option<VoteOutcome>, VoteError> {
        if ballot.options.is_empty() {
            return Err(VoteError::EmptyBallot(ballot.prompt.clone()));
        }

        let mut receiver = self.receiver.lock().await;
        while receiver.try_recv().is_ok() {}

        let deadline = Instant::now() + window;
        let mut tally = VoteTally::new(ballot.options.len());

        loop {
            tokio::select! {
                _ = sleep_until(deadline) => break,
                vote = receiver.recv() => {
                    let Some(vote) = vote else {
                        return Err(VoteError::ChannelClosed);
                    };
                    if !tally.cast(&vote.participant, vote.option) {
                        continue;
                    }
                    if self.quorum.is_met(tally.count(vote.option), participants) {
                        tracing::debug!(
                            prompt = %ballot.prompt,
                            option = vote.option,
                            "quorum reached"
                        );
                        return Ok(Some(VoteOutcome {
                            choice: vote.option,
                            votes: tally.count(vote.option),
                        }));
                    }
                }
            }
        }

        Ok(tally.leader())
    }
}

/// Replays a fixed list of decisions, one per ballot
///
/// `None` entries and an exhausted script behave like a ballot nobody voted
/// on. Every ballot seen is kept for inspection.
#[derive(Debug, Default)]
pub struct ScriptedVoteCollector {
    choices: Mutex<VecDeque<Option<usize>>>,
    seen: Mutex<Vec<Ballot>>,
}

impl ScriptedVoteCollector {
    pub fn new(choices: impl IntoIterator<Item = Option<usize>>) -> Self {
        Self {
            choices: Mutex::new(choices.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub async fn ballots(&self) -> Vec<Ballot> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl VoteCollector for ScriptedVoteCollector {
    async fn collect(
        &self,
        ballot: &Ballot,
        participants: u32,
        _window: Duration,
    ) -> Result<Option<VoteOutcome>, VoteError> {
        self.seen.lock().await.push(ballot.clone());
        let next = self.choices.lock().await.pop_front().flatten();
        Ok(next
            .filter(|choice| *choice < ballot.options.len())
            .map(|choice| VoteOutcome {
                choice,
                votes: participants.max(1),
            }))
    }
}
