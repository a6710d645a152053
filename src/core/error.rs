use thiserror::Error;

use crate::core::config::ConfigError;
use crate::narration::NarrationError;
use crate::store::StoreError;
use crate::vote::VoteError;

#[derive(Error, Debug)]
pub enum BattleError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Narration error: {0}")]
    Narration(#[from] NarrationError),

    #[error("Vote error: {0}")]
    Vote(#[from] VoteError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Battle slot {0} is empty")]
    EmptySlot(usize),
}

pub type Result<T> = std::result::Result<T, BattleError>;
