//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authoring id of an enemy: its index in the battle roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(pub usize);

/// Index of a move in a combatant's move pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MoveId(pub usize);

/// Identifier of the chat group hosting a battle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub String);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A battle stat that actions can change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stat {
    #[serde(rename = "HP")]
    Hp,
    #[serde(rename = "FP")]
    Fp,
    #[serde(rename = "POW")]
    Pow,
    #[serde(rename = "DEF")]
    Def,
    #[serde(rename = "SPEED")]
    Speed,
    #[serde(rename = "STACHE")]
    Stache,
}

impl Stat {
    pub const ALL: [Stat; 6] = [
        Stat::Hp,
        Stat::Fp,
        Stat::Pow,
        Stat::Def,
        Stat::Speed,
        Stat::Stache,
    ];

    /// Positional code used by inline scripted moves
    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn label(self) -> &'static str {
        match self {
            Stat::Hp => "HP",
            Stat::Fp => "FP",
            Stat::Pow => "POW",
            Stat::Def => "DEF",
            Stat::Speed => "SPEED",
            Stat::Stache => "STACHE",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stat: {0}")]
pub struct UnknownStat(pub String);

impl FromStr for Stat {
    type Err = UnknownStat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|stat| stat.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStat(s.to_string()))
    }
}

/// How an action travels to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Ground,
    Aerial,
    Magic,
}

impl ActionType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ActionType::Ground),
            1 => Some(ActionType::Aerial),
            2 => Some(ActionType::Magic),
            _ => None,
        }
    }
}

/// Which of the eligible combatants an action lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetMode {
    One,
    All,
    Random,
}

impl TargetMode {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TargetMode::One),
            1 => Some(TargetMode::All),
            2 => Some(TargetMode::Random),
            _ => None,
        }
    }
}

/// Sticker rarity tier, drives album and spinner odds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Normal,
    Shiny,
    Flashy,
}

impl Rarity {
    pub const ALL: [Rarity; 3] = [Rarity::Normal, Rarity::Shiny, Rarity::Flashy];
}
