//! Action definitions
//!
//! An action is an immutable description of one move: how much it changes a
//! stat, how often it hits and whom it may land on.

pub mod catalog;

use serde::{Deserialize, Serialize};

use crate::core::types::{ActionType, Rarity, Stat, TargetMode};

pub use catalog::MoveCatalog;

fn one() -> i32 {
    1
}

fn default_target() -> TargetMode {
    TargetMode::One
}

fn default_stat() -> Stat {
    Stat::Hp
}

/// A move that can be applied to one or more combatants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Shown in battle as an option or as the opponent's attack
    #[serde(default)]
    pub name: Option<String>,
    /// Magnitude of the stat change
    pub amount: i32,
    /// Times the action lands
    #[serde(default = "one")]
    pub hits: i32,
    #[serde(rename = "type")]
    pub kind: ActionType,
    pub offense: bool,
    #[serde(default = "default_target")]
    pub target: TargetMode,
    #[serde(default = "default_stat")]
    pub stat: Stat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<Rarity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Only ever performed by a phase script, never picked by an actor
    #[serde(default)]
    pub scripted: bool,
}

impl Action {
    /// Offensive single-target HP action
    pub fn attack(name: &str, kind: ActionType, amount: i32, hits: i32) -> Self {
        Self {
            name: Some(name.to_string()),
            amount,
            hits,
            kind,
            offense: true,
            target: TargetMode::One,
            stat: Stat::Hp,
            cost: None,
            rarity: None,
            icon: None,
            info: None,
            scripted: false,
        }
    }

    /// Non-offensive action raising `stat`
    pub fn boost(name: &str, stat: Stat, amount: i32) -> Self {
        Self {
            name: Some(name.to_string()),
            amount,
            hits: 1,
            kind: ActionType::Magic,
            offense: false,
            target: TargetMode::One,
            stat,
            cost: None,
            rarity: None,
            icon: None,
            info: None,
            scripted: false,
        }
    }

    /// Action built from the positional codes of an inline scripted move
    ///
    /// Fields: amount, hits, type, offense, stat, target. Returns `None` when
    /// a code is out of range.
    pub fn from_codes(codes: &[i64; 6]) -> Option<Self> {
        let [amount, hits, kind, offense, stat, target] = *codes;
        let offense = match offense {
            0 => false,
            1 => true,
            _ => return None,
        };
        Some(Self {
            name: None,
            amount: i32::try_from(amount).ok()?,
            hits: i32::try_from(hits).ok()?,
            kind: ActionType::from_code(kind)?,
            offense,
            target: TargetMode::from_code(target)?,
            stat: Stat::from_code(stat)?,
            cost: None,
            rarity: None,
            icon: None,
            info: None,
            scripted: true,
        })
    }

    pub fn with_target(mut self, target: TargetMode) -> Self {
        self.target = target;
        self
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = Some(rarity);
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn with_info(mut self, info: &str) -> Self {
        self.info = Some(info.to_string());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Scripted move")
    }

    /// Rarity used for album/spinner pools; untagged moves count as Normal
    pub fn tier(&self) -> Rarity {
        self.rarity.unwrap_or_default()
    }
}
