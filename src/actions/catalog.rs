//! Built-in moves and the player's sticker pool

use crate::actions::Action;
use crate::core::types::{ActionType, MoveId, Rarity, Stat, TargetMode};

/// Catalog of the moves a player can hold as stickers
#[derive(Debug, Clone, Default)]
pub struct MoveCatalog {
    moves: Vec<Action>,
}

impl MoveCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two basic moves every player can always choose
    pub fn basic_moves() -> [Action; 2] {
        [
            Action::attack("Jump", ActionType::Aerial, 1, 1),
            Action::attack("Hammer", ActionType::Ground, 1, 1),
        ]
    }

    /// Load the default sticker pool (hardcoded for now)
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        // Normal
        catalog.add(
            Action::attack("Jump Sticker", ActionType::Aerial, 3, 1)
                .with_rarity(Rarity::Normal)
                .with_icon("👟")
                .with_info("A sturdy stomp on one enemy."),
        );
        catalog.add(
            Action::attack("Hammer Sticker", ActionType::Ground, 3, 1)
                .with_rarity(Rarity::Normal)
                .with_icon("🔨")
                .with_info("A solid whack on one enemy."),
        );
        catalog.add(
            Action::boost("Mushroom", Stat::Hp, 5)
                .with_rarity(Rarity::Normal)
                .with_icon("🍄")
                .with_info("Restores 5 HP."),
        );

        // Shiny
        catalog.add(
            Action::attack("Hopslipper", ActionType::Aerial, 2, 3)
                .with_rarity(Rarity::Shiny)
                .with_icon("🥿")
                .with_info("Three light hops on one enemy."),
        );
        catalog.add(
            Action::attack("Fire Flower", ActionType::Magic, 3, 1)
                .with_target(TargetMode::All)
                .with_rarity(Rarity::Shiny)
                .with_icon("🌺")
                .with_info("Burns every enemy."),
        );

        // Flashy
        catalog.add(
            Action::attack("Ice Flower", ActionType::Magic, 6, 1)
                .with_target(TargetMode::All)
                .with_rarity(Rarity::Flashy)
                .with_icon("❄")
                .with_info("Freezes every enemy."),
        );
        catalog.add(
            Action::boost("Super Mushroom", Stat::Hp, 15)
                .with_rarity(Rarity::Flashy)
                .with_icon("🌟")
                .with_info("Restores 15 HP."),
        );

        catalog
    }

    /// Default pool followed by a group's custom moves
    pub fn with_custom(custom: &[Action]) -> Self {
        let mut catalog = Self::with_defaults();
        for action in custom {
            catalog.add(action.clone());
        }
        catalog
    }

    pub fn add(&mut self, action: Action) {
        self.moves.push(action);
    }

    pub fn get(&self, id: MoveId) -> Option<&Action> {
        self.moves.get(id.0)
    }

    pub fn all(&self) -> &[Action] {
        &self.moves
    }

    /// Ids of the non-scripted moves of one rarity tier
    pub fn pool(&self, rarity: Rarity) -> Vec<MoveId> {
        self.moves
            .iter()
            .enumerate()
            .filter(|(_, action)| !action.scripted && action.tier() == rarity)
            .map(|(i, _)| MoveId(i))
            .collect()
    }
}
