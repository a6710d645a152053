//! Random sticker draws for albums, the battle spinner and block bonuses

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::actions::MoveCatalog;
use crate::combat::Combatant;
use crate::core::types::{MoveId, Rarity};

/// Weighted rarity draw; all-zero odds fall back to Normal
pub fn draw_rarity<R: Rng + ?Sized>(odds: &[u32; 3], rng: &mut R) -> Rarity {
    match WeightedIndex::new(odds) {
        Ok(dist) => Rarity::ALL[dist.sample(rng)],
        Err(_) => Rarity::Normal,
    }
}

/// A rarity by `odds`, then a uniform sticker of that rarity
pub fn random_sticker<R: Rng + ?Sized>(
    catalog: &MoveCatalog,
    odds: &[u32; 3],
    rng: &mut R,
) -> Option<MoveId> {
    let rarity = draw_rarity(odds, rng);
    catalog.pool(rarity).choose(rng).copied()
}

/// Draw up to `draws` stickers into `holder`, stopping once it has no room
pub fn grant_stickers<R: Rng + ?Sized>(
    holder: &mut Combatant,
    catalog: &MoveCatalog,
    odds: &[u32; 3],
    draws: u32,
    rng: &mut R,
) -> Vec<MoveId> {
    let mut granted = Vec::new();
    for _ in 0..draws {
        let Some(id) = random_sticker(catalog, odds, rng) else {
            continue;
        };
        if !holder.add_sticker(id) {
            break;
        }
        granted.push(id);
    }
    granted
}
