//! Collectibles and the player inventory

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::effects::EffectKind;
use super::world::{KeyColor, World};
use crate::consts::*;
use crate::wrap_cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [Rarity::Common, Rarity::Uncommon, Rarity::Rare, Rarity::Legendary];

    /// Roll a rarity. `legendary_luck` doubles the legendary chance.
    pub fn roll<R: Rng>(rng: &mut R, legendary_luck: bool) -> Self {
        let legendary = if legendary_luck { 0.04 } else { 0.02 };
        let roll: f64 = rng.random();
        if roll < legendary {
            Rarity::Legendary
        } else if roll < 0.08 {
            Rarity::Rare
        } else if roll < 0.25 {
            Rarity::Uncommon
        } else {
            Rarity::Common
        }
    }

    /// Experience granted on pickup
    pub fn xp(&self) -> u64 {
        match self {
            Rarity::Common => 5,
            Rarity::Uncommon => 15,
            Rarity::Rare => 50,
            Rarity::Legendary => 150,
        }
    }

    /// Index into per-rarity counters
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Legendary => "legendary",
        }
    }

    /// Particle palette
    pub fn palette(&self) -> [u32; 3] {
        match self {
            Rarity::Common => [0xffffff, 0xcccccc, 0x999999],
            Rarity::Uncommon => [0x00ff00, 0x66ff66, 0xaaffaa],
            Rarity::Rare => [0x0066ff, 0x3399ff, 0x66ccff],
            Rarity::Legendary => [0xffd700, 0xffaa00, 0xff6600],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Treasure,
    Literature,
    Software,
    Key,
    Tool,
}

/// A timed effect carried by an item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemEffect {
    pub kind: EffectKind,
    pub duration_ms: f64,
}

/// Catalog entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Template {
    pub name: &'static str,
    pub category: Category,
    pub value: u64,
    pub effect: Option<ItemEffect>,
}

const fn item(name: &'static str, category: Category, value: u64) -> Template {
    Template {
        name,
        category,
        value,
        effect: None,
    }
}

const fn item_with(name: &'static str, category: Category, value: u64, kind: EffectKind, duration_ms: f64) -> Template {
    Template {
        name,
        category,
        value,
        effect: Some(ItemEffect { kind, duration_ms }),
    }
}

pub const LEGENDARY_ITEMS: [Template; 3] = [
    item_with("Stellar Core", Category::Treasure, 1000, EffectKind::GhostImmunity, 10_000.0),
    item_with("Lightning Orb", Category::Tool, 800, EffectKind::SpeedBoost, 15_000.0),
    item_with("Crystal Ball", Category::Tool, 1200, EffectKind::RevealMap, 20_000.0),
];

pub const RARE_ITEMS: [Template; 3] = [
    item_with("Gold Bag", Category::Treasure, 500, EffectKind::ScoreMultiplier, 8_000.0),
    item_with("Fire Gem", Category::Treasure, 400, EffectKind::WallPhase, 5_000.0),
    item_with("Evil Eye", Category::Tool, 350, EffectKind::GhostFear, 12_000.0),
];

pub const UNCOMMON_ITEMS: [Template; 4] = [
    item("Crystal", Category::Treasure, 200),
    item("Scroll", Category::Literature, 150),
    item("Key", Category::Key, 100),
    item_with("Compass", Category::Tool, 120, EffectKind::MiniMap, 30_000.0),
];

pub const COMMON_ITEMS: [Template; 4] = [
    item("Book", Category::Literature, 50),
    item("Floppy Disk", Category::Software, 30),
    item("Coin", Category::Treasure, 25),
    item("Gear", Category::Tool, 40),
];

pub fn templates(rarity: Rarity) -> &'static [Template] {
    match rarity {
        Rarity::Common => &COMMON_ITEMS,
        Rarity::Uncommon => &UNCOMMON_ITEMS,
        Rarity::Rare => &RARE_ITEMS,
        Rarity::Legendary => &LEGENDARY_ITEMS,
    }
}

/// An item in the world or in the inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub id: u32,
    pub cell: (i32, i32),
    pub name: String,
    pub rarity: Rarity,
    pub category: Category,
    pub value: u64,
    pub effect: Option<ItemEffect>,
    pub key_color: Option<KeyColor>,
    pub collected: bool,
    /// Bobbing animation phase (radians)
    pub bob_phase: f32,
}

impl Collectible {
    pub fn from_template<R: Rng>(id: u32, cell: (i32, i32), rarity: Rarity, template: &Template, rng: &mut R) -> Self {
        let key_color = (template.category == Category::Key)
            .then(|| *KeyColor::ALL.choose(rng).unwrap_or(&KeyColor::Red));
        let name = match key_color {
            Some(color) => format!("{} {}", color.as_str(), template.name),
            None => template.name.to_string(),
        };
        Self {
            id,
            cell: wrap_cell(cell.0, cell.1),
            name,
            rarity,
            category: template.category,
            value: template.value,
            effect: template.effect,
            key_color,
            collected: false,
            bob_phase: rng.random::<f32>() * std::f32::consts::TAU,
        }
    }

    /// Roll a random collectible for a cell
    pub fn random<R: Rng>(id: u32, cell: (i32, i32), rng: &mut R, legendary_luck: bool) -> Self {
        let rarity = Rarity::roll(rng, legendary_luck);
        Self::of_rarity(id, cell, rarity, rng)
    }

    /// A random collectible of a fixed rarity
    pub fn of_rarity<R: Rng>(id: u32, cell: (i32, i32), rarity: Rarity, rng: &mut R) -> Self {
        let pool = templates(rarity);
        let template = pool[rng.random_range(0..pool.len())];
        Self::from_template(id, cell, rarity, &template, rng)
    }

    /// A key of a fixed color
    pub fn key(id: u32, cell: (i32, i32), color: KeyColor) -> Self {
        Self {
            id,
            cell: wrap_cell(cell.0, cell.1),
            name: format!("{} Key", color.as_str()),
            rarity: Rarity::Uncommon,
            category: Category::Key,
            value: 100,
            effect: None,
            key_color: Some(color),
            collected: false,
            bob_phase: 0.0,
        }
    }

    pub fn is_key(&self) -> bool {
        self.category == Category::Key
    }
}

/// Scatter collectibles over empty path cells.
///
/// Each candidate must keep at least `COLLECTIBLE_MIN_SPACING` cells (both
/// axes, wrapped) from every other collectible.
pub fn spawn_collectibles<R: Rng>(world: &World, rng: &mut R, legendary_luck: bool, next_id: &mut u32) -> Vec<Collectible> {
    let candidates = world.empty_cells();
    let target = (WORLD_WIDTH * WORLD_HEIGHT / COLLECTIBLE_DENSITY) as usize;
    let mut spawned: Vec<Collectible> = Vec::with_capacity(target);
    if candidates.is_empty() {
        return spawned;
    }

    for _ in 0..target {
        for _ in 0..COLLECTIBLE_SPAWN_ATTEMPTS {
            let cell = candidates[rng.random_range(0..candidates.len())];
            let crowded = spawned
                .iter()
                .any(|c| too_close(c.cell, cell, COLLECTIBLE_MIN_SPACING));
            if crowded {
                continue;
            }
            spawned.push(Collectible::random(*next_id, cell, rng, legendary_luck));
            *next_id += 1;
            break;
        }
    }

    log::debug!("Spawned {} collectibles (target {})", spawned.len(), target);
    spawned
}

/// Both wrapped axis distances within `spacing`
fn too_close(a: (i32, i32), b: (i32, i32), spacing: i32) -> bool {
    let dx = (a.0 - b.0).rem_euclid(WORLD_WIDTH);
    let dy = (a.1 - b.1).rem_euclid(WORLD_HEIGHT);
    dx.min(WORLD_WIDTH - dx) <= spacing && dy.min(WORLD_HEIGHT - dy) <= spacing
}

/// Items the player has picked up
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    items: Vec<Collectible>,
}

impl Inventory {
    pub fn push(&mut self, mut item: Collectible) {
        item.collected = true;
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Collectible] {
        &self.items
    }

    pub fn count_category(&self, category: Category) -> usize {
        self.items.iter().filter(|i| i.category == category).count()
    }

    pub fn key_count(&self, color: KeyColor) -> usize {
        self.items
            .iter()
            .filter(|i| i.key_color == Some(color))
            .count()
    }

    pub fn total_keys(&self) -> usize {
        self.items.iter().filter(|i| i.is_key()).count()
    }

    /// Remove and return exactly one key of `color`
    pub fn take_key(&mut self, color: KeyColor) -> Option<Collectible> {
        let idx = self.items.iter().position(|i| i.key_color == Some(color))?;
        Some(self.items.remove(idx))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
