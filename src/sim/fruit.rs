//! Bonus fruit
//!
//! One fruit at a time appears in the centre corridor of the player's module
//! after enough dots were eaten and the spawn cooldown has elapsed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::world::{Tile, World};
use crate::consts::{PATTERN_COLS, PATTERN_ROWS};

/// Pattern-local fruit cell
pub const FRUIT_CELL: (i32, i32) = (9, 11);
pub const FRUIT_LIFETIME_MS: f32 = 15_000.0;
pub const FRUIT_INTERVAL_MS: f32 = 12_000.0;
pub const FRUIT_INITIAL_COOLDOWN_MS: f32 = 6_000.0;
pub const FRUIT_DOTS_REQUIRED: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FruitKind {
    Cherry,
    Strawberry,
    Orange,
    Banana,
    Apple,
    Grapes,
    Pineapple,
}

/// Extra effect of special fruit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FruitSpecial {
    GhostFrenzy,
    SuperPower,
}

impl FruitKind {
    pub const ALL: [FruitKind; 7] = [
        FruitKind::Cherry,
        FruitKind::Strawberry,
        FruitKind::Orange,
        FruitKind::Banana,
        FruitKind::Apple,
        FruitKind::Grapes,
        FruitKind::Pineapple,
    ];

    pub fn points(&self) -> u64 {
        match self {
            FruitKind::Cherry => 100,
            FruitKind::Strawberry => 300,
            FruitKind::Orange => 500,
            FruitKind::Banana => 800,
            FruitKind::Apple => 1500,
            FruitKind::Grapes => 2000,
            FruitKind::Pineapple => 5000,
        }
    }

    pub fn special(&self) -> Option<FruitSpecial> {
        match self {
            FruitKind::Apple => Some(FruitSpecial::GhostFrenzy),
            FruitKind::Pineapple => Some(FruitSpecial::SuperPower),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FruitKind::Cherry => "cherry",
            FruitKind::Strawberry => "strawberry",
            FruitKind::Orange => "orange",
            FruitKind::Banana => "banana",
            FruitKind::Apple => "apple",
            FruitKind::Grapes => "grapes",
            FruitKind::Pineapple => "pineapple",
        }
    }
}

/// What happened to the fruit this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FruitEvent {
    Spawned(FruitKind),
    Expired,
    Eaten { kind: FruitKind, cell: (i32, i32) },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fruit {
    pub kind: FruitKind,
    pub cell: (i32, i32),
    pub active: bool,
    /// Remaining lifetime while active
    pub timer_ms: f32,
    pub spawn_cooldown_ms: f32,
    pub dots_since_spawn: u32,
}

impl Default for Fruit {
    fn default() -> Self {
        Self {
            kind: FruitKind::Cherry,
            cell: FRUIT_CELL,
            active: false,
            timer_ms: 0.0,
            spawn_cooldown_ms: FRUIT_INITIAL_COOLDOWN_MS,
            dots_since_spawn: 0,
        }
    }
}

impl Fruit {
    pub fn dot_eaten(&mut self) {
        self.dots_since_spawn += 1;
    }

    /// Spawn, expire or hand the fruit to the player
    pub fn update<R: Rng>(&mut self, dt_ms: f32, player_cell: (i32, i32), world: &World, rng: &mut R) -> Option<FruitEvent> {
        if self.active {
            if player_cell == self.cell {
                self.active = false;
                self.spawn_cooldown_ms = FRUIT_INTERVAL_MS;
                return Some(FruitEvent::Eaten {
                    kind: self.kind,
                    cell: self.cell,
                });
            }
            self.timer_ms -= dt_ms;
            if self.timer_ms <= 0.0 {
                self.active = false;
                self.spawn_cooldown_ms = FRUIT_INTERVAL_MS;
                return Some(FruitEvent::Expired);
            }
            return None;
        }

        self.spawn_cooldown_ms -= dt_ms;
        if self.spawn_cooldown_ms > 0.0 || self.dots_since_spawn < FRUIT_DOTS_REQUIRED {
            return None;
        }

        let (mx, my) = World::module_of(player_cell.0, player_cell.1);
        let cell = (mx * PATTERN_COLS + FRUIT_CELL.0, my * PATTERN_ROWS + FRUIT_CELL.1);
        let tile = world.tile(cell.0, cell.1);
        if matches!(tile, Tile::Wall | Tile::GhostDoor | Tile::Decorative | Tile::LockedDoor(_)) {
            return None;
        }

        self.kind = FruitKind::ALL[rng.random_range(0..FruitKind::ALL.len())];
        self.cell = cell;
        self.active = true;
        self.timer_ms = FRUIT_LIFETIME_MS;
        self.dots_since_spawn = 0;
        log::debug!("Fruit spawned: {} at {:?}", self.kind.name(), cell);
        Some(FruitEvent::Spawned(self.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup() -> (World, Pcg32) {
        let mut rng = Pcg32::seed_from_u64(51);
        let mut world = World::build(&mut rng);
        // Fruit cells used below must not hold a random locked door
        world.set_tile(FRUIT_CELL.0, FRUIT_CELL.1, Tile::Path);
        world.set_tile(PATTERN_COLS * 2 + FRUIT_CELL.0, PATTERN_ROWS + FRUIT_CELL.1, Tile::Path);
        (world, rng)
    }

    #[test]
    fn test_needs_dots_and_cooldown() {
        let (world, mut rng) = setup();
        let mut fruit = Fruit::default();
        assert_eq!(fruit.update(10_000.0, (1, 1), &world, &mut rng), None);
        for _ in 0..FRUIT_DOTS_REQUIRED {
            fruit.dot_eaten();
        }
        assert!(matches!(
            fruit.update(16.0, (1, 1), &world, &mut rng),
            Some(FruitEvent::Spawned(_))
        ));
        assert_eq!(fruit.cell, FRUIT_CELL);
        assert_eq!(fruit.dots_since_spawn, 0);
    }

    #[test]
    fn test_spawns_in_players_module() {
        let (world, mut rng) = setup();
        let mut fruit = Fruit {
            spawn_cooldown_ms: 0.0,
            dots_since_spawn: FRUIT_DOTS_REQUIRED,
            ..Default::default()
        };
        let player = (PATTERN_COLS * 2 + 1, PATTERN_ROWS + 1);
        fruit.update(16.0, player, &world, &mut rng);
        assert!(fruit.active);
        assert_eq!(fruit.cell, (PATTERN_COLS * 2 + 9, PATTERN_ROWS + 11));
    }

    #[test]
    fn test_expires_after_lifetime() {
        let (world, mut rng) = setup();
        let mut fruit = Fruit {
            active: true,
            timer_ms: FRUIT_LIFETIME_MS,
            ..Default::default()
        };
        assert_eq!(fruit.update(FRUIT_LIFETIME_MS - 1.0, (1, 1), &world, &mut rng), None);
        assert_eq!(fruit.update(2.0, (1, 1), &world, &mut rng), Some(FruitEvent::Expired));
        assert!(!fruit.active);
        assert_eq!(fruit.spawn_cooldown_ms, FRUIT_INTERVAL_MS);
    }

    #[test]
    fn test_eaten_when_player_on_cell() {
        let (world, mut rng) = setup();
        let mut fruit = Fruit {
            kind: FruitKind::Apple,
            active: true,
            timer_ms: 100.0,
            ..Default::default()
        };
        let event = fruit.update(16.0, FRUIT_CELL, &world, &mut rng);
        assert_eq!(
            event,
            Some(FruitEvent::Eaten {
                kind: FruitKind::Apple,
                cell: FRUIT_CELL
            })
        );
        assert_eq!(FruitKind::Apple.special(), Some(FruitSpecial::GhostFrenzy));
        assert_eq!(FruitKind::Pineapple.points(), 5000);
    }
}
