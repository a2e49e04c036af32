//! Toroidal maze world
//!
//! The world is a fixed 19x19 room pattern tiled across a 7x7 module grid.
//! Coordinates wrap in both axes. After the world is built, only dot eating,
//! door unlocking, door rewards and wall breaches mutate it.

use std::collections::{BTreeMap, HashSet, VecDeque};

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{wrap_cell, wrap_coord};

/// The room pattern tiled across every module.
///
/// `W` wall, `.` dot, `P` power pellet, ` ` empty path, `^` ghost house exit,
/// `H` ghost house floor, `-` ghost house door, `O` module edge passage,
/// `S` decorative block.
pub const PATTERN: [&str; 19] = [
    "WWWWWWWWWWWWWWWWWWW",
    "W........W........W",
    "W.WW.WWW.W.WWW.WW.W",
    "WP.......W.......PW",
    "W.WW.W.WWWWW.W.WW.W",
    "W....W...W...W....W",
    "WWWW.WWW.W.WWW.WWWW",
    "O....W...^...W....O",
    "WWWW.W.WW-WW.W.WWWW",
    "W......WHHHW......W",
    "WWWW.W.SSSSS.W.WWWW",
    "O....W.     .W....O",
    "WWWW.W.WWWWW.W.WWWW",
    "W........W........W",
    "W.WW.WWW.W.WWW.WW.W",
    "WP.W...........W.PW",
    "WW.W.W.WWWWW.W.W.WW",
    "W....W   W   W....W",
    "WWWWWWWWWWWWWWWWWWW",
];

/// Ghost house exit (pattern-local)
pub const GHOST_HOUSE_EXIT: (i32, i32) = (PATTERN_COLS / 2, PATTERN_ROWS / 2 - 2);
/// Ghost house door (pattern-local)
pub const GHOST_HOUSE_DOOR: (i32, i32) = (PATTERN_COLS / 2, PATTERN_ROWS / 2 - 1);

/// Door and key colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl KeyColor {
    pub const ALL: [KeyColor; 4] = [KeyColor::Red, KeyColor::Blue, KeyColor::Green, KeyColor::Yellow];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyColor::Red => "red",
            KeyColor::Blue => "blue",
            KeyColor::Green => "green",
            KeyColor::Yellow => "yellow",
        }
    }

    /// Particle palette for unlock bursts
    pub fn palette(&self) -> [u32; 3] {
        match self {
            KeyColor::Red => [0xff0000, 0xff6666, 0xffcccc],
            KeyColor::Blue => [0x0066ff, 0x6699ff, 0xccddff],
            KeyColor::Green => [0x00cc00, 0x66ff66, 0xccffcc],
            KeyColor::Yellow => [0xffcc00, 0xffdd66, 0xffffcc],
        }
    }
}

/// A single world cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Wall,
    Path,
    Dot,
    PowerPellet,
    Teleport,
    LockedDoor(KeyColor),
    GhostDoor,
    Decorative,
}

impl Tile {
    fn from_pattern(ch: char) -> Self {
        match ch {
            'W' => Tile::Wall,
            '.' => Tile::Dot,
            'P' => Tile::PowerPellet,
            'O' => Tile::Teleport,
            'S' => Tile::Decorative,
            '-' => Tile::GhostDoor,
            _ => Tile::Path,
        }
    }

    /// Walkable floor (no doors of any kind)
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, Tile::Path | Tile::Dot | Tile::PowerPellet | Tile::Teleport)
    }

    /// Solid maze geometry
    #[inline]
    pub fn is_solid(&self) -> bool {
        matches!(self, Tile::Wall | Tile::Decorative)
    }
}

/// Module themes. Cosmetic, except that they decide which zone critters spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Theme {
    Classic,
    Forest,
    Ocean,
    Desert,
    Space,
}

impl Theme {
    pub const ALL: [Theme; 5] = [Theme::Classic, Theme::Forest, Theme::Ocean, Theme::Desert, Theme::Space];

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Classic => "Classic",
            Theme::Forest => "Forest",
            Theme::Ocean => "Ocean",
            Theme::Desert => "Desert",
            Theme::Space => "Space",
        }
    }

    /// Theme of module (mx, my)
    pub fn for_module(mx: i32, my: i32) -> Self {
        let hash = (mx * 7 + my * 13 + mx + my).unsigned_abs() as usize;
        Self::ALL[hash % Self::ALL.len()]
    }
}

/// What lies behind a locked door
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorReward {
    /// Flat treasure bonus
    TreasureCache { value: u64 },
    /// Permanent power pellet duration boost
    PowerUpgrade,
    /// Re-seeds dots around the door
    ScoreBonus,
    /// The door becomes a teleport tile
    SecretPassage,
    /// A legendary item appears at the door
    LegendaryItem,
}

impl DoorReward {
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        const REWARDS: [DoorReward; 5] = [
            DoorReward::TreasureCache { value: 500 },
            DoorReward::PowerUpgrade,
            DoorReward::ScoreBonus,
            DoorReward::SecretPassage,
            DoorReward::LegendaryItem,
        ];
        REWARDS[rng.random_range(0..REWARDS.len())]
    }

    pub fn description(&self) -> &'static str {
        match self {
            DoorReward::TreasureCache { .. } => "Hidden treasure cache!",
            DoorReward::PowerUpgrade => "Permanent power pellet boost!",
            DoorReward::ScoreBonus => "Bonus dots!",
            DoorReward::SecretPassage => "Secret teleportation chamber!",
            DoorReward::LegendaryItem => "Guaranteed legendary item!",
        }
    }
}

/// A locked door and its reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedDoor {
    pub cell: (i32, i32),
    pub color: KeyColor,
    pub reward: DoorReward,
}

/// A wall temporarily opened by a cornered critter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breach {
    pub cell: (i32, i32),
    pub reseal_at_ms: f64,
}

/// How long a breached wall stays open
pub const BREACH_DURATION_MS: f64 = 5_000.0;

/// The tiled world
#[derive(Debug, Clone)]
pub struct World {
    tiles: Vec<Tile>,
    doors: BTreeMap<(i32, i32), LockedDoor>,
    zone_transitions: HashSet<(i32, i32)>,
    breaches: Vec<Breach>,
}

impl World {
    /// Build the world by tiling the pattern. Locked doors use `rng`.
    pub fn build<R: Rng>(rng: &mut R) -> Self {
        let mut world = Self {
            tiles: vec![Tile::Wall; (WORLD_WIDTH * WORLD_HEIGHT) as usize],
            doors: BTreeMap::new(),
            zone_transitions: HashSet::new(),
            breaches: Vec::new(),
        };

        for my in 0..WORLD_MODULE_DIM {
            for mx in 0..WORLD_MODULE_DIM {
                for py in 0..PATTERN_ROWS {
                    for px in 0..PATTERN_COLS {
                        let ch = pattern_char(px, py);
                        let cell = (mx * PATTERN_COLS + px, my * PATTERN_ROWS + py);
                        let mut tile = Tile::from_pattern(ch);

                        // Only plain empty floor may hold a door
                        if ch == ' ' && rng.random_bool(LOCKED_DOOR_CHANCE) {
                            let color = *KeyColor::ALL.choose(rng).unwrap_or(&KeyColor::Red);
                            tile = Tile::LockedDoor(color);
                            world.doors.insert(
                                cell,
                                LockedDoor {
                                    cell,
                                    color,
                                    reward: DoorReward::random(rng),
                                },
                            );
                        }
                        world.set_tile(cell.0, cell.1, tile);
                    }
                }
            }
        }

        world.detect_zone_transitions();
        log::debug!(
            "World built: {} dots, {} locked doors, {} zone transition cells",
            world.dot_count(),
            world.doors.len(),
            world.zone_transitions.len()
        );
        world
    }

    #[inline]
    fn index(gx: i32, gy: i32) -> usize {
        let (x, y) = wrap_cell(gx, gy);
        (y * WORLD_WIDTH + x) as usize
    }

    /// Tile at a (wrapped) cell
    #[inline]
    pub fn tile(&self, gx: i32, gy: i32) -> Tile {
        self.tiles[Self::index(gx, gy)]
    }

    #[inline]
    pub fn set_tile(&mut self, gx: i32, gy: i32, tile: Tile) {
        let idx = Self::index(gx, gy);
        self.tiles[idx] = tile;
    }

    /// Pattern character under a world cell
    #[inline]
    pub fn pattern_at(&self, gx: i32, gy: i32) -> char {
        let (x, y) = wrap_cell(gx, gy);
        pattern_char(x % PATTERN_COLS, y % PATTERN_ROWS)
    }

    /// Whether a cell belongs to a ghost house (floor, door or exit)
    pub fn is_ghost_house(&self, gx: i32, gy: i32) -> bool {
        matches!(self.pattern_at(gx, gy), 'H' | '-' | '^')
    }

    /// Number of cells still holding a dot or power pellet
    pub fn dot_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|t| matches!(t, Tile::Dot | Tile::PowerPellet))
            .count()
    }

    /// Remove a dot or pellet from a cell, returning what was eaten
    pub fn eat_dot(&mut self, gx: i32, gy: i32) -> Option<Tile> {
        let tile = self.tile(gx, gy);
        match tile {
            Tile::Dot | Tile::PowerPellet => {
                self.set_tile(gx, gy, Tile::Path);
                Some(tile)
            }
            _ => None,
        }
    }

    /// Module coordinates of a cell
    #[inline]
    pub fn module_of(gx: i32, gy: i32) -> (i32, i32) {
        let (x, y) = wrap_cell(gx, gy);
        (x / PATTERN_COLS, y / PATTERN_ROWS)
    }

    /// Theme of the module containing a cell
    #[inline]
    pub fn theme_at(gx: i32, gy: i32) -> Theme {
        let (mx, my) = Self::module_of(gx, gy);
        Theme::for_module(mx, my)
    }

    /// Locked door at a cell, if still locked
    pub fn door(&self, gx: i32, gy: i32) -> Option<&LockedDoor> {
        self.doors.get(&wrap_cell(gx, gy))
    }

    pub fn locked_door_count(&self) -> usize {
        self.doors.len()
    }

    /// Place a locked door (used by tests and scripted setups)
    pub fn place_door(&mut self, gx: i32, gy: i32, color: KeyColor, reward: DoorReward) {
        let cell = wrap_cell(gx, gy);
        self.set_tile(cell.0, cell.1, Tile::LockedDoor(color));
        self.doors.insert(cell, LockedDoor { cell, color, reward });
    }

    /// Permanently open a locked door, converting it to path
    pub fn open_door(&mut self, gx: i32, gy: i32) -> Option<LockedDoor> {
        let cell = wrap_cell(gx, gy);
        let door = self.doors.remove(&cell)?;
        self.set_tile(cell.0, cell.1, Tile::Path);
        Some(door)
    }

    /// Whether a path cell borders a path cell of another theme
    pub fn is_zone_transition(&self, gx: i32, gy: i32) -> bool {
        self.zone_transitions.contains(&wrap_cell(gx, gy))
    }

    pub fn zone_transition_count(&self) -> usize {
        self.zone_transitions.len()
    }

    fn detect_zone_transitions(&mut self) {
        self.zone_transitions.clear();
        for gy in 0..WORLD_HEIGHT {
            for gx in 0..WORLD_WIDTH {
                if !self.tile(gx, gy).is_open() {
                    continue;
                }
                let theme = Self::theme_at(gx, gy);
                let borders_other = NEIGHBORS.iter().any(|&(dx, dy)| {
                    let (nx, ny) = (gx + dx, gy + dy);
                    self.tile(nx, ny).is_open() && Self::theme_at(nx, ny) != theme
                });
                if borders_other {
                    self.zone_transitions.insert((gx, gy));
                }
            }
        }
    }

    /// All cells of plain empty floor (no dot, door or house)
    pub fn empty_cells(&self) -> Vec<(i32, i32)> {
        let mut cells = Vec::new();
        for gy in 0..WORLD_HEIGHT {
            for gx in 0..WORLD_WIDTH {
                if self.tile(gx, gy) == Tile::Path && !self.is_ghost_house(gx, gy) {
                    cells.push((gx, gy));
                }
            }
        }
        cells
    }

    // === Wall breaches ===

    /// Open a wall cell for `BREACH_DURATION_MS`. Returns false if the cell is
    /// not a plain wall.
    pub fn breach(&mut self, gx: i32, gy: i32, now_ms: f64) -> bool {
        let cell = wrap_cell(gx, gy);
        if self.tile(cell.0, cell.1) != Tile::Wall {
            return false;
        }
        self.set_tile(cell.0, cell.1, Tile::Path);
        self.breaches.push(Breach {
            cell,
            reseal_at_ms: now_ms + BREACH_DURATION_MS,
        });
        true
    }

    pub fn breaches(&self) -> &[Breach] {
        &self.breaches
    }

    /// Reseal due breaches. A breach stays open while `occupied` reports it
    /// taken, or while resealing it would cut its open neighbors apart.
    pub fn reseal_breaches(&mut self, now_ms: f64, occupied: impl Fn((i32, i32)) -> bool) -> usize {
        let mut resealed = 0;
        let due: Vec<Breach> = self
            .breaches
            .iter()
            .copied()
            .filter(|b| b.reseal_at_ms <= now_ms)
            .collect();

        for breach in due {
            let (gx, gy) = breach.cell;
            if self.tile(gx, gy) != Tile::Path || occupied(breach.cell) {
                continue;
            }
            if self.would_disconnect(gx, gy) {
                log::trace!("Breach at {:?} kept open to preserve connectivity", breach.cell);
                continue;
            }
            self.set_tile(gx, gy, Tile::Wall);
            self.breaches.retain(|b| b.cell != breach.cell);
            resealed += 1;
        }

        // Breaches that were eaten into or converted stop being tracked
        let tiles = &self.tiles;
        self.breaches
            .retain(|b| tiles[Self::index(b.cell.0, b.cell.1)] == Tile::Path);
        resealed
    }

    /// Whether turning (gx, gy) into a wall would split its open neighbors
    /// into separate regions.
    pub fn would_disconnect(&self, gx: i32, gy: i32) -> bool {
        let blocked = wrap_cell(gx, gy);
        let neighbors: Vec<(i32, i32)> = NEIGHBORS
            .iter()
            .map(|&(dx, dy)| wrap_cell(gx + dx, gy + dy))
            .filter(|&(x, y)| self.passable_for_reachability(x, y))
            .collect();

        let Some(&start) = neighbors.first() else {
            return false;
        };

        let mut remaining: HashSet<(i32, i32)> = neighbors[1..].iter().copied().collect();
        if remaining.is_empty() {
            return false;
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(start);
        queue.push_back(start);
        while let Some((x, y)) = queue.pop_front() {
            remaining.remove(&(x, y));
            if remaining.is_empty() {
                return false;
            }
            for &(dx, dy) in &NEIGHBORS {
                let next = wrap_cell(x + dx, y + dy);
                if next == blocked || seen.contains(&next) {
                    continue;
                }
                if self.passable_for_reachability(next.0, next.1) {
                    seen.insert(next);
                    queue.push_back(next);
                }
            }
        }
        true
    }

    fn passable_for_reachability(&self, gx: i32, gy: i32) -> bool {
        let tile = self.tile(gx, gy);
        tile.is_open() || matches!(tile, Tile::LockedDoor(_) | Tile::GhostDoor)
    }
}

/// Four-neighborhood offsets
pub const NEIGHBORS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Pattern character at pattern-local (px, py)
#[inline]
pub fn pattern_char(px: i32, py: i32) -> char {
    let row = PATTERN[wrap_coord(py, PATTERN_ROWS) as usize].as_bytes();
    row.get(wrap_coord(px, PATTERN_COLS) as usize)
        .map(|&b| b as char)
        .unwrap_or('W')
}

/// Count of dot and pellet characters in one copy of the pattern
pub fn pattern_dot_count() -> usize {
    PATTERN
        .iter()
        .flat_map(|row| row.chars())
        .filter(|&c| c == '.' || c == 'P')
        .count()
}
