//! Ghosts
//!
//! Mode machine: `InHouse -> Chasing <-> Frightened -> Eaten -> InHouse`
//! (or straight back to `Chasing` for a ghost that starts outside the house).
//! Direction choice is greedy on toroidal Manhattan distance and never
//! reverses unless there is no other way. Eaten ghosts instead follow the
//! shortest walkable path to the nearest copy of their home cell, turning
//! back whenever the path says so. Bands of modules only connect through
//! breaches, so "home" is the house of whichever module is reachable first.

use pathfinding::prelude::bfs;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::movement::{Direction, EntryRules, Mover, MoverKind, can_enter};
use super::world::{GHOST_HOUSE_DOOR, GHOST_HOUSE_EXIT, World};
use crate::consts::*;
use crate::{toroidal_manhattan, wrap_cell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GhostMode {
    InHouse,
    Chasing,
    Frightened,
    Eaten,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GhostKind {
    Blinky,
    Pinky,
    Inky,
    Clyde,
    Frenzy,
}

impl GhostKind {
    pub const CLASSIC: [GhostKind; 4] = [GhostKind::Blinky, GhostKind::Pinky, GhostKind::Inky, GhostKind::Clyde];

    pub fn color(&self) -> u32 {
        match self {
            GhostKind::Blinky => 0xff0000,
            GhostKind::Pinky => 0xffb8ff,
            GhostKind::Inky => 0x00ffff,
            GhostKind::Clyde => 0xffb852,
            GhostKind::Frenzy => 0xff4fa3,
        }
    }

    /// Pattern-local start cell
    fn start(&self) -> (i32, i32) {
        match self {
            GhostKind::Blinky => GHOST_HOUSE_EXIT,
            GhostKind::Pinky => (9, 9),
            GhostKind::Inky => (8, 9),
            GhostKind::Clyde => (10, 9),
            GhostKind::Frenzy => GHOST_HOUSE_EXIT,
        }
    }
}

const FRIGHTENED_COLOR: u32 = 0x2121ff;
const EATEN_COLOR: u32 = 0x888888;

/// What a ghost needs to know to pick a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostContext {
    pub player: (i32, i32),
    /// Ghost fear: chasers wander randomly
    pub wander: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ghost {
    pub kind: GhostKind,
    pub mover: Mover,
    pub mode: GhostMode,
    pub step_ms: f32,
    /// Respawn target when eaten
    pub home: (i32, i32),
    /// Home is outside the house, so revival skips `InHouse`
    pub starts_outside: bool,
    house_exit: (i32, i32),
    house_door: (i32, i32),
    /// Remaining lifetime of a frenzy ghost
    pub frenzy_ms: Option<f32>,
}

impl Ghost {
    /// The four classic ghosts in the house of module (0, 0)
    pub fn classic_set() -> Vec<Ghost> {
        GhostKind::CLASSIC
            .iter()
            .enumerate()
            .map(|(i, &kind)| Ghost::classic(kind, GHOST_STEP_MS[i]))
            .collect()
    }

    pub fn classic(kind: GhostKind, step_ms: f32) -> Self {
        let home = kind.start();
        let starts_outside = home == GHOST_HOUSE_EXIT;
        Self {
            kind,
            mover: Mover::new(home, Direction::Left),
            mode: if starts_outside {
                GhostMode::Chasing
            } else {
                GhostMode::InHouse
            },
            step_ms,
            home,
            starts_outside,
            house_exit: GHOST_HOUSE_EXIT,
            house_door: GHOST_HOUSE_DOOR,
            frenzy_ms: None,
        }
    }

    /// A short-lived frenzy ghost, chasing from the moment it appears
    pub fn frenzy(cell: (i32, i32), dir: Direction) -> Self {
        let cell = wrap_cell(cell.0, cell.1);
        Self {
            kind: GhostKind::Frenzy,
            mover: Mover::new(cell, dir),
            mode: GhostMode::Chasing,
            step_ms: FRENZY_GHOST_STEP_MS,
            home: cell,
            starts_outside: true,
            house_exit: cell,
            house_door: cell,
            frenzy_ms: Some(FRENZY_DURATION_MS),
        }
    }

    pub fn is_frenzy(&self) -> bool {
        self.frenzy_ms.is_some()
    }

    pub fn color(&self) -> u32 {
        match self.mode {
            GhostMode::Frightened => FRIGHTENED_COLOR,
            GhostMode::Eaten => EATEN_COLOR,
            _ => self.kind.color(),
        }
    }

    /// Power pellet: chasers turn around and flee
    pub fn frighten(&mut self) {
        if self.mode == GhostMode::Chasing {
            self.mode = GhostMode::Frightened;
            self.mover.dir = self.mover.dir.opposite();
        }
    }

    /// Power ended
    pub fn calm(&mut self) {
        if self.mode == GhostMode::Frightened {
            self.mode = GhostMode::Chasing;
        }
    }

    /// Caught by a powered-up player
    pub fn eat(&mut self) {
        self.mode = GhostMode::Eaten;
    }

    /// Count down a frenzy ghost's life; true once it should vanish
    pub fn frenzy_expired(&mut self, dt_ms: f32) -> bool {
        match self.frenzy_ms.as_mut() {
            Some(ms) => {
                *ms -= dt_ms;
                *ms <= 0.0
            }
            None => false,
        }
    }

    fn arrive(&mut self) {
        let cell = self.mover.cell;
        match self.mode {
            GhostMode::Eaten if module_local(cell) == module_local(self.home) => {
                self.rehome(cell);
                self.mode = if self.starts_outside {
                    GhostMode::Chasing
                } else {
                    GhostMode::InHouse
                };
                log::trace!("{:?} revived as {:?}", self.kind, self.mode);
            }
            GhostMode::InHouse if cell == self.house_exit => {
                self.mode = GhostMode::Chasing;
            }
            _ => {}
        }
    }

    /// Adopt the house copy of whichever module the ghost revived in
    fn rehome(&mut self, cell: (i32, i32)) {
        let (lx, ly) = module_local(cell);
        let origin = (cell.0 - lx, cell.1 - ly);
        let shift = |c: (i32, i32)| {
            let (cx, cy) = module_local(c);
            wrap_cell(origin.0 + cx, origin.1 + cy)
        };
        self.home = cell;
        self.house_exit = shift(self.house_exit);
        self.house_door = shift(self.house_door);
    }

    fn target(&self, ctx: &GhostContext) -> (i32, i32) {
        match self.mode {
            GhostMode::Eaten => self.home,
            GhostMode::InHouse if self.mover.cell == self.house_door => self.house_exit,
            GhostMode::InHouse => self.house_door,
            GhostMode::Chasing | GhostMode::Frightened => ctx.player,
        }
    }

    /// Take a step if the cooldown allows. Returns the direction moved.
    pub fn step<R: Rng>(&mut self, world: &World, ctx: &GhostContext, rng: &mut R) -> Option<Direction> {
        if !self.mover.ready() {
            return None;
        }
        self.arrive();

        let legal: Vec<Direction> = Direction::ALL
            .iter()
            .copied()
            .filter(|&d| {
                let (x, y) = self.mover.ahead(d);
                can_enter(world.tile(x, y), MoverKind::Ghost, EntryRules::default())
            })
            .collect();
        if legal.is_empty() {
            return None;
        }

        let reverse = self.mover.dir.opposite();
        let forward: Vec<Direction> = legal.iter().copied().filter(|&d| d != reverse).collect();
        let candidates = if forward.is_empty() { &legal } else { &forward };

        let random_walk = self.mode == GhostMode::Frightened || (self.mode == GhostMode::Chasing && ctx.wander);
        let homeward = match self.mode {
            GhostMode::Eaten => route(world, self.mover.cell, |cell| {
                module_local(cell) == module_local(self.home)
            }),
            _ => None,
        };
        let dir = if let Some(dir) = homeward {
            dir
        } else if random_walk {
            *candidates.choose(rng)?
        } else {
            greedy(self.mover.cell, candidates, self.target(ctx))?
        };

        self.mover.advance(dir, self.step_ms);
        Some(dir)
    }
}

/// Cell position inside its 19x19 module
fn module_local(cell: (i32, i32)) -> (i32, i32) {
    let (x, y) = wrap_cell(cell.0, cell.1);
    (x % PATTERN_COLS, y % PATTERN_ROWS)
}

/// First step of a shortest ghost-walkable path from `from` to the nearest
/// cell accepted by `goal`.
///
/// Neighbours are expanded in preference order, so equal-length paths
/// resolve the same way every time. `None` when `from` already satisfies
/// `goal` or no such cell is reachable.
pub fn route<G>(world: &World, from: (i32, i32), goal: G) -> Option<Direction>
where
    G: Fn((i32, i32)) -> bool,
{
    let path = bfs(
        &from,
        |&cell| {
            Direction::PREFERENCE
                .iter()
                .map(|d| d.step(cell))
                .filter(|&(x, y)| can_enter(world.tile(x, y), MoverKind::Ghost, EntryRules::default()))
                .collect::<Vec<_>>()
        },
        |&cell| goal(cell),
    )?;
    let next = *path.get(1)?;
    Direction::PREFERENCE.iter().copied().find(|d| d.step(from) == next)
}

/// The candidate closest to `target`; ties go to the preference order
pub fn greedy(from: (i32, i32), candidates: &[Direction], target: (i32, i32)) -> Option<Direction> {
    Direction::PREFERENCE
        .iter()
        .copied()
        .filter(|d| candidates.contains(d))
        .min_by_key(|d| toroidal_manhattan(d.step(from), target))
}
