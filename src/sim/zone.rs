//! Decorative zone critters
//!
//! Each themed module may host critters that live inside its bounds: flocking
//! boids (Forest, Ocean), drifting asteroids and ships (Space), and slime
//! molds running a tiny Game of Life (Forest). Positions are in cell units;
//! motion constants are per nominal 60 Hz frame and scaled by elapsed time.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;

use super::movement::Direction;
use super::vector::{Steer, random_unit};
use super::world::{NEIGHBORS, Theme, Tile, World};
use crate::consts::*;
use crate::{wrap_cell, wrapped_delta};

/// Nominal frame length the motion constants are tuned for
pub const FRAME_MS: f32 = 1000.0 / 60.0;

// Boids
const BOID_MAX_SPEED: f32 = 0.055;
const BOID_MAX_FORCE: f32 = 0.003;
const BOID_PERCEPTION: f32 = 1.125;
const BOID_SEPARATION: f32 = 0.45;
const BOID_BREACH_CHANCE: f64 = 0.02;

// Asteroids and ships
const ASTEROID_WALL_NUDGE: f32 = 0.001_25;
const ASTEROID_HIT_RADIUS: f32 = 0.3;
const SHIP_SPEED: f32 = 0.006_25;

// Slime molds
const SLIME_DIM: usize = 4;
const SLIME_LIFE_STEP_MS: f32 = 300.0;

/// A module's extent in cell units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl ModuleBounds {
    pub fn of(mx: i32, my: i32) -> Self {
        let min = Vec2::new((mx * PATTERN_COLS) as f32, (my * PATTERN_ROWS) as f32);
        Self {
            min,
            max: min + Vec2::new(PATTERN_COLS as f32, PATTERN_ROWS as f32),
        }
    }

    /// Wrap a position that left the module through one edge to the other
    pub fn wrap(&self, mut p: Vec2, margin: f32) -> Vec2 {
        let size = self.max - self.min;
        if p.x < self.min.x - margin {
            p.x += size.x + 2.0 * margin;
        } else if p.x > self.max.x + margin {
            p.x -= size.x + 2.0 * margin;
        }
        if p.y < self.min.y - margin {
            p.y += size.y + 2.0 * margin;
        } else if p.y > self.max.y + margin {
            p.y -= size.y + 2.0 * margin;
        }
        p
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Boid {
    pub pos: Vec2,
    pub vel: Vec2,
    pub bounds: ModuleBounds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asteroid {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub spin: f32,
    pub radius: f32,
    pub sides: u8,
    pub bounds: ModuleBounds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ship {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub spin: f32,
    pub bounds: ModuleBounds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlimeMold {
    pub cell: (i32, i32),
    pub cells: [bool; SLIME_DIM * SLIME_DIM],
    pub life_timer_ms: f32,
    pub move_timer_ms: f32,
    pub pulse: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZoneEntity {
    Boid(Boid),
    Asteroid(Asteroid),
    Ship(Ship),
    Slime(SlimeMold),
}

/// What the critters need to know about the rest of the world
#[derive(Debug, Clone, Copy)]
pub struct ZoneContext<'a> {
    /// Player center
    pub player: Vec2,
    /// Ghost centers
    pub ghosts: &'a [Vec2],
    pub now_ms: f64,
}

/// Results of a critter update the game must react to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneOutcome {
    /// Positions of asteroids the player smashed
    pub asteroids_smashed: Vec<Vec2>,
    pub walls_breached: u32,
}

/// Shortest wrapped vector from `from` to `to`
#[inline]
fn toward(from: Vec2, to: Vec2) -> Vec2 {
    Vec2::new(
        wrapped_delta(from.x, to.x, WORLD_WIDTH as f32),
        wrapped_delta(from.y, to.y, WORLD_HEIGHT as f32),
    )
}

#[inline]
fn cell_of(p: Vec2) -> (i32, i32) {
    wrap_cell(p.x.floor() as i32, p.y.floor() as i32)
}

fn random_open_point<R: Rng>(world: &World, bounds: &ModuleBounds, rng: &mut R) -> Vec2 {
    for _ in 0..20 {
        let p = Vec2::new(
            rng.random_range(bounds.min.x..bounds.max.x),
            rng.random_range(bounds.min.y..bounds.max.y),
        );
        let (gx, gy) = cell_of(p);
        if world.tile(gx, gy).is_open() {
            return Vec2::new(gx as f32 + 0.5, gy as f32 + 0.5);
        }
    }
    (bounds.min + bounds.max) * 0.5
}

/// Populate every themed module with its critters
pub fn spawn_zone_entities<R: Rng>(world: &World, rng: &mut R) -> Vec<ZoneEntity> {
    let mut entities = Vec::new();
    for my in 0..WORLD_MODULE_DIM {
        for mx in 0..WORLD_MODULE_DIM {
            let bounds = ModuleBounds::of(mx, my);
            match Theme::for_module(mx, my) {
                Theme::Forest => {
                    for _ in 0..5 {
                        entities.push(ZoneEntity::Boid(Boid::new(world, bounds, rng)));
                    }
                    if let Some(slime) = SlimeMold::spawn(world, mx, my, rng) {
                        entities.push(ZoneEntity::Slime(slime));
                    }
                }
                Theme::Ocean => {
                    for _ in 0..6 {
                        entities.push(ZoneEntity::Boid(Boid::new(world, bounds, rng)));
                    }
                }
                Theme::Space => {
                    for _ in 0..8 {
                        entities.push(ZoneEntity::Asteroid(Asteroid::new(world, bounds, rng)));
                    }
                    for _ in 0..2 {
                        entities.push(ZoneEntity::Ship(Ship::new(world, bounds, rng)));
                    }
                }
                Theme::Classic | Theme::Desert => {}
            }
        }
    }
    log::debug!("Spawned {} zone critters", entities.len());
    entities
}

/// Advance every critter by `dt_ms`
pub fn update_zone_entities<R: Rng>(
    entities: &mut Vec<ZoneEntity>,
    world: &mut World,
    ctx: &ZoneContext<'_>,
    dt_ms: f32,
    rng: &mut R,
) -> ZoneOutcome {
    let frames = dt_ms / FRAME_MS;
    let mut outcome = ZoneOutcome::default();

    // Flocking reads every other boid, so snapshot them first
    let flock: Vec<(Vec2, Vec2, ModuleBounds)> = entities
        .iter()
        .filter_map(|e| match e {
            ZoneEntity::Boid(b) => Some((b.pos, b.vel, b.bounds)),
            _ => None,
        })
        .collect();

    entities.retain_mut(|entity| match entity {
        ZoneEntity::Boid(boid) => {
            boid.flock(&flock, ctx, frames);
            if boid.avoid_walls(world, ctx.now_ms, rng) {
                outcome.walls_breached += 1;
            }
            true
        }
        ZoneEntity::Asteroid(asteroid) => {
            asteroid.update(world, frames);
            if toward(asteroid.pos, ctx.player).length() < asteroid.radius + ASTEROID_HIT_RADIUS {
                outcome.asteroids_smashed.push(asteroid.pos);
                false
            } else {
                true
            }
        }
        ZoneEntity::Ship(ship) => {
            ship.update(frames);
            true
        }
        ZoneEntity::Slime(slime) => {
            slime.update(world, dt_ms, rng);
            true
        }
    });

    outcome
}

impl Boid {
    fn new<R: Rng>(world: &World, bounds: ModuleBounds, rng: &mut R) -> Self {
        Self {
            pos: random_open_point(world, &bounds, rng),
            vel: random_unit(rng) * BOID_MAX_SPEED * rng.random_range(0.5..1.0),
            bounds,
        }
    }

    fn steer_toward(&self, desired: Vec2, max_force: f32) -> Vec2 {
        (desired.with_mag(BOID_MAX_SPEED) - self.vel).limit(max_force)
    }

    fn flock(&mut self, flock: &[(Vec2, Vec2, ModuleBounds)], ctx: &ZoneContext<'_>, frames: f32) {
        let mut align = Vec2::ZERO;
        let mut center = Vec2::ZERO;
        let mut separate = Vec2::ZERO;
        let mut neighbors = 0;

        for &(pos, vel, bounds) in flock {
            if bounds != self.bounds || pos == self.pos {
                continue;
            }
            let offset = pos - self.pos;
            let d = offset.length();
            if d >= BOID_PERCEPTION || d <= f32::EPSILON {
                continue;
            }
            neighbors += 1;
            align += vel;
            center += pos;
            if d < BOID_SEPARATION {
                separate -= offset / (d * d);
            }
        }

        let mut acc = Vec2::ZERO;
        if neighbors > 0 {
            let n = neighbors as f32;
            acc += self.steer_toward(align / n, BOID_MAX_FORCE);
            acc += self.steer_toward(center / n - self.pos, BOID_MAX_FORCE) * 0.8;
            if separate != Vec2::ZERO {
                acc += self.steer_toward(separate, BOID_MAX_FORCE) * 1.5;
            }
        }

        let from_player = toward(ctx.player, self.pos);
        if from_player.length() < BOID_PERCEPTION * 2.0 {
            acc += self.steer_toward(from_player, BOID_MAX_FORCE * 3.0);
        }
        for &ghost in ctx.ghosts {
            let from_ghost = toward(ghost, self.pos);
            if from_ghost.length() < BOID_PERCEPTION * 1.5 {
                acc += self.steer_toward(from_ghost, BOID_MAX_FORCE * 2.0);
            }
        }

        self.vel = (self.vel + acc * frames).limit(BOID_MAX_SPEED);
        self.pos = self.bounds.wrap(self.pos + self.vel * frames, 0.0);
    }

    /// Push out of walls. A boid with no open neighbor may breach a wall.
    /// Returns true if it breached one.
    fn avoid_walls<R: Rng>(&mut self, world: &mut World, now_ms: f64, rng: &mut R) -> bool {
        let (gx, gy) = cell_of(self.pos);
        if !world.tile(gx, gy).is_solid() {
            return false;
        }

        let open = NEIGHBORS
            .iter()
            .map(|&(dx, dy)| (gx + dx, gy + dy))
            .find(|&(nx, ny)| world.tile(nx, ny).is_open());

        match open {
            Some((nx, ny)) => {
                let target = Vec2::new(nx as f32 + 0.5, ny as f32 + 0.5);
                let push = toward(self.pos, target);
                self.pos = self.bounds.wrap(self.pos + push * 0.1, 0.0);
                self.vel = push.with_mag(BOID_MAX_SPEED * 0.5);
                false
            }
            None => {
                if !rng.random_bool(BOID_BREACH_CHANCE) {
                    return false;
                }
                let &(dx, dy) = &NEIGHBORS[rng.random_range(0..NEIGHBORS.len())];
                let breached = world.breach(gx + dx, gy + dy, now_ms);
                if breached {
                    log::trace!("Boid breached wall at ({}, {})", gx + dx, gy + dy);
                }
                breached
            }
        }
    }
}

impl Asteroid {
    fn new<R: Rng>(world: &World, bounds: ModuleBounds, rng: &mut R) -> Self {
        Self {
            pos: random_open_point(world, &bounds, rng),
            vel: random_unit(rng) * rng.random_range(0.005..0.0175),
            angle: rng.random::<f32>() * std::f32::consts::TAU,
            spin: rng.random_range(-0.02..0.02),
            radius: rng.random_range(0.25..0.5),
            sides: rng.random_range(5..=8),
            bounds,
        }
    }

    fn update(&mut self, world: &World, frames: f32) {
        self.pos += self.vel * frames;
        self.angle += self.spin * frames;

        let (gx, gy) = cell_of(self.pos);
        if world.tile(gx, gy).is_solid() {
            let center = Vec2::new(gx as f32 + 0.5, gy as f32 + 0.5);
            let away = (self.pos - center).normalize_or_zero();
            self.vel += away * ASTEROID_WALL_NUDGE * frames;
        }
        self.pos = self.bounds.wrap(self.pos, self.radius);
    }
}

impl Ship {
    fn new<R: Rng>(world: &World, bounds: ModuleBounds, rng: &mut R) -> Self {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        Self {
            pos: random_open_point(world, &bounds, rng),
            vel: Vec2::new(angle.cos(), angle.sin()) * SHIP_SPEED,
            angle,
            spin: rng.random_range(-0.005..0.005),
            bounds,
        }
    }

    fn update(&mut self, frames: f32) {
        self.pos = self.bounds.wrap(self.pos + self.vel * frames, 0.5);
        self.angle += self.spin * frames;
    }
}

impl SlimeMold {
    /// Try to place a slime mold on empty floor in module (mx, my)
    fn spawn<R: Rng>(world: &World, mx: i32, my: i32, rng: &mut R) -> Option<Self> {
        for _ in 0..10 {
            let gx = mx * PATTERN_COLS + rng.random_range(0..PATTERN_COLS);
            let gy = my * PATTERN_ROWS + rng.random_range(0..PATTERN_ROWS);
            if world.pattern_at(gx, gy) == ' ' && world.tile(gx, gy) == Tile::Path {
                let mut cells = [false; SLIME_DIM * SLIME_DIM];
                for c in cells.iter_mut() {
                    *c = rng.random_bool(0.5);
                }
                return Some(Self {
                    cell: (gx, gy),
                    cells,
                    life_timer_ms: 0.0,
                    move_timer_ms: rng.random_range(3_000.0..7_000.0),
                    pulse: 0.0,
                });
            }
        }
        None
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// One Game of Life generation on a wrapping 4x4 board
    pub fn life_step(&mut self) {
        let dim = SLIME_DIM as i32;
        let mut next = [false; SLIME_DIM * SLIME_DIM];
        for y in 0..dim {
            for x in 0..dim {
                let mut n = 0;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = (x + dx).rem_euclid(dim);
                        let ny = (y + dy).rem_euclid(dim);
                        if self.cells[(ny * dim + nx) as usize] {
                            n += 1;
                        }
                    }
                }
                let idx = (y * dim + x) as usize;
                next[idx] = matches!((self.cells[idx], n), (true, 2) | (true, 3) | (false, 3));
            }
        }
        self.cells = next;
    }

    fn update<R: Rng>(&mut self, world: &World, dt_ms: f32, rng: &mut R) {
        self.pulse += dt_ms * 0.003;

        self.life_timer_ms += dt_ms;
        while self.life_timer_ms >= SLIME_LIFE_STEP_MS {
            self.life_timer_ms -= SLIME_LIFE_STEP_MS;
            self.life_step();
            if self.alive_count() == 0 {
                for c in self.cells.iter_mut() {
                    *c = rng.random_bool(0.5);
                }
            }
        }

        self.move_timer_ms -= dt_ms;
        if self.move_timer_ms <= 0.0 {
            self.move_timer_ms = rng.random_range(3_000.0..7_000.0);
            let mut dirs = Direction::ALL;
            dirs.shuffle(rng);
            if let Some(next) = dirs
                .iter()
                .map(|d| d.step(self.cell))
                .find(|&(x, y)| world.tile(x, y) == Tile::Path)
            {
                self.cell = next;
            }
        }
    }
}
