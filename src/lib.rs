//! GridLuck - a wrap-around maze chase game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (world, movement, ghosts, progression)
//! - `persistence`: Best-effort key-value storage for progress and settings
//! - `session`: Frame-driven controller that owns the game state
//! - `audio`: Sound effect catalog and fire-and-forget playback
//! - `hud`: Textual HUD summary

pub mod audio;
pub mod error;
pub mod hud;
pub mod input;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::StorageError;
pub use session::Session;
pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Modules per world side (the world is MODULE_DIM x MODULE_DIM modules)
    pub const WORLD_MODULE_DIM: i32 = 7;
    /// Room pattern dimensions (cells)
    pub const PATTERN_COLS: i32 = 19;
    pub const PATTERN_ROWS: i32 = 19;
    /// World dimensions in cells
    pub const WORLD_WIDTH: i32 = WORLD_MODULE_DIM * PATTERN_COLS;
    pub const WORLD_HEIGHT: i32 = WORLD_MODULE_DIM * PATTERN_ROWS;

    /// Player step interval (ms per cell)
    pub const PLAYER_STEP_MS: f32 = 170.0;
    /// Classic ghost step intervals (ms per cell), staggered per ghost
    pub const GHOST_STEP_MS: [f32; 4] = [175.0, 180.0, 185.0, 190.0];
    /// Frenzy ghosts step faster than the fastest classic ghost
    pub const FRENZY_GHOST_STEP_MS: f32 = GHOST_STEP_MS[0] - 20.0;
    pub const FRENZY_GHOST_COUNT: usize = 8;
    pub const FRENZY_DURATION_MS: f32 = 20_000.0;

    /// Player start cell (module 0)
    pub const PLAYER_START: (i32, i32) = (9, 15);
    pub const START_LIVES: u8 = 3;

    /// Power pellet duration
    pub const POWER_DURATION_MS: f32 = 9_000.0;
    /// `longer_power` ability multiplier (9000 -> 11250)
    pub const LONGER_POWER_FACTOR: f32 = 1.25;
    /// Pineapple grants an extra long power mode
    pub const SUPER_POWER_DURATION_MS: f32 = 15_000.0;

    /// Death animation length and phase length
    pub const DEATH_ANIMATION_MS: f32 = 2_000.0;
    pub const DEATH_PHASE_MS: f32 = 150.0;

    /// Squared cell distance below which a ghost touches the player
    pub const GHOST_COLLISION_DIST_SQ: f32 = 0.35;

    /// Points
    pub const DOT_POINTS: u64 = 10;
    pub const PELLET_POINTS: u64 = 50;
    pub const GHOST_POINTS: u64 = 200;
    pub const ASTEROID_POINTS: u64 = 25;

    /// Experience per source
    pub const DOT_XP: u64 = 1;
    pub const PELLET_XP: u64 = 5;
    pub const GHOST_XP: u64 = 10;
    pub const ZONE_XP: u64 = 3;
    pub const SYNERGY_XP: u64 = 100;

    /// Default duration of an item effect with no explicit duration
    pub const DEFAULT_EFFECT_MS: f64 = 5_000.0;
    /// Ghost immunity granted by `zone_master` on entering a new zone
    pub const ZONE_MASTER_IMMUNITY_MS: f64 = 3_000.0;
    /// `synergy_expert` duration multiplier
    pub const SYNERGY_EXPERT_FACTOR: f64 = 1.5;
    /// Treasure magnet pickup range (toroidal Manhattan cells)
    pub const MAGNET_RANGE: i32 = 2;
    /// Collectible bobbing speed (radians per ms)
    pub const BOB_SPEED: f32 = 0.003;

    /// Autopilot search radius (cells of path)
    pub const AUTOPILOT_SEARCH_DEPTH: u32 = 40;
    /// Autopilot keeps this far (Manhattan) from dangerous ghosts
    pub const AUTOPILOT_GHOST_MARGIN: i32 = 2;

    /// Collectible density: one per this many world cells
    pub const COLLECTIBLE_DENSITY: i32 = 50;
    pub const COLLECTIBLE_SPAWN_ATTEMPTS: u32 = 50;
    /// Minimum spacing between collectibles (cells, per axis)
    pub const COLLECTIBLE_MIN_SPACING: i32 = 3;

    /// Chance for an empty path cell to become a locked door
    pub const LOCKED_DOOR_CHANCE: f64 = 0.02;

    /// Zoom easing
    pub const ZOOM_EASE: f32 = 0.6;
    pub const ZOOM_SNAP: f32 = 0.02;
    /// Normal zoom shows roughly this many cells across the short screen side
    pub const NORMAL_VIEW_CELLS: f32 = 15.0;
    pub const MIN_ZOOMED_OUT_CELL_PX: f32 = 4.0;
    pub const ZOOMED_OUT_FILL: f32 = 0.7;
    pub const ZOOMED_OUT_CAMERA_EASE: f32 = 0.05;

    /// Frames are clamped to this length to avoid huge catch-up steps
    pub const MAX_FRAME_MS: f32 = 100.0;
}

use consts::{WORLD_HEIGHT, WORLD_WIDTH};

/// Wrap a coordinate into [0, max)
#[inline]
pub fn wrap_coord(value: i32, max: i32) -> i32 {
    value.rem_euclid(max)
}

/// Wrap a continuous coordinate into [0, max)
#[inline]
pub fn wrap_coord_f32(value: f32, max: f32) -> f32 {
    let wrapped = value.rem_euclid(max);
    // rem_euclid can round up to `max` for tiny negative inputs
    if wrapped >= max { 0.0 } else { wrapped }
}

/// Wrap a cell into the world
#[inline]
pub fn wrap_cell(gx: i32, gy: i32) -> (i32, i32) {
    (wrap_coord(gx, WORLD_WIDTH), wrap_coord(gy, WORLD_HEIGHT))
}

/// Shortest signed delta from `from` to `to` on a ring of size `size`
#[inline]
pub fn wrapped_delta(from: f32, to: f32, size: f32) -> f32 {
    let mut delta = to - from;
    if delta.abs() > size / 2.0 {
        delta = if delta > 0.0 { delta - size } else { delta + size };
    }
    delta
}

/// Manhattan distance on the torus
#[inline]
pub fn toroidal_manhattan(a: (i32, i32), b: (i32, i32)) -> i32 {
    let dx = (wrap_coord(a.0, WORLD_WIDTH) - wrap_coord(b.0, WORLD_WIDTH)).abs();
    let dy = (wrap_coord(a.1, WORLD_HEIGHT) - wrap_coord(b.1, WORLD_HEIGHT)).abs();
    dx.min(WORLD_WIDTH - dx) + dy.min(WORLD_HEIGHT - dy)
}
