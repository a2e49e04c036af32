//! Game state and core simulation types
//!
//! Everything a session mutates lives in `GameState`, owned by a single
//! controller and passed by reference to `tick` and the renderer.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;

use super::camera::Camera;
use super::collectible::{Category, Collectible, Inventory, Rarity, spawn_collectibles};
use super::effects::{EffectKind, EffectRegistry, Modifiers};
use super::fruit::{Fruit, FruitKind};
use super::ghost::Ghost;
use super::movement::{Direction, EntryRules, MoverKind, Mover, can_enter, has_key_for};
use super::particles::{Burst, ParticleSystem};
use super::progression::{Ability, AchievementId, ProgressEvent, Progression, SessionStats};
use super::synergy::{SynergyId, Synergies};
use super::world::{DoorReward, KeyColor, Theme, Tile, World, pattern_char};
use super::zone::{ZoneEntity, spawn_zone_entities};
use crate::consts::*;
use crate::persistence::KeyValueStore;
use crate::wrap_cell;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Death animation running; gameplay frozen
    Dying { elapsed_ms: f32 },
    /// Run ended
    GameOver,
}

/// Runtime knobs the host derives from its settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    pub max_particles: usize,
    pub zone_decorations: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_particles: 256,
            zone_decorations: true,
        }
    }
}

/// Things that happened during a tick, drained by the host for sound/UI
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    NewGame,
    DotEaten,
    PowerPelletEaten,
    PowerEnded,
    GhostEaten,
    PlayerDied { lives_left: u8 },
    GameOver { score: u64 },
    ItemCollected { name: String, rarity: Rarity, category: Category },
    EffectEnded(EffectKind),
    SynergyActivated(SynergyId),
    SynergyEnded(SynergyId),
    ZoneEntered(Theme),
    DoorUnlocked { color: KeyColor, reward: DoorReward },
    LevelUp(u32),
    AbilityUnlocked(Ability),
    AchievementUnlocked(AchievementId),
    FruitSpawned(FruitKind),
    FruitEaten(FruitKind),
    FrenzyStarted,
    FrenzyEnded,
    AsteroidSmashed,
    Teleported,
}

/// The player-controlled entity
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub mover: Mover,
    /// Buffered turn, applied as soon as it is legal
    pub next_dir: Option<Direction>,
    pub lives: u8,
    /// Theme of the module the player is in
    pub theme: Theme,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            mover: Mover::new(PLAYER_START, Direction::Left),
            next_dir: None,
            lives: START_LIVES,
            theme: World::theme_at(PLAYER_START.0, PLAYER_START.1),
        }
    }
}

impl Player {
    /// Centre of the player in cell units
    pub fn center(&self) -> Vec2 {
        self.mover.pos + Vec2::splat(0.5)
    }
}

/// A door opened this session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyUse {
    pub cell: (i32, i32),
    pub color: KeyColor,
    pub reward: DoorReward,
    pub key_consumed: bool,
}

/// Complete game state
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Ambient RNG
    pub rng: Pcg32,
    pub config: SimConfig,
    /// Simulation clock
    pub time_ms: f64,
    pub phase: GamePhase,
    pub world: World,
    pub player: Player,
    /// The four classic ghosts
    pub ghosts: Vec<Ghost>,
    /// Short-lived ghosts from an apple frenzy
    pub frenzy_ghosts: Vec<Ghost>,
    /// Items still lying in the world
    pub collectibles: Vec<Collectible>,
    pub inventory: Inventory,
    pub effects: EffectRegistry,
    pub synergies: Synergies,
    /// Derived from effects, synergies and abilities every tick
    pub modifiers: Modifiers,
    pub progression: Progression,
    pub stats: SessionStats,
    pub fruit: Fruit,
    pub zone_entities: Vec<ZoneEntity>,
    /// Visual particles (not gameplay-affecting)
    pub particles: ParticleSystem,
    pub camera: Camera,
    pub score: u64,
    pub treasure_score: u64,
    pub power: bool,
    pub power_ms: f32,
    /// Door reward: power pellets last longer for the rest of the run
    pub power_upgraded: bool,
    pub key_log: Vec<KeyUse>,
    /// Events since the host last drained them
    pub events: Vec<GameEvent>,
    /// Latest HUD summary line
    pub hud: String,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new game with the given seed, loading progression from `store`
    pub fn new(seed: u64, store: Box<dyn KeyValueStore>, config: SimConfig) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let world = World::build(&mut rng);
        let mut state = Self {
            seed,
            rng,
            config,
            time_ms: 0.0,
            phase: GamePhase::Playing,
            world,
            player: Player::default(),
            ghosts: Ghost::classic_set(),
            frenzy_ghosts: Vec::new(),
            collectibles: Vec::new(),
            inventory: Inventory::default(),
            effects: EffectRegistry::default(),
            synergies: Synergies::default(),
            modifiers: Modifiers::default(),
            progression: Progression::load(store),
            stats: SessionStats::default(),
            fruit: Fruit::default(),
            zone_entities: Vec::new(),
            particles: ParticleSystem::new(config.max_particles),
            camera: Camera::default(),
            score: 0,
            treasure_score: 0,
            power: false,
            power_ms: 0.0,
            power_upgraded: false,
            key_log: Vec::new(),
            events: Vec::new(),
            hud: String::new(),
            next_id: 1,
        };
        state.populate();
        state
    }

    /// Start a new run on a freshly built world. Progression carries over.
    pub fn reset(&mut self) {
        self.world = World::build(&mut self.rng);
        self.time_ms = 0.0;
        self.phase = GamePhase::Playing;
        self.player = Player::default();
        self.ghosts = Ghost::classic_set();
        self.frenzy_ghosts.clear();
        self.inventory.clear();
        self.effects.clear();
        self.synergies.clear();
        self.modifiers = Modifiers::default();
        self.stats = SessionStats::default();
        self.fruit = Fruit::default();
        self.particles.clear();
        self.score = 0;
        self.treasure_score = 0;
        self.power = false;
        self.power_ms = 0.0;
        self.power_upgraded = false;
        self.key_log.clear();
        self.populate();
    }

    /// Start a new run from a different seed
    pub fn restart(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.reset();
    }

    fn populate(&mut self) {
        let luck = self.progression.has_ability(Ability::LegendaryLuck);
        self.collectibles = spawn_collectibles(&self.world, &mut self.rng, luck, &mut self.next_id);
        self.zone_entities = if self.config.zone_decorations {
            spawn_zone_entities(&self.world, &mut self.rng)
        } else {
            Vec::new()
        };
        self.stats.zones_explored.insert(self.player.theme);
        self.particles.set_cap(self.config.max_particles);
        self.events.push(GameEvent::NewGame);
        log::info!(
            "New game (seed {}): {} dots, {} collectibles, {} locked doors, level {}",
            self.seed,
            self.world.dot_count(),
            self.collectibles.len(),
            self.world.locked_door_count(),
            self.progression.level()
        );
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Death animation frame index, if dying
    pub fn death_frame(&self) -> Option<u32> {
        match self.phase {
            GamePhase::Dying { elapsed_ms } => Some((elapsed_ms / DEATH_PHASE_MS) as u32),
            _ => None,
        }
    }

    /// Take every event emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Derived values ===

    /// Rebuild the per-tick modifiers from effects, synergies and abilities
    pub fn recompute_modifiers(&mut self) {
        let mut m = Modifiers::from_effects(&self.effects);
        self.synergies.apply_to(&mut m, self.inventory.len());
        if self.progression.has_ability(Ability::MasterExplorer) {
            m.reveal_map = true;
        }
        self.modifiers = m;
    }

    /// Power pellet duration with abilities and upgrades applied
    pub fn power_duration_ms(&self) -> f32 {
        let mut duration = POWER_DURATION_MS;
        if self.progression.has_ability(Ability::LongerPower) {
            duration *= LONGER_POWER_FACTOR;
        }
        if self.power_upgraded {
            duration *= LONGER_POWER_FACTOR;
        }
        duration
    }

    /// Step interval for the player
    pub fn player_step_ms(&self) -> f32 {
        PLAYER_STEP_MS / self.modifiers.speed_multiplier
    }

    /// Entry rules for the player moving onto `cell`
    pub fn player_entry_rules(&self, cell: (i32, i32)) -> EntryRules {
        let can_unlock = self
            .world
            .door(cell.0, cell.1)
            .is_some_and(|door| has_key_for(&self.inventory, door, self.modifiers.master_key));
        EntryRules {
            phase_walls: self.modifiers.phase_walls,
            can_unlock,
        }
    }

    /// Pure check: may the player enter `cell`?
    pub fn player_can_enter(&self, cell: (i32, i32)) -> bool {
        let tile = self.world.tile(cell.0, cell.1);
        can_enter(tile, MoverKind::Player, self.player_entry_rules(cell))
    }

    // === Mutations shared by the tick stages ===

    /// Add to the score through the current multiplier
    pub fn add_score(&mut self, base: u64) {
        self.score += base * self.modifiers.score_multiplier.max(1);
    }

    /// Grant experience and announce whatever it unlocks
    pub fn grant_xp(&mut self, amount: u64, source: &str) {
        let mut progress = Vec::new();
        self.progression.add_experience(amount, source, &mut progress);
        self.announce_progress(progress);
    }

    /// Unlock any newly earned achievements
    pub fn check_achievements(&mut self) {
        let mut progress = Vec::new();
        self.progression.check_achievements(&self.stats, &mut progress);
        self.announce_progress(progress);
    }

    fn announce_progress(&mut self, progress: Vec<ProgressEvent>) {
        let center = self.player.center();
        for event in progress {
            match event {
                ProgressEvent::LevelUp { level } => {
                    self.events.push(GameEvent::LevelUp(level));
                    self.particles.burst(
                        center,
                        Burst::celebration(&[0xffd700, 0xffffff, 0xffaa00]),
                        &mut self.rng,
                    );
                }
                ProgressEvent::AbilityUnlocked(ability) => {
                    self.events.push(GameEvent::AbilityUnlocked(ability));
                }
                ProgressEvent::AchievementUnlocked(id) => {
                    self.events.push(GameEvent::AchievementUnlocked(id));
                    self.particles.burst(
                        center,
                        Burst::celebration(&[0x00ffcc, 0xffffff, 0x66ffff]),
                        &mut self.rng,
                    );
                }
            }
        }
    }

    /// Enter power mode for `duration_ms`, frightening every chaser
    pub fn start_power(&mut self, duration_ms: f32) {
        self.power = true;
        self.power_ms = duration_ms;
        for ghost in self.ghosts.iter_mut().chain(self.frenzy_ghosts.iter_mut()) {
            ghost.frighten();
        }
    }

    pub fn end_power(&mut self) {
        self.power = false;
        self.power_ms = 0.0;
        for ghost in self.ghosts.iter_mut().chain(self.frenzy_ghosts.iter_mut()) {
            ghost.calm();
        }
        self.events.push(GameEvent::PowerEnded);
    }

    /// Lose a life and start the death animation
    pub fn kill_player(&mut self) {
        self.player.lives = self.player.lives.saturating_sub(1);
        self.phase = GamePhase::Dying { elapsed_ms: 0.0 };
        self.events.push(GameEvent::PlayerDied {
            lives_left: self.player.lives,
        });
        log::info!("Player caught, {} lives left", self.player.lives);
    }

    /// Death animation finished: respawn or end the run
    pub fn finish_death(&mut self) {
        if self.player.lives == 0 {
            self.phase = GamePhase::GameOver;
            self.events.push(GameEvent::GameOver { score: self.score });
            log::info!(
                "Game over: score {}, treasures {}, level {}",
                self.score,
                self.treasure_score,
                self.progression.level()
            );
            return;
        }

        self.player.mover = Mover::new(PLAYER_START, Direction::Left);
        self.player.next_dir = None;
        self.ghosts = Ghost::classic_set();
        if self.power {
            self.end_power();
        }
        self.phase = GamePhase::Playing;
    }

    /// Spawn the apple frenzy ghosts around the player
    pub fn spawn_frenzy(&mut self) {
        let (px, py) = self.player.mover.cell;
        for i in 0..FRENZY_GHOST_COUNT {
            let base = i as f32 / FRENZY_GHOST_COUNT as f32 * std::f32::consts::TAU;
            let mut placed = None;
            for _ in 0..20 {
                let angle = base + self.rng.random::<f32>() * 0.5;
                let dist = 3.0 + self.rng.random::<f32>() * 5.0;
                let cell = wrap_cell(
                    px + (angle.cos() * dist).floor() as i32,
                    py + (angle.sin() * dist).floor() as i32,
                );
                if self.world.tile(cell.0, cell.1).is_open() {
                    placed = Some(cell);
                    break;
                }
            }
            if let Some(cell) = placed {
                let dir = *Direction::ALL.choose(&mut self.rng).unwrap_or(&Direction::Up);
                let mut ghost = Ghost::frenzy(cell, dir);
                if self.power {
                    ghost.frighten();
                }
                self.frenzy_ghosts.push(ghost);
            }
        }
        self.events.push(GameEvent::FrenzyStarted);
        log::info!("Apple frenzy: {} ghosts", self.frenzy_ghosts.len());
    }

    /// Teleport the player to a random open, ghost-free cell in the 3x3
    /// block of modules around it. Returns false if no cell qualifies.
    pub fn teleport_player(&mut self) -> bool {
        let here = self.player.mover.cell;
        let (mx, my) = World::module_of(here.0, here.1);
        let ghost_cells: Vec<(i32, i32)> = self
            .ghosts
            .iter()
            .chain(self.frenzy_ghosts.iter())
            .map(|g| g.mover.cell)
            .collect();

        let mut candidates = Vec::new();
        for dmy in -1..=1 {
            for dmx in -1..=1 {
                for py in 0..PATTERN_ROWS {
                    for px in 0..PATTERN_COLS {
                        if !matches!(pattern_char(px, py), '.' | 'P' | ' ' | 'O') {
                            continue;
                        }
                        let cell = wrap_cell((mx + dmx) * PATTERN_COLS + px, (my + dmy) * PATTERN_ROWS + py);
                        if cell != here
                            && self.world.tile(cell.0, cell.1).is_open()
                            && !ghost_cells.contains(&cell)
                        {
                            candidates.push(cell);
                        }
                    }
                }
            }
        }

        let Some(&target) = candidates.choose(&mut self.rng) else {
            return false;
        };
        let origin = self.player.center();
        self.player.mover.place(target);
        self.events.push(GameEvent::Teleported);
        let colors = [0x9966ff, 0xcc99ff, 0xffffff];
        self.particles.burst(origin, Burst::sparkle(&colors), &mut self.rng);
        self.particles
            .burst(self.player.center(), Burst::sparkle(&colors), &mut self.rng);
        log::debug!("Teleported {:?} -> {:?}", here, target);
        true
    }

    /// Apply an opened door's reward
    pub fn grant_door_reward(&mut self, cell: (i32, i32), reward: DoorReward) {
        match reward {
            DoorReward::TreasureCache { value } => {
                self.treasure_score += value * self.modifiers.score_multiplier.max(1);
            }
            DoorReward::PowerUpgrade => {
                self.power_upgraded = true;
            }
            DoorReward::ScoreBonus => {
                for dy in -2..=2 {
                    for dx in -2..=2 {
                        let (x, y) = wrap_cell(cell.0 + dx, cell.1 + dy);
                        if self.world.tile(x, y) == Tile::Path && !self.world.is_ghost_house(x, y) {
                            self.world.set_tile(x, y, Tile::Dot);
                        }
                    }
                }
            }
            DoorReward::SecretPassage => {
                self.world.set_tile(cell.0, cell.1, Tile::Teleport);
            }
            DoorReward::LegendaryItem => {
                let id = self.next_entity_id();
                let item = Collectible::of_rarity(id, cell, Rarity::Legendary, &mut self.rng);
                self.collectibles.push(item);
            }
        }
        log::debug!("Door reward at {:?}: {}", cell, reward.description());
    }

    /// Start a timed effect and refresh the modifiers
    pub fn apply_effect(&mut self, kind: EffectKind, duration_ms: f64, source: &str) {
        let duration = if duration_ms > 0.0 {
            duration_ms
        } else {
            DEFAULT_EFFECT_MS
        };
        self.effects.apply(kind, self.time_ms, duration, source);
        self.recompute_modifiers();
    }
}
