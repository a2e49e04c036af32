//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use std::collections::{HashMap, VecDeque};

use glam::Vec2;
use rand::seq::SliceRandom;

use super::collectible::{Category, Collectible};
use super::effects::EffectKind;
use super::fruit::{FruitEvent, FruitSpecial};
use super::ghost::{GhostContext, GhostMode};
use super::movement::{Direction, UnlockResult, try_unlock};
use super::particles::Burst;
use super::progression::Ability;
use super::state::{GameEvent, GamePhase, GameState, KeyUse};
use super::synergy::SynergyId;
use super::world::{Tile, World};
use super::zone::{FRAME_MS, ZoneContext, update_zone_entities};
use crate::consts::*;
use crate::toroidal_manhattan;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired direction; buffered until the turn is legal
    pub direction: Option<Direction>,
    /// Teleport (edge-triggered)
    pub teleport: bool,
    /// Toggle the zoomed-out view (edge-triggered)
    pub toggle_zoom: bool,
    /// Idle/demo mode - autopilot plays the game
    pub idle_mode: bool,
}

/// Advance the game state by `dt_ms`
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f32) {
    if state.phase == GamePhase::GameOver {
        return;
    }

    let dt_ms = dt_ms.clamp(0.0, MAX_FRAME_MS);
    state.time_ms += dt_ms as f64;
    state.stats.elapsed_ms += dt_ms as f64;

    if input.toggle_zoom {
        let zoomed = state.camera.is_zoomed_out();
        state.camera.set_zoomed_out(!zoomed);
    }
    if let Some(dir) = input.direction {
        state.player.next_dir = Some(dir);
    }

    // 1. Zoom
    state.camera.ease_zoom();

    // Effects and synergies run on the sim clock, even while dying
    expire_timed_effects(state);

    // 2. Death animation gates the rest of the gameplay
    if let GamePhase::Dying { elapsed_ms } = state.phase {
        let elapsed_ms = elapsed_ms + dt_ms;
        if elapsed_ms >= DEATH_ANIMATION_MS {
            state.finish_death();
        } else {
            state.phase = GamePhase::Dying { elapsed_ms };
        }
        finish_frame(state, dt_ms);
        return;
    }

    // 3. Player
    state.recompute_modifiers();
    if input.teleport {
        state.teleport_player();
    }
    if input.idle_mode {
        autopilot(state);
    }
    step_player(state, dt_ms);

    // 4. Ghosts
    step_ghosts(state, dt_ms);

    // 5. Frenzy expiry
    expire_frenzy(state, dt_ms);

    // 6. Zone critters and collectibles
    update_zone(state, dt_ms);
    update_collectibles(state, dt_ms);

    // 7. Dots, pellets and zone transitions
    eat_dots(state);
    check_zone_transition(state);

    // 8. Power countdown
    if state.power {
        state.power_ms -= dt_ms;
        if state.power_ms <= 0.0 {
            state.end_power();
        }
    }

    // 9. Ghost collisions
    resolve_ghost_collisions(state);

    // 10. Fruit
    update_fruit(state, dt_ms);

    // 11 and 12
    state.check_achievements();
    finish_frame(state, dt_ms);
}

/// Camera, particles and HUD; run every tick, dying or not
fn finish_frame(state: &mut GameState, dt_ms: f32) {
    state.particles.update(dt_ms / FRAME_MS);
    state.camera.follow(state.player.mover.pos);
    state.hud = crate::hud::summary(state);
}

fn expire_timed_effects(state: &mut GameState) {
    let now = state.time_ms;
    for kind in state.effects.expire(now) {
        log::debug!("{} wore off", kind.label());
        state.events.push(GameEvent::EffectEnded(kind));
    }
    for id in state.synergies.expire(now) {
        log::info!("Synergy ended: {}", id.def().name);
        state.events.push(GameEvent::SynergyEnded(id));
    }
    state.recompute_modifiers();
}

fn step_player(state: &mut GameState, dt_ms: f32) {
    if state.player.mover.ready() {
        if let Some(next) = state.player.next_dir {
            if state.player_can_enter(state.player.mover.ahead(next)) {
                state.player.mover.dir = next;
                state.player.next_dir = None;
            }
        }

        let dir = state.player.mover.dir;
        let target = state.player.mover.ahead(dir);
        if state.player_can_enter(target) && open_door_at(state, target) {
            let interval = state.player_step_ms();
            state.player.mover.advance(dir, interval);
        }
    }
    state.player.mover.interpolate(dt_ms);
}

/// Unlock the door at `cell` if there is one. False if it stays shut.
fn open_door_at(state: &mut GameState, cell: (i32, i32)) -> bool {
    if !matches!(state.world.tile(cell.0, cell.1), Tile::LockedDoor(_)) {
        return true;
    }
    let master_key = state.modifiers.master_key;
    match try_unlock(&mut state.world, cell, &mut state.inventory, master_key) {
        UnlockResult::Unlocked { door, key_used } => {
            state.stats.doors_unlocked += 1;
            state.key_log.push(KeyUse {
                cell,
                color: door.color,
                reward: door.reward,
                key_consumed: key_used.is_some(),
            });
            state.events.push(GameEvent::DoorUnlocked {
                color: door.color,
                reward: door.reward,
            });
            let center = Vec2::new(cell.0 as f32 + 0.5, cell.1 as f32 + 0.5);
            let palette = door.color.palette();
            state.particles.burst(center, Burst::sparkle(&palette), &mut state.rng);
            log::debug!(
                "Unlocked {} door at {:?}{}",
                door.color.as_str(),
                cell,
                if key_used.is_some() { "" } else { " with the master key" }
            );
            state.grant_door_reward(cell, door.reward);
            true
        }
        UnlockResult::NoKey | UnlockResult::NotLocked => false,
    }
}

fn step_ghosts(state: &mut GameState, dt_ms: f32) {
    let ctx = GhostContext {
        player: state.player.mover.cell,
        wander: state.modifiers.ghosts_wander,
    };
    for ghost in state.ghosts.iter_mut().chain(state.frenzy_ghosts.iter_mut()) {
        ghost.step(&state.world, &ctx, &mut state.rng);
        ghost.mover.interpolate(dt_ms);
    }
}

fn expire_frenzy(state: &mut GameState, dt_ms: f32) {
    if state.frenzy_ghosts.is_empty() {
        return;
    }
    state.frenzy_ghosts.retain_mut(|g| !g.frenzy_expired(dt_ms));
    if state.frenzy_ghosts.is_empty() {
        log::debug!("Apple frenzy over");
        state.events.push(GameEvent::FrenzyEnded);
    }
}

fn update_zone(state: &mut GameState, dt_ms: f32) {
    let ghost_centers: Vec<Vec2> = state
        .ghosts
        .iter()
        .chain(state.frenzy_ghosts.iter())
        .map(|g| g.mover.pos + Vec2::splat(0.5))
        .collect();
    let ctx = ZoneContext {
        player: state.player.center(),
        ghosts: &ghost_centers,
        now_ms: state.time_ms,
    };
    let outcome = update_zone_entities(
        &mut state.zone_entities,
        &mut state.world,
        &ctx,
        dt_ms,
        &mut state.rng,
    );

    for pos in outcome.asteroids_smashed {
        state.add_score(ASTEROID_POINTS);
        state.events.push(GameEvent::AsteroidSmashed);
        state
            .particles
            .burst(pos, Burst::sparkle(&[0xaaaaaa, 0xdddddd, 0xffffff]), &mut state.rng);
    }
    if outcome.walls_breached > 0 {
        log::debug!("Boids breached {} walls", outcome.walls_breached);
    }

    if !state.world.breaches().is_empty() {
        let occupied: Vec<(i32, i32)> = std::iter::once(state.player.mover.cell)
            .chain(
                state
                    .ghosts
                    .iter()
                    .chain(state.frenzy_ghosts.iter())
                    .map(|g| g.mover.cell),
            )
            .collect();
        state
            .world
            .reseal_breaches(state.time_ms, |cell| occupied.contains(&cell));
    }
}

fn update_collectibles(state: &mut GameState, dt_ms: f32) {
    for item in state.collectibles.iter_mut() {
        item.bob_phase = (item.bob_phase + dt_ms * BOB_SPEED) % std::f32::consts::TAU;
    }

    let player = state.player.mover.cell;
    let magnet = state.modifiers.treasure_magnet;
    let (picked, rest): (Vec<Collectible>, Vec<Collectible>) = std::mem::take(&mut state.collectibles)
        .into_iter()
        .partition(|c| {
            c.cell == player
                || (magnet && c.category == Category::Treasure && toroidal_manhattan(c.cell, player) <= MAGNET_RANGE)
        });
    state.collectibles = rest;

    for item in picked {
        collect_item(state, item);
    }
}

fn collect_item(state: &mut GameState, item: Collectible) {
    let m = state.modifiers;
    let mut value = item.value as f64 * m.score_multiplier.max(1) as f64;
    if item.category == Category::Literature && m.knowledge_boost {
        value *= 1.5;
    }
    if matches!(item.category, Category::Software | Category::Tool) && m.tech_bonus {
        value *= 1.3;
    }
    state.treasure_score += value.round() as u64;

    state.stats.items_collected += 1;
    state.stats.rarity_counts[item.rarity.index()] += 1;

    let center = Vec2::new(item.cell.0 as f32 + 0.5, item.cell.1 as f32 + 0.5);
    let palette = item.rarity.palette();
    state.particles.burst(center, Burst::sparkle(&palette), &mut state.rng);

    log::debug!("Collected {} ({}) worth {}", item.name, item.rarity.name(), value.round());
    state.events.push(GameEvent::ItemCollected {
        name: item.name.clone(),
        rarity: item.rarity,
        category: item.category,
    });

    if let Some(effect) = item.effect {
        state.apply_effect(effect.kind, effect.duration_ms, &item.name);
    }
    let xp = item.rarity.xp();
    let source = item.name.clone();
    state.inventory.push(item);
    state.grant_xp(xp, &source);

    check_synergies(state);
    state.check_achievements();
}

fn check_synergies(state: &mut GameState) {
    let factor = if state.progression.has_ability(Ability::SynergyExpert) {
        SYNERGY_EXPERT_FACTOR
    } else {
        1.0
    };
    let activated: Vec<SynergyId> = state
        .synergies
        .check(&state.inventory, state.time_ms, factor);
    if activated.is_empty() {
        return;
    }

    state.recompute_modifiers();
    let center = state.player.center();
    for id in activated {
        log::info!("Synergy activated: {} ({})", id.def().name, id.def().description);
        state.stats.synergies_activated += 1;
        state.events.push(GameEvent::SynergyActivated(id));
        state.particles.burst(
            center,
            Burst::celebration(&[0xff00ff, 0x00ffff, 0xffff00]),
            &mut state.rng,
        );
        state.grant_xp(SYNERGY_XP, id.def().name);
    }
}

fn eat_dots(state: &mut GameState) {
    let (x, y) = state.player.mover.cell;
    match state.world.eat_dot(x, y) {
        Some(Tile::Dot) => {
            state.add_score(DOT_POINTS);
            state.events.push(GameEvent::DotEaten);
            state.grant_xp(DOT_XP, "dot");
        }
        Some(Tile::PowerPellet) => {
            state.add_score(PELLET_POINTS);
            let duration = state.power_duration_ms();
            state.start_power(duration);
            state.events.push(GameEvent::PowerPelletEaten);
            state.grant_xp(PELLET_XP, "power pellet");
            log::debug!("Power mode for {duration} ms");
        }
        _ => return,
    }
    state.stats.dots_eaten += 1;
    state.fruit.dot_eaten();
}

fn check_zone_transition(state: &mut GameState) {
    let (x, y) = state.player.mover.cell;
    let theme = World::theme_at(x, y);
    if theme == state.player.theme {
        return;
    }

    log::debug!("Entered {} zone at {:?}", theme.name(), (x, y));
    state.player.theme = theme;
    state.stats.zones_explored.insert(theme);
    state.events.push(GameEvent::ZoneEntered(theme));
    state.grant_xp(ZONE_XP, "zone transition");
    if state.progression.has_ability(Ability::ZoneMaster) {
        state.apply_effect(EffectKind::GhostImmunity, ZONE_MASTER_IMMUNITY_MS, "zone_master");
    }
}

fn resolve_ghost_collisions(state: &mut GameState) {
    if state.modifiers.ghost_immune {
        return;
    }

    let hits: Vec<(bool, usize)> = state
        .ghosts
        .iter()
        .enumerate()
        .map(|(i, g)| (false, i, g))
        .chain(state.frenzy_ghosts.iter().enumerate().map(|(i, g)| (true, i, g)))
        .filter(|(_, _, g)| {
            g.mode != GhostMode::Eaten && g.mover.distance_sq(&state.player.mover) < GHOST_COLLISION_DIST_SQ
        })
        .map(|(frenzy, i, _)| (frenzy, i))
        .collect();

    for (frenzy, i) in hits {
        let ghost = if frenzy {
            &mut state.frenzy_ghosts[i]
        } else {
            &mut state.ghosts[i]
        };
        if ghost.mode == GhostMode::Frightened {
            ghost.eat();
            let center = ghost.mover.pos + Vec2::splat(0.5);
            state.add_score(GHOST_POINTS);
            state.stats.ghosts_eaten += 1;
            state.events.push(GameEvent::GhostEaten);
            state
                .particles
                .burst(center, Burst::sparkle(&[0x2121ff, 0xffffff]), &mut state.rng);
            state.grant_xp(GHOST_XP, "ghost");
        } else {
            // One death per tick
            state.kill_player();
            break;
        }
    }
}

fn update_fruit(state: &mut GameState, dt_ms: f32) {
    let player = state.player.mover.cell;
    let Some(event) = state.fruit.update(dt_ms, player, &state.world, &mut state.rng) else {
        return;
    };

    match event {
        FruitEvent::Spawned(kind) => state.events.push(GameEvent::FruitSpawned(kind)),
        FruitEvent::Expired => log::debug!("Fruit expired"),
        FruitEvent::Eaten { kind, cell } => {
            state.add_score(kind.points());
            state.events.push(GameEvent::FruitEaten(kind));
            let center = Vec2::new(cell.0 as f32 + 0.5, cell.1 as f32 + 0.5);
            state
                .particles
                .burst(center, Burst::sparkle(&[0xff4444, 0xffaa00, 0x44ff44]), &mut state.rng);
            log::debug!("Ate {} for {} points", kind.name(), kind.points());
            match kind.special() {
                Some(FruitSpecial::GhostFrenzy) => state.spawn_frenzy(),
                Some(FruitSpecial::SuperPower) => state.start_power(SUPER_POWER_DURATION_MS),
                None => {}
            }
        }
    }
}

/// Demo-mode steering: head for the nearest dot, item or fruit while keeping
/// clear of dangerous ghosts
fn autopilot(state: &mut GameState) {
    if !state.player.mover.ready() {
        return;
    }

    let start = state.player.mover.cell;
    let danger: Vec<(i32, i32)> = state
        .ghosts
        .iter()
        .chain(state.frenzy_ghosts.iter())
        .filter(|g| matches!(g.mode, GhostMode::Chasing | GhostMode::InHouse))
        .map(|g| g.mover.cell)
        .collect();
    let risky = |cell: (i32, i32)| {
        !state.modifiers.ghost_immune
            && danger
                .iter()
                .any(|&g| toroidal_manhattan(g, cell) <= AUTOPILOT_GHOST_MARGIN)
    };
    let is_goal = |cell: (i32, i32)| {
        matches!(state.world.tile(cell.0, cell.1), Tile::Dot | Tile::PowerPellet)
            || state.collectibles.iter().any(|c| c.cell == cell)
            || (state.fruit.active && state.fruit.cell == cell)
    };

    // Breadth-first search remembering the first step of each path
    let mut first_step: HashMap<(i32, i32), Direction> = HashMap::new();
    let mut queue = VecDeque::new();
    first_step.insert(start, state.player.mover.dir);
    queue.push_back((start, 0u32));
    let mut choice = None;

    while let Some((cell, depth)) = queue.pop_front() {
        if cell != start && is_goal(cell) {
            choice = first_step.get(&cell).copied();
            break;
        }
        if depth >= AUTOPILOT_SEARCH_DEPTH {
            continue;
        }
        for dir in Direction::PREFERENCE {
            let next = dir.step(cell);
            if first_step.contains_key(&next) || !state.player_can_enter(next) || risky(next) {
                continue;
            }
            let first = if cell == start {
                dir
            } else {
                first_step.get(&cell).copied().unwrap_or(dir)
            };
            first_step.insert(next, first);
            queue.push_back((next, depth + 1));
        }
    }

    let dir = match choice {
        Some(dir) => dir,
        None => {
            // Nothing in reach: wander, preferring not to turn back
            let reverse = state.player.mover.dir.opposite();
            let mut options: Vec<Direction> = Direction::ALL
                .iter()
                .copied()
                .filter(|&d| d != reverse && state.player_can_enter(state.player.mover.ahead(d)))
                .collect();
            options.shuffle(&mut state.rng);
            options.first().copied().unwrap_or(reverse)
        }
    };
    state.player.next_dir = Some(dir);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::collectible::{Collectible, Rarity};
    use crate::sim::ghost::Ghost;
    use crate::sim::state::SimConfig;
    use crate::sim::world::{DoorReward, KeyColor, Theme, pattern_dot_count};

    /// A state with no ghosts and a parked player
    fn quiet_state(seed: u64) -> GameState {
        let mut state = GameState::new(seed, Box::new(MemoryStore::new()), SimConfig::default());
        state.ghosts.clear();
        let (x, y) = PLAYER_START;
        state.world.set_tile(x, y, Tile::Path);
        park_player(&mut state);
        state
    }

    fn park_player(state: &mut GameState) {
        state.player.mover.cooldown_ms = 1.0e9;
    }

    fn run(state: &mut GameState, ms: f32) {
        let input = TickInput::default();
        let mut left = ms;
        while left > 0.0 {
            let dt = left.min(MAX_FRAME_MS);
            tick(state, &input, dt);
            left -= dt;
        }
    }

    #[test]
    fn test_fresh_world_dot_count() {
        let state = GameState::new(1, Box::new(MemoryStore::new()), SimConfig::default());
        assert_eq!(
            state.world.dot_count(),
            (WORLD_MODULE_DIM * WORLD_MODULE_DIM) as usize * pattern_dot_count()
        );
    }

    #[test]
    fn test_power_pellet_times_out() {
        let mut state = quiet_state(2);
        let (x, y) = PLAYER_START;
        state.world.set_tile(x, y, Tile::PowerPellet);

        tick(&mut state, &TickInput::default(), 0.0);
        assert!(state.power);
        assert_eq!(state.power_ms, 9_000.0);
        assert!(state.events.contains(&GameEvent::PowerPelletEaten));

        run(&mut state, 8_900.0);
        assert!(state.power);
        run(&mut state, 100.0);
        assert!(!state.power);
        assert!(state.events.contains(&GameEvent::PowerEnded));
    }

    #[test]
    fn test_power_pellet_with_longer_power() {
        let mut state = quiet_state(3);
        state.grant_xp(100, "test");
        assert!(state.progression.has_ability(Ability::LongerPower));
        let (x, y) = PLAYER_START;
        state.world.set_tile(x, y, Tile::PowerPellet);

        tick(&mut state, &TickInput::default(), 0.0);
        assert_eq!(state.power_ms, 11_250.0);
    }

    fn ghost_on_player(state: &mut GameState) {
        let mut ghost = Ghost::classic(crate::sim::ghost::GhostKind::Blinky, GHOST_STEP_MS[0]);
        ghost.mover.place(state.player.mover.cell);
        ghost.mover.cooldown_ms = 1.0e9;
        ghost.mode = GhostMode::Chasing;
        state.ghosts = vec![ghost];
    }

    #[test]
    fn test_chasing_ghost_costs_one_life() {
        let mut state = quiet_state(4);
        ghost_on_player(&mut state);
        // A second ghost on the same cell must not cost another life
        let twin = state.ghosts[0].clone();
        state.ghosts.push(twin);

        tick(&mut state, &TickInput::default(), 0.0);
        assert_eq!(state.player.lives, START_LIVES - 1);
        assert!(matches!(state.phase, GamePhase::Dying { .. }));

        run(&mut state, DEATH_ANIMATION_MS);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.player.mover.cell, PLAYER_START);
        assert_eq!(state.ghosts.len(), 4);
    }

    #[test]
    fn test_last_life_ends_the_game() {
        let mut state = quiet_state(5);
        state.player.lives = 1;
        ghost_on_player(&mut state);

        tick(&mut state, &TickInput::default(), 0.0);
        assert_eq!(state.player.lives, 0);
        run(&mut state, DEATH_ANIMATION_MS);
        assert!(state.is_game_over());
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::GameOver { .. }))
        );

        let time = state.time_ms;
        run(&mut state, 1_000.0);
        assert_eq!(state.time_ms, time);
    }

    #[test]
    fn test_death_animation_frames() {
        let mut state = quiet_state(6);
        ghost_on_player(&mut state);
        tick(&mut state, &TickInput::default(), 0.0);
        assert_eq!(state.death_frame(), Some(0));
        run(&mut state, 300.0);
        assert_eq!(state.death_frame(), Some(2));
    }

    #[test]
    fn test_ghost_immunity_skips_collisions() {
        let mut state = quiet_state(7);
        ghost_on_player(&mut state);
        state.apply_effect(EffectKind::GhostImmunity, 10_000.0, "Stellar Core");
        tick(&mut state, &TickInput::default(), 0.0);
        assert_eq!(state.player.lives, START_LIVES);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_frightened_ghost_is_eaten() {
        let mut state = quiet_state(8);
        ghost_on_player(&mut state);
        state.start_power(POWER_DURATION_MS);

        tick(&mut state, &TickInput::default(), 0.0);
        assert_eq!(state.ghosts[0].mode, GhostMode::Eaten);
        assert_eq!(state.score, GHOST_POINTS);
        assert_eq!(state.stats.ghosts_eaten, 1);
        assert_eq!(state.player.lives, START_LIVES);
    }

    fn red_door_left_of_player(state: &mut GameState) {
        let (x, y) = PLAYER_START;
        state.world.place_door(x - 1, y, KeyColor::Red, DoorReward::TreasureCache { value: 500 });
        state.player.mover.cooldown_ms = 0.0;
        state.player.mover.dir = Direction::Left;
    }

    #[test]
    fn test_matching_key_opens_door_once() {
        let mut state = quiet_state(9);
        red_door_left_of_player(&mut state);
        state.inventory.push(Collectible::key(900, (0, 0), KeyColor::Red));
        state.inventory.push(Collectible::key(901, (0, 0), KeyColor::Red));

        tick(&mut state, &TickInput::default(), 0.0);
        let (x, y) = PLAYER_START;
        assert_eq!(state.world.tile(x - 1, y), Tile::Path);
        assert!(state.world.door(x - 1, y).is_none());
        assert_eq!(state.inventory.key_count(KeyColor::Red), 1);
        assert_eq!(state.player.mover.cell, (x - 1, y));
        assert_eq!(state.treasure_score, 500);
        assert_eq!(state.stats.doors_unlocked, 1);
        assert!(state.key_log[0].key_consumed);
    }

    #[test]
    fn test_door_blocks_without_key() {
        let mut state = quiet_state(10);
        red_door_left_of_player(&mut state);
        state.inventory.push(Collectible::key(900, (0, 0), KeyColor::Blue));

        tick(&mut state, &TickInput::default(), 0.0);
        let (x, y) = PLAYER_START;
        assert!(matches!(state.world.tile(x - 1, y), Tile::LockedDoor(KeyColor::Red)));
        assert_eq!(state.player.mover.cell, PLAYER_START);
        assert_eq!(state.inventory.key_count(KeyColor::Blue), 1);
    }

    #[test]
    fn test_master_key_spares_inventory() {
        let mut state = quiet_state(11);
        red_door_left_of_player(&mut state);
        state.inventory.push(Collectible::key(900, (0, 0), KeyColor::Blue));
        for id in 0..3 {
            state.inventory.push(Collectible::key(910 + id, (0, 0), KeyColor::Green));
        }
        state.synergies.check(&state.inventory, 0.0, 1.0);

        tick(&mut state, &TickInput::default(), 0.0);
        let (x, y) = PLAYER_START;
        assert_eq!(state.world.tile(x - 1, y), Tile::Path);
        assert_eq!(state.inventory.total_keys(), 4);
        assert!(!state.key_log[0].key_consumed);
    }

    #[test]
    fn test_pickup_applies_effect_and_xp() {
        let mut state = quiet_state(12);
        let mut rng = rand_pcg::Pcg32::new(1, 1);
        let template = &crate::sim::collectible::RARE_ITEMS[0];
        let item = Collectible::from_template(500, PLAYER_START, Rarity::Rare, template, &mut rng);
        let value = item.value;
        state.collectibles = vec![item];

        tick(&mut state, &TickInput::default(), 0.0);
        assert!(state.collectibles.is_empty());
        assert_eq!(state.inventory.len(), 1);
        assert_eq!(state.treasure_score, value);
        assert_eq!(state.stats.rarity_counts[Rarity::Rare.index()], 1);
        // Rare item XP plus the first_steps achievement
        assert_eq!(state.progression.total_xp(), 50 + 50);
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::ItemCollected { .. }))
        );
    }

    #[test]
    fn test_three_books_start_scholar_once() {
        let mut state = quiet_state(13);
        let mut rng = rand_pcg::Pcg32::new(2, 2);
        let book = crate::sim::collectible::COMMON_ITEMS
            .iter()
            .find(|t| t.category == Category::Literature)
            .unwrap();
        for id in 0..4 {
            let item = Collectible::from_template(600 + id, PLAYER_START, Rarity::Common, book, &mut rng);
            state.collectibles = vec![item];
            tick(&mut state, &TickInput::default(), 0.0);
        }
        let activations = state
            .events
            .iter()
            .filter(|e| **e == GameEvent::SynergyActivated(SynergyId::Scholar))
            .count();
        assert_eq!(activations, 1);
        assert_eq!(state.stats.synergies_activated, 1);
        assert!(state.modifiers.knowledge_boost);
    }

    #[test]
    fn test_speed_boost_expires_on_sim_clock() {
        let mut state = quiet_state(14);
        state.apply_effect(EffectKind::SpeedBoost, 1_000.0, "Lightning Orb");
        assert!(state.player_step_ms() < PLAYER_STEP_MS);
        run(&mut state, 1_000.0);
        assert!(state.events.contains(&GameEvent::EffectEnded(EffectKind::SpeedBoost)));
        assert_eq!(state.player_step_ms(), PLAYER_STEP_MS);
    }

    #[test]
    fn test_zone_transition_grants_xp() {
        let mut state = quiet_state(15);
        state.player.mover.place((PATTERN_COLS + 9, 15));
        park_player(&mut state);
        tick(&mut state, &TickInput::default(), 0.0);

        let theme = World::theme_at(PATTERN_COLS + 9, 15);
        assert_ne!(theme, Theme::Classic);
        assert!(state.events.contains(&GameEvent::ZoneEntered(theme)));
        assert!(state.stats.zones_explored.contains(&theme));
        assert!(state.progression.total_xp() >= ZONE_XP);
    }

    #[test]
    fn test_buffered_turn_waits_for_opening() {
        let mut state = quiet_state(16);
        state.player.mover.cooldown_ms = 0.0;
        // Row 15 has a wall above the start cell
        let input = TickInput {
            direction: Some(Direction::Up),
            ..Default::default()
        };
        tick(&mut state, &input, 0.0);
        assert_eq!(state.player.mover.cell, (PLAYER_START.0 - 1, PLAYER_START.1));
        assert_eq!(state.player.next_dir, Some(Direction::Up));
    }

    #[test]
    fn test_teleport_input() {
        let mut state = quiet_state(17);
        let input = TickInput {
            teleport: true,
            ..Default::default()
        };
        tick(&mut state, &input, 0.0);
        assert!(state.events.contains(&GameEvent::Teleported));
        assert_ne!(state.player.mover.cell, PLAYER_START);
    }

    #[test]
    fn test_idle_mode_eats_dots() {
        let mut state = GameState::new(18, Box::new(MemoryStore::new()), SimConfig::default());
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..600 {
            tick(&mut state, &input, 16.0);
        }
        assert!(state.stats.dots_eaten > 0);
        assert!(!state.hud.is_empty());
    }

    #[test]
    fn test_same_seed_same_run() {
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        let mut a = GameState::new(19, Box::new(MemoryStore::new()), SimConfig::default());
        let mut b = GameState::new(19, Box::new(MemoryStore::new()), SimConfig::default());
        for _ in 0..400 {
            tick(&mut a, &input, 16.0);
            tick(&mut b, &input, 16.0);
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.player.mover.cell, b.player.mover.cell);
        assert_eq!(a.events, b.events);
        for (ga, gb) in a.ghosts.iter().zip(&b.ghosts) {
            assert_eq!(ga.mover.cell, gb.mover.cell);
        }
    }

    #[test]
    fn test_zoom_toggle() {
        let mut state = quiet_state(20);
        let input = TickInput {
            toggle_zoom: true,
            ..Default::default()
        };
        tick(&mut state, &input, 16.0);
        assert!(state.camera.is_zoomed_out());
        tick(&mut state, &input, 16.0);
        assert!(!state.camera.is_zoomed_out());
    }
}
