//! Grid movement
//!
//! Movers occupy integer cells and advance one cell per step interval; a
//! continuous position is interpolated between steps for rendering and
//! collision. Entry checks are pure; unlocking a door is a separate step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collectible::{Collectible, Inventory};
use super::world::{LockedDoor, Tile, World};
use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::{wrap_cell, wrap_coord_f32, wrapped_delta};

/// Cardinal directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Evaluation order for move enumeration
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Tie-break preference for greedy ghost moves
    pub const PREFERENCE: [Direction; 4] = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];

    #[inline]
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    #[inline]
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Wrapped neighbor of a cell in this direction
    #[inline]
    pub fn step(&self, cell: (i32, i32)) -> (i32, i32) {
        let (dx, dy) = self.delta();
        wrap_cell(cell.0 + dx, cell.1 + dy)
    }
}

/// Who is trying to enter a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverKind {
    Player,
    Ghost,
}

/// Player abilities that affect cell entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryRules {
    /// Walk through walls and decorative blocks (never through ghost doors)
    pub phase_walls: bool,
    /// Holds a key or master key matching the door at the target, if any
    pub can_unlock: bool,
}

/// Whether `kind` may enter a cell holding `tile`. Pure: never mutates.
///
/// Ghosts pass ghost doors and ignore locks; the player never passes a ghost
/// door and needs a usable key for a locked door.
pub fn can_enter(tile: Tile, kind: MoverKind, rules: EntryRules) -> bool {
    match tile {
        Tile::Path | Tile::Dot | Tile::PowerPellet | Tile::Teleport => true,
        Tile::Wall | Tile::Decorative => kind == MoverKind::Player && rules.phase_walls,
        Tile::GhostDoor => kind == MoverKind::Ghost,
        Tile::LockedDoor(_) => match kind {
            MoverKind::Ghost => true,
            MoverKind::Player => rules.can_unlock,
        },
    }
}

/// Whether the inventory can open `door`
pub fn has_key_for(inventory: &Inventory, door: &LockedDoor, master_key: bool) -> bool {
    inventory.key_count(door.color) > 0 || (master_key && inventory.total_keys() > 0)
}

/// Outcome of an unlock attempt
#[derive(Debug, Clone, PartialEq)]
pub enum UnlockResult {
    /// Door opened; the key used (None when a master key spared it)
    Unlocked {
        door: LockedDoor,
        key_used: Option<Collectible>,
    },
    /// A locked door with no usable key
    NoKey,
    /// No locked door at the cell
    NotLocked,
}

/// Unlock the door at `cell` if possible.
///
/// A matching key is always consumed. With `master_key`, any key opens the
/// door; a mismatched key is kept.
pub fn try_unlock(world: &mut World, cell: (i32, i32), inventory: &mut Inventory, master_key: bool) -> UnlockResult {
    let Some(door) = world.door(cell.0, cell.1).copied() else {
        return UnlockResult::NotLocked;
    };

    let key_used = if let Some(key) = inventory.take_key(door.color) {
        Some(key)
    } else if master_key && inventory.total_keys() > 0 {
        None
    } else {
        return UnlockResult::NoKey;
    };

    match world.open_door(cell.0, cell.1) {
        Some(door) => UnlockResult::Unlocked { door, key_used },
        None => UnlockResult::NotLocked,
    }
}

/// A grid-stepping entity with an interpolated position
#[derive(Debug, Clone, PartialEq)]
pub struct Mover {
    /// Current cell (always wrapped)
    pub cell: (i32, i32),
    /// Facing / travel direction
    pub dir: Direction,
    /// Interpolated position in cell units
    pub pos: Vec2,
    /// Position at the start of the current step
    from: Vec2,
    /// Time left before the next step may begin
    pub cooldown_ms: f32,
    /// Length of the current step
    interval_ms: f32,
}

impl Mover {
    pub fn new(cell: (i32, i32), dir: Direction) -> Self {
        let cell = wrap_cell(cell.0, cell.1);
        let pos = Vec2::new(cell.0 as f32, cell.1 as f32);
        Self {
            cell,
            dir,
            pos,
            from: pos,
            cooldown_ms: 0.0,
            interval_ms: 0.0,
        }
    }

    /// Ready to begin another step
    #[inline]
    pub fn ready(&self) -> bool {
        self.cooldown_ms <= 0.0
    }

    /// The cell one step ahead in `dir`
    #[inline]
    pub fn ahead(&self, dir: Direction) -> (i32, i32) {
        dir.step(self.cell)
    }

    /// Move one cell in `dir` and start a step of `interval_ms`
    pub fn advance(&mut self, dir: Direction, interval_ms: f32) {
        self.dir = dir;
        self.from = self.pos;
        self.cell = dir.step(self.cell);
        self.interval_ms = interval_ms.max(1.0);
        self.cooldown_ms = self.interval_ms;
    }

    /// Jump to a cell without interpolation
    pub fn place(&mut self, cell: (i32, i32)) {
        self.cell = wrap_cell(cell.0, cell.1);
        self.pos = self.target();
        self.from = self.pos;
        self.cooldown_ms = 0.0;
    }

    #[inline]
    fn target(&self) -> Vec2 {
        Vec2::new(self.cell.0 as f32, self.cell.1 as f32)
    }

    /// Count down the step cooldown and update the interpolated position
    pub fn interpolate(&mut self, dt_ms: f32) {
        self.cooldown_ms = (self.cooldown_ms - dt_ms).max(0.0);
        let target = self.target();
        if self.cooldown_ms <= 0.0 || self.interval_ms <= 0.0 {
            self.pos = target;
            self.from = target;
            return;
        }

        let progress = 1.0 - self.cooldown_ms / self.interval_ms;
        let dx = wrapped_delta(self.from.x, target.x, WORLD_WIDTH as f32);
        let dy = wrapped_delta(self.from.y, target.y, WORLD_HEIGHT as f32);
        self.pos = Vec2::new(
            wrap_coord_f32(self.from.x + dx * progress, WORLD_WIDTH as f32),
            wrap_coord_f32(self.from.y + dy * progress, WORLD_HEIGHT as f32),
        );
    }

    /// Squared wrapped distance between two movers' interpolated positions
    pub fn distance_sq(&self, other: &Mover) -> f32 {
        let dx = wrapped_delta(self.pos.x, other.pos.x, WORLD_WIDTH as f32);
        let dy = wrapped_delta(self.pos.y, other.pos.y, WORLD_HEIGHT as f32);
        dx * dx + dy * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collectible::Collectible;
    use crate::sim::world::{DoorReward, KeyColor};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn world() -> World {
        let mut rng = Pcg32::seed_from_u64(11);
        World::build(&mut rng)
    }

    #[test]
    fn test_opposites() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            let (dx, dy) = dir.delta();
            let (ox, oy) = dir.opposite().delta();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn test_step_wraps() {
        assert_eq!(Direction::Left.step((0, 5)), (WORLD_WIDTH - 1, 5));
        assert_eq!(Direction::Up.step((5, 0)), (5, WORLD_HEIGHT - 1));
        assert_eq!(Direction::Right.step((WORLD_WIDTH - 1, 5)), (0, 5));
        assert_eq!(Direction::Down.step((5, WORLD_HEIGHT - 1)), (5, 0));
    }

    #[test]
    fn test_walls_block_unless_phasing() {
        let rules = EntryRules::default();
        assert!(!can_enter(Tile::Wall, MoverKind::Player, rules));
        assert!(!can_enter(Tile::Wall, MoverKind::Ghost, rules));
        let phasing = EntryRules {
            phase_walls: true,
            ..rules
        };
        assert!(can_enter(Tile::Wall, MoverKind::Player, phasing));
        assert!(can_enter(Tile::Decorative, MoverKind::Player, phasing));
        assert!(!can_enter(Tile::Wall, MoverKind::Ghost, phasing));
    }

    #[test]
    fn test_ghost_door_is_ghost_only() {
        let phasing = EntryRules {
            phase_walls: true,
            can_unlock: true,
        };
        assert!(!can_enter(Tile::GhostDoor, MoverKind::Player, phasing));
        assert!(can_enter(Tile::GhostDoor, MoverKind::Ghost, EntryRules::default()));
    }

    #[test]
    fn test_locked_door_needs_key() {
        let door = Tile::LockedDoor(KeyColor::Blue);
        assert!(!can_enter(door, MoverKind::Player, EntryRules::default()));
        let keyed = EntryRules {
            can_unlock: true,
            ..Default::default()
        };
        assert!(can_enter(door, MoverKind::Player, keyed));
    }

    #[test]
    fn test_unlock_consumes_matching_key() {
        let mut world = world();
        world.place_door(8, 11, KeyColor::Red, DoorReward::SecretPassage);
        let mut inv = Inventory::default();
        inv.push(Collectible::key(1, (0, 0), KeyColor::Red));

        let result = try_unlock(&mut world, (8, 11), &mut inv, false);
        match result {
            UnlockResult::Unlocked { door, key_used } => {
                assert_eq!(door.color, KeyColor::Red);
                assert_eq!(key_used.map(|k| k.key_color), Some(Some(KeyColor::Red)));
            }
            other => panic!("expected unlock, got {:?}", other),
        }
        assert_eq!(inv.total_keys(), 0);
        assert_eq!(world.tile(8, 11), Tile::Path);
    }

    #[test]
    fn test_unlock_without_key_leaves_door() {
        let mut world = world();
        world.place_door(8, 11, KeyColor::Green, DoorReward::PowerUpgrade);
        let mut inv = Inventory::default();
        inv.push(Collectible::key(1, (0, 0), KeyColor::Red));
        assert_eq!(try_unlock(&mut world, (8, 11), &mut inv, false), UnlockResult::NoKey);
        assert_eq!(world.tile(8, 11), Tile::LockedDoor(KeyColor::Green));
        assert_eq!(inv.total_keys(), 1);
    }

    #[test]
    fn test_master_key_spares_mismatched_key() {
        let mut world = world();
        world.place_door(8, 11, KeyColor::Green, DoorReward::PowerUpgrade);
        let mut inv = Inventory::default();
        inv.push(Collectible::key(1, (0, 0), KeyColor::Red));
        let result = try_unlock(&mut world, (8, 11), &mut inv, true);
        assert!(matches!(result, UnlockResult::Unlocked { key_used: None, .. }));
        assert_eq!(inv.total_keys(), 1);
    }

    #[test]
    fn test_unlock_plain_cell() {
        let mut world = world();
        let mut inv = Inventory::default();
        assert_eq!(try_unlock(&mut world, (1, 1), &mut inv, true), UnlockResult::NotLocked);
    }

    #[test]
    fn test_has_key_for() {
        let door = LockedDoor {
            cell: (0, 0),
            color: KeyColor::Yellow,
            reward: DoorReward::SecretPassage,
        };
        let mut inv = Inventory::default();
        assert!(!has_key_for(&inv, &door, true));
        inv.push(Collectible::key(1, (0, 0), KeyColor::Blue));
        assert!(!has_key_for(&inv, &door, false));
        assert!(has_key_for(&inv, &door, true));
    }

    #[test]
    fn test_interpolation_is_linear() {
        let mut mover = Mover::new((5, 5), Direction::Right);
        mover.advance(Direction::Right, 100.0);
        assert_eq!(mover.cell, (6, 5));
        mover.interpolate(50.0);
        assert!((mover.pos.x - 5.5).abs() < 1e-4);
        mover.interpolate(50.0);
        assert_eq!(mover.pos, Vec2::new(6.0, 5.0));
        assert!(mover.ready());
    }

    #[test]
    fn test_interpolation_across_seam() {
        let mut mover = Mover::new((0, 5), Direction::Left);
        mover.advance(Direction::Left, 100.0);
        assert_eq!(mover.cell, (WORLD_WIDTH - 1, 5));
        mover.interpolate(50.0);
        // Halfway across the seam, not sliding across the whole world
        assert!((mover.pos.x - (WORLD_WIDTH as f32 - 0.5)).abs() < 1e-3);
    }

    fn any_tile() -> impl Strategy<Value = Tile> {
        prop_oneof![
            Just(Tile::Wall),
            Just(Tile::Path),
            Just(Tile::Dot),
            Just(Tile::PowerPellet),
            Just(Tile::Teleport),
            Just(Tile::GhostDoor),
            Just(Tile::Decorative),
            (0usize..4).prop_map(|i| Tile::LockedDoor(KeyColor::ALL[i])),
        ]
    }

    proptest! {
        #[test]
        fn prop_can_enter_never_mutates(
            x in 0i32..WORLD_WIDTH,
            y in 0i32..WORLD_HEIGHT,
            phase_walls: bool,
            can_unlock: bool
        ) {
            let world = world();
            let before = world.tile(x, y);
            let rules = EntryRules { phase_walls, can_unlock };
            let first = can_enter(before, MoverKind::Player, rules);
            let second = can_enter(world.tile(x, y), MoverKind::Player, rules);
            prop_assert_eq!(first, second);
            prop_assert_eq!(world.tile(x, y), before);
        }

        #[test]
        fn prop_open_floor_admits_everyone(tile in any_tile(), phase_walls: bool, can_unlock: bool) {
            let rules = EntryRules { phase_walls, can_unlock };
            if tile.is_open() {
                prop_assert!(can_enter(tile, MoverKind::Player, rules));
                prop_assert!(can_enter(tile, MoverKind::Ghost, rules));
            }
            if tile == Tile::GhostDoor {
                prop_assert!(!can_enter(tile, MoverKind::Player, rules));
            }
        }
    }

    #[test]
    fn test_distance_sq_wraps() {
        let a = Mover::new((0, 0), Direction::Up);
        let b = Mover::new((WORLD_WIDTH - 1, 0), Direction::Up);
        assert!((a.distance_sq(&b) - 1.0).abs() < 1e-4);
    }
}
