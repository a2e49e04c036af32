//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied frame time only
//! - Seeded RNG only
//! - Stable iteration order (BTreeMap registries, Vec entity lists)
//! - No rendering or platform dependencies

pub mod camera;
pub mod collectible;
pub mod effects;
pub mod fruit;
pub mod ghost;
pub mod movement;
pub mod particles;
pub mod progression;
pub mod state;
pub mod synergy;
pub mod tick;
pub mod vector;
pub mod world;
pub mod zone;

pub use camera::Camera;
pub use collectible::{Category, Collectible, Inventory, Rarity};
pub use effects::{EffectKind, EffectRegistry, Modifiers};
pub use fruit::{Fruit, FruitKind};
pub use ghost::{Ghost, GhostKind, GhostMode};
pub use movement::{Direction, EntryRules, MoverKind, UnlockResult, can_enter, try_unlock};
pub use progression::{Ability, AchievementId, Progression, SessionStats};
pub use state::{GameEvent, GamePhase, GameState, Player, SimConfig};
pub use synergy::{SynergyId, Synergies};
pub use tick::{TickInput, tick};
pub use world::{KeyColor, Theme, Tile, World};
pub use zone::ZoneEntity;
