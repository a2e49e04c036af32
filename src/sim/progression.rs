//! Experience, levels, abilities and achievements
//!
//! Progression outlives a single game: it is loaded once from the key-value
//! store and written back whenever it changes.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::world::Theme;
use crate::persistence::{self, KeyValueStore};

pub const LEVEL_KEY: &str = "gridluck_level";
pub const XP_KEY: &str = "gridluck_totalXP";
pub const ACHIEVEMENTS_KEY: &str = "gridluck_achievements";
pub const ABILITIES_KEY: &str = "gridluck_abilities";

/// Passive abilities unlocked by leveling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    LongerPower,
    FastStart,
    GhostRadar,
    TreasureSense,
    ZoneMaster,
    SynergyExpert,
    LegendaryLuck,
    MasterExplorer,
}

impl Ability {
    pub fn description(&self) -> &'static str {
        match self {
            Ability::LongerPower => "Power pellets last 25% longer",
            Ability::FastStart => "Start with a speed boost",
            Ability::GhostRadar => "See ghost positions on the mini map",
            Ability::TreasureSense => "Rare items glow",
            Ability::ZoneMaster => "Brief ghost immunity on entering a new zone",
            Ability::SynergyExpert => "Synergies last 50% longer",
            Ability::LegendaryLuck => "Double legendary item chance",
            Ability::MasterExplorer => "Reveal the whole map",
        }
    }
}

/// Ability granted on reaching each level
pub const LEVEL_REWARDS: [(u32, Ability); 8] = [
    (2, Ability::LongerPower),
    (3, Ability::FastStart),
    (5, Ability::GhostRadar),
    (7, Ability::TreasureSense),
    (10, Ability::ZoneMaster),
    (15, Ability::SynergyExpert),
    (20, Ability::LegendaryLuck),
    (25, Ability::MasterExplorer),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstSteps,
    TreasureHunter,
    SynergyMaster,
    GhostBuster,
    Explorer,
    LegendaryCollector,
    KeyMaster,
    MarathonPlayer,
}

/// Counters for the current game session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub dots_eaten: u32,
    pub ghosts_eaten: u32,
    pub items_collected: u32,
    pub synergies_activated: u32,
    pub doors_unlocked: u32,
    /// Pickups per rarity (common, uncommon, rare, legendary)
    pub rarity_counts: [u32; 4],
    pub zones_explored: BTreeSet<Theme>,
    pub elapsed_ms: f64,
}

impl SessionStats {
    pub fn legendary_found(&self) -> u32 {
        self.rarity_counts[3]
    }
}

pub struct AchievementDef {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub xp: u64,
    pub unlocked_by: fn(&SessionStats) -> bool,
}

impl fmt::Debug for AchievementDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AchievementDef")
            .field("id", &self.id)
            .field("xp", &self.xp)
            .finish()
    }
}

pub const ACHIEVEMENTS: [AchievementDef; 8] = [
    AchievementDef {
        id: AchievementId::FirstSteps,
        name: "First Steps",
        description: "Collect your first item",
        xp: 50,
        unlocked_by: |s| s.items_collected >= 1,
    },
    AchievementDef {
        id: AchievementId::TreasureHunter,
        name: "Treasure Hunter",
        description: "Collect 25 items",
        xp: 200,
        unlocked_by: |s| s.items_collected >= 25,
    },
    AchievementDef {
        id: AchievementId::SynergyMaster,
        name: "Synergy Master",
        description: "Activate 3 synergies",
        xp: 300,
        unlocked_by: |s| s.synergies_activated >= 3,
    },
    AchievementDef {
        id: AchievementId::GhostBuster,
        name: "Ghost Buster",
        description: "Eat 50 ghosts",
        xp: 250,
        unlocked_by: |s| s.ghosts_eaten >= 50,
    },
    AchievementDef {
        id: AchievementId::Explorer,
        name: "Explorer",
        description: "Visit all 5 zone themes",
        xp: 400,
        unlocked_by: |s| s.zones_explored.len() >= 5,
    },
    AchievementDef {
        id: AchievementId::LegendaryCollector,
        name: "Legendary Collector",
        description: "Find 5 legendary items",
        xp: 500,
        unlocked_by: |s| s.legendary_found() >= 5,
    },
    AchievementDef {
        id: AchievementId::KeyMaster,
        name: "Key Master",
        description: "Unlock 10 doors",
        xp: 350,
        unlocked_by: |s| s.doors_unlocked >= 10,
    },
    AchievementDef {
        id: AchievementId::MarathonPlayer,
        name: "Marathon Player",
        description: "Play for 30 minutes in one session",
        xp: 600,
        unlocked_by: |s| s.elapsed_ms >= 30.0 * 60.0 * 1000.0,
    },
];

/// Something progression wants the game to announce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    LevelUp { level: u32 },
    AbilityUnlocked(Ability),
    AchievementUnlocked(AchievementId),
}

/// Level for a cumulative experience total
pub fn level_for_xp(total_xp: u64) -> u32 {
    ((total_xp as f64 / 100.0).sqrt().floor() as u32).saturating_add(1)
}

/// Experience needed to reach `level`
pub fn xp_for_level(level: u32) -> u64 {
    let base = level.saturating_sub(1) as u64;
    base * base * 100
}

/// Persistent progression
#[derive(Debug)]
pub struct Progression {
    level: u32,
    total_xp: u64,
    achievements: Vec<AchievementId>,
    abilities: Vec<Ability>,
    store: Box<dyn KeyValueStore>,
}

impl Progression {
    /// Load from `store`; missing keys fall back to a fresh profile
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let total_xp: u64 = persistence::load_or_none(store.as_ref(), XP_KEY).unwrap_or(0);
        let stored_level: u32 = persistence::load_or_none(store.as_ref(), LEVEL_KEY).unwrap_or(1);
        let achievements: Vec<AchievementId> =
            persistence::load_or_none(store.as_ref(), ACHIEVEMENTS_KEY).unwrap_or_default();
        let abilities: Vec<Ability> = persistence::load_or_none(store.as_ref(), ABILITIES_KEY).unwrap_or_default();

        let level = stored_level.max(level_for_xp(total_xp));
        log::info!(
            "Progression loaded: level {}, {} XP, {} achievements, {} abilities",
            level,
            total_xp,
            achievements.len(),
            abilities.len()
        );
        Self {
            level,
            total_xp,
            achievements,
            abilities,
            store,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    pub fn abilities(&self) -> &[Ability] {
        &self.abilities
    }

    pub fn achievements(&self) -> &[AchievementId] {
        &self.achievements
    }

    /// The backing store, shared with other persisted preferences
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.store.as_mut()
    }

    #[inline]
    pub fn has_ability(&self, ability: Ability) -> bool {
        self.abilities.contains(&ability)
    }

    pub fn has_achievement(&self, id: AchievementId) -> bool {
        self.achievements.contains(&id)
    }

    /// XP earned within the current level, XP span of the level, XP still needed
    pub fn level_progress(&self) -> (u64, u64, u64) {
        let base = xp_for_level(self.level);
        let next = xp_for_level(self.level + 1);
        let into = self.total_xp.saturating_sub(base);
        (into, next - base, next.saturating_sub(self.total_xp))
    }

    /// Grant experience, leveling up as needed
    pub fn add_experience(&mut self, amount: u64, source: &str, events: &mut Vec<ProgressEvent>) {
        if amount == 0 {
            return;
        }
        self.total_xp += amount;
        log::trace!("+{} XP ({}), total {}", amount, source, self.total_xp);
        persistence::save_best_effort(self.store.as_mut(), XP_KEY, &self.total_xp);

        let new_level = level_for_xp(self.total_xp);
        if new_level > self.level {
            let old_level = self.level;
            self.level = new_level;
            log::info!("Level up! {} -> {}", old_level, new_level);
            persistence::save_best_effort(self.store.as_mut(), LEVEL_KEY, &self.level);
            events.push(ProgressEvent::LevelUp { level: new_level });

            // Every crossed level pays out
            for (level, ability) in LEVEL_REWARDS {
                if level > old_level && level <= new_level {
                    self.unlock_ability(ability, events);
                }
            }
        }
    }

    /// Unlock an ability; no-op if already held
    pub fn unlock_ability(&mut self, ability: Ability, events: &mut Vec<ProgressEvent>) {
        if self.has_ability(ability) {
            return;
        }
        self.abilities.push(ability);
        log::info!("Ability unlocked: {:?} ({})", ability, ability.description());
        persistence::save_best_effort(self.store.as_mut(), ABILITIES_KEY, &self.abilities);
        events.push(ProgressEvent::AbilityUnlocked(ability));
    }

    /// Unlock every newly satisfied achievement. Achievement XP may level up.
    pub fn check_achievements(&mut self, stats: &SessionStats, events: &mut Vec<ProgressEvent>) {
        for def in &ACHIEVEMENTS {
            if self.has_achievement(def.id) || !(def.unlocked_by)(stats) {
                continue;
            }
            self.achievements.push(def.id);
            log::info!("Achievement unlocked: {} ({})", def.name, def.description);
            persistence::save_best_effort(self.store.as_mut(), ACHIEVEMENTS_KEY, &self.achievements);
            events.push(ProgressEvent::AchievementUnlocked(def.id));
            self.add_experience(def.xp, def.name, events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use proptest::prelude::*;

    /// A store shared with the test so writes can be inspected after the
    /// progression takes ownership of its box
    #[derive(Debug, Clone, Default)]
    struct SharedStore(std::rc::Rc<std::cell::RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<serde_json::Value>, crate::StorageError> {
            self.0.borrow().get(key)
        }

        fn set(&mut self, key: &str, value: serde_json::Value) -> Result<(), crate::StorageError> {
            self.0.borrow_mut().set(key, value)
        }
    }

    fn fresh() -> Progression {
        Progression::load(Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_level_curve() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(399), 2);
        assert_eq!(level_for_xp(400), 3);
        assert_eq!(xp_for_level(3), 400);
    }

    #[test]
    fn test_fresh_profile_defaults() {
        let p = fresh();
        assert_eq!(p.level(), 1);
        assert_eq!(p.total_xp(), 0);
        assert!(p.abilities().is_empty());
        assert!(p.achievements().is_empty());
    }

    #[test]
    fn test_multi_level_jump_grants_every_reward() {
        let mut p = fresh();
        let mut events = Vec::new();
        // Straight to level 5
        p.add_experience(1_600, "test", &mut events);
        assert_eq!(p.level(), 5);
        assert!(p.has_ability(Ability::LongerPower));
        assert!(p.has_ability(Ability::FastStart));
        assert!(p.has_ability(Ability::GhostRadar));
        assert!(!p.has_ability(Ability::TreasureSense));
        assert_eq!(events[0], ProgressEvent::LevelUp { level: 5 });
    }

    #[test]
    fn test_ability_grant_is_idempotent() {
        let mut p = fresh();
        let mut events = Vec::new();
        p.unlock_ability(Ability::ZoneMaster, &mut events);
        p.unlock_ability(Ability::ZoneMaster, &mut events);
        assert_eq!(p.abilities().len(), 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_achievement_unlocks_once_and_grants_xp() {
        let mut p = fresh();
        let mut events = Vec::new();
        let stats = SessionStats {
            items_collected: 1,
            ..Default::default()
        };
        p.check_achievements(&stats, &mut events);
        p.check_achievements(&stats, &mut events);
        assert_eq!(p.achievements(), &[AchievementId::FirstSteps]);
        assert_eq!(p.total_xp(), 50);
        assert_eq!(
            events,
            vec![ProgressEvent::AchievementUnlocked(AchievementId::FirstSteps)]
        );
    }

    #[test]
    fn test_achievement_xp_can_level_up() {
        let mut p = fresh();
        let mut events = Vec::new();
        p.add_experience(60, "test", &mut events);
        let stats = SessionStats {
            items_collected: 1,
            ..Default::default()
        };
        p.check_achievements(&stats, &mut events);
        assert_eq!(p.level(), 2);
        assert!(events.contains(&ProgressEvent::AbilityUnlocked(Ability::LongerPower)));
    }

    #[test]
    fn test_progress_is_persisted_and_reloaded() {
        let shared = SharedStore::default();
        {
            let mut p = Progression::load(Box::new(shared.clone()));
            let mut events = Vec::new();
            p.add_experience(450, "test", &mut events);
            p.check_achievements(
                &SessionStats {
                    items_collected: 1,
                    ..Default::default()
                },
                &mut events,
            );
        }
        let raw = shared.0.borrow();
        assert_eq!(raw.raw(XP_KEY), Some(&serde_json::json!(500)));
        assert_eq!(raw.raw(LEVEL_KEY), Some(&serde_json::json!(3)));
        assert_eq!(
            raw.raw(ABILITIES_KEY),
            Some(&serde_json::json!(["longer_power", "fast_start"]))
        );
        assert_eq!(raw.raw(ACHIEVEMENTS_KEY), Some(&serde_json::json!(["first_steps"])));
        drop(raw);

        let reloaded = Progression::load(Box::new(shared));
        assert_eq!(reloaded.level(), 3);
        assert_eq!(reloaded.total_xp(), 500);
        assert!(reloaded.has_achievement(AchievementId::FirstSteps));
    }

    #[test]
    fn test_level_progress_display_numbers() {
        let mut p = fresh();
        let mut events = Vec::new();
        p.add_experience(150, "test", &mut events);
        // Level 2 spans 100..400
        assert_eq!(p.level_progress(), (50, 300, 250));
    }

    proptest! {
        #[test]
        fn prop_level_is_monotonic(a in 0u64..10_000_000, b in 0u64..10_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(level_for_xp(lo) <= level_for_xp(hi));
        }

        #[test]
        fn prop_level_threshold_matches_curve(level in 1u32..200) {
            prop_assert_eq!(level_for_xp(xp_for_level(level)), level);
            if level > 1 {
                prop_assert_eq!(level_for_xp(xp_for_level(level) - 1), level - 1);
            }
        }
    }
}
