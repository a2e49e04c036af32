//! Timed effects
//!
//! Effects live in a registry keyed by kind with a single expiry time each,
//! evaluated against the simulation clock once per tick. Re-applying a kind
//! replaces its expiry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    GhostImmunity,
    SpeedBoost,
    WallPhase,
    ScoreMultiplier,
    GhostFear,
    RevealMap,
    MiniMap,
}

impl EffectKind {
    pub fn label(&self) -> &'static str {
        match self {
            EffectKind::GhostImmunity => "ghost immunity",
            EffectKind::SpeedBoost => "speed boost",
            EffectKind::WallPhase => "wall phase",
            EffectKind::ScoreMultiplier => "score x2",
            EffectKind::GhostFear => "ghost fear",
            EffectKind::RevealMap => "reveal map",
            EffectKind::MiniMap => "mini map",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub expires_at_ms: f64,
    /// What applied it (item or ability name), for the HUD
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectRegistry {
    active: BTreeMap<EffectKind, ActiveEffect>,
}

impl EffectRegistry {
    /// Start `kind` for `duration_ms`, replacing any running instance
    pub fn apply(&mut self, kind: EffectKind, now_ms: f64, duration_ms: f64, source: &str) {
        self.active.insert(
            kind,
            ActiveEffect {
                expires_at_ms: now_ms + duration_ms,
                source: source.to_string(),
            },
        );
    }

    /// Drop every effect whose expiry has passed, returning what ended
    pub fn expire(&mut self, now_ms: f64) -> Vec<EffectKind> {
        let ended: Vec<EffectKind> = self
            .active
            .iter()
            .filter(|(_, e)| e.expires_at_ms <= now_ms)
            .map(|(k, _)| *k)
            .collect();
        for kind in &ended {
            self.active.remove(kind);
        }
        ended
    }

    #[inline]
    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.active.contains_key(&kind)
    }

    pub fn remaining_ms(&self, kind: EffectKind, now_ms: f64) -> Option<f64> {
        self.active
            .get(&kind)
            .map(|e| (e.expires_at_ms - now_ms).max(0.0))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EffectKind, &ActiveEffect)> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

/// Effective player modifiers, rebuilt every tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modifiers {
    pub speed_multiplier: f32,
    pub score_multiplier: u64,
    pub ghost_immune: bool,
    pub phase_walls: bool,
    pub ghosts_wander: bool,
    pub reveal_map: bool,
    pub mini_map: bool,
    /// Literature pickups worth 1.5x
    pub knowledge_boost: bool,
    /// Software and tool pickups worth 1.3x
    pub tech_bonus: bool,
    pub treasure_magnet: bool,
    pub master_key: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            score_multiplier: 1,
            ghost_immune: false,
            phase_walls: false,
            ghosts_wander: false,
            reveal_map: false,
            mini_map: false,
            knowledge_boost: false,
            tech_bonus: false,
            treasure_magnet: false,
            master_key: false,
        }
    }
}

/// Speed multiplier while a speed boost runs
pub const SPEED_BOOST: f32 = 1.0 / 0.9;

impl Modifiers {
    /// Modifiers from item effects alone
    pub fn from_effects(effects: &EffectRegistry) -> Self {
        let mut m = Self::default();
        for kind in effects.active.keys() {
            match kind {
                EffectKind::GhostImmunity => m.ghost_immune = true,
                EffectKind::SpeedBoost => m.speed_multiplier = SPEED_BOOST,
                EffectKind::WallPhase => m.phase_walls = true,
                EffectKind::ScoreMultiplier => m.score_multiplier = m.score_multiplier.max(2),
                EffectKind::GhostFear => m.ghosts_wander = true,
                EffectKind::RevealMap => m.reveal_map = true,
                EffectKind::MiniMap => m.mini_map = true,
            }
        }
        m
    }
}
