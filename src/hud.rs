//! Textual HUD
//!
//! `Lv.N Score S Treasures T Lives L XP: a/b (+c)` followed by whatever is
//! currently running: power, effects, synergies and pickup tallies.

use std::fmt::Write;

use crate::sim::{GamePhase, GameState};

/// One-line summary of the session
pub fn summary(state: &GameState) -> String {
    let (into, span, needed) = state.progression.level_progress();
    let mut line = format!(
        "Lv.{} Score {} Treasures {} Lives {} XP: {}/{} (+{})",
        state.progression.level(),
        state.score,
        state.treasure_score,
        state.player.lives,
        into,
        span,
        needed
    );

    if state.power {
        let _ = write!(line, " | POWER {:.1}s", state.power_ms / 1000.0);
    }
    if !state.inventory.is_empty() {
        let _ = write!(line, " | Items {}", state.inventory.len());
    }
    for (kind, effect) in state.effects.iter() {
        let left = (effect.expires_at_ms - state.time_ms).max(0.0) / 1000.0;
        let _ = write!(line, " | {} {:.0}s", kind.label(), left.ceil());
    }
    for (id, expires_at) in state.synergies.iter() {
        let left = (expires_at - state.time_ms).max(0.0) / 1000.0;
        let _ = write!(line, " | {} {:.0}s", id.def().name, left.ceil());
    }
    let [common, uncommon, rare, legendary] = state.stats.rarity_counts;
    if common + uncommon + rare + legendary > 0 {
        let _ = write!(line, " | C{common} U{uncommon} R{rare} L{legendary}");
    }
    match state.phase {
        GamePhase::Dying { .. } => line.push_str(" | CAUGHT"),
        GamePhase::GameOver => line.push_str(" | GAME OVER"),
        GamePhase::Playing => {}
    }
    line
}
