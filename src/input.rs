//! Abstract input actions
//!
//! The game polls actions, never keys. Hosts translate their own events
//! (keyboard, touch buttons, gamepads) into presses and releases.

use crate::sim::{Direction, TickInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    /// Jump / teleport
    Teleport,
    Zoom,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Left,
        Action::Right,
        Action::Up,
        Action::Down,
        Action::Teleport,
        Action::Zoom,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            Action::Left => Some(Direction::Left),
            Action::Right => Some(Direction::Right),
            Action::Up => Some(Direction::Up),
            Action::Down => Some(Direction::Down),
            Action::Teleport | Action::Zoom => None,
        }
    }

    /// Default keyboard binding (`KeyboardEvent.key` names)
    pub fn for_key(key: &str) -> Option<Action> {
        match key {
            "ArrowLeft" | "a" | "A" => Some(Action::Left),
            "ArrowRight" | "d" | "D" => Some(Action::Right),
            "ArrowUp" | "w" | "W" => Some(Action::Up),
            "ArrowDown" | "s" | "S" => Some(Action::Down),
            " " | "j" | "J" => Some(Action::Teleport),
            "z" | "Z" => Some(Action::Zoom),
            _ => None,
        }
    }
}

/// Polled input
pub trait InputSource {
    /// Held right now
    fn is_action_active(&self, action: Action) -> bool;
    /// Became active since the last call for this action (consumes the edge)
    fn was_action_just_activated(&mut self, action: Action) -> bool;
}

/// Held/edge state fed by host events
#[derive(Debug, Clone, Default)]
pub struct ActionState {
    held: [bool; 6],
    edge: [bool; 6],
}

impl ActionState {
    pub fn press(&mut self, action: Action) {
        let i = action.index();
        if !self.held[i] {
            self.edge[i] = true;
        }
        self.held[i] = true;
    }

    pub fn release(&mut self, action: Action) {
        self.held[action.index()] = false;
    }

    /// Drop everything, e.g. when the window loses focus
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl InputSource for ActionState {
    fn is_action_active(&self, action: Action) -> bool {
        self.held[action.index()]
    }

    fn was_action_just_activated(&mut self, action: Action) -> bool {
        std::mem::take(&mut self.edge[action.index()])
    }
}

/// Build this frame's tick input from polled actions.
/// A fresh press wins over a held direction.
pub fn poll_tick_input(source: &mut dyn InputSource, idle_mode: bool) -> TickInput {
    let directions = [Action::Up, Action::Down, Action::Left, Action::Right];
    let pressed = directions
        .iter()
        .copied()
        .filter(|&a| source.was_action_just_activated(a))
        .last();
    let held = directions
        .iter()
        .copied()
        .find(|&a| source.is_action_active(a));

    TickInput {
        direction: pressed.or(held).and_then(Action::direction),
        teleport: source.was_action_just_activated(Action::Teleport),
        toggle_zoom: source.was_action_just_activated(Action::Zoom),
        idle_mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_is_consumed_once() {
        let mut input = ActionState::default();
        input.press(Action::Teleport);
        assert!(input.is_action_active(Action::Teleport));
        assert!(input.was_action_just_activated(Action::Teleport));
        assert!(!input.was_action_just_activated(Action::Teleport));
        // Key repeat while held is not a new edge
        input.press(Action::Teleport);
        assert!(!input.was_action_just_activated(Action::Teleport));
        input.release(Action::Teleport);
        input.press(Action::Teleport);
        assert!(input.was_action_just_activated(Action::Teleport));
    }

    #[test]
    fn test_poll_prefers_fresh_press() {
        let mut input = ActionState::default();
        input.press(Action::Up);
        let _ = poll_tick_input(&mut input, false);
        input.press(Action::Right);
        let tick = poll_tick_input(&mut input, false);
        assert_eq!(tick.direction, Some(Direction::Right));
        // Next frame both are merely held
        let tick = poll_tick_input(&mut input, false);
        assert_eq!(tick.direction, Some(Direction::Up));
    }

    #[test]
    fn test_poll_edges() {
        let mut input = ActionState::default();
        input.press(Action::Zoom);
        input.press(Action::Teleport);
        let tick = poll_tick_input(&mut input, true);
        assert!(tick.toggle_zoom && tick.teleport && tick.idle_mode);
        assert_eq!(tick.direction, None);
        let tick = poll_tick_input(&mut input, true);
        assert!(!tick.toggle_zoom && !tick.teleport);
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(Action::for_key("ArrowLeft"), Some(Action::Left));
        assert_eq!(Action::for_key("W"), Some(Action::Up));
        assert_eq!(Action::for_key(" "), Some(Action::Teleport));
        assert_eq!(Action::for_key("q"), None);
        assert_eq!(Action::Zoom.direction(), None);
    }
}
