//! Session controller
//!
//! Owns the `GameState` and everything around it: settings, sound, the idle
//! toggle. Hosts call `update(dt)` then `draw(timestamp)` once per frame.

use crate::audio::{SoundEffect, SoundSink};
use crate::input::{InputSource, poll_tick_input};
use crate::persistence::KeyValueStore;
use crate::settings::Settings;
use crate::sim::{GameEvent, GameState, SimConfig, tick};

/// Something that can show the game. Receives a read-only snapshot.
pub trait Renderer {
    fn render(&mut self, state: &GameState, timestamp: f64);
}

/// Renderer stand-in: keeps the HUD line and logs it when it changes
#[derive(Debug, Default)]
pub struct TextRenderer {
    last: String,
    frames: u64,
}

impl TextRenderer {
    pub fn last_line(&self) -> &str {
        &self.last
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for TextRenderer {
    fn render(&mut self, state: &GameState, timestamp: f64) {
        self.frames += 1;
        if state.hud != self.last {
            log::trace!("[{:>8.0}] {}", timestamp, state.hud);
            self.last.clone_from(&state.hud);
        }
    }
}

/// Runtime knobs for the sim from the user's settings
pub fn sim_config(settings: &Settings) -> SimConfig {
    SimConfig {
        max_particles: settings.max_particles(),
        zone_decorations: settings.quality.zone_decorations(),
    }
}

pub struct Session {
    state: GameState,
    settings: Settings,
    sound: Box<dyn SoundSink>,
    idle_mode: bool,
}

impl Session {
    /// Load settings and progression from `store` and start a game
    pub fn new(seed: u64, store: Box<dyn KeyValueStore>, sound: Box<dyn SoundSink>) -> Self {
        let settings = Settings::load(store.as_ref());
        let state = GameState::new(seed, store, sim_config(&settings));
        log::info!(
            "Session started (quality {}, volume {:.2})",
            settings.quality.as_str(),
            settings.effective_volume()
        );
        Self {
            state,
            settings,
            sound,
            idle_mode: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The loop keeps running until the game is over
    pub fn is_running(&self) -> bool {
        !self.state.is_game_over()
    }

    pub fn idle_mode(&self) -> bool {
        self.idle_mode
    }

    pub fn set_idle_mode(&mut self, idle: bool) {
        if idle != self.idle_mode {
            log::info!("Idle mode: {}", idle);
        }
        self.idle_mode = idle;
    }

    /// Replace the settings, persist them and push them into the sim
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.settings.save(self.state.progression.store_mut());
        self.state.config = sim_config(&self.settings);
        self.state.particles.set_cap(self.state.config.max_particles);
    }

    /// Fit the camera to the host's drawing area, in CSS pixels
    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.camera.set_viewport(width, height);
        log::debug!("Viewport {}x{}", width, height);
    }

    /// New run with a fresh seed; progression carries over
    pub fn restart(&mut self, seed: u64) {
        self.state.config = sim_config(&self.settings);
        self.state.restart(seed);
        log::info!("Game restarted with seed: {}", seed);
    }

    /// Advance one frame
    pub fn update(&mut self, dt_ms: f32, input: &mut dyn InputSource) {
        if !self.is_running() {
            return;
        }
        let tick_input = poll_tick_input(input, self.idle_mode);
        tick(&mut self.state, &tick_input, dt_ms);
        if self.settings.reduced_motion {
            self.state.camera.snap_zoom();
        }

        let volume = self.settings.effective_volume();
        for event in self.state.drain_events() {
            if let Some(effect) = SoundEffect::from_event(&event) {
                self.sound.play(effect, volume);
            }
            if let GameEvent::AchievementUnlocked(id) = event {
                log::info!("Achievement unlocked: {:?}", id);
            }
        }
    }

    pub fn draw(&self, renderer: &mut dyn Renderer, timestamp: f64) {
        renderer.render(&self.state, timestamp);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::input::{Action, ActionState};
    use crate::persistence::MemoryStore;
    use crate::settings::QualityPreset;

    /// Records what would have played
    #[derive(Default, Clone)]
    struct Recorder(Rc<RefCell<Vec<(SoundEffect, f32)>>>);

    impl SoundSink for Recorder {
        fn play(&mut self, effect: SoundEffect, volume: f32) {
            self.0.borrow_mut().push((effect, volume));
        }
    }

    fn session(seed: u64) -> (Session, Recorder) {
        let recorder = Recorder::default();
        let session = Session::new(seed, Box::new(MemoryStore::new()), Box::new(recorder.clone()));
        (session, recorder)
    }

    #[test]
    fn test_update_plays_sounds_for_events() {
        let (mut session, recorder) = session(81);
        let mut input = ActionState::default();
        session.set_idle_mode(true);
        for _ in 0..120 {
            session.update(16.0, &mut input);
        }
        let played = recorder.0.borrow();
        assert!(played.iter().any(|(e, _)| *e == SoundEffect::Chomp));
        assert!(played.iter().all(|(_, v)| *v > 0.0));
        assert!(session.state().events.is_empty());
    }

    #[test]
    fn test_settings_flow_into_sim() {
        let (mut session, _) = session(82);
        let settings = Settings::from_preset(QualityPreset::Low);
        session.apply_settings(settings);
        assert_eq!(session.state().config.max_particles, 0);
        assert_eq!(session.state().particles.cap(), 0);
        // Persisted through the shared store
        let reloaded = Settings::load(session.state().progression.store());
        assert_eq!(reloaded.quality, QualityPreset::Low);
    }

    #[test]
    fn test_restart_keeps_progression() {
        let (mut session, _) = session(83);
        session.state_mut().grant_xp(500, "test");
        session.state_mut().score = 1234;
        session.restart(84);
        assert_eq!(session.state().seed, 84);
        assert_eq!(session.state().score, 0);
        assert_eq!(session.state().progression.level(), 3);
    }

    #[test]
    fn test_resize_survives_restart() {
        let (mut session, _) = session(86);
        session.resize(1280.0, 720.0);
        assert_eq!(session.state().camera.viewport(), glam::Vec2::new(1280.0, 720.0));
        session.restart(87);
        assert_eq!(session.state().camera.viewport(), glam::Vec2::new(1280.0, 720.0));
        // A zero-sized window still leaves a usable view
        session.resize(0.0, 0.0);
        assert_eq!(session.state().camera.viewport(), glam::Vec2::ONE);
    }

    #[test]
    fn test_text_renderer_tracks_hud() {
        let (mut session, _) = session(85);
        let mut input = ActionState::default();
        input.press(Action::Left);
        session.update(16.0, &mut input);
        let mut renderer = TextRenderer::default();
        session.draw(&mut renderer, 16.0);
        assert_eq!(renderer.frames(), 1);
        assert!(renderer.last_line().starts_with("Lv.1"));
    }

    #[test]
    fn test_stops_after_game_over() {
        let (mut session, _) = session(86);
        session.state_mut().player.lives = 0;
        session.state_mut().finish_death();
        assert!(!session.is_running());
        let time = session.state().time_ms;
        session.update(16.0, &mut ActionState::default());
        assert_eq!(session.state().time_ms, time);
    }
}
