//! Sound effects
//!
//! Procedurally generated - no external files needed! Each effect is a short
//! list of oscillator tones. The browser build plays them through Web Audio;
//! native builds log them.

use crate::sim::{Category, GameEvent, Rarity};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Dot eaten
    Chomp,
    /// Asteroid smashed
    Crunch,
    PowerPellet,
    EatGhost,
    Death,
    Fruit,
    CollectBook,
    CollectSoftware,
    CollectKey,
    CollectTreasure,
    CollectRare,
    CollectLegendary,
    ZoneTransition,
    UnlockArea,
    SynergyActivated,
    LevelUp,
    AchievementUnlocked,
    AppleFrenzy,
    Teleport,
    GameOver,
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One oscillator with an exponential decay envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub wave: Wave,
    /// Start frequency (Hz)
    pub freq: f32,
    /// Exponential sweep target, if any
    pub sweep_to: Option<f32>,
    /// Peak gain before volume scaling
    pub gain: f32,
    /// Delay from the trigger (seconds)
    pub delay: f64,
    /// Length (seconds)
    pub duration: f64,
}

const fn tone(wave: Wave, freq: f32, gain: f32, duration: f64) -> Tone {
    Tone {
        wave,
        freq,
        sweep_to: None,
        gain,
        delay: 0.0,
        duration,
    }
}

impl Tone {
    const fn sweep(mut self, to: f32) -> Self {
        self.sweep_to = Some(to);
        self
    }

    const fn after(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }
}

impl SoundEffect {
    /// Sound for a gameplay event, if it has one
    pub fn from_event(event: &GameEvent) -> Option<Self> {
        Some(match event {
            GameEvent::DotEaten => SoundEffect::Chomp,
            GameEvent::AsteroidSmashed => SoundEffect::Crunch,
            GameEvent::PowerPelletEaten => SoundEffect::PowerPellet,
            GameEvent::GhostEaten => SoundEffect::EatGhost,
            GameEvent::PlayerDied { .. } => SoundEffect::Death,
            GameEvent::GameOver { .. } => SoundEffect::GameOver,
            GameEvent::FruitEaten(_) => SoundEffect::Fruit,
            GameEvent::ItemCollected { rarity, category, .. } => match (rarity, category) {
                (Rarity::Legendary, _) => SoundEffect::CollectLegendary,
                (Rarity::Rare, _) => SoundEffect::CollectRare,
                (_, Category::Literature) => SoundEffect::CollectBook,
                (_, Category::Software) => SoundEffect::CollectSoftware,
                (_, Category::Key) => SoundEffect::CollectKey,
                (_, Category::Treasure | Category::Tool) => SoundEffect::CollectTreasure,
            },
            GameEvent::ZoneEntered(_) => SoundEffect::ZoneTransition,
            GameEvent::DoorUnlocked { .. } => SoundEffect::UnlockArea,
            GameEvent::SynergyActivated(_) => SoundEffect::SynergyActivated,
            GameEvent::LevelUp(_) => SoundEffect::LevelUp,
            GameEvent::AchievementUnlocked(_) => SoundEffect::AchievementUnlocked,
            GameEvent::FrenzyStarted => SoundEffect::AppleFrenzy,
            GameEvent::Teleported => SoundEffect::Teleport,
            _ => return None,
        })
    }

    /// The tones making up this effect
    pub fn tones(&self) -> Vec<Tone> {
        use Wave::*;
        match self {
            SoundEffect::Chomp => vec![tone(Square, 300.0, 0.05, 0.08)],
            SoundEffect::Crunch => vec![tone(Square, 200.0, 0.05, 0.08)],
            SoundEffect::PowerPellet => vec![tone(Sawtooth, 200.0, 0.15, 0.4).sweep(400.0)],
            SoundEffect::EatGhost => vec![tone(Sawtooth, 100.0, 0.2, 0.5).sweep(50.0)],
            SoundEffect::Death => vec![tone(Sawtooth, 180.0, 0.08, 0.8).sweep(40.0)],
            SoundEffect::Fruit => vec![tone(Sine, 880.0, 0.2, 0.25)],
            SoundEffect::CollectBook => vec![tone(Triangle, 600.0, 0.15, 0.3).sweep(1000.0)],
            SoundEffect::CollectSoftware => (0..3)
                .map(|i| tone(Square, 800.0 + i as f32 * 200.0, 0.1, 0.1).after(i as f64 * 0.08))
                .collect(),
            SoundEffect::CollectKey => vec![tone(Sawtooth, 400.0, 0.2, 0.4).sweep(1200.0)],
            SoundEffect::CollectTreasure => vec![
                tone(Sine, 523.0, 0.2, 0.1),
                tone(Sine, 659.0, 0.2, 0.1).after(0.1),
                tone(Sine, 784.0, 0.2, 0.2).after(0.2),
            ],
            SoundEffect::CollectRare => [523.0, 659.0, 784.0, 1047.0]
                .iter()
                .enumerate()
                .map(|(i, &f)| tone(Triangle, f, 0.15, 0.6).after(i as f64 * 0.1))
                .collect(),
            SoundEffect::CollectLegendary => {
                let mut tones: Vec<Tone> = (0..8)
                    .map(|i| tone(Sine, 1000.0 + i as f32 * 200.0, 0.1, 0.8).after(i as f64 * 0.05))
                    .collect();
                tones.push(tone(Triangle, 1568.0, 0.2, 1.2).after(0.2));
                tones
            }
            SoundEffect::ZoneTransition => vec![
                tone(Sine, 300.0, 0.12, 0.15).sweep(600.0),
                tone(Sine, 600.0, 0.12, 0.15).sweep(200.0).after(0.15),
                tone(Sine, 200.0, 0.12, 0.3).sweep(800.0).after(0.3),
            ],
            SoundEffect::UnlockArea => {
                let mut tones = vec![tone(Triangle, 400.0, 0.15, 0.8).sweep(1200.0)];
                tones.extend((0..3).map(|i| tone(Sine, 1500.0 + i as f32 * 300.0, 0.08, 0.4).after(0.3 + i as f64 * 0.1)));
                tones
            }
            SoundEffect::SynergyActivated => {
                let mut tones: Vec<Tone> = [200.0, 300.0, 400.0]
                    .iter()
                    .enumerate()
                    .map(|(i, &f)| tone(Sawtooth, f, 0.1, 0.6).sweep(f * 2.0).after(i as f64 * 0.1))
                    .collect();
                tones.push(tone(Triangle, 800.0, 0.12, 1.2).sweep(1600.0).after(0.3));
                tones
            }
            SoundEffect::LevelUp => [523.0, 659.0, 784.0, 1047.0, 1319.0]
                .iter()
                .enumerate()
                .map(|(i, &f)| tone(Triangle, f, 0.12, 0.8).after(i as f64 * 0.12))
                .collect(),
            SoundEffect::AchievementUnlocked => vec![
                tone(Sine, 800.0, 0.15, 0.1),
                tone(Sine, 1200.0, 0.15, 0.1).after(0.1),
                tone(Sine, 1600.0, 0.15, 0.3).after(0.2),
                tone(Triangle, 2400.0, 0.1, 0.8).after(0.3),
            ],
            SoundEffect::AppleFrenzy => vec![
                tone(Sawtooth, 100.0, 0.2, 1.5).sweep(50.0),
                tone(Square, 40.0, 0.15, 2.0).after(0.2),
                tone(Triangle, 2000.0, 0.1, 0.5).sweep(3000.0).after(0.5),
            ],
            SoundEffect::Teleport => vec![tone(Sine, 1200.0, 0.12, 0.3).sweep(300.0)],
            SoundEffect::GameOver => vec![
                tone(Triangle, 392.0, 0.15, 0.3),
                tone(Triangle, 330.0, 0.15, 0.3).after(0.3),
                tone(Triangle, 262.0, 0.15, 0.6).after(0.6),
            ],
        }
    }
}

/// Somewhere sounds go. Fire-and-forget: implementations swallow failures.
pub trait SoundSink {
    fn play(&mut self, effect: SoundEffect, volume: f32);
}

/// Native sink: logs what would have played
#[derive(Debug, Default)]
pub struct LogSink {
    played: usize,
}

impl LogSink {
    pub fn played(&self) -> usize {
        self.played
    }
}

impl SoundSink for LogSink {
    fn play(&mut self, effect: SoundEffect, volume: f32) {
        if volume <= 0.0 {
            return;
        }
        self.played += 1;
        log::trace!("sound {:?} at {:.2}", effect, volume);
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{SoundEffect, SoundSink, Tone, Wave};

    /// Web Audio playback
    pub struct AudioManager {
        ctx: Option<AudioContext>,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(ctx: &AudioContext, freq: f32, wave: Wave) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(match wave {
                Wave::Sine => OscillatorType::Sine,
                Wave::Square => OscillatorType::Square,
                Wave::Sawtooth => OscillatorType::Sawtooth,
                Wave::Triangle => OscillatorType::Triangle,
            });
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn schedule(ctx: &AudioContext, tone: &Tone, vol: f32) {
            let Some((osc, gain)) = Self::create_osc(ctx, tone.freq, tone.wave) else {
                return;
            };
            let t = ctx.current_time() + tone.delay;
            let end = t + tone.duration;

            gain.gain().set_value_at_time(tone.gain * vol, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.001, end).ok();
            osc.frequency().set_value_at_time(tone.freq, t).ok();
            if let Some(to) = tone.sweep_to {
                osc.frequency().exponential_ramp_to_value_at_time(to, end).ok();
            }

            osc.start_with_when(t).ok();
            osc.stop_with_when(end).ok();
        }
    }

    impl SoundSink for AudioManager {
        fn play(&mut self, effect: SoundEffect, volume: f32) {
            if volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
            for tone in effect.tones() {
                Self::schedule(ctx, &tone, volume);
            }
        }
    }
}
