//! Particle bursts
//!
//! Purely visual. Particles move in straight lines under a little gravity and
//! fade linearly; the oldest are dropped when the budget is full.

use glam::Vec2;
use rand::Rng;

use super::vector::random_unit;

/// Gravity in cells per frame squared
const GRAVITY: f32 = 0.002_5;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32,
    /// 1 = fresh, 0 = gone
    pub life: f32,
    /// Life lost per frame
    pub decay: f32,
    pub size: f32,
}

/// Shape of a burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst<'a> {
    pub count: usize,
    /// Initial speed range (cells per frame)
    pub speed: (f32, f32),
    pub colors: &'a [u32],
    pub decay: f32,
    pub size: (f32, f32),
}

impl<'a> Burst<'a> {
    /// Small pickup sparkle
    pub fn sparkle(colors: &'a [u32]) -> Self {
        Self {
            count: 12,
            speed: (0.025, 0.075),
            colors,
            decay: 0.02,
            size: (0.05, 0.1),
        }
    }

    /// Big celebration (level up, synergy, achievement)
    pub fn celebration(colors: &'a [u32]) -> Self {
        Self {
            count: 40,
            speed: (0.05, 0.125),
            colors,
            decay: 0.012,
            size: (0.075, 0.15),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    cap: usize,
}

impl ParticleSystem {
    pub fn new(cap: usize) -> Self {
        Self {
            particles: Vec::with_capacity(cap.min(1024)),
            cap,
        }
    }

    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap;
        if self.particles.len() > cap {
            let excess = self.particles.len() - cap;
            self.particles.drain(..excess);
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Emit a burst centred on `center`
    pub fn burst<R: Rng>(&mut self, center: Vec2, burst: Burst<'_>, rng: &mut R) {
        if self.cap == 0 || burst.colors.is_empty() {
            return;
        }
        for _ in 0..burst.count {
            if self.particles.len() >= self.cap {
                // Remove oldest particles to make room
                self.particles.remove(0);
            }
            let speed = rng.random_range(burst.speed.0..=burst.speed.1);
            let color = burst.colors[rng.random_range(0..burst.colors.len())];
            self.particles.push(Particle {
                pos: center,
                vel: random_unit(rng) * speed,
                color,
                life: 1.0,
                decay: burst.decay,
                size: rng.random_range(burst.size.0..=burst.size.1),
            });
        }
    }

    /// Advance by `frames` nominal frames
    pub fn update(&mut self, frames: f32) {
        for p in self.particles.iter_mut() {
            p.pos += p.vel * frames;
            p.vel.y += GRAVITY * frames;
            p.life -= p.decay * frames;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
