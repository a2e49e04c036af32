//! Steering helpers on top of `glam::Vec2`
//!
//! glam covers add/sub/scale/normalize; flocking also needs magnitude
//! limiting and rescaling with zero-safe behavior.

use glam::Vec2;
use rand::Rng;

pub trait Steer {
    /// Clamp the length to `max`, keeping direction
    fn limit(self, max: f32) -> Self;
    /// Rescale to length `mag` (zero stays zero)
    fn with_mag(self, mag: f32) -> Self;
}

impl Steer for Vec2 {
    #[inline]
    fn limit(self, max: f32) -> Self {
        if self.length_squared() > max * max {
            self.normalize_or_zero() * max
        } else {
            self
        }
    }

    #[inline]
    fn with_mag(self, mag: f32) -> Self {
        self.normalize_or_zero() * mag
    }
}

/// Unit vector pointing in a random direction
pub fn random_unit<R: Rng>(rng: &mut R) -> Vec2 {
    let angle = rng.random::<f32>() * std::f32::consts::TAU;
    Vec2::new(angle.cos(), angle.sin())
}
