//! Camera and zoom
//!
//! Normal zoom follows the player with roughly fifteen cells across the short
//! side of the viewport. Zoomed-out mode shows the whole world when it fits
//! (centered) and otherwise drifts slowly toward the player.

use glam::Vec2;

use crate::consts::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Top-left corner of the view in pixels
    pub offset: Vec2,
    /// Current cell size in pixels
    pub cell_px: f32,
    target_cell_px: f32,
    viewport: Vec2,
    zoomed_out: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        let mut camera = Self {
            offset: Vec2::ZERO,
            cell_px: 0.0,
            target_cell_px: 0.0,
            viewport: Vec2::new(width, height),
            zoomed_out: false,
        };
        camera.target_cell_px = camera.normal_cell_px();
        camera.cell_px = camera.target_cell_px;
        camera
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn is_zoomed_out(&self) -> bool {
        self.zoomed_out
    }

    /// Cell size for normal play
    pub fn normal_cell_px(&self) -> f32 {
        (self.viewport.x.min(self.viewport.y) / NORMAL_VIEW_CELLS)
            .floor()
            .max(1.0)
    }

    /// Cell size showing (most of) the whole world
    pub fn zoomed_out_cell_px(&self) -> f32 {
        let fit = (self.viewport.x / WORLD_WIDTH as f32).min(self.viewport.y / WORLD_HEIGHT as f32);
        (fit * ZOOMED_OUT_FILL).max(MIN_ZOOMED_OUT_CELL_PX)
    }

    fn retarget(&mut self) {
        self.target_cell_px = if self.zoomed_out {
            self.zoomed_out_cell_px()
        } else {
            self.normal_cell_px()
        };
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
        self.retarget();
    }

    pub fn set_zoomed_out(&mut self, zoomed_out: bool) {
        if self.zoomed_out != zoomed_out {
            log::debug!("Zoom {}", if zoomed_out { "out" } else { "in" });
        }
        self.zoomed_out = zoomed_out;
        self.retarget();
    }

    /// Ease the cell size toward its target, snapping when close
    pub fn ease_zoom(&mut self) {
        let diff = self.target_cell_px - self.cell_px;
        if diff.abs() < ZOOM_SNAP {
            self.cell_px = self.target_cell_px;
        } else {
            self.cell_px += diff * ZOOM_EASE;
        }
    }

    /// Jump straight to the target zoom
    pub fn snap_zoom(&mut self) {
        self.cell_px = self.target_cell_px;
    }

    /// Recompute the view offset for a player at `player` (cell units)
    pub fn follow(&mut self, player: Vec2) {
        let center = (player + Vec2::splat(0.5)) * self.cell_px;
        let target = center - self.viewport * 0.5;

        if !self.zoomed_out {
            self.offset = target;
            return;
        }

        let world_px = Vec2::new(WORLD_WIDTH as f32, WORLD_HEIGHT as f32) * self.cell_px;
        self.offset.x = if world_px.x <= self.viewport.x {
            (world_px.x - self.viewport.x) * 0.5
        } else {
            self.offset.x + (target.x - self.offset.x) * ZOOMED_OUT_CAMERA_EASE
        };
        self.offset.y = if world_px.y <= self.viewport.y {
            (world_px.y - self.viewport.y) * 0.5
        } else {
            self.offset.y + (target.y - self.offset.y) * ZOOMED_OUT_CAMERA_EASE
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_cell_size() {
        let camera = Camera::new(800.0, 600.0);
        assert_eq!(camera.cell_px, 40.0);
    }

    #[test]
    fn test_zoom_eases_and_snaps() {
        let mut camera = Camera::new(800.0, 600.0);
        camera.set_zoomed_out(true);
        let target = camera.zoomed_out_cell_px();
        assert_eq!(target, MIN_ZOOMED_OUT_CELL_PX);

        camera.ease_zoom();
        // 40 + (4 - 40) * 0.6
        assert!((camera.cell_px - 18.4).abs() < 1e-3);
        for _ in 0..20 {
            camera.ease_zoom();
        }
        assert_eq!(camera.cell_px, target);
    }

    #[test]
    fn test_normal_mode_centers_player() {
        let mut camera = Camera::new(800.0, 600.0);
        camera.follow(Vec2::new(9.0, 15.0));
        assert_eq!(camera.offset, Vec2::new(9.5 * 40.0 - 400.0, 15.5 * 40.0 - 300.0));
    }

    #[test]
    fn test_small_world_is_centered_when_zoomed_out() {
        let mut camera = Camera::new(2000.0, 2000.0);
        camera.set_zoomed_out(true);
        camera.snap_zoom();
        // 2000 / 133 * 0.7 ~ 10.5 px, world ~1400 px < viewport
        camera.follow(Vec2::new(100.0, 3.0));
        let world_px = WORLD_WIDTH as f32 * camera.cell_px;
        assert!((camera.offset.x - (world_px - 2000.0) * 0.5).abs() < 1e-3);
        assert!(camera.offset.x < 0.0);
    }

    #[test]
    fn test_large_world_pans_slowly_when_zoomed_out() {
        let mut camera = Camera::new(400.0, 300.0);
        camera.set_zoomed_out(true);
        camera.snap_zoom();
        camera.offset = Vec2::ZERO;
        camera.follow(Vec2::new(100.0, 100.0));
        let target = (Vec2::splat(100.5) * camera.cell_px) - Vec2::new(200.0, 150.0);
        assert!((camera.offset.x - target.x * ZOOMED_OUT_CAMERA_EASE).abs() < 1e-3);
    }
}
