use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Orthographic camera over a y-down world. `position` is the world point at
/// the centre of the viewport.
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: (viewport_width, viewport_height),
        }
    }

    fn half_extents(&self) -> Vec2 {
        Vec2::new(
            self.viewport.0 as f32 / (2.0 * self.zoom),
            self.viewport.1 as f32 / (2.0 * self.zoom),
        )
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let half = self.half_extents();
        // bottom/top swapped so +y points down the screen.
        let proj = Mat4::orthographic_rh(
            self.position.x - half.x,
            self.position.x + half.x,
            self.position.y + half.y,
            self.position.y - half.y,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }

    /// Physical window pixels to world pixels.
    pub fn screen_to_world(&self, screen_x: f32, screen_y: f32) -> Vec2 {
        let center = Vec2::new(self.viewport.0 as f32, self.viewport.1 as f32) * 0.5;
        self.position + (Vec2::new(screen_x, screen_y) - center) / self.zoom
    }

    /// World rectangle currently visible, as (top-left, bottom-right).
    pub fn visible_bounds(&self) -> (Vec2, Vec2) {
        let half = self.half_extents();
        (self.position - half, self.position + half)
    }

    /// Ease toward `target`; `rate` is the fraction of the gap closed per second.
    pub fn follow(&mut self, target: Vec2, rate: f32, dt: f32) {
        let t = (rate * dt).clamp(0.0, 1.0);
        self.position += (target - self.position) * t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_center_maps_to_camera_position() {
        let mut camera = Camera2D::new(800, 600);
        camera.position = Vec2::new(100.0, 50.0);
        camera.zoom = 2.0;
        assert_eq!(camera.screen_to_world(400.0, 300.0), Vec2::new(100.0, 50.0));
        assert_eq!(camera.screen_to_world(0.0, 0.0), Vec2::new(-100.0, -100.0));
    }

    #[test]
    fn uniform_maps_top_of_view_to_positive_ndc() {
        let camera = Camera2D::new(200, 100);
        let proj = Mat4::from_cols_array_2d(&camera.build_uniform().view_proj);
        let top = proj.project_point3(glam::Vec3::new(0.0, -50.0, 0.0));
        assert!((top.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn follow_moves_partially_toward_target() {
        let mut camera = Camera2D::new(100, 100);
        camera.follow(Vec2::new(10.0, 0.0), 6.0, 1.0 / 60.0);
        assert!((camera.position.x - 1.0).abs() < 1e-5);
        camera.follow(Vec2::new(10.0, 0.0), 100.0, 1.0);
        assert_eq!(camera.position.x, 10.0);
    }
}
