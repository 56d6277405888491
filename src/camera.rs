use glam::{Mat4, Vec3};

/// A perspective camera for 3D scenes.
///
/// Provides position, orientation, field of view and clip planes. The flight
/// driver repositions it every frame; the host only updates its aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub fov: f32, // radians
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            fov: 75f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Points the camera at `target`. A target at the camera position keeps
    /// the current orientation.
    pub fn look_at(&mut self, target: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        if forward != Vec3::ZERO {
            self.forward = forward;
        }
    }

    /// Updates the aspect ratio from a framebuffer size. Zero sizes are
    /// ignored, which happens while the window is minimized.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        // Looking straight along `up` would make the basis degenerate
        let up = if self.forward.cross(self.up).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            self.up
        };
        Mat4::look_to_rh(self.position, self.forward, up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_normalizes_forward() {
        let mut camera = Camera::new().at(Vec3::ZERO);
        camera.look_at(Vec3::new(3.0, 0.0, 4.0));
        assert!((camera.forward - Vec3::new(0.6, 0.0, 0.8)).length() < 1e-6);
    }

    #[test]
    fn look_at_self_keeps_orientation() {
        let mut camera = Camera::new().at(Vec3::ONE);
        camera.look_at(Vec3::ONE);
        assert_eq!(camera.forward, Vec3::NEG_Z);
    }

    #[test]
    fn zero_size_keeps_aspect() {
        let mut camera = Camera::new();
        camera.set_aspect(1280, 720);
        let aspect = camera.aspect;
        camera.set_aspect(0, 720);
        camera.set_aspect(1280, 0);
        assert_eq!(camera.aspect, aspect);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let mut camera = Camera::new().at(Vec3::new(1.0, 2.0, 3.0));
        camera.look_at(Vec3::new(4.0, -1.0, 0.0));
        let clip = camera.view_projection() * Vec3::new(4.0, -1.0, 0.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn clip_w_is_depth_along_forward() {
        let mut camera = Camera::new().at(Vec3::new(1.0, 0.5, -2.0));
        camera.look_at(Vec3::new(6.0, 0.5, -2.0));
        // Off axis, so Euclidean distance and view depth differ
        let point = Vec3::new(4.0, 2.0, 1.0);
        let clip = camera.view_projection() * point.extend(1.0);
        let depth = (point - camera.position).dot(camera.forward);
        assert!((clip.w - depth).abs() < 1e-4);
        assert!((clip.w - point.distance(camera.position)).abs() > 0.5);
    }

    #[test]
    fn vertical_forward_still_has_a_view() {
        let mut camera = Camera::new().at(Vec3::ZERO);
        camera.look_at(Vec3::new(0.0, 10.0, 0.0));
        assert!(camera.view_matrix().is_finite());
    }
}
