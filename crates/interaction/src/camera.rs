//! Screen to world ray construction.

use glam::{Mat4, Vec2, Vec3};
use picking::Ray;
use visage_config::{CameraConfig, DisplayConfig};

/// Builds world-space rays from normalized device coordinates.
///
/// NDC spans `[-1, 1]` on both axes with +Y up.
pub trait RayCaster {
    fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray>;
}

/// Pixel dimensions of the surface pointer events are reported in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Map a pixel position (origin top-left, +Y down) to NDC.
    ///
    /// Returns `None` for a degenerate viewport.
    pub fn to_ndc(&self, pixel: Vec2) -> Option<Vec2> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            pixel.x / self.width * 2.0 - 1.0,
            -(pixel.y / self.height) * 2.0 + 1.0,
        ))
    }
}

impl From<&DisplayConfig> for Viewport {
    fn from(config: &DisplayConfig) -> Self {
        Self::new(config.width_f32(), config.height_f32())
    }
}

/// Right-handed perspective camera looking from `eye` towards `target`
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    eye: Vec3,
    inverse_view_projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect_ratio: f32) -> Self {
        let eye = Vec3::from_array(config.eye);
        let view = Mat4::look_at_rh(eye, Vec3::from_array(config.target), Vec3::Y);
        let projection = Mat4::perspective_rh(
            config.fov_y_degrees.to_radians(),
            aspect_ratio,
            config.near,
            config.far,
        );

        Self {
            eye,
            inverse_view_projection: (projection * view).inverse(),
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }
}

impl RayCaster for PerspectiveCamera {
    fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
        // glam's perspective_rh maps depth to [0, 1]
        let near = self.inverse_view_projection.project_point3(ndc.extend(0.0));
        let far = self.inverse_view_projection.project_point3(ndc.extend(1.0));

        let direction = (far - near).normalize_or_zero();
        if direction == Vec3::ZERO || !direction.is_finite() {
            return None;
        }

        Some(Ray::new(self.eye, direction))
    }
}
