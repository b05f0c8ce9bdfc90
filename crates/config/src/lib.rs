//! Shared configuration for Visage
//!
//! This crate provides the single source of truth for viewport dimensions,
//! the startup camera, and interaction tuning shared by the headless core
//! and the Bevy integration.

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Default viewport width in pixels
pub const DEFAULT_WIDTH: u32 = 1920;

/// Default viewport height in pixels
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Default radius of a handle marker in world units
pub const DEFAULT_MARKER_RADIUS: f32 = 0.01;

/// Display configuration for the viewport pointer events arrive in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct DisplayConfig {
    /// Viewport width in logical pixels
    pub width: u32,
    /// Viewport height in logical pixels
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl DisplayConfig {
    /// Create a new display config with the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Get width as f32 for calculations
    pub fn width_f32(&self) -> f32 {
        self.width as f32
    }

    /// Get height as f32 for calculations
    pub fn height_f32(&self) -> f32 {
        self.height as f32
    }

    /// Width over height, 1.0 for a degenerate viewport
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width_f32() / self.height_f32()
        }
    }
}

/// Perspective camera the face is viewed through at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Camera position in world space
    pub eye: [f32; 3],
    /// Point the camera looks at
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            eye: [0.0, 0.0, 2.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

/// Orientation of the plane a dragged point slides on.
///
/// The plane always passes through the point where the drag started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DragPlane {
    /// Perpendicular to the ray that started the drag
    #[default]
    ViewFacing,
    /// Perpendicular to the world Z axis
    WorldZ,
}

/// Tuning for pointer interaction and annotation handles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct InteractionConfig {
    /// Radius of the pickable marker drawn for each handle
    pub marker_radius: f32,
    /// Plane orientation used while dragging
    pub drag_plane: DragPlane,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            marker_radius: DEFAULT_MARKER_RADIUS,
            drag_plane: DragPlane::default(),
        }
    }
}
