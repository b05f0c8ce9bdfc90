//! Orbit camera controller
//!
//! Controls:
//! - Left mouse drag on empty space: Orbit around target
//! - Right mouse drag: Pan
//! - Scroll wheel: Dolly (zoom)
//!
//! Navigation is suspended while a vertex or handle drag is active.

use bevy::input::mouse::{MouseButton, MouseMotion, MouseWheel};
use bevy::prelude::*;
use visage_config::CameraConfig;

use crate::FaceRigSet;

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Camera orbit controller state
#[derive(Component)]
pub struct OrbitCamera {
    /// Cleared by the interaction core while a drag is active
    pub enabled: bool,
    /// Point the camera orbits around
    pub target: Vec3,
    /// Distance from target
    pub distance: f32,
    /// Horizontal angle (yaw) in radians
    pub yaw: f32,
    /// Vertical angle (pitch) in radians
    pub pitch: f32,
    /// Orbit sensitivity (radians per pixel)
    pub orbit_sensitivity: f32,
    /// Pan sensitivity (units per pixel, scaled by distance)
    pub pan_sensitivity: f32,
    /// Zoom sensitivity (distance units per scroll line)
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl OrbitCamera {
    /// Orbit parameters reproducing the configured eye and target
    pub fn from_config(config: &CameraConfig) -> Self {
        let target = Vec3::from_array(config.target);
        let offset = Vec3::from_array(config.eye) - target;
        let distance = offset.length().max(0.01);

        Self {
            enabled: true,
            target,
            distance,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            orbit_sensitivity: 0.005,
            pan_sensitivity: 0.002,
            zoom_sensitivity: 1.0,
            min_distance: config.near * 2.0,
            max_distance: config.far * 0.5,
        }
    }

    /// Calculate camera position from orbit parameters
    pub fn calculate_position(&self) -> Vec3 {
        // Pitch is the angle from horizontal, yaw the angle around Y
        let horizontal_distance = self.distance * self.pitch.cos();
        let y = self.distance * self.pitch.sin();
        let x = horizontal_distance * self.yaw.sin();
        let z = horizontal_distance * self.yaw.cos();

        self.target + Vec3::new(x, y, z)
    }
}

/// Plugin for orbit camera controls
pub struct CameraControllerPlugin;

impl Plugin for CameraControllerPlugin {
    fn build(&self, app: &mut App) {
        // orbit and pan both read MouseMotion, so they must run sequentially
        app.add_systems(
            Update,
            (
                camera_orbit_system,
                camera_pan_system.after(camera_orbit_system),
                camera_zoom_system,
                update_camera_transform
                    .after(camera_orbit_system)
                    .after(camera_pan_system)
                    .after(camera_zoom_system),
            )
                .after(FaceRigSet),
        );
    }
}

fn camera_orbit_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut motion_events: MessageReader<MouseMotion>,
    mut camera_query: Query<&mut OrbitCamera>,
) {
    if !mouse_button.pressed(MouseButton::Left) {
        motion_events.clear();
        return;
    }

    let mut delta = Vec2::ZERO;
    for event in motion_events.read() {
        delta += event.delta;
    }

    if delta == Vec2::ZERO {
        return;
    }

    for mut orbit in camera_query.iter_mut().filter(|orbit| orbit.enabled) {
        orbit.yaw -= delta.x * orbit.orbit_sensitivity;
        orbit.pitch -= delta.y * orbit.orbit_sensitivity;

        // Clamp pitch to prevent flipping
        orbit.pitch = orbit.pitch.clamp(-1.5, 1.5);
    }
}

fn camera_pan_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut motion_events: MessageReader<MouseMotion>,
    mut camera_query: Query<(&mut OrbitCamera, &Transform)>,
) {
    if !mouse_button.pressed(MouseButton::Right) {
        motion_events.clear();
        return;
    }

    let mut delta = Vec2::ZERO;
    for event in motion_events.read() {
        delta += event.delta;
    }

    if delta == Vec2::ZERO {
        return;
    }

    for (mut orbit, transform) in camera_query.iter_mut() {
        if !orbit.enabled {
            continue;
        }

        let right = transform.rotation * Vec3::X;
        let up = transform.rotation * Vec3::Y;

        // Scale pan by distance so it feels consistent at different zoom levels
        let pan_scale = orbit.pan_sensitivity * orbit.distance;
        orbit.target += (-right * delta.x + up * delta.y) * pan_scale;
    }
}

fn camera_zoom_system(
    mut scroll_events: MessageReader<MouseWheel>,
    mut camera_query: Query<&mut OrbitCamera>,
) {
    let mut scroll_delta = 0.0;
    for event in scroll_events.read() {
        scroll_delta += event.y;
    }

    if scroll_delta == 0.0 {
        return;
    }

    for mut orbit in camera_query.iter_mut().filter(|orbit| orbit.enabled) {
        let zoom_amount = scroll_delta * orbit.zoom_sensitivity * (orbit.distance * 0.1);
        orbit.distance = (orbit.distance - zoom_amount).clamp(orbit.min_distance, orbit.max_distance);
    }
}

/// Update camera transform from orbit state
fn update_camera_transform(
    mut camera_query: Query<(&OrbitCamera, &mut Transform), (With<MainCamera>, Changed<OrbitCamera>)>,
) {
    for (orbit, mut transform) in camera_query.iter_mut() {
        let position = orbit.calculate_position();
        *transform = Transform::from_translation(position).looking_at(orbit.target, Vec3::Y);
    }
}
