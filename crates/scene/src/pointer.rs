//! Mouse input to pointer events, and navigation gating.

use bevy::input::mouse::MouseButton;
use bevy::prelude::*;
use bevy::window::{CursorMoved, PrimaryWindow};
use interaction::{DeformationEngine, DragState, PointerResponse, RayCaster, Viewport};
use picking::Ray as PickRay;
use visage_config::DisplayConfig;
use visage_ipc::{MouseButton as UiMouseButton, MouseEvent};

use crate::camera::{MainCamera, OrbitCamera};
use crate::face::FaceSession;

/// [`RayCaster`] over a Bevy camera
pub struct CameraRayCaster<'a> {
    pub camera: &'a Camera,
    pub transform: &'a GlobalTransform,
}

impl CameraRayCaster<'_> {
    /// World ray through a viewport position in logical pixels
    pub fn ray_from_viewport(&self, position: Vec2) -> Option<PickRay> {
        let ray = self.camera.viewport_to_world(self.transform, position).ok()?;
        Some(PickRay::new(ray.origin, *ray.direction))
    }
}

impl RayCaster for CameraRayCaster<'_> {
    fn ray_from_ndc(&self, ndc: Vec2) -> Option<PickRay> {
        let size = self.camera.logical_viewport_size()?;
        self.ray_from_viewport(ndc_to_viewport(ndc, size))
    }
}

/// Map NDC (+Y up) to viewport pixels (origin top-left, +Y down)
pub(crate) fn ndc_to_viewport(ndc: Vec2, size: Vec2) -> Vec2 {
    Vec2::new((ndc.x + 1.0) * 0.5 * size.x, (1.0 - ndc.y) * 0.5 * size.y)
}

/// Keep the display config in step with the primary window's logical size
pub(crate) fn sync_display_config(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut display_config: ResMut<DisplayConfig>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let width = window.width().round() as u32;
    let height = window.height().round() as u32;

    if display_config.width != width || display_config.height != height {
        display_config.width = width;
        display_config.height = height;
        debug!("Display resized to {}x{}", width, height);
    }
}

/// Feed left button presses and cursor motion into the drag state machine
pub(crate) fn handle_pointer_input<E: DeformationEngine + Send + Sync + 'static>(
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<(Entity, &Window), With<PrimaryWindow>>,
    mut cursor_events: MessageReader<CursorMoved>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    display_config: Res<DisplayConfig>,
    mut face: ResMut<FaceSession<E>>,
) {
    let Some(session) = face.session.as_mut() else {
        cursor_events.clear();
        return;
    };

    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let Ok((window_entity, window)) = windows.single() else {
        return;
    };
    let caster = CameraRayCaster {
        camera,
        transform: camera_transform,
    };
    let viewport = Viewport::from(&*display_config);

    let cursor_positions: Vec<Vec2> = cursor_events
        .read()
        .filter(|e| e.window == window_entity)
        .map(|e| e.position)
        .collect();

    let button = LeftButton {
        pressed: mouse_button.just_pressed(MouseButton::Left),
        held: mouse_button.pressed(MouseButton::Left) && session.drag_state() != DragState::Idle,
        released: mouse_button.just_released(MouseButton::Left),
    };

    for event in left_button_events(button, &cursor_positions, window.cursor_position()) {
        if session.handle_mouse_event(&event, &viewport, &caster) == PointerResponse::Captured {
            debug!("Pointer captured: {:?}", event);
        }
    }
}

/// Left button transitions seen this frame
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LeftButton {
    pub pressed: bool,
    pub held: bool,
    pub released: bool,
}

/// Translate one frame of left button input into pointer events.
///
/// A press uses the newest cursor position, a held button replays every
/// intermediate position, and a release always produces a button-up.
pub(crate) fn left_button_events(
    button: LeftButton,
    cursor_positions: &[Vec2],
    cursor: Option<Vec2>,
) -> Vec<MouseEvent> {
    let mut events = Vec::new();
    let latest = cursor_positions.last().copied().or(cursor);

    if button.pressed {
        if let Some(pos) = latest {
            events.push(MouseEvent::ButtonDown {
                button: UiMouseButton::Left,
                x: pos.x,
                y: pos.y,
            });
        }
    } else if button.held {
        events.extend(
            cursor_positions
                .iter()
                .map(|pos| MouseEvent::Move { x: pos.x, y: pos.y }),
        );
    }

    if button.released {
        let pos = latest.unwrap_or_default();
        events.push(MouseEvent::ButtonUp {
            button: UiMouseButton::Left,
            x: pos.x,
            y: pos.y,
        });
    }

    events
}

/// Suspend orbit navigation while a drag is active
pub(crate) fn sync_navigation<E: DeformationEngine + Send + Sync + 'static>(
    face: Res<FaceSession<E>>,
    mut camera_query: Query<&mut OrbitCamera>,
) {
    let Some(session) = face.session.as_ref() else {
        return;
    };
    let enabled = session.navigation_enabled();

    for mut orbit in camera_query.iter_mut() {
        if orbit.enabled != enabled {
            orbit.enabled = enabled;
        }
    }
}
