//! Bevy integration for Visage
//!
//! This crate hosts the interaction core inside a Bevy app: it waits for the
//! startup task, drives the frame sync every `Update`, turns mouse input into
//! pointer rays, mirrors annotation handles as marker entities and keeps the
//! orbit camera and face texture in step with the session.

use std::future::Future;
use std::marker::PhantomData;

use bevy::prelude::*;
use interaction::{DeformationEngine, LoadError, MeshData, StartupTask};
use visage_config::{CameraConfig, DisplayConfig, InteractionConfig};
use visage_ipc::CoreToUi;

mod camera;
mod face;
mod markers;
mod pointer;
mod ui;

pub use camera::{CameraControllerPlugin, MainCamera, OrbitCamera};
pub use face::{FaceModel, FaceSession, PendingStartup};
pub use markers::HandleMarker;
pub use pointer::CameraRayCaster;
pub use ui::{FaceDetectorResource, FilterRegistry, UiCommand};

/// Resource for queuing messages to send to the UI
/// The host app should drain this and forward it to its UI layer
#[derive(Resource, Default)]
pub struct OutboundUiMessages {
    pub messages: Vec<CoreToUi>,
}

impl OutboundUiMessages {
    /// Queue a message to be sent to the UI
    pub fn send(&mut self, msg: CoreToUi) {
        self.messages.push(msg);
    }

    /// Take all queued messages, leaving the queue empty
    pub fn drain(&mut self) -> Vec<CoreToUi> {
        std::mem::take(&mut self.messages)
    }

    /// Take all queued messages as JSON, for hosts bridging to a web UI.
    ///
    /// Messages that fail to serialize are logged and dropped.
    pub fn drain_json(&mut self) -> Vec<String> {
        self.drain()
            .iter()
            .filter_map(|msg| match visage_ipc::to_json(msg) {
                Ok(json) => Some(json),
                Err(e) => {
                    warn!("Failed to serialize UI message: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Systems that read or mutate the face session
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaceRigSet;

/// Face rig plugin, generic over the deformation engine.
///
/// The host inserts a [`PendingStartup`] resource (and optionally a
/// [`FaceDetectorResource`] and [`FilterRegistry`]) before the first update.
pub struct VisagePlugin<E> {
    _engine: PhantomData<fn() -> E>,
}

impl<E> Default for VisagePlugin<E> {
    fn default() -> Self {
        Self {
            _engine: PhantomData,
        }
    }
}

impl<E> Plugin for VisagePlugin<E>
where
    E: DeformationEngine + Send + Sync + 'static,
{
    fn build(&self, app: &mut App) {
        app.init_resource::<OutboundUiMessages>()
            .init_resource::<DisplayConfig>()
            .init_resource::<CameraConfig>()
            .init_resource::<InteractionConfig>()
            .init_resource::<FilterRegistry>()
            .init_resource::<FaceSession<E>>()
            .add_message::<UiCommand>();

        app.add_plugins(CameraControllerPlugin);

        app.add_systems(Startup, setup_scene);
        app.add_systems(
            Update,
            (
                pointer::sync_display_config,
                face::poll_startup::<E>,
                ui::handle_ui_commands::<E>,
                pointer::handle_pointer_input::<E>,
                face::run_frame_sync::<E>,
                markers::sync_handle_markers::<E>,
                pointer::sync_navigation::<E>,
                face::apply_face_texture::<E>,
                face::forward_outbound::<E>,
            )
                .chain()
                .in_set(FaceRigSet),
        );
    }
}

/// Start loading the face session on `runtime`.
///
/// Uses the app's [`InteractionConfig`] resource (the default if none is
/// inserted) and leaves a [`PendingStartup`] for the plugin to poll.
pub fn begin_startup<E, F>(world: &mut World, runtime: &tokio::runtime::Handle, load_mesh: F)
where
    E: DeformationEngine + Send + Sync + 'static,
    F: Future<Output = Result<MeshData, LoadError>> + Send + 'static,
{
    let config = world
        .get_resource::<InteractionConfig>()
        .cloned()
        .unwrap_or_default();
    info!(
        "Starting face session (marker radius {}, drag plane {:?})",
        config.marker_radius, config.drag_plane
    );
    world.insert_resource(PendingStartup(StartupTask::<E>::spawn(runtime, load_mesh, config)));
}

/// Camera and lights looking at the face
fn setup_scene(mut commands: Commands, camera_config: Res<CameraConfig>) {
    let orbit_camera = OrbitCamera::from_config(&camera_config);
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: camera_config.fov_y_degrees.to_radians(),
            near: camera_config.near,
            far: camera_config.far,
            ..default()
        }),
        Transform::from_translation(orbit_camera.calculate_position())
            .looking_at(orbit_camera.target, Vec3::Y),
        MainCamera,
        orbit_camera,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            ..default()
        },
        Transform::from_xyz(1.0, 1.0, 1.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    info!("Scene initialized");
}
