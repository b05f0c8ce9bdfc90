//! UI commands routed to the face session.

use std::collections::HashMap;

use bevy::ecs::message::Message;
use bevy::prelude::*;
use interaction::{DeformationEngine, FaceDetector, ImageFilter, ImageUpload};
use visage_ipc::{FilterKind, IpcError, UiToCore};

use crate::camera::MainCamera;
use crate::face::FaceSession;
use crate::pointer::CameraRayCaster;

/// A command received from the UI layer
#[derive(Message, Debug, Clone)]
pub struct UiCommand(pub UiToCore);

impl UiCommand {
    /// Parse a command sent by a JSON UI
    pub fn from_json(json: &str) -> Result<Self, IpcError> {
        visage_ipc::parse_command(json).map(Self)
    }
}

/// Face detector supplied by the host
#[derive(Resource)]
pub struct FaceDetectorResource(pub Box<dyn FaceDetector + Send + Sync>);

/// Filters available to the UI, keyed by the kind the UI sends
#[derive(Resource, Default)]
pub struct FilterRegistry {
    filters: HashMap<FilterKind, Box<dyn ImageFilter + Send + Sync>>,
}

impl FilterRegistry {
    /// Register `filter` for `kind`, replacing any previous one
    pub fn insert(&mut self, kind: FilterKind, filter: Box<dyn ImageFilter + Send + Sync>) {
        self.filters.insert(kind, filter);
    }

    pub fn with(mut self, kind: FilterKind, filter: Box<dyn ImageFilter + Send + Sync>) -> Self {
        self.insert(kind, filter);
        self
    }

    pub fn get(&self, kind: FilterKind) -> Option<&(dyn ImageFilter + Send + Sync)> {
        self.filters.get(&kind).map(|filter| filter.as_ref())
    }
}

/// Handle image uploads and filter requests
pub(crate) fn handle_ui_commands<E: DeformationEngine + Send + Sync + 'static>(
    mut ui_commands: MessageReader<UiCommand>,
    detector: Option<Res<FaceDetectorResource>>,
    registry: Res<FilterRegistry>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mut face: ResMut<FaceSession<E>>,
) {
    for UiCommand(command) in ui_commands.read() {
        let Some(session) = face.session.as_mut() else {
            warn!("Ignoring UI command before the face session is ready");
            continue;
        };

        match command {
            UiToCore::ImageSelected { bytes, mime } => {
                let Some(detector) = detector.as_ref() else {
                    warn!("No face detector registered, ignoring upload");
                    continue;
                };
                let Ok((camera, transform)) = camera_query.single() else {
                    continue;
                };
                let caster = CameraRayCaster { camera, transform };

                let upload = ImageUpload::new(bytes.clone(), mime.clone());
                if let Err(err) = session.upload_image(upload, detector.0.as_ref(), &caster) {
                    debug!("Upload rejected: {}", err);
                }
            }
            UiToCore::ApplyFilter { filter } => {
                let Some(image_filter) = registry.get(*filter) else {
                    warn!("No {} filter registered", filter.label());
                    continue;
                };
                if let Err(err) = session.apply_filter(image_filter) {
                    debug!("Filter {} not applied: {}", filter.label(), err);
                }
            }
        }
    }
}
