//! Session state shared by every input handler.
//!
//! One `Session` owns the mesh, the engine and all interaction state. Hosts
//! pass it to their frame, pointer, upload and filter callbacks and drain the
//! outbound UI messages afterwards.

use glam::Vec2;
use picking::{Mesh, Ray};
use tracing::{debug, info, warn};
use visage_config::InteractionConfig;
use visage_ipc::{CoreToUi, MouseButton, MouseEvent, Notice};

use crate::camera::{RayCaster, Viewport};
use crate::detection::FaceDetector;
use crate::drag::{DragController, DragState, NavigationFlag, PointerResponse};
use crate::engine::DeformationEngine;
use crate::error::{FilterError, FrameSyncError, UploadError};
use crate::filter::{FilterAdapter, ImageFilter, Texture};
use crate::frame_sync::{FrameLoopState, FrameSyncBridge};
use crate::handles::HandleManager;

const INVALID_IMAGE_NOTICE: &str = "Please upload a valid image file.";
const NO_FACES_NOTICE: &str = "No faces detected in the image.";

/// A file chosen in the upload control
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    /// MIME type declared by the host, if known
    pub mime: Option<String>,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>, mime: Option<String>) -> Self {
        Self { bytes, mime }
    }

    fn declares_non_image(&self) -> bool {
        self.mime
            .as_deref()
            .is_some_and(|mime| !mime.starts_with("image/"))
    }
}

/// Queue of messages for the UI chrome, drained by the host
#[derive(Debug, Default)]
pub struct OutboundMessages {
    messages: Vec<CoreToUi>,
}

impl OutboundMessages {
    pub fn send(&mut self, message: CoreToUi) {
        self.messages.push(message);
    }

    pub fn notice(&mut self, notice: Notice) {
        self.send(CoreToUi::Notice(notice));
    }

    pub fn drain(&mut self) -> Vec<CoreToUi> {
        std::mem::take(&mut self.messages)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

pub struct Session<E> {
    mesh: Mesh,
    engine: E,
    bridge: FrameSyncBridge,
    drag: DragController,
    handles: HandleManager,
    filters: FilterAdapter,
    navigation: NavigationFlag,
    outbound: OutboundMessages,
}

impl<E: DeformationEngine> Session<E> {
    pub fn new(mesh: Mesh, engine: E, config: &InteractionConfig) -> Self {
        Self {
            mesh,
            engine,
            bridge: FrameSyncBridge::new(),
            drag: DragController::new(config.drag_plane),
            handles: HandleManager::new(config.marker_radius),
            filters: FilterAdapter::new(),
            navigation: NavigationFlag::default(),
            outbound: OutboundMessages::default(),
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn handles(&self) -> &HandleManager {
        &self.handles
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn navigation_enabled(&self) -> bool {
        self.navigation.is_enabled()
    }

    pub fn frame_loop_state(&self) -> FrameLoopState {
        self.bridge.state()
    }

    /// Texture currently shown on the face, if an image was uploaded
    pub fn texture(&self) -> Option<&Texture> {
        self.filters.current()
    }

    pub fn texture_revision(&self) -> u64 {
        self.filters.revision()
    }

    /// Consume the mesh dirty flag; true if positions changed since last call
    pub fn take_mesh_dirty(&mut self) -> bool {
        self.mesh.take_dirty()
    }

    pub fn drain_outbound(&mut self) -> Vec<CoreToUi> {
        self.outbound.drain()
    }

    /// Advance the engine and copy its vertices into the mesh.
    ///
    /// The first fault is reported to the UI once; later calls return
    /// [`FrameSyncError::Halted`].
    pub fn frame(&mut self, delta_seconds: f32) -> Result<(), FrameSyncError> {
        let was_halted = self.bridge.is_halted();
        let result = self
            .bridge
            .sync(&mut self.engine, &mut self.mesh, delta_seconds);

        if let (Err(err), false) = (&result, was_halted) {
            self.outbound.send(CoreToUi::FrameLoopHalted {
                message: err.to_string(),
            });
        }
        result
    }

    pub fn pointer_down(&mut self, ray: &Ray) -> PointerResponse {
        self.drag.pointer_down(
            ray,
            &self.mesh,
            &self.handles,
            &mut self.engine,
            &mut self.navigation,
        )
    }

    pub fn pointer_move(&mut self, ray: &Ray) -> PointerResponse {
        self.drag
            .pointer_move(ray, &mut self.handles, &mut self.engine)
    }

    pub fn pointer_up(&mut self) -> PointerResponse {
        self.drag.pointer_up(&mut self.engine, &mut self.navigation)
    }

    /// Route a host mouse event given in viewport pixels.
    ///
    /// Only the left button drags; other buttons pass through.
    pub fn handle_mouse_event<C: RayCaster + ?Sized>(
        &mut self,
        event: &MouseEvent,
        viewport: &Viewport,
        camera: &C,
    ) -> PointerResponse {
        let ray_at = |x: f32, y: f32| {
            viewport
                .to_ndc(Vec2::new(x, y))
                .and_then(|ndc| camera.ray_from_ndc(ndc))
        };

        match *event {
            MouseEvent::ButtonDown {
                button: MouseButton::Left,
                x,
                y,
            } => match ray_at(x, y) {
                Some(ray) => self.pointer_down(&ray),
                None => PointerResponse::PassThrough,
            },
            MouseEvent::Move { x, y } => match ray_at(x, y) {
                Some(ray) => self.pointer_move(&ray),
                None if self.drag.is_dragging() => PointerResponse::Captured,
                None => PointerResponse::PassThrough,
            },
            MouseEvent::ButtonUp {
                button: MouseButton::Left,
                ..
            } => self.pointer_up(),
            _ => PointerResponse::PassThrough,
        }
    }

    /// Detect faces in a new upload and rebuild handles and texture.
    ///
    /// Nothing in the session changes unless the upload is accepted. Returns
    /// the number of detected faces.
    pub fn upload_image<D, C>(
        &mut self,
        upload: ImageUpload,
        detector: &D,
        camera: &C,
    ) -> Result<usize, UploadError>
    where
        D: FaceDetector + ?Sized,
        C: RayCaster + ?Sized,
    {
        if upload.declares_non_image() {
            debug!("Rejected upload with MIME type {:?}", upload.mime);
            self.outbound.notice(Notice::error(INVALID_IMAGE_NOTICE));
            return Err(UploadError::NotAnImage);
        }

        let boxes = match detector.detect(&upload.bytes) {
            Ok(boxes) => boxes,
            Err(err) => {
                warn!("Face detection failed: {}", err);
                self.outbound
                    .notice(Notice::error(format!("Error detecting faces: {err}")));
                return Err(err.into());
            }
        };

        let texture = match Texture::decode(&upload.bytes) {
            Ok(texture) => texture,
            Err(err) => {
                warn!("Failed to decode uploaded image: {}", err);
                self.outbound.notice(Notice::error(INVALID_IMAGE_NOTICE));
                return Err(err.into());
            }
        };

        self.drag.cancel(&mut self.engine, &mut self.navigation);
        let handle_count =
            self.handles
                .rebuild(&boxes, texture.dimensions(), camera, &self.mesh);
        self.filters.set_image(upload.bytes, texture);

        let faces = boxes.len();
        info!("Detected {} faces, created {} handles", faces, handle_count);
        self.outbound.send(CoreToUi::FacesDetected { count: faces });
        self.outbound.notice(if faces == 0 {
            Notice::info(NO_FACES_NOTICE)
        } else {
            Notice::success(format!("Detected {faces} face(s) in the image."))
        });
        self.outbound.send(CoreToUi::HandlesChanged {
            count: handle_count,
        });

        Ok(faces)
    }

    /// Apply a filter to the pristine upload and show the result
    pub fn apply_filter<F: ImageFilter + ?Sized>(&mut self, filter: &F) -> Result<(), FilterError> {
        match self.filters.apply(filter) {
            Ok(_) => {
                self.outbound.send(CoreToUi::FilterApplied {
                    filter: filter.name().to_string(),
                });
                Ok(())
            }
            Err(FilterError::NoImage) => {
                debug!("Ignoring {} filter, no image uploaded", filter.name());
                Err(FilterError::NoImage)
            }
            Err(err) => {
                self.outbound.notice(Notice::error(format!(
                    "Error applying {} filter: {}",
                    filter.name(),
                    err
                )));
                Err(err)
            }
        }
    }
}
