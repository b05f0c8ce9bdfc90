//! Interaction core for the Visage face rig.
//!
//! This crate connects 2D input to the deformable face mesh:
//! - **Frame sync**: advances the deformation engine and copies its vertex
//!   buffer into render geometry through a bounds-checked view
//! - **Drag**: pointer gesture state machine pinning vertices in the engine
//! - **Handles**: annotation markers derived from face detections
//! - **Filters**: color filters applied to the pristine upload with rollback
//! - **Session**: the single state object all host callbacks operate on
//!
//! Nothing here depends on a renderer. Hosts supply a [`RayCaster`], a
//! [`DeformationEngine`], a [`FaceDetector`] and [`ImageFilter`]s.

pub mod camera;
pub mod detection;
pub mod drag;
pub mod engine;
pub mod error;
pub mod filter;
pub mod foreign_buffer;
pub mod frame_sync;
pub mod handles;
pub mod session;
pub mod startup;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use camera::{PerspectiveCamera, RayCaster, Viewport};
pub use detection::{DetectionBox, FaceDetector};
pub use drag::{DragController, DragMode, DragSession, DragState, NavigationFlag, PointerResponse};
pub use engine::{DeformationEngine, EngineError};
pub use error::{DetectionError, ErrorKind, FilterError, FrameSyncError, LoadError, UploadError};
pub use filter::{FilterAdapter, ImageFilter, Texture};
pub use foreign_buffer::ForeignBufferView;
pub use frame_sync::{FrameLoopState, FrameSyncBridge};
pub use handles::{Handle, HandleId, HandleManager, HandlePick};
pub use session::{ImageUpload, OutboundMessages, Session};
pub use startup::{start_session, MeshData, StartupTask};
