//! Error types for the interaction core.

use picking::MeshError;
use thiserror::Error;

/// Fault detected while copying engine output into the mesh.
///
/// Every variant is fatal to the frame loop.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameSyncError {
    #[error("Engine reports {engine} vertices but the mesh has {mesh}")]
    VertexCountMismatch { engine: usize, mesh: usize },
    #[error("Vertex buffer at {address} with {len} bytes exceeds engine memory of {memory_len} bytes")]
    BufferOutOfBounds {
        address: usize,
        len: usize,
        memory_len: usize,
    },
    #[error("Vertex buffer extent overflows the address space")]
    AddressOverflow,
    #[error("Frame loop was halted by an earlier fault")]
    Halted,
}

/// Category of a collaborator failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes handed in could not be interpreted
    MalformedInput,
    /// The collaborator failed on its own
    Internal,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct DetectionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DetectionError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::MalformedInput,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("{message}")]
    Failed { kind: ErrorKind, message: String },
    #[error("Filter returned {actual} bytes, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("No image has been uploaded")]
    NoImage,
}

impl FilterError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Failed {
            kind: ErrorKind::MalformedInput,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Failed {
            kind: ErrorKind::Internal,
            message: message.into(),
        }
    }

    /// Collaborator error kind, if the filter itself failed
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Rejected image upload; the session is left untouched
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload is not an image")]
    NotAnImage,
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Face detection failed: {0}")]
    Detection(#[from] DetectionError),
}

/// Startup failure. Terminal for the session.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to load mesh asset: {0}")]
    Asset(String),
    #[error("Invalid mesh: {0}")]
    Mesh(#[from] MeshError),
    #[error("Failed to construct deformation engine: {0}")]
    Engine(String),
    #[error("Engine simulates {engine} vertices but the mesh has {mesh}")]
    EngineTopology { engine: usize, mesh: usize },
    #[error("Startup task ended without a result")]
    TaskDropped,
}

impl From<crate::engine::EngineError> for LoadError {
    fn from(err: crate::engine::EngineError) -> Self {
        Self::Engine(err.0)
    }
}
