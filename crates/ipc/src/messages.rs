//! Main IPC message enums for communication between the core and the UI.

use serde::{Deserialize, Serialize};

/// Messages from the interaction core to the UI chrome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CoreToUi {
    /// User-visible toast
    Notice(Notice),

    /// Mesh and engine finished loading, the frame loop is running
    SessionReady {
        vertex_count: usize,
        triangle_count: usize,
    },

    /// Startup failed; the session will not run
    SessionFailed { message: String },

    /// Frame loop aborted on a buffer consistency fault
    FrameLoopHalted { message: String },

    /// Face detection finished for a new upload
    FacesDetected { count: usize },

    /// Annotation handles were rebuilt
    HandlesChanged { count: usize },

    /// A filter result replaced the face texture
    FilterApplied { filter: String },
}

/// Messages from the UI chrome to the interaction core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UiToCore {
    /// A file was chosen in the upload control
    ImageSelected {
        bytes: Vec<u8>,
        /// Declared MIME type, if the host knows it
        mime: Option<String>,
    },

    /// A filter button was pressed
    ApplyFilter { filter: FilterKind },
}

/// Filters offered by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    Grayscale,
    Sepia,
}

impl FilterKind {
    /// Lowercase label used in notices
    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Grayscale => "grayscale",
            FilterKind::Sepia => "sepia",
        }
    }
}

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A short message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
