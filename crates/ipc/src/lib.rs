//! IPC message protocol for Visage
//!
//! Defines the message types exchanged between the interaction core and the
//! UI chrome (toasts, upload control, filter buttons).

mod error;
mod input;
mod messages;

pub use error::IpcError;
pub use input::{MouseButton, MouseEvent};
pub use messages::{CoreToUi, FilterKind, Notice, NoticeLevel, UiToCore};

/// Serialize an outbound message to JSON
pub fn to_json(message: &CoreToUi) -> Result<String, IpcError> {
    Ok(serde_json::to_string(message)?)
}

/// Parse an inbound UI command from JSON
pub fn parse_command(json: &str) -> Result<UiToCore, IpcError> {
    if json.trim().is_empty() {
        return Err(IpcError::InvalidFormat("empty message".to_string()));
    }
    Ok(serde_json::from_str(json)?)
}
