//! Error type for the overlay interaction subsystem.
//!
//! Nothing here is fatal: callers log the error and fall back to click-through.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "message", rename_all = "camelCase")]
pub enum OverlayError {
    /// The overlay window is not (or no longer) attached.
    #[error("Overlay window is not available")]
    WindowMissing,

    /// A platform windowing call failed.
    #[error("Platform window call failed: {0}")]
    Platform(String),

    /// A message payload could not be applied.
    #[error("Invalid message payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A region or element handle that the layout does not know about.
    #[error("Unknown element: {0}")]
    UnknownElement(String),

    /// The content task has stopped and no longer accepts events.
    #[error("Content controller is not running")]
    ContentStopped,

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl OverlayError {
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform(message.into())
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;
