//! Messages exchanged between the window-owning process and the content running inside it.
//!
//! Both directions are ordered and fire-and-forget; there are no replies.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Content -> Window Owner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// Window should accept pointer input.
    EnableCapture,
    /// Window should forward pointer input to the desktop.
    DisableCapture,
    /// Move the window by a delta in screen pixels. Clamped by the receiver.
    MoveWindowBy { dx: f64, dy: f64 },
}

/// Window Owner -> Content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentMessage {
    #[serde(rename_all = "camelCase")]
    ForcedPassthroughChanged { is_forced: bool },
}

pub type HostSender = mpsc::UnboundedSender<HostMessage>;
pub type HostReceiver = mpsc::UnboundedReceiver<HostMessage>;
pub type ContentSender = mpsc::UnboundedSender<ContentMessage>;
pub type ContentReceiver = mpsc::UnboundedReceiver<ContentMessage>;

pub fn host_channel() -> (HostSender, HostReceiver) {
    mpsc::unbounded_channel()
}

pub fn content_channel() -> (ContentSender, ContentReceiver) {
    mpsc::unbounded_channel()
}
