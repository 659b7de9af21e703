pub mod content;
pub mod error;
pub mod ipc;
pub mod services;
pub mod windows;

/// Tray toggle state, emitted to the webview as a bool.
pub const EVT_FORCED_PASSTHROUGH_CHANGED: &str = "mouse-passthrough-changed";

/// View effects (`UiEffect`) emitted to the webview by the content task.
pub const EVT_UI_EFFECT: &str = "overlay-ui-effect";

pub const MAIN_WINDOW_LABEL: &str = "main";

pub use content::{ContentController, ContentEvent};
pub use error::{OverlayError, Result};
pub use services::config::OverlayConfig;
pub use windows::passthrough::{OverlayWindow, PassthroughCoordinator};

/// Desktop entry point: the webview overlay with tray, logging and both contexts running.
#[cfg(feature = "tauri-host")]
pub fn run() {
    windows::tauri_host::builder(OverlayConfig::from_env())
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
