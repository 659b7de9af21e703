pub mod passthrough;

#[cfg(feature = "tauri-host")]
pub mod tauri_host;
