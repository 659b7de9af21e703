//! Tauri binding for both contexts: the real overlay window, the tray toggle for forced
//! passthrough, and the commands the webview uses to send pointer events and
//! [`HostMessage`]s.
//!
//! [`HostMessage`]: crate::ipc::HostMessage

use std::sync::Arc;

use tauri::{
    Emitter, Manager,
    menu::{CheckMenuItem, Menu, MenuItem, PredefinedMenuItem},
    tray::{MouseButton, TrayIconBuilder, TrayIconEvent},
};

use crate::content::render::{InteractivityPolicy, placeholder_figure};
use crate::content::{ContentController, ContentEvent, UiEffect};
use crate::error::OverlayError;
use crate::services::config::OverlayConfig;
use crate::services::layout::Rect;
use crate::services::runtime::{ContentHandle, ContentView, start_overlay};
use crate::windows::passthrough::{OverlayWindow, PassthroughCoordinator};
use crate::{EVT_FORCED_PASSTHROUGH_CHANGED, EVT_UI_EFFECT, MAIN_WINDOW_LABEL};

fn platform_err(err: tauri::Error) -> OverlayError {
    OverlayError::platform(err.to_string())
}

/// Bounds are exchanged in logical pixels so the fixed size survives DPI changes.
impl OverlayWindow for tauri::WebviewWindow {
    fn set_ignore_cursor_events(&self, ignore: bool) -> Result<(), OverlayError> {
        tauri::WebviewWindow::set_ignore_cursor_events(self, ignore).map_err(platform_err)?;
        // A click-through window must not steal keyboard focus either.
        if let Err(err) = self.set_focusable(!ignore) {
            log::debug!("set_focusable({}) failed: {err}", !ignore);
        }
        Ok(())
    }

    fn outer_bounds(&self) -> Result<Rect, OverlayError> {
        let scale = self.scale_factor().map_err(platform_err)?;
        let pos = self.outer_position().map_err(platform_err)?;
        let size = self.outer_size().map_err(platform_err)?;
        Ok(Rect::new(
            pos.x as f64 / scale,
            pos.y as f64 / scale,
            size.width as f64 / scale,
            size.height as f64 / scale,
        ))
    }

    fn set_bounds(&self, bounds: Rect) -> Result<(), OverlayError> {
        self.set_position(tauri::Position::Logical(tauri::LogicalPosition {
            x: bounds.left,
            y: bounds.top,
        }))
        .map_err(platform_err)?;
        self.set_size(tauri::Size::Logical(tauri::LogicalSize {
            width: bounds.width,
            height: bounds.height,
        }))
        .map_err(platform_err)
    }

    fn work_area(&self) -> Option<Rect> {
        let monitor = self.current_monitor().ok().flatten()?;
        let scale = monitor.scale_factor();
        let pos = monitor.position();
        let size = monitor.size();
        Some(Rect::new(
            pos.x as f64 / scale,
            pos.y as f64 / scale,
            size.width as f64 / scale,
            size.height as f64 / scale,
        ))
    }
}

/// Forwards view effects to the webview, which owns the DOM.
struct WebviewView(tauri::WebviewWindow);

impl ContentView for WebviewView {
    fn apply(&mut self, effect: &UiEffect) {
        if let Err(err) = self.0.emit(EVT_UI_EFFECT, effect) {
            log::warn!("Failed to deliver {effect:?} to the webview: {err}");
        }
    }
}

/// Managed state shared by the commands.
pub struct OverlayHost {
    coordinator: Arc<PassthroughCoordinator>,
    content: Option<ContentHandle>,
}

/// Raw wire payload from the webview. Malformed payloads are logged and dropped.
#[tauri::command]
pub fn overlay_host_message(host: tauri::State<'_, OverlayHost>, message: serde_json::Value) {
    host.coordinator.dispatch_json(&message.to_string());
}

/// Pointer and UI events captured by the webview, handed to the content task.
#[tauri::command]
pub fn overlay_content_event(
    host: tauri::State<'_, OverlayHost>,
    event: ContentEvent,
) -> Result<(), OverlayError> {
    let Some(handle) = &host.content else {
        return Err(OverlayError::ContentStopped);
    };
    if handle.send(event) {
        Ok(())
    } else {
        Err(OverlayError::ContentStopped)
    }
}

/// Builder with logging, both commands and the overlay setup installed.
pub fn builder(config: OverlayConfig) -> tauri::Builder<tauri::Wry> {
    tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::new()
                .level(log::LevelFilter::Info)
                .build(),
        )
        .invoke_handler(tauri::generate_handler![
            overlay_host_message,
            overlay_content_event
        ])
        .setup(move |app| {
            install(app, &config)?;
            Ok(())
        })
}

pub fn install(app: &tauri::App, config: &OverlayConfig) -> tauri::Result<()> {
    let coordinator = Arc::new(PassthroughCoordinator::new(config));

    let content = match app.get_webview_window(MAIN_WINDOW_LABEL) {
        Some(window) => {
            coordinator.attach_window(Box::new(window.clone()));
            let mut controller = ContentController::standard(config);
            controller.attach_figure(placeholder_figure(), &InteractivityPolicy::new());
            let coordinator = coordinator.clone();
            // The tasks outlive this call; block_on only provides the runtime context.
            let tasks = tauri::async_runtime::block_on(async move {
                start_overlay(coordinator, controller, WebviewView(window))
            });
            Some(tasks.handle)
        }
        None => {
            log::warn!("Overlay window {MAIN_WINDOW_LABEL:?} missing; passthrough control disabled");
            None
        }
    };

    setup_tray(app, coordinator.clone())?;
    app.manage(OverlayHost {
        coordinator,
        content,
    });
    Ok(())
}

fn setup_tray(app: &tauri::App, coordinator: Arc<PassthroughCoordinator>) -> tauri::Result<()> {
    let click_through = CheckMenuItem::with_id(
        app,
        "click_through",
        "Click-through (view only)",
        true,
        false,
        None::<&str>,
    )?;
    let quit_i = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?;
    let sep = PredefinedMenuItem::separator(app)?;
    let menu = Menu::with_items(app, &[&click_through, &sep, &quit_i])?;
    let icon = app.default_window_icon().cloned();

    let click_through_for_menu = click_through.clone();
    let click_through_for_tray = click_through.clone();
    let coordinator_menu = coordinator.clone();
    let coordinator_tray = coordinator;

    let mut builder = TrayIconBuilder::new()
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_menu_event(move |app, event| {
            let id = event.id().as_ref();

            if id == "quit" {
                app.exit(0);
                return;
            }

            if id == "click_through" {
                let new_state = !coordinator_menu.is_forced();
                coordinator_menu.set_forced_passthrough(new_state);
                let _ = click_through_for_menu.set_checked(new_state);
                let _ = app.emit(EVT_FORCED_PASSTHROUGH_CHANGED, new_state);
            }
        })
        .on_tray_icon_event(move |tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                ..
            } = event
            {
                let app = tray.app_handle();
                if let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) {
                    let _ = window.is_visible().and_then(|is_visible| {
                        if is_visible {
                            window.hide()?;
                        } else {
                            window.show()?;
                            // Re-assert the override: showing must not leave a stale capture.
                            let forced = coordinator_tray.is_forced();
                            coordinator_tray.set_forced_passthrough(forced);
                            let _ = click_through_for_tray.set_checked(forced);
                        }
                        Ok(())
                    });
                }
            }
        });

    if let Some(i) = icon {
        builder = builder.icon(i);
    }

    builder.build(app)?;
    Ok(())
}
