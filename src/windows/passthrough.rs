//! Window Owner side: the single source of truth for click-through.
//!
//! Content requests arrive as [`HostMessage`]s and are applied in order. The user-level
//! force override (tray toggle) always wins over content requests.

use arc_swap::ArcSwapOption;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use crate::error::OverlayError;
use crate::ipc::{ContentMessage, ContentSender, HostMessage};
use crate::services::config::OverlayConfig;
use crate::services::layout::{Rect, clamp_delta, clamp_into};

/// Platform seam for the overlay window.
pub trait OverlayWindow: Send + Sync {
    /// `true` forwards pointer input to whatever is beneath the window.
    fn set_ignore_cursor_events(&self, ignore: bool) -> Result<(), OverlayError>;

    fn outer_bounds(&self) -> Result<Rect, OverlayError>;

    fn set_bounds(&self, bounds: Rect) -> Result<(), OverlayError>;

    /// Usable screen area, when the platform can report it.
    fn work_area(&self) -> Option<Rect> {
        None
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassthroughStats {
    pub capture_applied: u64,
    pub passthrough_applied: u64,
    pub capture_ignored_forced: u64,
    pub rejected_messages: u64,
}

pub struct PassthroughCoordinator {
    window: ArcSwapOption<Box<dyn OverlayWindow>>,
    /// `true` = window accepts pointer input.
    capturing: AtomicBool,
    forced: AtomicBool,
    fixed_width: f64,
    fixed_height: f64,
    max_move_delta: f64,
    to_content: Mutex<Option<ContentSender>>,
    capture_applied: AtomicU64,
    passthrough_applied: AtomicU64,
    capture_ignored_forced: AtomicU64,
    rejected_messages: AtomicU64,
}

impl PassthroughCoordinator {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            window: ArcSwapOption::empty(),
            capturing: AtomicBool::new(false),
            forced: AtomicBool::new(false),
            fixed_width: config.window_width,
            fixed_height: config.window_height,
            max_move_delta: config.max_move_delta,
            to_content: Mutex::new(None),
            capture_applied: AtomicU64::new(0),
            passthrough_applied: AtomicU64::new(0),
            capture_ignored_forced: AtomicU64::new(0),
            rejected_messages: AtomicU64::new(0),
        }
    }

    /// Attach the window and put it into the click-through start state.
    pub fn attach_window(&self, window: Box<dyn OverlayWindow>) {
        self.window.store(Some(Arc::new(window)));
        self.capturing.store(false, Ordering::SeqCst);
        self.apply_ignore(true);
    }

    pub fn detach_window(&self) {
        self.window.store(None);
        self.capturing.store(false, Ordering::SeqCst);
    }

    pub fn connect_content(&self, sender: ContentSender) {
        if let Ok(mut guard) = self.to_content.lock() {
            *guard = Some(sender);
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    pub fn is_forced(&self) -> bool {
        self.forced.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> PassthroughStats {
        PassthroughStats {
            capture_applied: self.capture_applied.load(Ordering::Relaxed),
            passthrough_applied: self.passthrough_applied.load(Ordering::Relaxed),
            capture_ignored_forced: self.capture_ignored_forced.load(Ordering::Relaxed),
            rejected_messages: self.rejected_messages.load(Ordering::Relaxed),
        }
    }

    pub fn handle(&self, message: HostMessage) {
        match message {
            HostMessage::EnableCapture => self.request_capture(),
            HostMessage::DisableCapture => self.request_passthrough(),
            HostMessage::MoveWindowBy { dx, dy } => self.move_window_by(dx, dy),
        }
    }

    /// Apply a raw wire payload. Malformed payloads are logged and dropped.
    pub fn dispatch_json(&self, raw: &str) {
        match serde_json::from_str::<HostMessage>(raw) {
            Ok(message) => self.handle(message),
            Err(err) => {
                self.rejected_messages.fetch_add(1, Ordering::Relaxed);
                log::error!("Rejected host message {raw:?}: {err}");
            }
        }
    }

    pub fn request_capture(&self) {
        if self.is_forced() {
            self.capture_ignored_forced.fetch_add(1, Ordering::Relaxed);
            log::trace!("Capture request ignored: forced passthrough active");
            return;
        }
        if self.capturing.swap(true, Ordering::SeqCst) {
            return;
        }
        self.capture_applied.fetch_add(1, Ordering::Relaxed);
        self.apply_ignore(false);
    }

    pub fn request_passthrough(&self) {
        if !self.capturing.swap(false, Ordering::SeqCst) {
            return;
        }
        self.passthrough_applied.fetch_add(1, Ordering::Relaxed);
        self.apply_ignore(true);
    }

    /// The only way to toggle force mode. Applies immediately and tells the content side.
    ///
    /// Clearing force leaves the window click-through; the next hover re-arms capture.
    pub fn set_forced_passthrough(&self, forced: bool) {
        self.forced.store(forced, Ordering::SeqCst);
        self.capturing.store(false, Ordering::SeqCst);
        self.apply_ignore(true);
        log::info!("Forced passthrough {}", if forced { "on" } else { "off" });

        let sender = self.to_content.lock().ok().and_then(|guard| guard.clone());
        if let Some(sender) = sender {
            if sender
                .send(ContentMessage::ForcedPassthroughChanged { is_forced: forced })
                .is_err()
            {
                log::debug!("Content side gone; forced passthrough change not delivered");
            }
        }
    }

    pub fn move_window_by(&self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            self.rejected_messages.fetch_add(1, Ordering::Relaxed);
            log::error!("Window move rejected: non-numeric delta ({dx}, {dy})");
            return;
        }

        let max = self.max_move_delta;
        if dx.abs() > max || dy.abs() > max {
            log::warn!("Window move delta ({dx}, {dy}) exceeds ±{max}; clamping");
        }
        let dx = clamp_delta(dx, max);
        let dy = clamp_delta(dy, max);

        let Some(window) = self.window.load_full() else {
            log::warn!("Window move skipped: {}", OverlayError::WindowMissing);
            return;
        };

        if let Err(err) = self.apply_move(&**window, dx, dy) {
            log::error!("Window move failed: {err}");
        }
    }

    fn apply_move(&self, window: &dyn OverlayWindow, dx: f64, dy: f64) -> Result<(), OverlayError> {
        let current = window.outer_bounds()?;
        // Size stays locked: repeated set_bounds under DPI scaling otherwise grows the window.
        let mut next = Rect::new(
            current.left + dx,
            current.top + dy,
            self.fixed_width,
            self.fixed_height,
        );
        if let Some(area) = window.work_area() {
            next = clamp_into(next, area);
        }
        window.set_bounds(next)
    }

    fn apply_ignore(&self, ignore: bool) {
        let Some(window) = self.window.load_full() else {
            log::debug!("No overlay window attached; click-through state recorded only");
            return;
        };
        if let Err(err) = window.set_ignore_cursor_events(ignore) {
            log::warn!("set_ignore_cursor_events({ignore}) failed: {err}");
            // The window kept its previous mode; record that so the next request retries.
            // A failed release leaves it capturing, a failed capture leaves it click-through.
            self.capturing.store(ignore, Ordering::SeqCst);
            return;
        }
        log::trace!("Overlay click-through updated (ignore_cursor_events={ignore})");
    }
}

/// In-memory window used by tests and the headless runner.
#[derive(Clone, Default)]
pub struct MemoryWindow {
    inner: Arc<Mutex<MemoryWindowState>>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryWindowState {
    pub ignore_cursor_events: bool,
    pub bounds: Rect,
    pub work_area: Option<Rect>,
    pub ignore_calls: Vec<bool>,
    pub fail_platform_calls: bool,
}

impl MemoryWindow {
    pub fn new(bounds: Rect) -> Self {
        let window = Self::default();
        window.update(|s| s.bounds = bounds);
        window
    }

    pub fn with_work_area(self, area: Rect) -> Self {
        self.update(|s| s.work_area = Some(area));
        self
    }

    pub fn snapshot(&self) -> MemoryWindowState {
        self.inner.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn update(&self, f: impl FnOnce(&mut MemoryWindowState)) {
        if let Ok(mut state) = self.inner.lock() {
            f(&mut state);
        }
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut MemoryWindowState) -> Result<T, OverlayError>,
    ) -> Result<T, OverlayError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| OverlayError::platform("memory window lock poisoned"))?;
        if state.fail_platform_calls {
            return Err(OverlayError::platform("simulated failure"));
        }
        f(&mut state)
    }
}

impl OverlayWindow for MemoryWindow {
    fn set_ignore_cursor_events(&self, ignore: bool) -> Result<(), OverlayError> {
        self.with_state(|s| {
            s.ignore_cursor_events = ignore;
            s.ignore_calls.push(ignore);
            Ok(())
        })
    }

    fn outer_bounds(&self) -> Result<Rect, OverlayError> {
        self.with_state(|s| Ok(s.bounds))
    }

    fn set_bounds(&self, bounds: Rect) -> Result<(), OverlayError> {
        self.with_state(|s| {
            s.bounds = bounds;
            Ok(())
        })
    }

    fn work_area(&self) -> Option<Rect> {
        self.inner.lock().ok().and_then(|s| s.work_area)
    }
}
