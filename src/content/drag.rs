//! Window and panel drag sessions.

use serde::{Deserialize, Serialize};

use super::effects::Outbox;
use super::locks::{DragToken, LockManager};
use super::panels::{PanelId, PanelScheduler};
use super::regions::{ElementHandle, RegionRegistry};
use crate::ipc::HostMessage;
use crate::services::layout::{Point, clamp_delta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    WindowMove,
    PanelMove(PanelId),
}

#[derive(Debug)]
pub struct DragSession {
    pub kind: DragKind,
    pub origin_pointer: Point,
    last_pointer: Point,
    token: DragToken,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragEnd {
    pub kind: DragKind,
    /// Whether the window keeps capturing after the release.
    pub keeps_capture: bool,
}

#[derive(Debug)]
pub struct DragSessionManager {
    session: Option<DragSession>,
    max_delta: f64,
}

impl DragSessionManager {
    pub fn new(max_delta: f64) -> Self {
        Self {
            session: None,
            max_delta,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn active_kind(&self) -> Option<DragKind> {
        self.session.as_ref().map(|s| s.kind)
    }

    /// Resolve what a press on `target` would drag, if anything.
    pub fn classify(registry: &RegionRegistry, target: ElementHandle) -> Option<DragKind> {
        if let Some(panel) = registry.drag_surface_for(target) {
            return Some(DragKind::PanelMove(panel));
        }
        match registry.region_containing(target) {
            Some(region) if !region.allows_window_drag() => None,
            _ => Some(DragKind::WindowMove),
        }
    }

    /// Idle -> Active. Window drags track screen coordinates, panel drags client ones.
    pub fn press(
        &mut self,
        button: PointerButton,
        target: ElementHandle,
        screen: Point,
        client: Point,
        registry: &RegionRegistry,
        locks: &mut LockManager,
        out: &mut Outbox,
    ) -> Option<DragKind> {
        if button != PointerButton::Primary || self.session.is_some() {
            return None;
        }
        let kind = Self::classify(registry, target)?;
        let pointer = match kind {
            DragKind::WindowMove => screen,
            DragKind::PanelMove(_) => client,
        };
        let token = locks.begin_drag();
        if !locks.forced_passthrough() {
            out.send(HostMessage::EnableCapture);
        }
        log::debug!("Drag started: {kind:?} at {pointer:?}");
        self.session = Some(DragSession {
            kind,
            origin_pointer: pointer,
            last_pointer: pointer,
            token,
        });
        Some(kind)
    }

    /// Apply the delta since the previous move.
    pub fn motion(&mut self, screen: Point, client: Point, panels: &mut PanelScheduler, out: &mut Outbox) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let pointer = match session.kind {
            DragKind::WindowMove => screen,
            DragKind::PanelMove(_) => client,
        };
        let raw_dx = pointer.x - session.last_pointer.x;
        let raw_dy = pointer.y - session.last_pointer.y;
        session.last_pointer = pointer;

        let dx = clamp_delta(raw_dx, self.max_delta);
        let dy = clamp_delta(raw_dy, self.max_delta);
        if dx != raw_dx || dy != raw_dy {
            log::debug!("Drag delta ({raw_dx}, {raw_dy}) clamped to ({dx}, {dy})");
        }
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        match session.kind {
            DragKind::WindowMove => out.send(HostMessage::MoveWindowBy { dx, dy }),
            DragKind::PanelMove(panel) => panels.move_panel_by(panel, dx, dy, out),
        }
    }

    /// Active -> Idle on any release. `keeps_capture` decides whether the final pointer
    /// position retains capture; an unknown position never does.
    pub fn release(
        &mut self,
        locks: &mut LockManager,
        final_pointer: Option<Point>,
        keeps_capture: impl Fn(Point) -> bool,
        out: &mut Outbox,
    ) -> Option<DragEnd> {
        let session = self.session.take()?;
        locks.end_drag(session.token);

        let keeps = locks.settings_open() || final_pointer.is_some_and(keeps_capture);
        if !keeps {
            out.send(HostMessage::DisableCapture);
        }
        log::debug!(
            "Drag ended: {:?} at {final_pointer:?}, keeps capture: {keeps}",
            session.kind
        );
        Some(DragEnd {
            kind: session.kind,
            keeps_capture: keeps,
        })
    }

    /// End the session without a capture decision; the caller takes over capture.
    pub fn abort(&mut self, locks: &mut LockManager) -> Option<DragKind> {
        let session = self.session.take()?;
        locks.end_drag(session.token);
        Some(session.kind)
    }
}
