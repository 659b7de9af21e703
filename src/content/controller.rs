//! The content-side state machine.
//!
//! Handlers are synchronous and run to completion; each returns the host messages and view
//! effects it produced. Time only enters through the `now` argument and [`fire_due`], so
//! the same controller runs under the tokio task and in plain unit tests.
//!
//! [`fire_due`]: ContentController::fire_due

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::bubble::SpeechBubble;
use super::drag::{DragKind, DragSessionManager, PointerButton};
use super::effects::Outbox;
use super::hover::{EnterOutcome, HoverEngine, HoverState, LeaveOutcome};
use super::locks::{LockManager, LockState, SettingsTransition};
use super::panels::{PanelId, PanelLayout, PanelScheduler};
use super::regions::{ElementHandle, RegionId, RegionRegistry, UI_FAMILY, standard};
use super::render::{InteractivityPolicy, RenderNode, RenderTree};
use super::timers::{TimerPurpose, TimerSet};
use crate::ipc::{ContentMessage, HostMessage};
use crate::services::config::OverlayConfig;
use crate::services::layout::{Point, Rect};

/// Pointer and UI events delivered by the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ContentEvent {
    PointerEnter {
        region: RegionId,
    },
    PointerLeave {
        region: RegionId,
        /// Element now under the pointer, if any.
        #[serde(default)]
        related: Option<ElementHandle>,
    },
    PointerMove {
        screen: Point,
        client: Point,
    },
    PointerDown {
        button: PointerButton,
        target: ElementHandle,
        screen: Point,
        client: Point,
    },
    /// Global release, wherever it happens.
    PointerUp {
        client: Point,
    },
    PointerCancel,
    WindowLeave,
    ContextMenu {
        target: ElementHandle,
    },
    CloseSettings,
    TogglePin,
    ToggleHistory,
    ResetPanelPositions,
    ShowBubble {
        text: String,
        #[serde(default)]
        duration_ms: Option<u64>,
    },
    HideBubble,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentLayout {
    pub container: Rect,
    pub hitbox: Rect,
    pub panels: PanelLayout,
}

impl ContentLayout {
    pub fn for_config(config: &OverlayConfig) -> Self {
        let (w, h) = (config.window_width, config.window_height);
        Self {
            container: Rect::new(0.0, 0.0, w, h),
            hitbox: Rect::new(w * 0.3, h * 0.2, w * 0.4, h * 0.6),
            panels: PanelLayout::default(),
        }
    }
}

pub struct ContentController {
    registry: RegionRegistry,
    /// `None` when the hitbox region is absent from the document.
    hitbox: Option<Rect>,
    locks: LockManager,
    timers: TimerSet,
    hover: HoverEngine,
    panels: PanelScheduler,
    drag: DragSessionManager,
    bubble: SpeechBubble,
    bubble_default_ms: u64,
    figure: Option<RenderTree>,
}

impl ContentController {
    pub fn new(config: &OverlayConfig, registry: RegionRegistry, layout: ContentLayout) -> Self {
        let hitbox = match registry.require(RegionId::Hitbox) {
            Ok(_) => Some(layout.hitbox),
            Err(err) => {
                log::warn!("{err}; drag releases will always fall back to click-through");
                None
            }
        };
        Self {
            registry,
            hitbox,
            locks: LockManager::new(),
            timers: TimerSet::new(),
            hover: HoverEngine::new(UI_FAMILY, config.passthrough_decay()),
            panels: PanelScheduler::new(config, layout.container, layout.panels),
            drag: DragSessionManager::new(config.max_move_delta),
            bubble: SpeechBubble::new(),
            bubble_default_ms: config.bubble_default_ms,
            figure: None,
        }
    }

    /// Controller over the pet's standard document.
    pub fn standard(config: &OverlayConfig) -> Self {
        Self::new(config, standard::registry(), ContentLayout::for_config(config))
    }

    pub fn attach_figure(&mut self, figure: RenderNode, policy: &InteractivityPolicy) {
        let tree = policy.build(figure);
        let interactive = tree.interactive_nodes();
        if interactive.is_empty() {
            log::debug!("Figure attached: {} nodes, none interactive", tree.node_count());
        } else {
            log::info!("Figure attached with interactive nodes: {interactive:?}");
        }
        self.figure = Some(tree);
    }

    pub fn figure(&self) -> Option<&RenderTree> {
        self.figure.as_ref()
    }

    pub fn locks(&self) -> LockState {
        self.locks.snapshot()
    }

    pub fn hover_state(&self) -> HoverState {
        self.hover.state()
    }

    pub fn is_panel_visible(&self, panel: PanelId) -> bool {
        self.panels.is_visible(panel)
    }

    pub fn panel_bounds(&self, panel: PanelId) -> Rect {
        self.panels.bounds(panel)
    }

    pub fn drag_kind(&self) -> Option<DragKind> {
        self.drag.active_kind()
    }

    pub fn bubble_text(&self) -> Option<&str> {
        self.bubble.text()
    }

    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn handle(&mut self, event: ContentEvent, now: Instant) -> Outbox {
        let mut out = Outbox::default();
        match event {
            ContentEvent::PointerEnter { region } => {
                let locks = self.locks.snapshot();
                let outcome = self.hover.on_enter(
                    region,
                    &self.registry,
                    &locks,
                    &mut self.timers,
                    &mut out,
                );
                if outcome == EnterOutcome::Captured {
                    self.panels.hover_began(&locks, &mut self.timers, now);
                }
            }
            ContentEvent::PointerLeave { region, related } => {
                let outcome =
                    self.hover
                        .on_leave(region, related, &self.registry, &mut self.timers, now);
                if outcome == LeaveOutcome::Exited {
                    self.panels
                        .hover_ended(&self.locks.snapshot(), &mut self.timers, now);
                }
            }
            ContentEvent::WindowLeave => {
                self.hover.on_window_leave(&mut self.timers, now);
                self.panels
                    .hover_ended(&self.locks.snapshot(), &mut self.timers, now);
            }
            ContentEvent::PointerMove { screen, client } => {
                self.hover.on_pointer_move();
                self.drag.motion(screen, client, &mut self.panels, &mut out);
            }
            ContentEvent::PointerDown {
                button,
                target,
                screen,
                client,
            } => {
                self.drag.press(
                    button,
                    target,
                    screen,
                    client,
                    &self.registry,
                    &mut self.locks,
                    &mut out,
                );
            }
            ContentEvent::PointerUp { client } => self.end_drag(Some(client), &mut out),
            ContentEvent::PointerCancel => self.end_drag(None, &mut out),
            ContentEvent::ContextMenu { target } => {
                if self.registry.region_containing(target) == Some(RegionId::Hitbox) {
                    self.open_settings(&mut out);
                }
            }
            ContentEvent::CloseSettings => self.close_settings(&mut out),
            ContentEvent::TogglePin => {
                let pinned = self.locks.toggle_pinned();
                log::debug!("Chat panel pinned: {pinned}");
            }
            ContentEvent::ToggleHistory => self.panels.toggle_history(&mut self.timers, &mut out),
            ContentEvent::ResetPanelPositions => self.panels.reset_positions(&mut out),
            ContentEvent::ShowBubble { text, duration_ms } => {
                let duration_ms = duration_ms.unwrap_or(self.bubble_default_ms);
                self.bubble
                    .show(&text, duration_ms, &mut self.timers, now, &mut out);
            }
            ContentEvent::HideBubble => self.bubble.hide(&mut self.timers, &mut out),
        }
        out
    }

    pub fn handle_message(&mut self, message: ContentMessage, _now: Instant) -> Outbox {
        let mut out = Outbox::default();
        match message {
            ContentMessage::ForcedPassthroughChanged { is_forced } => {
                self.locks.set_forced_passthrough(is_forced);
                if is_forced {
                    self.panels.force_hide(&mut self.timers, &mut out);
                    self.hover.reset(&mut self.timers);
                }
                log::info!("Forced passthrough mirrored: {is_forced}");
            }
        }
        out
    }

    /// Run every timer whose deadline has passed.
    pub fn fire_due(&mut self, now: Instant) -> Outbox {
        let mut out = Outbox::default();
        let locks = self.locks.snapshot();
        for handle in self.timers.take_due(now) {
            match handle.purpose {
                TimerPurpose::PassthroughDecay => {
                    self.hover.on_decay_expired(&locks, &mut out);
                }
                purpose @ (TimerPurpose::ShowPanel(_) | TimerPurpose::HidePanel(_)) => {
                    self.panels.on_timer(purpose, &locks, &mut out);
                }
                TimerPurpose::BubbleExpire => self.bubble.hide(&mut self.timers, &mut out),
            }
        }
        out
    }

    fn end_drag(&mut self, final_pointer: Option<Point>, out: &mut Outbox) {
        let hitbox = self.hitbox;
        let panels = &self.panels;
        let retains = |p: Point| {
            hitbox.is_some_and(|h| h.contains(p)) || panels.visible_bounds().any(|r| r.contains(p))
        };
        if let Some(end) = self.drag.release(&mut self.locks, final_pointer, retains, out) {
            self.hover.resolve(end.keeps_capture, &mut self.timers);
        }
    }

    fn open_settings(&mut self, out: &mut Outbox) {
        if self.locks.forced_passthrough() {
            return;
        }
        if let Some(kind) = self.drag.abort(&mut self.locks) {
            log::debug!("{kind:?} drag ended by settings sheet");
        }
        if self.locks.set_settings_open(true) == SettingsTransition::Opened {
            self.panels.force_hide(&mut self.timers, out);
            self.panels.set_visible(PanelId::Settings, true, out);
        }
        out.send(HostMessage::EnableCapture);
        self.hover.resolve(true, &mut self.timers);
    }

    fn close_settings(&mut self, out: &mut Outbox) {
        if self.locks.set_settings_open(false) != SettingsTransition::Closed {
            return;
        }
        self.panels.set_visible(PanelId::Settings, false, out);
        self.panels.force_hide(&mut self.timers, out);
    }
}
