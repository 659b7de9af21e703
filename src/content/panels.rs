//! Show/hide scheduling for the floating panels.
//!
//! Each dismissible panel has a show-delay and a hide-delay timer; starting one always
//! cancels the other. Locks gate both: hide never fires while dragging, while settings are
//! open or while pinned, and a lock clearing later does not schedule a missed hide.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use super::effects::{Outbox, UiEffect};
use super::locks::LockState;
use super::timers::{TimerPurpose, TimerSet};
use crate::services::config::OverlayConfig;
use crate::services::layout::{Rect, Size, clamp_into, place_linked_panel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PanelId {
    ChatInput,
    /// Linked to `ChatInput`: always placed directly above it.
    ChatHistory,
    Settings,
}

impl PanelId {
    pub const ALL: [PanelId; 3] = [PanelId::ChatInput, PanelId::ChatHistory, PanelId::Settings];
    pub const DISMISSIBLE: [PanelId; 2] = [PanelId::ChatInput, PanelId::ChatHistory];

    fn index(self) -> usize {
        match self {
            PanelId::ChatInput => 0,
            PanelId::ChatHistory => 1,
            PanelId::Settings => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLayout {
    pub chat_input: Rect,
    pub chat_history: Rect,
    pub settings: Rect,
}

impl PanelLayout {
    fn get(&self, panel: PanelId) -> Rect {
        match panel {
            PanelId::ChatInput => self.chat_input,
            PanelId::ChatHistory => self.chat_history,
            PanelId::Settings => self.settings,
        }
    }
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            chat_input: Rect::new(100.0, 420.0, 300.0, 60.0),
            chat_history: Rect::new(100.0, 215.0, 300.0, 200.0),
            settings: Rect::new(50.0, 40.0, 400.0, 420.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PanelState {
    visible: bool,
    bounds: Rect,
}

#[derive(Debug)]
pub struct PanelScheduler {
    panels: [PanelState; 3],
    defaults: PanelLayout,
    container: Rect,
    gap: f64,
    show_delay: Duration,
    hide_delay: Duration,
    /// The history panel only joins the hover cycle when the user has opened it.
    history_enabled: bool,
}

impl PanelScheduler {
    pub fn new(config: &OverlayConfig, container: Rect, layout: PanelLayout) -> Self {
        let panels = PanelId::ALL.map(|p| PanelState {
            visible: false,
            bounds: clamp_into(layout.get(p), container),
        });
        let mut scheduler = Self {
            panels,
            defaults: layout,
            container,
            gap: config.linked_panel_gap,
            show_delay: config.panel_show_delay(),
            hide_delay: config.panel_hide_delay(),
            history_enabled: false,
        };
        scheduler.relink(&mut Outbox::default());
        scheduler
    }

    pub fn is_visible(&self, panel: PanelId) -> bool {
        self.panels[panel.index()].visible
    }

    pub fn bounds(&self, panel: PanelId) -> Rect {
        self.panels[panel.index()].bounds
    }

    pub fn history_enabled(&self) -> bool {
        self.history_enabled
    }

    pub fn visible_bounds(&self) -> impl Iterator<Item = Rect> + '_ {
        self.panels.iter().filter(|s| s.visible).map(|s| s.bounds)
    }

    fn joins_hover_cycle(&self, panel: PanelId) -> bool {
        match panel {
            PanelId::ChatInput => true,
            PanelId::ChatHistory => self.history_enabled,
            PanelId::Settings => false,
        }
    }

    /// A qualifying hover began (pointer entered the UI family).
    pub fn hover_began(&mut self, locks: &LockState, timers: &mut TimerSet, now: Instant) {
        for panel in PanelId::DISMISSIBLE {
            timers.cancel(TimerPurpose::HidePanel(panel));
            if !self.joins_hover_cycle(panel) || locks.settings_open || self.is_visible(panel) {
                continue;
            }
            let show = TimerPurpose::ShowPanel(panel);
            if timers.is_pending(show) {
                continue;
            }
            timers.start(show, now, self.show_delay);
        }
    }

    /// Every qualifying hover ended (pointer truly left the UI family or the window).
    pub fn hover_ended(&mut self, locks: &LockState, timers: &mut TimerSet, now: Instant) {
        for panel in PanelId::DISMISSIBLE {
            timers.cancel(TimerPurpose::ShowPanel(panel));
            if locks.suppresses_hide() || !self.is_visible(panel) {
                continue;
            }
            timers.start(TimerPurpose::HidePanel(panel), now, self.hide_delay);
        }
    }

    pub fn on_timer(&mut self, purpose: TimerPurpose, locks: &LockState, out: &mut Outbox) {
        match purpose {
            TimerPurpose::ShowPanel(panel) => {
                if locks.settings_open || self.is_visible(panel) {
                    return;
                }
                self.set_visible(panel, true, out);
            }
            TimerPurpose::HidePanel(panel) => {
                if locks.suppresses_hide() {
                    log::debug!("Hide of {panel:?} suppressed by lock: {locks:?}");
                    return;
                }
                self.set_visible(panel, false, out);
            }
            _ => {}
        }
    }

    /// Cancel every pending show/hide and hide all dismissible panels, ignoring `pinned`.
    pub fn force_hide(&mut self, timers: &mut TimerSet, out: &mut Outbox) {
        timers.cancel_where(|p| {
            matches!(p, TimerPurpose::ShowPanel(_) | TimerPurpose::HidePanel(_))
        });
        for panel in PanelId::DISMISSIBLE {
            self.set_visible(panel, false, out);
        }
    }

    pub fn set_visible(&mut self, panel: PanelId, visible: bool, out: &mut Outbox) {
        let state = &mut self.panels[panel.index()];
        if state.visible == visible {
            return;
        }
        state.visible = visible;
        out.emit(UiEffect::PanelVisibility { panel, visible });
        if visible && matches!(panel, PanelId::ChatInput | PanelId::ChatHistory) {
            self.relink(out);
        }
    }

    /// History button: flips the history panel and remembers the choice for later hovers.
    pub fn toggle_history(&mut self, timers: &mut TimerSet, out: &mut Outbox) {
        let show = !self.is_visible(PanelId::ChatHistory);
        self.history_enabled = show;
        timers.cancel(TimerPurpose::ShowPanel(PanelId::ChatHistory));
        timers.cancel(TimerPurpose::HidePanel(PanelId::ChatHistory));
        self.set_visible(PanelId::ChatHistory, show, out);
    }

    /// Translate a panel, keeping it inside the container.
    pub fn move_panel_by(&mut self, panel: PanelId, dx: f64, dy: f64, out: &mut Outbox) {
        let state = &mut self.panels[panel.index()];
        let next = clamp_into(state.bounds.translated(dx, dy), self.container);
        if next != state.bounds {
            state.bounds = next;
            out.emit(UiEffect::PanelMoved {
                panel,
                origin: next.origin(),
            });
        }
        if matches!(panel, PanelId::ChatInput | PanelId::ChatHistory) {
            self.relink(out);
        }
    }

    pub fn reset_positions(&mut self, out: &mut Outbox) {
        for panel in PanelId::ALL {
            let bounds = clamp_into(self.defaults.get(panel), self.container);
            let state = &mut self.panels[panel.index()];
            if state.bounds != bounds {
                state.bounds = bounds;
                out.emit(UiEffect::PanelMoved {
                    panel,
                    origin: bounds.origin(),
                });
            }
        }
        self.relink(out);
    }

    /// Recompute the history panel position from the input panel. Writes only the
    /// history panel's position, and only when it differs.
    pub fn relink(&mut self, out: &mut Outbox) {
        let primary = self.bounds(PanelId::ChatInput);
        let secondary = &mut self.panels[PanelId::ChatHistory.index()];
        let size = Size {
            width: secondary.bounds.width,
            height: secondary.bounds.height,
        };
        let origin = place_linked_panel(primary, size, self.gap);
        if secondary.bounds.origin() == origin {
            return;
        }
        secondary.bounds = secondary.bounds.with_origin(origin);
        out.emit(UiEffect::PanelMoved {
            panel: PanelId::ChatHistory,
            origin,
        });
    }
}
