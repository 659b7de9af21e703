//! Override flags shared by the content-side components.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockState {
    pub dragging: bool,
    pub settings_open: bool,
    pub pinned: bool,
    /// Mirror of the window owner's force override, updated by message only.
    pub forced_passthrough: bool,
}

impl LockState {
    /// Locks under which automatic hide/passthrough must not fire.
    pub fn holds_capture(&self) -> bool {
        self.dragging || self.settings_open
    }

    pub fn suppresses_hide(&self) -> bool {
        self.dragging || self.settings_open || self.pinned
    }
}

/// Proof that `dragging` was set. Must be handed back to [`LockManager::end_drag`].
#[must_use = "a drag token must be returned through LockManager::end_drag"]
#[derive(Debug)]
pub struct DragToken {
    _private: (),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsTransition {
    Opened,
    Closed,
    Unchanged,
}

#[derive(Debug, Default)]
pub struct LockManager {
    state: LockState,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> LockState {
        self.state
    }

    pub fn dragging(&self) -> bool {
        self.state.dragging
    }

    pub fn settings_open(&self) -> bool {
        self.state.settings_open
    }

    pub fn pinned(&self) -> bool {
        self.state.pinned
    }

    pub fn forced_passthrough(&self) -> bool {
        self.state.forced_passthrough
    }

    pub fn begin_drag(&mut self) -> DragToken {
        self.state.dragging = true;
        DragToken { _private: () }
    }

    pub fn end_drag(&mut self, token: DragToken) {
        let DragToken { _private: () } = token;
        self.state.dragging = false;
    }

    /// The caller reacts to `Opened` by cancelling chat panel timers and force-hiding them.
    /// `Closed` restores nothing.
    pub fn set_settings_open(&mut self, open: bool) -> SettingsTransition {
        let prev = std::mem::replace(&mut self.state.settings_open, open);
        match (prev, open) {
            (false, true) => SettingsTransition::Opened,
            (true, false) => SettingsTransition::Closed,
            _ => SettingsTransition::Unchanged,
        }
    }

    pub fn set_pinned(&mut self, pinned: bool) {
        self.state.pinned = pinned;
    }

    pub fn toggle_pinned(&mut self) -> bool {
        self.state.pinned = !self.state.pinned;
        self.state.pinned
    }

    pub fn set_forced_passthrough(&mut self, forced: bool) {
        self.state.forced_passthrough = forced;
    }
}
