//! Hysteresis between pointer hover and window capture.
//!
//! Capture is requested eagerly on enter; release goes through a single decay timer so
//! transit between adjacent family regions never flickers the window into click-through.

use std::time::Duration;
use tokio::time::Instant;

use super::effects::Outbox;
use super::locks::LockState;
use super::regions::{ElementHandle, FamilyId, RegionId, RegionRegistry};
use super::timers::{TimerPurpose, TimerSet};
use crate::ipc::HostMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverState {
    Outside,
    /// Capture requested, no movement inside yet.
    Entering,
    InsideStable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterOutcome {
    Captured,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Pointer moved to another member of the family.
    IntraFamily,
    Exited,
    Ignored,
}

#[derive(Debug)]
pub struct HoverEngine {
    state: HoverState,
    family: FamilyId,
    decay: Duration,
}

impl HoverEngine {
    pub fn new(family: FamilyId, decay: Duration) -> Self {
        Self {
            state: HoverState::Outside,
            family,
            decay,
        }
    }

    pub fn state(&self) -> HoverState {
        self.state
    }

    fn tracks(&self, registry: &RegionRegistry, region: RegionId) -> bool {
        registry.family_of(region) == Some(self.family)
    }

    pub fn on_enter(
        &mut self,
        region: RegionId,
        registry: &RegionRegistry,
        locks: &LockState,
        timers: &mut TimerSet,
        out: &mut Outbox,
    ) -> EnterOutcome {
        if !self.tracks(registry, region) || locks.forced_passthrough {
            return EnterOutcome::Ignored;
        }
        if timers.cancel(TimerPurpose::PassthroughDecay) {
            log::trace!("Pointer re-entered {region:?}; decay cancelled");
        }
        self.state = match self.state {
            HoverState::Outside => HoverState::Entering,
            _ => HoverState::InsideStable,
        };
        out.send(HostMessage::EnableCapture);
        EnterOutcome::Captured
    }

    pub fn on_leave(
        &mut self,
        region: RegionId,
        related: Option<ElementHandle>,
        registry: &RegionRegistry,
        timers: &mut TimerSet,
        now: Instant,
    ) -> LeaveOutcome {
        if !self.tracks(registry, region) {
            return LeaveOutcome::Ignored;
        }
        if related.is_some_and(|target| registry.is_member(target, self.family)) {
            return LeaveOutcome::IntraFamily;
        }
        self.start_decay(timers, now);
        LeaveOutcome::Exited
    }

    /// Pointer left the whole window; no related target to check.
    pub fn on_window_leave(&mut self, timers: &mut TimerSet, now: Instant) {
        self.start_decay(timers, now);
    }

    pub fn on_pointer_move(&mut self) {
        if self.state == HoverState::Entering {
            self.state = HoverState::InsideStable;
        }
    }

    /// Returns true if passthrough was requested.
    pub fn on_decay_expired(&mut self, locks: &LockState, out: &mut Outbox) -> bool {
        if self.state != HoverState::Outside {
            return false;
        }
        if locks.holds_capture() {
            log::debug!("Passthrough decay expired under lock; keeping capture ({locks:?})");
            return false;
        }
        out.send(HostMessage::DisableCapture);
        true
    }

    /// Settle the state after a drag released with a known capture decision.
    pub fn resolve(&mut self, inside: bool, timers: &mut TimerSet) {
        timers.cancel(TimerPurpose::PassthroughDecay);
        self.state = if inside {
            HoverState::InsideStable
        } else {
            HoverState::Outside
        };
    }

    /// The window became click-through underneath us.
    pub fn reset(&mut self, timers: &mut TimerSet) {
        self.resolve(false, timers);
    }

    fn start_decay(&mut self, timers: &mut TimerSet, now: Instant) {
        self.state = HoverState::Outside;
        timers.start(TimerPurpose::PassthroughDecay, now, self.decay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::regions::{UI_FAMILY, standard};

    const MS: Duration = Duration::from_millis(1);

    struct Rig {
        engine: HoverEngine,
        registry: RegionRegistry,
        timers: TimerSet,
        locks: LockState,
        out: Outbox,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                engine: HoverEngine::new(UI_FAMILY, 150 * MS),
                registry: standard::registry(),
                timers: TimerSet::new(),
                locks: LockState::default(),
                out: Outbox::default(),
            }
        }

        fn enter(&mut self, region: RegionId) -> EnterOutcome {
            self.engine
                .on_enter(region, &self.registry, &self.locks, &mut self.timers, &mut self.out)
        }

        fn leave(&mut self, region: RegionId, related: Option<ElementHandle>, now: Instant) -> LeaveOutcome {
            self.engine
                .on_leave(region, related, &self.registry, &mut self.timers, now)
        }

        fn expire(&mut self, now: Instant) {
            for handle in self.timers.take_due(now) {
                if handle.purpose == TimerPurpose::PassthroughDecay {
                    self.engine.on_decay_expired(&self.locks, &mut self.out);
                }
            }
        }
    }

    #[test]
    fn test_intra_family_transitions_never_release() {
        let t0 = Instant::now();
        let mut rig = Rig::new();
        rig.enter(RegionId::Hitbox);
        assert_eq!(
            rig.leave(RegionId::Hitbox, Some(standard::CHAT_TEXTAREA), t0),
            LeaveOutcome::IntraFamily
        );
        rig.enter(RegionId::ChatGroup);
        assert_eq!(
            rig.leave(RegionId::ChatGroup, Some(standard::BUBBLE), t0 + MS),
            LeaveOutcome::IntraFamily
        );
        rig.expire(t0 + 1_000 * MS);
        assert_eq!(rig.out.passthrough_requests(), 0);
        assert_eq!(rig.out.capture_requests(), 2);
    }

    #[test]
    fn test_real_exit_releases_after_decay() {
        let t0 = Instant::now();
        let mut rig = Rig::new();
        rig.enter(RegionId::Hitbox);
        assert_eq!(rig.engine.state(), HoverState::Entering);
        rig.engine.on_pointer_move();
        assert_eq!(rig.engine.state(), HoverState::InsideStable);

        assert_eq!(
            rig.leave(RegionId::Hitbox, Some(standard::BODY), t0),
            LeaveOutcome::Exited
        );
        rig.expire(t0 + 149 * MS);
        assert_eq!(rig.out.passthrough_requests(), 0);
        rig.expire(t0 + 150 * MS);
        assert_eq!(rig.out.passthrough_requests(), 1);
    }

    #[test]
    fn test_reenter_cancels_pending_decay() {
        let t0 = Instant::now();
        let mut rig = Rig::new();
        rig.enter(RegionId::Hitbox);
        rig.leave(RegionId::Hitbox, None, t0);
        rig.enter(RegionId::Hitbox);
        assert!(!rig.timers.is_pending(TimerPurpose::PassthroughDecay));
        rig.expire(t0 + 500 * MS);
        assert_eq!(rig.out.passthrough_requests(), 0);
        assert_eq!(rig.out.host.last(), Some(&HostMessage::EnableCapture));
    }

    #[test]
    fn test_forced_passthrough_ignores_enter() {
        let mut rig = Rig::new();
        rig.locks.forced_passthrough = true;
        assert_eq!(rig.enter(RegionId::Hitbox), EnterOutcome::Ignored);
        assert!(rig.out.is_empty());
        assert_eq!(rig.engine.state(), HoverState::Outside);
    }

    #[test]
    fn test_decay_under_drag_keeps_capture() {
        let t0 = Instant::now();
        let mut rig = Rig::new();
        rig.enter(RegionId::Hitbox);
        rig.locks.dragging = true;
        rig.engine.on_window_leave(&mut rig.timers, t0);
        rig.expire(t0 + 200 * MS);
        assert_eq!(rig.out.passthrough_requests(), 0);
    }

    #[test]
    fn test_untracked_region_is_ignored() {
        let t0 = Instant::now();
        let registry = RegionRegistry::builder(standard::document())
            .region(RegionId::Hitbox, standard::HITBOX, UI_FAMILY)
            .build();
        let mut engine = HoverEngine::new(UI_FAMILY, 150 * MS);
        let mut timers = TimerSet::new();
        let mut out = Outbox::default();
        let locks = LockState::default();
        assert_eq!(
            engine.on_enter(RegionId::Bubble, &registry, &locks, &mut timers, &mut out),
            EnterOutcome::Ignored
        );
        assert_eq!(
            engine.on_leave(RegionId::Bubble, None, &registry, &mut timers, t0),
            LeaveOutcome::Ignored
        );
        assert!(timers.is_empty());
    }
}
