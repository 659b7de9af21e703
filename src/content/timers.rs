//! Deferred actions keyed by purpose.
//!
//! At most one timer per purpose is pending. Starting a timer replaces any pending one of
//! the same purpose; cancelling removes the record, so a cancelled timer can never fire.

use smallvec::SmallVec;
use std::time::Duration;
use tokio::time::Instant;

use super::panels::PanelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerPurpose {
    PassthroughDecay,
    ShowPanel(PanelId),
    HidePanel(PanelId),
    BubbleExpire,
}

/// Identifies one scheduled instance of a purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub purpose: TimerPurpose,
    generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    handle: TimerHandle,
    deadline: Instant,
}

#[derive(Debug, Default)]
pub struct TimerSet {
    pending: SmallVec<[Pending; 8]>,
    next_generation: u64,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, purpose: TimerPurpose, now: Instant, delay: Duration) -> TimerHandle {
        self.cancel(purpose);
        self.next_generation += 1;
        let handle = TimerHandle {
            purpose,
            generation: self.next_generation,
        };
        self.pending.push(Pending {
            handle,
            deadline: now + delay,
        });
        handle
    }

    /// Returns whether a timer of this purpose was pending.
    pub fn cancel(&mut self, purpose: TimerPurpose) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle.purpose != purpose);
        before != self.pending.len()
    }

    pub fn cancel_where(&mut self, mut predicate: impl FnMut(TimerPurpose) -> bool) {
        self.pending.retain(|p| !predicate(p.handle.purpose));
    }

    pub fn is_pending(&self, purpose: TimerPurpose) -> bool {
        self.pending.iter().any(|p| p.handle.purpose == purpose)
    }

    pub fn is_current(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    pub fn deadline(&self, purpose: TimerPurpose) -> Option<Instant> {
        self.pending
            .iter()
            .find(|p| p.handle.purpose == purpose)
            .map(|p| p.deadline)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> SmallVec<[TimerHandle; 4]> {
        let mut due: SmallVec<[Pending; 4]> = SmallVec::new();
        self.pending.retain(|p| {
            if p.deadline <= now {
                due.push(*p);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|p| (p.deadline, p.handle.generation));
        due.into_iter().map(|p| p.handle).collect()
    }
}
