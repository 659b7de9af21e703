use std::time::Duration;
use tokio::time::Instant;

use super::effects::{Outbox, UiEffect};
use super::timers::{TimerPurpose, TimerSet};

/// What the chat/vision client needs to surface a reply.
pub trait BubbleSurface {
    /// `duration_ms == 0` keeps the text until it is replaced or hidden.
    fn show_bubble(&mut self, text: &str, duration_ms: u64);
    fn hide_bubble(&mut self);
}

#[derive(Debug, Default)]
pub struct SpeechBubble {
    text: Option<String>,
}

impl SpeechBubble {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn show(&mut self, text: &str, duration_ms: u64, timers: &mut TimerSet, now: Instant, out: &mut Outbox) {
        self.text = Some(text.to_owned());
        out.emit(UiEffect::BubbleShown {
            text: text.to_owned(),
        });
        if duration_ms == 0 {
            timers.cancel(TimerPurpose::BubbleExpire);
        } else {
            timers.start(TimerPurpose::BubbleExpire, now, Duration::from_millis(duration_ms));
        }
    }

    pub fn hide(&mut self, timers: &mut TimerSet, out: &mut Outbox) {
        timers.cancel(TimerPurpose::BubbleExpire);
        if self.text.take().is_some() {
            out.emit(UiEffect::BubbleHidden);
        }
    }
}
