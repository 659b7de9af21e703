use std::time::Duration;

use deskpet_lib::content::drag::PointerButton;
use deskpet_lib::content::regions::{ElementHandle, RegionId, standard};
use deskpet_lib::content::timers::TimerPurpose;
use deskpet_lib::content::{ContentController, ContentEvent, Outbox, PanelId};
use deskpet_lib::ipc::{ContentMessage, HostMessage};
use deskpet_lib::services::layout::Point;
use deskpet_lib::OverlayConfig;
use tokio::time::Instant;

const MS: Duration = Duration::from_millis(1);

/// Feeds events at explicit times and collects everything the controller sends.
struct Harness {
    controller: ContentController,
    t0: Instant,
    now: Instant,
    log: Outbox,
}

impl Harness {
    fn new() -> Self {
        let t0 = Instant::now();
        Self {
            controller: ContentController::standard(&OverlayConfig::default()),
            t0,
            now: t0,
            log: Outbox::default(),
        }
    }

    /// Advance to `at_ms`, firing due timers on the way, then handle `event`.
    fn at(&mut self, at_ms: u64, event: ContentEvent) -> &mut Self {
        self.advance_to(at_ms);
        let out = self.controller.handle(event, self.now);
        self.log.append(out);
        self
    }

    fn message_at(&mut self, at_ms: u64, message: ContentMessage) -> &mut Self {
        self.advance_to(at_ms);
        let out = self.controller.handle_message(message, self.now);
        self.log.append(out);
        self
    }

    fn advance_to(&mut self, at_ms: u64) {
        let target = self.t0 + Duration::from_millis(at_ms);
        while let Some(deadline) = self.controller.next_deadline() {
            if deadline > target {
                break;
            }
            let out = self.controller.fire_due(deadline);
            self.log.append(out);
        }
        self.now = target;
    }

    fn take_log(&mut self) -> Outbox {
        std::mem::take(&mut self.log)
    }
}

fn enter(region: RegionId) -> ContentEvent {
    ContentEvent::PointerEnter { region }
}

fn leave(region: RegionId, related: Option<ElementHandle>) -> ContentEvent {
    ContentEvent::PointerLeave { region, related }
}

fn press(target: ElementHandle, screen: Point) -> ContentEvent {
    ContentEvent::PointerDown {
        button: PointerButton::Primary,
        target,
        screen,
        client: Point::new(250.0, 250.0),
    }
}

/// Small deterministic generator; the crate has no property-testing dependency.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

#[test]
fn same_family_transitions_never_request_passthrough() {
    let family = [
        (RegionId::Hitbox, standard::HITBOX),
        (RegionId::ChatGroup, standard::CHAT_TEXTAREA),
        (RegionId::Settings, standard::SETTINGS_FIELD),
        (RegionId::Bubble, standard::BUBBLE),
    ];
    for seed in 1..50u64 {
        let mut rng = Lcg(seed);
        let mut h = Harness::new();
        let mut t = 0;
        let mut current = family[0];
        h.at(t, enter(current.0));
        for _ in 0..40 {
            let next = family[(rng.next() % 4) as usize];
            t += rng.next() % 400;
            h.at(t, leave(current.0, Some(next.1)));
            t += rng.next() % 20;
            h.at(t, enter(next.0));
            current = next;
        }
        h.advance_to(t + 5_000);
        assert_eq!(h.log.passthrough_requests(), 0, "seed {seed}");
    }
}

#[test]
fn capture_wins_over_pending_decay() {
    let mut h = Harness::new();
    h.at(0, enter(RegionId::Hitbox));
    h.at(10, leave(RegionId::Hitbox, Some(standard::BODY)));
    assert!(h.controller.timers().is_pending(TimerPurpose::PassthroughDecay));

    // Re-entry lands just before the decay deadline.
    h.at(159, enter(RegionId::Hitbox));
    assert!(!h.controller.timers().is_pending(TimerPurpose::PassthroughDecay));
    h.advance_to(2_000);

    let log = h.take_log();
    assert_eq!(log.passthrough_requests(), 0);
    assert_eq!(log.host.last(), Some(&HostMessage::EnableCapture));
}

#[test]
fn no_passthrough_while_dragging() {
    let mut h = Harness::new();
    h.at(0, enter(RegionId::Hitbox));
    h.at(5, press(standard::HITBOX, Point::new(800.0, 400.0)));
    for i in 0..10u64 {
        let t = 10 + i * 300;
        h.at(t, leave(RegionId::Hitbox, None));
        h.at(t + 1, ContentEvent::WindowLeave);
        h.at(
            t + 2,
            ContentEvent::PointerMove {
                screen: Point::new(800.0 + i as f64, 400.0),
                client: Point::new(250.0, 250.0),
            },
        );
    }
    h.advance_to(10_000);
    assert!(h.controller.locks().dragging);
    assert_eq!(h.log.passthrough_requests(), 0);
}

#[test]
fn forced_passthrough_blocks_capture_until_cleared() {
    let mut h = Harness::new();
    h.message_at(0, ContentMessage::ForcedPassthroughChanged { is_forced: true });
    h.at(10, enter(RegionId::Hitbox));
    h.at(20, leave(RegionId::Hitbox, None));
    h.at(30, enter(RegionId::ChatGroup));
    h.at(40, press(standard::HITBOX, Point::new(10.0, 10.0)));
    h.at(50, ContentEvent::PointerUp { client: Point::new(250.0, 250.0) });
    h.at(60, ContentEvent::ContextMenu { target: standard::HITBOX });
    h.advance_to(3_000);
    assert_eq!(h.take_log().capture_requests(), 0);

    h.message_at(3_000, ContentMessage::ForcedPassthroughChanged { is_forced: false });
    h.at(3_010, enter(RegionId::Hitbox));
    assert_eq!(h.take_log().host, vec![HostMessage::EnableCapture]);
}

#[test]
fn show_and_hide_timers_never_overlap() {
    let events = [
        enter(RegionId::Hitbox),
        leave(RegionId::Hitbox, None),
        leave(RegionId::Hitbox, Some(standard::CHAT_INPUT)),
        enter(RegionId::ChatGroup),
        ContentEvent::WindowLeave,
        ContentEvent::TogglePin,
        ContentEvent::ToggleHistory,
        ContentEvent::ContextMenu { target: standard::HITBOX },
        ContentEvent::CloseSettings,
    ];
    for seed in 1..100u64 {
        let mut rng = Lcg(seed);
        let mut h = Harness::new();
        let mut t = 0;
        for _ in 0..60 {
            t += rng.next() % 700;
            let event = events[(rng.next() as usize) % events.len()].clone();
            h.at(t, event);
            for panel in PanelId::DISMISSIBLE {
                let timers = h.controller.timers();
                assert!(
                    !(timers.is_pending(TimerPurpose::ShowPanel(panel))
                        && timers.is_pending(TimerPurpose::HidePanel(panel))),
                    "seed {seed}: both timers pending for {panel:?}"
                );
            }
        }
    }
}

#[test]
fn hover_shows_input_panel_once_after_delay() {
    let mut h = Harness::new();
    h.at(0, enter(RegionId::Hitbox));
    h.at(
        100,
        ContentEvent::PointerMove {
            screen: Point::new(300.0, 300.0),
            client: Point::new(250.0, 250.0),
        },
    );
    h.advance_to(499);
    assert!(!h.controller.is_panel_visible(PanelId::ChatInput));
    h.advance_to(500);
    assert!(h.controller.is_panel_visible(PanelId::ChatInput));

    h.advance_to(3_000);
    let log = h.take_log();
    assert_eq!(log.visibility_changes(PanelId::ChatInput), vec![true]);
    assert!(log.visibility_changes(PanelId::ChatHistory).is_empty());
    assert!(h.controller.timers().is_empty());
}

#[test]
fn decay_starts_only_at_final_exit() {
    let mut h = Harness::new();
    h.at(0, enter(RegionId::Hitbox));
    h.at(600, leave(RegionId::Hitbox, Some(standard::CHAT_TEXTAREA)));
    assert!(!h.controller.timers().is_pending(TimerPurpose::PassthroughDecay));
    h.at(610, enter(RegionId::ChatGroup));
    assert!(h.controller.is_panel_visible(PanelId::ChatInput));

    h.at(1_500, leave(RegionId::ChatGroup, Some(standard::BODY)));
    assert_eq!(
        h.controller.timers().deadline(TimerPurpose::PassthroughDecay),
        Some(h.t0 + 1_650 * MS)
    );
    h.advance_to(1_649);
    assert_eq!(h.log.passthrough_requests(), 0);
    h.advance_to(1_650);
    assert_eq!(h.log.passthrough_requests(), 1);

    // Hide follows the hide delay after the same exit.
    h.advance_to(2_000);
    assert!(!h.controller.is_panel_visible(PanelId::ChatInput));
}

#[test]
fn drag_released_outside_window_resolves_to_passthrough() {
    let mut h = Harness::new();
    h.at(0, enter(RegionId::Hitbox));
    h.at(10, press(standard::HITBOX, Point::new(800.0, 400.0)));
    h.at(20, ContentEvent::WindowLeave);
    h.at(500, ContentEvent::PointerUp { client: Point::new(-40.0, 700.0) });

    assert!(!h.controller.locks().dragging);
    let log = h.take_log();
    assert_eq!(log.passthrough_requests(), 1);
    assert_eq!(log.host.last(), Some(&HostMessage::DisableCapture));
    assert!(!h.controller.timers().is_pending(TimerPurpose::PassthroughDecay));
}

#[test]
fn drag_released_over_hitbox_keeps_capture() {
    let mut h = Harness::new();
    h.at(0, enter(RegionId::Hitbox));
    h.at(10, press(standard::HITBOX, Point::new(800.0, 400.0)));
    h.at(20, leave(RegionId::Hitbox, None));
    h.at(300, ContentEvent::PointerUp { client: Point::new(250.0, 250.0) });
    h.advance_to(2_000);

    assert!(!h.controller.locks().dragging);
    assert_eq!(h.log.passthrough_requests(), 0);
}

#[test]
fn forced_mid_drag_still_clears_dragging() {
    let mut h = Harness::new();
    h.at(0, enter(RegionId::Hitbox));
    h.at(10, press(standard::HITBOX, Point::new(800.0, 400.0)));
    h.message_at(50, ContentMessage::ForcedPassthroughChanged { is_forced: true });
    h.at(100, ContentEvent::PointerUp { client: Point::new(250.0, 250.0) });
    assert!(!h.controller.locks().dragging);
    h.take_log();

    h.at(200, enter(RegionId::Hitbox));
    h.at(300, press(standard::HITBOX, Point::new(800.0, 400.0)));
    assert_eq!(h.take_log().capture_requests(), 0);
}

#[test]
fn window_drag_sends_clamped_deltas() {
    let mut h = Harness::new();
    h.at(0, press(standard::HITBOX, Point::new(800.0, 400.0)));
    h.at(
        10,
        ContentEvent::PointerMove {
            screen: Point::new(1200.0, 380.0),
            client: Point::new(250.0, 250.0),
        },
    );
    let log = h.take_log();
    assert_eq!(
        log.host,
        vec![
            HostMessage::EnableCapture,
            HostMessage::MoveWindowBy { dx: 100.0, dy: -20.0 },
        ]
    );
}

#[test]
fn press_inside_chat_panel_never_drags_window() {
    let mut h = Harness::new();
    h.at(0, press(standard::CHAT_TEXTAREA, Point::new(800.0, 400.0)));
    h.at(10, press(standard::HISTORY_MESSAGES, Point::new(800.0, 400.0)));
    h.at(20, press(standard::BUBBLE, Point::new(800.0, 400.0)));
    assert!(h.controller.drag_kind().is_none());
    assert!(!h.controller.locks().dragging);
    assert!(h.take_log().is_empty());
}
