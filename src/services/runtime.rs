//! Tokio tasks hosting the two contexts.
//!
//! Each context is one task; handlers run to completion before the next message is taken.
//! The only link between them is the pair of unbounded channels in [`crate::ipc`].

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::content::bubble::BubbleSurface;
use crate::content::{ContentController, ContentEvent, Outbox, UiEffect};
use crate::ipc::{ContentReceiver, HostReceiver, HostSender, content_channel, host_channel};
use crate::windows::passthrough::PassthroughCoordinator;

pub type EventSender = mpsc::UnboundedSender<ContentEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ContentEvent>;

/// Where view effects end up (DOM bridge, recorder, log).
pub trait ContentView: Send + 'static {
    fn apply(&mut self, effect: &UiEffect);
}

/// Logs effects; used by the headless binary.
#[derive(Debug, Default)]
pub struct LogView;

impl ContentView for LogView {
    fn apply(&mut self, effect: &UiEffect) {
        log::info!("view: {effect:?}");
    }
}

/// Handle the chat client uses to reach the content task.
#[derive(Debug, Clone)]
pub struct ContentHandle {
    events: EventSender,
}

impl ContentHandle {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }

    pub fn send(&self, event: ContentEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

impl BubbleSurface for ContentHandle {
    fn show_bubble(&mut self, text: &str, duration_ms: u64) {
        if !self.send(ContentEvent::ShowBubble {
            text: text.to_owned(),
            duration_ms: Some(duration_ms),
        }) {
            log::debug!("Content task gone; bubble dropped");
        }
    }

    fn hide_bubble(&mut self) {
        let _ = self.send(ContentEvent::HideBubble);
    }
}

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Apply host messages in send order until every sender is dropped.
pub fn spawn_window_owner(coordinator: Arc<PassthroughCoordinator>, mut rx: HostReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            coordinator.handle(message);
        }
        log::debug!("Window owner task stopped: content side closed");
    })
}

/// Both context tasks of a running overlay plus the handle that feeds content events.
pub struct OverlayTasks {
    pub handle: ContentHandle,
    pub content: JoinHandle<ContentController>,
    pub owner: JoinHandle<()>,
}

/// Connect `coordinator` and `controller` over fresh channels and spawn both tasks.
///
/// Must be called inside a tokio runtime. Dropping every clone of the returned handle
/// stops the content task, which in turn stops the owner task.
pub fn start_overlay<V: ContentView>(
    coordinator: Arc<PassthroughCoordinator>,
    controller: ContentController,
    view: V,
) -> OverlayTasks {
    let (host_tx, host_rx) = host_channel();
    let (content_tx, content_rx) = content_channel();
    let (events, event_rx) = event_channel();
    coordinator.connect_content(content_tx);

    let owner = spawn_window_owner(coordinator, host_rx);
    let content = spawn_content_controller(controller, event_rx, content_rx, host_tx, view);
    OverlayTasks {
        handle: ContentHandle::new(events),
        content,
        owner,
    }
}

/// Drive the controller until the event stream closes. Returns it for inspection.
pub fn spawn_content_controller<V: ContentView>(
    mut controller: ContentController,
    mut events: EventReceiver,
    mut from_owner: ContentReceiver,
    to_owner: HostSender,
    mut view: V,
) -> JoinHandle<ContentController> {
    tokio::spawn(async move {
        let mut owner_open = true;
        loop {
            let deadline = controller.next_deadline();
            // Owner messages first, then input, then timers: an event that is already queued
            // always runs before a timer that expired at the same moment.
            let outbox = tokio::select! {
                biased;
                message = from_owner.recv(), if owner_open => match message {
                    Some(message) => controller.handle_message(message, Instant::now()),
                    None => {
                        owner_open = false;
                        continue;
                    }
                },
                event = events.recv() => match event {
                    Some(event) => controller.handle(event, Instant::now()),
                    None => break,
                },
                _ = sleep_until_deadline(deadline) => controller.fire_due(Instant::now()),
            };
            dispatch(outbox, &to_owner, &mut view);
        }
        log::debug!("Content task stopped: event stream closed");
        controller
    })
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn dispatch<V: ContentView>(outbox: Outbox, to_owner: &HostSender, view: &mut V) {
    for message in outbox.host {
        if to_owner.send(message).is_err() {
            log::debug!("Window owner gone; dropped {message:?}");
        }
    }
    for effect in &outbox.ui {
        view.apply(effect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::regions::RegionId;
    use crate::services::config::OverlayConfig;
    use crate::services::layout::Rect;
    use crate::windows::passthrough::MemoryWindow;
    use std::time::Duration;

    struct Rig {
        coordinator: Arc<PassthroughCoordinator>,
        window: MemoryWindow,
        events: EventSender,
        content: JoinHandle<ContentController>,
    }

    fn start() -> Rig {
        let config = OverlayConfig::default();
        let coordinator = Arc::new(PassthroughCoordinator::new(&config));
        let window = MemoryWindow::new(Rect::new(0.0, 0.0, 500.0, 500.0));
        coordinator.attach_window(Box::new(window.clone()));

        let (host_tx, host_rx) = host_channel();
        let (content_tx, content_rx) = content_channel();
        let (events, event_rx) = event_channel();
        coordinator.connect_content(content_tx);

        spawn_window_owner(coordinator.clone(), host_rx);
        let content = spawn_content_controller(
            ContentController::standard(&config),
            event_rx,
            content_rx,
            host_tx,
            LogView,
        );
        Rig {
            coordinator,
            window,
            events,
            content,
        }
    }

    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentry_beats_decay() {
        let rig = start();
        rig.events
            .send(ContentEvent::PointerEnter { region: RegionId::Hitbox })
            .unwrap();
        settle(1).await;
        assert!(rig.coordinator.is_capturing());
        assert!(!rig.window.snapshot().ignore_cursor_events);

        rig.events
            .send(ContentEvent::PointerLeave {
                region: RegionId::Hitbox,
                related: None,
            })
            .unwrap();
        settle(100).await;
        rig.events
            .send(ContentEvent::PointerEnter { region: RegionId::Hitbox })
            .unwrap();
        settle(400).await;
        assert!(rig.coordinator.is_capturing());

        rig.events.send(ContentEvent::WindowLeave).unwrap();
        settle(149).await;
        assert!(rig.coordinator.is_capturing());
        settle(2).await;
        assert!(!rig.coordinator.is_capturing());
        assert!(rig.window.snapshot().ignore_cursor_events);
        assert_eq!(rig.coordinator.stats().passthrough_applied, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_passthrough_reaches_content() {
        let rig = start();
        rig.events
            .send(ContentEvent::PointerEnter { region: RegionId::Hitbox })
            .unwrap();
        settle(600).await;

        rig.coordinator.set_forced_passthrough(true);
        settle(1).await;
        rig.events
            .send(ContentEvent::PointerEnter { region: RegionId::Hitbox })
            .unwrap();
        settle(1).await;
        assert!(!rig.coordinator.is_capturing());

        drop(rig.events);
        let controller = rig.content.await.unwrap();
        assert!(controller.locks().forced_passthrough);
        assert!(!controller.is_panel_visible(crate::content::PanelId::ChatInput));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bubble_through_handle() {
        let rig = start();
        let mut handle = ContentHandle::new(rig.events.clone());
        handle.show_bubble("hi there", 0);
        settle(10_000).await;
        drop(handle);
        drop(rig.events);
        let controller = rig.content.await.unwrap();
        assert_eq!(controller.bubble_text(), Some("hi there"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_overlay_wires_both_directions() {
        let config = OverlayConfig::default();
        let coordinator = Arc::new(PassthroughCoordinator::new(&config));
        let window = MemoryWindow::new(Rect::new(0.0, 0.0, 500.0, 500.0));
        coordinator.attach_window(Box::new(window.clone()));
        let tasks = start_overlay(coordinator.clone(), ContentController::standard(&config), LogView);

        assert!(tasks.handle.send(ContentEvent::PointerEnter { region: RegionId::Hitbox }));
        settle(1).await;
        assert!(coordinator.is_capturing());
        assert!(!window.snapshot().ignore_cursor_events);

        coordinator.set_forced_passthrough(true);
        settle(1).await;
        drop(tasks.handle);
        let controller = tasks.content.await.unwrap();
        assert!(controller.locks().forced_passthrough);
        tasks.owner.await.unwrap();
        assert!(window.snapshot().ignore_cursor_events);
    }
}
