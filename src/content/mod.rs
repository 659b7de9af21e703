//! Content side of the overlay: decides when the window should capture the pointer.

pub mod bubble;
pub mod controller;
pub mod drag;
pub mod effects;
pub mod hover;
pub mod locks;
pub mod panels;
pub mod regions;
pub mod render;
pub mod timers;

pub use controller::{ContentController, ContentEvent, ContentLayout};
pub use effects::{Outbox, UiEffect};
pub use panels::PanelId;
