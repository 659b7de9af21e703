use serde::Serialize;

use super::panels::PanelId;
use crate::ipc::HostMessage;
use crate::services::layout::Point;

/// View-side consequence of a content event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiEffect {
    PanelVisibility { panel: PanelId, visible: bool },
    PanelMoved { panel: PanelId, origin: Point },
    BubbleShown { text: String },
    BubbleHidden,
}

/// Everything one handler run produced, in emission order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Outbox {
    pub host: Vec<HostMessage>,
    pub ui: Vec<UiEffect>,
}

impl Outbox {
    pub fn send(&mut self, message: HostMessage) {
        self.host.push(message);
    }

    pub fn emit(&mut self, effect: UiEffect) {
        self.ui.push(effect);
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_empty() && self.ui.is_empty()
    }

    pub fn append(&mut self, other: Outbox) {
        self.host.extend(other.host);
        self.ui.extend(other.ui);
    }

    pub fn capture_requests(&self) -> usize {
        self.count(|m| matches!(m, HostMessage::EnableCapture))
    }

    pub fn passthrough_requests(&self) -> usize {
        self.count(|m| matches!(m, HostMessage::DisableCapture))
    }

    pub fn visibility_changes(&self, panel: PanelId) -> Vec<bool> {
        self.ui
            .iter()
            .filter_map(|e| match e {
                UiEffect::PanelVisibility { panel: p, visible } if *p == panel => Some(*visible),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&HostMessage) -> bool) -> usize {
        self.host.iter().filter(|m| pred(m)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effects_serialize_with_type_tag() {
        let shown = UiEffect::PanelVisibility {
            panel: PanelId::ChatHistory,
            visible: true,
        };
        assert_eq!(
            serde_json::to_value(&shown).unwrap(),
            serde_json::json!({"type": "panelVisibility", "panel": "chatHistory", "visible": true})
        );

        let moved = UiEffect::PanelMoved {
            panel: PanelId::Settings,
            origin: Point::new(12.0, 30.0),
        };
        assert_eq!(
            serde_json::to_value(&moved).unwrap(),
            serde_json::json!({"type": "panelMoved", "panel": "settings", "origin": {"x": 12.0, "y": 30.0}})
        );
        assert_eq!(
            serde_json::to_value(UiEffect::BubbleHidden).unwrap(),
            serde_json::json!({"type": "bubbleHidden"})
        );
    }
}
