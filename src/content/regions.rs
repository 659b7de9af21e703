//! Static description of the interactive regions inside the overlay document.
//!
//! Built once at startup; nothing mutates it afterwards.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

use super::panels::PanelId;
use crate::error::OverlayError;

/// Opaque handle of one node in the content document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionId {
    Hitbox,
    ChatGroup,
    Settings,
    Bubble,
}

impl RegionId {
    /// Presses inside these regions may start a window drag.
    pub fn allows_window_drag(self) -> bool {
        matches!(self, RegionId::Hitbox)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyId(pub u8);

/// The family whose members the hover engine tracks.
pub const UI_FAMILY: FamilyId = FamilyId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Plain,
    /// Interactive child that never starts a drag.
    TextField,
    Button,
    /// Pressing here (outside text fields/buttons) drags the given panel.
    DragSurface(PanelId),
}

#[derive(Debug, Clone, Copy)]
struct NodeInfo {
    parent: Option<ElementHandle>,
    kind: ElementKind,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentTree {
    nodes: HashMap<ElementHandle, NodeInfo>,
}

impl DocumentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: ElementHandle, parent: Option<ElementHandle>, kind: ElementKind) {
        self.nodes.insert(handle, NodeInfo { parent, kind });
    }

    pub fn contains(&self, handle: ElementHandle) -> bool {
        self.nodes.contains_key(&handle)
    }

    pub fn kind(&self, handle: ElementHandle) -> Option<ElementKind> {
        self.nodes.get(&handle).map(|n| n.kind)
    }

    /// `handle` itself, then each ancestor up to the root.
    pub fn ancestors_inclusive(&self, handle: ElementHandle) -> impl Iterator<Item = ElementHandle> + '_ {
        let mut next = self.contains(handle).then_some(handle);
        // Bounded by node count so a malformed parent cycle cannot spin forever.
        let mut budget = self.nodes.len();
        std::iter::from_fn(move || {
            let current = next?;
            if budget == 0 {
                return None;
            }
            budget -= 1;
            next = self.nodes.get(&current).and_then(|n| n.parent);
            Some(current)
        })
    }

    pub fn is_same_or_descendant(&self, candidate: ElementHandle, ancestor: ElementHandle) -> bool {
        self.ancestors_inclusive(candidate).any(|h| h == ancestor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiRegion {
    pub id: RegionId,
    pub handle: ElementHandle,
    pub family: FamilyId,
}

#[derive(Debug, Clone)]
pub struct RegionRegistry {
    regions: SmallVec<[UiRegion; 8]>,
    tree: DocumentTree,
}

impl RegionRegistry {
    pub fn builder(tree: DocumentTree) -> RegionRegistryBuilder {
        RegionRegistryBuilder {
            regions: SmallVec::new(),
            tree,
        }
    }

    pub fn family_of(&self, region: RegionId) -> Option<FamilyId> {
        self.region(region).map(|r| r.family)
    }

    pub fn region(&self, region: RegionId) -> Option<&UiRegion> {
        self.regions.iter().find(|r| r.id == region)
    }

    pub fn require(&self, region: RegionId) -> Result<&UiRegion, OverlayError> {
        self.region(region)
            .ok_or_else(|| OverlayError::UnknownElement(format!("{region:?}")))
    }

    /// True if `candidate` is, or is nested inside, any member of `family`.
    pub fn is_member(&self, candidate: ElementHandle, family: FamilyId) -> bool {
        self.regions
            .iter()
            .filter(|r| r.family == family)
            .any(|r| self.tree.is_same_or_descendant(candidate, r.handle))
    }

    /// Innermost registered region containing `handle`.
    pub fn region_containing(&self, handle: ElementHandle) -> Option<RegionId> {
        self.tree
            .ancestors_inclusive(handle)
            .find_map(|h| self.regions.iter().find(|r| r.handle == h).map(|r| r.id))
    }

    /// Panel dragged by a press on `target`, unless the press lands on a text field or
    /// button first.
    pub fn drag_surface_for(&self, target: ElementHandle) -> Option<PanelId> {
        for handle in self.tree.ancestors_inclusive(target) {
            match self.tree.kind(handle)? {
                ElementKind::TextField | ElementKind::Button => return None,
                ElementKind::DragSurface(panel) => return Some(panel),
                ElementKind::Plain => {}
            }
        }
        None
    }
}

pub struct RegionRegistryBuilder {
    regions: SmallVec<[UiRegion; 8]>,
    tree: DocumentTree,
}

impl RegionRegistryBuilder {
    /// Register a region. A handle absent from the document disables that region for the
    /// session instead of failing startup.
    pub fn region(mut self, id: RegionId, handle: ElementHandle, family: FamilyId) -> Self {
        if !self.tree.contains(handle) {
            log::warn!("Region {id:?} ({handle:?}) not found in document; disabled");
            return self;
        }
        if self.regions.iter().any(|r| r.id == id) {
            log::warn!("Region {id:?} registered twice; keeping the first");
            return self;
        }
        self.regions.push(UiRegion { id, handle, family });
        self
    }

    pub fn build(self) -> RegionRegistry {
        RegionRegistry {
            regions: self.regions,
            tree: self.tree,
        }
    }
}

/// The pet overlay's fixed document: hitbox, chat group (input + history), settings
/// sheet and speech bubble.
pub mod standard {
    use super::*;

    pub const BODY: ElementHandle = ElementHandle(1);
    pub const HITBOX: ElementHandle = ElementHandle(10);
    pub const CHAT_WRAPPER: ElementHandle = ElementHandle(20);
    pub const CHAT_INPUT: ElementHandle = ElementHandle(21);
    pub const CHAT_TEXTAREA: ElementHandle = ElementHandle(22);
    pub const PIN_BUTTON: ElementHandle = ElementHandle(23);
    pub const HISTORY_TOGGLE: ElementHandle = ElementHandle(24);
    pub const PIN_ICON: ElementHandle = ElementHandle(25);
    pub const CHAT_HISTORY: ElementHandle = ElementHandle(30);
    pub const HISTORY_MESSAGES: ElementHandle = ElementHandle(31);
    pub const HISTORY_CLOSE: ElementHandle = ElementHandle(32);
    pub const SETTINGS: ElementHandle = ElementHandle(40);
    pub const SETTINGS_HEADER: ElementHandle = ElementHandle(41);
    pub const SETTINGS_FIELD: ElementHandle = ElementHandle(42);
    pub const SETTINGS_CLOSE: ElementHandle = ElementHandle(43);
    pub const BUBBLE: ElementHandle = ElementHandle(50);

    pub fn document() -> DocumentTree {
        use ElementKind::*;

        let mut tree = DocumentTree::new();
        tree.insert(BODY, None, Plain);
        tree.insert(HITBOX, Some(BODY), Plain);
        tree.insert(CHAT_WRAPPER, Some(BODY), Plain);
        tree.insert(CHAT_INPUT, Some(CHAT_WRAPPER), DragSurface(PanelId::ChatInput));
        tree.insert(CHAT_TEXTAREA, Some(CHAT_INPUT), TextField);
        tree.insert(PIN_BUTTON, Some(CHAT_INPUT), Button);
        tree.insert(PIN_ICON, Some(PIN_BUTTON), Plain);
        tree.insert(HISTORY_TOGGLE, Some(CHAT_INPUT), Button);
        tree.insert(CHAT_HISTORY, Some(CHAT_WRAPPER), Plain);
        tree.insert(HISTORY_MESSAGES, Some(CHAT_HISTORY), Plain);
        tree.insert(HISTORY_CLOSE, Some(CHAT_HISTORY), Button);
        tree.insert(SETTINGS, Some(BODY), Plain);
        tree.insert(SETTINGS_HEADER, Some(SETTINGS), DragSurface(PanelId::Settings));
        tree.insert(SETTINGS_FIELD, Some(SETTINGS), TextField);
        tree.insert(SETTINGS_CLOSE, Some(SETTINGS_HEADER), Button);
        tree.insert(BUBBLE, Some(BODY), Plain);
        tree
    }

    pub fn registry() -> RegionRegistry {
        RegionRegistry::builder(document())
            .region(RegionId::Hitbox, HITBOX, UI_FAMILY)
            .region(RegionId::ChatGroup, CHAT_WRAPPER, UI_FAMILY)
            .region(RegionId::Settings, SETTINGS, UI_FAMILY)
            .region(RegionId::Bubble, BUBBLE, UI_FAMILY)
            .build()
    }
}
