//! Interactivity contract for the rendered figure.
//!
//! Figure nodes sit on top of the hitbox; a node that claims pointer events would steal
//! presses meant for it. Every node is therefore non-interactive unless its name is on the
//! whitelist, and the decision is made once when the tree is built.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    name: String,
    interactive: bool,
    children: Vec<RenderNode>,
}

impl RenderNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interactive: false,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: RenderNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn children(&self) -> &[RenderNode] {
        &self.children
    }

    /// Depth-first, parents before children.
    pub fn walk(&self) -> Vec<&RenderNode> {
        let mut stack = vec![self];
        let mut nodes = Vec::new();
        while let Some(node) = stack.pop() {
            nodes.push(node);
            stack.extend(node.children.iter().rev());
        }
        nodes
    }
}

#[derive(Debug, Clone, Default)]
pub struct InteractivityPolicy {
    whitelist: HashSet<String>,
}

impl InteractivityPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, name: impl Into<String>) -> Self {
        self.whitelist.insert(name.into());
        self
    }

    pub fn build(&self, mut root: RenderNode) -> RenderTree {
        self.apply(&mut root);
        RenderTree { root }
    }

    fn apply(&self, node: &mut RenderNode) {
        node.interactive = self.whitelist.contains(&node.name);
        for child in &mut node.children {
            self.apply(child);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderTree {
    root: RenderNode,
}

impl RenderTree {
    pub fn root(&self) -> &RenderNode {
        &self.root
    }

    pub fn node_count(&self) -> usize {
        self.root.walk().len()
    }

    pub fn interactive_nodes(&self) -> Vec<&str> {
        self.root
            .walk()
            .into_iter()
            .filter(|n| n.interactive)
            .map(|n| n.name.as_str())
            .collect()
    }

    pub fn intercepts_pointer(&self) -> bool {
        self.root.walk().iter().any(|n| n.interactive)
    }
}

/// Fallback figure used when no model is loaded: a face with two eyes.
pub fn placeholder_figure() -> RenderNode {
    RenderNode::new("figure")
        .with_child(RenderNode::new("left-eye"))
        .with_child(RenderNode::new("right-eye"))
}
