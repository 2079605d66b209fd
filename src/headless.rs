//! In-memory tree and virtual clock.
//!
//! Lets the scanner, decomposer and scheduler run without a browser: the
//! caller supplies the computed styles and geometry a layout engine would
//! have produced, and drives timers by advancing virtual time.
//!
//! [`HeadlessTree`] is append-only: detached nodes keep their slot so that
//! every [`NodeId`] handed out stays valid. Each round adds the overlay
//! clones for good, so the tree suits tests and bounded replays, not a
//! long-running effect.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::GlitchError;
use crate::scheduler::{TimerHost, TimerId};
use crate::tree::{ClientRect, Placement, Viewport, VisualTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct HeadlessNode {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    inline: BTreeMap<String, String>,
    computed: BTreeMap<String, String>,
    class: Option<String>,
    placement: Placement,
    rect: ClientRect,
}

/// A document held entirely in memory.
#[derive(Debug, Clone)]
pub struct HeadlessTree {
    nodes: Vec<HeadlessNode>,
    viewport: Viewport,
}

impl HeadlessTree {
    /// An empty document with a `body` root and the given viewport.
    pub fn new(width: f64, height: f64) -> Self {
        let body = HeadlessNode { tag: "body".to_owned(), ..HeadlessNode::default() };
        Self { nodes: vec![body], viewport: Viewport { width, height } }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Appends a new element under `parent`.
    pub fn insert(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(HeadlessNode { tag: tag.to_owned(), parent: Some(parent), ..HeadlessNode::default() });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Sets what the layout engine would report as the computed value.
    pub fn set_computed(&mut self, node: NodeId, property: &str, value: &str) {
        self.nodes[node.0].computed.insert(property.to_owned(), value.to_owned());
    }

    /// Sets both the offset box and a matching viewport rect.
    pub fn set_geometry(&mut self, node: NodeId, placement: Placement) {
        let n = &mut self.nodes[node.0];
        n.placement = placement;
        n.rect = ClientRect {
            left: placement.left,
            top: placement.top,
            right: placement.left + placement.width,
            bottom: placement.top + placement.height,
        };
    }

    /// Moves the element in viewport space without touching its offset box
    /// (scrolling does this).
    pub fn set_client_rect(&mut self, node: NodeId, rect: ClientRect) {
        self.nodes[node.0].rect = rect;
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Viewport { width, height };
    }

    pub fn inline_style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.nodes[node.0].inline.get(property).map(String::as_str)
    }

    pub fn class_name(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.0].class.as_deref()
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Every slot ever allocated, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Removes a node the way page script would, outside the effect.
    pub fn remove(&mut self, node: NodeId) {
        self.unlink(node);
    }

    /// Attached nodes carrying `class`.
    pub fn count_class(&self, class: &str) -> usize {
        self.walk(self.root())
            .into_iter()
            .filter(|id| self.nodes[id.0].class.as_deref() == Some(class))
            .count()
    }

    fn walk(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[root.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    fn unlink(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes[node.0].parent.take() else {
            return false;
        };
        self.nodes[parent.0].children.retain(|c| *c != node);
        true
    }

    fn check(&self, node: NodeId) -> Result<(), GlitchError> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(GlitchError::InvalidTreeOperation(format!("unknown node {node:?}")))
        }
    }

    fn clone_subtree(&mut self, node: NodeId) -> NodeId {
        let mut copy = self.nodes[node.0].clone();
        copy.parent = None;
        let children = std::mem::take(&mut copy.children);
        let id = NodeId(self.nodes.len());
        self.nodes.push(copy);
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.nodes[child_copy.0].parent = Some(id);
            self.nodes[id.0].children.push(child_copy);
        }
        id
    }
}

fn default_computed(property: &str) -> Option<&'static str> {
    match property {
        "color" | "border-color" => Some("rgb(0, 0, 0)"),
        "background-color" => Some("rgba(0, 0, 0, 0)"),
        "top" | "left" => Some("auto"),
        _ => None,
    }
}

impl VisualTree for HeadlessTree {
    type Node = NodeId;

    fn descendants(&self, root: &NodeId) -> Vec<NodeId> {
        self.walk(*root)
    }

    fn computed_style(&self, node: &NodeId, property: &str) -> Option<String> {
        let n = self.nodes.get(node.0)?;
        n.computed
            .get(property)
            .cloned()
            .or_else(|| default_computed(property).map(str::to_owned))
    }

    fn placement(&self, node: &NodeId) -> Placement {
        self.nodes[node.0].placement
    }

    fn client_rect(&self, node: &NodeId) -> ClientRect {
        self.nodes[node.0].rect
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let mut current = *node;
        loop {
            if current == self.root() {
                return true;
            }
            match self.nodes.get(current.0).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn create_container(&mut self) -> Result<NodeId, GlitchError> {
        let id = NodeId(self.nodes.len());
        self.nodes.push(HeadlessNode { tag: "div".to_owned(), ..HeadlessNode::default() });
        Ok(id)
    }

    fn deep_clone(&mut self, node: &NodeId) -> Result<NodeId, GlitchError> {
        self.check(*node)?;
        Ok(self.clone_subtree(*node))
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) -> Result<(), GlitchError> {
        self.check(*node)?;
        self.nodes[node.0].inline.insert(property.to_owned(), value.to_owned());
        Ok(())
    }

    fn set_class(&mut self, node: &NodeId, class: &str) -> Result<(), GlitchError> {
        self.check(*node)?;
        self.nodes[node.0].class = Some(class.to_owned());
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), GlitchError> {
        self.check(*parent)?;
        self.check(*child)?;
        if parent == child {
            return Err(GlitchError::InvalidTreeOperation("node appended to itself".to_owned()));
        }
        self.unlink(*child);
        self.nodes[child.0].parent = Some(*parent);
        self.nodes[parent.0].children.push(*child);
        Ok(())
    }

    fn detach(&mut self, node: &NodeId) -> Result<(), GlitchError> {
        self.check(*node)?;
        if self.unlink(*node) {
            Ok(())
        } else {
            Err(GlitchError::InvalidTreeOperation(format!("{node:?} has no parent")))
        }
    }
}

/// Virtual-time timer host.
///
/// Timers fire in deadline order; ties fire in arming order.
#[derive(Debug, Default)]
pub struct ManualTimers {
    now: Duration,
    seq: u64,
    pending: Vec<(Duration, u64, TimerId)>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn deadline(&self, id: TimerId) -> Option<Duration> {
        self.pending.iter().find(|(_, _, t)| *t == id).map(|(at, _, _)| *at)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|(at, _, _)| *at).min()
    }

    /// Pops the earliest timer due at or before `limit`, advancing the clock
    /// to its deadline.
    pub fn pop_due(&mut self, limit: Duration) -> Option<TimerId> {
        let (index, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (at, _, _))| *at <= limit)
            .min_by_key(|(_, (at, seq, _))| (*at, *seq))?;
        let (at, _, id) = self.pending.remove(index);
        self.now = self.now.max(at);
        Some(id)
    }

    /// Pops the earliest pending timer regardless of its deadline.
    pub fn pop_next(&mut self) -> Option<TimerId> {
        let limit = self.next_deadline()?;
        self.pop_due(limit)
    }

    /// Moves the clock forward without firing anything.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl TimerHost for ManualTimers {
    fn arm(&mut self, id: TimerId, delay: Duration) {
        self.seq += 1;
        self.pending.push((self.now + delay, self.seq, id));
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|(_, _, t)| *t != id);
    }
}
