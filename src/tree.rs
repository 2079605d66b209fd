//! The visual tree the effect runs against.
//!
//! Layout and style resolution belong to the host (the browser, or the
//! in-memory tree used by tests). The effect only reads computed colors and
//! geometry and creates, styles and removes its own overlay nodes.

use std::fmt;

use crate::error::GlitchError;

/// Offset box of an element relative to its offset parent, in CSS px.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

/// Bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ClientRect {
    /// All four edges inside a `width` x `height` viewport.
    pub fn within(&self, viewport: Viewport) -> bool {
        self.top >= 0.0
            && self.left >= 0.0
            && self.bottom <= viewport.height
            && self.right <= viewport.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Read/write access to the host's element tree.
pub trait VisualTree {
    type Node: Clone + PartialEq + fmt::Debug;

    /// Every element below `root` in document order, `root` excluded.
    fn descendants(&self, root: &Self::Node) -> Vec<Self::Node>;

    /// Resolved value of a CSS property (`"color"`, `"background-color"`, ...).
    fn computed_style(&self, node: &Self::Node, property: &str) -> Option<String>;

    fn placement(&self, node: &Self::Node) -> Placement;

    fn client_rect(&self, node: &Self::Node) -> ClientRect;

    fn viewport(&self) -> Viewport;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Whether the node is still attached to the document.
    fn is_connected(&self, node: &Self::Node) -> bool;

    /// A new, detached, unstyled block container.
    fn create_container(&mut self) -> Result<Self::Node, GlitchError>;

    /// A detached copy of `node` and its whole subtree. O(subtree size).
    fn deep_clone(&mut self, node: &Self::Node) -> Result<Self::Node, GlitchError>;

    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str) -> Result<(), GlitchError>;

    fn set_class(&mut self, node: &Self::Node, class: &str) -> Result<(), GlitchError>;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), GlitchError>;

    /// Removes `node` from its parent.
    fn detach(&mut self, node: &Self::Node) -> Result<(), GlitchError>;

    /// Applies several inline declarations in order.
    fn apply_css(&mut self, node: &Self::Node, declarations: &[(&str, &str)]) -> Result<(), GlitchError> {
        for (property, value) in declarations {
            self.set_style(node, property, value)?;
        }
        Ok(())
    }
}

/// `"12px"` / `"12"` -> `Some(12.0)`; `"auto"` and friends -> `None`.
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value);
    number.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// CSS length in px, without a trailing `.0` for whole numbers.
pub fn px(value: f64) -> String {
    format!("{value}px")
}
