//! Finds the elements whose computed colors hit the target.

use crate::color;
use crate::decompose::Overlay;
use crate::scheduler::TimerId;
use crate::tree::{Placement, VisualTree};

/// One of the three color properties the scanner inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorProperty {
    Color,
    BackgroundColor,
    BorderColor,
}

impl ColorProperty {
    pub const ALL: [ColorProperty; 3] = [Self::Color, Self::BackgroundColor, Self::BorderColor];

    pub fn css_name(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::BackgroundColor => "background-color",
            Self::BorderColor => "border-color",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Which properties matched, carrying the matched canonical hex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchVector {
    slots: [Option<String>; 3],
}

impl MatchVector {
    pub fn get(&self, property: ColorProperty) -> Option<&str> {
        self.slots[property.slot()].as_deref()
    }

    pub fn is_match(&self, property: ColorProperty) -> bool {
        self.slots[property.slot()].is_some()
    }

    pub fn any(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    /// Matched properties in `ColorProperty::ALL` order.
    pub fn matched(&self) -> impl Iterator<Item = ColorProperty> + '_ {
        ColorProperty::ALL.into_iter().filter(|p| self.is_match(*p))
    }

    fn set(&mut self, property: ColorProperty, hex: String) {
        self.slots[property.slot()] = Some(hex);
    }
}

/// Overlay currently shown for an element, with the timer that removes it.
#[derive(Debug)]
pub(crate) struct ActiveOverlay<N> {
    pub(crate) overlay: Overlay<N>,
    pub(crate) removal_timer: TimerId,
    pub(crate) round: u64,
}

/// A scanned element that carries the target color.
#[derive(Debug)]
pub struct MatchedElement<N> {
    pub(crate) handle: N,
    pub(crate) matches: MatchVector,
    pub(crate) placement: Placement,
    pub(crate) active: Option<ActiveOverlay<N>>,
    pub(crate) disabled: bool,
}

impl<N> MatchedElement<N> {
    pub fn new(handle: N, matches: MatchVector, placement: Placement) -> Self {
        Self { handle, matches, placement, active: None, disabled: false }
    }

    pub fn handle(&self) -> &N {
        &self.handle
    }

    pub fn matches(&self) -> &MatchVector {
        &self.matches
    }

    /// Geometry captured at scan time (or at the last explicit refresh).
    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn overlay(&self) -> Option<&Overlay<N>> {
        self.active.as_ref().map(|a| &a.overlay)
    }

    pub fn is_glitching(&self) -> bool {
        self.active.is_some()
    }

    /// Set after a tree operation on this element failed; it is skipped
    /// from then on.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}

/// Compares the computed colors of `node` against `target`.
pub fn match_colors<T: VisualTree>(tree: &T, node: &T::Node, target: &str) -> MatchVector {
    let mut matches = MatchVector::default();
    for property in ColorProperty::ALL {
        let raw = tree.computed_style(node, property.css_name()).unwrap_or_default();
        let hex = color::normalize(&raw);
        if hex == target {
            matches.set(property, hex);
        }
    }
    matches
}

/// Collects every descendant of `root` that matches `target` (canonical
/// `#RRGGBB`), in document order.
pub fn collect<T: VisualTree>(tree: &T, root: &T::Node, target: &str) -> Vec<MatchedElement<T::Node>> {
    tree.descendants(root)
        .into_iter()
        .filter_map(|node| {
            let matches = match_colors(tree, &node, target);
            if !matches.any() {
                return None;
            }
            let placement = tree.placement(&node);
            Some(MatchedElement::new(node, matches, placement))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessTree;

    #[test]
    fn background_match_is_recorded_alone() {
        let mut tree = HeadlessTree::new(800.0, 600.0);
        let root = tree.root();
        let el = tree.insert(root, "div");
        tree.set_computed(el, "background-color", "rgb(255, 255, 255)");
        tree.set_geometry(el, Placement { width: 40.0, height: 20.0, left: 5.0, top: 6.0 });

        let registry = collect(&tree, &root, "#FFFFFF");
        assert_eq!(registry.len(), 1);
        let m = registry[0].matches();
        assert_eq!(m.get(ColorProperty::BackgroundColor), Some("#FFFFFF"));
        assert!(!m.is_match(ColorProperty::Color));
        assert!(!m.is_match(ColorProperty::BorderColor));
        assert_eq!(registry[0].placement().left, 5.0);
        assert!(!registry[0].is_glitching());
    }

    #[test]
    fn empty_subtree_yields_empty_registry() {
        let tree = HeadlessTree::new(800.0, 600.0);
        assert!(collect(&tree, &tree.root(), "#FFFFFF").is_empty());
    }

    #[test]
    fn root_itself_is_not_scanned() {
        let mut tree = HeadlessTree::new(800.0, 600.0);
        let root = tree.root();
        let layer = tree.insert(root, "section");
        tree.set_computed(layer, "color", "rgb(255, 255, 255)");
        assert!(collect(&tree, &layer, "#FFFFFF").is_empty());
    }

    #[test]
    fn order_follows_document_order() {
        let mut tree = HeadlessTree::new(800.0, 600.0);
        let root = tree.root();
        let a = tree.insert(root, "div");
        let a1 = tree.insert(a, "span");
        let b = tree.insert(root, "div");
        for node in [b, a1] {
            tree.set_computed(node, "color", "rgb(255, 255, 255)");
        }
        let handles: Vec<_> = collect(&tree, &root, "#FFFFFF").iter().map(|m| *m.handle()).collect();
        assert_eq!(handles, vec![a1, b]);
    }

    #[test]
    fn hex_shaped_computed_values_compare_prefixed() {
        let mut tree = HeadlessTree::new(800.0, 600.0);
        let root = tree.root();
        let bare = tree.insert(root, "i");
        let prefixed = tree.insert(root, "b");
        tree.set_computed(bare, "border-color", "ffffff");
        tree.set_computed(prefixed, "color", "#fff");
        let registry = collect(&tree, &root, "#FFFFFF");
        assert_eq!(registry.len(), 2);
        assert!(registry[0].matches().is_match(ColorProperty::BorderColor));
        assert!(registry[1].matches().is_match(ColorProperty::Color));
    }

    #[test]
    fn unparseable_colors_degrade_to_black() {
        let mut tree = HeadlessTree::new(800.0, 600.0);
        let root = tree.root();
        let el = tree.insert(root, "div");
        tree.set_computed(el, "color", "color(display-p3 1 1 1)");
        tree.set_computed(el, "border-color", "rgb(255, 255, 255)");
        assert!(collect(&tree, &root, "#FFFFFF").len() == 1);

        let registry = collect(&tree, &root, "#000000");
        assert_eq!(registry.len(), 1);
        assert!(registry[0].matches().is_match(ColorProperty::Color));
    }
}
