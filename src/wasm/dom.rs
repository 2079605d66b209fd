use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Window};

use crate::error::GlitchError;
use crate::tree::{ClientRect, Placement, Viewport, VisualTree};

const STYLE_RULES: &str = ".rm-glitch{transition: all .3s ease}\
.rm-glitch-displace{transition: all .3s ease}\
.rm-glitch-rgbsplit{transition: all .3s ease}";

fn tree_error(op: &str, err: JsValue) -> GlitchError {
    GlitchError::InvalidTreeOperation(format!("{op}: {err:?}"))
}

/// The live DOM of a browser window.
pub struct DomTree {
    window: Window,
    document: Document,
}

impl DomTree {
    pub fn new(window: Window) -> Result<Self, JsValue> {
        let document = window.document().ok_or("no document")?;
        Ok(Self { window, document })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Adds the transition rules for the overlay classes to `<head>`.
pub fn attach_styles(document: &Document) -> Result<Element, JsValue> {
    let style = document.create_element("style")?;
    style.set_attribute("media", "screen")?;
    style.set_text_content(Some(STYLE_RULES));
    let head = document.head().ok_or("no head")?;
    head.append_child(&style)?;
    Ok(style)
}

impl VisualTree for DomTree {
    type Node = HtmlElement;

    /// HTML elements only. SVG and MathML nodes have no offset box to
    /// place an overlay with, so they are never matched.
    fn descendants(&self, root: &HtmlElement) -> Vec<HtmlElement> {
        let all = root.get_elements_by_tag_name("*");
        (0..all.length())
            .filter_map(|i| all.item(i))
            .filter_map(|el| el.dyn_into::<HtmlElement>().ok())
            .collect()
    }

    fn computed_style(&self, node: &HtmlElement, property: &str) -> Option<String> {
        let style = self.window.get_computed_style(node).ok().flatten()?;
        style.get_property_value(property).ok()
    }

    fn placement(&self, node: &HtmlElement) -> Placement {
        Placement {
            width: f64::from(node.offset_width()),
            height: f64::from(node.offset_height()),
            left: f64::from(node.offset_left()),
            top: f64::from(node.offset_top()),
        }
    }

    fn client_rect(&self, node: &HtmlElement) -> ClientRect {
        let rect = node.get_bounding_client_rect();
        ClientRect { left: rect.left(), top: rect.top(), right: rect.right(), bottom: rect.bottom() }
    }

    fn viewport(&self) -> Viewport {
        let root = self.document.document_element();
        let width = self
            .window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .or_else(|| root.as_ref().map(|r| f64::from(r.client_width())))
            .unwrap_or(0.0);
        let height = self
            .window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .or_else(|| root.as_ref().map(|r| f64::from(r.client_height())))
            .unwrap_or(0.0);
        Viewport { width, height }
    }

    fn parent(&self, node: &HtmlElement) -> Option<HtmlElement> {
        node.parent_element()?.dyn_into::<HtmlElement>().ok()
    }

    fn is_connected(&self, node: &HtmlElement) -> bool {
        node.is_connected()
    }

    fn create_container(&mut self) -> Result<HtmlElement, GlitchError> {
        self.document
            .create_element("div")
            .map_err(|err| tree_error("create div", err))?
            .dyn_into::<HtmlElement>()
            .map_err(|el| tree_error("create div", el.into()))
    }

    fn deep_clone(&mut self, node: &HtmlElement) -> Result<HtmlElement, GlitchError> {
        node.clone_node_with_deep(true)
            .map_err(|err| tree_error("clone", err))?
            .dyn_into::<HtmlElement>()
            .map_err(|n| tree_error("clone", n.into()))
    }

    fn set_style(&mut self, node: &HtmlElement, property: &str, value: &str) -> Result<(), GlitchError> {
        node.style()
            .set_property(property, value)
            .map_err(|err| tree_error("set style", err))
    }

    fn set_class(&mut self, node: &HtmlElement, class: &str) -> Result<(), GlitchError> {
        node.set_class_name(class);
        Ok(())
    }

    fn append_child(&mut self, parent: &HtmlElement, child: &HtmlElement) -> Result<(), GlitchError> {
        parent
            .append_child(child)
            .map(drop)
            .map_err(|err| tree_error("append", err))
    }

    fn detach(&mut self, node: &HtmlElement) -> Result<(), GlitchError> {
        if node.parent_node().is_none() {
            return Err(GlitchError::InvalidTreeOperation("detach: node has no parent".to_owned()));
        }
        node.remove();
        Ok(())
    }
}
