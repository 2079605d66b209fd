//! Browser binding: `attach(layer, options)` from JavaScript.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

use tracing::Level;
use tracing_subscriber::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{console, Element, HtmlElement};

use crate::effect::Glitch;
use crate::entropy::Entropy;
use crate::error::GlitchError;
use crate::logging::ConsoleLayer;
use crate::options::GlitchOptions;
use crate::scheduler::TimerHost;

mod dom;
mod timers;

use dom::DomTree;
use timers::DomTimers;

impl From<GlitchError> for JsValue {
    fn from(err: GlitchError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// `Math.random()`.
struct JsEntropy;

impl Entropy for JsEntropy {
    fn next_unit(&mut self) -> f64 {
        js_sys::Math::random()
    }
}

/// Installs the console subscriber on first use. A global subscriber set up
/// earlier by the page's own wasm code is left alone.
fn install_console_logging() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let layer = ConsoleLayer::new(|level: Level, line: &str| {
            let line = JsValue::from_str(line);
            match level {
                Level::ERROR => console::error_1(&line),
                Level::WARN => console::warn_1(&line),
                _ => console::log_1(&line),
            }
        });
        let _ = tracing::subscriber::set_global_default(tracing_subscriber::registry().with(layer));
    });
}

/// State reachable from both the handle and the timer callbacks.
pub(crate) struct Shared {
    effect: RefCell<Option<Glitch<DomTree, JsEntropy>>>,
    timers: RefCell<DomTimers>,
}

#[wasm_bindgen]
pub struct GlitchHandle {
    shared: Rc<Shared>,
    stylesheet: Option<Element>,
}

/// Scans `layer` and starts glitching after `options.delay` ms.
///
/// `options` may be `undefined` or `{ target?, frequency?, delay? }`.
#[wasm_bindgen]
pub fn attach(layer: HtmlElement, options: JsValue) -> Result<GlitchHandle, JsValue> {
    install_console_logging();
    let window = web_sys::window().ok_or("no window")?;
    let tree = DomTree::new(window.clone())?;
    let options = read_options(&options)?;

    let stylesheet = match dom::attach_styles(tree.document()) {
        Ok(style) => Some(style),
        Err(err) => {
            tracing::warn!(?err, "stylesheet injection failed");
            None
        }
    };

    let shared = Rc::new_cyclic(|owner| Shared {
        effect: RefCell::new(None),
        timers: RefCell::new(DomTimers::new(window, owner.clone())),
    });
    let attached = {
        let mut timers = shared.timers.borrow_mut();
        Glitch::attach(tree, JsEntropy, layer, options, &mut *timers)
    };
    match attached {
        Ok(effect) => *shared.effect.borrow_mut() = Some(effect),
        Err(err) => {
            tracing::error!(%err, "glitch attach failed");
            if let Some(style) = stylesheet {
                style.remove();
            }
            return Err(err.into());
        }
    }
    Ok(GlitchHandle { shared, stylesheet })
}

fn read_options(value: &JsValue) -> Result<GlitchOptions, JsValue> {
    let mut options = GlitchOptions::default();
    if value.is_undefined() || value.is_null() {
        return Ok(options);
    }
    if let Some(target) = js_sys::Reflect::get(value, &JsValue::from_str("target"))?.as_string() {
        options.target = target;
    }
    if let Some(frequency) = js_sys::Reflect::get(value, &JsValue::from_str("frequency"))?.as_f64() {
        options.frequency = frequency;
    }
    if let Some(delay) = js_sys::Reflect::get(value, &JsValue::from_str("delay"))?.as_f64() {
        if !delay.is_finite() || delay < 0.0 {
            return Err(GlitchError::InvalidOption(format!("delay {delay} must be a non-negative number")).into());
        }
        options.delay = Duration::from_millis(delay as u64);
    }
    Ok(options)
}

#[wasm_bindgen]
impl GlitchHandle {
    /// Re-arms the next round `delay_ms` from now.
    pub fn start(&self, delay_ms: f64) {
        let delay = Duration::from_millis(delay_ms.max(0.0) as u64);
        self.with(|effect, timers| effect.start(delay, timers));
    }

    /// Cancels pending timers and removes any visible overlay.
    pub fn stop(&self) {
        self.with(|effect, timers| effect.stop(timers));
    }

    /// Stops for good and removes the injected stylesheet.
    pub fn destroy(&mut self) {
        self.teardown();
    }

    #[wasm_bindgen(js_name = refreshPlacement)]
    pub fn refresh_placement(&self) {
        self.with(|effect, _| effect.refresh_placement());
    }

    #[wasm_bindgen(js_name = matchedCount)]
    pub fn matched_count(&self) -> usize {
        self.shared.effect.borrow().as_ref().map_or(0, |effect| effect.registry().len())
    }

    #[wasm_bindgen(js_name = isGlitching)]
    pub fn is_glitching(&self) -> bool {
        self.shared
            .effect
            .borrow()
            .as_ref()
            .is_some_and(|effect| effect.registry().iter().any(|m| m.is_glitching()))
    }
}

impl GlitchHandle {
    fn with(&self, f: impl FnOnce(&mut Glitch<DomTree, JsEntropy>, &mut dyn TimerHost)) {
        let (Ok(mut effect), Ok(mut timers)) = (self.shared.effect.try_borrow_mut(), self.shared.timers.try_borrow_mut())
        else {
            tracing::warn!("glitch handle used re-entrantly");
            return;
        };
        let timers: &mut dyn TimerHost = &mut *timers;
        if let Some(effect) = effect.as_mut() {
            f(effect, timers);
        }
    }

    fn teardown(&mut self) {
        let effect = self.shared.effect.borrow_mut().take();
        if let Some(effect) = effect {
            let mut timers = self.shared.timers.borrow_mut();
            drop(effect.destroy(&mut *timers));
        }
        if let Some(style) = self.stylesheet.take() {
            style.remove();
        }
    }
}

impl Drop for GlitchHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}
