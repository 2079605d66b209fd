#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Glitch overlays for DOM elements of a target color.
//!
//! [`Glitch::attach`] scans a layer for elements whose computed text,
//! background or border color equals the target, then periodically replaces
//! each visible one with a channel-split, scan-line-displaced copy of itself.
//! The core runs against the [`VisualTree`] and [`TimerHost`] traits so it
//! can be driven headless; the browser binding lives in the `wasm` module.

pub mod color;
pub mod decompose;
pub mod effect;
pub mod entropy;
pub mod error;
pub mod headless;
pub mod logging;
pub mod options;
pub mod scan;
pub mod scheduler;
pub mod tree;

pub use effect::Glitch;
pub use entropy::{Entropy, SeededEntropy};
pub use error::GlitchError;
pub use logging::ConsoleLayer;
pub use options::{GlitchOptions, SliceMode};
pub use scan::{ColorProperty, MatchVector, MatchedElement};
pub use scheduler::{Phase, TimerHost, TimerId};
pub use tree::{ClientRect, Placement, Viewport, VisualTree};

// Only compile the browser binding when targeting wasm32.
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{attach, GlitchHandle};
