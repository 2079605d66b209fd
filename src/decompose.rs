//! Builds the glitch overlay for one element.
//!
//! The overlay is computed in two steps: [`plan`] draws the random offsets
//! and lays out every fragment as plain numbers, and [`materialize`] turns a
//! plan into detached nodes in the host tree. Every fragment is a deep clone
//! of the element, so building an overlay costs O(subtree size) per
//! fragment.

use crate::entropy::Entropy;
use crate::error::GlitchError;
use crate::options::GlitchOptions;
use crate::scan::MatchVector;
use crate::tree::{parse_px, px, Placement, VisualTree};

pub const MAGENTA: &str = "#FF00FF";
pub const CYAN: &str = "#00FFFF";
pub const YELLOW: &str = "#FFFF00";

pub const CLASS_ROOT: &str = "rm-glitch";
pub const CLASS_DISPLACE: &str = "rm-glitch-displace";
pub const CLASS_RGB_SPLIT: &str = "rm-glitch-rgbsplit";

/// A colorized clone in the channel-split layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelClone {
    pub hex: &'static str,
    pub left: i32,
    pub top: i32,
}

/// One horizontal band of the displacement layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplacementBand {
    pub index: usize,
    pub top: i32,
    pub height: i32,
    /// Even bands shift right, odd bands shift left.
    pub left: i32,
}

/// Positioned `top`/`left` of the offset parent, when it has numeric ones.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParentOrigin {
    pub top: Option<f64>,
    pub left: Option<f64>,
}

/// Reads the offset parent's computed `top`/`left`. `auto` (normal flow)
/// comes back as `None`.
pub fn parent_origin<T: VisualTree>(tree: &T, parent: &T::Node) -> ParentOrigin {
    let read = |property: &str| tree.computed_style(parent, property).as_deref().and_then(parse_px);
    ParentOrigin { top: read("top"), left: read("left") }
}

/// Everything needed to build an overlay, with all randomness resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPlan {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
    pub channels: Vec<ChannelClone>,
    pub bands: Vec<DisplacementBand>,
}

/// Random `(x, y)` magnitude for the channel split.
pub fn channel_offset<E: Entropy + ?Sized>(options: &GlitchOptions, entropy: &mut E) -> (i32, i32) {
    let spread = f64::from(options.offset) * options.frequency;
    let x = entropy.draw(options.offset, spread + 1.0);
    let y = entropy.draw(options.offset, spread);
    (to_px(x), to_px(y))
}

fn band_offset<E: Entropy + ?Sized>(options: &GlitchOptions, entropy: &mut E) -> i32 {
    let spread = f64::from(options.offset) * options.frequency;
    to_px(entropy.draw(options.offset, spread + 1.0))
}

// Offsets are magnitudes; they must stay positive so the sign alone carries
// the direction.
fn to_px(magnitude: u32) -> i32 {
    i32::try_from(magnitude).unwrap_or(i32::MAX)
}

pub fn plan<E: Entropy + ?Sized>(
    placement: Placement,
    origin: ParentOrigin,
    options: &GlitchOptions,
    entropy: &mut E,
) -> OverlayPlan {
    let (x, y) = channel_offset(options, entropy);
    let mut channels = vec![ChannelClone { hex: MAGENTA, left: x, top: y }];
    if options.green_channel {
        channels.push(ChannelClone { hex: YELLOW, left: -x, top: y });
    }
    channels.push(ChannelClone { hex: CYAN, left: -x, top: -y });

    let count = options.slices.band_count(placement.height);
    let band_height = if count == 0 { 0 } else { (placement.height / count as f64).ceil() as i32 };
    let bands = (0..count)
        .map(|index| {
            let shift = band_offset(options, entropy);
            DisplacementBand {
                index,
                top: index as i32 * band_height,
                height: band_height,
                left: if index % 2 == 1 { -shift } else { shift },
            }
        })
        .collect();

    OverlayPlan {
        width: placement.width,
        height: placement.height,
        top: placement.top + origin.top.unwrap_or(0.0),
        left: placement.left + origin.left.unwrap_or(0.0),
        channels,
        bands,
    }
}

/// An overlay built in the host tree. Detached until the scheduler inserts
/// `root`.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay<N> {
    pub root: N,
    pub rgb_split: N,
    pub displace: N,
    pub plan: OverlayPlan,
}

pub fn materialize<T: VisualTree>(
    tree: &mut T,
    element: &T::Node,
    matches: &MatchVector,
    plan: OverlayPlan,
) -> Result<Overlay<T::Node>, GlitchError> {
    let (width, height) = (px(plan.width), px(plan.height));

    let root = tree.create_container()?;
    tree.apply_css(
        &root,
        &[
            ("position", "absolute"),
            ("overflow", "visible"),
            ("width", width.as_str()),
            ("height", height.as_str()),
            ("top", px(plan.top).as_str()),
            ("left", px(plan.left).as_str()),
        ],
    )?;
    tree.set_class(&root, CLASS_ROOT)?;

    let rgb_split = tree.create_container()?;
    tree.apply_css(&rgb_split, &[("overflow", "visible"), ("width", width.as_str()), ("height", height.as_str())])?;
    tree.set_class(&rgb_split, CLASS_RGB_SPLIT)?;
    for channel in &plan.channels {
        let clone = tree.deep_clone(element)?;
        tree.set_style(&clone, "position", "absolute")?;
        for property in matches.matched() {
            tree.set_style(&clone, property.css_name(), channel.hex)?;
        }
        tree.apply_css(
            &clone,
            &[
                ("width", width.as_str()),
                ("height", height.as_str()),
                ("left", format!("{}px", channel.left).as_str()),
                ("top", format!("{}px", channel.top).as_str()),
            ],
        )?;
        tree.append_child(&rgb_split, &clone)?;
    }

    let displace = tree.create_container()?;
    tree.apply_css(
        &displace,
        &[
            ("position", "absolute"),
            ("overflow", "visible"),
            ("width", width.as_str()),
            ("height", height.as_str()),
            ("top", "0px"),
            ("left", "0px"),
        ],
    )?;
    tree.set_class(&displace, CLASS_DISPLACE)?;
    for band in &plan.bands {
        let slice = tree.create_container()?;
        tree.apply_css(
            &slice,
            &[
                ("position", "absolute"),
                ("overflow", "hidden"),
                ("width", width.as_str()),
                ("height", format!("{}px", band.height).as_str()),
                ("left", format!("{}px", band.left).as_str()),
                ("top", format!("{}px", band.top).as_str()),
            ],
        )?;
        let clone = tree.deep_clone(element)?;
        tree.apply_css(&clone, &[("position", "absolute"), ("top", format!("{}px", -band.top).as_str()), ("left", "0px")])?;
        tree.append_child(&slice, &clone)?;
        tree.append_child(&displace, &slice)?;
    }

    tree.append_child(&root, &rgb_split)?;
    tree.append_child(&root, &displace)?;
    Ok(Overlay { root, rgb_split, displace, plan })
}
