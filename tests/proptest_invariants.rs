#![cfg(not(target_arch = "wasm32"))]

//! Property-based invariants for color normalization and overlay planning.
//!
//! 1. `rgb_to_hex` yields `#rrggbb` matching the integer channels.
//! 2. Canonical forms are always `#` + six uppercase hex digits.
//! 3. Band count, band height and parity-driven direction follow the height.
//! 4. Offsets stay inside `[offset, offset * (1 + frequency)]`.

use glitch_wasm::color::{is_hex, parse_canonical, rgb_to_hex};
use glitch_wasm::decompose::{plan, ParentOrigin};
use glitch_wasm::{GlitchOptions, Placement, SeededEntropy};
use proptest::prelude::*;

proptest! {
    #[test]
    fn rgb_to_hex_matches_integer_channels(r in 0u8..=255, g in 0u8..=255, b in 0u8..=255, spaced in any::<bool>()) {
        let input = if spaced {
            format!("rgb( {r} , {g} , {b} )")
        } else {
            format!("rgb({r},{g},{b})")
        };
        let hex = rgb_to_hex(&input).unwrap();
        prop_assert_eq!(hex.len(), 7);
        prop_assert_eq!(&hex, &format!("#{r:02x}{g:02x}{b:02x}"));
    }

    #[test]
    fn rgba_ignores_alpha(r in 0u8..=255, g in 0u8..=255, b in 0u8..=255, a in 0.0f64..=1.0) {
        let with_alpha = rgb_to_hex(&format!("rgba({r}, {g}, {b}, {a})")).unwrap();
        let without = rgb_to_hex(&format!("rgb({r}, {g}, {b})")).unwrap();
        prop_assert_eq!(with_alpha, without);
    }

    #[test]
    fn canonical_form_is_prefixed_uppercase(value in "#?[0-9a-fA-F]{6}") {
        let canonical = parse_canonical(&value).unwrap();
        prop_assert!(canonical.starts_with('#'));
        prop_assert!(is_hex(&canonical[1..]));
        prop_assert_eq!(canonical.len(), 7);
        prop_assert_eq!(canonical[1..].to_string(), canonical[1..].to_ascii_uppercase());
    }

    #[test]
    fn bands_tile_the_element(height in 1u32..2000, seed in 1u32..u32::MAX) {
        let opts = GlitchOptions::default();
        let placement = Placement { width: 50.0, height: f64::from(height), left: 0.0, top: 0.0 };
        let plan = plan(placement, ParentOrigin::default(), &opts, &mut SeededEntropy::new(seed));

        let expected = height.div_ceil(15) as usize;
        prop_assert_eq!(plan.bands.len(), expected);
        let band_height = (f64::from(height) / expected as f64).ceil() as i32;
        for band in &plan.bands {
            prop_assert_eq!(band.height, band_height);
            prop_assert_eq!(band.top, band.index as i32 * band_height);
            prop_assert_eq!(band.left < 0, band.index % 2 == 1);
        }
        prop_assert!(plan.bands.len() as i32 * band_height >= height as i32);
    }

    #[test]
    fn offsets_respect_frequency(frequency in 0.1f64..10.0, seed in 1u32..u32::MAX) {
        let opts = GlitchOptions::default().with_frequency(frequency);
        let placement = Placement { width: 50.0, height: 60.0, left: 0.0, top: 0.0 };
        let plan = plan(placement, ParentOrigin::default(), &opts, &mut SeededEntropy::new(seed));
        let max = (2.0 * (1.0 + frequency)).floor() as i32 + 1;

        for channel in &plan.channels {
            prop_assert!((2..=max).contains(&channel.left.abs()));
            prop_assert!((2..=max).contains(&channel.top.abs()));
        }
        for band in &plan.bands {
            prop_assert!((2..=max).contains(&band.left.abs()));
        }
    }
}
