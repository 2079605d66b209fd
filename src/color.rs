//! Color normalization.
//!
//! Computed styles come back as `rgb(r, g, b)` or `rgba(r, g, b, a)`; the
//! target is configured as hex. Everything is brought to the canonical
//! uppercase `#RRGGBB` form before comparison.

use crate::error::GlitchError;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Canonical form used when a color cannot be parsed.
pub const FALLBACK_HEX: &str = "#000000";

/// True iff `value` is a non-empty run of hex digits (no leading `#`).
pub fn is_hex(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Two lowercase hex digits for a decimal channel string.
///
/// Non-numeric input yields `"00"`; values above 255 saturate to `"ff"`.
pub fn hex_digit_pair(channel: &str) -> String {
    let Ok(value) = channel.trim().parse::<u32>() else {
        return "00".to_owned();
    };
    let value = value.min(255) as usize;
    let mut out = String::with_capacity(2);
    out.push(HEX_DIGITS[value / 16] as char);
    out.push(HEX_DIGITS[value % 16] as char);
    out
}

/// Converts `rgb(r,g,b)` / `rgba(r,g,b,a)` to `#rrggbb` (lowercase).
///
/// Whitespace around the components is optional. Anything after the third
/// channel (alpha, closing paren, further values of a shorthand) is ignored.
pub fn rgb_to_hex(rgb: &str) -> Result<String, GlitchError> {
    let channels = parse_rgb_prefix(rgb).ok_or_else(|| GlitchError::UnparseableColor(rgb.to_owned()))?;
    let mut out = String::with_capacity(7);
    out.push('#');
    for channel in channels {
        out.push_str(&hex_digit_pair(channel));
    }
    Ok(out)
}

fn parse_rgb_prefix(input: &str) -> Option<[&str; 3]> {
    let rest = input.trim_start();
    let rest = strip_prefix_ignore_case(rest, "rgba")
        .or_else(|| strip_prefix_ignore_case(rest, "rgb"))?
        .trim_start()
        .strip_prefix('(')?;

    let mut channels = [""; 3];
    let mut rest = rest;
    for (i, slot) in channels.iter_mut().enumerate() {
        rest = rest.trim_start();
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        *slot = &rest[..digits];
        rest = rest[digits..].trim_start();
        if i < 2 {
            rest = rest.strip_prefix(',')?;
        }
    }
    Some(channels)
}

// CSS function names are ASCII case-insensitive.
fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let head = input.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &input[prefix.len()..])
}

/// Parses any supported representation into canonical `#RRGGBB`.
///
/// Accepted: `#RRGGBB`, `#RGB`, the same without `#`, and `rgb()`/`rgba()`.
pub fn parse_canonical(value: &str) -> Result<String, GlitchError> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if is_hex(digits) {
        return match digits.len() {
            6 => Ok(format!("#{}", digits.to_ascii_uppercase())),
            3 => {
                let mut out = String::with_capacity(7);
                out.push('#');
                for c in digits.chars() {
                    let c = c.to_ascii_uppercase();
                    out.push(c);
                    out.push(c);
                }
                Ok(out)
            }
            _ => Err(GlitchError::UnparseableColor(value.to_owned())),
        };
    }
    rgb_to_hex(trimmed).map(|hex| hex.to_ascii_uppercase())
}

/// Like [`parse_canonical`] but never fails: unusable input becomes black.
pub fn normalize(value: &str) -> String {
    match parse_canonical(value) {
        Ok(hex) => hex,
        Err(err) => {
            tracing::debug!(%err, "color degraded to black");
            FALLBACK_HEX.to_owned()
        }
    }
}
