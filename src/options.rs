use std::time::Duration;

use crate::color;
use crate::error::GlitchError;

pub const DEFAULT_TARGET: &str = "#FFFFFF";
pub const DEFAULT_FREQUENCY: f64 = 1.5;
/// Base offset, in px, for both the channel split and the displacement.
pub const DEFAULT_OFFSET: u32 = 2;
/// Target thickness of one displacement band, in px.
pub const SLICE_THICKNESS: u32 = 15;

/// How the displacement layer cuts the element into bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceMode {
    /// `ceil(height / thickness)` bands of equal height.
    Banded { thickness: u32 },
    /// Top and bottom half only.
    Halves,
}

impl SliceMode {
    pub fn band_count(self, height: f64) -> usize {
        if height <= 0.0 {
            return 0;
        }
        match self {
            Self::Banded { thickness } => (height / f64::from(thickness.max(1))).ceil() as usize,
            Self::Halves => 2,
        }
    }
}

impl Default for SliceMode {
    fn default() -> Self {
        Self::Banded { thickness: SLICE_THICKNESS }
    }
}

/// Effect configuration. Immutable once attached.
#[derive(Debug, Clone, PartialEq)]
pub struct GlitchOptions {
    /// Color to look for, in any form the normalizer accepts.
    pub target: String,
    /// Scales the random offset magnitude.
    pub frequency: f64,
    /// Wait before the first round.
    pub delay: Duration,
    pub offset: u32,
    pub slices: SliceMode,
    /// Third (yellow) channel of the split. Disabled by default.
    pub green_channel: bool,
}

impl Default for GlitchOptions {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_owned(),
            frequency: DEFAULT_FREQUENCY,
            delay: Duration::ZERO,
            offset: DEFAULT_OFFSET,
            slices: SliceMode::default(),
            green_channel: false,
        }
    }
}

impl GlitchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    #[must_use]
    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_slices(mut self, slices: SliceMode) -> Self {
        self.slices = slices;
        self
    }

    #[must_use]
    pub fn with_green_channel(mut self, enabled: bool) -> Self {
        self.green_channel = enabled;
        self
    }

    /// Canonicalizes the target and replaces an unusable frequency.
    ///
    /// A target the normalizer cannot read fails with
    /// [`GlitchError::UnparseableColor`].
    pub(crate) fn resolve(mut self) -> Result<Self, GlitchError> {
        self.target = color::parse_canonical(&self.target)?;
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            tracing::warn!(frequency = self.frequency, "frequency must be positive, using default");
            self.frequency = DEFAULT_FREQUENCY;
        }
        if let SliceMode::Banded { thickness: 0 } = self.slices {
            return Err(GlitchError::InvalidOption("slice thickness must be positive".to_owned()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opts = GlitchOptions::default();
        assert_eq!(opts.target, "#FFFFFF");
        assert_eq!(opts.frequency, 1.5);
        assert_eq!(opts.delay, Duration::ZERO);
        assert_eq!(opts.slices, SliceMode::Banded { thickness: 15 });
        assert!(!opts.green_channel);
    }

    #[test]
    fn resolve_canonicalizes_target() {
        let opts = GlitchOptions::new().with_target("#0f0").resolve().unwrap();
        assert_eq!(opts.target, "#00FF00");
    }

    #[test]
    fn resolve_rejects_bad_target() {
        let err = GlitchOptions::new().with_target("chartreuse").resolve().unwrap_err();
        assert_eq!(err, GlitchError::UnparseableColor("chartreuse".to_owned()));
    }

    #[test]
    fn resolve_replaces_non_positive_frequency() {
        assert_eq!(GlitchOptions::new().with_frequency(0.0).resolve().unwrap().frequency, 1.5);
        assert_eq!(GlitchOptions::new().with_frequency(f64::NAN).resolve().unwrap().frequency, 1.5);
        assert_eq!(GlitchOptions::new().with_frequency(3.0).resolve().unwrap().frequency, 3.0);
    }

    #[test]
    fn band_counts() {
        assert_eq!(SliceMode::default().band_count(150.0), 10);
        assert_eq!(SliceMode::default().band_count(151.0), 11);
        assert_eq!(SliceMode::default().band_count(0.0), 0);
        assert_eq!(SliceMode::Halves.band_count(151.0), 2);
    }
}
