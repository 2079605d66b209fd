//! Randomness for offsets and timings.

/// Source of uniform draws in `[0, 1)`.
pub trait Entropy {
    fn next_unit(&mut self) -> f64;

    /// `floor(unit * span) + low`, i.e. uniform over `[low, low + span)`.
    /// Saturates at `u32::MAX`.
    fn draw(&mut self, low: u32, span: f64) -> u32 {
        let unit = self.next_unit().clamp(0.0, 1.0 - f64::EPSILON);
        low.saturating_add((unit * span.max(0.0)).floor() as u32)
    }
}

/// Deterministic xorshift32 PRNG, for tests and reproducible runs.
#[derive(Debug, Clone)]
pub struct SeededEntropy {
    state: u32,
}

impl SeededEntropy {
    pub fn new(seed: u32) -> Self {
        // xorshift never leaves the all-zero state.
        Self { state: if seed == 0 { 0x9E37_79B9 } else { seed } }
    }
}

impl Entropy for SeededEntropy {
    fn next_unit(&mut self) -> f64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    }
}

/// Always returns the same unit value. Handy for pinning offsets in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedEntropy(pub f64);

impl Entropy for FixedEntropy {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_draws_stay_in_unit_interval() {
        let mut e = SeededEntropy::new(7);
        for _ in 0..10_000 {
            let u = e.next_unit();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn draw_covers_half_open_range() {
        assert_eq!(FixedEntropy(0.0).draw(600, 900.0), 600);
        assert_eq!(FixedEntropy(1.0).draw(600, 900.0), 1499);
        assert_eq!(FixedEntropy(0.5).draw(2, 0.0), 2);
    }

    #[test]
    fn draw_saturates_instead_of_overflowing() {
        assert_eq!(FixedEntropy(0.99).draw(2, 1e12), u32::MAX);
        assert_eq!(FixedEntropy(0.5).draw(u32::MAX, 10.0), u32::MAX);
    }

    #[test]
    fn zero_seed_is_usable() {
        let mut e = SeededEntropy::new(0);
        assert_ne!(e.next_unit(), e.next_unit());
    }
}
