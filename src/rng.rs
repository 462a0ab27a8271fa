//! Deterministic randomness source (xorshift64).
//!
//! The runner reseeds it before every attempt, so anything drawn from it
//! during an attempt is reproducible from the configured seed alone.

/// Seed substituted for zero, which xorshift cannot leave.
const ZERO_SEED: u64 = 0x5555_5555_5555_5555;

/// Small seeded generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Create a generator with the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        let state = if seed == 0 { ZERO_SEED } else { seed };
        Self { state }
    }

    /// Restart the sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Next raw value.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform-ish index in `[0, len)`; 0 when `len` is 0.
    // Remainder is below len, which came from a usize
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u64() % len as u64) as usize
    }

    /// Pick one element of `items`.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.next_index(items.len()))
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(42)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_reseed_restarts() {
        let mut rng = Rng::new(7);
        let first: Vec<u64> = (0..5).map(|_| rng.next_u64()).collect();
        rng.reseed(7);
        let again: Vec<u64> = (0..5).map(|_| rng.next_u64()).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_zero_seed_still_advances() {
        let mut rng = Rng::new(0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn test_choose() {
        let mut rng = Rng::new(3);
        let items = ["a", "b", "c"];
        for _ in 0..20 {
            assert!(items.contains(rng.choose(&items).unwrap()));
        }
        let empty: [u8; 0] = [];
        assert_eq!(rng.choose(&empty), None);
        assert_eq!(rng.next_index(0), 0);
    }
}
