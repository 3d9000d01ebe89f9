use serde::{Deserialize, Serialize};

/// Tiny deterministic RNG used by the generators.
///
/// Reproducible across platforms: the same seed always yields the same
/// record graph or catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Next pseudo-random `u64`.
    #[must_use]
    pub const fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        // Low LCG bits have short periods; fold the high half in.
        self.state ^ (self.state >> 33)
    }

    /// Next value in `[0, upper_exclusive)`.
    #[must_use]
    pub const fn next_bounded(&mut self, upper_exclusive: u64) -> u64 {
        if upper_exclusive == 0 {
            return 0;
        }
        self.next_u64() % upper_exclusive
    }

    /// Uniform index into a collection of `len` elements. Returns 0 for an
    /// empty collection.
    #[must_use]
    pub fn next_index(&mut self, len: usize) -> usize {
        let bounded = self.next_bounded(len as u64);
        usize::try_from(bounded).unwrap_or(0)
    }

    /// Bernoulli trial with integer percent.
    #[must_use]
    pub fn hit_rate_percent(&mut self, percent: u8) -> bool {
        if percent == 0 {
            return false;
        }
        if percent >= 100 {
            return true;
        }
        self.next_bounded(100) < u64::from(percent)
    }

    /// A lowercase word of `len` letters.
    #[must_use]
    pub fn word(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| {
                let offset = u8::try_from(self.next_bounded(26)).unwrap_or(0);
                char::from(b'a' + offset)
            })
            .collect()
    }
}
