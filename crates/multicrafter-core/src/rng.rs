//! Deterministic PRNG for cosmetic rolls (update effects and their offsets).
//!
//! SplitMix64: eight bytes of state and identical output on every platform,
//! so two hosts replaying the same ticks trigger the same effects.

use crate::fixed::Fixed64;

/// SplitMix64 pseudo-random number generator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform fraction in `[0, 1)`, built from the top 32 bits so it maps
    /// exactly onto the Q32.32 fractional part.
    pub fn next_fraction(&mut self) -> Fixed64 {
        Fixed64::from_bits((self.next_u64() >> 32) as i64)
    }

    /// Returns `true` with the given probability. Values at or below zero
    /// never hit; values at or above one always do.
    pub fn chance(&mut self, probability: Fixed64) -> bool {
        if probability <= Fixed64::ZERO {
            return false;
        }
        if probability >= Fixed64::ONE {
            return true;
        }
        self.next_fraction() < probability
    }

    /// Uniform value in `[-range, range)`.
    pub fn range(&mut self, range: Fixed64) -> Fixed64 {
        let unit = self.next_fraction() * Fixed64::from_num(2) - Fixed64::ONE;
        unit * range
    }
}
