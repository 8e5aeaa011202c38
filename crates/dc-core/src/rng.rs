//! Keyed deterministic number source
//!
//! Widget values must be identical across renders for the same key, so the
//! key is hashed (FNV-1a) into a seed for a `StdRng`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Stable 64-bit seed for a key
#[must_use]
pub fn seed_for(key: &str) -> u64 {
    key.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Float in `[min, max)` fixed by `key`
///
/// Returns `min` for an empty, inverted or non-finite range.
#[must_use]
pub fn deterministic_float(key: &str, min: f64, max: f64) -> f64 {
    DeterministicRng::from_key(key).next_float(min, max)
}

/// Integer in `[min, max]` fixed by `key`
///
/// Returns `min` for an inverted range.
#[must_use]
pub fn deterministic_int(key: &str, min: i64, max: i64) -> i64 {
    DeterministicRng::from_key(key).next_int(min, max)
}

/// Seeded stream for callers that need more than one value per key
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    inner: StdRng,
}

impl DeterministicRng {
    /// Stream seeded from a key
    #[inline]
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        Self::from_seed(seed_for(key))
    }

    /// Stream seeded from a raw seed
    #[inline]
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Next float in `[min, max)`
    pub fn next_float(&mut self, min: f64, max: f64) -> f64 {
        if !(min.is_finite() && max.is_finite() && max > min) {
            return min;
        }
        if (max - min).is_finite() {
            self.inner.random_range(min..max)
        } else {
            // Span overflows; interpolate without forming it
            let t: f64 = self.inner.random();
            let v = min * (1.0 - t) + max * t;
            if v < max { v } else { min }
        }
    }

    /// Next integer in `[min, max]`
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        self.inner.random_range(min..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_key_same_value() {
        let a = deterministic_float("fleet.utilization", 0.0, 100.0);
        let b = deterministic_float("fleet.utilization", 0.0, 100.0);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn different_keys_differ() {
        assert_ne!(seed_for("claims.open"), seed_for("claims.closed"));
    }

    #[test]
    fn degenerate_ranges_return_min() {
        assert_eq!(deterministic_float("k", 5.0, 5.0), 5.0);
        assert_eq!(deterministic_float("k", 5.0, 1.0), 5.0);
        assert_eq!(deterministic_int("k", 9, 3), 9);
        assert_eq!(deterministic_int("k", 4, 4), 4);
    }

    #[test]
    fn non_finite_bounds_return_min() {
        assert!(deterministic_float("k", f64::NAN, 1.0).is_nan());
        assert_eq!(deterministic_float("k", 0.0, f64::INFINITY), 0.0);
        assert_eq!(deterministic_float("k", f64::NEG_INFINITY, 0.0), f64::NEG_INFINITY);

        let v = deterministic_float("k", f64::MIN, f64::MAX);
        assert!(v.is_finite());
    }

    #[test]
    fn fnv_reference_value() {
        // FNV-1a of the empty string is the offset basis
        assert_eq!(seed_for(""), FNV_OFFSET);
    }

    proptest! {
        #[test]
        fn prop_float_within_bounds(key in ".{0,16}", min in -1000.0f64..1000.0, span in 0.001f64..500.0) {
            let v = deterministic_float(&key, min, min + span);
            prop_assert!(v >= min && v < min + span);
        }

        #[test]
        fn prop_int_within_bounds(key in ".{0,16}", min in -1000i64..1000, span in 0i64..500) {
            let v = deterministic_int(&key, min, min + span);
            prop_assert!(v >= min && v <= min + span);
        }
    }
}
