//! Decorative "live" metric drift as a pure function of tick number
//!
//! Dashboards perturb sample values on a timer. Here the perturbation is
//! `(state, tick) -> state`, independent of whatever drives the ticks, so a
//! given key and tick always yield the same value.

use crate::rng::deterministic_float;
use serde::{Deserialize, Serialize};

/// Default fraction of the range a single tick may move
pub const DEFAULT_VOLATILITY: f64 = 0.02;

/// Bounded metric that drifts per tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveMetric {
    /// Seed key, unique per widget metric
    pub key: String,
    /// Current value
    pub value: f64,
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Fraction of `max - min` a tick may move in either direction
    pub volatility: f64,
}

impl LiveMetric {
    /// Create metric; `initial` is clamped into range and inverted bounds are swapped
    ///
    /// A NaN or infinite bound collapses onto the other bound (or zero if both
    /// are unusable); a NaN `initial` starts at `min`.
    #[must_use]
    pub fn new(key: impl Into<String>, initial: f64, min: f64, max: f64) -> Self {
        let (min, max) = match (min.is_finite(), max.is_finite()) {
            (true, true) => (min, max),
            (true, false) => (min, min),
            (false, true) => (max, max),
            (false, false) => (0.0, 0.0),
        };
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let initial = if initial.is_nan() { min } else { initial };
        Self {
            key: key.into(),
            value: initial.clamp(min, max),
            min,
            max,
            volatility: DEFAULT_VOLATILITY,
        }
    }

    /// With volatility (clamped to `[0, 1]`)
    #[inline]
    #[must_use]
    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility.clamp(0.0, 1.0);
        self
    }

    /// State after `tick`
    #[must_use]
    pub fn tick(&self, tick: u64) -> Self {
        let span = (self.max - self.min).min(f64::MAX);
        let step = deterministic_float(&format!("{}#{tick}", self.key), -1.0, 1.0);
        let value = (self.value + step * self.volatility * span).clamp(self.min, self.max);
        Self {
            value,
            ..self.clone()
        }
    }

    /// Values after each of `count` ticks starting at `first_tick`
    #[must_use]
    pub fn series(&self, first_tick: u64, count: usize) -> Vec<f64> {
        let mut state = self.clone();
        (0..count as u64)
            .map(|offset| {
                state = state.tick(first_tick + offset);
                state.value
            })
            .collect()
    }
}
