//! # Pulse Score
//!
//! Weight-normalized aggregation of per-sector sentiment scores into the
//! single 0-100 "pulse" number, plus the mood bands used for display and
//! alerting.
//!
//! Pure functions only; the shared mutable state lives in `board`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Neutral fallback when no weight is usable (empty feed, all-zero weights).
pub const NEUTRAL_PULSE: f64 = 50.0;

/// Pulse at or below this value reads as bearish.
pub const BEARISH_MAX: f64 = 30.0;
/// Pulse at or above this value reads as bullish.
pub const BULLISH_MIN: f64 = 60.0;

/// Display mood derived from a pulse value. Boundaries are inclusive on
/// both outer bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Bearish,
    Neutral,
    Bullish,
}

impl Mood {
    pub fn from_pulse(pulse: f64) -> Self {
        if pulse <= BEARISH_MAX {
            Mood::Bearish
        } else if pulse >= BULLISH_MIN {
            Mood::Bullish
        } else {
            Mood::Neutral
        }
    }
}

/// Weight-normalized average of sector scores.
///
/// Sectors missing from `weights` contribute nothing; weights need not sum
/// to 100 since the result is normalized by the total weight actually used.
/// All-zero or empty weights return [`NEUTRAL_PULSE`] instead of dividing
/// by zero, and the result is clamped to the 0-100 scale.
pub fn compute_pulse(scores: &BTreeMap<String, f64>, weights: &BTreeMap<String, f64>) -> f64 {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for (sector, score) in scores {
        let w = weights.get(sector).copied().unwrap_or(0.0);
        weighted_sum += score * w;
        total_weight += w;
    }

    if total_weight > 0.0 {
        clamp_pulse(weighted_sum / total_weight)
    } else {
        NEUTRAL_PULSE
    }
}

/// Clamp to [0.0, 100.0].
pub fn clamp_pulse(x: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else if x > 100.0 {
        100.0
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn neutral_on_empty_inputs() {
        assert_eq!(compute_pulse(&BTreeMap::new(), &BTreeMap::new()), 50.0);
    }

    #[test]
    fn neutral_on_all_zero_weights() {
        let scores = map(&[("A", 80.0), ("B", 20.0)]);
        let weights = map(&[("A", 0.0), ("B", 0.0)]);
        assert_eq!(compute_pulse(&scores, &weights), 50.0);
    }

    #[test]
    fn basic_weighted_average() {
        let scores = map(&[("A", 80.0), ("B", 20.0)]);
        let weights = map(&[("A", 50.0), ("B", 50.0)]);
        assert!((compute_pulse(&scores, &weights) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn missing_weight_contributes_nothing() {
        let scores = map(&[("A", 80.0), ("B", 20.0)]);
        let weights = map(&[("A", 50.0)]);
        assert!((compute_pulse(&scores, &weights) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn weights_need_not_sum_to_100() {
        let scores = map(&[("A", 80.0), ("B", 40.0)]);
        let weights = map(&[("A", 2.0), ("B", 1.0)]);
        // (160 + 40) / 3
        assert!((compute_pulse(&scores, &weights) - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn clamp_guards_float_drift() {
        assert_eq!(clamp_pulse(100.0000001), 100.0);
        assert_eq!(clamp_pulse(-0.3), 0.0);
        assert_eq!(clamp_pulse(42.5), 42.5);
    }

    #[test]
    fn mood_bands_inclusive_boundaries() {
        assert_eq!(Mood::from_pulse(30.0), Mood::Bearish);
        assert_eq!(Mood::from_pulse(30.1), Mood::Neutral);
        assert_eq!(Mood::from_pulse(59.9), Mood::Neutral);
        assert_eq!(Mood::from_pulse(60.0), Mood::Bullish);
        assert_eq!(Mood::from_pulse(0.0), Mood::Bearish);
        assert_eq!(Mood::from_pulse(100.0), Mood::Bullish);
    }
}
