//! # Weight Protocol
//!
//! The interactive weight-edit renormalization rules, the equal-weight
//! reset, and market-cap weight derivation.
//!
//! Every operation is copy-on-write over a `BTreeMap`, so a failed edit can
//! never leave a half-applied map behind. The sorted key order of the map
//! also pins which sector absorbs rounding residue (the first sector other
//! than the edited one), keeping repeated edits deterministic.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::sectors::closest_sector;

/// Weights at rest sum to 100 within this epsilon.
pub const SUM_EPSILON: f64 = 0.01;
/// Upper bound for any single sector weight.
pub const WEIGHT_CEILING: f64 = 100.0;
/// Canonical per-sector floor for direct edits. Configs may lower it to 0
/// to allow muting a sector entirely.
pub const DEFAULT_WEIGHT_FLOOR: f64 = 1.0;

/// Errors raised by weight operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    /// The edit referenced a sector the weight map does not track. The edit
    /// is rejected outright; silently inserting the sector would let the
    /// weight store drift out of sync with the score feed.
    #[error("unknown sector '{sector}'")]
    UnknownSector {
        /// The name the caller supplied.
        sector: String,
        /// Closest tracked sector by edit distance, when one is plausible.
        suggestion: Option<String>,
    },
}

/// Apply a single-sector edit and renormalize the rest.
///
/// Steps:
/// 1. Clamp `new_value` to `[floor, 100]`.
/// 2. Set the edited sector to the clamped value.
/// 3. Scale every other sector by `(100 - new) / sum(others)` so the map
///    re-sums to 100, rounding each scaled weight to 2 decimals. Skipped
///    when the other-sector sum is 0 (lone sector, or all others muted).
/// 4. If the total still drifts from 100 by more than [`SUM_EPSILON`], add
///    the rounded residue to the first sector in key order that is not the
///    edited one (or to the edited sector itself when it is alone).
/// 5. Round every weight to 2 decimals.
///
/// The input map is never mutated; the renormalized copy is returned.
pub fn apply_weight_edit(
    weights: &BTreeMap<String, f64>,
    sector: &str,
    new_value: f64,
    floor: f64,
) -> Result<BTreeMap<String, f64>, WeightError> {
    if !weights.contains_key(sector) {
        return Err(WeightError::UnknownSector {
            sector: sector.to_string(),
            suggestion: closest_sector(sector, weights.keys().map(|k| k.as_str())),
        });
    }

    let floor = floor.clamp(0.0, WEIGHT_CEILING);
    let target = if new_value.is_finite() {
        new_value.clamp(floor, WEIGHT_CEILING)
    } else {
        floor
    };

    let mut next = weights.clone();
    next.insert(sector.to_string(), target);

    let mut other_sum = 0.0;
    for (name, w) in &next {
        if name != sector {
            other_sum += *w;
        }
    }

    if other_sum > 0.0 {
        let scale = (WEIGHT_CEILING - target) / other_sum;
        for (name, w) in next.iter_mut() {
            if name != sector {
                *w = round2(*w * scale);
            }
        }
    }

    let total: f64 = next.values().sum();
    if (total - WEIGHT_CEILING).abs() > SUM_EPSILON {
        let residue = round2(WEIGHT_CEILING - total);
        let absorber = next
            .keys()
            .find(|name| name.as_str() != sector)
            .cloned()
            .unwrap_or_else(|| sector.to_string());
        if let Some(w) = next.get_mut(&absorber) {
            *w += residue;
        }
    }

    for w in next.values_mut() {
        *w = round2(*w);
    }

    Ok(next)
}

/// Equal split across the given sectors, `100 / n` each, unrounded.
/// Duplicate names collapse before the share is computed.
pub fn reset_to_equal_weights<I, S>(sectors: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: BTreeSet<String> = sectors.into_iter().map(Into::into).collect();
    if names.is_empty() {
        return BTreeMap::new();
    }

    let share = WEIGHT_CEILING / names.len() as f64;
    names.into_iter().map(|name| (name, share)).collect()
}

/// Derive percentage weights from per-sector market caps.
///
/// Shares are rounded to 2 decimals; whatever rounding residue remains goes
/// to the first sector in key order, the same tie-break the edit protocol
/// uses. Non-positive or non-finite caps count as zero; an unusable total
/// falls back to an equal split.
pub fn weights_from_market_caps(caps: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let mut total = 0.0;
    for cap in caps.values() {
        if cap.is_finite() && *cap > 0.0 {
            total += *cap;
        }
    }

    if total <= 0.0 {
        return reset_to_equal_weights(caps.keys().cloned());
    }

    let mut weights = BTreeMap::new();
    for (sector, cap) in caps {
        let cap = if cap.is_finite() && *cap > 0.0 { *cap } else { 0.0 };
        weights.insert(sector.clone(), round2(cap / total * WEIGHT_CEILING));
    }

    let rounded_total: f64 = weights.values().sum();
    let residue = round2(WEIGHT_CEILING - rounded_total);
    if residue != 0.0 {
        if let Some(w) = weights.values_mut().next() {
            *w = round2(*w + residue);
        }
    }

    weights
}

/// Round to 2 decimal places, the display resolution for weights.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
