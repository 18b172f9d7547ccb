//! # Pulse Board
//!
//! The single owner of the shared mutable state: the current sector
//! weights and the latest score snapshot from the feed.
//!
//! Every mutation (edit, reset, market-cap adoption, feed refresh) runs as
//! one read-modify-write inside the weights lock and answers with a fully
//! consistent [`PulseView`] built from the same snapshot. Splitting the
//! read and the write across two stages is exactly the lost-update race
//! this type exists to rule out.
//!
//! Lock order is weights, then snapshot; all operations are synchronous
//! CPU-bound work, so no lock is ever held across an await point.

use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{info, warn};

use crate::history::History;
use crate::pulse::{compute_pulse, Mood};
use crate::rolling::RollingWindow;
use crate::weights::{
    apply_weight_edit, reset_to_equal_weights, weights_from_market_caps, WeightError,
};

/// Latest complete score mapping from the feed. Replaced wholesale on
/// refresh, never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct ScoreSnapshot {
    pub scores: BTreeMap<String, f64>,
    pub as_of: Option<DateTime<Utc>>,
}

/// One consistent observation of the board: weights, scores, and the pulse
/// computed from exactly those two maps.
#[derive(Debug, Clone, Serialize)]
pub struct PulseView {
    pub pulse: f64,
    pub mood: Mood,
    pub weights: BTreeMap<String, f64>,
    pub scores: BTreeMap<String, f64>,
    /// Feed timestamp of the score snapshot, when one was supplied.
    pub as_of: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct PulseBoard {
    weights: Mutex<BTreeMap<String, f64>>,
    snapshot: RwLock<ScoreSnapshot>,
    history: History,
    rolling: RollingWindow,
    floor: f64,
}

impl PulseBoard {
    pub fn new(
        initial_weights: BTreeMap<String, f64>,
        floor: f64,
        history_capacity: usize,
        rolling_window: Duration,
    ) -> Self {
        Self {
            weights: Mutex::new(initial_weights),
            snapshot: RwLock::new(ScoreSnapshot::default()),
            history: History::with_capacity(history_capacity),
            rolling: RollingWindow::with_window(rolling_window),
            floor,
        }
    }

    /// Current consistent view without mutating anything.
    pub fn view(&self) -> PulseView {
        let weights = self.weights.lock().expect("weights mutex poisoned");
        let snapshot = self.snapshot.read().expect("snapshot rwlock poisoned");
        build_view(&weights, &snapshot)
    }

    /// Apply one user weight edit atomically and publish the new view.
    pub fn apply_edit(&self, sector: &str, value: f64) -> Result<PulseView, WeightError> {
        let mut weights = self.weights.lock().expect("weights mutex poisoned");
        let next = match apply_weight_edit(&weights, sector, value, self.floor) {
            Ok(next) => next,
            Err(e) => {
                counter!("pulse_edit_rejects_total").increment(1);
                return Err(e);
            }
        };
        *weights = next;

        let snapshot = self.snapshot.read().expect("snapshot rwlock poisoned");
        let view = build_view(&weights, &snapshot);
        drop(snapshot);
        drop(weights);

        counter!("pulse_edits_total").increment(1);
        info!(sector = %sector, value, pulse = view.pulse, "weight edit applied");
        self.publish(&view);
        Ok(view)
    }

    /// Reset to equal weights over the authoritative sector list: the
    /// current snapshot's key set when the feed has delivered one, else the
    /// sectors already tracked by the weight map.
    pub fn reset(&self) -> PulseView {
        let mut weights = self.weights.lock().expect("weights mutex poisoned");
        let snapshot = self.snapshot.read().expect("snapshot rwlock poisoned");

        let sectors: Vec<String> = if snapshot.scores.is_empty() {
            weights.keys().cloned().collect()
        } else {
            snapshot.scores.keys().cloned().collect()
        };
        *weights = reset_to_equal_weights(sectors);

        let view = build_view(&weights, &snapshot);
        drop(snapshot);
        drop(weights);

        counter!("pulse_resets_total").increment(1);
        info!(pulse = view.pulse, "weights reset to equal split");
        self.publish(&view);
        view
    }

    /// Replace the weights with shares derived from per-sector market caps.
    /// Explicit like reset; never fires implicitly.
    pub fn adopt_market_caps(&self, caps: &BTreeMap<String, f64>) -> PulseView {
        let mut weights = self.weights.lock().expect("weights mutex poisoned");
        *weights = weights_from_market_caps(caps);

        let snapshot = self.snapshot.read().expect("snapshot rwlock poisoned");
        let view = build_view(&weights, &snapshot);
        drop(snapshot);
        drop(weights);

        counter!("pulse_resets_total").increment(1);
        info!(sectors = caps.len(), pulse = view.pulse, "market-cap weights adopted");
        self.publish(&view);
        view
    }

    /// Replace the score snapshot wholesale with a fresh feed delivery.
    /// Out-of-range scores are clamped to the 0-100 scale with a warning.
    pub fn refresh_scores(
        &self,
        scores: BTreeMap<String, f64>,
        as_of: Option<DateTime<Utc>>,
    ) -> PulseView {
        let mut clean = BTreeMap::new();
        for (sector, score) in scores {
            let clamped = if score.is_finite() {
                score.clamp(0.0, 100.0)
            } else {
                50.0
            };
            if clamped != score {
                warn!(sector = %sector, score, "feed score outside 0-100, clamped");
            }
            clean.insert(sector, clamped);
        }

        let weights = self.weights.lock().expect("weights mutex poisoned");
        let mut snapshot = self.snapshot.write().expect("snapshot rwlock poisoned");
        snapshot.scores = clean;
        snapshot.as_of = as_of.or_else(|| Some(Utc::now()));

        let view = build_view(&weights, &snapshot);
        drop(snapshot);
        drop(weights);

        counter!("pulse_feed_refresh_total").increment(1);
        info!(
            sectors = view.scores.len(),
            pulse = view.pulse,
            "score snapshot refreshed"
        );
        self.publish(&view);
        view
    }

    pub fn history_last_n(&self, n: usize) -> Vec<crate::history::HistoryEntry> {
        self.history.snapshot_last_n(n)
    }

    pub fn rolling_stats(&self) -> (f64, usize, u64) {
        let (avg, n) = self.rolling.average_and_count();
        (avg, n, self.rolling.window_secs())
    }

    pub fn weight_floor(&self) -> f64 {
        self.floor
    }

    fn publish(&self, view: &PulseView) {
        gauge!("pulse_score").set(view.pulse);
        self.history.push(view);
        self.rolling.record(view.pulse, None);
    }
}

fn build_view(weights: &BTreeMap<String, f64>, snapshot: &ScoreSnapshot) -> PulseView {
    let now = Utc::now();
    let pulse = compute_pulse(&snapshot.scores, weights);
    PulseView {
        pulse,
        mood: Mood::from_pulse(pulse),
        weights: weights.clone(),
        scores: snapshot.scores.clone(),
        as_of: snapshot.as_of.unwrap_or(now),
        generated_at: now,
    }
}
