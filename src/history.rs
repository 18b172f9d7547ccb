//! In-memory log of pulse views for the debug endpoints and trend charts.

use std::sync::Mutex;

use serde::Serialize;

use crate::board::PulseView;
use crate::pulse::Mood;

/// Compact record of one published pulse view.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub ts_unix: u64,
    pub pulse: f64,
    pub mood: Mood,
    /// How many sectors carried a score in the snapshot.
    pub sector_count: usize,
}

/// Capacity-capped history of pulse views, oldest entries dropped first.
#[derive(Debug)]
pub struct History {
    inner: Mutex<Vec<HistoryEntry>>,
    cap: usize,
}

impl History {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::with_capacity(cap.min(10_000))),
            cap: cap.min(10_000),
        }
    }

    pub fn push(&self, view: &PulseView) {
        let entry = HistoryEntry {
            ts_unix: view.generated_at.timestamp().max(0) as u64,
            pulse: view.pulse,
            mood: view.mood,
            sector_count: view.scores.len(),
        };

        let mut v = self.inner.lock().expect("history mutex poisoned");
        v.push(entry);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    pub fn snapshot_last_n(&self, n: usize) -> Vec<HistoryEntry> {
        let v = self.inner.lock().expect("history mutex poisoned");
        let len = v.len();
        let start = len.saturating_sub(n);
        v[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("history mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
