// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod board;
pub mod config;
pub mod history;
pub mod metrics;
pub mod pulse;
pub mod rolling;
pub mod sectors;
pub mod sentiment;
pub mod watch;
pub mod weights;

// Notifications & background jobs
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::board::{PulseBoard, PulseView};
pub use crate::pulse::{compute_pulse, Mood};
pub use crate::weights::{
    apply_weight_edit, reset_to_equal_weights, weights_from_market_caps, WeightError,
};

// Re-export notification types for easy use in bins/tests
pub use crate::notify::{MoodEvent, NotifierMux};
