use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static DESCRIBED: OnceCell<()> = OnceCell::new();

/// One-time registration of series descriptions, safe to call repeatedly.
pub fn ensure_metrics_described() {
    DESCRIBED.get_or_init(|| {
        describe_gauge!("pulse_score", "Latest published aggregate pulse score (0-100).");
        describe_counter!("pulse_edits_total", "Accepted sector weight edits.");
        describe_counter!(
            "pulse_edit_rejects_total",
            "Weight edits rejected for referencing an unknown sector."
        );
        describe_counter!(
            "pulse_resets_total",
            "Weight resets, including market-cap adoptions."
        );
        describe_counter!("pulse_feed_refresh_total", "Score snapshot replacements.");
        describe_counter!("pulse_watch_ticks_total", "Mood watcher sampling ticks.");
        describe_counter!("pulse_mood_alerts_total", "Mood-change alerts dispatched.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and register series descriptions.
    pub fn init() -> Self {
        // Use default buckets to avoid API differences across crate versions.
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        ensure_metrics_described();

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
