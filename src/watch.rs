//! Background mood watcher.
//!
//! Samples the board on an interval and pushes a [`MoodEvent`] through the
//! notifier mux when the mood band changes. Observation is in-process, no
//! HTTP round-trip to our own API.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use tokio::{task::JoinHandle, time};
use tracing::{debug, info};

use crate::board::PulseBoard;
use crate::notify::antiflutter::AntiFlutter;
use crate::notify::{MoodEvent, NotifierMux};
use crate::pulse::Mood;

/// Default alert cooldown, 3 hours.
const DEFAULT_COOLDOWN_SECS: i64 = 10_800;

fn cooldown_from_env() -> i64 {
    std::env::var("ALERT_COOLDOWN_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_COOLDOWN_SECS)
}

/// Spawn the watcher loop. Runs until the process exits.
pub fn spawn_mood_watch(
    board: Arc<PulseBoard>,
    interval_secs: u64,
    mux: NotifierMux,
) -> JoinHandle<()> {
    let cooldown = cooldown_from_env();
    tokio::spawn(async move {
        let mut ticker = time::interval(time::Duration::from_secs(interval_secs.max(1)));
        let mut af = AntiFlutter::new(cooldown);
        let mut last_mood: Option<Mood> = None;

        info!(interval_secs, cooldown_secs = cooldown, "mood watcher started");

        loop {
            ticker.tick().await;
            counter!("pulse_watch_ticks_total").increment(1);

            let view = board.view();
            let now = Utc::now();

            if last_mood == Some(view.mood) {
                continue;
            }

            if af.should_alert(view.mood, now) {
                let ev = MoodEvent {
                    mood: view.mood,
                    previous: last_mood,
                    pulse: view.pulse,
                    ts: now,
                };
                mux.notify(&ev).await;
                af.record_alert(view.mood, now);
                counter!("pulse_mood_alerts_total").increment(1);
                info!(mood = ?view.mood, pulse = view.pulse, "mood change alerted");
            } else {
                debug!(mood = ?view.mood, "mood change suppressed by antiflutter");
            }

            last_mood = Some(view.mood);
        }
    })
}
