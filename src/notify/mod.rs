//! Mood-change notification channels.
//!
//! Channels are configured from env and muxed together; a channel that is
//! not configured stays a silent no-op, so the watcher can always call
//! `notify` without caring which outputs exist.

pub mod antiflutter;
pub mod email;
pub mod webhook;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::pulse::Mood;

/// One mood transition worth telling someone about.
#[derive(Debug, Clone)]
pub struct MoodEvent {
    pub mood: Mood,
    pub previous: Option<Mood>,
    pub pulse: f64,
    pub ts: DateTime<Utc>,
}

impl MoodEvent {
    /// One-line summary shared by the text channels.
    pub fn headline(&self) -> String {
        match self.previous {
            Some(prev) => format!(
                "T2D Pulse: {:?} -> {:?} (pulse {:.1})",
                prev, self.mood, self.pulse
            ),
            None => format!("T2D Pulse: {:?} (pulse {:.1})", self.mood, self.pulse),
        }
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, ev: &MoodEvent) -> anyhow::Result<()>;
    fn name(&self) -> &'static str;
}

/// Fan-out over every configured channel. Send failures are logged, never
/// propagated; a dead webhook must not stall the watcher.
pub struct NotifierMux {
    channels: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn from_env() -> Self {
        let mut channels: Vec<Box<dyn Notifier>> =
            vec![Box::new(webhook::WebhookNotifier::from_env())];

        match email::EmailNotifier::from_env() {
            Ok(Some(n)) => channels.push(Box::new(n)),
            Ok(None) => {}
            Err(e) => warn!("email notifier disabled: {e:#}"),
        }

        Self { channels }
    }

    pub async fn notify(&self, ev: &MoodEvent) {
        for ch in &self.channels {
            if let Err(e) = ch.send(ev).await {
                warn!(channel = ch.name(), "notify failed: {e:#}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headline_includes_transition() {
        let ev = MoodEvent {
            mood: Mood::Bullish,
            previous: Some(Mood::Bearish),
            pulse: 72.3,
            ts: Utc::now(),
        };
        let line = ev.headline();
        assert!(line.contains("Bearish"));
        assert!(line.contains("Bullish"));
        assert!(line.contains("72.3"));
    }

    #[test]
    fn headline_without_previous_mood() {
        let ev = MoodEvent {
            mood: Mood::Neutral,
            previous: None,
            pulse: 50.0,
            ts: Utc::now(),
        };
        assert!(ev.headline().contains("Neutral"));
    }
}
