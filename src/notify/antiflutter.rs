use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::pulse::Mood;

/// Cooldown gate against mood-flip spam.
/// - First alert always allowed.
/// - Inside cooldown, only a full Bearish<->Bullish reversal passes;
///   moves into or out of Neutral wait the cooldown out.
/// - State is updated explicitly via `record_alert` after a successful send.
#[derive(Debug, Clone, Default)]
pub struct AntiFlutter {
    cooldown: ChronoDuration,
    last_alert_ts: Option<DateTime<Utc>>,
    last_mood: Option<Mood>,
}

impl AntiFlutter {
    /// `cooldown_secs` < 0 is treated as 0 (no cooldown).
    pub fn new(cooldown_secs: i64) -> Self {
        let secs = cooldown_secs.max(0);
        Self {
            cooldown: ChronoDuration::seconds(secs),
            last_alert_ts: None,
            last_mood: None,
        }
    }

    /// Check if we may alert at `now` for `mood`. Does NOT mutate state.
    pub fn should_alert(&self, mood: Mood, now: DateTime<Utc>) -> bool {
        let Some(ts) = self.last_alert_ts else {
            return true;
        };
        if now.signed_duration_since(ts) >= self.cooldown {
            return true;
        }
        matches!(
            (self.last_mood, mood),
            (Some(Mood::Bearish), Mood::Bullish) | (Some(Mood::Bullish), Mood::Bearish)
        )
    }

    /// Record that an alert was sent at `now` for `mood`.
    pub fn record_alert(&mut self, mood: Mood, now: DateTime<Utc>) {
        self.last_alert_ts = Some(now);
        self.last_mood = Some(mood);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn first_alert_passes() {
        let af = AntiFlutter::new(10_800);
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap();
        assert!(af.should_alert(Mood::Bullish, now));
    }

    #[test]
    fn neutral_flip_inside_cooldown_blocked() {
        let mut af = AntiFlutter::new(10_800);
        let t0 = Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap();
        af.record_alert(Mood::Bullish, t0);
        let t1 = t0 + ChronoDuration::seconds(120);
        assert!(!af.should_alert(Mood::Neutral, t1));
    }

    #[test]
    fn reversal_inside_cooldown_passes() {
        let mut af = AntiFlutter::new(10_800);
        let t0 = Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap();
        af.record_alert(Mood::Bullish, t0);
        let t1 = t0 + ChronoDuration::seconds(120);
        assert!(af.should_alert(Mood::Bearish, t1));
    }

    #[test]
    fn after_cooldown_anything_passes() {
        let mut af = AntiFlutter::new(10_800);
        let t0 = Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap();
        af.record_alert(Mood::Bearish, t0);
        let t_after = t0 + ChronoDuration::seconds(10_800 + 5);
        assert!(af.should_alert(Mood::Neutral, t_after));
    }

    #[test]
    fn zero_cooldown_never_blocks() {
        let mut af = AntiFlutter::new(0);
        let t0 = Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap();
        af.record_alert(Mood::Bullish, t0);
        assert!(af.should_alert(Mood::Neutral, t0));
    }
}
