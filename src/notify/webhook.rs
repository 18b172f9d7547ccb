use anyhow::{Context, Result};
use reqwest::Client;

use super::{MoodEvent, Notifier};

/// Slack-compatible JSON webhook. Disabled when `PULSE_WEBHOOK_URL` is not
/// set; `send` is then a logged no-op.
pub struct WebhookNotifier {
    webhook_url: Option<String>,
    client: Client,
}

impl WebhookNotifier {
    pub fn from_env() -> Self {
        Self {
            webhook_url: std::env::var("PULSE_WEBHOOK_URL").ok(),
            client: Client::new(),
        }
    }

    /// Explicit constructor for tests/tools.
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: Some(url),
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, ev: &MoodEvent) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            tracing::debug!("webhook disabled (no PULSE_WEBHOOK_URL)");
            return Ok(());
        };

        let text = format!(
            "*{}*\nPulse: {:.2}\n@ {}",
            ev.headline(),
            ev.pulse,
            ev.ts.to_rfc3339()
        );
        let body = serde_json::json!({ "text": text });

        self.client
            .post(url)
            .json(&body)
            .send()
            .await
            .context("webhook post")?
            .error_for_status()
            .context("webhook non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
