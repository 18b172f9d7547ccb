use anyhow::{anyhow, Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{MoodEvent, Notifier};

/// SMTP channel for mood alerts, the successor of the daily report mail.
/// Configured entirely from env; absent `NOTIFY_EMAIL_TO` means the
/// channel is off.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// `Ok(None)` when the channel is not configured; `Err` when it is
    /// configured but incompletely or invalidly.
    pub fn from_env() -> Result<Option<Self>> {
        let Ok(to_addr) = std::env::var("NOTIFY_EMAIL_TO") else {
            return Ok(None);
        };

        let host = std::env::var("SMTP_HOST").context("SMTP_HOST missing")?;
        let user = std::env::var("SMTP_USER").context("SMTP_USER missing")?;
        let pass = std::env::var("SMTP_PASS").context("SMTP_PASS missing")?;
        let from_addr =
            std::env::var("NOTIFY_EMAIL_FROM").context("NOTIFY_EMAIL_FROM missing")?;

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();

        let from = from_addr
            .parse()
            .map_err(|e| anyhow!("invalid NOTIFY_EMAIL_FROM: {e}"))?;
        let to = to_addr
            .parse()
            .map_err(|e| anyhow!("invalid NOTIFY_EMAIL_TO: {e}"))?;

        Ok(Some(Self { mailer, from, to }))
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, ev: &MoodEvent) -> Result<()> {
        let subject = ev.headline();
        let body = format!(
            "Mood: {:?}\nPrevious: {}\nPulse: {:.2}\nTimestamp: {}\n",
            ev.mood,
            ev.previous
                .map(|m| format!("{m:?}"))
                .unwrap_or_else(|| "-".to_string()),
            ev.pulse,
            ev.ts.to_rfc3339()
        );

        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
