//! Transport that hands messages to an HTTP mail relay
//!
//! Each message is POSTed as `{recipients, subject, body}`. Any non-2xx
//! answer is a delivery failure. Nothing is retried here; the relay owns
//! queueing.

use async_trait::async_trait;
use reqwest::Client;
use sla_engine::{MailTransport, OutboundMail};
use sla_types::{SlaError, SlaResult};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WebhookMailTransport {
    client: Client,
    url: String,
}

impl WebhookMailTransport {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> SlaResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SlaError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MailTransport for WebhookMailTransport {
    async fn send(&self, mail: &OutboundMail) -> SlaResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(mail)
            .send()
            .await
            .map_err(|e| SlaError::Transport(format!("mail relay request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SlaError::Transport(format!(
                "mail relay error {}: {}",
                status,
                truncate(&body, 200)
            )));
        }

        tracing::debug!(url = %self.url, recipients = ?mail.recipients, "Mail handed to relay");
        Ok(())
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
        assert_eq!(truncate("ééé", 2), "éé");
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_transport_error() {
        let transport = WebhookMailTransport::new("http://127.0.0.1:9/send", 1).unwrap();
        let mail = OutboundMail::to("agent@example.com", "subject", "body");
        let err = transport.send(&mail).await.unwrap_err();
        assert!(matches!(err, SlaError::Transport(_)));
    }
}
