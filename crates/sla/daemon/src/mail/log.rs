//! Transport that writes each message to the log instead of sending it

use async_trait::async_trait;
use sla_engine::{MailTransport, OutboundMail};
use sla_types::SlaResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailTransport;

impl LogMailTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, mail: &OutboundMail) -> SlaResult<()> {
        tracing::info!(
            recipients = ?mail.recipients,
            subject = %mail.subject,
            body = %mail.body,
            "Outbound mail (log transport)"
        );
        Ok(())
    }
}
