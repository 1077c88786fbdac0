//! Best-effort NATS publishing of order events.

use crate::domain::events::OrderEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    client: Option<async_nats::Client>,
    prefix: String,
}

impl EventPublisher {
    /// No NATS configured: events are only logged.
    pub fn disabled() -> Self { Self::default() }

    pub async fn connect(url: Option<&str>, prefix: &str) -> Self {
        let client = match url {
            Some(url) => match async_nats::connect(url).await {
                Ok(c) => { tracing::info!(url, "connected to NATS"); Some(c) }
                Err(e) => { tracing::warn!(url, error = %e, "NATS unavailable, order events will not be published"); None }
            },
            None => None,
        };
        Self { client, prefix: prefix.to_string() }
    }

    pub fn subject_for(&self, event: &OrderEvent) -> String {
        if self.prefix.is_empty() { event.subject().to_string() } else { format!("{}.{}", self.prefix, event.subject()) }
    }

    /// Never fails the caller; the write this event describes is already committed.
    pub async fn publish(&self, event: OrderEvent) {
        let Some(client) = &self.client else {
            tracing::debug!(subject = event.subject(), "event publishing disabled");
            return;
        };
        let subject = self.subject_for(&event);
        let payload = match serde_json::to_vec(&event) {
            Ok(p) => p,
            Err(e) => { tracing::warn!(%subject, error = %e, "could not encode event"); return; }
        };
        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
            tracing::warn!(%subject, error = %e, "event publish failed");
        }
    }
}
