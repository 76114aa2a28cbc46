use async_trait::async_trait;
use rolegate_core::{AppResult, RequestId};

/// Message published to approvers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    /// Fully qualified topic address.
    pub topic: String,
    /// Message subject line.
    pub subject: String,
    /// Human-readable message body.
    pub body: String,
    /// Correlation key, also used as the idempotency key.
    pub request_id: RequestId,
}

/// Opaque acknowledgement returned by the notification channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationReceipt {
    /// Channel-assigned message identifier.
    pub message_id: String,
}

/// Port for the publish/subscribe channel that reaches approvers.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Publishes one message to its topic.
    async fn publish(&self, message: NotificationMessage) -> AppResult<NotificationReceipt>;
}
