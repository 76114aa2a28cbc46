//! Console notification publisher for development. Logs messages to tracing output.

use async_trait::async_trait;
use rolegate_application::{NotificationMessage, NotificationPublisher, NotificationReceipt};
use rolegate_core::AppResult;
use tracing::info;

/// Development notification publisher that logs messages to the console.
#[derive(Clone)]
pub struct ConsoleNotificationPublisher;

impl ConsoleNotificationPublisher {
    /// Creates a new console notification publisher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNotificationPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationPublisher for ConsoleNotificationPublisher {
    async fn publish(&self, message: NotificationMessage) -> AppResult<NotificationReceipt> {
        let message_id = format!("console-{}", message.request_id);

        info!(
            topic = %message.topic,
            request_id = %message.request_id,
            "--- NOTIFICATION (console) ---\nTopic: {}\nSubject: {}\n\n{}\n--- END NOTIFICATION ---",
            message.topic,
            message.subject,
            message.body
        );

        Ok(NotificationReceipt { message_id })
    }
}
