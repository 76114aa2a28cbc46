use std::sync::Arc;

use rolegate_core::{AppError, AppResult};
use rolegate_domain::AccessRequest;
use tracing::info;

use crate::access_ports::{NotificationMessage, NotificationPublisher, NotificationReceipt};

/// Subject line of approval request notifications.
pub const APPROVAL_REQUEST_SUBJECT: &str = "Administrator Access Request";

/// Formats approval requests and hands them to the notification channel.
#[derive(Clone)]
pub struct NotificationDispatcher {
    publisher: Arc<dyn NotificationPublisher>,
    topic: String,
}

impl NotificationDispatcher {
    /// Creates a dispatcher publishing to `topic`.
    #[must_use]
    pub fn new(publisher: Arc<dyn NotificationPublisher>, topic: impl Into<String>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
        }
    }

    /// Notifies approvers about one request.
    ///
    /// Every failure is reported as `AppError::Notification`; whether that
    /// aborts anything is the caller's decision.
    pub async fn notify(&self, request: &AccessRequest) -> AppResult<NotificationReceipt> {
        let message = NotificationMessage {
            topic: self.topic.clone(),
            subject: APPROVAL_REQUEST_SUBJECT.to_owned(),
            body: approval_request_message(request),
            request_id: request.request_id(),
        };

        let receipt = self
            .publisher
            .publish(message)
            .await
            .map_err(|error| match error {
                AppError::Notification(message) => AppError::Notification(message),
                other => AppError::Notification(other.to_string()),
            })?;

        info!(
            request_id = %request.request_id(),
            topic = %self.topic,
            message_id = %receipt.message_id,
            "approval request notification sent"
        );

        Ok(receipt)
    }
}

/// Renders the fixed approval request message.
#[must_use]
pub fn approval_request_message(request: &AccessRequest) -> String {
    format!(
        "Access request for admin role in account {} for role {}. \
         Requested by {} <{}> (request {}). Please approve or reject.",
        request.account_id(),
        request.role_name(),
        request.requester_name(),
        request.requester_email(),
        request.request_id()
    )
}
