use std::time::Duration;

use async_trait::async_trait;
use rolegate_application::{NotificationMessage, NotificationPublisher, NotificationReceipt};
use rolegate_core::{AppError, AppResult};
use serde_json::Value;
use tracing::warn;
use url::Url;
use uuid::Uuid;

/// HTTP webhook implementation of the notification channel.
pub struct WebhookNotificationPublisher {
    http_client: reqwest::Client,
    endpoint: Url,
    max_attempts: u8,
    retry_backoff_ms: u64,
}

impl WebhookNotificationPublisher {
    /// Creates a new webhook notification publisher.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        endpoint: Url,
        max_attempts: u8,
        retry_backoff_ms: u64,
    ) -> Self {
        Self {
            http_client,
            endpoint,
            max_attempts: max_attempts.max(1),
            retry_backoff_ms: retry_backoff_ms.max(50),
        }
    }

    async fn publish_with_retry(&self, message: &NotificationMessage) -> AppResult<Option<Value>> {
        let idempotency_key = message.request_id.to_string();
        let payload = serde_json::json!({
            "topic": message.topic,
            "subject": message.subject,
            "message": message.body,
            "request_id": idempotency_key,
        });

        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < self.max_attempts {
            attempt = attempt.saturating_add(1);
            let response = self
                .http_client
                .post(self.endpoint.clone())
                .header("Idempotency-Key", idempotency_key.as_str())
                .json(&payload)
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.json::<Value>().await.ok());
                }
                Ok(response)
                    if response.status().is_server_error()
                        || response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS =>
                {
                    last_error = Some(format!(
                        "transient HTTP status {} for notification '{}'",
                        response.status(),
                        idempotency_key
                    ));
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
                    return Err(AppError::Notification(format!(
                        "notification webhook rejected message with status {status}: {body}"
                    )));
                }
                Err(error) => {
                    last_error = Some(format!("notification webhook transport error: {error}"));
                }
            }

            if attempt < self.max_attempts {
                warn!(
                    request_id = %message.request_id,
                    attempt,
                    "notification delivery failed, retrying"
                );
                let delay = self.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Notification(last_error.unwrap_or_else(|| {
            "notification webhook exhausted retries".to_owned()
        })))
    }
}

#[async_trait]
impl NotificationPublisher for WebhookNotificationPublisher {
    async fn publish(&self, message: NotificationMessage) -> AppResult<NotificationReceipt> {
        let body = self.publish_with_retry(&message).await?;

        let message_id = body
            .as_ref()
            .and_then(|body| body.get("message_id"))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(NotificationReceipt { message_id })
    }
}

#[cfg(test)]
mod tests {
    use rolegate_application::{NotificationMessage, NotificationPublisher};
    use rolegate_core::{AppError, RequestId};
    use url::Url;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::WebhookNotificationPublisher;

    fn publisher(server: &MockServer, max_attempts: u8) -> WebhookNotificationPublisher {
        let endpoint = Url::parse(format!("{}/notify", server.uri()).as_str())
            .unwrap_or_else(|_| unreachable!());
        WebhookNotificationPublisher::new(reqwest::Client::new(), endpoint, max_attempts, 50)
    }

    fn message(request_id: RequestId) -> NotificationMessage {
        NotificationMessage {
            topic: "arn:aws:sns:eu-west-1:111122223333:approvals".to_owned(),
            subject: "Administrator Access Request".to_owned(),
            body: "Please approve or reject.".to_owned(),
            request_id,
        }
    }

    #[tokio::test]
    async fn posts_message_with_idempotency_key_and_reads_receipt() {
        let server = MockServer::start().await;
        let request_id = RequestId::new();

        Mock::given(method("POST"))
            .and(path("/notify"))
            .and(header("Idempotency-Key", request_id.to_string().as_str()))
            .and(body_partial_json(serde_json::json!({
                "topic": "arn:aws:sns:eu-west-1:111122223333:approvals",
                "subject": "Administrator Access Request",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message_id": "m-42"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = publisher(&server, 3).publish(message(request_id)).await;

        assert!(matches!(receipt, Ok(receipt) if receipt.message_id == "m-42"));
    }

    #[tokio::test]
    async fn retries_transient_failures_before_succeeding() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/notify"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = publisher(&server, 3).publish(message(RequestId::new())).await;

        assert!(matches!(receipt, Ok(receipt) if !receipt.message_id.is_empty()));
    }

    #[tokio::test]
    async fn client_errors_fail_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/notify"))
            .respond_with(ResponseTemplate::new(403).set_body_string("topic closed"))
            .expect(1)
            .mount(&server)
            .await;

        let result = publisher(&server, 3).publish(message(RequestId::new())).await;

        assert!(matches!(
            result,
            Err(AppError::Notification(message)) if message.contains("topic closed")
        ));
    }

    #[tokio::test]
    async fn exhausted_retries_surface_notification_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/notify"))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;

        let result = publisher(&server, 2).publish(message(RequestId::new())).await;

        assert!(matches!(
            result,
            Err(AppError::Notification(message)) if message.contains("429")
        ));
    }
}
