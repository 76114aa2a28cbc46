use std::sync::Arc;

use rolegate_application::NotificationPublisher;
use rolegate_infrastructure::{ConsoleNotificationPublisher, WebhookNotificationPublisher};

use crate::api_config::{ApiConfig, NotificationProviderConfig};

pub(super) fn build_notification_publisher(
    config: &ApiConfig,
    http_client: &reqwest::Client,
) -> Arc<dyn NotificationPublisher> {
    match &config.notification_provider {
        NotificationProviderConfig::Console => Arc::new(ConsoleNotificationPublisher::new()),
        NotificationProviderConfig::Webhook { endpoint } => {
            Arc::new(WebhookNotificationPublisher::new(
                http_client.clone(),
                endpoint.clone(),
                config.notification_max_attempts,
                config.notification_retry_backoff_ms,
            ))
        }
    }
}
