use std::sync::Arc;

use rolegate_application::{
    AccessRequestOrchestrator, ApprovalPoller, ApprovalWorkflow, CredentialBroker,
    NotificationDispatcher, ObservationPolicy,
};
use rolegate_core::AppError;
use rolegate_infrastructure::{
    HttpApprovalStatusSource, HttpRoleAssumptionService, InProcessWorkflowEngine,
};
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::notifications::build_notification_publisher;

pub fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let dispatcher = NotificationDispatcher::new(
        build_notification_publisher(config, &http_client),
        config.topic_arn.as_str(),
    );
    let poller = ApprovalPoller::new(Arc::new(HttpApprovalStatusSource::new(
        http_client.clone(),
        config.approval_api_url.clone(),
    )))
    .with_retry_delay(config.approval_retry_delay);
    let broker = CredentialBroker::new(
        Arc::new(HttpRoleAssumptionService::new(
            http_client,
            config.role_assumption_url.clone(),
        )),
        config.aws_partition.as_str(),
    );

    let workflow = ApprovalWorkflow::new(dispatcher, poller, broker)
        .with_max_retries(config.approval_max_retries);
    let engine = InProcessWorkflowEngine::new()
        .with_definition(config.state_machine_arn.as_str(), Arc::new(workflow))
        .with_execution_timeout(config.execution_timeout);

    let orchestrator =
        AccessRequestOrchestrator::new(Arc::new(engine), config.state_machine_arn.as_str())
            .with_observation_policy(ObservationPolicy {
                poll_interval: config.execution_poll_interval,
                max_wait: config.execution_max_wait,
            });

    info!(
        definition_id = %config.state_machine_arn,
        topic = %config.topic_arn,
        max_retries = config.approval_max_retries,
        "access request services initialized"
    );

    Ok(AppState { orchestrator })
}
