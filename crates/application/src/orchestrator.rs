use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rolegate_core::{AppError, AppResult, RequestId};
use rolegate_domain::{
    AccessRequest, AccessRequestInput, AccessRequestLifecycle, AccessRequestState,
    ApprovalOutcome, ExecutionId, ExecutionStatus, MaskedCredentials, TerminalOutcome,
    WorkflowExecution,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::access_ports::WorkflowEngine;
use crate::approval_workflow::{ApprovalWorkflowOutput, record_transition};

mod observation;
mod response;

#[cfg(test)]
mod tests;

pub use response::{AccessRequestStatus, SubmissionBody, SubmissionResponse, sanitize_error};

/// Default pause between execution describe calls.
pub const DEFAULT_EXECUTION_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default upper bound on how long one submission waits for its execution.
pub const DEFAULT_EXECUTION_MAX_WAIT: Duration = Duration::from_secs(900);

/// How the orchestrator watches a started execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationPolicy {
    /// Pause between describe calls.
    pub poll_interval: Duration,
    /// Deadline after which the execution is stopped. `None` waits forever.
    pub max_wait: Option<Duration>,
}

impl Default for ObservationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_EXECUTION_POLL_INTERVAL,
            max_wait: Some(DEFAULT_EXECUTION_MAX_WAIT),
        }
    }
}

/// Submission front door: validates requests, starts approval executions
/// and turns their terminal state into a client response.
#[derive(Clone)]
pub struct AccessRequestOrchestrator {
    engine: Arc<dyn WorkflowEngine>,
    definition_id: String,
    observation: ObservationPolicy,
}

impl AccessRequestOrchestrator {
    /// Creates an orchestrator starting executions of `definition_id`.
    #[must_use]
    pub fn new(engine: Arc<dyn WorkflowEngine>, definition_id: impl Into<String>) -> Self {
        Self {
            engine,
            definition_id: definition_id.into(),
            observation: ObservationPolicy::default(),
        }
    }

    /// Overrides the execution observation policy.
    #[must_use]
    pub fn with_observation_policy(mut self, observation: ObservationPolicy) -> Self {
        self.observation = observation;
        self
    }

    /// Submits one access request and waits for its terminal outcome.
    ///
    /// Never fails: every fault is folded into the returned status code.
    pub async fn submit(&self, input: AccessRequestInput) -> SubmissionResponse {
        let request = match AccessRequest::new(input) {
            Ok(request) => request,
            Err(error) => {
                warn!(error = %error, "rejected invalid access request");
                return SubmissionResponse::invalid_input(&error);
            }
        };

        let request_id = request.request_id();
        let mut lifecycle = AccessRequestLifecycle::new(request_id);
        info!(
            request_id = %request_id,
            account_id = %request.account_id(),
            role_name = %request.role_name(),
            requester = %request.requester_name(),
            "access request created"
        );

        let execution_id = match self
            .engine
            .start_execution(
                self.definition_id.as_str(),
                request_id.to_string().as_str(),
                request.to_workflow_input(),
            )
            .await
        {
            Ok(execution_id) => execution_id,
            Err(start_error) => {
                error!(
                    request_id = %request_id,
                    kind = start_error.kind(),
                    error = %start_error,
                    "failed to start approval workflow execution"
                );
                log_terminal(&mut lifecycle, AccessRequestState::Errored);
                return SubmissionResponse::start_failed(request_id, &start_error);
            }
        };

        info!(
            request_id = %request_id,
            execution_id = %execution_id,
            "approval workflow execution started"
        );

        let response = match self.observe(request_id, &execution_id).await {
            observation::Observation::Terminal(execution) => {
                SubmissionResponse::from_execution(request_id, &execution)
            }
            observation::Observation::DeadlineExceeded => {
                SubmissionResponse::deadline_exceeded(request_id)
            }
            observation::Observation::DescribeFailed(describe_error) => {
                SubmissionResponse::observation_failed(request_id, &describe_error)
            }
        };

        if let Some(state) = response.body.state {
            match state {
                AccessRequestState::TimedOut | AccessRequestState::Errored => {
                    log_terminal(&mut lifecycle, state);
                }
                _ => info!(
                    request_id = %request_id,
                    state = state.as_str(),
                    status_code = response.status_code,
                    "access request finished"
                ),
            }
        }

        response
    }

    /// Returns the current status of a previously submitted request.
    pub async fn describe_request(&self, request_id: RequestId) -> AppResult<AccessRequestStatus> {
        let execution = self.find_execution(request_id).await?;
        Ok(AccessRequestStatus::from_execution(request_id, &execution))
    }

    /// Stops a running request.
    ///
    /// Requests that already reached a terminal state are a `Conflict`.
    pub async fn cancel_request(&self, request_id: RequestId) -> AppResult<AccessRequestStatus> {
        let execution = self.find_execution(request_id).await?;
        if execution.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "access request '{request_id}' already finished with status '{}'",
                execution.status.as_str()
            )));
        }

        let stopped = self
            .engine
            .stop_execution(&execution.execution_id, "cancelled by requester")
            .await?;
        info!(
            request_id = %request_id,
            execution_id = %stopped.execution_id,
            status = stopped.status.as_str(),
            "access request cancelled"
        );

        Ok(AccessRequestStatus::from_execution(request_id, &stopped))
    }

    async fn find_execution(&self, request_id: RequestId) -> AppResult<WorkflowExecution> {
        self.engine
            .find_execution(self.definition_id.as_str(), request_id.to_string().as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("access request '{request_id}' does not exist")))
    }
}

fn log_terminal(lifecycle: &mut AccessRequestLifecycle, state: AccessRequestState) {
    if let Err(transition_error) = record_transition(lifecycle, state) {
        warn!(error = %transition_error, "skipped access request state change");
    }
}
