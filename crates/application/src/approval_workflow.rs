use async_trait::async_trait;
use rolegate_core::{AppError, AppResult};
use rolegate_domain::{
    AccessRequest, AccessRequestLifecycle, AccessRequestState, ApprovalOutcome,
    DEFAULT_MAX_RETRIES, MaskedCredentials,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::access_ports::WorkflowHandler;
use crate::approval_poller::ApprovalPoller;
use crate::credential_broker::{CredentialBroker, DEFAULT_SESSION_NAME};
use crate::notification_dispatcher::NotificationDispatcher;

/// Output document of one successful approval workflow execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalWorkflowOutput {
    /// Correlation id of the request.
    pub request_id: String,
    /// Terminal lifecycle state reached inside the workflow.
    pub state: AccessRequestState,
    /// Final approval outcome.
    #[serde(rename = "approvalStatus")]
    pub approval_status: ApprovalOutcome,
    /// Convenience flag mirroring `approval_status`.
    pub approved: bool,
    /// Number of checks issued against the approval source.
    #[serde(default)]
    pub approval_checks: u32,
    /// Masked credentials, present only when issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<MaskedCredentials>,
}

/// The fixed notify, wait and issue workflow run for every access request.
#[derive(Clone)]
pub struct ApprovalWorkflow {
    dispatcher: NotificationDispatcher,
    poller: ApprovalPoller,
    broker: CredentialBroker,
    max_retries: u32,
    session_name: String,
}

impl ApprovalWorkflow {
    /// Creates the workflow with the default retry budget and session name.
    #[must_use]
    pub fn new(
        dispatcher: NotificationDispatcher,
        poller: ApprovalPoller,
        broker: CredentialBroker,
    ) -> Self {
        Self {
            dispatcher,
            poller,
            broker,
            max_retries: DEFAULT_MAX_RETRIES,
            session_name: DEFAULT_SESSION_NAME.to_owned(),
        }
    }

    /// Overrides the number of approval retries after the first check.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Overrides the session name used when assuming the role.
    #[must_use]
    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = session_name.into();
        self
    }

    /// Runs the workflow for one request.
    ///
    /// Notification failures are logged and ignored. A denial is a successful
    /// run; only credential issuance failures end in `Err`.
    pub async fn run(&self, request: &AccessRequest) -> AppResult<ApprovalWorkflowOutput> {
        let mut lifecycle = AccessRequestLifecycle::new(request.request_id());

        record_transition(&mut lifecycle, AccessRequestState::Notifying)?;
        if let Err(error) = self.dispatcher.notify(request).await {
            warn!(
                request_id = %request.request_id(),
                error = %error,
                "approval notification failed, continuing to wait for approval"
            );
        }

        record_transition(&mut lifecycle, AccessRequestState::AwaitingApproval)?;
        let decision = self.poller.await_decision(request, self.max_retries).await;

        if decision.outcome != ApprovalOutcome::Approved {
            record_transition(&mut lifecycle, AccessRequestState::Denied)?;
            return Ok(ApprovalWorkflowOutput {
                request_id: request.request_id().to_string(),
                state: lifecycle.state(),
                approval_status: ApprovalOutcome::NotApproved,
                approved: false,
                approval_checks: decision.checks,
                credentials: None,
            });
        }

        record_transition(&mut lifecycle, AccessRequestState::Approving)?;
        let issued = match self
            .broker
            .issue(
                request.account_id(),
                request.role_name(),
                Some(self.session_name.as_str()),
            )
            .await
        {
            Ok(issued) => issued,
            Err(error) => {
                record_transition(&mut lifecycle, AccessRequestState::Errored)?;
                return Err(error);
            }
        };

        record_transition(&mut lifecycle, AccessRequestState::Issued)?;
        Ok(ApprovalWorkflowOutput {
            request_id: request.request_id().to_string(),
            state: lifecycle.state(),
            approval_status: ApprovalOutcome::Approved,
            approved: true,
            approval_checks: decision.checks,
            credentials: Some(issued.masked),
        })
    }
}

#[async_trait]
impl WorkflowHandler for ApprovalWorkflow {
    async fn execute(&self, input: Value) -> AppResult<Value> {
        let request = AccessRequest::from_workflow_input(input)?;
        let output = self.run(&request).await?;

        serde_json::to_value(&output).map_err(|error| {
            AppError::Internal(format!("failed to serialize approval workflow output: {error}"))
        })
    }
}

/// Advances `lifecycle` and logs the move.
pub(crate) fn record_transition(
    lifecycle: &mut AccessRequestLifecycle,
    next: AccessRequestState,
) -> AppResult<()> {
    let previous = lifecycle.advance(next)?;
    info!(
        request_id = %lifecycle.request_id(),
        from = previous.as_str(),
        to = next.as_str(),
        "access request state changed"
    );
    Ok(())
}
