use super::*;

const ISSUED_MESSAGE: &str = "Access request approved and credentials issued.";
const DENIED_MESSAGE: &str = "Access request was not approved.";
const INVALID_INPUT_MESSAGE: &str = "Invalid input provided.";
const START_FAILED_MESSAGE: &str = "An error occurred while starting the workflow execution.";
const EXECUTION_FAILED_MESSAGE: &str = "An error occurred while executing the workflow.";
const EXECUTION_TIMED_OUT_MESSAGE: &str = "The workflow execution timed out.";
const DEADLINE_EXCEEDED_MESSAGE: &str = "Timed out waiting for the workflow execution to finish.";
const EXECUTION_CANCELLED_MESSAGE: &str = "The workflow execution was cancelled.";
const OBSERVATION_FAILED_MESSAGE: &str =
    "An error occurred while observing the workflow execution.";

const MAX_ERROR_CHARS: usize = 512;

/// HTTP-shaped result of one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionResponse {
    /// HTTP status code to answer with.
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON response body.
    pub body: SubmissionBody,
}

/// Body of a submission response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionBody {
    /// Human-readable summary.
    pub message: String,
    /// Correlation id, absent when validation failed before one was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Terminal lifecycle state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AccessRequestState>,
    /// Approval outcome when the workflow completed.
    #[serde(rename = "approvalStatus", skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalOutcome>,
    /// Whether the request was approved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    /// Masked credentials when issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<MaskedCredentials>,
    /// Raw workflow output document.
    #[serde(rename = "step_function_output", skip_serializing_if = "Option::is_none")]
    pub workflow_output: Option<Value>,
    /// Sanitized failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionResponse {
    /// Returns the terminal classification carried by this response.
    #[must_use]
    pub fn outcome(&self) -> TerminalOutcome {
        self.body
            .state
            .and_then(|state| state.outcome())
            .unwrap_or(TerminalOutcome::Errored)
    }

    /// Response for a submission rejected before any execution started.
    #[must_use]
    pub fn invalid_input(error: &AppError) -> Self {
        Self::failure(400, INVALID_INPUT_MESSAGE, None, AccessRequestState::Errored, error_detail(error))
    }

    pub(super) fn start_failed(request_id: RequestId, error: &AppError) -> Self {
        let (status_code, message) = match error {
            AppError::Validation(_) | AppError::EngineRejected(_) => (400, INVALID_INPUT_MESSAGE),
            _ => (500, START_FAILED_MESSAGE),
        };

        Self::failure(
            status_code,
            message,
            Some(request_id),
            AccessRequestState::Errored,
            error_detail(error),
        )
    }

    pub(super) fn deadline_exceeded(request_id: RequestId) -> Self {
        Self::failure(
            500,
            DEADLINE_EXCEEDED_MESSAGE,
            Some(request_id),
            AccessRequestState::TimedOut,
            "approval workflow execution did not finish in time".to_owned(),
        )
    }

    pub(super) fn observation_failed(request_id: RequestId, error: &AppError) -> Self {
        Self::failure(
            500,
            OBSERVATION_FAILED_MESSAGE,
            Some(request_id),
            AccessRequestState::Errored,
            error_detail(error),
        )
    }

    pub(super) fn from_execution(request_id: RequestId, execution: &WorkflowExecution) -> Self {
        match execution.status {
            ExecutionStatus::Succeeded => Self::from_output(request_id, execution.output.as_ref()),
            ExecutionStatus::Failed => Self::failure(
                500,
                EXECUTION_FAILED_MESSAGE,
                Some(request_id),
                AccessRequestState::Errored,
                execution_error(execution, "approval workflow execution failed"),
            ),
            ExecutionStatus::TimedOut => Self::failure(
                500,
                EXECUTION_TIMED_OUT_MESSAGE,
                Some(request_id),
                AccessRequestState::TimedOut,
                execution_error(execution, "approval workflow execution timed out"),
            ),
            ExecutionStatus::Cancelled => Self::failure(
                500,
                EXECUTION_CANCELLED_MESSAGE,
                Some(request_id),
                AccessRequestState::Errored,
                execution_error(execution, "approval workflow execution was cancelled"),
            ),
            ExecutionStatus::Running => Self::failure(
                500,
                OBSERVATION_FAILED_MESSAGE,
                Some(request_id),
                AccessRequestState::Errored,
                "approval workflow execution is still running".to_owned(),
            ),
        }
    }

    fn from_output(request_id: RequestId, output: Option<&Value>) -> Self {
        let Some(parsed) = output.and_then(parse_output) else {
            return Self::failure(
                500,
                EXECUTION_FAILED_MESSAGE,
                Some(request_id),
                AccessRequestState::Errored,
                "approval workflow produced an unreadable output".to_owned(),
            );
        };

        let (message, state) = if parsed.approved {
            (ISSUED_MESSAGE, AccessRequestState::Issued)
        } else {
            (DENIED_MESSAGE, AccessRequestState::Denied)
        };

        Self {
            status_code: 200,
            body: SubmissionBody {
                message: message.to_owned(),
                request_id: Some(request_id.to_string()),
                state: Some(state),
                approval_status: Some(parsed.approval_status),
                approved: Some(parsed.approved),
                credentials: parsed.credentials,
                workflow_output: output.cloned(),
                error: None,
            },
        }
    }

    fn failure(
        status_code: u16,
        message: &str,
        request_id: Option<RequestId>,
        state: AccessRequestState,
        error: String,
    ) -> Self {
        Self {
            status_code,
            body: SubmissionBody {
                message: message.to_owned(),
                request_id: request_id.map(|request_id| request_id.to_string()),
                state: Some(state),
                error: Some(error),
                ..SubmissionBody::default()
            },
        }
    }
}

/// Observed status of one submitted request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessRequestStatus {
    /// Correlation id.
    pub request_id: String,
    /// Engine execution id.
    pub execution_id: String,
    /// Raw engine status.
    pub execution_status: ExecutionStatus,
    /// Terminal lifecycle state, absent while running.
    pub state: Option<AccessRequestState>,
    /// Terminal classification, absent while running.
    pub outcome: Option<TerminalOutcome>,
    /// Approval outcome once the workflow completed.
    pub approval_status: Option<ApprovalOutcome>,
    /// Masked credentials once issued.
    pub credentials: Option<MaskedCredentials>,
    /// Sanitized failure description.
    pub error: Option<String>,
    /// Execution start time.
    pub started_at: DateTime<Utc>,
    /// Execution stop time.
    pub stopped_at: Option<DateTime<Utc>>,
}

impl AccessRequestStatus {
    pub(super) fn from_execution(request_id: RequestId, execution: &WorkflowExecution) -> Self {
        let parsed = match execution.status {
            ExecutionStatus::Succeeded => execution.output.as_ref().and_then(parse_output),
            _ => None,
        };

        let state = match execution.status {
            ExecutionStatus::Running => None,
            ExecutionStatus::Succeeded => Some(
                parsed
                    .as_ref()
                    .map_or(AccessRequestState::Errored, |output| output.state),
            ),
            ExecutionStatus::TimedOut => Some(AccessRequestState::TimedOut),
            ExecutionStatus::Failed | ExecutionStatus::Cancelled => {
                Some(AccessRequestState::Errored)
            }
        };

        let (approval_status, credentials) = match parsed {
            Some(output) => (Some(output.approval_status), output.credentials),
            None => (None, None),
        };

        Self {
            request_id: request_id.to_string(),
            execution_id: execution.execution_id.to_string(),
            execution_status: execution.status,
            state,
            outcome: state.and_then(|state| state.outcome()),
            approval_status,
            credentials,
            error: execution.error.as_deref().map(sanitize_error),
            started_at: execution.started_at,
            stopped_at: execution.stopped_at,
        }
    }
}

/// Makes an error message safe to return to clients.
///
/// Control characters are dropped, whitespace runs collapse to one space and
/// the result is bounded in length.
#[must_use]
pub fn sanitize_error(message: &str) -> String {
    let cleaned = message
        .chars()
        .map(|character| if character.is_control() { ' ' } else { character })
        .collect::<String>();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return "unknown error".to_owned();
    }

    if collapsed.chars().count() <= MAX_ERROR_CHARS {
        return collapsed;
    }

    let mut truncated = collapsed.chars().take(MAX_ERROR_CHARS).collect::<String>();
    truncated.push_str("...");
    truncated
}

fn parse_output(output: &Value) -> Option<ApprovalWorkflowOutput> {
    serde_json::from_value(output.clone()).ok()
}

fn error_detail(error: &AppError) -> String {
    sanitize_error(error.to_string().as_str())
}

fn execution_error(execution: &WorkflowExecution, fallback: &str) -> String {
    sanitize_error(execution.error.as_deref().unwrap_or(fallback))
}
