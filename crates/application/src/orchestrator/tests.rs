use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::*;
use crate::access_ports::WorkflowHandler;
use crate::approval_poller::ApprovalPoller;
use crate::approval_workflow::ApprovalWorkflow;
use crate::credential_broker::CredentialBroker;
use crate::notification_dispatcher::NotificationDispatcher;
use crate::test_support::{
    FakeRoleAssumption, RecordingPublisher, SECRET_ACCESS_KEY, SESSION_TOKEN,
    ScriptedApprovalSource,
};

const DEFINITION_ID: &str = "arn:aws:states:eu-west-1:111122223333:stateMachine:approvals";

/// Engine that runs its handler inline on start, or keeps executions running
/// and walks them through scripted statuses on each describe.
#[derive(Default)]
struct FakeWorkflowEngine {
    handler: Option<Arc<dyn WorkflowHandler>>,
    start_error: Mutex<Option<AppError>>,
    describe_error: Mutex<Option<AppError>>,
    scripted_statuses: Mutex<VecDeque<ExecutionStatus>>,
    executions: Mutex<HashMap<String, WorkflowExecution>>,
    starts: Mutex<u32>,
    describes: Mutex<u32>,
    stops: Mutex<Vec<String>>,
}

impl FakeWorkflowEngine {
    fn running() -> Self {
        Self::default()
    }

    fn with_handler(handler: Arc<dyn WorkflowHandler>) -> Self {
        Self {
            handler: Some(handler),
            ..Self::default()
        }
    }

    fn scripted(statuses: Vec<ExecutionStatus>) -> Self {
        Self {
            scripted_statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl WorkflowEngine for FakeWorkflowEngine {
    async fn start_execution(
        &self,
        definition_id: &str,
        execution_name: &str,
        input: Value,
    ) -> AppResult<ExecutionId> {
        assert_eq!(definition_id, DEFINITION_ID);
        if let Some(error) = self.start_error.lock().await.take() {
            return Err(error);
        }
        *self.starts.lock().await += 1;

        let (status, output, error) = match &self.handler {
            Some(handler) => match handler.execute(input).await {
                Ok(output) => (ExecutionStatus::Succeeded, Some(output), None),
                Err(error) => (ExecutionStatus::Failed, None, Some(error.to_string())),
            },
            None => (ExecutionStatus::Running, None, None),
        };

        let execution_id = ExecutionId::new(format!("exec-{execution_name}"));
        self.executions.lock().await.insert(
            execution_name.to_owned(),
            WorkflowExecution {
                execution_id: execution_id.clone(),
                execution_name: execution_name.to_owned(),
                status,
                output,
                error,
                started_at: Utc::now(),
                stopped_at: status.is_terminal().then(Utc::now),
            },
        );

        Ok(execution_id)
    }

    async fn describe_execution(&self, execution_id: &ExecutionId) -> AppResult<WorkflowExecution> {
        *self.describes.lock().await += 1;
        if let Some(error) = self.describe_error.lock().await.take() {
            return Err(error);
        }

        let mut executions = self.executions.lock().await;
        let execution = executions
            .values_mut()
            .find(|execution| &execution.execution_id == execution_id)
            .ok_or_else(|| AppError::NotFound(execution_id.to_string()))?;

        if let Some(status) = self.scripted_statuses.lock().await.pop_front() {
            execution.status = status;
            if status.is_terminal() {
                execution.error = Some(format!("States.{}", status.as_str()));
                execution.stopped_at = Some(Utc::now());
            }
        }

        Ok(execution.clone())
    }

    async fn find_execution(
        &self,
        _definition_id: &str,
        execution_name: &str,
    ) -> AppResult<Option<WorkflowExecution>> {
        Ok(self.executions.lock().await.get(execution_name).cloned())
    }

    async fn stop_execution(
        &self,
        execution_id: &ExecutionId,
        cause: &str,
    ) -> AppResult<WorkflowExecution> {
        self.stops.lock().await.push(execution_id.to_string());

        let mut executions = self.executions.lock().await;
        let execution = executions
            .values_mut()
            .find(|execution| &execution.execution_id == execution_id)
            .ok_or_else(|| AppError::NotFound(execution_id.to_string()))?;
        execution.status = ExecutionStatus::Cancelled;
        execution.error = Some(cause.to_owned());
        execution.stopped_at = Some(Utc::now());

        Ok(execution.clone())
    }
}

struct Harness {
    engine: Arc<FakeWorkflowEngine>,
    publisher: Arc<RecordingPublisher>,
    source: Arc<ScriptedApprovalSource>,
    orchestrator: AccessRequestOrchestrator,
}

fn workflow_harness(
    source: Arc<ScriptedApprovalSource>,
    backend: FakeRoleAssumption,
    max_retries: u32,
) -> Harness {
    let publisher = Arc::new(RecordingPublisher::default());
    let workflow = ApprovalWorkflow::new(
        NotificationDispatcher::new(publisher.clone(), "approvals"),
        ApprovalPoller::new(source.clone()),
        CredentialBroker::new(Arc::new(backend), "aws"),
    )
    .with_max_retries(max_retries);
    let engine = Arc::new(FakeWorkflowEngine::with_handler(Arc::new(workflow)));

    Harness {
        orchestrator: AccessRequestOrchestrator::new(engine.clone(), DEFINITION_ID),
        engine,
        publisher,
        source,
    }
}

fn engine_harness(engine: FakeWorkflowEngine) -> (Arc<FakeWorkflowEngine>, AccessRequestOrchestrator) {
    let engine = Arc::new(engine);
    let orchestrator = AccessRequestOrchestrator::new(engine.clone(), DEFINITION_ID)
        .with_observation_policy(ObservationPolicy {
            poll_interval: Duration::from_secs(1),
            max_wait: Some(Duration::from_secs(5)),
        });
    (engine, orchestrator)
}

fn valid_input() -> AccessRequestInput {
    AccessRequestInput {
        requester_name: Some("Ada".to_owned()),
        requester_email: Some("ada@example.com".to_owned()),
        account_id: Some("123".to_owned()),
        role_name: Some("Admin".to_owned()),
    }
}

fn rendered(response: &SubmissionResponse) -> String {
    serde_json::to_string(response).unwrap_or_default()
}

#[tokio::test(start_paused = true)]
async fn approved_request_returns_masked_credentials() {
    let harness = workflow_harness(
        ScriptedApprovalSource::always(true),
        FakeRoleAssumption::default(),
        5,
    );

    let response = harness
        .orchestrator
        .submit(AccessRequestInput {
            requester_name: None,
            requester_email: None,
            ..valid_input()
        })
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.outcome(), TerminalOutcome::Issued);
    assert_eq!(response.body.approved, Some(true));
    assert_eq!(response.body.approval_status, Some(ApprovalOutcome::Approved));
    assert!(response.body.request_id.is_some());
    assert!(response.body.workflow_output.is_some());

    let credentials = response.body.credentials.clone().unwrap_or_else(|| unreachable!());
    assert_eq!(credentials.access_key_id, "ASIAEXAMPLE");
    assert_eq!(credentials.secret_access_key, "****");
    assert_eq!(credentials.expiration, "2026-10-16T13:00:00Z");

    let json = rendered(&response);
    assert!(json.contains("\"statusCode\":200"));
    assert!(!json.contains(SECRET_ACCESS_KEY));
    assert!(!json.contains(SESSION_TOKEN));

    let messages = harness.publisher.messages.lock().await;
    assert!(messages[0].body.contains("Unknown"));
}

#[tokio::test(start_paused = true)]
async fn pending_approval_is_denied_after_retry_budget() {
    let harness = workflow_harness(
        ScriptedApprovalSource::always(false),
        FakeRoleAssumption::default(),
        2,
    );

    let response = harness.orchestrator.submit(valid_input()).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.outcome(), TerminalOutcome::Denied);
    assert_eq!(harness.source.checks().await, 3);
    assert_eq!(response.body.approved, Some(false));
    assert!(response.body.credentials.is_none());
    assert!(rendered(&response).contains("\"approvalStatus\":\"not_approved\""));
}

#[tokio::test]
async fn missing_account_is_rejected_before_anything_starts() {
    let harness = workflow_harness(
        ScriptedApprovalSource::always(true),
        FakeRoleAssumption::default(),
        5,
    );

    let response = harness
        .orchestrator
        .submit(AccessRequestInput {
            account_id: None,
            ..valid_input()
        })
        .await;

    assert_eq!(response.status_code, 400);
    assert_eq!(response.body.message, "Invalid input provided.");
    assert!(response.body.request_id.is_none());
    assert_eq!(*harness.engine.starts.lock().await, 0);
    assert!(harness.publisher.messages.lock().await.is_empty());
    assert_eq!(harness.source.checks().await, 0);
}

#[tokio::test(start_paused = true)]
async fn role_assumption_failure_is_sanitized_server_error() {
    let harness = workflow_harness(
        ScriptedApprovalSource::always(true),
        FakeRoleAssumption {
            fail: true,
            ..FakeRoleAssumption::default()
        },
        5,
    );

    let response = harness.orchestrator.submit(valid_input()).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(response.outcome(), TerminalOutcome::Errored);
    assert!(response.body.credentials.is_none());
    assert!(
        response
            .body
            .error
            .as_deref()
            .is_some_and(|error| error.contains("AccessDenied"))
    );

    let json = rendered(&response);
    assert!(!json.contains(SECRET_ACCESS_KEY));
    assert!(!json.contains(SESSION_TOKEN));
}

#[tokio::test(start_paused = true)]
async fn cancelled_execution_has_its_own_error_body() {
    let (_, orchestrator) = engine_harness(FakeWorkflowEngine::scripted(vec![
        ExecutionStatus::Running,
        ExecutionStatus::Cancelled,
    ]));

    let response = orchestrator.submit(valid_input()).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(response.body.message, "The workflow execution was cancelled.");
    assert_eq!(response.body.state, Some(AccessRequestState::Errored));
}

#[tokio::test(start_paused = true)]
async fn engine_timeout_maps_to_timed_out_state() {
    let (_, orchestrator) = engine_harness(FakeWorkflowEngine::scripted(vec![
        ExecutionStatus::TimedOut,
    ]));

    let response = orchestrator.submit(valid_input()).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(response.body.message, "The workflow execution timed out.");
    assert_eq!(response.body.state, Some(AccessRequestState::TimedOut));
    assert_eq!(response.outcome(), TerminalOutcome::Errored);
}

#[tokio::test(start_paused = true)]
async fn observation_deadline_stops_execution() {
    let (engine, orchestrator) = engine_harness(FakeWorkflowEngine::running());
    let started = tokio::time::Instant::now();

    let response = orchestrator.submit(valid_input()).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(
        response.body.message,
        "Timed out waiting for the workflow execution to finish."
    );
    assert_eq!(response.body.state, Some(AccessRequestState::TimedOut));
    assert_eq!(engine.stops.lock().await.len(), 1);
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(started.elapsed() < Duration::from_secs(6));
    assert!(*engine.describes.lock().await >= 5);
}

#[tokio::test]
async fn describe_failure_is_server_error() {
    let engine = FakeWorkflowEngine::running();
    *engine.describe_error.lock().await = Some(AppError::Engine("throttled".to_owned()));
    let (_, orchestrator) = engine_harness(engine);

    let response = orchestrator.submit(valid_input()).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(
        response.body.message,
        "An error occurred while observing the workflow execution."
    );
    assert!(response.body.request_id.is_some());
}

#[tokio::test]
async fn malformed_start_is_client_error_and_other_faults_are_server_errors() {
    let engine = FakeWorkflowEngine::running();
    *engine.start_error.lock().await =
        Some(AppError::EngineRejected("invalid execution name".to_owned()));
    let (_, orchestrator) = engine_harness(engine);

    let rejected = orchestrator.submit(valid_input()).await;
    assert_eq!(rejected.status_code, 400);
    assert_eq!(rejected.body.message, "Invalid input provided.");

    let engine = FakeWorkflowEngine::running();
    *engine.start_error.lock().await = Some(AppError::Engine("service unavailable".to_owned()));
    let (_, orchestrator) = engine_harness(engine);

    let faulted = orchestrator.submit(valid_input()).await;
    assert_eq!(faulted.status_code, 500);
    assert_eq!(
        faulted.body.message,
        "An error occurred while starting the workflow execution."
    );
}

#[tokio::test(start_paused = true)]
async fn describe_request_reports_terminal_state_of_finished_request() {
    let harness = workflow_harness(
        ScriptedApprovalSource::always(true),
        FakeRoleAssumption::default(),
        5,
    );
    let response = harness.orchestrator.submit(valid_input()).await;
    let request_id: RequestId = response
        .body
        .request_id
        .as_deref()
        .unwrap_or_default()
        .parse()
        .unwrap_or_else(|_| unreachable!());

    let status = harness
        .orchestrator
        .describe_request(request_id)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(status.execution_status, ExecutionStatus::Succeeded);
    assert_eq!(status.state, Some(AccessRequestState::Issued));
    assert_eq!(status.outcome, Some(TerminalOutcome::Issued));
    assert_eq!(status.approval_status, Some(ApprovalOutcome::Approved));

    let cancel = harness.orchestrator.cancel_request(request_id).await;
    assert!(matches!(cancel, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn cancel_request_stops_running_execution() {
    let (engine, orchestrator) = engine_harness(FakeWorkflowEngine::running());
    let request_id = RequestId::new();
    let started = engine
        .start_execution(DEFINITION_ID, request_id.to_string().as_str(), serde_json::json!({}))
        .await;
    assert!(started.is_ok());

    let running = orchestrator
        .describe_request(request_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(running.state, None);

    let cancelled = orchestrator
        .cancel_request(request_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(cancelled.execution_status, ExecutionStatus::Cancelled);
    assert_eq!(cancelled.state, Some(AccessRequestState::Errored));
    assert_eq!(cancelled.error.as_deref(), Some("cancelled by requester"));
}

#[tokio::test]
async fn unknown_request_is_not_found() {
    let (_, orchestrator) = engine_harness(FakeWorkflowEngine::running());

    let result = orchestrator.describe_request(RequestId::new()).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[test]
fn sanitize_error_strips_control_characters_and_bounds_length() {
    assert_eq!(
        sanitize_error("access\ndenied\t\u{7}  for\r\nrole"),
        "access denied for role"
    );
    assert_eq!(sanitize_error("\n\t"), "unknown error");

    let long = "x".repeat(2_000);
    let sanitized = sanitize_error(long.as_str());
    assert_eq!(sanitized.chars().count(), 515);
    assert!(sanitized.ends_with("..."));
}
