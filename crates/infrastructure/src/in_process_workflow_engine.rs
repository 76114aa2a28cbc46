use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rolegate_application::{WorkflowEngine, WorkflowHandler};
use rolegate_core::{AppError, AppResult};
use rolegate_domain::{ExecutionId, ExecutionStatus, WorkflowExecution};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{info, warn};


/// How long finished executions stay describable.
pub const DEFAULT_EXECUTION_RETENTION: Duration = Duration::from_secs(3600);

const MAX_EXECUTION_NAME_CHARS: usize = 80;

struct ExecutionEntry {
    execution: WorkflowExecution,
    definition_id: String,
    finished_at: Option<Instant>,
    task: Option<AbortHandle>,
}

type ExecutionTable = Arc<RwLock<HashMap<ExecutionId, ExecutionEntry>>>;

/// Workflow engine running registered handlers on tokio tasks.
///
/// Executions live in memory only and are forgotten once they have been
/// finished for longer than the retention window.
pub struct InProcessWorkflowEngine {
    handlers: HashMap<String, Arc<dyn WorkflowHandler>>,
    executions: ExecutionTable,
    execution_timeout: Option<Duration>,
    retention: Duration,
}

impl InProcessWorkflowEngine {
    /// Creates an engine with no registered definitions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            executions: Arc::new(RwLock::new(HashMap::new())),
            execution_timeout: None,
            retention: DEFAULT_EXECUTION_RETENTION,
        }
    }

    /// Registers the handler run for executions of `definition_id`.
    #[must_use]
    pub fn with_definition(
        mut self,
        definition_id: impl Into<String>,
        handler: Arc<dyn WorkflowHandler>,
    ) -> Self {
        self.handlers.insert(definition_id.into(), handler);
        self
    }

    /// Limits each execution's run time. Overrunning executions end `TimedOut`.
    #[must_use]
    pub fn with_execution_timeout(mut self, execution_timeout: Option<Duration>) -> Self {
        self.execution_timeout = execution_timeout;
        self
    }

    /// Overrides how long finished executions are kept.
    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    fn execution_id(definition_id: &str, execution_name: &str) -> ExecutionId {
        let prefix = definition_id.replacen(":stateMachine:", ":execution:", 1);
        ExecutionId::new(format!("{prefix}:{execution_name}"))
    }
}

impl Default for InProcessWorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowEngine for InProcessWorkflowEngine {
    async fn start_execution(
        &self,
        definition_id: &str,
        execution_name: &str,
        input: Value,
    ) -> AppResult<ExecutionId> {
        validate_execution_name(execution_name)?;
        if !input.is_object() {
            return Err(AppError::EngineRejected(
                "execution input must be a JSON object".to_owned(),
            ));
        }

        let handler = self.handlers.get(definition_id).cloned().ok_or_else(|| {
            AppError::Engine(format!("workflow definition '{definition_id}' does not exist"))
        })?;
        let execution_id = Self::execution_id(definition_id, execution_name);

        let mut executions = self.executions.write().await;
        prune_finished(&mut executions, self.retention);

        if executions.contains_key(&execution_id) {
            return Err(AppError::Conflict(format!(
                "execution '{execution_name}' already exists for workflow definition '{definition_id}'"
            )));
        }

        executions.insert(
            execution_id.clone(),
            ExecutionEntry {
                execution: WorkflowExecution {
                    execution_id: execution_id.clone(),
                    execution_name: execution_name.to_owned(),
                    status: ExecutionStatus::Running,
                    output: None,
                    error: None,
                    started_at: Utc::now(),
                    stopped_at: None,
                },
                definition_id: definition_id.to_owned(),
                finished_at: None,
                task: None,
            },
        );

        let task = tokio::spawn(run_execution(
            self.executions.clone(),
            execution_id.clone(),
            handler,
            input,
            self.execution_timeout,
        ));
        if let Some(entry) = executions.get_mut(&execution_id) {
            entry.task = Some(task.abort_handle());
        }

        info!(
            execution_id = %execution_id,
            definition_id = definition_id,
            "workflow execution started"
        );

        Ok(execution_id)
    }

    async fn describe_execution(&self, execution_id: &ExecutionId) -> AppResult<WorkflowExecution> {
        self.executions
            .read()
            .await
            .get(execution_id)
            .map(|entry| entry.execution.clone())
            .ok_or_else(|| AppError::NotFound(format!("execution '{execution_id}' does not exist")))
    }

    async fn find_execution(
        &self,
        definition_id: &str,
        execution_name: &str,
    ) -> AppResult<Option<WorkflowExecution>> {
        let execution_id = Self::execution_id(definition_id, execution_name);

        Ok(self
            .executions
            .read()
            .await
            .get(&execution_id)
            .filter(|entry| entry.definition_id == definition_id)
            .map(|entry| entry.execution.clone()))
    }

    async fn stop_execution(
        &self,
        execution_id: &ExecutionId,
        cause: &str,
    ) -> AppResult<WorkflowExecution> {
        let mut executions = self.executions.write().await;
        let entry = executions
            .get_mut(execution_id)
            .ok_or_else(|| AppError::NotFound(format!("execution '{execution_id}' does not exist")))?;

        if entry.execution.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "execution '{execution_id}' already finished with status '{}'",
                entry.execution.status.as_str()
            )));
        }

        if let Some(task) = entry.task.take() {
            task.abort();
        }
        finish(entry, ExecutionStatus::Cancelled, None, Some(cause.to_owned()));

        info!(execution_id = %execution_id, cause = cause, "workflow execution stopped");

        Ok(entry.execution.clone())
    }
}

async fn run_execution(
    executions: ExecutionTable,
    execution_id: ExecutionId,
    handler: Arc<dyn WorkflowHandler>,
    input: Value,
    execution_timeout: Option<Duration>,
) {
    let result = match execution_timeout {
        Some(limit) => tokio::time::timeout(limit, handler.execute(input))
            .await
            .map_err(|_| limit),
        None => Ok(handler.execute(input).await),
    };

    let mut executions = executions.write().await;
    let Some(entry) = executions.get_mut(&execution_id) else {
        return;
    };
    if entry.execution.status.is_terminal() {
        return;
    }
    entry.task = None;

    match result {
        Ok(Ok(output)) => {
            finish(entry, ExecutionStatus::Succeeded, Some(output), None);
            info!(execution_id = %execution_id, "workflow execution succeeded");
        }
        Ok(Err(error)) => {
            warn!(execution_id = %execution_id, error = %error, "workflow execution failed");
            finish(entry, ExecutionStatus::Failed, None, Some(error.to_string()));
        }
        Err(limit) => {
            warn!(
                execution_id = %execution_id,
                timeout_seconds = limit.as_secs(),
                "workflow execution timed out"
            );
            finish(
                entry,
                ExecutionStatus::TimedOut,
                None,
                Some(format!("execution exceeded its {}s time limit", limit.as_secs())),
            );
        }
    }
}

fn finish(
    entry: &mut ExecutionEntry,
    status: ExecutionStatus,
    output: Option<Value>,
    error: Option<String>,
) {
    entry.execution.status = status;
    entry.execution.output = output;
    entry.execution.error = error;
    entry.execution.stopped_at = Some(Utc::now());
    entry.finished_at = Some(Instant::now());
}

fn prune_finished(executions: &mut HashMap<ExecutionId, ExecutionEntry>, retention: Duration) {
    let now = Instant::now();
    executions.retain(|_, entry| {
        entry
            .finished_at
            .is_none_or(|finished_at| now.saturating_duration_since(finished_at) < retention)
    });
}

fn validate_execution_name(execution_name: &str) -> AppResult<()> {
    let length = execution_name.chars().count();
    if length == 0 || length > MAX_EXECUTION_NAME_CHARS {
        return Err(AppError::EngineRejected(format!(
            "execution name must be 1 to {MAX_EXECUTION_NAME_CHARS} characters"
        )));
    }

    if !execution_name
        .chars()
        .all(|character| character.is_ascii_alphanumeric() || matches!(character, '-' | '_'))
    {
        return Err(AppError::EngineRejected(format!(
            "execution name '{execution_name}' may only contain letters, digits, '-' and '_'"
        )));
    }

    Ok(())
}
