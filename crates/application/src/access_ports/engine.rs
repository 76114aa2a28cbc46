use async_trait::async_trait;
use rolegate_core::AppResult;
use rolegate_domain::{ExecutionId, WorkflowExecution};
use serde_json::Value;

/// Port for the durable execution engine that drives approval workflows.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// Starts one named execution of a workflow definition.
    ///
    /// Malformed names or inputs fail with `AppError::EngineRejected`.
    async fn start_execution(
        &self,
        definition_id: &str,
        execution_name: &str,
        input: Value,
    ) -> AppResult<ExecutionId>;

    /// Returns the current snapshot of one execution.
    async fn describe_execution(&self, execution_id: &ExecutionId) -> AppResult<WorkflowExecution>;

    /// Looks up an execution by its definition and caller-chosen name.
    async fn find_execution(
        &self,
        definition_id: &str,
        execution_name: &str,
    ) -> AppResult<Option<WorkflowExecution>>;

    /// Stops a running execution, leaving it cancelled.
    async fn stop_execution(
        &self,
        execution_id: &ExecutionId,
        cause: &str,
    ) -> AppResult<WorkflowExecution>;
}

/// Body of one workflow definition, run by an engine per execution.
#[async_trait]
pub trait WorkflowHandler: Send + Sync {
    /// Runs the workflow to completion and returns its output document.
    async fn execute(&self, input: Value) -> AppResult<Value>;
}
