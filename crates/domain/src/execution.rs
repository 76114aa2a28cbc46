use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use rolegate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Engine-assigned identifier of one workflow execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Wraps an engine-assigned identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ExecutionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Lifecycle status reported by the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Execution is still in progress.
    Running,
    /// Execution completed and produced output.
    Succeeded,
    /// Execution body returned an error.
    Failed,
    /// Engine stopped the execution after its time limit.
    TimedOut,
    /// Execution was stopped externally.
    Cancelled,
}

impl ExecutionStatus {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses wire value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "RUNNING" => Ok(Self::Running),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "FAILED" => Ok(Self::Failed),
            "TIMED_OUT" => Ok(Self::TimedOut),
            "CANCELLED" | "ABORTED" => Ok(Self::Cancelled),
            _ => Err(AppError::Validation(format!(
                "unknown execution status '{value}'"
            ))),
        }
    }

    /// Returns whether the execution can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Snapshot of one workflow execution as seen by an observer.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowExecution {
    /// Engine-assigned identifier.
    pub execution_id: ExecutionId,
    /// Caller-chosen execution name.
    pub execution_name: String,
    /// Current status.
    pub status: ExecutionStatus,
    /// Output document once succeeded.
    pub output: Option<Value>,
    /// Failure or stop cause once terminal without output.
    pub error: Option<String>,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// Stop timestamp once terminal.
    pub stopped_at: Option<DateTime<Utc>>,
}
