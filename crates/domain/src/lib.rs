//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access_request;
mod approval;
mod credentials;
mod execution;
mod request_state;

pub use access_request::{AccessRequest, AccessRequestInput, RoleArn, UNKNOWN_REQUESTER};
pub use approval::{ApprovalOutcome, DEFAULT_MAX_RETRIES, PollStep, RetryState};
pub use credentials::{Credentials, IssuedCredentials, MaskedCredentials, REDACTION_MARKER};
pub use execution::{ExecutionId, ExecutionStatus, WorkflowExecution};
pub use request_state::{AccessRequestLifecycle, AccessRequestState, TerminalOutcome};
