//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod approval_poller;
mod approval_workflow;
mod credential_broker;
mod notification_dispatcher;
mod orchestrator;

#[cfg(test)]
mod test_support;

pub use access_ports::{
    ApprovalStatusSource, NotificationMessage, NotificationPublisher, NotificationReceipt,
    RoleAssumptionService, WorkflowEngine, WorkflowHandler,
};
pub use approval_poller::{ApprovalDecision, ApprovalPoller, DEFAULT_APPROVAL_RETRY_DELAY};
pub use approval_workflow::{ApprovalWorkflow, ApprovalWorkflowOutput};
pub use credential_broker::{CredentialBroker, DEFAULT_PARTITION, DEFAULT_SESSION_NAME};
pub use notification_dispatcher::{
    APPROVAL_REQUEST_SUBJECT, NotificationDispatcher, approval_request_message,
};
pub use orchestrator::{
    AccessRequestOrchestrator, AccessRequestStatus, DEFAULT_EXECUTION_MAX_WAIT,
    DEFAULT_EXECUTION_POLL_INTERVAL, ObservationPolicy, SubmissionBody, SubmissionResponse,
    sanitize_error,
};
