//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_notification_publisher;
mod http_approval_status_source;
mod http_role_assumption_service;
mod in_process_workflow_engine;
mod webhook_notification_publisher;

pub use console_notification_publisher::ConsoleNotificationPublisher;
pub use http_approval_status_source::HttpApprovalStatusSource;
pub use http_role_assumption_service::HttpRoleAssumptionService;
pub use in_process_workflow_engine::{DEFAULT_EXECUTION_RETENTION, InProcessWorkflowEngine};
pub use webhook_notification_publisher::WebhookNotificationPublisher;
