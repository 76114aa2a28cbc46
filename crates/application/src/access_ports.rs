mod approval;
mod engine;
mod notification;
mod role_assumption;

pub use approval::ApprovalStatusSource;
pub use engine::{WorkflowEngine, WorkflowHandler};
pub use notification::{NotificationMessage, NotificationPublisher, NotificationReceipt};
pub use role_assumption::RoleAssumptionService;
