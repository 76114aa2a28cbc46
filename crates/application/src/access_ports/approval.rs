use async_trait::async_trait;
use rolegate_core::AppResult;
use rolegate_domain::AccessRequest;

/// Port for the external source that records approver decisions.
#[async_trait]
pub trait ApprovalStatusSource: Send + Sync {
    /// Performs one check and returns whether the request has been approved.
    ///
    /// Errors are transient from the caller's perspective and never mean approval.
    async fn check_approval(&self, request: &AccessRequest) -> AppResult<bool>;
}
