use async_trait::async_trait;
use rolegate_core::AppResult;
use rolegate_domain::{Credentials, RoleArn};

/// Port for the identity backend that vends temporary credentials.
#[async_trait]
pub trait RoleAssumptionService: Send + Sync {
    /// Assumes `role_arn` and returns the full temporary credentials.
    async fn assume_role(&self, role_arn: &RoleArn, session_name: &str) -> AppResult<Credentials>;
}
