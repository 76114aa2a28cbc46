use std::sync::Arc;

use rolegate_core::{AppError, AppResult, NonEmptyString};
use rolegate_domain::{IssuedCredentials, RoleArn};
use tracing::{error, info};

use crate::access_ports::RoleAssumptionService;

/// Session name used when the caller does not pick one.
pub const DEFAULT_SESSION_NAME: &str = "AssumeRoleSession";

/// Partition used when none is configured.
pub const DEFAULT_PARTITION: &str = "aws";

/// Exchanges an approved request for temporary credentials.
#[derive(Clone)]
pub struct CredentialBroker {
    role_assumption: Arc<dyn RoleAssumptionService>,
    partition: String,
}

impl CredentialBroker {
    /// Creates a broker addressing roles in `partition`.
    #[must_use]
    pub fn new(role_assumption: Arc<dyn RoleAssumptionService>, partition: impl Into<String>) -> Self {
        Self {
            role_assumption,
            partition: partition.into(),
        }
    }

    /// Assumes `role_name` in `account_id` and returns both credential views.
    ///
    /// Backend failures are wrapped as `AppError::Assumption` and never retried here.
    pub async fn issue(
        &self,
        account_id: &NonEmptyString,
        role_name: &NonEmptyString,
        session_name: Option<&str>,
    ) -> AppResult<IssuedCredentials> {
        let role_arn = RoleArn::new(self.partition.as_str(), account_id, role_name);
        let session_name = session_name.unwrap_or(DEFAULT_SESSION_NAME);

        let credentials = self
            .role_assumption
            .assume_role(&role_arn, session_name)
            .await
            .map_err(|failure| {
                error!(role_arn = %role_arn, error = %failure, "failed to assume role");
                match failure {
                    AppError::Assumption(message) => AppError::Assumption(message),
                    other => AppError::Assumption(format!("failed to assume role '{role_arn}': {other}")),
                }
            })?;

        let issued = IssuedCredentials::from(credentials);
        info!(
            role_arn = %role_arn,
            access_key_id = %issued.masked.access_key_id,
            expiration = %issued.masked.expiration,
            "assumed role"
        );

        Ok(issued)
    }
}
