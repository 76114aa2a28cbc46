use rolegate_application::{AccessRequestStatus, SubmissionBody};
use rolegate_domain::{AccessRequestInput, MaskedCredentials};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for access request submission.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/submit-access-request-request.ts"
)]
pub struct SubmitAccessRequestRequest {
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
    pub account_id: Option<String>,
    pub role_name: Option<String>,
}

/// Credentials with secret fields redacted.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "PascalCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/masked-credentials-response.ts"
)]
pub struct MaskedCredentialsResponse {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: String,
}

/// Outgoing payload for access request submission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-request-submission-response.ts"
)]
pub struct AccessRequestSubmissionResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "approvalStatus", skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<MaskedCredentialsResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "Record<string, unknown> | null")]
    pub step_function_output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outgoing payload for access request status lookups.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-request-status-response.ts"
)]
pub struct AccessRequestStatusResponse {
    pub request_id: String,
    pub execution_id: String,
    pub execution_status: String,
    pub state: Option<String>,
    pub outcome: Option<String>,
    pub approval_status: Option<String>,
    pub credentials: Option<MaskedCredentialsResponse>,
    pub error: Option<String>,
    pub started_at: String,
    pub stopped_at: Option<String>,
}

impl From<SubmitAccessRequestRequest> for AccessRequestInput {
    fn from(value: SubmitAccessRequestRequest) -> Self {
        Self {
            requester_name: value.requester_name,
            requester_email: value.requester_email,
            account_id: value.account_id,
            role_name: value.role_name,
        }
    }
}

impl From<MaskedCredentials> for MaskedCredentialsResponse {
    fn from(value: MaskedCredentials) -> Self {
        Self {
            access_key_id: value.access_key_id,
            secret_access_key: value.secret_access_key,
            session_token: value.session_token,
            expiration: value.expiration,
        }
    }
}

impl From<SubmissionBody> for AccessRequestSubmissionResponse {
    fn from(value: SubmissionBody) -> Self {
        Self {
            message: value.message,
            request_id: value.request_id,
            state: value.state.map(|state| state.as_str().to_owned()),
            approval_status: value
                .approval_status
                .map(|approval_status| approval_status.as_str().to_owned()),
            approved: value.approved,
            credentials: value.credentials.map(MaskedCredentialsResponse::from),
            step_function_output: value.workflow_output,
            error: value.error,
        }
    }
}

impl From<AccessRequestStatus> for AccessRequestStatusResponse {
    fn from(value: AccessRequestStatus) -> Self {
        Self {
            request_id: value.request_id,
            execution_id: value.execution_id,
            execution_status: value.execution_status.as_str().to_owned(),
            state: value.state.map(|state| state.as_str().to_owned()),
            outcome: value.outcome.map(|outcome| outcome.as_str().to_owned()),
            approval_status: value
                .approval_status
                .map(|approval_status| approval_status.as_str().to_owned()),
            credentials: value.credentials.map(MaskedCredentialsResponse::from),
            error: value.error,
            started_at: value.started_at.to_rfc3339(),
            stopped_at: value.stopped_at.map(|stopped_at| stopped_at.to_rfc3339()),
        }
    }
}
