use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use rolegate_core::{AppError, AppResult, NonEmptyString, RequestId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder used when the requester omits their name or email.
pub const UNKNOWN_REQUESTER: &str = "Unknown";

/// Raw submission fields before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequestInput {
    /// Optional display name of the person asking for access.
    pub requester_name: Option<String>,
    /// Optional contact email of the person asking for access.
    pub requester_email: Option<String>,
    /// Target account identifier.
    pub account_id: Option<String>,
    /// Target role name inside the account.
    pub role_name: Option<String>,
}

/// One validated access request.
///
/// Immutable once created. The request id and timestamp are assigned at
/// construction so that every submission gets a fresh correlation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    request_id: RequestId,
    requester_name: String,
    requester_email: String,
    account_id: NonEmptyString,
    role_name: NonEmptyString,
    request_time: DateTime<Utc>,
}

/// Wire shape handed to the workflow engine as execution input.
#[derive(Debug, Serialize, Deserialize)]
struct WorkflowInputPayload {
    request_id: String,
    requester_name: String,
    requester_email: String,
    account_id: String,
    role_name: String,
    request_time: DateTime<Utc>,
}

impl AccessRequest {
    /// Validates submission fields and assigns a new request id and timestamp.
    pub fn new(input: AccessRequestInput) -> AppResult<Self> {
        let account_id = required_field("account_id", input.account_id)?;
        let role_name = required_field("role_name", input.role_name)?;

        Ok(Self {
            request_id: RequestId::new(),
            requester_name: optional_field(input.requester_name),
            requester_email: optional_field(input.requester_email),
            account_id,
            role_name,
            request_time: Utc::now(),
        })
    }

    /// Rebuilds a request from the workflow engine input document.
    pub fn from_workflow_input(input: Value) -> AppResult<Self> {
        let payload: WorkflowInputPayload = serde_json::from_value(input).map_err(|error| {
            AppError::Validation(format!("invalid access request workflow input: {error}"))
        })?;

        Ok(Self {
            request_id: payload.request_id.parse()?,
            requester_name: optional_field(Some(payload.requester_name)),
            requester_email: optional_field(Some(payload.requester_email)),
            account_id: required_field("account_id", Some(payload.account_id))?,
            role_name: required_field("role_name", Some(payload.role_name))?,
            request_time: payload.request_time,
        })
    }

    /// Serializes the request as the workflow engine input document.
    #[must_use]
    pub fn to_workflow_input(&self) -> Value {
        serde_json::json!({
            "request_id": self.request_id.to_string(),
            "requester_name": self.requester_name,
            "requester_email": self.requester_email,
            "account_id": self.account_id.as_str(),
            "role_name": self.role_name.as_str(),
            "request_time": self.request_time.to_rfc3339(),
        })
    }

    /// Returns the request identifier.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the requester display name.
    #[must_use]
    pub fn requester_name(&self) -> &str {
        self.requester_name.as_str()
    }

    /// Returns the requester email.
    #[must_use]
    pub fn requester_email(&self) -> &str {
        self.requester_email.as_str()
    }

    /// Returns the target account identifier.
    #[must_use]
    pub fn account_id(&self) -> &NonEmptyString {
        &self.account_id
    }

    /// Returns the target role name.
    #[must_use]
    pub fn role_name(&self) -> &NonEmptyString {
        &self.role_name
    }
}

/// Role identifier addressed as `arn:{partition}:iam::{account}:role/{role}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleArn(String);

impl RoleArn {
    /// Derives the role identifier for one account and role name.
    #[must_use]
    pub fn new(partition: &str, account_id: &NonEmptyString, role_name: &NonEmptyString) -> Self {
        Self(format!(
            "arn:{partition}:iam::{}:role/{}",
            account_id.as_str(),
            role_name.as_str()
        ))
    }

    /// Returns the rendered identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RoleArn {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

fn required_field(name: &str, value: Option<String>) -> AppResult<NonEmptyString> {
    let value = value.map(|value| value.trim().to_owned()).unwrap_or_default();
    NonEmptyString::new(value).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn optional_field(value: Option<String>) -> String {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| UNKNOWN_REQUESTER.to_owned())
}
