use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rolegate_application::RoleAssumptionService;
use rolegate_core::{AppError, AppResult};
use rolegate_domain::{Credentials, RoleArn};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

const MAX_UPSTREAM_MESSAGE_CHARS: usize = 256;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialsPayload {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    expiration: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AssumeRoleBody {
    Wrapped {
        #[serde(rename = "Credentials")]
        credentials: CredentialsPayload,
    },
    Flat(CredentialsPayload),
}

/// HTTP client for a role assumption endpoint.
///
/// Posts `{role_arn, role_session_name}` and expects the credential fields
/// either at the top level or under `Credentials`.
pub struct HttpRoleAssumptionService {
    http_client: reqwest::Client,
    endpoint: Url,
}

impl HttpRoleAssumptionService {
    /// Creates a new role assumption client.
    #[must_use]
    pub fn new(http_client: reqwest::Client, endpoint: Url) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }
}

#[async_trait]
impl RoleAssumptionService for HttpRoleAssumptionService {
    async fn assume_role(&self, role_arn: &RoleArn, session_name: &str) -> AppResult<Credentials> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&serde_json::json!({
                "role_arn": role_arn.as_str(),
                "role_session_name": session_name,
            }))
            .send()
            .await
            .map_err(|error| {
                AppError::Assumption(format!(
                    "role assumption transport error for '{role_arn}': {error}"
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Assumption(format!(
                "role assumption for '{role_arn}' failed with status {status}: {}",
                upstream_message(body.as_str())
            )));
        }

        // The body carries live secrets; parse errors must not echo it.
        let body = response.json::<AssumeRoleBody>().await.map_err(|_| {
            AppError::Assumption(format!(
                "role assumption for '{role_arn}' returned an unreadable credentials document"
            ))
        })?;
        let payload = match body {
            AssumeRoleBody::Wrapped { credentials } | AssumeRoleBody::Flat(credentials) => {
                credentials
            }
        };

        debug!(
            role_arn = %role_arn,
            access_key_id = %payload.access_key_id,
            "role assumption endpoint returned credentials"
        );

        Ok(Credentials::new(
            payload.access_key_id,
            payload.secret_access_key,
            payload.session_token,
            payload.expiration,
        ))
    }
}

fn upstream_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("Message"))
                .or_else(|| value.pointer("/Error/Message"))
        })
        .and_then(Value::as_str)
        .unwrap_or(body)
        .trim();

    if message.is_empty() {
        return "<no message>".to_owned();
    }

    message.chars().take(MAX_UPSTREAM_MESSAGE_CHARS).collect()
}
