use async_trait::async_trait;
use rolegate_application::ApprovalStatusSource;
use rolegate_core::{AppError, AppResult};
use rolegate_domain::AccessRequest;
use serde::Deserialize;
use tracing::debug;
use url::Url;

#[derive(Debug, Deserialize)]
struct ApprovalStatusBody {
    #[serde(default)]
    approved: bool,
}

/// HTTP-based implementation of the approval status source.
///
/// Issues `GET {endpoint}?request_id={id}` and reads `{"approved": bool}`.
pub struct HttpApprovalStatusSource {
    http_client: reqwest::Client,
    endpoint: Url,
}

impl HttpApprovalStatusSource {
    /// Creates a new approval status source.
    #[must_use]
    pub fn new(http_client: reqwest::Client, endpoint: Url) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }
}

#[async_trait]
impl ApprovalStatusSource for HttpApprovalStatusSource {
    async fn check_approval(&self, request: &AccessRequest) -> AppResult<bool> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("request_id", request.request_id().to_string().as_str());

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("approval check transport error: {error}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(AppError::Internal(format!(
                "approval check returned status {status}"
            )));
        }

        let body = response.json::<ApprovalStatusBody>().await.map_err(|error| {
            AppError::Internal(format!("approval check returned malformed body: {error}"))
        })?;

        debug!(
            request_id = %request.request_id(),
            approved = body.approved,
            "approval status checked"
        );

        Ok(body.approved)
    }
}
