use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use rolegate_application::SubmissionResponse;
use rolegate_core::{AppError, RequestId};
use tracing::warn;

use crate::dto::{
    AccessRequestStatusResponse, AccessRequestSubmissionResponse, SubmitAccessRequestRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn submit_access_request_handler(
    State(state): State<AppState>,
    payload: Result<Json<SubmitAccessRequestRequest>, JsonRejection>,
) -> (StatusCode, Json<AccessRequestSubmissionResponse>) {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected malformed access request payload");
            return submission_reply(SubmissionResponse::invalid_input(&AppError::Validation(
                rejection.body_text(),
            )));
        }
    };

    submission_reply(state.orchestrator.submit(payload.into()).await)
}

pub async fn get_access_request_handler(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> ApiResult<Json<AccessRequestStatusResponse>> {
    let request_id = request_id.parse::<RequestId>()?;
    let status = state.orchestrator.describe_request(request_id).await?;

    Ok(Json(AccessRequestStatusResponse::from(status)))
}

pub async fn cancel_access_request_handler(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> ApiResult<Json<AccessRequestStatusResponse>> {
    let request_id = request_id.parse::<RequestId>()?;
    let status = state.orchestrator.cancel_request(request_id).await?;

    Ok(Json(AccessRequestStatusResponse::from(status)))
}

fn submission_reply(
    response: SubmissionResponse,
) -> (StatusCode, Json<AccessRequestSubmissionResponse>) {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        Json(AccessRequestSubmissionResponse::from(response.body)),
    )
}
