use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::{ApiError, Envelope, Enveloped};
use crate::api::guards::CurrentUser;
use crate::api::validation::first_message;
use crate::core::state::AppState;
use crate::core::time::{format_in_offset, primitive_now_utc};
use crate::schemas::assessment::{
    AssessmentListResponse, CreateExamRequest, CreateExamResponse, VerifyRequest, VerifyResponse,
};
use crate::services::assessments::{self, NewAssessment, MSG_INVALID_DETAILS};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/create-exam", post(create_exam))
        .route("/verify-assessment", post(verify_assessment))
        .route("/your-assessments", get(your_assessments))
}

async fn create_exam(
    State(state): State<AppState>,
    user: Result<CurrentUser, ApiError>,
    payload: Result<Json<CreateExamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateExamResponse>), Enveloped> {
    schedule(&state, user, payload).await.map_err(|err| err.in_envelope(Envelope::Success))
}

async fn schedule(
    state: &AppState,
    user: Result<CurrentUser, ApiError>,
    payload: Result<Json<CreateExamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateExamResponse>), ApiError> {
    let account = CurrentUser::require(user, "User not logged in!")?;
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected create-exam body");
        ApiError::BadRequest(MSG_INVALID_DETAILS.to_string())
    })?;
    payload.validate().map_err(|e| ApiError::BadRequest(first_message(&e)))?;

    let offset = state.settings().exam().utc_offset;
    let input = NewAssessment {
        title: payload.title.as_deref(),
        exam_date: payload.exam_date.as_deref(),
        exam_time: payload.exam_time.as_deref(),
        time_limit: payload.time_limit.as_deref(),
    };
    let exam =
        assessments::create(state.store(), &account.email, input, primitive_now_utc(), offset)
            .await?;

    let response = CreateExamResponse {
        success: true,
        assessment_id: exam.assessment_id,
        expiry: format_in_offset(exam.expiry, offset),
        message: "Exam created successfully!".to_string(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

async fn verify_assessment(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected verify body");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;

    let assessment_id = payload.assessment_id.as_deref().unwrap_or_default();
    let outcome = assessments::verify(state.store(), assessment_id, primitive_now_utc()).await?;

    Ok(Json(VerifyResponse { status: outcome.tag(), message: outcome.message() }))
}

async fn your_assessments(
    State(state): State<AppState>,
    user: Result<CurrentUser, ApiError>,
) -> Result<Json<AssessmentListResponse>, ApiError> {
    let account = CurrentUser::require(user, "User not logged in")?;
    let views = assessments::list_for_owner(
        state.store(),
        &account.email,
        primitive_now_utc(),
        state.settings().exam().utc_offset,
    )
    .await?;

    Ok(Json(AssessmentListResponse { status: "success", assessments: views }))
}
