use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::assessments::{LifecycleError, MSG_PAST_SCHEDULE};

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    BadRequest(String),
    TooManyRequests(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn in_envelope(self, envelope: Envelope) -> Enveloped {
        Enveloped(envelope, self)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_message(self) -> String {
        match self {
            ApiError::Unauthorized(message) | ApiError::TooManyRequests(message) => {
                message.to_string()
            }
            ApiError::BadRequest(message) => message,
            ApiError::Internal(context) => {
                tracing::error!(context = %context, "Internal server error");
                INTERNAL_MESSAGE.to_string()
            }
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation(message) => ApiError::BadRequest(message.to_string()),
            LifecycleError::PastSchedule => ApiError::BadRequest(MSG_PAST_SCHEDULE.to_string()),
            LifecycleError::IdSpaceExhausted => ApiError::internal(
                LifecycleError::IdSpaceExhausted,
                "Failed to allocate assessment id",
            ),
            LifecycleError::Store(source) => ApiError::internal(source, "Assessment store failure"),
        }
    }
}

/// Shape of the failure body. Each endpoint keeps the envelope its clients already parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Envelope {
    /// `{"success": false, "message": ...}`
    Success,
    /// `{"status": "error", "message": ...}`
    Status,
    /// `{"status": false, "message": ...}`
    Flag,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ErrorBody {
    Success { success: bool, message: String },
    Status { status: &'static str, message: String },
    Flag { status: bool, message: String },
}

#[derive(Debug)]
pub(crate) struct Enveloped(Envelope, ApiError);

impl IntoResponse for Enveloped {
    fn into_response(self) -> Response {
        let Enveloped(envelope, error) = self;
        let status = error.status_code();
        let message = error.into_message();

        let body = match envelope {
            Envelope::Success => ErrorBody::Success { success: false, message },
            Envelope::Status => ErrorBody::Status { status: "error", message },
            Envelope::Flag => ErrorBody::Flag { status: false, message },
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.in_envelope(Envelope::Status).into_response()
    }
}
