use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::Account;

pub(crate) struct CurrentUser(pub(crate) Account);

impl CurrentUser {
    /// Unwraps an optional extraction, rewording authentication failures for the endpoint.
    pub(crate) fn require(
        extracted: Result<Self, ApiError>,
        message: &'static str,
    ) -> Result<Account, ApiError> {
        match extracted {
            Ok(CurrentUser(account)) => Ok(account),
            Err(ApiError::Unauthorized(_)) => Err(ApiError::Unauthorized(message)),
            Err(other) => Err(other),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let account = app_state
            .store()
            .find_account(&claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load account"))?;

        let Some(account) = account else {
            return Err(ApiError::Unauthorized("Account not found"));
        };

        Ok(CurrentUser(account))
    }
}
