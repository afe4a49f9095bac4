use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::{ApiError, Envelope, Enveloped};
use crate::api::guards::CurrentUser;
use crate::api::validation::{first_message, validate_password_len};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories::accounts::CreateAccount;
use crate::repositories::store::StoreError;
use crate::schemas::account::{
    normalize_email, AccountResponse, LoginRequest, LoginResponse, SignupRequest, SignupResponse,
};
use crate::schemas::required;

/// Max attempts per window for login/signup.
const AUTH_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

const MSG_ALL_FIELDS: &str = "All fields are required!!";
const MSG_BAD_CREDENTIALS: &str = "Incorrect email or password!";
const MSG_EMAIL_TAKEN: &str = "Email already registered!!";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), Enveloped> {
    register(&state, payload).await.map_err(|err| err.in_envelope(Envelope::Flag))
}

async fn register(
    state: &AppState,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let Json(mut payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected signup body");
        ApiError::BadRequest(MSG_ALL_FIELDS.to_string())
    })?;
    payload.email = payload.email.as_deref().map(normalize_email);

    let (Some(name), Some(email), Some(password)) = (
        required(payload.name.as_deref()),
        required(payload.email.as_deref()),
        secret(payload.password.as_deref()),
    ) else {
        return Err(ApiError::BadRequest(MSG_ALL_FIELDS.to_string()));
    };

    payload.validate().map_err(|e| ApiError::BadRequest(first_message(&e)))?;
    validate_password_len(password)?;

    let rate_key = format!("rl:signup:{email}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many signup attempts, try again later"));
    }

    let existing = state
        .store()
        .find_account(email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing account"))?;
    if existing.is_some() {
        return Err(ApiError::BadRequest(MSG_EMAIL_TAKEN.to_string()));
    }

    let hashed_password = security::hash_password(password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let params = CreateAccount { email, name, hashed_password, created_at: primitive_now_utc() };
    match state.store().create_account(params).await {
        Ok(account) => {
            tracing::info!(email = %account.email, "Account created");
        }
        Err(StoreError::Conflict(_)) => {
            return Err(ApiError::BadRequest(MSG_EMAIL_TAKEN.to_string()));
        }
        Err(err) => return Err(ApiError::internal(err, "Failed to create account")),
    }

    let response = SignupResponse { status: true, message: "Signup successful!".to_string() };
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, Enveloped> {
    authenticate(&state, payload).await.map_err(|err| err.in_envelope(Envelope::Flag))
}

async fn authenticate(
    state: &AppState,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected login body");
        ApiError::BadRequest(MSG_ALL_FIELDS.to_string())
    })?;

    let (Some(email), Some(password)) =
        (required(payload.email.as_deref()), secret(payload.password.as_deref()))
    else {
        return Err(ApiError::BadRequest(MSG_ALL_FIELDS.to_string()));
    };
    let email = normalize_email(email);

    let rate_key = format!("rl:login:{email}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let account = state
        .store()
        .find_account(&email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load account"))?
        .ok_or(ApiError::Unauthorized(MSG_BAD_CREDENTIALS))?;

    let verified = security::verify_password(password, &account.hashed_password)
        .map_err(|_| ApiError::Unauthorized(MSG_BAD_CREDENTIALS))?;
    if !verified {
        tracing::info!(email = %email, "Rejected login with wrong password");
        return Err(ApiError::Unauthorized(MSG_BAD_CREDENTIALS));
    }

    let access_token = security::create_access_token(&account.email, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(LoginResponse {
        status: true,
        message: "Login successful!".to_string(),
        access_token,
        token_type: "bearer".to_string(),
        user: AccountResponse::from_db(account, state.settings().exam().utc_offset),
    }))
}

/// Like `required`, but the value is kept verbatim: whitespace is part of a password.
fn secret(value: Option<&str>) -> Option<&str> {
    required(value).and(value)
}

async fn me(
    State(state): State<AppState>,
    user: Result<CurrentUser, ApiError>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = CurrentUser::require(user, "User not logged in")?;
    Ok(Json(AccountResponse::from_db(account, state.settings().exam().utc_offset)))
}
