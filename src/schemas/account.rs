use serde::{Deserialize, Serialize};
use time::UtcOffset;
use validator::Validate;

use crate::core::time::format_in_offset;
use crate::db::models::Account;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SignupRequest {
    #[serde(default)]
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) password: Option<String>,
}

/// `{status: bool, message}` envelope shared by signup and login.
#[derive(Debug, Serialize)]
pub(crate) struct SignupResponse {
    pub(crate) status: bool,
    pub(crate) message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    pub(crate) status: bool,
    pub(crate) message: String,
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) user: AccountResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct AccountResponse {
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) created_at: String,
}

impl AccountResponse {
    pub(crate) fn from_db(account: Account, offset: UtcOffset) -> Self {
        Self {
            email: account.email,
            name: account.name,
            created_at: format_in_offset(account.created_at, offset),
        }
    }
}

/// Emails are keys; compare them case-insensitively.
pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
