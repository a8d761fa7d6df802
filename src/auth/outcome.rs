//! Result of one authentication attempt.

use super::request::InputError;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity returned on success, taken from the stored record.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub uid: String,
    pub email: String,
    pub role: String,
    pub label: String,
}

/// How a caller can recover from a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or missing fields, resubmit.
    UserInput,
    /// Unknown account or wrong password, retry with corrected credentials.
    AuthenticationFailure,
    /// Blocked account, needs out-of-band unblocking.
    AccountState,
    /// Store missing or unreachable, not the caller's fault.
    SystemFault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(AuthenticatedUser),
    InvalidInput { reason: InputError },
    NotFound,
    Blocked,
    WrongPassword,
    ConfigError,
}

impl Outcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// `None` on success.
    #[must_use]
    pub const fn class(&self) -> Option<ErrorClass> {
        match self {
            Self::Success(_) => None,
            Self::InvalidInput { .. } => Some(ErrorClass::UserInput),
            Self::NotFound | Self::WrongPassword => Some(ErrorClass::AuthenticationFailure),
            Self::Blocked => Some(ErrorClass::AccountState),
            Self::ConfigError => Some(ErrorClass::SystemFault),
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Success(_) => StatusCode::OK,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            // same status, told apart by message only
            Self::NotFound | Self::WrongPassword => StatusCode::UNAUTHORIZED,
            Self::Blocked => StatusCode::FORBIDDEN,
            Self::ConfigError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human readable failure message, `None` on success.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Success(_) => None,
            Self::InvalidInput { reason } => Some(reason.to_string()),
            Self::NotFound => Some("Invalid email or role".to_string()),
            Self::Blocked => Some("User is blocked".to_string()),
            Self::WrongPassword => Some("Invalid password".to_string()),
            Self::ConfigError => Some("Server configuration error".to_string()),
        }
    }
}

impl From<InputError> for Outcome {
    fn from(reason: InputError) -> Self {
        Self::InvalidInput { reason }
    }
}
