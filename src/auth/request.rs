//! Credential payload validation.
//!
//! Runs before any store access and is a pure function of the request body.

use secrecy::SecretString;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Account role the lookup is scoped to.
///
/// Only `artist` and `admin` exist today, but unrecognised values are carried
/// through untouched so they resolve as an unknown account instead of a bad
/// request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Role(String);

impl Role {
    pub const ARTIST: &'static str = "artist";
    pub const ADMIN: &'static str = "admin";

    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    #[must_use]
    pub fn artist() -> Self {
        Self::new(Self::ARTIST)
    }

    #[must_use]
    pub fn admin() -> Self {
        Self::new(Self::ADMIN)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self.0.as_str(), Self::ARTIST | Self::ADMIN)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::artist()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Malformed request body")]
    MalformedBody,
    #[error("Email is required")]
    MissingEmail,
    #[error("Password is required")]
    MissingPassword,
    #[error("Email and password are required")]
    MissingCredentials,
}

/// Normalized `(email, password, role)` triple handed to the decision engine.
#[derive(Debug, Clone)]
pub struct CredentialRequest {
    email: String,
    password: SecretString,
    role: Role,
}

impl CredentialRequest {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
            role,
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }

    #[must_use]
    pub const fn role(&self) -> &Role {
        &self.role
    }
}

/// Validate a raw request body.
///
/// An empty body counts as `{}`. Anything that is not a JSON object is
/// rejected as [`InputError::MalformedBody`].
///
/// # Errors
/// Returns an [`InputError`] naming the first problem found.
pub fn validate(body: &[u8]) -> Result<CredentialRequest, InputError> {
    let payload = parse_payload(body)?;
    validate_payload(&payload)
}

/// Validate an already decoded JSON object.
///
/// # Errors
/// Returns an [`InputError`] when `email` or `password` is empty after trimming.
pub fn validate_payload(payload: &Map<String, Value>) -> Result<CredentialRequest, InputError> {
    let email = string_field(payload, "email").trim();
    let password = string_field(payload, "password").trim();

    match (email.is_empty(), password.is_empty()) {
        (true, true) => return Err(InputError::MissingCredentials),
        (true, false) => return Err(InputError::MissingEmail),
        (false, true) => return Err(InputError::MissingPassword),
        (false, false) => {}
    }

    let role = match string_field(payload, "role") {
        "" => Role::default(),
        role => Role::new(role),
    };

    Ok(CredentialRequest::new(email, password, role))
}

fn parse_payload(body: &[u8]) -> Result<Map<String, Value>, InputError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) | Err(_) => Err(InputError::MalformedBody),
    }
}

// non-string values count as absent
fn string_field<'a>(payload: &'a Map<String, Value>, key: &str) -> &'a str {
    payload.get(key).and_then(Value::as_str).unwrap_or("")
}
