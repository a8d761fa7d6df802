use crate::auth::{AuthenticatedUser, DecisionEngine, Outcome};
use axum::{
    body::Bytes,
    extract::Extension,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_MAX_AGE,
        },
        StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

/// Login payload. Every field is optional on the wire; missing `email` or
/// `password` is answered with 400 and a missing `role` means `artist`.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct LoginSuccess {
    pub success: bool,
    pub user: AuthenticatedUser,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct LoginFailure {
    pub success: bool,
    pub error: String,
}

impl LoginFailure {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            Self::Success(user) => (
                status,
                Json(LoginSuccess {
                    success: true,
                    user,
                }),
            )
                .into_response(),

            failure => (
                status,
                Json(LoginFailure::new(failure.message().unwrap_or_default())),
            )
                .into_response(),
        }
    }
}

#[utoipa::path(
    post,
    path= "/",
    request_body(content = LoginRequest, content_type = "application/json"),
    responses (
        (status = 200, description = "Login successful", body = LoginSuccess, content_type = "application/json"),
        (status = 400, description = "Missing email or password, or malformed body", body = LoginFailure),
        (status = 401, description = "Unknown email and role, or wrong password", body = LoginFailure),
        (status = 403, description = "User is blocked", body = LoginFailure),
        (status = 500, description = "Account store is not configured or unreachable", body = LoginFailure),
    ),
    tag= "auth"
)]
// The body is read raw so a missing or wrong content type still reaches validation.
#[instrument(skip_all)]
pub async fn login(engine: Extension<Arc<DecisionEngine>>, body: Bytes) -> Response {
    engine.authenticate(&body).await.into_response()
}

/// Answer CORS preflight without touching the engine.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            (ACCESS_CONTROL_MAX_AGE, "86400"),
        ],
    )
}

pub async fn method_not_supported() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(LoginFailure::new("Method not supported")),
    )
}
