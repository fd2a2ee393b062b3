use axum::extract::State;
use serde::Deserialize;
use services::auth_service::{AuthService, TokenPair};
use services::subject_service::SubjectService;
use util::jwt::TokenIssuer;
use util::state::AppState;
use validator::Validate;

use crate::response::{ApiResult, ApiSuccess, ValidatedJson};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// E-mail address or student/employee number.
    #[validate(length(min = 1, message = "identifier is required"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        SubjectService::new(state.db_clone()),
        TokenIssuer::from_config(),
        state.events().clone(),
    )
}

/// POST /auth/login
///
/// ### Request Body
/// ```json
/// { "identifier": "alice@campus.test", "password": "password123" }
/// ```
///
/// ### Responses
/// - `200 OK` with access and refresh tickets and the subject
/// - `400 VALIDATION_FAILED` on an empty field
/// - `401 UNAUTHORIZED` on bad credentials or an inactive account
pub async fn login(State(state): State<AppState>, ValidatedJson(req): ValidatedJson<LoginRequest>) -> ApiResult<TokenPair> {
    let pair = auth_service(&state).login(&req.identifier, &req.password).await?;
    Ok(ApiSuccess::ok(pair, "Login successful"))
}

/// POST /auth/refresh
///
/// Exchanges a renewal ticket for a fresh pair. Access tickets are refused.
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<TokenPair> {
    let pair = auth_service(&state).refresh(&req.refresh_token).await?;
    Ok(ApiSuccess::ok(pair, "Token refreshed"))
}
