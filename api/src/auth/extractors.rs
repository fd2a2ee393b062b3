use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use services::AppError;
use services::subject_service::{Subject, SubjectService};
use util::jwt::{TokenIssuer, TokenKind};
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::ApiError;

/// Implements extraction of `AuthUser` from request headers.
///
/// A guard may already have validated the ticket and stored the claims in the
/// request extensions; otherwise the `Authorization: Bearer` header is decoded
/// as an access ticket.
///
/// # Errors
/// - `401 UNAUTHORIZED` if the header is missing, malformed, the ticket is
///   invalid or expired, or a renewal ticket is presented.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError(AppError::Unauthorized(
                        "missing or invalid authorization header".into(),
                    ))
                })?;

        let claims = TokenIssuer::from_config()
            .validate(bearer.token(), TokenKind::Access)
            .map_err(|e| ApiError(AppError::from(e)))?;

        Ok(AuthUser(claims))
    }
}

/// The caller's subject row, loaded fresh for every request so deactivation
/// takes effect before the ticket expires.
#[derive(Debug, Clone)]
pub struct CurrentSubject(pub Subject);

impl FromRequestParts<AppState> for CurrentSubject {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let subject = SubjectService::new(state.db_clone())
            .find_available(user.id())
            .await?
            .ok_or_else(|| ApiError(AppError::Unauthorized("account is inactive".into())))?;
        Ok(CurrentSubject(subject))
    }
}
