use axum::{body::Body, extract::FromRequestParts, http::Request, middleware::Next, response::Response};
use services::AppError;
use services::subject_service::Role;

use crate::auth::claims::AuthUser;
use crate::response::ApiError;

/// Helper to extract and validate the user, then put the claims back into the
/// request extensions for downstream extractors.
async fn extract_and_insert_authuser(req: Request<Body>) -> Result<(Request<Body>, AuthUser), ApiError> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &()).await?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

async fn allow_roles(
    req: Request<Body>,
    next: Next,
    allowed: &[Role],
    failure_msg: &str,
) -> Result<Response, ApiError> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    match user.role() {
        Some(role) if allowed.contains(&role) => Ok(next.run(req).await),
        _ => Err(ApiError(AppError::Forbidden(failure_msg.to_owned()))),
    }
}

/// Basic guard to ensure the request is authenticated.
pub async fn allow_authenticated(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let (req, _user) = extract_and_insert_authuser(req).await?;
    Ok(next.run(req).await)
}

/// Lecturers and staff.
pub async fn allow_presenter(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    allow_roles(
        req,
        next,
        &[Role::Lecturer, Role::Staff],
        "lecturer or staff access required",
    )
    .await
}

/// Staff only.
pub async fn allow_staff(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    allow_roles(req, next, &[Role::Staff], "staff access required").await
}
