//! Envelope mapping for handlers.
//!
//! Handlers return `Result<ApiSuccess<T>, ApiError>`. Both sides render the
//! shared [`ApiResponse`] envelope:
//!
//! ```json
//! { "success": true, "data": { ... }, "message": "Attendance recorded" }
//! { "success": false, "error": { "code": "CONFLICT", "message": "attendance already recorded for today" } }
//! ```

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::format_validation_errors;
use serde::{Serialize, de::DeserializeOwned};
use services::AppError;
use validator::Validate;

pub use common::response::{ApiResponse, ErrorCode, Meta};

/// Error half of every handler result.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status = StatusCode::from_u16(code.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ApiResponse::error(code, self.0.public_message()))).into_response()
    }
}

/// Success half of every handler result.
pub struct ApiSuccess<T: Serialize> {
    status: StatusCode,
    body: ApiResponse<T>,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: ApiResponse::success(data).with_message(message),
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            body: ApiResponse::success(data).with_message(message),
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.body = self.body.with_meta(meta);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiSuccess<T>, ApiError>;

/// JSON body that is deserialized and then checked with `validator`.
///
/// Both a body that does not bind and one that fails validation are
/// reported as `VALIDATION_FAILED`.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                ApiError(AppError::ValidationFailed(rejection.body_text()))
            })?;
        value
            .validate()
            .map_err(|errors| ApiError(AppError::ValidationFailed(format_validation_errors(&errors))))?;
        Ok(ValidatedJson(value))
    }
}
