use common::response::ErrorCode;
use sea_orm::{DbErr, SqlErr};
use tracing::error;
use util::bus::BusError;
use util::jwt::JwtError;
use util::qr::QrError;

/// The seven user-visible error kinds. Messages are short, stable sentences.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    ValidationFailed(String),
    #[error("{0}")]
    Conflict(String),
    /// The cause is logged where the error is created and never shown to clients.
    #[error("internal server error")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::BadRequest(_) => ErrorCode::BadRequest,
            AppError::ValidationFailed(_) => ErrorCode::ValidationFailed,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Client-facing message; internal causes are redacted.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) => "internal server error".to_owned(),
            other => other.to_string(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return AppError::Conflict(format!("resource already exists ({detail})"));
        }
        match err {
            DbErr::RecordNotFound(what) => AppError::NotFound(what),
            other => {
                error!(error = %other, "database error");
                AppError::Internal(other.to_string())
            }
        }
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Encoding(cause) => {
                error!(error = %cause, "token signing failed");
                AppError::Internal(cause)
            }
            _ => AppError::Unauthorized("invalid or expired token".into()),
        }
    }
}

impl From<QrError> for AppError {
    fn from(err: QrError) -> Self {
        match err {
            QrError::MalformedPayload(_) => AppError::BadRequest("invalid QR data".into()),
            QrError::Render(cause) => {
                error!(error = %cause, "QR rendering failed");
                AppError::Internal(cause)
            }
        }
    }
}

impl From<BusError> for AppError {
    fn from(err: BusError) -> Self {
        error!(error = %err, "event bus error");
        AppError::Internal(err.to_string())
    }
}
