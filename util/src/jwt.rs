//! Identity tickets.
//!
//! Short-lived access tickets and long-lived renewal tickets are HS256 JWTs
//! carrying the subject id, its role and an identity hint (student or employee
//! number). Both kinds record `iat`, `nbf` and `exp`, and validation rejects a
//! ticket of the wrong kind.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("token is malformed, expired or not yet valid")]
    Invalid,
    #[error("token kind mismatch: expected {expected:?}")]
    WrongKind { expected: TokenKind },
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: Uuid,
    /// Role name as stored on the subject (`student`, `lecturer`, `staff`).
    pub role: String,
    /// Student or employee number, forwarded to backends for display and audit.
    pub identity: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// A signed ticket and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and validates tickets with a fixed secret and lifetimes.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issuer built from the global configuration.
    pub fn from_config() -> Self {
        let cfg = AppConfig::global();
        Self::new(
            cfg.jwt_secret.clone(),
            Duration::minutes(cfg.jwt_access_minutes),
            Duration::days(cfg.jwt_refresh_days),
        )
    }

    pub fn issue_access(&self, sub: Uuid, role: &str, identity: &str) -> Result<IssuedToken, JwtError> {
        self.issue_at(sub, role, identity, TokenKind::Access, Utc::now())
    }

    pub fn issue_refresh(&self, sub: Uuid, role: &str, identity: &str) -> Result<IssuedToken, JwtError> {
        self.issue_at(sub, role, identity, TokenKind::Refresh, Utc::now())
    }

    /// Issues a ticket as if the current time were `now`.
    pub fn issue_at(
        &self,
        sub: Uuid,
        role: &str,
        identity: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let expires_at = now + ttl;
        let claims = Claims {
            sub,
            role: role.to_owned(),
            identity: identity.to_owned(),
            kind,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| JwtError::Encoding(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validates signature, expiry and not-before, then checks the ticket kind.
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "nbf", "iat", "sub"]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| JwtError::Invalid)?;

        if data.claims.kind != expected {
            return Err(JwtError::WrongKind { expected });
        }
        Ok(data.claims)
    }
}
