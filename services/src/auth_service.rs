use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use util::bus::{Event, EventPublisher};
use util::jwt::{TokenIssuer, TokenKind};

use crate::error::AppError;
use crate::subject_service::{Subject, SubjectService};

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
    pub subject: Subject,
}

#[derive(Clone)]
pub struct AuthService {
    subjects: SubjectService,
    issuer: TokenIssuer,
    events: EventPublisher,
}

impl AuthService {
    pub fn new(subjects: SubjectService, issuer: TokenIssuer, events: EventPublisher) -> Self {
        Self {
            subjects,
            issuer,
            events,
        }
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<TokenPair, AppError> {
        let subject = self.subjects.authenticate(identifier, password).await?;
        let pair = self.issue_pair(subject)?;

        info!(subject = %pair.subject.id, role = %pair.subject.role, "login succeeded");
        self.events.emit(Event::audit(
            "user",
            "login",
            json!({
                "subject_id": pair.subject.id,
                "role": pair.subject.role,
                "identity": pair.subject.identity_number,
            }),
        ));
        Ok(pair)
    }

    /// Exchanges a renewal ticket for a new pair, re-checking the subject.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self.issuer.validate(refresh_token, TokenKind::Refresh)?;
        let subject = self
            .subjects
            .find_available(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("account is inactive".into()))?;
        self.issue_pair(subject)
    }

    fn issue_pair(&self, subject: Subject) -> Result<TokenPair, AppError> {
        let role = subject.role.to_string();
        let access = self
            .issuer
            .issue_access(subject.id, &role, &subject.identity_number)?;
        let refresh = self
            .issuer
            .issue_refresh(subject.id, &role, &subject.identity_number)?;
        Ok(TokenPair {
            access_token: access.token,
            access_expires_at: access.expires_at,
            refresh_token: refresh.token,
            refresh_expires_at: refresh.expires_at,
            subject,
        })
    }
}
