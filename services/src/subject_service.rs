use db::models::subject::{self, NewSubject, SubjectDetail};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;

pub use db::models::subject::{Model as Subject, Role};

/// A subject together with its role-specific record.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectProfile {
    #[serde(flatten)]
    pub subject: Subject,
    pub detail: Option<SubjectDetail>,
}

#[derive(Clone)]
pub struct SubjectService {
    db: DatabaseConnection,
}

impl SubjectService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates the subject and its detail row atomically.
    pub async fn register(&self, new: NewSubject) -> Result<Subject, AppError> {
        let txn = self.db.begin().await?;
        let subject = subject::Model::create(&txn, new).await?;
        txn.commit().await?;
        info!(subject = %subject.id, role = %subject.role, "subject registered");
        Ok(subject)
    }

    pub async fn find(&self, id: Uuid) -> Result<Subject, AppError> {
        subject::Model::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| AppError::not_found("subject"))
    }

    /// The subject, if it exists and may act on campus.
    pub async fn find_available(&self, id: Uuid) -> Result<Option<Subject>, AppError> {
        Ok(subject::Model::find_by_id(&self.db, id)
            .await?
            .filter(Subject::is_available))
    }

    pub async fn find_with_detail(&self, id: Uuid) -> Result<SubjectProfile, AppError> {
        let subject = self.find(id).await?;
        let detail = subject.load_detail(&self.db).await?;
        Ok(SubjectProfile { subject, detail })
    }

    /// Verifies credentials. Unknown identifiers and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<Subject, AppError> {
        let invalid = || AppError::Unauthorized("invalid credentials".into());
        let subject = subject::Model::find_by_identifier(&self.db, identifier)
            .await?
            .ok_or_else(invalid)?;
        if !subject.verify_password(password) {
            return Err(invalid());
        }
        if !subject.is_available() {
            return Err(AppError::Unauthorized("account is inactive".into()));
        }
        Ok(subject)
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<(), AppError> {
        match subject::Model::set_active(&self.db, id, active).await? {
            0 => Err(AppError::not_found("subject")),
            _ => {
                info!(subject = %id, active, "subject activation changed");
                Ok(())
            }
        }
    }
}
