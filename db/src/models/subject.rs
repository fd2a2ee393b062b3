use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::Set, Condition, ConnectionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{lecturer_detail, staff_detail, student_detail};

/// Role a subject plays on campus.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[sea_orm(string_value = "student")]
    Student,
    #[sea_orm(string_value = "lecturer")]
    Lecturer,
    #[sea_orm(string_value = "staff")]
    Staff,
}

impl Role {
    /// Lecturers and staff may issue class sessions.
    pub fn is_presenter(&self) -> bool {
        matches!(self, Role::Lecturer | Role::Staff)
    }
}

/// A person known to the campus, in the `subjects` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subjects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
    /// Student number or employee number.
    pub identity_number: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::student_detail::Entity")]
    StudentDetail,
    #[sea_orm(has_one = "super::lecturer_detail::Entity")]
    LecturerDetail,
    #[sea_orm(has_one = "super::staff_detail::Entity")]
    StaffDetail,
}

impl Related<student_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentDetail.def()
    }
}

impl Related<lecturer_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LecturerDetail.def()
    }
}

impl Related<staff_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StaffDetail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The role-specific record owned by a subject.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "role", content = "detail", rename_all = "snake_case")]
pub enum SubjectDetail {
    Student(student_detail::Model),
    Lecturer(lecturer_detail::Model),
    Staff(staff_detail::Model),
}

impl SubjectDetail {
    pub fn role(&self) -> Role {
        match self {
            SubjectDetail::Student(_) => Role::Student,
            SubjectDetail::Lecturer(_) => Role::Lecturer,
            SubjectDetail::Staff(_) => Role::Staff,
        }
    }
}

/// Fields needed to register a subject together with its role detail.
#[derive(Debug, Clone)]
pub struct NewSubject {
    pub name: String,
    pub email: String,
    pub identity_number: String,
    pub password: String,
    pub detail: NewDetail,
}

#[derive(Debug, Clone)]
pub enum NewDetail {
    Student {
        program: String,
        faculty: String,
        cohort: String,
    },
    Lecturer {
        department: String,
        title: String,
    },
    Staff {
        unit: String,
        position: String,
    },
}

impl NewDetail {
    pub fn role(&self) -> Role {
        match self {
            NewDetail::Student { .. } => Role::Student,
            NewDetail::Lecturer { .. } => Role::Lecturer,
            NewDetail::Staff { .. } => Role::Staff,
        }
    }
}

impl Model {
    pub fn hash_password(password: &str) -> Result<String, DbErr> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| DbErr::Custom(format!("password hashing failed: {e}")))
    }

    pub fn verify_password(&self, password: &str) -> bool {
        PasswordHash::new(&self.password_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Active and not soft-deleted.
    pub fn is_available(&self) -> bool {
        self.active && self.deleted_at.is_none()
    }

    /// Inserts the subject and its single detail row. The caller supplies the
    /// connection so both writes can share a transaction.
    pub async fn create<C: ConnectionTrait>(db: &C, new: NewSubject) -> Result<Self, DbErr> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let subject = ActiveModel {
            id: Set(id),
            role: Set(new.detail.role()),
            name: Set(new.name),
            email: Set(new.email.to_lowercase()),
            identity_number: Set(new.identity_number),
            password_hash: Set(Self::hash_password(&new.password)?),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(db)
        .await?;

        match new.detail {
            NewDetail::Student {
                program,
                faculty,
                cohort,
            } => {
                student_detail::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    subject_id: Set(id),
                    program: Set(program),
                    faculty: Set(faculty),
                    cohort: Set(cohort),
                }
                .insert(db)
                .await?;
            }
            NewDetail::Lecturer { department, title } => {
                lecturer_detail::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    subject_id: Set(id),
                    department: Set(department),
                    title: Set(title),
                }
                .insert(db)
                .await?;
            }
            NewDetail::Staff { unit, position } => {
                staff_detail::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    subject_id: Set(id),
                    unit: Set(unit),
                    position: Set(position),
                }
                .insert(db)
                .await?;
            }
        }

        Ok(subject)
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    /// Looks up a subject by e-mail (case-insensitive) or identity number.
    pub async fn find_by_identifier<C: ConnectionTrait>(
        db: &C,
        identifier: &str,
    ) -> Result<Option<Self>, DbErr> {
        let identifier = identifier.trim();
        Entity::find()
            .filter(
                Condition::any()
                    .add(Column::Email.eq(identifier.to_lowercase()))
                    .add(Column::IdentityNumber.eq(identifier)),
            )
            .filter(Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    /// Loads the detail row matching the subject's role with one query.
    pub async fn load_detail<C: ConnectionTrait>(&self, db: &C) -> Result<Option<SubjectDetail>, DbErr> {
        let detail = match self.role {
            Role::Student => student_detail::Entity::find()
                .filter(student_detail::Column::SubjectId.eq(self.id))
                .one(db)
                .await?
                .map(SubjectDetail::Student),
            Role::Lecturer => lecturer_detail::Entity::find()
                .filter(lecturer_detail::Column::SubjectId.eq(self.id))
                .one(db)
                .await?
                .map(SubjectDetail::Lecturer),
            Role::Staff => staff_detail::Entity::find()
                .filter(staff_detail::Column::SubjectId.eq(self.id))
                .one(db)
                .await?
                .map(SubjectDetail::Staff),
        };
        Ok(detail)
    }

    /// Soft, reversible (de)activation.
    pub async fn set_active<C: ConnectionTrait>(db: &C, id: Uuid, active: bool) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Active, Expr::value(active))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
