use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::Set, ConnectionTrait, PaginatorTrait};
use serde::{Deserialize, Serialize};
use util::qr::QrKind;

/// Whether attendance is taken for a class or for campus presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AttendanceKind {
    #[sea_orm(string_value = "kelas")]
    #[serde(rename = "kelas")]
    Class,
    #[sea_orm(string_value = "kampus")]
    #[serde(rename = "kampus")]
    Campus,
}

impl AttendanceKind {
    pub fn qr_kind(&self) -> QrKind {
        match self {
            AttendanceKind::Class => QrKind::Class,
            AttendanceKind::Campus => QrKind::Campus,
        }
    }

    pub fn from_qr_kind(kind: QrKind) -> Option<Self> {
        match kind {
            QrKind::Class => Some(AttendanceKind::Class),
            QrKind::Campus => Some(AttendanceKind::Campus),
            QrKind::Gate => None,
        }
    }
}

/// A presenter-issued, time-bounded attendance token.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub created_by: Uuid,
    pub kind: AttendanceKind,
    /// Wire form of the QR payload embedded in the image.
    #[sea_orm(column_type = "Text")]
    pub qr_payload: String,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::schedule::Column::Id",
        on_delete = "Cascade"
    )]
    Schedule,
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::CreatedBy",
        to = "super::subject::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub created_by: Uuid,
    pub kind: AttendanceKind,
    pub qr_payload: String,
    pub expires_at: DateTime<Utc>,
}

impl Model {
    /// A session past its expiry is inactive whatever the flag says.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && self.deleted_at.is_none() && now < self.expires_at
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        new: NewSession,
        now: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            id: Set(new.id),
            schedule_id: Set(new.schedule_id),
            created_by: Set(new.created_by),
            kind: Set(new.kind),
            qr_payload: Set(new.qr_payload),
            expires_at: Set(new.expires_at),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(db)
        .await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    /// Flips the session inactive. Repeating it is a no-op returning 0.
    pub async fn deactivate<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Active, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::Active.eq(true))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Deactivates whichever session is flagged active for the schedule.
    pub async fn deactivate_for_schedule<C: ConnectionTrait>(
        db: &C,
        schedule_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::Active, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::ScheduleId.eq(schedule_id))
            .filter(Column::Active.eq(true))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Sessions for the schedule that are flagged active and not yet expired.
    pub async fn count_live_for_schedule<C: ConnectionTrait>(
        db: &C,
        schedule_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::ScheduleId.eq(schedule_id))
            .filter(Column::Active.eq(true))
            .filter(Column::ExpiresAt.gt(now))
            .filter(Column::DeletedAt.is_null())
            .count(db)
            .await
    }
}
