use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, IntoActiveModel, PaginatorTrait};
use serde::{Deserialize, Serialize};

pub use super::attendance_session::AttendanceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,
    #[sea_orm(string_value = "excused")]
    Excused,
    #[sea_orm(string_value = "sick")]
    Sick,
    #[sea_orm(string_value = "absent")]
    Absent,
    #[sea_orm(string_value = "late")]
    Late,
}

impl AttendanceStatus {
    /// Excused and sick records can no longer be corrected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttendanceStatus::Excused | AttendanceStatus::Sick)
    }
}

/// An attendance receipt. Records are corrected, never deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub subject_id: Uuid,
    pub session_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub kind: AttendanceKind,
    pub status: AttendanceStatus,
    pub date: NaiveDate,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id",
        on_delete = "Cascade"
    )]
    Subject,
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id",
        on_delete = "SetNull"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::schedule::Column::Id",
        on_delete = "SetNull"
    )]
    Schedule,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewRecord {
    pub subject_id: Uuid,
    pub session_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub kind: AttendanceKind,
    pub status: AttendanceStatus,
    pub date: NaiveDate,
    pub check_in_time: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
}

impl Model {
    /// Inserts a record. The unique indices reject a second record for the
    /// same (subject, date, schedule), or a second open campus record.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        new: NewRecord,
        now: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            subject_id: Set(new.subject_id),
            session_id: Set(new.session_id),
            schedule_id: Set(new.schedule_id),
            kind: Set(new.kind),
            status: Set(new.status),
            date: Set(new.date),
            check_in_time: Set(new.check_in_time),
            check_out_time: Set(None),
            latitude: Set(new.latitude),
            longitude: Set(new.longitude),
            notes: Set(new.notes),
            created_by: Set(new.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    /// Whether a record already occupies the uniqueness slot for
    /// (subject, date, schedule). Without a schedule the slot is the open
    /// campus record of the day.
    pub async fn exists_for<C: ConnectionTrait>(
        db: &C,
        subject_id: Uuid,
        date: NaiveDate,
        schedule_id: Option<Uuid>,
    ) -> Result<bool, DbErr> {
        let query = Entity::find()
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::Date.eq(date));
        let query = match schedule_id {
            Some(id) => query.filter(Column::ScheduleId.eq(id)),
            None => query
                .filter(Column::ScheduleId.is_null())
                .filter(Column::CheckOutTime.is_null()),
        };
        Ok(query.count(db).await? > 0)
    }

    pub async fn find_open_campus<C: ConnectionTrait>(
        db: &C,
        subject_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::Date.eq(date))
            .filter(Column::ScheduleId.is_null())
            .filter(Column::CheckOutTime.is_null())
            .one(db)
            .await
    }

    /// Sets `check_out_time`, never earlier than the check-in.
    pub async fn check_out<C: ConnectionTrait>(self, db: &C, now: DateTime<Utc>) -> Result<Self, DbErr> {
        let out = match self.check_in_time {
            Some(check_in) if check_in > now => check_in,
            _ => now,
        };
        let mut active = self.into_active_model();
        active.check_out_time = Set(Some(out));
        active.updated_at = Set(now);
        active.update(db).await
    }

    /// Corrects status and notes. The date is left untouched.
    pub async fn correct<C: ConnectionTrait>(
        self,
        db: &C,
        status: AttendanceStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let mut active = self.into_active_model();
        active.status = Set(status);
        if notes.is_some() {
            active.notes = Set(notes);
        }
        active.updated_at = Set(now);
        active.update(db).await
    }
}

#[cfg(test)]
mod tests {
    use super::AttendanceStatus;

    #[test]
    fn excused_and_sick_are_terminal() {
        assert!(AttendanceStatus::Excused.is_terminal());
        assert!(AttendanceStatus::Sick.is_terminal());
        assert!(!AttendanceStatus::Present.is_terminal());
        assert!(!AttendanceStatus::Late.is_terminal());
        assert!(!AttendanceStatus::Absent.is_terminal());
    }
}
