//! Attendance engine.
//!
//! A presenter opens a session for a schedule and gets a QR image back. The
//! first successful class scan consumes the session so the presenter can
//! regenerate it for the next student. A session is also closed by explicit
//! regeneration, by administrative deactivation, or simply by passing its
//! expiry; expiry is evaluated on read and needs no sweeper.
//!
//! Uniqueness of records per (subject, date, schedule) is enforced by the
//! store; concurrent scanners race on the unique index and the losers get
//! `Conflict`.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use db::models::attendance_record::{self, AttendanceStatus, NewRecord};
use db::models::attendance_session::{self, AttendanceKind, NewSession};
use db::models::{schedule, subject};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use util::bus::{Event, EventPublisher};
use util::config::AppConfig;
use util::qr::{self, QrKind, QrPayload};
use uuid::Uuid;

use crate::clock::campus_date;
use crate::error::AppError;
use crate::subject_service::{Role, Subject};

pub use attendance_record::Model as AttendanceRecord;
pub use attendance_session::Model as AttendanceSession;

pub const MSG_ALREADY_RECORDED: &str = "attendance already recorded for today";
pub const MSG_EXPIRED: &str = "QR code has expired";
pub const MSG_UNKNOWN_SESSION: &str = "invalid or expired QR";

const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone)]
pub struct AttendanceSettings {
    pub default_duration: Duration,
    pub qr_image_size: u32,
    pub utc_offset_minutes: i32,
}

impl AttendanceSettings {
    pub fn from_config() -> Self {
        let cfg = AppConfig::global();
        Self {
            default_duration: Duration::minutes(cfg.qr_default_duration_minutes),
            qr_image_size: cfg.qr_image_size,
            utc_offset_minutes: cfg.campus_utc_offset_minutes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateSession {
    pub schedule_id: Option<Uuid>,
    pub kind: AttendanceKind,
    /// Minutes; the configured default when absent.
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSession {
    pub session_id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub kind: AttendanceKind,
    /// `data:image/png;base64,...`
    pub qr_code: String,
    /// The payload string encoded in the image.
    pub qr_data: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Pairs the optional halves; a lone latitude or longitude is invalid.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Result<Option<Self>, AppError> {
        match (latitude, longitude) {
            (None, None) => Ok(None),
            (Some(latitude), Some(longitude)) => {
                let coords = Self { latitude, longitude };
                coords.validate()?;
                Ok(Some(coords))
            }
            _ => Err(AppError::ValidationFailed(
                "latitude and longitude must be given together".into(),
            )),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AppError::ValidationFailed(
                "latitude must be between -90 and 90".into(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AppError::ValidationFailed(
                "longitude must be between -180 and 180".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub attendance_id: Uuid,
    pub status: AttendanceStatus,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManualAttendance {
    pub subject_id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub kind: AttendanceKind,
    pub status: AttendanceStatus,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceFilter {
    pub subject_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub kind: Option<AttendanceKind>,
    pub status: Option<AttendanceStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendancePage {
    pub records: Vec<AttendanceRecord>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsQuery {
    pub subject_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceStatistics {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_kind: BTreeMap<String, u64>,
    /// Present / Total, 0.0 when there are no records.
    pub attendance_rate: f64,
}

#[derive(Clone)]
pub struct AttendanceService {
    db: DatabaseConnection,
    events: EventPublisher,
    settings: AttendanceSettings,
}

fn require_presenter(actor: &Subject) -> Result<(), AppError> {
    if actor.role.is_presenter() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "only lecturers and staff may manage attendance".into(),
        ))
    }
}

fn status_key(status: AttendanceStatus) -> String {
    serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

fn kind_key(kind: AttendanceKind) -> &'static str {
    kind.qr_kind().as_str()
}

impl AttendanceService {
    pub fn new(db: DatabaseConnection, events: EventPublisher, settings: AttendanceSettings) -> Self {
        Self {
            db,
            events,
            settings,
        }
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        campus_date(now, self.settings.utc_offset_minutes)
    }

    /// Opens a session, replacing any session currently active for the schedule.
    pub async fn generate_session(
        &self,
        presenter: &Subject,
        req: GenerateSession,
        now: DateTime<Utc>,
    ) -> Result<GeneratedSession, AppError> {
        require_presenter(presenter)?;

        let duration = match req.duration {
            None => self.settings.default_duration,
            Some(minutes) if minutes > 0 => Duration::minutes(minutes),
            Some(_) => return Err(AppError::BadRequest("duration must be positive".into())),
        };
        if req.kind == AttendanceKind::Class && req.schedule_id.is_none() {
            return Err(AppError::BadRequest(
                "schedule_id is required for class sessions".into(),
            ));
        }
        if let Some(schedule_id) = req.schedule_id {
            schedule::Model::find_by_id(&self.db, schedule_id)
                .await?
                .ok_or_else(|| AppError::not_found("schedule"))?;
        }

        let session_id = Uuid::new_v4();
        let expires_at = now + duration;
        let payload = QrPayload::new(
            session_id.to_string(),
            req.schedule_id.map(|id| id.to_string()),
            expires_at,
            req.kind.qr_kind(),
        );
        let qr_data = payload.encode()?;
        let qr_code = qr::render_data_url(&payload, self.settings.qr_image_size)?;

        let txn = self.db.begin().await?;
        if let Some(schedule_id) = req.schedule_id {
            let replaced = attendance_session::Model::deactivate_for_schedule(&txn, schedule_id, now).await?;
            if replaced > 0 {
                info!(schedule = %schedule_id, replaced, "previous session deactivated");
            }
        }
        attendance_session::Model::create(
            &txn,
            NewSession {
                id: session_id,
                schedule_id: req.schedule_id,
                created_by: presenter.id,
                kind: req.kind,
                qr_payload: qr_data.clone(),
                expires_at,
            },
            now,
        )
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict("another session was opened for this schedule".into())
            }
            other => other,
        })?;
        txn.commit().await?;

        info!(
            session = %session_id,
            schedule = ?req.schedule_id,
            presenter = %presenter.id,
            %expires_at,
            "attendance session generated"
        );

        Ok(GeneratedSession {
            session_id,
            schedule_id: req.schedule_id,
            kind: req.kind,
            qr_code,
            qr_data,
            expires_at,
        })
    }

    /// Closes the active session of a schedule and opens a fresh one with the
    /// default duration.
    pub async fn regenerate_session(
        &self,
        presenter: &Subject,
        schedule_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<GeneratedSession, AppError> {
        self.generate_session(
            presenter,
            GenerateSession {
                schedule_id: Some(schedule_id),
                kind: AttendanceKind::Class,
                duration: None,
            },
            now,
        )
        .await
    }

    /// Administrative deactivation. Deactivating twice is not an error.
    pub async fn deactivate_session(
        &self,
        actor: &Subject,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AttendanceSession, AppError> {
        require_presenter(actor)?;
        attendance_session::Model::find_by_id(&self.db, session_id)
            .await?
            .ok_or_else(|| AppError::not_found("session"))?;
        attendance_session::Model::deactivate(&self.db, session_id, now).await?;
        info!(session = %session_id, actor = %actor.id, "attendance session deactivated");

        attendance_session::Model::find_by_id(&self.db, session_id)
            .await?
            .ok_or_else(|| AppError::not_found("session"))
    }

    /// Consumes a scanned payload and records the subject as present.
    pub async fn scan(
        &self,
        subject: &Subject,
        qr_data: &str,
        coords: Option<Coordinates>,
        now: DateTime<Utc>,
    ) -> Result<ScanOutcome, AppError> {
        if let Some(c) = &coords {
            c.validate()?;
        }

        let payload = QrPayload::decode(qr_data)?;
        if payload.kind == QrKind::Gate {
            return Err(AppError::BadRequest("invalid QR data".into()));
        }
        let session_id = Uuid::parse_str(&payload.session_id)
            .map_err(|_| AppError::BadRequest(MSG_UNKNOWN_SESSION.into()))?;

        let session = attendance_session::Model::find_by_id(&self.db, session_id)
            .await?
            .ok_or_else(|| AppError::BadRequest(MSG_UNKNOWN_SESSION.into()))?;
        if !session.is_live(now) {
            return Err(AppError::BadRequest(MSG_EXPIRED.into()));
        }

        let date = self.today(now);
        if attendance_record::Model::exists_for(&self.db, subject.id, date, session.schedule_id).await? {
            return Err(AppError::Conflict(MSG_ALREADY_RECORDED.into()));
        }

        let record = attendance_record::Model::create(
            &self.db,
            NewRecord {
                subject_id: subject.id,
                session_id: Some(session.id),
                schedule_id: session.schedule_id,
                kind: session.kind,
                status: AttendanceStatus::Present,
                date,
                check_in_time: Some(now),
                latitude: coords.map(|c| c.latitude),
                longitude: coords.map(|c| c.longitude),
                notes: None,
                created_by: None,
            },
            now,
        )
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(MSG_ALREADY_RECORDED.into()),
            other => other,
        })?;

        info!(
            subject = %subject.id,
            session = %session.id,
            schedule = ?session.schedule_id,
            record = %record.id,
            "attendance recorded"
        );

        // The record is authoritative; losing the flip only delays regeneration.
        if session.kind == AttendanceKind::Class && session.schedule_id.is_some() {
            if let Err(e) = attendance_session::Model::deactivate(&self.db, session.id, now).await {
                warn!(session = %session.id, error = %e, "session deactivation after scan failed");
            }
        }

        self.events.emit(Event::service(
            "attendance",
            "recorded",
            json!({
                "attendance_id": record.id,
                "subject_id": subject.id,
                "session_id": session.id,
                "schedule_id": session.schedule_id,
                "kind": session.kind,
                "status": record.status,
                "date": record.date,
            }),
        ));

        Ok(ScanOutcome {
            attendance_id: record.id,
            status: record.status,
            message: "attendance recorded".into(),
        })
    }

    /// Administrative entry; same uniqueness rule as scanning, no session.
    pub async fn create_manual(
        &self,
        creator: &Subject,
        req: ManualAttendance,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        require_presenter(creator)?;

        subject::Model::find_by_id(&self.db, req.subject_id)
            .await?
            .ok_or_else(|| AppError::not_found("subject"))?;
        if let Some(schedule_id) = req.schedule_id {
            schedule::Model::find_by_id(&self.db, schedule_id)
                .await?
                .ok_or_else(|| AppError::not_found("schedule"))?;
        }

        let conflict = || AppError::Conflict("attendance already recorded for this date".into());
        if attendance_record::Model::exists_for(&self.db, req.subject_id, req.date, req.schedule_id).await? {
            return Err(conflict());
        }

        let record = attendance_record::Model::create(
            &self.db,
            NewRecord {
                subject_id: req.subject_id,
                session_id: None,
                schedule_id: req.schedule_id,
                kind: req.kind,
                status: req.status,
                date: req.date,
                check_in_time: None,
                latitude: None,
                longitude: None,
                notes: req.notes,
                created_by: Some(creator.id),
            },
            now,
        )
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => conflict(),
            other => other,
        })?;

        info!(record = %record.id, subject = %record.subject_id, creator = %creator.id, "manual attendance created");
        Ok(record)
    }

    /// Corrects the status of a record. Excused and sick are final.
    pub async fn update_attendance(
        &self,
        actor: &Subject,
        record_id: Uuid,
        status: AttendanceStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        require_presenter(actor)?;

        let record = attendance_record::Entity::find_by_id(record_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("attendance record"))?;
        if record.status.is_terminal() && record.status != status {
            return Err(AppError::BadRequest("attendance status is final".into()));
        }

        let updated = record.correct(&self.db, status, notes, now).await?;
        info!(record = %updated.id, status = ?updated.status, actor = %actor.id, "attendance corrected");
        Ok(updated)
    }

    /// Students only ever see their own records.
    pub async fn list(&self, actor: &Subject, filter: AttendanceFilter) -> Result<AttendancePage, AppError> {
        let subject_id = match actor.role {
            Role::Student => Some(actor.id),
            _ => filter.subject_id,
        };
        let page = filter.page.unwrap_or(1).max(1);
        let per_page = filter.per_page.unwrap_or(20).clamp(1, MAX_PAGE_SIZE);
        if page_offset(page, per_page).is_none() {
            return Err(AppError::ValidationFailed("page is out of range".into()));
        }

        let mut query = attendance_record::Entity::find();
        if let Some(id) = subject_id {
            query = query.filter(attendance_record::Column::SubjectId.eq(id));
        }
        if let Some(id) = filter.schedule_id {
            query = query.filter(attendance_record::Column::ScheduleId.eq(id));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(attendance_record::Column::Kind.eq(kind));
        }
        if let Some(status) = filter.status {
            query = query.filter(attendance_record::Column::Status.eq(status));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(attendance_record::Column::Date.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(attendance_record::Column::Date.lte(to));
        }

        let paginator = query
            .order_by_desc(attendance_record::Column::Date)
            .order_by_desc(attendance_record::Column::CreatedAt)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(page - 1).await?;

        Ok(AttendancePage {
            records,
            page,
            per_page,
            total,
        })
    }

    pub async fn statistics(
        &self,
        actor: &Subject,
        query: StatisticsQuery,
    ) -> Result<AttendanceStatistics, AppError> {
        let subject_id = match actor.role {
            Role::Student => Some(actor.id),
            _ => query.subject_id,
        };

        let mut select = attendance_record::Entity::find()
            .select_only()
            .column(attendance_record::Column::Status)
            .column(attendance_record::Column::Kind);
        if let Some(id) = subject_id {
            select = select.filter(attendance_record::Column::SubjectId.eq(id));
        }
        if let Some(from) = query.date_from {
            select = select.filter(attendance_record::Column::Date.gte(from));
        }
        if let Some(to) = query.date_to {
            select = select.filter(attendance_record::Column::Date.lte(to));
        }
        let rows: Vec<(AttendanceStatus, AttendanceKind)> = select.into_tuple().all(&self.db).await?;

        Ok(summarize(&rows))
    }

    /// Opens today's campus record.
    pub async fn tap_in(
        &self,
        subject: &Subject,
        coords: Option<Coordinates>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        if let Some(c) = &coords {
            c.validate()?;
        }
        let date = self.today(now);
        if attendance_record::Model::find_open_campus(&self.db, subject.id, date)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("already tapped in".into()));
        }

        let record = attendance_record::Model::create(
            &self.db,
            NewRecord {
                subject_id: subject.id,
                session_id: None,
                schedule_id: None,
                kind: AttendanceKind::Campus,
                status: AttendanceStatus::Present,
                date,
                check_in_time: Some(now),
                latitude: coords.map(|c| c.latitude),
                longitude: coords.map(|c| c.longitude),
                notes: None,
                created_by: None,
            },
            now,
        )
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("already tapped in".into()),
            other => other,
        })?;

        info!(subject = %subject.id, record = %record.id, "campus tap-in");
        Ok(record)
    }

    /// Closes today's open campus record.
    pub async fn tap_out(&self, subject: &Subject, now: DateTime<Utc>) -> Result<AttendanceRecord, AppError> {
        let date = self.today(now);
        let open = attendance_record::Model::find_open_campus(&self.db, subject.id, date)
            .await?
            .ok_or_else(|| AppError::NotFound("no open campus attendance for today".into()))?;
        let closed = open.check_out(&self.db, now).await?;
        info!(subject = %subject.id, record = %closed.id, "campus tap-out");
        Ok(closed)
    }
}

fn summarize(rows: &[(AttendanceStatus, AttendanceKind)]) -> AttendanceStatistics {
    let mut by_status = BTreeMap::new();
    let mut by_kind = BTreeMap::new();
    let mut present = 0u64;

    for (status, kind) in rows {
        *by_status.entry(status_key(*status)).or_insert(0) += 1;
        *by_kind.entry(kind_key(*kind).to_owned()).or_insert(0) += 1;
        if *status == AttendanceStatus::Present {
            present += 1;
        }
    }

    let total = rows.len() as u64;
    let attendance_rate = if total == 0 {
        0.0
    } else {
        present as f64 / total as f64
    };

    AttendanceStatistics {
        total,
        by_status,
        by_kind,
        attendance_rate,
    }
}

/// Row offset of a 1-based page, or `None` when it does not fit a signed
/// 64-bit SQL offset.
fn page_offset(page: u64, per_page: u64) -> Option<u64> {
    (page - 1)
        .checked_mul(per_page)
        .filter(|offset| i64::try_from(*offset).is_ok())
}
