//! Gate access engine.
//!
//! Every subject owns one long-lived gate token; its QR is shown at the
//! campus gate. The token row carries the tap state: `tapped_in_at` is set on
//! tap-in and cleared by the tap-out, and the tap-out is a single conditional
//! UPDATE so concurrent validators can never both close the same window.

use chrono::{DateTime, Duration, Utc};
use db::models::attendance_record::{self, AttendanceStatus, NewRecord};
use db::models::attendance_session::AttendanceKind;
use db::models::gate_access_token;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};
use util::bus::{Event, EventPublisher};
use util::config::AppConfig;
use util::qr::{self, QrKind, QrPayload};
use uuid::Uuid;

use crate::clock::{campus_date, day_start};
use crate::error::AppError;
use crate::subject_service::{Subject, SubjectService};

/// Nominal lifetime written into the gate QR; the token itself never expires.
const TOKEN_QR_LIFETIME_DAYS: i64 = 365;

#[derive(Debug, Clone)]
pub struct GateSettings {
    pub window: Duration,
    pub qr_image_size: u32,
    pub utc_offset_minutes: i32,
}

impl GateSettings {
    pub fn from_config() -> Self {
        let cfg = AppConfig::global();
        Self {
            window: Duration::hours(cfg.gate_window_hours),
            qr_image_size: cfg.qr_image_size,
            utc_offset_minutes: cfg.campus_utc_offset_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GateToken {
    pub token_id: Uuid,
    pub session_id: String,
    pub qr_code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TapOutcome {
    TapIn,
    TapOut,
    Denied,
}

#[derive(Debug, Clone, Serialize)]
pub struct GateValidation {
    pub valid: bool,
    pub tap_outcome: TapOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<Uuid>,
}

impl GateValidation {
    fn denied() -> Self {
        Self {
            valid: false,
            tap_outcome: TapOutcome::Denied,
            subject_id: None,
        }
    }

    fn accepted(outcome: TapOutcome, subject_id: Uuid) -> Self {
        Self {
            valid: true,
            tap_outcome: outcome,
            subject_id: Some(subject_id),
        }
    }
}

#[derive(Clone)]
pub struct GateAccessService {
    db: DatabaseConnection,
    subjects: SubjectService,
    events: EventPublisher,
    settings: GateSettings,
}

impl GateAccessService {
    pub fn new(db: DatabaseConnection, events: EventPublisher, settings: GateSettings) -> Self {
        Self {
            subjects: SubjectService::new(db.clone()),
            db,
            events,
            settings,
        }
    }

    /// Returns the subject's active token, issuing one on first use.
    pub async fn get_or_create_token(&self, subject: &Subject, now: DateTime<Utc>) -> Result<GateToken, AppError> {
        let token = match gate_access_token::Model::find_active_for_subject(&self.db, subject.id).await? {
            Some(existing) => existing,
            None => match gate_access_token::Model::create(&self.db, subject.id, now).await {
                Ok(created) => {
                    info!(subject = %subject.id, token = %created.id, "gate token issued");
                    created
                }
                Err(e) => {
                    let err = AppError::from(e);
                    if !err.is_conflict() {
                        return Err(err);
                    }
                    // Lost the race against a concurrent first call.
                    gate_access_token::Model::find_active_for_subject(&self.db, subject.id)
                        .await?
                        .ok_or(err)?
                }
            },
        };

        let expires_at = now + Duration::days(TOKEN_QR_LIFETIME_DAYS);
        let payload = QrPayload::new(token.session_id.clone(), None, expires_at, QrKind::Gate);
        let qr_code = qr::render_data_url(&payload, self.settings.qr_image_size)?;

        Ok(GateToken {
            token_id: token.id,
            session_id: token.session_id,
            qr_code,
            expires_at,
        })
    }

    /// Decides tap-in versus tap-out for a presented token.
    pub async fn validate_at_gate(&self, session_id: &str, now: DateTime<Utc>) -> Result<GateValidation, AppError> {
        let Some(token) = gate_access_token::Model::find_usable(&self.db, session_id, now).await? else {
            debug!("gate token unknown or inactive");
            return Ok(GateValidation::denied());
        };
        let Some(subject) = self.subjects.find_available(token.subject_id).await? else {
            info!(subject = %token.subject_id, "gate access denied for unavailable subject");
            return Ok(GateValidation::denied());
        };

        let today_start = day_start(now, self.settings.utc_offset_minutes);
        let outcome = if gate_access_token::Model::try_tap_out(
            &self.db,
            session_id,
            now,
            self.settings.window,
            today_start,
        )
        .await?
        {
            TapOutcome::TapOut
        } else if gate_access_token::Model::tap_in(&self.db, session_id, now).await? == 1 {
            TapOutcome::TapIn
        } else {
            // Deactivated between the lookup and the write.
            return Ok(GateValidation::denied());
        };

        info!(subject = %subject.id, outcome = ?outcome, "gate tap");
        self.sync_campus_record(&subject, outcome, now).await;

        self.events.emit(Event::service(
            "access",
            match outcome {
                TapOutcome::TapOut => "tap_out",
                _ => "tap_in",
            },
            json!({
                "subject_id": subject.id,
                "token_id": token.id,
                "at": now,
            }),
        ));

        Ok(GateValidation::accepted(outcome, subject.id))
    }

    /// Mirrors a gate tap onto today's campus attendance record. The token
    /// row is authoritative, so failures here are only logged.
    async fn sync_campus_record(&self, subject: &Subject, outcome: TapOutcome, now: DateTime<Utc>) {
        let date = campus_date(now, self.settings.utc_offset_minutes);
        let result = match outcome {
            TapOutcome::TapIn => {
                match attendance_record::Model::find_open_campus(&self.db, subject.id, date).await {
                    Ok(Some(_)) => Ok(()),
                    Ok(None) => attendance_record::Model::create(
                        &self.db,
                        NewRecord {
                            subject_id: subject.id,
                            session_id: None,
                            schedule_id: None,
                            kind: AttendanceKind::Campus,
                            status: AttendanceStatus::Present,
                            date,
                            check_in_time: Some(now),
                            latitude: None,
                            longitude: None,
                            notes: None,
                            created_by: None,
                        },
                        now,
                    )
                    .await
                    .map(|_| ()),
                    Err(e) => Err(e),
                }
            }
            TapOutcome::TapOut => {
                match attendance_record::Model::find_open_campus(&self.db, subject.id, date).await {
                    Ok(Some(open)) => open.check_out(&self.db, now).await.map(|_| ()),
                    Ok(None) => Ok(()),
                    Err(e) => Err(e),
                }
            }
            TapOutcome::Denied => Ok(()),
        };

        if let Err(e) = result {
            warn!(subject = %subject.id, error = %e, "campus record update after gate tap failed");
        }
    }
}
