use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue::Set, Condition, ConnectionTrait};
use serde::{Deserialize, Serialize};

/// Long-lived personal gate credential. `tapped_in_at` is set while the
/// holder is inside a tap-in window and cleared by the matching tap-out.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gate_access_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub subject_id: Uuid,
    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub token: String,
    #[sea_orm(unique)]
    pub session_id: String,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub tapped_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
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
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// 32 random bytes, URL-safe base64 without padding.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn not_expired(now: DateTime<Utc>) -> Condition {
    Condition::any()
        .add(Column::ExpiresAt.is_null())
        .add(Column::ExpiresAt.gt(now))
}

impl Model {
    pub async fn find_active_for_subject<C: ConnectionTrait>(
        db: &C,
        subject_id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::Active.eq(true))
            .filter(Column::DeletedAt.is_null())
            .one(db)
            .await
    }

    /// Issues a fresh token whose session id is the token itself.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        subject_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let token = generate_token();
        ActiveModel {
            id: Set(Uuid::new_v4()),
            subject_id: Set(subject_id),
            session_id: Set(token.clone()),
            token: Set(token),
            active: Set(true),
            expires_at: Set(None),
            tapped_in_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(db)
        .await
    }

    /// Active, not deleted and not expired at `now`.
    pub async fn find_usable<C: ConnectionTrait>(
        db: &C,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::Active.eq(true))
            .filter(Column::DeletedAt.is_null())
            .filter(not_expired(now))
            .one(db)
            .await
    }

    /// Closes an open tap-in window with a single conditional UPDATE.
    ///
    /// Succeeds only while the token was tapped in within `window` of `now`
    /// and on or after `day_start`. Exactly one of several concurrent callers
    /// can observe `true` for a given tap-in.
    pub async fn try_tap_out<C: ConnectionTrait>(
        db: &C,
        session_id: &str,
        now: DateTime<Utc>,
        window: Duration,
        day_start: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .col_expr(Column::TappedInAt, Expr::value(Option::<DateTime<Utc>>::None))
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::Active.eq(true))
            .filter(Column::DeletedAt.is_null())
            .filter(not_expired(now))
            .filter(Column::TappedInAt.gt(now - window))
            .filter(Column::TappedInAt.gte(day_start))
            .exec(db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Opens a new tap-in window unconditionally.
    pub async fn tap_in<C: ConnectionTrait>(
        db: &C,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        let result = Entity::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .col_expr(Column::TappedInAt, Expr::value(Some(now)))
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::Active.eq(true))
            .filter(Column::DeletedAt.is_null())
            .filter(not_expired(now))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
