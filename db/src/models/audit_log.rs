use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};

/// Persisted copy of an audit event consumed from the broker.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub routing_key: String,
    pub subject_id: Option<Uuid>,
    pub action: String,
    pub body: Json,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        routing_key: &str,
        subject_id: Option<Uuid>,
        action: &str,
        body: Json,
        occurred_at: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            routing_key: Set(routing_key.to_owned()),
            subject_id: Set(subject_id),
            action: Set(action.to_owned()),
            body: Set(body),
            occurred_at: Set(occurred_at),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
    }
}
