//! Audit trail writer: drains `audit_queue` into the `audit_logs` table.

use std::sync::Arc;

use async_trait::async_trait;
use db::models::audit_log;
use sea_orm::DatabaseConnection;
use tracing::debug;
use util::bus::{AUDIT_QUEUE, BusError, ConsumerHandle, Event, EventBus, EventHandler};
use uuid::Uuid;

pub const CONSUMER_TAG: &str = "campus-audit-writer";

#[derive(Clone)]
pub struct AuditService {
    db: DatabaseConnection,
}

impl AuditService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Starts the long-lived audit consumer.
    pub async fn start(self, bus: &dyn EventBus) -> Result<ConsumerHandle, BusError> {
        bus.consume(AUDIT_QUEUE, CONSUMER_TAG, Arc::new(self)).await
    }
}

/// `audit.user.login` → `user.login`.
pub fn action_of(routing_key: &str) -> &str {
    routing_key.strip_prefix("audit.").unwrap_or(routing_key)
}

fn subject_of(event: &Event) -> Option<Uuid> {
    event
        .body
        .get("subject_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
}

#[async_trait]
impl EventHandler for AuditService {
    async fn handle(&self, event: Event) -> anyhow::Result<()> {
        let entry = audit_log::Model::create(
            &self.db,
            &event.routing_key,
            subject_of(&event),
            action_of(&event.routing_key),
            event.body.clone(),
            event.timestamp,
        )
        .await?;
        debug!(id = %entry.id, key = %entry.routing_key, "audit entry stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_drops_the_kind_prefix() {
        assert_eq!(action_of("audit.user.login"), "user.login");
        assert_eq!(action_of("other"), "other");
    }

    #[test]
    fn subject_is_read_from_the_body() {
        let id = Uuid::new_v4();
        let event = Event::audit("user", "login", json!({ "subject_id": id.to_string() }));
        assert_eq!(subject_of(&event), Some(id));
        assert_eq!(subject_of(&Event::audit("x", "y", json!({}))), None);
    }
}
