//! Application state container shared across Axum route handlers and services.
//!
//! Holds the database pool and the event publisher. It is cloned into every
//! handler through Axum's `State<T>` extractor; both members are cheap handles.

use sea_orm::DatabaseConnection;

use crate::bus::EventPublisher;

#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    events: EventPublisher,
}

impl AppState {
    pub fn new(db: DatabaseConnection, events: EventPublisher) -> Self {
        Self { db, events }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn events(&self) -> &EventPublisher {
        &self.events
    }
}

impl AppState {
    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for async contexts or spawning tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }
}
