pub mod models;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::path::Path;
use std::time::Duration;
use util::config::AppConfig;

/// Opens the process-wide pool described by the configuration.
///
/// A value that is not a DSN is treated as a SQLite file path.
pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    let (url, max_open, max_idle, lifetime) = {
        let cfg = AppConfig::global();
        (
            cfg.database_url.clone(),
            cfg.database_max_open,
            cfg.database_max_idle,
            cfg.database_max_lifetime_secs,
        )
    };

    let url = if url.starts_with("sqlite:") || url.starts_with("postgres://") || url.starts_with("postgresql://") {
        url
    } else {
        // SQLite won't create intermediate directories.
        if let Some(parent) = Path::new(&url).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        format!("sqlite://{url}?mode=rwc")
    };

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(max_open)
        .min_connections(max_idle.min(max_open))
        .max_lifetime(Duration::from_secs(lifetime))
        .sqlx_logging(false);

    Database::connect(options).await
}
