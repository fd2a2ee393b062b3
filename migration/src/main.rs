use std::{fs, path::Path, process::ExitCode};
use util::config::AppConfig;

mod runner;

#[tokio::main]
async fn main() -> ExitCode {
    let url = AppConfig::global().database_url.clone();
    let command = std::env::args().nth(1);

    if let Some(path) = sqlite_path(&url) {
        if let Some(parent) = Path::new(path).parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Failed to create DB directory: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let db = match sea_orm::Database::connect(&url).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("DB connection failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match command.as_deref() {
        Some("clean") => runner::drop_all(&db).await,
        Some("fresh") => match runner::drop_all(&db).await {
            Ok(()) => runner::run_all_migrations(&db).await,
            Err(e) => Err(e),
        },
        _ => runner::run_all_migrations(&db).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Migration failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// File path of a `sqlite://` URL, without query parameters.
fn sqlite_path(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next()?;
    (!path.is_empty() && path != ":memory:").then_some(path)
}
