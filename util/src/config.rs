//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.
//!
//! Every value has a default, so loading never fails. A value that is present but
//! cannot be parsed falls back to its default.

use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock, RwLockReadGuard};

/// Backend domains the gateway knows how to route, paired with the environment
/// variable holding each upstream base URL.
pub const SERVICE_DOMAINS: &[(&str, &str)] = &[
    ("auth", "AUTH_SERVICE_URL"),
    ("users", "USER_SERVICE_URL"),
    ("attendance", "ATTENDANCE_SERVICE_URL"),
    ("qr", "QR_SERVICE_URL"),
    ("schedules", "SCHEDULE_SERVICE_URL"),
    ("enrollments", "ENROLLMENT_SERVICE_URL"),
    ("courses", "COURSE_SERVICE_URL"),
    ("calendar", "CALENDAR_SERVICE_URL"),
    ("leave", "LEAVE_SERVICE_URL"),
    ("master", "MASTER_DATA_SERVICE_URL"),
    ("reports", "REPORT_SERVICE_URL"),
    ("search", "SEARCH_SERVICE_URL"),
    ("broadcasts", "BROADCAST_SERVICE_URL"),
    ("notifications", "NOTIFICATION_SERVICE_URL"),
    ("access", "ACCESS_SERVICE_URL"),
    ("files", "STORAGE_SERVICE_URL"),
];

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8081";

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_open: u32,
    pub database_max_idle: u32,
    pub database_max_lifetime_secs: u64,
    pub rabbitmq_enabled: bool,
    pub rabbitmq_url: String,
    pub jwt_secret: String,
    pub jwt_access_minutes: i64,
    pub jwt_refresh_days: i64,
    pub qr_default_duration_minutes: i64,
    pub qr_image_size: u32,
    pub gate_window_hours: i64,
    pub campus_utc_offset_minutes: i32,
    pub service_urls: BTreeMap<String, String>,
    pub upstream_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn flag_or(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

/// Builds the database DSN from `DATABASE_URL`, or from the discrete
/// `DATABASE_*` variables when no URL is given.
fn database_url() -> String {
    if let Ok(url) = env::var("DATABASE_URL") {
        return url;
    }
    format!(
        "postgres://{}:{}@{}:{}/{}",
        var_or("DATABASE_USER", "postgres"),
        var_or("DATABASE_PASSWORD", "postgres"),
        var_or("DATABASE_HOST", "localhost"),
        var_or("DATABASE_PORT", "5432"),
        var_or("DATABASE_NAME", "campus"),
    )
}

fn rabbitmq_url() -> String {
    if let Ok(url) = env::var("RABBITMQ_URL") {
        return url;
    }
    format!(
        "amqp://{}:{}@{}:{}/{}",
        var_or("RABBITMQ_USER", "guest"),
        var_or("RABBITMQ_PASSWORD", "guest"),
        var_or("RABBITMQ_HOST", "localhost"),
        var_or("RABBITMQ_PORT", "5672"),
        var_or("RABBITMQ_VHOST", "%2f"),
    )
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let service_urls = SERVICE_DOMAINS
            .iter()
            .map(|(domain, key)| ((*domain).to_owned(), var_or(key, DEFAULT_SERVICE_URL)))
            .collect();

        Self {
            env: var_or("APP_ENV", "development"),
            project_name: var_or("PROJECT_NAME", "campus-ops"),
            log_level: var_or("LOG_LEVEL", "info"),
            log_file: var_or("LOG_FILE", "campus.log"),
            log_to_stdout: flag_or("LOG_TO_STDOUT", true),
            host: var_or("HOST", "127.0.0.1"),
            port: parse_or("PORT", 8080),
            database_url: database_url(),
            database_max_open: parse_or("DATABASE_MAX_OPEN", 25),
            database_max_idle: parse_or("DATABASE_MAX_IDLE", 5),
            database_max_lifetime_secs: parse_or("DATABASE_MAX_LIFETIME_SECS", 300),
            rabbitmq_enabled: flag_or("RABBITMQ_ENABLED", true),
            rabbitmq_url: rabbitmq_url(),
            jwt_secret: var_or("JWT_SECRET", "campus-development-secret"),
            jwt_access_minutes: parse_or("JWT_ACCESS_MINUTES", 15),
            jwt_refresh_days: parse_or("JWT_REFRESH_DAYS", 7),
            qr_default_duration_minutes: parse_or("QR_DEFAULT_DURATION_MINUTES", 15),
            qr_image_size: parse_or("QR_IMAGE_SIZE", 256),
            gate_window_hours: parse_or("GATE_WINDOW_HOURS", 12),
            campus_utc_offset_minutes: parse_or("CAMPUS_UTC_OFFSET_MINUTES", 0),
            service_urls,
            upstream_timeout_secs: parse_or("UPSTREAM_TIMEOUT_SECS", 30),
            shutdown_grace_secs: parse_or("SHUTDOWN_GRACE_SECS", 5),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// A poisoned lock is recovered rather than propagated; the configuration is
    /// plain data and a panicking writer cannot leave it half-updated.
    pub fn global() -> RwLockReadGuard<'static, AppConfig> {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        Self::set_field(|cfg| *cfg = AppConfig::from_env());
    }

    /// Looks up the upstream base URL for a routing domain.
    pub fn service_url(&self, domain: &str) -> Option<&str> {
        self.service_urls.get(domain).map(String::as_str)
    }

    /// Generic internal setter for any field in the config.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_database_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_url = value.into());
    }

    pub fn set_rabbitmq_enabled(value: bool) {
        AppConfig::set_field(|cfg| cfg.rabbitmq_enabled = value);
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_access_minutes(value: i64) {
        AppConfig::set_field(|cfg| cfg.jwt_access_minutes = value);
    }

    pub fn set_gate_window_hours(value: i64) {
        AppConfig::set_field(|cfg| cfg.gate_window_hours = value);
    }

    pub fn set_qr_default_duration_minutes(value: i64) {
        AppConfig::set_field(|cfg| cfg.qr_default_duration_minutes = value);
    }

    pub fn set_service_url(domain: impl Into<String>, url: impl Into<String>) {
        AppConfig::set_field(|cfg| {
            cfg.service_urls.insert(domain.into(), url.into());
        });
    }

    pub fn set_upstream_timeout_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.upstream_timeout_secs = value);
    }
}
