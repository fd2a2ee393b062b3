use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use services::audit_service::AuditService;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use util::bus::{EventPublisher, connect_from_config};
use util::config::AppConfig;
use util::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let _log_guard = init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "server terminated");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let (project, addr, grace) = {
        let cfg = AppConfig::global();
        (
            cfg.project_name.clone(),
            format!("{}:{}", cfg.host, cfg.port),
            Duration::from_secs(cfg.shutdown_grace_secs),
        )
    };

    let db = db::connect().await.context("connecting to the database")?;
    Migrator::up(&db, None).await.context("running migrations")?;

    let bus = connect_from_config().await.context("connecting to the broker")?;
    let audit = AuditService::new(db.clone())
        .start(bus.as_ref())
        .await
        .context("starting the audit consumer")?;

    let events = EventPublisher::new(bus.clone());
    let state = AppState::new(db, events.clone());
    let app = api::app(state);

    let addr: SocketAddr = addr.parse().context("invalid HOST/PORT")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, project = %project, "listening");

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    // The server only returns once a shutdown signal arrived and in-flight
    // requests drained; bound that drain by the grace period.
    tokio::select! {
        joined = &mut server => {
            joined.context("server task panicked")?.context("server error")?;
        }
        _ = async {
            shutdown_signal().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(grace_secs = grace.as_secs(), "in-flight requests did not drain in time");
            server.abort();
        }
    }

    audit.abort();
    if tokio::time::timeout(grace, events.flush()).await.is_err() {
        warn!("pending events were not published before shutdown");
    }
    if let Err(e) = bus.close().await {
        warn!(error = %e, "closing the broker failed");
    }
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let (log_file, log_level, log_to_stdout) = {
        let cfg = AppConfig::global();
        (cfg.log_file.clone(), cfg.log_level.clone(), cfg.log_to_stdout)
    };

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = log_to_stdout.then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(true)
            .with_thread_ids(true)
    });

    let env_filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}
