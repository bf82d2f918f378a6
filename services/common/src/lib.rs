use std::{
    env, fs, io,
    net::SocketAddr,
    panic,
    path::{Path, PathBuf},
    str::FromStr,
    thread,
    time::{Duration, SystemTime},
};
use tokio::net::TcpListener;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

const LAMBDA_RUNTIME_VAR: &str = "AWS_LAMBDA_RUNTIME_API";

pub struct TracingGuards {
    file_guard: Option<WorkerGuard>,
}

impl TracingGuards {
    pub fn has_file_output(&self) -> bool {
        self.file_guard.is_some()
    }
}

/// Installs the global subscriber: stdout always, plus a daily rolling file
/// under `$LOG_DIR/<service_name>` when the directory is writable.
///
/// Lambda sandboxes have a read-only filesystem and ship stdout to their own
/// log sink, so the file layer is skipped there.
pub fn init_tracing(service_name: &str) -> TracingGuards {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_writer(io::stdout);

    let (file_layer, file_guard) = match file_writer(service_name) {
        Some((writer, guard, log_root)) => {
            let retention_days = env_or("LOG_RETENTION_DAYS", 14u64);
            let cleanup_interval = env_or("LOG_CLEANUP_INTERVAL_MINUTES", 360u64);
            spawn_log_cleanup(log_root, retention_days, cleanup_interval);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer);
    let _ = tracing::subscriber::set_global_default(subscriber);

    TracingGuards { file_guard }
}

fn file_writer(
    service_name: &str,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard, PathBuf)> {
    if running_on_lambda() {
        return None;
    }
    let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "/var/log/gitlog".to_string());
    let log_root = PathBuf::from(log_dir).join(service_name);
    fs::create_dir_all(&log_root).ok()?;

    // The rolling appender panics if it cannot open its first file.
    let appender = panic::catch_unwind(|| {
        tracing_appender::rolling::daily(&log_root, format!("{service_name}.log"))
    })
    .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Some((writer, guard, log_root))
}

/// True when the process was started by an AWS Lambda runtime.
pub fn running_on_lambda() -> bool {
    env::var_os(LAMBDA_RUNTIME_VAR).is_some()
}

pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

fn spawn_log_cleanup(log_root: PathBuf, retention_days: u64, cleanup_interval_minutes: u64) {
    if retention_days == 0 || cleanup_interval_minutes == 0 {
        return;
    }

    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);
    let interval = Duration::from_secs(cleanup_interval_minutes * 60);

    thread::spawn(move || loop {
        if let Some(cutoff) = SystemTime::now().checked_sub(retention) {
            prune_logs_older_than(&log_root, cutoff);
        }
        thread::sleep(interval);
    });
}

fn prune_logs_older_than(root: &Path, cutoff: SystemTime) {
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            prune_logs_older_than(&path, cutoff);
            continue;
        }
        let modified = fs::metadata(&path).and_then(|metadata| metadata.modified());
        if matches!(modified, Ok(modified) if modified < cutoff) {
            let _ = fs::remove_file(&path);
        }
    }
}

/// Binds on all interfaces so the service is reachable from inside a container.
pub async fn bind_listener(port: u16) -> io::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    Ok(listener)
}

pub async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "sigterm handler unavailable");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
    tracing::info!("shutdown signal received");
}
