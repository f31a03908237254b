use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

/// Environment variable that turns on file logging
pub const DEBUG_ENV: &str = "CLIPPER_DEBUG";

/// Initialize logging into `log_dir` when CLIPPER_DEBUG is set
pub fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    std::env::var_os(DEBUG_ENV)?;

    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, "clipper.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_thread_names(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::DEBUG.into()),
        )
        .init();

    tracing::info!("Clipper Studio logging initialized");
    Some(guard)
}
