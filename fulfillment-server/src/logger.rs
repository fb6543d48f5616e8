//! Logging Infrastructure
//!
//! Console output by default; when a log directory is configured the same
//! events also go to a daily rolling file.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

const DEFAULT_FILTER: &str = "fulfillment_server=info,tower_http=info";

/// Initialize the global subscriber
///
/// Filter precedence: `RUST_LOG`, then `log_level`, then the built-in
/// default. Keep the returned guard alive for the lifetime of the process so
/// buffered file output is flushed on exit.
pub fn init_logger(log_level: Option<&str>, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if std::fs::create_dir_all(log_path).is_ok() {
            let file_appender = tracing_appender::rolling::daily(log_path, "fulfillment-server");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            subscriber
                .with_ansi(false)
                .with_writer(std::io::stdout.and(file_writer))
                .init();
            return Some(guard);
        }
        eprintln!("Log directory {dir} is not writable, logging to stdout only");
    }

    subscriber.init();
    None
}
