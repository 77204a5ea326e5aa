//! Logging Infrastructure
//!
//! Structured logging via `tracing-subscriber`. The filter comes from
//! `RUST_LOG` and falls back to [`DEFAULT_FILTER`]. When a log directory is
//! given and exists, output goes to a daily rolling file instead of stdout.

use std::path::Path;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "shop_server=info,tower_http=info";

/// Initialize the logger (stdout, text)
pub fn init_logger() {
    init_logger_with_file(None, false, None);
}

/// Initialize the logger with optional JSON formatting and file output
pub fn init_logger_with_file(filter: Option<&str>, json: bool, log_dir: Option<&str>) {
    let env_filter = match filter {
        Some(f) => EnvFilter::new(f),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists()
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, "shop-server");
            let builder = builder.with_writer(file_appender).with_ansi(false);
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
            return;
        }
        eprintln!("Log directory {dir} does not exist, logging to stdout");
    }

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
