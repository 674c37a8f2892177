//! Tracing subscriber setup.

use crate::config::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "wrench=info";

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered log lines are dropped on exit.
pub fn init_tracing(config: &Config) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (writer, guard) = match &config.log_dir {
        Some(dir) => tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "wrench.log")),
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let builder = fmt().with_env_filter(filter).with_writer(writer).with_target(true);
    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    guard
}
