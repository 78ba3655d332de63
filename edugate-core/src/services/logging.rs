//! Logging bootstrap - tracing subscriber for hosts of the core
//!
//! Events go to stderr so command output on stdout stays clean. The filter
//! comes from `EDUGATE_LOG` (standard `EnvFilter` syntax); `LOG_FORMAT=json`
//! switches to one JSON object per line.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the filter directives
pub const LOG_FILTER_ENV: &str = "EDUGATE_LOG";

/// Directives used when `EDUGATE_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "edugate_core=warn,edugate_cli=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`; anything but `json` means plain
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Plain,
        }
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose {
        "edugate_core=debug,edugate_cli=debug"
    } else {
        DEFAULT_LOG_FILTER
    };
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber
///
/// Returns false when a subscriber was already installed.
pub fn init_tracing(format: LogFormat, verbose: bool) -> bool {
    let filter = env_filter(verbose);
    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .try_init(),
        LogFormat::Plain => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(filter)
            .try_init(),
    };
    result.is_ok()
}
