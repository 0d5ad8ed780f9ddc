//! Log output for the job.
//!
//! Human-readable, timestamped lines on stderr (or JSON lines with
//! `LOG_FORMAT=json`). The level comes from `-v`/`-q` when given, otherwise
//! from `RUST_LOG`, otherwise `info`.

use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Filter directive for the given verbosity flags, if any were passed.
pub fn level_override(verbose: u8, quiet: bool) -> Option<&'static str> {
    match verbose {
        0 if quiet => Some("error"),
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Build the level filter.
pub fn env_filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

/// Install the global subscriber. Call once, before the job starts.
pub fn init(format: LogFormat, level: Option<&str>) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_override() {
        assert_eq!(level_override(0, false), None);
        assert_eq!(level_override(0, true), Some("error"));
        assert_eq!(level_override(1, false), Some("debug"));
        assert_eq!(level_override(3, true), Some("trace"));
    }

    #[test]
    fn test_explicit_level_wins() {
        let filter = env_filter(Some("debug"));
        assert_eq!(filter.to_string(), "debug");
    }
}
