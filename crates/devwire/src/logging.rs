//! Stderr diagnostics for the CLI. Stdout carries decoded packets and frames only.

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    /// Skipped frames and undecodable payloads.
    Warn,
    /// Learned registrations and end-of-stream counters.
    Info,
    /// Every extracted packet and metadata file.
    Debug,
    /// Bytes discarded while resynchronizing.
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Show event targets once per-packet events are enabled, so framing events
/// from `devwire_frame` stay distinguishable from payload events.
fn shows_targets(level: LogLevel) -> bool {
    LevelFilter::from(level) >= LevelFilter::DEBUG
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::from(level))
        .with_ansi(false)
        .with_target(shows_targets(level));

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("log subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_filters() {
        assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::WARN);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
    }

    #[test]
    fn targets_only_at_packet_detail() {
        assert!(!shows_targets(LogLevel::Error));
        assert!(!shows_targets(LogLevel::Info));
        assert!(shows_targets(LogLevel::Debug));
        assert!(shows_targets(LogLevel::Trace));
    }
}
