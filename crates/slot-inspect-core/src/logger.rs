//! Stderr logger for the inspection pipeline.
//!
//! Lines are tagged with the pipeline stage that emitted them, derived from
//! the record target, e.g.
//! `[  0.412s  WARN features/registration] registration failed: ...`.
//! Records from other crates are shown only at `warn` and above so image
//! decoders do not flood the output at `debug`.

use std::fmt::Arguments;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const CRATE_PREFIX: &str = "slot_inspect";

struct StageLogger {
    level: LevelFilter,
    started: Instant,
}

impl StageLogger {
    fn threshold(&self, target: &str) -> LevelFilter {
        if target.starts_with(CRATE_PREFIX) {
            self.level
        } else {
            self.level.min(LevelFilter::Warn)
        }
    }
}

impl Log for StageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.threshold(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Stage label for a record target: `slot_inspect_eval::evaluator` becomes
/// `eval/evaluator`, `slot_inspect::engine` becomes `engine`. Foreign
/// targets are kept verbatim.
fn stage(target: &str) -> String {
    let Some(rest) = target.strip_prefix(CRATE_PREFIX) else {
        return target.to_string();
    };
    let (krate, module) = match rest.split_once("::") {
        Some((k, m)) => (k.trim_start_matches('_'), m),
        None => (rest.trim_start_matches('_'), ""),
    };
    match (krate.is_empty(), module.is_empty()) {
        (true, true) => CRATE_PREFIX.to_string(),
        (true, false) => module.replace("::", "/"),
        (false, true) => krate.to_string(),
        (false, false) => format!("{krate}/{}", module.replace("::", "/")),
    }
}

fn format_line(elapsed: f64, level: Level, target: &str, args: &Arguments<'_>) -> String {
    format!("[{elapsed:8.3}s {level:>5} {}] {args}\n", stage(target))
}

static LOGGER: OnceLock<StageLogger> = OnceLock::new();

/// Install the stage logger with `level` for this workspace's targets.
///
/// Subsequent calls are no-ops.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StageLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Parse `off|error|warn|info|debug|trace` (case-insensitive).
pub fn parse_level(s: &str) -> Option<LevelFilter> {
    s.trim().parse().ok()
}

#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_strips_workspace_prefix() {
        assert_eq!(stage("slot_inspect_eval::evaluator"), "eval/evaluator");
        assert_eq!(
            stage("slot_inspect_features::registration"),
            "features/registration"
        );
        assert_eq!(stage("slot_inspect::engine"), "engine");
        assert_eq!(stage("slot_inspect"), "slot_inspect");
        assert_eq!(stage("png::decoder"), "png::decoder");
    }

    #[test]
    fn line_carries_stage_and_level() {
        let line = format_line(
            1.5,
            Level::Warn,
            "slot_inspect_eval::evaluator",
            &format_args!("slot {} failed", 3),
        );
        assert_eq!(line, "[   1.500s  WARN eval/evaluator] slot 3 failed\n");
    }

    #[test]
    fn foreign_targets_are_capped_at_warn() {
        let logger = StageLogger {
            level: LevelFilter::Debug,
            started: Instant::now(),
        };
        assert_eq!(logger.threshold("slot_inspect::engine"), LevelFilter::Debug);
        assert_eq!(logger.threshold("png::decoder"), LevelFilter::Warn);
        let quiet = StageLogger {
            level: LevelFilter::Error,
            started: Instant::now(),
        };
        assert_eq!(quiet.threshold("png::decoder"), LevelFilter::Error);
    }

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level(" WARN "), Some(LevelFilter::Warn));
        assert_eq!(parse_level("off"), Some(LevelFilter::Off));
        assert_eq!(parse_level("loud"), None);
    }
}
