use crate::severity::LogSeverity;
use crate::systime::now;
use once_cell::sync::Lazy;
use std::fmt::Display;
use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable read for the initial minimum severity.
pub const LOG_LEVEL_ENV: &str = "RETROGRADE_LOG_LEVEL";

static MIN_SEVERITY: Lazy<AtomicU8> = Lazy::new(|| {
    let initial = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|level| level.parse::<LogSeverity>().ok())
        .unwrap_or(LogSeverity::Info);
    AtomicU8::new(initial as u8)
});

pub fn set_min_severity(log_severity: LogSeverity) {
    MIN_SEVERITY.store(log_severity as u8, Ordering::Relaxed);
}

pub fn min_severity() -> LogSeverity {
    LogSeverity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
}

pub fn enabled(log_severity: LogSeverity) -> bool {
    log_severity >= min_severity()
}

pub fn format_line(msg: &str, log_severity: LogSeverity) -> String {
    format!("{:>9} {} {}", format!("[{}]", log_severity), now(), msg)
}

/// Renders a `MODE - target` event line, the mode right-aligned.
pub fn format_event(mode: &str, target: &str) -> String {
    format!("{:>18} - {}", mode, target)
}

pub fn log(msg: String, log_severity: LogSeverity) {
    if !enabled(log_severity) {
        return;
    }
    let line = format_line(&msg, log_severity);
    if log_severity.is_problem() {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}

pub fn log_event(log_severity: LogSeverity, mode: &str, target: &str) {
    log(format_event(mode, target), log_severity);
}

pub fn log_error(err: &dyn Display, mode: &str, target: &str) {
    log(
        format!("{}: {}", format_event(mode, target), err),
        LogSeverity::Error,
    );
}
