pub mod log;
pub mod severity;
pub mod systime;

pub use log::{log, log_error, log_event, set_min_severity};
pub use severity::LogSeverity;
