//! sessionlog - process-local session file logger
//!
//! Writes one delimited text log per process, records the logger's own failures
//! to a startup-error file, and deletes log files older than a configured
//! lifespan.

pub mod config;
pub mod logging;

pub use config::{RetentionPolicy, Settings};
pub use logging::{LogSession, Logger, LoggerAccessor};
