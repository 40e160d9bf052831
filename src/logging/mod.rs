//! Session file logging
//!
//! One [`LogSession`] per process writes `<sessionId>.log`, falls back to a
//! startup-error file when its own I/O fails, and sweeps expired log files from
//! its directory when it closes.

mod accessor;
mod error;
pub mod record;
pub mod retention;
mod session;
mod session_id;
mod startup_error;

pub use accessor::LoggerAccessor;
pub use error::LogError;
pub use record::LogRecord;
pub use session::{ConsoleMirror, LogSession, Logger, SessionOptions};
pub use session_id::SessionId;
pub use startup_error::{FailureReport, StartupErrorRecorder};
