//! Fallback record for failures inside the logger itself
//!
//! When a session cannot open or write its log file, the failure is written to
//! `startupError_<sessionId>.log` instead. This is the last line of defence, so
//! nothing here ever returns an error to the caller.

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::panic::Location;
use std::path::PathBuf;

use chrono::Local;

use crate::config::default_log_dir;

use super::record::{format_line, EXCEPTION};
use super::session_id::SessionId;

const SOURCE: &str = "Source";
const INNER_EXCEPTION: &str = "Inner Exception";

/// What went wrong, in the shape written to the startup-error file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    /// Display text of the failing error
    pub message: String,
    /// Where the failure was caught, if known
    pub trace: Option<String>,
    /// Display text of the error's source, if any
    pub inner: Option<String>,
}

impl FailureReport {
    /// Capture an error together with the caller's source location
    #[track_caller]
    pub fn capture(error: &(dyn Error + 'static)) -> Self {
        let location = Location::caller();
        Self {
            message: error.to_string(),
            trace: Some(format!("at {}", location)),
            inner: error.source().map(|source| source.to_string()),
        }
    }

    /// Text after the last path separator of the trace (a file/line hint)
    pub fn source_hint(&self) -> Option<&str> {
        let trace = self.trace.as_deref()?;
        trace.rsplit(|c: char| c == '/' || c == '\\').next()
    }
}

/// Writes [`FailureReport`]s to startup-error files
#[derive(Debug, Clone, Default)]
pub struct StartupErrorRecorder {
    /// Target directory; `None` means the default `<cwd>/log`
    dir: Option<PathBuf>,
}

impl StartupErrorRecorder {
    /// Recorder writing into the default log directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder writing into `dir`
    pub fn in_dir(dir: PathBuf) -> Self {
        Self { dir: Some(dir) }
    }

    /// Directory startup-error files are written to
    pub fn directory(&self) -> io::Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => default_log_dir(),
        }
    }

    /// Record a failure for `session_id`
    ///
    /// Returns the path of the file written, or `None` if recording failed.
    pub fn record(&self, report: &FailureReport, session_id: SessionId) -> Option<PathBuf> {
        match self.try_record(report, session_id) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(
                    "Failed to record logger failure for session {}: {}",
                    session_id,
                    e
                );
                None
            }
        }
    }

    fn try_record(&self, report: &FailureReport, session_id: SessionId) -> io::Result<PathBuf> {
        let dir = self.directory()?;
        fs::create_dir_all(&dir)?;

        let path = dir.join(session_id.startup_error_file_name());
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        let now = Local::now();
        let mut content = format_line(&now, EXCEPTION, &report.message);
        content.push('\n');

        if let Some(hint) = report.source_hint() {
            content.push_str(&format_line(&now, SOURCE, hint));
            content.push('\n');
        }

        if let Some(inner) = &report.inner {
            content.push_str(&format_line(&now, INNER_EXCEPTION, inner));
            content.push('\n');
        }

        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(path)
    }
}
