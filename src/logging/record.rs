//! Log line formatting
//!
//! Every line on disk has the form `<local-timestamp> ; <label> ; <message>`.

use std::fmt;

use chrono::{DateTime, Local};

/// Label for informational records
pub const INFORMATION: &str = "Information";
/// Label for error records
pub const ERROR: &str = "Error";
/// Label for records carrying an error value
pub const EXCEPTION: &str = "Exception";

/// Message of the header line written when a session opens
pub const LOG_BEGIN: &str = "log begin";
/// Message of the footer line written when a session closes
pub const LOG_END: &str = "log end";
/// Message written before the footer when a session closes because of a failure
pub const FAILURE_MARKER: &str = "issue encountered when attempting to log information";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A single record, normalized for persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    /// Category tag, trimmed
    pub label: String,
    /// Message text, lowercased
    pub message: String,
}

impl LogRecord {
    /// Create a record stamped with the current local time
    pub fn new(label: &str, message: &str) -> Self {
        Self::at(Local::now(), label, message)
    }

    /// Create a record with an explicit timestamp
    pub fn at(timestamp: DateTime<Local>, label: &str, message: &str) -> Self {
        Self {
            timestamp,
            label: single_line(label.trim()),
            message: single_line(&message.to_lowercase()),
        }
    }
}

/// Replace line breaks with spaces so a record never spans lines
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(|c: char| c == '\r' || c == '\n', " ")
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_line(f, &self.timestamp, &self.label, &self.message)
    }
}

/// Format a line without normalizing label or message
pub fn format_line(timestamp: &DateTime<Local>, label: &str, message: &str) -> String {
    let mut line = String::new();
    // Writing into a String cannot fail
    let _ = write_line(&mut line, timestamp, label, message);
    line
}

fn write_line(
    out: &mut impl fmt::Write,
    timestamp: &DateTime<Local>,
    label: &str,
    message: &str,
) -> fmt::Result {
    write!(
        out,
        "{} ; {} ; {}",
        timestamp.format(TIMESTAMP_FORMAT),
        label,
        message
    )
}
