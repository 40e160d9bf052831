//! Errors raised inside the log session
//!
//! None of these reach the host through a log call. The session force-closes and
//! hands them to the startup-error recorder instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    /// The log directory could not be resolved from configuration
    #[error("failed to resolve log directory: {0}")]
    ConfigResolution(#[source] io::Error),

    #[error("failed to create log directory {}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create log file {}", path.display())]
    FileCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to log file {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
