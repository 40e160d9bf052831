//! The log session
//!
//! A session owns one log file for the life of the process. Writes and close
//! share a single lock, every line is flushed before the call returns, and no
//! failure ever reaches the caller: the session closes itself, hands the error
//! to the [`StartupErrorRecorder`] and turns every later call into a no-op.

use std::error::Error;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{RetentionPolicy, Settings};

use super::error::LogError;
use super::record::{
    LogRecord, ERROR, EXCEPTION, FAILURE_MARKER, INFORMATION, LOG_BEGIN, LOG_END,
};
use super::retention;
use super::session_id::SessionId;
use super::startup_error::{FailureReport, StartupErrorRecorder};

/// Whether records are echoed to standard output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsoleMirror {
    /// Echo when stdout is attached to a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl ConsoleMirror {
    fn enabled(self) -> bool {
        match self {
            ConsoleMirror::Auto => io::stdout().is_terminal(),
            ConsoleMirror::Always => true,
            ConsoleMirror::Never => false,
        }
    }
}

/// Knobs that are not part of the external configuration
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub console: ConsoleMirror,
    /// Where startup-error files go; defaults to `<cwd>/log`
    pub startup_error_dir: Option<PathBuf>,
}

/// The open log file
struct ActiveFile {
    writer: Box<dyn Write + Send>,
    path: PathBuf,
}

impl ActiveFile {
    fn new(file: File, path: PathBuf) -> Self {
        Self {
            writer: Box::new(file),
            path,
        }
    }

    fn write_record(&mut self, record: &LogRecord) -> io::Result<()> {
        let line = format!("{}\n", record);
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()
    }
}

impl fmt::Debug for ActiveFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveFile").field("path", &self.path).finish()
    }
}

#[derive(Debug)]
enum SessionState {
    Active(ActiveFile),
    Closed,
}

/// Owner of the process's log file
#[derive(Debug)]
pub struct LogSession {
    id: SessionId,
    /// Resolved and existing log directory
    directory: Option<PathBuf>,
    path: Option<PathBuf>,
    retention: RetentionPolicy,
    console: bool,
    recorder: StartupErrorRecorder,
    /// Failure raised while opening, if any
    init_error: Option<LogError>,
    state: Mutex<SessionState>,
}

impl LogSession {
    /// Open a session configured by `settings`
    ///
    /// Never fails: on error the session is returned already closed and the
    /// error is available from [`LogSession::init_result`].
    pub fn open(settings: &Settings) -> Self {
        Self::open_with(settings, SessionOptions::default())
    }

    pub fn open_with(settings: &Settings, options: SessionOptions) -> Self {
        let recorder = match options.startup_error_dir {
            Some(dir) => StartupErrorRecorder::in_dir(dir),
            None => StartupErrorRecorder::new(),
        };

        let mut session = Self {
            id: SessionId::next(),
            directory: None,
            path: None,
            retention: settings.retention_policy(),
            console: options.console.enabled(),
            recorder,
            init_error: None,
            state: Mutex::new(SessionState::Closed),
        };

        match session.start(settings) {
            Ok(()) => {
                if let Err(error) = session.write(&LogRecord::new(INFORMATION, LOG_BEGIN)) {
                    session.init_error = Some(error);
                } else if let Some(path) = &session.path {
                    tracing::debug!("Log session {} writing to {}", session.id, path.display());
                }
            }
            Err(error) => {
                session.report(&error);
                session.init_error = Some(error);
            }
        }

        session
    }

    /// Resolve the directory and open the log file
    fn start(&mut self, settings: &Settings) -> Result<(), LogError> {
        let directory = settings
            .log_directory()
            .map_err(LogError::ConfigResolution)?;

        if !directory.exists() {
            fs::create_dir_all(&directory).map_err(|source| LogError::DirectoryCreation {
                path: directory.clone(),
                source,
            })?;
        }
        if directory.is_dir() {
            self.directory = Some(directory.clone());
        }

        let path = directory.join(self.id.log_file_name());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogError::FileCreation {
                path: path.clone(),
                source,
            })?;
        self.path = Some(path.clone());

        self.state = Mutex::new(SessionState::Active(ActiveFile::new(file, path)));
        Ok(())
    }

    /// Log an error message with the `Error` label
    pub fn error(&self, message: &str) {
        self.error_labeled(message, ERROR);
    }

    pub fn error_labeled(&self, message: &str, label: &str) {
        self.log(label, message);
    }

    /// Log an error value's message with the `Exception` label
    pub fn exception(&self, error: &dyn Error) {
        self.exception_labeled(error, EXCEPTION);
    }

    pub fn exception_labeled(&self, error: &dyn Error, label: &str) {
        self.log(label, &error.to_string());
    }

    /// Log a message with the `Information` label
    pub fn information(&self, message: &str) {
        self.information_labeled(message, INFORMATION);
    }

    pub fn information_labeled(&self, message: &str, label: &str) {
        self.log(label, message);
    }

    /// Write the footer, release the file and sweep expired logs
    ///
    /// Calling this more than once has no effect.
    pub fn close(&self) {
        let mut state = self.lock_state();
        self.shutdown(&mut state, false);
    }

    fn log(&self, label: &str, message: &str) {
        // Failures are already recorded and the session is closed
        let _ = self.write(&LogRecord::new(label, message));
    }

    fn write(&self, record: &LogRecord) -> Result<(), LogError> {
        let mut state = self.lock_state();
        let SessionState::Active(active) = &mut *state else {
            return Ok(());
        };

        if let Err(source) = active.write_record(record) {
            let error = LogError::Write {
                path: active.path.clone(),
                source,
            };
            self.shutdown(&mut state, true);
            drop(state);
            self.report(&error);
            return Err(error);
        }

        if self.console {
            let _ = writeln!(io::stdout().lock(), "{}", record);
        }

        Ok(())
    }

    /// Transition to `Closed`; the caller holds the state lock
    fn shutdown(&self, state: &mut SessionState, failed: bool) {
        let SessionState::Active(mut active) = std::mem::replace(state, SessionState::Closed)
        else {
            return;
        };

        if failed {
            let _ = active.write_record(&LogRecord::new(ERROR, FAILURE_MARKER));
        }
        if let Err(e) = active.write_record(&LogRecord::new(INFORMATION, LOG_END)) {
            tracing::warn!("Failed to write log footer to {}: {}", active.path.display(), e);
        }
        drop(active);

        if let Some(dir) = self.directory.as_deref() {
            if !dir.as_os_str().is_empty() {
                if let Err(e) = retention::sweep(dir, &self.retention) {
                    tracing::warn!("Log retention sweep of {} failed: {}", dir.display(), e);
                }
            }
        }

        tracing::debug!("Log session {} closed", self.id);
    }

    #[track_caller]
    fn report(&self, error: &LogError) {
        tracing::warn!("Log session {} failed: {}", self.id, error);
        self.recorder.record(&FailureReport::capture(error), self.id);
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session_id(&self) -> SessionId {
        self.id
    }

    /// Log directory, if it was resolved and exists
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Path of the session's log file, if it was created
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.lock_state(), SessionState::Closed)
    }

    /// Outcome of opening the session
    pub fn init_result(&self) -> Result<(), &LogError> {
        match &self.init_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Drop for LogSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Shared handle to a [`LogSession`]
///
/// The session closes when the last handle is dropped.
#[derive(Debug, Clone)]
pub struct Logger {
    session: Arc<LogSession>,
}

impl Logger {
    pub fn open(settings: &Settings) -> Self {
        Self::open_with(settings, SessionOptions::default())
    }

    pub fn open_with(settings: &Settings, options: SessionOptions) -> Self {
        Self {
            session: Arc::new(LogSession::open_with(settings, options)),
        }
    }

    /// Whether both handles refer to the same session
    pub fn ptr_eq(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.session, &other.session)
    }
}

impl Deref for Logger {
    type Target = LogSession;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}
