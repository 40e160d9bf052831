//! Single entry point to the process's logger
//!
//! The host builds one accessor at startup and shares it by reference. The
//! session is opened on first use; every later call returns the same handle.

use std::sync::OnceLock;

use crate::config::Settings;

use super::session::{Logger, SessionOptions};

#[derive(Debug)]
pub struct LoggerAccessor {
    settings: Settings,
    options: SessionOptions,
    logger: OnceLock<Logger>,
}

impl LoggerAccessor {
    pub fn new(settings: Settings) -> Self {
        Self::with_options(settings, SessionOptions::default())
    }

    pub fn with_options(settings: Settings, options: SessionOptions) -> Self {
        Self {
            settings,
            options,
            logger: OnceLock::new(),
        }
    }

    /// The process's logger, opening the session on first call
    ///
    /// Concurrent first calls wait for a single construction, so exactly one
    /// log file is ever created.
    pub fn instance(&self) -> &Logger {
        self.logger
            .get_or_init(|| Logger::open_with(&self.settings, self.options.clone()))
    }

    /// The logger, if it has been opened
    pub fn get(&self) -> Option<&Logger> {
        self.logger.get()
    }

    /// Close the session if it was opened
    pub fn shutdown(&self) {
        if let Some(logger) = self.get() {
            logger.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FOLDER_KEY;
    use crate::logging::ConsoleMirror;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn accessor_for(temp_dir: &TempDir, log_dir: &Path) -> LoggerAccessor {
        LoggerAccessor::with_options(
            Settings::new().with(FOLDER_KEY, log_dir.to_string_lossy()),
            SessionOptions {
                console: ConsoleMirror::Never,
                startup_error_dir: Some(temp_dir.path().join("startup")),
            },
        )
    }

    fn log_files(dir: &Path) -> Vec<std::path::PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|e| e == "log"))
            .collect()
    }

    #[test]
    fn test_lazy_open() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("log");
        let accessor = accessor_for(&temp_dir, &log_dir);

        assert!(accessor.get().is_none());
        assert!(!log_dir.exists());

        let logger = accessor.instance();
        assert!(log_dir.is_dir());
        assert!(accessor.get().unwrap().ptr_eq(logger));
        assert!(accessor.instance().ptr_eq(logger));
    }

    #[test]
    fn test_concurrent_first_access_opens_one_session() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("log");
        let accessor = accessor_for(&temp_dir, &log_dir);

        let ids: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..32)
                .map(|i| {
                    let accessor = &accessor;
                    scope.spawn(move || {
                        let logger = accessor.instance();
                        logger.information(&format!("thread {}", i));
                        logger.session_id()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(ids.windows(2).all(|w| w[0] == w[1]));

        accessor.shutdown();
        let files = log_files(&log_dir);
        assert_eq!(files.len(), 1);

        let content = fs::read_to_string(&files[0]).unwrap();
        assert_eq!(content.matches("log begin").count(), 1);
        assert_eq!(content.matches("log end").count(), 1);
        assert_eq!(content.lines().count(), 34);
    }

    #[test]
    fn test_shutdown_before_first_use_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("log");
        let accessor = accessor_for(&temp_dir, &log_dir);

        accessor.shutdown();
        assert!(accessor.get().is_none());
        assert!(!log_dir.exists());
    }

    #[test]
    fn test_dropping_accessor_closes_session() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("log");
        let accessor = accessor_for(&temp_dir, &log_dir);
        accessor.instance().information("Hello");
        drop(accessor);

        let files = log_files(&log_dir);
        let content = fs::read_to_string(&files[0]).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(" ; Information ; hello"));
        assert!(lines[2].ends_with(" ; Information ; log end"));
    }
}
