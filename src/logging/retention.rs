//! Log file retention management
//!
//! Deletes session log files whose creation instant (encoded in the file name)
//! is older than the configured lifespan.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Months, Utc};

use crate::config::RetentionPolicy;

use super::session_id::SessionId;

/// Case-insensitive marker identifying startup-error files, which are never swept
const STARTUP_ERROR_MARKER: &str = "startuperror";

/// Delete expired log files from `logs_dir`
///
/// Returns the number of files deleted.
pub fn sweep(logs_dir: &Path, policy: &RetentionPolicy) -> io::Result<usize> {
    sweep_at(logs_dir, policy, Utc::now())
}

/// Delete log files older than `now` minus the policy's lifespan
///
/// Returns the number of files deleted. Files whose name is not a session id
/// are left alone, and a failed deletion does not stop the sweep.
pub fn sweep_at(
    logs_dir: &Path,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> io::Result<usize> {
    let Some(months) = policy.lifespan_months() else {
        return Ok(0);
    };

    if !logs_dir.exists() {
        return Ok(0);
    }

    let Some(cutoff) = now.checked_sub_months(Months::new(months)) else {
        return Ok(0);
    };

    let mut deleted_count = 0;

    for entry in fs::read_dir(logs_dir)? {
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let Some(created_at) = creation_instant(&path) else {
            continue;
        };

        if created_at < cutoff {
            match fs::remove_file(&path) {
                Ok(()) => deleted_count += 1,
                Err(e) => {
                    tracing::warn!("Failed to delete expired log file {}: {}", path.display(), e)
                }
            }
        }
    }

    if deleted_count > 0 {
        tracing::debug!(
            "Removed {} expired log files from {}",
            deleted_count,
            logs_dir.display()
        );
    }

    Ok(deleted_count)
}

/// Creation instant of a session log file, recovered from its name
fn creation_instant(path: &Path) -> Option<DateTime<Utc>> {
    let name = path.file_name()?.to_str()?;
    if name.to_lowercase().contains(STARTUP_ERROR_MARKER) {
        return None;
    }

    let stem = path.file_stem()?.to_str()?;
    stem.parse::<SessionId>().ok()?.to_datetime()
}
