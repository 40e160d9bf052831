//! Session identifiers
//!
//! A session id is the session's creation instant expressed as 100-nanosecond
//! ticks since 1601-01-01 UTC. Log files are named after it, which lets the
//! retention sweep recover a file's age from its name alone.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;
/// Seconds between 1601-01-01 and 1970-01-01
const EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Last id handed out by [`SessionId::next`]
static LAST_ISSUED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Issue an id for a session created now
    ///
    /// Ids issued within one process are strictly increasing, even when two
    /// sessions are created within the same tick.
    pub fn next() -> Self {
        let now = Self::from_datetime(Utc::now()).map_or(1, |id| id.0);
        let previous = LAST_ISSUED
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        Self(now.max(previous.saturating_add(1)))
    }

    /// Id for an explicit instant; `None` for instants before 1601
    pub fn from_datetime(at: DateTime<Utc>) -> Option<Self> {
        let secs = at.timestamp().checked_add(EPOCH_OFFSET_SECS)?;
        let ticks = secs
            .checked_mul(TICKS_PER_SECOND)?
            .checked_add(i64::from(at.timestamp_subsec_nanos()) / NANOS_PER_TICK)?;
        u64::try_from(ticks).ok().map(Self)
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Creation instant encoded in this id
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let ticks = i64::try_from(self.0).ok()?;
        let secs = ticks / TICKS_PER_SECOND - EPOCH_OFFSET_SECS;
        let nanos = (ticks % TICKS_PER_SECOND) * NANOS_PER_TICK;
        DateTime::from_timestamp(secs, u32::try_from(nanos).ok()?)
    }

    /// Name of the session's log file
    pub fn log_file_name(&self) -> String {
        format!("{}.log", self.0)
    }

    /// Name of the session's startup-error file
    pub fn startup_error_file_name(&self) -> String {
        format!("startupError_{}.log", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}
