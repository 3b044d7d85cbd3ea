//! Session history: the caller-owned session list and loading it from disk.

use crate::{Error, Result, SessionRecord};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

/// Ordered, append-only list of sessions owned by the caller
///
/// There is no way to modify or remove an entry once pushed; scoring
/// functions take `as_slice()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionLog {
    sessions: Vec<SessionRecord>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from sessions, ordered by `recorded_at`
    pub fn from_sessions(mut sessions: Vec<SessionRecord>) -> Self {
        sessions.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        Self { sessions }
    }

    pub fn push(&mut self, session: SessionRecord) {
        self.sessions.push(session);
    }

    pub fn as_slice(&self) -> &[SessionRecord] {
        &self.sessions
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionRecord> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Most recently appended session
    pub fn last(&self) -> Option<&SessionRecord> {
        self.sessions.last()
    }
}

/// Load every stored session that passes validation
///
/// Records that fail validation (e.g. a hand-edited log) are skipped with a
/// warning, like unparseable lines.
pub fn load_valid_sessions(wal_path: &Path) -> Result<SessionLog> {
    let all = crate::wal::read_sessions(wal_path)?;
    let valid: Vec<_> = all
        .into_iter()
        .filter(|s| match s.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Skipping invalid session {}: {}", s.id, e);
                false
            }
        })
        .collect();

    Ok(SessionLog::from_sessions(valid))
}

/// Load sessions recorded within the last `window_hours` before `now`
///
/// Sessions recorded after `now` (clock skew) are kept. The window must be
/// positive and representable as a cutoff instant.
pub fn load_recent_sessions(
    wal_path: &Path,
    window_hours: i64,
    now: DateTime<Utc>,
) -> Result<SessionLog> {
    if window_hours <= 0 {
        return Err(Error::invalid(
            "window_hours",
            format!("{} must be positive", window_hours),
        ));
    }
    let cutoff = Duration::try_hours(window_hours)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| {
            Error::invalid("window_hours", format!("{} hours is out of range", window_hours))
        })?;

    let all = load_valid_sessions(wal_path)?;
    let total = all.len();

    let recent: Vec<_> = all
        .iter()
        .filter(|s| s.recorded_at >= cutoff)
        .cloned()
        .collect();

    tracing::info!(
        "Loaded {} of {} sessions from the last {} hours",
        recent.len(),
        total,
        window_hours
    );

    Ok(SessionLog::from_sessions(recent))
}
