//! Append-only session log.
//!
//! Sessions are appended to a JSONL (JSON Lines) file with file locking
//! so that concurrent CLI invocations never interleave lines.

use crate::{Result, SessionRecord};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Session sink trait for persisting sessions
pub trait SessionSink {
    fn append(&mut self, session: &SessionRecord) -> Result<()>;
}

/// JSONL-based session sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SessionSink for JsonlSink {
    fn append(&mut self, session: &SessionRecord) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(session)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended session {} to log", session.id);
        Ok(())
    }
}

/// Read all sessions from a log file, in the order they were appended
///
/// Lines that fail to parse are skipped with a warning.
pub fn read_sessions(path: &Path) -> Result<Vec<SessionRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut sessions = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<SessionRecord>(&line) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} sessions from log", sessions.len());
    Ok(sessions)
}

/// Remove all recorded sessions, returning how many were removed
pub fn clear_sessions(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }

    let count = read_sessions(path)?.len();

    let file = OpenOptions::new().write(true).open(path)?;
    file.lock_exclusive()?;
    file.set_len(0)?;
    file.sync_all()?;
    file.unlock()?;

    tracing::info!("Cleared {} sessions from {:?}", count, path);
    Ok(count)
}
