//! User profile persistence with file locking.
//!
//! The profile holds the values a user would otherwise re-enter for every
//! session: body weight, usage frequency and optional body measurements.

use crate::{Error, Frequency, Physiology, Result, Sex};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Stored defaults for new sessions
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    #[serde(default)]
    pub body_weight_kg: Option<f64>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub sex: Option<Sex>,
}

impl UserProfile {
    /// Body measurements for the physiology modifier, when a height is known
    pub fn physiology(&self) -> Option<Physiology> {
        self.height_cm.map(|height_cm| Physiology {
            height_cm,
            sex: self.sex.clone(),
        })
    }

    /// Load the profile from a file with shared locking
    ///
    /// Returns the default profile if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns the default profile.
    /// A file that exists but cannot be read is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No profile file found, using default profile");
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        match serde_json::from_str::<UserProfile>(&contents) {
            Ok(profile) => {
                tracing::debug!("Loaded profile from {:?}", path);
                Ok(profile)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse profile file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save the profile atomically (temp file, fsync, rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("profile path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved profile to {:?}", path);
        Ok(())
    }

    /// Load the profile, modify it, and save it back
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut UserProfile) -> Result<()>,
    {
        let mut profile = Self::load(path)?;
        f(&mut profile)?;
        profile.save(path)?;
        Ok(profile)
    }
}
