//! The committed allowed-count file.
//!
//! A flat JSON object of rule name to count, keys sorted, pretty-printed
//! with a trailing newline so the file diffs cleanly in review.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fd_lock::RwLock;
use ratchet_core::errors::StoreError;
use ratchet_core::traits::{CountsPort, RuleCounts};

/// [`CountsPort`] over a JSON file, locked with an OS advisory lock for the
/// duration of each read or write.
///
/// Saves go to a sibling temp file that is synced and renamed over the
/// committed file, so readers see either the old or the new counts.
#[derive(Debug, Clone)]
pub struct JsonCountsFile {
    path: PathBuf,
}

impl JsonCountsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, e: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }

    /// `.<name>.<pid>.tmp` next to the counts file.
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "counts".to_string());
        self.path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
    }

    fn write_temp(&self, temp: &Path, json: &str) -> Result<(), StoreError> {
        let mut file = File::create(temp).map_err(|e| self.io_err(e))?;
        file.write_all(json.as_bytes()).map_err(|e| self.io_err(e))?;
        file.sync_all().map_err(|e| self.io_err(e))
    }

    fn lock_err(&self, e: std::io::Error) -> StoreError {
        StoreError::Lock {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }
}

impl CountsPort for JsonCountsFile {
    fn load(&self) -> Result<RuleCounts, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no counts file; starting empty");
                return Ok(RuleCounts::new());
            }
            Err(e) => return Err(self.io_err(e)),
        };

        let lock = RwLock::new(file);
        let guard = lock.read().map_err(|e| self.lock_err(e))?;
        let mut content = String::new();
        (&*guard)
            .read_to_string(&mut content)
            .map_err(|e| self.io_err(e))?;

        if content.trim().is_empty() {
            return Ok(RuleCounts::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Malformed {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn save(&self, counts: &RuleCounts) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let mut json = serde_json::to_string_pretty(counts).map_err(|e| StoreError::Malformed {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        json.push('\n');

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        let mut lock = RwLock::new(file);
        let _guard = lock.write().map_err(|e| self.lock_err(e))?;

        let temp = self.temp_path();
        let written = self
            .write_temp(&temp, &json)
            .and_then(|()| fs::rename(&temp, &self.path).map_err(|e| self.io_err(e)));
        if written.is_err() {
            let _ = fs::remove_file(&temp);
        }
        written
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
