//! Append-only sink for traffic blocks.
//!
//! # Responsibilities
//! - Resolve the file name template once, at construction
//! - Open the file in append mode, creating it if absent
//! - Append each block with one write under a lock
//! - Release the handle exactly once (explicit close or drop)

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local};

use crate::traffic::error::TrafficLogError;

/// Placeholder replaced by the construction time in a sink name.
pub const TIME_PLACEHOLDER: &str = "%s";

/// Sortable date+time substituted for [`TIME_PLACEHOLDER`].
const NAME_TIME_FORMAT: &str = "%Y_%m_%d_%H%M%S";

/// Substitute the first time placeholder in `template`.
pub fn resolve_name(template: &str, now: DateTime<Local>) -> PathBuf {
    if template.contains(TIME_PLACEHOLDER) {
        let stamp = now.format(NAME_TIME_FORMAT).to_string();
        PathBuf::from(template.replacen(TIME_PLACEHOLDER, &stamp, 1))
    } else {
        PathBuf::from(template)
    }
}

/// Shared file handle. Writers serialize on the mutex; `None` once closed.
#[derive(Debug)]
pub struct Sink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl Sink {
    /// Open `path` for appending. Existing content is never truncated.
    pub fn open(path: PathBuf) -> Result<Self, TrafficLogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| TrafficLogError::Configuration {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    /// Resolved path of the sink.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the handle is still held.
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    // A writer that panicked mid-append cannot have left the Option in a
    // bad state, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append one rendered block.
    ///
    /// Failures are reported on the diagnostic stream and dropped; traffic
    /// logging never retries.
    pub fn append(&self, block: &[u8]) {
        let mut guard = self.lock();
        let Some(file) = guard.as_mut() else {
            tracing::debug!(path = %self.path.display(), "Traffic sink closed, block dropped");
            return;
        };
        if let Err(e) = file.write_all(block) {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to append HTTP traffic block");
        }
    }

    /// Release the handle. Safe to call more than once.
    pub fn close(&self) {
        if let Some(mut file) = self.lock().take() {
            if let Err(e) = file.flush() {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to flush HTTP traffic log");
            }
            tracing::info!(path = %self.path.display(), "HTTP traffic log closed");
        }
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        self.close();
    }
}
