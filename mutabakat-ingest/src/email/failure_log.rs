//! Line-delimited JSON log of emails that produced no transaction.

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::EmailError;

/// Characters of decoded body kept in each entry.
pub const BODY_PREFIX_LEN: usize = 200;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEntry {
    pub date: String,
    pub subject: String,
    pub from: String,
    pub body_prefix: String,
    pub error: String,
}

impl FailureEntry {
    pub fn new(date: String, subject: &str, from: &str, body: &str, error: impl Into<String>) -> Self {
        Self {
            date,
            subject: subject.to_string(),
            from: from.to_string(),
            body_prefix: body.chars().take(BODY_PREFIX_LEN).collect(),
            error: error.into(),
        }
    }
}

/// Append-only failure log shared by parser workers.
#[derive(Debug)]
pub struct FailureLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a single JSON line.
    pub fn append(&self, entry: &FailureEntry) -> Result<(), EmailError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let io_err = |source| EmailError::FailureLog {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).map_err(io_err)?;
        Ok(())
    }
}
