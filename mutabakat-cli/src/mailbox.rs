//! Mailbox contract used by the sync cycle, plus a directory-backed mailbox
//! for replaying exported notification emails.
//!
//! Directory layout: one JSON-encoded [`EmailMessage`] per `*.json` file,
//! optionally under a sub-directory named after the mailbox.

use async_trait::async_trait;
use chrono::NaiveDate;
use mutabakat_ingest::EmailMessage;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DEFAULT_MAILBOX;

pub const LOCK_FILE: &str = ".mutabakat.lock";

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("connecting to mailbox: {0}")]
    Connect(String),

    #[error("opening mailbox {name}: {reason}")]
    Open { name: String, reason: String },

    #[error("fetching messages: {0}")]
    Fetch(String),

    #[error("mailbox is locked by another sync ({0})")]
    Locked(PathBuf),

    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    #[error("mailbox i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MailboxError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MailboxError::Connect(_) | MailboxError::Fetch(_) | MailboxError::Timeout { .. }
        )
    }
}

/// Which messages to fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchCriteria {
    /// Only messages dated on or after this day (UTC)
    pub since: Option<NaiveDate>,
    pub limit: usize,
}

#[async_trait]
pub trait Mailbox: Send + Sync {
    async fn connect(&self) -> Result<(), MailboxError>;
    async fn open(&self, name: &str) -> Result<(), MailboxError>;
    /// Take the exclusive lock for one fetch cycle.
    async fn lock(&self) -> Result<(), MailboxError>;
    async fn unlock(&self) -> Result<(), MailboxError>;
    async fn fetch(&self, criteria: &FetchCriteria) -> Result<Vec<EmailMessage>, MailboxError>;
}

#[derive(Debug, Default)]
struct DirState {
    folder: Option<PathBuf>,
    lock: Option<PathBuf>,
}

/// Mailbox over a directory of exported messages.
#[derive(Debug)]
pub struct DirMailbox {
    root: PathBuf,
    state: Mutex<DirState>,
}

impl DirMailbox {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: Mutex::new(DirState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, DirState> {
        // state is plain data, so a poisoned guard is still consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn folder(&self) -> Result<PathBuf, MailboxError> {
        self.state().folder.clone().ok_or_else(|| MailboxError::Open {
            name: self.root.display().to_string(),
            reason: "mailbox not opened".to_string(),
        })
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> MailboxError + '_ {
    move |source| MailboxError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl Mailbox for DirMailbox {
    async fn connect(&self) -> Result<(), MailboxError> {
        let meta = tokio::fs::metadata(&self.root)
            .await
            .map_err(|e| MailboxError::Connect(format!("{}: {e}", self.root.display())))?;
        if !meta.is_dir() {
            return Err(MailboxError::Connect(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }

    async fn open(&self, name: &str) -> Result<(), MailboxError> {
        let candidate = self.root.join(name);
        let folder = if tokio::fs::metadata(&candidate)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            candidate
        } else if name == DEFAULT_MAILBOX {
            self.root.clone()
        } else {
            return Err(MailboxError::Open {
                name: name.to_string(),
                reason: format!("no such folder under {}", self.root.display()),
            });
        };
        debug!(folder = %folder.display(), "mailbox opened");
        self.state().folder = Some(folder);
        Ok(())
    }

    async fn lock(&self) -> Result<(), MailboxError> {
        let path = self.folder()?.join(LOCK_FILE);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(_) => {
                self.state().lock = Some(path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(MailboxError::Locked(path)),
            Err(e) => Err(io_err(&path)(e)),
        }
    }

    async fn unlock(&self) -> Result<(), MailboxError> {
        let held = self.state().lock.take();
        if let Some(path) = held {
            tokio::fs::remove_file(&path).await.map_err(io_err(&path))?;
        }
        Ok(())
    }

    async fn fetch(&self, criteria: &FetchCriteria) -> Result<Vec<EmailMessage>, MailboxError> {
        let folder = self.folder()?;
        let mut entries = tokio::fs::read_dir(&folder)
            .await
            .map_err(|e| MailboxError::Fetch(format!("{}: {e}", folder.display())))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MailboxError::Fetch(format!("{}: {e}", folder.display())))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut messages = Vec::new();
        for path in paths {
            let bytes = tokio::fs::read(&path).await.map_err(io_err(&path))?;
            let message: EmailMessage = match serde_json::from_slice(&bytes) {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable message file");
                    continue;
                }
            };
            if criteria
                .since
                .is_some_and(|since| message.date.date_naive() < since)
            {
                continue;
            }
            messages.push(message);
        }

        messages.sort_by_key(|m| m.date);
        if criteria.limit > 0 {
            messages.truncate(criteria.limit);
        }
        Ok(messages)
    }
}
