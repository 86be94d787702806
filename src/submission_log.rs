//! Append-only success/failure logs for lead submissions.
//!
//! Each entry is rendered up front and written with one `write_all` while
//! holding an exclusive `flock`, so concurrent submissions (threads or
//! processes) never interleave.

use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::models::LeadSubmission;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// One submission attempt, as written to either log.
#[derive(Debug, Clone)]
pub struct SubmissionLogEntry<'a> {
    pub timestamp: DateTime<Local>,
    pub outcome: Outcome,
    pub payload: &'a LeadSubmission,
    pub error_detail: Option<&'a str>,
}

impl SubmissionLogEntry<'_> {
    /// Renders the entry as a text block terminated by a blank line.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        let timestamp = self.timestamp.format("%Y-%m-%d %H:%M:%S");
        let form_type = self.payload.form_type();
        let payload = self.payload.to_log_json()?;

        let block = match self.outcome {
            Outcome::Success => format!(
                "{} - Успешно отправлена заявка типа: {}\nДанные: {}\n\n",
                timestamp, form_type, payload
            ),
            Outcome::Failure => format!(
                "{} - Ошибка отправки email для заявки типа: {}\nДанные: {}\nОшибка: {}\n\n",
                timestamp,
                form_type,
                payload,
                self.error_detail.unwrap_or("unknown error")
            ),
        };

        Ok(block)
    }
}

/// The pair of log files a submitter writes to.
#[derive(Debug, Clone)]
pub struct SubmissionLog {
    success_path: PathBuf,
    error_path: PathBuf,
}

impl SubmissionLog {
    pub fn new(success_path: impl Into<PathBuf>, error_path: impl Into<PathBuf>) -> Self {
        Self {
            success_path: success_path.into(),
            error_path: error_path.into(),
        }
    }

    pub fn success_path(&self) -> &Path {
        &self.success_path
    }

    pub fn error_path(&self) -> &Path {
        &self.error_path
    }

    /// Appends an entry to the log matching its outcome.
    pub async fn append(&self, entry: &SubmissionLogEntry<'_>) -> io::Result<()> {
        let block = entry
            .render()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let path = match entry.outcome {
            Outcome::Success => self.success_path.clone(),
            Outcome::Failure => self.error_path.clone(),
        };

        tokio::task::spawn_blocking(move || append_locked(&path, block.as_bytes()))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }
}

/// Opens `path` for appending, takes an exclusive lock and writes `bytes` at once.
/// The lock is released when the file is closed.
fn append_locked(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    flock_exclusive(&file)?;
    file.write_all(bytes)?;
    file.flush()
}

/// Blocks until an exclusive flock is held on `file`.
fn flock_exclusive(file: &File) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        loop {
            // SAFETY: fd is a valid descriptor owned by `file` for the duration of the call.
            #[allow(unsafe_code)]
            let result = unsafe { libc::flock(fd, libc::LOCK_EX) };
            if result == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = file;
        Ok(())
    }
}
