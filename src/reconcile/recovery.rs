use super::output::raw_lines;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, info};
use uuid::Uuid;

const RECOVERY_PREFIX: &str = "mylist_partial_";

/// Keeps the text of every record seen so far and, unless disarmed, dumps
/// it to a fresh file in `dir` when dropped.
#[derive(Debug)]
pub struct RecoveryGuard {
    dir: PathBuf,
    processed: Vec<String>,
    armed: bool,
    written: Option<PathBuf>,
}

impl RecoveryGuard {
    pub fn arm(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            processed: Vec::new(),
            armed: true,
            written: None,
        }
    }

    pub fn track(&mut self, full_text: &str) {
        self.processed.push(full_text.to_string());
    }

    /// Replaces the text of the record tracked last
    pub fn update_last(&mut self, full_text: &str) {
        if let Some(last) = self.processed.last_mut() {
            *last = full_text.to_string();
        }
    }

    pub fn processed(&self) -> usize {
        self.processed.len()
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Writes the recovery file now, at most once. Failures are logged,
    /// never raised. A disarmed guard reports the file written earlier, if any.
    pub fn flush(&mut self) -> Option<PathBuf> {
        if !self.armed {
            return self.written.clone();
        }
        self.armed = false;

        let path = self
            .dir
            .join(format!("{}{}.txt", RECOVERY_PREFIX, Uuid::new_v4()));

        info!("Writing any accepted items so far to: {}", path.display());

        match write_records(&path, &self.processed) {
            Ok(()) => self.written = Some(path),
            Err(err) => error!("Could not write partial file: {}", err),
        }

        self.written.clone()
    }
}

/// A [`RecoveryGuard`] the reconciliation loop and the Ctrl-C handler can
/// both reach, so a forced exit still gets its recovery file.
#[derive(Debug, Clone)]
pub struct SharedRecovery(Arc<Mutex<RecoveryGuard>>);

impl SharedRecovery {
    pub fn arm(dir: &Path) -> Self {
        Self(Arc::new(Mutex::new(RecoveryGuard::arm(dir))))
    }

    fn lock(&self) -> MutexGuard<'_, RecoveryGuard> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn track(&self, full_text: &str) {
        self.lock().track(full_text);
    }

    pub fn update_last(&self, full_text: &str) {
        self.lock().update_last(full_text);
    }

    pub fn processed(&self) -> usize {
        self.lock().processed()
    }

    pub fn disarm(&self) {
        self.lock().disarm();
    }

    pub fn flush(&self) -> Option<PathBuf> {
        self.lock().flush()
    }
}

impl Drop for RecoveryGuard {
    fn drop(&mut self) {
        if self.armed {
            self.flush();
        }
    }
}

fn write_records(path: &Path, texts: &[String]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;

    for text in texts {
        for line in raw_lines(text) {
            writeln!(file, "{}", line)?;
        }
    }

    file.sync_all()
}
