use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::error::Error;

static DEFAULT_LEDGER_DIR: &str = ".lumen";
static DEFAULT_LEDGER_FILE: &str = "uploaded_assets.db";

/// Persistent set of fingerprints of files already uploaded.
///
/// On-disk format is the compatibility contract: a UTF-8 text file with one
/// lowercase hex fingerprint per line, no header, append-only. An in-memory
/// set mirrors the file so membership checks never touch disk. One mutex
/// guards both; writes go to disk first, then memory, so a crash between the
/// two never leaves disk behind memory. Single-process multi-thread use only.
pub struct HashLedger {
    path: PathBuf,
    inner: Mutex<LedgerInner>,
}

struct LedgerInner {
    file: File,
    hashes: HashSet<String>,
}

impl HashLedger {
    /// Open (creating if absent) the ledger at `path`, or at
    /// `~/.lumen/uploaded_assets.db` when no path is given. Filesystem
    /// errors during initialization propagate; they are not retried.
    pub fn open(path: Option<PathBuf>) -> Result<Self, Error> {
        let path = match path {
            Some(p) => p,
            None => default_ledger_path()?,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let hashes: HashSet<String> = if path.exists() {
            fs::read_to_string(&path)?
                .lines()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect()
        } else {
            HashSet::new()
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(
            "Hash ledger at {} loaded with {} entries",
            path.display(),
            hashes.len()
        );

        Ok(Self {
            path,
            inner: Mutex::new(LedgerInner { file, hashes }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True iff this fingerprint has been recorded before. Never errors;
    /// reads go through the in-memory mirror only.
    pub fn contains(&self, hash: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.hashes.contains(hash)
    }

    /// Record a fingerprint. Idempotent: a hash already present is a silent
    /// no-op, so the backing file never accumulates duplicate lines.
    pub fn add(&self, hash: &str) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        if inner.hashes.contains(hash) {
            return Ok(());
        }
        writeln!(inner.file, "{}", hash)?;
        inner.file.flush()?;
        inner.hashes.insert(hash.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn default_ledger_path() -> Result<PathBuf, Error> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Other("Could not determine home directory".to_string()))?;
    Ok(home.join(DEFAULT_LEDGER_DIR).join(DEFAULT_LEDGER_FILE))
}
