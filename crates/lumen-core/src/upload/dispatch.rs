use rayon::prelude::*;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, error};

use crate::error::Error;
use crate::progress::{self, ProgressHandle};
use crate::upload::expand::{expand, InputKind};
use crate::upload::hasher::{hash_file, HashAlgorithm};
use crate::upload::ledger::HashLedger;
use crate::upload::{UploadOptions, UploadOutcome, UploadReport, UploadStatus, UploadUnit};

static WORKERS_ENV_VAR: &str = "LUMEN_UPLOAD_WORKERS";

/// Transport seam for the actual network upload of one unit. The production
/// implementation is the HTTP client; tests substitute a mock.
pub trait AssetTransport: Sync {
    fn upload_unit(
        &self,
        unit: &UploadUnit,
        progress: &ProgressHandle,
    ) -> Result<UploadOutcome, Error>;
}

/// Upload everything reachable from `path`: a single file directly, a
/// directory or archive expanded and fanned out over a bounded worker pool.
///
/// Batch semantics are best-effort: a unit that fails to hash, read, or
/// upload is logged and omitted from the results; it never aborts siblings.
/// Results are collected in completion order. Single-file inputs surface
/// their error directly instead.
pub fn upload_assets<T: AssetTransport>(
    transport: &T,
    ledger: &HashLedger,
    algo: HashAlgorithm,
    path: &Path,
    options: &UploadOptions,
) -> Result<UploadReport, Error> {
    let expansion = expand(path)?;

    if expansion.kind == InputKind::SingleFile {
        let unit = UploadUnit::new(expansion.files[0].clone(), options.clone());
        let outcome = upload_one(transport, ledger, algo, &unit)?;
        return Ok(UploadReport::Single(outcome));
    }

    // One sidecar cannot describe a whole batch
    let mut batch_options = options.clone();
    batch_options.sidecar_path = None;

    let units: Vec<UploadUnit> = expansion
        .files
        .iter()
        .map(|file| UploadUnit::new(file.clone(), batch_options.clone()))
        .collect();

    let _album = expansion.label.as_deref().map(AlbumGuard::register);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count())
        .build()
        .map_err(|e| Error::Other(format!("Failed to build upload pool: {}", e)))?;

    debug!(
        "Uploading {} files with {} workers",
        units.len(),
        worker_count()
    );

    // Completion order, not submission order
    let results: Mutex<Vec<UploadOutcome>> = Mutex::new(Vec::with_capacity(units.len()));
    pool.install(|| {
        units.par_iter().for_each(|unit| {
            match upload_one(transport, ledger, algo, unit) {
                Ok(outcome) => results.lock().unwrap().push(outcome),
                Err(e) => error!("Error uploading {}: {}", unit.path.display(), e),
            }
        });
    });

    Ok(UploadReport::Many(results.into_inner().unwrap()))
}

/// Upload a single unit: hash, consult the ledger (unless overridden),
/// delegate to the transport, and record the hash on `created`/`replaced`.
pub fn upload_one<T: AssetTransport>(
    transport: &T,
    ledger: &HashLedger,
    algo: HashAlgorithm,
    unit: &UploadUnit,
) -> Result<UploadOutcome, Error> {
    let file_hash = hash_file(algo, &unit.path)?;
    let file_name = unit.file_name();

    if !unit.options.ignore_dedup && ledger.contains(&file_hash) {
        debug!("Skipping {} — fingerprint already in ledger", file_name);
        return Ok(UploadOutcome::skipped(&file_name, &file_hash));
    }

    let total_bytes = fs::metadata(&unit.path)?.len();
    let mut handle = progress::progress_handle(unit.options.show_progress, total_bytes, &file_name);

    match transport.upload_unit(unit, &handle) {
        Ok(outcome) => {
            if matches!(outcome.status, UploadStatus::Created | UploadStatus::Replaced) {
                ledger.add(&file_hash)?;
            }
            let short = &file_hash[..file_hash.len().min(5)];
            handle.finish(true, Some(short));
            Ok(outcome)
        }
        Err(e) => {
            handle.finish(false, None);
            Err(e)
        }
    }
}

/// Worker count for the batch pool: the environment override if set,
/// otherwise the limit the active progress manager was configured with.
fn worker_count() -> usize {
    env::var(WORKERS_ENV_VAR)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(progress::max_workers)
}

/// Registers an album label with the progress display and removes it when
/// dropped, so the label goes away even when the batch unwinds early.
struct AlbumGuard {
    label: String,
}

impl AlbumGuard {
    fn register(label: &str) -> Self {
        progress::add_album(label);
        Self {
            label: label.to_string(),
        }
    }
}

impl Drop for AlbumGuard {
    fn drop(&mut self) {
        progress::remove_album(&self.label);
    }
}
