//! The upload pipeline: content hashing, the dedup ledger, path expansion,
//! and the concurrent dispatcher that ties them to the transport.

pub mod dispatch;
pub mod expand;
pub mod hasher;
pub mod ledger;

pub use dispatch::{upload_assets, upload_one, AssetTransport};
pub use expand::{expand, is_supported_archive, Expansion, InputKind};
pub use hasher::{hash_file, HashAlgorithm, CHUNK_SIZE};
pub use ledger::HashLedger;

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::PathBuf;

use crate::error::Error;

/// One local file plus its upload metadata: the atomic work item of the
/// pipeline. Immutable value data handed to exactly one worker.
#[derive(Debug, Clone)]
pub struct UploadUnit {
    pub path: PathBuf,
    pub options: UploadOptions,
}

impl UploadUnit {
    pub fn new(path: PathBuf, options: UploadOptions) -> Self {
        Self { path, options }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Upload metadata shared by single-file and batch uploads.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub device_asset_id: Option<String>,
    pub device_id: Option<String>,
    pub is_favorite: bool,
    pub is_archived: bool,
    pub file_created_at: Option<DateTime<Utc>>,
    pub file_modified_at: Option<DateTime<Utc>>,
    pub duration: String,
    pub is_read_only: bool,
    /// Sidecar is honored for single-file uploads only; batch expansion
    /// drops it since one sidecar cannot describe many files.
    pub sidecar_path: Option<PathBuf>,
    /// Skip the local ledger check and upload regardless.
    pub ignore_dedup: bool,
    pub show_progress: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            device_asset_id: None,
            device_id: None,
            is_favorite: false,
            is_archived: false,
            file_created_at: None,
            file_modified_at: None,
            duration: "00:00:00.000000".to_string(),
            is_read_only: false,
            sidecar_path: None,
            ignore_dedup: false,
            show_progress: true,
        }
    }
}

/// Terminal status of one upload attempt as reported by the server, plus
/// the local-only `Skipped` produced by a ledger hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Created,
    Replaced,
    Duplicate,
    Skipped,
    Other(String),
}

impl UploadStatus {
    fn from_wire(s: &str) -> Self {
        match s {
            "created" => UploadStatus::Created,
            "replaced" => UploadStatus::Replaced,
            "duplicate" => UploadStatus::Duplicate,
            "skipped" => UploadStatus::Skipped,
            other => UploadStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            UploadStatus::Created => "created",
            UploadStatus::Replaced => "replaced",
            UploadStatus::Duplicate => "duplicate",
            UploadStatus::Skipped => "skipped",
            UploadStatus::Other(s) => s.as_str(),
        }
    }
}

/// Result of attempting to upload one unit. At this boundary the wire shape
/// is a plain mapping; only `id` and `status` are required.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub id: String,
    pub status: UploadStatus,
    pub message: Option<String>,
}

impl UploadOutcome {
    pub fn from_wire(value: &Value) -> Result<Self, Error> {
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Other("Upload response missing 'status'".to_string()))?;
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Self {
            id,
            status: UploadStatus::from_wire(status),
            message,
        })
    }

    pub fn skipped(file_name: &str, hash: &str) -> Self {
        Self {
            id: "skipped".to_string(),
            status: UploadStatus::Skipped,
            message: Some(format!(
                "Asset {} already uploaded (hash: {})",
                file_name, hash
            )),
        }
    }
}

/// Aggregated result of `upload_assets`. The multiplicity mirrors the input
/// class: a single non-archive file yields `Single`, directories and
/// archives yield `Many` even when they contain one file.
#[derive(Debug)]
pub enum UploadReport {
    Single(UploadOutcome),
    Many(Vec<UploadOutcome>),
}

impl UploadReport {
    pub fn outcomes(&self) -> &[UploadOutcome] {
        match self {
            UploadReport::Single(outcome) => std::slice::from_ref(outcome),
            UploadReport::Many(outcomes) => outcomes.as_slice(),
        }
    }

    pub fn count_with_status(&self, status: &UploadStatus) -> usize {
        self.outcomes().iter().filter(|o| &o.status == status).count()
    }
}
