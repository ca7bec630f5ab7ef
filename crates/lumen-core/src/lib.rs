//! Client library for a Lumen photo/video server.
//!
//! The crate is organized around the upload pipeline in [`upload`] (content
//! hashing, the persistent dedup ledger, path/archive expansion, and the
//! concurrent dispatcher), the blocking HTTP transport in [`client`], typed
//! endpoint facades in [`api`], and shared progress display in [`progress`].

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod progress;
pub mod upload;

pub use client::{Client, ClientBuilder, SearchQuery};
pub use config::{load_configuration, AppConfig, DEFAULT_UPLOAD_WORKERS};
pub use error::Error;
pub use upload::{
    expand, hash_file, upload_assets, upload_one, AssetTransport, HashAlgorithm, HashLedger,
    UploadOptions, UploadOutcome, UploadReport, UploadStatus, UploadUnit,
};
