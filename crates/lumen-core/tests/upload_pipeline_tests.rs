use lumen_core::error::Error;
use lumen_core::progress::ProgressHandle;
use lumen_core::upload::{
    upload_assets, upload_one, AssetTransport, HashAlgorithm, HashLedger, UploadOptions,
    UploadOutcome, UploadReport, UploadStatus, UploadUnit,
};
use std::collections::HashSet;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

/// Records every unit handed over and fails the ones whose file name is in
/// the `failing` set.
struct MockTransport {
    calls: AtomicUsize,
    uploaded: Mutex<Vec<String>>,
    failing: HashSet<String>,
    status: UploadStatus,
}

impl MockTransport {
    fn new() -> Self {
        Self::with_status(UploadStatus::Created)
    }

    fn with_status(status: UploadStatus) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            uploaded: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            status,
        }
    }

    fn failing_on(names: &[&str]) -> Self {
        let mut transport = Self::new();
        transport.failing = names.iter().map(|n| n.to_string()).collect();
        transport
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AssetTransport for MockTransport {
    fn upload_unit(
        &self,
        unit: &UploadUnit,
        _progress: &ProgressHandle,
    ) -> Result<UploadOutcome, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = unit.file_name();
        if self.failing.contains(&name) {
            return Err(Error::Api {
                status: 500,
                endpoint: "AssetUpload".to_string(),
                message: format!("simulated failure for {}", name),
            });
        }
        self.uploaded.lock().unwrap().push(name.clone());
        Ok(UploadOutcome {
            id: format!("asset-{}", name),
            status: self.status.clone(),
            message: None,
        })
    }
}

fn quiet_options() -> UploadOptions {
    UploadOptions {
        show_progress: false,
        ..UploadOptions::default()
    }
}

fn ledger_in(dir: &TempDir) -> HashLedger {
    HashLedger::open(Some(dir.path().join("ledger.db"))).unwrap()
}

#[test]
fn test_single_file_upload_records_hash() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("one.jpg");
    fs::write(&path, b"picture bytes").unwrap();

    let ledger = ledger_in(&dir);
    let transport = MockTransport::new();

    let report = upload_assets(
        &transport,
        &ledger,
        HashAlgorithm::Xx64,
        &path,
        &quiet_options(),
    )
    .unwrap();

    assert!(matches!(report, UploadReport::Single(_)));
    assert_eq!(transport.call_count(), 1);
    assert_eq!(report.count_with_status(&UploadStatus::Created), 1);
    assert_eq!(ledger.len(), 1);
}

#[test]
fn test_second_upload_of_same_content_is_skipped_locally() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("one.jpg");
    fs::write(&path, b"picture bytes").unwrap();

    let ledger = ledger_in(&dir);
    let transport = MockTransport::new();
    let options = quiet_options();

    upload_assets(&transport, &ledger, HashAlgorithm::Xx64, &path, &options).unwrap();
    let second = upload_assets(&transport, &ledger, HashAlgorithm::Xx64, &path, &options).unwrap();

    // The dedup hit never reaches the transport
    assert_eq!(transport.call_count(), 1);
    assert_eq!(second.count_with_status(&UploadStatus::Skipped), 1);
}

#[test]
fn test_ignore_dedup_bypasses_the_ledger() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("one.jpg");
    fs::write(&path, b"picture bytes").unwrap();

    let ledger = ledger_in(&dir);
    let transport = MockTransport::new();

    let mut options = quiet_options();
    upload_assets(&transport, &ledger, HashAlgorithm::Xx64, &path, &options).unwrap();

    options.ignore_dedup = true;
    upload_assets(&transport, &ledger, HashAlgorithm::Xx64, &path, &options).unwrap();
    assert_eq!(transport.call_count(), 2);
}

#[test]
fn test_duplicate_status_is_not_recorded_in_ledger() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("one.jpg");
    fs::write(&path, b"picture bytes").unwrap();

    let ledger = ledger_in(&dir);
    let transport = MockTransport::with_status(UploadStatus::Duplicate);

    let report = upload_assets(
        &transport,
        &ledger,
        HashAlgorithm::Xx64,
        &path,
        &quiet_options(),
    )
    .unwrap();

    assert_eq!(report.count_with_status(&UploadStatus::Duplicate), 1);
    // Server-side duplicates pass through without a local ledger write
    assert!(ledger.is_empty());
}

#[test]
fn test_directory_upload_reports_many() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("batch");
    fs::create_dir(&input).unwrap();
    for i in 0..5 {
        fs::write(input.join(format!("img-{}.jpg", i)), format!("data {}", i)).unwrap();
    }

    let ledger = ledger_in(&dir);
    let transport = MockTransport::new();

    let report = upload_assets(
        &transport,
        &ledger,
        HashAlgorithm::Xx64,
        &input,
        &quiet_options(),
    )
    .unwrap();

    assert!(matches!(report, UploadReport::Many(_)));
    assert_eq!(report.outcomes().len(), 5);
    assert_eq!(transport.call_count(), 5);
    assert_eq!(ledger.len(), 5);
}

#[test]
fn test_single_file_directory_still_reports_many() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("batch");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("only.jpg"), b"solo").unwrap();

    let ledger = ledger_in(&dir);
    let transport = MockTransport::new();

    let report = upload_assets(
        &transport,
        &ledger,
        HashAlgorithm::Xx64,
        &input,
        &quiet_options(),
    )
    .unwrap();

    assert!(matches!(report, UploadReport::Many(ref v) if v.len() == 1));
}

#[test]
fn test_batch_failures_are_isolated() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("batch");
    fs::create_dir(&input).unwrap();
    for i in 0..5 {
        fs::write(input.join(format!("img-{}.jpg", i)), format!("data {}", i)).unwrap();
    }

    let ledger = ledger_in(&dir);
    let transport = MockTransport::failing_on(&["img-1.jpg", "img-3.jpg"]);

    let report = upload_assets(
        &transport,
        &ledger,
        HashAlgorithm::Xx64,
        &input,
        &quiet_options(),
    )
    .unwrap();

    // All five attempted, failures logged and omitted
    assert_eq!(transport.call_count(), 5);
    assert_eq!(report.outcomes().len(), 3);
    assert_eq!(report.count_with_status(&UploadStatus::Created), 3);
    assert_eq!(ledger.len(), 3);
}

#[test]
fn test_single_file_failure_propagates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.jpg");
    fs::write(&path, b"doomed").unwrap();

    let ledger = ledger_in(&dir);
    let transport = MockTransport::failing_on(&["bad.jpg"]);

    let result = upload_assets(
        &transport,
        &ledger,
        HashAlgorithm::Xx64,
        &path,
        &quiet_options(),
    );

    assert!(matches!(result, Err(Error::Api { status: 500, .. })));
    assert!(ledger.is_empty());
}

#[test]
fn test_identical_content_in_batch_uploads_once() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("batch");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("a.jpg"), b"same bytes").unwrap();
    fs::write(input.join("b.jpg"), b"same bytes").unwrap();

    let ledger = ledger_in(&dir);
    let transport = MockTransport::new();

    let report = upload_assets(
        &transport,
        &ledger,
        HashAlgorithm::Xx64,
        &input,
        &quiet_options(),
    )
    .unwrap();

    // One of the two wins the race, the other is skipped or uploaded
    // depending on interleaving; the ledger ends with exactly one entry.
    assert_eq!(report.outcomes().len(), 2);
    assert_eq!(ledger.len(), 1);
}

#[test]
fn test_upload_one_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let ledger = ledger_in(&dir);
    let transport = MockTransport::new();

    let unit = UploadUnit::new(dir.path().join("ghost.jpg"), quiet_options());
    let result = upload_one(&transport, &ledger, HashAlgorithm::Xx64, &unit);
    assert!(matches!(result, Err(Error::FileNotFound(_))));
    assert_eq!(transport.call_count(), 0);
}
