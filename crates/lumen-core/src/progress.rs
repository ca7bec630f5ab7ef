use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::io::Read;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use crate::config::DEFAULT_UPLOAD_WORKERS;

/// Consolidated live display for concurrent uploads.
///
/// One per-file progress bar per in-flight upload plus a header line showing
/// the active album labels. All shared state (started flag, task registry,
/// label list) sits behind a single mutex; the render side (indicatif) only
/// ever sees consistent snapshots taken inside that lock.
pub struct ProgressManager {
    max_workers: usize,
    hidden: bool,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    started: bool,
    multi: Option<MultiProgress>,
    header: Option<ProgressBar>,
    albums: Vec<String>,
    tasks: HashMap<String, ProgressBar>,
}

impl ProgressManager {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            hidden: false,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// A manager that never draws. Used by tests and non-tty contexts.
    pub fn hidden(max_workers: usize) -> Self {
        Self {
            max_workers,
            hidden: true,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Concurrency limit this manager was configured for; the upload
    /// dispatcher sizes its per-batch worker pool from this.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Register a task in the live display, lazily starting the display on
    /// the first call. The returned handle reports byte progress and the
    /// terminal done/failed state for the task.
    pub fn begin(&self, filename: &str, total_bytes: u64) -> ProgressHandle {
        let mut inner = self.inner.lock().unwrap();

        if !inner.started {
            let multi = if self.hidden {
                MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
            } else {
                MultiProgress::new()
            };
            let header = multi.add(ProgressBar::new_spinner());
            header.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold.cyan}{msg}")
                    .unwrap()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            header.set_prefix("Uploading ");
            header.set_message(group_label_text(&inner.albums));
            header.enable_steady_tick(Duration::from_millis(100));
            inner.multi = Some(multi);
            inner.header = Some(header);
            inner.started = true;
        }

        let bar = inner
            .multi
            .as_ref()
            .expect("display started above")
            .add(ProgressBar::new(total_bytes));
        bar.set_style(
            ProgressStyle::with_template(
                "  {msg:.cyan} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
            )
            .unwrap()
            .progress_chars("━╸─"),
        );
        bar.set_message(filename.to_string());
        inner.tasks.insert(filename.to_string(), bar.clone());

        ProgressHandle {
            bar: Some(bar),
            name: filename.to_string(),
            finished: false,
        }
    }

    /// Add an album label to the display header.
    pub fn add_group(&self, label: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.albums.push(label.trim().to_string());
        let text = group_label_text(&inner.albums);
        if let Some(header) = inner.header.as_ref() {
            header.set_message(text);
        }
    }

    /// Remove an album label from the display header.
    pub fn remove_group(&self, label: &str) {
        let mut inner = self.inner.lock().unwrap();
        let label = label.trim();
        if let Some(pos) = inner.albums.iter().position(|a| a == label) {
            inner.albums.remove(pos);
        }
        let text = group_label_text(&inner.albums);
        if let Some(header) = inner.header.as_ref() {
            header.set_message(text);
        }
    }

    /// The header text as currently displayed (without the prefix).
    pub fn header_text(&self) -> String {
        let inner = self.inner.lock().unwrap();
        group_label_text(&inner.albums)
    }

    pub fn is_started(&self) -> bool {
        self.inner.lock().unwrap().started
    }

    /// Stop the live display and reset the started flag so the manager can
    /// be reused for a later batch.
    pub fn teardown(&self) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.started {
            return;
        }
        if let Some(header) = inner.header.take() {
            header.finish_and_clear();
        }
        for (_, bar) in inner.tasks.drain() {
            bar.finish_and_clear();
        }
        if let Some(multi) = inner.multi.take() {
            let _ = multi.clear();
        }
        inner.started = false;
    }
}

fn group_label_text(albums: &[String]) -> String {
    if albums.is_empty() {
        return "Assets".to_string();
    }
    let mut text = albums
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if albums.len() > 3 {
        text.push_str("...");
    }
    text
}

/// Handle for one upload's progress: `advance` during transfer, `finish`
/// on completion. Dropping an unfinished handle finishes it successfully,
/// so the common path can rely on scope exit; failure paths call
/// `finish(false, ..)` explicitly before propagating their error.
pub struct ProgressHandle {
    bar: Option<ProgressBar>,
    name: String,
    finished: bool,
}

impl ProgressHandle {
    /// A handle whose operations do nothing, returned when progress
    /// reporting is disabled. Callers never branch on enablement.
    pub fn noop() -> Self {
        Self {
            bar: None,
            name: String::new(),
            finished: false,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.bar.is_none()
    }

    pub fn advance(&self, delta: u64) {
        if let Some(bar) = self.bar.as_ref() {
            bar.inc(delta);
        }
    }

    pub fn finish(&mut self, success: bool, detail: Option<&str>) {
        if self.finished {
            return;
        }
        self.finished = true;
        let Some(bar) = self.bar.as_ref() else {
            return;
        };
        if success {
            let status = match detail {
                Some(d) => format!("{} — done ({})", self.name, d),
                None => format!("{} — done", self.name),
            };
            bar.finish_with_message(status);
        } else {
            bar.abandon_with_message(format!("{} — failed", self.name));
        }
    }

    /// Wrap a reader so bytes read are reported as transfer progress.
    pub fn wrap<R: Read>(&self, inner: R) -> ProgressReader<R> {
        ProgressReader {
            inner,
            bar: self.bar.clone(),
        }
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        self.finish(true, None);
    }
}

pub struct ProgressReader<R> {
    inner: R,
    bar: Option<ProgressBar>,
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if let Some(bar) = self.bar.as_ref() {
            bar.inc(n as u64);
        }
        Ok(n)
    }
}

lazy_static::lazy_static! {
    static ref MANAGER: RwLock<ProgressManager> =
        RwLock::new(ProgressManager::new(DEFAULT_UPLOAD_WORKERS));
}

/// Get a progress handle from the process-wide manager, or a no-op handle
/// when reporting is disabled.
pub fn progress_handle(enabled: bool, total_bytes: u64, filename: &str) -> ProgressHandle {
    if !enabled {
        return ProgressHandle::noop();
    }
    MANAGER.read().unwrap().begin(filename, total_bytes)
}

pub fn add_album(label: &str) {
    MANAGER.read().unwrap().add_group(label);
}

pub fn remove_album(label: &str) {
    MANAGER.read().unwrap().remove_group(label);
}

/// Stop the live display; the manager restarts on the next `begin`.
pub fn clear_progress() {
    MANAGER.read().unwrap().teardown();
}

/// Tear down and replace the process-wide manager with one configured for a
/// new concurrency limit.
pub fn set_max_workers(max_workers: usize) {
    let mut guard = MANAGER.write().unwrap();
    guard.teardown();
    *guard = ProgressManager::new(max_workers);
}

/// Concurrency limit of the active process-wide manager.
pub fn max_workers() -> usize {
    MANAGER.read().unwrap().max_workers()
}
