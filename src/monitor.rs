//! Folder monitoring.
//!
//! A `notify` watcher forwards filesystem events into a channel; a single
//! worker thread processes newly created files with the configured
//! extension. Invalid files are logged and never stop the worker.
//!
//! ```rust,ignore
//! let monitor = Monitor::start(processor, "data/", Duration::from_millis(250))?;
//! // ... wait for Ctrl-C ...
//! monitor.shutdown();
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, unbounded, Receiver, Sender};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::MonitorError;
use crate::processor::{FileProcessor, ProcessOutcome};

/// Running folder watch. Dropping it without [`Monitor::shutdown`] also
/// stops and joins the worker.
pub struct Monitor {
    dir: PathBuf,
    /// Held to keep the watch registered; dropped first on shutdown.
    watcher: Option<RecommendedWatcher>,
    shutdown_tx: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl Monitor {
    pub fn start(
        processor: Arc<FileProcessor>,
        dir: impl Into<PathBuf>,
        settle_delay: Duration,
    ) -> Result<Self, MonitorError> {
        let dir = dir.into();
        let (event_tx, event_rx) = unbounded::<notify::Result<Event>>();
        let (shutdown_tx, shutdown_rx) = unbounded::<()>();

        let mut watcher = notify::recommended_watcher(move |res| {
            // Receiver gone means the worker already stopped.
            let _ = event_tx.send(res);
        })
        .map_err(|source| MonitorError::Watch {
            path: dir.clone(),
            source,
        })?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|source| MonitorError::Watch {
                path: dir.clone(),
                source,
            })?;

        let worker = thread::Builder::new()
            .name("monitor-worker".to_string())
            .spawn(move || run_worker(&processor, &event_rx, &shutdown_rx, settle_delay))?;

        log::info!("Monitoring folder: {}", dir.display());
        Ok(Monitor {
            dir,
            watcher: Some(watcher),
            shutdown_tx,
            worker: Some(worker),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stop watching, then signal and join the worker.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.watcher.take().is_some() {
            log::debug!("watcher for {} dropped", self.dir.display());
        }
        let _ = self.shutdown_tx.send(());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("monitor worker panicked");
            }
            log::info!("Stopped monitoring {}", self.dir.display());
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(
    processor: &FileProcessor,
    events: &Receiver<notify::Result<Event>>,
    shutdown: &Receiver<()>,
    settle_delay: Duration,
) {
    loop {
        select! {
            recv(shutdown) -> _ => break,
            recv(events) -> msg => match msg {
                Ok(Ok(event)) => {
                    for path in created_files(&event, processor) {
                        if !settle_delay.is_zero() {
                            thread::sleep(settle_delay);
                        }
                        handle_new_file(processor, &path);
                    }
                }
                Ok(Err(e)) => log::warn!("File watcher error: {e}"),
                // Watcher dropped.
                Err(_) => break,
            },
        }
    }
}

/// Newly created files this processor should handle.
pub fn created_files(event: &Event, processor: &FileProcessor) -> Vec<PathBuf> {
    if !matches!(event.kind, EventKind::Create(_)) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter(|p| processor.accepts(p) && !p.is_dir())
        .cloned()
        .collect()
}

fn handle_new_file(processor: &FileProcessor, path: &Path) {
    match processor.process_file(path) {
        Ok(ProcessOutcome::Recorded(record)) => {
            log::info!("Recorded {}", record.filename);
        }
        Ok(ProcessOutcome::Skipped { .. }) => {}
        Err(e) => log::error!("Failed to process file: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::calibration::Calibration;
    use crate::data::model::Variant;
    use crate::store::SummaryStore;
    use notify::event::{CreateKind, ModifyKind};
    use std::time::Instant;

    fn processor(dir: &Path) -> Arc<FileProcessor> {
        let store = Arc::new(SummaryStore::new(dir.join("summary.csv"), Variant::Delimited));
        Arc::new(
            FileProcessor::new(
                Variant::Delimited,
                "txt",
                Calibration::current_intercept(1.0, 0.0).unwrap(),
                store,
            )
            .unwrap(),
        )
    }

    #[test]
    fn only_created_matching_files_are_picked() {
        let dir = tempfile::tempdir().unwrap();
        let proc = processor(dir.path());
        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(dir.path().join("a.txt"))
            .add_path(dir.path().join("b.pssession"));
        assert_eq!(created_files(&created, &proc), vec![dir.path().join("a.txt")]);

        let modified = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(dir.path().join("a.txt"));
        assert!(created_files(&modified, &proc).is_empty());
    }

    #[test]
    fn shutdown_joins_idle_worker() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = Monitor::start(processor(dir.path()), dir.path(), Duration::ZERO).unwrap();
        assert_eq!(monitor.dir(), dir.path());
        monitor.shutdown();
    }

    #[test]
    fn missing_directory_fails_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let result = Monitor::start(processor(dir.path()), &missing, Duration::ZERO);
        assert!(matches!(result, Err(MonitorError::Watch { .. })));
    }

    #[test]
    fn new_file_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let proc = processor(dir.path());
        let store = Arc::clone(proc.store());
        let monitor = Monitor::start(proc, dir.path(), Duration::from_millis(100)).unwrap();

        let staging = tempfile::tempdir().unwrap();
        let staged = staging.path().join("cv.txt");
        std::fs::write(&staged, "0.1 -2.5\n0.2 1.0\n").unwrap();
        std::fs::copy(&staged, dir.path().join("cv.txt")).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut rows = Vec::new();
        while Instant::now() < deadline {
            rows = store.load_all().unwrap_or_default();
            if !rows.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
        monitor.shutdown();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].filename, "cv.txt");
        assert_eq!(rows[0].metric_a, 2.5);
    }
}
