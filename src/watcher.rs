//! Directory watches for template and partial roots.
//! Watches poll a snapshot of the template files under a root and report the
//! difference as created, changed or deleted events.

use crate::scanner::template_name;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

/// Which kind of root a watch covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchScope {
    Template,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Changed,
    Deleted,
}

/// A single change observed by a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub scope: WatchScope,
    pub path: PathBuf,
}

type Snapshot = BTreeMap<PathBuf, (Option<SystemTime>, u64)>;

/// A polling watch over one root and its descendants.
#[derive(Debug)]
pub struct DirectoryWatch {
    root: PathBuf,
    scope: WatchScope,
    extension: String,
    excluded: Vec<PathBuf>,
    snapshot: Snapshot,
}

impl DirectoryWatch {
    /// Creates a watch and records the current state of the root as its baseline.
    ///
    /// The root does not need to exist yet; files appearing later are reported as
    /// created.
    pub fn new<P: Into<PathBuf>>(root: P, scope: WatchScope, extension: &str) -> Self {
        Self::excluding(root, scope, extension, Vec::new())
    }

    /// Like `new`, but files under any of the `excluded` directories are never
    /// reported.
    pub fn excluding<P: Into<PathBuf>>(
        root: P,
        scope: WatchScope,
        extension: &str,
        excluded: Vec<PathBuf>,
    ) -> Self {
        let root = root.into();
        let snapshot = take_snapshot(&root, extension, &excluded);
        Self { root, scope, extension: extension.to_string(), excluded, snapshot }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scope(&self) -> WatchScope {
        self.scope
    }

    /// Compares the root against the last snapshot and returns what changed.
    pub fn poll(&mut self) -> Vec<FileEvent> {
        let current = take_snapshot(&self.root, &self.extension, &self.excluded);
        let mut events = Vec::new();

        for (path, stamp) in &current {
            match self.snapshot.get(path) {
                None => events.push(self.event(FileEventKind::Created, path)),
                Some(previous) if previous != stamp => {
                    events.push(self.event(FileEventKind::Changed, path))
                }
                Some(_) => {}
            }
        }
        for path in self.snapshot.keys() {
            if !current.contains_key(path) {
                events.push(self.event(FileEventKind::Deleted, path));
            }
        }

        self.snapshot = current;
        events
    }

    fn event(&self, kind: FileEventKind, path: &Path) -> FileEvent {
        FileEvent { kind, scope: self.scope, path: path.to_path_buf() }
    }
}

fn take_snapshot(root: &Path, extension: &str, excluded: &[PathBuf]) -> Snapshot {
    let mut snapshot = Snapshot::new();
    if !root.is_dir() {
        return snapshot;
    }
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !excluded.iter().any(|dir| entry.path() == dir.as_path())
        });
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Watch skipped a path under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() || template_name(entry.path(), extension).is_none() {
            continue;
        }
        match entry.metadata() {
            Ok(meta) => {
                snapshot.insert(entry.path().to_path_buf(), (meta.modified().ok(), meta.len()));
            }
            Err(e) => debug!("Watch cannot stat {}: {}", entry.path().display(), e),
        }
    }
    snapshot
}

/// Plans the watches for a workspace: every template root, plus every partial root
/// not already inside a template root.
///
/// A partial root that contains template roots skips them, so each file is
/// watched once.
pub fn plan_watches(
    template_dirs: &[PathBuf],
    partial_dirs: &[PathBuf],
    extension: &str,
) -> Vec<DirectoryWatch> {
    let mut watches: Vec<DirectoryWatch> = template_dirs
        .iter()
        .map(|dir| DirectoryWatch::new(dir.clone(), WatchScope::Template, extension))
        .collect();

    for dir in partial_dirs {
        if template_dirs.iter().any(|t| dir.starts_with(t)) {
            continue;
        }
        let nested: Vec<PathBuf> = template_dirs.iter().filter(|t| t.starts_with(dir)).cloned().collect();
        watches.push(DirectoryWatch::excluding(dir.clone(), WatchScope::Partial, extension, nested));
    }
    watches
}

/// Owns the polling thread of a set of watches.
///
/// Dropping the handle stops and joins the thread.
pub struct WatchHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Starts polling `watches` every `interval`.
    ///
    /// `on_event` is invoked for every event; returning `false` stops the watch.
    pub fn spawn<F>(mut watches: Vec<DirectoryWatch>, interval: Duration, mut on_event: F) -> Self
    where
        F: FnMut(FileEvent) -> bool + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stopped = Arc::clone(&stop);

        info!("Watching {} director(y/ies)", watches.len());
        let thread = thread::spawn(move || {
            while !stopped.load(Ordering::SeqCst) {
                thread::park_timeout(interval);
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
                for watch in watches.iter_mut() {
                    for event in watch.poll() {
                        debug!("{:?} {:?}: {}", event.scope, event.kind, event.path.display());
                        if !on_event(event) {
                            stopped.store(true, Ordering::SeqCst);
                            return;
                        }
                    }
                }
            }
        });

        Self { stop, thread: Some(thread) }
    }

    /// Stops polling and waits for the thread to finish.
    pub fn release(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            if thread.join().is_err() {
                warn!("Watch thread panicked");
            }
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
