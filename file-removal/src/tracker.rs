/*!
Registry of paths pending deletion, drained on request, on drop, and at exit
*/

use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;
use tracing::trace;

use crate::{
    removal::{Removal, remove_path},
    shutdown,
};

/// Set of observed paths shared between a tracker and the exit hook
#[derive(Default)]
pub(crate) struct Registry {
    paths: Mutex<HashSet<PathBuf>>,
}

impl Registry {
    /// Delete every observed path and empty the set; returns how many were observed
    fn drain(&self) -> usize {
        let mut paths = self.paths.lock();
        drain_locked(&mut paths)
    }

    /// Like [`Registry::drain`], but gives up if the lock is not free within `wait`
    pub(crate) fn drain_within(&self, wait: Duration) -> Option<usize> {
        let mut paths = self.paths.try_lock_for(wait)?;
        Some(drain_locked(&mut paths))
    }
}

// Deletions run under the lock so a concurrent re-observe of the same path
// cannot have its fresh file removed by a stale drain.
fn drain_locked(paths: &mut HashSet<PathBuf>) -> usize {
    let count = paths.len();
    for path in paths.drain() {
        let _ = remove_path(&path);
    }
    count
}

/// Tracks files that must not outlive the current work.
///
/// Every observed path is removed exactly once in effect, by whichever comes
/// first: [`FileRemoval::delete`], [`FileRemoval::clean`], dropping the
/// tracker, or normal process exit. Removal failures are swallowed.
pub struct FileRemoval {
    registry: Arc<Registry>,
}

impl FileRemoval {
    pub fn new() -> Self {
        let registry = Arc::new(Registry::default());
        shutdown::register(&registry);
        Self { registry }
    }

    /// Start tracking `path`. Observing a path twice is the same as once.
    pub fn observe(&self, path: impl Into<PathBuf>) {
        self.registry.paths.lock().insert(path.into());
    }

    /// Stop tracking `path` and remove it from disk, whether or not it was observed
    pub fn delete(&self, path: impl AsRef<Path>) -> Removal {
        let path = path.as_ref();
        let mut paths = self.registry.paths.lock();
        paths.remove(path);
        remove_path(path)
    }

    /// Remove every observed file. A no-op when nothing is observed.
    pub fn clean(&self) {
        self.registry.drain();
    }

    /// Stop tracking `path` without touching the disk.
    ///
    /// Returns `false` if the path was not observed.
    pub fn release(&self, path: impl AsRef<Path>) -> bool {
        self.registry.paths.lock().remove(path.as_ref())
    }

    pub fn is_observed(&self, path: impl AsRef<Path>) -> bool {
        self.registry.paths.lock().contains(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.registry.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.paths.lock().is_empty()
    }

    /// Snapshot of the observed paths, in no particular order
    pub fn observed(&self) -> Vec<PathBuf> {
        self.registry.paths.lock().iter().cloned().collect()
    }
}

impl Default for FileRemoval {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FileRemoval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRemoval")
            .field("observed", &self.len())
            .finish()
    }
}

impl Drop for FileRemoval {
    fn drop(&mut self) {
        let drained = self.registry.drain();
        shutdown::unregister(&self.registry);
        if drained > 0 {
            trace!(drained, "file removal tracker dropped");
        }
    }
}
