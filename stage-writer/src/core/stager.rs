/*!
Atomic writes through staging files that are cleaned up on every exit path
*/

use std::{
    ffi::OsString,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use file_removal::FileRemoval;
use tracing::{debug, info, warn};

use crate::core::{config::StagingConfig, error::StagerError, report::WriteReport};

/// Writes targets via staging files tracked for removal
pub struct Stager {
    config: StagingConfig,
    removal: FileRemoval,
    sequence: AtomicU64,
    interrupted: Arc<AtomicBool>,
}

impl Stager {
    pub fn new(config: StagingConfig) -> Self {
        Self {
            config,
            removal: FileRemoval::new(),
            sequence: AtomicU64::new(0),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask in-flight and future writes to stop before replacing their target.
    ///
    /// A write that has already renamed its staging file still succeeds.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn removal(&self) -> &FileRemoval {
        &self.removal
    }

    /// Staging path for `target`: `.<name>.<pid>.<seq><suffix>` beside the
    /// target, or in the configured staging directory
    pub fn staging_path(&self, target: &Path) -> Result<PathBuf, StagerError> {
        let name = target
            .file_name()
            .ok_or_else(|| StagerError::NoFileName(target.to_path_buf()))?;
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);

        let mut staged = OsString::from(".");
        staged.push(name);
        staged.push(format!(".{}.{}{}", std::process::id(), seq, self.config.suffix));

        let dir = match &self.config.directory {
            Some(dir) => dir.as_path(),
            None => target.parent().unwrap_or(Path::new("")),
        };
        Ok(dir.join(staged))
    }

    /// Replace `target` with `contents` atomically.
    ///
    /// The staging file is observed before it is created, released once it has
    /// been renamed into place, and deleted if anything fails in between. The
    /// disk work runs as one blocking task; drive this future to completion and
    /// use [`Stager::interrupt`] to stop early, since dropping it lets that task
    /// outlive the cleanup.
    pub async fn write(&self, target: &Path, contents: Vec<u8>) -> Result<WriteReport, StagerError> {
        let staging = self.staging_path(target)?;
        self.removal.observe(&staging);
        debug!("Staging {:?} for {:?}", staging, target);

        let task = {
            let staging = staging.clone();
            let target = target.to_path_buf();
            let interrupted = Arc::clone(&self.interrupted);
            tokio::task::spawn_blocking(move || {
                persist(&staging, &target, &contents, &interrupted).map(|()| contents)
            })
        };

        match task.await.map_err(StagerError::from).and_then(|persisted| persisted) {
            Ok(contents) => {
                self.removal.release(&staging);
                info!("✅ Wrote {} bytes to {:?}", contents.len(), target);
                Ok(WriteReport::new(target.to_path_buf(), &contents))
            }
            Err(e) => {
                let outcome = self.removal.delete(&staging);
                warn!("Write to {:?} failed, staging file {:?}: {:?}", target, staging, outcome);
                Err(e)
            }
        }
    }

    /// Observe existing paths so they are removed when this stager goes away
    pub fn hold<I, P>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.removal.observe(path);
        }
        self.removal.len()
    }
}

fn persist(
    staging: &Path,
    target: &Path,
    contents: &[u8],
    interrupted: &AtomicBool,
) -> Result<(), StagerError> {
    if interrupted.load(Ordering::SeqCst) {
        return Err(StagerError::Interrupted(target.to_path_buf()));
    }

    let mut file = fs::File::create(staging).map_err(StagerError::io("create", staging))?;
    file.write_all(contents)
        .map_err(StagerError::io("write", staging))?;
    file.sync_all().map_err(StagerError::io("sync", staging))?;
    drop(file);

    if interrupted.load(Ordering::SeqCst) {
        return Err(StagerError::Interrupted(target.to_path_buf()));
    }
    fs::rename(staging, target).map_err(StagerError::io("rename into", target))
}
