use std::fs;
use std::path::{Path, PathBuf};

/// The engine's on-disk cache for one session, removed on drop.
///
/// Removal is best-effort: the engine may never have written the file, or
/// something else may have cleaned it up already. Failures are logged and
/// otherwise ignored.
#[derive(Debug)]
pub(crate) struct CacheFile {
    path: PathBuf,
}

impl CacheFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed model cache"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                "could not remove model cache: {}",
                e
            ),
        }
    }
}
