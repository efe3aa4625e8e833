//! On-disk cache of resolved comment lists, one JSON file per thread.
//!
//! An entry is written once and never expires; its presence means the
//! thread is served without touching the network.

use crate::error::{Error, Result};
use crate::source::Comment;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

const CACHE_DIR_NAME: &str = "hn-comments";

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Per-user cache directory, e.g. `~/.cache/hn-comments` on Linux
    pub fn default_root() -> Result<PathBuf> {
        dirs_next::cache_dir()
            .map(|dir| dir.join(CACHE_DIR_NAME))
            .ok_or_else(|| Error::Config("could not determine a user cache directory".to_string()))
    }

    pub fn path_for(&self, thread_id: u64) -> PathBuf {
        self.root.join(format!("{}.json", thread_id))
    }

    /// Read a cached entry; `Ok(None)` means the cache is cold for this thread
    pub fn load(&self, thread_id: u64) -> Result<Option<Vec<Comment>>> {
        let path = self.path_for(thread_id);

        let contents = match std::fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::CacheRead { path, source }),
        };

        let comments =
            serde_json::from_slice(&contents).map_err(|source| Error::CacheDecode {
                path: path.clone(),
                source,
            })?;

        debug!(thread_id, path = %path.display(), "cache hit");
        Ok(Some(comments))
    }

    /// Persist a resolved comment list using temp file + rename
    pub fn store(&self, thread_id: u64, comments: &[Comment]) -> Result<()> {
        let path = self.path_for(thread_id);
        let write_err = |source: io::Error| Error::CacheWrite {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.root).map_err(write_err)?;

        let json = serde_json::to_vec(comments).map_err(|e| write_err(e.into()))?;

        let mut temp_file = tempfile::NamedTempFile::new_in(&self.root).map_err(write_err)?;
        temp_file.write_all(&json).map_err(write_err)?;
        temp_file.write_all(b"\n").map_err(write_err)?;
        temp_file.as_file().sync_all().map_err(write_err)?;
        temp_file.persist(&path).map_err(|e| write_err(e.error))?;

        debug!(thread_id, path = %path.display(), count = comments.len(), "cache stored");
        Ok(())
    }

    /// Drop a cached entry if there is one
    pub fn remove(&self, thread_id: u64) -> Result<bool> {
        let path = self.path_for(thread_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(Error::CacheWrite { path, source }),
        }
    }
}
