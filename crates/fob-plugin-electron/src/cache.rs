//! Adapter cache
//!
//! Adapters live at `<root>/<sanitized id>.mjs`. A file on disk is trusted
//! as-is once it exists; it is only regenerated after the directory has been
//! cleared. An in-memory map in front of the directory skips the existence
//! check for ids already resolved in this session.
//!
//! Concurrent first resolutions of the same id are not serialized. Both
//! generate the same text and the write is an atomic replace, so the race
//! only costs a redundant generation.

use crate::error::Result;
use crate::prebundle::sanitize_module_id;
use crate::runtime::Runtime;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Extension of adapter files
pub const ADAPTER_EXTENSION: &str = "mjs";

/// Maps module ids to materialized adapter files
#[derive(Debug)]
pub struct CacheManager {
    root: PathBuf,
    runtime: Arc<dyn Runtime>,
    entries: RwLock<FxHashMap<String, PathBuf>>,
}

impl CacheManager {
    pub fn new(root: impl Into<PathBuf>, runtime: Arc<dyn Runtime>) -> Self {
        Self {
            root: root.into(),
            runtime,
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// Cache directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic adapter path for `module_id`
    pub fn path_for(&self, module_id: &str) -> PathBuf {
        self.root.join(format!(
            "{}.{}",
            sanitize_module_id(module_id),
            ADAPTER_EXTENSION
        ))
    }

    /// Path recorded for `module_id` in this session, if any
    pub fn get(&self, module_id: &str) -> Option<PathBuf> {
        self.entries.read().get(module_id).cloned()
    }

    /// Number of ids resolved in this session
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Return the adapter path for `module_id`, generating it if needed.
    ///
    /// `generate` runs only when neither this session nor the disk has the
    /// adapter. Its errors and write failures are returned unchanged and
    /// nothing is recorded for the id.
    pub async fn resolve<F, Fut>(&self, module_id: &str, generate: F) -> Result<PathBuf>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if let Some(path) = self.get(module_id) {
            debug!("[fob-electron] Cache hit (memory): {}", module_id);
            return Ok(path);
        }

        let path = self.path_for(module_id);
        if self.runtime.exists(&path) {
            debug!(
                "[fob-electron] Cache hit (disk): {} -> {}",
                module_id,
                path.display()
            );
            return Ok(self.record(module_id, path));
        }

        debug!("[fob-electron] Cache miss: {}", module_id);
        let code = generate().await?;

        if let Some(parent) = path.parent() {
            self.runtime.create_dir(parent, true).await?;
        }
        self.runtime.write_file(&path, code.as_bytes()).await?;

        Ok(self.record(module_id, path))
    }

    fn record(&self, module_id: &str, path: PathBuf) -> PathBuf {
        self.entries
            .write()
            .entry(module_id.to_string())
            .or_insert(path)
            .clone()
    }
}
