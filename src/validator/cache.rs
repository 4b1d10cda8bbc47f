//! Per-run directory listing cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use crate::effects::ContentEntry;
use crate::policy::normalize_path;
use crate::types::RepoId;

/// Result of one directory listing, shared by every worker that asks for it.
pub type Listing = Result<Arc<Vec<ContentEntry>>, String>;

/// Identifies one directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub owner: String,
    pub repo: String,
    pub path: String,
}

impl CacheKey {
    pub fn new(repo: &RepoId, path: &str) -> Self {
        Self {
            owner: repo.owner.clone(),
            repo: repo.repo.clone(),
            path: normalize_path(path).to_string(),
        }
    }
}

/// Directory listings keyed by `(owner, repo, path)`.
///
/// Each key maps to a once-cell inserted under the mutex; the listing itself
/// runs outside the lock, and concurrent callers for the same key wait on
/// the same cell. A key is therefore listed at most once per cache.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: Mutex<HashMap<CacheKey, Arc<OnceCell<Listing>>>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached listing for `key`, running `list` if nobody has.
    pub async fn get_or_list<F, Fut>(&self, key: CacheKey, list: F) -> Listing
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Listing>,
    {
        let cell = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(key).or_default())
        };
        cell.get_or_init(list).await.clone()
    }

    /// Number of keys seen so far.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
