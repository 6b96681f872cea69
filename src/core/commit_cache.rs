//! Memoized, single-flight commit detail lookups.
//!
//! Commit detail for a fixed revision never changes, so a successful lookup is
//! kept for the life of the cache. Failed lookups are not kept: a repository
//! can be briefly locked, and the next request should try again.
//!
//! Concurrent requests for the same key share one underlying fetch through a
//! [`futures::future::Shared`] future stored in the map while it is in flight.

use crate::core::annotation::strip_marker;
use crate::core::events::lock;
use crate::core::sources::{CommitDetail, CommitSource};
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Cache key: the file a commit was looked up for, and its revision
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitKey {
    pub path: PathBuf,
    pub revision: String,
}

impl CommitKey {
    pub fn new(path: impl Into<PathBuf>, revision: &str) -> Self {
        Self {
            path: path.into(),
            revision: strip_marker(revision).to_string(),
        }
    }
}

type SharedFetch = Shared<BoxFuture<'static, Option<CommitDetail>>>;

enum Entry {
    Ready(CommitDetail),
    InFlight { flight: u64, fetch: SharedFetch },
}

pub struct CommitDetailCache {
    source: Arc<dyn CommitSource>,
    entries: Mutex<HashMap<CommitKey, Entry>>,
    next_flight: AtomicU64,
}

impl CommitDetailCache {
    pub fn new(source: Arc<dyn CommitSource>) -> Self {
        Self {
            source,
            entries: Mutex::new(HashMap::new()),
            next_flight: AtomicU64::new(0),
        }
    }

    /// Cached detail, without fetching
    pub fn get(&self, path: &Path, revision: &str) -> Option<CommitDetail> {
        let key = CommitKey::new(path, revision);
        match lock(&self.entries).get(&key) {
            Some(Entry::Ready(detail)) => Some(detail.clone()),
            _ => None,
        }
    }

    /// Cached detail, fetching it if needed.
    ///
    /// Joins an in-flight fetch for the same key instead of starting another.
    pub async fn resolve(&self, path: &Path, revision: &str) -> Option<CommitDetail> {
        let key = CommitKey::new(path, revision);

        let (flight, fetch) = {
            let mut entries = lock(&self.entries);
            match entries.get(&key) {
                Some(Entry::Ready(detail)) => return Some(detail.clone()),
                Some(Entry::InFlight { flight, fetch }) => (*flight, fetch.clone()),
                None => {
                    let flight = self.next_flight.fetch_add(1, Ordering::Relaxed);
                    let fetch = self.start_fetch(key.clone());
                    entries.insert(
                        key.clone(),
                        Entry::InFlight {
                            flight,
                            fetch: fetch.clone(),
                        },
                    );
                    (flight, fetch)
                }
            }
        };

        let result = fetch.await;

        // Every waiter of a flight lands here; only the entry of this flight is touched.
        let mut entries = lock(&self.entries);
        let current_flight = matches!(
            entries.get(&key),
            Some(Entry::InFlight { flight: f, .. }) if *f == flight
        );
        if current_flight {
            match &result {
                Some(detail) => {
                    entries.insert(key, Entry::Ready(detail.clone()));
                }
                None => {
                    entries.remove(&key);
                }
            }
        }

        result
    }

    /// Resolve several revisions of one file concurrently.
    ///
    /// Individual failures are tolerated. Returns how many resolved.
    pub async fn resolve_many<I, S>(&self, path: &Path, revisions: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = revisions
            .into_iter()
            .map(|r| strip_marker(r.as_ref()).to_string())
            .filter(|r| !r.is_empty())
            .collect();

        let results = join_all(unique.iter().map(|revision| self.resolve(path, revision))).await;
        let resolved = results.iter().filter(|r| r.is_some()).count();

        if resolved < results.len() {
            log::debug!(
                "Resolved {resolved} of {} commits for {}",
                results.len(),
                path.display()
            );
        }
        resolved
    }

    /// Number of successfully cached commits
    pub fn len(&self) -> usize {
        lock(&self.entries)
            .values()
            .filter(|entry| matches!(entry, Entry::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn start_fetch(&self, key: CommitKey) -> SharedFetch {
        let source = Arc::clone(&self.source);
        async move {
            match source.get_commit(&key.path, &key.revision).await {
                Ok(detail) => detail,
                Err(e) => {
                    log::warn!(
                        "Failed to read commit {} for {}: {e}",
                        key.revision,
                        key.path.display()
                    );
                    None
                }
            }
        }
        .boxed()
        .shared()
    }
}
