use crate::cache::CacheStore;
use crate::error::{Error, Result};
use crate::source::{Comment, ItemSource};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_MAX_CONCURRENCY: usize = 64;

/// What to do when a single child comment cannot be fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildFailurePolicy {
    /// First failure aborts the whole resolution
    #[default]
    Abort,
    /// Record the failure and keep the remaining comments
    Skip,
}

#[derive(Debug)]
pub struct ChildFailure {
    pub id: u64,
    pub error: Error,
}

/// Outcome of resolving one thread
#[derive(Debug)]
pub struct Resolution {
    /// In fetch completion order, or cached order on a cache hit
    pub comments: Vec<Comment>,
    /// Always empty under `ChildFailurePolicy::Abort`
    pub failures: Vec<ChildFailure>,
    pub from_cache: bool,
}

/// Resolves a thread id into its direct child comments, cache first
pub struct ThreadResolver {
    source: Arc<dyn ItemSource>,
    cache: CacheStore,
    max_concurrency: usize,
    policy: ChildFailurePolicy,
}

impl ThreadResolver {
    pub fn new(source: Arc<dyn ItemSource>, cache: CacheStore) -> Self {
        Self {
            source,
            cache,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            policy: ChildFailurePolicy::default(),
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_failure_policy(mut self, policy: ChildFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Load the thread from cache, or fetch it and all its children
    ///
    /// A fresh result is cached only when every child was fetched, so an
    /// entry on disk is always complete.
    pub async fn resolve(&self, thread_id: u64) -> Result<Resolution> {
        if let Some(comments) = self.cache.load(thread_id)? {
            info!(
                thread_id,
                count = comments.len(),
                path = %self.cache.path_for(thread_id).display(),
                "using cached comments"
            );
            return Ok(Resolution {
                comments,
                failures: Vec::new(),
                from_cache: true,
            });
        }

        info!(thread_id, "no cached comments, fetching thread");
        let thread = self.source.fetch_thread(thread_id).await?;
        info!(
            thread_id,
            children = thread.kids.len(),
            max_concurrency = self.max_concurrency,
            "fetching child comments"
        );

        let (comments, failures) = self.fetch_children(thread.kids).await?;

        if failures.is_empty() {
            self.cache.store(thread_id, &comments)?;
        } else {
            warn!(
                thread_id,
                failed = failures.len(),
                "not caching incomplete thread"
            );
        }

        Ok(Resolution {
            comments,
            failures,
            from_cache: false,
        })
    }

    /// Bounded fan-out over child ids, fan-in in completion order
    async fn fetch_children(&self, kids: Vec<u64>) -> Result<(Vec<Comment>, Vec<ChildFailure>)> {
        let source = self.source.as_ref();
        let mut comments = Vec::with_capacity(kids.len());
        let mut failures = Vec::new();

        let fetches = stream::iter(kids)
            .map(|id| async move { (id, source.fetch_comment(id).await) })
            .buffer_unordered(self.max_concurrency);
        let mut fetches = std::pin::pin!(fetches);

        while let Some((id, result)) = fetches.next().await {
            match result {
                Ok(comment) => {
                    debug!(id, "fetched comment");
                    comments.push(comment);
                }
                // Returning drops the stream and cancels in-flight siblings
                Err(error) if self.policy == ChildFailurePolicy::Abort => return Err(error),
                Err(error) => {
                    warn!(id, %error, "skipping comment");
                    failures.push(ChildFailure { id, error });
                }
            }
        }

        Ok((comments, failures))
    }
}
