use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod hacker_news;

pub use hacker_news::{decode_comment, decode_thread, HackerNewsClient};

/// Root discussion item; only its direct children are of interest
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Thread {
    #[serde(default)]
    pub kids: Vec<u64>,
}

/// A single comment as returned by the item API and stored in the cache
///
/// Field names follow the item API (`by`, `parent`) so cache files and
/// output share the upstream shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub by: String,
    pub id: u64,
    #[serde(default)]
    pub parent: u64,
    #[serde(default)]
    pub text: String,
}

/// Read-only access to items of the remote item tree
///
/// Which shape an id resolves to is decided by the caller; the payload
/// carries no discriminator.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch the root item and its direct child ids
    async fn fetch_thread(&self, id: u64) -> Result<Thread>;

    /// Fetch a leaf comment, with its text already HTML-unescaped
    async fn fetch_comment(&self, id: u64) -> Result<Comment>;
}
