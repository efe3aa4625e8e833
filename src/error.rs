use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds surfaced by the fetch/cache/output pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Network failure talking to the item API
    #[error("failed to fetch item {id}: {source}")]
    Transport {
        id: u64,
        #[source]
        source: reqwest::Error,
    },

    /// Item API answered with a non-2xx status
    #[error("item API returned {status} for item {id}")]
    Status { id: u64, status: reqwest::StatusCode },

    /// Response body was not the expected item shape
    #[error("failed to decode item {id}: {source}")]
    Decode {
        id: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read cache entry {}: {source}", .path.display())]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache entry {} is corrupt: {source}", .path.display())]
    CacheDecode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write cache entry {}: {source}", .path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output to {destination}: {source}")]
    Output {
        destination: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// True for failures caused by the remote side or the network
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Status { .. })
    }

    /// Item id the failure relates to, when there is one
    pub fn item_id(&self) -> Option<u64> {
        match self {
            Error::Transport { id, .. } | Error::Status { id, .. } | Error::Decode { id, .. } => {
                Some(*id)
            }
            _ => None,
        }
    }
}
