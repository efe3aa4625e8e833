use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::source::{Comment, ItemSource, Thread};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Hacker News item API client
/// Docs: https://github.com/HackerNews/API
pub struct HackerNewsClient {
    client: Arc<reqwest::Client>,
    base_url: String,
}

impl HackerNewsClient {
    /// Create a client against the configured API host
    ///
    /// # Arguments
    /// * `config` - API section of the configuration
    /// * `client` - Shared HTTP client for connection pooling
    pub fn new(config: &ApiConfig, client: Arc<reqwest::Client>) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::Config("api.base_url cannot be empty".to_string()));
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the shared HTTP client with user agent and request timeout
    pub fn http_client(config: &ApiConfig) -> Result<Arc<reqwest::Client>> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Arc::new(client))
    }

    /// Build the item URL; ids are always rendered without fractional digits
    fn item_url(&self, id: u64) -> String {
        format!("{}/v0/item/{}.json", self.base_url, id)
    }

    /// One GET for one item, returning the raw body
    async fn get_item(&self, id: u64) -> Result<Vec<u8>> {
        let url = self.item_url(id);
        debug!(id, %url, "fetching item");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| Error::Transport { id, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { id, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| Error::Transport { id, source })?;

        Ok(body.to_vec())
    }
}

/// Decode a thread payload
pub fn decode_thread(id: u64, body: &[u8]) -> Result<Thread> {
    serde_json::from_slice(body).map_err(|source| Error::Decode { id, source })
}

/// Decode a comment payload and unescape its HTML text
pub fn decode_comment(id: u64, body: &[u8]) -> Result<Comment> {
    let mut comment: Comment =
        serde_json::from_slice(body).map_err(|source| Error::Decode { id, source })?;
    comment.text = html_escape::decode_html_entities(&comment.text).into_owned();
    Ok(comment)
}

#[async_trait]
impl ItemSource for HackerNewsClient {
    async fn fetch_thread(&self, id: u64) -> Result<Thread> {
        let body = self.get_item(id).await?;
        decode_thread(id, &body)
    }

    async fn fetch_comment(&self, id: u64) -> Result<Comment> {
        let body = self.get_item(id).await?;
        decode_comment(id, &body)
    }
}
