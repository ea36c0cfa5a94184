//! The owner handle: credentials, the request pipeline and the caches.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::CacheRegistry;
use crate::error::Result;
use crate::rest::queue::RequestQueue;
use crate::rest::request::HttpRequest;

fn default_api_origin() -> String {
    "https://discord.com".to_string()
}

/// Connection settings for the REST pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Bot token, presented as `Authorization: Bot <token>`.
    pub token: String,
    /// API origin. Overridable for tests and proxies.
    #[serde(default = "default_api_origin")]
    pub api_origin: String,
}

impl RestConfig {
    /// Settings for the production API origin.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_origin: default_api_origin(),
        }
    }
}

/// A cluster owns one request queue and one cache registry. REST helpers
/// and gateway event handlers both hang off this handle.
pub struct Cluster {
    config: Arc<RestConfig>,
    rest: RequestQueue,
    cache: Arc<CacheRegistry>,
}

impl Cluster {
    /// Start the pipeline workers. Must be called within a tokio runtime;
    /// construction failure is fatal to startup.
    pub fn new(config: RestConfig) -> Result<Self> {
        let config = Arc::new(config);
        let rest = RequestQueue::new(Arc::clone(&config))?;
        Ok(Self {
            config,
            rest,
            cache: Arc::new(CacheRegistry::new()),
        })
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheRegistry {
        &self.cache
    }

    /// Submit a request to the rate-limited pipeline. Ownership moves to
    /// the queue; the completion handler fires exactly once.
    pub fn post_request(&self, req: HttpRequest) {
        self.rest.post_request(req);
    }

    /// Stop the pipeline. Pending requests that never reached the wire are
    /// completed with [`HttpError::Canceled`](crate::rest::request::HttpError::Canceled).
    pub async fn shutdown(self) -> Result<()> {
        self.rest.shutdown().await
    }
}
