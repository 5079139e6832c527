//! Web content resource provider.

use std::time::Duration;

use async_trait::async_trait;

use super::{uri_scheme, ResourceError, ResourceProvider};

/// Fetches content from web pages over HTTP(S).
#[derive(Debug, Clone)]
pub struct WebContentResource {
    client: reqwest::Client,
}

impl WebContentResource {
    /// Creates a provider whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ResourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResourceProvider for WebContentResource {
    fn name(&self) -> &'static str {
        "web-content"
    }

    fn description(&self) -> &'static str {
        "Fetches content from web pages"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["https", "http"]
    }

    async fn read(&self, uri: &str) -> Result<String, ResourceError> {
        if !matches!(uri_scheme(uri), Some("http" | "https")) {
            return Err(ResourceError::UnsupportedUri {
                uri: uri.to_string(),
            });
        }

        tracing::debug!(uri, "Fetching web resource");
        let response = self.client.get(uri).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
