//! Readable resources.
//!
//! Resources are an optional capability alongside tools. Each
//! [`ResourceProvider`] serves one or more URI schemes; the
//! [`ResourceRegistry`] routes `resources/read` requests by scheme and lists
//! providers for `resources/list` in registration order.

pub mod file_system;
pub mod web_content;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::error::RegistryError;

pub use file_system::FileSystemResource;
pub use web_content::WebContentResource;

/// Errors raised while reading a resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The URI is malformed or uses a scheme the provider does not serve.
    #[error("unsupported resource URI: {uri}")]
    UnsupportedUri {
        /// The rejected URI.
        uri: String,
    },

    /// The path lies outside the configured allowed directories.
    #[error("Access denied: path is outside the configured allowed directories")]
    AccessDenied,

    /// Reading from disk failed.
    #[error("failed to read {path}")]
    Io {
        /// The path being read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request failed.
    #[error("failed to fetch resource: {0}")]
    Http(#[from] reqwest::Error),
}

/// A source of resource content.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Unique provider name.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// URI schemes served by this provider, without `://`.
    fn schemes(&self) -> &'static [&'static str];

    /// MIME type of the returned content.
    fn mime_type(&self) -> &'static str {
        "text/plain"
    }

    /// Reads the content behind `uri`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the URI is unsupported or unreadable.
    async fn read(&self, uri: &str) -> Result<String, ResourceError>;
}

/// A resource entry for resources/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    /// URI prefix served by the provider.
    pub uri: String,
    /// Provider name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// MIME type of the content.
    pub mime_type: String,
}

/// Returns the scheme of `uri`, if it has one.
#[must_use]
pub fn uri_scheme(uri: &str) -> Option<&str> {
    uri.split_once("://")
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.is_empty())
}

/// Resource providers in registration order, indexed by scheme.
#[derive(Default, Clone)]
pub struct ResourceRegistry {
    providers: IndexMap<&'static str, Arc<dyn ResourceProvider>>,
    by_scheme: HashMap<&'static str, &'static str>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider.
    ///
    /// A scheme already claimed by an earlier provider stays with it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateResource`] if the name is taken.
    pub fn register(&mut self, provider: Arc<dyn ResourceProvider>) -> Result<(), RegistryError> {
        let name = provider.name();
        if self.providers.contains_key(name) {
            return Err(RegistryError::DuplicateResource {
                name: name.to_string(),
            });
        }

        for &scheme in provider.schemes() {
            self.by_scheme.entry(scheme).or_insert(name);
        }
        tracing::debug!(provider = name, schemes = ?provider.schemes(), "Registered resource provider");
        self.providers.insert(name, provider);
        Ok(())
    }

    /// Returns the `resources/list` entries in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<ResourceDefinition> {
        self.providers
            .values()
            .map(|p| ResourceDefinition {
                uri: p
                    .schemes()
                    .first()
                    .map_or_else(String::new, |scheme| format!("{scheme}://")),
                name: p.name().to_string(),
                description: p.description().to_string(),
                mime_type: p.mime_type().to_string(),
            })
            .collect()
    }

    /// Finds the provider serving `uri`.
    #[must_use]
    pub fn find_for_uri(&self, uri: &str) -> Option<&Arc<dyn ResourceProvider>> {
        let scheme = uri_scheme(uri)?;
        let name = self.by_scheme.get(scheme)?;
        self.providers.get(name)
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no providers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}
