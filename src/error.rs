//! Error types for keipes-mcp.
//!
//! Errors that belong to a single JSON-RPC request live next to the
//! dispatcher ([`crate::mcp::dispatcher::DispatchError`]). The errors here are
//! reported directly to the caller of startup and lifecycle operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors raised while building a registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A tool with this name is already registered.
    #[error("tool already registered: {name}")]
    DuplicateTool {
        /// The conflicting name.
        name: String,
    },

    /// The name is empty, too long, or uses characters outside `[A-Za-z0-9_-]`.
    #[error("invalid tool name: '{name}'")]
    InvalidToolName {
        /// The rejected name.
        name: String,
    },

    /// A resource provider with this name is already registered.
    #[error("resource provider already registered: {name}")]
    DuplicateResource {
        /// The conflicting name.
        name: String,
    },
}

/// Errors at the server lifecycle boundary.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    /// `connect` was called on a server that is not idle.
    #[error("server is already connected or closed")]
    AlreadyConnected,

    /// A request arrived while the server was not connected.
    #[error("server is not connected")]
    NotConnected,
}
