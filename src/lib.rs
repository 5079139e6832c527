//! keipes-mcp: MCP server exposing schema-described tools over JSON-RPC 2.0
//!
//! This library provides the request path of a Model Context Protocol server:
//! a tool registry, argument validation, a request dispatcher, and a server
//! lifecycle bound to a transport.
//!
//! # Architecture
//!
//! - **Tools**: named capabilities with a declared input schema, registered
//!   once at startup
//! - **Validation**: raw arguments are checked against the schema before a
//!   tool sees them
//! - **Dispatch**: every request body produces a response body, never a
//!   failure
//! - **Resources**: optional file and web content providers
//!
//! # Modules
//!
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types
//! - [`mcp`] - MCP protocol implementation
//! - [`resources`] - Resource providers
//! - [`schema`] - Input schemas and argument validation
//! - [`tools`] - Tool trait, registry and built-in tools

pub mod config;
pub mod error;
pub mod mcp;
pub mod resources;
pub mod schema;
pub mod tools;
