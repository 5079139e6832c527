//! Model Context Protocol (MCP) server implementation.
//!
//! This module implements the MCP request path for exposing registered tools
//! and resources to AI assistants. Requests arrive as JSON-RPC 2.0 messages
//! over a transport (stdio for the server binary).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         MCP Server                          │
//! │                                                             │
//! │   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    │
//! │   │  Transport  │───▶│   Server    │───▶│ Dispatcher  │    │
//! │   │   (stdio)   │    │ (lifecycle) │    │  (routing)  │    │
//! │   └─────────────┘    └─────────────┘    └─────────────┘    │
//! │                                           │         │       │
//! │                                           ▼         ▼       │
//! │                                   ┌──────────┐ ┌──────────┐ │
//! │                                   │  Tools   │ │Resources │ │
//! │                                   └──────────┘ └──────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod dispatcher;
pub mod protocol;
pub mod server;
pub mod transport;

pub use dispatcher::{DispatchError, Dispatcher};
pub use protocol::{JsonRpcError, JsonRpcResponse, Method, RequestId, MCP_PROTOCOL_VERSION};
pub use server::{ConnectionState, McpServer};
pub use transport::{LineTransport, StdioTransport, Transport};
