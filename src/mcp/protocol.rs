//! JSON-RPC 2.0 message types for MCP protocol.
//!
//! This module defines the request and response envelopes used in the Model
//! Context Protocol, and the closed set of methods the server understands.
//!
//! # Envelope Rules
//!
//! - The request `id` is opaque. It is echoed back verbatim in the response;
//!   an absent `id`, or one that is not a string or number, is echoed as `null`.
//! - A response carries exactly one of `result` or `error`.

use serde::Serialize;
use serde_json::{Map, Value};

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Default server name for capability negotiation.
pub const SERVER_NAME: &str = "keipes-mcp";

/// A JSON-RPC 2.0 request ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID, integer or not.
    Number(serde_json::Number),
    /// String request ID.
    String(String),
    /// Explicit `null`, or an ID that could not be recovered.
    #[default]
    Null,
}

impl RequestId {
    /// Extracts the ID from a raw request object.
    ///
    /// Anything other than a string or number becomes [`RequestId::Null`].
    #[must_use]
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        match obj.get("id") {
            Some(Value::Number(n)) => Self::Number(n.clone()),
            Some(Value::String(s)) => Self::String(s.clone()),
            _ => Self::Null,
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// Methods recognised by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `initialize`: capability and identity negotiation.
    Initialize,
    /// `notifications/initialized`: client finished initialisation.
    Initialized,
    /// `ping`: liveness check.
    Ping,
    /// `tools/list`: enumerate registered tools.
    ToolsList,
    /// `tools/call`: invoke a tool.
    ToolsCall,
    /// `resources/list`: enumerate resource providers.
    ResourcesList,
    /// `resources/read`: read a resource by URI.
    ResourcesRead,
}

impl Method {
    /// Every recognised method.
    pub const ALL: [Self; 7] = [
        Self::Initialize,
        Self::Initialized,
        Self::Ping,
        Self::ToolsList,
        Self::ToolsCall,
        Self::ResourcesList,
        Self::ResourcesRead,
    ];

    /// Resolves a wire method name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// Returns the wire method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Initialized => "notifications/initialized",
            Self::Ping => "ping",
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
            Self::ResourcesList => "resources/list",
            Self::ResourcesRead => "resources/read",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Request identifier, echoed in the response.
    pub id: RequestId,

    /// Whether the request carried an `id` key at all.
    pub has_id: bool,

    /// The method to invoke.
    pub method: String,

    /// Optional parameters for the method.
    pub params: Option<Value>,
}

impl Envelope {
    /// Resolves the method, if it is one the server recognises.
    #[must_use]
    pub fn method_kind(&self) -> Option<Method> {
        Method::from_name(&self.method)
    }

    /// Whether this is a notification (no `id`, `notifications/` method).
    ///
    /// Notifications are acknowledged by [`crate::mcp::Dispatcher::dispatch`]
    /// but the stdio transport does not write the acknowledgement.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        !self.has_id && self.method.starts_with("notifications/")
    }
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this response corresponds to.
    pub id: RequestId,

    /// The result of the method call.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result,
        }
    }
}

/// Standard JSON-RPC 2.0 error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method (or tool, or resource) does not exist.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }

    /// Returns the default message for this error code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Additional information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorData {
    /// Creates a new error from an error code.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.default_message().to_string(),
            data: None,
        }
    }

    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Adds additional data to the error.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this error corresponds to, `null` if unknown.
    pub id: RequestId,

    /// The error details.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: RequestId, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            error,
        }
    }

    /// Creates a parse error response (ID cannot be determined).
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(RequestId::Null, JsonRpcErrorData::from_code(ErrorCode::ParseError))
    }

    /// Creates an invalid request error response.
    #[must_use]
    pub fn invalid_request(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, message),
        )
    }
}

/// Parses a raw request body into an envelope.
///
/// # Errors
///
/// Returns a parse error (`id: null`) if the body is not JSON, and an invalid
/// request error, echoing whatever ID could be recovered, if the JSON is not a
/// JSON-RPC 2.0 request object.
pub fn parse_envelope(raw: &str) -> Result<Envelope, JsonRpcError> {
    let value: Value = serde_json::from_str(raw).map_err(|_| JsonRpcError::parse_error())?;

    let Value::Object(mut obj) = value else {
        return Err(JsonRpcError::invalid_request(
            RequestId::Null,
            "Request must be a JSON object",
        ));
    };

    let id = RequestId::from_object(&obj);
    let has_id = obj.contains_key("id");

    if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return Err(JsonRpcError::invalid_request(
            id,
            "jsonrpc field must be \"2.0\"",
        ));
    }

    let method = match obj.remove("method") {
        Some(Value::String(m)) if !m.is_empty() => m,
        _ => {
            return Err(JsonRpcError::invalid_request(
                id,
                "method field must be a non-empty string",
            ))
        }
    };

    Ok(Envelope {
        id,
        has_id,
        method,
        params: obj.remove("params"),
    })
}
