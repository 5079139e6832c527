//! JSON-RPC request dispatcher.
//!
//! [`Dispatcher::dispatch`] turns a raw request body into a raw response
//! body. It never fails: malformed input, unknown methods, invalid
//! arguments, and failing or panicking tool handlers all come back as
//! JSON-RPC error envelopes carrying the request's `id`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::mcp::protocol::{
    parse_envelope, Envelope, ErrorCode, JsonRpcError, JsonRpcErrorData, JsonRpcResponse, Method,
    RequestId, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::resources::{ResourceError, ResourceRegistry};
use crate::schema::ValidationError;
use crate::tools::{ToolDefinition, ToolRegistry};

/// A failure while producing the response to one request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The method is not one the server recognises.
    #[error("Method not found: {method}")]
    MethodNotFound {
        /// The requested method.
        method: String,
    },

    /// `tools/call` named a tool that is not registered.
    #[error("Tool not found: {name}")]
    ToolNotFound {
        /// The requested tool name.
        name: String,
    },

    /// Method parameters were missing or malformed.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Tool arguments failed schema validation.
    #[error("Invalid params: {0}")]
    Validation(#[from] ValidationError),

    /// `resources/read` named a URI no provider serves.
    #[error("Resource not found: {uri}")]
    ResourceNotFound {
        /// The requested URI.
        uri: String,
    },

    /// A tool handler returned an error or panicked.
    #[error("Tool '{tool}' failed")]
    Handler {
        /// The failing tool.
        tool: String,
        /// Description of the failure.
        detail: String,
    },

    /// A resource provider failed.
    #[error("Failed to read resource: {uri}")]
    Resource {
        /// The requested URI.
        uri: String,
        /// The provider's error.
        #[source]
        source: ResourceError,
    },
}

impl DispatchError {
    /// Returns the JSON-RPC error code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MethodNotFound { .. }
            | Self::ToolNotFound { .. }
            | Self::ResourceNotFound { .. } => ErrorCode::MethodNotFound,
            Self::InvalidParams(_) | Self::Validation(_) => ErrorCode::InvalidParams,
            Self::Handler { .. } | Self::Resource { .. } => ErrorCode::InternalError,
        }
    }

    /// Converts the failure into a JSON-RPC error object.
    #[must_use]
    pub fn into_error_data(self) -> JsonRpcErrorData {
        let data = match &self {
            Self::Validation(e) => Some(json!({
                "parameter": e.parameter_path,
                "reason": e.reason,
            })),
            Self::Handler { detail, .. } => Some(Value::String(detail.clone())),
            Self::Resource { source, .. } => Some(Value::String(source.to_string())),
            _ => None,
        };

        let error = JsonRpcErrorData::with_message(self.code(), self.to_string());
        match data {
            Some(data) => error.with_data(data),
            None => error,
        }
    }
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
struct ServerCapabilities {
    tools: EmptyCapability,
    #[serde(skip_serializing_if = "Option::is_none")]
    resources: Option<EmptyCapability>,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct EmptyCapability {}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Parameters for resources/read request.
#[derive(Debug, Clone, Deserialize)]
struct ResourceReadParams {
    uri: String,
}

/// Routes requests to tools and resources.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tools: Arc<ToolRegistry>,
    resources: Arc<ResourceRegistry>,
    server_info: ServerInfo,
}

impl Dispatcher {
    /// Creates a dispatcher over fully built registries.
    #[must_use]
    pub fn new(tools: ToolRegistry, resources: ResourceRegistry) -> Self {
        Self {
            tools: Arc::new(tools),
            resources: Arc::new(resources),
            server_info: ServerInfo::default(),
        }
    }

    /// Overrides the server name reported by `initialize`.
    #[must_use]
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_info.name = name.into();
        self
    }

    /// The tool registry.
    #[must_use]
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// The resource registry.
    #[must_use]
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Handles one raw request body and returns the response body.
    pub async fn dispatch(&self, raw: &str) -> String {
        self.respond(raw).await.1
    }

    /// Like [`Self::dispatch`], but returns `None` for notifications, which
    /// must not be answered on a stream transport.
    pub async fn dispatch_line(&self, raw: &str) -> Option<String> {
        let (notification, body) = self.respond(raw).await;
        (!notification).then_some(body)
    }

    async fn respond(&self, raw: &str) -> (bool, String) {
        let envelope = match parse_envelope(raw) {
            Ok(envelope) => envelope,
            Err(rejection) => {
                warn!(
                    code = rejection.error.code,
                    error = %rejection.error.message,
                    "Rejected malformed request"
                );
                return (false, encode(&rejection.id, &rejection));
            }
        };

        debug!(id = %envelope.id, method = %envelope.method, "Dispatching request");

        let body = match self.route(&envelope).await {
            Ok(result) => encode(
                &envelope.id,
                &JsonRpcResponse::success(envelope.id.clone(), result),
            ),
            Err(failure) => {
                if matches!(failure.code(), ErrorCode::InternalError) {
                    error!(id = %envelope.id, method = %envelope.method, error = %failure, "Request failed");
                } else {
                    warn!(id = %envelope.id, method = %envelope.method, error = %failure, "Request failed");
                }
                encode(
                    &envelope.id,
                    &JsonRpcError::new(envelope.id.clone(), failure.into_error_data()),
                )
            }
        };

        (envelope.is_notification(), body)
    }

    async fn route(&self, envelope: &Envelope) -> Result<Value, DispatchError> {
        let Some(method) = envelope.method_kind() else {
            return Err(DispatchError::MethodNotFound {
                method: envelope.method.clone(),
            });
        };

        let params = envelope.params.as_ref();
        match method {
            Method::Initialize => Ok(self.handle_initialize(params)),
            Method::Initialized | Method::Ping => Ok(json!({})),
            Method::ToolsList => Ok(self.handle_tools_list()),
            Method::ToolsCall => self.handle_tools_call(params).await,
            Method::ResourcesList => Ok(self.handle_resources_list()),
            Method::ResourcesRead => self.handle_resources_read(params).await,
        }
    }

    fn handle_initialize(&self, params: Option<&Value>) -> Value {
        if let Some(client) = params.and_then(|p| p.get("clientInfo")) {
            debug!(client = %client, "Client identified itself");
        }

        let capabilities = ServerCapabilities {
            tools: EmptyCapability {},
            resources: (!self.resources.is_empty()).then_some(EmptyCapability {}),
        };

        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": capabilities,
            "serverInfo": self.server_info,
        })
    }

    fn handle_tools_list(&self) -> Value {
        let tools: Vec<ToolDefinition> = self.tools.list().map(|t| t.definition()).collect();
        json!({ "tools": tools })
    }

    async fn handle_tools_call(&self, params: Option<&Value>) -> Result<Value, DispatchError> {
        let params: ToolCallParams = parse_params(params, "tool call")?;

        let tool = self
            .tools
            .find(&params.name)
            .ok_or_else(|| DispatchError::ToolNotFound {
                name: params.name.clone(),
            })?;

        let args = tool.input_schema.validate(params.arguments.as_ref())?;

        debug!(tool = %tool.name, "Invoking tool");
        let outcome = AssertUnwindSafe(tool.handler.invoke(args))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                return Err(DispatchError::Handler {
                    tool: tool.name.clone(),
                    detail: e.to_string(),
                })
            }
            Err(panic) => {
                return Err(DispatchError::Handler {
                    tool: tool.name.clone(),
                    detail: panic_message(panic.as_ref()),
                })
            }
        };

        serde_json::to_value(&result).map_err(|e| DispatchError::Handler {
            tool: tool.name.clone(),
            detail: format!("failed to serialise result: {e}"),
        })
    }

    fn handle_resources_list(&self) -> Value {
        json!({ "resources": self.resources.definitions() })
    }

    async fn handle_resources_read(&self, params: Option<&Value>) -> Result<Value, DispatchError> {
        let ResourceReadParams { uri } = parse_params(params, "resource read")?;

        let provider = self
            .resources
            .find_for_uri(&uri)
            .ok_or_else(|| DispatchError::ResourceNotFound { uri: uri.clone() })?;

        let text = provider
            .read(&uri)
            .await
            .map_err(|source| DispatchError::Resource {
                uri: uri.clone(),
                source,
            })?;

        Ok(json!({
            "contents": [{
                "uri": uri,
                "mimeType": provider.mime_type(),
                "text": text,
            }]
        }))
    }
}

/// Deserialises method parameters.
fn parse_params<T: serde::de::DeserializeOwned>(
    params: Option<&Value>,
    what: &str,
) -> Result<T, DispatchError> {
    let params =
        params.ok_or_else(|| DispatchError::InvalidParams(format!("Missing {what} params")))?;
    T::deserialize(params)
        .map_err(|e| DispatchError::InvalidParams(format!("Invalid {what} params: {e}")))
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("tool panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("tool panicked: {s}")
    } else {
        "tool panicked".to_string()
    }
}

/// Serialises a response, falling back to a bare internal error.
fn encode<T: Serialize>(id: &RequestId, message: &T) -> String {
    serde_json::to_string(message).unwrap_or_else(|e| {
        error!(error = %e, "Failed to serialise response");
        json!({
            "jsonrpc": "2.0",
            "id": serde_json::to_value(id).unwrap_or(Value::Null),
            "error": {
                "code": ErrorCode::InternalError.code(),
                "message": ErrorCode::InternalError.default_message(),
            }
        })
        .to_string()
    })
}
