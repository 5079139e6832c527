//! Tool definitions and the registry that holds them.
//!
//! A tool is implemented once as a [`Tool`] with its own argument type. The
//! registry stores it type-erased inside a [`ToolDescriptor`]; the dispatcher
//! validates the raw arguments against the descriptor's schema and the typed
//! adapter deserialises the validated record before calling the tool.

pub mod calculator;
pub mod registry;
pub mod weather;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::schema::{InputSchema, ValidatedArgs};

pub use calculator::Calculator;
pub use registry::ToolRegistry;
pub use weather::Weather;

/// A failure raised while executing a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Validated arguments could not be converted to the tool's argument type.
    #[error("arguments do not match the tool's argument type: {0}")]
    Arguments(#[source] serde_json::Error),

    /// The tool failed while running.
    #[error("{message}")]
    Execution {
        /// Description of the failure.
        message: String,
    },
}

impl ToolError {
    /// Creates an execution failure.
    #[must_use]
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }
}

/// Content item in a tool call response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Machine-readable form of the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            structured_content: None,
            is_error: false,
        }
    }

    /// Creates an error text result.
    ///
    /// Used for domain failures the caller should see as data, not as a
    /// protocol error.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            structured_content: None,
            is_error: true,
        }
    }

    /// Attaches a structured payload.
    #[must_use]
    pub fn with_structured(mut self, value: Value) -> Self {
        self.structured_content = Some(value);
        self
    }
}

/// A named, schema-described capability.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    /// Arguments the tool receives after validation.
    type Args: DeserializeOwned + Send;

    /// Unique tool name.
    fn name(&self) -> &'static str;

    /// Human-readable summary.
    fn description(&self) -> &'static str;

    /// Declared arguments.
    fn input_schema(&self) -> InputSchema;

    /// Runs the tool.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] for failures that should surface as an
    /// internal error to the caller.
    async fn call(&self, args: Self::Args) -> Result<ToolCallResult, ToolError>;
}

/// Object-safe handler stored in the registry.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Invokes the tool with arguments that already passed validation.
    async fn invoke(&self, args: ValidatedArgs) -> Result<ToolCallResult, ToolError>;
}

struct Typed<T>(T);

#[async_trait]
impl<T: Tool> ToolHandler for Typed<T> {
    async fn invoke(&self, args: ValidatedArgs) -> Result<ToolCallResult, ToolError> {
        let args: T::Args =
            serde_json::from_value(args.into_value()).map_err(ToolError::Arguments)?;
        self.0.call(args).await
    }
}

/// A registered tool: metadata plus its handler.
#[derive(Clone)]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Declared arguments.
    pub input_schema: InputSchema,
    /// The type-erased handler.
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    /// Builds a descriptor from a typed tool.
    #[must_use]
    pub fn new<T: Tool>(tool: T) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.input_schema(),
            handler: Arc::new(Typed(tool)),
        }
    }

    /// Returns the `tools/list` view of this descriptor.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.to_json_schema(),
        }
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}
