//! Ordered tool registry.
//!
//! Tools are registered during startup, before the registry is handed to the
//! dispatcher. After that it is only read, so no locking is needed.

use indexmap::IndexMap;

use super::{Calculator, ToolDescriptor, Weather};
use crate::error::RegistryError;

/// Longest accepted tool name.
const MAX_TOOL_NAME_LEN: usize = 64;

/// Tool names are 1-64 ASCII letters, digits, `_` or `-`.
fn is_valid_tool_name(name: &str) -> bool {
    (1..=MAX_TOOL_NAME_LEN).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Mapping from tool name to descriptor, in registration order.
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    tools: IndexMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in tools.
    ///
    /// # Errors
    ///
    /// Returns an error if two built-in tools share a name.
    pub fn with_builtin_tools() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(ToolDescriptor::new(Calculator))?;
        registry.register(ToolDescriptor::new(Weather))?;
        Ok(registry)
    }

    /// Adds a tool.
    ///
    /// The registry is left unchanged on failure.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] if the name is taken, or
    /// [`RegistryError::InvalidToolName`] if it is not a valid tool name.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), RegistryError> {
        if !is_valid_tool_name(&descriptor.name) {
            return Err(RegistryError::InvalidToolName {
                name: descriptor.name,
            });
        }
        if self.tools.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateTool {
                name: descriptor.name,
            });
        }

        tracing::debug!(tool = %descriptor.name, "Registered tool");
        self.tools.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Returns the tools in registration order.
    pub fn list(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
