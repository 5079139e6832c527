//! Tool input schemas and argument validation.
//!
//! An [`InputSchema`] is an ordered list of declared parameters. It serves two
//! purposes:
//!
//! - It renders the JSON Schema object advertised in `tools/list`.
//! - It validates the raw `arguments` payload of a `tools/call` request before
//!   the tool handler sees it, substituting defaults and dropping undeclared
//!   parameters.
//!
//! Validation is pure and synchronous.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// The type of a declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// Any JSON string.
    String,
    /// Any finite JSON number.
    Number,
    /// A string drawn from a fixed set of literals.
    Enum(Vec<&'static str>),
}

/// A single declared parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Parameter name (key in the arguments object).
    pub name: &'static str,
    /// Expected type.
    pub kind: ParamType,
    /// Whether the caller must supply it.
    pub required: bool,
    /// Value substituted when the parameter is absent.
    pub default: Option<Value>,
    /// Human-readable description.
    pub description: Option<&'static str>,
}

impl ParamSpec {
    /// Declares a required parameter.
    #[must_use]
    pub const fn required(name: &'static str, kind: ParamType) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
            description: None,
        }
    }

    /// Declares an optional parameter.
    #[must_use]
    pub const fn optional(name: &'static str, kind: ParamType) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            description: None,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the description.
    #[must_use]
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    fn check(&self, value: &Value) -> Result<(), ValidationReason> {
        match &self.kind {
            ParamType::String => value
                .is_string()
                .then_some(())
                .ok_or(ValidationReason::TypeMismatch),
            ParamType::Number => match value.as_f64() {
                Some(n) if n.is_finite() => Ok(()),
                _ => Err(ValidationReason::TypeMismatch),
            },
            ParamType::Enum(literals) => {
                let s = value.as_str().ok_or(ValidationReason::TypeMismatch)?;
                if literals.contains(&s) {
                    Ok(())
                } else {
                    Err(ValidationReason::InvalidEnumValue)
                }
            }
        }
    }

    fn to_json_schema(&self) -> Value {
        let mut prop = match &self.kind {
            ParamType::String => json!({ "type": "string" }),
            ParamType::Number => json!({ "type": "number" }),
            ParamType::Enum(literals) => json!({ "type": "string", "enum": literals }),
        };
        if let Some(obj) = prop.as_object_mut() {
            if let Some(description) = self.description {
                obj.insert("description".to_string(), json!(description));
            }
            if let Some(default) = &self.default {
                obj.insert("default".to_string(), default.clone());
            }
        }
        prop
    }
}

/// Declared arguments of a tool.
#[derive(Debug, Clone, Default)]
pub struct InputSchema {
    params: Vec<ParamSpec>,
}

impl InputSchema {
    /// Creates an empty schema.
    #[must_use]
    pub const fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Appends a parameter declaration.
    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Returns the declared parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Renders the schema as a JSON Schema object.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validates raw arguments against this schema.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first offending parameter.
    pub fn validate(&self, raw: Option<&Value>) -> Result<ValidatedArgs, ValidationError> {
        validate(self, raw)
    }
}

/// Arguments that passed validation, with defaults applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs(Map<String, Value>);

impl ValidatedArgs {
    /// Returns a validated value by parameter name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Converts the record into a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Why a parameter was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    /// A required parameter was absent.
    Missing,
    /// The value had the wrong JSON type or was not a finite number.
    TypeMismatch,
    /// The value was not one of the declared literals.
    InvalidEnumValue,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::TypeMismatch => write!(f, "type_mismatch"),
            Self::InvalidEnumValue => write!(f, "invalid_enum_value"),
        }
    }
}

/// An argument failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument '{parameter_path}': {reason}")]
pub struct ValidationError {
    /// Path of the offending parameter.
    pub parameter_path: String,
    /// What was wrong with it.
    pub reason: ValidationReason,
}

impl ValidationError {
    fn new(parameter_path: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            parameter_path: parameter_path.into(),
            reason,
        }
    }
}

/// Validates `raw` against `schema`.
///
/// Absent or `null` arguments are treated as an empty object. An explicit
/// `null` parameter value counts as absent.
///
/// # Errors
///
/// Returns a [`ValidationError`] for the first declared parameter that is
/// missing, has the wrong type, or is outside its enum.
pub fn validate(schema: &InputSchema, raw: Option<&Value>) -> Result<ValidatedArgs, ValidationError> {
    let empty = Map::new();
    let args = match raw {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(obj)) => obj,
        Some(_) => {
            return Err(ValidationError::new(
                "arguments",
                ValidationReason::TypeMismatch,
            ))
        }
    };

    let mut validated = Map::new();
    for spec in &schema.params {
        match args.get(spec.name).filter(|v| !v.is_null()) {
            Some(value) => {
                spec.check(value)
                    .map_err(|reason| ValidationError::new(spec.name, reason))?;
                validated.insert(spec.name.to_string(), value.clone());
            }
            None => {
                if let Some(default) = &spec.default {
                    validated.insert(spec.name.to_string(), default.clone());
                } else if spec.required {
                    return Err(ValidationError::new(spec.name, ValidationReason::Missing));
                }
            }
        }
    }

    Ok(ValidatedArgs(validated))
}
