//! Basic arithmetic tool.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{Tool, ToolCallResult, ToolError};
use crate::schema::{InputSchema, ParamSpec, ParamType};

/// Arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// `a / b`
    Divide,
}

impl Operation {
    const fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }
}

/// Validated calculator arguments.
#[derive(Debug, Deserialize)]
pub struct CalculatorArgs {
    /// The operation to perform.
    pub operation: Operation,
    /// Left operand.
    pub a: f64,
    /// Right operand.
    pub b: f64,
}

/// Performs basic mathematical calculations.
///
/// Division by zero is reported as an error result rather than a protocol
/// error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calculator;

impl Calculator {
    /// Evaluates an operation, returning `None` on division by zero.
    #[must_use]
    pub fn evaluate(operation: Operation, a: f64, b: f64) -> Option<f64> {
        match operation {
            Operation::Add => Some(a + b),
            Operation::Subtract => Some(a - b),
            Operation::Multiply => Some(a * b),
            Operation::Divide if b == 0.0 => None,
            Operation::Divide => Some(a / b),
        }
    }
}

#[async_trait]
impl Tool for Calculator {
    type Args = CalculatorArgs;

    fn name(&self) -> &'static str {
        "calculator"
    }

    fn description(&self) -> &'static str {
        "Performs basic mathematical calculations"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .param(
                ParamSpec::required(
                    "operation",
                    ParamType::Enum(vec!["add", "subtract", "multiply", "divide"]),
                )
                .with_description("The arithmetic operation to perform"),
            )
            .param(ParamSpec::required("a", ParamType::Number).with_description("Left operand"))
            .param(ParamSpec::required("b", ParamType::Number).with_description("Right operand"))
    }

    async fn call(&self, args: CalculatorArgs) -> Result<ToolCallResult, ToolError> {
        let CalculatorArgs { operation, a, b } = args;

        let Some(value) = Self::evaluate(operation, a, b) else {
            tracing::debug!(a, b, "Calculator division by zero");
            return Ok(ToolCallResult::error("Error: Division by zero")
                .with_structured(json!({ "error": "division_by_zero" })));
        };

        let text = format!("{a} {} {b} = {value}", operation.symbol());
        Ok(ToolCallResult::text(text).with_structured(json!({ "result": value })))
    }
}
