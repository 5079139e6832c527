//! Weather lookup tool.
//!
//! Returns fixed demonstration data; there is no upstream weather service.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{Tool, ToolCallResult, ToolError};
use crate::schema::{InputSchema, ParamSpec, ParamType};

/// Reported temperature in degrees Celsius.
const SAMPLE_TEMPERATURE_C: f64 = 22.0;

/// Temperature unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    /// Degrees Celsius.
    Celsius,
    /// Degrees Fahrenheit.
    Fahrenheit,
}

impl TemperatureUnit {
    fn convert(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius.mul_add(9.0 / 5.0, 32.0),
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

/// Validated weather arguments.
#[derive(Debug, Deserialize)]
pub struct WeatherArgs {
    /// Place to report on.
    pub location: String,
    /// Unit for the temperature.
    pub unit: TemperatureUnit,
}

/// Gets weather information for a location.
#[derive(Debug, Clone, Copy, Default)]
pub struct Weather;

#[async_trait]
impl Tool for Weather {
    type Args = WeatherArgs;

    fn name(&self) -> &'static str {
        "weather"
    }

    fn description(&self) -> &'static str {
        "Gets weather information for a location"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .param(
                ParamSpec::required("location", ParamType::String)
                    .with_description("City or place name"),
            )
            .param(
                ParamSpec::optional("unit", ParamType::Enum(vec!["celsius", "fahrenheit"]))
                    .with_default(json!("celsius"))
                    .with_description("Temperature unit"),
            )
    }

    async fn call(&self, args: WeatherArgs) -> Result<ToolCallResult, ToolError> {
        if args.location.trim().is_empty() {
            return Ok(ToolCallResult::error("Location must not be empty"));
        }

        let temperature = args.unit.convert(SAMPLE_TEMPERATURE_C);
        let report = json!({
            "location": args.location,
            "temperature": format!("{temperature:.1}{}", args.unit.suffix()),
            "condition": "Sunny",
            "humidity": "65%",
        });

        Ok(ToolCallResult::text(report.to_string()).with_structured(report))
    }
}
