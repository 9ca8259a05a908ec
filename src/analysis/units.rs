//! Temperature display units and conversions.
//!
//! Provider data is always Celsius. Conversions only happen at the display edge:
//! absolute temperatures get the full affine transform, temperature differences
//! are scaled without the Fahrenheit offset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{AnalysisError, Result};

pub const CELSIUS_SYMBOL: &str = "°C";
pub const FAHRENHEIT_SYMBOL: &str = "°F";

/// Temperature scale selected for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisplayUnit {
    #[default]
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl DisplayUnit {
    /// Short code used in forms and stored preferences
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            DisplayUnit::Celsius => "C",
            DisplayUnit::Fahrenheit => "F",
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            DisplayUnit::Celsius => CELSIUS_SYMBOL,
            DisplayUnit::Fahrenheit => FAHRENHEIT_SYMBOL,
        }
    }

    /// Parse a unit code, treating anything other than `"F"` as Celsius.
    #[must_use]
    pub fn from_code_lenient(code: &str) -> Self {
        if code == "F" {
            DisplayUnit::Fahrenheit
        } else {
            DisplayUnit::Celsius
        }
    }

    /// Convert an absolute Celsius temperature into this unit
    #[must_use]
    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            DisplayUnit::Celsius => celsius,
            DisplayUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Convert a Celsius temperature difference into this unit.
    ///
    /// Only the scale factor applies; adding the Fahrenheit offset to a delta
    /// would count it twice.
    #[must_use]
    pub fn scale_delta(self, celsius_delta: f64) -> f64 {
        match self {
            DisplayUnit::Celsius => celsius_delta,
            DisplayUnit::Fahrenheit => celsius_delta * 9.0 / 5.0,
        }
    }
}

impl FromStr for DisplayUnit {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "C" => Ok(DisplayUnit::Celsius),
            "F" => Ok(DisplayUnit::Fahrenheit),
            other => Err(AnalysisError::InvalidUnit(other.to_string())),
        }
    }
}

impl fmt::Display for DisplayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Convert a Celsius value and return it together with the unit symbol
#[must_use]
pub fn convert_temperature(celsius: f64, unit: DisplayUnit) -> (f64, &'static str) {
    (unit.convert(celsius), unit.symbol())
}

/// Conversion for legacy call sites: any code other than `"F"` means Celsius.
#[must_use]
pub fn convert_temperature_lenient(celsius: f64, unit_code: &str) -> (f64, &'static str) {
    convert_temperature(celsius, DisplayUnit::from_code_lenient(unit_code))
}

/// Conversion that rejects unit codes other than `"C"` and `"F"`.
pub fn convert_temperature_strict(celsius: f64, unit_code: &str) -> Result<(f64, &'static str)> {
    let unit: DisplayUnit = unit_code.parse()?;
    Ok(convert_temperature(celsius, unit))
}
