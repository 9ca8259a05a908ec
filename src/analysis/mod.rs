//! Weather analysis module
//!
//! Pure, synchronous building blocks for turning forecast samples into
//! presentation-ready insight:
//! - Temperature unit conversion (absolute values and deltas)
//! - Temperature trend classification over a forecast window
//! - Per-timestep comfort levels and their display glyphs

pub mod comfort;
pub mod engine;
pub mod error;
pub mod units;

pub use comfort::{ComfortLevel, FALLBACK_EMOJI, comfort_emoji};
pub use engine::{AnalysisResult, ForecastSample, SampleReadings, TrendLabel, analyze};
pub use error::{AnalysisError, SampleField};
pub use units::{
    DisplayUnit, convert_temperature, convert_temperature_lenient, convert_temperature_strict,
};
