//! Forecast analysis engine
//!
//! Turns an ordered sequence of forecast samples into a temperature trend, a
//! per-sample comfort level and the temperature spread in the display unit.
//! The engine is a pure function of its arguments and holds no state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::comfort::ComfortLevel;
use super::error::{AnalysisError, Result, SampleField};
use super::units::DisplayUnit;

/// Spread (°C) above which the forecast window counts as a large gap
const LARGE_GAP_THRESHOLD_C: f64 = 8.0;
/// Spread (°C) above which the forecast window counts as fluctuating
const FLUCTUATION_THRESHOLD_C: f64 = 5.0;

/// Readings the analysis needs from a forecast timestep.
///
/// Provider records may lack fields; validated [`ForecastSample`]s never do.
pub trait SampleReadings {
    fn temperature_celsius(&self) -> Option<f64>;
    fn humidity_percent(&self) -> Option<f64>;
}

impl<T: SampleReadings + ?Sized> SampleReadings for &T {
    fn temperature_celsius(&self) -> Option<f64> {
        (**self).temperature_celsius()
    }

    fn humidity_percent(&self) -> Option<f64> {
        (**self).humidity_percent()
    }
}

/// Validated temperature and humidity of one forecast timestep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
}

impl ForecastSample {
    #[must_use]
    pub fn new(temperature_celsius: f64, humidity_percent: f64) -> Self {
        Self {
            temperature_celsius,
            humidity_percent,
        }
    }

    /// Validate the readings of the sample at `index`
    pub fn from_readings<S: SampleReadings + ?Sized>(index: usize, readings: &S) -> Result<Self> {
        let temperature_celsius = readings
            .temperature_celsius()
            .filter(|t| t.is_finite())
            .ok_or(AnalysisError::MalformedSample {
                index,
                field: SampleField::Temperature,
            })?;
        let humidity_percent = readings
            .humidity_percent()
            .ok_or(AnalysisError::MalformedSample {
                index,
                field: SampleField::Humidity,
            })?;

        Ok(Self::new(temperature_celsius, humidity_percent))
    }

    /// Validate a whole sequence, preserving order
    pub fn validate_all<S: SampleReadings>(samples: &[S]) -> Result<Vec<Self>> {
        samples
            .iter()
            .enumerate()
            .map(|(index, sample)| Self::from_readings(index, sample))
            .collect()
    }

    /// Comfort level of this sample
    #[must_use]
    pub fn comfort_level(&self) -> ComfortLevel {
        ComfortLevel::classify(self.temperature_celsius, self.humidity_percent)
    }

    /// Simple index plotted next to the comfort timeline
    #[must_use]
    pub fn comfort_index(&self) -> f64 {
        0.5 * self.temperature_celsius + 0.3 * self.humidity_percent
    }
}

impl SampleReadings for ForecastSample {
    fn temperature_celsius(&self) -> Option<f64> {
        Some(self.temperature_celsius)
    }

    fn humidity_percent(&self) -> Option<f64> {
        Some(self.humidity_percent)
    }
}

/// How much temperatures vary over the analysed window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendLabel {
    Stable,
    TemperatureFluctuation,
    LargeTemperatureGap,
}

impl TrendLabel {
    /// Classify a Celsius spread. Thresholds are exclusive.
    #[must_use]
    pub fn from_spread(spread_celsius: f64) -> Self {
        match spread_celsius {
            s if s > LARGE_GAP_THRESHOLD_C => TrendLabel::LargeTemperatureGap,
            s if s > FLUCTUATION_THRESHOLD_C => TrendLabel::TemperatureFluctuation,
            _ => TrendLabel::Stable,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TrendLabel::Stable => "Stable",
            TrendLabel::TemperatureFluctuation => "Temperature Fluctuation",
            TrendLabel::LargeTemperatureGap => "Large Temperature Gap",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of analysing a forecast window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Trend derived from the Celsius spread of the whole window
    pub temperature_trend: TrendLabel,
    /// One comfort level per input sample, in input order
    pub comfort_levels: Vec<ComfortLevel>,
    /// Max minus min temperature, scaled to the display unit
    pub temperature_spread: f64,
}

/// Analyse a forecast window for display in `unit`.
///
/// Trend thresholds and comfort bands always use Celsius; only the returned
/// spread is expressed in the display unit.
pub fn analyze<S: SampleReadings>(samples: &[S], unit: DisplayUnit) -> Result<AnalysisResult> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let samples = ForecastSample::validate_all(samples)?;

    let (min, max) = samples.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min, max), sample| {
            (
                min.min(sample.temperature_celsius),
                max.max(sample.temperature_celsius),
            )
        },
    );
    let spread_celsius = max - min;

    let comfort_levels = samples.iter().map(ForecastSample::comfort_level).collect();

    Ok(AnalysisResult {
        temperature_trend: TrendLabel::from_spread(spread_celsius),
        comfort_levels,
        temperature_spread: unit.scale_delta(spread_celsius),
    })
}
