use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::analysis::SampleReadings;

pub mod open_weather_map;

pub use open_weather_map::OpenWeatherMapProvider;

/// Number of three-hour forecast entries covering one day
pub const ENTRIES_PER_DAY: usize = 8;
/// Maximum number of days shown for the weekly range
pub const MAX_WEEK_DAYS: usize = 7;

/// Source of current conditions, forecasts and air quality for a city
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn current_weather(&self, city: &str) -> Result<CurrentConditions>;

    async fn forecast(&self, city: &str) -> Result<ForecastSeries>;

    async fn air_quality(&self, lat: f64, lon: f64) -> Result<AirQuality>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Wind speed in m/s
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SunTimes {
    #[serde(default)]
    pub sunrise: i64,
    #[serde(default)]
    pub sunset: i64,
}

/// Readings block of a current-weather response, in metric units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// Current weather for a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub name: String,
    pub coord: Coordinates,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub main: CurrentReadings,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub sys: SunTimes,
    /// Shift in seconds from UTC
    #[serde(default)]
    pub timezone: i32,
}

impl CurrentConditions {
    #[must_use]
    pub fn description(&self) -> &str {
        self.weather.first().map_or("", |c| c.description.as_str())
    }

    #[must_use]
    pub fn sunrise_label(&self) -> String {
        local_time_label(self.sys.sunrise, self.timezone, "%H:%M:%S")
    }

    #[must_use]
    pub fn sunset_label(&self) -> String {
        local_time_label(self.sys.sunset, self.timezone, "%H:%M:%S")
    }
}

/// Readings block of a forecast entry. Any field may be absent in the raw feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastReadings {
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
}

/// One three-hour forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Unix timestamp (seconds)
    pub dt: i64,
    #[serde(default)]
    pub main: ForecastReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Wind,
    /// Probability of precipitation, 0..=1
    #[serde(default)]
    pub pop: f64,
}

impl ForecastEntry {
    #[must_use]
    pub fn description(&self) -> &str {
        self.weather.first().map_or("", |c| c.description.as_str())
    }

    /// Whole percent, truncated
    #[must_use]
    pub fn precipitation_percent(&self) -> f64 {
        (self.pop * 100.0).trunc()
    }
}

impl SampleReadings for ForecastEntry {
    fn temperature_celsius(&self) -> Option<f64> {
        self.main.temp
    }

    fn humidity_percent(&self) -> Option<f64> {
        self.main.humidity
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    #[serde(default)]
    pub name: String,
    /// Shift in seconds from UTC
    #[serde(default)]
    pub timezone: i32,
}

/// Five-day forecast in three-hour steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
    #[serde(default)]
    pub city: ForecastCity,
}

impl ForecastSeries {
    /// Entries covered by `range`, in feed order
    #[must_use]
    pub fn window(&self, range: ForecastRange) -> Vec<&ForecastEntry> {
        range.select(&self.list)
    }

    #[must_use]
    pub fn time_label(&self, entry: &ForecastEntry, range: ForecastRange) -> String {
        local_time_label(entry.dt, self.city.timezone, range.time_format())
    }
}

/// Pollutant concentrations in μg/m³
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AirComponents {
    #[serde(default)]
    pub co: f64,
    #[serde(default)]
    pub no2: f64,
    #[serde(default)]
    pub o3: f64,
    #[serde(default)]
    pub pm2_5: f64,
    #[serde(default)]
    pub pm10: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    /// Air quality index, 1 (best) to 5 (worst)
    pub aqi: u8,
    pub components: AirComponents,
}

impl AirQuality {
    #[must_use]
    pub fn label(&self) -> &'static str {
        aqi_label(self.aqi)
    }
}

#[must_use]
pub fn aqi_label(aqi: u8) -> &'static str {
    match aqi {
        1 => "Excellent",
        2 => "Good",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        _ => "Unknown",
    }
}

/// Time span shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastRange {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
}

impl ForecastRange {
    /// Anything other than `"7d"` means the next 24 hours
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("7d") => Self::Week,
            _ => Self::Day,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
        }
    }

    #[must_use]
    pub fn time_format(&self) -> &'static str {
        match self {
            Self::Day => "%H:%M",
            Self::Week => "%m-%d",
        }
    }

    /// Day: the first eight steps. Week: every eighth step, at most seven.
    #[must_use]
    pub fn select<'a>(&self, entries: &'a [ForecastEntry]) -> Vec<&'a ForecastEntry> {
        match self {
            Self::Day => entries.iter().take(ENTRIES_PER_DAY).collect(),
            Self::Week => entries
                .iter()
                .step_by(ENTRIES_PER_DAY)
                .take(MAX_WEEK_DAYS)
                .collect(),
        }
    }
}

/// Format a unix timestamp in the given UTC offset
#[must_use]
pub fn local_time_label(timestamp: i64, offset_seconds: i32, format: &str) -> String {
    let offset = FixedOffset::east_opt(offset_seconds).unwrap_or_else(|| Utc.fix());
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|utc| utc.with_timezone(&offset).format(format).to_string())
        .unwrap_or_default()
}
