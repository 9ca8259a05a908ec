//! Comfort level classification from temperature and humidity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Glyph shown for labels that are not a known comfort level
pub const FALLBACK_EMOJI: &str = "😐";

/// Subjective comfort category of a single forecast timestep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComfortLevel {
    Cold,
    CoolAndHumid,
    CoolAndComfortable,
    MildAndHumid,
    MildAndDry,
    Comfortable,
    WarmAndHumid,
    Warm,
    HotAndHumid,
    Hot,
    ExtremelyHot,
}

impl ComfortLevel {
    pub const ALL: [ComfortLevel; 11] = [
        ComfortLevel::Cold,
        ComfortLevel::CoolAndHumid,
        ComfortLevel::CoolAndComfortable,
        ComfortLevel::MildAndHumid,
        ComfortLevel::MildAndDry,
        ComfortLevel::Comfortable,
        ComfortLevel::WarmAndHumid,
        ComfortLevel::Warm,
        ComfortLevel::HotAndHumid,
        ComfortLevel::Hot,
        ComfortLevel::ExtremelyHot,
    ];

    /// Classify a Celsius temperature and relative humidity.
    ///
    /// Bands are tested with `temp < upper`, so a value sitting exactly on a
    /// boundary belongs to the warmer band.
    #[must_use]
    pub fn classify(temperature_celsius: f64, humidity_percent: f64) -> Self {
        match temperature_celsius {
            t if t < 15.0 => ComfortLevel::Cold,
            t if t < 20.0 => {
                if humidity_percent > 70.0 {
                    ComfortLevel::CoolAndHumid
                } else {
                    ComfortLevel::CoolAndComfortable
                }
            }
            t if t < 26.0 => match humidity_percent {
                h if h > 70.0 => ComfortLevel::MildAndHumid,
                h if h < 40.0 => ComfortLevel::MildAndDry,
                _ => ComfortLevel::Comfortable,
            },
            t if t < 30.0 => {
                if humidity_percent > 70.0 {
                    ComfortLevel::WarmAndHumid
                } else {
                    ComfortLevel::Warm
                }
            }
            t if t < 35.0 => {
                if humidity_percent > 60.0 {
                    ComfortLevel::HotAndHumid
                } else {
                    ComfortLevel::Hot
                }
            }
            _ => ComfortLevel::ExtremelyHot,
        }
    }

    /// Human readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ComfortLevel::Cold => "Cold",
            ComfortLevel::CoolAndHumid => "Cool & Humid",
            ComfortLevel::CoolAndComfortable => "Cool & Comfortable",
            ComfortLevel::MildAndHumid => "Mild & Humid",
            ComfortLevel::MildAndDry => "Mild & Dry",
            ComfortLevel::Comfortable => "Comfortable",
            ComfortLevel::WarmAndHumid => "Warm & Humid",
            ComfortLevel::Warm => "Warm",
            ComfortLevel::HotAndHumid => "Hot & Humid",
            ComfortLevel::Hot => "Hot",
            ComfortLevel::ExtremelyHot => "Extremely Hot",
        }
    }

    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            ComfortLevel::Comfortable => "😊",
            ComfortLevel::MildAndDry => "😌",
            ComfortLevel::MildAndHumid => "😅",
            ComfortLevel::CoolAndComfortable => "🙂",
            ComfortLevel::CoolAndHumid => "😕",
            ComfortLevel::Cold => "🥶",
            ComfortLevel::Warm => "😎",
            ComfortLevel::WarmAndHumid => "😓",
            ComfortLevel::Hot => "🥵",
            ComfortLevel::HotAndHumid => "😰",
            ComfortLevel::ExtremelyHot => "🔥",
        }
    }

    /// Look up a level by its human readable label
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.label() == label)
    }
}

impl fmt::Display for ComfortLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Emoji for a comfort label given as text; unknown labels get [`FALLBACK_EMOJI`].
#[must_use]
pub fn comfort_emoji(label: &str) -> &'static str {
    ComfortLevel::from_label(label).map_or(FALLBACK_EMOJI, ComfortLevel::emoji)
}
