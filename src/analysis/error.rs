use std::fmt;

use thiserror::Error;

/// Field of a forecast sample the analysis depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleField {
    Temperature,
    Humidity,
}

impl fmt::Display for SampleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleField::Temperature => write!(f, "temperature"),
            SampleField::Humidity => write!(f, "humidity"),
        }
    }
}

/// Errors raised by the weather analysis engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("No forecast samples to analyze")]
    EmptyInput,

    #[error("Forecast sample {index} is missing a usable {field} value")]
    MalformedSample { index: usize, field: SampleField },

    #[error("Unsupported temperature unit '{0}', expected 'C' or 'F'")]
    InvalidUnit(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
