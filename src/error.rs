//! Error types and handling for the `WeatherDash` application

use thiserror::Error;

use crate::analysis::AnalysisError;

/// Main error type for the `WeatherDash` application
#[derive(Error, Debug)]
pub enum WeatherDashError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Forecast provider communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// User store and cache errors
    #[error("Storage error: {message}")]
    Store { message: String },

    /// Forecast analysis errors
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherDashError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherDashError::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            WeatherDashError::Api { message } => {
                format!("Unable to get weather information: {message}")
            }
            WeatherDashError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            WeatherDashError::Store { .. } => {
                "Unable to access saved data. Please try again later.".to_string()
            }
            WeatherDashError::Analysis(AnalysisError::EmptyInput) => {
                "No forecast data available for this location.".to_string()
            }
            WeatherDashError::Analysis(err) => {
                format!("Forecast data could not be analyzed: {err}")
            }
            WeatherDashError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest_middleware::Error> for WeatherDashError {
    fn from(err: reqwest_middleware::Error) -> Self {
        WeatherDashError::api(err.to_string())
    }
}

impl From<reqwest::Error> for WeatherDashError {
    fn from(err: reqwest::Error) -> Self {
        WeatherDashError::api(err.to_string())
    }
}

impl From<fjall::Error> for WeatherDashError {
    fn from(err: fjall::Error) -> Self {
        WeatherDashError::store(err.to_string())
    }
}

impl From<postcard::Error> for WeatherDashError {
    fn from(err: postcard::Error) -> Self {
        WeatherDashError::store(format!("encoding failed: {err}"))
    }
}

impl From<tokio::task::JoinError> for WeatherDashError {
    fn from(err: tokio::task::JoinError) -> Self {
        WeatherDashError::store(format!("background task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SampleField;

    #[test]
    fn test_error_creation() {
        let config_err = WeatherDashError::config("missing API key");
        assert!(matches!(config_err, WeatherDashError::Config { .. }));

        let api_err = WeatherDashError::api("connection failed");
        assert!(matches!(api_err, WeatherDashError::Api { .. }));

        let validation_err = WeatherDashError::validation("empty city");
        assert!(matches!(validation_err, WeatherDashError::Validation { .. }));

        let store_err = WeatherDashError::store("disk full");
        assert!(matches!(store_err, WeatherDashError::Store { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = WeatherDashError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = WeatherDashError::api("city not found");
        assert!(api_err.user_message().contains("city not found"));

        let validation_err = WeatherDashError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));

        let empty: WeatherDashError = AnalysisError::EmptyInput.into();
        assert!(empty.user_message().contains("No forecast data"));
    }

    #[test]
    fn test_analysis_error_conversion() {
        let err: WeatherDashError = AnalysisError::MalformedSample {
            index: 3,
            field: SampleField::Humidity,
        }
        .into();
        assert!(matches!(err, WeatherDashError::Analysis(_)));
        assert!(err.to_string().contains("sample 3"));
        assert!(err.to_string().contains("humidity"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WeatherDashError = io_err.into();
        assert!(matches!(err, WeatherDashError::Io { .. }));
    }
}
