//! `WeatherDash` - a multi-user weather dashboard
//!
//! This library provides forecast analysis (temperature trend, spread and
//! comfort levels), the OpenWeatherMap client, user and session handling,
//! and the axum web application that renders it all.

pub mod analysis;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod storage;
pub mod telemetry;
pub mod users;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use analysis::{AnalysisResult, ComfortLevel, DisplayUnit, ForecastSample, TrendLabel, analyze};
pub use cache::PersistentCache;
pub use config::WeatherDashConfig;
pub use error::WeatherDashError;
pub use storage::Storage;
pub use users::{FjallUserStore, InMemoryUserStore, UserRecord, UserStore};
pub use weather::{ForecastProvider, OpenWeatherMapProvider};
pub use web::{AppState, build_router, serve};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherDashError>;
