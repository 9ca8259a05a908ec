//! Weather dashboard, city search and per-user settings

pub mod charts;
pub mod views;

use axum::{
    Extension, Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::analysis::{AnalysisResult, ComfortLevel, DisplayUnit, ForecastSample, analyze};
use crate::auth::CurrentUser;
use crate::users::UserRecord;
use crate::weather::{AirQuality, CurrentConditions, ForecastProvider, ForecastRange};
use crate::web::AppState;
use crate::{Result, WeatherDashError};

/// One forecast step as shown on the page, temperatures already in the display unit
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub label: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: Option<f64>,
    pub description: String,
    pub precipitation_percent: f64,
    pub comfort: ComfortLevel,
    pub comfort_index: f64,
}

/// Everything the dashboard page renders
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub username: String,
    pub city: String,
    pub unit: DisplayUnit,
    pub range: ForecastRange,
    pub current: CurrentConditions,
    pub air: Option<AirQuality>,
    pub points: Vec<ForecastPoint>,
    pub analysis: AnalysisResult,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub city: Option<String>,
    pub range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub search_city: String,
}

#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub temp_unit: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(show_dashboard))
        .route("/dashboard/search", post(search))
        .route("/settings", get(show_settings))
        .route("/update_settings", post(update_settings))
}

/// Fetch weather for `city` and run the forecast analysis over the selected range
#[tracing::instrument(skip(provider))]
pub async fn load_dashboard(
    provider: &dyn ForecastProvider,
    username: &str,
    city: &str,
    unit: DisplayUnit,
    range: ForecastRange,
) -> Result<DashboardData> {
    let (current, series) =
        futures::try_join!(provider.current_weather(city), provider.forecast(city))?;

    let air = match provider
        .air_quality(current.coord.lat, current.coord.lon)
        .await
    {
        Ok(air) => Some(air),
        Err(e) => {
            warn!("Air quality unavailable for {}: {}", city, e);
            None
        }
    };

    let window = series.window(range);
    let samples = ForecastSample::validate_all(&window)?;
    let analysis = analyze(&samples, unit)?;

    let points = window
        .iter()
        .zip(&samples)
        .map(|(entry, sample)| ForecastPoint {
            label: series.time_label(entry, range),
            temperature: unit.convert(sample.temperature_celsius),
            humidity: sample.humidity_percent,
            wind_speed: entry.wind.speed,
            pressure: entry.main.pressure,
            description: entry.description().to_string(),
            precipitation_percent: entry.precipitation_percent(),
            comfort: sample.comfort_level(),
            comfort_index: sample.comfort_index(),
        })
        .collect();

    Ok(DashboardData {
        username: username.to_string(),
        city: city.to_string(),
        unit,
        range,
        current,
        air,
        points,
        analysis,
    })
}

async fn current_record(state: &AppState, username: &str) -> Result<UserRecord> {
    state
        .users
        .load(username)
        .await?
        .ok_or_else(|| WeatherDashError::validation(format!("unknown user '{username}'")))
}

#[tracing::instrument(skip(state))]
async fn show_dashboard(
    State(state): State<AppState>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let user = match current_record(&state, &username).await {
        Ok(user) => user,
        Err(e) => {
            error!("Could not load user '{}': {}", username, e);
            return Redirect::to("/logout").into_response();
        }
    };

    let city = query
        .city
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(&user.city)
        .to_string();
    let range = ForecastRange::from_query(query.range.as_deref());

    match load_dashboard(
        state.provider.as_ref(),
        &username,
        &city,
        user.temp_unit,
        range,
    )
    .await
    {
        Ok(data) => {
            let labels: Vec<String> = data.points.iter().map(|p| p.label.clone()).collect();
            views::dashboard_page(&data, &labels).into_response()
        }
        Err(e) => {
            warn!("Dashboard for '{}' failed: {}", city, e);
            views::error_page(&username, &city, &e.user_message()).into_response()
        }
    }
}

async fn search(Form(form): Form<SearchForm>) -> Redirect {
    let city = form.search_city.trim();
    if city.is_empty() {
        return Redirect::to("/dashboard");
    }
    Redirect::to(&format!("/dashboard?city={}", urlencoding::encode(city)))
}

async fn show_settings(
    State(state): State<AppState>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> Response {
    match current_record(&state, &username).await {
        Ok(user) => views::settings_page(&user).into_response(),
        Err(e) => {
            error!("Could not load user '{}': {}", username, e);
            Redirect::to("/logout").into_response()
        }
    }
}

#[tracing::instrument(skip(state, form))]
async fn update_settings(
    State(state): State<AppState>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Form(form): Form<SettingsForm>,
) -> Response {
    let unit: DisplayUnit = match form.temp_unit.parse() {
        Ok(unit) => unit,
        Err(e) => {
            let err = WeatherDashError::validation(e.to_string());
            warn!("Rejected settings for '{}': {}", username, err);
            return (
                StatusCode::BAD_REQUEST,
                views::problem_page("Invalid Request", &err.user_message()),
            )
                .into_response();
        }
    };

    let city = form.city.trim();
    if city.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            views::problem_page("Invalid Request", "A default city is required."),
        )
            .into_response();
    }

    match state.users.update_preferences(&username, city, unit).await {
        Ok(_) => {
            info!("Saved settings for '{}': {} / {}", username, city, unit);
            Redirect::to("/dashboard").into_response()
        }
        Err(e) => {
            error!("Failed to save settings for '{}': {}", username, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                views::problem_page("Settings Not Saved", &e.user_message()),
            )
                .into_response()
        }
    }
}
