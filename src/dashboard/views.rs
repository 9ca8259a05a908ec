//! Server-rendered HTML pages
//!
//! Each page is an askama template under `templates/`; values are
//! HTML-escaped by the template engine.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use super::charts::{self, Chart, ChartKind};
use super::{DashboardData, ForecastPoint};
use crate::analysis::DisplayUnit;
use crate::users::UserRecord;
use crate::weather::{CurrentConditions, ForecastRange};

/// Renders the wrapped template as an HTML response, 500 if rendering fails
pub struct HtmlTemplate<T>(pub T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!("Failed to render template: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
        }
    }
}

#[derive(Template)]
#[template(path = "auth.html")]
pub struct AuthTemplate {
    pub title: &'static str,
    pub register: bool,
}

#[must_use]
pub fn login_page() -> HtmlTemplate<AuthTemplate> {
    HtmlTemplate(AuthTemplate {
        title: "Login",
        register: false,
    })
}

#[must_use]
pub fn register_page() -> HtmlTemplate<AuthTemplate> {
    HtmlTemplate(AuthTemplate {
        title: "Register",
        register: true,
    })
}

pub struct ChartPanel<'a> {
    pub title: &'static str,
    pub chart: Chart<'a>,
}

pub struct TimelineStep<'a> {
    pub time: &'a str,
    pub emoji: &'static str,
    pub level: &'static str,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate<'a> {
    pub title: &'static str,
    pub username: &'a str,
    pub city: &'a str,
    pub back_to_dashboard: bool,
    pub city_query: String,
    pub week: bool,
    pub symbol: &'static str,
    pub current: &'a CurrentConditions,
    pub temperature: f64,
    pub feels_like: f64,
    pub aqi_summary: Option<String>,
    pub pollutants: Vec<(&'static str, f64)>,
    pub charts: Vec<ChartPanel<'a>>,
    pub trend: &'static str,
    pub spread: f64,
    pub trend_chart: Chart<'a>,
    pub comfort_chart: Chart<'a>,
    pub timeline: Vec<TimelineStep<'a>>,
    pub forecast_title: &'static str,
    pub points: &'a [ForecastPoint],
}

fn line_chart<'a>(
    canvas_id: &'a str,
    label: &'a str,
    labels: &'a [String],
    values: Vec<Option<f64>>,
    color: charts::ChartColor,
) -> Chart<'a> {
    Chart {
        canvas_id,
        kind: ChartKind::Line,
        label,
        labels,
        values,
        color,
    }
}

#[must_use]
pub fn dashboard_page<'a>(
    data: &'a DashboardData,
    labels: &'a [String],
) -> HtmlTemplate<DashboardTemplate<'a>> {
    let points = &data.points;
    let temperatures =
        || -> Vec<Option<f64>> { points.iter().map(|p| Some(p.temperature)).collect() };

    let panels = vec![
        ChartPanel {
            title: "Temperature Trend",
            chart: line_chart(
                "tempChart",
                "Temperature",
                labels,
                temperatures(),
                charts::TEMPERATURE,
            ),
        },
        ChartPanel {
            title: "Humidity Trend",
            chart: line_chart(
                "humidityChart",
                "Humidity",
                labels,
                points.iter().map(|p| Some(p.humidity)).collect(),
                charts::HUMIDITY,
            ),
        },
        ChartPanel {
            title: "Wind Speed Trend",
            chart: line_chart(
                "windChart",
                "Wind Speed",
                labels,
                points.iter().map(|p| Some(p.wind_speed)).collect(),
                charts::WIND,
            ),
        },
        ChartPanel {
            title: "Air Pressure Trend",
            chart: line_chart(
                "pressureChart",
                "Air Pressure",
                labels,
                points.iter().map(|p| p.pressure).collect(),
                charts::PRESSURE,
            ),
        },
    ];

    let pollutants = data
        .air
        .as_ref()
        .map(|air| {
            let c = &air.components;
            vec![
                ("PM2.5", c.pm2_5),
                ("PM10", c.pm10),
                ("CO", c.co),
                ("NO2", c.no2),
                ("O3", c.o3),
            ]
        })
        .unwrap_or_default();

    let timeline = points
        .iter()
        .zip(&data.analysis.comfort_levels)
        .map(|(point, level)| TimelineStep {
            time: &point.label,
            emoji: level.emoji(),
            level: level.label(),
        })
        .collect();

    HtmlTemplate(DashboardTemplate {
        title: "Weather Dashboard",
        username: &data.username,
        city: &data.city,
        back_to_dashboard: false,
        city_query: urlencoding::encode(&data.city).into_owned(),
        week: data.range == ForecastRange::Week,
        symbol: data.unit.symbol(),
        current: &data.current,
        temperature: data.unit.convert(data.current.main.temp),
        feels_like: data.unit.convert(data.current.main.feels_like),
        aqi_summary: data
            .air
            .as_ref()
            .map(|air| format!("{} - {}", air.aqi, air.label())),
        pollutants,
        charts: panels,
        trend: data.analysis.temperature_trend.label(),
        spread: data.analysis.temperature_spread,
        trend_chart: line_chart(
            "tempTrendChart",
            "Temperature Change",
            labels,
            temperatures(),
            charts::TEMPERATURE,
        ),
        comfort_chart: Chart {
            canvas_id: "comfortChart",
            kind: ChartKind::Bar,
            label: "Comfort Index",
            labels,
            values: points.iter().map(|p| Some(p.comfort_index)).collect(),
            color: charts::COMFORT,
        },
        timeline,
        forecast_title: match data.range {
            ForecastRange::Day => "24-hour Forecast",
            ForecastRange::Week => "5-day Forecast",
        },
        points,
    })
}

/// Dashboard shell shown when weather could not be loaded
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub title: &'static str,
    pub username: &'a str,
    pub city: &'a str,
    pub back_to_dashboard: bool,
    pub message: &'a str,
}

#[must_use]
pub fn error_page<'a>(
    username: &'a str,
    city: &'a str,
    message: &'a str,
) -> HtmlTemplate<ErrorTemplate<'a>> {
    HtmlTemplate(ErrorTemplate {
        title: "Weather Dashboard",
        username,
        city,
        back_to_dashboard: false,
        message,
    })
}

#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate<'a> {
    pub title: &'static str,
    pub username: &'a str,
    pub city: &'a str,
    pub back_to_dashboard: bool,
    pub celsius: bool,
}

#[must_use]
pub fn settings_page(user: &UserRecord) -> HtmlTemplate<SettingsTemplate<'_>> {
    HtmlTemplate(SettingsTemplate {
        title: "Settings",
        username: &user.name,
        city: &user.city,
        back_to_dashboard: true,
        celsius: user.temp_unit == DisplayUnit::Celsius,
    })
}

/// Standalone page for a rejected or failed settings request
#[derive(Template)]
#[template(path = "problem.html")]
pub struct ProblemTemplate<'a> {
    pub title: &'a str,
    pub message: &'a str,
}

#[must_use]
pub fn problem_page<'a>(heading: &'a str, message: &'a str) -> HtmlTemplate<ProblemTemplate<'a>> {
    HtmlTemplate(ProblemTemplate {
        title: heading,
        message,
    })
}
