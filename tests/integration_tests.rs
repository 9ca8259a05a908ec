//! Integration tests for the WeatherDash web application

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use tower::ServiceExt;

use weatherdash::analysis::DisplayUnit;
use weatherdash::weather::{
    AirComponents, AirQuality, Coordinates, CurrentConditions, CurrentReadings, ForecastCity,
    ForecastEntry, ForecastProvider, ForecastReadings, ForecastSeries, SunTimes, Wind,
};
use weatherdash::{
    AppState, InMemoryUserStore, UserRecord, UserStore, WeatherDashConfig, WeatherDashError,
    build_router,
};

const FORM: &str = "application/x-www-form-urlencoded";

/// Provider with fixed data; "Atlantis" does not exist
struct CannedProvider;

#[async_trait]
impl ForecastProvider for CannedProvider {
    async fn current_weather(&self, city: &str) -> weatherdash::Result<CurrentConditions> {
        if city == "Atlantis" {
            return Err(WeatherDashError::api("city not found"));
        }
        Ok(CurrentConditions {
            name: city.to_string(),
            coord: Coordinates {
                lat: 52.52,
                lon: 13.41,
            },
            weather: vec![],
            main: CurrentReadings {
                temp: 20.0,
                feels_like: 19.0,
                humidity: 55.0,
                pressure: 1012.0,
            },
            wind: Wind { speed: 3.5 },
            sys: SunTimes {
                sunrise: 1_704_092_400,
                sunset: 1_704_121_200,
            },
            timezone: 3600,
        })
    }

    async fn forecast(&self, _city: &str) -> weatherdash::Result<ForecastSeries> {
        let list = (0..40)
            .map(|i| ForecastEntry {
                dt: 1_704_067_200 + i64::from(i) * 3 * 3600,
                main: ForecastReadings {
                    temp: Some(18.0 + f64::from(i % 8)),
                    humidity: Some(50.0),
                    pressure: Some(1013.0),
                },
                weather: vec![],
                wind: Wind { speed: 4.0 },
                pop: 0.1,
            })
            .collect();
        Ok(ForecastSeries {
            list,
            city: ForecastCity {
                name: "Berlin".to_string(),
                timezone: 3600,
            },
        })
    }

    async fn air_quality(&self, _lat: f64, _lon: f64) -> weatherdash::Result<AirQuality> {
        Ok(AirQuality {
            aqi: 2,
            components: AirComponents {
                pm2_5: 8.25,
                ..AirComponents::default()
            },
        })
    }
}

fn test_app() -> (Router, Arc<InMemoryUserStore>) {
    let users = Arc::new(InMemoryUserStore::with_users([UserRecord::new(
        "alice", "secret", "Berlin",
    )]));
    let state = AppState::new(
        WeatherDashConfig::default(),
        users.clone(),
        Arc::new(CannedProvider),
    );
    (build_router(state), users)
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, FORM);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Log in and return the `Cookie` header value for the new session
async fn login(app: &Router, name: &str, pwd: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_form("/login", &format!("name={name}&pwd={pwd}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_anonymous_requests_redirect_to_login() {
    let (app, _) = test_app();
    for uri in ["/", "/dashboard", "/settings"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/login");
    }

    let response = app
        .clone()
        .oneshot(get("/dashboard", Some("weatherdash_session=forged")))
        .await
        .unwrap();
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_login_and_register_pages_are_public() {
    let (app, _) = test_app();
    let response = app.clone().oneshot(get("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Account Login"));

    let response = app.oneshot(get("/register", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Create Account"));
}

#[tokio::test]
async fn test_rejected_logins() {
    let (app, _) = test_app();
    for body in ["name=alice&pwd=wrong", "name=bob&pwd=secret", "name=&pwd="] {
        let response = app
            .clone()
            .oneshot(post_form("/login", body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}

#[tokio::test]
async fn test_root_redirects_logged_in_user_to_dashboard() {
    let (app, _) = test_app();
    let cookie = login(&app, "alice", "secret").await;
    let response = app.oneshot(get("/", Some(&cookie))).await.unwrap();
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_dashboard_renders_analysis() {
    let (app, _) = test_app();
    let cookie = login(&app, "alice", "secret").await;

    let response = app
        .oneshot(get("/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    assert!(html.contains("Welcome back, alice!"));
    assert!(html.contains("Berlin · Current Weather"));
    assert!(html.contains("20.0°C"));
    assert!(html.contains("2 - Good"));
    assert!(html.contains("8.2μg/m³") || html.contains("8.3μg/m³"));
    assert!(html.contains("Temperature Fluctuation"));
    assert!(html.contains("7.0°C"));
    assert!(html.contains("24-hour Forecast"));
    assert!(html.contains("tempChart"));
    assert!(html.contains("comfortChart"));
    // first step is 00:00 UTC, shown at the city's +01:00 offset
    assert!(html.contains("01:00"));
}

#[tokio::test]
async fn test_weekly_range() {
    let (app, _) = test_app();
    let cookie = login(&app, "alice", "secret").await;

    let response = app
        .oneshot(get("/dashboard?range=7d", Some(&cookie)))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("5-day Forecast"));
    // every eighth step has the same temperature, so the window is flat
    assert!(html.contains("Stable"));
    assert!(html.contains("01-01"));
    assert!(html.contains("01-05"));
}

#[tokio::test]
async fn test_unknown_city_renders_error_page() {
    let (app, _) = test_app();
    let cookie = login(&app, "alice", "secret").await;

    let response = app
        .oneshot(get("/dashboard?city=Atlantis", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Failed to Get Weather Information"));
    assert!(html.contains("Unable to get weather information: city not found"));
    assert!(html.contains("value=\"Atlantis\""));
}

#[tokio::test]
async fn test_search_city_is_escaped_and_encoded() {
    let (app, _) = test_app();
    let cookie = login(&app, "alice", "secret").await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/dashboard/search",
            "search_city=New+York",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard?city=New%20York");

    let response = app
        .oneshot(get(
            "/dashboard?city=%3Cscript%3Ealert(1)%3C%2Fscript%3E",
            Some(&cookie),
        ))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("alert(1)"));
    assert!(!html.contains("<script>alert(1)"));
    assert!(html.contains("city=%3Cscript%3Ealert%281%29%3C%2Fscript%3E&amp;range=7d"));
}

#[tokio::test]
async fn test_update_settings() {
    let (app, users) = test_app();
    let cookie = login(&app, "alice", "secret").await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/update_settings",
            "city=Paris&temp_unit=K",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let alice = users.load("alice").await.unwrap().unwrap();
    assert_eq!(alice.city, "Berlin");

    let response = app
        .clone()
        .oneshot(post_form(
            "/update_settings",
            "city=Paris&temp_unit=F",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
    let alice = users.load("alice").await.unwrap().unwrap();
    assert_eq!(alice.city, "Paris");
    assert_eq!(alice.temp_unit, DisplayUnit::Fahrenheit);

    let response = app
        .clone()
        .oneshot(get("/settings", Some(&cookie)))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains(r#"value="F" checked"#));

    let response = app
        .oneshot(get("/dashboard", Some(&cookie)))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("Paris · Current Weather"));
    assert!(html.contains("68.0°F"));
    // 7 °C of spread is 12.6 °F of spread
    assert!(html.contains("12.6°F"));
}

#[tokio::test]
async fn test_register_flow() {
    let (app, users) = test_app();

    let response = app
        .clone()
        .oneshot(post_form("/register", "name=carol&pwd=pw&city=Oslo", None))
        .await
        .unwrap();
    assert_eq!(location(&response), "/login");
    let carol = users.load("carol").await.unwrap().unwrap();
    assert_eq!(carol.city, "Oslo");
    assert_eq!(carol.temp_unit, DisplayUnit::Celsius);

    for body in ["name=carol&pwd=other&city=Rome", "name=&pwd=pw&city=Rome"] {
        let response = app
            .clone()
            .oneshot(post_form("/register", body, None))
            .await
            .unwrap();
        assert_eq!(location(&response), "/register");
    }
    let carol = users.load("carol").await.unwrap().unwrap();
    assert_eq!(carol.password, "pw");

    login(&app, "carol", "pw").await;
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (app, _) = test_app();
    let cookie = login(&app, "alice", "secret").await;

    let response = app
        .clone()
        .oneshot(get("/logout", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(location(&response), "/login");
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let response = app
        .oneshot(get("/dashboard", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_oversized_form_is_rejected() {
    let (app, users) = test_app();
    let body = format!("name=mallory&pwd={}&city=Oslo", "x".repeat(128 * 1024));
    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .header(header::CONTENT_TYPE, FORM)
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(users.load("mallory").await.unwrap().is_none());
}
