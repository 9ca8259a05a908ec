//! Login, registration and the session gate in front of every page

pub mod session;

use axum::{
    Extension, Form, Router,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::{error, info, warn};

pub use session::{SessionStore, clear_cookie, read_cookie, session_cookie};

use crate::dashboard::views;
use crate::users::UserRecord;
use crate::web::AppState;

/// Paths reachable without a session
const PUBLIC_PATHS: [&str; 2] = ["/login", "/register"];

/// Username of the logged-in user, inserted by [`require_login`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pwd: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pwd: String,
    #[serde(default)]
    pub city: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_form).post(login))
        .route("/register", get(register_form).post(register))
        .route("/logout", get(logout))
}

/// Resolve the session cookie; anonymous requests outside the public pages go to `/login`
pub async fn require_login(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = &state.config.session.cookie_name;
    let session_id = read_cookie(request.headers(), cookie_name).map(str::to_owned);
    let user = match session_id {
        Some(id) => state.sessions.resolve(&id).await,
        None => None,
    };

    match user {
        Some(name) => {
            request.extensions_mut().insert(CurrentUser(name));
            next.run(request).await
        }
        None if PUBLIC_PATHS.contains(&request.uri().path()) => next.run(request).await,
        None => Redirect::to("/login").into_response(),
    }
}

async fn index(Extension(CurrentUser(_)): Extension<CurrentUser>) -> Redirect {
    Redirect::to("/dashboard")
}

async fn login_form() -> impl IntoResponse {
    views::login_page()
}

async fn register_form() -> impl IntoResponse {
    views::register_page()
}

#[tracing::instrument(skip_all)]
async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    if form.name.is_empty() || form.pwd.is_empty() {
        return Redirect::to("/login").into_response();
    }

    let user = match state.users.verify_credentials(&form.name, &form.pwd).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Rejected login for '{}'", form.name);
            return Redirect::to("/login").into_response();
        }
        Err(e) => {
            error!("Failed to load user '{}': {}", form.name, e);
            return Redirect::to("/login").into_response();
        }
    };

    let id = state.sessions.create(&user.name).await;
    let cookie = session_cookie(
        &state.config.session.cookie_name,
        &id,
        state.sessions.ttl(),
        state.config.session.secure_cookie,
    );
    info!("User '{}' logged in", user.name);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/dashboard")).into_response()
}

#[tracing::instrument(skip_all)]
async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Redirect {
    if form.name.is_empty() || form.pwd.is_empty() {
        return Redirect::to("/register");
    }

    let record = UserRecord::new(form.name, form.pwd, form.city.trim());
    match state.users.create(record).await {
        Ok(()) => Redirect::to("/login"),
        Err(e) => {
            warn!("Registration failed: {}", e);
            Redirect::to("/register")
        }
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookie_name = &state.config.session.cookie_name;
    if let Some(id) = read_cookie(&headers, cookie_name) {
        state.sessions.destroy(id).await;
    }
    let cookie = clear_cookie(cookie_name, state.config.session.secure_cookie);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/login")).into_response()
}
