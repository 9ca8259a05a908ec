use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, header};
use rand::RngExt;
use tokio::sync::RwLock;
use tracing::debug;

struct Session {
    username: String,
    expires_at: Instant,
}

/// In-memory login sessions keyed by a random 128-bit id
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `username` and return its id
    pub async fn create(&self, username: &str) -> String {
        let id = format!("{:032x}", rand::rng().random::<u128>());
        let session = Session {
            username: username.to_string(),
            expires_at: Instant::now() + self.ttl,
        };
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(id.clone(), session);
        debug!("Created session for '{}' ({} active)", username, sessions.len());
        id
    }

    /// Username behind a live session. Expired sessions are dropped.
    pub async fn resolve(&self, id: &str) -> Option<String> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(session) if session.expires_at > Instant::now() => {
                    return Some(session.username.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        self.sessions.write().await.remove(id);
        None
    }

    pub async fn destroy(&self, id: &str) {
        self.sessions.write().await.remove(id);
    }
}

/// `Set-Cookie` value carrying a session id
#[must_use]
pub fn session_cookie(name: &str, id: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{name}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        max_age.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie
#[must_use]
pub fn clear_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", Duration::ZERO, secure)
}

/// Value of the cookie `name` from the request's `Cookie` headers
#[must_use]
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn test_create_and_resolve() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.create("alice").await;
        assert_eq!(id.len(), 32);
        assert_eq!(store.resolve(&id).await.as_deref(), Some("alice"));
        assert_eq!(store.resolve("unknown").await, None);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = SessionStore::new(Duration::from_secs(60));
        let a = store.create("alice").await;
        let b = store.create("alice").await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped() {
        let store = SessionStore::new(Duration::ZERO);
        let id = store.create("alice").await;
        assert_eq!(store.resolve(&id).await, None);
        assert!(store.sessions.read().await.get(&id).is_none());
    }

    #[tokio::test]
    async fn test_destroy() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.create("bob").await;
        store.destroy(&id).await;
        assert_eq!(store.resolve(&id).await, None);
    }

    #[test]
    fn test_cookie_formatting() {
        let cookie = session_cookie("sid", "abc", Duration::from_secs(3600), false);
        assert_eq!(cookie, "sid=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600");

        let secure = clear_cookie("sid", true);
        assert_eq!(secure, "sid=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure");
    }

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; sid=abc123"));
        headers.append(header::COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(read_cookie(&headers, "sid"), Some("abc123"));
        assert_eq!(read_cookie(&headers, "other"), Some("1"));
        assert_eq!(read_cookie(&headers, "missing"), None);

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("sid="));
        assert_eq!(read_cookie(&empty, "sid"), None);
    }
}
