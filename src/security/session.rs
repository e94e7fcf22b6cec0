use crate::core::config::SessionConfig;
use crate::core::state::AppState;
use crate::models::session::{Flash, FlashLevel};
use crate::utils::time::current_timestamp;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;

/// The visitor's session as seen by one request.
///
/// Mutations go straight to the session store; cookie changes are collected
/// here and attached when the handler builds its response.
#[derive(Debug, Default)]
pub struct SessionContext {
    pub id: Option<String>,
    pub user_id: Option<i64>,
    set_cookie: Option<String>,
}

impl FromRequestParts<Arc<AppState>> for SessionContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        Ok(Self::resolve(&parts.headers, state))
    }
}

impl SessionContext {
    pub fn resolve(headers: &HeaderMap, state: &AppState) -> Self {
        let now = current_timestamp();

        cookie_value(headers, &state.config.session.cookie_name)
            .and_then(|id| state.sessions.get(&id, now).map(|session| (id, session)))
            .map(|(id, session)| Self {
                id: Some(id),
                user_id: session.user_id,
                set_cookie: None,
            })
            .unwrap_or_default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Queue a flash, starting an anonymous session when the visitor has none
    pub fn flash(&mut self, state: &AppState, level: FlashLevel, message: impl Into<String>) {
        let now = current_timestamp();
        let flash = Flash::new(level, message);

        if let Some(id) = &self.id {
            if state.sessions.push_flash(id, flash.clone(), now) {
                return;
            }
        }

        let id = state.sessions.create(now);
        state.sessions.push_flash(&id, flash, now);
        self.set_cookie = Some(session_cookie(&state.config.session, &id, None));
        self.id = Some(id);
        self.user_id = None;
    }

    pub fn take_flashes(&self, state: &AppState) -> Vec<Flash> {
        match &self.id {
            Some(id) => state.sessions.take_flashes(id, current_timestamp()),
            None => Vec::new(),
        }
    }

    /// Bind the user to a new session id; a remembered login gets a persistent cookie
    pub fn login(&mut self, state: &AppState, user_id: i64, remember: bool) {
        let id = state
            .sessions
            .login(self.id.as_deref(), user_id, remember, current_timestamp());

        let max_age = remember.then(|| state.sessions.remember_seconds());
        self.set_cookie = Some(session_cookie(&state.config.session, &id, max_age));
        self.id = Some(id);
        self.user_id = Some(user_id);
    }

    pub fn logout(&mut self, state: &AppState) {
        if let Some(id) = self.id.take() {
            state.sessions.destroy(&id);
        }
        self.user_id = None;
        self.set_cookie = Some(expired_cookie(&state.config.session));
    }

    /// Attach any pending cookie to the response
    pub fn respond(self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();

        if let Some(cookie) = self.set_cookie {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => warn!(error = %e, "Failed to encode session cookie"),
            }
        }

        response
    }

    pub fn redirect(self, location: &str) -> Response {
        self.respond(Redirect::to(location))
    }
}

/// Find a cookie by name across all Cookie headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(config: &SessionConfig, id: &str, max_age: Option<i64>) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", config.cookie_name, id);

    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }

    cookie
}

pub fn expired_cookie(config: &SessionConfig) -> String {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", config.cookie_name);
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        headers
    }

    #[test]
    fn test_cookie_value_single() {
        let headers = headers(&["portal_session=abc123"]);
        assert_eq!(cookie_value(&headers, "portal_session"), Some("abc123".to_string()));
    }

    #[test]
    fn test_cookie_value_among_others() {
        let headers = headers(&["theme=dark; portal_session=abc123; lang=es"]);
        assert_eq!(cookie_value(&headers, "portal_session"), Some("abc123".to_string()));
        assert_eq!(cookie_value(&headers, "lang"), Some("es".to_string()));
    }

    #[test]
    fn test_cookie_value_multiple_headers() {
        let headers = headers(&["theme=dark", "portal_session=abc123"]);
        assert_eq!(cookie_value(&headers, "portal_session"), Some("abc123".to_string()));
    }

    #[test]
    fn test_cookie_value_missing_or_empty() {
        assert_eq!(cookie_value(&HeaderMap::new(), "portal_session"), None);
        assert_eq!(cookie_value(&headers(&["portal_session="]), "portal_session"), None);
        assert_eq!(cookie_value(&headers(&["xportal_session=abc"]), "portal_session"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = SessionConfig::default();

        let cookie = session_cookie(&config, "abc", None);
        assert_eq!(cookie, "portal_session=abc; Path=/; HttpOnly; SameSite=Lax");

        let remembered = session_cookie(&config, "abc", Some(60));
        assert!(remembered.ends_with("; Max-Age=60"));
    }

    #[test]
    fn test_secure_cookie() {
        let config = SessionConfig {
            secure_cookie: true,
            ..SessionConfig::default()
        };

        assert!(session_cookie(&config, "abc", None).ends_with("; Secure"));
        assert!(expired_cookie(&config).contains("Max-Age=0"));
    }

    #[test]
    fn test_respond_without_cookie() {
        let response = SessionContext::default().redirect("/");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}
