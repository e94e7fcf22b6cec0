#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use premium_portal::core::config::Config;
use premium_portal::core::routes::build_router;
use premium_portal::core::startup::build_state;
use premium_portal::core::state::AppState;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_CONFIG: &str = r#"
[server]
port = 8080

[database]
url = "sqlite::memory:"

[security]
bcrypt_cost = 4
"#;

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookies: Vec<String>,
    pub body: String,
}

/// Drives the router in-process and keeps the session cookie between requests like a browser would
pub struct TestApp {
    pub state: Arc<AppState>,
    router: Router,
    cookie_name: String,
    session_cookie: Option<String>,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = Config::from_toml_str(TEST_CONFIG).expect("test config should parse");
        let cookie_name = config.session.cookie_name.clone();
        let state = Arc::new(build_state(config).await.expect("state should build"));

        Self {
            router: build_router(Arc::clone(&state)),
            state,
            cookie_name,
            session_cookie: None,
        }
    }

    pub fn session_cookie(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    pub fn set_session_cookie(&mut self, value: Option<&str>) {
        self.session_cookie = value.map(str::to_string);
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn register(&mut self, username: &str, email: &str, password: &str) -> TestResponse {
        self.post_form(
            "/register",
            &[
                ("username", username),
                ("email", email),
                ("password", password),
                ("confirm_password", password),
            ],
        )
        .await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_form("/login", &[("email", email), ("password", password)])
            .await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.session_cookie {
            Some(id) => builder.header(header::COOKIE, format!("{}={}", self.cookie_name, id)),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();

        for cookie in &set_cookies {
            self.store_cookie(cookie);
        }

        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            location,
            set_cookies,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn store_cookie(&mut self, cookie: &str) {
        let Some((name, rest)) = cookie.split_once('=') else {
            return;
        };
        if name != self.cookie_name {
            return;
        }

        let value = rest.split(';').next().unwrap_or("");
        if value.is_empty() || cookie.contains("Max-Age=0") {
            self.session_cookie = None;
        } else {
            self.session_cookie = Some(value.to_string());
        }
    }
}
