use axum::http::Uri;
use serde::Deserialize;
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

#[derive(Clone, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(length(min = 3, max = 80, message = "Username must be between 3 and 80 characters"))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(must_match(other = "password", message = "Passwords must match"))]
    pub confirm_password: String,
}

#[derive(Clone, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required"))]
    pub password: String,
    /// Checkbox: present when ticked, whatever its value
    #[serde(default)]
    pub remember: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Per-field messages, keyed by form field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

impl RegisterForm {
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = normalize_email(&self.email);
        self
    }
}

impl LoginForm {
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self
    }

    pub fn remember(&self) -> bool {
        self.remember.is_some()
    }
}

impl LoginQuery {
    /// Only local absolute paths are followed after login
    pub fn safe_next(&self) -> Option<&str> {
        self.next.as_deref().filter(|next| is_local_path(next))
    }
}

/// A path on this host: one leading slash, no scheme or authority, and nothing
/// a browser would strip or fold into a second slash
fn is_local_path(target: &str) -> bool {
    if !target.starts_with('/') || target.starts_with("//") {
        return false;
    }

    if target
        .chars()
        .any(|c| c.is_ascii_control() || c.is_whitespace() || c == '\\')
    {
        return false;
    }

    match target.parse::<Uri>() {
        Ok(uri) => uri.scheme().is_none() && uri.authority().is_none(),
        Err(_) => false,
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn field_messages(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let messages = field_errors
                .iter()
                .map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish()
    }
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("remember", &self.remember())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, email: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_valid_register_form() {
        let form = register("alice", "a@x.com", "secret1", "secret1");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_username_length_bounds() {
        let short = register("al", "a@x.com", "secret1", "secret1");
        let errors = field_messages(&short.validate().unwrap_err());
        assert!(errors.contains_key("username"));

        let exact_min = register("ali", "a@x.com", "secret1", "secret1");
        assert!(exact_min.validate().is_ok());

        let exact_max = register(&"a".repeat(80), "a@x.com", "secret1", "secret1");
        assert!(exact_max.validate().is_ok());

        let long = register(&"a".repeat(81), "a@x.com", "secret1", "secret1");
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_invalid_email() {
        let form = register("alice", "not-an-email", "secret1", "secret1");
        let errors = field_messages(&form.validate().unwrap_err());
        assert_eq!(errors["email"], vec!["Invalid email address".to_string()]);
    }

    #[test]
    fn test_short_password() {
        let form = register("alice", "a@x.com", "12345", "12345");
        let errors = field_messages(&form.validate().unwrap_err());
        assert!(errors.contains_key("password"));
    }

    #[test]
    fn test_password_confirmation_must_match() {
        let form = register("alice", "a@x.com", "secret1", "secret2");
        let errors = field_messages(&form.validate().unwrap_err());
        assert_eq!(errors["confirm_password"], vec!["Passwords must match".to_string()]);
    }

    #[test]
    fn test_register_normalization() {
        let form = register("  alice ", " A@X.com ", "secret1", "secret1").normalized();
        assert_eq!(form.username, "alice");
        assert_eq!(form.email, "a@x.com");
    }

    #[test]
    fn test_login_requires_password() {
        let form = LoginForm {
            email: "a@x.com".to_string(),
            password: String::new(),
            remember: None,
        };
        let errors = field_messages(&form.validate().unwrap_err());
        assert!(errors.contains_key("password"));
        assert!(!errors.contains_key("email"));
    }

    #[test]
    fn test_login_form_from_urlencoded() {
        let form: LoginForm =
            serde_urlencoded::from_str("email=a%40x.com&password=secret1&remember=y").unwrap();
        assert_eq!(form.email, "a@x.com");
        assert!(form.remember());

        let form: LoginForm = serde_urlencoded::from_str("email=a%40x.com&password=secret1").unwrap();
        assert!(!form.remember());
    }

    #[test]
    fn test_safe_next() {
        let query = |next: &str| LoginQuery {
            next: Some(next.to_string()),
        };

        assert_eq!(query("/premium-zone").safe_next(), Some("/premium-zone"));
        assert_eq!(query("//evil.example").safe_next(), None);
        assert_eq!(query("https://evil.example").safe_next(), None);
        assert_eq!(query("/\\evil.example").safe_next(), None);
        assert_eq!(LoginQuery::default().safe_next(), None);
    }

    #[test]
    fn test_safe_next_rejects_stripped_characters() {
        let query = |next: &str| LoginQuery {
            next: Some(next.to_string()),
        };

        assert_eq!(query("/\t/evil.example").safe_next(), None);
        assert_eq!(query("/\n/evil.example").safe_next(), None);
        assert_eq!(query("/\r/evil.example").safe_next(), None);
        assert_eq!(query("/ /evil.example").safe_next(), None);
        assert_eq!(query("/dashboard\u{7f}").safe_next(), None);

        assert_eq!(query("/premium-zone?tab=1").safe_next(), Some("/premium-zone?tab=1"));
    }
}
