use super::{escape, layout, PageContext};
use crate::models::forms::FieldErrors;
use crate::models::user::User;
use crate::services::subscription::is_active;
use crate::utils::time::{days_remaining, format_utc};
use chrono::{DateTime, Utc};
use std::fmt::Write;

pub fn index(ctx: &PageContext<'_>) -> String {
    let body = if ctx.authenticated {
        "<h1>Welcome back</h1>\n<p><a href=\"/dashboard\">Go to your dashboard</a></p>"
    } else {
        "<h1>Premium Portal</h1>\n\
         <p>Create an account to manage your subscription and unlock the premium zone.</p>\n\
         <p><a href=\"/register\">Register</a> or <a href=\"/login\">log in</a>.</p>"
    };

    layout("Home", ctx, body)
}

pub fn register(ctx: &PageContext<'_>, username: &str, email: &str, errors: &FieldErrors) -> String {
    let mut body = String::from("<h1>Register</h1>\n<form method=\"post\" action=\"/register\">\n");

    text_field(&mut body, "username", "Username", "text", username, errors);
    text_field(&mut body, "email", "Email", "email", email, errors);
    text_field(&mut body, "password", "Password", "password", "", errors);
    text_field(&mut body, "confirm_password", "Confirm password", "password", "", errors);

    body.push_str("<button type=\"submit\">Register</button>\n</form>\n");
    body.push_str("<p>Already have an account? <a href=\"/login\">Log in</a></p>");

    layout("Register", ctx, &body)
}

pub fn login(ctx: &PageContext<'_>, email: &str, next: Option<&str>, errors: &FieldErrors) -> String {
    let action = match next {
        Some(next) => match serde_urlencoded::to_string(&[("next", next)]) {
            Ok(query) => format!("/login?{}", query),
            Err(_) => "/login".to_string(),
        },
        None => "/login".to_string(),
    };

    let mut body = String::from("<h1>Log in</h1>\n");
    let _ = writeln!(body, "<form method=\"post\" action=\"{}\">", escape(&action));

    text_field(&mut body, "email", "Email", "email", email, errors);
    text_field(&mut body, "password", "Password", "password", "", errors);

    body.push_str(
        "<p><label><input type=\"checkbox\" name=\"remember\" value=\"y\"> Remember me</label></p>\n",
    );
    body.push_str("<button type=\"submit\">Log in</button>\n</form>\n");
    body.push_str("<p>No account yet? <a href=\"/register\">Register</a></p>");

    layout("Log in", ctx, &body)
}

pub fn dashboard(ctx: &PageContext<'_>, user: &User, now: DateTime<Utc>) -> String {
    let active = is_active(user, now);

    let status = match (&user.subscription_end_date, active) {
        (Some(_), true) => "Active",
        (Some(_), false) if user.is_subscribed => "Expired",
        _ => "Not subscribed",
    };

    let end_date = user
        .subscription_end_date
        .as_ref()
        .map(format_utc)
        .unwrap_or_else(|| "-".to_string());

    let mut body = String::new();
    let _ = writeln!(body, "<h1>Hello, {}</h1>", escape(&user.username));
    body.push_str("<dl class=\"subscription\">\n");
    let _ = writeln!(body, "<dt>Subscribed</dt><dd id=\"is-subscribed\">{}</dd>", user.is_subscribed);
    let _ = writeln!(body, "<dt>Status</dt><dd id=\"subscription-status\">{}</dd>", status);
    let _ = writeln!(body, "<dt>Ends</dt><dd id=\"subscription-end\">{}</dd>", end_date);

    if let (true, Some(end)) = (active, &user.subscription_end_date) {
        let _ = writeln!(
            body,
            "<dt>Days left</dt><dd id=\"days-remaining\">{}</dd>",
            days_remaining(end, &now)
        );
    }
    body.push_str("</dl>\n");

    if active {
        body.push_str("<p><a href=\"/premium-zone\">Enter the premium zone</a></p>\n");
    }

    let label = if active { "Renew subscription" } else { "Subscribe" };
    let _ = write!(
        body,
        "<form method=\"post\" action=\"/subscribe\"><button type=\"submit\">{}</button></form>",
        label
    );

    layout("Dashboard", ctx, &body)
}

pub fn premium(ctx: &PageContext<'_>, user: &User) -> String {
    let mut body = String::from("<h1>Premium zone</h1>\n");
    let _ = writeln!(
        body,
        "<p>Welcome to the members-only area, {}.</p>",
        escape(&user.username)
    );

    if let Some(end) = &user.subscription_end_date {
        let _ = write!(body, "<p>Your access lasts until {}.</p>", format_utc(end));
    }

    layout("Premium zone", ctx, &body)
}

pub fn not_found(ctx: &PageContext<'_>) -> String {
    layout(
        "Not found",
        ctx,
        "<h1>Page not found</h1>\n<p><a href=\"/\">Back to the home page</a></p>",
    )
}

pub fn error_page(message: &str) -> String {
    let body = format!(
        "<h1>Error</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to the home page</a></p>",
        escape(message)
    );
    layout("Error", &PageContext::anonymous(), &body)
}

fn text_field(body: &mut String, name: &str, label: &str, kind: &str, value: &str, errors: &FieldErrors) {
    let _ = write!(
        body,
        "<p><label for=\"{name}\">{label}</label>\n<input id=\"{name}\" name=\"{name}\" type=\"{kind}\" value=\"{}\">",
        escape(value)
    );

    if let Some(messages) = errors.get(name) {
        for message in messages {
            let _ = write!(body, "\n<span class=\"field-error\">{}</span>", escape(message));
        }
    }

    body.push_str("</p>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn user(is_subscribed: bool, end: Option<DateTime<Utc>>) -> User {
        User {
            id: 1,
            username: "alice<b>".to_string(),
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            is_subscribed,
            subscription_end_date: end,
        }
    }

    fn ctx() -> PageContext<'static> {
        PageContext {
            flashes: &[],
            authenticated: true,
        }
    }

    #[test]
    fn test_dashboard_without_subscription() {
        let now = Utc::now();
        let html = dashboard(&ctx(), &user(false, None), now);

        assert!(html.contains("Hello, alice&lt;b&gt;"));
        assert!(html.contains("<dd id=\"is-subscribed\">false</dd>"));
        assert!(html.contains("<dd id=\"subscription-status\">Not subscribed</dd>"));
        assert!(html.contains("<dd id=\"subscription-end\">-</dd>"));
        assert!(!html.contains("Enter the premium zone"));
        assert!(html.contains("action=\"/subscribe\""));
    }

    #[test]
    fn test_dashboard_active_subscription() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let html = dashboard(&ctx(), &user(true, Some(now + Duration::days(30))), now);

        assert!(html.contains("<dd id=\"is-subscribed\">true</dd>"));
        assert!(html.contains("<dd id=\"subscription-status\">Active</dd>"));
        assert!(html.contains("<dd id=\"subscription-end\">2026-03-31 12:00 UTC</dd>"));
        assert!(html.contains("<dd id=\"days-remaining\">30</dd>"));
        assert!(html.contains("Enter the premium zone"));
    }

    #[test]
    fn test_dashboard_expired_subscription() {
        let now = Utc::now();
        let html = dashboard(&ctx(), &user(true, Some(now - Duration::days(1))), now);

        assert!(html.contains("<dd id=\"subscription-status\">Expired</dd>"));
        assert!(!html.contains("days-remaining"));
    }

    #[test]
    fn test_register_form_keeps_values_and_errors() {
        let mut errors = FieldErrors::new();
        errors.insert("email".to_string(), vec!["Invalid email address".to_string()]);

        let html = register(&PageContext::anonymous(), "alice", "bad\"mail", &errors);

        assert!(html.contains("value=\"alice\""));
        assert!(html.contains("value=\"bad&quot;mail\""));
        assert!(html.contains("<span class=\"field-error\">Invalid email address</span>"));
    }

    #[test]
    fn test_login_form_preserves_next() {
        let html = login(&PageContext::anonymous(), "", Some("/premium-zone"), &FieldErrors::new());
        assert!(html.contains("action=\"/login?next=%2Fpremium-zone\""));

        let html = login(&PageContext::anonymous(), "", None, &FieldErrors::new());
        assert!(html.contains("action=\"/login\""));
    }

    #[test]
    fn test_error_page_escapes_message() {
        let html = error_page("<oops>");
        assert!(html.contains("&lt;oops&gt;"));
    }
}
