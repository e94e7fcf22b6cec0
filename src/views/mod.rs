// HTML rendering

pub mod pages;

use crate::models::session::Flash;
use std::fmt::Write;

/// What every page needs from the request besides its own content
pub struct PageContext<'a> {
    pub flashes: &'a [Flash],
    pub authenticated: bool,
}

impl<'a> PageContext<'a> {
    pub fn anonymous() -> Self {
        Self {
            flashes: &[],
            authenticated: false,
        }
    }
}

/// Escape text for use in element content and quoted attribute values
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn layout(title: &str, ctx: &PageContext<'_>, body: &str) -> String {
    let mut html = String::with_capacity(body.len() + 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{} | Premium Portal</title>", escape(title));
    html.push_str("</head>\n<body>\n<nav>\n<a href=\"/\">Home</a>\n");

    if ctx.authenticated {
        html.push_str("<a href=\"/dashboard\">Dashboard</a>\n");
        html.push_str("<a href=\"/premium-zone\">Premium zone</a>\n");
        html.push_str("<a href=\"/logout\">Log out</a>\n");
    } else {
        html.push_str("<a href=\"/register\">Register</a>\n");
        html.push_str("<a href=\"/login\">Log in</a>\n");
    }
    html.push_str("</nav>\n");

    if !ctx.flashes.is_empty() {
        html.push_str("<ul class=\"flashes\">\n");
        for flash in ctx.flashes {
            let _ = writeln!(
                html,
                "<li class=\"flash flash-{}\">{}</li>",
                flash.level.as_str(),
                escape(&flash.message)
            );
        }
        html.push_str("</ul>\n");
    }

    html.push_str("<main>\n");
    html.push_str(body);
    html.push_str("\n</main>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::FlashLevel;

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(
            escape("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"
        );
        assert_eq!(escape("a & \"b\""), "a &amp; &quot;b&quot;");
    }

    #[test]
    fn test_layout_renders_flashes() {
        let flashes = vec![Flash::new(FlashLevel::Danger, "Bad <input>")];
        let ctx = PageContext {
            flashes: &flashes,
            authenticated: false,
        };

        let html = layout("Test", &ctx, "<p>body</p>");

        assert!(html.contains("<li class=\"flash flash-danger\">Bad &lt;input&gt;</li>"));
        assert!(html.contains("<p>body</p>"));
        assert!(html.contains("href=\"/login\""));
    }

    #[test]
    fn test_layout_navigation_when_authenticated() {
        let ctx = PageContext {
            flashes: &[],
            authenticated: true,
        };

        let html = layout("Test", &ctx, "");

        assert!(html.contains("href=\"/logout\""));
        assert!(!html.contains("href=\"/register\""));
        assert!(!html.contains("class=\"flashes\""));
    }
}
