//! Diagnostic rendering
//!
//! Renderers only read the [`TraceAggregate`]; they never mutate it and
//! perform no I/O. Two formats are supported:
//! - [`html`]: self-contained page for browsers (the default)
//! - [`json`]: machine-readable trace for API clients
//!
//! Both are served with status `500`.

pub mod html;
pub mod json;

use axum::body::Body;
use axum::response::Response;
use http::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use http::StatusCode;

use crate::domain::DiagnosticError;
use crate::trace::TraceAggregate;

pub use html::render_html;
pub use json::render_json;

/// Output format of the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Html,
    Json,
}

impl Format {
    /// Pick a format from the request's `Accept` header.
    ///
    /// The first listed media type that is recognized wins; anything else
    /// falls back to HTML.
    #[must_use]
    pub fn negotiate(headers: &HeaderMap) -> Self {
        let Some(accept) = headers.get(ACCEPT).and_then(|value| value.to_str().ok()) else {
            return Format::Html;
        };

        accept
            .split(',')
            .map(|entry| entry.split(';').next().unwrap_or("").trim())
            .find_map(|media| match media {
                "application/json" => Some(Format::Json),
                "text/html" | "application/xhtml+xml" | "*/*" => Some(Format::Html),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Html => "text/html; charset=utf-8",
            Format::Json => "application/json",
        }
    }
}

/// Render `trace` in `format`.
///
/// # Errors
/// Returns an error if the document cannot be produced.
pub fn render(trace: &TraceAggregate, format: Format) -> Result<String, DiagnosticError> {
    match format {
        Format::Html => render_html(trace),
        Format::Json => render_json(trace),
    }
}

/// Render `trace` into a complete `500` response.
///
/// # Errors
/// Returns an error if rendering or response assembly fails.
pub fn diagnostic_response(trace: &TraceAggregate, format: Format) -> Result<Response, DiagnosticError> {
    let body = render(trace, format)?;
    let response = http::Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(CONTENT_TYPE, format.content_type())
        .body(Body::from(body))?;
    Ok(response)
}

/// Bare `500` used when the diagnostic itself could not be produced.
#[must_use]
pub fn fallback_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_negotiate_defaults_to_html() {
        assert_eq!(Format::negotiate(&HeaderMap::new()), Format::Html);
        assert_eq!(Format::negotiate(&accept("image/png")), Format::Html);
    }

    #[test]
    fn test_negotiate_json() {
        assert_eq!(Format::negotiate(&accept("application/json")), Format::Json);
        assert_eq!(Format::negotiate(&accept("application/json; charset=utf-8, */*")), Format::Json);
    }

    #[test]
    fn test_negotiate_browser_accept() {
        let browser = accept("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8");
        assert_eq!(Format::negotiate(&browser), Format::Html);
    }

    #[test]
    fn test_diagnostic_response_status_and_type() {
        let response = diagnostic_response(&TraceAggregate::default(), Format::Json).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_fallback_response_is_500() {
        assert_eq!(fallback_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
