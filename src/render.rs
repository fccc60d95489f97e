//! JSON and HTML presentation of relay outcomes.
//!
//! Both successes and failures are rendered in the caller's chosen
//! [`OutputMode`], and the HTTP status always equals the code reported in
//! the body.

use crate::assembler::{AssembledResult, HistoryEntry, LabelledField};
use crate::error::RelayError;
use serde::Serialize;

const JSON_CONTENT_TYPE: &str = "application/json";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Requested response format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OutputMode {
    /// HTML fragment for browsers.
    #[default]
    Html,
    /// JSON document for programmatic callers.
    Json,
}

impl OutputMode {
    /// Interprets the `json` query parameter: exactly `1` selects JSON.
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_relay::render::OutputMode;
    ///
    /// assert_eq!(OutputMode::from_flag(Some("1")), OutputMode::Json);
    /// assert_eq!(OutputMode::from_flag(Some("true")), OutputMode::Html);
    /// assert_eq!(OutputMode::from_flag(None), OutputMode::Html);
    /// ```
    #[must_use]
    pub fn from_flag(flag: Option<&str>) -> Self {
        if flag == Some("1") {
            Self::Json
        } else {
            Self::Html
        }
    }

    /// Short label for log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

/// A fully rendered HTTP response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rendered {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Type` header.
    pub content_type: &'static str,
    /// Response body.
    pub body: String,
}

#[derive(Serialize)]
struct SuccessBody<'a> {
    response: u16,
    data: &'a AssembledResult,
}

#[derive(Serialize)]
struct FailureBody<'a> {
    msg: &'a str,
    response: u16,
}

/// Renders a successful result.
#[must_use]
pub fn render_success(result: &AssembledResult, mode: OutputMode) -> Rendered {
    match mode {
        OutputMode::Json => json_response(200, &SuccessBody {
            response: 200,
            data: result,
        }),
        OutputMode::Html => Rendered {
            status: 200,
            content_type: HTML_CONTENT_TYPE,
            body: html_fragment(result),
        },
    }
}

/// Renders a request failure.
///
/// # Examples
///
/// ```
/// use parcel_relay::error::RelayError;
/// use parcel_relay::render::{OutputMode, render_failure};
///
/// let rendered = render_failure(&RelayError::MissingTracking, OutputMode::Html);
/// assert_eq!(rendered.status, 422);
/// assert_eq!(rendered.body, "Missing Tracking number!");
/// ```
#[must_use]
pub fn render_failure(error: &RelayError, mode: OutputMode) -> Rendered {
    let status = error.status_code();
    let message = error.to_string();
    match mode {
        OutputMode::Json => json_response(status, &FailureBody {
            msg: &message,
            response: status,
        }),
        OutputMode::Html => Rendered {
            status,
            content_type: TEXT_CONTENT_TYPE,
            body: message,
        },
    }
}

fn json_response<T: Serialize>(status: u16, body: &T) -> Rendered {
    match serde_json::to_string(body) {
        Ok(body) => Rendered {
            status,
            content_type: JSON_CONTENT_TYPE,
            body,
        },
        Err(e) => Rendered {
            status: 500,
            content_type: JSON_CONTENT_TYPE,
            body: format!(
                r#"{{"msg":{},"response":500}}"#,
                serde_json::Value::from(e.to_string())
            ),
        },
    }
}

fn html_fragment(result: &AssembledResult) -> String {
    let mut html = String::new();
    write_scalar(&mut html, &result.shipper);
    write_scalar(&mut html, &result.expected_delivery_date);
    write_scalar(&mut html, &result.status);
    write_history(&mut html, &result.history);
    html
}

fn write_scalar(html: &mut String, field: &LabelledField<String>) {
    html.push_str(&format!(
        "<strong>{}: </strong>{}<br/>",
        escape_html(field.label),
        escape_html(&field.value)
    ));
}

fn write_history(html: &mut String, field: &LabelledField<Vec<HistoryEntry>>) {
    html.push_str(&format!(
        "<strong>{}: </strong><br/>",
        escape_html(field.label)
    ));
    for entry in &field.value {
        for (key, value) in entry.pairs() {
            html.push_str(&format!(
                "&emsp;<strong>{}: </strong> {}<br/>",
                escape_html(key),
                escape_html(value)
            ));
        }
        html.push_str("<br/>");
    }
}

/// Escapes the five HTML-significant characters.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
