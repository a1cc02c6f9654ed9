//! Pulling values out of loosely structured response bodies.
//!
//! Every function here returns `None` on any shape mismatch; callers decide
//! what a miss means.

use serde_json::Value;

use crate::providers::ResponseShape;
use crate::transport::HttpResponse;

/// The short URL carried by `response`, according to `shape`.
pub fn short_url(shape: &ResponseShape, response: &HttpResponse) -> Option<String> {
    match *shape {
        ResponseShape::JsonKey { path, prefix } => {
            if !response.is_success() {
                return None;
            }
            let json: Value = serde_json::from_slice(&response.body).ok()?;
            let value = string_at(&json, path)?;
            Some(with_prefix(prefix, &value)).filter(|url| looks_like_url(url))
        }
        ResponseShape::PlainText { prefix } => {
            if !response.is_success() {
                return None;
            }
            let text = response.text();
            let text = text.trim();
            (text.starts_with(prefix) && text.len() > prefix.len() && !text.contains(char::is_whitespace))
                .then(|| text.to_string())
        }
        ResponseShape::HtmlSlice { start, end } => {
            if !response.is_success() {
                return None;
            }
            html_slice(&response.text(), start, end).filter(|url| looks_like_url(url))
        }
        ResponseShape::Header { name, prefix } => {
            if !(response.is_success() || response.is_redirect()) {
                return None;
            }
            let value = response.header(name)?.trim();
            (value.starts_with(prefix) && value.len() > prefix.len()).then(|| value.to_string())
        }
    }
}

/// Text between the first `start` anchor and the following `end` anchor.
///
/// Tied to third-party markup, so expect this to break when a service
/// redesigns its pages.
pub fn html_slice(body: &str, start: &str, end: &str) -> Option<String> {
    let from = body.find(start)? + start.len();
    let rest = &body[from..];
    let to = rest.find(end)?;
    let value = unescape_html(rest[..to].trim());
    (!value.is_empty()).then_some(value)
}

fn unescape_html(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

pub fn value_at<'a>(json: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(json, |value, key| value.get(*key))
}

/// Non-blank string at `path`.
pub fn string_at(json: &Value, path: &[&str]) -> Option<String> {
    let value = value_at(json, path)?.as_str()?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Non-negative count at `path`; services disagree on number vs string.
pub fn count_at(json: &Value, path: &[&str]) -> Option<u64> {
    match value_at(json, path)? {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Integer error code at `path`, whether sent as number or string.
pub fn code_at(json: &Value, path: &[&str]) -> Option<i64> {
    match value_at(json, path)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn with_prefix(prefix: &str, value: &str) -> String {
    if prefix.is_empty() || looks_like_url(value) {
        value.to_string()
    } else {
        format!("{prefix}{value}")
    }
}

fn looks_like_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KURZELINKS_START: &str = "shortenurl\" type=\"text\" value=\"";
    const KURZELINKS_END: &str = "\" onClick";

    #[test]
    fn test_slices_between_anchors() {
        let body = r#"<input id="shortenurl" type="text" value="https://t1p.de/abc" onClick="this.select()">"#;
        assert_eq!(
            html_slice(body, KURZELINKS_START, KURZELINKS_END),
            Some("https://t1p.de/abc".to_string())
        );
    }

    #[test]
    fn test_missing_anchor_is_a_miss() {
        assert_eq!(html_slice("<html></html>", KURZELINKS_START, KURZELINKS_END), None);
        let truncated = r#"<input id="shortenurl" type="text" value="https://t1p.de/abc"#;
        assert_eq!(html_slice(truncated, KURZELINKS_START, KURZELINKS_END), None);
    }

    #[test]
    fn test_unescapes_entities() {
        let body = r#"shortenurl" type="text" value="https://t1p.de/a?b=1&amp;c=2" onClick"#;
        assert_eq!(
            html_slice(body, KURZELINKS_START, KURZELINKS_END).as_deref(),
            Some("https://t1p.de/a?b=1&c=2")
        );
    }

    #[test]
    fn test_nested_json_paths() {
        let json = json!({ "data": { "url": "https://ulvis.net/x" }, "visits": 12 });
        assert_eq!(string_at(&json, &["data", "url"]).as_deref(), Some("https://ulvis.net/x"));
        assert_eq!(string_at(&json, &["data", "missing"]), None);
        assert_eq!(count_at(&json, &["visits"]), Some(12));
    }

    #[test]
    fn test_counts_and_codes_accept_strings() {
        let json = json!({ "total-clicks": "7", "errorcode": "3" });
        assert_eq!(count_at(&json, &["total-clicks"]), Some(7));
        assert_eq!(code_at(&json, &["errorcode"]), Some(3));
    }

    #[test]
    fn test_json_prefix_is_not_doubled() {
        let shape = ResponseShape::JsonKey {
            path: &["id"],
            prefix: "https://",
        };
        let bare = HttpResponse::new(200, r#"{"id":"owo.vc/a-b"}"#);
        let full = HttpResponse::new(200, r#"{"id":"https://owo.vc/a-b"}"#);
        assert_eq!(short_url(&shape, &bare).as_deref(), Some("https://owo.vc/a-b"));
        assert_eq!(short_url(&shape, &full).as_deref(), Some("https://owo.vc/a-b"));
    }

    #[test]
    fn test_plain_text_needs_prefix() {
        let shape = ResponseShape::PlainText {
            prefix: "https://tinyurl.com/",
        };
        let ok = HttpResponse::new(200, "https://tinyurl.com/abc\n");
        let bad = HttpResponse::new(200, "Error");
        assert_eq!(short_url(&shape, &ok).as_deref(), Some("https://tinyurl.com/abc"));
        assert_eq!(short_url(&shape, &bad), None);
    }

    #[test]
    fn test_header_shape_accepts_redirects() {
        let shape = ResponseShape::Header {
            name: "location",
            prefix: "https://git.io/",
        };
        let response = HttpResponse::new(201, "").with_header("Location", "https://git.io/abc");
        assert_eq!(short_url(&shape, &response).as_deref(), Some("https://git.io/abc"));
        let error = HttpResponse::new(422, "").with_header("Location", "https://git.io/abc");
        assert_eq!(short_url(&shape, &error), None);
    }
}
