//! Static description of every supported short-URL service.
//!
//! A [`Provider`] is plain data: endpoints, request encodings, the shape of
//! a successful response and the table that maps the service's failures into
//! [`ErrorKind`]. The request builder and the response interpreter in
//! [`crate::protocol`] are generic over this data, so adding or disabling a
//! service is an edit to [`catalog`] only.

pub mod alias;
pub mod catalog;
pub mod sanitize;

use std::time::Duration;

use crate::models::ErrorKind;

pub use alias::{validate_alias, AliasConstraint, AliasError};
pub use catalog::{all, by_identity, enabled, find, UNKNOWN};
pub use sanitize::Sanitizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Where request parameters go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Query,
    Form,
    Json,
}

/// Recipe for one outbound request.
///
/// `url` may contain `{alias}` (the alias as a path segment) and `{short}`
/// (host and path of an existing short URL, percent-encoded as one segment).
#[derive(Debug, Clone, Copy)]
pub struct RequestTemplate {
    pub method: Method,
    pub url: &'static str,
    pub encoding: Encoding,
    pub url_field: Option<&'static str>,
    /// Append the long URL as the last query parameter without encoding it.
    pub verbatim_url: bool,
    pub alias_field: Option<&'static str>,
    pub extra: &'static [(&'static str, &'static str)],
    pub headers: &'static [(&'static str, &'static str)],
}

impl RequestTemplate {
    pub const fn get(url: &'static str) -> Self {
        Self::new(Method::Get, url, Encoding::Query)
    }

    pub const fn post_form(url: &'static str) -> Self {
        Self::new(Method::Post, url, Encoding::Form)
    }

    pub const fn post_json(url: &'static str) -> Self {
        Self::new(Method::Post, url, Encoding::Json)
    }

    const fn new(method: Method, url: &'static str, encoding: Encoding) -> Self {
        Self {
            method,
            url,
            encoding,
            url_field: None,
            verbatim_url: false,
            alias_field: None,
            extra: &[],
            headers: &[],
        }
    }

    pub const fn url_field(mut self, name: &'static str) -> Self {
        self.url_field = Some(name);
        self
    }

    pub const fn verbatim_url_field(mut self, name: &'static str) -> Self {
        self.url_field = Some(name);
        self.verbatim_url = true;
        self
    }

    pub const fn alias_field(mut self, name: &'static str) -> Self {
        self.alias_field = Some(name);
        self
    }

    pub const fn extra(mut self, extra: &'static [(&'static str, &'static str)]) -> Self {
        self.extra = extra;
        self
    }

    pub const fn headers(mut self, headers: &'static [(&'static str, &'static str)]) -> Self {
        self.headers = headers;
        self
    }
}

/// Where the short URL lives in a successful response.
#[derive(Debug, Clone, Copy)]
pub enum ResponseShape {
    /// A string at `path` inside a JSON object, with `prefix` prepended.
    JsonKey {
        path: &'static [&'static str],
        prefix: &'static str,
    },
    /// The whole body is the short URL and must start with `prefix`.
    PlainText { prefix: &'static str },
    /// The short URL sits between two literal anchors in an HTML page.
    HtmlSlice {
        start: &'static str,
        end: &'static str,
    },
    /// The short URL is carried by a response header.
    Header {
        name: &'static str,
        prefix: &'static str,
    },
}

/// Numeric error codes found at `path` in a JSON body.
#[derive(Debug, Clone, Copy)]
pub struct JsonCodes {
    pub path: &'static [&'static str],
    pub codes: &'static [(i64, ErrorKind)],
}

/// How a provider's failures map into [`ErrorKind`].
///
/// Rules are tried in order: `statuses` (authoritative, body ignored),
/// `phrases` (lower-case substrings of the body), `json_codes`,
/// `json_keys` (presence of a top-level key), then `status_hints`.
#[derive(Debug, Clone, Copy)]
pub struct ErrorTable {
    pub statuses: &'static [(u16, ErrorKind)],
    pub phrases: &'static [(&'static str, ErrorKind)],
    pub json_codes: Option<JsonCodes>,
    pub json_keys: &'static [(&'static str, ErrorKind)],
    pub status_hints: &'static [(u16, ErrorKind)],
    /// JSON path of a human readable error message, if the service sends one.
    pub message_path: &'static [&'static str],
}

impl ErrorTable {
    pub const fn statuses(statuses: &'static [(u16, ErrorKind)]) -> Self {
        Self {
            statuses,
            phrases: &[],
            json_codes: None,
            json_keys: &[],
            status_hints: &[],
            message_path: &[],
        }
    }

    pub const fn phrases(mut self, phrases: &'static [(&'static str, ErrorKind)]) -> Self {
        self.phrases = phrases;
        self
    }

    pub const fn json_codes(
        mut self,
        path: &'static [&'static str],
        codes: &'static [(i64, ErrorKind)],
    ) -> Self {
        self.json_codes = Some(JsonCodes { path, codes });
        self
    }

    pub const fn json_keys(mut self, keys: &'static [(&'static str, ErrorKind)]) -> Self {
        self.json_keys = keys;
        self
    }

    pub const fn status_hints(mut self, hints: &'static [(u16, ErrorKind)]) -> Self {
        self.status_hints = hints;
        self
    }

    pub const fn message_path(mut self, path: &'static [&'static str]) -> Self {
        self.message_path = path;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseSpec {
    pub shape: ResponseShape,
    pub errors: ErrorTable,
    /// The service hands out a random code instead of failing when the
    /// requested alias is taken, so a short URL that does not end with the
    /// requested alias means the alias already exists.
    pub alias_echo: bool,
}

/// Where a looked-up long URL is found in an alias check response.
#[derive(Debug, Clone, Copy)]
pub enum LongUrlSource {
    PlainText,
    Json(&'static [&'static str]),
}

/// Alias availability probe.
#[derive(Debug, Clone, Copy)]
pub struct CheckSpec {
    pub request: RequestTemplate,
    pub long_url: LongUrlSource,
    /// Statuses that mean the alias is unknown to the service.
    pub not_found_statuses: &'static [u16],
    /// Top-level JSON keys whose presence means the alias is unknown.
    pub not_found_keys: &'static [&'static str],
    /// Template of the short URL for an existing alias, with `{alias}`.
    pub short_url: &'static str,
}

/// Click-count lookup for an existing short URL.
#[derive(Debug, Clone, Copy)]
pub struct ClickSpec {
    pub request: RequestTemplate,
    pub count_path: &'static [&'static str],
    pub errors: ErrorTable,
}

#[derive(Debug, Clone, Copy)]
pub struct ProviderInfo {
    pub homepage: &'static str,
    pub privacy: Option<&'static str>,
    pub terms: Option<&'static str>,
}

/// One external short-URL service or API variant.
#[derive(Debug)]
pub struct Provider {
    pub name: &'static str,
    /// Siblings that share a backend, e.g. "kurzelinks.de, 0cn.de, t1p.de, ogy.de".
    pub group: Option<&'static str>,
    pub base_url: &'static str,
    pub enabled: bool,
    pub alias: Option<AliasConstraint>,
    pub sanitizer: Sanitizer,
    pub create: RequestTemplate,
    pub response: ResponseSpec,
    pub check: Option<CheckSpec>,
    pub clicks: Option<ClickSpec>,
    /// Overrides the transport default for slow services.
    pub timeout: Option<Duration>,
    pub info: ProviderInfo,
}

impl Provider {
    pub fn can_check_alias(&self) -> bool {
        self.check.is_some()
    }

    pub fn can_fetch_click_count(&self) -> bool {
        self.clicks.is_some()
    }

    pub fn supports_alias(&self) -> bool {
        self.alias.is_some()
    }

    pub fn is_unknown(&self) -> bool {
        std::ptr::eq(self, &UNKNOWN)
    }

    pub fn capabilities(&self) -> Vec<&'static str> {
        let mut capabilities = vec!["create"];
        if self.supports_alias() {
            capabilities.push("custom-alias");
        }
        if self.can_check_alias() {
            capabilities.push("check-alias");
        }
        if self.can_fetch_click_count() {
            capabilities.push("click-count");
        }
        capabilities
    }
}
