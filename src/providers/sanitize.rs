/// Per-provider clean-up of the long URL before it is sent.
///
/// The rules differ between services and are not interchangeable: encoding
/// ampersands for a service that already form-encodes its parameters would
/// double-encode them and corrupt the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sanitizer {
    /// Prefix `https://` when the URL has no http(s) scheme.
    pub require_scheme: bool,
    /// Escape `%`, `&`, `+` and `#`, for services that take the URL as a raw
    /// query value. Anything else passes through untouched.
    pub escape_query: bool,
}

impl Sanitizer {
    pub const TRIM: Sanitizer = Sanitizer {
        require_scheme: false,
        escape_query: false,
    };

    pub const ABSOLUTE: Sanitizer = Sanitizer {
        require_scheme: true,
        escape_query: false,
    };

    pub const VERBATIM: Sanitizer = Sanitizer {
        require_scheme: true,
        escape_query: true,
    };

    pub fn apply(&self, url: &str) -> String {
        let url = url.trim();
        let mut sanitized = if self.require_scheme && !has_http_scheme(url) {
            format!("https://{url}")
        } else {
            url.to_string()
        };
        if self.escape_query {
            // '%' first so the escapes added below survive.
            sanitized = sanitized
                .replace('%', "%25")
                .replace('&', "%26")
                .replace('+', "%2B")
                .replace('#', "%23");
        }
        sanitized
    }

    /// The long URL as kept and compared locally: trimmed and made absolute
    /// like [`apply`](Self::apply), but never percent-encoded.
    pub fn canonical(&self, url: &str) -> String {
        Sanitizer {
            escape_query: false,
            ..*self
        }
        .apply(url)
    }
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_https_when_missing() {
        assert_eq!(Sanitizer::ABSOLUTE.apply(" example.com "), "https://example.com");
        assert_eq!(
            Sanitizer::ABSOLUTE.apply("http://example.com"),
            "http://example.com"
        );
        assert_eq!(
            Sanitizer::ABSOLUTE.apply("HTTPS://Example.com"),
            "HTTPS://Example.com"
        );
    }

    #[test]
    fn test_trim_only_leaves_scheme_alone() {
        assert_eq!(Sanitizer::TRIM.apply("\texample.com\n"), "example.com");
    }

    #[test]
    fn test_encodes_ampersands_only_when_asked() {
        let url = "https://example.com/?a=1&b=2";
        assert_eq!(
            Sanitizer::VERBATIM.apply(url),
            "https://example.com/?a=1%26b=2"
        );
        assert_eq!(Sanitizer::ABSOLUTE.apply(url), url);
    }

    #[test]
    fn test_query_delimiters_are_escaped() {
        assert_eq!(
            Sanitizer::VERBATIM.apply("example.com/s?q=a+b&p=100%#top"),
            "https://example.com/s?q=a%2Bb%26p=100%25%23top"
        );
        assert_eq!(
            Sanitizer::VERBATIM.canonical("example.com/s?q=a+b#top"),
            "https://example.com/s?q=a+b#top"
        );
    }

    #[test]
    fn test_multibyte_prefix_does_not_panic() {
        assert_eq!(Sanitizer::ABSOLUTE.apply("ü.example"), "https://ü.example");
    }

    #[test]
    fn test_canonical_form_keeps_ampersands() {
        assert_eq!(
            Sanitizer::VERBATIM.canonical("example.com/?a=1&b=2"),
            "https://example.com/?a=1&b=2"
        );
        assert_eq!(Sanitizer::TRIM.canonical(" ftp://x "), "ftp://x");
    }
}
