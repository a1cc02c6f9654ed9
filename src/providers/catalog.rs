//! The registry of known services, in the order they are offered to users.
//!
//! Everything here is reverse-engineered from observed behavior of public,
//! keyless endpoints. When a service changes its API or adds bot protection
//! it gets `enabled: false` rather than a workaround.

use std::time::Duration;

use super::{
    AliasConstraint, CheckSpec, ClickSpec, ErrorTable, LongUrlSource, Provider, ProviderInfo,
    RequestTemplate, ResponseShape, ResponseSpec, Sanitizer,
};
use crate::models::ErrorKind;

const COMMON_STATUSES: &[(u16, ErrorKind)] = &[
    (429, ErrorKind::RateLimitExceeded),
    (500, ErrorKind::InternalServerError),
    (502, ErrorKind::ServiceTemporarilyUnavailable),
    (503, ErrorKind::ServiceTemporarilyUnavailable),
    (504, ErrorKind::ServiceTemporarilyUnavailable),
];

const BAD_REQUEST_IS_INVALID_URL: &[(u16, ErrorKind)] = &[(400, ErrorKind::InvalidUrl)];

const ACCEPT_JSON: &[(&str, &str)] = &[("Accept", "application/json")];

const SLUG_PATTERN: &str = "[A-Za-z0-9_-]";
const SLUG_ALLOWED: &str = "letters, digits, '-' and '_'";

// da.gd answers 400 with a one-line plain text reason.
const DAGD_PHRASES: &[(&str, ErrorKind)] = &[
    ("already taken", ErrorKind::AliasAlreadyExists),
    ("blacklisted", ErrorKind::DomainNotAllowed),
    ("custom short url", ErrorKind::InvalidAlias),
    ("scheme", ErrorKind::InvalidUrl),
    ("long url", ErrorKind::InvalidUrl),
];

// is.gd and v.gd: errorcode 1 long URL, 2 short URL, 3 rate limit, 4 other.
// Code 2 covers both malformed and taken aliases, the message tells them apart.
const ISGD_PHRASES: &[(&str, ErrorKind)] = &[
    ("already exists", ErrorKind::AliasAlreadyExists),
    ("blacklist", ErrorKind::DomainNotAllowed),
];

const ISGD_CODES: &[(i64, ErrorKind)] = &[
    (1, ErrorKind::InvalidUrl),
    (2, ErrorKind::InvalidAlias),
    (3, ErrorKind::RateLimitExceeded),
    (4, ErrorKind::ServiceTemporarilyUnavailable),
];

// tinyurl only ever says "Error"; the status is the only signal.
const TINYURL_HINTS: &[(u16, ErrorKind)] = &[
    (400, ErrorKind::InvalidUrl),
    (422, ErrorKind::AliasAlreadyExists),
];

// kurzelinks serves German or English pages depending on Accept-Language.
const KURZELINKS_PHRASES: &[(&str, ErrorKind)] = &[
    ("already exists", ErrorKind::AliasAlreadyExists),
    ("existiert bereits", ErrorKind::AliasAlreadyExists),
    ("already been shortened", ErrorKind::UrlAlreadyExistsWithDifferentAlias),
    ("bereits gekürzt", ErrorKind::UrlAlreadyExistsWithDifferentAlias),
    ("invalid format", ErrorKind::InvalidUrl),
    ("ungültiges format", ErrorKind::InvalidUrl),
    ("captcha", ErrorKind::HumanVerificationRequired),
    ("too many", ErrorKind::RateLimitExceeded),
    ("zu viele", ErrorKind::RateLimitExceeded),
    ("nicht erlaubt", ErrorKind::DomainNotAllowed),
    ("not allowed", ErrorKind::DomainNotAllowed),
];

const KURZELINKS_GROUP: &str = "kurzelinks.de, 0cn.de, t1p.de, ogy.de";

const OWO_PHRASES: &[(&str, ErrorKind)] = &[
    ("blacklist", ErrorKind::DomainNotAllowed),
    ("not allowed", ErrorKind::DomainNotAllowed),
    ("must match format", ErrorKind::InvalidUrl),
];

const SPOO_PHRASES: &[(&str, ErrorKind)] = &[
    ("already exists", ErrorKind::AliasAlreadyExists),
    ("blocked", ErrorKind::DomainNotAllowed),
];

const SPOO_KEYS: &[(&str, ErrorKind)] = &[
    ("UrlError", ErrorKind::InvalidUrl),
    ("AliasError", ErrorKind::InvalidAlias),
    ("EmojiError", ErrorKind::InvalidAlias),
];

// t.ly sits behind a Cloudflare challenge that answers 403 with an HTML page.
const TLY_PHRASES: &[(&str, ErrorKind)] = &[
    ("just a moment", ErrorKind::HumanVerificationRequired),
    ("cf-chl", ErrorKind::HumanVerificationRequired),
    ("captcha", ErrorKind::HumanVerificationRequired),
    ("blacklist", ErrorKind::DomainNotAllowed),
    ("not allowed", ErrorKind::DomainNotAllowed),
    ("format is invalid", ErrorKind::InvalidUrl),
];

const TLY_HINTS: &[(u16, ErrorKind)] = &[
    (403, ErrorKind::HumanVerificationRequired),
    (422, ErrorKind::InvalidUrl),
];

const ULVIS_PHRASES: &[(&str, ErrorKind)] = &[
    ("already", ErrorKind::AliasAlreadyExists),
    ("invalid url", ErrorKind::InvalidUrl),
    ("domain", ErrorKind::DomainNotAllowed),
];

const ULVIS_HINTS: &[(u16, ErrorKind)] = &[(403, ErrorKind::HumanVerificationRequired)];

const CLEANURI_PHRASES: &[(&str, ErrorKind)] = &[("not allowed", ErrorKind::DomainNotAllowed)];

const CLEANURI_KEYS: &[(&str, ErrorKind)] = &[("error", ErrorKind::InvalidUrl)];

const GITIO_PHRASES: &[(&str, ErrorKind)] = &[
    ("github.com url", ErrorKind::DomainNotAllowed),
    ("taken", ErrorKind::AliasAlreadyExists),
];

const GITIO_HINTS: &[(u16, ErrorKind)] = &[(422, ErrorKind::InvalidUrl)];

const fn isgd(
    name: &'static str,
    base_url: &'static str,
    create_url: &'static str,
    forward_url: &'static str,
    short_url: &'static str,
    info: ProviderInfo,
) -> Provider {
    Provider {
        name,
        group: Some("is.gd, v.gd"),
        base_url,
        enabled: true,
        alias: Some(AliasConstraint::new(
            5,
            Some(30),
            "[A-Za-z0-9_]",
            "letters, digits and '_'",
        )),
        sanitizer: Sanitizer::ABSOLUTE,
        create: RequestTemplate::get(create_url)
            .extra(&[("format", "json"), ("logstats", "0")])
            .url_field("url")
            .alias_field("shorturl"),
        response: ResponseSpec {
            shape: ResponseShape::JsonKey {
                path: &["shorturl"],
                prefix: "",
            },
            errors: ErrorTable::statuses(COMMON_STATUSES)
                .phrases(ISGD_PHRASES)
                .json_codes(&["errorcode"], ISGD_CODES)
                .message_path(&["errormessage"]),
            alias_echo: false,
        },
        check: Some(CheckSpec {
            request: RequestTemplate::get(forward_url)
                .extra(&[("format", "json")])
                .alias_field("shorturl"),
            long_url: LongUrlSource::Json(&["url"]),
            not_found_statuses: &[404],
            not_found_keys: &["errorcode"],
            short_url,
        }),
        clicks: None,
        timeout: None,
        info,
    }
}

const fn kurzelinks(name: &'static str, base_url: &'static str) -> Provider {
    Provider {
        name,
        group: Some(KURZELINKS_GROUP),
        base_url,
        enabled: true,
        alias: Some(AliasConstraint::new(
            3,
            Some(40),
            "[A-Za-z0-9-]",
            "letters, digits and '-'",
        )),
        sanitizer: Sanitizer::ABSOLUTE,
        create: RequestTemplate::post_form(base_url)
            .url_field("url")
            .alias_field("alias")
            .extra(&[("private", "1")]),
        response: ResponseSpec {
            shape: ResponseShape::HtmlSlice {
                start: "shortenurl\" type=\"text\" value=\"",
                end: "\" onClick",
            },
            errors: ErrorTable::statuses(COMMON_STATUSES).phrases(KURZELINKS_PHRASES),
            alias_echo: false,
        },
        check: None,
        clicks: None,
        // The form handler regularly needs well over the default timeout.
        timeout: Some(Duration::from_secs(60)),
        info: ProviderInfo {
            homepage: base_url,
            privacy: Some("https://kurzelinks.de/datenschutz"),
            terms: Some("https://kurzelinks.de/impressum"),
        },
    }
}

const fn owo(name: &'static str, extra: &'static [(&'static str, &'static str)]) -> Provider {
    Provider {
        name,
        group: Some("owo.vc"),
        base_url: "https://owo.vc",
        enabled: true,
        alias: None,
        sanitizer: Sanitizer::ABSOLUTE,
        create: RequestTemplate::post_json("https://owo.vc/api/v2/link")
            .url_field("link")
            .extra(extra)
            .headers(ACCEPT_JSON),
        response: ResponseSpec {
            // `id` is "owo.vc/<words>" without a scheme.
            shape: ResponseShape::JsonKey {
                path: &["id"],
                prefix: "https://",
            },
            errors: ErrorTable::statuses(COMMON_STATUSES)
                .phrases(OWO_PHRASES)
                .status_hints(BAD_REQUEST_IS_INVALID_URL)
                .message_path(&["message"]),
            alias_echo: false,
        },
        check: None,
        clicks: Some(ClickSpec {
            request: RequestTemplate::get("https://owo.vc/api/v2/link/{short}").headers(ACCEPT_JSON),
            count_path: &["visits"],
            errors: ErrorTable::statuses(COMMON_STATUSES).message_path(&["message"]),
        }),
        timeout: None,
        info: ProviderInfo {
            homepage: "https://owo.vc",
            privacy: None,
            terms: None,
        },
    }
}

const fn spoo(
    name: &'static str,
    create_url: &'static str,
    alias_field: &'static str,
    alias: AliasConstraint,
) -> Provider {
    Provider {
        name,
        group: Some("spoo.me"),
        base_url: "https://spoo.me",
        enabled: true,
        alias: Some(alias),
        sanitizer: Sanitizer::ABSOLUTE,
        create: RequestTemplate::post_form(create_url)
            .url_field("url")
            .alias_field(alias_field)
            .headers(ACCEPT_JSON),
        response: ResponseSpec {
            shape: ResponseShape::JsonKey {
                path: &["short_url"],
                prefix: "",
            },
            errors: ErrorTable::statuses(COMMON_STATUSES)
                .phrases(SPOO_PHRASES)
                .json_keys(SPOO_KEYS)
                .status_hints(BAD_REQUEST_IS_INVALID_URL),
            alias_echo: false,
        },
        check: None,
        clicks: Some(ClickSpec {
            request: RequestTemplate::post_form("https://spoo.me/stats/{alias}").headers(ACCEPT_JSON),
            count_path: &["total-clicks"],
            errors: ErrorTable::statuses(COMMON_STATUSES),
        }),
        timeout: None,
        info: ProviderInfo {
            homepage: "https://spoo.me",
            privacy: Some("https://spoo.me/privacy-policy"),
            terms: Some("https://spoo.me/terms-of-service"),
        },
    }
}

const fn tly(name: &'static str, base_url: &'static str, extra: &'static [(&'static str, &'static str)]) -> Provider {
    Provider {
        name,
        group: Some("t.ly"),
        base_url,
        enabled: true,
        alias: None,
        sanitizer: Sanitizer::ABSOLUTE,
        create: RequestTemplate::post_json("https://t.ly/api/v1/link/shorten")
            .url_field("long_url")
            .extra(extra)
            .headers(ACCEPT_JSON),
        response: ResponseSpec {
            shape: ResponseShape::JsonKey {
                path: &["short_url"],
                prefix: "",
            },
            errors: ErrorTable::statuses(COMMON_STATUSES)
                .phrases(TLY_PHRASES)
                .status_hints(TLY_HINTS)
                .message_path(&["message"]),
            alias_echo: false,
        },
        check: None,
        clicks: None,
        timeout: None,
        info: ProviderInfo {
            homepage: "https://t.ly",
            privacy: Some("https://t.ly/privacy"),
            terms: Some("https://t.ly/terms"),
        },
    }
}

static PROVIDERS: &[Provider] = &[
    Provider {
        name: "da.gd",
        group: None,
        base_url: "https://da.gd",
        enabled: true,
        alias: Some(AliasConstraint::new(1, None, SLUG_PATTERN, SLUG_ALLOWED)),
        sanitizer: Sanitizer::ABSOLUTE,
        create: RequestTemplate::get("https://da.gd/s")
            .url_field("url")
            .alias_field("shorturl"),
        response: ResponseSpec {
            shape: ResponseShape::PlainText {
                prefix: "https://da.gd/",
            },
            errors: ErrorTable::statuses(COMMON_STATUSES)
                .phrases(DAGD_PHRASES)
                .status_hints(BAD_REQUEST_IS_INVALID_URL),
            alias_echo: false,
        },
        // coshorten answers with the long URL behind an alias, 404 otherwise.
        check: Some(CheckSpec {
            request: RequestTemplate::get("https://da.gd/coshorten/{alias}"),
            long_url: LongUrlSource::PlainText,
            not_found_statuses: &[404],
            not_found_keys: &[],
            short_url: "https://da.gd/{alias}",
        }),
        clicks: None,
        timeout: None,
        info: ProviderInfo {
            homepage: "https://da.gd/help",
            privacy: None,
            terms: None,
        },
    },
    isgd(
        "v.gd",
        "https://v.gd",
        "https://v.gd/create.php",
        "https://v.gd/forward.php",
        "https://v.gd/{alias}",
        ProviderInfo {
            homepage: "https://v.gd",
            privacy: Some("https://v.gd/privacy.php"),
            terms: Some("https://v.gd/terms.php"),
        },
    ),
    isgd(
        "is.gd",
        "https://is.gd",
        "https://is.gd/create.php",
        "https://is.gd/forward.php",
        "https://is.gd/{alias}",
        ProviderInfo {
            homepage: "https://is.gd",
            privacy: Some("https://is.gd/privacy.php"),
            terms: Some("https://is.gd/terms.php"),
        },
    ),
    Provider {
        name: "tinyurl.com",
        group: None,
        base_url: "https://tinyurl.com",
        enabled: true,
        alias: Some(AliasConstraint::new(5, Some(30), SLUG_PATTERN, SLUG_ALLOWED)),
        // api-create.php reads everything after `url=` as the long URL.
        sanitizer: Sanitizer::VERBATIM,
        create: RequestTemplate::get("https://tinyurl.com/api-create.php")
            .alias_field("alias")
            .verbatim_url_field("url"),
        response: ResponseSpec {
            shape: ResponseShape::PlainText {
                prefix: "https://tinyurl.com/",
            },
            errors: ErrorTable::statuses(COMMON_STATUSES).status_hints(TINYURL_HINTS),
            alias_echo: false,
        },
        check: None,
        clicks: None,
        timeout: None,
        info: ProviderInfo {
            homepage: "https://tinyurl.com",
            privacy: Some("https://tinyurl.com/app/privacy-policy"),
            terms: Some("https://tinyurl.com/app/terms"),
        },
    },
    kurzelinks("kurzelinks.de", "https://kurzelinks.de/"),
    kurzelinks("0cn.de", "https://0cn.de/"),
    kurzelinks("t1p.de", "https://t1p.de/"),
    kurzelinks("ogy.de", "https://ogy.de/"),
    Provider {
        name: "1pt.co",
        group: None,
        base_url: "https://1pt.co",
        enabled: true,
        alias: Some(AliasConstraint::new(1, Some(50), SLUG_PATTERN, SLUG_ALLOWED)),
        sanitizer: Sanitizer::ABSOLUTE,
        create: RequestTemplate::get("https://csclub.uwaterloo.ca/~phthakka/1pt-express/addURL")
            .url_field("long")
            .alias_field("short"),
        response: ResponseSpec {
            shape: ResponseShape::JsonKey {
                path: &["short"],
                prefix: "https://1pt.co/",
            },
            errors: ErrorTable::statuses(COMMON_STATUSES)
                .status_hints(BAD_REQUEST_IS_INVALID_URL)
                .message_path(&["message"]),
            // A taken alias is silently replaced by a random one.
            alias_echo: true,
        },
        check: Some(CheckSpec {
            request: RequestTemplate::get("https://csclub.uwaterloo.ca/~phthakka/1pt-express/getURL")
                .alias_field("url"),
            long_url: LongUrlSource::Json(&["url"]),
            not_found_statuses: &[404],
            not_found_keys: &[],
            short_url: "https://1pt.co/{alias}",
        }),
        clicks: None,
        timeout: None,
        info: ProviderInfo {
            homepage: "https://1pt.co",
            privacy: None,
            terms: None,
        },
    },
    owo("owo.vc", &[("generator", "owo"), ("metadata", "IGNORE")]),
    owo("owo.vc (zws)", &[("generator", "zws"), ("metadata", "IGNORE")]),
    owo("owo.vc (sketchy)", &[("generator", "sketchy"), ("metadata", "IGNORE")]),
    owo("owo.vc (gay)", &[("generator", "gay"), ("metadata", "IGNORE")]),
    spoo(
        "spoo.me",
        "https://spoo.me/",
        "alias",
        AliasConstraint::new(1, Some(15), SLUG_PATTERN, SLUG_ALLOWED),
    ),
    spoo(
        "spoo.me (emoji)",
        "https://spoo.me/emoji",
        "emojies",
        AliasConstraint::new(
            1,
            Some(15),
            r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\u{200D}\u{FE0F}]",
            "emoji only",
        ),
    ),
    tly("t.ly", "https://t.ly", &[("domain", "https://t.ly/")]),
    tly("twtr.to", "https://twtr.to", &[("domain", "https://twtr.to/")]),
    tly("jpeg.ly", "https://jpeg.ly", &[("domain", "https://jpeg.ly/")]),
    Provider {
        name: "ulvis.net",
        group: None,
        base_url: "https://ulvis.net",
        // Put behind a browser challenge.
        enabled: false,
        alias: Some(AliasConstraint::new(1, Some(60), "[A-Za-z0-9]", "letters and digits")),
        sanitizer: Sanitizer::VERBATIM,
        create: RequestTemplate::get("https://ulvis.net/API/write/get")
            .extra(&[("type", "json")])
            .alias_field("custom")
            .verbatim_url_field("url"),
        response: ResponseSpec {
            shape: ResponseShape::JsonKey {
                path: &["data", "url"],
                prefix: "",
            },
            errors: ErrorTable::statuses(COMMON_STATUSES)
                .phrases(ULVIS_PHRASES)
                .status_hints(ULVIS_HINTS)
                .message_path(&["error", "msg"]),
            alias_echo: false,
        },
        check: None,
        clicks: None,
        timeout: None,
        info: ProviderInfo {
            homepage: "https://ulvis.net",
            privacy: Some("https://ulvis.net/privacy.html"),
            terms: None,
        },
    },
    Provider {
        name: "cleanuri.com",
        group: None,
        base_url: "https://cleanuri.com",
        enabled: true,
        alias: None,
        sanitizer: Sanitizer::ABSOLUTE,
        create: RequestTemplate::post_form("https://cleanuri.com/api/v1/shorten").url_field("url"),
        response: ResponseSpec {
            shape: ResponseShape::JsonKey {
                path: &["result_url"],
                prefix: "",
            },
            errors: ErrorTable::statuses(COMMON_STATUSES)
                .phrases(CLEANURI_PHRASES)
                .json_keys(CLEANURI_KEYS)
                .status_hints(BAD_REQUEST_IS_INVALID_URL)
                .message_path(&["error"]),
            alias_echo: false,
        },
        check: None,
        clicks: None,
        timeout: None,
        info: ProviderInfo {
            homepage: "https://cleanuri.com",
            privacy: None,
            terms: None,
        },
    },
    Provider {
        name: "git.io",
        group: None,
        base_url: "https://git.io",
        // Retired by GitHub; kept so existing records still resolve.
        enabled: false,
        alias: Some(AliasConstraint::new(1, None, SLUG_PATTERN, SLUG_ALLOWED)),
        sanitizer: Sanitizer::ABSOLUTE,
        create: RequestTemplate::post_form("https://git.io/")
            .url_field("url")
            .alias_field("code"),
        response: ResponseSpec {
            shape: ResponseShape::Header {
                name: "location",
                prefix: "https://git.io/",
            },
            errors: ErrorTable::statuses(COMMON_STATUSES)
                .phrases(GITIO_PHRASES)
                .status_hints(GITIO_HINTS),
            alias_echo: false,
        },
        check: None,
        clicks: None,
        timeout: None,
        info: ProviderInfo {
            homepage: "https://github.blog/changelog/2022-04-25-git-io-deprecation/",
            privacy: None,
            terms: None,
        },
    },
];

/// Stand-in for records that reference a provider no longer in the catalog.
pub static UNKNOWN: Provider = Provider {
    name: "unknown",
    group: None,
    base_url: "",
    enabled: false,
    alias: None,
    sanitizer: Sanitizer::TRIM,
    create: RequestTemplate::get(""),
    response: ResponseSpec {
        shape: ResponseShape::PlainText { prefix: "" },
        errors: ErrorTable::statuses(COMMON_STATUSES),
        alias_echo: false,
    },
    check: None,
    clicks: None,
    timeout: None,
    info: ProviderInfo {
        homepage: "",
        privacy: None,
        terms: None,
    },
};

/// Every known provider, enabled or not, in display order.
pub fn all() -> &'static [Provider] {
    PROVIDERS
}

pub fn enabled() -> impl Iterator<Item = &'static Provider> {
    PROVIDERS.iter().filter(|provider| provider.enabled)
}

pub fn find(name: &str) -> Option<&'static Provider> {
    let name = name.trim();
    PROVIDERS
        .iter()
        .find(|provider| provider.name.eq_ignore_ascii_case(name))
}

/// Like [`find`], falling back to [`UNKNOWN`].
pub fn by_identity(name: &str) -> &'static Provider {
    find(name).unwrap_or(&UNKNOWN)
}
