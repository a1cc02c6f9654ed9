use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::models::alias_of;
use crate::providers::{Encoding, Provider, RequestTemplate};
use crate::transport::{Body, HttpRequest};

/// Characters left alone when a value is placed in a single path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Request that creates a short URL. The long URL is sanitized with the
/// provider's own rules first.
pub fn build_create(provider: &Provider, long_url: &str, alias: Option<&str>) -> HttpRequest {
    let long_url = provider.sanitizer.apply(long_url);
    let alias = alias.filter(|alias| !alias.is_empty());
    build(provider, &provider.create, Some(&long_url), alias, None)
}

/// Request that asks whether `alias` is already bound, if the provider
/// can answer that.
pub fn build_check(provider: &Provider, alias: &str) -> Option<HttpRequest> {
    let check = provider.check.as_ref()?;
    Some(build(provider, &check.request, None, Some(alias), None))
}

/// Request for the click count of an existing short URL, if supported.
pub fn build_clicks(provider: &Provider, short_url: &str) -> Option<HttpRequest> {
    let clicks = provider.clicks.as_ref()?;
    let alias = alias_of(short_url);
    let mut request = build(
        provider,
        &clicks.request,
        None,
        Some(&alias),
        Some(short_url),
    );
    request.cacheable = true;
    Some(request)
}

fn build(
    provider: &Provider,
    template: &RequestTemplate,
    long_url: Option<&str>,
    alias: Option<&str>,
    short_url: Option<&str>,
) -> HttpRequest {
    let mut url = expand(template.url, alias, short_url);

    let mut params: Vec<(String, String)> = template
        .extra
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    let mut verbatim = None;
    if let (Some(field), Some(long_url)) = (template.url_field, long_url) {
        if template.verbatim_url && template.encoding == Encoding::Query {
            verbatim = Some((field, long_url));
        } else {
            params.push((field.to_string(), long_url.to_string()));
        }
    }
    if let (Some(field), Some(alias)) = (template.alias_field, alias) {
        params.push((field.to_string(), alias.to_string()));
    }

    let body = match template.encoding {
        Encoding::Query => {
            if !params.is_empty() {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&params)
                    .finish();
                push_query(&mut url, &query);
            }
            if let Some((field, long_url)) = verbatim {
                push_query(&mut url, &format!("{field}={long_url}"));
            }
            None
        }
        Encoding::Form => Some(Body::Form(params)),
        Encoding::Json => {
            let object: Map<String, Value> = params
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            Some(Body::Json(Value::Object(object)))
        }
    };

    HttpRequest {
        method: template.method,
        url,
        headers: template
            .headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        body,
        timeout: provider.timeout,
        cacheable: false,
    }
}

fn push_query(url: &mut String, query: &str) {
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(query);
}

fn expand(template: &str, alias: Option<&str>, short_url: Option<&str>) -> String {
    let mut url = template.to_string();
    if let Some(alias) = alias {
        url = url.replace("{alias}", &utf8_percent_encode(alias, SEGMENT).to_string());
    }
    if let Some(short_url) = short_url {
        let host_path = host_and_path(short_url);
        url = url.replace("{short}", &utf8_percent_encode(&host_path, SEGMENT).to_string());
    }
    url
}

/// "https://owo.vc/a-b/" becomes "owo.vc/a-b".
fn host_and_path(short_url: &str) -> String {
    match url::Url::parse(short_url) {
        Ok(parsed) => {
            let decoded = percent_encoding::percent_decode_str(parsed.path()).decode_utf8_lossy();
            format!(
                "{}{}",
                parsed.host_str().unwrap_or_default(),
                decoded.trim_end_matches('/')
            )
        }
        Err(_) => short_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string(),
    }
}
