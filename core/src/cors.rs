//! Cross-origin access checks.
//!
//! A page may only read a response from another origin when the server
//! grants it with `Access-Control-Allow-Origin`. The dispatcher applies the
//! same rule when a page origin is configured.

use ::http::Uri;

use crate::error::ApiError;
use crate::http::HttpResponse;

pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";

/// `scheme://host[:port]` of `url`, lowercased, with the scheme's default
/// port dropped. `None` for relative URLs.
pub fn origin_of(url: &str) -> Option<String> {
    let uri: Uri = url.parse().ok()?;
    let scheme = uri.scheme_str()?.to_ascii_lowercase();
    let host = uri.host()?.to_ascii_lowercase();
    let default_port = match scheme.as_str() {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    };
    match uri.port_u16() {
        Some(port) if Some(port) != default_port => Some(format!("{scheme}://{host}:{port}")),
        _ => Some(format!("{scheme}://{host}")),
    }
}

/// Refuse `response` when it crosses from `page_origin` to another origin
/// without a matching grant. Same-origin responses always pass.
pub fn check_access(page_origin: &str, url: &str, response: &HttpResponse) -> Result<(), ApiError> {
    let page = origin_of(page_origin)
        .unwrap_or_else(|| page_origin.trim_end_matches('/').to_ascii_lowercase());
    if origin_of(url).as_deref() == Some(page.as_str()) {
        return Ok(());
    }
    match response.header_value(ALLOW_ORIGIN).map(str::trim) {
        Some("*") => Ok(()),
        Some(granted) if origin_of(granted).as_deref() == Some(page.as_str()) => Ok(()),
        _ => Err(ApiError::CrossOrigin { origin: page }),
    }
}
