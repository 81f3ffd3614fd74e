//! Utility functions and helpers.

pub mod html;
pub mod http;

use url::Url;

use crate::error::{AppError, Result};

/// Scheme, host and port of a URL, without a trailing slash.
pub fn origin_of(url_str: &str) -> Result<String> {
    let url = Url::parse(url_str)?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(AppError::parse(url_str, "URL has no host origin"));
    }
    Ok(origin.ascii_serialization())
}

/// Prefix a site-relative reference (`/path`) with `origin`.
///
/// Protocol-relative (`//host/path`), absolute and page-relative
/// references are returned unchanged.
pub fn absolutize_site_relative(href: &str, origin: &str) -> String {
    if href.starts_with('/') && !href.starts_with("//") {
        format!("{}{}", origin.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}
