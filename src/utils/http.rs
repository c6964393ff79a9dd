// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::config::Credentials;
use crate::error::{AppError, Result};
use crate::models::{ApiConfig, CrawlerConfig};

/// Create a configured HTTP client for the Goal directory gateway.
///
/// Every request carries the vendor's client markers, the site origin and
/// the session cookie; the cookie header is marked sensitive so it never
/// shows up in debug output.
pub fn create_client(
    config: &CrawlerConfig,
    api: &ApiConfig,
    credentials: &Credentials,
) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert("atl-client-name", HeaderValue::from_static("townsquare-frontend"));
    headers.insert("atl-client-version", HeaderValue::from_static("daf3c1"));
    headers.insert(
        header::ORIGIN,
        HeaderValue::from_str(&api.base_url)
            .map_err(|e| AppError::config(format!("api.base_url is not a valid origin: {e}")))?,
    );

    let mut cookie = HeaderValue::from_str(credentials.cookie_header())
        .map_err(|_| AppError::config("cookie blob contains invalid header characters"))?;
    cookie.set_sensitive(true);
    headers.insert(header::COOKIE, cookie);

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(headers)
        .build()?;
    Ok(client)
}
