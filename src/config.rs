// src/config.rs

//! Credential loading utilities.
//!
//! The session cookie blob is an opaque secret and never lives in the TOML
//! configuration. It is read from the environment, or from a `config.env`
//! style KEY=VALUE file when one is provided.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};

/// Environment variable holding the session cookie blob.
pub const COOKIES_VAR: &str = "ATLASSIAN_COOKIES";

/// Opaque credentials for the Goal directory API.
#[derive(Clone)]
pub struct Credentials {
    cookies: String,
}

impl Credentials {
    /// Wrap an already-obtained cookie blob.
    pub fn new(cookies: impl Into<String>) -> Self {
        Self {
            cookies: cookies.into(),
        }
    }

    /// Load credentials from the process environment.
    pub fn from_env() -> Result<Self> {
        match env::var(COOKIES_VAR) {
            Ok(value) if !value.trim().is_empty() => Ok(Self::new(value.trim().to_string())),
            _ => Err(AppError::config(format!(
                "{COOKIES_VAR} is not set; export it or pass --env-file"
            ))),
        }
    }

    /// Load credentials from a `config.env` style file, falling back to the
    /// process environment for any variable the file does not define.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let vars = parse_env_file(path.as_ref())?;
        match vars.get(COOKIES_VAR) {
            Some(value) if !value.is_empty() => Ok(Self::new(value.clone())),
            _ => Self::from_env(),
        }
    }

    /// The raw cookie header value.
    pub fn cookie_header(&self) -> &str {
        &self.cookies
    }
}

// Debug must not leak the cookie blob into logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("cookies", &format!("<{} chars>", self.cookies.len()))
            .finish()
    }
}

/// Parse a KEY=VALUE file, skipping blank lines and `#` comments.
///
/// Values may be wrapped in single or double quotes; quotes are stripped.
fn parse_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::config(format!("Cannot read env file {}: {e}", path.display()))
    })?;

    let mut vars = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            vars.insert(key.trim().to_string(), value);
        }
    }
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_env_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_key_value_lines() {
        let file = write_env_file(
            "# comment\n\
             ATLASSIAN_COOKIES=\"cloud.session.token=abc; other=1\"\n\
             \n\
             OTHER='quoted'\n",
        );

        let vars = parse_env_file(file.path()).unwrap();
        assert_eq!(
            vars.get("ATLASSIAN_COOKIES").map(String::as_str),
            Some("cloud.session.token=abc; other=1")
        );
        assert_eq!(vars.get("OTHER").map(String::as_str), Some("quoted"));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn env_file_provides_credentials() {
        let file = write_env_file("ATLASSIAN_COOKIES=token=xyz\n");
        let credentials = Credentials::from_env_file(file.path()).unwrap();
        assert_eq!(credentials.cookie_header(), "token=xyz");
    }

    #[test]
    fn missing_env_file_is_an_error() {
        assert!(Credentials::from_env_file("/nonexistent/config.env").is_err());
    }

    #[test]
    fn debug_does_not_print_the_cookie() {
        let credentials = Credentials::new("secret-cookie-value");
        let printed = format!("{credentials:?}");
        assert!(!printed.contains("secret-cookie-value"));
    }
}
