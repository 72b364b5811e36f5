//! Client configuration (environment driven).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

pub const API_URL_VAR: &str = "STOREFRONT_API_URL";
pub const SESSION_FILE_VAR: &str = "STOREFRONT_SESSION_FILE";
pub const HTTP_TIMEOUT_VAR: &str = "STOREFRONT_HTTP_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the credential service, without a trailing slash.
    pub api_url: String,
    /// Where the file-backed session store lives.
    pub session_file: PathBuf,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a closure over a map).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = var(API_URL_VAR)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let session_file = match var(SESSION_FILE_VAR) {
            Some(path) => PathBuf::from(path),
            None => default_session_file()?,
        };

        let request_timeout = match var(HTTP_TIMEOUT_VAR) {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("{HTTP_TIMEOUT_VAR} must be a whole number of seconds, got {raw:?}"))?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            session_file,
            request_timeout,
        })
    }
}

fn default_session_file() -> anyhow::Result<PathBuf> {
    let mut path = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    path.push("storefront");
    path.push("session.json");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn explicit_values_win() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_VAR, "https://shop.example.com/api/"),
            (SESSION_FILE_VAR, "/tmp/session.json"),
            (HTTP_TIMEOUT_VAR, "3"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://shop.example.com/api");
        assert_eq!(config.session_file, PathBuf::from("/tmp/session.json"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_VAR, "  "),
            (SESSION_FILE_VAR, "/tmp/s.json"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn bad_timeout_is_reported() {
        let err = ClientConfig::from_lookup(lookup(&[
            (SESSION_FILE_VAR, "/tmp/s.json"),
            (HTTP_TIMEOUT_VAR, "soon"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains(HTTP_TIMEOUT_VAR));
    }
}
