//! Client configuration (environment driven).

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST API, including the `/api` path.
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// JSON file backing the durable session slot.
    pub session_path: PathBuf,
    /// Enables the demo role switch and the local demo login.
    pub demo_mode: bool,
}

impl ClientConfig {
    /// Read configuration from the process environment.
    ///
    /// - `FORMADMIN_API_URL`
    /// - `FORMADMIN_REQUEST_TIMEOUT_MS`
    /// - `FORMADMIN_SESSION_PATH`
    /// - `FORMADMIN_DEMO_MODE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = match lookup("FORMADMIN_API_URL") {
            Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => {
                tracing::warn!("FORMADMIN_API_URL not set; using {DEFAULT_API_URL}");
                DEFAULT_API_URL.to_string()
            }
        };

        let timeout_ms = match lookup("FORMADMIN_REQUEST_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid FORMADMIN_REQUEST_TIMEOUT_MS; using default");
                DEFAULT_TIMEOUT_MS
            }),
            None => DEFAULT_TIMEOUT_MS,
        };

        let session_path = match lookup("FORMADMIN_SESSION_PATH") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
            _ => crate::storage::default_session_path(),
        };

        let demo_mode = lookup("FORMADMIN_DEMO_MODE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Self {
            api_base_url,
            request_timeout: Duration::from_millis(timeout_ms),
            session_path,
            demo_mode,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            session_path: crate::storage::default_session_path(),
            demo_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg.api_base_url, DEFAULT_API_URL);
        assert_eq!(cfg.request_timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert!(!cfg.demo_mode);
    }

    #[test]
    fn reads_overrides() {
        let cfg = ClientConfig::from_lookup(lookup(&[
            ("FORMADMIN_API_URL", "https://formation.example.com/api/"),
            ("FORMADMIN_REQUEST_TIMEOUT_MS", "2500"),
            ("FORMADMIN_SESSION_PATH", "/tmp/formadmin-session.json"),
            ("FORMADMIN_DEMO_MODE", "TRUE"),
        ]));
        assert_eq!(cfg.api_base_url, "https://formation.example.com/api");
        assert_eq!(cfg.request_timeout, Duration::from_millis(2500));
        assert_eq!(cfg.session_path, PathBuf::from("/tmp/formadmin-session.json"));
        assert!(cfg.demo_mode);
    }

    #[test]
    fn bad_timeout_falls_back_to_default() {
        let cfg = ClientConfig::from_lookup(lookup(&[("FORMADMIN_REQUEST_TIMEOUT_MS", "soon")]));
        assert_eq!(cfg.request_timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }
}
