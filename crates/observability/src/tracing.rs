//! Tracing subscriber initialization.
//!
//! The filter comes from `RUST_LOG` (default `info`). The output format
//! comes from `FORMADMIN_LOG_FORMAT`: `json` (default) or `pretty`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::parse(std::env::var("FORMADMIN_LOG_FORMAT").ok().as_deref())
    }

    /// Unknown values fall back to JSON.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "pretty" || v == "text" => Self::Pretty,
            _ => Self::Json,
        }
    }
}

/// Install the global subscriber. Later calls leave the first one in place.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // Logs go to stderr so command output on stdout stays machine-readable.
    let _ = match format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing() {
        assert_eq!(LogFormat::parse(None), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" Pretty ")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(Some("text")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(Some("xml")), LogFormat::Json);
    }

    #[test]
    fn init_twice_is_harmless() {
        init(LogFormat::Json);
        init(LogFormat::Pretty);
    }
}
