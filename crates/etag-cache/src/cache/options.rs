//! Fetch configuration.

use std::path::PathBuf;
use std::time::Duration;

use super::transport::CancelToken;

/// Environment variable overriding the default cache directory.
pub const CACHE_DIR_ENV: &str = "ETAG_CACHE_DIR";

/// Cache directory used when neither an option nor the environment names one.
pub const DEFAULT_CACHE_DIR: &str = ".http-cache";

/// Options for fetch operations.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Custom cache directory (overrides default)
    pub cache_dir: Option<PathBuf>,
    /// Per-request timeout (default: none)
    pub request_timeout: Option<Duration>,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Cancels an in-flight request
    pub cancel: CancelToken,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cache_dir: None,
            request_timeout: None,
            user_agent: format!("etag-cache@{}", env!("CARGO_PKG_VERSION")),
            cancel: CancelToken::default(),
        }
    }
}

impl FetchOptions {
    /// The configured cache directory, or [`default_cache_dir`].
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}

/// Get the default cache directory.
///
/// `$ETAG_CACHE_DIR` when set, `.http-cache` relative to the working directory
/// otherwise.
pub fn default_cache_dir() -> PathBuf {
    std::env::var_os(CACHE_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR))
}

/// Parse a duration string like "30s", "5m", "24h", "7d", "1w".
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, unit_secs) = if let Some(stripped) = s.strip_suffix("ms") {
        let millis: u64 = stripped.parse().ok()?;
        return Some(Duration::from_millis(millis));
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 1)
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 60)
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 60 * 60)
    } else if let Some(stripped) = s.strip_suffix('d') {
        (stripped, 24 * 60 * 60)
    } else if let Some(stripped) = s.strip_suffix('w') {
        (stripped, 7 * 24 * 60 * 60)
    } else {
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num.checked_mul(unit_secs)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("24h"), Some(Duration::from_secs(86400)));
        assert_eq!(parse_duration("7d"), Some(Duration::from_secs(604800)));
        assert_eq!(parse_duration("1w"), Some(Duration::from_secs(604800)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration(" 2m "), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("1.5h"), None);
        assert_eq!(parse_duration("-3s"), None);
    }

    #[test]
    fn test_default_options() {
        let opts = FetchOptions::default();

        assert_eq!(opts.cache_dir, None);
        assert_eq!(opts.request_timeout, None);
        assert!(opts.user_agent.starts_with("etag-cache@"));
        assert!(!opts.cancel.is_cancelled());
    }

    #[test]
    fn test_explicit_cache_dir_wins() {
        let opts = FetchOptions {
            cache_dir: Some(PathBuf::from("/tmp/custom")),
            ..Default::default()
        };
        assert_eq!(opts.resolved_cache_dir(), PathBuf::from("/tmp/custom"));
    }
}
