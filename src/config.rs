use std::time::Duration;

use reqwest::Url;

use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    /// Parses the base URL, dropping a trailing slash so endpoint paths join cleanly.
    pub fn parsed_base(&self) -> PipelineResult<Url> {
        let trimmed = self.base_url.trim_end_matches('/');
        Url::parse(trimmed).map_err(|e| {
            PipelineError::InvalidConfig(format!("invalid base URL '{}': {}", self.base_url, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_api() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_garbage_base_url() {
        let config = ApiConfig::new("not a url", 1000);
        assert!(matches!(
            config.parsed_base(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = ApiConfig::new("http://analytics.local:9000/", 1000);
        let url = config.parsed_base().unwrap();
        assert_eq!(url.host_str(), Some("analytics.local"));
        assert_eq!(url.port(), Some(9000));
    }
}
