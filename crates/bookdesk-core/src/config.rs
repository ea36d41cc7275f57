// ── Console configuration ──
//
// Runtime settings handed to `Console::new`. Profiles on disk are resolved
// into this by `bookdesk-config`; tests build it directly.

use std::time::Duration;

use bookdesk_api::{TlsMode, TransportConfig};
use url::Url;

use crate::error::CoreError;

/// API base used when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost/idea-backend/public";
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Admin endpoints are resolved under this base, prefix included.
    pub api_url: Url,
    pub page_size: u32,
    pub transport: TransportConfig,
}

impl ConsoleConfig {
    pub fn new(api_url: &str) -> Result<Self, CoreError> {
        let api_url = Url::parse(api_url).map_err(|e| CoreError::Config {
            message: format!("invalid API URL {api_url:?}: {e}"),
        })?;
        Ok(Self {
            api_url,
            page_size: DEFAULT_PAGE_SIZE,
            transport: TransportConfig::default(),
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = timeout;
        self
    }

    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.transport.tls = tls;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = ConsoleConfig::new(DEFAULT_API_URL).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost/idea-backend/public");
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn bad_url_is_a_config_error() {
        assert!(matches!(
            ConsoleConfig::new("not a url"),
            Err(CoreError::Config { .. })
        ));
        assert_eq!(ConsoleConfig::new("http://x").unwrap().with_page_size(0).page_size, 1);
    }
}
