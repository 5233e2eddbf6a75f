use serde::Deserialize;
use std::time::Duration;

/// Default landing page of the classification search grid
pub const DEFAULT_BASE_URL: &str = "https://app.mda.gov.sg/Classification/Search/Film/";

/// Main configuration structure for Suger
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The remote search interface
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// URL of the search form; also the base for resolving detail-page links
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// How the pause before restarting a failed partition grows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// Always wait `backoff-secs`
    #[default]
    Fixed,
    /// Double the wait on every consecutive failure, capped at `max-backoff-secs`
    Exponential,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of independent sessions crawling in parallel
    pub workers: u32,

    /// Backoff strategy between retries of a failed partition
    pub backoff: BackoffStrategy,

    /// Base pause before a failed partition is restarted (seconds)
    #[serde(rename = "backoff-secs")]
    pub backoff_secs: u64,

    /// Upper bound for exponential backoff (seconds)
    #[serde(rename = "max-backoff-secs")]
    pub max_backoff_secs: u64,

    /// Restarts allowed per partition before it is abandoned; unlimited when absent
    #[serde(rename = "max-retries")]
    pub max_retries: Option<u32>,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            backoff: BackoffStrategy::Fixed,
            backoff_secs: 30,
            max_backoff_secs: 300,
            max_retries: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl CrawlerConfig {
    /// Pause before the restart that follows the `failures`-th consecutive failure
    pub fn backoff_delay(&self, failures: u32) -> Duration {
        let secs = match self.backoff {
            BackoffStrategy::Fixed => self.backoff_secs,
            BackoffStrategy::Exponential => {
                let factor = 1u64
                    .checked_shl(failures.saturating_sub(1))
                    .unwrap_or(u64::MAX);
                self.backoff_secs
                    .saturating_mul(factor)
                    .min(self.max_backoff_secs)
            }
        };
        Duration::from_secs(secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving one HTML file per retrieved detail page
    #[serde(rename = "html-dir")]
    pub html_dir: String,

    /// Directory receiving the scraped JSON document
    #[serde(rename = "out-dir")]
    pub out_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            html_dir: "html".to_string(),
            out_dir: "out".to_string(),
        }
    }
}
