//! Suger: a crawler for a stateful, postback-driven search grid
//!
//! This crate walks a server-rendered result grid (initialize session, submit
//! search, page the grid, open a row) while round-tripping the server's hidden
//! form tokens, fans the work out over a pool of independent sessions, and
//! later scrapes the retrieved detail pages into structured records.

pub mod config;
pub mod crawler;
pub mod output;
pub mod scrape;
pub mod state;

use thiserror::Error;

/// Main error type for Suger operations
#[derive(Debug, Error)]
pub enum SugerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTML parse error for {path}: {message}")]
    HtmlParse { path: String, message: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),
}

impl SugerError {
    /// Wraps a transport failure together with the URL it was aimed at
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Returns true for errors the orchestrator answers by restarting the partition
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Protocol(_))
    }
}

/// Violations of the postback protocol detected locally or from a response
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Response from {url} is missing token field {name}")]
    MissingToken { url: String, name: &'static str },

    #[error("Post URL changed: {actual} (was: {expected})")]
    PostbackTargetChanged { expected: String, actual: String },

    #[error("Detail page at {url} has an empty title")]
    EmptyTitle { url: String },

    #[error("Cannot {operation} while navigator is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: state::NavState,
    },

    #[error("Page {target} is not reachable from page {current}")]
    PageOutOfWindow { current: u32, target: u32 },

    #[error("Unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Suger operations
pub type Result<T> = std::result::Result<T, SugerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, Range, RetrievedPage};
pub use state::{NavState, PartitionState};
