//! Configuration module for Suger
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to defaults that match the
//! live classification search site.
//!
//! # Example
//!
//! ```no_run
//! use suger::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("suger.toml")).unwrap();
//! println!("Crawling {} with {} workers", config.site.base_url, config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    BackoffStrategy, Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig,
    DEFAULT_BASE_URL,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_crawler_config, MAX_WORKERS};
