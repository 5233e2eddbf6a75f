//! Per-worker HTTP session state
//!
//! A session bundles the cookie-carrying client, the URL the grid's form
//! currently posts back to, and the hidden tokens from the latest response.
//! The server binds all three together, so a session is owned by exactly one
//! worker and thrown away whenever that worker fails.

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::{ProtocolError, SugerError};
use reqwest::{redirect::Policy, Client};
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Hidden form fields the server expects back verbatim on every postback
pub const TOKEN_FIELDS: [&str; 3] = [
    "__VIEWSTATE",
    "__VIEWSTATEGENERATOR",
    "__EVENTVALIDATION",
];

/// Anti-tamper tokens captured from one response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    fields: Vec<(String, String)>,
}

impl TokenSet {
    /// Extracts the token fields from an HTML document
    ///
    /// Tokens are located by element id, matching how the grid renders them.
    ///
    /// # Errors
    ///
    /// `ProtocolError::MissingToken` naming the first field not present.
    pub fn extract(html: &str, url: &str) -> Result<Self, ProtocolError> {
        let document = Html::parse_document(html);
        let mut fields = Vec::with_capacity(TOKEN_FIELDS.len());

        for name in TOKEN_FIELDS {
            let value = Selector::parse(&format!("#{}", name))
                .ok()
                .and_then(|selector| {
                    document
                        .select(&selector)
                        .next()
                        .and_then(|element| element.value().attr("value"))
                        .map(str::to_string)
                })
                .ok_or_else(|| ProtocolError::MissingToken {
                    url: url.to_string(),
                    name,
                })?;
            fields.push((name.to_string(), value));
        }

        Ok(Self { fields })
    }

    /// Value of a token, if captured
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Builds a postback body: the tokens followed by `extra` fields
    pub fn form_with(&self, extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut form = self.fields.clone();
        form.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        form
    }
}

/// Mutable connection state for one worker
#[derive(Debug)]
pub struct Session {
    client: Client,
    form_url: Url,
    tokens: TokenSet,
}

impl Session {
    /// Creates a session with a fresh cookie jar, targeting `base_url`
    pub fn new(config: &Config) -> Result<Self, SugerError> {
        let client = build_http_client(&config.user_agent, &config.crawler)
            .map_err(|e| SugerError::network(&config.site.base_url, e))?;
        let form_url = Url::parse(&config.site.base_url)?;

        Ok(Self::with_client(client, form_url))
    }

    /// Creates a session around an existing client
    pub fn with_client(client: Client, form_url: Url) -> Self {
        Self {
            client,
            form_url,
            tokens: TokenSet::default(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// URL the next postback is sent to
    pub fn form_url(&self) -> &Url {
        &self.form_url
    }

    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    /// Replaces the whole token set
    pub fn set_tokens(&mut self, tokens: TokenSet) {
        self.tokens = tokens;
    }

    /// Retargets postbacks after the server moved the session
    pub fn set_form_url(&mut self, url: Url) {
        self.form_url = url;
    }
}

/// Builds an HTTP client with a private cookie jar
///
/// Redirects are followed so that the final URL of a postback is observable;
/// callers compare it against the form URL to detect desynchronised sessions.
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", user_agent.crawler_name, user_agent.crawler_version);

    Client::builder()
        .user_agent(user_agent)
        .cookie_store(true)
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}
