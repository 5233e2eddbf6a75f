//! Postback protocol engine
//!
//! The search grid is driven entirely by form postbacks. Every step posts the
//! token set captured from the previous response and captures a fresh one, so
//! the steps must run strictly in order over a single [`Session`]:
//!
//! 1. `initialize` - GET the landing form
//! 2. `submit_search` - POST the category filters; the server may move the form
//! 3. `advance_to_page` - POST a pager event for a page inside the visible window
//! 4. `open_row` - POST a row event and hand back the detail page

use crate::config::Config;
use crate::crawler::session::{Session, TokenSet};
use crate::state::{NavOp, NavState};
use crate::{ProtocolError, SugerError};
use async_trait::async_trait;
use reqwest::Response;
use std::sync::Arc;
use url::Url;

/// Number of page links the grid pager renders at once
pub const PAGE_WINDOW: u32 = 10;

/// Control that raises grid events
const GRID_TARGET: &str = "gvResult";

/// Category filters selecting the two record kinds of interest
const SEARCH_FIELDS: [(&str, &str); 4] = [
    ("chklstType$0", "Feature"),
    ("chklstType$2", "Feature"),
    ("chklstType$3", "Serial"),
    ("btnSearch", "Search"),
];

/// Raw response to a row postback
#[derive(Debug, Clone)]
pub struct RowResponse {
    /// Final URL of the response
    pub url: String,

    /// Undecoded body
    pub body: Vec<u8>,
}

/// One stateful conversation with the search grid
#[async_trait]
pub trait Navigator: Send {
    /// Loads the landing form and captures its tokens
    async fn initialize(&mut self) -> Result<(), SugerError>;

    /// Submits the category search; the grid then shows page 1
    async fn submit_search(&mut self) -> Result<(), SugerError>;

    /// Moves the grid to `page`, which must be inside the rendered pager window
    async fn advance_to_page(&mut self, page: u32) -> Result<(), SugerError>;

    /// Opens row `row` of the displayed page and returns the detail page
    async fn open_row(&mut self, row: u32) -> Result<RowResponse, SugerError>;
}

/// Creates a fresh navigator, with a fresh session, for every crawl attempt
pub trait NavigatorFactory: Send + Sync + 'static {
    type Nav: Navigator + 'static;

    fn create(&self) -> Result<Self::Nav, SugerError>;
}

/// First page of the pager block containing `page`
fn block_start(page: u32) -> u32 {
    (page - 1) / PAGE_WINDOW * PAGE_WINDOW + 1
}

/// Returns true if the pager rendered for `current` links directly to `target`
///
/// The pager shows every page of the current block plus an ellipsis link to
/// the last page of the previous block and the first page of the next one.
pub fn is_reachable(current: u32, target: u32) -> bool {
    let first = block_start(current);
    let last = first + PAGE_WINDOW - 1;
    (first..=last).contains(&target) || target == last + 1 || (first > 1 && target == first - 1)
}

/// Pages to request, in order, to move a fresh grid from page 1 to `target`
///
/// Beyond the first block the grid can only step forward one block at a time
/// through the ellipsis link (11, 21, 31, ...) before jumping to the target.
pub fn seek_path(target: u32) -> Vec<u32> {
    if target <= 1 {
        return Vec::new();
    }

    let mut path: Vec<u32> = (PAGE_WINDOW + 1..target)
        .step_by(PAGE_WINDOW as usize)
        .collect();
    path.push(target);
    path
}

/// Navigator speaking HTTP to the live grid
pub struct HttpNavigator {
    session: Session,
    state: NavState,
}

impl HttpNavigator {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            state: NavState::Uninitialized,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn guard(&self, op: NavOp) -> Result<(), ProtocolError> {
        if self.state.permits(op) {
            Ok(())
        } else {
            Err(ProtocolError::InvalidTransition {
                operation: op.name(),
                state: self.state,
            })
        }
    }

    /// Posts the current tokens plus `extra` to the form URL
    async fn post(&self, extra: &[(&str, &str)]) -> Result<Response, SugerError> {
        let url = self.session.form_url().clone();
        let form = self.session.tokens().form_with(extra);
        tracing::trace!("Posting {} fields to {}", form.len(), url);

        let response = self
            .session
            .client()
            .post(url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| SugerError::network(url.as_str(), e))?;

        check_status(response)
    }

    /// Reads a response and captures its tokens; returns the final URL
    async fn absorb(&mut self, response: Response) -> Result<Url, SugerError> {
        let url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| SugerError::network(url.as_str(), e))?;
        let tokens = TokenSet::extract(&body, url.as_str())?;
        self.session.set_tokens(tokens);
        Ok(url)
    }
}

fn check_status(response: Response) -> Result<Response, SugerError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ProtocolError::UnexpectedStatus {
            url: response.url().to_string(),
            status: status.as_u16(),
        }
        .into())
    }
}

#[async_trait]
impl Navigator for HttpNavigator {
    async fn initialize(&mut self) -> Result<(), SugerError> {
        self.guard(NavOp::Initialize)?;

        let url = self.session.form_url().clone();
        tracing::debug!("Initializing session at {}", url);
        let response = self
            .session
            .client()
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SugerError::network(url.as_str(), e))?;
        let response = check_status(response)?;
        self.absorb(response).await?;

        self.state = NavState::Initialized;
        Ok(())
    }

    async fn submit_search(&mut self) -> Result<(), SugerError> {
        self.guard(NavOp::SubmitSearch)?;

        tracing::debug!("Submitting search to {}", self.session.form_url());
        let response = self.post(&SEARCH_FIELDS).await?;
        let final_url = self.absorb(response).await?;

        if &final_url != self.session.form_url() {
            tracing::debug!("Search moved the form to {}", final_url);
        }
        self.session.set_form_url(final_url);
        self.state = NavState::SearchSubmitted;
        Ok(())
    }

    async fn advance_to_page(&mut self, page: u32) -> Result<(), SugerError> {
        self.guard(NavOp::AdvanceToPage)?;

        let current = self.state.current_page().unwrap_or(1);
        if page == 0 || !is_reachable(current, page) {
            return Err(ProtocolError::PageOutOfWindow {
                current,
                target: page,
            }
            .into());
        }

        tracing::debug!("Requesting grid page {}", page);
        let argument = format!("Page${}", page);
        let response = self
            .post(&[("__EVENTTARGET", GRID_TARGET), ("__EVENTARGUMENT", argument.as_str())])
            .await?;

        if response.url() != self.session.form_url() {
            return Err(ProtocolError::PostbackTargetChanged {
                expected: self.session.form_url().to_string(),
                actual: response.url().to_string(),
            }
            .into());
        }

        self.absorb(response).await?;
        self.state = NavState::PageActive { page };
        Ok(())
    }

    async fn open_row(&mut self, row: u32) -> Result<RowResponse, SugerError> {
        self.guard(NavOp::OpenRow)?;

        tracing::debug!("Opening row {}", row);
        let argument = format!("Title${}", row);
        let response = self
            .post(&[("__EVENTTARGET", GRID_TARGET), ("__EVENTARGUMENT", argument.as_str())])
            .await?;

        // The grid's tokens stay valid for sibling rows; the detail page's do not.
        let url = response.url().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| SugerError::network(&url, e))?;

        Ok(RowResponse {
            url,
            body: body.to_vec(),
        })
    }
}

/// Builds [`HttpNavigator`]s, each over its own new session
#[derive(Debug, Clone)]
pub struct HttpNavigatorFactory {
    config: Arc<Config>,
}

impl HttpNavigatorFactory {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl NavigatorFactory for HttpNavigatorFactory {
    type Nav = HttpNavigator;

    fn create(&self) -> Result<HttpNavigator, SugerError> {
        Ok(HttpNavigator::new(Session::new(&self.config)?))
    }
}
