//! Deterministic stand-ins for the remote grid, used by unit tests

use crate::crawler::navigator::{is_reachable, Navigator, NavigatorFactory, RowResponse};
use crate::{ProtocolError, SugerError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCall {
    Initialize,
    SubmitSearch,
    AdvanceToPage(u32),
    OpenRow(u32),
}

/// Navigator over an in-memory grid with scripted failures
#[derive(Debug, Default)]
pub struct MockNavigator {
    calls: Arc<Mutex<Vec<NavCall>>>,
    page: Option<u32>,
    opens: u32,
    fail_on_open: Option<u32>,
    drop_connection_on_open: Option<u32>,
    blank_title_on_open: Option<u32>,
    fail_search: bool,
}

impl MockNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the `n`-th `open_row` call (1-based)
    pub fn fail_on_open(mut self, n: u32) -> Self {
        self.fail_on_open = Some(n);
        self
    }

    /// Fails the `n`-th `open_row` call with a transport error
    pub fn drop_connection_on_open(mut self, n: u32) -> Self {
        self.drop_connection_on_open = Some(n);
        self
    }

    /// Serves a page without a title on the `n`-th `open_row` call
    pub fn blank_title_on_open(mut self, n: u32) -> Self {
        self.blank_title_on_open = Some(n);
        self
    }

    pub fn fail_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// Records calls into a shared log instead of a private one
    pub fn with_log(mut self, calls: Arc<Mutex<Vec<NavCall>>>) -> Self {
        self.calls = calls;
        self
    }

    pub fn calls(&self) -> Vec<NavCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn advances(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                NavCall::AdvanceToPage(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: NavCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn server_error() -> SugerError {
        ProtocolError::UnexpectedStatus {
            url: "mock://grid".to_string(),
            status: 500,
        }
        .into()
    }

    fn transport_error() -> SugerError {
        let source = match reqwest::Client::new().get("not a url").build() {
            Err(e) => e,
            Ok(_) => panic!("malformed URL was accepted"),
        };
        SugerError::network("mock://grid", source)
    }
}

#[async_trait]
impl Navigator for MockNavigator {
    async fn initialize(&mut self) -> Result<(), SugerError> {
        self.record(NavCall::Initialize);
        Ok(())
    }

    async fn submit_search(&mut self) -> Result<(), SugerError> {
        self.record(NavCall::SubmitSearch);
        if self.fail_search {
            return Err(Self::server_error());
        }
        self.page = Some(1);
        Ok(())
    }

    async fn advance_to_page(&mut self, page: u32) -> Result<(), SugerError> {
        self.record(NavCall::AdvanceToPage(page));
        let current = self.page.ok_or_else(Self::server_error)?;
        if !is_reachable(current, page) {
            return Err(ProtocolError::PageOutOfWindow {
                current,
                target: page,
            }
            .into());
        }
        self.page = Some(page);
        Ok(())
    }

    async fn open_row(&mut self, row: u32) -> Result<RowResponse, SugerError> {
        self.record(NavCall::OpenRow(row));
        self.opens += 1;
        let page = self.page.ok_or_else(Self::server_error)?;

        if self.fail_on_open == Some(self.opens) {
            return Err(Self::server_error());
        }
        if self.drop_connection_on_open == Some(self.opens) {
            return Err(Self::transport_error());
        }

        let title = if self.blank_title_on_open == Some(self.opens) {
            String::new()
        } else {
            format!("Record {}-{}", page, row)
        };

        Ok(RowResponse {
            url: format!("mock://grid/{}/{}", page, row),
            body: format!(
                r#"<html><body><span id="lblTitle">{}</span></body></html>"#,
                title
            )
            .into_bytes(),
        })
    }
}

/// Hands out scripted navigators in order, then well-behaved ones
#[derive(Debug, Default)]
pub struct ScriptedFactory {
    scripts: Mutex<VecDeque<MockNavigator>>,
    created: AtomicUsize,
}

impl ScriptedFactory {
    pub fn new(scripts: Vec<MockNavigator>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            created: AtomicUsize::new(0),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl NavigatorFactory for ScriptedFactory {
    type Nav = MockNavigator;

    fn create(&self) -> Result<MockNavigator, SugerError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let next = self.scripts.lock().unwrap().pop_front();
        Ok(next.unwrap_or_default())
    }
}
