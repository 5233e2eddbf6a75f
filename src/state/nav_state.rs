//! Navigator state definitions for the postback protocol
//!
//! The remote grid keeps its own server-side state; this enum mirrors it so
//! that out-of-order operations are refused locally.

use std::fmt;

/// Operations a navigator can be asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOp {
    Initialize,
    SubmitSearch,
    AdvanceToPage,
    OpenRow,
}

impl NavOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::SubmitSearch => "submit search",
            Self::AdvanceToPage => "advance to page",
            Self::OpenRow => "open row",
        }
    }
}

/// Where a navigator stands in the session protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavState {
    /// No request made yet; the session holds no tokens
    Uninitialized,

    /// Landing form fetched and tokens captured
    Initialized,

    /// Search submitted; the grid shows page 1
    SearchSubmitted,

    /// Grid paged to `page`
    PageActive { page: u32 },
}

impl NavState {
    /// Returns true if `op` is legal in this state
    pub fn permits(&self, op: NavOp) -> bool {
        match op {
            NavOp::Initialize => matches!(self, Self::Uninitialized),
            NavOp::SubmitSearch => matches!(self, Self::Initialized),
            NavOp::AdvanceToPage | NavOp::OpenRow => self.current_page().is_some(),
        }
    }

    /// Grid page currently rendered, if the grid is visible at all
    pub fn current_page(&self) -> Option<u32> {
        match self {
            Self::SearchSubmitted => Some(1),
            Self::PageActive { page } => Some(*page),
            Self::Uninitialized | Self::Initialized => None,
        }
    }
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initialized => write!(f, "initialized"),
            Self::SearchSubmitted => write!(f, "search-submitted"),
            Self::PageActive { page } => write!(f, "on page {}", page),
        }
    }
}
