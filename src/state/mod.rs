//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `NavState`: Where a navigator stands in the search/page/row protocol
//! - `PartitionState`: The orchestrator's view of one partition and its last failure

mod nav_state;
mod partition_state;

pub use nav_state::{NavOp, NavState};
pub use partition_state::{PartitionState, SlotStep};
