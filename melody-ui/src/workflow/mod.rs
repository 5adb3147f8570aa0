//! Stage-driven workflow
//!
//! - [`WorkflowController`]: owns the round state and runs transitions
//! - [`SharedWorkflow`]: lock-guarded handle that rejects overlapping triggers

pub mod controller;
pub mod shared;

pub use controller::{WorkflowController, WorkflowTimeouts, LOADING_MESSAGE};
pub use shared::SharedWorkflow;
