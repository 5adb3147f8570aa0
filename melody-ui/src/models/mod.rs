//! Data models for melody-ui
//!
//! - Workflow state owned by the controller
//! - Stage transition records

pub mod workflow_state;

pub use melody_common::Stage;
pub use workflow_state::{StageTransition, TokenOption, WorkflowState};
