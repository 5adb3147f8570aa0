//! melody-ui library interface
//!
//! Guided client workflow for Melody: pick a data source, authenticate,
//! pick a visualization and view the rendered result.
//!
//! Exposes public APIs for integration testing.

pub mod console;
pub mod error;
pub mod models;
pub mod plugins;
pub mod services;
pub mod workflow;

pub use crate::error::{BackendError, PluginError, TransformError, WorkflowError, WorkflowResult};
pub use crate::workflow::{SharedWorkflow, WorkflowController, WorkflowTimeouts};
