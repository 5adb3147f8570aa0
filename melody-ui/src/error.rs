//! Error types for melody-ui
//!
//! Each layer has its own enum; all of them fold into [`WorkflowError`] at the
//! transition boundary, where the controller turns them into a status message.

use std::time::Duration;

use melody_common::Stage;
use thiserror::Error;

/// Backend call failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Request rejected, connection failed or non-success status
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Body missing expected fields, not JSON, or carrying an unknown stage
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Display plugin resolution and rendering failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PluginError {
    /// No plugin is registered under this exact identifier
    #[error("Display plugin not found: {0}")]
    NotFound(String),

    /// The plugin's loader failed
    #[error("Display plugin '{name}' failed to load: {reason}")]
    LoadFailed { name: String, reason: String },

    /// The plugin rejected the track data
    #[error("Display plugin '{name}' could not render: {reason}")]
    RenderFailed { name: String, reason: String },
}

/// Data transformer precondition failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("track '{title}' has {len} score values, expected at least 2")]
    ScoreArity { title: String, len: usize },

    #[error("track '{title}' has unparsable timestamp '{timestamp}'")]
    BadTimestamp { title: String, timestamp: String },
}

/// Workflow transition failures
///
/// None of these are fatal: the stage stays where it was and the user may
/// retry the same trigger or restart the round.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Display plugin not found: {0}")]
    PluginNotFound(String),

    #[error("Display plugin '{name}' failed to load: {reason}")]
    PluginLoadFailed { name: String, reason: String },

    #[error("Display plugin '{name}' could not render: {reason}")]
    RenderFailed { name: String, reason: String },

    /// Selected index outside the corresponding name list
    #[error("Invalid {what} selection: index {index} but only {len} available")]
    InvalidSelection {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Trigger does not belong to the current stage
    #[error("Cannot {action} while in stage {current}")]
    WrongStage {
        action: &'static str,
        current: Stage,
    },

    /// Another transition is still awaiting its backend response
    #[error("Another step is still in progress, please wait")]
    TransitionInFlight,
}

impl From<BackendError> for WorkflowError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NetworkFailure(msg) => WorkflowError::NetworkFailure(msg),
            BackendError::MalformedResponse(msg) => WorkflowError::MalformedResponse(msg),
        }
    }
}

impl From<PluginError> for WorkflowError {
    fn from(err: PluginError) -> Self {
        match err {
            PluginError::NotFound(name) => WorkflowError::PluginNotFound(name),
            PluginError::LoadFailed { name, reason } => {
                WorkflowError::PluginLoadFailed { name, reason }
            }
            PluginError::RenderFailed { name, reason } => {
                WorkflowError::RenderFailed { name, reason }
            }
        }
    }
}

/// Result type for workflow transitions
pub type WorkflowResult<T> = Result<T, WorkflowError>;
