//! Workflow stages
//!
//! The backend is authoritative for stage identity: every stage change the
//! client commits is decoded from a backend response string. `Uninitialized`
//! is client-local and never appears on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Before the round-init call has succeeded
    Uninitialized,
    /// Choose the backend data source
    SelectDataPlugin,
    /// Choose how the data source obtains its credential
    #[serde(rename = "ENTER_USER_ACCESS_TOKEN")]
    EnterAccessToken,
    /// Choose the visualization
    SelectDisplayPlugin,
    /// Rendered results
    Display,
}

/// Stage name that the backend sent but this client does not know
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized stage '{0}'")]
pub struct UnknownStage(pub String);

impl Stage {
    /// Wire name used by the backend, `None` for `Uninitialized`
    pub fn wire_name(self) -> Option<&'static str> {
        match self {
            Stage::Uninitialized => None,
            Stage::SelectDataPlugin => Some("SELECT_DATA_PLUGIN"),
            Stage::EnterAccessToken => Some("ENTER_USER_ACCESS_TOKEN"),
            Stage::SelectDisplayPlugin => Some("SELECT_DISPLAY_PLUGIN"),
            Stage::Display => Some("DISPLAY"),
        }
    }

    /// Decode a stage name from a backend response
    pub fn from_wire(name: &str) -> Result<Self, UnknownStage> {
        match name {
            "SELECT_DATA_PLUGIN" => Ok(Stage::SelectDataPlugin),
            "ENTER_USER_ACCESS_TOKEN" => Ok(Stage::EnterAccessToken),
            "SELECT_DISPLAY_PLUGIN" => Ok(Stage::SelectDisplayPlugin),
            "DISPLAY" => Ok(Stage::Display),
            other => Err(UnknownStage(other.to_string())),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name().unwrap_or("UNINITIALIZED"))
    }
}
