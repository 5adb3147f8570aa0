//! Workflow state for one round
//!
//! The controller is the only writer. The stage field is a cache of the last
//! stage the backend confirmed, never a locally computed successor.

use chrono::{DateTime, Utc};
use melody_common::{Stage, Track};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::plugins::Renderable;

/// How the selected data plugin obtains its access token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenOption {
    /// Backend uses the data plugin's built-in token
    #[default]
    Default,
    /// User supplies the token
    Custom,
    /// Backend runs its own browser-based flow
    Browser,
}

impl TokenOption {
    /// `method` query value sent to `/getAccessToken`
    pub fn method(self) -> &'static str {
        match self {
            TokenOption::Default => "default",
            TokenOption::Custom => "custom",
            TokenOption::Browser => "browser",
        }
    }
}

impl fmt::Display for TokenOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

impl FromStr for TokenOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(TokenOption::Default),
            "custom" => Ok(TokenOption::Custom),
            "browser" => Ok(TokenOption::Browser),
            other => Err(format!("unknown token option '{}'", other)),
        }
    }
}

/// Record of a committed stage change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub round_id: Uuid,
    pub old_stage: Stage,
    pub new_stage: Stage,
    pub transitioned_at: DateTime<Utc>,
}

/// Everything the workflow controller tracks for the current round
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    /// Identifies the round in logs and events
    pub round_id: Uuid,

    pub stage: Stage,

    /// Data plugin names reported by the backend for this round
    pub data_plugin_names: Vec<String>,

    /// Display plugin names from the manifest
    pub display_plugin_names: Vec<String>,

    pub selected_data_plugin: usize,
    pub selected_display_plugin: usize,

    pub token_option: TokenOption,

    /// Only sent when `token_option` is `Custom`
    pub custom_token: String,

    /// Populated by the display-stage fetch
    pub track_data: Vec<Track>,

    /// Loaded, data-bound visualization
    pub resolved_display: Option<Renderable>,

    /// User-facing notice, cleared whenever a stage is entered
    pub status_message: Option<String>,
}

impl WorkflowState {
    /// State before the round-init call has succeeded
    pub fn uninitialized(display_plugin_names: Vec<String>) -> Self {
        Self {
            round_id: Uuid::new_v4(),
            stage: Stage::Uninitialized,
            data_plugin_names: Vec::new(),
            display_plugin_names,
            selected_data_plugin: 0,
            selected_display_plugin: 0,
            token_option: TokenOption::Default,
            custom_token: String::new(),
            track_data: Vec::new(),
            resolved_display: None,
            status_message: None,
        }
    }

    /// Fresh state for a new round, as confirmed by the backend
    pub fn new_round(
        stage: Stage,
        data_plugin_names: Vec<String>,
        display_plugin_names: Vec<String>,
    ) -> Self {
        Self {
            stage,
            data_plugin_names,
            ..Self::uninitialized(display_plugin_names)
        }
    }

    /// Name of the currently selected data plugin, if the index is valid
    pub fn selected_data_plugin_name(&self) -> Option<&str> {
        self.data_plugin_names
            .get(self.selected_data_plugin)
            .map(String::as_str)
    }

    /// Name of the currently selected display plugin, if the index is valid
    pub fn selected_display_plugin_name(&self) -> Option<&str> {
        self.display_plugin_names
            .get(self.selected_display_plugin)
            .map(String::as_str)
    }

    /// Token value sent with the current option
    pub fn token_parameter(&self) -> &str {
        match self.token_option {
            TokenOption::Custom => &self.custom_token,
            TokenOption::Default | TokenOption::Browser => "",
        }
    }
}
