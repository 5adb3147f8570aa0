//! Workflow controller
//!
//! Sequences a round: SELECT_DATA_PLUGIN → ENTER_USER_ACCESS_TOKEN →
//! SELECT_DISPLAY_PLUGIN → DISPLAY, with restart available from any stage.
//!
//! The backend names every next stage; the controller never computes a
//! successor itself. A failed trigger leaves the stage untouched, records
//! the failure as the status message and can simply be retried.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use melody_common::config::ClientSettings;
use melody_common::events::{EventBus, WorkflowEvent};
use melody_common::{time, Stage};
use tracing::{debug, info, warn};

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{StageTransition, TokenOption, WorkflowState};
use crate::plugins::PluginRegistry;
use crate::services::{MelodyBackend, RoundInit, TokenRequest};

/// Shown while the display-stage fetch runs
pub const LOADING_MESSAGE: &str = "Please be patient while the plugin is loading data from the API. \
This might take a while. Please don't do any operations on the interface.";

/// Upper bounds for suspended calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowTimeouts {
    pub request: Duration,
    pub plugin_load: Duration,
}

impl Default for WorkflowTimeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            plugin_load: Duration::from_secs(10),
        }
    }
}

impl From<&ClientSettings> for WorkflowTimeouts {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            request: settings.request_timeout,
            plugin_load: settings.plugin_load_timeout,
        }
    }
}

pub struct WorkflowController {
    backend: Arc<dyn MelodyBackend>,
    registry: PluginRegistry,
    state: WorkflowState,
    event_bus: EventBus,
    timeouts: WorkflowTimeouts,
    history: Vec<StageTransition>,
}

impl WorkflowController {
    pub fn new(
        backend: Arc<dyn MelodyBackend>,
        registry: PluginRegistry,
        event_bus: EventBus,
        timeouts: WorkflowTimeouts,
    ) -> Self {
        for name in registry.unregistered_manifest_entries() {
            warn!(plugin = %name, "Manifest lists a display plugin with no registered implementation");
        }
        let state = WorkflowState::uninitialized(registry.list_display_plugin_names().to_vec());

        Self {
            backend,
            registry,
            state,
            event_bus,
            timeouts,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Committed stage changes, oldest first, across all rounds
    pub fn history(&self) -> &[StageTransition] {
        &self.history
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // ------------------------------------------------------------------
    // Local selection (form controls, no backend calls)
    // ------------------------------------------------------------------

    pub fn select_data_plugin(&mut self, index: usize) {
        self.state.selected_data_plugin = index;
    }

    pub fn set_token_option(&mut self, option: TokenOption) {
        self.state.token_option = option;
    }

    pub fn set_custom_token(&mut self, token: impl Into<String>) {
        self.state.custom_token = token.into();
    }

    pub fn select_display_plugin(&mut self, index: usize) {
        self.state.selected_display_plugin = index;
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Start the first round
    ///
    /// Only leaves `Uninitialized` once: repeated calls after success are
    /// no-ops that report the current stage without contacting the backend.
    pub async fn initialize(&mut self) -> WorkflowResult<Stage> {
        if self.state.stage != Stage::Uninitialized {
            debug!(stage = %self.state.stage, "Workflow already initialized");
            return Ok(self.state.stage);
        }

        info!("Initializing Melody workflow");
        self.start_round().await
    }

    /// Discard the current round and start a new one
    pub async fn restart(&mut self) -> WorkflowResult<Stage> {
        info!(round_id = %self.state.round_id, stage = %self.state.stage, "Restarting round");
        self.start_round().await
    }

    /// Send the selected data plugin to the backend
    pub async fn confirm_data_plugin(&mut self) -> WorkflowResult<Stage> {
        let outcome = self.try_confirm_data_plugin().await;
        self.settle(outcome)
    }

    /// Send the credential choice to the backend
    pub async fn confirm_access_token(&mut self) -> WorkflowResult<Stage> {
        let outcome = self.try_confirm_access_token().await;
        self.settle(outcome)
    }

    /// Fetch the round's tracks and bind them to the selected display plugin
    pub async fn confirm_display_plugin(&mut self) -> WorkflowResult<Stage> {
        let outcome = self.try_confirm_display_plugin().await;
        self.settle(outcome)
    }

    async fn start_round(&mut self) -> WorkflowResult<Stage> {
        let outcome = self.fetch_round().await;
        match outcome {
            Ok(init) => Ok(self.begin_round(init)),
            Err(err) => self.settle(Err(err)),
        }
    }

    async fn fetch_round(&self) -> WorkflowResult<RoundInit> {
        bounded(
            "Round initialization",
            self.timeouts.request,
            self.backend.new_melody(),
        )
        .await
    }

    async fn try_confirm_data_plugin(&mut self) -> WorkflowResult<Stage> {
        self.require_stage(Stage::SelectDataPlugin, "choose a data plugin")?;
        let index = self.state.selected_data_plugin;
        check_index("data plugin", index, self.state.data_plugin_names.len())?;

        debug!(index, plugin = ?self.state.selected_data_plugin_name(), "Confirming data plugin");
        let reply = bounded(
            "Data plugin selection",
            self.timeouts.request,
            self.backend.select_data_plugin(index),
        )
        .await?;

        self.commit_stage(reply.stage);
        Ok(reply.stage)
    }

    async fn try_confirm_access_token(&mut self) -> WorkflowResult<Stage> {
        self.require_stage(Stage::EnterAccessToken, "set the access token")?;
        let request = TokenRequest {
            option: self.state.token_option,
            token: self.state.token_parameter().to_string(),
        };

        debug!(method = %request.option, "Confirming access token");
        let reply = bounded(
            "Access token",
            self.timeouts.request,
            self.backend.set_access_token(&request),
        )
        .await?;

        self.commit_stage(reply.stage);
        Ok(reply.stage)
    }

    async fn try_confirm_display_plugin(&mut self) -> WorkflowResult<Stage> {
        self.require_stage(Stage::SelectDisplayPlugin, "choose a display plugin")?;
        let index = self.state.selected_display_plugin;
        check_index("display plugin", index, self.state.display_plugin_names.len())?;
        let plugin_name = self
            .state
            .selected_display_plugin_name()
            .map(str::to_string)
            .unwrap_or_default();
        debug!(index, plugin = %plugin_name, "Confirming display plugin");

        self.set_status(Some(LOADING_MESSAGE.to_string()));

        let reply = bounded(
            "Track data fetch",
            self.timeouts.request,
            self.backend.show_display(),
        )
        .await?;

        info!(
            round_id = %self.state.round_id,
            tracks = reply.track_data.len(),
            "Received track data"
        );
        self.state.track_data = reply.track_data;

        if reply.stage != Stage::Display {
            // Backend inserted another step; follow it without rendering
            self.commit_stage(reply.stage);
            return Ok(reply.stage);
        }

        let plugin = bounded(
            "Display plugin load",
            self.timeouts.plugin_load,
            self.registry.resolve(&plugin_name),
        )
        .await?;
        let rendered = plugin.render(&self.state.track_data)?;

        self.state.resolved_display = Some(rendered);
        self.commit_stage(Stage::Display);
        self.event_bus.emit_lossy(WorkflowEvent::DisplayReady {
            round_id: self.state.round_id,
            plugin: plugin_name,
            track_count: self.state.track_data.len(),
            timestamp: time::now(),
        });

        Ok(Stage::Display)
    }

    /// Replace the whole state with a fresh round
    ///
    /// Display plugin names survive because the manifest is process-wide.
    fn begin_round(&mut self, init: RoundInit) -> Stage {
        if !init.track_data.is_empty() {
            debug!(tracks = init.track_data.len(), "Ignoring track data sent with round init");
        }

        let old_stage = self.state.stage;
        let had_status = self.state.status_message.is_some();

        self.registry.begin_round(init.data_plugins.clone());
        self.state = WorkflowState::new_round(
            init.stage,
            init.data_plugins,
            self.registry.list_display_plugin_names().to_vec(),
        );

        info!(
            round_id = %self.state.round_id,
            stage = %self.state.stage,
            data_plugins = ?self.state.data_plugin_names,
            "Round started"
        );
        self.event_bus.emit_lossy(WorkflowEvent::RoundStarted {
            round_id: self.state.round_id,
            data_plugins: self.state.data_plugin_names.clone(),
            timestamp: time::now(),
        });
        if had_status {
            self.emit_status();
        }
        self.record_transition(old_stage, self.state.stage);

        self.state.stage
    }

    /// Enter a backend-confirmed stage
    fn commit_stage(&mut self, new_stage: Stage) {
        let old_stage = self.state.stage;
        self.set_status(None);
        self.state.stage = new_stage;
        info!(round_id = %self.state.round_id, from = %old_stage, to = %new_stage, "Stage confirmed");
        self.record_transition(old_stage, new_stage);
    }

    fn record_transition(&mut self, old_stage: Stage, new_stage: Stage) {
        let transition = StageTransition {
            round_id: self.state.round_id,
            old_stage,
            new_stage,
            transitioned_at: time::now(),
        };
        self.event_bus.emit_lossy(WorkflowEvent::StageChanged {
            round_id: transition.round_id,
            old_stage,
            new_stage,
            timestamp: transition.transitioned_at,
        });
        self.history.push(transition);
    }

    fn set_status(&mut self, message: Option<String>) {
        if self.state.status_message != message {
            self.state.status_message = message;
            self.emit_status();
        }
    }

    fn emit_status(&self) {
        self.event_bus.emit_lossy(WorkflowEvent::StatusChanged {
            round_id: self.state.round_id,
            message: self.state.status_message.clone(),
            timestamp: time::now(),
        });
    }

    /// Convert a failed transition into a status message
    fn settle(&mut self, outcome: WorkflowResult<Stage>) -> WorkflowResult<Stage> {
        if let Err(err) = &outcome {
            warn!(round_id = %self.state.round_id, stage = %self.state.stage, error = %err, "Transition failed");
            // Announced even when the text repeats, one event per failed attempt
            self.state.status_message = Some(err.to_string());
            self.emit_status();
        }
        outcome
    }

    fn require_stage(&self, expected: Stage, action: &'static str) -> WorkflowResult<()> {
        if self.state.stage == expected {
            Ok(())
        } else {
            Err(WorkflowError::WrongStage {
                action,
                current: self.state.stage,
            })
        }
    }
}

fn check_index(what: &'static str, index: usize, len: usize) -> WorkflowResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(WorkflowError::InvalidSelection { what, index, len })
    }
}

/// Await `call`, failing with `Timeout` once `after` elapses
async fn bounded<T, E, F>(operation: &'static str, after: Duration, call: F) -> WorkflowResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<WorkflowError>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(WorkflowError::Timeout { operation, after }),
    }
}
