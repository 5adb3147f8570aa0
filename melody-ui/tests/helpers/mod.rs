//! Test Helper Utilities
//!
//! Scripted in-memory backend for driving the workflow controller

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use melody_common::events::EventBus;
use melody_common::{Stage, Track};
use melody_ui::error::BackendError;
use melody_ui::plugins::{builtin_registry, PluginManifest, PluginRegistry};
use melody_ui::services::{DisplayReply, MelodyBackend, RoundInit, StageReply, TokenRequest};
use melody_ui::{WorkflowController, WorkflowTimeouts};
use tokio::sync::Notify;

/// One backend call as the fake saw it
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    NewMelody,
    DataPlugin(usize),
    AccessToken(TokenRequest),
    ShowDisplay,
}

#[derive(Default)]
struct Script {
    new_melody: VecDeque<Result<RoundInit, BackendError>>,
    data_plugin: VecDeque<Result<StageReply, BackendError>>,
    access_token: VecDeque<Result<StageReply, BackendError>>,
    show_display: VecDeque<Result<DisplayReply, BackendError>>,
}

/// Backend that answers from per-endpoint queues
///
/// With an empty queue each endpoint answers with the happy-path reply,
/// so tests only script the calls they care about.
#[derive(Default)]
pub struct FakeBackend {
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
    display_gate: Mutex<Option<Arc<Notify>>>,
    display_delay: Mutex<Option<Duration>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_new_melody(&self, reply: Result<RoundInit, BackendError>) {
        self.script.lock().unwrap().new_melody.push_back(reply);
    }

    pub fn push_data_plugin(&self, reply: Result<StageReply, BackendError>) {
        self.script.lock().unwrap().data_plugin.push_back(reply);
    }

    pub fn push_access_token(&self, reply: Result<StageReply, BackendError>) {
        self.script.lock().unwrap().access_token.push_back(reply);
    }

    pub fn push_show_display(&self, reply: Result<DisplayReply, BackendError>) {
        self.script.lock().unwrap().show_display.push_back(reply);
    }

    /// Make `/showDisplay` wait until the returned handle is notified
    pub fn hold_show_display(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.display_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn delay_show_display(&self, delay: Duration) {
        *self.display_delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MelodyBackend for FakeBackend {
    async fn new_melody(&self) -> Result<RoundInit, BackendError> {
        self.record(Call::NewMelody);
        let scripted = self.script.lock().unwrap().new_melody.pop_front();
        scripted.unwrap_or_else(|| Ok(round_init(&["Spotify", "Vimeo"])))
    }

    async fn select_data_plugin(&self, index: usize) -> Result<StageReply, BackendError> {
        self.record(Call::DataPlugin(index));
        let scripted = self.script.lock().unwrap().data_plugin.pop_front();
        scripted.unwrap_or(Ok(StageReply {
            stage: Stage::EnterAccessToken,
        }))
    }

    async fn set_access_token(&self, request: &TokenRequest) -> Result<StageReply, BackendError> {
        self.record(Call::AccessToken(request.clone()));
        let scripted = self.script.lock().unwrap().access_token.pop_front();
        scripted.unwrap_or(Ok(StageReply {
            stage: Stage::SelectDisplayPlugin,
        }))
    }

    async fn show_display(&self) -> Result<DisplayReply, BackendError> {
        self.record(Call::ShowDisplay);

        let gate = self.display_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let delay = *self.display_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().unwrap().show_display.pop_front();
        scripted.unwrap_or_else(|| {
            Ok(DisplayReply {
                stage: Stage::Display,
                track_data: sample_tracks(),
            })
        })
    }
}

pub fn round_init(data_plugins: &[&str]) -> RoundInit {
    RoundInit {
        data_plugins: data_plugins.iter().map(|s| s.to_string()).collect(),
        stage: Stage::SelectDataPlugin,
        track_data: Vec::new(),
    }
}

/// The two-track round used throughout the plugin tests
pub fn sample_tracks() -> Vec<Track> {
    vec![
        Track::new(
            "A",
            "X",
            "2024-01-01T10:00:00Z",
            vec!["pop".to_string()],
            vec![1.234, -0.876],
        ),
        Track::new(
            "B",
            "Y",
            "2024-01-01T12:00:00Z",
            vec!["pop".to_string(), "rock".to_string()],
            vec![0.0, 0.0],
        ),
    ]
}

pub fn test_timeouts() -> WorkflowTimeouts {
    WorkflowTimeouts {
        request: Duration::from_secs(5),
        plugin_load: Duration::from_secs(5),
    }
}

/// Controller over the fake backend with the built-in plugins
pub fn create_test_controller(
    backend: &Arc<FakeBackend>,
    manifest: &[&str],
) -> (WorkflowController, EventBus) {
    create_controller_with_timeouts(backend, manifest, test_timeouts())
}

pub fn create_controller_with_timeouts(
    backend: &Arc<FakeBackend>,
    manifest: &[&str],
    timeouts: WorkflowTimeouts,
) -> (WorkflowController, EventBus) {
    create_controller_with_registry(
        backend,
        builtin_registry(PluginManifest::from_names(manifest.iter().copied())),
        timeouts,
    )
}

/// Controller over the fake backend with a caller-built registry
pub fn create_controller_with_registry(
    backend: &Arc<FakeBackend>,
    registry: PluginRegistry,
    timeouts: WorkflowTimeouts,
) -> (WorkflowController, EventBus) {
    let event_bus = EventBus::new(100);
    let controller = WorkflowController::new(
        Arc::clone(backend) as Arc<dyn MelodyBackend>,
        registry,
        event_bus.clone(),
        timeouts,
    );
    (controller, event_bus)
}

/// Controller already advanced to `SelectDisplayPlugin`
pub async fn controller_at_display_choice(
    backend: &Arc<FakeBackend>,
    manifest: &[&str],
) -> (WorkflowController, EventBus) {
    let (mut controller, event_bus) = create_test_controller(backend, manifest);
    controller.initialize().await.unwrap();
    controller.confirm_data_plugin().await.unwrap();
    controller.confirm_access_token().await.unwrap();
    assert_eq!(controller.stage(), Stage::SelectDisplayPlugin);
    (controller, event_bus)
}
