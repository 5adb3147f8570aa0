//! Workflow event system
//!
//! The controller publishes every committed stage change, status message
//! change and display binding on an [`EventBus`]. Front ends and tests
//! subscribe to follow a round without holding the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::stage::Stage;

/// Melody workflow events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowEvent {
    /// A new round started (mount or restart)
    RoundStarted {
        round_id: Uuid,
        /// Data plugin names reported by the backend for this round
        data_plugins: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// The backend confirmed a new stage
    StageChanged {
        round_id: Uuid,
        old_stage: Stage,
        new_stage: Stage,
        timestamp: DateTime<Utc>,
    },

    /// User-facing status message set or cleared
    StatusChanged {
        round_id: Uuid,
        message: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// A display plugin was resolved and bound to the round's tracks
    DisplayReady {
        round_id: Uuid,
        plugin: String,
        track_count: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast channel for [`WorkflowEvent`]s
///
/// Publishing never blocks; subscribers that fall behind see
/// `RecvError::Lagged`. Events emitted before a subscription are not seen.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: WorkflowEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No subscribers for workflow event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
