//! Shared handle for front ends that dispatch triggers from tasks
//!
//! Each trigger takes the controller lock without waiting. While one
//! transition is awaiting the backend, any other trigger is rejected with
//! `TransitionInFlight` instead of queueing behind it.

use std::sync::Arc;

use melody_common::Stage;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::WorkflowController;
use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{TokenOption, WorkflowState};

#[derive(Clone)]
pub struct SharedWorkflow {
    inner: Arc<Mutex<WorkflowController>>,
}

impl SharedWorkflow {
    pub fn new(controller: WorkflowController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Copy of the current state, waiting for any in-flight transition
    pub async fn snapshot(&self) -> WorkflowState {
        self.inner.lock().await.state().clone()
    }

    /// Copy of the current state, or `None` while a transition is in flight
    pub fn try_snapshot(&self) -> Option<WorkflowState> {
        self.inner.try_lock().ok().map(|c| c.state().clone())
    }

    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }

    fn begin(&self) -> WorkflowResult<OwnedMutexGuard<WorkflowController>> {
        Arc::clone(&self.inner)
            .try_lock_owned()
            .map_err(|_| WorkflowError::TransitionInFlight)
    }

    pub async fn initialize(&self) -> WorkflowResult<Stage> {
        let mut controller = self.begin()?;
        controller.initialize().await
    }

    pub async fn restart(&self) -> WorkflowResult<Stage> {
        let mut controller = self.begin()?;
        controller.restart().await
    }

    pub async fn confirm_data_plugin(&self) -> WorkflowResult<Stage> {
        let mut controller = self.begin()?;
        controller.confirm_data_plugin().await
    }

    pub async fn confirm_access_token(&self) -> WorkflowResult<Stage> {
        let mut controller = self.begin()?;
        controller.confirm_access_token().await
    }

    pub async fn confirm_display_plugin(&self) -> WorkflowResult<Stage> {
        let mut controller = self.begin()?;
        controller.confirm_display_plugin().await
    }

    pub fn select_data_plugin(&self, index: usize) -> WorkflowResult<()> {
        self.begin()?.select_data_plugin(index);
        Ok(())
    }

    pub fn set_token_option(&self, option: TokenOption) -> WorkflowResult<()> {
        self.begin()?.set_token_option(option);
        Ok(())
    }

    pub fn set_custom_token(&self, token: impl Into<String>) -> WorkflowResult<()> {
        self.begin()?.set_custom_token(token);
        Ok(())
    }

    pub fn select_display_plugin(&self, index: usize) -> WorkflowResult<()> {
        self.begin()?.select_display_plugin(index);
        Ok(())
    }
}
