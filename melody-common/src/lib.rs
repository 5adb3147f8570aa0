//! # Melody Common Library
//!
//! Shared code for the Melody client including:
//! - Track records and workflow stages
//! - Workflow event types and EventBus
//! - Configuration loading
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod events;
pub mod stage;
pub mod time;
pub mod track;

pub use error::{Error, Result};
pub use stage::{Stage, UnknownStage};
pub use track::{Track, TrackLabel};
