//! Services for melody-ui

pub mod melody_client;

pub use melody_client::{
    DisplayReply, HttpMelodyBackend, MelodyBackend, RoundInit, StageReply, TokenRequest,
};
