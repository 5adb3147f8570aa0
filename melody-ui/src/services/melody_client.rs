//! Melody backend client
//!
//! The backend exposes four GET endpoints:
//! - `/newMelody` → `{ plugins: [{name}], stage, trackData }` (round init / restart)
//! - `/dataPlugin?i=<index>` → `{ stage }`
//! - `/getAccessToken?method=<default|custom|browser>&token=<string>` → `{ stage }`
//! - `/showDisplay` → `{ stage, trackData }`
//!
//! [`MelodyBackend`] is the seam the workflow controller talks to;
//! [`HttpMelodyBackend`] is the reqwest implementation.

use async_trait::async_trait;
use melody_common::{Stage, Track};
use serde::Deserialize;
use std::time::Duration;

use crate::error::BackendError;
use crate::models::TokenOption;

const USER_AGENT: &str = concat!("melody-ui/", env!("CARGO_PKG_VERSION"));

/// Round-init response
#[derive(Debug, Clone, PartialEq)]
pub struct RoundInit {
    pub data_plugins: Vec<String>,
    pub stage: Stage,
    pub track_data: Vec<Track>,
}

/// Response carrying only the next stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageReply {
    pub stage: Stage,
}

/// Display-stage response
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayReply {
    pub stage: Stage,
    pub track_data: Vec<Track>,
}

/// Credential choice sent to `/getAccessToken`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub option: TokenOption,
    /// Empty unless `option` is `Custom`
    pub token: String,
}

/// Backend operations consumed by the workflow controller
#[async_trait]
pub trait MelodyBackend: Send + Sync {
    /// Start (or restart) a round
    async fn new_melody(&self) -> Result<RoundInit, BackendError>;

    /// Confirm the data source by index into the round's data plugin list
    async fn select_data_plugin(&self, index: usize) -> Result<StageReply, BackendError>;

    /// Confirm the credential choice
    async fn set_access_token(&self, request: &TokenRequest) -> Result<StageReply, BackendError>;

    /// Fetch the round's tracks
    async fn show_display(&self) -> Result<DisplayReply, BackendError>;
}

#[derive(Debug, Deserialize)]
struct PluginEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RoundInitBody {
    plugins: Vec<PluginEntry>,
    stage: String,
    #[serde(rename = "trackData", default)]
    track_data: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct StageBody {
    stage: String,
}

#[derive(Debug, Deserialize)]
struct DisplayBody {
    stage: String,
    #[serde(rename = "trackData")]
    track_data: Vec<Track>,
}

fn parse_body<'a, T: Deserialize<'a>>(endpoint: &str, body: &'a str) -> Result<T, BackendError> {
    serde_json::from_str(body)
        .map_err(|e| BackendError::MalformedResponse(format!("{}: {}", endpoint, e)))
}

fn decode_stage(endpoint: &str, name: &str) -> Result<Stage, BackendError> {
    Stage::from_wire(name).map_err(|e| BackendError::MalformedResponse(format!("{}: {}", endpoint, e)))
}

/// Decode a `/newMelody` body
pub fn decode_round_init(body: &str) -> Result<RoundInit, BackendError> {
    let body: RoundInitBody = parse_body("/newMelody", body)?;
    Ok(RoundInit {
        data_plugins: body.plugins.into_iter().map(|p| p.name).collect(),
        stage: decode_stage("/newMelody", &body.stage)?,
        track_data: body.track_data,
    })
}

/// Decode a `/dataPlugin` or `/getAccessToken` body
pub fn decode_stage_reply(endpoint: &str, body: &str) -> Result<StageReply, BackendError> {
    let body: StageBody = parse_body(endpoint, body)?;
    Ok(StageReply {
        stage: decode_stage(endpoint, &body.stage)?,
    })
}

/// Decode a `/showDisplay` body
pub fn decode_display_reply(body: &str) -> Result<DisplayReply, BackendError> {
    let body: DisplayBody = parse_body("/showDisplay", body)?;
    Ok(DisplayReply {
        stage: decode_stage("/showDisplay", &body.stage)?,
        track_data: body.track_data,
    })
}

/// reqwest-backed [`MelodyBackend`]
pub struct HttpMelodyBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpMelodyBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::NetworkFailure(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET an absolute URL and return the body text of a 2xx response
    pub async fn fetch_text(&self, url: &str) -> Result<String, BackendError> {
        self.get_text(self.http_client.get(url), url).await
    }

    async fn get_endpoint(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<String, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, ?query, "Querying Melody backend");
        self.get_text(self.http_client.get(&url).query(query), &url)
            .await
    }

    async fn get_text(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<String, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::NetworkFailure(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::NetworkFailure(format!(
                "{} returned {}: {}",
                url,
                status.as_u16(),
                error_text.trim()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| BackendError::NetworkFailure(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl MelodyBackend for HttpMelodyBackend {
    async fn new_melody(&self) -> Result<RoundInit, BackendError> {
        let body = self.get_endpoint("/newMelody", &[]).await?;
        decode_round_init(&body)
    }

    async fn select_data_plugin(&self, index: usize) -> Result<StageReply, BackendError> {
        let body = self
            .get_endpoint("/dataPlugin", &[("i", index.to_string())])
            .await?;
        decode_stage_reply("/dataPlugin", &body)
    }

    async fn set_access_token(&self, request: &TokenRequest) -> Result<StageReply, BackendError> {
        let query = [
            ("method", request.option.method().to_string()),
            ("token", request.token.clone()),
        ];
        let body = self.get_endpoint("/getAccessToken", &query).await?;
        decode_stage_reply("/getAccessToken", &body)
    }

    async fn show_display(&self) -> Result<DisplayReply, BackendError> {
        let body = self.get_endpoint("/showDisplay", &[]).await?;
        decode_display_reply(&body)
    }
}
