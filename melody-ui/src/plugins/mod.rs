//! Display plugins
//!
//! A display plugin turns the round's tracks into a [`Renderable`]: a
//! chart-library-neutral chart specification plus a plain-text summary.
//! Each plugin owns a pure data transformer that reshapes the generic
//! track list into the aggregate its chart needs.
//!
//! Plugins are registered explicitly in a [`PluginRegistry`] under the bare
//! identifier listed in the display manifest and loaded on demand through a
//! [`PluginLoader`].

pub mod frequency;
pub mod genre;
pub mod manifest;
pub mod registry;
pub mod sentiment;

pub use frequency::FrequencyPlugin;
pub use genre::GenrePlugin;
pub use manifest::{ManifestSource, PluginManifest};
pub use registry::PluginRegistry;
pub use sentiment::SentimentPlugin;

use async_trait::async_trait;
use melody_common::Track;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::error::{PluginError, TransformError};

/// Data-bound visualization produced by a display plugin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Renderable {
    /// Identifier of the plugin that rendered it
    pub plugin: String,
    /// Chart specification (chart type, title, axes, series)
    pub chart: serde_json::Value,
    /// One line per category/point for text front ends
    pub summary: Vec<String>,
}

impl Renderable {
    pub fn chart_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.chart).unwrap_or_else(|_| self.chart.to_string())
    }
}

/// A visualization unit
pub trait DisplayPlugin: Send + Sync {
    /// Identifier the plugin is registered under
    fn name(&self) -> &str;

    /// Transform and render the given tracks
    fn render(&self, tracks: &[Track]) -> Result<Renderable, PluginError>;
}

impl fmt::Debug for dyn DisplayPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayPlugin")
            .field("name", &self.name())
            .finish()
    }
}

/// Loads a display plugin on demand
#[async_trait]
pub trait PluginLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn DisplayPlugin>, PluginError>;
}

/// Loader for plugins compiled into the binary
pub struct StaticLoader<F> {
    factory: F,
}

impl<F> StaticLoader<F>
where
    F: Fn() -> Arc<dyn DisplayPlugin> + Send + Sync,
{
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl<F> PluginLoader for StaticLoader<F>
where
    F: Fn() -> Arc<dyn DisplayPlugin> + Send + Sync,
{
    async fn load(&self) -> Result<Arc<dyn DisplayPlugin>, PluginError> {
        Ok((self.factory)())
    }
}

/// Registry with the built-in Frequency, Genre and Sentiment plugins
pub fn builtin_registry(manifest: PluginManifest) -> PluginRegistry {
    let mut registry = PluginRegistry::new(manifest);
    registry.register(
        FrequencyPlugin::NAME,
        Arc::new(StaticLoader::new(|| {
            Arc::new(FrequencyPlugin) as Arc<dyn DisplayPlugin>
        })),
    );
    registry.register(
        GenrePlugin::NAME,
        Arc::new(StaticLoader::new(|| Arc::new(GenrePlugin) as Arc<dyn DisplayPlugin>)),
    );
    registry.register(
        SentimentPlugin::NAME,
        Arc::new(StaticLoader::new(|| {
            Arc::new(SentimentPlugin) as Arc<dyn DisplayPlugin>
        })),
    );
    registry
}

pub(crate) fn render_failed(name: &str, err: TransformError) -> PluginError {
    PluginError::RenderFailed {
        name: name.to_string(),
        reason: err.to_string(),
    }
}
