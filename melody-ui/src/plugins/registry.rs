//! Display plugin registry
//!
//! Maps a manifest identifier to a [`PluginLoader`]. Identifiers must match
//! exactly (case included): a manifest entry without a registered loader,
//! or a name missing from the manifest, resolves to `PluginError::NotFound`.
//!
//! Resolved plugins are cached per round. [`PluginRegistry::begin_round`]
//! drops the cache so a restarted round never reuses a previous binding.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{DisplayPlugin, PluginLoader, PluginManifest};
use crate::error::PluginError;

pub struct PluginRegistry {
    manifest: PluginManifest,
    loaders: HashMap<String, Arc<dyn PluginLoader>>,
    data_plugin_names: Vec<String>,
    resolved: HashMap<String, Arc<dyn DisplayPlugin>>,
}

impl PluginRegistry {
    pub fn new(manifest: PluginManifest) -> Self {
        Self {
            manifest,
            loaders: HashMap::new(),
            data_plugin_names: Vec::new(),
            resolved: HashMap::new(),
        }
    }

    /// Register a loader under a bare identifier
    ///
    /// Returns the loader previously registered under the same identifier.
    pub fn register(
        &mut self,
        identifier: impl Into<String>,
        loader: Arc<dyn PluginLoader>,
    ) -> Option<Arc<dyn PluginLoader>> {
        let identifier = identifier.into();
        debug!(plugin = %identifier, module = %module_ref(&identifier), "Registered display plugin");
        self.loaders.insert(identifier, loader)
    }

    /// Display plugin names from the manifest, in manifest order
    pub fn list_display_plugin_names(&self) -> &[String] {
        self.manifest.names()
    }

    /// Data plugin names reported by the backend for the current round
    pub fn list_data_plugin_names(&self) -> &[String] {
        &self.data_plugin_names
    }

    /// Manifest entries with no registered loader
    pub fn unregistered_manifest_entries(&self) -> Vec<&str> {
        self.manifest
            .names()
            .iter()
            .filter(|name| !self.loaders.contains_key(name.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Start a new round: record its data plugins and drop resolved plugins
    pub fn begin_round(&mut self, data_plugin_names: Vec<String>) {
        self.data_plugin_names = data_plugin_names;
        self.resolved.clear();
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.resolved.contains_key(name)
    }

    /// Load the plugin registered under `name`
    pub async fn resolve(&mut self, name: &str) -> Result<Arc<dyn DisplayPlugin>, PluginError> {
        if let Some(plugin) = self.resolved.get(name) {
            debug!(plugin = %name, "Display plugin already resolved this round");
            return Ok(Arc::clone(plugin));
        }

        if !self.manifest.contains(name) {
            warn!(plugin = %name, "Display plugin not listed in manifest");
            return Err(PluginError::NotFound(name.to_string()));
        }

        let loader = self
            .loaders
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;

        let plugin = loader.load().await.map_err(|e| match e {
            PluginError::LoadFailed { .. } | PluginError::NotFound(_) => e,
            other => PluginError::LoadFailed {
                name: name.to_string(),
                reason: other.to_string(),
            },
        })?;

        info!(plugin = %name, module = %module_ref(name), "Resolved display plugin");
        self.resolved.insert(name.to_string(), Arc::clone(&plugin));
        Ok(plugin)
    }
}

/// Module reference derived from a manifest identifier (`Genre` → `GenrePlugin`)
pub fn module_ref(identifier: &str) -> String {
    format!("{}Plugin", identifier)
}
