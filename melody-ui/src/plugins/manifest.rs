//! Display plugin manifest
//!
//! A newline-delimited list of display plugin identifiers. Surrounding
//! whitespace is trimmed and blank lines are ignored. The manifest is loaded
//! once per process and is read-only afterwards.

use melody_common::{Error, Result};
use std::path::PathBuf;

use crate::services::HttpMelodyBackend;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginManifest {
    names: Vec<String>,
}

impl PluginManifest {
    pub fn parse(text: &str) -> Self {
        Self {
            names: text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Exact, case-sensitive membership
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Where the manifest lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    File(PathBuf),
    Url(String),
}

impl ManifestSource {
    /// `http://` and `https://` locations are URLs, anything else is a path
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            ManifestSource::Url(location.to_string())
        } else {
            ManifestSource::File(PathBuf::from(location))
        }
    }

    pub async fn load(&self, http: &HttpMelodyBackend) -> Result<PluginManifest> {
        let text = match self {
            ManifestSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                Error::Config(format!(
                    "Read display manifest {} failed: {}",
                    path.display(),
                    e
                ))
            })?,
            ManifestSource::Url(url) => http
                .fetch_text(url)
                .await
                .map_err(|e| Error::Config(format!("Fetch display manifest failed: {}", e)))?,
        };

        let manifest = PluginManifest::parse(&text);
        tracing::info!(
            source = ?self,
            plugins = ?manifest.names(),
            "Loaded display plugin manifest"
        );
        Ok(manifest)
    }
}
