//! Track records delivered by the backend

use serde::{Deserialize, Serialize};

/// One observed media item
///
/// Tracks are immutable once received. `score` carries the sentiment
/// analysis result: index 0 is arousal, index 1 is valence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    /// ISO-8601 timestamp of when the track was played or added
    pub timestamp: String,
    /// Genre tags, in backend order (may repeat, may be empty)
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub score: Vec<f64>,
}

/// Title/artist pair used by aggregates that list their member tracks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackLabel {
    pub title: String,
    pub artist: String,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        timestamp: impl Into<String>,
        genre: Vec<String>,
        score: Vec<f64>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            timestamp: timestamp.into(),
            genre,
            score,
        }
    }

    pub fn label(&self) -> TrackLabel {
        TrackLabel {
            title: self.title.clone(),
            artist: self.artist.clone(),
        }
    }

    /// Arousal component of the sentiment score, if present
    pub fn arousal(&self) -> Option<f64> {
        self.score.first().copied()
    }

    /// Valence component of the sentiment score, if present
    pub fn valence(&self) -> Option<f64> {
        self.score.get(1).copied()
    }
}
