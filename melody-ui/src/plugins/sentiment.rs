//! Sentiment display plugin
//!
//! Scatter plot of valence (x) against arousal (y).

use melody_common::Track;
use serde::Serialize;
use serde_json::json;

use super::{render_failed, DisplayPlugin, Renderable};
use crate::error::{PluginError, TransformError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentPoint {
    /// Valence, `score[1]`
    pub x: f64,
    /// Arousal, `score[0]`
    pub y: f64,
    pub title: String,
}

/// Round the stored value to 3 decimal places
///
/// Decides on the exact binary value, so `1.2345` (stored just below the
/// midpoint) becomes `1.234`. Exact midpoints round away from zero and a
/// negative zero result is reported as `0`.
pub fn round3(value: f64) -> f64 {
    // Midpoints at 3 places are exactly the odd multiples of 1/16
    let sixteenths = value * 16.0;
    let rounded = if sixteenths.fract() == 0.0 && sixteenths % 2.0 != 0.0 {
        (value * 1000.0).round() / 1000.0
    } else {
        format!("{:.3}", value).parse().unwrap_or(value)
    };

    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Map each track to a point; every track must carry two score values
pub fn sentiment_points(tracks: &[Track]) -> Result<Vec<SentimentPoint>, TransformError> {
    tracks
        .iter()
        .map(|track| match (track.arousal(), track.valence()) {
            (Some(arousal), Some(valence)) => Ok(SentimentPoint {
                x: round3(valence),
                y: round3(arousal),
                title: track.title.clone(),
            }),
            _ => Err(TransformError::ScoreArity {
                title: track.title.clone(),
                len: track.score.len(),
            }),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentPlugin;

impl SentimentPlugin {
    pub const NAME: &'static str = "Sentiment";
}

impl DisplayPlugin for SentimentPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn render(&self, tracks: &[Track]) -> Result<Renderable, PluginError> {
        let points = sentiment_points(tracks).map_err(|e| render_failed(Self::NAME, e))?;

        let chart = json!({
            "chart": { "type": "scatter", "height": 600, "width": 600 },
            "title": { "text": "Sentiment Analysis" },
            "xAxis": { "title": { "text": "Valence" }, "min": -1, "max": 1, "gridLineWidth": 1 },
            "yAxis": { "title": { "text": "Arousal" }, "min": -8, "max": 8, "gridLineWidth": 1 },
            "series": [{ "name": "Data Points", "type": "scatter", "data": points }],
        });

        let summary = points
            .iter()
            .map(|p| format!("{}: valence {}, arousal {}", p.title, p.x, p.y))
            .collect();

        Ok(Renderable {
            plugin: Self::NAME.to_string(),
            chart,
            summary,
        })
    }
}
