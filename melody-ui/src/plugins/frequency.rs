//! Frequency display plugin
//!
//! Column chart of how many tracks fall on each calendar date.

use chrono::NaiveDate;
use melody_common::time::{calendar_date, display_date};
use melody_common::{Track, TrackLabel};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

use super::{render_failed, DisplayPlugin, Renderable};
use crate::error::{PluginError, TransformError};

/// Tracks played on one calendar date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyBucket {
    /// `M/D/YYYY`
    pub date: String,
    #[serde(skip)]
    pub day: NaiveDate,
    pub frequency: usize,
    /// Member tracks in arrival order
    pub items: Vec<TrackLabel>,
}

/// Group tracks by the UTC calendar date of their timestamp
///
/// Buckets come out in ascending date order. Time of day is discarded.
pub fn frequency_by_date(tracks: &[Track]) -> Result<Vec<FrequencyBucket>, TransformError> {
    let mut by_day: BTreeMap<NaiveDate, Vec<TrackLabel>> = BTreeMap::new();

    for track in tracks {
        let day = calendar_date(&track.timestamp).ok_or_else(|| TransformError::BadTimestamp {
            title: track.title.clone(),
            timestamp: track.timestamp.clone(),
        })?;
        by_day.entry(day).or_default().push(track.label());
    }

    Ok(by_day
        .into_iter()
        .map(|(day, items)| FrequencyBucket {
            date: display_date(day),
            day,
            frequency: items.len(),
            items,
        })
        .collect())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyPlugin;

impl FrequencyPlugin {
    pub const NAME: &'static str = "Frequency";
}

impl DisplayPlugin for FrequencyPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn render(&self, tracks: &[Track]) -> Result<Renderable, PluginError> {
        let buckets = frequency_by_date(tracks).map_err(|e| render_failed(Self::NAME, e))?;

        let categories: Vec<&str> = buckets.iter().map(|b| b.date.as_str()).collect();
        let series_data: Vec<serde_json::Value> = buckets
            .iter()
            .map(|b| json!({ "y": b.frequency, "items": b.items }))
            .collect();

        let chart = json!({
            "chart": { "type": "column" },
            "title": { "text": "Frequency of Melody by Date" },
            "xAxis": { "categories": categories, "title": { "text": "Date" } },
            "yAxis": { "min": 0, "title": { "text": "Frequency", "align": "high" } },
            "series": [{ "name": "Frequency", "type": "column", "data": series_data }],
        });

        let summary = buckets
            .iter()
            .map(|b| {
                let items: Vec<String> = b
                    .items
                    .iter()
                    .map(|i| format!("{} - {}", i.title, i.artist))
                    .collect();
                format!("{}: {} ({})", b.date, b.frequency, items.join(", "))
            })
            .collect();

        Ok(Renderable {
            plugin: Self::NAME.to_string(),
            chart,
            summary,
        })
    }
}
