//! Genre display plugin
//!
//! Pie chart of genre tag counts with the titles behind each slice.

use melody_common::Track;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

use super::{DisplayPlugin, Renderable};
use crate::error::PluginError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub value: usize,
    pub titles: Vec<String>,
}

/// Count every (track, genre) pair, keeping genres in first-seen order
///
/// A track tagged with several genres counts once per genre; a track with no
/// genre tags contributes nothing.
pub fn count_genres(tracks: &[Track]) -> Vec<GenreCount> {
    let mut counts: Vec<GenreCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for track in tracks {
        for genre in &track.genre {
            match index.get(genre.as_str()) {
                Some(&i) => {
                    counts[i].value += 1;
                    counts[i].titles.push(track.title.clone());
                }
                None => {
                    index.insert(genre.as_str(), counts.len());
                    counts.push(GenreCount {
                        genre: genre.clone(),
                        value: 1,
                        titles: vec![track.title.clone()],
                    });
                }
            }
        }
    }

    counts
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenrePlugin;

impl GenrePlugin {
    pub const NAME: &'static str = "Genre";
}

impl DisplayPlugin for GenrePlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn render(&self, tracks: &[Track]) -> Result<Renderable, PluginError> {
        let counts = count_genres(tracks);
        let total: usize = counts.iter().map(|c| c.value).sum();

        let data: Vec<serde_json::Value> = counts
            .iter()
            .map(|c| json!({ "name": c.genre, "y": c.value, "titles": c.titles }))
            .collect();

        let chart = json!({
            "chart": { "type": "pie" },
            "title": { "text": "Genre Counts" },
            "series": [{ "name": "Percentage", "type": "pie", "data": data }],
        });

        let summary = counts
            .iter()
            .map(|c| {
                let percentage = c.value as f64 / total as f64 * 100.0;
                format!(
                    "{}: {} ({:.1}%) {}",
                    c.genre,
                    c.value,
                    percentage,
                    c.titles.join(", ")
                )
            })
            .collect();

        Ok(Renderable {
            plugin: Self::NAME.to_string(),
            chart,
            summary,
        })
    }
}
