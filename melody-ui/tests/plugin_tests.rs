//! Display plugin and registry tests
//!
//! Transformer properties are checked over a deterministic spread of
//! generated rounds rather than hand-picked cases only.

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use helpers::{create_test_controller, sample_tracks, FakeBackend};
use melody_common::{Track, TrackLabel};
use melody_ui::error::PluginError;
use melody_ui::plugins::frequency::frequency_by_date;
use melody_ui::plugins::genre::count_genres;
use melody_ui::plugins::sentiment::{round3, sentiment_points};
use melody_ui::plugins::{
    builtin_registry, DisplayPlugin, GenrePlugin, PluginLoader, PluginManifest, PluginRegistry,
    StaticLoader,
};

const GENRES: [&str; 5] = ["pop", "rock", "jazz", "ambient", "folk"];

/// Small linear congruential generator so rounds are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

fn generate_round(seed: u64, len: usize) -> Vec<Track> {
    let mut rng = Lcg(seed);
    (0..len)
        .map(|i| {
            let day = 1 + rng.below(28);
            let hour = rng.below(24);
            let genre_count = rng.below(4) as usize;
            let genre = (0..genre_count)
                .map(|_| GENRES[rng.below(GENRES.len() as u64) as usize].to_string())
                .collect();
            let arousal = (rng.below(16_000) as f64 - 8_000.0) / 997.0;
            let valence = (rng.below(2_000) as f64 - 1_000.0) / 1_003.0;
            Track::new(
                format!("Track {}", i),
                format!("Artist {}", i % 3),
                format!("2024-03-{:02}T{:02}:15:00Z", day, hour),
                genre,
                vec![arousal, valence],
            )
        })
        .collect()
}

// ============================================================================
// Example round
// ============================================================================

#[test]
fn test_sample_round_through_all_transformers() {
    let tracks = sample_tracks();

    let buckets = frequency_by_date(&tracks).unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].date, "1/1/2024");
    assert_eq!(buckets[0].frequency, 2);
    assert_eq!(
        buckets[0].items,
        vec![
            TrackLabel {
                title: "A".to_string(),
                artist: "X".to_string()
            },
            TrackLabel {
                title: "B".to_string(),
                artist: "Y".to_string()
            },
        ]
    );

    let genres = count_genres(&tracks);
    let summary: Vec<(&str, usize, Vec<&str>)> = genres
        .iter()
        .map(|g| {
            (
                g.genre.as_str(),
                g.value,
                g.titles.iter().map(String::as_str).collect(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![("pop", 2, vec!["A", "B"]), ("rock", 1, vec!["B"])]
    );

    let points = sentiment_points(&tracks).unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!((points[0].x, points[0].y), (-0.876, 1.234));
    assert_eq!(points[0].title, "A");
    assert_eq!((points[1].x, points[1].y), (0.0, 0.0));
}

// ============================================================================
// Transformer properties
// ============================================================================

#[test]
fn test_frequency_dates_ascend_and_counts_add_up() {
    for seed in 0..50 {
        let tracks = generate_round(seed, 1 + seed as usize % 40);
        let buckets = frequency_by_date(&tracks).unwrap();

        assert!(
            buckets.windows(2).all(|w| w[0].day < w[1].day),
            "seed {} produced unordered dates",
            seed
        );
        let total: usize = buckets.iter().map(|b| b.frequency).sum();
        assert_eq!(total, tracks.len(), "seed {}", seed);
        assert!(buckets.iter().all(|b| b.frequency == b.items.len()));
    }
}

#[test]
fn test_genre_counts_match_tag_total() {
    for seed in 0..50 {
        let tracks = generate_round(seed, seed as usize % 30);
        let counts = count_genres(&tracks);

        let counted: usize = counts.iter().map(|c| c.value).sum();
        let tagged: usize = tracks.iter().map(|t| t.genre.len()).sum();
        assert_eq!(counted, tagged, "seed {}", seed);

        for untagged in tracks.iter().filter(|t| t.genre.is_empty()) {
            assert!(counts.iter().all(|c| !c.titles.contains(&untagged.title)));
        }
    }
}

#[test]
fn test_sentiment_points_follow_scores() {
    for seed in 0..50 {
        let tracks = generate_round(seed, seed as usize % 25);
        let points = sentiment_points(&tracks).unwrap();

        assert_eq!(points.len(), tracks.len());
        for (point, track) in points.iter().zip(&tracks) {
            assert_eq!(point.x, round3(track.score[1]));
            assert_eq!(point.y, round3(track.score[0]));
            assert!((point.x - track.score[1]).abs() <= 0.0005 + 1e-12);
            assert!((point.y - track.score[0]).abs() <= 0.0005 + 1e-12);
            assert_eq!(point.title, track.title);
        }
    }
}

#[test]
fn test_sentiment_points_round_stored_scores() {
    let tracks = vec![
        Track::new("A", "X", "2024-01-01T10:00:00Z", vec![], vec![1.2345, 0.1235]),
        Track::new("B", "Y", "2024-01-01T11:00:00Z", vec![], vec![1.0005, -0.0004]),
    ];

    let points = sentiment_points(&tracks).unwrap();

    assert_eq!((points[0].x, points[0].y), (0.123, 1.234));
    assert_eq!((points[1].x, points[1].y), (0.0, 1.0));
    assert!(points[1].x.is_sign_positive());
}

#[test]
fn test_empty_round_renders_empty_charts() {
    let tracks: Vec<Track> = Vec::new();
    assert!(frequency_by_date(&tracks).unwrap().is_empty());
    assert!(count_genres(&tracks).is_empty());
    assert!(sentiment_points(&tracks).unwrap().is_empty());
}

// ============================================================================
// Registry
// ============================================================================

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let mut registry =
        builtin_registry(PluginManifest::from_names(["Frequency", "Genre", "Sentiment"]));
    let tracks = generate_round(7, 12);

    for name in ["Frequency", "Genre", "Sentiment"] {
        let first = registry.resolve(name).await.unwrap().render(&tracks).unwrap();
        registry.begin_round(Vec::new());
        let second = registry.resolve(name).await.unwrap().render(&tracks).unwrap();
        assert_eq!(first, second, "{} rendered differently", name);
        assert_eq!(first.plugin, name);
    }
}

#[tokio::test]
async fn test_resolve_unknown_leaves_workflow_state_unchanged() {
    let backend = FakeBackend::new();
    let (mut controller, _bus) = create_test_controller(&backend, &["Frequency", "Genre"]);
    controller.initialize().await.unwrap();
    let before = controller.state().clone();

    let mut registry = builtin_registry(PluginManifest::from_names(["Frequency", "Genre"]));
    let err = registry.resolve("Unknown").await.unwrap_err();

    assert_eq!(err, PluginError::NotFound("Unknown".to_string()));
    assert_eq!(controller.state(), &before);
}

#[tokio::test]
async fn test_resolution_is_case_sensitive() {
    let mut registry = builtin_registry(PluginManifest::from_names(["genre"]));
    assert_eq!(
        registry.resolve("genre").await.unwrap_err(),
        PluginError::NotFound("genre".to_string())
    );
}

struct CountingLoader {
    loads: AtomicUsize,
}

#[async_trait]
impl PluginLoader for CountingLoader {
    async fn load(&self) -> Result<Arc<dyn DisplayPlugin>, PluginError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(GenrePlugin))
    }
}

#[tokio::test]
async fn test_loader_runs_once_per_round() {
    let loader = Arc::new(CountingLoader {
        loads: AtomicUsize::new(0),
    });
    let mut registry = PluginRegistry::new(PluginManifest::from_names(["Genre"]));
    registry.register("Genre", loader.clone());

    registry.resolve("Genre").await.unwrap();
    registry.resolve("Genre").await.unwrap();
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);

    registry.begin_round(vec!["Spotify".to_string()]);
    registry.resolve("Genre").await.unwrap();
    assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
}

struct BrokenLoader;

#[async_trait]
impl PluginLoader for BrokenLoader {
    async fn load(&self) -> Result<Arc<dyn DisplayPlugin>, PluginError> {
        Err(PluginError::LoadFailed {
            name: "Heatmap".to_string(),
            reason: "missing colour scale".to_string(),
        })
    }
}

#[tokio::test]
async fn test_load_failure_is_not_cached() {
    let mut registry = PluginRegistry::new(PluginManifest::from_names(["Heatmap"]));
    registry.register("Heatmap", Arc::new(BrokenLoader));

    let err = registry.resolve("Heatmap").await.unwrap_err();
    assert!(matches!(err, PluginError::LoadFailed { .. }));
    assert!(!registry.is_resolved("Heatmap"));

    // Re-registering replaces the loader
    let previous = registry.register(
        "Heatmap",
        Arc::new(StaticLoader::new(|| Arc::new(GenrePlugin) as Arc<dyn DisplayPlugin>)),
    );
    assert!(previous.is_some());
    assert!(registry.resolve("Heatmap").await.is_ok());
}
