//! End-to-end runs through the umbrella crate: directory-backed videos,
//! stub embeddings, in-memory index.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use vidsim::{
    build_matcher, build_matcher_with_source, DirectoryVideoSource, IndexStatus, MatchError,
    Metric, VidsimConfig,
};

/// Write one frame file per entry of `frames` under `root/name`.
fn write_video(root: &Path, name: &str, frames: &[&[u8]]) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for (i, frame) in frames.iter().enumerate() {
        fs::write(dir.join(format!("{i:04}.png")), frame).unwrap();
    }
}

fn config_for(root: &Path) -> VidsimConfig {
    let mut config = VidsimConfig::default();
    config.video.root = root.to_path_buf();
    config.video.fps = 1.0;
    config
}

fn corpus() -> TempDir {
    let dir = TempDir::new().unwrap();
    let frames: [&[u8]; 5] = [b"sunrise", b"beach", b"waves", b"gulls", b"sunset"];
    write_video(dir.path(), "original", &frames);
    write_video(dir.path(), "reupload", &frames);
    write_video(dir.path(), "trailer", &frames[..2]);
    write_video(dir.path(), "unrelated", &[b"office", b"desk", b"monitor"]);
    fs::create_dir_all(dir.path().join("empty")).unwrap();
    dir
}

#[tokio::test]
async fn identical_videos_compare_to_one() {
    let dir = corpus();
    let matcher = build_matcher(&config_for(dir.path())).unwrap();

    let score = matcher.compare_videos("original", "reupload").await.unwrap();
    assert!((score - 1.0).abs() < 1e-5, "score = {score}");

    let fingerprint = matcher.compute_fingerprint("original").await.unwrap();
    assert_eq!(fingerprint.len(), 5);
    assert_eq!(fingerprint.frames()[4].frame_id, "frame_4");
}

#[tokio::test]
async fn subset_is_fully_explained_but_not_the_reverse() {
    let dir = corpus();
    let matcher = build_matcher(&config_for(dir.path())).unwrap();

    let trailer_in_original = matcher.compare_videos("trailer", "original").await.unwrap();
    let original_in_trailer = matcher.compare_videos("original", "trailer").await.unwrap();

    assert!((trailer_in_original - 1.0).abs() < 1e-5);
    assert!(original_in_trailer < trailer_in_original);
    assert!((-1.0..=1.0).contains(&original_in_trailer));
}

#[tokio::test]
async fn empty_video_is_an_error() {
    let dir = corpus();
    let matcher = build_matcher(&config_for(dir.path())).unwrap();

    let err = matcher.compute_fingerprint("empty").await.unwrap_err();
    assert_eq!(err, MatchError::EmptyFingerprint("empty".into()));

    let err = matcher.compare_videos("original", "empty").await.unwrap_err();
    assert_eq!(err.code(), "EMPTY_FINGERPRINT");

    let err = matcher.find_similar("empty", 3).await.unwrap_err();
    assert_eq!(err.code(), "EMPTY_FINGERPRINT");
}

#[tokio::test]
async fn missing_video_is_not_found() {
    let dir = corpus();
    let matcher = build_matcher(&config_for(dir.path())).unwrap();
    let err = matcher.compute_fingerprint("nowhere").await.unwrap_err();
    assert_eq!(err, MatchError::VideoNotFound("nowhere".into()));
}

#[tokio::test]
async fn index_and_search_corpus() {
    let dir = corpus();
    let matcher = build_matcher(&config_for(dir.path())).unwrap();

    assert_eq!(matcher.create_index().await.unwrap(), IndexStatus::Created);
    for video in ["reupload", "trailer", "unrelated"] {
        let report = matcher.index_fingerprint(video).await.unwrap();
        assert_eq!(report.video_id, video);
        assert_eq!(report.dimension, vidsim::FRAME_VECTOR_DIM);
    }
    assert_eq!(matcher.index().len().await.unwrap(), 5 + 2 + 3);

    let ranked = matcher.find_similar("original", 3).await.unwrap();
    assert!(ranked.len() <= 3);
    assert!(ranked.dropped.is_empty());
    assert_eq!(ranked.video_ids()[0], "reupload");
    assert!((ranked.results[0].score - 1.0).abs() < 1e-5);

    let scores: Vec<f32> = ranked.iter().map(|r| r.score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");

    matcher.shutdown().await.unwrap();
    let err = matcher.find_similar("original", 3).await.unwrap_err();
    assert_eq!(err.code(), "TRANSIENT_SERVICE_FAILURE");
}

#[tokio::test]
async fn euclidean_metric_from_config() {
    let dir = corpus();
    let mut config = config_for(dir.path());
    config.matcher.metric = Metric::Euclidean;

    let videos = Arc::new(DirectoryVideoSource::new(dir.path(), 1.0));
    let matcher = build_matcher_with_source(&config, videos).unwrap();

    let same = matcher.compare_videos("original", "reupload").await.unwrap();
    let other = matcher.compare_videos("original", "unrelated").await.unwrap();
    assert!((same - 1.0).abs() < 1e-5);
    assert!(other > 0.0 && other < same);
}

#[tokio::test]
async fn absolute_refs_bypass_the_root() {
    let dir = corpus();
    let elsewhere = TempDir::new().unwrap();
    let matcher = build_matcher(&config_for(elsewhere.path())).unwrap();

    let absolute = dir.path().join("trailer");
    let fingerprint = matcher
        .compute_fingerprint(absolute.to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(fingerprint.len(), 2);
}
