//! Concurrency behaviour of the matcher: bounded fan-out, order
//! preservation and shared use from many tasks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::join_all;
use vidsim::{
    EmbedError, EmbeddingService, FrameVector, IndexConfig, InMemoryVectorIndex,
    InMemoryVideoSource, MatchConfig, Matcher,
};

/// Decodes little-endian `f32` frames after a short delay and tracks how
/// many calls are in flight at once.
#[derive(Default)]
struct GaugedEmbedder {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingService for GaugedEmbedder {
    async fn embed(&self, image: Bytes) -> Result<FrameVector, EmbedError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        // Later frames finish first, so completion order differs from frame order.
        let first = image.first().copied().unwrap_or(0) as u64;
        tokio::time::sleep(Duration::from_millis(20u64.saturating_sub(first))).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let values = image
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(FrameVector::new(values))
    }
}

/// Frame `i` of a 4-dim video: a vector whose first byte grows with `i`.
fn frame(i: usize) -> Vec<u8> {
    let v = [1.0 + i as f32 * 1e-7, (i % 4) as f32, ((i + 1) % 3) as f32, 0.5];
    let mut bytes: Vec<u8> = v.iter().flat_map(|x| x.to_le_bytes()).collect();
    // Keep the first byte distinct per frame for the delay schedule above.
    bytes[0] = i as u8;
    bytes
}

fn matcher_with(
    max_concurrency: usize,
) -> (Arc<Matcher>, Arc<GaugedEmbedder>, Arc<InMemoryVideoSource>) {
    let videos = Arc::new(InMemoryVideoSource::new());
    let embedder = Arc::new(GaugedEmbedder::default());
    let matcher = Matcher::new(
        videos.clone(),
        embedder.clone(),
        Arc::new(InMemoryVectorIndex::new(IndexConfig::default())),
        MatchConfig::default().with_max_concurrency(max_concurrency),
    )
    .unwrap();
    (Arc::new(matcher), embedder, videos)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn embedding_fan_out_is_bounded() {
    let (matcher, embedder, videos) = matcher_with(3);
    videos.insert("long", 1.0, (0..12).map(frame));

    let fingerprint = matcher.compute_fingerprint("long").await.unwrap();

    assert_eq!(fingerprint.len(), 12);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 12);
    let peak = embedder.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in-flight {peak} exceeds bound");
    assert!(peak >= 2, "calls were not overlapped (peak {peak})");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn frames_keep_order_under_concurrency() {
    let (matcher, _, videos) = matcher_with(8);
    videos.insert("clip", 1.0, (0..10).map(frame));

    let fingerprint = matcher.compute_fingerprint("clip").await.unwrap();
    let ids: Vec<&str> = fingerprint
        .frames()
        .iter()
        .map(|f| f.frame_id.as_str())
        .collect();
    let expected: Vec<String> = (0..10).map(|i| format!("frame_{i}")).collect();
    assert_eq!(ids, expected);

    for (i, f) in fingerprint.frames().iter().enumerate() {
        assert_eq!(f.vector.as_slice()[1], (i % 4) as f32);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_matcher_serves_parallel_queries() {
    let (matcher, _, videos) = matcher_with(4);
    for v in 0..6 {
        videos.insert(format!("video-{v}"), 1.0, (v..v + 4).map(frame));
    }
    for v in 0..6 {
        matcher.index_fingerprint(&format!("video-{v}")).await.unwrap();
    }

    let sequential = matcher.find_similar("video-2", 3).await.unwrap();

    let tasks = (0..16).map(|_| {
        let matcher = Arc::clone(&matcher);
        tokio::spawn(async move { matcher.find_similar("video-2", 3).await })
    });
    for result in join_all(tasks).await {
        let ranked = result.expect("task panicked").unwrap();
        assert_eq!(ranked, sequential);
    }
    assert_eq!(sequential.video_ids()[0], "video-2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_indexing_stores_every_frame() {
    let (matcher, _, videos) = matcher_with(2);
    for v in 0..8 {
        videos.insert(format!("clip-{v}"), 1.0, (0..3).map(|i| frame(v * 3 + i)));
    }

    let tasks = (0..8).map(|v| {
        let matcher = Arc::clone(&matcher);
        tokio::spawn(async move { matcher.index_fingerprint(&format!("clip-{v}")).await })
    });
    let reports: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked").unwrap())
        .collect();

    assert!(reports.iter().all(|r| r.frames_indexed == 3));
    assert_eq!(matcher.index().len().await.unwrap(), 24);
}
