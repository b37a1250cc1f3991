//! Scoring properties that must hold for any input, checked over seeded
//! pseudo-random vector sets.

use vidsim::{
    aggregate_candidates, directed_similarity, similarity_matrix, Metric, SimilarityError,
    VideoFingerprint,
};

/// xorshift64*; deterministic across platforms.
struct Rng(u64);

impl Rng {
    fn next_f32(&mut self) -> f32 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        let bits = self.0.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 40;
        (bits as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
    }

    fn vectors(&mut self, count: usize, dim: usize) -> Vec<Vec<f32>> {
        (0..count)
            .map(|_| (0..dim).map(|_| self.next_f32()).collect())
            .collect()
    }
}

#[test]
fn cosine_scores_stay_in_range() {
    let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
    for round in 0..50 {
        let a = rng.vectors(1 + round % 7, 16);
        let b = rng.vectors(1 + round % 5, 16);
        let score = directed_similarity(&a, &b, Metric::Cosine).unwrap();
        assert!((-1.0..=1.0).contains(&score), "round {round}: {score}");

        let e = directed_similarity(&a, &b, Metric::Euclidean).unwrap();
        assert!(e > 0.0 && e <= 1.0, "round {round}: {e}");
    }
}

#[test]
fn self_similarity_is_one() {
    let mut rng = Rng(42);
    for n in 1..10 {
        let a = rng.vectors(n, 32);
        let score = directed_similarity(&a, &a, Metric::Cosine).unwrap();
        assert!((score - 1.0).abs() < 1e-5, "n={n}: {score}");
        let score = directed_similarity(&a, &a, Metric::Euclidean).unwrap();
        assert!((score - 1.0).abs() < 1e-5, "n={n}: {score}");
    }
}

#[test]
fn scoring_is_directed() {
    // A's single frame is found in B; B's second frame has no match in A.
    let a = vec![vec![1.0, 0.0]];
    let b = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
    let ab = directed_similarity(&a, &b, Metric::Cosine).unwrap();
    let ba = directed_similarity(&b, &a, Metric::Cosine).unwrap();
    assert!((ab - 1.0).abs() < 1e-6);
    assert!((ba - 0.5).abs() < 1e-6);
}

#[test]
fn repeated_runs_agree_bit_for_bit() {
    let mut rng = Rng(7);
    let a = rng.vectors(40, 64);
    let b = rng.vectors(25, 64);
    let first = similarity_matrix(&a, &b, Metric::Cosine).unwrap();
    for _ in 0..5 {
        let again = similarity_matrix(&a, &b, Metric::Cosine).unwrap();
        assert_eq!(first, again);
    }
    let s1 = directed_similarity(&a, &b, Metric::Cosine).unwrap();
    let s2 = directed_similarity(&a, &b, Metric::Cosine).unwrap();
    assert_eq!(s1.to_bits(), s2.to_bits());
}

#[test]
fn zero_vectors_do_not_poison_scores() {
    let a = vec![vec![0.0, 0.0], vec![1.0, 0.0]];
    let b = vec![vec![1.0, 0.0]];
    let score = directed_similarity(&a, &b, Metric::Cosine).unwrap();
    assert!(score.is_finite());
    assert!((score - 0.5).abs() < 1e-6);
}

#[test]
fn metric_names() {
    for name in ["cosine", "euclidean"] {
        assert!(name.parse::<Metric>().is_ok());
    }
    for name in ["Cosine", "dot", "jaccard", ""] {
        assert!(matches!(
            name.parse::<Metric>(),
            Err(SimilarityError::UnsupportedMetric(_))
        ));
    }
}

#[test]
fn fingerprints_reject_bad_input() {
    assert_eq!(
        VideoFingerprint::from_vectors(Vec::<Vec<f32>>::new()).unwrap_err(),
        SimilarityError::EmptyFingerprint
    );
    assert!(matches!(
        VideoFingerprint::from_vectors(vec![vec![1.0, 0.0], vec![1.0]]),
        Err(SimilarityError::DimensionMismatch { expected: 2, got: 1 })
    ));
}

#[test]
fn vote_order_example() {
    let votes = aggregate_candidates(vec![vec!["V1", "V2"], vec!["V1"], vec!["V3"]], 10);
    let summary: Vec<(&str, usize)> = votes
        .iter()
        .map(|v| (v.video_id.as_str(), v.votes))
        .collect();
    assert_eq!(summary, [("V1", 2), ("V2", 1), ("V3", 1)]);
}
