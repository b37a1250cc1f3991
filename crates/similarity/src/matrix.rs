use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::normalize::l2_normalized;
use crate::SimilarityError;

/// Dense `|A| x |B|` matrix; entry `(i, j)` compares `A[i]` with `B[j]`.
pub type SimilarityMatrix = Array2<f32>;

/// Similarity metric applied to each vector pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Metric {
    /// Dot product of unit vectors, in `[-1, 1]`.
    #[default]
    Cosine,
    /// `1 / (1 + distance)` between unit vectors, in `(0, 1]`.
    Euclidean,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
        }
    }

    #[inline]
    fn pair(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::Cosine => dot(a, b).clamp(-1.0, 1.0),
            Metric::Euclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
        }
    }
}

impl FromStr for Metric {
    type Err = SimilarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" => Ok(Metric::Euclidean),
            other => Err(SimilarityError::UnsupportedMetric(other.to_string())),
        }
    }
}

impl TryFrom<String> for Metric {
    type Error = SimilarityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Metric> for String {
    fn from(metric: Metric) -> Self {
        metric.as_str().to_string()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

fn check_dimensions<V: AsRef<[f32]>>(vectors: &[V], expected: usize) -> Result<(), SimilarityError> {
    match vectors.iter().find(|v| v.as_ref().len() != expected) {
        Some(bad) => Err(SimilarityError::DimensionMismatch {
            expected,
            got: bad.as_ref().len(),
        }),
        None => Ok(()),
    }
}

/// Computes the pairwise similarity matrix between `a` and `b`.
///
/// Both sides are L2-normalized here; pass raw vectors. Either side may be
/// empty, which yields a matrix with zero rows or columns.
pub fn similarity_matrix<A, B>(
    a: &[A],
    b: &[B],
    metric: Metric,
) -> Result<SimilarityMatrix, SimilarityError>
where
    A: AsRef<[f32]> + Sync,
    B: AsRef<[f32]> + Sync,
{
    let dim = a
        .first()
        .map(|v| v.as_ref().len())
        .or_else(|| b.first().map(|v| v.as_ref().len()))
        .unwrap_or(0);
    check_dimensions(a, dim)?;
    check_dimensions(b, dim)?;

    let a_norm = l2_normalized(a);
    let b_norm = l2_normalized(b);
    let (rows, cols) = (a_norm.len(), b_norm.len());

    let data: Vec<f32> = a_norm
        .par_iter()
        .flat_map_iter(|ai| b_norm.iter().map(move |bj| metric.pair(ai, bj)))
        .collect();

    let got = data.len();
    Array2::from_shape_vec((rows, cols), data).map_err(|_| SimilarityError::DimensionMismatch {
        expected: rows * cols,
        got,
    })
}

/// [`similarity_matrix`] with the metric given by name (`"cosine"` or `"euclidean"`).
pub fn similarity_matrix_named<A, B>(
    a: &[A],
    b: &[B],
    metric: &str,
) -> Result<SimilarityMatrix, SimilarityError>
where
    A: AsRef<[f32]> + Sync,
    B: AsRef<[f32]> + Sync,
{
    let metric: Metric = metric.parse()?;
    similarity_matrix(a, b, metric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_parsing() {
        assert_eq!("cosine".parse::<Metric>().unwrap(), Metric::Cosine);
        assert_eq!("euclidean".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert_eq!(Metric::default(), Metric::Cosine);
    }

    #[test]
    fn unknown_metric_is_rejected() {
        for name in ["manhattan", "Cosine", "", "dot"] {
            let err = name.parse::<Metric>().unwrap_err();
            assert_eq!(err, SimilarityError::UnsupportedMetric(name.to_string()));
        }

        let a = vec![vec![1.0f32, 0.0]];
        let err = similarity_matrix_named(&a, &a, "hamming").unwrap_err();
        assert!(matches!(err, SimilarityError::UnsupportedMetric(_)));
    }

    #[test]
    fn metric_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Metric::Euclidean).unwrap();
        assert_eq!(json, "\"euclidean\"");
        let parsed: Metric = serde_json::from_str("\"cosine\"").unwrap();
        assert_eq!(parsed, Metric::Cosine);
        assert!(serde_json::from_str::<Metric>("\"jaccard\"").is_err());
    }

    #[test]
    fn cosine_matrix_normalizes_inputs() {
        let a = vec![vec![2.0f32, 0.0], vec![0.0, 3.0]];
        let b = vec![vec![5.0f32, 0.0], vec![1.0, 1.0], vec![0.0, -1.0]];
        let m = similarity_matrix(&a, &b, Metric::Cosine).unwrap();

        assert_eq!(m.dim(), (2, 3));
        assert!((m[[0, 0]] - 1.0).abs() < 1e-6);
        assert!((m[[0, 1]] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!(m[[0, 2]].abs() < 1e-6);
        assert!((m[[1, 2]] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn euclidean_matrix_is_inverse_distance() {
        let a = vec![vec![1.0f32, 0.0]];
        let b = vec![vec![1.0f32, 0.0], vec![0.0, 1.0], vec![-4.0, 0.0]];
        let m = similarity_matrix(&a, &b, Metric::Euclidean).unwrap();

        assert!((m[[0, 0]] - 1.0).abs() < 1e-6);
        let expected = 1.0 / (1.0 + 2.0f32.sqrt());
        assert!((m[[0, 1]] - expected).abs() < 1e-6);
        assert!((m[[0, 2]] - 1.0 / 3.0).abs() < 1e-6);
        assert!(m.iter().all(|v| *v > 0.0 && *v <= 1.0));
    }

    #[test]
    fn zero_vectors_do_not_produce_nan() {
        let a = vec![vec![0.0f32, 0.0]];
        let b = vec![vec![1.0f32, 0.0]];
        let cos = similarity_matrix(&a, &b, Metric::Cosine).unwrap();
        assert_eq!(cos[[0, 0]], 0.0);
        let euc = similarity_matrix(&a, &b, Metric::Euclidean).unwrap();
        assert!((euc[[0, 0]] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let a = vec![vec![1.0f32, 0.0]];
        let b = vec![vec![1.0f32, 0.0, 0.0]];
        let err = similarity_matrix(&a, &b, Metric::Cosine).unwrap_err();
        assert_eq!(
            err,
            SimilarityError::DimensionMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn empty_side_yields_degenerate_shape() {
        let a = vec![vec![1.0f32, 0.0]];
        let b: Vec<Vec<f32>> = Vec::new();
        let m = similarity_matrix(&a, &b, Metric::Cosine).unwrap();
        assert_eq!(m.dim(), (1, 0));
    }
}
