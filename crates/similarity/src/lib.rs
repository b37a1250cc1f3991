//! # Video similarity primitives
//!
//! Leaf crate of the workspace. It owns the frame-vector data model and the
//! three pure steps every comparison goes through:
//!
//! - [`l2_normalize_in_place`]: scale a vector to unit length. Zero vectors
//!   are returned unchanged rather than becoming NaN.
//! - [`similarity_matrix`]: all-pairs similarity between two vector sets under
//!   a [`Metric`] (`cosine` by default, or `euclidean`). The builder
//!   normalizes its inputs itself.
//! - [`directed_similarity`]: mean over rows of A of the best match in B.
//!   Not symmetric; see [`score`] for the direction convention.
//!
//! ## Example
//!
//! ```
//! use similarity::{directed_similarity, Metric, VideoFingerprint, fingerprint_similarity};
//!
//! let query = VideoFingerprint::from_vectors(vec![vec![1.0, 0.0]]).unwrap();
//! let candidate = VideoFingerprint::from_vectors(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
//!
//! let forward = fingerprint_similarity(&query, &candidate, Metric::Cosine).unwrap();
//! let backward = fingerprint_similarity(&candidate, &query, Metric::Cosine).unwrap();
//! assert!(forward > backward);
//!
//! let raw = directed_similarity(&[vec![3.0f32, 4.0]], &[vec![6.0f32, 8.0]], Metric::Cosine).unwrap();
//! assert!((raw - 1.0).abs() < 1e-6);
//! ```

pub mod error;
pub mod fingerprint;
pub mod matrix;
pub mod normalize;
pub mod score;

pub use crate::error::SimilarityError;
pub use crate::fingerprint::{FrameVector, SampledFrame, VideoFingerprint, FRAME_VECTOR_DIM};
pub use crate::matrix::{similarity_matrix, similarity_matrix_named, Metric, SimilarityMatrix};
pub use crate::normalize::{l2_normalize_in_place, l2_normalized};
pub use crate::score::{directed_score, directed_similarity, fingerprint_similarity};
