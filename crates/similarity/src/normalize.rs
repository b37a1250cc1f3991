/// In-place L2 normalization.
///
/// A zero vector has no direction; it is left untouched (norm stays 0) instead
/// of being divided into NaNs.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

/// Returns a unit-length copy of every vector in `vectors`.
pub fn l2_normalized<V: AsRef<[f32]>>(vectors: &[V]) -> Vec<Vec<f32>> {
    vectors
        .iter()
        .map(|v| {
            let mut owned = v.as_ref().to_vec();
            l2_normalize_in_place(&mut owned);
            owned
        })
        .collect()
}
