use ndarray::prelude::*;

/// Stack feature vectors into an `N x len` row matrix.
pub fn stack_features(features: &[Array1<f32>], len: usize) -> Array2<f32> {
    let mut out = Array2::zeros((features.len(), len));

    for (mut row, feature) in out.axis_iter_mut(Axis(0)).zip(features.iter()) {
        row.assign(feature);
    }

    out
}

/// Compute pair-wise cosine similarity between points in `a` and `b`.
///
/// ```text
///     Parameters
///     ----------
///     a : array_like
///         An NxM matrix of N samples of dimensionality M (secondary view).
///     b : array_like
///         An LxM matrix of L samples of dimensionality M (primary view).
///
///     Returns
///     -------
///     ndarray
///         Returns a matrix of size len(a), len(b) such that element (i, j)
///         contains the cosine similarity between `a[i]` and `b[j]`, in `[-1, 1]`.
///         A zero row is 0-similar to everything.
/// ```
pub fn cosine_similarity(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>) -> Array2<f32> {
    if a.is_empty() || b.is_empty() {
        return Array2::zeros((a.nrows(), b.nrows()));
    }

    let length_a = a.map_axis(Axis(1), |x| x.fold(0.0, |a, x| a + x * x).sqrt());
    let length_b = b.map_axis(Axis(1), |x| x.fold(0.0, |a, x| a + x * x).sqrt());

    let inv_a = length_a.mapv(|l| if l > 0.0 { 1.0 / l } else { 0.0 });
    let inv_b = length_b.mapv(|l| if l > 0.0 { 1.0 / l } else { 0.0 });

    let a = &a * &inv_a.insert_axis(Axis(1));
    let b = &b * &inv_b.insert_axis(Axis(1));

    a.dot(&b.t()).mapv_into(|x| x.max(-1.0).min(1.0))
}
