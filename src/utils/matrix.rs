//! Dense linear-algebra helpers over `ndarray`.
//!
//! Layer shape convention: a weight matrix has one row per output unit and one
//! column per input unit plus a leading bias column. Column 0 multiplies the
//! constant 1.0 that [`add_bias_unit`] prepends to every layer input, so the
//! backward pass must strip row 0 of `Wᵀ·delta` to line up with the layer's
//! units again.

use ndarray::{Array1, Array2, Axis};

/// Prepend the constant bias input 1.0 to a vector.
pub fn add_bias_unit(input: &Array1<f64>) -> Array1<f64> {
    let mut augmented = Array1::ones(input.len() + 1);
    augmented.slice_mut(ndarray::s![1..]).assign(input);
    augmented
}

/// Outer product `u · vᵀ` with shape `(u.len(), v.len())`.
pub fn outer_product(u: &Array1<f64>, v: &Array1<f64>) -> Array2<f64> {
    let column = u.view().insert_axis(Axis(1));
    let row = v.view().insert_axis(Axis(0));
    column.dot(&row)
}

/// Total number of scalar elements across a set of matrices.
pub fn element_count(matrices: &[Array2<f64>]) -> usize {
    matrices.iter().map(|m| m.len()).sum()
}

/// Shapes of a set of matrices as `(rows, cols)` pairs.
pub fn shapes(matrices: &[Array2<f64>]) -> Vec<(usize, usize)> {
    matrices.iter().map(|m| m.dim()).collect()
}
