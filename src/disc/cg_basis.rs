use ndarray::{Array1, Array2, ArrayView1};

pub mod triangle;

/// Continuous Galerkin basis functions on a reference element.
pub trait CGBasis2D {
    const NUM_NODES: usize;

    /// Shape functions at the reference points `(r, s)`, one row per point.
    fn shape_functions(r: ArrayView1<f64>, s: ArrayView1<f64>) -> Array2<f64>;

    /// Reference gradients `(d/dr, d/ds)` of the shape functions, one row per point.
    fn grad_shape_functions(r: ArrayView1<f64>, s: ArrayView1<f64>) -> (Array2<f64>, Array2<f64>);

    /// Nodal coordinates on the reference element.
    fn nodes2d() -> (Array1<f64>, Array1<f64>);
}
