use ndarray::{Array1, Array2, ArrayView1, array};

use crate::disc::cg_basis::CGBasis2D;

/// Linear Lagrange basis on the reference triangle with vertices
/// (0, 0), (1, 0), (0, 1). Shape function `i` belongs to vertex `i`.
pub struct TriangleCGBasis;

impl CGBasis2D for TriangleCGBasis {
    const NUM_NODES: usize = 3;

    fn shape_functions(r: ArrayView1<f64>, s: ArrayView1<f64>) -> Array2<f64> {
        let mut phi = Array2::<f64>::zeros((r.len(), Self::NUM_NODES));
        for (pt, (&rp, &sp)) in r.iter().zip(s.iter()).enumerate() {
            // barycentric coordinates
            phi[[pt, 0]] = 1.0 - rp - sp;
            phi[[pt, 1]] = rp;
            phi[[pt, 2]] = sp;
        }
        phi
    }

    fn grad_shape_functions(r: ArrayView1<f64>, _s: ArrayView1<f64>) -> (Array2<f64>, Array2<f64>) {
        let npts = r.len();
        let mut dphi_dr = Array2::<f64>::zeros((npts, Self::NUM_NODES));
        let mut dphi_ds = Array2::<f64>::zeros((npts, Self::NUM_NODES));
        for pt in 0..npts {
            dphi_dr.row_mut(pt).assign(&array![-1.0, 1.0, 0.0]);
            dphi_ds.row_mut(pt).assign(&array![-1.0, 0.0, 1.0]);
        }
        (dphi_dr, dphi_ds)
    }

    fn nodes2d() -> (Array1<f64>, Array1<f64>) {
        (array![0.0, 1.0, 0.0], array![0.0, 0.0, 1.0])
    }
}
