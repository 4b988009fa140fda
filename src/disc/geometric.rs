pub trait Geometric2D {
    fn compute_edge_length(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
        ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt()
    }
    fn evaluate_jacob(x: &[f64], y: &[f64]) -> (f64, [f64; 4]) {
        // Reference triangle vertices at (0, 0), (1, 0), (0, 1):
        // N0 = 1 - r - s, N1 = r, N2 = s
        let dn_dr = [-1.0, 1.0, 0.0];
        let dn_ds = [-1.0, 0.0, 1.0];

        let mut dx_dr = 0.0;
        let mut dx_ds = 0.0;
        let mut dy_dr = 0.0;
        let mut dy_ds = 0.0;

        for k in 0..3 {
            dx_dr += dn_dr[k] * x[k];
            dx_ds += dn_ds[k] * x[k];
            dy_dr += dn_dr[k] * y[k];
            dy_ds += dn_ds[k] * y[k];
        }

        let jacob_det = dx_dr * dy_ds - dx_ds * dy_dr;
        let jacob_inv_t = [
            dy_ds / jacob_det,
            -dy_dr / jacob_det,
            -dx_ds / jacob_det,
            dx_dr / jacob_det,
        ];

        (jacob_det, jacob_inv_t)
    }
    /// Twice the area is the cross product of two edges; positive when counter-clockwise.
    fn compute_signed_area(x: &[f64], y: &[f64]) -> f64 {
        0.5 * ((x[1] - x[0]) * (y[2] - y[0]) - (x[2] - x[0]) * (y[1] - y[0]))
    }
    fn compute_element_area(x: &[f64], y: &[f64]) -> f64 {
        Self::compute_signed_area(x, y).abs()
    }
    /// Reference coordinates `(r, s)` of the physical point `(xp, yp)`.
    fn map_to_reference(x: &[f64], y: &[f64], xp: f64, yp: f64) -> (f64, f64) {
        let (jacob_det, _) = Self::evaluate_jacob(x, y);
        let (dx, dy) = (xp - x[0], yp - y[0]);
        let r = ((y[2] - y[0]) * dx - (x[2] - x[0]) * dy) / jacob_det;
        let s = ((x[1] - x[0]) * dy - (y[1] - y[0]) * dx) / jacob_det;
        (r, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    use crate::disc::mesh::mesh2d::Mesh2d as Geo;

    #[test]
    fn test_jacobian_of_scaled_triangle() {
        let x = [1.0, 3.0, 1.0];
        let y = [2.0, 2.0, 5.0];
        let (det, inv_t) = Geo::evaluate_jacob(&x, &y);
        assert_relative_eq!(det, 6.0);
        assert_relative_eq!(Geo::compute_element_area(&x, &y), 3.0);
        assert_relative_eq!(inv_t[0], 0.5);
        assert_relative_eq!(inv_t[3], 1.0 / 3.0);
        assert_relative_eq!(inv_t[1], 0.0);
        assert_relative_eq!(inv_t[2], 0.0);
    }

    #[test]
    fn test_orientation_sign() {
        let x = [0.0, 1.0, 0.0];
        let y = [0.0, 0.0, 1.0];
        assert!(Geo::compute_signed_area(&x, &y) > 0.0);
        let x_cw = [0.0, 0.0, 1.0];
        let y_cw = [0.0, 1.0, 0.0];
        assert!(Geo::compute_signed_area(&x_cw, &y_cw) < 0.0);
    }

    #[test]
    fn test_map_to_reference_inverts_vertices() {
        let x = [0.5, 2.0, 1.0];
        let y = [0.0, 0.5, 3.0];
        let (r, s) = Geo::map_to_reference(&x, &y, x[1], y[1]);
        assert_relative_eq!(r, 1.0, epsilon = 1e-12);
        assert_relative_eq!(s, 0.0, epsilon = 1e-12);
        let (r, s) = Geo::map_to_reference(&x, &y, x[2], y[2]);
        assert_relative_eq!(r, 0.0, epsilon = 1e-12);
        assert_relative_eq!(s, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_edge_length() {
        assert_relative_eq!(Geo::compute_edge_length(0.0, 0.0, 3.0, 4.0), 5.0);
    }
}
