use faer::Col;
use faer::prelude::Solve;
use faer::sparse::{SparseColMat, Triplet};
use log::debug;
use ndarray::{Array1, Array2, array};

use crate::disc::cg_basis::{CGBasis2D, triangle::TriangleCGBasis};
use crate::disc::geometric::Geometric2D;
use crate::disc::mesh::mesh2d::Mesh2d;
use crate::error::{Error, Result};

/// Largest relative residual `|Ax - b| / max(|b|, 1)` accepted from any solve.
const RESIDUAL_LIMIT: f64 = 1e-6;

/// Row-compressed square system `A x = b`.
#[derive(Clone, Debug)]
pub struct SparseSystem {
    rows: Vec<Vec<(usize, f64)>>,
    pub rhs: Array1<f64>,
}

impl SparseSystem {
    pub fn new(n: usize) -> Self {
        Self {
            rows: vec![Vec::new(); n],
            rhs: Array1::zeros(n),
        }
    }
    pub fn size(&self) -> usize {
        self.rows.len()
    }
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
    /// Accumulates `value` into `A[i, j]`.
    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        let row = &mut self.rows[i];
        match row.iter_mut().find(|(col, _)| *col == j) {
            Some((_, a)) => *a += value,
            None => row.push((j, value)),
        }
    }
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i]
            .iter()
            .find(|(col, _)| *col == j)
            .map_or(0.0, |(_, a)| *a)
    }
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        for (i, row) in self.rows.iter().enumerate() {
            y[i] = row.iter().map(|(j, a_ij)| a_ij * x[*j]).sum();
        }
    }
    fn diagonal(&self) -> Vec<f64> {
        (0..self.size()).map(|i| self.get(i, i)).collect()
    }
    /// Replaces the row of every prescribed node with the identity and moves the
    /// known values of the remaining rows to the right-hand side, keeping `A`
    /// symmetric.
    pub fn apply_dirichlet(&mut self, values: &[Option<f64>]) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            if let Some(g) = values[i] {
                row.clear();
                row.push((i, 1.0));
                self.rhs[i] = g;
                continue;
            }
            let mut lifted = 0.0;
            row.retain(|&(j, a_ij)| match values[j] {
                Some(g) => {
                    lifted += a_ij * g;
                    false
                }
                None => true,
            });
            self.rhs[i] -= lifted;
        }
    }
    pub fn relative_residual(&self, x: &Array1<f64>) -> f64 {
        let x = x.to_vec();
        let b = self.rhs.to_vec();
        let mut ax = vec![0.0; self.size()];
        self.apply(&x, &mut ax);
        let r: Vec<f64> = ax.iter().zip(&b).map(|(a, b)| a - b).collect();
        l2_norm(&r) / l2_norm(&b).max(1.0)
    }
    /// Sparse LU factorization of the assembled system.
    pub fn solve_lu(&self) -> Result<Array1<f64>> {
        let n = self.size();
        let triplets: Vec<Triplet<usize, usize, f64>> = self
            .rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().map(move |&(j, a)| Triplet::new(i, j, a)))
            .collect();
        let a = SparseColMat::<usize, f64>::try_new_from_triplets(n, n, &triplets)
            .map_err(|e| Error::LinearSolve(format!("{e:?}")))?;
        let lu = a
            .as_ref()
            .sp_lu()
            .map_err(|e| Error::LinearSolve(format!("{e:?}")))?;
        let b = Col::<f64>::from_iter(self.rhs.iter().copied());
        let x = lu.solve(&b);
        let x = Array1::from_iter(x.iter().copied());
        self.verify(&x)?;
        Ok(x)
    }
    /// Jacobi-preconditioned conjugate gradients from a zero initial guess.
    pub fn solve_pcg(&self, tolerance: f64, max_iterations: usize) -> Result<Array1<f64>> {
        let n = self.size();
        let b = self.rhs.to_vec();
        let diag = self.diagonal();
        let precondition = |r: &[f64], z: &mut [f64]| {
            for i in 0..n {
                z[i] = if diag[i].abs() > 1e-30 { r[i] / diag[i] } else { r[i] };
            }
        };

        let mut x = vec![0.0; n];
        let mut r = b.clone();
        let b_norm = l2_norm(&b).max(1.0);
        let tol = tolerance * b_norm;
        let mut residual = l2_norm(&r);
        let mut iterations = 0;

        if residual > tol {
            let mut z = vec![0.0; n];
            precondition(&r, &mut z);
            let mut p = z.clone();
            let mut rz_old = dot(&r, &z);
            let mut ap = vec![0.0; n];
            while iterations < max_iterations {
                iterations += 1;
                self.apply(&p, &mut ap);
                let denom = dot(&p, &ap);
                if denom.abs() < 1e-300 {
                    break;
                }
                let alpha = rz_old / denom;
                for i in 0..n {
                    x[i] += alpha * p[i];
                    r[i] -= alpha * ap[i];
                }
                residual = l2_norm(&r);
                if residual <= tol {
                    break;
                }
                precondition(&r, &mut z);
                let rz_new = dot(&r, &z);
                let beta = rz_new / rz_old;
                for i in 0..n {
                    p[i] = z[i] + beta * p[i];
                }
                rz_old = rz_new;
            }
        }
        if residual.is_nan() || residual > tol {
            return Err(Error::NotConverged {
                iterations,
                residual: residual / b_norm,
            });
        }
        debug!(
            "pcg converged in {iterations} iterations, relative residual {:.3e}",
            residual / b_norm
        );
        let x = Array1::from(x);
        self.verify(&x)?;
        Ok(x)
    }
    fn verify(&self, x: &Array1<f64>) -> Result<()> {
        if x.iter().any(|v| !v.is_finite()) {
            return Err(Error::LinearSolve("solution is not finite".into()));
        }
        let residual = self.relative_residual(x);
        if residual > RESIDUAL_LIMIT {
            return Err(Error::LinearSolve(format!(
                "relative residual {residual:.3e} exceeds {RESIDUAL_LIMIT:e}"
            )));
        }
        debug!("linear solve: relative residual {residual:.3e}");
        Ok(())
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn l2_norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// P1 discretization of `-div(k grad u) = f`.
pub struct LinearElliptic {
    pub conductivity: f64,
    pub source: f64,
}

impl LinearElliptic {
    pub fn new(conductivity: f64, source: f64) -> Self {
        Self {
            conductivity,
            source,
        }
    }
    /// `k * area * grad(phi_i) . grad(phi_j)` on one counter-clockwise triangle.
    pub fn element_stiffness(&self, x: &[f64; 3], y: &[f64; 3]) -> Array2<f64> {
        let (jacob_det, jacob_inv_t) = Mesh2d::evaluate_jacob(x, y);
        let centroid = array![1.0 / 3.0];
        let (dphi_dr, dphi_ds) =
            TriangleCGBasis::grad_shape_functions(centroid.view(), centroid.view());
        let grads: Vec<[f64; 2]> = (0..TriangleCGBasis::NUM_NODES)
            .map(|i| {
                let (dr, ds) = (dphi_dr[[0, i]], dphi_ds[[0, i]]);
                [
                    jacob_inv_t[0] * dr + jacob_inv_t[1] * ds,
                    jacob_inv_t[2] * dr + jacob_inv_t[3] * ds,
                ]
            })
            .collect();
        let area = 0.5 * jacob_det.abs();
        Array2::from_shape_fn((3, 3), |(i, j)| {
            self.conductivity * area * (grads[i][0] * grads[j][0] + grads[i][1] * grads[j][1])
        })
    }
    pub fn assemble(&self, mesh: &Mesh2d) -> SparseSystem {
        let mut system = SparseSystem::new(mesh.node_num);
        for ielem in 0..mesh.elem_num {
            let inodes = mesh.elements[ielem].inodes;
            let (x, y) = mesh.element_coords(ielem);
            let k_local = self.element_stiffness(&x, &y);
            let load = self.source * Mesh2d::compute_element_area(&x, &y) / 3.0;
            for (i, &gi) in inodes.iter().enumerate() {
                for (j, &gj) in inodes.iter().enumerate() {
                    system.add(gi, gj, k_local[[i, j]]);
                }
                system.rhs[gi] += load;
            }
        }
        debug!(
            "assembled {} x {} system, {} nonzeros",
            system.size(),
            system.size(),
            system.nnz()
        );
        system
    }
    /// Adds `int g v ds` over the given boundary edges.
    pub fn add_boundary_flux(
        &self,
        system: &mut SparseSystem,
        mesh: &Mesh2d,
        edges: &[usize],
        heat_flux: f64,
    ) {
        for &iedge in edges {
            let [n0, n1] = mesh.edges[iedge].inodes;
            let (p0, p1) = (&mesh.nodes[n0], &mesh.nodes[n1]);
            let half = 0.5 * heat_flux * Mesh2d::compute_edge_length(p0.x, p0.y, p1.x, p1.y);
            system.rhs[n0] += half;
            system.rhs[n1] += half;
        }
    }
}
