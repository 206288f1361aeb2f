//! Taylor basis and Dubiner<->Taylor transforms.
//!
//! The Taylor basis is built from powers of the offset from the cell
//! centroid, with the means of the quadratic terms subtracted so every mode
//! above the first has zero cell average. The hierarchical limiter works on
//! Taylor coefficients (cell mean, then derivatives), so exact transforms to
//! and from the Dubiner representation are required: on the reference
//! element the pair below are inverses to round-off for ndof in {4, 10}.

use faer::prelude::SpSolver;
use faer::Mat;

use crate::basis::dubiner::{eval_basis, mass_matrix_dubiner};
use crate::fields::Fields;
use crate::quadrature::{gauss_quadrature_tet, ng_vol};

/// Reference-element volume.
const VREF: f64 = 1.0 / 6.0;

/// Mean of `(xi - 1/4)^2 / 2` over the reference tetrahedron.
const AVG_SQ: f64 = 3.0 / 160.0;
/// Mean of `(xi - 1/4)(eta - 1/4)` over the reference tetrahedron.
const AVG_CROSS: f64 = -1.0 / 80.0;

/// Evaluate the Taylor basis on the reference element at a reference point.
///
/// Modes: 1, offsets from the reference centroid (1/4,1/4,1/4), then the
/// mean-free quadratic terms ordered xx, yy, zz, xy, xz, yz.
pub fn eval_taylor_basis_ref_el(ndof: usize, xi: f64, eta: f64, zeta: f64) -> Vec<f64> {
    let mut b = vec![1.0; ndof];
    if ndof > 1 {
        b[1] = xi - 0.25;
        b[2] = eta - 0.25;
        b[3] = zeta - 0.25;
    }
    if ndof > 4 {
        b[4] = b[1] * b[1] * 0.5 - AVG_SQ;
        b[5] = b[2] * b[2] * 0.5 - AVG_SQ;
        b[6] = b[3] * b[3] * 0.5 - AVG_SQ;
        b[7] = b[1] * b[2] - AVG_CROSS;
        b[8] = b[1] * b[3] - AVG_CROSS;
        b[9] = b[2] * b[3] - AVG_CROSS;
    }
    b
}

/// Evaluate the Taylor basis in physical space at point `x` for an element
/// with centroid `x_c` and vertex coordinates `coordel`.
///
/// The quadratic means are computed by quadrature over the element so that
/// higher modes stay mean-free on arbitrary tetrahedra.
pub fn eval_taylor_basis(
    ndof: usize,
    x: [f64; 3],
    x_c: [f64; 3],
    coordel: &[[f64; 3]; 4],
) -> Vec<f64> {
    let mut avg = [0.0; 6];
    if ndof > 4 {
        let (xg, wg) = gauss_quadrature_tet(ng_vol(ndof));
        for (p, w) in xg.iter().zip(&wg) {
            let gp = crate::mesh::geometry::eval_gp_tet(*p, coordel);
            let dx = gp[0] - x_c[0];
            let dy = gp[1] - x_c[1];
            let dz = gp[2] - x_c[2];
            avg[0] += w * dx * dx * 0.5;
            avg[1] += w * dy * dy * 0.5;
            avg[2] += w * dz * dz * 0.5;
            avg[3] += w * dx * dy;
            avg[4] += w * dx * dz;
            avg[5] += w * dy * dz;
        }
    }

    let mut b = vec![1.0; ndof];
    if ndof > 1 {
        b[1] = x[0] - x_c[0];
        b[2] = x[1] - x_c[1];
        b[3] = x[2] - x_c[2];
    }
    if ndof > 4 {
        b[4] = b[1] * b[1] * 0.5 - avg[0];
        b[5] = b[2] * b[2] * 0.5 - avg[1];
        b[6] = b[3] * b[3] * 0.5 - avg[2];
        b[7] = b[1] * b[2] - avg[3];
        b[8] = b[1] * b[3] - avg[4];
        b[9] = b[2] * b[3] - avg[5];
    }
    b
}

/// Inverse of the reference-element Taylor mass matrix.
///
/// The Taylor basis is not orthogonal, so the transform to Taylor
/// coefficients needs the full (small, symmetric) mass matrix. Assembled by
/// quadrature and inverted once per run with an LU factorization.
pub fn taylor_mass_inverse_ref_el(ndof: usize) -> Vec<Vec<f64>> {
    let (xg, wg) = gauss_quadrature_tet(ng_vol(ndof));

    let mut m = Mat::<f64>::zeros(ndof, ndof);
    for (p, w) in xg.iter().zip(&wg) {
        let t = eval_taylor_basis_ref_el(ndof, p[0], p[1], p[2]);
        for i in 0..ndof {
            for j in 0..ndof {
                m[(i, j)] += w * VREF * t[i] * t[j];
            }
        }
    }

    // Solve M * M_inv = I column by column
    let lu = m.as_ref().full_piv_lu();
    let mut inv = vec![vec![0.0; ndof]; ndof];
    for j in 0..ndof {
        let mut rhs = Mat::<f64>::zeros(ndof, 1);
        rhs[(j, 0)] = 1.0;
        let col = lu.solve(&rhs);
        for (i, row) in inv.iter_mut().enumerate() {
            row[j] = col[(i, 0)];
        }
    }
    inv
}

/// Transform one element's Dubiner coefficients to Taylor coefficients on
/// the reference element, by L2 projection with the Taylor mass inverse.
///
/// Coefficients with index `>= dof_el` are treated as zero. Returns
/// `unk[c][i]` sized `ncomp x rdof`.
pub fn dubiner_to_taylor_ref_el(
    ncomp: usize,
    e: usize,
    rdof: usize,
    dof_el: usize,
    mt_inv: &[Vec<f64>],
    u: &Fields,
) -> Vec<Vec<f64>> {
    let (xg, wg) = gauss_quadrature_tet(ng_vol(rdof));

    // right-hand side: (u, T_i) for every component
    let mut rhs = vec![vec![0.0; rdof]; ncomp];
    for (p, w) in xg.iter().zip(&wg) {
        let b = eval_basis(dof_el, p[0], p[1], p[2]);
        let t = eval_taylor_basis_ref_el(rdof, p[0], p[1], p[2]);
        let wt = w * VREF;
        for c in 0..ncomp {
            let mark = c * rdof;
            let mut state = 0.0;
            for idof in 0..dof_el {
                state += u.get(e, mark + idof) * b[idof];
            }
            for i in 0..rdof {
                rhs[c][i] += wt * state * t[i];
            }
        }
    }

    let mut unk = vec![vec![0.0; rdof]; ncomp];
    for c in 0..ncomp {
        for i in 0..rdof {
            let mut s = 0.0;
            for j in 0..rdof {
                s += mt_inv[i][j] * rhs[c][j];
            }
            unk[c][i] = s;
        }
    }
    unk
}

/// Transform Taylor coefficients back to Dubiner coefficients on the
/// reference element, in place, via the diagonal Dubiner mass matrix.
pub fn taylor_to_dubiner_ref_el(ncomp: usize, unk: &mut [Vec<f64>]) {
    let rdof = unk[0].len();
    let (xg, wg) = gauss_quadrature_tet(ng_vol(rdof));
    let l = mass_matrix_dubiner(rdof, VREF);

    let mut rhs = vec![vec![0.0; rdof]; ncomp];
    for (p, w) in xg.iter().zip(&wg) {
        let t = eval_taylor_basis_ref_el(rdof, p[0], p[1], p[2]);
        let b = eval_basis(rdof, p[0], p[1], p[2]);
        let wt = w * VREF;
        for c in 0..ncomp {
            let mut state = 0.0;
            for (i, ti) in t.iter().enumerate().take(rdof) {
                state += unk[c][i] * ti;
            }
            for i in 0..rdof {
                rhs[c][i] += wt * state * b[i];
            }
        }
    }

    for c in 0..ncomp {
        for i in 0..rdof {
            unk[c][i] = rhs[c][i] / l[i];
        }
    }
}

/// Transform one element's Dubiner coefficients to physical-space Taylor
/// coefficients (cell mean, then centroid derivatives).
///
/// The first derivatives come from the P1 physical gradients; the second
/// derivatives contract the constant reference Hessians of modes 4..9 with
/// the inverse Jacobian twice.
pub fn transform_basis(
    ncomp: usize,
    e: usize,
    ndof: usize,
    u: &Fields,
    jac_inv: &[[f64; 3]; 3],
) -> Vec<Vec<f64>> {
    let mut unk = vec![vec![0.0; ndof]; ncomp];

    for (c, row) in unk.iter_mut().enumerate() {
        row[0] = u.get(e, c * ndof);
    }

    let mut dbdx = super::dubiner::eval_dbdx_p1(ndof, jac_inv);
    if ndof > 4 {
        super::dubiner::eval_dbdx_p2([0.25, 0.25, 0.25], jac_inv, &mut dbdx);
    }

    for (c, row) in unk.iter_mut().enumerate() {
        let mark = c * ndof;
        for idir in 0..3 {
            let mut s = 0.0;
            for idof in 1..ndof {
                s += u.get(e, mark + idof) * dbdx[idir][idof];
            }
            row[idir + 1] = s;
        }
    }

    if ndof > 4 {
        // Constant second reference-derivatives of modes 4..9, rows ordered
        // xixi, etaeta, zetazeta, xieta, xizeta, etazeta.
        let db2dxi2: [[f64; 6]; 6] = [
            [12.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [2.0, 10.0, 0.0, 20.0, 0.0, 0.0],
            [2.0, 2.0, 12.0, 2.0, 12.0, 30.0],
            [6.0, 10.0, 0.0, 0.0, 0.0, 0.0],
            [6.0, 2.0, 12.0, 0.0, 0.0, 0.0],
            [2.0, 6.0, 6.0, 8.0, 18.0, 0.0],
        ];

        let mut d2bdx2 = [[0.0; 6]; 6];
        for ib in 0..6 {
            for idir in 0..3 {
                d2bdx2[idir][ib] = db2dxi2[0][ib] * jac_inv[0][idir] * jac_inv[0][idir]
                    + db2dxi2[1][ib] * jac_inv[1][idir] * jac_inv[1][idir]
                    + db2dxi2[2][ib] * jac_inv[2][idir] * jac_inv[2][idir]
                    + 2.0
                        * (db2dxi2[3][ib] * jac_inv[0][idir] * jac_inv[1][idir]
                            + db2dxi2[4][ib] * jac_inv[0][idir] * jac_inv[2][idir]
                            + db2dxi2[5][ib] * jac_inv[1][idir] * jac_inv[2][idir]);
            }
            let cross = [(0usize, 1usize), (0, 2), (1, 2)];
            for (m, &(p, q)) in cross.iter().enumerate() {
                d2bdx2[3 + m][ib] = db2dxi2[0][ib] * jac_inv[0][p] * jac_inv[0][q]
                    + db2dxi2[1][ib] * jac_inv[1][p] * jac_inv[1][q]
                    + db2dxi2[2][ib] * jac_inv[2][p] * jac_inv[2][q]
                    + db2dxi2[3][ib]
                        * (jac_inv[0][p] * jac_inv[1][q] + jac_inv[1][p] * jac_inv[0][q])
                    + db2dxi2[4][ib]
                        * (jac_inv[0][p] * jac_inv[2][q] + jac_inv[2][p] * jac_inv[0][q])
                    + db2dxi2[5][ib]
                        * (jac_inv[1][p] * jac_inv[2][q] + jac_inv[2][p] * jac_inv[1][q]);
            }
        }

        for (c, row) in unk.iter_mut().enumerate() {
            let mark = c * ndof;
            for idir in 0..6 {
                let mut s = 0.0;
                for ib in 0..6 {
                    s += u.get(e, mark + 4 + ib) * d2bdx2[idir][ib];
                }
                row[idir + 4] = s;
            }
        }
    }

    unk
}

/// Project physical-space Taylor coefficients back onto the Dubiner basis
/// of one element, by Gauss quadrature and the diagonal mass matrix.
pub fn inverse_basis(
    ncomp: usize,
    e: usize,
    ndof: usize,
    coordel: &[[f64; 3]; 4],
    x_c: [f64; 3],
    unk: &[Vec<f64>],
    u: &mut Fields,
) {
    let l = mass_matrix_dubiner(ndof, VREF);
    let (xg, wg) = gauss_quadrature_tet(ng_vol(ndof));

    let mut rhs = vec![0.0; ncomp * ndof];
    for (p, w) in xg.iter().zip(&wg) {
        let wt = w * VREF;
        let gp = crate::mesh::geometry::eval_gp_tet(*p, coordel);
        let bt = eval_taylor_basis(ndof, gp, x_c, coordel);
        let b = eval_basis(ndof, p[0], p[1], p[2]);
        for c in 0..ncomp {
            let mut state = 0.0;
            for (i, ti) in bt.iter().enumerate() {
                state += unk[c][i] * ti;
            }
            let mark = c * ndof;
            for i in 0..ndof {
                rhs[mark + i] += wt * state * b[i];
            }
        }
    }

    for c in 0..ncomp {
        let mark = c * ndof;
        for i in 0..ndof {
            u.set(e, mark + i, rhs[mark + i] / l[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taylor_modes_are_mean_free() {
        let (xg, wg) = gauss_quadrature_tet(11);
        for i in 1..10 {
            let mut mean = 0.0;
            for (p, w) in xg.iter().zip(&wg) {
                mean += w * eval_taylor_basis_ref_el(10, p[0], p[1], p[2])[i];
            }
            assert!(mean.abs() < 1e-13, "mode {i} mean {mean}");
        }
    }

    #[test]
    fn test_dubiner_taylor_roundtrip() {
        for rdof in [4usize, 10] {
            let ncomp = 2;
            let mut u = Fields::new(1, ncomp * rdof);
            // arbitrary smooth coefficients
            for c in 0..ncomp {
                for i in 0..rdof {
                    u.set(0, c * rdof + i, 0.3 + (c as f64) - 0.1 * (i as f64) * (i as f64));
                }
            }
            let mt_inv = taylor_mass_inverse_ref_el(rdof);
            let mut unk = dubiner_to_taylor_ref_el(ncomp, 0, rdof, rdof, &mt_inv, &u);
            taylor_to_dubiner_ref_el(ncomp, &mut unk);
            for c in 0..ncomp {
                for i in 0..rdof {
                    let orig = u.get(0, c * rdof + i);
                    assert!(
                        (unk[c][i] - orig).abs() < 1e-11 * orig.abs().max(1.0),
                        "rdof {rdof} comp {c} dof {i}: {} vs {}",
                        unk[c][i],
                        orig
                    );
                }
            }
        }
    }

    #[test]
    fn test_cell_average_preserved_by_transform() {
        let rdof = 10;
        let mut u = Fields::new(1, rdof);
        u.set(0, 0, 2.5);
        for i in 1..rdof {
            u.set(0, i, 0.1 * i as f64);
        }
        let mt_inv = taylor_mass_inverse_ref_el(rdof);
        let unk = dubiner_to_taylor_ref_el(1, 0, rdof, rdof, &mt_inv, &u);
        // Taylor mode 0 carries exactly the cell mean
        assert!((unk[0][0] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_transform_inverse_basis_roundtrip() {
        // a non-degenerate physical tetrahedron
        let coordel = [
            [0.0, 0.0, 0.0],
            [1.2, 0.1, 0.0],
            [0.2, 1.1, 0.1],
            [0.1, 0.2, 0.9],
        ];
        let x_c = [
            (coordel[0][0] + coordel[1][0] + coordel[2][0] + coordel[3][0]) / 4.0,
            (coordel[0][1] + coordel[1][1] + coordel[2][1] + coordel[3][1]) / 4.0,
            (coordel[0][2] + coordel[1][2] + coordel[2][2] + coordel[3][2]) / 4.0,
        ];
        let jac_inv = crate::mesh::geometry::inverse_jacobian(&coordel);

        let ndof = 10;
        let mut u = Fields::new(1, ndof);
        for i in 0..ndof {
            u.set(0, i, 1.0 - 0.07 * (i as f64) + 0.01 * (i as f64) * (i as f64));
        }
        let expect = u.clone();

        let unk = transform_basis(1, 0, ndof, &u, &jac_inv);
        inverse_basis(1, 0, ndof, &coordel, x_c, &unk, &mut u);

        for i in 0..ndof {
            assert!(
                (u.get(0, i) - expect.get(0, i)).abs() < 1e-9,
                "dof {i}: {} vs {}",
                u.get(0, i),
                expect.get(0, i)
            );
        }
    }
}
