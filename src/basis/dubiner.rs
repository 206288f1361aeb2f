//! Dubiner modal basis on the reference tetrahedron.
//!
//! The reference tetrahedron has vertices (0,0,0), (1,0,0), (0,1,0),
//! (0,0,1). Orders p in {0,1,2} carry 1/4/10 modes; the closed forms below
//! are orthogonal under the unit weight, with diagonal mass-matrix entries
//! `{1/6, 1/60, 1/20, 1/10, 1/210, 1/126, 1/84, 1/42, 1/28, 1/14}` on the
//! reference element, i.e. `6 V_e` times those values on a physical element.

/// Evaluate the Dubiner basis functions at a reference point.
///
/// Returns `ndof` values with `B[0] = 1`.
pub fn eval_basis(ndof: usize, xi: f64, eta: f64, zeta: f64) -> Vec<f64> {
    let mut b = vec![1.0; ndof];

    if ndof > 1 {
        // DG(P1)
        b[1] = 2.0 * xi + eta + zeta - 1.0;
        b[2] = 3.0 * eta + zeta - 1.0;
        b[3] = 4.0 * zeta - 1.0;

        if ndof > 4 {
            // DG(P2)
            b[4] = 6.0 * xi * xi + eta * eta + zeta * zeta
                + 6.0 * xi * eta
                + 6.0 * xi * zeta
                + 2.0 * eta * zeta
                - 6.0 * xi
                - 2.0 * eta
                - 2.0 * zeta
                + 1.0;
            b[5] = 5.0 * eta * eta + zeta * zeta
                + 10.0 * xi * eta
                + 2.0 * xi * zeta
                + 6.0 * eta * zeta
                - 2.0 * xi
                - 6.0 * eta
                - 2.0 * zeta
                + 1.0;
            b[6] = 6.0 * zeta * zeta + 12.0 * xi * zeta + 6.0 * eta * zeta
                - 2.0 * xi
                - eta
                - 7.0 * zeta
                + 1.0;
            b[7] = 10.0 * eta * eta + zeta * zeta + 8.0 * eta * zeta
                - 8.0 * eta
                - 2.0 * zeta
                + 1.0;
            b[8] = 6.0 * zeta * zeta + 18.0 * eta * zeta - 3.0 * eta - 7.0 * zeta + 1.0;
            b[9] = 15.0 * zeta * zeta - 10.0 * zeta + 1.0;
        }
    }

    b
}

/// Reference-space gradients dB/dxi of the basis at a reference point.
///
/// Returns `[d/dxi, d/deta, d/dzeta]`, each of length `ndof`. Mode 0 has a
/// zero gradient; modes 1..3 are linear so their gradients are constant.
pub fn eval_dbdxi(ndof: usize, coord: [f64; 3]) -> [Vec<f64>; 3] {
    let mut dbdxi = [vec![0.0; ndof], vec![0.0; ndof], vec![0.0; ndof]];

    if ndof > 1 {
        dbdxi[0][1] = 2.0;
        dbdxi[1][1] = 1.0;
        dbdxi[2][1] = 1.0;

        dbdxi[0][2] = 0.0;
        dbdxi[1][2] = 3.0;
        dbdxi[2][2] = 1.0;

        dbdxi[0][3] = 0.0;
        dbdxi[1][3] = 0.0;
        dbdxi[2][3] = 4.0;
    }

    if ndof > 4 {
        let [xi, eta, zeta] = coord;

        dbdxi[0][4] = 12.0 * xi + 6.0 * eta + 6.0 * zeta - 6.0;
        dbdxi[1][4] = 6.0 * xi + 2.0 * eta + 2.0 * zeta - 2.0;
        dbdxi[2][4] = 6.0 * xi + 2.0 * eta + 2.0 * zeta - 2.0;

        dbdxi[0][5] = 10.0 * eta + 2.0 * zeta - 2.0;
        dbdxi[1][5] = 10.0 * xi + 10.0 * eta + 6.0 * zeta - 6.0;
        dbdxi[2][5] = 2.0 * xi + 6.0 * eta + 2.0 * zeta - 2.0;

        dbdxi[0][6] = 12.0 * zeta - 2.0;
        dbdxi[1][6] = 6.0 * zeta - 1.0;
        dbdxi[2][6] = 12.0 * xi + 6.0 * eta + 12.0 * zeta - 7.0;

        dbdxi[0][7] = 0.0;
        dbdxi[1][7] = 20.0 * eta + 8.0 * zeta - 8.0;
        dbdxi[2][7] = 8.0 * eta + 2.0 * zeta - 2.0;

        dbdxi[0][8] = 0.0;
        dbdxi[1][8] = 18.0 * zeta - 3.0;
        dbdxi[2][8] = 18.0 * eta + 12.0 * zeta - 7.0;

        dbdxi[0][9] = 0.0;
        dbdxi[1][9] = 0.0;
        dbdxi[2][9] = 30.0 * zeta - 10.0;
    }

    dbdxi
}

/// Physical-space gradients of the P1 modes via the inverse Jacobian.
///
/// `dB/dx = dB/dxi . dxi/dx`; for the linear modes the reference gradients
/// are constant, so this is a single 3x3 product per mode.
pub fn eval_dbdx_p1(ndof: usize, jac_inv: &[[f64; 3]; 3]) -> [Vec<f64>; 3] {
    let mut dbdx = [vec![0.0; ndof], vec![0.0; ndof], vec![0.0; ndof]];
    if ndof < 2 {
        return dbdx;
    }

    let dbdxi = eval_dbdxi(4.min(ndof), [0.0; 3]);

    for idof in 1..4.min(ndof) {
        for idir in 0..3 {
            dbdx[idir][idof] = dbdxi[0][idof] * jac_inv[0][idir]
                + dbdxi[1][idof] * jac_inv[1][idir]
                + dbdxi[2][idof] * jac_inv[2][idir];
        }
    }

    dbdx
}

/// Augment physical-space gradients with the P2 modes at a quadrature point.
///
/// Fills `dbdx[.][4..10]` in place; the quadratic modes have
/// position-dependent reference gradients.
pub fn eval_dbdx_p2(coord: [f64; 3], jac_inv: &[[f64; 3]; 3], dbdx: &mut [Vec<f64>; 3]) {
    let dbdxi = eval_dbdxi(10, coord);

    for idof in 4..10 {
        for idir in 0..3 {
            dbdx[idir][idof] = dbdxi[0][idof] * jac_inv[0][idir]
                + dbdxi[1][idof] * jac_inv[1][idir]
                + dbdxi[2][idof] * jac_inv[2][idir];
        }
    }
}

/// Diagonal of the Dubiner mass matrix for an element of volume `vol`.
pub fn mass_matrix_dubiner(ndof: usize, vol: f64) -> Vec<f64> {
    let mut l = vec![0.0; ndof];
    l[0] = vol;
    if ndof > 1 {
        l[1] = vol / 10.0;
        l[2] = vol * 3.0 / 10.0;
        l[3] = vol * 3.0 / 5.0;
    }
    if ndof > 4 {
        l[4] = vol / 35.0;
        l[5] = vol / 21.0;
        l[6] = vol / 14.0;
        l[7] = vol / 7.0;
        l[8] = vol * 3.0 / 14.0;
        l[9] = vol * 3.0 / 7.0;
    }
    l
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadrature::{gauss_quadrature_tet, ng_vol};

    #[test]
    fn test_constant_mode() {
        let b = eval_basis(1, 0.3, 0.2, 0.1);
        assert_eq!(b, vec![1.0]);
    }

    #[test]
    fn test_basis_values_at_vertices() {
        // B[1..3] at the four reference vertices
        let verts = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let expect = [
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [0.0, 2.0, -1.0],
            [0.0, 0.0, 3.0],
        ];
        for (v, ex) in verts.iter().zip(&expect) {
            let b = eval_basis(4, v[0], v[1], v[2]);
            for i in 0..3 {
                assert!(
                    (b[i + 1] - ex[i]).abs() < 1e-14,
                    "vertex {v:?} mode {}: {} vs {}",
                    i + 1,
                    b[i + 1],
                    ex[i]
                );
            }
        }
    }

    #[test]
    fn test_orthogonality_and_mass_diagonal() {
        for ndof in [4usize, 10] {
            let ng = ng_vol(ndof);
            let (xg, wg) = gauss_quadrature_tet(ng);
            let l = mass_matrix_dubiner(ndof, 1.0);
            for i in 0..ndof {
                for j in 0..ndof {
                    let mut m = 0.0;
                    for (x, w) in xg.iter().zip(&wg) {
                        let b = eval_basis(ndof, x[0], x[1], x[2]);
                        m += w * b[i] * b[j];
                    }
                    let exact = if i == j { l[i] } else { 0.0 };
                    assert!(
                        (m - exact).abs() < 1e-12,
                        "mass[{i}][{j}] = {m}, expected {exact}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_reference_gradients_match_finite_differences() {
        let p = [0.21, 0.17, 0.33];
        let h = 1e-6;
        let dbdxi = eval_dbdxi(10, p);
        for idir in 0..3 {
            let mut pp = p;
            let mut pm = p;
            pp[idir] += h;
            pm[idir] -= h;
            let bp = eval_basis(10, pp[0], pp[1], pp[2]);
            let bm = eval_basis(10, pm[0], pm[1], pm[2]);
            for idof in 0..10 {
                let fd = (bp[idof] - bm[idof]) / (2.0 * h);
                assert!(
                    (dbdxi[idir][idof] - fd).abs() < 1e-6,
                    "dB[{idof}]/dxi[{idir}]: {} vs fd {}",
                    dbdxi[idir][idof],
                    fd
                );
            }
        }
    }

    #[test]
    fn test_physical_gradients_identity_map() {
        // With the identity Jacobian, physical and reference gradients agree.
        let jac_inv = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let mut dbdx = eval_dbdx_p1(10, &jac_inv);
        eval_dbdx_p2([0.25, 0.25, 0.25], &jac_inv, &mut dbdx);
        let dbdxi = eval_dbdxi(10, [0.25, 0.25, 0.25]);
        for idir in 0..3 {
            for idof in 1..10 {
                assert!((dbdx[idir][idof] - dbdxi[idir][idof]).abs() < 1e-14);
            }
        }
    }
}
