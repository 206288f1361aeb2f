//! Least-squares P0 -> P1 reconstruction for rDG schemes.
//!
//! Cell means are lifted to linear polynomials by a weighted least-squares
//! fit over a stencil of neighbor means: the face stencil (with
//! boundary-condition ghosts at boundary-face centroids) for the full P0P1
//! reconstruction, and the extended nodal stencil for volume-fraction
//! gradients, which want the wider support for a good interface-normal
//! estimate. The 3x3 normal-equations systems are solved by Cramer's rule,
//! and physical derivatives are transformed to Dubiner dofs afterwards.

use crate::basis::eval_dbdx_p1;
use crate::boundary::BcStateFn;
use crate::eos::MaterialEos;
use crate::fields::Fields;
use crate::mesh::geometry::inverse_jacobian;
use crate::mesh::TetMesh;
use crate::state::eval_state;

/// Solve a 3x3 linear system by Cramer's rule. Returns `None` when the
/// determinant underflows (degenerate stencil).
pub fn cramer(a: [[f64; 3]; 3], b: [f64; 3]) -> Option<[f64; 3]> {
    let det = |m: &[[f64; 3]; 3]| {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };
    let d = det(&a);
    if d.abs() < 1.0e-30 {
        return None;
    }
    let mut x = [0.0; 3];
    for i in 0..3 {
        let mut ai = a;
        for row in 0..3 {
            ai[row][i] = b[row];
        }
        x[i] = det(&ai) / d;
    }
    Some(x)
}

/// Accumulate the least-squares left-hand side from all faces: internal
/// faces contribute the centroid offset to both sides, boundary faces the
/// face-centroid offset to their left element.
pub fn lhs_least_sq_p0p1(mesh: &TetMesh, lhs_ls: &mut [[[f64; 3]; 3]]) {
    for f in 0..mesh.nfac() {
        let el = mesh.esuf[2 * f] as usize;
        let er = mesh.esuf[2 * f + 1];

        let right_centroid = if er > -1 {
            mesh.geo_elem[er as usize].centroid
        } else {
            mesh.geo_face[f].centroid
        };

        let cl = mesh.geo_elem[el].centroid;
        let wdeltax = [
            right_centroid[0] - cl[0],
            right_centroid[1] - cl[1],
            right_centroid[2] - cl[2],
        ];

        for idir in 0..3 {
            for jdir in 0..3 {
                lhs_ls[el][idir][jdir] += wdeltax[idir] * wdeltax[jdir];
                if er > -1 {
                    lhs_ls[er as usize][idir][jdir] += wdeltax[idir] * wdeltax[jdir];
                }
            }
        }
    }
}

/// Accumulate internal-face contributions to the least-squares right-hand
/// side for components `range.0 ..= range.1` of `w`.
pub fn int_least_sq_p0p1(
    ncomp: usize,
    rdof: usize,
    mesh: &TetMesh,
    w: &Fields,
    rhs_ls: &mut [Vec<[f64; 3]>],
    range: (usize, usize),
) {
    for f in mesh.nbfac..mesh.nfac() {
        let el = mesh.esuf[2 * f] as usize;
        let er = mesh.esuf[2 * f + 1] as usize;

        let cl = mesh.geo_elem[el].centroid;
        let cr = mesh.geo_elem[er].centroid;
        let wdeltax = [cr[0] - cl[0], cr[1] - cl[1], cr[2] - cl[2]];

        for c in range.0..=range.1.min(ncomp - 1) {
            let mark = c * rdof;
            let du = w.get(er, mark) - w.get(el, mark);
            for idir in 0..3 {
                rhs_ls[el][c][idir] += wdeltax[idir] * du;
                rhs_ls[er][c][idir] += wdeltax[idir] * du;
            }
        }
    }
}

/// Accumulate boundary-face contributions to the right-hand side using the
/// boundary-condition state function at the face centroid.
///
/// `is_conserved` selects whether `w` holds the conserved (true) or the
/// primitive (false) block of the appended state; `nappend` is the size of
/// the other block.
#[allow(clippy::too_many_arguments)]
pub fn bnd_least_sq_p0p1(
    ncomp: usize,
    rdof: usize,
    mesh: &TetMesh,
    mat_blk: &[MaterialEos],
    side_sets: &[i32],
    state_fn: &BcStateFn,
    t: f64,
    w: &Fields,
    rhs_ls: &mut [Vec<[f64; 3]>],
    range: (usize, usize),
    nappend: usize,
    is_conserved: bool,
) {
    for ss in side_sets {
        let Some(faces) = mesh.bface.get(ss) else {
            continue;
        };
        for &f in faces {
            let el = mesh.esuf[2 * f] as usize;
            let gf = &mesh.geo_face[f];

            let b = [1.0];
            let ul = eval_state(ncomp, rdof, 1, el, w, &b, (0, ncomp - 1));

            // consolidate into the appended layout the state function expects
            let mut state = Vec::with_capacity(ncomp + nappend);
            if is_conserved {
                state.extend_from_slice(&ul);
                state.extend(std::iter::repeat(0.0).take(nappend));
            } else {
                state.extend(std::iter::repeat(0.0).take(nappend));
                state.extend_from_slice(&ul);
            }

            let (us_l, us_r) = state_fn(mat_blk, &state, gf.centroid, t, gf.normal);

            let cl = mesh.geo_elem[el].centroid;
            let wdeltax = [
                gf.centroid[0] - cl[0],
                gf.centroid[1] - cl[1],
                gf.centroid[2] - cl[2],
            ];

            let offset = if is_conserved { 0 } else { nappend };
            for c in range.0..=range.1.min(ncomp - 1) {
                let du = us_r[offset + c] - us_l[offset + c];
                for idir in 0..3 {
                    rhs_ls[el][c][idir] += wdeltax[idir] * du;
                }
            }
        }
    }
}

/// Solve the per-element 3x3 systems and store physical derivatives into
/// dofs 1..3 of `w`. Degenerate systems leave the dofs at zero.
pub fn solve_least_sq_p0p1(
    ncomp: usize,
    rdof: usize,
    lhs: &[[[f64; 3]; 3]],
    rhs: &[Vec<[f64; 3]>],
    w: &mut Fields,
    range: (usize, usize),
) {
    for (e, (lhs_e, rhs_e)) in lhs.iter().zip(rhs).enumerate() {
        for c in range.0..=range.1.min(ncomp - 1) {
            let mark = c * rdof;
            match cramer(*lhs_e, rhs_e[c]) {
                Some(ux) => {
                    w.set(e, mark + 1, ux[0]);
                    w.set(e, mark + 2, ux[1]);
                    w.set(e, mark + 3, ux[2]);
                }
                None => {
                    w.set(e, mark + 1, 0.0);
                    w.set(e, mark + 2, 0.0);
                    w.set(e, mark + 3, 0.0);
                }
            }
        }
    }
}

/// Reconstruct the P1 dofs of components `range` of element `e` from the
/// extended nodal stencil (all elements sharing a node with `e`), with
/// inverse-distance weighting.
pub fn reco_least_sq_ext_stencil(
    rdof: usize,
    e: usize,
    mesh: &TetMesh,
    w: &mut Fields,
    range: (usize, usize),
) {
    let ncomp = w.nprop() / rdof;
    let ce = mesh.geo_elem[e].centroid;

    let mut lhs = [[0.0; 3]; 3];
    let mut rhs = vec![[0.0; 3]; ncomp];

    for lp in 0..4 {
        let p = mesh.inpoel[4 * e + lp];
        for &n in &mesh.esup[p] {
            if n == e {
                continue;
            }
            let cn = mesh.geo_elem[n].centroid;
            let dx = [cn[0] - ce[0], cn[1] - ce[1], cn[2] - ce[2]];
            let dist2 = dx[0] * dx[0] + dx[1] * dx[1] + dx[2] * dx[2];
            if dist2 < 1.0e-30 {
                continue;
            }
            // inverse-distance weight applied to row and data alike
            let w2 = 1.0 / dist2;

            for idir in 0..3 {
                for jdir in 0..3 {
                    lhs[idir][jdir] += w2 * dx[idir] * dx[jdir];
                }
            }
            for c in range.0..=range.1.min(ncomp - 1) {
                let mark = c * rdof;
                let du = w.get(n, mark) - w.get(e, mark);
                for idir in 0..3 {
                    rhs[c][idir] += w2 * dx[idir] * du;
                }
            }
        }
    }

    for c in range.0..=range.1.min(ncomp - 1) {
        let mark = c * rdof;
        if let Some(ux) = cramer(lhs, rhs[c]) {
            w.set(e, mark + 1, ux[0]);
            w.set(e, mark + 2, ux[1]);
            w.set(e, mark + 3, ux[2]);
        }
    }
}

/// Transform reconstructed physical derivatives (stored in dofs 1..3) to
/// Dubiner dofs, per element and component range.
pub fn transform_p0p1(
    rdof: usize,
    mesh: &TetMesh,
    w: &mut Fields,
    var_range: &[(usize, usize)],
) {
    let ncomp = w.nprop() / rdof;
    for e in 0..mesh.nelem() {
        let coordel = mesh.coordel(e);
        let jac_inv = inverse_jacobian(&coordel);
        let dbdx = eval_dbdx_p1(rdof.min(4), &jac_inv);

        let range = var_range[e];
        for c in range.0..=range.1.min(ncomp - 1) {
            let mark = c * rdof;
            let rhs = [
                w.get(e, mark + 1),
                w.get(e, mark + 2),
                w.get(e, mark + 3),
            ];
            let a = [
                [dbdx[0][1], dbdx[0][2], dbdx[0][3]],
                [dbdx[1][1], dbdx[1][2], dbdx[1][3]],
                [dbdx[2][1], dbdx[2][2], dbdx[2][3]],
            ];
            if let Some(ux) = cramer(a, rhs) {
                w.set(e, mark + 1, ux[0]);
                w.set(e, mark + 2, ux[1]);
                w.set(e, mark + 3, ux[2]);
            }
        }
    }
}
