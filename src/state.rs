//! Modal state evaluation at reference points, with optional THINC
//! interface compression for multi-material states.

use crate::basis::{eval_dbdx_p1, eval_dbdx_p2};
use crate::fields::Fields;
use crate::mesh::geometry::{eval_gp_tet, inverse_jacobian};
use crate::mesh::TetMesh;
use crate::types::{density_idx, energy_idx, pressure_idx, volfrac_dof_idx, volfrac_idx};

/// Evaluate the state of components `range.0 ..= range.1` at a point where
/// the basis functions are `b`.
///
/// `state[c] = sum_i U[e][c*rdof + i] * b[i]` over the first `dof_el`
/// modes, summed left to right. Components outside the range are zero; an
/// empty solution vector yields an empty state.
pub fn eval_state(
    ncomp: usize,
    rdof: usize,
    dof_el: usize,
    e: usize,
    u: &Fields,
    b: &[f64],
    range: (usize, usize),
) -> Vec<f64> {
    if ncomp == 0 || u.is_empty() {
        return Vec::new();
    }

    let mut state = vec![0.0; ncomp];
    for c in range.0..=range.1.min(ncomp - 1) {
        let mark = c * rdof;
        let mut s = u.get(e, mark);
        for i in 1..dof_el {
            s += u.get(e, mark + i) * b[i];
        }
        state[c] = s;
    }
    state
}

/// Material-interface indicator from cell-average volume fractions.
///
/// A material is flagged in `mat_int` when its average sits inside the open
/// band `(2 eps, 1 - 2 eps)` with `eps = 1e-8`; the cell is an interface
/// cell when the maximum volume fraction also sits inside that band.
pub fn interface_indicator(nmat: usize, al: &[f64], mat_int: &mut [usize]) -> bool {
    let al_eps = 1.0e-8;
    let lo_lim = 2.0 * al_eps;
    let hi_lim = 1.0 - lo_lim;

    let mut almax = 0.0f64;
    for k in 0..nmat {
        almax = almax.max(al[k]);
        mat_int[k] = usize::from(al[k] > lo_lim && al[k] < hi_lim);
    }

    almax > lo_lim && almax < hi_lim
}

/// Evaluate conserved and primitive states at a reference point of element
/// `e`, returning `ncomp + nprim` entries (primitives appended).
///
/// When `intsharp > 0` and the cell is an interface cell, the volume
/// fractions of interface materials are replaced by a THINC
/// hyperbolic-tangent profile, and partial densities and energies are
/// rebuilt from the compressed fractions so the pure-material density and
/// energy are preserved.
#[allow(clippy::too_many_arguments)]
pub fn eval_polynomial_sol(
    intsharp: i32,
    intsharp_param: f64,
    ncomp: usize,
    nprim: usize,
    rdof: usize,
    nmat: usize,
    e: usize,
    dof_el: usize,
    mesh: &TetMesh,
    ref_gp: [f64; 3],
    b: &[f64],
    u: &Fields,
    p: &Fields,
) -> Vec<f64> {
    let mut state = eval_state(ncomp, rdof, dof_el, e, u, b, (0, ncomp - 1));
    let sprim = eval_state(nprim, rdof, dof_el, e, p, b, (0, nprim - 1));
    state.extend_from_slice(&sprim);

    if intsharp > 0 && rdof > 1 {
        let mut al_avg = vec![0.0; nmat];
        for (k, a) in al_avg.iter_mut().enumerate() {
            *a = u.get(e, volfrac_dof_idx(nmat, k, rdof, 0));
        }
        let mut mat_int = vec![0usize; nmat];
        if interface_indicator(nmat, &al_avg, &mut mat_int) {
            thinc_reco(
                intsharp_param,
                ncomp,
                nprim,
                rdof,
                nmat,
                e,
                mesh,
                ref_gp,
                &al_avg,
                &mat_int,
                u,
                &mut state,
            );
        }
    }

    state
}

/// THINC reconstruction of interface-material volume fractions at one
/// point, with consistent update of partial densities, energies and
/// pressures: the pure-material `rho_k`, `e_k`, `p_k` are preserved while
/// `alpha_k` is compressed.
#[allow(clippy::too_many_arguments)]
fn thinc_reco(
    intsharp_param: f64,
    ncomp: usize,
    nprim: usize,
    rdof: usize,
    nmat: usize,
    e: usize,
    mesh: &TetMesh,
    ref_gp: [f64; 3],
    al_avg: &[f64],
    mat_int: &[usize],
    u: &Fields,
    state: &mut [f64],
) {
    debug_assert!(state.len() >= ncomp + nprim);

    let coordel = mesh.coordel(e);
    let jac_inv = inverse_jacobian(&coordel);
    let ge = &mesh.geo_elem[e];

    let mut dbdx = eval_dbdx_p1(rdof, &jac_inv);
    if rdof > 4 {
        eval_dbdx_p2(ref_gp, &jac_inv, &mut dbdx);
    }

    let gp = eval_gp_tet(ref_gp, &coordel);
    let beta = intsharp_param;

    let mut sum_poly = 0.0;
    let mut sum_thinc = 0.0;
    let mut al_new = vec![0.0; nmat];

    for k in 0..nmat {
        let al_poly = state[volfrac_idx(nmat, k)];
        al_new[k] = al_poly;
        if mat_int[k] == 0 {
            continue;
        }

        // interface normal from the reconstructed volume-fraction gradient
        let mut grad = [0.0; 3];
        for (idir, g) in grad.iter_mut().enumerate() {
            for idof in 1..rdof {
                *g += u.get(e, volfrac_dof_idx(nmat, k, rdof, idof)) * dbdx[idir][idof];
            }
        }
        let norm = (grad[0] * grad[0] + grad[1] * grad[1] + grad[2] * grad[2]).sqrt();
        if norm < 1.0e-30 {
            continue;
        }

        // signed distance along the normal, normalized to the unit cell
        let s = ((gp[0] - ge.centroid[0]) * grad[0]
            + (gp[1] - ge.centroid[1]) * grad[1]
            + (gp[2] - ge.centroid[2]) * grad[2])
            / (norm * ge.h)
            + 0.5;

        // tanh-profile center from the cell-average constraint
        let albar = al_avg[k].clamp(1.0e-12, 1.0 - 1.0e-12);
        let t = ((beta.cosh() - (beta * (2.0 * albar - 1.0)).exp()) / beta.sinh())
            .clamp(-1.0 + 1.0e-12, 1.0 - 1.0e-12);
        let center = t.atanh() / beta;

        al_new[k] = 0.5 * (1.0 + (beta * (s - center)).tanh());
        sum_poly += al_poly;
        sum_thinc += al_new[k];
    }

    if sum_thinc <= 0.0 {
        return;
    }

    // preserve the in-cell sum of the compressed fractions
    let scale = sum_poly / sum_thinc;

    for k in 0..nmat {
        if mat_int[k] == 0 {
            continue;
        }
        let al_poly = state[volfrac_idx(nmat, k)].max(1.0e-14);
        let al = (al_new[k] * scale).clamp(1.0e-14, 1.0 - 1.0e-14);

        let rho_k = state[density_idx(nmat, k)] / al_poly;
        let rho_e_k = state[energy_idx(nmat, k)] / al_poly;
        let p_k = state[ncomp + pressure_idx(nmat, k)] / al_poly;

        state[volfrac_idx(nmat, k)] = al;
        state[density_idx(nmat, k)] = al * rho_k;
        state[energy_idx(nmat, k)] = al * rho_e_k;
        state[ncomp + pressure_idx(nmat, k)] = al * p_k;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::eval_basis;

    #[test]
    fn test_eval_state_is_modal_sum() {
        let rdof = 4;
        let mut u = Fields::new(1, 2 * rdof);
        for i in 0..2 * rdof {
            u.set(0, i, (i + 1) as f64);
        }
        let b = eval_basis(rdof, 0.3, 0.2, 0.1);
        let s = eval_state(2, rdof, rdof, 0, &u, &b, (0, 1));
        let expect0: f64 = (0..rdof).map(|i| (i + 1) as f64 * b[i]).sum();
        let expect1: f64 = (0..rdof).map(|i| (i + 5) as f64 * b[i]).sum();
        assert!((s[0] - expect0).abs() < 1e-14);
        assert!((s[1] - expect1).abs() < 1e-14);
    }

    #[test]
    fn test_eval_state_range_zeroes_outside() {
        let rdof = 4;
        let mut u = Fields::new(1, 3 * rdof);
        u.fill(2.0);
        let b = eval_basis(rdof, 0.25, 0.25, 0.25);
        let s = eval_state(3, rdof, rdof, 0, &u, &b, (1, 1));
        assert_eq!(s[0], 0.0);
        assert!(s[1] != 0.0);
        assert_eq!(s[2], 0.0);
    }

    #[test]
    fn test_empty_solution_gives_empty_state() {
        let u = Fields::new(0, 0);
        let b = [1.0];
        assert!(eval_state(0, 1, 1, 0, &u, &b, (0, 0)).is_empty());
    }

    #[test]
    fn test_interface_indicator_bands() {
        let mut mat_int = vec![0usize; 2];
        // clean single-material cell: no interface
        assert!(!interface_indicator(2, &[1.0 - 1e-12, 1e-12], &mut mat_int));
        assert_eq!(mat_int, vec![0, 0]);
        // mixed cell: both materials interfacial
        assert!(interface_indicator(2, &[0.4, 0.6], &mut mat_int));
        assert_eq!(mat_int, vec![1, 1]);
        // trace third material stays unflagged
        let mut m3 = vec![0usize; 3];
        assert!(interface_indicator(3, &[0.5, 0.5 - 1e-9, 1e-9], &mut m3));
        assert_eq!(m3, vec![1, 1, 0]);
    }

    #[test]
    fn test_thinc_preserves_material_density_and_energy() {
        use crate::types::{density_dof_idx, energy_dof_idx, volfrac_dof_idx};

        let mesh = TetMesh::boxmesh(1, 1, 1, [0.0, 1.0], [0.0, 1.0], [0.0, 1.0]);
        let (nmat, rdof) = (2, 4);
        let ncomp = crate::types::ncomp(nmat, 0);
        let nprim = crate::types::nprim(nmat);
        let mut u = Fields::new(mesh.nelem(), ncomp * rdof);
        let p = Fields::new(mesh.nelem(), nprim * rdof);

        let e = 0;
        // a mixed cell with an alpha slope in x
        let (al0, rho0, rho1, re0, re1) = (0.4, 1000.0, 1.0, 2.0e6, 2.5e5);
        u.set(e, volfrac_dof_idx(nmat, 0, rdof, 0), al0);
        u.set(e, volfrac_dof_idx(nmat, 0, rdof, 1), 0.1);
        u.set(e, volfrac_dof_idx(nmat, 1, rdof, 0), 1.0 - al0);
        u.set(e, volfrac_dof_idx(nmat, 1, rdof, 1), -0.1);
        u.set(e, density_dof_idx(nmat, 0, rdof, 0), al0 * rho0);
        u.set(e, density_dof_idx(nmat, 1, rdof, 0), (1.0 - al0) * rho1);
        u.set(e, energy_dof_idx(nmat, 0, rdof, 0), al0 * re0);
        u.set(e, energy_dof_idx(nmat, 1, rdof, 0), (1.0 - al0) * re1);

        let b = eval_basis(rdof, 0.3, 0.3, 0.2);
        let state = eval_polynomial_sol(
            1, 1.8, ncomp, nprim, rdof, nmat, e, rdof, &mesh, [0.3, 0.3, 0.2], &b, &u, &p,
        );

        // pure-material density is preserved through the compression
        let al_c = state[volfrac_idx(nmat, 0)];
        let rho_c = state[density_idx(nmat, 0)] / al_c;
        let re_c = state[energy_idx(nmat, 0)] / al_c;
        assert!((rho_c - rho0).abs() < 1e-9 * rho0);
        assert!((re_c - re0).abs() < 1e-9 * re0);
        assert!(al_c > 0.0 && al_c < 1.0);
    }

    #[test]
    fn test_thinc_skipped_for_clean_cells() {
        use crate::types::{density_dof_idx, volfrac_dof_idx};

        let mesh = TetMesh::boxmesh(1, 1, 1, [0.0, 1.0], [0.0, 1.0], [0.0, 1.0]);
        let (nmat, rdof) = (2, 4);
        let ncomp = crate::types::ncomp(nmat, 0);
        let nprim = crate::types::nprim(nmat);
        let mut u = Fields::new(mesh.nelem(), ncomp * rdof);
        let p = Fields::new(mesh.nelem(), nprim * rdof);

        let e = 0;
        u.set(e, volfrac_dof_idx(nmat, 0, rdof, 0), 1.0 - 1e-12);
        u.set(e, volfrac_dof_idx(nmat, 0, rdof, 1), 1e-13);
        u.set(e, volfrac_dof_idx(nmat, 1, rdof, 0), 1e-12);
        u.set(e, density_dof_idx(nmat, 0, rdof, 0), 1.2);

        let b = eval_basis(rdof, 0.25, 0.25, 0.25);
        let with = eval_polynomial_sol(
            1, 1.8, ncomp, nprim, rdof, nmat, e, rdof, &mesh, [0.25, 0.25, 0.25], &b, &u, &p,
        );
        let without = eval_polynomial_sol(
            0, 1.8, ncomp, nprim, rdof, nmat, e, rdof, &mesh, [0.25, 0.25, 0.25], &b, &u, &p,
        );
        for (a, b) in with.iter().zip(&without) {
            assert_eq!(a, b);
        }
    }
}
