//! Surface integrals over internal faces.
//!
//! Each internal face contributes the Riemann flux to both adjacent
//! elements with opposite signs (the conservative part), and accumulates
//! the Riemann-advected partial pressures and the Riemann normal velocity
//! into the `riemann_deriv` buffers used later by the non-conservative
//! volume terms. Faces are walked in face-id order so that per-element
//! accumulation is reproducible.

use crate::basis::eval_basis;
use crate::eos::MaterialEos;
use crate::fields::Fields;
use crate::flux::RiemannFlux;
use crate::mesh::geometry::{eval_gp_tri, jacobian, ref_coords_tet};
use crate::mesh::TetMesh;
use crate::quadrature::{gauss_quadrature_tri, ng_fa};
use crate::state::eval_polynomial_sol;

use super::dof_el;

/// Arguments shared by the face integrators.
pub struct SurfIntArgs<'a> {
    pub pref: bool,
    pub nmat: usize,
    pub solidx: &'a [usize],
    pub mat_blk: &'a [MaterialEos],
    pub t: f64,
    pub ndof: usize,
    pub rdof: usize,
    pub intsharp: i32,
    pub intsharp_param: f64,
}

/// Compute internal-face surface integrals.
#[allow(clippy::too_many_arguments)]
pub fn surf_int(
    args: &SurfIntArgs,
    mesh: &TetMesh,
    riemann: RiemannFlux,
    u: &Fields,
    p: &Fields,
    ndofel: &[usize],
    r: &mut Fields,
    vriem: &mut [Vec<f64>],
    riemann_loc: &mut [Vec<f64>],
    riemann_deriv: &mut [Vec<f64>],
) {
    let ncomp = u.nprop() / args.rdof;
    let nprim = p.nprop() / args.rdof;

    for f in mesh.nbfac..mesh.nfac() {
        let el = mesh.esuf[2 * f] as usize;
        let er = mesh.esuf[2 * f + 1] as usize;

        // the larger rule when the sides differ in local order
        let ng = ng_fa(ndofel[el]).max(ng_fa(ndofel[er]));
        let (xg, wg) = gauss_quadrature_tri(ng);

        let coordel_l = mesh.coordel(el);
        let coordel_r = mesh.coordel(er);
        let det_l = jacobian(&coordel_l[0], &coordel_l[1], &coordel_l[2], &coordel_l[3]);
        let det_r = jacobian(&coordel_r[0], &coordel_r[1], &coordel_r[2], &coordel_r[3]);
        let coordfa = mesh.coordfa(f);

        let gf = &mesh.geo_face[f];
        let fnorm = gf.normal;

        let dof_l = dof_el(args.pref, args.ndof, args.rdof, ndofel[el]);
        let dof_r = dof_el(args.pref, args.ndof, args.rdof, ndofel[er]);

        for (pg, w) in xg.iter().zip(&wg) {
            let gp = eval_gp_tri(*pg, &coordfa);

            let ref_l = ref_coords_tet(gp, &coordel_l, det_l);
            let ref_r = ref_coords_tet(gp, &coordel_r, det_r);
            let b_l = eval_basis(dof_l, ref_l[0], ref_l[1], ref_l[2]);
            let b_r = eval_basis(dof_r, ref_r[0], ref_r[1], ref_r[2]);

            let wt = w * gf.area;

            let ugp_l = eval_polynomial_sol(
                args.intsharp,
                args.intsharp_param,
                ncomp,
                nprim,
                args.rdof,
                args.nmat,
                el,
                dof_l,
                mesh,
                ref_l,
                &b_l,
                u,
                p,
            );
            let ugp_r = eval_polynomial_sol(
                args.intsharp,
                args.intsharp_param,
                ncomp,
                nprim,
                args.rdof,
                args.nmat,
                er,
                dof_r,
                mesh,
                ref_r,
                &b_r,
                u,
                p,
            );

            let fl = riemann.flux(args.mat_blk, args.solidx, fnorm, &ugp_l, &ugp_r);

            update_rhs_surf(
                ncomp,
                args.nmat,
                args.ndof,
                ndofel[el],
                ndofel[er],
                wt,
                fnorm,
                el,
                er,
                &fl,
                &b_l,
                &b_r,
                r,
                riemann_deriv,
            );

            // sample the Riemann velocity for the in-cell polynomial fit
            if args.ndof > 1 {
                let vn = fl[ncomp + args.nmat];
                for e in [el, er] {
                    vriem[e].extend_from_slice(&[
                        vn * fnorm[0],
                        vn * fnorm[1],
                        vn * fnorm[2],
                    ]);
                    riemann_loc[e].extend_from_slice(&gp);
                }
            }
        }
    }
}

/// Scatter one Gauss point's flux to both sides of an internal face.
#[allow(clippy::too_many_arguments)]
fn update_rhs_surf(
    ncomp: usize,
    nmat: usize,
    ndof: usize,
    ndof_l: usize,
    ndof_r: usize,
    wt: f64,
    fnorm: [f64; 3],
    el: usize,
    er: usize,
    fl: &[f64],
    b_l: &[f64],
    b_r: &[f64],
    r: &mut Fields,
    riemann_deriv: &mut [Vec<f64>],
) {
    for c in 0..ncomp {
        let mark = c * ndof;
        for idof in 0..ndof_l.min(ndof) {
            r.add(el, mark + idof, -wt * fl[c] * b_l[idof]);
        }
        for idof in 0..ndof_r.min(ndof) {
            r.add(er, mark + idof, wt * fl[c] * b_r[idof]);
        }
    }

    // gradients of partial pressures for the energy coupling
    for k in 0..nmat {
        for idir in 0..3 {
            riemann_deriv[3 * k + idir][el] += wt * fl[ncomp + k] * fnorm[idir];
            riemann_deriv[3 * k + idir][er] -= wt * fl[ncomp + k] * fnorm[idir];
        }
    }

    // velocity divergence proxy: the Riemann velocity against the basis
    let vn = fl[ncomp + nmat];
    for idof in 0..ndof_l {
        riemann_deriv[3 * nmat + idof][el] += wt * vn * b_l[idof];
    }
    for idof in 0..ndof_r {
        riemann_deriv[3 * nmat + idof][er] -= wt * vn * b_r[idof];
    }
}
