//! Surface integrals over physical-boundary faces.
//!
//! Boundary faces use the same Riemann machinery as internal faces, with
//! the exterior state produced by the side set's boundary-condition state
//! function. Side-set face lists are walked in input order; each face
//! appears exactly once.

use crate::basis::eval_basis;
use crate::boundary::BcStateFn;
use crate::fields::Fields;
use crate::flux::RiemannFlux;
use crate::mesh::geometry::{eval_gp_tri, jacobian, ref_coords_tet};
use crate::mesh::TetMesh;
use crate::quadrature::{gauss_quadrature_tri, ng_fa};
use crate::state::eval_polynomial_sol;

use super::dof_el;
use super::surface::SurfIntArgs;

/// Compute boundary surface integrals for the side sets of one boundary
/// condition.
#[allow(clippy::too_many_arguments)]
pub fn bnd_surf_int(
    args: &SurfIntArgs,
    mesh: &TetMesh,
    side_sets: &[i32],
    riemann: RiemannFlux,
    state_fn: &BcStateFn,
    u: &Fields,
    p: &Fields,
    ndofel: &[usize],
    r: &mut Fields,
    riemann_deriv: &mut [Vec<f64>],
) {
    let ncomp = u.nprop() / args.rdof;
    let nprim = p.nprop() / args.rdof;

    for ss in side_sets {
        let Some(faces) = mesh.bface.get(ss) else {
            continue;
        };
        for &f in faces {
            debug_assert_eq!(mesh.esuf[2 * f + 1], -1, "boundary face with a right element");
            let el = mesh.esuf[2 * f] as usize;

            let ng = ng_fa(ndofel[el]);
            let (xg, wg) = gauss_quadrature_tri(ng);

            let coordel_l = mesh.coordel(el);
            let det_l = jacobian(&coordel_l[0], &coordel_l[1], &coordel_l[2], &coordel_l[3]);
            let coordfa = mesh.coordfa(f);

            let gf = &mesh.geo_face[f];
            let fnorm = gf.normal;

            let dof_l = dof_el(args.pref, args.ndof, args.rdof, ndofel[el]);

            for (pg, w) in xg.iter().zip(&wg) {
                let gp = eval_gp_tri(*pg, &coordfa);
                let ref_l = ref_coords_tet(gp, &coordel_l, det_l);
                let b_l = eval_basis(dof_l, ref_l[0], ref_l[1], ref_l[2]);

                let wt = w * gf.area;

                let ugp = eval_polynomial_sol(
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

                let (ul, ur) = state_fn(args.mat_blk, &ugp, gp, args.t, fnorm);
                let fl = riemann.flux(args.mat_blk, args.solidx, fnorm, &ul, &ur);

                update_rhs_bc(
                    ncomp,
                    args.nmat,
                    args.ndof,
                    ndofel[el],
                    wt,
                    fnorm,
                    el,
                    &fl,
                    &b_l,
                    r,
                    riemann_deriv,
                );
            }
        }
    }
}

/// Scatter one boundary Gauss point's flux into the left element.
#[allow(clippy::too_many_arguments)]
fn update_rhs_bc(
    ncomp: usize,
    nmat: usize,
    ndof: usize,
    ndof_l: usize,
    wt: f64,
    fnorm: [f64; 3],
    el: usize,
    fl: &[f64],
    b_l: &[f64],
    r: &mut Fields,
    riemann_deriv: &mut [Vec<f64>],
) {
    for c in 0..ncomp {
        let mark = c * ndof;
        for idof in 0..ndof_l.min(ndof) {
            r.add(el, mark + idof, -wt * fl[c] * b_l[idof]);
        }
    }

    for k in 0..nmat {
        for idir in 0..3 {
            riemann_deriv[3 * k + idir][el] += wt * fl[ncomp + k] * fnorm[idir];
        }
    }

    let vn = fl[ncomp + nmat];
    for idof in 0..ndof_l {
        riemann_deriv[3 * nmat + idof][el] += wt * vn * b_l[idof];
    }
}
