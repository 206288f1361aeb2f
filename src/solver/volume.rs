//! Flux-divergence volume integrals.
//!
//! Standard DG volume term: the physical flux contracted against the
//! physical basis gradients, on elements carrying more than one dof. The
//! per-element work is independent, so a parallel variant fans elements out
//! over a rayon pool when the `parallel` feature is enabled.

use crate::basis::{eval_basis, eval_dbdx_p1, eval_dbdx_p2};
use crate::fields::Fields;
use crate::flux::flux_terms;
use crate::mesh::geometry::inverse_jacobian;
use crate::mesh::TetMesh;
use crate::quadrature::{gauss_quadrature_tet, ng_vol};
use crate::state::eval_polynomial_sol;

use super::dof_el;
use super::surface::SurfIntArgs;

/// Compute volume integrals of the conservative flux divergence.
pub fn vol_int(
    args: &SurfIntArgs,
    mesh: &TetMesh,
    u: &Fields,
    p: &Fields,
    ndofel: &[usize],
    r: &mut Fields,
) {
    let nelem = mesh.nelem();
    for (e, row) in r.rows_mut().enumerate().take(nelem) {
        vol_int_element(args, mesh, u, p, ndofel, e, row);
    }
}

/// Parallel variant of [`vol_int`]: elements are the unit of work.
#[cfg(feature = "parallel")]
pub fn vol_int_parallel(
    args: &SurfIntArgs,
    mesh: &TetMesh,
    u: &Fields,
    p: &Fields,
    ndofel: &[usize],
    r: &mut Fields,
) {
    use rayon::prelude::*;

    r.par_rows_mut()
        .enumerate()
        .for_each(|(e, row)| vol_int_element(args, mesh, u, p, ndofel, e, row));
}

/// Accumulate one element's volume term into its RHS row.
fn vol_int_element(
    args: &SurfIntArgs,
    mesh: &TetMesh,
    u: &Fields,
    p: &Fields,
    ndofel: &[usize],
    e: usize,
    row: &mut [f64],
) {
    if ndofel[e] <= 1 {
        return;
    }

    let ncomp = u.nprop() / args.rdof;
    let nprim = p.nprop() / args.rdof;

    let ng = ng_vol(ndofel[e]);
    let (xg, wg) = gauss_quadrature_tet(ng);

    let coordel = mesh.coordel(e);
    let jac_inv = inverse_jacobian(&coordel);
    let mut dbdx = eval_dbdx_p1(ndofel[e], &jac_inv);

    let vol = mesh.geo_elem[e].vol;
    let dof_e = dof_el(args.pref, args.ndof, args.rdof, ndofel[e]);

    for (pg, w) in xg.iter().zip(&wg) {
        if ndofel[e] > 4 {
            eval_dbdx_p2(*pg, &jac_inv, &mut dbdx);
        }

        let b = eval_basis(dof_e, pg[0], pg[1], pg[2]);
        let wt = w * vol;

        let ugp = eval_polynomial_sol(
            args.intsharp,
            args.intsharp_param,
            ncomp,
            nprim,
            args.rdof,
            args.nmat,
            e,
            dof_e,
            mesh,
            *pg,
            &b,
            u,
            p,
        );

        let fl = flux_terms(ncomp, args.nmat, args.solidx, &ugp);

        for (c, fc) in fl.iter().enumerate() {
            let mark = c * args.ndof;
            for idof in 1..ndofel[e] {
                let div: f64 = (0..3).map(|j| fc[j] * dbdx[j][idof]).sum();
                row[mark + idof] += wt * div;
            }
        }
    }
}
