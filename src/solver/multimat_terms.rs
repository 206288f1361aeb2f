//! Volume integrals of the multi-material coupling terms.
//!
//! The volume-fraction equations and the material-energy equations carry
//! non-conservative products that cannot be written as divergences: the
//! compaction term `alpha_k div(v)` and the pressure-work exchange
//! `-v . (Y_k grad(p) - grad(alpha p)_k)`. Their face data comes from the
//! Riemann solver (accumulated into `riemann_deriv` by the surface
//! integrals); the in-cell velocity is a least-squares trilinear fit of the
//! Riemann face velocities. Finite-rate pressure relaxation is an ordinary
//! source term.
//!
//! Reference: Pelanti & Shyue (2019), A numerical model for multiphase
//! liquid-vapor-gas flows with interfaces and cavitation, Int. J.
//! Multiphase Flow 113.

use faer::prelude::SpSolver;
use faer::Mat;

use crate::basis::{eval_basis, eval_dbdx_p1, eval_dbdx_p2};
use crate::eos::MaterialEos;
use crate::fields::Fields;
use crate::mesh::geometry::{eval_gp_tet, inverse_jacobian};
use crate::mesh::TetMesh;
use crate::quadrature::{gauss_quadrature_tet, ng_vol};
use crate::state::eval_state;
use crate::types::{
    density_idx, energy_idx, pressure_idx, velocity_idx, volfrac_idx,
};

use super::dof_el;

/// Compute volume integrals of the non-conservative terms.
#[allow(clippy::too_many_arguments)]
pub fn non_conservative_int(
    pref: bool,
    nmat: usize,
    ndof: usize,
    rdof: usize,
    mesh: &TetMesh,
    u: &Fields,
    p: &Fields,
    riemann_deriv: &[Vec<f64>],
    vriempoly: &[Vec<f64>],
    ndofel: &[usize],
    r: &mut Fields,
) {
    let ncomp = u.nprop() / rdof;
    let nprim = p.nprop() / rdof;

    for e in 0..mesh.nelem() {
        let ng = ng_vol(ndofel[e]);
        let (xg, wg) = gauss_quadrature_tet(ng);

        let coordel = mesh.coordel(e);
        let jac_inv = inverse_jacobian(&coordel);
        let mut dbdx = if ndofel[e] > 1 {
            eval_dbdx_p1(ndofel[e], &jac_inv)
        } else {
            [vec![0.0; 1], vec![0.0; 1], vec![0.0; 1]]
        };

        let vol = mesh.geo_elem[e].vol;

        for (pg, w) in xg.iter().zip(&wg) {
            if ndofel[e] > 4 {
                eval_dbdx_p2(*pg, &jac_inv, &mut dbdx);
            }

            let dof_e = dof_el(pref, ndof, rdof, ndofel[e]);
            let b = eval_basis(dof_e, pg[0], pg[1], pg[2]);
            let wt = w * vol;

            let ugp = eval_state(ncomp, rdof, dof_e, e, u, &b, (0, ncomp - 1));
            let pgp = eval_state(nprim, rdof, dof_e, e, p, &b, (0, nprim - 1));

            let mut rhob = 0.0;
            for k in 0..nmat {
                rhob += ugp[density_idx(nmat, k)];
            }

            let vel = [
                pgp[velocity_idx(nmat, 0)],
                pgp[velocity_idx(nmat, 1)],
                pgp[velocity_idx(nmat, 2)],
            ];

            // bulk pressure gradient from the Riemann partial pressures
            let mut ymat = vec![0.0; nmat];
            let mut dap = [0.0; 3];
            for (k, y) in ymat.iter_mut().enumerate() {
                *y = ugp[density_idx(nmat, k)] / rhob;
                for (idir, d) in dap.iter_mut().enumerate() {
                    *d += riemann_deriv[3 * k + idir][e];
                }
            }

            // cell-mean non-conservative terms
            let mut ncf = vec![0.0; ncomp];
            for k in 0..nmat {
                ncf[volfrac_idx(nmat, k)] =
                    ugp[volfrac_idx(nmat, k)] * riemann_deriv[3 * nmat][e];
                for idir in 0..3 {
                    ncf[energy_idx(nmat, k)] -=
                        vel[idir] * (ymat[k] * dap[idir] - riemann_deriv[3 * k + idir][e]);
                }
            }

            // in-cell Riemann velocity from the trilinear fit
            let mut vriem = [0.0; 3];
            if ndofel[e] > 1 {
                let gp = eval_gp_tet(*pg, &coordel);
                for (idir, v) in vriem.iter_mut().enumerate() {
                    let mark = idir * 4;
                    *v = vriempoly[e][mark];
                    for d in 0..3 {
                        *v += vriempoly[e][mark + 1 + d] * gp[d];
                    }
                }
            }

            update_rhs_ncn(
                ncomp, nmat, ndof, ndofel[e], wt, e, &ugp, &b, &dbdx, riemann_deriv, &vriem,
                &ncf, r,
            );
        }
    }
}

/// Add one Gauss point's non-conservative contributions to the RHS.
#[allow(clippy::too_many_arguments)]
fn update_rhs_ncn(
    ncomp: usize,
    nmat: usize,
    ndof: usize,
    ndof_el: usize,
    wt: f64,
    e: usize,
    ugp: &[f64],
    b: &[f64],
    dbdx: &[Vec<f64>; 3],
    riemann_deriv: &[Vec<f64>],
    vriem: &[f64; 3],
    ncf: &[f64],
    r: &mut Fields,
) {
    for c in 0..ncomp {
        r.add(e, c * ndof, wt * ncf[c]);
    }

    if ndof_el > 1 {
        // volume-fraction equations: the mean divergence against the basis
        // plus the fitted Riemann velocity against the basis gradient
        for k in 0..nmat {
            let mark = volfrac_idx(nmat, k) * ndof;
            let al = ugp[volfrac_idx(nmat, k)];
            for idof in 1..ndof_el.min(ndof) {
                let adv: f64 = (0..3).map(|d| vriem[d] * dbdx[d][idof]).sum();
                r.add(
                    e,
                    mark + idof,
                    wt * al * (riemann_deriv[3 * nmat][e] * b[idof] + adv),
                );
            }
        }

        // remaining components: project the pointwise term
        for c in nmat..ncomp {
            let mark = c * ndof;
            for idof in 1..ndof_el.min(ndof) {
                r.add(e, mark + idof, wt * ncf[c] * b[idof]);
            }
        }
    }
}

/// Compute volume integrals of the finite-rate pressure relaxation source.
#[allow(clippy::too_many_arguments)]
pub fn pressure_relaxation_int(
    pref: bool,
    nmat: usize,
    mat_blk: &[MaterialEos],
    ndof: usize,
    rdof: usize,
    mesh: &TetMesh,
    u: &Fields,
    p: &Fields,
    ndofel: &[usize],
    ct: f64,
    r: &mut Fields,
) {
    let ncomp = u.nprop() / rdof;
    let nprim = p.nprop() / rdof;

    for e in 0..mesh.nelem() {
        let dx = mesh.geo_elem[e].h / 2.0;
        let ng = ng_vol(ndofel[e]);
        let (xg, wg) = gauss_quadrature_tet(ng);
        let vol = mesh.geo_elem[e].vol;

        for (pg, w) in xg.iter().zip(&wg) {
            let dof_e = dof_el(pref, ndof, rdof, ndofel[e]);
            let b = eval_basis(dof_e, pg[0], pg[1], pg[2]);
            let wt = w * vol;

            let ugp = eval_state(ncomp, rdof, dof_e, e, u, &b, (0, ncomp - 1));
            let pgp = eval_state(nprim, rdof, dof_e, e, p, &b, (0, nprim - 1));

            // equilibrium pressure and relaxation time from the material
            // bulk moduli
            let mut pb = 0.0;
            let mut nume = 0.0;
            let mut deno = 0.0;
            let mut trelax: f64 = 0.0;
            let mut apmat = vec![0.0; nmat];
            let mut kmat = vec![0.0; nmat];
            for (k, mat) in mat_blk.iter().enumerate() {
                let arhomat = ugp[density_idx(nmat, k)];
                let alphamat = ugp[volfrac_idx(nmat, k)];
                apmat[k] = pgp[pressure_idx(nmat, k)];
                let amat = mat.soundspeed(arhomat, apmat[k], alphamat);
                kmat[k] = arhomat * amat * amat;
                pb += apmat[k];

                trelax = trelax.max(ct * dx / amat);
                nume += alphamat * apmat[k] / kmat[k];
                deno += alphamat * alphamat / kmat[k];
            }
            let p_relax = nume / deno;

            let mut s_prelax = vec![0.0; ncomp];
            for k in 0..nmat {
                let al = ugp[volfrac_idx(nmat, k)];
                let s_alpha = (apmat[k] - p_relax * al) * (al / kmat[k]) / trelax;
                s_prelax[volfrac_idx(nmat, k)] = s_alpha;
                s_prelax[energy_idx(nmat, k)] = -pb * s_alpha;
            }

            for c in 0..ncomp {
                let mark = c * ndof;
                r.add(e, mark, wt * s_prelax[c]);
                if ndofel[e] > 1 {
                    for idof in 1..ndofel[e].min(ndof) {
                        r.add(e, mark + idof, wt * s_prelax[c] * b[idof]);
                    }
                }
            }
        }
    }
}

/// Fit the per-element trilinear Riemann-velocity polynomial
/// `v(x) = a0 + a . x` from the face-sample collections, by normal
/// equations solved with an LU factorization.
///
/// Elements with fewer than four samples (isolated boundary corners) keep a
/// zero polynomial.
pub fn solve_vriem(
    nelem: usize,
    vriem: &[Vec<f64>],
    xcoord: &[Vec<f64>],
) -> Vec<Vec<f64>> {
    let mut vriempoly = vec![vec![0.0; 12]; nelem];

    for e in 0..nelem {
        let npoin = xcoord[e].len() / 3;
        if npoin < 4 {
            continue;
        }

        // normal matrix of the [1 x y z] design rows
        let mut bmat = Mat::<f64>::zeros(4, 4);
        for k in 0..npoin {
            let row = [
                1.0,
                xcoord[e][3 * k],
                xcoord[e][3 * k + 1],
                xcoord[e][3 * k + 2],
            ];
            for i in 0..4 {
                for j in 0..4 {
                    bmat[(i, j)] += row[i] * row[j];
                }
            }
        }
        let lu = bmat.as_ref().full_piv_lu();

        for idir in 0..3 {
            let mut rhs = Mat::<f64>::zeros(4, 1);
            for k in 0..npoin {
                let v = vriem[e][3 * k + idir];
                let row = [
                    1.0,
                    xcoord[e][3 * k],
                    xcoord[e][3 * k + 1],
                    xcoord[e][3 * k + 2],
                ];
                for i in 0..4 {
                    rhs[(i, 0)] += row[i] * v;
                }
            }
            let x = lu.solve(&rhs);
            for k in 0..4 {
                vriempoly[e][idir * 4 + k] = x[(k, 0)];
            }
        }
    }

    vriempoly
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_vriem_fits_linear_velocity() {
        // samples of v(x) = (1 + 2x - y, -3 + z, 0.5 x) at scattered points
        let pts = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.5, 0.5, 0.0],
            [0.3, 0.1, 0.7],
        ];
        let vf = |x: &[f64; 3]| {
            [
                1.0 + 2.0 * x[0] - x[1],
                -3.0 + x[2],
                0.5 * x[0],
            ]
        };

        let mut vriem = vec![Vec::new()];
        let mut loc = vec![Vec::new()];
        for p in &pts {
            vriem[0].extend_from_slice(&vf(p));
            loc[0].extend_from_slice(p);
        }

        let poly = solve_vriem(1, &vriem, &loc);
        let expect = [
            [1.0, 2.0, -1.0, 0.0],
            [-3.0, 0.0, 0.0, 1.0],
            [0.0, 0.5, 0.0, 0.0],
        ];
        for idir in 0..3 {
            for k in 0..4 {
                assert!(
                    (poly[0][idir * 4 + k] - expect[idir][k]).abs() < 1e-10,
                    "dir {idir} coeff {k}: {} vs {}",
                    poly[0][idir * 4 + k],
                    expect[idir][k]
                );
            }
        }
    }

    #[test]
    fn test_solve_vriem_skips_underdetermined() {
        let vriem = vec![vec![1.0, 0.0, 0.0]];
        let loc = vec![vec![0.5, 0.5, 0.5]];
        let poly = solve_vriem(1, &vriem, &loc);
        assert!(poly[0].iter().all(|&c| c == 0.0));
    }
}
