//! Trace-material cleanup and post-limiting conservative correction.
//!
//! Shocks passing through cells that contain a whiff of another material
//! can leave that trace material in an unphysical state. The cleanup
//! replaces the thermodynamic state of materials below a volume-fraction
//! threshold (or with negative effective pressure) by the majority
//! material's pressure, fluxing the energy difference into the majority
//! material so bulk invariants are conserved, then renormalizes the
//! fraction sum to one. A partial density still negative afterwards is a
//! fatal numerical failure.

use log::error;

use crate::eos::MaterialEos;
use crate::error::MultiMatError;
use crate::fields::Fields;
use crate::mesh::TetMesh;
use crate::quadrature::{gauss_quadrature_tet, ng_vol};
use crate::state::eval_state;
use crate::types::{
    density_dof_idx, density_idx, energy_dof_idx, energy_idx, mat_exists, momentum_dof_idx,
    pressure_dof_idx, pressure_idx, velocity_dof_idx, velocity_idx, volfrac_dof_idx, volfrac_idx,
};
use crate::basis::{eval_basis, mass_matrix_dubiner};

/// Volume fraction below which a material counts as trace.
const AL_EPS: f64 = 1.0e-2;

/// Clean up trace-material states in every element.
///
/// Returns an error when any partial density is negative after the
/// cleanup, or when a solid material's inverse deformation gradient loses
/// invertibility; the computation must not continue past either.
#[allow(clippy::too_many_arguments)]
pub fn clean_trace_multimat(
    nelem: usize,
    mat_blk: &[MaterialEos],
    solidx: &[usize],
    geo_elem: &[crate::mesh::GeoElem],
    nmat: usize,
    rdof: usize,
    u: &mut Fields,
    p: &mut Fields,
) -> Result<(), MultiMatError> {
    for e in 0..nelem {
        // majority material
        let mut almax = 0.0;
        let mut kmax = 0;
        for k in 0..nmat {
            let al = u.get(e, volfrac_dof_idx(nmat, k, rdof, 0));
            if al > almax {
                almax = al;
                kmax = k;
            }
        }

        let uvel = p.get(e, velocity_dof_idx(nmat, 0, rdof, 0));
        let vvel = p.get(e, velocity_dof_idx(nmat, 1, rdof, 0));
        let wvel = p.get(e, velocity_dof_idx(nmat, 2, rdof, 0));
        let pmax = p.get(e, pressure_dof_idx(nmat, kmax, rdof, 0)) / almax;
        let tmax = mat_blk[kmax].temperature(
            u.get(e, density_dof_idx(nmat, kmax, rdof, 0)),
            uvel,
            vvel,
            wvel,
            u.get(e, energy_dof_idx(nmat, kmax, rdof, 0)),
            almax,
        );

        let p_target = pmax.max(1.0e-14);
        let mut d_al = 0.0;
        let mut d_are = 0.0;

        // correct minority materials, tracking the changes to flux into
        // the majority material
        for (k, mat) in mat_blk.iter().enumerate() {
            let alk = u.get(e, volfrac_dof_idx(nmat, k, rdof, 0));
            let pk = p.get(e, pressure_dof_idx(nmat, k, rdof, 0)) / alk;
            let pck = -mat.min_eff_pressure(0.0);

            if mat_exists(alk) {
                if alk < AL_EPS || pk + pck < 0.0 {
                    // reset to the majority pressure, keeping the partial
                    // density and velocity
                    let rhok = u.get(e, density_dof_idx(nmat, k, rdof, 0)) / alk;
                    let rhoe_new = mat.total_energy(rhok, uvel, vvel, wvel, p_target);

                    d_are += u.get(e, energy_dof_idx(nmat, k, rdof, 0)) - alk * rhoe_new;

                    u.set(e, energy_dof_idx(nmat, k, rdof, 0), alk * rhoe_new);
                    p.set(e, pressure_dof_idx(nmat, k, rdof, 0), alk * p_target);
                    for i in 1..rdof {
                        u.set(e, energy_dof_idx(nmat, k, rdof, i), 0.0);
                        p.set(e, pressure_dof_idx(nmat, k, rdof, i), 0.0);
                    }
                }
            } else if alk < 0.0 {
                // unbounded fraction: rebuild the material at the majority
                // temperature with a floor fraction
                let rhok = mat.density(p_target, tmax);
                d_al += alk - 1.0e-14;
                u.set(e, volfrac_dof_idx(nmat, k, rdof, 0), 1.0e-14);
                u.set(e, density_dof_idx(nmat, k, rdof, 0), 1.0e-14 * rhok);
                u.set(
                    e,
                    energy_dof_idx(nmat, k, rdof, 0),
                    1.0e-14 * mat.total_energy(rhok, uvel, vvel, wvel, p_target),
                );
                p.set(e, pressure_dof_idx(nmat, k, rdof, 0), 1.0e-14 * p_target);
                for i in 1..rdof {
                    u.set(e, volfrac_dof_idx(nmat, k, rdof, i), 0.0);
                    u.set(e, density_dof_idx(nmat, k, rdof, i), 0.0);
                    u.set(e, energy_dof_idx(nmat, k, rdof, i), 0.0);
                    p.set(e, pressure_dof_idx(nmat, k, rdof, i), 0.0);
                }
            } else {
                // tiny but positive: relax to the target pressure
                let rhok = u.get(e, density_dof_idx(nmat, k, rdof, 0)) / alk;
                u.set(
                    e,
                    energy_dof_idx(nmat, k, rdof, 0),
                    alk * mat.total_energy(rhok, uvel, vvel, wvel, p_target),
                );
                p.set(e, pressure_dof_idx(nmat, k, rdof, 0), alk * p_target);
                for i in 1..rdof {
                    u.set(e, energy_dof_idx(nmat, k, rdof, i), 0.0);
                    p.set(e, pressure_dof_idx(nmat, k, rdof, i), 0.0);
                }
            }
        }

        // flux the volume and energy changes into the majority material
        let v = u.get(e, volfrac_dof_idx(nmat, kmax, rdof, 0));
        u.set(e, volfrac_dof_idx(nmat, kmax, rdof, 0), v + d_al);
        let en = u.get(e, energy_dof_idx(nmat, kmax, rdof, 0));
        u.set(e, energy_dof_idx(nmat, kmax, rdof, 0), en + d_are);
        let apr = mat_blk[kmax].pressure(
            u.get(e, density_dof_idx(nmat, kmax, rdof, 0)),
            uvel,
            vvel,
            wvel,
            u.get(e, energy_dof_idx(nmat, kmax, rdof, 0)),
            u.get(e, volfrac_dof_idx(nmat, kmax, rdof, 0)),
        );
        p.set(e, pressure_dof_idx(nmat, kmax, rdof, 0), apr);

        // enforce the unit sum of volume fractions
        let mut alsum = 0.0;
        for k in 0..nmat {
            alsum += u.get(e, volfrac_dof_idx(nmat, k, rdof, 0));
        }
        for k in 0..nmat {
            for idx in [
                volfrac_dof_idx(nmat, k, rdof, 0),
                density_dof_idx(nmat, k, rdof, 0),
                energy_dof_idx(nmat, k, rdof, 0),
            ] {
                let v = u.get(e, idx);
                u.set(e, idx, v / alsum);
            }
            let v = p.get(e, pressure_dof_idx(nmat, k, rdof, 0));
            p.set(e, pressure_dof_idx(nmat, k, rdof, 0), v / alsum);
        }

        let pmax = p.get(e, pressure_dof_idx(nmat, kmax, rdof, 0))
            / u.get(e, volfrac_dof_idx(nmat, kmax, rdof, 0));

        // fatal checks
        for k in 0..nmat {
            let alpha = u.get(e, volfrac_dof_idx(nmat, k, rdof, 0));
            let arho = u.get(e, density_dof_idx(nmat, k, rdof, 0));
            let apr = p.get(e, pressure_dof_idx(nmat, k, rdof, 0));
            if arho < 0.0 {
                let err = MultiMatError::NegativeDensity {
                    element: e,
                    centroid: geo_elem[e].centroid,
                    material: k,
                    alpha,
                    partial_density: arho,
                    partial_pressure: apr,
                    majority_pressure: pmax,
                    majority_temperature: tmax,
                    velocity: [uvel, vvel, wvel],
                };
                error!("{err}");
                return Err(err);
            }

            if solidx[k] > 0 {
                let mut g = [[0.0; 3]; 3];
                for (i, row) in g.iter_mut().enumerate() {
                    for (j, gij) in row.iter_mut().enumerate() {
                        *gij = u.get(e, deform_dof_idx(nmat, solidx[k], i, j, rdof));
                    }
                }
                let detg = g[0][0] * (g[1][1] * g[2][2] - g[1][2] * g[2][1])
                    - g[0][1] * (g[1][0] * g[2][2] - g[1][2] * g[2][0])
                    + g[0][2] * (g[1][0] * g[2][1] - g[1][1] * g[2][0]);
                if detg <= 0.0 {
                    let err = MultiMatError::DegenerateDeformation {
                        element: e,
                        material: k,
                        detg,
                    };
                    error!("{err}");
                    return Err(err);
                }
            }
        }
    }

    Ok(())
}

/// Modal-coefficient index of the cell mean of deformation entry `(i,j)`.
#[inline]
fn deform_dof_idx(nmat: usize, ksld: usize, i: usize, j: usize, rdof: usize) -> usize {
    crate::types::deform_idx(nmat, ksld, i, j) * rdof
}

/// Re-project material energies and bulk momentum so the independently
/// limited primitives and conserved quantities agree.
///
/// The limited primitives are evaluated at volume quadrature points; the
/// consistent energies and momentum are projected back through the
/// diagonal Dubiner mass matrix onto the high-order dofs. Cell means stay
/// untouched, so conservation is exact.
pub fn correct_lim_conserv_multimat(
    mesh: &TetMesh,
    mat_blk: &[MaterialEos],
    nmat: usize,
    rdof: usize,
    prim: &Fields,
    u: &mut Fields,
) {
    let ncomp = u.nprop() / rdof;
    let nprim = prim.nprop() / rdof;
    if rdof == 1 {
        return;
    }

    let ng = ng_vol(rdof);
    let (xg, wg) = gauss_quadrature_tet(ng);

    for e in 0..mesh.nelem() {
        let vol = mesh.geo_elem[e].vol;
        let l = mass_matrix_dubiner(rdof, vol);

        let mut rhs = vec![0.0; (nmat + 3) * rdof];

        for (pg, w) in xg.iter().zip(&wg) {
            let b = eval_basis(rdof, pg[0], pg[1], pg[2]);
            let wt = w * vol;

            let ugp = eval_state(ncomp, rdof, rdof, e, u, &b, (0, ncomp - 1));
            let pgp = eval_state(nprim, rdof, rdof, e, prim, &b, (0, nprim - 1));

            let mut rhob = 0.0;
            for k in 0..nmat {
                rhob += ugp[density_idx(nmat, k)];
            }
            let vel = [
                pgp[velocity_idx(nmat, 0)],
                pgp[velocity_idx(nmat, 1)],
                pgp[velocity_idx(nmat, 2)],
            ];

            // pointwise consistent material energies and bulk momentum
            let mut s = vec![0.0; nmat + 3];
            for (k, mat) in mat_blk.iter().enumerate() {
                let alpha = ugp[volfrac_idx(nmat, k)];
                let rhok = ugp[density_idx(nmat, k)] / alpha;
                let pk = pgp[pressure_idx(nmat, k)] / alpha;
                s[k] = alpha * mat.total_energy(rhok, vel[0], vel[1], vel[2], pk);
            }
            for idir in 0..3 {
                s[nmat + idir] = rhob * vel[idir];
            }

            for (kc, sv) in s.iter().enumerate() {
                let mark = kc * rdof;
                for (idof, bi) in b.iter().enumerate() {
                    rhs[mark + idof] += wt * sv * bi;
                }
            }
        }

        // overwrite only the high-order dofs
        for k in 0..nmat {
            let mark = k * rdof;
            for idof in 1..rdof {
                u.set(e, energy_dof_idx(nmat, k, rdof, idof), rhs[mark + idof] / l[idof]);
            }
        }
        for idir in 0..3 {
            let mark = (nmat + idir) * rdof;
            for idof in 1..rdof {
                u.set(
                    e,
                    momentum_dof_idx(nmat, idir, rdof, idof),
                    rhs[mark + idof] / l[idof],
                );
            }
        }
    }
}
