//! Rusanov (local Lax-Friedrichs) flux for multi-material flow.
//!
//! Central average of the physical fluxes plus a scalar dissipation at the
//! largest local wave speed. Simple and robust; the most diffusive of the
//! family.

use super::{deform_flux, get_deform_grad, SideState};
use crate::eos::MaterialEos;
use crate::types::{density_idx, deform_idx, energy_idx, momentum_idx, volfrac_idx};

/// Rusanov numerical flux; see [`crate::flux`] for the contract.
pub fn flux(
    mat_blk: &[MaterialEos],
    solidx: &[usize],
    fnorm: [f64; 3],
    ul: &[f64],
    ur: &[f64],
) -> Vec<f64> {
    let nmat = mat_blk.len();
    let ncomp = ul.len() - nmat - 3;

    let l = SideState::new(mat_blk, fnorm, ul, ncomp);
    let r = SideState::new(mat_blk, fnorm, ur, ncomp);

    let lambda = l.vn.abs().max(r.vn.abs()) + l.ac.max(r.ac);

    let mut flx = vec![0.0; ncomp];
    for k in 0..nmat {
        flx[volfrac_idx(nmat, k)] = 0.5
            * (l.vn * ul[volfrac_idx(nmat, k)] + r.vn * ur[volfrac_idx(nmat, k)]
                - lambda * (ur[volfrac_idx(nmat, k)] - ul[volfrac_idx(nmat, k)]));
        flx[density_idx(nmat, k)] = 0.5
            * (l.vn * ul[density_idx(nmat, k)] + r.vn * ur[density_idx(nmat, k)]
                - lambda * (ur[density_idx(nmat, k)] - ul[density_idx(nmat, k)]));
        flx[energy_idx(nmat, k)] = 0.5
            * (l.vn * (ul[energy_idx(nmat, k)] + l.pm[k])
                + r.vn * (ur[energy_idx(nmat, k)] + r.pm[k])
                - lambda * (ur[energy_idx(nmat, k)] - ul[energy_idx(nmat, k)]));

        if solidx[k] > 0 {
            let gl = get_deform_grad(nmat, solidx, k, ul);
            let gr = get_deform_grad(nmat, solidx, k, ur);
            let gfl = deform_flux(&gl, l.vel, fnorm);
            let gfr = deform_flux(&gr, r.vel, fnorm);
            for i in 0..3 {
                for j in 0..3 {
                    let c = deform_idx(nmat, solidx[k], i, j);
                    flx[c] = 0.5 * (gfl[i][j] + gfr[i][j] - lambda * (ur[c] - ul[c]));
                }
            }
        }
    }

    for idir in 0..3 {
        let c = momentum_idx(nmat, idir);
        flx[c] = 0.5
            * (l.vn * ul[c] + r.vn * ur[c] + (l.p + r.p) * fnorm[idir]
                - lambda * (ur[c] - ul[c]));
    }

    for k in 0..nmat {
        flx.push(0.5 * (l.pm[k] + r.pm[k]));
    }
    flx.push(0.5 * (l.vn + r.vn));

    flx
}
