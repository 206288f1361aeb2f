//! Lax-Friedrichs flux for multi-material flow, including solid materials.
//!
//! The same central-plus-dissipation construction as Rusanov, but the
//! momentum and energy fluxes carry the full Cauchy traction of solid
//! materials instead of only the hydrodynamic pressure, and the inverse
//! deformation gradient is advected with its exact physical flux. With no
//! solids present this reduces to the fluid flux with isotropic stress.

use super::{deform_flux, get_deform_grad, SideState};
use crate::eos::MaterialEos;
use crate::types::{density_idx, deform_idx, energy_idx, momentum_idx, volfrac_idx};

/// Lax-Friedrichs numerical flux; see [`crate::flux`] for the contract.
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

    // per-material traction vectors sigma . n (deviatoric part of solids)
    let mut sign_l = [0.0; 3];
    let mut sign_r = [0.0; 3];
    let mut asign_l = vec![[0.0; 3]; nmat];
    let mut asign_r = vec![[0.0; 3]; nmat];
    for k in 0..nmat {
        if solidx[k] > 0 {
            let gl = get_deform_grad(nmat, solidx, k, ul);
            let gr = get_deform_grad(nmat, solidx, k, ur);
            let sig_l = mat_blk[k].cauchy_stress(&gl, ul[volfrac_idx(nmat, k)]);
            let sig_r = mat_blk[k].cauchy_stress(&gr, ur[volfrac_idx(nmat, k)]);
            for i in 0..3 {
                for j in 0..3 {
                    asign_l[k][i] += sig_l[i][j] * fnorm[j];
                    asign_r[k][i] += sig_r[i][j] * fnorm[j];
                }
                sign_l[i] += asign_l[k][i];
                sign_r[i] += asign_r[k][i];
            }
        }
    }

    // maximum eigenvalue over both states
    let lambda = l.vn.abs().max(r.vn.abs()) + l.ac.max(r.ac);

    let mut fluxl = vec![0.0; ncomp];
    let mut fluxr = vec![0.0; ncomp];
    for k in 0..nmat {
        fluxl[volfrac_idx(nmat, k)] = l.vn * ul[volfrac_idx(nmat, k)];
        fluxr[volfrac_idx(nmat, k)] = r.vn * ur[volfrac_idx(nmat, k)];
        fluxl[density_idx(nmat, k)] = l.vn * ul[density_idx(nmat, k)];
        fluxr[density_idx(nmat, k)] = r.vn * ur[density_idx(nmat, k)];
        fluxl[energy_idx(nmat, k)] = l.vn * (ul[energy_idx(nmat, k)] + l.pm[k]);
        fluxr[energy_idx(nmat, k)] = r.vn * (ur[energy_idx(nmat, k)] + r.pm[k]);
        for i in 0..3 {
            fluxl[energy_idx(nmat, k)] -= l.vel[i] * asign_l[k][i];
            fluxr[energy_idx(nmat, k)] -= r.vel[i] * asign_r[k][i];
        }

        if solidx[k] > 0 {
            let gl = get_deform_grad(nmat, solidx, k, ul);
            let gr = get_deform_grad(nmat, solidx, k, ur);
            let gfl = deform_flux(&gl, l.vel, fnorm);
            let gfr = deform_flux(&gr, r.vel, fnorm);
            for i in 0..3 {
                for j in 0..3 {
                    fluxl[deform_idx(nmat, solidx[k], i, j)] = gfl[i][j];
                    fluxr[deform_idx(nmat, solidx[k], i, j)] = gfr[i][j];
                }
            }
        }
    }
    for idir in 0..3 {
        fluxl[momentum_idx(nmat, idir)] =
            l.vn * ul[momentum_idx(nmat, idir)] + l.p * fnorm[idir] - sign_l[idir];
        fluxr[momentum_idx(nmat, idir)] =
            r.vn * ur[momentum_idx(nmat, idir)] + r.p * fnorm[idir] - sign_r[idir];
    }

    let mut flx = vec![0.0; ncomp];
    for c in 0..ncomp {
        flx[c] = 0.5 * (fluxl[c] + fluxr[c] - lambda * (ur[c] - ul[c]));
    }

    for k in 0..nmat {
        flx.push(0.5 * (l.pm[k] + r.pm[k]));
    }
    flx.push(0.5 * (l.vn + r.vn));

    flx
}
