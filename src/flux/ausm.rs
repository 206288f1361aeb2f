//! AUSM+up flux for multi-material flow.
//!
//! Advection Upstream Splitting Method with the low-Mach pressure and
//! velocity diffusion terms. The interface Mach number is built from split
//! Mach polynomials of the face-normal Mach numbers on both sides; all
//! advected quantities upwind with the resulting interface velocity, while
//! the pressure flux uses the split pressure polynomials.
//!
//! Reference: Liou, M. S. (2006). A sequel to AUSM, Part II: AUSM+-up for
//! all speeds. Journal of Computational Physics, 214(1), 137-170.

use super::{deform_flux, get_deform_grad, SideState};
use crate::eos::MaterialEos;
use crate::types::{density_idx, deform_idx, energy_idx, momentum_idx, volfrac_idx};

/// Fourth-order split Mach polynomial, positive part.
#[inline]
fn mach_plus(m: f64) -> f64 {
    if m.abs() >= 1.0 {
        0.5 * (m + m.abs())
    } else {
        0.25 * (m + 1.0) * (m + 1.0) + 0.125 * (m * m - 1.0) * (m * m - 1.0)
    }
}

/// Fourth-order split Mach polynomial, negative part.
#[inline]
fn mach_minus(m: f64) -> f64 {
    if m.abs() >= 1.0 {
        0.5 * (m - m.abs())
    } else {
        -0.25 * (m - 1.0) * (m - 1.0) - 0.125 * (m * m - 1.0) * (m * m - 1.0)
    }
}

/// Fifth-order split pressure polynomial, positive part.
#[inline]
fn pressure_plus(m: f64) -> f64 {
    if m.abs() >= 1.0 {
        0.5 * (1.0 + m.signum())
    } else {
        0.25 * (m + 1.0) * (m + 1.0) * (2.0 - m)
            + (3.0 / 16.0) * m * (m * m - 1.0) * (m * m - 1.0)
    }
}

/// Fifth-order split pressure polynomial, negative part.
#[inline]
fn pressure_minus(m: f64) -> f64 {
    if m.abs() >= 1.0 {
        0.5 * (1.0 - m.signum())
    } else {
        0.25 * (m - 1.0) * (m - 1.0) * (2.0 + m)
            - (3.0 / 16.0) * m * (m * m - 1.0) * (m * m - 1.0)
    }
}

/// AUSM+up numerical flux; see the module docs for the contract.
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

    let ac12 = 0.5 * (l.ac + r.ac);
    let rho12 = 0.5 * (l.rho + r.rho);

    // all-speed scaling coefficients
    let k_p = 1.0;
    let k_u = 1.0;
    let f_a = 1.0;

    let ml = l.vn / ac12;
    let mr = r.vn / ac12;

    // pressure diffusion term of the interface Mach number
    let m0 = 1.0 - 0.5 * (l.vn * l.vn + r.vn * r.vn) / (ac12 * ac12);
    let mp = -(k_p / f_a) * m0.max(0.0) * (r.p - l.p) / (rho12 * ac12 * ac12);
    let m12 = mach_plus(ml) + mach_minus(mr) + mp;
    let vriem = ac12 * m12;

    // velocity diffusion term of the interface pressure
    let pplus = pressure_plus(ml);
    let pminus = pressure_minus(mr);
    let pu = -k_u * pplus * pminus * 2.0 * rho12 * f_a * ac12 * (r.vn - l.vn);
    let p12 = pplus * l.p + pminus * r.p + pu;

    // flux-vector splitting by the interface velocity
    let l_plus = 0.5 * (vriem + vriem.abs());
    let l_minus = 0.5 * (vriem - vriem.abs());

    let mut flx = vec![0.0; ncomp];
    for k in 0..nmat {
        flx[volfrac_idx(nmat, k)] =
            l_plus * ul[volfrac_idx(nmat, k)] + l_minus * ur[volfrac_idx(nmat, k)];
        flx[density_idx(nmat, k)] =
            l_plus * ul[density_idx(nmat, k)] + l_minus * ur[density_idx(nmat, k)];
        flx[energy_idx(nmat, k)] = l_plus * (ul[energy_idx(nmat, k)] + l.pm[k])
            + l_minus * (ur[energy_idx(nmat, k)] + r.pm[k]);

        if solidx[k] > 0 {
            // upwind advection of the inverse deformation gradient
            let (u, s) = if vriem >= 0.0 { (ul, &l) } else { (ur, &r) };
            let g = get_deform_grad(nmat, solidx, k, u);
            let gf = deform_flux(&g, s.vel, fnorm);
            for i in 0..3 {
                for j in 0..3 {
                    flx[deform_idx(nmat, solidx[k], i, j)] = gf[i][j];
                }
            }
        }
    }

    for idir in 0..3 {
        flx[momentum_idx(nmat, idir)] = l_plus * ul[momentum_idx(nmat, idir)]
            + l_minus * ur[momentum_idx(nmat, idir)]
            + p12 * fnorm[idir];
    }

    // Riemann-advected partial pressures
    if vriem.abs() > 1.0e-12 {
        for k in 0..nmat {
            flx.push((l_plus * l.pm[k] + l_minus * r.pm[k]) / vriem);
        }
    } else {
        for k in 0..nmat {
            flx.push(0.5 * (l.pm[k] + r.pm[k]));
        }
    }

    // Riemann velocity
    flx.push(vriem);

    flx
}
