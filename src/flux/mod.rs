//! Riemann fluxes for the multi-material Euler system.
//!
//! Every solver shares the same contract: given the face normal and the
//! left/right states (conserved components with the primitive vector
//! appended), return `ncomp` numerical fluxes followed by `nmat`
//! Riemann-advected partial pressures and one Riemann normal velocity. The
//! appended entries feed the non-conservative volume terms.
//!
//! Flux selection is an enum dispatched with `match`; the solvers run at
//! every face Gauss point, so dynamic dispatch is avoided.

pub mod ausm;
pub mod hll;
pub mod hllc;
pub mod lax_friedrichs;
pub mod rusanov;

use crate::config::FluxType;
use crate::eos::MaterialEos;
use crate::types::{
    density_idx, deform_idx, energy_idx, momentum_idx, pressure_idx, velocity_idx, volfrac_idx,
};

/// Riemann solver dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiemannFlux {
    Ausm,
    Hllc,
    Hll,
    Rusanov,
    LaxFriedrichs,
}

impl From<FluxType> for RiemannFlux {
    fn from(f: FluxType) -> Self {
        match f {
            FluxType::Ausm => RiemannFlux::Ausm,
            FluxType::Hllc => RiemannFlux::Hllc,
            FluxType::Hll => RiemannFlux::Hll,
            FluxType::Rusanov => RiemannFlux::Rusanov,
            FluxType::LaxFriedrichs => RiemannFlux::LaxFriedrichs,
        }
    }
}

impl RiemannFlux {
    /// Numerical flux at a face point.
    ///
    /// `ul`/`ur` are `ncomp + nmat + 3` entries (conserved state with the
    /// primitive vector appended); the normal points from the left to the
    /// right state. Returns `ncomp + nmat + 1` entries.
    pub fn flux(
        &self,
        mat_blk: &[MaterialEos],
        solidx: &[usize],
        fnorm: [f64; 3],
        ul: &[f64],
        ur: &[f64],
    ) -> Vec<f64> {
        match self {
            RiemannFlux::Ausm => ausm::flux(mat_blk, solidx, fnorm, ul, ur),
            RiemannFlux::Hllc => hllc::flux(mat_blk, solidx, fnorm, ul, ur),
            RiemannFlux::Hll => hll::flux(mat_blk, solidx, fnorm, ul, ur),
            RiemannFlux::Rusanov => rusanov::flux(mat_blk, solidx, fnorm, ul, ur),
            RiemannFlux::LaxFriedrichs => lax_friedrichs::flux(mat_blk, solidx, fnorm, ul, ur),
        }
    }

    /// Solver name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            RiemannFlux::Ausm => "ausm",
            RiemannFlux::Hllc => "hllc",
            RiemannFlux::Hll => "hll",
            RiemannFlux::Rusanov => "rusanov",
            RiemannFlux::LaxFriedrichs => "laxfriedrichs",
        }
    }
}

/// Per-side quantities every solver starts from.
pub(crate) struct SideState {
    /// Bulk density.
    pub rho: f64,
    /// Bulk velocity.
    pub vel: [f64; 3],
    /// Face-normal velocity.
    pub vn: f64,
    /// Material partial pressures.
    pub pm: Vec<f64>,
    /// Bulk pressure (sum of partial pressures).
    pub p: f64,
    /// Mixture speed of sound.
    pub ac: f64,
}

impl SideState {
    /// Decompose an appended state vector on one side of a face.
    pub fn new(mat_blk: &[MaterialEos], fnorm: [f64; 3], u: &[f64], ncomp: usize) -> Self {
        let nmat = mat_blk.len();

        let mut rho = 0.0;
        for k in 0..nmat {
            rho += u[density_idx(nmat, k)];
        }

        let vel = [
            u[ncomp + velocity_idx(nmat, 0)],
            u[ncomp + velocity_idx(nmat, 1)],
            u[ncomp + velocity_idx(nmat, 2)],
        ];
        let vn = vel[0] * fnorm[0] + vel[1] * fnorm[1] + vel[2] * fnorm[2];

        let mut pm = vec![0.0; nmat];
        let mut p = 0.0;
        let mut ac2 = 0.0;
        for (k, (pmk, mat)) in pm.iter_mut().zip(mat_blk).enumerate() {
            *pmk = u[ncomp + pressure_idx(nmat, k)];
            p += *pmk;
            let am = mat.soundspeed(
                u[density_idx(nmat, k)],
                *pmk,
                u[volfrac_idx(nmat, k)],
            );
            ac2 += u[density_idx(nmat, k)] * am * am;
        }
        let ac = (ac2 / rho).sqrt();

        Self {
            rho,
            vel,
            vn,
            pm,
            p,
            ac,
        }
    }
}

/// Physical flux of the deformation-gradient row `i`: `(v . g_i) n_j`.
pub(crate) fn deform_flux(g: &[[f64; 3]; 3], vel: [f64; 3], fnorm: [f64; 3]) -> [[f64; 3]; 3] {
    let mut f = [[0.0; 3]; 3];
    for i in 0..3 {
        let vg = vel[0] * g[i][0] + vel[1] * g[i][1] + vel[2] * g[i][2];
        for j in 0..3 {
            f[i][j] = vg * fnorm[j];
        }
    }
    f
}

/// Extract the inverse deformation gradient of solid `k` from a state.
pub(crate) fn get_deform_grad(nmat: usize, solidx: &[usize], k: usize, u: &[f64]) -> [[f64; 3]; 3] {
    let mut g = [[0.0; 3]; 3];
    if solidx[k] > 0 {
        for (i, row) in g.iter_mut().enumerate() {
            for (j, gij) in row.iter_mut().enumerate() {
                *gij = u[deform_idx(nmat, solidx[k], i, j)];
            }
        }
    } else {
        for (i, row) in g.iter_mut().enumerate() {
            row[i] = 1.0;
        }
    }
    g
}

/// Physical flux vectors `F_j(U)` of the conservative part, used by the
/// volume integral. `state` carries the appended primitives.
pub fn flux_terms(ncomp: usize, nmat: usize, solidx: &[usize], state: &[f64]) -> Vec<[f64; 3]> {
    let mut fl = vec![[0.0; 3]; ncomp];

    let vel = [
        state[ncomp + velocity_idx(nmat, 0)],
        state[ncomp + velocity_idx(nmat, 1)],
        state[ncomp + velocity_idx(nmat, 2)],
    ];

    let mut p_bulk = 0.0;
    for k in 0..nmat {
        let apk = state[ncomp + pressure_idx(nmat, k)];
        p_bulk += apk;
        for j in 0..3 {
            fl[volfrac_idx(nmat, k)][j] = vel[j] * state[volfrac_idx(nmat, k)];
            fl[density_idx(nmat, k)][j] = vel[j] * state[density_idx(nmat, k)];
            fl[energy_idx(nmat, k)][j] = vel[j] * (state[energy_idx(nmat, k)] + apk);
        }
        if solidx[k] > 0 {
            let g = get_deform_grad(nmat, solidx, k, state);
            for i in 0..3 {
                let vg = vel[0] * g[i][0] + vel[1] * g[i][1] + vel[2] * g[i][2];
                for j in 0..3 {
                    fl[deform_idx(nmat, solidx[k], i, j)][j] = vg;
                }
            }
        }
    }

    for idir in 0..3 {
        for j in 0..3 {
            fl[momentum_idx(nmat, idir)][j] = vel[j] * state[momentum_idx(nmat, idir)];
        }
        fl[momentum_idx(nmat, idir)][idir] += p_bulk;
    }

    fl
}
