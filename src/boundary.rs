//! Boundary-condition state functions.
//!
//! Every boundary condition is a pure function from the domain-internal
//! state at a face point to the pair (left, right) of states handed to the
//! Riemann solver, the right one being the ghost. States are the appended
//! layout: conserved components followed by the primitive vector.

use crate::eos::MaterialEos;
use crate::types::{
    density_idx, energy_idx, momentum_idx, ncomp as ncomp_of, pressure_idx, velocity_idx,
    volfrac_idx,
};

/// Boundary state function: `(materials, ul, x, t, n) -> (ul, ur)`.
pub type BcStateFn =
    dyn Fn(&[MaterialEos], &[f64], [f64; 3], f64, [f64; 3]) -> (Vec<f64>, Vec<f64>) + Send + Sync;

/// Problem initializer: conserved state at a physical point and time.
pub type InitializeFn = dyn Fn(&[MaterialEos], [f64; 3], f64) -> Vec<f64> + Send + Sync;

/// Farfield reference state for in/outflow boundaries.
#[derive(Clone, Debug)]
pub struct FarfieldState {
    /// Volume fractions of each material.
    pub alpha: Vec<f64>,
    /// Pure-material densities.
    pub rho: Vec<f64>,
    /// Bulk velocity.
    pub vel: [f64; 3],
    /// Pressure (equilibrium across materials).
    pub p: f64,
}

/// Append the primitive vector (material pressures, bulk velocity) to a
/// conserved state, deriving both through the EOS.
pub fn append_primitives(mat_blk: &[MaterialEos], mut ur: Vec<f64>) -> Vec<f64> {
    let nmat = mat_blk.len();
    let ncomp = ur.len();

    let mut rho = 0.0;
    for k in 0..nmat {
        rho += ur[density_idx(nmat, k)];
    }
    let vel = [
        ur[momentum_idx(nmat, 0)] / rho,
        ur[momentum_idx(nmat, 1)] / rho,
        ur[momentum_idx(nmat, 2)] / rho,
    ];

    ur.resize(ncomp + nmat + 3, 0.0);
    for (k, mat) in mat_blk.iter().enumerate() {
        ur[ncomp + pressure_idx(nmat, k)] = mat.pressure(
            ur[density_idx(nmat, k)],
            vel[0],
            vel[1],
            vel[2],
            ur[energy_idx(nmat, k)],
            ur[volfrac_idx(nmat, k)],
        );
    }
    for d in 0..3 {
        ur[ncomp + velocity_idx(nmat, d)] = vel[d];
    }
    ur
}

/// Dirichlet: the ghost is the problem initializer evaluated at the face
/// point, with primitives recomputed from the EOS.
pub fn dirichlet(
    mat_blk: &[MaterialEos],
    initialize: &InitializeFn,
    ul: &[f64],
    x: [f64; 3],
    t: f64,
    _fnorm: [f64; 3],
) -> (Vec<f64>, Vec<f64>) {
    let ur = initialize(mat_blk, x, t);
    debug_assert_eq!(ur.len() + mat_blk.len() + 3, ul.len());
    (ul.to_vec(), append_primitives(mat_blk, ur))
}

/// Symmetry: the ghost mirrors the interior with the normal momentum and
/// velocity components reflected; material pressures are copied.
pub fn symmetry(
    mat_blk: &[MaterialEos],
    ul: &[f64],
    _x: [f64; 3],
    _t: f64,
    fnorm: [f64; 3],
) -> (Vec<f64>, Vec<f64>) {
    let nmat = mat_blk.len();
    let ncomp = ul.len() - nmat - 3;

    let mut ur = ul.to_vec();

    let mn: f64 = (0..3)
        .map(|d| ul[momentum_idx(nmat, d)] * fnorm[d])
        .sum();
    let vn: f64 = (0..3)
        .map(|d| ul[ncomp + velocity_idx(nmat, d)] * fnorm[d])
        .sum();
    for d in 0..3 {
        ur[momentum_idx(nmat, d)] = ul[momentum_idx(nmat, d)] - 2.0 * mn * fnorm[d];
        ur[ncomp + velocity_idx(nmat, d)] =
            ul[ncomp + velocity_idx(nmat, d)] - 2.0 * vn * fnorm[d];
    }

    (ul.to_vec(), ur)
}

/// Extrapolate: the ghost equals the interior state.
pub fn extrapolate(
    _mat_blk: &[MaterialEos],
    ul: &[f64],
    _x: [f64; 3],
    _t: f64,
    _fnorm: [f64; 3],
) -> (Vec<f64>, Vec<f64>) {
    (ul.to_vec(), ul.to_vec())
}

/// Farfield outlet: characteristic-based in/outflow against a reference
/// state. Supersonic outflow extrapolates, subsonic outflow imposes the
/// farfield pressure, subsonic inflow keeps the interior pressure on the
/// farfield state, supersonic inflow imposes the farfield entirely.
pub fn farfield_outlet(
    mat_blk: &[MaterialEos],
    far: &FarfieldState,
    ul: &[f64],
    _x: [f64; 3],
    _t: f64,
    fnorm: [f64; 3],
) -> (Vec<f64>, Vec<f64>) {
    let nmat = mat_blk.len();
    let ncomp = ul.len() - nmat - 3;

    // interior normal velocity and mixture sound speed
    let vn: f64 = (0..3)
        .map(|d| ul[ncomp + velocity_idx(nmat, d)] * fnorm[d])
        .sum();
    let mut rho = 0.0;
    let mut ac2 = 0.0;
    for (k, mat) in mat_blk.iter().enumerate() {
        rho += ul[density_idx(nmat, k)];
        let a = mat.soundspeed(
            ul[density_idx(nmat, k)],
            ul[ncomp + pressure_idx(nmat, k)],
            ul[volfrac_idx(nmat, k)],
        );
        ac2 += ul[density_idx(nmat, k)] * a * a;
    }
    if !(rho > 0.0) {
        // conserved block absent (primitive-only reconstruction query):
        // the flow cannot be classified, extrapolate
        return (ul.to_vec(), ul.to_vec());
    }
    let ac = (ac2 / rho).sqrt();

    let ur = if vn >= ac {
        // supersonic outflow
        ul.to_vec()
    } else if vn >= 0.0 {
        // subsonic outflow: farfield pressure on the interior state
        let mut ur = ul.to_vec();
        let vel = [
            ul[ncomp + velocity_idx(nmat, 0)],
            ul[ncomp + velocity_idx(nmat, 1)],
            ul[ncomp + velocity_idx(nmat, 2)],
        ];
        for (k, mat) in mat_blk.iter().enumerate() {
            let al = ul[volfrac_idx(nmat, k)];
            let rhok = ul[density_idx(nmat, k)] / al.max(1.0e-14);
            ur[energy_idx(nmat, k)] =
                al * mat.total_energy(rhok, vel[0], vel[1], vel[2], far.p);
            ur[ncomp + pressure_idx(nmat, k)] = al * far.p;
        }
        ur
    } else {
        // inflow: the farfield state, keeping the interior pressure when
        // the inflow is subsonic
        let p = if -vn < ac {
            let mut p_in = 0.0;
            for k in 0..nmat {
                p_in += ul[ncomp + pressure_idx(nmat, k)];
            }
            p_in
        } else {
            far.p
        };
        let mut ur = vec![0.0; ul.len()];
        let mut rho_far = 0.0;
        for (k, mat) in mat_blk.iter().enumerate() {
            let al = far.alpha[k];
            ur[volfrac_idx(nmat, k)] = al;
            ur[density_idx(nmat, k)] = al * far.rho[k];
            ur[energy_idx(nmat, k)] =
                al * mat.total_energy(far.rho[k], far.vel[0], far.vel[1], far.vel[2], p);
            ur[ncomp + pressure_idx(nmat, k)] = al * p;
            rho_far += al * far.rho[k];
        }
        for d in 0..3 {
            ur[momentum_idx(nmat, d)] = rho_far * far.vel[d];
            ur[ncomp + velocity_idx(nmat, d)] = far.vel[d];
        }
        ur
    };

    (ul.to_vec(), ur)
}

/// Stagnation point: inside the given radius of the user point the ghost
/// carries zero velocity with the interior internal energy; outside it
/// extrapolates.
pub fn stagnation_point(
    mat_blk: &[MaterialEos],
    point: [f64; 3],
    radius: f64,
    ul: &[f64],
    x: [f64; 3],
    _t: f64,
    _fnorm: [f64; 3],
) -> (Vec<f64>, Vec<f64>) {
    let nmat = mat_blk.len();
    let ncomp = ul.len() - nmat - 3;

    let d2: f64 = (0..3).map(|d| (x[d] - point[d]).powi(2)).sum();
    if d2 > radius * radius {
        return (ul.to_vec(), ul.to_vec());
    }

    let mut ur = ul.to_vec();
    let q2: f64 = (0..3)
        .map(|d| ul[ncomp + velocity_idx(nmat, d)].powi(2))
        .sum();
    for k in 0..nmat {
        // remove the kinetic part of the partial energy
        ur[energy_idx(nmat, k)] -= 0.5 * ul[density_idx(nmat, k)] * q2;
    }
    for d in 0..3 {
        ur[momentum_idx(nmat, d)] = 0.0;
        ur[ncomp + velocity_idx(nmat, d)] = 0.0;
    }

    (ul.to_vec(), ur)
}

/// Sponge: the ghost is the interior state relaxed toward a reference
/// appended state by the given factor.
pub fn sponge(
    _mat_blk: &[MaterialEos],
    reference: &[f64],
    coeff: f64,
    ul: &[f64],
    _x: [f64; 3],
    _t: f64,
    _fnorm: [f64; 3],
) -> (Vec<f64>, Vec<f64>) {
    debug_assert_eq!(reference.len(), ul.len());
    let ur = ul
        .iter()
        .zip(reference)
        .map(|(&u, &r)| u + coeff * (r - u))
        .collect();
    (ul.to_vec(), ur)
}

/// Time-dependent inflow: piecewise-linear interpolation of
/// `(p, rho, u, v, w)` in time, imposed on the majority material of the
/// interior state.
pub fn time_dependent(
    mat_blk: &[MaterialEos],
    table: &[[f64; 6]],
    ul: &[f64],
    _x: [f64; 3],
    t: f64,
    _fnorm: [f64; 3],
) -> (Vec<f64>, Vec<f64>) {
    let nmat = mat_blk.len();
    let ncomp = ul.len() - nmat - 3;

    // interpolate the user table, clamped at the ends
    let vals = interp_table(table, t);
    let (p, rho, vel) = (vals[0], vals[1], [vals[2], vals[3], vals[4]]);

    // majority material carries the imposed state
    let mut kmax = 0;
    for k in 1..nmat {
        if ul[volfrac_idx(nmat, k)] > ul[volfrac_idx(nmat, kmax)] {
            kmax = k;
        }
    }

    let mut ur = ul.to_vec();
    let mut rhob = 0.0;
    for (k, mat) in mat_blk.iter().enumerate() {
        let al = ul[volfrac_idx(nmat, k)];
        let rhok = if k == kmax {
            rho
        } else {
            ul[density_idx(nmat, k)] / al.max(1.0e-14)
        };
        ur[density_idx(nmat, k)] = al * rhok;
        ur[energy_idx(nmat, k)] = al * mat.total_energy(rhok, vel[0], vel[1], vel[2], p);
        ur[ncomp + pressure_idx(nmat, k)] = al * p;
        rhob += al * rhok;
    }
    for d in 0..3 {
        ur[momentum_idx(nmat, d)] = rhob * vel[d];
        ur[ncomp + velocity_idx(nmat, d)] = vel[d];
    }

    (ul.to_vec(), ur)
}

/// Piecewise-linear table lookup: rows are `(t, v0..v4)`, clamped outside
/// the covered time range.
fn interp_table(table: &[[f64; 6]], t: f64) -> [f64; 5] {
    assert!(!table.is_empty(), "empty time-dependent BC table");
    let mut out = [0.0; 5];

    if t <= table[0][0] {
        out.copy_from_slice(&table[0][1..6]);
        return out;
    }
    if t >= table[table.len() - 1][0] {
        out.copy_from_slice(&table[table.len() - 1][1..6]);
        return out;
    }
    for w in table.windows(2) {
        if t >= w[0][0] && t <= w[1][0] {
            let s = (t - w[0][0]) / (w[1][0] - w[0][0]);
            for i in 0..5 {
                out[i] = (1.0 - s) * w[0][1 + i] + s * w[1][1 + i];
            }
            return out;
        }
    }
    unreachable!("table rows must be time-ordered");
}

/// Side-set attachments of boundary conditions.
#[derive(Clone)]
pub enum BcSpec {
    Dirichlet,
    Symmetry,
    FarfieldOutlet(FarfieldState),
    Extrapolate,
    StagnationPoint { point: [f64; 3], radius: f64 },
    Sponge { reference: Vec<f64>, coeff: f64 },
    TimeDependent { table: Vec<[f64; 6]> },
}

impl BcSpec {
    /// Human-readable name for configuration errors.
    pub fn name(&self) -> &'static str {
        match self {
            BcSpec::Dirichlet => "dirichlet",
            BcSpec::Symmetry => "symmetry",
            BcSpec::FarfieldOutlet(_) => "farfield",
            BcSpec::Extrapolate => "extrapolate",
            BcSpec::StagnationPoint { .. } => "stagnation",
            BcSpec::Sponge { .. } => "sponge",
            BcSpec::TimeDependent { .. } => "timedep",
        }
    }
}
