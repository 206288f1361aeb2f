//! Explicit SSP-RK3 stage updates.
//!
//! The strong-stability-preserving three-stage Runge-Kutta scheme of Shu &
//! Osher, written as convex combinations of forward-Euler steps:
//!
//! ```text
//! u(1)   = u_n + dt M^-1 R(u_n)
//! u(2)   = 3/4 u_n + 1/4 (u(1) + dt M^-1 R(u(1)))
//! u_n+1  = 1/3 u_n + 2/3 (u(2) + dt M^-1 R(u(2)))
//! ```
//!
//! The Dubiner mass matrix is diagonal per element, so `M^-1 R` is a
//! per-dof division. Only the solved dofs (up to each element's `ndofel`)
//! are advanced; reconstructed dofs are refilled by the reconstruction
//! step of the next stage.

use crate::basis::mass_matrix_dubiner;
use crate::fields::Fields;
use crate::mesh::TetMesh;

/// Convex-combination coefficients of the three stages.
const RKCOEF: [[f64; 3]; 2] = [[0.0, 0.75, 1.0 / 3.0], [1.0, 0.25, 2.0 / 3.0]];

/// Advance one RK stage: `u = a_s * un + b_s * (u + dt * M^-1 R)`.
///
/// `un` is the solution at the beginning of the step, `u` the current
/// stage state which is updated in place. `num_eq_dof` caps the advanced
/// dofs per component: volume fractions in a multi-material system are
/// solved P0 and reconstructed, whatever the scheme order.
#[allow(clippy::too_many_arguments)]
pub fn rk3_stage(
    stage: usize,
    ndof: usize,
    rdof: usize,
    num_eq_dof: &[usize],
    mesh: &TetMesh,
    ndofel: &[usize],
    dt: f64,
    un: &Fields,
    rhs: &Fields,
    u: &mut Fields,
) {
    debug_assert!(stage < 3);
    let ncomp = rhs.nprop() / ndof;
    let a = RKCOEF[0][stage];
    let b = RKCOEF[1][stage];

    for e in 0..mesh.nelem() {
        let l = mass_matrix_dubiner(ndof, mesh.geo_elem[e].vol);
        let nd = ndofel[e].min(ndof);
        for c in 0..ncomp {
            let rmark = c * rdof;
            let mark = c * ndof;
            for idof in 0..nd.min(num_eq_dof[c]) {
                let euler = u.get(e, rmark + idof) + dt * rhs.get(e, mark + idof) / l[idof];
                u.set(e, rmark + idof, a * un.get(e, rmark + idof) + b * euler);
            }
        }
    }
}
