//! CFL time-step control.
//!
//! The admissible step is the minimum over elements of the cell volume
//! divided by the accumulated face measure of the fastest wave crossing
//! each face, the classic cell-centered CFL bound. Cell means are used on
//! both sides; the mixture sound speed follows the bulk-modulus mixture
//! rule, ignoring materials below a trace threshold.

use crate::eos::MaterialEos;
use crate::fields::Fields;
use crate::mesh::TetMesh;
use crate::state::eval_state;
use crate::types::{density_idx, pressure_idx, velocity_idx, volfrac_idx};

/// Maximum admissible time step for the multi-material system, before CFL
/// and order scaling.
pub fn time_step_size_multimat(
    mat_blk: &[MaterialEos],
    mesh: &TetMesh,
    nmat: usize,
    rdof: usize,
    u: &Fields,
    p: &Fields,
) -> f64 {
    let ncomp = u.nprop() / rdof;
    let nprim = p.nprop() / rdof;

    let mut delt = vec![0.0; mesh.nelem()];
    // cell-mean basis
    let b = vec![1.0];

    for f in 0..mesh.nfac() {
        let el = mesh.esuf[2 * f] as usize;
        let er = mesh.esuf[2 * f + 1];
        let gf = &mesh.geo_face[f];

        let side_speed = |e: usize| -> f64 {
            let ugp = eval_state(ncomp, rdof, 1, e, u, &b, (0, ncomp - 1));
            let pgp = eval_state(nprim, rdof, 1, e, p, &b, (0, nprim - 1));

            let vn: f64 = (0..3)
                .map(|d| pgp[velocity_idx(nmat, d)] * gf.normal[d])
                .sum();

            let mut a = 0.0f64;
            for (k, mat) in mat_blk.iter().enumerate() {
                if ugp[volfrac_idx(nmat, k)] > 1.0e-4 {
                    a = a.max(mat.soundspeed(
                        ugp[density_idx(nmat, k)],
                        pgp[pressure_idx(nmat, k)],
                        ugp[volfrac_idx(nmat, k)],
                    ));
                }
            }

            gf.area * (vn.abs() + a)
        };

        let dsv_l = side_speed(el);
        let dsv_r = if er > -1 {
            let dsv_r = side_speed(er as usize);
            delt[er as usize] += dsv_l.max(dsv_r);
            dsv_r
        } else {
            dsv_l
        };

        delt[el] += dsv_l.max(dsv_r);
    }

    let mut mindt = f64::MAX;
    for (e, d) in delt.iter().enumerate() {
        mindt = mindt.min(mesh.geo_elem[e].vol / d);
    }
    mindt
}

/// Global time step: CFL scaling plus the `2p + 1` factor from linear
/// stability of the DG polynomial order.
pub fn dt_multimat(
    mat_blk: &[MaterialEos],
    mesh: &TetMesh,
    nmat: usize,
    ndof: usize,
    rdof: usize,
    cfl: f64,
    u: &Fields,
    p: &Fields,
) -> f64 {
    let mindt = time_step_size_multimat(mat_blk, mesh, nmat, rdof, u, p);

    let dgp = match ndof {
        4 => 1.0,
        10 => 2.0,
        _ => 0.0,
    };

    cfl * mindt / (2.0 * dgp + 1.0)
}
