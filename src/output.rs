//! Solution accessors for field output and history probes.
//!
//! The core does no file I/O; it exposes the naming convention of the
//! multi-material fields and pointwise evaluation of bulk quantities at
//! history points. Writers live with the outer driver.

use crate::fields::Fields;
use crate::mesh::geometry::{jacobian, ref_coords_tet};
use crate::mesh::TetMesh;
use crate::basis::eval_basis;
use crate::state::eval_state;
use crate::types::{density_idx, energy_idx, pressure_idx, velocity_idx};

/// Field names of the conserved and primitive unknowns, in storage order:
/// `F<k>` volume fractions, `D<k>` partial densities, `M<d>` momentum,
/// `E<k>` partial energies, then `U<d>` velocity and `P<k>` material
/// pressures.
pub fn field_names(nmat: usize) -> Vec<String> {
    let mut names = Vec::with_capacity(3 * nmat + 6 + nmat);
    for k in 1..=nmat {
        names.push(format!("F{k}"));
    }
    for k in 1..=nmat {
        names.push(format!("D{k}"));
    }
    for d in 1..=3 {
        names.push(format!("M{d}"));
    }
    for k in 1..=nmat {
        names.push(format!("E{k}"));
    }
    for d in 1..=3 {
        names.push(format!("U{d}"));
    }
    for k in 1..=nmat {
        names.push(format!("P{k}"));
    }
    names
}

/// A history probe: a physical point inside a known element.
#[derive(Clone, Copy, Debug)]
pub struct HistPoint {
    /// Element containing the point.
    pub elem: usize,
    /// Physical coordinates of the point.
    pub coord: [f64; 3],
}

/// Evaluate `(rho, u, v, w, rho E, p)` of the bulk mixture at history
/// points.
pub fn hist_output(
    points: &[HistPoint],
    nmat: usize,
    rdof: usize,
    mesh: &TetMesh,
    u: &Fields,
    p: &Fields,
) -> Vec<[f64; 6]> {
    let ncomp = u.nprop() / rdof;
    let nprim = p.nprop() / rdof;

    points
        .iter()
        .map(|hp| {
            let e = hp.elem;
            let coordel = mesh.coordel(e);
            let det_t = jacobian(&coordel[0], &coordel[1], &coordel[2], &coordel[3]);
            let rc = ref_coords_tet(hp.coord, &coordel, det_t);
            let b = eval_basis(rdof, rc[0], rc[1], rc[2]);

            let uhp = eval_state(ncomp, rdof, rdof, e, u, &b, (0, ncomp - 1));
            let php = eval_state(nprim, rdof, rdof, e, p, &b, (0, nprim - 1));

            let mut out = [0.0; 6];
            for k in 0..nmat {
                out[0] += uhp[density_idx(nmat, k)];
                out[4] += uhp[energy_idx(nmat, k)];
                out[5] += php[pressure_idx(nmat, k)];
            }
            out[1] = php[velocity_idx(nmat, 0)];
            out[2] = php[velocity_idx(nmat, 1)];
            out[3] = php[velocity_idx(nmat, 2)];
            out
        })
        .collect()
}
