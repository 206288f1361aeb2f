//! Slope limiting for the multi-material DG solution.
//!
//! The production path is Kuzmin's vertex-based hierarchical limiter: nodal
//! min/max bounds over the elements surrounding each vertex clip the
//! high-order solution, hierarchically on the Taylor representation for P2.
//! On top of the oscillation limiter sit a bound-preserving limiter for
//! volume fractions, a positivity limiter for partial densities, energies
//! and material pressures, the interface-compression override, and the
//! consistent coupling of limiter factors across the material system. A
//! face-integral discontinuity indicator decides per cell whether the full
//! limiter runs at all.
//!
//! References:
//! - Kuzmin (2010), A vertex-based hierarchical slope limiter for
//!   p-adaptive discontinuous Galerkin methods, JCAM 233(12).
//! - Luo, Absillis, Nourgaliev (2021), A moving discontinuous Galerkin
//!   finite element method with interface condition enforcement for
//!   compressible flows, JCP 445 (the indicator).

use crate::basis::{
    dubiner_to_taylor_ref_el, eval_basis, eval_dbdxi, eval_taylor_basis_ref_el,
    taylor_to_dubiner_ref_el,
};
use crate::eos::MaterialEos;
use crate::fields::Fields;
use crate::mesh::geometry::{eval_gp_tri, jacobian, ref_coords_tet};
use crate::mesh::{TetMesh, LPOFA};
use crate::quadrature::{gauss_quadrature_tet, gauss_quadrature_tri, ng_fa, ng_vol};
use crate::state::{eval_polynomial_sol, eval_state, interface_indicator};
use crate::types::{
    density_dof_idx, density_idx, energy_dof_idx, energy_idx, pressure_dof_idx, pressure_idx,
    velocity_idx, volfrac_dof_idx, volfrac_idx,
};

use super::dof_el;

/// Threshold of the discontinuity indicator above which a cell is marked.
const SHOCK_THRESHOLD_EXP: f64 = -5.7;

/// Chare-boundary nodal extrema supplied by neighboring partitions.
///
/// Rows are indexed through `bid` by local node id; each row stores, for
/// every component and direction, the `[max, min]` of the centroid
/// derivatives over the remote elements touching the node.
#[derive(Clone, Debug, Default)]
pub struct NodalExtrema {
    /// Local node id -> row index.
    pub bid: std::collections::HashMap<usize, usize>,
    /// Per row: `extrema[row][c * 3 + dir] = [max, min]`.
    pub extrema: Vec<Vec<[f64; 2]>>,
}

/// Inputs shared by the limiter drivers.
pub struct LimiterArgs<'a> {
    pub nmat: usize,
    pub mat_blk: &'a [MaterialEos],
    pub ndof: usize,
    pub rdof: usize,
    pub intsharp: i32,
    pub shock_detection: bool,
    pub accuracy_test: bool,
}

/// Kuzmin vertex-based limiter for multi-material DGP1 / P0P1.
///
/// Limits conserved and primitive quantities separately, applies the
/// bound-preserving and positivity limiters, couples the material factors
/// consistently, and honors the interface-compression override.
#[allow(clippy::too_many_arguments)]
pub fn vertex_based_multimat_p1(
    args: &LimiterArgs,
    mesh: &TetMesh,
    u: &mut Fields,
    p: &mut Fields,
    ndofel: &[usize],
    shockmarker: &mut [usize],
) {
    let (nmat, ndof, rdof) = (args.nmat, args.ndof, args.rdof);
    let ncomp = u.nprop() / rdof;
    let nprim = p.nprop() / rdof;

    // discontinuity indicator per element
    let ind = if args.shock_detection {
        eval_disc_indicator(args, mesh, u, p, ndofel)
    } else {
        Vec::new()
    };
    let threshold = 10.0f64.powf(SHOCK_THRESHOLD_EXP);

    for e in 0..mesh.nelem() {
        let dof_e = dof_el(false, ndof, rdof, ndofel[e]);

        if args.shock_detection && ndofel[e] > 1 {
            shockmarker[e] = usize::from(ind[e] > threshold);
        } else {
            // P0P1, or detection off: the limiter always runs
            shockmarker[e] = 1;
        }

        if dof_e <= 1 {
            continue;
        }

        let mut phic = vec![1.0; ncomp];
        let mut phip = vec![1.0; nprim];

        if shockmarker[e] == 1 {
            vertex_based_limiting(None, u, mesh, e, rdof, dof_e, ncomp, &mut phic, (0, ncomp - 1));
            vertex_based_limiting(None, p, mesh, e, rdof, dof_e, nprim, &mut phip, (0, nprim - 1));
        } else {
            // smooth cell: keep minor-material quantities in check
            vertex_based_limiting(
                None,
                u,
                mesh,
                e,
                rdof,
                dof_e,
                ncomp,
                &mut phic,
                (volfrac_idx(nmat, 0), volfrac_idx(nmat, nmat - 1)),
            );
            for k in 0..nmat {
                if u.get(e, volfrac_dof_idx(nmat, k, rdof, 0)) < 1.0e-4 {
                    let rng = (density_idx(nmat, k), density_idx(nmat, k));
                    vertex_based_limiting(None, u, mesh, e, rdof, dof_e, ncomp, &mut phic, rng);
                    let rng = (energy_idx(nmat, k), energy_idx(nmat, k));
                    vertex_based_limiting(None, u, mesh, e, rdof, dof_e, ncomp, &mut phic, rng);
                    let rng = (pressure_idx(nmat, k), pressure_idx(nmat, k));
                    vertex_based_limiting(None, p, mesh, e, rdof, dof_e, nprim, &mut phip, rng);
                }
            }
        }

        let mut phic_p2 = Vec::new();
        let mut phip_p2 = Vec::new();

        if ndof > 1 && args.intsharp == 0 && nmat > 1 {
            bound_preserving_limiting(nmat, ndof, e, mesh, u, &mut phic, &mut phic_p2);
        }
        if args.intsharp == 0 {
            positivity_limiting_multimat(
                nmat,
                args.mat_blk,
                rdof,
                e,
                mesh,
                u,
                p,
                &mut phic,
                &mut phic_p2,
                &mut phip,
                &mut phip_p2,
            );
        }

        // interface treatment: compression overrides the limiter on the
        // fractions; otherwise keep the system consistent
        let mut mat_int = vec![0usize; nmat];
        let mut al_avg = vec![0.0; nmat];
        for (k, a) in al_avg.iter_mut().enumerate() {
            *a = u.get(e, volfrac_dof_idx(nmat, k, rdof, 0));
        }
        let int_ind = interface_indicator(nmat, &al_avg, &mut mat_int);
        if args.intsharp > 0 && int_ind {
            for k in 0..nmat {
                if mat_int[k] == 1 {
                    phic[volfrac_idx(nmat, k)] = 1.0;
                }
            }
        } else if !args.accuracy_test {
            consistent_multimat_limiting_p1(nmat, rdof, e, u, &mut phic, &mut phic_p2);
        }

        for c in 0..ncomp {
            let mark = c * rdof;
            for idof in 1..4 {
                let v = u.get(e, mark + idof);
                u.set(e, mark + idof, phic[c] * v);
            }
        }
        for c in 0..nprim {
            let mark = c * rdof;
            for idof in 1..4 {
                let v = p.get(e, mark + idof);
                p.set(e, mark + idof, phip[c] * v);
            }
        }
    }
}

/// Kuzmin vertex-based limiter for multi-material DGP2, hierarchically on
/// the reference-element Taylor representation.
#[allow(clippy::too_many_arguments)]
pub fn vertex_based_multimat_p2(
    args: &LimiterArgs,
    mesh: &TetMesh,
    u_extrema: Option<&NodalExtrema>,
    p_extrema: Option<&NodalExtrema>,
    mt_inv: &[Vec<f64>],
    u: &mut Fields,
    p: &mut Fields,
    ndofel: &[usize],
    shockmarker: &mut [usize],
) {
    let (nmat, ndof, rdof) = (args.nmat, args.ndof, args.rdof);
    let ncomp = u.nprop() / rdof;
    let nprim = p.nprop() / rdof;

    // limited solution goes to a copy so the bounds search below always
    // sees the unlimited neighbors
    let mut u_lim = u.clone();
    let mut p_lim = p.clone();

    let ind = if args.shock_detection {
        eval_disc_indicator(args, mesh, u, p, ndofel)
    } else {
        Vec::new()
    };
    let threshold = 10.0f64.powf(SHOCK_THRESHOLD_EXP);

    for e in 0..mesh.nelem() {
        let dof_e = dof_el(false, ndof, rdof, ndofel[e]);

        if args.shock_detection && ndofel[e] > 1 {
            shockmarker[e] = usize::from(ind[e] > threshold);
        } else {
            shockmarker[e] = 1;
        }

        if dof_e <= 1 {
            continue;
        }

        let mut unk = dubiner_to_taylor_ref_el(ncomp, e, rdof, dof_e, mt_inv, u);
        let mut prim = dubiner_to_taylor_ref_el(nprim, e, rdof, dof_e, mt_inv, p);

        let mut phic_p1 = vec![1.0; ncomp];
        let mut phic_p2 = vec![1.0; ncomp];
        let mut phip_p1 = vec![1.0; nprim];
        let mut phip_p2 = vec![1.0; nprim];

        if shockmarker[e] == 1 {
            if dof_e > 4 {
                vertex_based_limiting_p2(
                    &unk, u, mesh, e, rdof, ncomp, u_extrema, (0, ncomp - 1), &mut phic_p2,
                );
                vertex_based_limiting_p2(
                    &prim, p, mesh, e, rdof, nprim, p_extrema, (0, nprim - 1), &mut phip_p2,
                );
            }
            vertex_based_limiting(
                Some(&unk[..]), u, mesh, e, rdof, dof_e, ncomp, &mut phic_p1, (0, ncomp - 1),
            );
            vertex_based_limiting(
                Some(&prim[..]), p, mesh, e, rdof, dof_e, nprim, &mut phip_p1, (0, nprim - 1),
            );
        } else {
            let al_rng = (volfrac_idx(nmat, 0), volfrac_idx(nmat, nmat - 1));
            if dof_e > 4 {
                vertex_based_limiting_p2(
                    &unk, u, mesh, e, rdof, ncomp, u_extrema, al_rng, &mut phic_p2,
                );
            }
            vertex_based_limiting(
                Some(&unk[..]), u, mesh, e, rdof, dof_e, ncomp, &mut phic_p1, al_rng,
            );

            for k in 0..nmat {
                if u.get(e, volfrac_dof_idx(nmat, k, rdof, 0)) < 1.0e-4 {
                    let rng = (density_idx(nmat, k), density_idx(nmat, k));
                    if dof_e > 4 {
                        vertex_based_limiting_p2(
                            &unk, u, mesh, e, rdof, ncomp, u_extrema, rng, &mut phic_p2,
                        );
                    }
                    vertex_based_limiting(
                        Some(&unk[..]), u, mesh, e, rdof, dof_e, ncomp, &mut phic_p1, rng,
                    );

                    let rng = (pressure_idx(nmat, k), pressure_idx(nmat, k));
                    if dof_e > 4 {
                        vertex_based_limiting_p2(
                            &prim, p, mesh, e, rdof, nprim, p_extrema, rng, &mut phip_p2,
                        );
                    }
                    vertex_based_limiting(
                        Some(&prim[..]), p, mesh, e, rdof, dof_e, nprim, &mut phip_p1, rng,
                    );
                }
            }
        }

        if dof_e > 4 {
            // the P2 factor may only tighten the P1 factor further
            for c in 0..ncomp {
                phic_p1[c] = phic_p1[c].max(phic_p2[c]);
            }
            for c in 0..nprim {
                phip_p1[c] = phip_p1[c].max(phip_p2[c]);
            }
        }

        // identical factors across the volume fractions
        let mut phi_al_p1 = 1.0f64;
        let mut phi_al_p2 = 1.0f64;
        for k in 0..nmat {
            phi_al_p1 = phi_al_p1.min(phic_p1[volfrac_idx(nmat, k)]);
            phi_al_p2 = phi_al_p2.min(phic_p2[volfrac_idx(nmat, k)]);
        }
        for k in 0..nmat {
            phic_p1[volfrac_idx(nmat, k)] = phi_al_p1;
            phic_p2[volfrac_idx(nmat, k)] = phi_al_p2;
        }

        for c in 0..ncomp {
            for idof in 1..4 {
                unk[c][idof] *= phic_p1[c];
            }
            for idof in 4..rdof {
                unk[c][idof] *= phic_p2[c];
            }
        }
        for c in 0..nprim {
            for idof in 1..4 {
                prim[c][idof] *= phip_p1[c];
            }
            for idof in 4..rdof {
                prim[c][idof] *= phip_p2[c];
            }
        }

        taylor_to_dubiner_ref_el(ncomp, &mut unk);
        taylor_to_dubiner_ref_el(nprim, &mut prim);

        for c in 0..ncomp {
            let mark = c * rdof;
            for idof in 1..rdof {
                u_lim.set(e, mark + idof, unk[c][idof]);
            }
        }
        for c in 0..nprim {
            let mark = c * rdof;
            for idof in 1..rdof {
                p_lim.set(e, mark + idof, prim[c][idof]);
            }
        }

        // fresh factors for the preservation limiters on the limited state
        let mut phic_p1 = vec![1.0; ncomp];
        let mut phic_p2 = vec![1.0; ncomp];
        let mut phip_p1 = vec![1.0; nprim];
        let mut phip_p2 = vec![1.0; nprim];

        if ndof > 1 && args.intsharp == 0 {
            bound_preserving_limiting(nmat, ndof, e, mesh, &u_lim, &mut phic_p1, &mut phic_p2);
        }
        positivity_limiting_multimat(
            nmat,
            args.mat_blk,
            ndof,
            e,
            mesh,
            &u_lim,
            &p_lim,
            &mut phic_p1,
            &mut phic_p2,
            &mut phip_p1,
            &mut phip_p2,
        );

        let mut mat_int = vec![0usize; nmat];
        let mut al_avg = vec![0.0; nmat];
        for (k, a) in al_avg.iter_mut().enumerate() {
            *a = u.get(e, volfrac_dof_idx(nmat, k, rdof, 0));
        }
        let int_ind = interface_indicator(nmat, &al_avg, &mut mat_int);
        if args.intsharp > 0 && int_ind {
            for k in 0..nmat {
                if mat_int[k] == 1 {
                    phic_p1[volfrac_idx(nmat, k)] = 1.0;
                    phic_p2[volfrac_idx(nmat, k)] = 1.0;
                }
            }
        } else if !args.accuracy_test {
            consistent_multimat_limiting_p1(nmat, rdof, e, &mut u_lim, &mut phic_p1, &mut phic_p2);
        }

        for c in 0..ncomp {
            let mark = c * rdof;
            for idof in 1..4 {
                let v = u_lim.get(e, mark + idof);
                u_lim.set(e, mark + idof, phic_p1[c] * v);
            }
            for idof in 4..rdof {
                let v = u_lim.get(e, mark + idof);
                u_lim.set(e, mark + idof, phic_p2[c] * v);
            }
        }
        for c in 0..nprim {
            let mark = c * rdof;
            for idof in 1..4 {
                let v = p_lim.get(e, mark + idof);
                p_lim.set(e, mark + idof, phip_p1[c] * v);
            }
            for idof in 4..rdof {
                let v = p_lim.get(e, mark + idof);
                p_lim.set(e, mark + idof, phip_p2[c] * v);
            }
        }
    }

    // publish the limited high-order dofs
    for e in 0..mesh.nelem() {
        for c in 0..ncomp {
            let mark = c * rdof;
            for idof in 1..rdof {
                u.set(e, mark + idof, u_lim.get(e, mark + idof));
            }
        }
        for c in 0..nprim {
            let mark = c * rdof;
            for idof in 1..rdof {
                p.set(e, mark + idof, p_lim.get(e, mark + idof));
            }
        }
    }
}

/// Superbee limiter for multi-material DGP1.
#[allow(clippy::too_many_arguments)]
pub fn superbee_multimat_p1(
    args: &LimiterArgs,
    mesh: &TetMesh,
    u: &mut Fields,
    p: &mut Fields,
    ndofel: &[usize],
) {
    let (nmat, ndof, rdof) = (args.nmat, args.ndof, args.rdof);
    let ncomp = u.nprop() / rdof;
    let nprim = p.nprop() / rdof;

    let beta_lim = 2.0;

    for e in 0..mesh.nelem() {
        let dof_e = dof_el(false, ndof, rdof, ndofel[e]);
        if dof_e <= 1 {
            continue;
        }

        let mut phic = superbee_limiting(u, mesh, e, ndof, rdof, dof_e, ncomp, beta_lim);
        let phip = superbee_limiting(p, mesh, e, ndof, rdof, dof_e, nprim, beta_lim);

        let mut phic_p2 = Vec::new();
        if ndof > 1 {
            bound_preserving_limiting(nmat, ndof, e, mesh, u, &mut phic, &mut phic_p2);
        }

        let mut mat_int = vec![0usize; nmat];
        let mut al_avg = vec![0.0; nmat];
        for (k, a) in al_avg.iter_mut().enumerate() {
            *a = u.get(e, volfrac_dof_idx(nmat, k, rdof, 0));
        }
        let int_ind = interface_indicator(nmat, &al_avg, &mut mat_int);
        if args.intsharp > 0 && int_ind {
            for k in 0..nmat {
                if mat_int[k] == 1 {
                    phic[volfrac_idx(nmat, k)] = 1.0;
                }
            }
        } else if !args.accuracy_test {
            consistent_multimat_limiting_p1(nmat, rdof, e, u, &mut phic, &mut phic_p2);
        }

        for c in 0..ncomp {
            let mark = c * rdof;
            for idof in 1..4 {
                let v = u.get(e, mark + idof);
                u.set(e, mark + idof, phic[c] * v);
            }
        }
        for c in 0..nprim {
            let mark = c * rdof;
            for idof in 1..4 {
                let v = p.get(e, mark + idof);
                p.set(e, mark + idof, phip[c] * v);
            }
        }
    }
}

/// Kuzmin vertex-based limiting factors for the P1 dofs of one element.
///
/// For `rdof == 4` the candidate values come from the Dubiner polynomial at
/// the physical vertices; for `rdof == 10` from the Taylor representation
/// `unk` at the reference vertices.
#[allow(clippy::too_many_arguments)]
pub fn vertex_based_limiting(
    unk: Option<&[Vec<f64>]>,
    u: &Fields,
    mesh: &TetMesh,
    e: usize,
    rdof: usize,
    dof_e: usize,
    ncomp: usize,
    phi: &mut [f64],
    range: (usize, usize),
) {
    let coordel = mesh.coordel(e);
    let det_t = jacobian(&coordel[0], &coordel[1], &coordel[2], &coordel[3]);

    // reference-element vertices
    const CNODES: [[f64; 3]; 4] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ];

    let nrange = range.1 - range.0 + 1;
    let mut umin = vec![0.0; nrange];
    let mut umax = vec![0.0; nrange];

    for lp in 0..4 {
        for c in range.0..=range.1 {
            let avg = u.get(e, c * rdof);
            umin[c - range.0] = avg;
            umax[c - range.0] = avg;
        }
        let pnode = mesh.inpoel[4 * e + lp];

        // bounds over all elements surrounding this vertex
        for &er in &mesh.esup[pnode] {
            for c in range.0..=range.1 {
                let v = u.get(er, c * rdof);
                let cm = c - range.0;
                umin[cm] = umin[cm].min(v);
                umax[cm] = umax[cm].max(v);
            }
        }

        // candidate high-order value at the vertex
        let state: Vec<f64> = if rdof == 4 {
            let gp = [
                mesh.coord[0][pnode],
                mesh.coord[1][pnode],
                mesh.coord[2][pnode],
            ];
            let rc = ref_coords_tet(gp, &coordel, det_t);
            let b = eval_basis(rdof, rc[0], rc[1], rc[2]);
            eval_state(ncomp, rdof, dof_e, e, u, &b, range)
        } else {
            let unk = unk.expect("Taylor representation required for rdof == 10");
            let node = CNODES[lp];
            let b = eval_taylor_basis_ref_el(rdof, node[0], node[1], node[2]);
            let mut state = vec![0.0; ncomp];
            for (c, s) in state.iter_mut().enumerate() {
                for idof in 0..4 {
                    *s += unk[c][idof] * b[idof];
                }
            }
            state
        };

        for c in range.0..=range.1 {
            let avg = u.get(e, c * rdof);
            let u_neg = state[c] - avg;
            let uref = avg.abs().max(1.0e-14);
            let cm = c - range.0;
            let phi_gp = if u_neg > 1.0e-6 * uref {
                1.0f64.min((umax[cm] - avg) / u_neg)
            } else if u_neg < -1.0e-6 * uref {
                1.0f64.min((umin[cm] - avg) / u_neg)
            } else {
                1.0
            };
            phi[c] = phi[c].min(phi_gp);
        }
    }
}

/// Vertex-based limiting factors for the P2 dofs: the first derivatives at
/// the centroid are treated like cell averages and limited against their
/// nodal neighborhood, in reference space.
#[allow(clippy::too_many_arguments)]
pub fn vertex_based_limiting_p2(
    unk: &[Vec<f64>],
    u: &Fields,
    mesh: &TetMesh,
    e: usize,
    rdof: usize,
    ncomp: usize,
    extrema: Option<&NodalExtrema>,
    range: (usize, usize),
    phi: &mut [f64],
) {
    const CENTER: [f64; 3] = [0.25, 0.25, 0.25];
    const CNODES: [[f64; 3]; 4] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ];

    let nrange = range.1 - range.0 + 1;
    let mut umin = vec![[0.0; 3]; nrange];
    let mut umax = vec![[0.0; 3]; nrange];

    let dbdxi_c = eval_dbdxi(rdof, CENTER);

    for lp in 0..4 {
        for c in range.0..=range.1 {
            let cm = c - range.0;
            for idir in 0..3 {
                umin[cm][idir] = unk[c][idir + 1];
                umax[cm][idir] = unk[c][idir + 1];
            }
        }

        let pnode = mesh.inpoel[4 * e + lp];

        // reference-space centroid derivatives of the surrounding elements
        for &er in &mesh.esup[pnode] {
            for c in range.0..=range.1 {
                let mark = c * rdof;
                let cm = c - range.0;
                for idir in 0..3 {
                    let mut slope = 0.0;
                    for idof in 1..rdof {
                        slope += u.get(er, mark + idof) * dbdxi_c[idir][idof];
                    }
                    umin[cm][idir] = umin[cm][idir].min(slope);
                    umax[cm][idir] = umax[cm][idir].max(slope);
                }
            }
        }

        // extrema contributed by neighbor partitions at this node
        if let Some(ext) = extrema {
            if let Some(&row) = ext.bid.get(&pnode) {
                for c in range.0..=range.1 {
                    let cm = c - range.0;
                    for idir in 0..3 {
                        let mm = ext.extrema[row][c * 3 + idir];
                        umax[cm][idir] = umax[cm][idir].max(mm[0]);
                        umin[cm][idir] = umin[cm][idir].min(mm[1]);
                    }
                }
            }
        }

        // candidate derivatives at the vertex from the Taylor expansion
        let node = CNODES[lp];
        let dx = node[0] - CENTER[0];
        let dy = node[1] - CENTER[1];
        let dz = node[2] - CENTER[2];

        for c in range.0..=range.1 {
            let cm = c - range.0;
            let state = [
                unk[c][1] + unk[c][4] * dx + unk[c][7] * dy + unk[c][8] * dz,
                unk[c][2] + unk[c][5] * dy + unk[c][7] * dx + unk[c][9] * dz,
                unk[c][3] + unk[c][6] * dz + unk[c][8] * dx + unk[c][9] * dy,
            ];

            for idir in 0..3 {
                let u_neg = state[idir] - unk[c][idir + 1];
                let uref = unk[c][idir + 1].abs().max(1.0e-14);
                let phi_dir = if u_neg > 1.0e-6 * uref {
                    1.0f64.min((umax[cm][idir] - unk[c][idir + 1]) / u_neg)
                } else if u_neg < -1.0e-6 * uref {
                    1.0f64.min((umin[cm][idir] - unk[c][idir + 1]) / u_neg)
                } else {
                    1.0
                };
                phi[c] = phi[c].min(phi_dir);
            }
        }
    }
}

/// Superbee limiting factors over all face quadrature points.
#[allow(clippy::too_many_arguments)]
pub fn superbee_limiting(
    u: &Fields,
    mesh: &TetMesh,
    e: usize,
    ndof: usize,
    rdof: usize,
    dof_e: usize,
    ncomp: usize,
    beta_lim: f64,
) -> Vec<f64> {
    // min/max over the face neighborhood
    let mut umin = vec![0.0; ncomp];
    let mut umax = vec![0.0; ncomp];
    for c in 0..ncomp {
        umin[c] = u.get(e, c * rdof);
        umax[c] = umin[c];
    }
    for lf in 0..4 {
        let nel = mesh.esuel[4 * e + lf];
        if nel == -1 {
            continue;
        }
        let n = nel as usize;
        for c in 0..ncomp {
            let v = u.get(n, c * rdof);
            umin[c] = umin[c].min(v);
            umax[c] = umax[c].max(v);
        }
    }

    let ng = ng_fa(ndof);
    let (xg, _) = gauss_quadrature_tri(ng);

    let coordel = mesh.coordel(e);
    let det_t = jacobian(&coordel[0], &coordel[1], &coordel[2], &coordel[3]);

    let mut phi: Vec<f64> = vec![1.0; ncomp];
    for lf in 0..4 {
        let coordfa = [
            coordel[LPOFA[lf][0]],
            coordel[LPOFA[lf][1]],
            coordel[LPOFA[lf][2]],
        ];

        for pg in &xg {
            let gp = eval_gp_tri(*pg, &coordfa);
            let rc = ref_coords_tet(gp, &coordel, det_t);
            let b = eval_basis(rdof, rc[0], rc[1], rc[2]);
            let state = eval_state(ncomp, rdof, dof_e, e, u, &b, (0, ncomp - 1));

            for c in 0..ncomp {
                let avg = u.get(e, c * rdof);
                let mut u_neg = state[c] - avg;
                let phi_gp = if u_neg > 1.0e-14 {
                    u_neg = u_neg.max(1.0e-8);
                    1.0f64.min((umax[c] - avg) / (2.0 * u_neg))
                } else if u_neg < -1.0e-14 {
                    u_neg = u_neg.min(-1.0e-8);
                    1.0f64.min((umin[c] - avg) / (2.0 * u_neg))
                } else {
                    1.0
                };
                let phi_gp = 0.0f64
                    .max((beta_lim * phi_gp).min(1.0).max(phi_gp.min(beta_lim)));
                phi[c] = phi[c].min(phi_gp);
            }
        }
    }

    phi
}

/// Bound-preserving limiter for the volume fractions: clip the factors so
/// every face (and, for P2, volume) quadrature point stays inside
/// `[1e-14, 1 - 1e-14]`.
pub fn bound_preserving_limiting(
    nmat: usize,
    ndof: usize,
    e: usize,
    mesh: &TetMesh,
    u: &Fields,
    phic_p1: &mut [f64],
    phic_p2: &mut [f64],
) {
    let ncomp = u.nprop() / ndof;
    let coordel = mesh.coordel(e);
    let det_t = jacobian(&coordel[0], &coordel[1], &coordel[2], &coordel[3]);

    let min = 1.0e-14;
    let max = 1.0 - min;

    let mut phi_bound: Vec<f64> = vec![1.0; nmat];

    // face quadrature points
    let ng = ng_fa(ndof);
    let (xg, _) = gauss_quadrature_tri(ng);
    for lf in 0..4 {
        let coordfa = [
            coordel[LPOFA[lf][0]],
            coordel[LPOFA[lf][1]],
            coordel[LPOFA[lf][2]],
        ];
        for pg in &xg {
            let gp = eval_gp_tri(*pg, &coordfa);
            let rc = ref_coords_tet(gp, &coordel, det_t);
            let b = eval_basis(ndof, rc[0], rc[1], rc[2]);
            let state = eval_state(ncomp, ndof, ndof, e, u, &b, (0, ncomp - 1));
            for (k, pb) in phi_bound.iter_mut().enumerate() {
                let phi = bound_preserving_function(
                    min,
                    max,
                    state[volfrac_idx(nmat, k)],
                    u.get(e, volfrac_dof_idx(nmat, k, ndof, 0)),
                );
                *pb = pb.min(phi);
            }
        }
    }

    // interior quadrature points for P2
    if ndof > 4 {
        let ng = ng_vol(ndof);
        let (xg, _) = gauss_quadrature_tet(ng);
        for pg in &xg {
            let b = eval_basis(ndof, pg[0], pg[1], pg[2]);
            let state = eval_state(ncomp, ndof, ndof, e, u, &b, (0, ncomp - 1));
            for (k, pb) in phi_bound.iter_mut().enumerate() {
                let phi = bound_preserving_function(
                    min,
                    max,
                    state[volfrac_idx(nmat, k)],
                    u.get(e, volfrac_dof_idx(nmat, k, ndof, 0)),
                );
                *pb = pb.min(phi);
            }
        }
    }

    for k in 0..nmat {
        let c = volfrac_idx(nmat, k);
        phic_p1[c] = phic_p1[c].min(phi_bound[k]);
    }
    if ndof > 4 {
        for k in 0..nmat {
            let c = volfrac_idx(nmat, k);
            phic_p2[c] = phic_p2[c].min(phi_bound[k]);
        }
    }
}

/// Bound-preserving limiter function for one quadrature-point excursion.
pub fn bound_preserving_function(min: f64, max: f64, al_gp: f64, al_avg: f64) -> f64 {
    if al_gp > max {
        ((max - al_avg) / (al_gp - al_avg)).abs()
    } else if al_gp < min {
        ((min - al_avg) / (al_gp - al_avg)).abs()
    } else {
        1.0
    }
}

/// Positivity-preserving limiter for partial densities, partial energies
/// and material pressures (against their EOS floors).
#[allow(clippy::too_many_arguments)]
pub fn positivity_limiting_multimat(
    nmat: usize,
    mat_blk: &[MaterialEos],
    ndof: usize,
    e: usize,
    mesh: &TetMesh,
    u: &Fields,
    p: &Fields,
    phic_p1: &mut [f64],
    phic_p2: &mut [f64],
    phip_p1: &mut [f64],
    phip_p2: &mut [f64],
) {
    let ncomp = u.nprop() / ndof;
    let nprim = p.nprop() / ndof;

    let coordel = mesh.coordel(e);
    let det_t = jacobian(&coordel[0], &coordel[1], &coordel[2], &coordel[3]);

    let min = 1.0e-15;

    let mut phic_bound: Vec<f64> = vec![1.0; ncomp];
    let mut phip_bound: Vec<f64> = vec![1.0; nprim];

    let mut probe = |state: &[f64], sprim: &[f64]| {
        for (k, mat) in mat_blk.iter().enumerate() {
            // material density
            let rho = state[density_idx(nmat, k)];
            let rho_avg = u.get(e, density_dof_idx(nmat, k, ndof, 0));
            let phi_rho = positivity_function(min, rho, rho_avg);
            let c = density_idx(nmat, k);
            phic_bound[c] = phic_bound[c].min(phi_rho);
            // material energy
            let rhoe = state[energy_idx(nmat, k)];
            let rhoe_avg = u.get(e, energy_dof_idx(nmat, k, ndof, 0));
            let phi_rhoe = positivity_function(min, rhoe, rhoe_avg);
            let c = energy_idx(nmat, k);
            phic_bound[c] = phic_bound[c].min(phi_rhoe);
            // material pressure against the EOS floor
            let min_pre = mat.min_eff_pressure(min);
            let pre = sprim[pressure_idx(nmat, k)];
            let pre_avg = p.get(e, pressure_dof_idx(nmat, k, ndof, 0));
            let phi_pre = positivity_function(min_pre, pre, pre_avg);
            let c = pressure_idx(nmat, k);
            phip_bound[c] = phip_bound[c].min(phi_pre);
        }
    };

    let ng = ng_fa(ndof);
    let (xg, _) = gauss_quadrature_tri(ng);
    for lf in 0..4 {
        let coordfa = [
            coordel[LPOFA[lf][0]],
            coordel[LPOFA[lf][1]],
            coordel[LPOFA[lf][2]],
        ];
        for pg in &xg {
            let gp = eval_gp_tri(*pg, &coordfa);
            let rc = ref_coords_tet(gp, &coordel, det_t);
            let b = eval_basis(ndof, rc[0], rc[1], rc[2]);
            let state = eval_state(ncomp, ndof, ndof, e, u, &b, (0, ncomp - 1));
            let sprim = eval_state(nprim, ndof, ndof, e, p, &b, (0, nprim - 1));
            probe(&state, &sprim);
        }
    }

    if ndof > 4 {
        let ng = ng_vol(ndof);
        let (xg, _) = gauss_quadrature_tet(ng);
        for pg in &xg {
            let b = eval_basis(ndof, pg[0], pg[1], pg[2]);
            let state = eval_state(ncomp, ndof, ndof, e, u, &b, (0, ncomp - 1));
            let sprim = eval_state(nprim, ndof, ndof, e, p, &b, (0, nprim - 1));
            probe(&state, &sprim);
        }
    }

    // apply to everything but the volume fractions
    for c in volfrac_idx(nmat, nmat)..ncomp {
        phic_p1[c] = phic_p1[c].min(phic_bound[c]);
    }
    for c in pressure_idx(nmat, 0)..pressure_idx(nmat, nmat) {
        phip_p1[c] = phip_p1[c].min(phip_bound[c]);
    }
    if ndof > 4 {
        for c in volfrac_idx(nmat, nmat)..ncomp {
            phic_p2[c] = phic_p2[c].min(phic_bound[c]);
        }
        for c in pressure_idx(nmat, 0)..pressure_idx(nmat, nmat) {
            phip_p2[c] = phip_p2[c].min(phip_bound[c]);
        }
    }
}

/// Positivity limiter function for one quadrature-point excursion.
pub fn positivity_function(min: f64, u_gp: f64, u_avg: f64) -> f64 {
    let diff = u_gp - u_avg;
    if u_gp < min && diff.abs() > 1.0e-13 {
        ((min - u_avg) / diff).abs()
    } else {
        1.0
    }
}

/// Consistent limiter modifications for the material system.
///
/// In interface cells the high-order dofs of partial densities and energies
/// are slaved to the volume-fraction dofs (so the non-fraction part of the
/// interface state is piecewise constant), and one common factor is used
/// across the volume fractions, densities and energies. Outside interface
/// cells only the fractions share a common factor.
pub fn consistent_multimat_limiting_p1(
    nmat: usize,
    rdof: usize,
    e: usize,
    u: &mut Fields,
    phic_p1: &mut [f64],
    phic_p2: &mut [f64],
) {
    let mut phi_al_p1 = 1.0f64;
    let mut phi_al_p2 = 1.0f64;
    let mut almax = 0.0f64;
    for k in 0..nmat {
        phi_al_p1 = phi_al_p1.min(phic_p1[volfrac_idx(nmat, k)]);
        if rdof > 4 {
            phi_al_p2 = phi_al_p2.min(phic_p2[volfrac_idx(nmat, k)]);
        }
        almax = almax.max(u.get(e, volfrac_dof_idx(nmat, k, rdof, 0)));
    }

    let al_band = 1.0e-4;

    if almax > al_band && almax < 1.0 - al_band {
        // interface cell: slave the high-order density and energy dofs to
        // the fraction dofs
        for k in 0..nmat {
            let alk = u.get(e, volfrac_dof_idx(nmat, k, rdof, 0)).max(1.0e-14);
            let rhok = u.get(e, density_dof_idx(nmat, k, rdof, 0)) / alk;
            let rhoe = u.get(e, energy_dof_idx(nmat, k, rdof, 0)) / alk;
            for idof in 1..rdof {
                let al_dof = u.get(e, volfrac_dof_idx(nmat, k, rdof, idof));
                u.set(e, density_dof_idx(nmat, k, rdof, idof), rhok * al_dof);
                u.set(e, energy_dof_idx(nmat, k, rdof, idof), rhoe * al_dof);
            }
        }

        for k in 0..nmat {
            phic_p1[volfrac_idx(nmat, k)] = phi_al_p1;
            phic_p1[density_idx(nmat, k)] = phi_al_p1;
            phic_p1[energy_idx(nmat, k)] = phi_al_p1;
        }
        if rdof > 4 {
            for k in 0..nmat {
                phic_p2[volfrac_idx(nmat, k)] = phi_al_p2;
                phic_p2[density_idx(nmat, k)] = phi_al_p2;
                phic_p2[energy_idx(nmat, k)] = phi_al_p2;
            }
        }
    } else {
        for k in 0..nmat {
            phic_p1[volfrac_idx(nmat, k)] = phi_al_p1;
        }
        if rdof > 4 {
            for k in 0..nmat {
                phic_p2[volfrac_idx(nmat, k)] = phi_al_p2;
            }
        }
    }
}

/// Face-integral discontinuity indicator.
///
/// Integrates the jump of the bulk mass flux `rho v . n` over each
/// internal face and scatters it to both neighbors; the per-cell value is
/// normalized by the sampled face measure, so it reads as the mean flux
/// jump seen by the cell. Cells whose indicator exceeds `10^-5.7` are
/// marked.
pub fn eval_disc_indicator(
    args: &LimiterArgs,
    mesh: &TetMesh,
    u: &Fields,
    p: &Fields,
    ndofel: &[usize],
) -> Vec<f64> {
    let (nmat, ndof, rdof) = (args.nmat, args.ndof, args.rdof);
    let ncomp = u.nprop() / rdof;
    let nprim = p.nprop() / rdof;

    let mut ic = vec![0.0; mesh.nelem()];
    let mut measure = vec![0.0; mesh.nelem()];

    for f in mesh.nbfac..mesh.nfac() {
        let el = mesh.esuf[2 * f] as usize;
        let er = mesh.esuf[2 * f + 1] as usize;

        let ng = ng_fa(ndofel[el]).max(ng_fa(ndofel[er]));
        let (xg, wg) = gauss_quadrature_tri(ng);

        let coordel_l = mesh.coordel(el);
        let coordel_r = mesh.coordel(er);
        let det_l = jacobian(&coordel_l[0], &coordel_l[1], &coordel_l[2], &coordel_l[3]);
        let det_r = jacobian(&coordel_r[0], &coordel_r[1], &coordel_r[2], &coordel_r[3]);
        let coordfa = mesh.coordfa(f);

        let gf = &mesh.geo_face[f];
        let fnorm = gf.normal;

        let dof_l = dof_el(false, ndof, rdof, ndofel[el]);
        let dof_r = dof_el(false, ndof, rdof, ndofel[er]);

        for (pg, w) in xg.iter().zip(&wg) {
            let gp = eval_gp_tri(*pg, &coordfa);
            let ref_l = ref_coords_tet(gp, &coordel_l, det_l);
            let ref_r = ref_coords_tet(gp, &coordel_r, det_r);
            let b_l = eval_basis(dof_l, ref_l[0], ref_l[1], ref_l[2]);
            let b_r = eval_basis(dof_r, ref_r[0], ref_r[1], ref_r[2]);

            let wt = w * gf.area;

            let state_l = eval_polynomial_sol(
                0, 0.0, ncomp, nprim, rdof, nmat, el, dof_l, mesh, ref_l, &b_l, u, p,
            );
            let state_r = eval_polynomial_sol(
                0, 0.0, ncomp, nprim, rdof, nmat, er, dof_r, mesh, ref_r, &b_r, u, p,
            );

            let mut rhol = 0.0;
            let mut rhor = 0.0;
            for k in 0..nmat {
                rhol += state_l[density_idx(nmat, k)];
                rhor += state_r[density_idx(nmat, k)];
            }

            let mut fl = 0.0;
            let mut fr = 0.0;
            for (i, n) in fnorm.iter().enumerate() {
                fl += rhol * state_l[ncomp + velocity_idx(nmat, i)] * n;
                fr += rhor * state_r[ncomp + velocity_idx(nmat, i)] * n;
            }

            let jump = wt * (fl - fr).abs();
            ic[el] += jump;
            ic[er] += jump;
            measure[el] += wt;
            measure[er] += wt;
        }
    }

    for (v, m) in ic.iter_mut().zip(&measure) {
        if *m > 0.0 {
            *v /= *m;
        }
    }

    ic
}
