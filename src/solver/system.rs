//! The multi-material DG system driver.
//!
//! [`MultiMatSystem`] owns the immutable configuration (input-deck flags,
//! material block, boundary-condition attachments, problem initializer) and
//! exposes the per-stage pipeline: update primitives, reconstruct, compute
//! the RHS, limit, restore conservative consistency, clean trace materials,
//! control the time step and adapt the local polynomial degree. The fields
//! themselves (U, P, ndofel, shockmarker) belong to the caller; the driver
//! mutates them only where the pipeline says so.

use std::sync::Arc;

use crate::basis::{eval_basis, mass_matrix_dubiner, taylor_mass_inverse_ref_el};
use crate::boundary::{self, BcSpec, BcStateFn, InitializeFn};
use crate::config::{Config, LimiterType};
use crate::eos::MaterialEos;
use crate::error::MultiMatError;
use crate::fields::Fields;
use crate::flux::RiemannFlux;
use crate::mesh::geometry::eval_gp_tet;
use crate::mesh::TetMesh;
use crate::quadrature::{gauss_quadrature_tet, ng_vol};
use crate::reconstruction::{
    bnd_least_sq_p0p1, int_least_sq_p0p1, lhs_least_sq_p0p1, reco_least_sq_ext_stencil,
    solve_least_sq_p0p1, transform_p0p1,
};
use crate::state::{eval_state, interface_indicator};
use crate::time::rk3_stage;
use crate::types::{
    density_dof_idx, density_idx, energy_dof_idx, energy_idx, momentum_dof_idx, momentum_idx,
    ncomp as ncomp_of, nprim as nprim_of, pressure_idx, velocity_idx, volfrac_dof_idx,
    volfrac_idx,
};

use super::adaptivity;
use super::boundary_int::bnd_surf_int;
use super::cleanup::{clean_trace_multimat, correct_lim_conserv_multimat};
use super::limiter::{
    superbee_multimat_p1, vertex_based_multimat_p1, vertex_based_multimat_p2, LimiterArgs,
    NodalExtrema,
};
use super::multimat_terms::{non_conservative_int, pressure_relaxation_int, solve_vriem};
use super::surface::{surf_int, SurfIntArgs};
use super::timestep;
use super::volume::vol_int;

/// Compressible multi-material flow system, cell-centered DG.
pub struct MultiMatSystem {
    config: Config,
    mat_blk: Vec<MaterialEos>,
    /// Solid index per material: 0 for fluids, 1-based solid counter else.
    solidx: Vec<usize>,
    bc: Vec<(BcSpec, Vec<i32>)>,
    initialize: Option<Arc<InitializeFn>>,
    /// Inverse reference Taylor mass matrix, set up once for P2 limiting.
    mt_inv: Option<Vec<Vec<f64>>>,
}

impl MultiMatSystem {
    /// Set up the system; fails on any configuration the core cannot run.
    pub fn new(
        config: Config,
        mat_blk: Vec<MaterialEos>,
        solidx: Vec<usize>,
        bc: Vec<(BcSpec, Vec<i32>)>,
        initialize: Option<Arc<InitializeFn>>,
    ) -> Result<Self, MultiMatError> {
        config.validate()?;
        if config.limiter == LimiterType::WenoP1 {
            return Err(MultiMatError::Config(
                "wenop1 limiter is not configured for multimat".into(),
            ));
        }
        if mat_blk.is_empty() {
            return Err(MultiMatError::Config("no materials configured".into()));
        }
        for (k, mat) in mat_blk.iter().enumerate() {
            mat.validate(k)?;
        }
        if solidx.len() != mat_blk.len() {
            return Err(MultiMatError::Config(
                "solidx must carry one entry per material".into(),
            ));
        }
        if initialize.is_none()
            && bc.iter().any(|(spec, _)| matches!(spec, BcSpec::Dirichlet))
        {
            return Err(MultiMatError::Config(
                "dirichlet boundary conditions need a problem initializer".into(),
            ));
        }

        let mt_inv = (config.rdof() == 10).then(|| taylor_mass_inverse_ref_el(10));

        Ok(Self {
            config,
            mat_blk,
            solidx,
            bc,
            initialize,
            mt_inv,
        })
    }

    /// Number of materials.
    pub fn nmat(&self) -> usize {
        self.mat_blk.len()
    }

    /// Number of solid materials.
    pub fn nsld(&self) -> usize {
        self.solidx.iter().filter(|&&s| s > 0).count()
    }

    /// Number of conserved components.
    pub fn ncomp(&self) -> usize {
        ncomp_of(self.nmat(), self.nsld())
    }

    /// Number of primitive components.
    pub fn nprim(&self) -> usize {
        nprim_of(self.nmat())
    }

    /// The configuration this system runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The material block.
    pub fn materials(&self) -> &[MaterialEos] {
        &self.mat_blk
    }

    /// Solved dofs per component: volume fractions are P0-solved and
    /// reconstructed whenever more than one material is present.
    pub fn num_equation_dofs(&self) -> Vec<usize> {
        let nmat = self.nmat();
        let mut dofs = vec![self.config.ndof(); self.ncomp()];
        if nmat > 1 {
            for k in 0..nmat {
                dofs[volfrac_idx(nmat, k)] = 1;
            }
        }
        dofs
    }

    /// Check the boundary-condition attachments against a mesh: every
    /// named side set must exist, and every mesh side set must be covered.
    pub fn validate_bc(&self, mesh: &TetMesh) -> Result<(), MultiMatError> {
        for (spec, side_sets) in &self.bc {
            for ss in side_sets {
                if !mesh.bface.contains_key(ss) {
                    return Err(MultiMatError::BoundaryCondition {
                        side_set: *ss,
                        message: format!("side set unknown to the mesh ({})", spec.name()),
                    });
                }
            }
        }
        for ss in mesh.bface.keys() {
            if !self
                .bc
                .iter()
                .any(|(_, sets)| sets.contains(ss))
            {
                return Err(MultiMatError::BoundaryCondition {
                    side_set: *ss,
                    message: "no boundary condition attached".into(),
                });
            }
        }
        Ok(())
    }

    /// Build the state-function closure of one boundary-condition spec.
    fn bc_closure(&self, spec: &BcSpec) -> Box<BcStateFn> {
        match spec {
            BcSpec::Dirichlet => {
                let init = self
                    .initialize
                    .clone()
                    .expect("validated at construction");
                Box::new(move |m, ul, x, t, n| boundary::dirichlet(m, &*init, ul, x, t, n))
            }
            BcSpec::Symmetry => Box::new(|m, ul, x, t, n| boundary::symmetry(m, ul, x, t, n)),
            BcSpec::Extrapolate => {
                Box::new(|m, ul, x, t, n| boundary::extrapolate(m, ul, x, t, n))
            }
            BcSpec::FarfieldOutlet(far) => {
                let far = far.clone();
                Box::new(move |m, ul, x, t, n| boundary::farfield_outlet(m, &far, ul, x, t, n))
            }
            BcSpec::StagnationPoint { point, radius } => {
                let (point, radius) = (*point, *radius);
                Box::new(move |m, ul, x, t, n| {
                    boundary::stagnation_point(m, point, radius, ul, x, t, n)
                })
            }
            BcSpec::Sponge { reference, coeff } => {
                let (reference, coeff) = (reference.clone(), *coeff);
                Box::new(move |m, ul, x, t, n| {
                    boundary::sponge(m, &reference, coeff, ul, x, t, n)
                })
            }
            BcSpec::TimeDependent { table } => {
                let table = table.clone();
                Box::new(move |m, ul, x, t, n| boundary::time_dependent(m, &table, ul, x, t, n))
            }
        }
    }

    /// Project the problem initializer onto the modal basis and derive the
    /// primitive field; returns `(U, P, ndofel, shockmarker)`.
    pub fn initialize_fields(
        &self,
        mesh: &TetMesh,
        t: f64,
    ) -> Result<(Fields, Fields, Vec<usize>, Vec<usize>), MultiMatError> {
        let init = self.initialize.as_ref().ok_or_else(|| {
            MultiMatError::Config("no problem initializer configured".into())
        })?;

        let (ncomp, nprim) = (self.ncomp(), self.nprim());
        let (ndof, rdof) = (self.config.ndof(), self.config.rdof());
        let nelem = mesh.nelem();

        let mut u = Fields::new(nelem, ncomp * rdof);
        let mut p = Fields::new(nelem, nprim * rdof);

        let ng = ng_vol(ndof.max(rdof));
        let (xg, wg) = gauss_quadrature_tet(ng);

        for e in 0..nelem {
            let vol = mesh.geo_elem[e].vol;
            let l = mass_matrix_dubiner(ndof, vol);
            let coordel = mesh.coordel(e);

            let mut rhs = vec![0.0; ncomp * ndof];
            for (pg, w) in xg.iter().zip(&wg) {
                let gp = eval_gp_tet(*pg, &coordel);
                let s = init(&self.mat_blk, gp, t);
                debug_assert_eq!(s.len(), ncomp);
                let b = eval_basis(ndof, pg[0], pg[1], pg[2]);
                let wt = w * vol;
                for (c, sc) in s.iter().enumerate() {
                    for (idof, bi) in b.iter().enumerate() {
                        rhs[c * ndof + idof] += wt * sc * bi;
                    }
                }
            }
            for c in 0..ncomp {
                for idof in 0..ndof {
                    u.set(e, c * rdof + idof, rhs[c * ndof + idof] / l[idof]);
                }
            }
        }

        let ndofel = vec![ndof; nelem];
        let shockmarker = vec![0usize; nelem];

        self.update_primitives(mesh, &u, &ndofel, &mut p)?;

        Ok((u, p, ndofel, shockmarker))
    }

    /// Recompute the modal primitive field from the conserved field by
    /// quadrature projection, flooring pressures through the EOS.
    pub fn update_primitives(
        &self,
        mesh: &TetMesh,
        u: &Fields,
        ndofel: &[usize],
        p: &mut Fields,
    ) -> Result<(), MultiMatError> {
        let nmat = self.nmat();
        let (ncomp, nprim) = (self.ncomp(), self.nprim());
        let rdof = self.config.rdof();

        if u.nunk() != p.nunk() {
            return Err(MultiMatError::Contract(
                "solution and primitive vectors disagree in length".into(),
            ));
        }

        for e in 0..mesh.nelem() {
            // reconstructed representation for P0P1 elements
            let dof_e = if ndofel[e] == 1 && rdof > 1 {
                rdof.min(4)
            } else {
                ndofel[e]
            };

            let ng = ng_vol(dof_e);
            let (xg, wg) = gauss_quadrature_tet(ng);
            let vol = mesh.geo_elem[e].vol;
            let l = mass_matrix_dubiner(dof_e, vol);

            let mut rhs = vec![0.0; nprim * dof_e];

            for (pg, w) in xg.iter().zip(&wg) {
                let b = eval_basis(dof_e, pg[0], pg[1], pg[2]);
                let wt = w * vol;

                let state = eval_state(ncomp, rdof, dof_e, e, u, &b, (0, ncomp - 1));

                let mut rhob = 0.0;
                for k in 0..nmat {
                    rhob += state[density_idx(nmat, k)];
                }
                let vel = [
                    state[momentum_idx(nmat, 0)] / rhob,
                    state[momentum_idx(nmat, 1)] / rhob,
                    state[momentum_idx(nmat, 2)] / rhob,
                ];

                let mut pri = vec![0.0; nprim];
                for (k, mat) in self.mat_blk.iter().enumerate() {
                    let apr = mat.pressure(
                        state[density_idx(nmat, k)],
                        vel[0],
                        vel[1],
                        vel[2],
                        state[energy_idx(nmat, k)],
                        state[volfrac_idx(nmat, k)],
                    );
                    if !apr.is_finite() {
                        return Err(MultiMatError::NonFiniteEos {
                            quantity: "pressure",
                            value: apr,
                            element: e,
                            material: k,
                            alpha: state[volfrac_idx(nmat, k)],
                            partial_density: state[density_idx(nmat, k)],
                        });
                    }
                    pri[pressure_idx(nmat, k)] =
                        mat.constrain_pressure(apr, state[volfrac_idx(nmat, k)]);
                }
                for d in 0..3 {
                    pri[velocity_idx(nmat, d)] = vel[d];
                }

                for (k, pk) in pri.iter().enumerate() {
                    let mark = k * dof_e;
                    for (idof, bi) in b.iter().enumerate() {
                        rhs[mark + idof] += wt * pk * bi;
                    }
                }
            }

            for k in 0..nprim {
                for idof in 0..dof_e {
                    let mut v = rhs[k * dof_e + idof] / l[idof];
                    if v.abs() < 1.0e-16 {
                        v = 0.0;
                    }
                    p.set(e, k * rdof + idof, v);
                }
            }
        }

        Ok(())
    }

    /// Reconstruct second-order dofs from cell means.
    ///
    /// For P0P1 all components are reconstructed over the face stencil,
    /// with boundary ghosts from the BC state functions. Higher-order DG
    /// reconstructs only the volume fractions (their solved representation
    /// is P0), over the extended nodal stencil for a good interface-normal
    /// estimate.
    pub fn reconstruct(
        &self,
        t: f64,
        mesh: &TetMesh,
        u: &mut Fields,
        p: &mut Fields,
        ndofel: &[usize],
    ) {
        let (ndof, rdof) = (self.config.ndof(), self.config.rdof());
        if rdof == 1 {
            return;
        }

        let nmat = self.nmat();
        let (ncomp, nprim) = (self.ncomp(), self.nprim());
        let nelem = mesh.nelem();
        let is_p0p1 = rdof > ndof;

        if is_p0p1 {
            // conserved quantities over the face stencil with BC ghosts
            let mut lhs = vec![[[0.0; 3]; 3]; nelem];
            lhs_least_sq_p0p1(mesh, &mut lhs);

            let mut rhs = vec![vec![[0.0; 3]; ncomp]; nelem];
            int_least_sq_p0p1(ncomp, rdof, mesh, u, &mut rhs, (0, ncomp - 1));
            for (spec, side_sets) in &self.bc {
                let state_fn = self.bc_closure(spec);
                bnd_least_sq_p0p1(
                    ncomp,
                    rdof,
                    mesh,
                    &self.mat_blk,
                    side_sets,
                    &*state_fn,
                    t,
                    u,
                    &mut rhs,
                    (0, ncomp - 1),
                    nprim,
                    true,
                );
            }
            solve_least_sq_p0p1(ncomp, rdof, &lhs, &rhs, u, (0, ncomp - 1));
            let all: Vec<(usize, usize)> = vec![(0, ncomp - 1); nelem];
            transform_p0p1(rdof, mesh, u, &all);

            // primitive quantities likewise
            let mut rhs = vec![vec![[0.0; 3]; nprim]; nelem];
            int_least_sq_p0p1(nprim, rdof, mesh, p, &mut rhs, (0, nprim - 1));
            for (spec, side_sets) in &self.bc {
                let state_fn = self.bc_closure(spec);
                bnd_least_sq_p0p1(
                    nprim,
                    rdof,
                    mesh,
                    &self.mat_blk,
                    side_sets,
                    &*state_fn,
                    t,
                    p,
                    &mut rhs,
                    (0, nprim - 1),
                    ncomp,
                    false,
                );
            }
            solve_least_sq_p0p1(nprim, rdof, &lhs, &rhs, p, (0, nprim - 1));
            let all: Vec<(usize, usize)> = vec![(0, nprim - 1); nelem];
            transform_p0p1(rdof, mesh, p, &all);
        } else if ndof > 1 {
            // volume fractions only, over the nodal stencil
            let al_range = (volfrac_idx(nmat, 0), volfrac_idx(nmat, nmat - 1));
            let var_range: Vec<(usize, usize)> = (0..nelem)
                .map(|e| {
                    if self.config.pref && ndofel[e] == 1 {
                        (0, ncomp - 1)
                    } else {
                        al_range
                    }
                })
                .collect();
            for e in 0..nelem {
                reco_least_sq_ext_stencil(rdof, e, mesh, u, var_range[e]);
            }
            transform_p0p1(rdof, mesh, u, &var_range);
        }
    }

    /// Compute the right-hand side of one stage into `r`.
    pub fn rhs(
        &self,
        t: f64,
        mesh: &TetMesh,
        u: &Fields,
        p: &Fields,
        ndofel: &[usize],
        r: &mut Fields,
    ) -> Result<(), MultiMatError> {
        let nmat = self.nmat();
        let (ndof, rdof) = (self.config.ndof(), self.config.rdof());
        let nelem = mesh.nelem();

        if u.nunk() != r.nunk() || u.nunk() != p.nunk() {
            return Err(MultiMatError::Contract(
                "solution, primitive and RHS vectors disagree in length".into(),
            ));
        }
        if r.nprop() != self.ncomp() * ndof {
            return Err(MultiMatError::Contract(format!(
                "RHS vector must carry {} properties",
                self.ncomp() * ndof
            )));
        }

        r.fill(0.0);

        // Riemann data for the non-conservative terms: 3*nmat rows of
        // partial-pressure gradients plus rdof rows of velocity-divergence
        // projections (sized conservatively to the reconstructed dofs)
        let mut riemann_deriv = vec![vec![0.0; nelem]; 3 * nmat + rdof];
        let mut vriem: Vec<Vec<f64>> = vec![Vec::new(); nelem];
        let mut riemann_loc: Vec<Vec<f64>> = vec![Vec::new(); nelem];

        let args = SurfIntArgs {
            pref: self.config.pref,
            nmat,
            solidx: &self.solidx,
            mat_blk: &self.mat_blk,
            t,
            ndof,
            rdof,
            intsharp: self.config.intsharp,
            intsharp_param: self.config.intsharp_param,
        };
        let riemann = RiemannFlux::from(self.config.flux);

        surf_int(
            &args,
            mesh,
            riemann,
            u,
            p,
            ndofel,
            r,
            &mut vriem,
            &mut riemann_loc,
            &mut riemann_deriv,
        );

        if ndof > 1 {
            vol_int(&args, mesh, u, p, ndofel, r);
        }

        for (spec, side_sets) in &self.bc {
            let state_fn = self.bc_closure(spec);
            bnd_surf_int(
                &args,
                mesh,
                side_sets,
                riemann,
                &*state_fn,
                u,
                p,
                ndofel,
                r,
                &mut riemann_deriv,
            );
        }

        // face accumulations become cell means
        for row in riemann_deriv.iter_mut() {
            for (e, v) in row.iter_mut().enumerate() {
                *v /= mesh.geo_elem[e].vol;
            }
        }

        let vriempoly = solve_vriem(nelem, &vriem, &riemann_loc);

        non_conservative_int(
            self.config.pref,
            nmat,
            ndof,
            rdof,
            mesh,
            u,
            p,
            &riemann_deriv,
            &vriempoly,
            ndofel,
            r,
        );

        if self.config.prelax != 0 {
            pressure_relaxation_int(
                self.config.pref,
                nmat,
                &self.mat_blk,
                ndof,
                rdof,
                mesh,
                u,
                p,
                ndofel,
                self.config.prelax_timescale,
                r,
            );
        }

        Ok(())
    }

    /// Apply the configured limiter to conserved and primitive fields.
    pub fn limit(
        &self,
        mesh: &TetMesh,
        u: &mut Fields,
        p: &mut Fields,
        ndofel: &[usize],
        shockmarker: &mut [usize],
        u_extrema: Option<&NodalExtrema>,
        p_extrema: Option<&NodalExtrema>,
    ) -> Result<(), MultiMatError> {
        let rdof = self.config.rdof();
        let args = LimiterArgs {
            nmat: self.nmat(),
            mat_blk: &self.mat_blk,
            ndof: self.config.ndof(),
            rdof,
            intsharp: self.config.intsharp,
            shock_detection: self.config.shock_detection,
            accuracy_test: self.config.accuracy_test,
        };

        match (self.config.limiter, rdof) {
            (LimiterType::NoLimiter, _) => {}
            (LimiterType::SuperbeeP1, 4) => superbee_multimat_p1(&args, mesh, u, p, ndofel),
            (LimiterType::VertexBasedP1, 4) => {
                vertex_based_multimat_p1(&args, mesh, u, p, ndofel, shockmarker)
            }
            (LimiterType::VertexBasedP1, 10) => {
                let mt_inv = self.mt_inv.as_ref().expect("set up at construction");
                vertex_based_multimat_p2(
                    &args, mesh, u_extrema, p_extrema, mt_inv, u, p, ndofel, shockmarker,
                );
            }
            (limiter, rdof) => {
                return Err(MultiMatError::Config(format!(
                    "limiter {limiter:?} not configured for multimat with rdof {rdof}"
                )));
            }
        }
        Ok(())
    }

    /// Re-project conserved quantities consistent with limited primitives.
    pub fn correct_conserv(&self, mesh: &TetMesh, prim: &Fields, u: &mut Fields) {
        if self.config.rdof() > 1 {
            correct_lim_conserv_multimat(
                mesh,
                &self.mat_blk,
                self.nmat(),
                self.config.rdof(),
                prim,
                u,
            );
        }
    }

    /// Clean up trace materials; fails the step on a negative density.
    pub fn clean_trace_material(
        &self,
        mesh: &TetMesh,
        u: &mut Fields,
        p: &mut Fields,
    ) -> Result<(), MultiMatError> {
        clean_trace_multimat(
            mesh.nelem(),
            &self.mat_blk,
            &self.solidx,
            &mesh.geo_elem,
            self.nmat(),
            self.config.rdof(),
            u,
            p,
        )
    }

    /// Reset the high-order dofs of interface cells when interface
    /// compression is active: THINC owns the in-cell profile there.
    pub fn update_interface_cells(&self, u: &mut Fields, nelem: usize) {
        if self.config.intsharp == 0 {
            return;
        }
        let nmat = self.nmat();
        let rdof = self.config.rdof();

        for e in 0..nelem {
            let mut al_avg = vec![0.0; nmat];
            for (k, a) in al_avg.iter_mut().enumerate() {
                *a = u.get(e, volfrac_dof_idx(nmat, k, rdof, 0));
            }
            let mut mat_int = vec![0usize; nmat];
            if interface_indicator(nmat, &al_avg, &mut mat_int) {
                for k in 0..nmat {
                    if mat_int[k] == 1 {
                        for i in 1..rdof {
                            u.set(e, density_dof_idx(nmat, k, rdof, i), 0.0);
                            u.set(e, energy_dof_idx(nmat, k, rdof, i), 0.0);
                        }
                    }
                }
                for idir in 0..3 {
                    for i in 1..rdof {
                        u.set(e, momentum_dof_idx(nmat, idir, rdof, i), 0.0);
                    }
                }
            }
        }
    }

    /// Minimum admissible time step, CFL- and order-scaled.
    pub fn dt(&self, mesh: &TetMesh, u: &Fields, p: &Fields) -> f64 {
        timestep::dt_multimat(
            &self.mat_blk,
            mesh,
            self.nmat(),
            self.config.ndof(),
            self.config.rdof(),
            self.config.cfl,
            u,
            p,
        )
    }

    /// Evaluate the p-adaptive indicator and adjust `ndofel`, zeroing the
    /// coefficients that changed activation. Shock-marked cells derefine
    /// regardless of their spectral content.
    pub fn eval_ndof(
        &self,
        u: &mut Fields,
        p: &mut Fields,
        ndofel: &mut [usize],
        shockmarker: &[usize],
    ) {
        if !self.config.pref {
            return;
        }
        adaptivity::eval_ndof(
            self.ncomp(),
            self.config.rdof(),
            self.config.ndofmax,
            self.config.tolref,
            self.config.tolderef,
            shockmarker,
            u,
            ndofel,
        );
        adaptivity::reset_adap_sol(self.config.rdof(), ndofel, u, p);
    }

    /// Take one SSP-RK3 time step through the full pipeline.
    ///
    /// This is the single-partition convenience driver; a parallel runtime
    /// interleaves the same calls with ghost exchanges.
    #[allow(clippy::too_many_arguments)]
    pub fn take_step(
        &self,
        t: f64,
        dt: f64,
        mesh: &TetMesh,
        u: &mut Fields,
        p: &mut Fields,
        ndofel: &[usize],
        shockmarker: &mut [usize],
    ) -> Result<(), MultiMatError> {
        let (ndof, rdof) = (self.config.ndof(), self.config.rdof());
        let num_eq_dof = self.num_equation_dofs();
        let un = u.clone();

        // stage abscissae of the Shu-Osher scheme, for time-dependent
        // boundary states
        const STAGE_TIME: [f64; 3] = [0.0, 1.0, 0.5];

        for stage in 0..3 {
            let ts = t + STAGE_TIME[stage] * dt;
            self.reconstruct(ts, mesh, u, p, ndofel);
            self.limit(mesh, u, p, ndofel, shockmarker, None, None)?;
            self.correct_conserv(mesh, p, u);

            let mut r = Fields::new(mesh.nelem(), self.ncomp() * ndof);
            self.rhs(ts, mesh, u, p, ndofel, &mut r)?;

            rk3_stage(stage, ndof, rdof, &num_eq_dof, mesh, ndofel, dt, &un, &r, u);

            self.update_primitives(mesh, u, ndofel, p)?;
            // cleanup pins the majority-pressure mean to the EOS of cell
            // means; accuracy studies run without that interference
            if !self.config.accuracy_test {
                self.clean_trace_material(mesh, u, p)?;
                self.update_interface_cells(u, mesh.nelem());
            }
        }

        Ok(())
    }
}
