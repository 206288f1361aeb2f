//! Isentropic vortex advection: formal-order convergence of DGP2.
//!
//! A single-material isentropic vortex is advected by a uniform stream;
//! the exact solution is the initial field translated, imposed on all
//! boundaries through time-dependent Dirichlet states. No limiting is
//! needed (the flow is smooth), and the run uses the accuracy-test flag so
//! the robustness passes do not interfere with formal order. The L2
//! density error must scale as h^3: halving the mesh spacing divides the
//! error by a factor in [7, 9].

use std::sync::Arc;

use multimat_dg::basis::eval_basis;
use multimat_dg::mesh::geometry::eval_gp_tet;
use multimat_dg::quadrature::{gauss_quadrature_tet, ng_vol};
use multimat_dg::solver::MultiMatSystem;
use multimat_dg::state::eval_state;
use multimat_dg::types::{density_idx, energy_idx, momentum_idx, volfrac_idx};
use multimat_dg::{
    BcSpec, Config, Fields, FluxType, InitializeFn, LimiterType, MaterialEos, Scheme,
    StiffenedGas, TetMesh,
};

const GAMMA: f64 = 1.4;
const U_INF: f64 = 1.0;
/// Vortex core radius; wide against the coarse spacing so both meshes sit
/// in the asymptotic range.
const R_V: f64 = 0.35;
const BETA: f64 = 1.0;
const T_END: f64 = 0.025;

/// Primitive vortex state at a physical point and time.
fn vortex_primitives(x: [f64; 3], t: f64) -> (f64, [f64; 3], f64) {
    use std::f64::consts::PI;

    let xc = 0.5 + U_INF * t;
    let yc = 0.5;
    let dx = (x[0] - xc) / R_V;
    let dy = (x[1] - yc) / R_V;
    let r2 = dx * dx + dy * dy;
    let f = (0.5 * (1.0 - r2)).exp();

    let du = -BETA / (2.0 * PI) * dy * f;
    let dv = BETA / (2.0 * PI) * dx * f;
    let dtemp = -(GAMMA - 1.0) * BETA * BETA / (8.0 * GAMMA * PI * PI) * (1.0 - r2).exp();

    let temp = 1.0 + dtemp;
    let rho = temp.powf(1.0 / (GAMMA - 1.0));
    let p = temp.powf(GAMMA / (GAMMA - 1.0));

    (rho, [U_INF + du, dv, 0.0], p)
}

fn vortex_init() -> Arc<InitializeFn> {
    Arc::new(|mat_blk: &[MaterialEos], x: [f64; 3], t: f64| {
        let (rho, vel, p) = vortex_primitives(x, t);
        let mut s = vec![0.0; 6];
        s[volfrac_idx(1, 0)] = 1.0;
        s[density_idx(1, 0)] = rho;
        s[energy_idx(1, 0)] = mat_blk[0].total_energy(rho, vel[0], vel[1], vel[2], p);
        for d in 0..3 {
            s[momentum_idx(1, d)] = rho * vel[d];
        }
        s
    })
}

fn vortex_system() -> MultiMatSystem {
    let config = Config {
        scheme: Scheme::DgP2,
        limiter: LimiterType::NoLimiter,
        flux: FluxType::Ausm,
        accuracy_test: true,
        cfl: 0.3,
        ..Config::default()
    };
    let mat_blk = vec![MaterialEos::StiffenedGas(StiffenedGas {
        gamma: GAMMA,
        pstiff: 0.0,
        cv: 717.5,
    })];
    MultiMatSystem::new(
        config,
        mat_blk,
        vec![0],
        vec![(BcSpec::Dirichlet, vec![1, 2, 3, 4, 5, 6])],
        Some(vortex_init()),
    )
    .unwrap()
}

/// L2 error of the density against the exact vortex at time `t`.
fn density_l2_error(sys: &MultiMatSystem, mesh: &TetMesh, u: &Fields, t: f64) -> f64 {
    let rdof = sys.config().rdof();
    let ncomp = sys.ncomp();
    let (xg, wg) = gauss_quadrature_tet(ng_vol(rdof));

    let mut err2 = 0.0;
    for e in 0..mesh.nelem() {
        let coordel = mesh.coordel(e);
        let vol = mesh.geo_elem[e].vol;
        for (pg, w) in xg.iter().zip(&wg) {
            let b = eval_basis(rdof, pg[0], pg[1], pg[2]);
            let state = eval_state(ncomp, rdof, rdof, e, u, &b, (0, ncomp - 1));
            let gp = eval_gp_tet(*pg, &coordel);
            let (rho_exact, _, _) = vortex_primitives(gp, t);
            let d = state[density_idx(1, 0)] - rho_exact;
            err2 += w * vol * d * d;
        }
    }
    err2.sqrt()
}

/// Advect the vortex to `T_END` on an `n x n x 1` mesh with `nsteps` fixed
/// steps and return the final L2 density error.
fn run(n: usize, nsteps: usize) -> f64 {
    let sys = vortex_system();
    let mesh = TetMesh::boxmesh(
        n,
        n,
        1,
        [0.0, 1.0],
        [0.0, 1.0],
        [0.0, 1.0 / n as f64],
    );
    sys.validate_bc(&mesh).unwrap();

    let (mut u, mut p, ndofel, mut marker) = sys.initialize_fields(&mesh, 0.0).unwrap();

    let dt = T_END / nsteps as f64;
    assert!(
        dt < sys.dt(&mesh, &u, &p),
        "fixed step {dt} exceeds the stable step"
    );

    let mut t = 0.0;
    for _ in 0..nsteps {
        sys.take_step(t, dt, &mesh, &mut u, &mut p, &ndofel, &mut marker)
            .unwrap();
        t += dt;
    }

    density_l2_error(&sys, &mesh, &u, t)
}

#[test]
fn vortex_density_error_converges_at_third_order() {
    // time step halves with the spacing so the O(dt^3) and O(h^3) parts
    // refine together
    let nsteps_coarse = 120;
    let err_coarse = run(6, nsteps_coarse);
    let err_fine = run(12, 2 * nsteps_coarse);

    assert!(err_coarse.is_finite() && err_fine.is_finite());
    assert!(err_fine < err_coarse, "{err_fine} !< {err_coarse}");

    let ratio = err_coarse / err_fine;
    assert!(
        (7.0..=9.0).contains(&ratio),
        "L2 density-error ratio {ratio} outside [7, 9] \
         (coarse {err_coarse:.3e}, fine {err_fine:.3e})"
    );
}
