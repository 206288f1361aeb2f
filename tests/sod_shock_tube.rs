//! Single-material Sod shock tube on a pseudo-1D tetrahedral mesh.
//!
//! Standard gamma = 1.4 Riemann problem: (rho, p) = (1, 1) left of x = 0.5
//! and (0.125, 0.1) right, everything at rest, run with P0P1, the
//! vertex-based limiter and the HLLC flux to t = 0.2. The exact solution
//! has a post-shock plateau rho = 0.26557, p = 0.30313 and the shock at
//! x = 0.8504; the run is checked against those targets, and against
//! conservation (no wave reaches the x boundaries by t = 0.2).

use std::sync::Arc;

use multimat_dg::solver::MultiMatSystem;
use multimat_dg::types::{
    density_dof_idx, density_idx, energy_dof_idx, energy_idx, momentum_dof_idx,
    pressure_dof_idx, volfrac_idx,
};
use multimat_dg::{
    BcSpec, Config, Fields, FluxType, InitializeFn, LimiterType, MaterialEos, Scheme,
    StiffenedGas, TetMesh,
};

const T_END: f64 = 0.2;
const NX: usize = 100;

// exact-solution targets of the gamma = 1.4 Sod problem at t = 0.2
const RHO_POST_SHOCK: f64 = 0.2655;
const P_STAR: f64 = 0.3031;
const X_SHOCK: f64 = 0.85;

fn sod_system() -> MultiMatSystem {
    let config = Config {
        scheme: Scheme::P0P1,
        limiter: LimiterType::VertexBasedP1,
        flux: FluxType::Hllc,
        cfl: 0.5,
        ..Config::default()
    };
    let mat_blk = vec![MaterialEos::StiffenedGas(StiffenedGas {
        gamma: 1.4,
        pstiff: 0.0,
        cv: 717.5,
    })];

    let init: Arc<InitializeFn> = Arc::new(|mat_blk: &[MaterialEos], x: [f64; 3], _t: f64| {
        let (rho, p) = if x[0] < 0.5 { (1.0, 1.0) } else { (0.125, 0.1) };
        let mut s = vec![0.0; 6];
        s[volfrac_idx(1, 0)] = 1.0;
        s[density_idx(1, 0)] = rho;
        s[energy_idx(1, 0)] = mat_blk[0].total_energy(rho, 0.0, 0.0, 0.0, p);
        s
    });

    // outlets in x, walls elsewhere
    MultiMatSystem::new(
        config,
        mat_blk,
        vec![0],
        vec![
            (BcSpec::Extrapolate, vec![1, 2]),
            (BcSpec::Symmetry, vec![3, 4, 5, 6]),
        ],
        Some(init),
    )
    .unwrap()
}

fn total(mesh: &TetMesh, u: &Fields, idx: usize) -> f64 {
    (0..mesh.nelem())
        .map(|e| mesh.geo_elem[e].vol * u.get(e, idx))
        .sum()
}

/// Volume-weighted slab averages of the density means along x.
fn density_profile(mesh: &TetMesh, u: &Fields, rdof: usize, nx: usize) -> Vec<f64> {
    let mut num = vec![0.0; nx];
    let mut den = vec![0.0; nx];
    for e in 0..mesh.nelem() {
        let i = ((mesh.geo_elem[e].centroid[0] * nx as f64) as usize).min(nx - 1);
        num[i] += mesh.geo_elem[e].vol * u.get(e, density_dof_idx(1, 0, rdof, 0));
        den[i] += mesh.geo_elem[e].vol;
    }
    num.iter().zip(&den).map(|(n, d)| n / d).collect()
}

#[test]
fn sod_shock_tube_matches_exact_solution_at_t02() {
    let h = 1.0 / NX as f64;
    let mesh = TetMesh::boxmesh(NX, 1, 1, [0.0, 1.0], [0.0, h], [0.0, h]);
    let sys = sod_system();
    sys.validate_bc(&mesh).unwrap();

    let (mut u, mut p, ndofel, mut marker) = sys.initialize_fields(&mesh, 0.0).unwrap();
    let rdof = sys.config().rdof();

    let mass0 = total(&mesh, &u, density_dof_idx(1, 0, rdof, 0));
    let energy0 = total(&mesh, &u, energy_dof_idx(1, 0, rdof, 0));

    let mut t = 0.0;
    while t < T_END {
        let dt = sys.dt(&mesh, &u, &p).min(T_END - t);
        assert!(dt > 0.0 && dt.is_finite());
        sys.take_step(t, dt, &mesh, &mut u, &mut p, &ndofel, &mut marker)
            .unwrap();
        t += dt;
    }

    // conservation: no wave has reached the x boundaries by t = 0.2
    let mass = total(&mesh, &u, density_dof_idx(1, 0, rdof, 0));
    let energy = total(&mesh, &u, energy_dof_idx(1, 0, rdof, 0));
    assert!((mass - mass0).abs() < 1e-10 * mass0.abs(), "{mass0} -> {mass}");
    assert!(
        (energy - energy0).abs() < 1e-10 * energy0.abs(),
        "{energy0} -> {energy}"
    );

    // the breaking diaphragm drives a rightward shock: net +x momentum
    let mom_x = total(&mesh, &u, momentum_dof_idx(1, 0, rdof, 0));
    assert!(mom_x > 0.0, "net x-momentum {mom_x}");

    // density means stay essentially between the initial states, and the
    // undisturbed ends keep their initial values
    for e in 0..mesh.nelem() {
        let rho = u.get(e, density_dof_idx(1, 0, rdof, 0));
        assert!(rho.is_finite());
        assert!(
            (0.12..=1.01).contains(&rho),
            "element {e}: density {rho} out of bounds"
        );
        let xc = mesh.geo_elem[e].centroid[0];
        if xc < 0.1 {
            assert!((rho - 1.0).abs() < 1e-3, "left state disturbed: {rho}");
        }
        if xc > 0.95 {
            assert!((rho - 0.125).abs() < 1e-3, "right state disturbed: {rho}");
        }
    }

    // post-shock density plateau, sampled between the contact smear and
    // the captured shock
    let mut rho_plateau = 0.0;
    let mut n_plateau = 0;
    for e in 0..mesh.nelem() {
        let xc = mesh.geo_elem[e].centroid[0];
        if (0.76..=0.82).contains(&xc) {
            rho_plateau += u.get(e, density_dof_idx(1, 0, rdof, 0));
            n_plateau += 1;
        }
    }
    rho_plateau /= n_plateau as f64;
    assert!(
        (rho_plateau - RHO_POST_SHOCK).abs() < 0.015,
        "post-shock density {rho_plateau} vs {RHO_POST_SHOCK}"
    );

    // star-region pressure plateau (wide, between rarefaction tail and
    // shock)
    let mut p_star = 0.0;
    let mut n_star = 0;
    for e in 0..mesh.nelem() {
        let xc = mesh.geo_elem[e].centroid[0];
        if (0.55..=0.70).contains(&xc) {
            p_star += p.get(e, pressure_dof_idx(1, 0, rdof, 0));
            n_star += 1;
        }
    }
    p_star /= n_star as f64;
    assert!(
        (p_star - P_STAR).abs() < 0.015,
        "star pressure {p_star} vs {P_STAR}"
    );

    // shock position from the half-jump crossing of the density profile,
    // scanned from the right
    let profile = density_profile(&mesh, &u, rdof, NX);
    let half_jump = 0.5 * (0.125 + RHO_POST_SHOCK);
    let mut x_shock = 0.0;
    for i in (0..NX - 1).rev() {
        if profile[i] >= half_jump {
            // interpolate the crossing between slabs i and i+1
            let x_i = (i as f64 + 0.5) * h;
            let frac = (profile[i] - half_jump) / (profile[i] - profile[i + 1]);
            x_shock = x_i + frac.clamp(0.0, 1.0) * h;
            break;
        }
    }
    assert!(
        (x_shock - X_SHOCK).abs() <= 0.02,
        "shock position {x_shock} vs {X_SHOCK} +/- 0.02"
    );
}
