//! Robustness smoke tests for the interface-heavy configurations: a
//! three-material triple-point-like setup with DGP1 and interface
//! compression, and a JWL detonation-product expansion against air. The
//! assertions are the positivity and finiteness invariants that the
//! preservation machinery must uphold.

use std::sync::Arc;

use multimat_dg::solver::MultiMatSystem;
use multimat_dg::types::{
    density_dof_idx, density_idx, energy_idx, momentum_idx, pressure_dof_idx, volfrac_dof_idx,
    volfrac_idx,
};
use multimat_dg::{
    BcSpec, Config, FluxType, InitializeFn, Jwl, LimiterType, MaterialEos, Scheme, StiffenedGas,
    TetMesh,
};

fn sg(gamma: f64, pstiff: f64, cv: f64) -> MaterialEos {
    MaterialEos::StiffenedGas(StiffenedGas { gamma, pstiff, cv })
}

/// Build a conserved state with equilibrium pressure across materials.
fn mixed_state(
    mat_blk: &[MaterialEos],
    al: &[f64],
    rho: &[f64],
    vel: [f64; 3],
    pr: f64,
) -> Vec<f64> {
    let nmat = mat_blk.len();
    let mut s = vec![0.0; 3 * nmat + 3];
    let mut rhob = 0.0;
    for k in 0..nmat {
        s[volfrac_idx(nmat, k)] = al[k];
        s[density_idx(nmat, k)] = al[k] * rho[k];
        s[energy_idx(nmat, k)] =
            al[k] * mat_blk[k].total_energy(rho[k], vel[0], vel[1], vel[2], pr);
        rhob += al[k] * rho[k];
    }
    for d in 0..3 {
        s[momentum_idx(nmat, d)] = rhob * vel[d];
    }
    s
}

#[test]
fn triple_point_keeps_partial_densities_positive() {
    let mat_blk = vec![
        sg(1.5, 0.0, 717.5),
        sg(1.4, 0.0, 717.5),
        sg(1.625, 0.0, 717.5),
    ];

    let init: Arc<InitializeFn> = Arc::new(|mats: &[MaterialEos], x: [f64; 3], _t: f64| {
        let eps = 1.0e-8;
        // three quadrants: high-pressure driver on the left, two stratified
        // states on the right
        let (main, rho, pr) = if x[0] < 0.3 {
            (0usize, 1.0, 1.0)
        } else if x[1] < 0.5 {
            (1usize, 1.0, 0.1)
        } else {
            (2usize, 0.125, 0.1)
        };
        let mut al = [eps; 3];
        al[main] = 1.0 - 2.0 * eps;
        mixed_state(mats, &al, &[rho, rho, rho], [0.0; 3], pr)
    });

    let config = Config {
        scheme: Scheme::DgP1,
        limiter: LimiterType::VertexBasedP1,
        flux: FluxType::Ausm,
        intsharp: 1,
        cfl: 0.2,
        ..Config::default()
    };
    let sys = MultiMatSystem::new(
        config,
        mat_blk,
        vec![0, 0, 0],
        vec![(BcSpec::Symmetry, vec![1, 2, 3, 4, 5, 6])],
        Some(init),
    )
    .unwrap();

    let mesh = TetMesh::boxmesh(4, 4, 1, [0.0, 1.0], [0.0, 1.0], [0.0, 0.25]);
    sys.validate_bc(&mesh).unwrap();

    let (mut u, mut p, ndofel, mut marker) = sys.initialize_fields(&mesh, 0.0).unwrap();
    let rdof = sys.config().rdof();
    let nmat = 3;

    let mut t = 0.0;
    for step in 0..500 {
        let dt = 0.4 * sys.dt(&mesh, &u, &p);
        assert!(dt > 0.0 && dt.is_finite(), "step {step}: dt {dt}");
        sys.take_step(t, dt, &mesh, &mut u, &mut p, &ndofel, &mut marker)
            .unwrap();
        t += dt;

        // partial densities must never go negative at any point of the run
        for e in 0..mesh.nelem() {
            let mut alsum = 0.0;
            for k in 0..nmat {
                let al = u.get(e, volfrac_dof_idx(nmat, k, rdof, 0));
                let arho = u.get(e, density_dof_idx(nmat, k, rdof, 0));
                assert!(
                    al >= 0.0 && al.is_finite(),
                    "step {step} element {e}: alpha {al}"
                );
                assert!(
                    arho >= 0.0 && arho.is_finite(),
                    "step {step} element {e} material {k}: partial density {arho}"
                );
                alsum += al;
            }
            assert!((alsum - 1.0).abs() < 1e-12, "step {step} element {e}");
        }
    }
}

#[test]
fn jwl_expansion_stays_finite() {
    let mat_blk = vec![
        MaterialEos::Jwl(Jwl {
            a: 3.712e11,
            b: 3.23e9,
            r1: 4.15,
            r2: 0.95,
            omega: 0.3,
            rho0: 1630.0,
            e0: 0.0,
            cv: 1000.0,
            rho_r: Some(1630.0),
            t_r: None,
        }),
        sg(1.4, 0.0, 717.5),
    ];

    let init: Arc<InitializeFn> = Arc::new(|mats: &[MaterialEos], x: [f64; 3], _t: f64| {
        let eps = 1.0e-6;
        // detonation products in the left third, ambient air elsewhere
        if x[0] < 0.3 {
            mixed_state(mats, &[1.0 - eps, eps], &[1630.0, 1.2], [0.0; 3], 1.0e9)
        } else {
            mixed_state(mats, &[eps, 1.0 - eps], &[1630.0, 1.2], [0.0; 3], 1.0e5)
        }
    });

    let config = Config {
        scheme: Scheme::P0P1,
        limiter: LimiterType::VertexBasedP1,
        flux: FluxType::Ausm,
        cfl: 0.2,
        ..Config::default()
    };
    let sys = MultiMatSystem::new(
        config,
        mat_blk,
        vec![0, 0],
        vec![
            (BcSpec::Extrapolate, vec![1, 2]),
            (BcSpec::Symmetry, vec![3, 4, 5, 6]),
        ],
        Some(init),
    )
    .unwrap();

    let mesh = TetMesh::boxmesh(12, 1, 1, [0.0, 1.0], [0.0, 0.1], [0.0, 0.1]);
    sys.validate_bc(&mesh).unwrap();

    let (mut u, mut p, ndofel, mut marker) = sys.initialize_fields(&mesh, 0.0).unwrap();
    let rdof = sys.config().rdof();
    let nmat = 2;

    let bulk_p_max = |p: &multimat_dg::Fields| -> f64 {
        let mut pmax = 0.0f64;
        for e in 0..mesh.nelem() {
            let mut pb = 0.0;
            for k in 0..nmat {
                pb += p.get(e, pressure_dof_idx(nmat, k, rdof, 0));
            }
            pmax = pmax.max(pb);
        }
        pmax
    };

    let p_max0 = bulk_p_max(&p);
    let mut p_max_prev = p_max0;

    let mut t = 0.0;
    for step in 0..1000 {
        let dt = 0.25 * sys.dt(&mesh, &u, &p);
        assert!(dt > 0.0 && dt.is_finite(), "step {step}: dt {dt}");
        sys.take_step(t, dt, &mesh, &mut u, &mut p, &ndofel, &mut marker)
            .unwrap();
        t += dt;

        // the expanding products can only lose pressure: the peak decays
        // monotonically (within the limiter's relative tolerance)
        let p_max = bulk_p_max(&p);
        assert!(
            p_max <= p_max_prev * (1.0 + 1.0e-5),
            "step {step}: peak pressure rose {p_max_prev} -> {p_max}"
        );
        p_max_prev = p_max;

        for e in 0..mesh.nelem() {
            for k in 0..nmat {
                let al = u.get(e, volfrac_dof_idx(nmat, k, rdof, 0));
                let arho = u.get(e, density_dof_idx(nmat, k, rdof, 0));
                let apr = p.get(e, pressure_dof_idx(nmat, k, rdof, 0));
                assert!(
                    al.is_finite() && arho.is_finite() && apr.is_finite(),
                    "step {step} element {e} material {k}"
                );
                assert!(arho >= 0.0, "step {step} element {e} material {k}: {arho}");
                // sound speed remains real and positive
                let a = sys.materials()[k].soundspeed(arho.max(1e-14), apr, al.max(1e-14));
                assert!(
                    a.is_finite() && a > 0.0,
                    "step {step} element {e} material {k}: c {a}"
                );
            }
        }
    }

    // by the end the rarefaction has decompressed the driver edge
    let mut p_edge = 0.0;
    let mut n_edge = 0;
    for e in 0..mesh.nelem() {
        let xc = mesh.geo_elem[e].centroid[0];
        if (0.25..0.3).contains(&xc) {
            for k in 0..nmat {
                p_edge += p.get(e, pressure_dof_idx(nmat, k, rdof, 0));
            }
            n_edge += 1;
        }
    }
    p_edge /= n_edge as f64;
    assert!(
        p_edge < 0.8 * p_max0,
        "driver edge pressure {p_edge} has not decayed from {p_max0}"
    );
}
