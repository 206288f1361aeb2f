//! End-to-end p-adaptivity on a smooth-then-shocked flow.
//!
//! A pseudo-1D domain carries a gentle smooth pressure/density wave on the
//! left and a Sod-like jump at x = 0.7 that immediately starts driving a
//! shock. Every element starts at ndofel = 4. Once the flow is moving, the
//! discontinuity indicator marks the jump cells, which must derefine to
//! ndofel = 1 within 10 steps; cells in the smooth wave carry unresolved
//! spectral content and must refine to ndofel = 10 within 50 steps.

use std::sync::Arc;

use multimat_dg::solver::adaptivity::reset_adap_sol;
use multimat_dg::solver::MultiMatSystem;
use multimat_dg::types::{density_idx, energy_idx, volfrac_idx};
use multimat_dg::{
    BcSpec, Config, FluxType, InitializeFn, LimiterType, MaterialEos, Scheme, StiffenedGas,
    TetMesh,
};

const NX: usize = 32;
const X_JUMP: f64 = 0.7;

fn init() -> Arc<InitializeFn> {
    Arc::new(|mat_blk: &[MaterialEos], x: [f64; 3], _t: f64| {
        use std::f64::consts::PI;
        // smooth wave on [0, 0.5), quiescent buffer, then the jump
        let (rho, p) = if x[0] < 0.5 {
            let s = 0.02 * (2.0 * PI * x[0]).sin();
            (1.0 + s, 1.0 + s)
        } else if x[0] < X_JUMP {
            (1.0, 1.0)
        } else {
            (0.125, 0.1)
        };
        let mut s = vec![0.0; 6];
        s[volfrac_idx(1, 0)] = 1.0;
        s[density_idx(1, 0)] = rho;
        s[energy_idx(1, 0)] = mat_blk[0].total_energy(rho, 0.0, 0.0, 0.0, p);
        s
    })
}

#[test]
fn shock_cells_derefine_and_smooth_cells_refine() {
    let h = 1.0 / NX as f64;
    let mesh = TetMesh::boxmesh(NX, 1, 1, [0.0, 1.0], [0.0, h], [0.0, h]);

    let config = Config {
        scheme: Scheme::DgP2,
        limiter: LimiterType::VertexBasedP1,
        flux: FluxType::Hllc,
        pref: true,
        ndofmax: 10,
        tolref: 1.0e-8,
        tolderef: 1.0e-20,
        cfl: 0.3,
        ..Config::default()
    };
    let sys = MultiMatSystem::new(
        config,
        vec![MaterialEos::StiffenedGas(StiffenedGas {
            gamma: 1.4,
            pstiff: 0.0,
            cv: 717.5,
        })],
        vec![0],
        vec![
            (BcSpec::Extrapolate, vec![1, 2]),
            (BcSpec::Symmetry, vec![3, 4, 5, 6]),
        ],
        Some(init()),
    )
    .unwrap();
    sys.validate_bc(&mesh).unwrap();

    let (mut u, mut p, mut ndofel, mut marker) = sys.initialize_fields(&mesh, 0.0).unwrap();

    // start the whole mesh at P1
    for nd in ndofel.iter_mut() {
        *nd = 4;
    }
    reset_adap_sol(sys.config().rdof(), &ndofel, &mut u, &mut p);

    let at_jump = |e: usize| (mesh.geo_elem[e].centroid[0] - X_JUMP).abs() < 0.04;
    let in_smooth_wave = |e: usize| {
        let xc = mesh.geo_elem[e].centroid[0];
        (0.10..=0.18).contains(&xc)
    };
    assert!((0..mesh.nelem()).any(at_jump));
    assert!((0..mesh.nelem()).any(in_smooth_wave));

    let mut t = 0.0;
    for step in 1..=50 {
        let dt = 0.5 * sys.dt(&mesh, &u, &p);
        assert!(dt > 0.0 && dt.is_finite());
        sys.take_step(t, dt, &mesh, &mut u, &mut p, &ndofel, &mut marker)
            .unwrap();
        t += dt;

        sys.eval_ndof(&mut u, &mut p, &mut ndofel, &marker);

        if step == 10 {
            // the jump cells have been marked and pushed down to P0
            for e in 0..mesh.nelem() {
                if at_jump(e) {
                    assert_eq!(
                        ndofel[e], 1,
                        "step {step}: shock element {e} at ndofel {}",
                        ndofel[e]
                    );
                }
            }
        }
    }

    // the smooth wave has risen to the maximum order
    for e in 0..mesh.nelem() {
        if in_smooth_wave(e) {
            assert_eq!(
                ndofel[e], 10,
                "smooth element {e} at ndofel {} after 50 steps",
                ndofel[e]
            );
        }
        // and every element sits on a valid level
        assert!(matches!(ndofel[e], 1 | 4 | 10));
    }
}
