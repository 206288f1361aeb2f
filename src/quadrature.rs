//! Gauss quadrature rules on the reference tetrahedron and triangle.
//!
//! Weights are normalized to sum to one, so an integral is approximated as
//! `V * sum_g w_g f(xi_g)` with `V` the physical element (or face) measure.
//! The rules are chosen so that polynomials of degree `2p` are integrated
//! exactly for a basis of order `p`; the tetrahedral rules are the classic
//! Keast rules, the triangular ones Dunavant's.

/// Number of volume quadrature points for a given number of dofs.
#[inline]
pub const fn ng_vol(ndof: usize) -> usize {
    match ndof {
        1 => 1,
        4 => 5,
        10 => 11,
        _ => 14,
    }
}

/// Number of face quadrature points for a given number of dofs.
#[inline]
pub const fn ng_fa(ndof: usize) -> usize {
    match ndof {
        1 => 1,
        4 => 3,
        10 => 6,
        _ => 12,
    }
}

/// Quadrature coordinates and weights on the reference tetrahedron.
///
/// `coord[g] = [xi, eta, zeta]`; weights sum to 1.
///
/// # Panics
/// Panics if `ng` is not one of the supported rule sizes {1, 4, 5, 11, 14}.
pub fn gauss_quadrature_tet(ng: usize) -> (Vec<[f64; 3]>, Vec<f64>) {
    match ng {
        1 => (vec![[0.25, 0.25, 0.25]], vec![1.0]),
        4 => {
            // degree 2
            let a = 0.585_410_196_624_968_5;
            let b = 0.138_196_601_125_010_5;
            (
                vec![[a, b, b], [b, a, b], [b, b, a], [b, b, b]],
                vec![0.25; 4],
            )
        }
        5 => {
            // degree 3, one negative center weight
            let c = 0.25;
            let a = 0.5;
            let b = 1.0 / 6.0;
            (
                vec![[c, c, c], [a, b, b], [b, a, b], [b, b, a], [b, b, b]],
                vec![-0.8, 0.45, 0.45, 0.45, 0.45],
            )
        }
        11 => {
            // degree 4 (Keast)
            let a = 0.785_714_285_714_285_7; // 11/14
            let b = 0.071_428_571_428_571_43; // 1/14
            let c = 0.399_403_576_166_799_2;
            let d = 0.100_596_423_833_200_8;
            let w0 = -0.078_933_333_333_333_33;
            let w1 = 0.045_733_333_333_333_33;
            let w2 = 0.149_333_333_333_333_32;
            (
                vec![
                    [0.25, 0.25, 0.25],
                    [b, b, b],
                    [a, b, b],
                    [b, a, b],
                    [b, b, a],
                    [c, d, d],
                    [d, c, d],
                    [d, d, c],
                    [c, c, d],
                    [c, d, c],
                    [d, c, c],
                ],
                vec![w0, w1, w1, w1, w1, w2, w2, w2, w2, w2, w2],
            )
        }
        14 => {
            // degree 5
            let a1 = 0.067_342_242_210_098_3;
            let b1 = 0.310_885_919_263_300_6;
            let a2 = 0.721_794_249_067_326_3;
            let b2 = 0.092_735_250_310_891_2;
            let a3 = 0.454_496_295_874_350_6;
            let b3 = 0.045_503_704_125_649_4;
            let w1 = 0.112_687_925_718_015_9;
            let w2 = 0.073_493_043_116_362_0;
            let w3 = 0.042_546_020_777_081_5;
            (
                vec![
                    [b1, b1, b1],
                    [a1, b1, b1],
                    [b1, a1, b1],
                    [b1, b1, a1],
                    [b2, b2, b2],
                    [a2, b2, b2],
                    [b2, a2, b2],
                    [b2, b2, a2],
                    [a3, b3, b3],
                    [b3, a3, b3],
                    [b3, b3, a3],
                    [a3, a3, b3],
                    [a3, b3, a3],
                    [b3, a3, a3],
                ],
                vec![
                    w1, w1, w1, w1, w2, w2, w2, w2, w3, w3, w3, w3, w3, w3,
                ],
            )
        }
        _ => panic!("unsupported tetrahedral quadrature rule: {ng} points"),
    }
}

/// Quadrature coordinates and weights on the reference triangle.
///
/// `coord[g] = [xi, eta]`; weights sum to 1.
///
/// # Panics
/// Panics if `ng` is not one of the supported rule sizes {1, 3, 6, 12}.
pub fn gauss_quadrature_tri(ng: usize) -> (Vec<[f64; 2]>, Vec<f64>) {
    match ng {
        1 => (vec![[1.0 / 3.0, 1.0 / 3.0]], vec![1.0]),
        3 => {
            let a = 1.0 / 6.0;
            let b = 2.0 / 3.0;
            (vec![[a, a], [b, a], [a, b]], vec![1.0 / 3.0; 3])
        }
        6 => {
            // degree 4 (Dunavant)
            let a = 0.445_948_490_915_964_9;
            let ac = 1.0 - 2.0 * a;
            let b = 0.091_576_213_509_770_7;
            let bc = 1.0 - 2.0 * b;
            let wa = 0.223_381_589_678_011_5;
            let wb = 0.109_951_743_655_321_9;
            (
                vec![[a, a], [ac, a], [a, ac], [b, b], [bc, b], [b, bc]],
                vec![wa, wa, wa, wb, wb, wb],
            )
        }
        12 => {
            // degree 6 (Dunavant)
            let a = 0.063_089_014_491_502_2;
            let ac = 1.0 - 2.0 * a;
            let b = 0.249_286_745_170_910_4;
            let bc = 1.0 - 2.0 * b;
            let c = 0.053_145_049_844_816_9;
            let d = 0.310_352_451_033_784_4;
            let e = 1.0 - c - d;
            let wa = 0.050_844_906_370_206_8;
            let wb = 0.116_786_275_726_379_4;
            let wc = 0.082_851_075_618_373_6;
            (
                vec![
                    [a, a],
                    [ac, a],
                    [a, ac],
                    [b, b],
                    [bc, b],
                    [b, bc],
                    [c, d],
                    [d, c],
                    [c, e],
                    [e, c],
                    [d, e],
                    [e, d],
                ],
                vec![wa, wa, wa, wb, wb, wb, wc, wc, wc, wc, wc, wc],
            )
        }
        _ => panic!("unsupported triangular quadrature rule: {ng} points"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Exact normalized monomial integral on the reference tet:
    /// (1/V) * int xi^a eta^b zeta^c dV with V = 1/6.
    fn tet_monomial(a: u32, b: u32, c: u32) -> f64 {
        fn fact(n: u32) -> f64 {
            (1..=n).map(|i| i as f64).product()
        }
        6.0 * fact(a) * fact(b) * fact(c) / fact(a + b + c + 3)
    }

    /// Exact normalized monomial integral on the reference triangle.
    fn tri_monomial(a: u32, b: u32) -> f64 {
        fn fact(n: u32) -> f64 {
            (1..=n).map(|i| i as f64).product()
        }
        2.0 * fact(a) * fact(b) / fact(a + b + 2)
    }

    fn tet_quad(ng: usize, a: u32, b: u32, c: u32) -> f64 {
        let (xg, wg) = gauss_quadrature_tet(ng);
        xg.iter()
            .zip(&wg)
            .map(|(x, w)| w * x[0].powi(a as i32) * x[1].powi(b as i32) * x[2].powi(c as i32))
            .sum()
    }

    fn tri_quad(ng: usize, a: u32, b: u32) -> f64 {
        let (xg, wg) = gauss_quadrature_tri(ng);
        xg.iter()
            .zip(&wg)
            .map(|(x, w)| w * x[0].powi(a as i32) * x[1].powi(b as i32))
            .sum()
    }

    #[test]
    fn test_weights_sum_to_one() {
        for ng in [1, 4, 5, 11, 14] {
            let (_, w) = gauss_quadrature_tet(ng);
            let s: f64 = w.iter().sum();
            assert!((s - 1.0).abs() < 1e-13, "tet ng={ng}: sum {s}");
        }
        for ng in [1, 3, 6, 12] {
            let (_, w) = gauss_quadrature_tri(ng);
            let s: f64 = w.iter().sum();
            assert!((s - 1.0).abs() < 1e-13, "tri ng={ng}: sum {s}");
        }
    }

    #[test]
    fn test_tet_exactness_orders() {
        // (rule, max total degree it must integrate exactly)
        for (ng, deg) in [(1, 1), (4, 2), (5, 3), (11, 4), (14, 5)] {
            for a in 0..=deg {
                for b in 0..=(deg - a) {
                    for c in 0..=(deg - a - b) {
                        let q = tet_quad(ng, a, b, c);
                        let exact = tet_monomial(a, b, c);
                        assert!(
                            (q - exact).abs() < 1e-12,
                            "tet ng={ng} monomial ({a},{b},{c}): {q} vs {exact}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_tri_exactness_orders() {
        for (ng, deg) in [(1, 1), (3, 2), (6, 4), (12, 6)] {
            for a in 0..=deg {
                for b in 0..=(deg - a) {
                    let q = tri_quad(ng, a, b);
                    let exact = tri_monomial(a, b);
                    assert!(
                        (q - exact).abs() < 1e-12,
                        "tri ng={ng} monomial ({a},{b}): {q} vs {exact}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_rule_selection() {
        assert_eq!(ng_vol(1), 1);
        assert_eq!(ng_vol(4), 5);
        assert_eq!(ng_vol(10), 11);
        assert_eq!(ng_vol(20), 14);
        assert_eq!(ng_fa(1), 1);
        assert_eq!(ng_fa(4), 3);
        assert_eq!(ng_fa(10), 6);
        assert_eq!(ng_fa(20), 12);
    }
}
