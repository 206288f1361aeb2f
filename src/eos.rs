//! Material equation-of-state closures.
//!
//! Each material carries one EOS evaluated as pure functions of the local
//! state. The closures are a closed sum type dispatched with `match`: EOS
//! calls sit inside every Gauss-point loop, so virtual dispatch is avoided
//! on purpose.
//!
//! Conventions: `arho = alpha_k rho_k` is the partial density, `arho_e =
//! alpha_k rho_k E_k` the partial total energy, and `pressure` returns the
//! partial pressure `alpha_k p_k`. Specific total energies returned by
//! `total_energy` are `rho E` for the pure material.

use serde::{Deserialize, Serialize};

use crate::error::MultiMatError;

/// Stiffened-gas parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct StiffenedGas {
    /// Ratio of specific heats.
    pub gamma: f64,
    /// Stiffness pressure constant.
    pub pstiff: f64,
    /// Specific heat at constant volume.
    pub cv: f64,
}

/// Jones-Wilkins-Lee parameters for detonation products.
///
/// All seven mechanical parameters are required explicitly, plus `cv` for
/// the temperature relation and a reference state (`rho_r` or `t_r`) for
/// density initialization.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Jwl {
    pub a: f64,
    pub b: f64,
    pub r1: f64,
    pub r2: f64,
    /// Grueneisen coefficient.
    pub omega: f64,
    /// Reference density of the unreacted state.
    pub rho0: f64,
    /// Specific internal energy shift.
    pub e0: f64,
    /// Specific heat at constant volume.
    pub cv: f64,
    /// Reference density for initialization, if given.
    pub rho_r: Option<f64>,
    /// Reference temperature for initialization, if given.
    pub t_r: Option<f64>,
}

/// Stiffened gas augmented with a shear modulus, for solids whose
/// deviatoric response is small against the bulk response.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SmallShearSolid {
    pub gamma: f64,
    pub pstiff: f64,
    pub cv: f64,
    /// Shear modulus.
    pub mu: f64,
}

/// One material's EOS.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum MaterialEos {
    StiffenedGas(StiffenedGas),
    Jwl(Jwl),
    SmallShearSolid(SmallShearSolid),
}

impl MaterialEos {
    /// Validate the parameter set at setup time.
    pub fn validate(&self, k: usize) -> Result<(), MultiMatError> {
        match self {
            MaterialEos::StiffenedGas(sg) => {
                if sg.gamma <= 1.0 {
                    return Err(MultiMatError::Config(format!(
                        "material {k}: stiffened-gas gamma must exceed 1, got {}",
                        sg.gamma
                    )));
                }
            }
            MaterialEos::Jwl(j) => {
                if j.rho_r.is_none() && j.t_r.is_none() {
                    return Err(MultiMatError::Config(format!(
                        "material {k}: JWL requires a reference density or temperature"
                    )));
                }
                if j.rho0 <= 0.0 || j.omega <= 0.0 {
                    return Err(MultiMatError::Config(format!(
                        "material {k}: JWL rho0 and omega must be positive"
                    )));
                }
            }
            MaterialEos::SmallShearSolid(s) => {
                if s.gamma <= 1.0 || s.mu < 0.0 {
                    return Err(MultiMatError::Config(format!(
                        "material {k}: small-shear solid needs gamma > 1 and mu >= 0"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Partial pressure `alpha_k p_k` from partial density, bulk velocity
    /// and partial total energy.
    pub fn pressure(&self, arho: f64, u: f64, v: f64, w: f64, arho_e: f64, alpha: f64) -> f64 {
        let ae_int = arho_e - 0.5 * arho * (u * u + v * v + w * w);
        match self {
            MaterialEos::StiffenedGas(sg) => {
                (sg.gamma - 1.0) * ae_int - alpha * sg.gamma * sg.pstiff
            }
            MaterialEos::SmallShearSolid(s) => {
                (s.gamma - 1.0) * ae_int - alpha * s.gamma * s.pstiff
            }
            MaterialEos::Jwl(j) => {
                let rho = arho / alpha;
                let expr1 = (-j.r1 * j.rho0 / rho).exp();
                let expr2 = (-j.r2 * j.rho0 / rho).exp();
                let cold = j.a * (1.0 - j.omega * rho / (j.r1 * j.rho0)) * expr1
                    + j.b * (1.0 - j.omega * rho / (j.r2 * j.rho0)) * expr2;
                alpha * cold + j.omega * (ae_int - arho * j.e0)
            }
        }
    }

    /// Material speed of sound from partial density and partial pressure.
    ///
    /// The effective pressure is floored so the square root stays real in
    /// near-vacuum trace states; the positivity limiter keeps states away
    /// from the floor in earnest.
    pub fn soundspeed(&self, arho: f64, apr: f64, alpha: f64) -> f64 {
        match self {
            MaterialEos::StiffenedGas(sg) => {
                let p_eff = (apr + alpha * sg.pstiff).max(1.0e-15);
                (sg.gamma * p_eff / arho).sqrt()
            }
            MaterialEos::SmallShearSolid(s) => {
                let p_eff = (apr + alpha * s.pstiff).max(1.0e-15);
                ((s.gamma * p_eff + (4.0 / 3.0) * alpha * s.mu) / arho).sqrt()
            }
            MaterialEos::Jwl(j) => {
                let rho = arho / alpha;
                let p = apr / alpha;
                let expr1 = (-j.r1 * j.rho0 / rho).exp();
                let expr2 = (-j.r2 * j.rho0 / rho).exp();
                // dp/drho at constant e, plus the Grueneisen part (p/rho^2) dp/de
                let dpdrho = j.a * expr1
                    * (j.r1 * j.rho0 / (rho * rho) * (1.0 - j.omega * rho / (j.r1 * j.rho0))
                        - j.omega / (j.r1 * j.rho0))
                    + j.b * expr2
                        * (j.r2 * j.rho0 / (rho * rho)
                            * (1.0 - j.omega * rho / (j.r2 * j.rho0))
                            - j.omega / (j.r2 * j.rho0))
                    + j.omega * self.int_energy_jwl(rho, p);
                let c2 = dpdrho + (p / rho) * j.omega;
                (c2.max(1.0e-15 / rho)).sqrt()
            }
        }
    }

    /// JWL specific internal energy consistent with `(rho, p)`.
    fn int_energy_jwl(&self, rho: f64, p: f64) -> f64 {
        match self {
            MaterialEos::Jwl(j) => {
                let expr1 = (-j.r1 * j.rho0 / rho).exp();
                let expr2 = (-j.r2 * j.rho0 / rho).exp();
                let cold = j.a * (1.0 - j.omega * rho / (j.r1 * j.rho0)) * expr1
                    + j.b * (1.0 - j.omega * rho / (j.r2 * j.rho0)) * expr2;
                j.e0 + (p - cold) / (j.omega * rho)
            }
            _ => unreachable!("JWL helper called on non-JWL material"),
        }
    }

    /// Material specific total energy `rho E` from density, velocity and
    /// pressure.
    pub fn total_energy(&self, rho: f64, u: f64, v: f64, w: f64, pr: f64) -> f64 {
        let ke = 0.5 * rho * (u * u + v * v + w * w);
        match self {
            MaterialEos::StiffenedGas(sg) => {
                (pr + sg.gamma * sg.pstiff) / (sg.gamma - 1.0) + ke
            }
            MaterialEos::SmallShearSolid(s) => {
                (pr + s.gamma * s.pstiff) / (s.gamma - 1.0) + ke
            }
            MaterialEos::Jwl(_) => rho * self.int_energy_jwl(rho, pr) + ke,
        }
    }

    /// Material temperature from partial quantities.
    pub fn temperature(&self, arho: f64, u: f64, v: f64, w: f64, arho_e: f64, alpha: f64) -> f64 {
        let ae_int = arho_e - 0.5 * arho * (u * u + v * v + w * w);
        match self {
            MaterialEos::StiffenedGas(sg) => (ae_int - alpha * sg.pstiff) / (arho * sg.cv),
            MaterialEos::SmallShearSolid(s) => (ae_int - alpha * s.pstiff) / (arho * s.cv),
            MaterialEos::Jwl(j) => (ae_int - arho * j.e0) / (arho * j.cv),
        }
    }

    /// Material density from pressure and temperature.
    ///
    /// For JWL the relation is implicit; it is solved by bisection on
    /// `p(rho, e0 + cv T) = pr` bracketed around the reference density.
    pub fn density(&self, pr: f64, temp: f64) -> f64 {
        match self {
            MaterialEos::StiffenedGas(sg) => {
                (pr + sg.pstiff) / ((sg.gamma - 1.0) * sg.cv * temp)
            }
            MaterialEos::SmallShearSolid(s) => {
                (pr + s.pstiff) / ((s.gamma - 1.0) * s.cv * temp)
            }
            MaterialEos::Jwl(j) => {
                let p_of_rho = |rho: f64| {
                    let e = j.e0 + j.cv * temp;
                    let expr1 = (-j.r1 * j.rho0 / rho).exp();
                    let expr2 = (-j.r2 * j.rho0 / rho).exp();
                    j.a * (1.0 - j.omega * rho / (j.r1 * j.rho0)) * expr1
                        + j.b * (1.0 - j.omega * rho / (j.r2 * j.rho0)) * expr2
                        + j.omega * rho * (e - j.e0)
                };
                // p is monotone increasing in rho over physically relevant
                // compressions; at extreme compression the cold curve turns
                // over, so the bracket stops at 10 rho0
                let mut lo = 1.0e-6 * j.rho0;
                let mut hi = 10.0 * j.rho0;
                for _ in 0..200 {
                    let mid = 0.5 * (lo + hi);
                    if p_of_rho(mid) < pr {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }
                0.5 * (lo + hi)
            }
        }
    }

    /// Minimum admissible partial pressure per unit volume fraction: the
    /// floor below which the sound speed would go complex.
    pub fn min_eff_pressure(&self, floor: f64) -> f64 {
        match self {
            MaterialEos::StiffenedGas(sg) => floor - sg.pstiff,
            MaterialEos::SmallShearSolid(s) => floor - s.pstiff,
            MaterialEos::Jwl(_) => floor,
        }
    }

    /// Floor a partial pressure to the EOS-admissible range.
    pub fn constrain_pressure(&self, apr: f64, alpha: f64) -> f64 {
        apr.max(alpha * self.min_eff_pressure(1.0e-12))
    }

    /// Deviatoric Cauchy stress of a solid material from its inverse
    /// deformation gradient, scaled by the volume fraction. Zero for
    /// fluids.
    pub fn cauchy_stress(&self, g: &[[f64; 3]; 3], alpha: f64) -> [[f64; 3]; 3] {
        let mut sig = [[0.0; 3]; 3];
        if let MaterialEos::SmallShearSolid(s) = self {
            // small-shear strain measure from b = (g^T g)^-1 ~ I - 2 eps
            let mut gtg = [[0.0; 3]; 3];
            for i in 0..3 {
                for j in 0..3 {
                    for l in 0..3 {
                        gtg[i][j] += g[l][i] * g[l][j];
                    }
                }
            }
            let tr = gtg[0][0] + gtg[1][1] + gtg[2][2];
            for i in 0..3 {
                for j in 0..3 {
                    let dev = if i == j { gtg[i][j] - tr / 3.0 } else { gtg[i][j] };
                    sig[i][j] = -alpha * s.mu * dev;
                }
            }
        }
        sig
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn air() -> MaterialEos {
        MaterialEos::StiffenedGas(StiffenedGas {
            gamma: 1.4,
            pstiff: 0.0,
            cv: 717.5,
        })
    }

    fn water() -> MaterialEos {
        MaterialEos::StiffenedGas(StiffenedGas {
            gamma: 4.4,
            pstiff: 6.0e8,
            cv: 4186.0,
        })
    }

    fn products() -> MaterialEos {
        // TNT-like products
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
        })
    }

    #[test]
    fn test_ideal_gas_pressure_energy_roundtrip() {
        let eos = air();
        let (rho, u, p) = (1.2, 30.0, 101325.0);
        let rho_e = eos.total_energy(rho, u, 0.0, 0.0, p);
        let p_back = eos.pressure(rho, u, 0.0, 0.0, rho_e, 1.0);
        assert!((p_back - p).abs() < 1e-8 * p);
    }

    #[test]
    fn test_stiffened_gas_pressure_energy_roundtrip() {
        let eos = water();
        let (rho, p) = (1000.0, 1.0e9);
        let rho_e = eos.total_energy(rho, 0.0, 0.0, 0.0, p);
        let p_back = eos.pressure(rho, 0.0, 0.0, 0.0, rho_e, 1.0);
        assert!((p_back - p).abs() < 1e-8 * p.abs());
    }

    #[test]
    fn test_partial_pressure_scales_with_alpha() {
        let eos = air();
        let (rho, p, alpha) = (1.2, 1e5, 0.3);
        let arho_e = alpha * eos.total_energy(rho, 0.0, 0.0, 0.0, p);
        let apr = eos.pressure(alpha * rho, 0.0, 0.0, 0.0, arho_e, alpha);
        assert!((apr - alpha * p).abs() < 1e-8 * p);
    }

    #[test]
    fn test_air_sound_speed() {
        let eos = air();
        let a = eos.soundspeed(1.2, 101325.0, 1.0);
        // sqrt(1.4 * 101325 / 1.2) ~ 343.9 m/s
        assert!((a - 343.9).abs() < 0.5);
    }

    #[test]
    fn test_water_sound_speed_is_stiff() {
        let eos = water();
        let a = eos.soundspeed(1000.0, 101325.0, 1.0);
        assert!(a > 1000.0 && a.is_finite());
    }

    #[test]
    fn test_sg_density_from_pressure_temperature() {
        let eos = air();
        let rho = 1.2;
        let p = 101325.0;
        let rho_e = eos.total_energy(rho, 0.0, 0.0, 0.0, p);
        let t = eos.temperature(rho, 0.0, 0.0, 0.0, rho_e, 1.0);
        let rho_back = eos.density(p, t);
        assert!((rho_back - rho).abs() < 1e-10 * rho);
    }

    #[test]
    fn test_jwl_pressure_energy_roundtrip() {
        let eos = products();
        let (rho, p) = (1630.0, 1.0e10);
        let rho_e = eos.total_energy(rho, 0.0, 0.0, 0.0, p);
        let p_back = eos.pressure(rho, 0.0, 0.0, 0.0, rho_e, 1.0);
        assert!((p_back - p).abs() < 1e-8 * p.abs());
    }

    #[test]
    fn test_jwl_sound_speed_finite_on_expansion() {
        let eos = products();
        // expanded products at a fraction of the reference density
        for frac in [1.0, 0.5, 0.1, 0.01] {
            let rho = 1630.0 * frac;
            let p = 1.0e8 * frac;
            let a = eos.soundspeed(rho, p, 1.0);
            assert!(a.is_finite() && a > 0.0, "c at rho={rho}: {a}");
        }
    }

    #[test]
    fn test_jwl_density_bisection_consistency() {
        let eos = products();
        if let MaterialEos::Jwl(j) = eos {
            let temp = 2000.0;
            let rho_e = |rho: f64| rho * (j.e0 + j.cv * temp);
            // pick a density, get p, invert back
            let rho = 1200.0;
            let p = eos.pressure(rho, 0.0, 0.0, 0.0, rho_e(rho), 1.0);
            let rho_back = eos.density(p, temp);
            assert!(
                (rho_back - rho).abs() < 1e-6 * rho,
                "{rho_back} vs {rho}"
            );
        }
    }

    #[test]
    fn test_jwl_requires_reference_state() {
        let mut j = match products() {
            MaterialEos::Jwl(j) => j,
            _ => unreachable!(),
        };
        j.rho_r = None;
        j.t_r = None;
        assert!(MaterialEos::Jwl(j).validate(0).is_err());
    }

    #[test]
    fn test_fluid_cauchy_stress_is_zero() {
        let g = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let sig = air().cauchy_stress(&g, 1.0);
        assert!(sig.iter().flatten().all(|&s| s == 0.0));
    }

    #[test]
    fn test_solid_stress_vanishes_at_identity() {
        let eos = MaterialEos::SmallShearSolid(SmallShearSolid {
            gamma: 2.0,
            pstiff: 1.0e8,
            cv: 400.0,
            mu: 1.0e9,
        });
        let g = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let sig = eos.cauchy_stress(&g, 1.0);
        for (i, row) in sig.iter().enumerate() {
            for (j, &s) in row.iter().enumerate() {
                assert!(s.abs() < 1e-6, "sigma[{i}][{j}] = {s}");
            }
        }
    }
}
