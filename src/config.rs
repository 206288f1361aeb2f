//! Input-deck flags recognized by the numerical core.
//!
//! The outer driver parses whatever deck format it likes and hands the core a
//! plain [`Config`]. Defaults follow the most common production setup:
//! P0P1 with the vertex-based limiter and AUSM+up flux.

use serde::{Deserialize, Serialize};

use crate::error::MultiMatError;

/// Spatial discretization scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Piecewise-constant DG (finite volume on the DG storage layout).
    Dg,
    /// Reconstructed DG: P0 solved dofs, P1 reconstructed dofs.
    #[default]
    P0P1,
    /// Second-order DG.
    DgP1,
    /// Third-order DG.
    DgP2,
    /// Cell-centered finite volume sub-mode (P0P1 storage, FV update).
    Fv,
}

impl Scheme {
    /// Number of solved degrees of freedom per component.
    pub const fn ndof(self) -> usize {
        match self {
            Scheme::Dg | Scheme::P0P1 | Scheme::Fv => 1,
            Scheme::DgP1 => 4,
            Scheme::DgP2 => 10,
        }
    }

    /// Number of reconstructed degrees of freedom per component.
    pub const fn rdof(self) -> usize {
        match self {
            Scheme::Dg => 1,
            Scheme::P0P1 | Scheme::Fv => 4,
            Scheme::DgP1 => 4,
            Scheme::DgP2 => 10,
        }
    }
}

/// Slope limiter selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimiterType {
    /// No limiting.
    NoLimiter,
    /// Weighted essentially non-oscillatory reconstruction of P1 dofs.
    WenoP1,
    /// Superbee TVD limiter on P1 dofs.
    SuperbeeP1,
    /// Kuzmin vertex-based hierarchical limiter.
    #[default]
    VertexBasedP1,
}

/// Riemann flux selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FluxType {
    /// AUSM+up all-speed flux (the multi-material default).
    #[default]
    Ausm,
    /// Harten-Lax-van Leer-Contact.
    Hllc,
    /// Harten-Lax-van Leer.
    Hll,
    /// Rusanov (local Lax-Friedrichs).
    Rusanov,
    /// Global Lax-Friedrichs.
    LaxFriedrichs,
}

/// Input-deck flags for one multi-material system.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spatial scheme.
    pub scheme: Scheme,
    /// Limiter applied after each stage.
    pub limiter: LimiterType,
    /// Riemann flux used on faces.
    pub flux: FluxType,
    /// Interface compression (THINC) switch.
    pub intsharp: i32,
    /// THINC steepness parameter.
    pub intsharp_param: f64,
    /// Discontinuity indicator gates the limiter per cell.
    pub shock_detection: bool,
    /// Flux-corrected transport switch; accepted but ignored by the DG core.
    pub fct: bool,
    /// Finite-rate pressure relaxation switch.
    pub prelax: i32,
    /// Pressure relaxation time-scale coefficient.
    pub prelax_timescale: f64,
    /// Disable the interface treatments that spoil formal order, for
    /// convergence studies.
    pub accuracy_test: bool,
    /// P-adaptivity switch.
    pub pref: bool,
    /// Refinement tolerance for the spectral-decay indicator.
    pub tolref: f64,
    /// Derefinement tolerance for the spectral-decay indicator.
    pub tolderef: f64,
    /// Maximum number of dofs an element may be raised to.
    pub ndofmax: usize,
    /// CFL coefficient.
    pub cfl: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            limiter: LimiterType::default(),
            flux: FluxType::default(),
            intsharp: 0,
            intsharp_param: 1.8,
            shock_detection: true,
            fct: false,
            prelax: 0,
            prelax_timescale: 0.25,
            accuracy_test: false,
            pref: false,
            tolref: 0.5,
            tolderef: 1.0e-2,
            ndofmax: 10,
            cfl: 0.3,
        }
    }
}

impl Config {
    /// Number of solved dofs per component.
    pub const fn ndof(&self) -> usize {
        self.scheme.ndof()
    }

    /// Number of reconstructed dofs per component.
    pub const fn rdof(&self) -> usize {
        self.scheme.rdof()
    }

    /// Check flag combinations the core cannot run with.
    pub fn validate(&self) -> Result<(), MultiMatError> {
        if self.limiter == LimiterType::VertexBasedP1
            && self.rdof() != 4
            && self.rdof() != 10
        {
            return Err(MultiMatError::Config(format!(
                "vertexbasedp1 limiter requires rdof 4 or 10, scheme gives {}",
                self.rdof()
            )));
        }
        if matches!(self.limiter, LimiterType::WenoP1 | LimiterType::SuperbeeP1)
            && self.rdof() != 4
        {
            return Err(MultiMatError::Config(format!(
                "{:?} limiter requires rdof 4, scheme gives {}",
                self.limiter,
                self.rdof()
            )));
        }
        if self.pref && self.rdof() > self.ndof() {
            return Err(MultiMatError::Config(
                "p-adaptivity is unsupported with reconstructed (P0P1/FV) schemes".into(),
            ));
        }
        if self.pref && !(self.ndofmax == 4 || self.ndofmax == 10) {
            return Err(MultiMatError::Config(format!(
                "ndofmax must be 4 or 10, got {}",
                self.ndofmax
            )));
        }
        if !(self.cfl > 0.0 && self.cfl < 1.0) {
            return Err(MultiMatError::Config(format!(
                "cfl must be in (0,1), got {}",
                self.cfl
            )));
        }
        if self.prelax != 0 && self.prelax_timescale <= 0.0 {
            return Err(MultiMatError::Config(
                "prelax_timescale must be positive when prelax is on".into(),
            ));
        }
        Ok(())
    }
}
