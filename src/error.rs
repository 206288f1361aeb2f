//! Error taxonomy of the numerical core.
//!
//! Recoverable per-Gauss-point excursions (a volume fraction slightly out of
//! bounds, a pressure below its floor) never surface here; they are handled
//! by the bound/positivity limiters and, failing that, by the trace-material
//! cleanup. What does surface is non-recoverable: a partial density still
//! negative after cleanup, a non-finite EOS evaluation, or a configuration
//! the core cannot run with. Those terminate the whole computation, because
//! retrying a time step on a single element would break conservation across
//! partitions.

use thiserror::Error;

/// Failures the core can report.
#[derive(Debug, Error)]
pub enum MultiMatError {
    /// A partial density is negative after the trace-material cleanup.
    #[error(
        "negative partial density in element {element} (centroid {centroid:?}): \
         material {material}, alpha {alpha:.6e}, partial density {partial_density:.6e}, \
         partial pressure {partial_pressure:.6e}, majority pressure {majority_pressure:.6e}, \
         majority temperature {majority_temperature:.6e}, velocity {velocity:?}"
    )]
    NegativeDensity {
        element: usize,
        centroid: [f64; 3],
        material: usize,
        alpha: f64,
        partial_density: f64,
        partial_pressure: f64,
        majority_pressure: f64,
        majority_temperature: f64,
        velocity: [f64; 3],
    },

    /// An EOS call produced a non-finite pressure or sound speed.
    #[error(
        "material {material} has non-finite {quantity} ({value}) in element {element}: \
         alpha {alpha:.6e}, partial density {partial_density:.6e}"
    )]
    NonFiniteEos {
        quantity: &'static str,
        value: f64,
        element: usize,
        material: usize,
        alpha: f64,
        partial_density: f64,
    },

    /// A solid material lost invertibility of its deformation gradient.
    #[error(
        "material {material} has non-positive det(g) = {detg:.6e} in element {element}"
    )]
    DegenerateDeformation {
        element: usize,
        material: usize,
        detg: f64,
    },

    /// The input deck asked for something the core does not support.
    #[error("configuration error: {0}")]
    Config(String),

    /// A boundary-condition kind was attached to an unknown side set, or an
    /// unknown kind was requested.
    #[error("boundary-condition error on side set {side_set}: {message}")]
    BoundaryCondition { side_set: i32, message: String },

    /// Caller-side contract violation detected at runtime in release builds.
    #[error("contract violation: {0}")]
    Contract(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_density_message_names_element_and_material() {
        let e = MultiMatError::NegativeDensity {
            element: 42,
            centroid: [0.5, 0.5, 0.5],
            material: 1,
            alpha: 1e-3,
            partial_density: -1e-7,
            partial_pressure: 1e2,
            majority_pressure: 1e5,
            majority_temperature: 300.0,
            velocity: [1.0, 0.0, 0.0],
        };
        let msg = e.to_string();
        assert!(msg.contains("element 42"));
        assert!(msg.contains("material 1"));
    }

    #[test]
    fn test_config_error_display() {
        let e = MultiMatError::Config("scheme not configured".into());
        assert!(e.to_string().contains("scheme not configured"));
    }
}
