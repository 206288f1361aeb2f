//! The per-stage numerical pipeline: surface and volume integrals,
//! non-conservative products, limiting, cleanup, time-step control and
//! p-adaptivity, driven by [`system::MultiMatSystem`].

pub mod adaptivity;
pub mod boundary_int;
pub mod cleanup;
pub mod limiter;
pub mod multimat_terms;
pub mod surface;
pub mod system;
pub mod timestep;
pub mod volume;

pub use system::MultiMatSystem;

/// Number of local degrees of freedom used to evaluate element `e`.
///
/// With an rDG scheme (`rdof > ndof`) the reconstructed representation is
/// evaluated everywhere; otherwise the element's adaptive dof count rules.
/// For p-adaptive multi-material runs an element at P0 still evaluates its
/// P1 reconstruction.
#[inline]
pub(crate) fn dof_el(pref: bool, ndof: usize, rdof: usize, ndofel_e: usize) -> usize {
    if rdof > ndof {
        rdof
    } else if pref && ndofel_e == 1 {
        4
    } else {
        ndofel_e
    }
}
