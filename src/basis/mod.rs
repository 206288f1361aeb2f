//! Reference-element basis machinery.
//!
//! The modal basis used throughout is the Dubiner basis on the unit
//! tetrahedron: Legendre-type polynomials adapted to the simplex, orthogonal
//! under the unit weight so the mass matrix is diagonal. The Taylor basis
//! (powers of the offset from the centroid) is used only transiently, for
//! hierarchical limiting, with exact transforms in both directions.

pub mod dubiner;
pub mod taylor;

pub use dubiner::{
    eval_basis, eval_dbdx_p1, eval_dbdx_p2, eval_dbdxi, mass_matrix_dubiner,
};
pub use taylor::{
    dubiner_to_taylor_ref_el, eval_taylor_basis, eval_taylor_basis_ref_el, inverse_basis,
    taylor_mass_inverse_ref_el, taylor_to_dubiner_ref_el, transform_basis,
};
