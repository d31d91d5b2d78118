//! Dense linear algebra helpers built on nalgebra decompositions.

pub mod whiten;

pub use whiten::{inv_sqrt_spd, DEFAULT_EIGENVALUE_FLOOR};
