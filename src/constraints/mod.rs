//! Constraints and their normalization into the four tagged kinds.

pub mod constraint;

pub use constraint::{Constraint, SignomialPolicy};
