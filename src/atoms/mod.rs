//! Atom functions and operators for building expressions.
//!
//! - **Product atoms**: products, quotients and powers of monomials. These are
//!   affine after the log transform.
//! - **Sum atoms**: sums and differences. A sum of positive terms is convex
//!   (log-sum-exp) after the log transform; a difference is a signomial.

pub mod affine;
pub mod nonlinear;

pub use affine::{pow, prod};
pub use nonlinear::sum;
