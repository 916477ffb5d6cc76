//! Canonicalization transforms sizing constraints into solver form.
//!
//! This module converts:
//! - Signomial constraints into local posynomial approximations (`convexify`)
//! - Geometric programs into log-space affine expressions (`LinExpr`) and
//!   cone constraints (`ConeConstraint`)

pub mod canonicalizer;
pub mod convexify;
pub mod lin_expr;

pub use canonicalizer::{canonicalize, CanonResult, ConeConstraint};
pub use convexify::{convexify, monomial_fit, Relaxation};
pub use lin_expr::LinExpr;
