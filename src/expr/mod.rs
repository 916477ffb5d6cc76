//! Expression types and creation utilities.
//!
//! This module provides the core expression types for building sizing models:
//! - `VarKey` / `VarArray` - variables and fixed-size per-station vectors
//! - `Monomial` - a coefficient times a product of powers
//! - `Signomial` - a sum of monomials with coefficients of either sign
//! - Variable creation via `var()` and `VariableBuilder`

pub mod monomial;
pub mod signomial;
pub mod variable;

// Re-export main types
pub use monomial::{Monomial, Point};
pub use signomial::Signomial;
pub use variable::{
    var, ArrayPosition, Declared, VarArray, VarId, VarKey, VariableBuilder, VariableData,
};
