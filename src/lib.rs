//! # gpsize
//!
//! Design optimization of engineering systems as geometric and signomial
//! programs.
//!
//! A system is described as a tree of sub-models, each owning strictly
//! positive variables with units and relations between them. The tree is
//! flattened into one constraint system, optionally with some constants
//! swept over a grid, and solved by successive convexification: signomial
//! relations are replaced by local posynomial approximations and the
//! resulting geometric program is solved in log space by Clarabel until the
//! cost stops changing. Each solution carries the sensitivity of the optimum
//! to every fixed constant.
//!
//! ## Quick Start
//!
//! ```
//! use gpsize::prelude::*;
//!
//! # fn main() -> gpsize::Result<()> {
//! let mut m = ModelBuilder::new("Box");
//! let x = m.var(var("x", "m"))?;
//! let y = m.var(var("y", "m").value(2.0))?;
//! m.geq(&x * &x, 3.0 * &y)?;
//! m.cost(&x);
//! let root = m.build()?;
//!
//! let solution = SpSolver::default().solve_model(&root, &Substitutions::new())?;
//! assert!((solution.cost - 6.0_f64.sqrt()).abs() < 1e-4);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **Expressions**: [`expr`] holds variables, monomials and signomials;
//!   [`atoms`] the operators and `pow`/`prod`/`sum` helpers
//! - **Constraints** are normalized into four tagged kinds; signomial kinds
//!   must be allowed explicitly
//! - **Models**: [`model`] composes sub-models and flattens them with
//!   substitutions
//! - **Solving**: [`canon`] convexifies and log-transforms, [`solver`] is the
//!   boundary to the conic backend, [`problem`] runs the iteration
//! - **Studies**: [`sweep`], [`sensitivity`] and [`report`]
//! - **Library**: [`aircraft`] sizes a battery-electric aircraft

pub mod aircraft;
pub mod atoms;
pub mod canon;
pub mod config;
pub mod constraints;
pub mod error;
pub mod expr;
pub mod logging;
pub mod model;
pub mod problem;
pub mod report;
pub mod sensitivity;
pub mod solution;
pub mod solver;
pub mod sparse;
pub mod sweep;
pub mod units;

/// Prelude module for convenient imports.
///
/// ```
/// use gpsize::prelude::*;
/// ```
pub mod prelude {
    // Expressions
    pub use crate::expr::{var, Monomial, Signomial, VarArray, VarKey, VariableBuilder};

    // Atoms
    pub use crate::atoms::{pow, prod, sum};

    // Constraints
    pub use crate::constraints::{Constraint, SignomialPolicy};

    // Models
    pub use crate::model::{flatten, ModelBuilder, ModelNode, Substitution, Substitutions};

    // Solving
    pub use crate::config::SolveSettings;
    pub use crate::problem::{solve, SpSolver};
    pub use crate::solution::{Solution, SolveStatus};

    // Studies
    pub use crate::sensitivity::{rank, SensitivityReport};
    pub use crate::sweep::{sweep, sweep_parallel, SweepSpec};

    // Units
    pub use crate::units::{Quantity, Unit, UnitTable};

    // Errors
    pub use crate::error::{Result, SizingError};
}

// Re-export main types at crate root
pub use error::{Result, SizingError};
pub use problem::SpSolver;
pub use solution::{Solution, SolveStatus};
