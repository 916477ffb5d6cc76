//! Solver interface for gpsize.
//!
//! This module provides:
//! - The solver boundary (`ConvexSolver`, `GeometricProgram`) and bounded dispatch
//! - Matrix stuffing to convert canonicalized programs to solver format
//! - Clarabel solver integration

pub mod boundary;
pub mod clarabel;
pub mod stuffing;

pub use self::clarabel::{ClarabelSettings, ClarabelSolver};
pub use boundary::{dispatch, ConvexSolver, GeometricProgram, GpSolution, GpStatus, GpVariable};
pub use stuffing::{stuff_problem, ConeDims, StuffedProblem};
