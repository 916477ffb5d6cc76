//! Error types for gpsize.

use thiserror::Error;

use crate::solution::{Solution, SolveStatus};

/// Error type for gpsize operations.
#[derive(Debug, Error)]
pub enum SizingError {
    /// A supplied value's unit is incompatible with the variable's unit.
    #[error("Unit mismatch for {variable}: expected a unit compatible with [{expected}], got [{got}]")]
    UnitMismatch {
        variable: String,
        expected: String,
        got: String,
    },

    /// A unit string could not be parsed.
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// Conflicting or dangling substitution.
    #[error("Invalid substitution for {variable}: {reason}")]
    InvalidSubstitution { variable: String, reason: String },

    /// The model tree is malformed.
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// A signomial relation was built without the signomial allowance.
    #[error("Signomial constraint not allowed here: {0}")]
    SignomialsDisabled(String),

    /// The convex relaxation at some iterate has no feasible point.
    #[error("Infeasible at iteration {iteration} ({} constraints in relaxation)", .constraints.len())]
    Infeasible {
        iteration: usize,
        constraints: Vec<String>,
    },

    /// The relaxation is unbounded below.
    #[error("Unbounded at iteration {iteration}")]
    Unbounded { iteration: usize },

    /// The backend reported numerical trouble.
    #[error("Numerical failure at iteration {iteration}: {reason}")]
    NumericalFailure { iteration: usize, reason: String },

    /// The iteration did not converge.
    #[error("Diverged after {iterations} iterations: {reason}")]
    Diverged {
        iterations: usize,
        reason: String,
        last: Option<Box<Solution>>,
    },

    /// The solver boundary could not be reached or timed out.
    #[error("Solver unavailable: {0}")]
    SolverUnavailable(String),

    /// A single sweep point failed.
    #[error("Sweep point {index} {values:?} failed: {source}")]
    SweepPointFailure {
        index: usize,
        values: Vec<(String, f64)>,
        #[source]
        source: Box<SizingError>,
    },
}

impl SizingError {
    /// The status a display layer should render for this failure.
    pub fn status(&self) -> SolveStatus {
        match self {
            SizingError::Infeasible { .. } => SolveStatus::Infeasible,
            SizingError::SweepPointFailure { source, .. } => source.status(),
            _ => SolveStatus::Diverged,
        }
    }

    /// Short name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SizingError::UnitMismatch { .. } => "UnitMismatch",
            SizingError::UnknownUnit(_) => "UnknownUnit",
            SizingError::InvalidSubstitution { .. } => "InvalidSubstitution",
            SizingError::InvalidModel(_) => "InvalidModel",
            SizingError::SignomialsDisabled(_) => "SignomialsDisabled",
            SizingError::Infeasible { .. } => "Infeasible",
            SizingError::Unbounded { .. } => "Unbounded",
            SizingError::NumericalFailure { .. } => "NumericalFailure",
            SizingError::Diverged { .. } => "Diverged",
            SizingError::SolverUnavailable(_) => "SolverUnavailable",
            SizingError::SweepPointFailure { .. } => "SweepPointFailure",
        }
    }

    pub(crate) fn invalid_substitution(variable: impl Into<String>, reason: impl Into<String>) -> Self {
        SizingError::InvalidSubstitution {
            variable: variable.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for gpsize operations.
pub type Result<T> = std::result::Result<T, SizingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_of_wrapped_failure() {
        let err = SizingError::SweepPointFailure {
            index: 3,
            values: vec![("x".into(), 2.0)],
            source: Box::new(SizingError::Infeasible {
                iteration: 0,
                constraints: vec![],
            }),
        };
        assert_eq!(err.status(), SolveStatus::Infeasible);
        assert_eq!(err.kind(), "SweepPointFailure");
    }

    #[test]
    fn test_display_carries_kind_details() {
        let err = SizingError::invalid_substitution("Battery.m", "unknown variable");
        assert_eq!(
            err.to_string(),
            "Invalid substitution for Battery.m: unknown variable"
        );
    }
}
