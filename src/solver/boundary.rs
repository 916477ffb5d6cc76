//! The boundary between the solve loop and a convex backend.
//!
//! The loop hands a [`GeometricProgram`] (monomial objective, monomial
//! equalities, posynomial `<= 1` inequalities) to a [`ConvexSolver`] and
//! reads back a [`GpSolution`]. [`dispatch`] wraps the call in a bounded wait.

use std::collections::BTreeSet;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::{Result, SizingError};
use crate::expr::{Monomial, Signomial, VarKey};

/// A variable of a geometric program.
#[derive(Debug, Clone, PartialEq)]
pub struct GpVariable {
    pub key: VarKey,
    /// Pinned value for constants.
    pub fixed: Option<f64>,
}

/// A geometric program in standard form.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometricProgram {
    pub variables: Vec<GpVariable>,
    /// Monomial to minimize.
    pub objective: Monomial,
    /// Each entry `m` means `m == 1`.
    pub equalities: Vec<Monomial>,
    /// Each entry `p` means `p <= 1`.
    pub inequalities: Vec<Signomial>,
}

impl GeometricProgram {
    /// Check the standard-form invariants: positive coefficients and every
    /// referenced variable listed exactly once.
    pub fn validate(&self) -> Result<()> {
        let mut listed = BTreeSet::new();
        for v in &self.variables {
            if !listed.insert(&v.key) {
                return Err(SizingError::InvalidModel(format!(
                    "variable {:?} listed twice in geometric program",
                    v.key
                )));
            }
            if let Some(value) = v.fixed {
                if !(value.is_finite() && value > 0.0) {
                    return Err(SizingError::invalid_substitution(
                        format!("{:?}", v.key),
                        format!("pinned value {value} is not strictly positive"),
                    ));
                }
            }
        }

        let monomials = std::iter::once(&self.objective).chain(&self.equalities);
        for m in monomials {
            if !(m.coeff() > 0.0 && m.coeff().is_finite()) {
                return Err(SizingError::InvalidModel(format!(
                    "monomial {m} has a non-positive coefficient"
                )));
            }
            if let Some(v) = m.variables().iter().find(|v| !listed.contains(v)) {
                return Err(SizingError::InvalidModel(format!(
                    "variable {v:?} not listed in geometric program"
                )));
            }
        }
        for p in &self.inequalities {
            if !p.is_posynomial() || p.terms().iter().any(|t| !t.coeff().is_finite()) {
                return Err(SizingError::InvalidModel(format!(
                    "inequality {p} <= 1 is not a posynomial"
                )));
            }
            if let Some(v) = p.variables().iter().find(|v| !listed.contains(v)) {
                return Err(SizingError::InvalidModel(format!(
                    "variable {v:?} not listed in geometric program"
                )));
            }
        }
        Ok(())
    }

    /// Index of a variable in [`variables`](Self::variables).
    pub fn position(&self, key: &VarKey) -> Option<usize> {
        self.variables.iter().position(|v| &v.key == key)
    }
}

/// Outcome reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpStatus {
    Optimal,
    Infeasible,
    Unbounded,
    NumericalFailure,
}

/// Result of one geometric-program solve.
#[derive(Debug, Clone, PartialEq)]
pub struct GpSolution {
    pub status: GpStatus,
    /// Optimal value of each variable, aligned with
    /// [`GeometricProgram::variables`]. Empty unless optimal.
    pub values: Vec<f64>,
    /// Optimal objective value.
    pub objective: f64,
    /// d log(objective) / d log(value) for each pinned variable; zero for
    /// free ones. Aligned with [`GeometricProgram::variables`].
    pub sensitivities: Vec<f64>,
    /// Backend-specific detail for non-optimal statuses.
    pub detail: Option<String>,
    /// Solve time in seconds.
    pub solve_time: f64,
    /// Number of backend iterations.
    pub iterations: u32,
}

impl GpSolution {
    /// A non-optimal outcome with no primal data.
    pub fn failed(status: GpStatus, detail: impl Into<String>) -> Self {
        GpSolution {
            status,
            values: Vec::new(),
            objective: f64::NAN,
            sensitivities: Vec::new(),
            detail: Some(detail.into()),
            solve_time: 0.0,
            iterations: 0,
        }
    }
}

/// A convex backend able to solve geometric programs.
#[cfg_attr(test, mockall::automock)]
pub trait ConvexSolver: Send + Sync {
    /// Solve one geometric program. Infeasibility is a status, not an error;
    /// errors mean the backend could not run at all.
    fn solve_gp(&self, gp: &GeometricProgram) -> Result<GpSolution>;
}

/// Run `solver` on `gp`, waiting at most `timeout` for the answer.
///
/// With no timeout the call runs on the current thread. Otherwise it runs on
/// a worker thread; if the answer does not arrive in time the worker is
/// abandoned and the result is [`SizingError::SolverUnavailable`].
pub fn dispatch(
    solver: &Arc<dyn ConvexSolver>,
    gp: Arc<GeometricProgram>,
    timeout: Option<Duration>,
) -> Result<GpSolution> {
    let Some(timeout) = timeout else {
        return solver.solve_gp(&gp);
    };

    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(solver);
    thread::Builder::new()
        .name("gp-dispatch".into())
        .spawn(move || {
            // The receiver may be gone after a timeout.
            let _ = tx.send(worker.solve_gp(&gp));
        })
        .map_err(|e| SizingError::SolverUnavailable(format!("cannot start solver thread: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(timeout_secs = timeout.as_secs_f64(), "solver did not answer in time");
            Err(SizingError::SolverUnavailable(format!(
                "no answer within {:.3} s",
                timeout.as_secs_f64()
            )))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(SizingError::SolverUnavailable(
            "solver thread exited without an answer".into(),
        )),
    }
}
