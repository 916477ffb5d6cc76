//! Clarabel solver integration.
//!
//! This module provides the default [`ConvexSolver`] backed by the Clarabel
//! conic solver.

use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::boundary::{ConvexSolver, GeometricProgram, GpSolution, GpStatus};
use super::stuffing::{stuff_problem, ConeDims, StuffedProblem};
use crate::canon::{canonicalize, CanonResult};
use crate::error::{Result, SizingError};
use crate::sparse::csc_transpose_mul;

impl From<SolverStatus> for GpStatus {
    fn from(status: SolverStatus) -> Self {
        match status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => GpStatus::Optimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                GpStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                GpStatus::Unbounded
            }
            _ => GpStatus::NumericalFailure,
        }
    }
}

/// Clarabel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClarabelSettings {
    /// Print solver output.
    pub verbose: bool,
    /// Maximum iterations.
    pub max_iter: u32,
    /// Time limit in seconds.
    pub time_limit: f64,
    /// Absolute tolerance.
    pub tol_gap_abs: f64,
    /// Relative tolerance.
    pub tol_gap_rel: f64,
}

impl Default for ClarabelSettings {
    fn default() -> Self {
        ClarabelSettings {
            verbose: false,
            max_iter: 200,
            time_limit: f64::INFINITY,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
        }
    }
}

/// Geometric-program backend using Clarabel.
#[derive(Debug, Clone, Default)]
pub struct ClarabelSolver {
    settings: ClarabelSettings,
}

impl ClarabelSolver {
    pub fn new(settings: ClarabelSettings) -> Self {
        ClarabelSolver { settings }
    }

    pub fn settings(&self) -> &ClarabelSettings {
        &self.settings
    }
}

impl ConvexSolver for ClarabelSolver {
    fn solve_gp(&self, gp: &GeometricProgram) -> Result<GpSolution> {
        let canon = canonicalize(gp)?;
        let stuffed = stuff_problem(&canon);
        solve(&stuffed, &canon, gp.variables.len(), &self.settings)
    }
}

/// Solve the stuffed problem using Clarabel.
///
/// `nvars` is the number of program variables; later columns are auxiliaries.
pub fn solve(
    problem: &StuffedProblem,
    canon: &CanonResult,
    nvars: usize,
    settings: &ClarabelSettings,
) -> Result<GpSolution> {
    // Convert to Clarabel format
    let p = to_clarabel_csc(&problem.p);
    let a = to_clarabel_csc(&problem.a);
    let cones = to_clarabel_cones(&problem.cone_dims);

    // Build Clarabel settings
    let clarabel_settings = DefaultSettingsBuilder::default()
        .verbose(settings.verbose)
        .max_iter(settings.max_iter)
        .time_limit(settings.time_limit)
        .tol_gap_abs(settings.tol_gap_abs)
        .tol_gap_rel(settings.tol_gap_rel)
        .build()
        .map_err(|e| SizingError::SolverUnavailable(format!("invalid Clarabel settings: {e}")))?;

    // Create and run solver
    let mut solver = DefaultSolver::new(&p, &problem.q, &a, &problem.b, &cones, clarabel_settings);
    solver.solve();

    // Extract solution
    let raw_status = solver.solution.status;
    let status: GpStatus = raw_status.into();
    let solve_time = solver.solution.solve_time;
    let iterations = solver.info.iterations;

    if status != GpStatus::Optimal {
        debug!(?raw_status, iterations, "Clarabel did not reach an optimum");
        return Ok(GpSolution {
            solve_time,
            iterations,
            ..GpSolution::failed(status, format!("{raw_status:?}"))
        });
    }
    if raw_status == SolverStatus::AlmostSolved {
        warn!(iterations, "Clarabel reached reduced accuracy only");
    }

    let x = &solver.solution.x;
    let z = &solver.solution.z;

    let log_objective: f64 = problem
        .q
        .iter()
        .zip(x.iter())
        .map(|(qi, xi)| qi * xi)
        .sum::<f64>()
        + problem.objective_offset;

    // Stationarity residual q + A'z, for diagnostics.
    let residual = csc_transpose_mul(&problem.a, z)
        .iter()
        .zip(&problem.q)
        .map(|(az, q)| (az + q).abs())
        .fold(0.0, f64::max);
    debug!(iterations, solve_time, residual, "Clarabel solved");

    // d(log objective)/d(ln v) = -z on the pin row y_j = ln v.
    let mut sensitivities = vec![0.0; nvars];
    for &(j, ci) in &canon.pins {
        sensitivities[j] = -z[problem.rows[ci]];
    }

    Ok(GpSolution {
        status,
        values: x[..nvars].iter().map(|y| y.exp()).collect(),
        objective: log_objective.exp(),
        sensitivities,
        detail: None,
        solve_time,
        iterations,
    })
}

/// Convert nalgebra CSC to Clarabel CSC.
fn to_clarabel_csc(m: &nalgebra_sparse::CscMatrix<f64>) -> ClarabelCsc<f64> {
    ClarabelCsc::new(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        m.values().to_vec(),
    )
}

/// Convert cone dimensions to Clarabel cones.
fn to_clarabel_cones(dims: &ConeDims) -> Vec<SupportedConeT<f64>> {
    let mut cones = Vec::new();

    if dims.zero > 0 {
        cones.push(SupportedConeT::ZeroConeT(dims.zero));
    }

    if dims.nonneg > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(dims.nonneg));
    }

    // Exponential cones (each is 3D)
    for _ in 0..dims.exp {
        cones.push(SupportedConeT::ExponentialConeT());
    }

    cones
}
