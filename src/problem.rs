//! The successive-convexification solve loop.
//!
//! Each pass replaces every signomial constraint of a [`FlattenedSystem`]
//! with a posynomial approximation around the current iterate, hands the
//! resulting geometric program to the convex backend and moves the iterate
//! to the answer. A system without signomial constraints is solved in a
//! single pass.
//!
//! ```
//! use gpsize::expr::var;
//! use gpsize::model::{flatten, ModelBuilder, Substitutions};
//! use gpsize::problem::solve;
//!
//! # fn main() -> gpsize::Result<()> {
//! let mut m = ModelBuilder::new("M");
//! let x = m.var(var("x", "-"))?;
//! let y = m.var(var("y", "-"))?;
//! m.signomial_leq(3.0, &x + &y)?;
//! m.leq(&y, 1.0)?;
//! m.cost(&x);
//! let system = flatten(&m.build()?, &Substitutions::new())?;
//!
//! let solution = solve(&system, 50, 1e-6)?;
//! assert!((solution.cost - 2.0).abs() < 1e-3);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::canon::convexify;
use crate::config::SolveSettings;
use crate::error::{Result, SizingError};
use crate::expr::{Point, VarId};
use crate::model::{flatten, FlatConstraint, FlattenedSystem, ModelNode, Substitutions, VarState};
use crate::solution::{Sensitivity, SensitivityValue, SolveStatus, SolvedVariable, Solution};
use crate::solver::{dispatch, ClarabelSolver, ConvexSolver, GeometricProgram, GpSolution, GpStatus};

/// Solve `system` with the default backend.
pub fn solve(system: &FlattenedSystem, max_iters: usize, tol: f64) -> Result<Solution> {
    let settings = SolveSettings {
        max_iters,
        tol,
        ..SolveSettings::default()
    };
    SpSolver::new(settings).solve(system)
}

/// Successive-convexification driver around a convex backend.
#[derive(Clone)]
pub struct SpSolver {
    backend: Arc<dyn ConvexSolver>,
    settings: SolveSettings,
}

impl std::fmt::Debug for SpSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpSolver")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for SpSolver {
    fn default() -> Self {
        SpSolver::new(SolveSettings::default())
    }
}

impl SpSolver {
    /// Driver using Clarabel configured from `settings.backend`. A dispatch
    /// timeout also caps Clarabel's own time limit.
    pub fn new(settings: SolveSettings) -> Self {
        let backend = Arc::new(ClarabelSolver::new(settings.backend_settings()));
        SpSolver { backend, settings }
    }

    /// Driver using a caller-supplied backend.
    pub fn with_backend(backend: Arc<dyn ConvexSolver>, settings: SolveSettings) -> Self {
        SpSolver { backend, settings }
    }

    pub fn settings(&self) -> &SolveSettings {
        &self.settings
    }

    /// Flatten `root` under `substitutions` and solve it.
    pub fn solve_model(&self, root: &ModelNode, substitutions: &Substitutions) -> Result<Solution> {
        self.solve(&flatten(root, substitutions)?)
    }

    /// Run the loop to convergence.
    ///
    /// Fails with [`SizingError::Infeasible`], [`SizingError::Unbounded`] or
    /// [`SizingError::NumericalFailure`] as soon as one relaxation does, and
    /// with [`SizingError::Diverged`] (carrying the last iterate) when the
    /// cost rises or the iteration cap is reached.
    pub fn solve(&self, system: &FlattenedSystem) -> Result<Solution> {
        let SolveSettings {
            max_iters,
            tol,
            cost_rise_tol,
            ..
        } = self.settings;
        let timeout = self.settings.dispatch_timeout();
        let signomial = system.has_signomials();

        let mut point = initial_point(system)?;
        let mut history: Vec<f64> = Vec::new();
        let mut last: Option<(Arc<GeometricProgram>, GpSolution)> = None;

        for iteration in 0..max_iters {
            let relaxation = convexify(system, &point)?;
            let gp = Arc::new(relaxation.gp);
            let answer = dispatch(&self.backend, Arc::clone(&gp), timeout)?;

            match answer.status {
                GpStatus::Optimal => {}
                GpStatus::Infeasible => {
                    return Err(SizingError::Infeasible {
                        iteration,
                        constraints: system.constraints().iter().map(FlatConstraint::label).collect(),
                    })
                }
                GpStatus::Unbounded => return Err(SizingError::Unbounded { iteration }),
                GpStatus::NumericalFailure => {
                    return Err(SizingError::NumericalFailure {
                        iteration,
                        reason: answer.detail.unwrap_or_else(|| "no detail".into()),
                    })
                }
            }
            if answer.values.len() != gp.variables.len() {
                return Err(SizingError::NumericalFailure {
                    iteration,
                    reason: format!(
                        "backend returned {} values for {} variables",
                        answer.values.len(),
                        gp.variables.len()
                    ),
                });
            }

            let moved: Vec<_> = gp
                .variables
                .iter()
                .zip(&answer.values)
                .filter(|(v, _)| v.fixed.is_none() && Some(&v.key) != relaxation.epigraph.as_ref())
                .collect();
            let outside = moved
                .iter()
                .copied()
                .find(|(_, value)| !(value.is_finite() && **value > 0.0));
            if let Some((v, value)) = outside {
                // The iterate has not moved yet; report the previous pass.
                let last = last.as_ref().map(|(gp, answer)| {
                    Box::new(assemble(system, &point, gp, answer, SolveStatus::Diverged, &history))
                });
                return Err(SizingError::Diverged {
                    iterations: iteration + 1,
                    reason: format!("{:?} left the positive domain ({value})", v.key),
                    last,
                });
            }
            for (v, value) in moved {
                point.insert(v.key.clone(), *value);
            }

            let cost = system.cost().eval(&point).ok_or_else(|| {
                SizingError::InvalidModel("cost references a variable with no value".into())
            })?;
            let previous = history.last().copied();
            history.push(cost);
            let change = previous.map(|p| (cost - p).abs() / p);
            debug!(iteration, cost, ?change, "convex relaxation solved");

            if let Some(p) = previous {
                if cost > p * (1.0 + cost_rise_tol) {
                    let last = assemble(system, &point, &gp, &answer, SolveStatus::Diverged, &history);
                    return Err(SizingError::Diverged {
                        iterations: iteration + 1,
                        reason: format!("cost rose from {p} to {cost}"),
                        last: Some(Box::new(last)),
                    });
                }
            }

            let converged = !signomial || change.is_some_and(|c| c <= tol);
            if converged {
                info!(iterations = iteration + 1, cost, "converged");
                return Ok(assemble(system, &point, &gp, &answer, SolveStatus::Optimal, &history));
            }
            last = Some((gp, answer));
        }

        let last = last.map(|(gp, answer)| {
            Box::new(assemble(system, &point, &gp, &answer, SolveStatus::Diverged, &history))
        });
        Err(SizingError::Diverged {
            iterations: max_iters,
            reason: format!("no convergence within {max_iters} iterations"),
            last,
        })
    }
}

/// Starting values: fixed values for constants, the nominal guess or 1 for
/// decision variables.
fn initial_point(system: &FlattenedSystem) -> Result<Point> {
    system
        .variables()
        .iter()
        .map(|info| {
            let value = match &info.state {
                VarState::Fixed(v) => *v,
                VarState::Free => info.key.nominal().unwrap_or(1.0),
                VarState::Swept(_) => {
                    return Err(SizingError::invalid_substitution(
                        &info.path,
                        "sweep marker was not resolved to a single value before solving",
                    ))
                }
            };
            Ok((info.key.clone(), value))
        })
        .collect()
}

fn assemble(
    system: &FlattenedSystem,
    point: &Point,
    gp: &GeometricProgram,
    answer: &GpSolution,
    status: SolveStatus,
    history: &[f64],
) -> Solution {
    let variables = system
        .variables()
        .iter()
        .map(|info| SolvedVariable {
            key: info.key.clone(),
            label: info.label.clone(),
            value: point.get(&info.key).copied().unwrap_or(f64::NAN),
            fixed: matches!(info.state, VarState::Fixed(_)),
        })
        .collect();

    // Vector constants are grouped into one entry at their first station.
    let mut sensitivities: Vec<Sensitivity> = Vec::new();
    let mut grouped: BTreeMap<VarId, usize> = BTreeMap::new();
    for info in system.variables() {
        if !matches!(info.state, VarState::Fixed(_)) {
            continue;
        }
        let value = gp
            .position(&info.key)
            .and_then(|i| answer.sensitivities.get(i).copied())
            .unwrap_or(0.0);
        let unit = info.key.unit().to_string();
        match info.key.array() {
            None => sensitivities.push(Sensitivity {
                label: info.label.clone(),
                unit,
                value: SensitivityValue::Scalar(value),
            }),
            Some(pos) => {
                let slot = *grouped.entry(pos.array).or_insert_with(|| {
                    let suffix = format!("[{}]", pos.index);
                    let label = info
                        .label
                        .strip_suffix(&suffix)
                        .unwrap_or(&info.label)
                        .to_string();
                    sensitivities.push(Sensitivity {
                        label,
                        unit,
                        value: SensitivityValue::Vector(vec![0.0; pos.len]),
                    });
                    sensitivities.len() - 1
                });
                if let SensitivityValue::Vector(values) = &mut sensitivities[slot].value {
                    values[pos.index] = value;
                }
            }
        }
    }

    Solution {
        status,
        cost: history.last().copied().unwrap_or(f64::NAN),
        variables,
        sensitivities,
        iterations: history.len(),
        cost_history: history.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::var;
    use crate::model::ModelBuilder;
    use crate::solver::boundary::MockConvexSolver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn answer(values: Vec<f64>) -> GpSolution {
        GpSolution {
            status: GpStatus::Optimal,
            sensitivities: vec![0.0; values.len()],
            objective: values.first().copied().unwrap_or(1.0),
            values,
            detail: None,
            solve_time: 0.0,
            iterations: 1,
        }
    }

    fn posynomial_system() -> FlattenedSystem {
        let mut m = ModelBuilder::new("M");
        let x = m.var(var("x", "-")).unwrap();
        m.geq(&x, 1.0).unwrap();
        m.cost(&x);
        flatten(&m.build().unwrap(), &Substitutions::new()).unwrap()
    }

    fn signomial_system() -> FlattenedSystem {
        let mut m = ModelBuilder::new("M");
        let x = m.var(var("x", "-")).unwrap();
        let y = m.var(var("y", "-")).unwrap();
        m.signomial_leq(3.0, &x + &y).unwrap();
        m.leq(&y, 1.0).unwrap();
        m.cost(&x);
        flatten(&m.build().unwrap(), &Substitutions::new()).unwrap()
    }

    #[test]
    fn test_posynomial_system_single_pass() {
        let mut mock = MockConvexSolver::new();
        mock.expect_solve_gp()
            .times(1)
            .returning(|gp| Ok(answer(vec![1.0; gp.variables.len()])));
        let sp = SpSolver::with_backend(Arc::new(mock), SolveSettings::default());
        let sol = sp.solve(&posynomial_system()).unwrap();
        assert_eq!(sol.status, SolveStatus::Optimal);
        assert_eq!(sol.iterations, 1);
        assert_eq!(sol.cost, 1.0);
    }

    #[test]
    fn test_infeasible_carries_iteration_and_constraints() {
        let mut mock = MockConvexSolver::new();
        mock.expect_solve_gp()
            .returning(|_| Ok(GpSolution::failed(GpStatus::Infeasible, "PrimalInfeasible")));
        let sp = SpSolver::with_backend(Arc::new(mock), SolveSettings::default());
        match sp.solve(&signomial_system()) {
            Err(SizingError::Infeasible {
                iteration,
                constraints,
            }) => {
                assert_eq!(iteration, 0);
                assert_eq!(constraints.len(), 2);
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_cost_rise_is_divergence() {
        let calls = AtomicUsize::new(0);
        let mut mock = MockConvexSolver::new();
        mock.expect_solve_gp().returning(move |gp| {
            let k = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(answer(vec![k as f64; gp.variables.len()]))
        });
        let sp = SpSolver::with_backend(Arc::new(mock), SolveSettings::default());
        match sp.solve(&signomial_system()) {
            Err(SizingError::Diverged {
                iterations, last, ..
            }) => {
                assert_eq!(iterations, 2);
                let last = last.unwrap();
                assert_eq!(last.status, SolveStatus::Diverged);
                assert_eq!(last.cost_history, vec![1.0, 2.0]);
            }
            other => panic!("expected divergence, got {other:?}"),
        }
    }

    #[test]
    fn test_iteration_cap_reports_last_iterate() {
        let calls = AtomicUsize::new(0);
        let mut mock = MockConvexSolver::new();
        mock.expect_solve_gp().returning(move |gp| {
            // Strictly decreasing cost that never settles within tolerance.
            let k = calls.fetch_add(1, Ordering::SeqCst) as f64;
            Ok(answer(vec![1.0 / (1.0 + k); gp.variables.len()]))
        });
        let settings = SolveSettings {
            max_iters: 3,
            ..SolveSettings::default()
        };
        let sp = SpSolver::with_backend(Arc::new(mock), settings);
        match sp.solve(&signomial_system()) {
            Err(SizingError::Diverged {
                iterations, last, ..
            }) => {
                assert_eq!(iterations, 3);
                assert_eq!(last.unwrap().iterations, 3);
            }
            other => panic!("expected divergence, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_iterations_diverges_without_iterate() {
        let mock = MockConvexSolver::new();
        let settings = SolveSettings {
            max_iters: 0,
            ..SolveSettings::default()
        };
        let sp = SpSolver::with_backend(Arc::new(mock), settings);
        assert!(matches!(
            sp.solve(&posynomial_system()),
            Err(SizingError::Diverged { last: None, .. })
        ));
    }

    #[test]
    fn test_dispatch_timeout_is_solver_unavailable() {
        let mut mock = MockConvexSolver::new();
        mock.expect_solve_gp().returning(|gp| {
            std::thread::sleep(Duration::from_millis(500));
            Ok(answer(vec![1.0; gp.variables.len()]))
        });
        let settings = SolveSettings {
            dispatch_timeout_secs: Some(0.02),
            ..SolveSettings::default()
        };
        let sp = SpSolver::with_backend(Arc::new(mock), settings);
        assert!(matches!(
            sp.solve(&posynomial_system()),
            Err(SizingError::SolverUnavailable(_))
        ));
    }

    #[test]
    fn test_nonpositive_value_diverges() {
        let mut mock = MockConvexSolver::new();
        mock.expect_solve_gp()
            .returning(|gp| Ok(answer(vec![0.0; gp.variables.len()])));
        let sp = SpSolver::with_backend(Arc::new(mock), SolveSettings::default());
        assert!(matches!(
            sp.solve(&posynomial_system()),
            Err(SizingError::Diverged { last: None, .. })
        ));
    }

    #[test]
    fn test_nonpositive_value_keeps_previous_iterate() {
        let calls = AtomicUsize::new(0);
        let mut mock = MockConvexSolver::new();
        mock.expect_solve_gp().returning(move |gp| {
            let value = match calls.fetch_add(1, Ordering::SeqCst) {
                0 => 2.0,
                _ => f64::NAN,
            };
            Ok(answer(vec![value; gp.variables.len()]))
        });
        let sp = SpSolver::with_backend(Arc::new(mock), SolveSettings::default());
        match sp.solve(&signomial_system()) {
            Err(SizingError::Diverged {
                iterations, last, ..
            }) => {
                assert_eq!(iterations, 2);
                let last = last.unwrap();
                assert_eq!(last.status, SolveStatus::Diverged);
                assert_eq!(last.cost_history, vec![2.0]);
                assert!(last.variables.iter().all(|v| v.value.is_finite()));
            }
            other => panic!("expected divergence, got {other:?}"),
        }
    }

    #[test]
    fn test_vector_sensitivities_grouped() {
        let mut m = ModelBuilder::new("M");
        let x = m.var(var("x", "-")).unwrap();
        let c = m.array(var("c", "-").values(vec![1.0, 2.0]), 2).unwrap();
        m.geq(&x, &c[0]).unwrap();
        m.geq(&x, &c[1]).unwrap();
        m.cost(&x);
        let system = flatten(&m.build().unwrap(), &Substitutions::new()).unwrap();

        let mut mock = MockConvexSolver::new();
        mock.expect_solve_gp().returning(|gp| {
            let mut a = answer(gp.variables.iter().map(|v| v.fixed.unwrap_or(2.0)).collect());
            a.sensitivities = gp
                .variables
                .iter()
                .map(|v| if v.fixed == Some(2.0) { 1.0 } else { 0.0 })
                .collect();
            Ok(a)
        });
        let sp = SpSolver::with_backend(Arc::new(mock), SolveSettings::default());
        let sol = sp.solve(&system).unwrap();
        assert_eq!(sol.sensitivities.len(), 1);
        assert_eq!(sol.sensitivities[0].label, "c");
        assert_eq!(
            sol.sensitivities[0].value,
            SensitivityValue::Vector(vec![0.0, 1.0])
        );
    }
}
