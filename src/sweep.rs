//! Parameter sweeps: one independent solve per point of a Cartesian grid.
//!
//! Grid points are enumerated lexicographically over the declared axis
//! order, the first axis varying slowest. Every point gets its own copy of
//! the substitutions; the model tree is shared read-only.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{Result, SizingError};
use crate::expr::VarKey;
use crate::model::{flatten, FlattenedSystem, ModelNode, Substitution, Substitutions, VarState};
use crate::problem::SpSolver;
use crate::solution::Solution;

/// Swept variables and their candidate values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepSpec {
    axes: Vec<(VarKey, Vec<f64>)>,
}

impl SweepSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an axis. Values must be positive and the variable must not
    /// already be an axis.
    pub fn axis(mut self, var: &VarKey, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() || values.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(SizingError::invalid_substitution(
                format!("{var:?}"),
                "sweep values must be a non-empty list of positive numbers",
            ));
        }
        if self.axes.iter().any(|(k, _)| k == var) {
            return Err(SizingError::invalid_substitution(
                format!("{var:?}"),
                "swept twice in one sweep",
            ));
        }
        self.axes.push((var.clone(), values));
        Ok(self)
    }

    /// One axis per variable still carrying a sweep marker, in declaration
    /// order.
    pub fn from_markers(system: &FlattenedSystem) -> Self {
        let axes = system
            .variables()
            .iter()
            .filter_map(|info| match &info.state {
                VarState::Swept(values) => Some((info.key.clone(), values.clone())),
                _ => None,
            })
            .collect();
        SweepSpec { axes }
    }

    pub fn axes(&self) -> &[(VarKey, Vec<f64>)] {
        &self.axes
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn contains(&self, var: &VarKey) -> bool {
        self.axes.iter().any(|(k, _)| k == var)
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes.iter().map(|(_, v)| v.len()).product()
    }

    /// The grid point at `index`, decoding it in mixed radix with the last
    /// axis varying fastest.
    pub fn point(&self, index: usize) -> Option<GridPoint> {
        if index >= self.len() {
            return None;
        }
        let mut rest = index;
        let mut values = vec![0.0; self.axes.len()];
        for (slot, (_, candidates)) in values.iter_mut().zip(&self.axes).rev() {
            *slot = candidates[rest % candidates.len()];
            rest /= candidates.len();
        }
        Some(GridPoint {
            index,
            values: self
                .axes
                .iter()
                .map(|(k, _)| k.clone())
                .zip(values)
                .collect(),
        })
    }

    /// Every grid point in enumeration order.
    pub fn grid(&self) -> impl Iterator<Item = GridPoint> + '_ {
        (0..self.len()).filter_map(move |i| self.point(i))
    }
}

/// One point of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    /// Position in enumeration order.
    pub index: usize,
    /// Value of each swept variable, in axis order.
    pub values: Vec<(VarKey, f64)>,
}

impl GridPoint {
    /// Values labeled by variable, for diagnostics.
    pub fn labeled(&self) -> Vec<(String, f64)> {
        self.values
            .iter()
            .map(|(k, v)| (format!("{k:?}"), *v))
            .collect()
    }

    /// Value of one swept variable at this point.
    pub fn value(&self, var: &VarKey) -> Option<f64> {
        self.values.iter().find(|(k, _)| k == var).map(|(_, v)| *v)
    }
}

/// Outcome of one grid point. A failed point holds a
/// [`SizingError::SweepPointFailure`].
#[derive(Debug)]
pub struct SweepPoint {
    pub point: GridPoint,
    pub outcome: std::result::Result<Solution, SizingError>,
}

/// Sweep over `spec` with the default solver.
pub fn sweep<'a>(
    root: &'a ModelNode,
    base: &Substitutions,
    spec: SweepSpec,
    skip_failures: bool,
) -> Result<SweepRun<'a>> {
    SweepRun::new(SpSolver::default(), root, base, spec, skip_failures)
}

/// Lazy sweep: each call to `next` solves one grid point.
///
/// Without `skip_failures` the first failing point is yielded as an error
/// and the run stops.
#[derive(Debug)]
pub struct SweepRun<'a> {
    solver: SpSolver,
    root: &'a ModelNode,
    base: Substitutions,
    spec: SweepSpec,
    skip_failures: bool,
    next: usize,
    stopped: bool,
}

impl<'a> SweepRun<'a> {
    pub fn new(
        solver: SpSolver,
        root: &'a ModelNode,
        base: &Substitutions,
        spec: SweepSpec,
        skip_failures: bool,
    ) -> Result<Self> {
        check_sweep(root, base, &spec)?;
        Ok(SweepRun {
            solver,
            root,
            base: base.clone(),
            spec,
            skip_failures,
            next: 0,
            stopped: false,
        })
    }

    pub fn spec(&self) -> &SweepSpec {
        &self.spec
    }

    /// Run the remaining points and collect them. Fails with the first
    /// failing point unless failures are skipped.
    pub fn collect_results(self) -> Result<SweepResults> {
        let points = self.collect::<Result<Vec<_>>>()?;
        Ok(SweepResults { points })
    }
}

impl Iterator for SweepRun<'_> {
    type Item = Result<SweepPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped {
            return None;
        }
        let point = self.spec.point(self.next)?;
        self.next += 1;

        let outcome = solve_point(&self.solver, self.root, &self.base, &point);
        match outcome {
            Err(err) if !self.skip_failures => {
                self.stopped = true;
                Some(Err(err))
            }
            outcome => Some(Ok(SweepPoint { point, outcome })),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.stopped {
            0
        } else {
            self.spec.len() - self.next
        };
        (0, Some(left))
    }
}

/// Solve every grid point, several at a time when the `parallel` feature is
/// on. Results keep grid order.
pub fn sweep_parallel(
    solver: &SpSolver,
    root: &ModelNode,
    base: &Substitutions,
    spec: &SweepSpec,
    skip_failures: bool,
) -> Result<SweepResults> {
    check_sweep(root, base, spec)?;
    let grid: Vec<GridPoint> = spec.grid().collect();

    #[cfg(feature = "parallel")]
    let outcomes: Vec<std::result::Result<Solution, SizingError>> = grid
        .par_iter()
        .map(|point| solve_point(solver, root, base, point))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<std::result::Result<Solution, SizingError>> = grid
        .iter()
        .map(|point| solve_point(solver, root, base, point))
        .collect();

    let mut points = Vec::with_capacity(grid.len());
    for (point, outcome) in grid.into_iter().zip(outcomes) {
        match outcome {
            Err(err) if !skip_failures => return Err(err),
            outcome => points.push(SweepPoint { point, outcome }),
        }
    }
    Ok(SweepResults { points })
}

fn check_sweep(root: &ModelNode, base: &Substitutions, spec: &SweepSpec) -> Result<()> {
    if spec.is_empty() {
        return Err(SizingError::InvalidModel("sweep has no axes".into()));
    }
    for (key, _) in spec.axes() {
        if let Some(Substitution::Value(_) | Substitution::Quantity(_)) = base.get(key) {
            return Err(SizingError::invalid_substitution(
                format!("{key:?}"),
                "fixed by the base substitutions and swept at the same time",
            ));
        }
    }
    let system = flatten(root, base)?;
    for (key, _) in spec.axes() {
        if system.variable(key).is_none() {
            return Err(SizingError::invalid_substitution(
                format!("{key:?}"),
                "swept but not a variable of this model",
            ));
        }
    }
    if let Some(info) = system.swept().find(|info| !spec.contains(&info.key)) {
        return Err(SizingError::invalid_substitution(
            &info.path,
            "carries a sweep marker that is not part of this sweep",
        ));
    }
    Ok(())
}

fn solve_point(
    solver: &SpSolver,
    root: &ModelNode,
    base: &Substitutions,
    point: &GridPoint,
) -> std::result::Result<Solution, SizingError> {
    let mut subs = base.clone();
    for (key, value) in &point.values {
        subs.insert(key, *value);
    }
    match solver.solve_model(root, &subs) {
        Ok(solution) => {
            info!(index = point.index, cost = solution.cost, "sweep point solved");
            Ok(solution)
        }
        Err(source) => {
            warn!(index = point.index, kind = source.kind(), "sweep point failed");
            Err(SizingError::SweepPointFailure {
                index: point.index,
                values: point.labeled(),
                source: Box::new(source),
            })
        }
    }
}

/// A finished sweep in grid order.
#[derive(Debug)]
pub struct SweepResults {
    points: Vec<SweepPoint>,
}

impl SweepResults {
    pub fn points(&self) -> &[SweepPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Successful points only, for aggregation.
    pub fn solutions(&self) -> impl Iterator<Item = (&GridPoint, &Solution)> {
        self.points
            .iter()
            .filter_map(|p| p.outcome.as_ref().ok().map(|s| (&p.point, s)))
    }

    /// Recorded failures.
    pub fn failures(&self) -> impl Iterator<Item = (&GridPoint, &SizingError)> {
        self.points
            .iter()
            .filter_map(|p| p.outcome.as_ref().err().map(|e| (&p.point, e)))
    }

    pub fn into_points(self) -> Vec<SweepPoint> {
        self.points
    }
}
