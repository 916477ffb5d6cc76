//! Ranking of constants by their leverage on the optimum.

use std::fmt;

use crate::solution::Solution;

/// One row of a sensitivity ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSensitivity {
    pub label: String,
    /// Signed value; vector sensitivities are summed.
    pub value: f64,
    pub unit: String,
}

impl fmt::Display for RankedSensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:+.3}", self.label, self.value)?;
        if !self.unit.is_empty() && self.unit != "-" {
            write!(f, " [{}]", self.unit)?;
        }
        Ok(())
    }
}

/// The `n` constants with the largest absolute sensitivity, largest first.
/// Ties keep declaration order.
///
/// ```
/// use gpsize::sensitivity::rank;
/// use gpsize::solution::{Sensitivity, SensitivityValue, Solution, SolveStatus};
///
/// let solution = Solution {
///     status: SolveStatus::Optimal,
///     cost: 1.0,
///     variables: vec![],
///     sensitivities: vec![
///         Sensitivity { label: "a".into(), unit: "-".into(), value: SensitivityValue::Scalar(0.2) },
///         Sensitivity { label: "b".into(), unit: "-".into(), value: SensitivityValue::Vector(vec![-0.3, -0.4]) },
///     ],
///     iterations: 1,
///     cost_history: vec![1.0],
/// };
/// let ranked = rank(&solution, 1);
/// assert_eq!(ranked[0].label, "b");
/// assert!((ranked[0].value + 0.7).abs() < 1e-12);
/// ```
pub fn rank(solution: &Solution, n: usize) -> Vec<RankedSensitivity> {
    let mut ranked: Vec<RankedSensitivity> = solution
        .sensitivities
        .iter()
        .map(|s| RankedSensitivity {
            label: s.label.clone(),
            value: s.value.aggregate(),
            unit: s.unit.clone(),
        })
        .collect();
    // sort_by is stable.
    ranked.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
    ranked.truncate(n);
    ranked
}

/// Ranked sensitivities ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityReport {
    pub entries: Vec<RankedSensitivity>,
}

impl SensitivityReport {
    pub fn new(solution: &Solution, n: usize) -> Self {
        SensitivityReport {
            entries: rank(solution, n),
        }
    }

    /// Entries that raise the cost when their constant grows.
    pub fn positives(&self) -> impl Iterator<Item = &RankedSensitivity> {
        self.entries.iter().filter(|e| e.value > 0.0)
    }

    /// Entries that lower the cost when their constant grows.
    pub fn negatives(&self) -> impl Iterator<Item = &RankedSensitivity> {
        self.entries.iter().filter(|e| e.value < 0.0)
    }
}

impl fmt::Display for SensitivityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
