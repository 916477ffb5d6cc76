//! Solved designs as read by reports and displays.

use std::fmt;

use crate::error::{Result, SizingError};
use crate::expr::{VarArray, VarKey};
use crate::units::{Unit, UnitTable};

/// Solution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Converged to a locally optimal design.
    Optimal,
    /// No feasible design for some relaxation.
    Infeasible,
    /// Iteration limit or non-monotone cost.
    Diverged,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Diverged => "diverged",
        })
    }
}

/// Sensitivity of one constant: scalar, or one entry per station.
#[derive(Debug, Clone, PartialEq)]
pub enum SensitivityValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl SensitivityValue {
    /// Single signed value; vector entries are summed.
    pub fn aggregate(&self) -> f64 {
        match self {
            SensitivityValue::Scalar(v) => *v,
            SensitivityValue::Vector(values) => values.iter().sum(),
        }
    }
}

/// d log(cost) / d log(constant) for one fixed constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensitivity {
    /// Path relative to the root model, e.g. `Battery.Estar`.
    pub label: String,
    /// Unit symbol of the constant.
    pub unit: String,
    pub value: SensitivityValue,
}

/// Value of one variable at the solution, in the variable's own unit.
#[derive(Debug, Clone)]
pub struct SolvedVariable {
    pub key: VarKey,
    /// Path relative to the root model.
    pub label: String,
    pub value: f64,
    /// Whether the value was fixed rather than optimized.
    pub fixed: bool,
}

/// A solved design.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status.
    pub status: SolveStatus,
    /// Cost at the final iterate.
    pub cost: f64,
    /// Every variable of the flattened system, in declaration order.
    pub variables: Vec<SolvedVariable>,
    /// One entry per fixed constant (vector constants grouped), in
    /// declaration order.
    pub sensitivities: Vec<Sensitivity>,
    /// Number of convex solves performed.
    pub iterations: usize,
    /// Cost after each convex solve.
    pub cost_history: Vec<f64>,
}

impl Solution {
    /// Raw value of a variable, in its declared unit.
    pub fn raw(&self, var: &VarKey) -> Option<f64> {
        self.variables
            .iter()
            .find(|v| &v.key == var)
            .map(|v| v.value)
    }

    /// Value of a variable expressed in `unit`.
    pub fn value(&self, var: &VarKey, unit: &Unit) -> Result<f64> {
        let raw = self.raw(var).ok_or_else(|| {
            SizingError::InvalidModel(format!("variable {var:?} is not part of this solution"))
        })?;
        let k = var
            .unit()
            .conversion_to(unit)
            .ok_or_else(|| SizingError::UnitMismatch {
                variable: format!("{var:?}"),
                expected: var.unit().to_string(),
                got: unit.to_string(),
            })?;
        Ok(raw * k)
    }

    /// Value of a variable expressed in a unit given as text.
    ///
    /// ```
    /// # use gpsize::solution::{Solution, SolveStatus, SolvedVariable};
    /// # use gpsize::expr::var;
    /// let m = var("m", "kg").build().unwrap();
    /// # let solution = Solution {
    /// #     status: SolveStatus::Optimal,
    /// #     cost: 1.0,
    /// #     variables: vec![SolvedVariable { key: m.clone(), label: "m".into(), value: 2.0, fixed: false }],
    /// #     sensitivities: vec![],
    /// #     iterations: 1,
    /// #     cost_history: vec![1.0],
    /// # };
    /// assert_eq!(solution.value_in(&m, "g").unwrap(), 2000.0);
    /// ```
    pub fn value_in(&self, var: &VarKey, unit: &str) -> Result<f64> {
        let unit = UnitTable::standard().parse(unit)?;
        self.value(var, &unit)
    }

    /// Values of every station of a vector variable.
    pub fn values_of(&self, array: &VarArray) -> Option<Vec<f64>> {
        array.iter().map(|k| self.raw(k)).collect()
    }

    /// Look up a variable by its root-relative label.
    pub fn get(&self, label: &str) -> Option<&SolvedVariable> {
        self.variables.iter().find(|v| v.label == label)
    }

    /// Look up a sensitivity by its root-relative label.
    pub fn sensitivity(&self, label: &str) -> Option<&Sensitivity> {
        self.sensitivities.iter().find(|s| s.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::var;

    fn solution(m: &VarKey) -> Solution {
        Solution {
            status: SolveStatus::Optimal,
            cost: 1.0,
            variables: vec![SolvedVariable {
                key: m.clone(),
                label: "Battery.m".into(),
                value: 2.0,
                fixed: false,
            }],
            sensitivities: vec![Sensitivity {
                label: "Battery.eta".into(),
                unit: "-".into(),
                value: SensitivityValue::Vector(vec![0.5, -0.2, 0.1]),
            }],
            iterations: 1,
            cost_history: vec![1.0],
        }
    }

    #[test]
    fn test_value_conversion() {
        let m = var("m", "kg").build().unwrap();
        let sol = solution(&m);
        assert_eq!(sol.value_in(&m, "kg").unwrap(), 2.0);
        assert!((sol.value_in(&m, "lb").unwrap() - 4.409_245).abs() < 1e-5);
        assert!(matches!(
            sol.value_in(&m, "m"),
            Err(SizingError::UnitMismatch { .. })
        ));
        assert_eq!(sol.get("Battery.m").unwrap().value, 2.0);
    }

    #[test]
    fn test_unknown_variable() {
        let m = var("m", "kg").build().unwrap();
        let other = var("m", "kg").build().unwrap();
        assert!(solution(&m).value_in(&other, "kg").is_err());
    }

    #[test]
    fn test_vector_sensitivity_sums() {
        let m = var("m", "kg").build().unwrap();
        let sol = solution(&m);
        let s = sol.sensitivity("Battery.eta").unwrap();
        assert!((s.value.aggregate() - 0.4).abs() < 1e-12);
    }
}
