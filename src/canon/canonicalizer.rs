//! Geometric-program canonicalization.
//!
//! Canonicalization transforms a [`GeometricProgram`] into conic standard form
//! over `y = ln x`:
//! - Pinned constants become zero-cone rows `y_j - ln v_j = 0`
//! - Monomial equalities become zero-cone rows
//! - Single-term inequalities become nonnegative rows
//! - Multi-term inequalities `sum(exp(l_k)) <= 1` get one auxiliary `u_k` per
//!   term with `(l_k, 1, u_k)` in the exponential cone and `1 - sum(u_k) >= 0`

use super::lin_expr::LinExpr;
use crate::error::Result;
use crate::solver::GeometricProgram;

/// A cone constraint in standard form.
#[derive(Debug, Clone, PartialEq)]
pub enum ConeConstraint {
    /// Zero cone: a(y) = 0.
    Zero { a: LinExpr },
    /// Nonnegative cone: a(y) >= 0.
    NonNeg { a: LinExpr },
    /// Exponential cone: {(x, y, z) | y > 0, y*exp(x/y) <= z}.
    /// Variable order is (x, y, z).
    ExpCone {
        /// The x expression.
        x: LinExpr,
        /// The y expression.
        y: LinExpr,
        /// The z expression.
        z: LinExpr,
    },
}

/// Result of canonicalizing a geometric program.
#[derive(Debug)]
pub struct CanonResult {
    /// Log of the objective; minimizing it minimizes the objective.
    pub objective: LinExpr,
    /// Cone constraints, pin rows first.
    pub constraints: Vec<ConeConstraint>,
    /// Number of columns: one per program variable, then auxiliaries.
    pub num_cols: usize,
    /// `(variable index, constraint index)` of each pin row.
    pub pins: Vec<(usize, usize)>,
}

/// Canonicalize a validated geometric program.
pub fn canonicalize(gp: &GeometricProgram) -> Result<CanonResult> {
    gp.validate()?;
    let column = |key: &crate::expr::VarKey| gp.position(key);

    let mut constraints = Vec::new();
    let mut pins = Vec::new();
    let mut num_cols = gp.variables.len();

    for (j, v) in gp.variables.iter().enumerate() {
        if let Some(value) = v.fixed {
            pins.push((j, constraints.len()));
            constraints.push(ConeConstraint::Zero {
                a: LinExpr::variable(j).add(&LinExpr::scalar(-value.ln())),
            });
        }
    }

    for m in &gp.equalities {
        constraints.push(ConeConstraint::Zero {
            a: LinExpr::from_monomial(m, column)?,
        });
    }

    for p in &gp.inequalities {
        match p.terms() {
            [single] => constraints.push(ConeConstraint::NonNeg {
                a: LinExpr::from_monomial(single, column)?.neg(),
            }),
            terms => {
                let mut budget = LinExpr::scalar(1.0);
                for term in terms {
                    let u = num_cols;
                    num_cols += 1;
                    constraints.push(ConeConstraint::ExpCone {
                        x: LinExpr::from_monomial(term, column)?,
                        y: LinExpr::scalar(1.0),
                        z: LinExpr::variable(u),
                    });
                    budget = budget.add(&LinExpr::variable(u).neg());
                }
                constraints.push(ConeConstraint::NonNeg { a: budget });
            }
        }
    }

    Ok(CanonResult {
        objective: LinExpr::from_monomial(&gp.objective, column)?,
        constraints,
        num_cols,
        pins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{var, Monomial, Signomial};
    use crate::solver::GpVariable;

    #[test]
    fn test_canonical_shapes() {
        let x = var("x", "-").build().unwrap();
        let y = var("y", "-").build().unwrap();
        let c = var("c", "-").value(2.0).build().unwrap();
        let gp = GeometricProgram {
            variables: vec![
                GpVariable { key: x.clone(), fixed: None },
                GpVariable { key: y.clone(), fixed: None },
                GpVariable { key: c.clone(), fixed: Some(2.0) },
            ],
            objective: Monomial::power_of(&x, 1.0),
            equalities: vec![Monomial::from_parts(1.0, [(x.clone(), 1.0), (y.clone(), -1.0)])],
            inequalities: vec![
                Signomial::from(Monomial::from_parts(1.0, [(c.clone(), 1.0), (x.clone(), -1.0)])),
                &c / &x + &y / &x,
            ],
        };
        let canon = canonicalize(&gp).unwrap();

        // 3 variables + 2 auxiliaries for the two-term inequality.
        assert_eq!(canon.num_cols, 5);
        assert_eq!(canon.pins, vec![(2, 0)]);
        let kinds: Vec<&str> = canon
            .constraints
            .iter()
            .map(|c| match c {
                ConeConstraint::Zero { .. } => "zero",
                ConeConstraint::NonNeg { .. } => "nonneg",
                ConeConstraint::ExpCone { .. } => "exp",
            })
            .collect();
        assert_eq!(kinds, vec!["zero", "zero", "nonneg", "exp", "exp", "nonneg"]);

        // Pin row: y_c - ln 2 = 0.
        let ConeConstraint::Zero { a } = &canon.constraints[0] else {
            unreachable!()
        };
        assert!((a.constant + 2.0_f64.ln()).abs() < 1e-15);
    }
}
