//! Local convexification of signomial constraints.
//!
//! A posynomial `N` is replaced near `x0` by the monomial `N^` that matches
//! its value and log-gradient there. By the arithmetic-geometric mean
//! inequality `N^(x) <= N(x)` everywhere, so `P / N^ <= 1` is a conservative
//! stand-in for `P <= N` that is exact at `x0`.
//!
//! A signomial equality `P == N` becomes two inequalities. When one side is a
//! monomial only the other side is fitted. When both sides have several
//! terms, both are fitted and the pair `P <= N^`, `N <= P^` only admits
//! points where both fits are tight. That set can be empty even though the
//! equality itself is satisfiable: `x + y == 2z + 1` with `y <= 1` and
//! `z >= 1` has optimum `x = 2`, but its relaxation around the all-ones
//! point is infeasible. Rewrite such an equality with a monomial side, or
//! start from a point near the solution, when this bites.

use crate::constraints::Constraint;
use crate::error::{Result, SizingError};
use crate::expr::{var, Monomial, Point, Signomial, VarKey};
use crate::model::{FlattenedSystem, VarState};
use crate::solver::{GeometricProgram, GpVariable};

/// A geometric program built around one linearization point.
#[derive(Debug, Clone)]
pub struct Relaxation {
    pub gp: GeometricProgram,
    /// Epigraph variable standing in for a posynomial cost.
    pub epigraph: Option<VarKey>,
}

/// Monomial matching `p` and its log-gradient at `point`.
pub fn monomial_fit(p: &Signomial, point: &Point) -> Result<Monomial> {
    if !p.is_posynomial() {
        return Err(SizingError::InvalidModel(format!(
            "cannot fit a monomial to non-posynomial {p}"
        )));
    }
    let missing = || SizingError::InvalidModel(format!("no linearization point for {p}"));

    let total = p.eval(point).ok_or_else(missing)?;
    if !(total.is_finite() && total > 0.0) {
        return Err(SizingError::InvalidModel(format!(
            "{p} evaluates to {total} at the linearization point"
        )));
    }

    let gradient = p.log_gradient(point).ok_or_else(missing)?;
    let shape = Monomial::from_parts(1.0, gradient);
    let at_point = shape.eval(point).ok_or_else(missing)?;
    Ok(shape.with_coeff(total / at_point))
}

/// Build the geometric program that approximates `system` around `point`.
///
/// `point` must hold a positive value for every free and fixed variable the
/// cost and constraints reference.
pub fn convexify(system: &FlattenedSystem, point: &Point) -> Result<Relaxation> {
    let mut referenced = system.cost().variables();
    for c in system.constraints() {
        referenced.extend(c.constraint.variables());
    }

    let mut variables = Vec::with_capacity(referenced.len() + 1);
    for info in system.variables() {
        if !referenced.contains(&info.key) {
            continue;
        }
        let fixed = match &info.state {
            VarState::Free => None,
            VarState::Fixed(v) => Some(*v),
            VarState::Swept(_) => {
                return Err(SizingError::invalid_substitution(
                    &info.path,
                    "sweep marker was not resolved to a single value before solving",
                ))
            }
        };
        variables.push(GpVariable {
            key: info.key.clone(),
            fixed,
        });
    }

    let mut equalities = Vec::new();
    let mut inequalities = Vec::new();
    for flat in system.constraints() {
        match &flat.constraint {
            Constraint::MonomialEquality(m) => equalities.push(m.clone()),
            Constraint::PosynomialInequality(p) => inequalities.push(p.clone()),
            Constraint::SignomialInequality { pos, neg } => {
                inequalities.push(pos.over(&monomial_fit(neg, point)?));
            }
            Constraint::SignomialEquality { pos, neg } => {
                match (pos.as_monomial(), neg.as_monomial()) {
                    (Some(p), _) => {
                        inequalities.push(neg.over(p));
                        inequalities.push(Signomial::from(p.over(&monomial_fit(neg, point)?)));
                    }
                    (None, Some(n)) => {
                        inequalities.push(pos.over(n));
                        inequalities.push(Signomial::from(n.over(&monomial_fit(pos, point)?)));
                    }
                    (None, None) => {
                        inequalities.push(pos.over(&monomial_fit(neg, point)?));
                        inequalities.push(neg.over(&monomial_fit(pos, point)?));
                    }
                }
            }
        }
    }

    let (objective, epigraph) = match system.cost().as_monomial() {
        Some(m) => (m.clone(), None),
        None => {
            let t = var("cost", "-").describe("epigraph of the cost").build()?;
            inequalities.push(system.cost().over(&Monomial::power_of(&t, 1.0)));
            variables.push(GpVariable {
                key: t.clone(),
                fixed: None,
            });
            (Monomial::power_of(&t, 1.0), Some(t))
        }
    };

    Ok(Relaxation {
        gp: GeometricProgram {
            variables,
            objective,
            equalities,
            inequalities,
        },
        epigraph,
    })
}
