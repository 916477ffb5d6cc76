//! Constraint types for sizing models.
//!
//! Every relation is normalized so that `lhs - rhs` is split into its
//! positive terms `P` and its negated negative terms `N`, and then classified:
//! - MonomialEquality: `m == 1` (both sides single terms)
//! - PosynomialInequality: `p <= 1` (`N` is a single term)
//! - SignomialEquality: `P == N` (anything else, equality)
//! - SignomialInequality: `P <= N` (anything else, inequality)
//!
//! The first two are geometric-program constraints. The last two are only
//! legal under [`SignomialPolicy::Allow`].

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Result, SizingError};
use crate::expr::{Monomial, Point, Signomial, VarKey};

/// Whether a constraint-construction call may produce a signomial relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignomialPolicy {
    /// Only monomial equalities and posynomial inequalities.
    #[default]
    Reject,
    /// Signomial relations are accepted and handled by local approximation.
    Allow,
}

/// A normalized constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// `m == 1`.
    MonomialEquality(Monomial),

    /// `p <= 1` with every term of `p` positive.
    PosynomialInequality(Signomial),

    /// `pos == neg` with both sides posynomials.
    SignomialEquality {
        /// Positively-signed terms.
        pos: Signomial,
        /// Negatively-signed terms, negated.
        neg: Signomial,
    },

    /// `pos <= neg` with both sides posynomials.
    SignomialInequality {
        /// Positively-signed terms.
        pos: Signomial,
        /// Negatively-signed terms, negated.
        neg: Signomial,
    },
}

impl Constraint {
    /// Create an inequality constraint: lhs <= rhs.
    pub fn leq(
        lhs: impl Into<Signomial>,
        rhs: impl Into<Signomial>,
        policy: SignomialPolicy,
    ) -> Result<Self> {
        let lhs = lhs.into();
        let rhs = rhs.into();
        let (pos, neg) = lhs.minus(&rhs).split_signs();
        let describe = || format!("{lhs} <= {rhs}");

        if pos.is_empty() {
            return Err(SizingError::InvalidModel(format!(
                "constraint is trivially satisfied: {}",
                describe()
            )));
        }
        if neg.is_empty() {
            return Err(SizingError::InvalidModel(format!(
                "constraint can never hold for positive variables: {}",
                describe()
            )));
        }
        if let Some(divisor) = neg.as_monomial() {
            return Ok(Constraint::PosynomialInequality(pos.over(divisor)));
        }
        match policy {
            SignomialPolicy::Allow => Ok(Constraint::SignomialInequality { pos, neg }),
            SignomialPolicy::Reject => Err(SizingError::SignomialsDisabled(describe())),
        }
    }

    /// Create an inequality constraint: lhs >= rhs.
    pub fn geq(
        lhs: impl Into<Signomial>,
        rhs: impl Into<Signomial>,
        policy: SignomialPolicy,
    ) -> Result<Self> {
        Constraint::leq(rhs, lhs, policy)
    }

    /// Create an equality constraint: lhs == rhs.
    pub fn equals(
        lhs: impl Into<Signomial>,
        rhs: impl Into<Signomial>,
        policy: SignomialPolicy,
    ) -> Result<Self> {
        let lhs = lhs.into();
        let rhs = rhs.into();
        let (pos, neg) = lhs.minus(&rhs).split_signs();
        let describe = || format!("{lhs} == {rhs}");

        if pos.is_empty() || neg.is_empty() {
            return Err(SizingError::InvalidModel(format!(
                "equality has terms of one sign only: {}",
                describe()
            )));
        }
        if let (Some(p), Some(n)) = (pos.as_monomial(), neg.as_monomial()) {
            return Ok(Constraint::MonomialEquality(p.over(n)));
        }
        match policy {
            SignomialPolicy::Allow => Ok(Constraint::SignomialEquality { pos, neg }),
            SignomialPolicy::Reject => Err(SizingError::SignomialsDisabled(describe())),
        }
    }

    /// Check if this constraint needs local approximation.
    pub fn is_signomial(&self) -> bool {
        matches!(
            self,
            Constraint::SignomialEquality { .. } | Constraint::SignomialInequality { .. }
        )
    }

    /// Short name of the constraint kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Constraint::MonomialEquality(_) => "MonomialEquality",
            Constraint::PosynomialInequality(_) => "PosynomialInequality",
            Constraint::SignomialEquality { .. } => "SignomialEquality",
            Constraint::SignomialInequality { .. } => "SignomialInequality",
        }
    }

    /// Get all variables in this constraint.
    pub fn variables(&self) -> BTreeSet<VarKey> {
        match self {
            Constraint::MonomialEquality(m) => m.variables(),
            Constraint::PosynomialInequality(p) => p.variables(),
            Constraint::SignomialEquality { pos, neg }
            | Constraint::SignomialInequality { pos, neg } => {
                let mut vars = pos.variables();
                vars.extend(neg.variables());
                vars
            }
        }
    }

    /// Relative violation at a point: zero when satisfied.
    ///
    /// Returns `None` if a variable has no value.
    pub fn violation(&self, point: &Point) -> Option<f64> {
        let (lhs, rhs, equality) = match self {
            Constraint::MonomialEquality(m) => (m.eval(point)?, 1.0, true),
            Constraint::PosynomialInequality(p) => (p.eval(point)?, 1.0, false),
            Constraint::SignomialEquality { pos, neg } => (pos.eval(point)?, neg.eval(point)?, true),
            Constraint::SignomialInequality { pos, neg } => {
                (pos.eval(point)?, neg.eval(point)?, false)
            }
        };
        let ratio = lhs / rhs;
        Some(if equality {
            (ratio - 1.0).abs()
        } else {
            (ratio - 1.0).max(0.0)
        })
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::MonomialEquality(m) => write!(f, "{m} = 1"),
            Constraint::PosynomialInequality(p) => write!(f, "{p} <= 1"),
            Constraint::SignomialEquality { pos, neg } => write!(f, "{pos} = {neg}"),
            Constraint::SignomialInequality { pos, neg } => write!(f, "{pos} <= {neg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::var;

    #[test]
    fn test_posynomial_inequality() {
        let x = var("x", "-").build().unwrap();
        let y = var("y", "-").build().unwrap();
        let c = Constraint::geq(&x * &y, 1.0, SignomialPolicy::Reject).unwrap();
        match &c {
            Constraint::PosynomialInequality(p) => {
                assert!(p.is_posynomial());
                assert_eq!(p.terms()[0].exponent(&x), -1.0);
            }
            other => panic!("Expected PosynomialInequality, got {other:?}"),
        }
        assert!(!c.is_signomial());
    }

    #[test]
    fn test_merged_terms_stay_posynomial() {
        // x >= y - 0.5x collapses to y / (1.5 x) <= 1
        let x = var("x", "-").build().unwrap();
        let y = var("y", "-").build().unwrap();
        let c = Constraint::geq(&x, &y - 0.5 * &x, SignomialPolicy::Reject).unwrap();
        let Constraint::PosynomialInequality(p) = c else {
            panic!("Expected PosynomialInequality");
        };
        assert!((p.terms()[0].coeff() - 1.0 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_signomial_requires_allowance() {
        let x = var("x", "-").build().unwrap();
        let y = var("y", "-").build().unwrap();
        let err = Constraint::leq(3.0, &x + &y, SignomialPolicy::Reject).unwrap_err();
        assert!(matches!(err, SizingError::SignomialsDisabled(_)));

        let c = Constraint::leq(3.0, &x + &y, SignomialPolicy::Allow).unwrap();
        assert_eq!(c.kind(), "SignomialInequality");
        assert!(c.is_signomial());
    }

    #[test]
    fn test_monomial_equality() {
        let b = var("b", "m").build().unwrap();
        let s = var("S", "m^2").build().unwrap();
        let ar = var("AR", "-").build().unwrap();
        let c = Constraint::equals(&ar, &b * &b / &s, SignomialPolicy::Reject).unwrap();
        assert_eq!(c.kind(), "MonomialEquality");
        assert_eq!(c.variables().len(), 3);
    }

    #[test]
    fn test_degenerate_constraints() {
        let x = var("x", "-").build().unwrap();
        let trivial = Constraint::leq(0.5 * &x, &x, SignomialPolicy::Allow).unwrap_err();
        assert!(matches!(trivial, SizingError::InvalidModel(_)));
        let impossible = Constraint::leq(2.0 * &x, &x, SignomialPolicy::Allow).unwrap_err();
        assert!(matches!(impossible, SizingError::InvalidModel(_)));
    }

    #[test]
    fn test_violation() {
        let x = var("x", "-").build().unwrap();
        let c = Constraint::geq(&x, 2.0, SignomialPolicy::Reject).unwrap();
        let ok: Point = [(x.clone(), 3.0)].into_iter().collect();
        let bad: Point = [(x.clone(), 1.0)].into_iter().collect();
        assert_eq!(c.violation(&ok), Some(0.0));
        assert!((c.violation(&bad).unwrap() - 1.0).abs() < 1e-12);
    }
}
