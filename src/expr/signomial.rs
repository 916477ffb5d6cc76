//! Signomials: sums of monomials with coefficients of either sign.
//!
//! A signomial whose terms all have positive coefficients is a posynomial;
//! one with a single term is a monomial.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::monomial::{Monomial, Point};
use super::variable::VarKey;

/// Relative size below which a merged coefficient counts as cancelled.
const CANCEL_EPS: f64 = 1e-12;

/// A sum of monomial terms. Terms with identical exponents are merged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signomial {
    terms: Vec<Monomial>,
}

impl Signomial {
    /// The empty sum.
    pub fn zero() -> Self {
        Signomial { terms: Vec::new() }
    }

    /// Build from terms, merging like terms and dropping cancelled ones.
    ///
    /// Term order follows the first appearance of each exponent pattern.
    pub fn from_terms(terms: impl IntoIterator<Item = Monomial>) -> Self {
        let mut merged: Vec<(Monomial, f64)> = Vec::new();
        for term in terms {
            if term.coeff() == 0.0 {
                continue;
            }
            match merged.iter_mut().find(|(m, _)| m.same_exponents(&term)) {
                Some((m, scale)) => {
                    *m = m.with_coeff(m.coeff() + term.coeff());
                    *scale = scale.max(term.coeff().abs());
                }
                None => {
                    let scale = term.coeff().abs();
                    merged.push((term, scale));
                }
            }
        }
        let terms = merged
            .into_iter()
            .filter(|(m, scale)| m.coeff().abs() > CANCEL_EPS * scale)
            .map(|(m, _)| m)
            .collect();
        Signomial { terms }
    }

    /// Terms in stable order.
    pub fn terms(&self) -> &[Monomial] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Check whether this is a single term.
    pub fn is_monomial(&self) -> bool {
        self.terms.len() == 1
    }

    /// The single term, if there is exactly one.
    pub fn as_monomial(&self) -> Option<&Monomial> {
        match self.terms.as_slice() {
            [m] => Some(m),
            _ => None,
        }
    }

    /// Check whether every term has a positive coefficient.
    pub fn is_posynomial(&self) -> bool {
        !self.terms.is_empty() && self.terms.iter().all(|t| t.coeff() > 0.0)
    }

    /// Split into the positive terms and the negated negative terms,
    /// so that `self == positive - negative`.
    pub fn split_signs(&self) -> (Signomial, Signomial) {
        let (pos, neg): (Vec<&Monomial>, Vec<&Monomial>) =
            self.terms.iter().partition(|t| t.coeff() > 0.0);
        (
            Signomial {
                terms: pos.into_iter().cloned().collect(),
            },
            Signomial {
                terms: neg.into_iter().map(|t| t.scaled(-1.0)).collect(),
            },
        )
    }

    /// Variables appearing in any term.
    pub fn variables(&self) -> BTreeSet<VarKey> {
        self.terms.iter().flat_map(|t| t.variables()).collect()
    }

    /// Sum of two signomials.
    pub fn plus(&self, other: &Signomial) -> Signomial {
        Signomial::from_terms(self.terms.iter().chain(other.terms.iter()).cloned())
    }

    /// Difference of two signomials.
    pub fn minus(&self, other: &Signomial) -> Signomial {
        Signomial::from_terms(
            self.terms
                .iter()
                .cloned()
                .chain(other.terms.iter().map(|t| t.scaled(-1.0))),
        )
    }

    /// Product of two signomials.
    pub fn times(&self, other: &Signomial) -> Signomial {
        Signomial::from_terms(
            self.terms
                .iter()
                .flat_map(|a| other.terms.iter().map(move |b| a.times(b))),
        )
    }

    /// Divide every term by a monomial.
    pub fn over(&self, divisor: &Monomial) -> Signomial {
        Signomial::from_terms(self.terms.iter().map(|t| t.over(divisor)))
    }

    /// Scale every coefficient.
    pub fn scaled(&self, factor: f64) -> Signomial {
        Signomial::from_terms(self.terms.iter().map(|t| t.scaled(factor)))
    }

    /// Integer power by repeated multiplication.
    pub fn powi(&self, n: u32) -> Signomial {
        (0..n).fold(Signomial::from(Monomial::constant(1.0)), |acc, _| {
            acc.times(self)
        })
    }

    /// Evaluate at a point. Returns `None` if a variable has no value.
    pub fn eval(&self, point: &Point) -> Option<f64> {
        self.terms.iter().map(|t| t.eval(point)).sum()
    }

    /// `d log(self) / d log(x)` for every variable, where `self` is positive
    /// at `point`.
    pub fn log_gradient(&self, point: &Point) -> Option<BTreeMap<VarKey, f64>> {
        let values = self
            .terms
            .iter()
            .map(|t| t.eval(point))
            .collect::<Option<Vec<f64>>>()?;
        let total: f64 = values.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return None;
        }
        let mut gradient = BTreeMap::new();
        for (term, value) in self.terms.iter().zip(&values) {
            for (v, e) in term.exponents() {
                *gradient.entry(v.clone()).or_insert(0.0) += value / total * e;
            }
        }
        Some(gradient)
    }
}

impl From<Monomial> for Signomial {
    fn from(m: Monomial) -> Self {
        Signomial::from_terms([m])
    }
}

impl From<&Monomial> for Signomial {
    fn from(m: &Monomial) -> Self {
        Signomial::from_terms([m.clone()])
    }
}

impl From<&Signomial> for Signomial {
    fn from(s: &Signomial) -> Self {
        s.clone()
    }
}

impl From<VarKey> for Signomial {
    fn from(v: VarKey) -> Self {
        Signomial::from(Monomial::from(v))
    }
}

impl From<&VarKey> for Signomial {
    fn from(v: &VarKey) -> Self {
        Signomial::from(Monomial::from(v))
    }
}

impl From<f64> for Signomial {
    fn from(c: f64) -> Self {
        Signomial::from(Monomial::constant(c))
    }
}

impl From<VarKey> for Monomial {
    fn from(v: VarKey) -> Self {
        Monomial::power_of(&v, 1.0)
    }
}

impl From<&VarKey> for Monomial {
    fn from(v: &VarKey) -> Self {
        Monomial::power_of(v, 1.0)
    }
}

impl From<&Monomial> for Monomial {
    fn from(m: &Monomial) -> Self {
        m.clone()
    }
}

impl From<f64> for Monomial {
    fn from(c: f64) -> Self {
        Monomial::constant(c)
    }
}

impl fmt::Display for Signomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("0");
        }
        for (i, t) in self.terms.iter().enumerate() {
            match (i, t.coeff() < 0.0) {
                (0, _) => write!(f, "{t}")?,
                (_, true) => write!(f, " - {}", t.scaled(-1.0))?,
                (_, false) => write!(f, " + {t}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::var;

    #[test]
    fn test_like_terms_merge() {
        let x = var("x", "-").build().unwrap();
        let s = Signomial::from_terms([
            Monomial::from_parts(1.0, [(x.clone(), 1.0)]),
            Monomial::from_parts(2.0, [(x.clone(), 1.0)]),
            Monomial::constant(4.0),
        ]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.terms()[0].coeff(), 3.0);
        assert!(s.is_posynomial());
    }

    #[test]
    fn test_log_gradient() {
        let x = var("x", "-").build().unwrap();
        let y = var("y", "-").build().unwrap();
        // x + y^2 at x = 1, y = 1: each term carries half the weight
        let s = Signomial::from_terms([
            Monomial::power_of(&x, 1.0),
            Monomial::power_of(&y, 2.0),
        ]);
        let point: Point = [(x.clone(), 1.0), (y.clone(), 1.0)].into_iter().collect();
        let g = s.log_gradient(&point).unwrap();
        assert!((g[&x] - 0.5).abs() < 1e-12);
        assert!((g[&y] - 1.0).abs() < 1e-12);

        let missing: Point = [(x.clone(), 1.0)].into_iter().collect();
        assert!(s.log_gradient(&missing).is_none());
    }

    #[test]
    fn test_cancellation_drops_term() {
        let x = var("x", "-").build().unwrap();
        let s = Signomial::from(&x).minus(&Signomial::from(&x));
        assert!(s.is_empty());
    }

    #[test]
    fn test_split_signs() {
        let x = var("x", "-").build().unwrap();
        let y = var("y", "-").build().unwrap();
        let s = Signomial::from(&y).minus(&Signomial::from(&x).scaled(1.5));
        let (pos, neg) = s.split_signs();
        assert_eq!(pos, Signomial::from(&y));
        assert!(neg.is_posynomial());
        assert_eq!(neg.terms()[0].coeff(), 1.5);
    }

    #[test]
    fn test_powi() {
        let x = var("x", "-").build().unwrap();
        let s = Signomial::from(&x).plus(&Signomial::from(1.0)).powi(2);
        let point: Point = [(x, 2.0)].into_iter().collect();
        assert_eq!(s.len(), 3);
        assert!((s.eval(&point).unwrap() - 9.0).abs() < 1e-12);
    }
}
