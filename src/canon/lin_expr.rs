//! Affine expressions over log-variables.
//!
//! After the change of variables `y = ln x`, a monomial `c * prod(x_i^a_i)`
//! becomes the affine function `sum(a_i * y_i) + ln c`. Columns index the
//! conic program's decision vector.

use std::collections::BTreeMap;

use crate::error::{Result, SizingError};
use crate::expr::{Monomial, VarKey};

/// An affine expression `sum(coeffs[j] * y_j) + constant`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinExpr {
    /// Column index -> coefficient.
    pub coeffs: BTreeMap<usize, f64>,
    /// Constant term.
    pub constant: f64,
}

impl LinExpr {
    /// Create a constant expression.
    pub fn scalar(value: f64) -> Self {
        LinExpr {
            coeffs: BTreeMap::new(),
            constant: value,
        }
    }

    /// Create an expression for a single column.
    pub fn variable(col: usize) -> Self {
        let mut coeffs = BTreeMap::new();
        coeffs.insert(col, 1.0);
        LinExpr {
            coeffs,
            constant: 0.0,
        }
    }

    /// Log-transform of a monomial, using `columns` to place its variables.
    pub fn from_monomial(m: &Monomial, columns: impl Fn(&VarKey) -> Option<usize>) -> Result<Self> {
        if !(m.coeff() > 0.0) {
            return Err(SizingError::InvalidModel(format!(
                "cannot take the log of monomial {m} with non-positive coefficient"
            )));
        }
        let mut coeffs = BTreeMap::new();
        for (v, e) in m.exponents() {
            let col = columns(v).ok_or_else(|| {
                SizingError::InvalidModel(format!("variable {v:?} has no column"))
            })?;
            *coeffs.entry(col).or_insert(0.0) += e;
        }
        Ok(LinExpr {
            coeffs,
            constant: m.coeff().ln(),
        })
    }

    /// Check if this is a constant (no variables).
    pub fn is_constant(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Add two linear expressions.
    pub fn add(&self, other: &LinExpr) -> LinExpr {
        let mut coeffs = self.coeffs.clone();
        for (col, c) in &other.coeffs {
            *coeffs.entry(*col).or_insert(0.0) += c;
        }
        LinExpr {
            coeffs,
            constant: self.constant + other.constant,
        }
    }

    /// Negate a linear expression.
    pub fn neg(&self) -> LinExpr {
        self.scale(-1.0)
    }

    /// Scale by a scalar.
    pub fn scale(&self, scalar: f64) -> LinExpr {
        LinExpr {
            coeffs: self.coeffs.iter().map(|(k, v)| (*k, v * scalar)).collect(),
            constant: self.constant * scalar,
        }
    }

    /// Evaluate at a log-space point.
    pub fn eval(&self, y: &[f64]) -> f64 {
        self.constant
            + self
                .coeffs
                .iter()
                .map(|(col, c)| c * y.get(*col).copied().unwrap_or(0.0))
                .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::var;

    #[test]
    fn test_from_monomial() {
        let x = var("x", "-").build().unwrap();
        let y = var("y", "-").build().unwrap();
        let m = Monomial::from_parts(2.0, [(x.clone(), 2.0), (y.clone(), -1.0)]);
        let lin = LinExpr::from_monomial(&m, |v| Some(if v == &x { 0 } else { 1 })).unwrap();
        assert_eq!(lin.coeffs.get(&0), Some(&2.0));
        assert_eq!(lin.coeffs.get(&1), Some(&-1.0));
        assert!((lin.constant - 2.0_f64.ln()).abs() < 1e-15);

        // log(2 * e^2 / e) = ln 2 + 1
        let value = lin.eval(&[1.0, 1.0]);
        assert!((value - (2.0_f64.ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_missing_column() {
        let x = var("x", "-").build().unwrap();
        let m = Monomial::power_of(&x, 1.0);
        assert!(LinExpr::from_monomial(&m, |_| None).is_err());
    }

    #[test]
    fn test_add_and_neg() {
        let a = LinExpr::variable(0).add(&LinExpr::scalar(3.0));
        let b = a.neg().add(&LinExpr::variable(1));
        assert_eq!(b.coeffs.get(&0), Some(&-1.0));
        assert_eq!(b.constant, -3.0);
        assert!(!b.is_constant());
    }
}
