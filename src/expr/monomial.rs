//! Monomials: a coefficient times a product of variables raised to real powers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::variable::VarKey;

/// Values for variables, keyed by identity.
pub type Point = BTreeMap<VarKey, f64>;

/// Exponents smaller than this are dropped.
const EXP_EPS: f64 = 1e-12;

/// `coeff * prod(x_i ^ a_i)`.
///
/// The coefficient may be negative only while the monomial is a term of a
/// signomial; constraint normalization never leaves negative coefficients in
/// monomial or posynomial constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct Monomial {
    coeff: f64,
    exps: BTreeMap<VarKey, f64>,
}

impl Monomial {
    /// A constant monomial.
    pub fn constant(coeff: f64) -> Self {
        Monomial {
            coeff,
            exps: BTreeMap::new(),
        }
    }

    /// A single variable raised to a power.
    pub fn power_of(var: &VarKey, exponent: f64) -> Self {
        let mut exps = BTreeMap::new();
        if exponent.abs() > EXP_EPS {
            exps.insert(var.clone(), exponent);
        }
        Monomial { coeff: 1.0, exps }
    }

    /// Build from a coefficient and exponent list, merging repeated variables.
    pub fn from_parts(coeff: f64, exps: impl IntoIterator<Item = (VarKey, f64)>) -> Self {
        let mut merged: BTreeMap<VarKey, f64> = BTreeMap::new();
        for (v, e) in exps {
            *merged.entry(v).or_insert(0.0) += e;
        }
        merged.retain(|_, e| e.abs() > EXP_EPS);
        Monomial { coeff, exps: merged }
    }

    pub fn coeff(&self) -> f64 {
        self.coeff
    }

    /// Iterate over (variable, exponent) pairs in variable id order.
    pub fn exponents(&self) -> impl Iterator<Item = (&VarKey, f64)> {
        self.exps.iter().map(|(v, e)| (v, *e))
    }

    /// Exponent of `var` (zero if absent).
    pub fn exponent(&self, var: &VarKey) -> f64 {
        self.exps.get(var).copied().unwrap_or(0.0)
    }

    /// Check whether the monomial has no variables.
    pub fn is_constant(&self) -> bool {
        self.exps.is_empty()
    }

    /// Variables appearing in this monomial.
    pub fn variables(&self) -> BTreeSet<VarKey> {
        self.exps.keys().cloned().collect()
    }

    /// Check whether two monomials have identical exponents.
    pub fn same_exponents(&self, other: &Monomial) -> bool {
        self.exps.len() == other.exps.len()
            && self
                .exps
                .iter()
                .zip(other.exps.iter())
                .all(|((va, ea), (vb, eb))| va == vb && (ea - eb).abs() <= EXP_EPS)
    }

    /// Product of two monomials.
    pub fn times(&self, other: &Monomial) -> Monomial {
        let mut exps = self.exps.clone();
        for (v, e) in &other.exps {
            *exps.entry(v.clone()).or_insert(0.0) += e;
        }
        exps.retain(|_, e| e.abs() > EXP_EPS);
        Monomial {
            coeff: self.coeff * other.coeff,
            exps,
        }
    }

    /// Quotient of two monomials.
    pub fn over(&self, other: &Monomial) -> Monomial {
        self.times(&other.powf(-1.0))
    }

    /// Monomial raised to a real power.
    pub fn powf(&self, exponent: f64) -> Monomial {
        let mut exps = self.exps.clone();
        for e in exps.values_mut() {
            *e *= exponent;
        }
        exps.retain(|_, e| e.abs() > EXP_EPS);
        Monomial {
            coeff: self.coeff.powf(exponent),
            exps,
        }
    }

    /// Scale the coefficient.
    pub fn scaled(&self, factor: f64) -> Monomial {
        Monomial {
            coeff: self.coeff * factor,
            exps: self.exps.clone(),
        }
    }

    /// Same exponents with a different coefficient.
    pub fn with_coeff(&self, coeff: f64) -> Monomial {
        Monomial {
            coeff,
            exps: self.exps.clone(),
        }
    }

    /// Evaluate at a point. Returns `None` if a variable has no value.
    pub fn eval(&self, point: &Point) -> Option<f64> {
        let mut value = self.coeff;
        for (v, e) in &self.exps {
            value *= point.get(v)?.powf(*e);
        }
        Some(value)
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if self.exps.is_empty() || (self.coeff - 1.0).abs() > 1e-15 {
            write!(f, "{}", self.coeff)?;
            wrote = true;
        }
        for (v, e) in &self.exps {
            if wrote {
                f.write_str("*")?;
            }
            if (e - 1.0).abs() < EXP_EPS {
                write!(f, "{v}")?;
            } else {
                write!(f, "{v}^{e}")?;
            }
            wrote = true;
        }
        Ok(())
    }
}
