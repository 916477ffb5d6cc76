//! Substitutions: fixed values and sweep markers layered over a model tree.

use crate::error::{Result, SizingError};
use crate::expr::{VarArray, VarKey};
use crate::units::Quantity;

/// A value assigned to a variable from outside its declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Substitution {
    /// Fixed value in the variable's own unit.
    Value(f64),
    /// Fixed value with an explicit unit, converted when the system is flattened.
    Quantity(Quantity),
    /// Sweep marker: resolved one value at a time by the sweep executor.
    Sweep(Vec<f64>),
}

impl From<f64> for Substitution {
    fn from(v: f64) -> Self {
        Substitution::Value(v)
    }
}

impl From<Quantity> for Substitution {
    fn from(q: Quantity) -> Self {
        Substitution::Quantity(q)
    }
}

impl From<Vec<f64>> for Substitution {
    fn from(values: Vec<f64>) -> Self {
        Substitution::Sweep(values)
    }
}

/// Ordered substitution map. Inserting the same variable again replaces the
/// earlier entry in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitutions {
    entries: Vec<(VarKey, Substitution)>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the substitution for `var`.
    pub fn insert(&mut self, var: &VarKey, sub: impl Into<Substitution>) {
        let sub = sub.into();
        match self.entries.iter_mut().find(|(k, _)| k == var) {
            Some((_, slot)) => *slot = sub,
            None => self.entries.push((var.clone(), sub)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, var: &VarKey, sub: impl Into<Substitution>) -> Self {
        self.insert(var, sub);
        self
    }

    /// Fix every station of a vector variable.
    pub fn insert_array(&mut self, array: &VarArray, values: &[f64]) -> Result<()> {
        if values.len() != array.len() {
            return Err(SizingError::invalid_substitution(
                array.name(),
                format!(
                    "vector has {} stations but {} values were given",
                    array.len(),
                    values.len()
                ),
            ));
        }
        for (key, value) in array.iter().zip(values) {
            self.insert(key, *value);
        }
        Ok(())
    }

    pub fn get(&self, var: &VarKey) -> Option<&Substitution> {
        self.entries.iter().find(|(k, _)| k == var).map(|(_, s)| s)
    }

    pub fn remove(&mut self, var: &VarKey) -> Option<Substitution> {
        let pos = self.entries.iter().position(|(k, _)| k == var)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VarKey, &Substitution)> {
        self.entries.iter().map(|(k, s)| (k, s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> Extend<(&'a VarKey, Substitution)> for Substitutions {
    fn extend<T: IntoIterator<Item = (&'a VarKey, Substitution)>>(&mut self, iter: T) {
        for (k, s) in iter {
            self.insert(k, s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::var;
    use crate::units::UnitTable;

    #[test]
    fn test_insert_replaces_in_place() {
        let a = var("a", "-").build().unwrap();
        let b = var("b", "-").build().unwrap();
        let mut subs = Substitutions::new().with(&a, 1.0).with(&b, 2.0);
        subs.insert(&a, vec![3.0, 4.0]);
        let order: Vec<_> = subs.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(order, vec![a.clone(), b]);
        assert_eq!(subs.get(&a), Some(&Substitution::Sweep(vec![3.0, 4.0])));
    }

    #[test]
    fn test_insert_array_checks_length() {
        let t = var("t", "m").build_array(3, UnitTable::standard()).unwrap();
        let mut subs = Substitutions::new();
        assert!(subs.insert_array(&t, &[1.0, 2.0]).is_err());
        subs.insert_array(&t, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(subs.len(), 3);
        assert_eq!(subs.get(&t[2]), Some(&Substitution::Value(3.0)));
    }
}
