//! Model nodes and the builder used to assemble them.
//!
//! A [`ModelNode`] owns its variables, per-station vectors, constraints,
//! child nodes, an optional cost and node-level substitutions. Nodes are
//! immutable once built; substitutions are layered on top when flattening.

use crate::constraints::{Constraint, SignomialPolicy};
use crate::error::{Result, SizingError};
use crate::expr::{Signomial, VarArray, VarKey, VariableBuilder};
use crate::units::UnitTable;

use super::substitution::{Substitution, Substitutions};

/// An immutable sub-model.
#[derive(Debug, Clone)]
pub struct ModelNode {
    name: String,
    variables: Vec<VarKey>,
    arrays: Vec<VarArray>,
    constraints: Vec<Constraint>,
    children: Vec<ModelNode>,
    cost: Option<Signomial>,
    substitutions: Substitutions,
}

impl ModelNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variables owned by this node, in declaration order. Vector stations
    /// are listed individually.
    pub fn variables(&self) -> &[VarKey] {
        &self.variables
    }

    pub fn arrays(&self) -> &[VarArray] {
        &self.arrays
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn children(&self) -> &[ModelNode] {
        &self.children
    }

    pub fn cost(&self) -> Option<&Signomial> {
        self.cost.as_ref()
    }

    /// Defaults this node pins on its own or its descendants' variables.
    pub fn substitutions(&self) -> &Substitutions {
        &self.substitutions
    }

    /// Direct child by name.
    pub fn child(&self, name: &str) -> Option<&ModelNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Look up a variable by dotted path, e.g. `Aircraft.Battery.Estar` or
    /// `Aircraft.Wing.Spar.eta[2]`. The leading root name may be omitted.
    pub fn find_variable(&self, path: &str) -> Option<VarKey> {
        let (node, leaf) = self.resolve(path)?;
        let (name, index) = split_index(leaf)?;
        match index {
            Some(i) => node
                .arrays
                .iter()
                .find(|a| a.name() == name)
                .and_then(|a| a.elements().get(i).cloned()),
            None => node
                .variables
                .iter()
                .find(|v| v.array().is_none() && v.name() == name)
                .cloned(),
        }
    }

    /// Look up a per-station vector by dotted path.
    pub fn find_array(&self, path: &str) -> Option<&VarArray> {
        let (node, leaf) = self.resolve(path)?;
        node.arrays.iter().find(|a| a.name() == leaf)
    }

    fn resolve<'p>(&self, path: &'p str) -> Option<(&ModelNode, &'p str)> {
        let mut segments: Vec<&str> = path.split('.').collect();
        let leaf = segments.pop()?;
        if segments.first() == Some(&self.name.as_str()) {
            segments.remove(0);
        }
        let mut node = self;
        for segment in segments {
            node = node.child(segment)?;
        }
        Some((node, leaf))
    }
}

fn split_index(leaf: &str) -> Option<(&str, Option<usize>)> {
    match leaf.split_once('[') {
        Some((name, rest)) => {
            let index = rest.strip_suffix(']')?.parse().ok()?;
            Some((name, Some(index)))
        }
        None => Some((leaf, None)),
    }
}

/// Builder for a [`ModelNode`].
///
/// ```
/// use gpsize::expr::var;
/// use gpsize::model::ModelBuilder;
///
/// # fn main() -> gpsize::Result<()> {
/// let mut m = ModelBuilder::new("Box");
/// let x = m.var(var("x", "m"))?;
/// let y = m.var(var("y", "m").value(2.0))?;
/// m.geq(&x, &y)?;
/// m.cost(&x);
/// let node = m.build()?;
/// assert_eq!(node.variables().len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ModelBuilder<'t> {
    name: String,
    table: &'t UnitTable,
    variables: Vec<VarKey>,
    arrays: Vec<VarArray>,
    constraints: Vec<Constraint>,
    children: Vec<ModelNode>,
    cost: Option<Signomial>,
    substitutions: Substitutions,
}

impl ModelBuilder<'static> {
    /// Create a builder that parses units with the standard table.
    pub fn new(name: impl Into<String>) -> Self {
        ModelBuilder::with_table(name, UnitTable::standard())
    }
}

impl<'t> ModelBuilder<'t> {
    /// Create a builder that parses units with `table`.
    pub fn with_table(name: impl Into<String>, table: &'t UnitTable) -> Self {
        ModelBuilder {
            name: name.into(),
            table,
            variables: Vec::new(),
            arrays: Vec::new(),
            constraints: Vec::new(),
            children: Vec::new(),
            cost: None,
            substitutions: Substitutions::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &'t UnitTable {
        self.table
    }

    /// Declare a scalar variable owned by this node.
    pub fn var(&mut self, builder: VariableBuilder) -> Result<VarKey> {
        let key = builder.owned_by(&self.name).build_with(self.table)?;
        self.variables.push(key.clone());
        Ok(key)
    }

    /// Declare a per-station vector owned by this node.
    pub fn array(&mut self, builder: VariableBuilder, len: usize) -> Result<VarArray> {
        let array = builder.owned_by(&self.name).build_array(len, self.table)?;
        self.variables.extend(array.iter().cloned());
        self.arrays.push(array.clone());
        Ok(array)
    }

    /// Add an already normalized constraint.
    pub fn constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Add `lhs <= rhs`; must be a geometric-program constraint.
    pub fn leq(&mut self, lhs: impl Into<Signomial>, rhs: impl Into<Signomial>) -> Result<()> {
        let c = Constraint::leq(lhs, rhs, SignomialPolicy::Reject)?;
        self.constraints.push(c);
        Ok(())
    }

    /// Add `lhs >= rhs`; must be a geometric-program constraint.
    pub fn geq(&mut self, lhs: impl Into<Signomial>, rhs: impl Into<Signomial>) -> Result<()> {
        let c = Constraint::geq(lhs, rhs, SignomialPolicy::Reject)?;
        self.constraints.push(c);
        Ok(())
    }

    /// Add `lhs == rhs`; must be a monomial equality.
    pub fn equals(&mut self, lhs: impl Into<Signomial>, rhs: impl Into<Signomial>) -> Result<()> {
        let c = Constraint::equals(lhs, rhs, SignomialPolicy::Reject)?;
        self.constraints.push(c);
        Ok(())
    }

    /// Add `lhs <= rhs`, allowing a signomial relation.
    pub fn signomial_leq(
        &mut self,
        lhs: impl Into<Signomial>,
        rhs: impl Into<Signomial>,
    ) -> Result<()> {
        let c = Constraint::leq(lhs, rhs, SignomialPolicy::Allow)?;
        self.constraints.push(c);
        Ok(())
    }

    /// Add `lhs >= rhs`, allowing a signomial relation.
    pub fn signomial_geq(
        &mut self,
        lhs: impl Into<Signomial>,
        rhs: impl Into<Signomial>,
    ) -> Result<()> {
        let c = Constraint::geq(lhs, rhs, SignomialPolicy::Allow)?;
        self.constraints.push(c);
        Ok(())
    }

    /// Add `lhs == rhs`, allowing a signomial relation.
    pub fn signomial_equals(
        &mut self,
        lhs: impl Into<Signomial>,
        rhs: impl Into<Signomial>,
    ) -> Result<()> {
        let c = Constraint::equals(lhs, rhs, SignomialPolicy::Allow)?;
        self.constraints.push(c);
        Ok(())
    }

    /// Attach a child node.
    pub fn child(&mut self, node: ModelNode) {
        self.children.push(node);
    }

    /// Set the cost to minimize. Only the root's cost is used.
    pub fn cost(&mut self, cost: impl Into<Signomial>) {
        self.cost = Some(cost.into());
    }

    /// Pin a default on a variable of this node or of a descendant.
    pub fn substitute(&mut self, var: &VarKey, sub: impl Into<Substitution>) {
        self.substitutions.insert(var, sub);
    }

    pub fn build(self) -> Result<ModelNode> {
        if self.name.is_empty() || self.name.contains('.') {
            return Err(SizingError::InvalidModel(format!(
                "model name '{}' must be non-empty and contain no '.'",
                self.name
            )));
        }
        if let Some(cost) = &self.cost {
            if !cost.is_posynomial() {
                return Err(SizingError::InvalidModel(format!(
                    "cost of {} must be a posynomial, got {cost}",
                    self.name
                )));
            }
        }
        Ok(ModelNode {
            name: self.name,
            variables: self.variables,
            arrays: self.arrays,
            constraints: self.constraints,
            children: self.children,
            cost: self.cost,
            substitutions: self.substitutions,
        })
    }
}
