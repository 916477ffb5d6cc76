//! Flattening a model tree into one constraint system.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::constraints::Constraint;
use crate::error::{Result, SizingError};
use crate::expr::{Declared, Signomial, VarKey};

use super::node::ModelNode;
use super::substitution::{Substitution, Substitutions};

/// Resolved assignment of a variable for one solve.
#[derive(Debug, Clone, PartialEq)]
pub enum VarState {
    /// Decision variable.
    Free,
    /// Constant, in the variable's own unit.
    Fixed(f64),
    /// Sweep marker still waiting for a grid value.
    Swept(Vec<f64>),
}

/// A variable of the flattened system.
#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    pub key: VarKey,
    /// Full dotted path, e.g. `Aircraft.Battery.m`.
    pub path: String,
    /// Path relative to the root, e.g. `Battery.m`.
    pub label: String,
    pub state: VarState,
}

/// A constraint together with the path of the node that declared it.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatConstraint {
    pub origin: String,
    pub constraint: Constraint,
}

impl FlatConstraint {
    /// Label used in diagnostics.
    pub fn label(&self) -> String {
        format!("{}: {}", self.origin, self.constraint)
    }
}

/// The cost plus every constraint and variable of a model tree, after
/// substitutions are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedSystem {
    cost: Signomial,
    constraints: Vec<FlatConstraint>,
    variables: Vec<VarInfo>,
}

impl FlattenedSystem {
    pub fn cost(&self) -> &Signomial {
        &self.cost
    }

    /// Constraints in depth-first declaration order.
    pub fn constraints(&self) -> &[FlatConstraint] {
        &self.constraints
    }

    /// Variables in depth-first declaration order.
    pub fn variables(&self) -> &[VarInfo] {
        &self.variables
    }

    pub fn variable(&self, key: &VarKey) -> Option<&VarInfo> {
        self.variables.iter().find(|v| &v.key == key)
    }

    /// Look up by full path or root-relative label.
    pub fn variable_by_path(&self, path: &str) -> Option<&VarInfo> {
        self.variables
            .iter()
            .find(|v| v.path == path || v.label == path)
    }

    /// Check whether any constraint needs local approximation.
    pub fn has_signomials(&self) -> bool {
        self.constraints.iter().any(|c| c.constraint.is_signomial())
    }

    /// Variables still carrying a sweep marker.
    pub fn swept(&self) -> impl Iterator<Item = &VarInfo> {
        self.variables
            .iter()
            .filter(|v| matches!(v.state, VarState::Swept(_)))
    }
}

/// Flatten `root` and apply `substitutions` on top of the node-level ones.
///
/// Precedence, lowest first: the value declared on the variable, a
/// substitution made by a node of the tree, the caller's substitution.
/// The tree itself is not modified.
pub fn flatten(root: &ModelNode, substitutions: &Substitutions) -> Result<FlattenedSystem> {
    let mut walk = Walk::default();
    walk.visit(root, None)?;

    let cost = root
        .cost()
        .cloned()
        .ok_or_else(|| SizingError::InvalidModel(format!("root model {} has no cost", root.name())))?;

    let known: BTreeSet<&VarKey> = walk.variables.iter().map(|v| &v.key).collect();
    let mut referenced = cost.variables();
    for c in &walk.constraints {
        referenced.extend(c.constraint.variables());
    }
    if let Some(orphan) = referenced.iter().find(|v| !known.contains(v)) {
        return Err(SizingError::InvalidModel(format!(
            "variable {orphan:?} is referenced but not owned by any model in the tree"
        )));
    }

    // Node-level substitutions: at most one node may pin a given variable.
    let mut pinned: BTreeMap<VarKey, (&str, &Substitution)> = BTreeMap::new();
    for (path, subs) in &walk.node_subs {
        for (key, sub) in subs.iter() {
            if !known.contains(key) {
                return Err(SizingError::invalid_substitution(
                    format!("{key:?}"),
                    format!("substituted by {path} but not present in the tree"),
                ));
            }
            if let Some((other, _)) = pinned.get(key) {
                return Err(SizingError::invalid_substitution(
                    format!("{key:?}"),
                    format!("substituted by both {other} and {path}"),
                ));
            }
            pinned.insert(key.clone(), (path.as_str(), sub));
        }
    }

    for (key, _) in substitutions.iter() {
        if !known.contains(key) {
            return Err(SizingError::invalid_substitution(
                format!("{key:?}"),
                "not a variable of this model",
            ));
        }
    }

    let mut variables = walk.variables;
    for info in &mut variables {
        let sub = substitutions
            .get(&info.key)
            .or_else(|| pinned.get(&info.key).map(|(_, s)| *s));
        info.state = match sub {
            Some(sub) => resolve(info, sub)?,
            None => match info.key.declared() {
                Declared::Free => VarState::Free,
                Declared::Fixed(v) => VarState::Fixed(*v),
                Declared::Sweep(values) => VarState::Swept(values.clone()),
            },
        };
    }

    debug!(
        root = root.name(),
        variables = variables.len(),
        constraints = walk.constraints.len(),
        "flattened model"
    );

    Ok(FlattenedSystem {
        cost,
        constraints: walk.constraints,
        variables,
    })
}

fn resolve(info: &VarInfo, sub: &Substitution) -> Result<VarState> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    match sub {
        Substitution::Value(v) if positive(*v) => Ok(VarState::Fixed(*v)),
        Substitution::Value(v) => Err(SizingError::invalid_substitution(
            &info.path,
            format!("value {v} is not strictly positive"),
        )),
        Substitution::Quantity(q) => {
            let unit = info.key.unit();
            let v = q.to(unit).ok_or_else(|| SizingError::UnitMismatch {
                variable: info.path.clone(),
                expected: unit.to_string(),
                got: q.unit.to_string(),
            })?;
            if positive(v) {
                Ok(VarState::Fixed(v))
            } else {
                Err(SizingError::invalid_substitution(
                    &info.path,
                    format!("value {q} is not strictly positive"),
                ))
            }
        }
        Substitution::Sweep(values) if !values.is_empty() && values.iter().all(|v| positive(*v)) => {
            Ok(VarState::Swept(values.clone()))
        }
        Substitution::Sweep(_) => Err(SizingError::invalid_substitution(
            &info.path,
            "sweep values must be a non-empty list of positive numbers",
        )),
    }
}

#[derive(Default)]
struct Walk {
    variables: Vec<VarInfo>,
    constraints: Vec<FlatConstraint>,
    node_subs: Vec<(String, Substitutions)>,
    owners: BTreeMap<VarKey, String>,
}

impl Walk {
    fn visit(&mut self, node: &ModelNode, parent: Option<(&str, &str)>) -> Result<()> {
        let (path, label_prefix) = match parent {
            None => (node.name().to_string(), String::new()),
            Some((path, "")) => (format!("{path}.{}", node.name()), node.name().to_string()),
            Some((path, label)) => (
                format!("{path}.{}", node.name()),
                format!("{label}.{}", node.name()),
            ),
        };

        for key in node.variables() {
            if let Some(other) = self.owners.insert(key.clone(), path.clone()) {
                return Err(SizingError::InvalidModel(format!(
                    "variable {key:?} is owned by both {other} and {path}"
                )));
            }
            let name = key.display_name();
            self.variables.push(VarInfo {
                key: key.clone(),
                path: format!("{path}.{name}"),
                label: if label_prefix.is_empty() {
                    name
                } else {
                    format!("{label_prefix}.{name}")
                },
                state: VarState::Free,
            });
        }

        self.constraints
            .extend(node.constraints().iter().map(|c| FlatConstraint {
                origin: path.clone(),
                constraint: c.clone(),
            }));

        if !node.substitutions().is_empty() {
            self.node_subs
                .push((path.clone(), node.substitutions().clone()));
        }

        for child in node.children() {
            self.visit(child, Some((path.as_str(), label_prefix.as_str())))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::var;
    use crate::model::ModelBuilder;
    use crate::units::{Quantity, UnitTable};

    struct Fixture {
        root: ModelNode,
        m: VarKey,
        estar: VarKey,
    }

    fn fixture() -> Fixture {
        let mut battery = ModelBuilder::new("Battery");
        let mb = battery.var(var("m", "kg")).unwrap();
        let e = battery.var(var("E", "Wh").value(1000.0)).unwrap();
        let estar = battery.var(var("Estar", "Wh/kg").value(200.0)).unwrap();
        battery.geq(&mb, &e / &estar).unwrap();
        let battery = battery.build().unwrap();

        let mut root = ModelBuilder::new("Aircraft");
        let m = root.var(var("m", "kg")).unwrap();
        root.geq(&m, &mb).unwrap();
        root.cost(&m);
        root.child(battery);
        Fixture {
            root: root.build().unwrap(),
            m,
            estar,
        }
    }

    #[test]
    fn test_paths_and_labels() {
        let f = fixture();
        let sys = flatten(&f.root, &Substitutions::new()).unwrap();
        let paths: Vec<_> = sys.variables().iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "Aircraft.m",
                "Aircraft.Battery.m",
                "Aircraft.Battery.E",
                "Aircraft.Battery.Estar"
            ]
        );
        assert_eq!(sys.variable(&f.m).unwrap().label, "m");
        assert_eq!(sys.variable(&f.estar).unwrap().label, "Battery.Estar");
        assert_eq!(sys.constraints()[0].origin, "Aircraft");
        assert_eq!(sys.constraints()[1].origin, "Aircraft.Battery");
        assert!(!sys.has_signomials());
    }

    #[test]
    fn test_caller_substitution_overrides_declared() {
        let f = fixture();
        let subs = Substitutions::new().with(&f.estar, 250.0);
        let sys = flatten(&f.root, &subs).unwrap();
        assert_eq!(sys.variable(&f.estar).unwrap().state, VarState::Fixed(250.0));
    }

    #[test]
    fn test_quantity_substitution_converts() {
        let f = fixture();
        let q = Quantity::parse("720 J/kg", UnitTable::standard()).unwrap();
        let sys = flatten(&f.root, &Substitutions::new().with(&f.estar, q)).unwrap();
        let VarState::Fixed(v) = sys.variable(&f.estar).unwrap().state else {
            panic!("expected fixed");
        };
        assert!((v - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_unit_mismatch() {
        let f = fixture();
        let q = Quantity::parse("3 m", UnitTable::standard()).unwrap();
        let err = flatten(&f.root, &Substitutions::new().with(&f.estar, q)).unwrap_err();
        assert!(matches!(err, SizingError::UnitMismatch { .. }));
    }

    #[test]
    fn test_unknown_variable_substitution() {
        let f = fixture();
        let stranger = var("z", "-").build().unwrap();
        let err = flatten(&f.root, &Substitutions::new().with(&stranger, 1.0)).unwrap_err();
        assert!(matches!(err, SizingError::InvalidSubstitution { .. }));
    }

    #[test]
    fn test_nonpositive_substitution() {
        let f = fixture();
        let err = flatten(&f.root, &Substitutions::new().with(&f.estar, -1.0)).unwrap_err();
        assert!(matches!(err, SizingError::InvalidSubstitution { .. }));
    }

    #[test]
    fn test_two_nodes_pinning_same_variable() {
        let mut child = ModelBuilder::new("Child");
        let x = child.var(var("x", "-")).unwrap();
        child.substitute(&x, 1.0);
        let child = child.build().unwrap();

        let mut root = ModelBuilder::new("Root");
        let y = root.var(var("y", "-")).unwrap();
        root.geq(&y, &x).unwrap();
        root.cost(&y);
        root.substitute(&x, 2.0);
        root.child(child);
        let root = root.build().unwrap();

        let err = flatten(&root, &Substitutions::new()).unwrap_err();
        assert!(matches!(err, SizingError::InvalidSubstitution { .. }));
    }

    #[test]
    fn test_orphan_variable() {
        let loose = var("loose", "-").build().unwrap();
        let mut root = ModelBuilder::new("Root");
        let y = root.var(var("y", "-")).unwrap();
        root.geq(&y, &loose).unwrap();
        root.cost(&y);
        let err = flatten(&root.build().unwrap(), &Substitutions::new()).unwrap_err();
        assert!(matches!(err, SizingError::InvalidModel(_)));
    }

    #[test]
    fn test_missing_cost() {
        let root = ModelBuilder::new("Root").build().unwrap();
        assert!(matches!(
            flatten(&root, &Substitutions::new()),
            Err(SizingError::InvalidModel(_))
        ));
    }
}
