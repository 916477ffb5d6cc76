//! Property-based tests for model composition and flattening.

use std::collections::BTreeSet;

use proptest::prelude::*;

use gpsize::model::VarState;
use gpsize::prelude::*;
use gpsize::solution::SensitivityValue;

#[derive(Debug, Clone)]
struct Shape {
    vars: usize,
    children: Vec<Shape>,
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    let leaf = (1usize..4).prop_map(|vars| Shape {
        vars,
        children: vec![],
    });
    leaf.prop_recursive(3, 24, 3, |inner| {
        (1usize..4, prop::collection::vec(inner, 0..3))
            .prop_map(|(vars, children)| Shape { vars, children })
    })
}

fn count(shape: &Shape) -> usize {
    shape.vars + shape.children.iter().map(count).sum::<usize>()
}

/// Builds the tree depth-first, collecting keys in declaration order. Every
/// variable gets a lower bound of 1.
fn build(shape: &Shape, name: &str, keys: &mut Vec<VarKey>) -> ModelBuilder<'static> {
    let mut b = ModelBuilder::new(name);
    for i in 0..shape.vars {
        let k = b.var(var(format!("v{i}"), "-")).unwrap();
        b.geq(&k, 1.0).unwrap();
        keys.push(k);
    }
    for (i, child) in shape.children.iter().enumerate() {
        let node = build(child, &format!("C{i}"), keys).build().unwrap();
        b.child(node);
    }
    b
}

fn tree(shape: &Shape) -> (ModelNode, Vec<VarKey>) {
    let mut keys = Vec::new();
    let mut root = build(shape, "Root", &mut keys);
    root.cost(sum(keys.iter()));
    (root.build().unwrap(), keys)
}

fn declared_strategy() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(1.0f64..100.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn flatten_keeps_every_variable_and_constraint(shape in shape_strategy()) {
        let (root, keys) = tree(&shape);
        let system = flatten(&root, &Substitutions::new()).unwrap();

        prop_assert_eq!(system.variables().len(), count(&shape));
        prop_assert_eq!(system.constraints().len(), count(&shape));
        let order: Vec<&VarKey> = system.variables().iter().map(|v| &v.key).collect();
        let expected: Vec<&VarKey> = keys.iter().collect();
        prop_assert_eq!(order, expected);
        prop_assert!(!system.has_signomials());
    }

    #[test]
    fn flatten_paths_are_unique_and_rooted(shape in shape_strategy()) {
        let (root, _) = tree(&shape);
        let system = flatten(&root, &Substitutions::new()).unwrap();

        let paths: BTreeSet<&str> = system.variables().iter().map(|v| v.path.as_str()).collect();
        prop_assert_eq!(paths.len(), system.variables().len());
        for info in system.variables() {
            prop_assert!(info.path.starts_with("Root."));
            prop_assert_eq!(info.path.strip_prefix("Root."), Some(info.label.as_str()));
            prop_assert_eq!(system.variable_by_path(&info.path).map(|v| &v.key), Some(&info.key));
            prop_assert_eq!(&info.state, &VarState::Free);
        }
    }

    #[test]
    fn flatten_is_repeatable(shape in shape_strategy(), pin in 1.0f64..10.0) {
        let (root, keys) = tree(&shape);
        let plain = flatten(&root, &Substitutions::new()).unwrap();

        // Caller substitutions never leak into the tree.
        let subs = Substitutions::new().with(&keys[0], pin);
        let pinned = flatten(&root, &subs).unwrap();
        prop_assert_eq!(&pinned.variables()[0].state, &VarState::Fixed(pin));

        let again = flatten(&root, &Substitutions::new()).unwrap();
        prop_assert_eq!(plain, again);
    }

    #[test]
    fn substitution_precedence(
        declared in declared_strategy(),
        node in declared_strategy(),
        caller in declared_strategy(),
    ) {
        let mut part = ModelBuilder::new("Part");
        let builder = match declared {
            Some(v) => var("c", "-").value(v),
            None => var("c", "-"),
        };
        let c = part.var(builder).unwrap();
        let x = part.var(var("x", "-")).unwrap();
        part.geq(&x, &c).unwrap();

        let mut root = ModelBuilder::new("Root");
        root.child(part.build().unwrap());
        if let Some(v) = node {
            root.substitute(&c, v);
        }
        root.cost(&x);
        let root = root.build().unwrap();

        let mut subs = Substitutions::new();
        if let Some(v) = caller {
            subs.insert(&c, v);
        }
        let system = flatten(&root, &subs).unwrap();

        let expected = match caller.or(node).or(declared) {
            Some(v) => VarState::Fixed(v),
            None => VarState::Free,
        };
        prop_assert_eq!(&system.variable(&c).unwrap().state, &expected);
        prop_assert_eq!(&system.variable(&x).unwrap().state, &VarState::Free);
    }
}

#[test]
fn test_flatten_requires_root_cost() {
    let mut m = ModelBuilder::new("M");
    let x = m.var(var("x", "-")).unwrap();
    m.geq(&x, 1.0).unwrap();
    assert!(matches!(
        flatten(&m.build().unwrap(), &Substitutions::new()),
        Err(SizingError::InvalidModel(_))
    ));
}

#[test]
fn test_foreign_variable_rejected() {
    let outside = var("z", "-").build().unwrap();
    let mut m = ModelBuilder::new("M");
    let x = m.var(var("x", "-")).unwrap();
    m.geq(&x, &outside).unwrap();
    m.cost(&x);
    let root = m.build().unwrap();
    assert!(matches!(
        flatten(&root, &Substitutions::new()),
        Err(SizingError::InvalidModel(_))
    ));

    let subs = Substitutions::new().with(&outside, 2.0);
    let mut m = ModelBuilder::new("M");
    let x = m.var(var("x", "-")).unwrap();
    m.geq(&x, 1.0).unwrap();
    m.cost(&x);
    assert!(matches!(
        flatten(&m.build().unwrap(), &subs),
        Err(SizingError::InvalidSubstitution { .. })
    ));
}

#[test]
fn test_conflicting_node_substitutions() {
    let mut inner = ModelBuilder::new("Inner");
    let c = inner.var(var("c", "-")).unwrap();
    let x = inner.var(var("x", "-")).unwrap();
    inner.geq(&x, &c).unwrap();
    inner.substitute(&c, 2.0);

    let mut root = ModelBuilder::new("Root");
    root.child(inner.build().unwrap());
    root.substitute(&c, 3.0);
    root.cost(&x);
    assert!(matches!(
        flatten(&root.build().unwrap(), &Substitutions::new()),
        Err(SizingError::InvalidSubstitution { .. })
    ));
}

#[test]
fn test_vector_variables() {
    let mut m = ModelBuilder::new("Spar");
    let q = m.array(var("q", "N/m").values(vec![3.0, 2.0, 1.0]), 3).unwrap();
    let a = m.array(var("A", "m^2"), 3).unwrap();
    for i in 0..3 {
        m.geq(&a[i], 1e-3 * &q[i]).unwrap();
    }
    m.cost(sum(&a));
    let root = m.build().unwrap();
    let system = flatten(&root, &Substitutions::new()).unwrap();

    let labels: Vec<&str> = system.variables().iter().map(|v| v.label.as_str()).collect();
    assert_eq!(labels, vec!["q[0]", "q[1]", "q[2]", "A[0]", "A[1]", "A[2]"]);
    assert_eq!(system.variable(&q[1]).unwrap().state, VarState::Fixed(2.0));

    let solution = SpSolver::default().solve_model(&root, &Substitutions::new()).unwrap();
    let areas = solution.values_of(&a).unwrap();
    for (area, load) in areas.iter().zip([3.0, 2.0, 1.0]) {
        assert!((area - 1e-3 * load).abs() < 1e-6);
    }
    assert!(matches!(
        solution.sensitivity("q").map(|s| &s.value),
        Some(SensitivityValue::Vector(v)) if v.len() == 3
    ));
}
