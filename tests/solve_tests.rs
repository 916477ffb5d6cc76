//! Solve tests for geometric and signomial programs.
//!
//! Cases are defined as data and run by a shared loop.

use gpsize::prelude::*;

/// Tolerance for comparing floating point results
const TOL: f64 = 1e-4;
/// Looser tolerance for iterated signomial solves
const SP_TOL: f64 = 1e-3;

/// A test case definition
struct TestCase {
    name: &'static str,
    /// Builds the model and returns (root, expected cost)
    build: fn() -> (ModelNode, f64),
}

fn geometric_test_cases() -> Vec<TestCase> {
    vec![
        TestCase {
            name: "lower_bound",
            build: || {
                // min x s.t. x >= 1 + y, y = 2
                let mut m = ModelBuilder::new("M");
                let x = m.var(var("x", "-")).unwrap();
                let y = m.var(var("y", "-").value(2.0)).unwrap();
                m.geq(&x, 1.0 + &y).unwrap();
                m.cost(&x);
                (m.build().unwrap(), 3.0)
            },
        },
        TestCase {
            name: "square_root",
            build: || {
                // min x s.t. x^2 >= 3y, y = 2: x = sqrt(6)
                let mut m = ModelBuilder::new("M");
                let x = m.var(var("x", "m")).unwrap();
                let y = m.var(var("y", "m").value(2.0)).unwrap();
                m.geq(pow(&x, 2.0), 3.0 * &y).unwrap();
                m.cost(&x);
                (m.build().unwrap(), 6.0_f64.sqrt())
            },
        },
        TestCase {
            name: "max_area_in_perimeter",
            build: || {
                // max xy s.t. x + y <= 2: x = y = 1
                let mut m = ModelBuilder::new("M");
                let x = m.var(var("x", "m")).unwrap();
                let y = m.var(var("y", "m")).unwrap();
                m.leq(&x + &y, 2.0).unwrap();
                m.cost(1.0 / (&x * &y));
                (m.build().unwrap(), 1.0)
            },
        },
        TestCase {
            name: "monomial_equality",
            build: || {
                // min x + y s.t. xy = 4: x = y = 2
                let mut m = ModelBuilder::new("M");
                let x = m.var(var("x", "-")).unwrap();
                let y = m.var(var("y", "-")).unwrap();
                m.equals(&x * &y, 4.0).unwrap();
                m.cost(&x + &y);
                (m.build().unwrap(), 4.0)
            },
        },
        TestCase {
            name: "posynomial_cost_with_child",
            build: || {
                // min x + 1/x over a child-owned x: x = 1
                let mut child = ModelBuilder::new("Child");
                let x = child.var(var("x", "-").nominal(3.0)).unwrap();
                child.leq(&x, 10.0).unwrap();
                let mut root = ModelBuilder::new("Root");
                root.child(child.build().unwrap());
                root.cost(&x + 1.0 / &x);
                (root.build().unwrap(), 2.0)
            },
        },
        TestCase {
            name: "trivial_monomial_system",
            build: || {
                // min xy s.t. xy >= 1, x >= 1, y >= 1: x = y = 1
                let (root, _, _) = trivial_monomial_system();
                (root, 1.0)
            },
        },
        TestCase {
            name: "reducible_signomial",
            build: || {
                // x >= y - 0.5x merges to 1.5x >= y; y >= 2 gives x = 4/3
                (reducible_signomial_system(), 4.0 / 3.0)
            },
        },
        TestCase {
            name: "difference_bound_reduces",
            build: || {
                // x <= 5 - y rearranges to x + y <= 5; with y >= 1, x = 4
                let mut m = ModelBuilder::new("M");
                let x = m.var(var("x", "-")).unwrap();
                let y = m.var(var("y", "-")).unwrap();
                m.signomial_leq(&x, 5.0 - &y).unwrap();
                m.geq(&y, 1.0).unwrap();
                m.cost(1.0 / &x);
                (m.build().unwrap(), 0.25)
            },
        },
    ]
}

fn trivial_monomial_system() -> (ModelNode, VarKey, VarKey) {
    let mut m = ModelBuilder::new("M");
    let x = m.var(var("x", "-")).unwrap();
    let y = m.var(var("y", "-")).unwrap();
    m.geq(&x * &y, 1.0).unwrap();
    m.geq(&x, 1.0).unwrap();
    m.geq(&y, 1.0).unwrap();
    m.cost(&x * &y);
    (m.build().unwrap(), x, y)
}

/// x >= y - 0.5x with y >= 2, declared through the signomial builder.
fn reducible_signomial_system() -> ModelNode {
    let mut m = ModelBuilder::new("M");
    let x = m.var(var("x", "-")).unwrap();
    let y = m.var(var("y", "-")).unwrap();
    m.signomial_geq(&x, &y - 0.5 * &x).unwrap();
    m.geq(&y, 2.0).unwrap();
    m.cost(&x);
    m.build().unwrap()
}

fn signomial_test_cases() -> Vec<TestCase> {
    vec![
        TestCase {
            name: "sum_lower_bound",
            build: || {
                // min x s.t. x + y >= 3, y <= 1: x = 2
                let mut m = ModelBuilder::new("M");
                let x = m.var(var("x", "-")).unwrap();
                let y = m.var(var("y", "-")).unwrap();
                m.signomial_geq(&x + &y, 3.0).unwrap();
                m.leq(&y, 1.0).unwrap();
                m.cost(&x);
                (m.build().unwrap(), 2.0)
            },
        },
        TestCase {
            name: "square_in_sum",
            build: || {
                // min x s.t. x + y^2 >= 4, y <= 1.5: x = 1.75
                let mut m = ModelBuilder::new("M");
                let x = m.var(var("x", "-")).unwrap();
                let y = m.var(var("y", "-")).unwrap();
                m.signomial_geq(&x + pow(&y, 2.0), 4.0).unwrap();
                m.leq(&y, 1.5).unwrap();
                m.cost(&x);
                (m.build().unwrap(), 1.75)
            },
        },
    ]
}

fn infeasible_test_cases() -> Vec<(&'static str, ModelNode)> {
    vec![
        ("contradictory_bounds", {
            let mut m = ModelBuilder::new("M");
            let x = m.var(var("x", "-")).unwrap();
            m.geq(&x, 2.0).unwrap();
            m.leq(&x, 1.0).unwrap();
            m.cost(&x);
            m.build().unwrap()
        }),
        ("pinned_constant_too_large", {
            let mut m = ModelBuilder::new("M");
            let x = m.var(var("x", "-")).unwrap();
            let c = m.var(var("c", "-").value(5.0)).unwrap();
            m.geq(&x, &c).unwrap();
            m.leq(&x, 4.0).unwrap();
            m.cost(&x);
            m.build().unwrap()
        }),
    ]
}

// ============================================================================
// Test runner
// ============================================================================

fn no_subs() -> Substitutions {
    Substitutions::new()
}

#[test]
fn test_geometric_programs() {
    for case in geometric_test_cases() {
        let (root, expected) = (case.build)();
        let system = flatten(&root, &no_subs()).unwrap();
        assert!(!system.has_signomials(), "Problem '{}' should be a GP", case.name);

        let result = solve(&system, 50, 1e-6);
        assert!(result.is_ok(), "Problem '{}' should solve: {:?}", case.name, result.err());

        let solution = result.unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.iterations, 1, "Problem '{}' is a single pass", case.name);

        let rel_err = (solution.cost - expected).abs() / (1.0 + expected.abs());
        assert!(
            rel_err < TOL,
            "Problem '{}': expected {}, got {} (rel_err={})",
            case.name, expected, solution.cost, rel_err
        );
    }
}

#[test]
fn test_signomial_programs() {
    for case in signomial_test_cases() {
        let (root, expected) = (case.build)();
        let system = flatten(&root, &no_subs()).unwrap();
        assert!(system.has_signomials(), "Problem '{}' should be signomial", case.name);

        let result = solve(&system, 100, 1e-7);
        assert!(result.is_ok(), "Problem '{}' should solve: {:?}", case.name, result.err());

        let solution = result.unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert!(solution.iterations >= 2, "Problem '{}' should iterate", case.name);

        let rel_err = (solution.cost - expected).abs() / (1.0 + expected.abs());
        assert!(
            rel_err < SP_TOL,
            "Problem '{}': expected {}, got {} (rel_err={})",
            case.name, expected, solution.cost, rel_err
        );

        // Each relaxation is conservative, so the cost never rises.
        for pair in solution.cost_history.windows(2) {
            assert!(
                pair[1] <= pair[0] * (1.0 + 1e-6),
                "Problem '{}': cost rose from {} to {}",
                case.name, pair[0], pair[1]
            );
        }
        assert_eq!(solution.cost_history.len(), solution.iterations);
    }
}

#[test]
fn test_infeasible() {
    for (name, root) in infeasible_test_cases() {
        let system = flatten(&root, &no_subs()).unwrap();
        match solve(&system, 10, 1e-4) {
            Err(SizingError::Infeasible { iteration, constraints }) => {
                assert_eq!(iteration, 0, "Problem '{name}'");
                assert_eq!(constraints.len(), 2, "Problem '{name}'");
            }
            other => panic!("Problem '{name}' should be infeasible, got {other:?}"),
        }
    }
}

#[test]
fn test_unbounded() {
    // min x with only an upper bound: x -> 0 is not attained.
    let mut m = ModelBuilder::new("M");
    let x = m.var(var("x", "-")).unwrap();
    m.leq(&x, 1.0).unwrap();
    m.cost(&x);
    let system = flatten(&m.build().unwrap(), &no_subs()).unwrap();
    match solve(&system, 10, 1e-4) {
        Err(SizingError::Unbounded { .. }) | Err(SizingError::NumericalFailure { .. }) => {}
        other => panic!("expected an unbounded failure, got {other:?}"),
    }
}

#[test]
fn test_zero_iterations_diverges_without_solution() {
    let (root, _) = (signomial_test_cases()[0].build)();
    let system = flatten(&root, &no_subs()).unwrap();
    match solve(&system, 0, 1e-4) {
        Err(err @ SizingError::Diverged { .. }) => {
            assert_eq!(err.status(), SolveStatus::Diverged);
            if let SizingError::Diverged { iterations, last, .. } = err {
                assert_eq!(iterations, 0);
                assert!(last.is_none());
            }
        }
        other => panic!("expected divergence, got {other:?}"),
    }
}

#[test]
fn test_trivial_monomial_system_values() {
    let (root, x, y) = trivial_monomial_system();
    let solution = SpSolver::default().solve_model(&root, &no_subs()).unwrap();
    assert_eq!(solution.iterations, 1);
    assert!((solution.cost - 1.0).abs() < TOL);
    assert!((solution.raw(&x).unwrap() - 1.0).abs() < TOL);
    assert!((solution.raw(&y).unwrap() - 1.0).abs() < TOL);
}

#[test]
fn test_reducible_signomial_with_zero_iterations_diverges() {
    let system = flatten(&reducible_signomial_system(), &no_subs()).unwrap();
    assert!(!system.has_signomials());
    assert!(matches!(
        solve(&system, 0, 1e-4),
        Err(SizingError::Diverged {
            iterations: 0,
            last: None,
            ..
        })
    ));
}

#[test]
fn test_two_sided_signomial_equality_over_restricts() {
    // x + y == 2z + 1 with y <= 1, z >= 1 has min x = 2, but fitting both
    // sides around the all-ones point leaves no feasible relaxation.
    let mut m = ModelBuilder::new("M");
    let x = m.var(var("x", "-")).unwrap();
    let y = m.var(var("y", "-")).unwrap();
    let z = m.var(var("z", "-")).unwrap();
    m.signomial_equals(&x + &y, 2.0 * &z + 1.0).unwrap();
    m.leq(&y, 1.0).unwrap();
    m.geq(&z, 1.0).unwrap();
    m.cost(&x);
    let system = flatten(&m.build().unwrap(), &no_subs()).unwrap();
    assert!(matches!(
        solve(&system, 20, 1e-6),
        Err(SizingError::Infeasible { iteration: 0, .. })
    ));
}

#[test]
fn test_iteration_cap_keeps_last_iterate() {
    let (root, _) = (signomial_test_cases()[1].build)();
    let system = flatten(&root, &no_subs()).unwrap();
    match solve(&system, 1, 1e-12) {
        Err(SizingError::Diverged { iterations, last, .. }) => {
            assert_eq!(iterations, 1);
            let last = last.expect("one iterate was solved");
            assert!(last.cost >= 1.75 - 1e-6);
        }
        other => panic!("expected divergence, got {other:?}"),
    }
}

#[test]
fn test_sensitivity_of_pinned_constant() {
    // min x s.t. x >= y^2: cost y^2, so d log cost / d log y = 2.
    let mut m = ModelBuilder::new("M");
    let x = m.var(var("x", "-")).unwrap();
    let y = m.var(var("y", "-").value(2.0)).unwrap();
    let unused = m.var(var("k", "-").value(7.0)).unwrap();
    m.geq(&x, pow(&y, 2.0)).unwrap();
    m.leq(&unused, 10.0 * &x).unwrap();
    m.cost(&x);
    let system = flatten(&m.build().unwrap(), &no_subs()).unwrap();

    let solution = solve(&system, 10, 1e-6).unwrap();
    assert!((solution.cost - 4.0).abs() < TOL);
    let s = solution.sensitivity("y").unwrap().value.aggregate();
    assert!((s - 2.0).abs() < 1e-3, "expected 2, got {s}");
    let k = solution.sensitivity("k").unwrap().value.aggregate();
    assert!(k.abs() < 1e-4, "slack constraint should not price k, got {k}");

    let ranked = rank(&solution, 1);
    assert_eq!(ranked[0].label, "y");
}

#[test]
fn test_substitution_precedence_and_units() {
    // min x s.t. x >= L, L declared 1 m, pinned by the root to 2 m.
    let mut child = ModelBuilder::new("Part");
    let l = child.var(var("L", "m").value(1.0)).unwrap();
    let x = child.var(var("x", "m")).unwrap();
    child.geq(&x, &l).unwrap();
    let mut root = ModelBuilder::new("Root");
    root.child(child.build().unwrap());
    root.substitute(&l, 2.0);
    root.cost(&x);
    let root = root.build().unwrap();

    let node_level = SpSolver::default().solve_model(&root, &no_subs()).unwrap();
    assert!((node_level.cost - 2.0).abs() < TOL);

    let caller = Substitutions::new().with(&l, Quantity::parse("300 cm", UnitTable::standard()).unwrap());
    let caller_level = SpSolver::default().solve_model(&root, &caller).unwrap();
    assert!((caller_level.cost - 3.0).abs() < TOL);
    assert!((caller_level.value_in(&x, "mm").unwrap() - 3000.0).abs() < 0.1);
    assert!(caller_level.get("Part.x").is_some());

    let wrong = Substitutions::new().with(&l, Quantity::parse("3 kg", UnitTable::standard()).unwrap());
    assert!(matches!(
        SpSolver::default().solve_model(&root, &wrong),
        Err(SizingError::UnitMismatch { .. })
    ));
}

#[test]
fn test_settings_control_iteration() {
    let (root, _) = (signomial_test_cases()[1].build)();
    let settings = SolveSettings {
        max_iters: 2,
        tol: 1e-12,
        ..SolveSettings::default()
    };
    let result = SpSolver::new(settings).solve_model(&root, &no_subs());
    assert!(matches!(result, Err(SizingError::Diverged { iterations: 2, .. })));
}
