//! Matrix stuffing: converts canonicalized constraints to solver format.
//!
//! This module builds the matrices (P, q, A, b) and cone specifications
//! required by Clarabel from the canonicalized geometric program.

use nalgebra_sparse::CscMatrix;

use crate::canon::{CanonResult, ConeConstraint, LinExpr};
use crate::sparse::csc_from_triplets;

/// Cone dimensions for Clarabel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConeDims {
    /// Number of zero cone (equality) rows.
    pub zero: usize,
    /// Number of nonnegative cone rows.
    pub nonneg: usize,
    /// Number of exponential cones (each is 3D).
    pub exp: usize,
}

impl ConeDims {
    /// Total number of constraint rows.
    pub fn total(&self) -> usize {
        self.zero + self.nonneg + self.exp * 3
    }
}

/// Stuffed problem ready for Clarabel.
#[derive(Debug)]
pub struct StuffedProblem {
    /// Quadratic cost matrix P (n x n). Always zero for geometric programs.
    pub p: CscMatrix<f64>,
    /// Linear cost vector q (n).
    pub q: Vec<f64>,
    /// Constraint matrix A (m x n).
    pub a: CscMatrix<f64>,
    /// Constraint vector b (m).
    pub b: Vec<f64>,
    /// Cone dimensions.
    pub cone_dims: ConeDims,
    /// First row of each canonical constraint, in canonical order.
    pub rows: Vec<usize>,
    /// Constant offset in the (log) objective.
    pub objective_offset: f64,
}

/// Build the stuffed problem from canonicalized components.
pub fn stuff_problem(canon: &CanonResult) -> StuffedProblem {
    let n = canon.num_cols;

    let mut q = vec![0.0; n];
    for (col, c) in &canon.objective.coeffs {
        q[*col] += c;
    }
    let p = csc_from_triplets(n, n, Vec::new(), Vec::new(), Vec::new());

    let (a, b, cone_dims, rows) = stuff_constraints(&canon.constraints, n);

    StuffedProblem {
        p,
        q,
        a,
        b,
        cone_dims,
        rows,
        objective_offset: canon.objective.constant,
    }
}

/// Stuff constraints into A, b, and cone dims. Rows are grouped by cone:
/// zero rows first, then nonnegative rows, then exponential cones.
fn stuff_constraints(
    constraints: &[ConeConstraint],
    n: usize,
) -> (CscMatrix<f64>, Vec<f64>, ConeDims, Vec<usize>) {
    let mut cone_dims = ConeDims::default();
    for c in constraints {
        match c {
            ConeConstraint::Zero { .. } => cone_dims.zero += 1,
            ConeConstraint::NonNeg { .. } => cone_dims.nonneg += 1,
            ConeConstraint::ExpCone { .. } => cone_dims.exp += 1,
        }
    }
    let total_rows = cone_dims.total();

    let mut next_zero = 0;
    let mut next_nonneg = cone_dims.zero;
    let mut next_exp = cone_dims.zero + cone_dims.nonneg;

    let mut a_rows = Vec::new();
    let mut a_cols = Vec::new();
    let mut a_vals = Vec::new();
    let mut b = vec![0.0; total_rows];
    let mut rows = Vec::with_capacity(constraints.len());

    for c in constraints {
        match c {
            // Zero cone (equalities): expr = 0
            // In Clarabel form Ax + s = b with s = 0, so A = coeffs, b = -const
            ConeConstraint::Zero { a } => {
                rows.push(next_zero);
                stuff_linear_expr(a, next_zero, &mut a_rows, &mut a_cols, &mut a_vals, &mut b, false);
                next_zero += 1;
            }
            // Nonnegative cone: expr >= 0
            // We want s = expr, so A = -coeffs, b = const
            ConeConstraint::NonNeg { a } => {
                rows.push(next_nonneg);
                stuff_linear_expr(a, next_nonneg, &mut a_rows, &mut a_cols, &mut a_vals, &mut b, true);
                next_nonneg += 1;
            }
            // Exponential cone: s = [x_expr; y_expr; z_expr] in K_exp
            ConeConstraint::ExpCone { x, y, z } => {
                rows.push(next_exp);
                for (k, expr) in [x, y, z].into_iter().enumerate() {
                    stuff_linear_expr(
                        expr,
                        next_exp + k,
                        &mut a_rows,
                        &mut a_cols,
                        &mut a_vals,
                        &mut b,
                        true,
                    );
                }
                next_exp += 3;
            }
        }
    }

    let a = csc_from_triplets(total_rows, n, a_rows, a_cols, a_vals);

    (a, b, cone_dims, rows)
}

/// Stuff a single affine expression into row `row` of A and b.
///
/// For the zero cone (negate=false): A = coeffs, b = -constant.
/// For cones where the slack equals the expression (negate=true):
/// A = -coeffs, b = constant.
fn stuff_linear_expr(
    expr: &LinExpr,
    row: usize,
    a_rows: &mut Vec<usize>,
    a_cols: &mut Vec<usize>,
    a_vals: &mut Vec<f64>,
    b: &mut [f64],
    negate: bool,
) {
    let sign = if negate { -1.0 } else { 1.0 };

    for (col, val) in &expr.coeffs {
        if *val != 0.0 {
            a_rows.push(row);
            a_cols.push(*col);
            a_vals.push(*val * sign);
        }
    }

    b[row] = if negate { expr.constant } else { -expr.constant };
}
