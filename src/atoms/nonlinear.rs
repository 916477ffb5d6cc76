//! Sum atoms and operator overloading.
//!
//! Sums of positive terms are posynomials, which are convex (log-sum-exp)
//! in log space. Any subtraction or negation yields a signomial, which is
//! only handled through local approximation.

use std::ops::{Add, Neg, Sub};

use crate::expr::{Monomial, Signomial, VarKey};

macro_rules! sum_ops {
    ($lhs:ty => $($rhs:ty),+ $(,)?) => {$(
        impl Add<$rhs> for $lhs {
            type Output = Signomial;

            fn add(self, rhs: $rhs) -> Signomial {
                Signomial::from(self).plus(&Signomial::from(rhs))
            }
        }

        impl Sub<$rhs> for $lhs {
            type Output = Signomial;

            fn sub(self, rhs: $rhs) -> Signomial {
                Signomial::from(self).minus(&Signomial::from(rhs))
            }
        }
    )+};
}

sum_ops!(VarKey => VarKey, &VarKey, Monomial, &Monomial, Signomial, &Signomial, f64);
sum_ops!(&VarKey => VarKey, &VarKey, Monomial, &Monomial, Signomial, &Signomial, f64);
sum_ops!(Monomial => VarKey, &VarKey, Monomial, &Monomial, Signomial, &Signomial, f64);
sum_ops!(&Monomial => VarKey, &VarKey, Monomial, &Monomial, Signomial, &Signomial, f64);
sum_ops!(Signomial => VarKey, &VarKey, Monomial, &Monomial, Signomial, &Signomial, f64);
sum_ops!(&Signomial => VarKey, &VarKey, Monomial, &Monomial, Signomial, &Signomial, f64);
sum_ops!(f64 => VarKey, &VarKey, Monomial, &Monomial, Signomial, &Signomial);

macro_rules! neg_op {
    ($($t:ty),+ $(,)?) => {$(
        impl Neg for $t {
            type Output = Signomial;

            fn neg(self) -> Signomial {
                Signomial::from(self).scaled(-1.0)
            }
        }
    )+};
}

neg_op!(VarKey, &VarKey, Monomial, &Monomial, Signomial, &Signomial);

/// Sum of terms. The empty sum is zero.
///
/// Works directly on a per-station vector:
///
/// ```
/// use gpsize::atoms::sum;
/// use gpsize::expr::var;
/// use gpsize::units::UnitTable;
///
/// let m = var("m", "kg").build_array(4, UnitTable::standard()).unwrap();
/// assert_eq!(sum(&m).len(), 4);
/// ```
pub fn sum<T: Into<Signomial>>(terms: impl IntoIterator<Item = T>) -> Signomial {
    Signomial::from_terms(
        terms
            .into_iter()
            .flat_map(|t| t.into().terms().to_vec()),
    )
}
