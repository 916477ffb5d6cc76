//! Product atoms and operator overloading.
//!
//! Products, quotients and real powers of monomials stay monomials. In log
//! space they are affine maps of the log-variables. They include:
//! - `*` and `/` between variables, monomials and scalars
//! - `*` and `/` involving a signomial (distributes over its terms)
//! - `pow` and `prod`

use std::ops::{Div, Mul};

use crate::expr::{Monomial, Signomial, VarKey};

// ============================================================================
// Operator overloading for monomial-like operands
// ============================================================================

macro_rules! monomial_product {
    ($lhs:ty => $($rhs:ty),+ $(,)?) => {$(
        impl Mul<$rhs> for $lhs {
            type Output = Monomial;

            fn mul(self, rhs: $rhs) -> Monomial {
                Monomial::from(self).times(&Monomial::from(rhs))
            }
        }

        impl Div<$rhs> for $lhs {
            type Output = Monomial;

            fn div(self, rhs: $rhs) -> Monomial {
                Monomial::from(self).over(&Monomial::from(rhs))
            }
        }
    )+};
}

monomial_product!(VarKey => VarKey, &VarKey, Monomial, &Monomial, f64);
monomial_product!(&VarKey => VarKey, &VarKey, Monomial, &Monomial, f64);
monomial_product!(Monomial => VarKey, &VarKey, Monomial, &Monomial, f64);
monomial_product!(&Monomial => VarKey, &VarKey, Monomial, &Monomial, f64);
monomial_product!(f64 => VarKey, &VarKey, Monomial, &Monomial);

// ============================================================================
// Products involving a signomial
// ============================================================================

macro_rules! signomial_product {
    ($lhs:ty => $($rhs:ty),+ $(,)?) => {$(
        impl Mul<$rhs> for $lhs {
            type Output = Signomial;

            fn mul(self, rhs: $rhs) -> Signomial {
                Signomial::from(self).times(&Signomial::from(rhs))
            }
        }
    )+};
}

signomial_product!(Signomial => VarKey, &VarKey, Monomial, &Monomial, f64, Signomial, &Signomial);
signomial_product!(&Signomial => VarKey, &VarKey, Monomial, &Monomial, f64, Signomial, &Signomial);
signomial_product!(VarKey => Signomial, &Signomial);
signomial_product!(&VarKey => Signomial, &Signomial);
signomial_product!(Monomial => Signomial, &Signomial);
signomial_product!(&Monomial => Signomial, &Signomial);
signomial_product!(f64 => Signomial, &Signomial);

// Division of a signomial by a monomial
macro_rules! signomial_quotient {
    ($lhs:ty => $($rhs:ty),+ $(,)?) => {$(
        impl Div<$rhs> for $lhs {
            type Output = Signomial;

            fn div(self, rhs: $rhs) -> Signomial {
                Signomial::from(self).over(&Monomial::from(rhs))
            }
        }
    )+};
}

signomial_quotient!(Signomial => VarKey, &VarKey, Monomial, &Monomial, f64);
signomial_quotient!(&Signomial => VarKey, &VarKey, Monomial, &Monomial, f64);

// ============================================================================
// Product atom functions
// ============================================================================

/// Raise a monomial-like expression to a real power.
///
/// ```
/// use gpsize::atoms::pow;
/// use gpsize::expr::var;
///
/// let b = var("b", "m").build().unwrap();
/// let area = pow(&b, 2.0);
/// assert_eq!(area.exponent(&b), 2.0);
/// ```
pub fn pow(base: impl Into<Monomial>, exponent: f64) -> Monomial {
    base.into().powf(exponent)
}

/// Product of monomial-like factors. The empty product is one.
pub fn prod<T: Into<Monomial>>(factors: impl IntoIterator<Item = T>) -> Monomial {
    factors
        .into_iter()
        .fold(Monomial::constant(1.0), |acc, f| acc.times(&f.into()))
}
