//! Numeric traits for tensor elements.

use std::fmt::Debug;
use std::ops::{Add, Mul, Neg};

/// Trait providing additive and multiplicative identities.
pub trait Identities {
    fn one() -> Self;
    fn zero() -> Self;
}

macro_rules! impl_identities {
    ($type:ty, $zero:literal, $one:literal) => {
        impl Identities for $type {
            fn one() -> Self {
                $one
            }

            fn zero() -> Self {
                $zero
            }
        }
    };
}

impl_identities!(f32, 0., 1.);
impl_identities!(f64, 0., 1.);
impl_identities!(i8, 0, 1);
impl_identities!(i32, 0, 1);
impl_identities!(i64, 0, 1);
impl_identities!(isize, 0, 1);

/// Element type of a tensor expression.
///
/// Elements are plain values which can be shared between worker threads and
/// support the arithmetic needed by the expression nodes: negation (unary
/// minus, conjugation), addition and fused multiply-add.
pub trait Element:
    Copy
    + Debug
    + PartialEq
    + Send
    + Sync
    + Identities
    + Add<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Return `self * b + c`.
    #[inline]
    fn mul_add(self, b: Self, c: Self) -> Self {
        self * b + c
    }
}

impl Element for f32 {
    #[inline]
    fn mul_add(self, b: f32, c: f32) -> f32 {
        f32::mul_add(self, b, c)
    }
}

impl Element for f64 {
    #[inline]
    fn mul_add(self, b: f64, c: f64) -> f64 {
        f64::mul_add(self, b, c)
    }
}

impl Element for i8 {}
impl Element for i32 {}
impl Element for i64 {}
impl Element for isize {}

#[cfg(test)]
mod tests {
    use super::{Element, Identities};

    fn sum_of_products<T: Element>(xs: &[(T, T)]) -> T {
        xs.iter()
            .fold(T::zero(), |acc, &(a, b)| Element::mul_add(a, b, acc))
    }

    #[test]
    fn test_mul_add() {
        assert_eq!(sum_of_products(&[(2i32, 3), (4, 5)]), 26);
        assert_eq!(sum_of_products(&[(0.5f64, 4.), (1., 1.)]), 3.);
        assert_eq!(sum_of_products::<f32>(&[]), 0.);
        assert_eq!(i64::one() + i64::one(), 2);
    }
}
