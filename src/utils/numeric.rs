//! Element types the vector reductions (`sum`, `product`, `mean`, `median`)
//! accept.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul};

mod sealed {
    pub trait Sealed {}
}

/// A sealed trait for the built-in integer and float types.
pub trait Numeric:
    sealed::Sealed + Copy + PartialOrd + Debug + Add<Output = Self> + Mul<Output = Self> + Div<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;

    /// Converts an element count to this type, for computing means.
    /// `None` if the count is not representable.
    fn from_count(n: usize) -> Option<Self>;
}

macro_rules! impl_numeric {
    (@count int, $t:ty, $n:ident) => {
        <$t>::try_from($n).ok()
    };
    (@count float, $t:ty, $n:ident) => {
        Some($n as $t)
    };
    ($kind:ident: $zero:literal, $one:literal => $($t:ty),*) => {$(
        impl sealed::Sealed for $t {}

        impl Numeric for $t {
            const ZERO: Self = $zero;
            const ONE: Self = $one;

            #[inline(always)]
            fn from_count(n: usize) -> Option<Self> {
                impl_numeric!(@count $kind, $t, n)
            }
        }
    )*};
}

impl_numeric!(int: 0, 1 => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
impl_numeric!(float: 0.0, 1.0 => f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    fn check<N: Numeric>() {
        let two = N::ONE + N::ONE;
        assert_eq!(two * N::ONE, two);
        assert!(N::ZERO < N::ONE);
        assert_eq!(N::from_count(2), Some(two));
        assert_eq!((two + two) / two, two);
    }

    #[test]
    fn test_numeric_integers() {
        check::<u8>();
        check::<i32>();
        check::<usize>();
    }

    #[test]
    fn test_numeric_count_out_of_range() {
        assert_eq!(u8::from_count(256), None);
        assert_eq!(i8::from_count(200), None);
        assert_eq!(i8::from_count(127), Some(127));
        assert_eq!(f32::from_count(1 << 20), Some(1048576.0));
    }

    #[test]
    fn test_numeric_floats() {
        check::<f32>();
        check::<f64>();
    }
}
