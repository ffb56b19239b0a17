//! A recursively defined tuple with compile-time indexed access.
//!
//! `tuple!(1, "two", 3.0)` builds `Tuple<i32, Tuple<&str, Tuple<f64, Nil>>>`.
//! Elements are reached with `t.get::<I1>()`, where the index is a type, so
//! an out-of-range index fails to compile.

use std::marker::PhantomData;

/// The empty tuple terminating every [`Tuple`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nil;

/// A value followed by the rest of the tuple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tuple<H, T> {
    pub head: H,
    pub tail: T,
}

impl<H, T> Tuple<H, T> {
    pub const fn new(head: H, tail: T) -> Self {
        Self { head, tail }
    }

    #[inline]
    pub fn get<I>(&self) -> &<Self as Get<I>>::Output
    where
        Self: Get<I>,
    {
        Get::<I>::get(self)
    }

    #[inline]
    pub fn get_mut<I>(&mut self) -> &mut <Self as Get<I>>::Output
    where
        Self: Get<I>,
    {
        Get::<I>::get_mut(self)
    }

    pub const fn len(&self) -> usize
    where
        Self: TupleLen,
    {
        <Self as TupleLen>::LEN
    }
}

/// Index zero.
pub struct Here;

/// The index after `I`.
pub struct There<I>(PhantomData<I>);

pub type I0 = Here;
pub type I1 = There<I0>;
pub type I2 = There<I1>;
pub type I3 = There<I2>;
pub type I4 = There<I3>;
pub type I5 = There<I4>;
pub type I6 = There<I5>;
pub type I7 = There<I6>;

/// Access to the element at type-level index `I`.
pub trait Get<I> {
    type Output;

    fn get(&self) -> &Self::Output;
    fn get_mut(&mut self) -> &mut Self::Output;
}

impl<H, T> Get<Here> for Tuple<H, T> {
    type Output = H;

    #[inline(always)]
    fn get(&self) -> &H {
        &self.head
    }

    #[inline(always)]
    fn get_mut(&mut self) -> &mut H {
        &mut self.head
    }
}

impl<H, T: Get<I>, I> Get<There<I>> for Tuple<H, T> {
    type Output = T::Output;

    #[inline(always)]
    fn get(&self) -> &T::Output {
        self.tail.get()
    }

    #[inline(always)]
    fn get_mut(&mut self) -> &mut T::Output {
        self.tail.get_mut()
    }
}

pub trait TupleLen {
    const LEN: usize;
}

impl TupleLen for Nil {
    const LEN: usize = 0;
}

impl<H, T: TupleLen> TupleLen for Tuple<H, T> {
    const LEN: usize = 1 + T::LEN;
}

/// Builds a [`Tuple`] from a list of expressions.
#[macro_export]
macro_rules! tuple {
    () => { $crate::utils::tuple::Nil };
    ($head:expr $(, $tail:expr)* $(,)?) => {
        $crate::utils::tuple::Tuple::new($head, $crate::tuple!($($tail),*))
    };
}
