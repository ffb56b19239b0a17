/// Two values ordered lexicographically, `first` before `second`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pair<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> Pair<A, B> {
    pub const fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn swap(self) -> Pair<B, A> {
        Pair::new(self.second, self.first)
    }

    pub fn into_tuple(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A, B> From<(A, B)> for Pair<A, B> {
    fn from((first, second): (A, B)) -> Self {
        Self::new(first, second)
    }
}
