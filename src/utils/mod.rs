pub mod numeric;
pub mod pair;
pub mod tuple;

pub use numeric::Numeric;
pub use pair::Pair;
pub use tuple::{Nil, Tuple};
