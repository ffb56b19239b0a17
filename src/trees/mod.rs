pub mod rbtree;
pub mod tree_set;

pub use rbtree::{Cursor, RbNode, RbTree};
pub use tree_set::TreeSet;
