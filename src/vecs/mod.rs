pub mod deque;
pub mod matrix;
pub mod ring;
pub mod stack;
pub mod vec;

pub use deque::{AnyDeque, Deque};
pub use matrix::{Column, Matrix};
pub use ring::RingBuffer;
pub use stack::Stack;
pub use vec::{AnyVec, Vector};
