//! # Alloc Containers
//!
//! Containers that take their storage from a pluggable [`Allocator`] instead of
//! the global heap, plus the allocators to feed them.
//!
//! ## Key Features
//!
//! * **Allocator Parameter:** Every container is generic over `A: Allocator`,
//!   defaulting to [`HeapAlloc`]. Swap in an [`ArenaAlloc`] for a fixed budget,
//!   a [`TrackingAlloc`] to catch leaks in tests, or a [`MetaAlloc`] to carry a
//!   header block in front of the data.
//! * **Fallible Growth:** Growing operations come in pairs. `try_push`,
//!   `try_insert`, `try_reserve` return [`Result`]; their plain counterparts
//!   panic with the failing operation's name.
//! * **Small-Buffer Text:** [`Text`] keeps short byte strings inline and
//!   spills to the allocator once they outgrow `N - 1` bytes.
//! * **Open Addressing:** [`HashMap`] and [`HashSet`] use double hashing with
//!   tombstones over a power-of-two table, hashed with `FnvHasher` by default.
//! * **Interoperability:** [`AnyVec`], [`AnyDeque`], [`AnySet`] and [`AnyText`]
//!   let the containers compare against and extend from their std equivalents.
//!
//! ## Examples
//!
//! ### Text
//!
//! ```rust
//! use alloc_containers::Text64;
//!
//! let mut s = Text64::from_bytes("Hello");
//! s.append(" World");
//! assert!(s.is_inline());
//! assert_eq!(s, "Hello World");
//!
//! s.append(" - and enough extra bytes to leave the inline buffer behind");
//! assert!(!s.is_inline());
//! ```
//!
//! ### HashMap with a tracking allocator
//!
//! ```rust
//! use alloc_containers::{HashMap, TrackingAlloc};
//!
//! let mut tracker = TrackingAlloc::new();
//! {
//!     let mut map = HashMap::with_allocator(&mut tracker);
//!     map.insert(1, "one");
//!     map.insert(2, "two");
//!     assert_eq!(map.get(&2), Some(&"two"));
//! }
//! tracker.assert_no_leaks().unwrap();
//! ```
//!
//! ### Vector in an arena
//!
//! ```rust
//! use alloc_containers::{ArenaAlloc, Vector};
//!
//! let mut v = Vector::with_capacity_in(4, ArenaAlloc::<1024>::new());
//! v.extend_from_slice(&[3, 1, 2]);
//! assert_eq!(v.biggest(), Some(0));
//! assert_eq!(v.sum(), 6);
//! ```

// --- Module Declarations ---

pub mod allocators;
pub mod error;
pub mod lists;
pub mod maps;
pub mod sets;
pub mod strings;
pub mod trees;
pub mod utils;
pub mod vecs;

// --- Re-exports ---

pub use allocators::{Allocator, ArenaAlloc, HeapAlloc, MetaAlloc, ObjectAlloc, TrackingAlloc};
pub use error::{Error, Result};
pub use lists::{LinkedList, Queue};
pub use maps::HashMap;
pub use sets::{AnySet, HashSet};
pub use strings::{
    AnyText, DefaultText, StaticString, Text, Text32, Text64, Text128, Text256, Text512, Text1024,
    Text2048, Text4096,
};
pub use trees::{RbTree, TreeSet};
pub use utils::{Numeric, Pair, Tuple};
pub use vecs::{AnyDeque, AnyVec, Deque, Matrix, RingBuffer, Stack, Vector};
