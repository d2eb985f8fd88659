//! # unrolled-list
//!
//! An [unrolled linked list](https://en.wikipedia.org/wiki/Unrolled_linked_list):
//! a sequence container built as a singly-linked chain of nodes where each
//! node holds a small contiguous block of elements (a "chunk") instead of a
//! single element. Chunking combines the cache friendliness and low per-node
//! overhead of arrays with the flexible growth of linked structures.
//!
//! The chunk capacity is chosen once at construction and shared by every
//! node. Nodes split when an insertion would overflow them and merge back
//! (or borrow a single element from their successor) when a removal leaves
//! them under half full, so every node except the last stays at least half
//! full.
//!
//! ## Example
//!
//! ```rust
//! use unrolled_list::UnrolledList;
//!
//! let mut list = UnrolledList::new(4).unwrap();
//! for value in 0..10 {
//!     list.push_back(value);
//! }
//!
//! assert_eq!(list.len(), 10);
//! assert_eq!(list.get(5), Some(&5));
//!
//! list.insert(5, 42).unwrap();
//! assert_eq!(list.get(5), Some(&42));
//!
//! assert_eq!(list.pop_front(), Some(0));
//! assert_eq!(list.iter().count(), 10);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` implementations for [`UnrolledList`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod list;

pub use list::{CapacityError, Chunks, IntoIter, Iter, OutOfBoundError, UnrolledList};
