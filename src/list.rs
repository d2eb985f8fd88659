//! Unrolled linked list.
//!
//! This module provides [`UnrolledList`], a mutable sequence container built
//! as a singly-linked chain of fixed-capacity chunk nodes.
//!
//! # Overview
//!
//! Every node owns a contiguous block of up to `chunk_capacity` elements and
//! exclusively owns its successor. The chunk capacity is chosen once at
//! construction and shared by all nodes:
//!
//! - Appending fills the terminal node and grows a fresh node once it is full.
//! - Inserting into a full node splits it in two before splicing the element.
//! - Removing an element rebalances the affected node against its immediate
//!   successor: the two merge when their combined contents fit in one chunk,
//!   otherwise an undersized node borrows one element from the successor.
//!
//! The result is that every node except the last holds at least
//! `chunk_capacity / 2` elements, keeping traversal close to sequential
//! memory access while the chain grows and shrinks freely.
//!
//! # Examples
//!
//! ```rust
//! use unrolled_list::UnrolledList;
//!
//! let mut list = UnrolledList::new(3).unwrap();
//! for value in 0..10 {
//!     list.push_back(value);
//! }
//!
//! // Ten appends at capacity 3 chunk into blocks of [3, 3, 3, 1].
//! let layout: Vec<usize> = list.chunks().map(<[i32]>::len).collect();
//! assert_eq!(layout, vec![3, 3, 3, 1]);
//!
//! assert_eq!(list.get(5), Some(&5));
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), (0..10).collect::<Vec<_>>());
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

// =============================================================================
// Error Types
// =============================================================================

/// Error returned by [`UnrolledList::new`] when the requested chunk capacity
/// is zero.
///
/// A zero chunk capacity would make every node permanently full, so growth
/// would degenerate into endless node creation. Construction rejects it
/// eagerly instead.
///
/// # Examples
///
/// ```rust
/// use unrolled_list::UnrolledList;
///
/// assert!(UnrolledList::<i32>::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError;

impl fmt::Display for CapacityError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("chunk capacity must be at least 1")
    }
}

impl std::error::Error for CapacityError {}

/// Error returned by [`UnrolledList::insert`] when the insertion index is
/// greater than the list's length.
///
/// The list is left unmodified when this error is returned.
///
/// # Examples
///
/// ```rust
/// use unrolled_list::UnrolledList;
///
/// let mut list: UnrolledList<i32> = UnrolledList::new(3).unwrap();
/// let error = list.insert(1, 42).unwrap_err();
/// assert_eq!(error.index, 1);
/// assert!(list.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBoundError {
    /// The index that was out of bounds.
    pub index: usize,
}

impl fmt::Display for OutOfBoundError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "index {} out of bounds", self.index)
    }
}

impl std::error::Error for OutOfBoundError {}

// =============================================================================
// Node
// =============================================================================

/// A single chunk node of the list.
///
/// `elements` never exceeds the list's chunk capacity; the buffer is reserved
/// up front and the bound is enforced by the list, not the `Vec`. Each node
/// exclusively owns its successor, so the chain has no cycles and no back
/// references.
struct Node<T> {
    /// The contiguous block of elements held by this node.
    elements: Vec<T>,
    /// The next node in the chain, or `None` for the terminal node.
    next: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
            next: None,
        }
    }

    /// Links a fresh empty node directly after this one. Whatever used to
    /// follow this node becomes the new node's successor.
    fn grow(&mut self, capacity: usize) {
        let successor = self.next.take();
        self.next = Some(Box::new(Self {
            elements: Vec::with_capacity(capacity),
            next: successor,
        }));
    }

    /// Splits this node in two: grows a new successor and moves the upper
    /// half of the elements (from index `len / 2` onward) into it.
    ///
    /// Splitting a full node leaves both halves at least `capacity / 2` full.
    fn split(&mut self, capacity: usize) {
        self.grow(capacity);
        let half = self.elements.len() / 2;
        if let Some(next) = self.next.as_deref_mut() {
            next.elements.extend(self.elements.drain(half..));
        }
    }

    /// Repairs the half-full invariant for this node after it lost an
    /// element, looking only at the immediate successor:
    ///
    /// - merge the successor into this node when the combined contents fit
    ///   in one chunk (the successor leaves the chain), or
    /// - pull the successor's first element when this node is strictly under
    ///   `capacity / 2`, or
    /// - do nothing.
    ///
    /// The repair never cascades further down the chain: only the node that
    /// just lost an element can be undersized, and whenever a pull would
    /// leave the successor undersized the merge branch applies instead.
    fn rebalance(&mut self, capacity: usize) {
        let Some(next) = self.next.as_deref_mut() else {
            return;
        };
        if self.elements.len() + next.elements.len() <= capacity {
            self.elements.append(&mut next.elements);
            let skipped = next.next.take();
            self.next = skipped;
        } else if self.elements.len() < capacity / 2 {
            self.elements.push(next.elements.remove(0));
        }
    }

    /// Clones this node's elements into a fresh unlinked node with the full
    /// chunk buffer reserved.
    fn clone_detached(&self, capacity: usize) -> Self
    where
        T: Clone,
    {
        let mut elements = Vec::with_capacity(capacity);
        elements.extend(self.elements.iter().cloned());
        Self {
            elements,
            next: None,
        }
    }
}

// =============================================================================
// UnrolledList
// =============================================================================

/// An unrolled linked list: a singly-linked chain of fixed-capacity chunks.
///
/// Elements are kept in logical order across the chain; concatenating every
/// chunk in link order yields the sequence the list represents. Mutation
/// maintains two invariants:
///
/// - no chunk ever holds more than [`chunk_capacity`](Self::chunk_capacity)
///   elements, and
/// - every chunk except the last holds at least `chunk_capacity / 2`
///   elements.
///
/// The container provides no internal synchronization; concurrent use must
/// be serialized externally.
///
/// # Time Complexity
///
/// With chunk capacity `c` and `n` elements (so roughly `n / c` nodes):
///
/// | Operation    | Complexity       |
/// |--------------|------------------|
/// | `new`        | O(1)             |
/// | `len`        | O(n / c)         |
/// | `push_back`  | O(n / c)         |
/// | `get`        | O(n / c)         |
/// | `insert`     | O(n / c + c)     |
/// | `remove`     | O(n / c + c)     |
/// | `pop_front`  | O(c)             |
/// | iteration    | O(n) total       |
///
/// # Examples
///
/// ```rust
/// use unrolled_list::UnrolledList;
///
/// let mut list = UnrolledList::new(4).unwrap();
/// list.extend([1, 2, 3]);
/// list.insert(1, 10).unwrap();
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 10, 2, 3]);
/// ```
pub struct UnrolledList<T> {
    /// Maximum element count per chunk, fixed at construction.
    chunk_capacity: usize,
    /// The first node of the chain. The first node is never unlinked; an
    /// empty list is a single empty node.
    head: Node<T>,
}

impl<T> UnrolledList<T> {
    /// Creates a new empty list whose chunks hold up to `chunk_capacity`
    /// elements each.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] when `chunk_capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use unrolled_list::UnrolledList;
    ///
    /// let list: UnrolledList<i32> = UnrolledList::new(8).unwrap();
    /// assert!(list.is_empty());
    /// assert_eq!(list.chunk_capacity(), 8);
    /// ```
    pub fn new(chunk_capacity: usize) -> Result<Self, CapacityError> {
        if chunk_capacity == 0 {
            return Err(CapacityError);
        }
        Ok(Self {
            chunk_capacity,
            head: Node::with_capacity(chunk_capacity),
        })
    }

    /// Returns the fixed per-chunk capacity of this list.
    #[inline]
    #[must_use]
    pub const fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    /// Returns the number of elements in the list.
    ///
    /// # Complexity
    ///
    /// O(number of nodes) — the length is not cached.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use unrolled_list::UnrolledList;
    ///
    /// let mut list = UnrolledList::new(2).unwrap();
    /// list.extend(0..5);
    /// assert_eq!(list.len(), 5);
    /// ```
    #[must_use]
    pub fn len(&self) -> usize {
        let mut total = 0;
        let mut current = Some(&self.head);
        while let Some(node) = current {
            total += node.elements.len();
            current = node.next.as_deref();
        }
        total
    }

    /// Returns `true` if the list contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let mut current = Some(&self.head);
        while let Some(node) = current {
            if !node.elements.is_empty() {
                return false;
            }
            current = node.next.as_deref();
        }
        true
    }

    /// Appends `value` as the new last element of the list.
    ///
    /// Only the terminal node ever receives appends directly: the walk
    /// delegates to the successor until it reaches the terminal node, pushes
    /// there if it has spare capacity, and otherwise grows a fresh terminal
    /// node first. Intermediate nodes are never touched, so the half-full
    /// invariant is preserved incrementally.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use unrolled_list::UnrolledList;
    ///
    /// let mut list = UnrolledList::new(2).unwrap();
    /// list.push_back("a");
    /// list.push_back("b");
    /// list.push_back("c");
    /// assert_eq!(list.get(2), Some(&"c"));
    /// ```
    pub fn push_back(&mut self, value: T) {
        let capacity = self.chunk_capacity;
        let mut current = Some(&mut self.head);
        while let Some(node) = current {
            if node.next.is_none() {
                if node.elements.len() < capacity {
                    node.elements.push(value);
                    return;
                }
                node.grow(capacity);
            }
            current = node.next.as_deref_mut();
        }
    }

    /// Returns a reference to the element at `index`, or `None` if
    /// `index >= len()`.
    ///
    /// The walk subtracts each node's local length from `index` until it
    /// falls within the current node's range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use unrolled_list::UnrolledList;
    ///
    /// let mut list = UnrolledList::new(3).unwrap();
    /// list.extend(0..10);
    /// assert_eq!(list.get(5), Some(&5));
    /// assert_eq!(list.get(10), None);
    /// ```
    #[must_use]
    pub fn get(&self, mut index: usize) -> Option<&T> {
        let mut current = Some(&self.head);
        while let Some(node) = current {
            if index < node.elements.len() {
                return node.elements.get(index);
            }
            index -= node.elements.len();
            current = node.next.as_deref();
        }
        None
    }

    /// Returns a mutable reference to the element at `index`, or `None` if
    /// `index >= len()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use unrolled_list::UnrolledList;
    ///
    /// let mut list = UnrolledList::new(3).unwrap();
    /// list.extend(0..5);
    /// if let Some(element) = list.get_mut(2) {
    ///     *element = 42;
    /// }
    /// assert_eq!(list.get(2), Some(&42));
    /// ```
    #[must_use]
    pub fn get_mut(&mut self, mut index: usize) -> Option<&mut T> {
        let mut current = Some(&mut self.head);
        while let Some(node) = current {
            if index < node.elements.len() {
                return node.elements.get_mut(index);
            }
            index -= node.elements.len();
            current = node.next.as_deref_mut();
        }
        None
    }

    /// Returns a reference to the first element, or `None` if the list is
    /// empty.
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Inserts `value` so it becomes the element at `index`; everything at
    /// positions `>= index` shifts one position later. `index == len()` is
    /// valid and appends at the end.
    ///
    /// At each node of the descent: an index past the node's positions moves
    /// to the successor; a node with spare capacity splices the value
    /// locally; a full node splits in two and the insert retries against the
    /// now half-full node. A full node therefore always splits before
    /// absorbing a new element, and never silently overflows. The one
    /// exception is inserting exactly at the end of a full terminal node,
    /// which grows an empty terminal node and appends there, exactly like
    /// [`push_back`](Self::push_back).
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBoundError`] when `index > len()`. The list is left
    /// unmodified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use unrolled_list::UnrolledList;
    ///
    /// let mut list = UnrolledList::new(3).unwrap();
    /// list.extend(0..7);
    /// list.insert(3, 1000).unwrap();
    /// assert_eq!(
    ///     list.iter().copied().collect::<Vec<_>>(),
    ///     vec![0, 1, 2, 1000, 3, 4, 5, 6],
    /// );
    ///
    /// assert!(list.insert(100, 1).is_err());
    /// ```
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), OutOfBoundError> {
        let capacity = self.chunk_capacity;
        let mut remaining = index;
        let mut current = Some(&mut self.head);
        while let Some(node) = current {
            let length = node.elements.len();
            if remaining > length {
                if node.next.is_none() {
                    return Err(OutOfBoundError { index });
                }
                remaining -= length;
                current = node.next.as_deref_mut();
                continue;
            }
            if length < capacity {
                node.elements.insert(remaining, value);
                return Ok(());
            }
            if remaining == length {
                // Full node, insertion at its boundary: the element belongs
                // at the front of the successor, growing one first when the
                // node is terminal.
                if node.next.is_none() {
                    node.grow(capacity);
                }
                remaining = 0;
                current = node.next.as_deref_mut();
            } else {
                node.split(capacity);
                current = Some(node);
            }
        }
        Err(OutOfBoundError { index })
    }

    /// Removes and returns the element at `index`, or `None` if
    /// `index >= len()`.
    ///
    /// The node that lost the element is rebalanced against its immediate
    /// successor before the value is returned, restoring the half-full
    /// invariant. A node is never unlinked merely for becoming empty; it
    /// leaves the chain only by being merged into its predecessor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use unrolled_list::UnrolledList;
    ///
    /// let mut list = UnrolledList::new(3).unwrap();
    /// list.extend(0..10);
    /// assert_eq!(list.remove(5), Some(5));
    /// assert_eq!(list.len(), 9);
    /// assert_eq!(list.remove(100), None);
    /// ```
    pub fn remove(&mut self, mut index: usize) -> Option<T> {
        let capacity = self.chunk_capacity;
        let mut current = Some(&mut self.head);
        while let Some(node) = current {
            if index < node.elements.len() {
                let value = node.elements.remove(index);
                node.rebalance(capacity);
                return Some(value);
            }
            index -= node.elements.len();
            current = node.next.as_deref_mut();
        }
        None
    }

    /// Removes and returns the first element, or `None` if the list is
    /// empty. Equivalent to `remove(0)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use unrolled_list::UnrolledList;
    ///
    /// let mut list = UnrolledList::new(3).unwrap();
    /// list.extend(0..3);
    /// assert_eq!(list.pop_front(), Some(0));
    /// assert_eq!(list.pop_front(), Some(1));
    /// assert_eq!(list.pop_front(), Some(2));
    /// assert_eq!(list.pop_front(), None);
    /// ```
    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        self.remove(0)
    }

    /// Returns an iterator over references to the elements in logical order.
    ///
    /// The iterator is a plain pull-based cursor over the chain: lazy,
    /// forward-only, and single-pass. Call `iter()` again for a fresh
    /// traversal of the current list state.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use unrolled_list::UnrolledList;
    ///
    /// let mut list = UnrolledList::new(3).unwrap();
    /// list.extend(0..10);
    /// assert_eq!(list.iter().sum::<i32>(), 45);
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            node: Some(&self.head),
            offset: 0,
            remaining: self.len(),
        }
    }

    /// Returns an iterator over the list's chunks as slices, in link order.
    ///
    /// This exposes the physical layout of the list: each slice is one
    /// node's elements. A trailing chunk may be empty (a node is never
    /// unlinked merely for becoming empty), every chunk is at most
    /// [`chunk_capacity`](Self::chunk_capacity) long, and every chunk except
    /// the last is at least half full.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use unrolled_list::UnrolledList;
    ///
    /// let mut list = UnrolledList::new(3).unwrap();
    /// list.extend(0..10);
    /// let layout: Vec<usize> = list.chunks().map(<[i32]>::len).collect();
    /// assert_eq!(layout, vec![3, 3, 3, 1]);
    /// ```
    #[must_use]
    pub fn chunks(&self) -> Chunks<'_, T> {
        Chunks {
            node: Some(&self.head),
        }
    }
}

// =============================================================================
// Iterator Implementations
// =============================================================================

/// An iterator over references to elements of an [`UnrolledList`].
///
/// Holds the current node and an offset into its chunk, advancing on each
/// pull. The remaining count is snapshotted when the iterator is created.
pub struct Iter<'a, T> {
    node: Option<&'a Node<T>>,
    offset: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.node {
            if let Some(element) = node.elements.get(self.offset) {
                self.offset += 1;
                self.remaining -= 1;
                return Some(element);
            }
            self.node = node.next.as_deref();
            self.offset = 0;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// An owning iterator over elements of an [`UnrolledList`].
///
/// Consumes the chain node by node; the rest of the chain is released
/// iteratively if the iterator is dropped early.
pub struct IntoIter<T> {
    current: std::vec::IntoIter<T>,
    next: Option<Box<Node<T>>>,
    remaining: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.current.next() {
                self.remaining -= 1;
                return Some(value);
            }
            let node = self.next.take()?;
            let Node { elements, next } = *node;
            self.current = elements.into_iter();
            self.next = next;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
    }
}

/// An iterator over the chunks of an [`UnrolledList`], yielding each node's
/// elements as a slice in link order.
pub struct Chunks<'a, T> {
    node: Option<&'a Node<T>>,
}

impl<'a, T> Iterator for Chunks<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        self.node = node.next.as_deref();
        Some(node.elements.as_slice())
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Drop for UnrolledList<T> {
    /// Releases the chain iteratively so dropping a long list cannot
    /// overflow the stack.
    fn drop(&mut self) {
        let mut next = self.head.next.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
    }
}

impl<T: Clone> Clone for UnrolledList<T> {
    /// Clones the list preserving its chunk layout, walking the chain
    /// iteratively.
    fn clone(&self) -> Self {
        let mut list = Self {
            chunk_capacity: self.chunk_capacity,
            head: self.head.clone_detached(self.chunk_capacity),
        };
        let mut source = self.head.next.as_deref();
        let mut target = &mut list.head;
        while let Some(node) = source {
            let cloned = Box::new(node.clone_detached(self.chunk_capacity));
            target = &mut **target.next.insert(cloned);
            source = node.next.as_deref();
        }
        list
    }
}

impl<T> Extend<T> for UnrolledList<T> {
    /// Appends every element of `iter` to the back of the list, in order.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T> IntoIterator for UnrolledList<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> Self::IntoIter {
        let remaining = self.len();
        let head = mem::replace(
            &mut self.head,
            Node {
                elements: Vec::new(),
                next: None,
            },
        );
        IntoIter {
            current: head.elements.into_iter(),
            next: head.next,
            remaining,
        }
    }
}

impl<'a, T> IntoIterator for &'a UnrolledList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for UnrolledList<T> {
    /// Two lists are equal when their logical element sequences are equal;
    /// chunk capacity and chunk layout do not participate.
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for UnrolledList<T> {}

/// Computes a hash value for this list.
///
/// The length is hashed first, then each element in order, so equal lists
/// hash equally regardless of how their elements are chunked.
impl<T: Hash> Hash for UnrolledList<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for UnrolledList<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for UnrolledList<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        let mut first = true;
        for element in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for UnrolledList<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        struct SequenceOf<'a, T>(&'a UnrolledList<T>);

        impl<T: serde::Serialize> serde::Serialize for SequenceOf<'_, T> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_seq(self.0.iter())
            }
        }

        let mut state = serializer.serialize_struct("UnrolledList", 2)?;
        state.serialize_field("chunk_capacity", &self.chunk_capacity)?;
        state.serialize_field("elements", &SequenceOf(self))?;
        state.end()
    }
}

#[cfg(feature = "serde")]
const FIELDS: &[&str] = &["chunk_capacity", "elements"];

#[cfg(feature = "serde")]
struct UnrolledListVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<T> UnrolledListVisitor<T> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
fn rebuild<T, E>(chunk_capacity: usize, elements: Vec<T>) -> Result<UnrolledList<T>, E>
where
    E: serde::de::Error,
{
    let mut list = UnrolledList::new(chunk_capacity).map_err(serde::de::Error::custom)?;
    list.extend(elements);
    Ok(list)
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for UnrolledListVisitor<T>
where
    T: serde::Deserialize<'de>,
{
    type Value = UnrolledList<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("struct UnrolledList")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let chunk_capacity = seq
            .next_element()?
            .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
        let elements: Vec<T> = seq
            .next_element()?
            .ok_or_else(|| serde::de::Error::invalid_length(1, &self))?;
        rebuild(chunk_capacity, elements)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut chunk_capacity: Option<usize> = None;
        let mut elements: Option<Vec<T>> = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "chunk_capacity" => {
                    if chunk_capacity.is_some() {
                        return Err(serde::de::Error::duplicate_field("chunk_capacity"));
                    }
                    chunk_capacity = Some(map.next_value()?);
                }
                "elements" => {
                    if elements.is_some() {
                        return Err(serde::de::Error::duplicate_field("elements"));
                    }
                    elements = Some(map.next_value()?);
                }
                _ => {
                    map.next_value::<serde::de::IgnoredAny>()?;
                }
            }
        }
        let chunk_capacity =
            chunk_capacity.ok_or_else(|| serde::de::Error::missing_field("chunk_capacity"))?;
        let elements = elements.ok_or_else(|| serde::de::Error::missing_field("elements"))?;
        rebuild(chunk_capacity, elements)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for UnrolledList<T>
where
    T: serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_struct("UnrolledList", FIELDS, UnrolledListVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn populated(capacity: usize, count: i32) -> UnrolledList<i32> {
        let mut list = UnrolledList::new(capacity).unwrap();
        list.extend(0..count);
        list
    }

    fn layout(list: &UnrolledList<i32>) -> Vec<usize> {
        list.chunks().map(<[i32]>::len).collect()
    }

    // =========================================================================
    // Node Mechanics
    // =========================================================================

    #[rstest]
    fn test_grow_preserves_successor() {
        let mut node = Node::with_capacity(2);
        node.elements.push(0);
        node.grow(2);
        node.next.as_deref_mut().unwrap().elements.push(2);

        // Growing the first node again splices the fresh node between the
        // two existing ones.
        node.grow(2);
        let middle = node.next.as_deref().unwrap();
        assert!(middle.elements.is_empty());
        assert_eq!(middle.next.as_deref().unwrap().elements, vec![2]);
    }

    #[rstest]
    fn test_split_moves_upper_half() {
        let mut node = Node::with_capacity(4);
        node.elements.extend(0..4);
        node.split(4);
        assert_eq!(node.elements, vec![0, 1]);
        assert_eq!(node.next.as_deref().unwrap().elements, vec![2, 3]);
    }

    #[rstest]
    fn test_split_odd_length_keeps_lower_floor_half() {
        let mut node = Node::with_capacity(5);
        node.elements.extend(0..5);
        node.split(5);
        assert_eq!(node.elements, vec![0, 1]);
        assert_eq!(node.next.as_deref().unwrap().elements, vec![2, 3, 4]);
    }

    #[rstest]
    fn test_rebalance_merges_when_combined_fits() {
        let mut node = Node::with_capacity(4);
        node.elements.extend(0..2);
        node.grow(4);
        node.next.as_deref_mut().unwrap().elements.extend(2..4);

        node.rebalance(4);
        assert_eq!(node.elements, vec![0, 1, 2, 3]);
        assert!(node.next.is_none());
    }

    #[rstest]
    fn test_rebalance_merge_skips_over_removed_node() {
        let mut node = Node::with_capacity(4);
        node.elements.push(0);
        node.grow(4);
        node.next.as_deref_mut().unwrap().elements.push(1);
        node.next.as_deref_mut().unwrap().grow(4);

        node.rebalance(4);
        assert_eq!(node.elements, vec![0, 1]);
        // The merged node's successor (the empty terminal) is still linked.
        assert!(node.next.as_deref().unwrap().elements.is_empty());
    }

    #[rstest]
    fn test_rebalance_pulls_one_element_when_undersized() {
        let mut node = Node::with_capacity(4);
        node.elements.push(0);
        node.grow(4);
        node.next.as_deref_mut().unwrap().elements.extend(1..5);

        node.rebalance(4);
        assert_eq!(node.elements, vec![0, 1]);
        assert_eq!(node.next.as_deref().unwrap().elements, vec![2, 3, 4]);
    }

    #[rstest]
    fn test_rebalance_noop_when_at_least_half_full() {
        let mut node = Node::with_capacity(4);
        node.elements.extend(0..2);
        node.grow(4);
        node.next.as_deref_mut().unwrap().elements.extend(2..6);

        node.rebalance(4);
        assert_eq!(node.elements, vec![0, 1]);
        assert_eq!(node.next.as_deref().unwrap().elements.len(), 4);
    }

    #[rstest]
    fn test_rebalance_noop_on_terminal_node() {
        let mut node: Node<i32> = Node::with_capacity(4);
        node.elements.push(0);
        node.rebalance(4);
        assert_eq!(node.elements, vec![0]);
        assert!(node.next.is_none());
    }

    // =========================================================================
    // Chain Layout
    // =========================================================================

    #[rstest]
    fn test_trailing_empty_node_stays_linked() {
        let mut list = populated(3, 4);
        assert_eq!(layout(&list), vec![3, 1]);

        // Removing the terminal node's only element leaves the node in the
        // chain; merging is the sole removal path and the terminal node has
        // nothing to merge with.
        assert_eq!(list.remove(3), Some(3));
        assert_eq!(layout(&list), vec![3, 0]);
        assert_eq!(list.len(), 3);

        // Appending still lands in the terminal node.
        list.push_back(10);
        assert_eq!(layout(&list), vec![3, 1]);
        assert_eq!(list.get(3), Some(&10));
    }

    #[rstest]
    fn test_trailing_empty_node_merges_on_next_removal() {
        let mut list = populated(3, 4);
        list.remove(3);
        assert_eq!(layout(&list), vec![3, 0]);

        list.remove(0);
        assert_eq!(layout(&list), vec![2]);
    }

    #[rstest]
    fn test_capacity_one_insert_at_front() {
        let mut list = populated(1, 3);
        list.insert(0, 100).unwrap();
        assert_eq!(
            list.iter().copied().collect::<Vec<_>>(),
            vec![100, 0, 1, 2],
        );
    }

    #[rstest]
    fn test_capacity_one_insert_at_end() {
        let mut list = populated(1, 2);
        list.insert(2, 100).unwrap();
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![0, 1, 100]);
    }

    #[rstest]
    fn test_insert_at_end_of_full_terminal_grows_instead_of_splitting() {
        let mut list = populated(4, 4);
        list.insert(4, 100).unwrap();
        assert_eq!(layout(&list), vec![4, 1]);
        assert_eq!(list.get(4), Some(&100));
    }

    #[rstest]
    fn test_clone_preserves_chunk_layout_and_capacity() {
        let mut list = populated(3, 10);
        list.pop_front();
        let cloned = list.clone();
        assert_eq!(cloned, list);
        assert_eq!(cloned.chunk_capacity(), 3);
        assert_eq!(layout(&cloned), layout(&list));
    }

    // =========================================================================
    // Deep Chains
    // =========================================================================

    /// Builds a capacity-1 list of `0..count` by front insertion, which is
    /// O(1) per element and yields one node per element.
    fn deep_chain(count: i32) -> UnrolledList<i32> {
        let mut list = UnrolledList::new(1).unwrap();
        for value in (0..count).rev() {
            list.insert(0, value).unwrap();
        }
        list
    }

    #[rstest]
    fn test_drop_of_deep_chain_does_not_recurse() {
        let list = deep_chain(200_000);
        assert_eq!(list.front(), Some(&0));
        drop(list);
    }

    #[rstest]
    fn test_partially_consumed_into_iter_drops_deep_chain() {
        let list = deep_chain(200_000);
        let mut iterator = list.into_iter();
        assert_eq!(iterator.next(), Some(0));
        drop(iterator);
    }

    #[rstest]
    fn test_clone_of_deep_chain_does_not_recurse() {
        let list = deep_chain(200_000);
        let cloned = list.clone();
        assert_eq!(cloned.len(), 200_000);
    }
}
