//! Lazy pre-order traversal over tree snapshots.
//!
//! Query methods resolve an anchor node up front; these iterators then
//! walk its subtree on demand. Every frame owns an `Arc` handle, so a
//! walk keeps yielding a consistent view even while writers publish new
//! structure: each child slot is read atomically exactly once, when its
//! parent frame is expanded.

use std::iter::FusedIterator;
use std::sync::Arc;

use crate::node::Node;
use crate::tree::KeyTransform;

/// Pre-order walk yielding the explicit keys under an anchor node,
/// anchor included. Children expand in ascending first-character order,
/// which for string keys is lexicographic order.
pub(crate) struct MatchIter<V> {
    /// Subtrees not yet visited, paired with their full reconstructed
    /// keys; the back of the stack is visited first.
    stack: Vec<(String, Arc<Node<V>>)>,
    /// Applied to every key before it leaves the tree.
    transform: Option<KeyTransform>,
}

impl<V> MatchIter<V> {
    pub(crate) fn new(
        anchor: Option<(String, Arc<Node<V>>)>,
        transform: Option<KeyTransform>,
    ) -> Self {
        let stack = match anchor {
            Some(frame) => vec![frame],
            None => Vec::new(),
        };
        MatchIter { stack, transform }
    }
}

impl<V> Iterator for MatchIter<V> {
    type Item = (String, Arc<V>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((key, node)) = self.stack.pop() {
            // Push in reverse so the smallest first character pops first.
            for child in node.children_snapshot().into_iter().rev() {
                let mut child_key = key.clone();
                child_key.extend(child.edge().chars());
                self.stack.push((child_key, child));
            }
            if let Some(value) = node.value() {
                let value = Arc::clone(value);
                let key = match &self.transform {
                    Some(transform) => transform(key),
                    None => key,
                };
                return Some((key, value));
            }
        }
        None
    }
}

impl<V> FusedIterator for MatchIter<V> {}

/// Lazy iterator over matching keys, in pre-order.
pub struct Keys<V> {
    inner: MatchIter<V>,
}

impl<V> Keys<V> {
    pub(crate) fn new(inner: MatchIter<V>) -> Self {
        Keys { inner }
    }
}

impl<V> Iterator for Keys<V> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }
}

impl<V> FusedIterator for Keys<V> {}

/// Lazy iterator over the values of matching keys, in pre-order.
pub struct Values<V> {
    inner: MatchIter<V>,
}

impl<V> Values<V> {
    pub(crate) fn new(inner: MatchIter<V>) -> Self {
        Values { inner }
    }
}

impl<V> Iterator for Values<V> {
    type Item = Arc<V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }
}

impl<V> FusedIterator for Values<V> {}

/// Lazy iterator over matching key-value pairs, in pre-order.
pub struct Pairs<V> {
    inner: MatchIter<V>,
}

impl<V> Pairs<V> {
    pub(crate) fn new(inner: MatchIter<V>) -> Self {
        Pairs { inner }
    }
}

impl<V> Iterator for Pairs<V> {
    type Item = (String, Arc<V>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<V> FusedIterator for Pairs<V> {}
