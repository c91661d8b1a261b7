//! The concurrent radix tree map.
//!
//! Mutations never edit a node in place. Each one searches, classifies
//! the result, builds replacement nodes bottom-up through the factory,
//! and publishes with exactly one atomic action: a single child-slot swap
//! on a surviving ancestor, or a swap of the root pointer itself. Every
//! published state is a complete, valid tree, which is what lets readers
//! run without locks in the default mode.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use smallvec::{smallvec, SmallVec};

use crate::error::{Error, Result};
use crate::iter::{Keys, MatchIter, Pairs, Values};
use crate::node::{make_node, ChildVec, Edge, Node};
use crate::search::{decode_key, search, Classification};

/// Strategy applied to every key before a query iterator yields it.
///
/// This is the hook wrapper trees use to translate between stored and
/// external key forms, a reversed-key tree being the canonical example.
/// Lookups and mutations always operate on stored keys; only outgoing
/// keys pass through the transform.
pub type KeyTransform = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Locking discipline for the tree.
enum Locking {
    /// Readers take no lock; writers serialize on the mutex.
    LockFree(Mutex<()>),
    /// Readers and writers share a reader/writer lock, so reads block
    /// while a write is in flight.
    Restricted(RwLock<()>),
}

/// Held for the duration of a mutation. Which variant is live depends on
/// the locking mode; both only matter for their drop.
#[allow(dead_code)]
enum WriteGuard<'a> {
    Exclusive(MutexGuard<'a, ()>),
    Restricted(RwLockWriteGuard<'a, ()>),
}

impl Locking {
    fn write(&self) -> WriteGuard<'_> {
        match self {
            Locking::LockFree(mutex) => WriteGuard::Exclusive(mutex.lock()),
            Locking::Restricted(lock) => WriteGuard::Restricted(lock.write()),
        }
    }

    fn read(&self) -> Option<RwLockReadGuard<'_, ()>> {
        match self {
            Locking::LockFree(_) => None,
            Locking::Restricted(lock) => Some(lock.read()),
        }
    }
}

/// A concurrent map from string keys to values, stored as a compressed
/// radix tree with copy-on-write nodes.
///
/// Reads are lock-free in the default mode: lookups, prefix scans, and
/// closest-key scans never block, and a scan that is underway keeps its
/// snapshot alive while writers publish new structure. Writers serialize
/// on an internal lock. Values are handed out as [`Arc`] handles, so they
/// stay valid even after the key is overwritten or removed.
///
/// Keys are matched character by character, and children of a node are
/// kept in ascending first-character order, so scans yield keys in
/// lexicographic order.
pub struct RadixTree<V> {
    /// Current root; swapped atomically when the root itself is rebuilt.
    root: ArcSwap<Node<V>>,
    /// Writer serialization, plus reader blocking in restricted mode.
    locking: Locking,
    /// Optional rewrite applied to outgoing keys.
    key_transform: Option<KeyTransform>,
}

impl<V> RadixTree<V> {
    fn empty_root() -> Arc<Node<V>> {
        make_node(Edge::empty(), None, SmallVec::new(), true)
    }

    /// Create an empty tree with lock-free reads.
    pub fn new() -> Self {
        RadixTree {
            root: ArcSwap::new(Self::empty_root()),
            locking: Locking::LockFree(Mutex::new(())),
            key_transform: None,
        }
    }

    /// Create an empty tree whose reads block while a write is in flight.
    ///
    /// Same semantics as [`RadixTree::new`], lower read throughput. Meant
    /// for callers that want writer/reader exclusion while validating the
    /// lock-free mode against their own assumptions.
    pub fn with_restricted_reads() -> Self {
        RadixTree {
            root: ArcSwap::new(Self::empty_root()),
            locking: Locking::Restricted(RwLock::new(())),
            key_transform: None,
        }
    }

    /// Install a transform applied to every key a query iterator yields.
    ///
    /// ```
    /// use cowtrie::RadixTree;
    ///
    /// let tree = RadixTree::new()
    ///     .with_key_transform(|key: String| -> String { key.chars().rev().collect() });
    /// tree.put("tac", 1).unwrap();
    ///
    /// let keys: Vec<String> = tree.get_keys_starting_with("").collect();
    /// assert_eq!(keys, ["cat"]);
    /// ```
    pub fn with_key_transform(
        mut self,
        transform: impl Fn(String) -> String + Send + Sync + 'static,
    ) -> Self {
        self.key_transform = Some(Arc::new(transform));
        self
    }

    /// Snapshot of the current root, for crate-internal walkers.
    pub(crate) fn root_snapshot(&self) -> Arc<Node<V>> {
        self.root.load_full()
    }

    /// Insert `key` with `value`, returning the previous value if the key
    /// was already present.
    ///
    /// Returns [`Error::EmptyKey`] for a zero-length key; the tree is
    /// untouched on the error path.
    pub fn put(&self, key: &str, value: V) -> Result<Option<Arc<V>>> {
        self.put_internal(key, value, true)
    }

    /// Insert `key` with `value` unless the key is already present, in
    /// which case the existing value is returned and kept.
    ///
    /// A key that exists only as an implicit branch counts as absent: the
    /// branch node takes the value.
    pub fn put_if_absent(&self, key: &str, value: V) -> Result<Option<Arc<V>>> {
        self.put_internal(key, value, false)
    }

    fn put_internal(&self, key: &str, value: V, overwrite: bool) -> Result<Option<Arc<V>>> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        let key = decode_key(key);
        let value = Arc::new(value);
        let _guard = self.locking.write();

        let root = self.root.load_full();
        let found = search(&root, &key);
        match found.classification {
            Classification::ExactMatch => {
                let previous = found.node.value().cloned();
                if !overwrite {
                    if let Some(existing) = &previous {
                        return Ok(Some(Arc::clone(existing)));
                    }
                }
                let replacement = make_node(
                    found.node.edge().clone(),
                    Some(value),
                    found.node.children_snapshot(),
                    false,
                );
                self.publish(found.parent.as_ref(), replacement);
                Ok(previous)
            }
            Classification::KeyEndsMidEdge => {
                // Split the found node's edge where the key ends: the key
                // takes the upper half, the remainder keeps the value and
                // children and hangs below it.
                let edge = found.node.edge();
                let upper = edge.prefix(found.chars_matched_in_edge);
                let demoted = make_node(
                    edge.suffix(found.chars_matched_in_edge),
                    found.node.value().cloned(),
                    found.node.children_snapshot(),
                    false,
                );
                let replacement = make_node(upper, Some(value), smallvec![demoted], false);
                self.publish(found.parent.as_ref(), replacement);
                Ok(None)
            }
            Classification::IncompleteMatchToEndOfEdge => {
                // Append a leaf for the unconsumed key remainder.
                let appended = make_node(
                    Edge::from_chars(&key[found.chars_matched..]),
                    Some(value),
                    SmallVec::new(),
                    false,
                );
                let mut children = found.node.children_snapshot();
                children.push(appended);
                let is_root = found.parent.is_none();
                let replacement = make_node(
                    found.node.edge().clone(),
                    found.node.value().cloned(),
                    children,
                    is_root,
                );
                self.publish(found.parent.as_ref(), replacement);
                Ok(None)
            }
            Classification::IncompleteMatchToMiddleOfEdge => {
                // Split at the divergence: a valueless branch keeps the
                // common prefix, with the found node's remainder and a new
                // leaf below it.
                let edge = found.node.edge();
                let common = edge.prefix(found.chars_matched_in_edge);
                let kept = make_node(
                    edge.suffix(found.chars_matched_in_edge),
                    found.node.value().cloned(),
                    found.node.children_snapshot(),
                    false,
                );
                let diverged = make_node(
                    Edge::from_chars(&key[found.chars_matched..]),
                    Some(value),
                    SmallVec::new(),
                    false,
                );
                let replacement = make_node(common, None, smallvec![kept, diverged], false);
                self.publish(found.parent.as_ref(), replacement);
                Ok(None)
            }
        }
    }

    /// Remove `key`, returning whether a stored value was removed.
    ///
    /// Absent keys, implicit branch nodes, and the empty key all return
    /// `false` without touching the tree.
    pub fn remove(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        let key = decode_key(key);
        let _guard = self.locking.write();

        let root = self.root.load_full();
        let found = search(&root, &key);
        if found.classification != Classification::ExactMatch || !found.node.is_explicit() {
            return false;
        }

        match found.node.child_count() {
            0 => {
                // Detach the leaf from its parent, then merge the parent
                // away if that left it valueless with a single child.
                let parent = match &found.parent {
                    Some(parent) => parent,
                    None => unreachable!("an explicit node is never the root"),
                };
                let first = found.node.edge().first_char();
                let remaining: ChildVec<V> = parent
                    .children_snapshot()
                    .into_iter()
                    .filter(|child| child.edge().first_char() != first)
                    .collect();
                let parent_is_root = found.grandparent.is_none();
                if !parent_is_root && !parent.is_explicit() && remaining.len() == 1 {
                    let survivor = &remaining[0];
                    let merged = make_node(
                        parent.edge().concat(survivor.edge()),
                        survivor.value().cloned(),
                        survivor.children_snapshot(),
                        false,
                    );
                    self.publish(found.grandparent.as_ref(), merged);
                } else {
                    let replacement = make_node(
                        parent.edge().clone(),
                        parent.value().cloned(),
                        remaining,
                        parent_is_root,
                    );
                    self.publish(found.grandparent.as_ref(), replacement);
                }
            }
            1 => {
                // Merge with the sole child: concatenated edges, the
                // child's value and children.
                let children = found.node.children_snapshot();
                let child = &children[0];
                let merged = make_node(
                    found.node.edge().concat(child.edge()),
                    child.value().cloned(),
                    child.children_snapshot(),
                    false,
                );
                self.publish(found.parent.as_ref(), merged);
            }
            _ => {
                // The node still branches; just drop the value.
                let replacement = make_node(
                    found.node.edge().clone(),
                    None,
                    found.node.children_snapshot(),
                    false,
                );
                self.publish(found.parent.as_ref(), replacement);
            }
        }
        true
    }

    /// Publish a replacement for an existing node: swap the matching
    /// child slot on the parent, or the root pointer when there is no
    /// parent. Single-slot swaps rely on every structural edit preserving
    /// the first edge character at the publish point.
    fn publish(&self, parent: Option<&Arc<Node<V>>>, replacement: Arc<Node<V>>) {
        match parent {
            Some(parent) => match parent.children() {
                Some(children) => children.update(replacement),
                None => unreachable!("a parent node always carries children"),
            },
            None => self.root.store(replacement),
        }
    }

    /// The value stored for exactly `key`, if any.
    ///
    /// The returned handle stays valid even if the key is overwritten or
    /// removed afterwards.
    pub fn get_value_for_exact_key(&self, key: &str) -> Option<Arc<V>> {
        let key = decode_key(key);
        let _read = self.locking.read();
        let found = search(&self.root_snapshot(), &key);
        match found.classification {
            Classification::ExactMatch => found.node.value().cloned(),
            _ => None,
        }
    }

    /// Keys starting with `prefix`, in lexicographic order. The prefix
    /// itself is included when it is stored. An empty prefix yields every
    /// key.
    pub fn get_keys_starting_with(&self, prefix: &str) -> Keys<V> {
        Keys::new(self.prefix_iter(prefix))
    }

    /// Values of the keys starting with `prefix`, in key order.
    pub fn get_values_for_keys_starting_with(&self, prefix: &str) -> Values<V> {
        Values::new(self.prefix_iter(prefix))
    }

    /// Key-value pairs for the keys starting with `prefix`, in key order.
    pub fn get_key_value_pairs_for_keys_starting_with(&self, prefix: &str) -> Pairs<V> {
        Pairs::new(self.prefix_iter(prefix))
    }

    /// Keys closest to `candidate`: the stored keys under the deepest
    /// node the candidate reaches.
    ///
    /// A candidate whose first character matches nothing yields an empty
    /// result; an empty candidate anchors at the root and yields every
    /// key.
    pub fn get_closest_keys(&self, candidate: &str) -> Keys<V> {
        Keys::new(self.closest_iter(candidate))
    }

    /// Values of the keys closest to `candidate`, in key order.
    pub fn get_values_for_closest_keys(&self, candidate: &str) -> Values<V> {
        Values::new(self.closest_iter(candidate))
    }

    /// Key-value pairs for the keys closest to `candidate`, in key order.
    pub fn get_key_value_pairs_for_closest_keys(&self, candidate: &str) -> Pairs<V> {
        Pairs::new(self.closest_iter(candidate))
    }

    fn prefix_iter(&self, prefix: &str) -> MatchIter<V> {
        let prefix = decode_key(prefix);
        let _read = self.locking.read();
        MatchIter::new(self.scan_anchor(&prefix, false), self.key_transform.clone())
    }

    fn closest_iter(&self, candidate: &str) -> MatchIter<V> {
        let candidate = decode_key(candidate);
        let _read = self.locking.read();
        MatchIter::new(self.scan_anchor(&candidate, true), self.key_transform.clone())
    }

    /// Resolve the subtree a scan should enumerate: the anchor node and
    /// its full reconstructed key. `None` means an empty result.
    fn scan_anchor(&self, key: &[char], closest: bool) -> Option<(String, Arc<Node<V>>)> {
        let found = search(&self.root_snapshot(), key);
        match found.classification {
            Classification::ExactMatch => Some((key.iter().collect(), found.node)),
            Classification::KeyEndsMidEdge => {
                // The anchor's key extends past the scanned one by the
                // unconsumed remainder of its edge.
                let mut path: String = key.iter().collect();
                path.extend(
                    found
                        .node
                        .edge()
                        .chars()
                        .skip(found.chars_matched_in_edge),
                );
                Some((path, found.node))
            }
            Classification::IncompleteMatchToEndOfEdge
                if closest && found.chars_matched > 0 =>
            {
                Some((key[..found.chars_matched].iter().collect(), found.node))
            }
            Classification::IncompleteMatchToMiddleOfEdge if closest => {
                // Every matched character below the root passes through a
                // dispatch character first, so something was consumed.
                debug_assert!(found.chars_matched > 0);
                let consumed_above = found.chars_matched - found.chars_matched_in_edge;
                let mut path: String = key[..consumed_above].iter().collect();
                path.extend(found.node.edge().chars());
                Some((path, found.node))
            }
            _ => None,
        }
    }

    /// Number of keys stored, counted by walking a snapshot of the tree.
    ///
    /// This is not O(1); callers that poll it frequently should cache.
    pub fn size(&self) -> usize {
        let _read = self.locking.read();
        let mut count = 0;
        let mut stack: Vec<Arc<Node<V>>> = vec![self.root_snapshot()];
        while let Some(node) = stack.pop() {
            if node.is_explicit() {
                count += 1;
            }
            stack.extend(node.children_snapshot());
        }
        count
    }

    /// Whether the tree stores no keys.
    ///
    /// A childless root means an empty tree: the mutation engine never
    /// leaves a subtree without at least one stored key in it.
    pub fn is_empty(&self) -> bool {
        let _read = self.locking.read();
        self.root.load().child_count() == 0
    }

    /// Total reachable nodes including the root and implicit branches.
    ///
    /// Diagnostic companion to [`RadixTree::size`]: the difference between
    /// the two is the number of purely structural nodes.
    pub fn node_count(&self) -> usize {
        let _read = self.locking.read();
        let mut count = 0;
        let mut stack: Vec<Arc<Node<V>>> = vec![self.root_snapshot()];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children_snapshot());
        }
        count
    }
}

impl<V> Default for RadixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for RadixTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadixTree")
            .field("size", &self.size())
            .field(
                "restricted_reads",
                &matches!(self.locking, Locking::Restricted(_)),
            )
            .finish()
    }
}
