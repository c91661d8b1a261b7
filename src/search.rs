//! Key search and match classification.
//!
//! Every operation starts the same way: walk the key down from the root,
//! consuming edge characters, and classify how far it got. Mutations
//! branch on the classification to pick a structural edit; queries use it
//! to pick an anchor subtree or report a miss.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::node::Node;

/// Decoded key characters; inline storage covers typical key lengths.
pub(crate) type KeyBuf = SmallVec<[char; 24]>;

/// Decode a key into characters once, up front.
pub(crate) fn decode_key(key: &str) -> KeyBuf {
    key.chars().collect()
}

/// How far a key got down the tree.
///
/// The four cases are total over (key fully consumed?, edge fully
/// consumed?), so no defensive "invalid" state is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Classification {
    /// Key and edge were both consumed exactly: the key's node exists.
    ExactMatch,
    /// The key ran out inside the deepest node's edge, with no mismatch.
    KeyEndsMidEdge,
    /// The edge was consumed but key characters remain and no child
    /// matches the next one. Includes a first character with no root
    /// child, in which case zero characters matched.
    IncompleteMatchToEndOfEdge,
    /// The walk stopped at a character mismatch inside the edge.
    IncompleteMatchToMiddleOfEdge,
}

/// Outcome of walking a key down from a root snapshot.
pub(crate) struct SearchResult<V> {
    /// The deepest node reached.
    pub node: Arc<Node<V>>,
    /// The node the walk came from, absent when `node` is the root.
    pub parent: Option<Arc<Node<V>>>,
    /// The parent's parent.
    pub grandparent: Option<Arc<Node<V>>>,
    /// Total key characters consumed.
    pub chars_matched: usize,
    /// Key characters consumed within `node`'s own edge.
    pub chars_matched_in_edge: usize,
    /// What the counters amount to.
    pub classification: Classification,
}

/// Walk `key` down from `root`, tracking the deepest node reached and its
/// two nearest ancestors. Read-only; takes no locks.
pub(crate) fn search<V>(root: &Arc<Node<V>>, key: &[char]) -> SearchResult<V> {
    let mut node = Arc::clone(root);
    let mut parent: Option<Arc<Node<V>>> = None;
    let mut grandparent: Option<Arc<Node<V>>> = None;
    let mut chars_matched = 0;
    let mut chars_matched_in_edge;

    loop {
        let edge = node.edge();
        chars_matched_in_edge = 0;
        while chars_matched_in_edge < edge.len() && chars_matched < key.len() {
            if edge.char_at(chars_matched_in_edge) != key[chars_matched] {
                break;
            }
            chars_matched_in_edge += 1;
            chars_matched += 1;
        }
        if chars_matched_in_edge == edge.len() && chars_matched < key.len() {
            if let Some(child) = node.child(key[chars_matched]) {
                grandparent = parent.take();
                parent = Some(node);
                node = child;
                continue;
            }
        }
        break;
    }

    debug_assert!(chars_matched <= key.len());
    debug_assert!(chars_matched_in_edge <= node.edge().len());

    let classification = match (
        chars_matched == key.len(),
        chars_matched_in_edge == node.edge().len(),
    ) {
        (true, true) => Classification::ExactMatch,
        (true, false) => Classification::KeyEndsMidEdge,
        (false, true) => Classification::IncompleteMatchToEndOfEdge,
        (false, false) => Classification::IncompleteMatchToMiddleOfEdge,
    };

    SearchResult {
        node,
        parent,
        grandparent,
        chars_matched,
        chars_matched_in_edge,
        classification,
    }
}
