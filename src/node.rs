//! Tree nodes and their storage layouts.
//!
//! Nodes are immutable once built: every field is write-once except the
//! child slots, which support atomic whole-pointer replacement. The factory
//! picks the cheapest layout for what a node actually stores:
//!
//! - `Full`: edge, value, and children all present
//! - `Branch`: children only; the node exists for branching
//! - `Leaf`: a value and no child array at all
//! - `Bare`: neither value nor children; the root of an empty tree
//!
//! Edge labels are stored one byte per character while every character
//! fits in a single byte, widening to full `char`s otherwise.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use smallvec::SmallVec;

/// Children collected during a rebuild; inline storage covers the
/// common low-fanout case.
pub(crate) type ChildVec<V> = SmallVec<[Arc<Node<V>>; 4]>;

/// The storage layout of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Edge, value, and children all present.
    Full,
    /// A valueless interior node kept for branching.
    Branch,
    /// A value-bearing node with no child array.
    Leaf,
    /// A node with neither value nor children.
    Bare,
}

/// Payload type for set-membership trees.
///
/// A `RadixTree<VoidValue>` records which keys are present without
/// attaching data to them. `VoidValue` is zero-sized, so the value-bearing
/// layouts store it without payload bytes while the key still counts as
/// explicitly present for `size()`, removal, and merging.
///
/// ```
/// use cowtrie::{RadixTree, VoidValue};
///
/// let members = RadixTree::new();
/// members.put("alice", VoidValue).unwrap();
/// members.put("bob", VoidValue).unwrap();
///
/// assert!(members.get_value_for_exact_key("alice").is_some());
/// assert!(members.get_value_for_exact_key("carol").is_none());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoidValue;

/// An edge label: the characters leading from a parent into a node.
///
/// Non-empty on every node except the synthetic root. Labels whose
/// characters all fit in one byte (`U+0000..=U+00FF`) are byte-packed;
/// anything else falls back to whole `char` storage. Constructors
/// canonicalize, so equal character sequences always compare equal.
#[derive(Clone, PartialEq, Eq)]
pub enum Edge {
    /// One byte per character; every character is `U+00FF` or below.
    Packed(Box<[u8]>),
    /// Full characters, used when byte packing cannot represent the label.
    Wide(Box<[char]>),
}

impl Edge {
    /// Build a label from a character slice, byte-packing when possible.
    pub(crate) fn from_chars(chars: &[char]) -> Self {
        if chars.iter().all(|&c| (c as u32) <= 0xFF) {
            Edge::Packed(chars.iter().map(|&c| c as u8).collect())
        } else {
            Edge::Wide(chars.into())
        }
    }

    /// The empty label carried by the synthetic root.
    pub(crate) fn empty() -> Self {
        Edge::Packed(Box::default())
    }

    /// Number of characters in the label.
    pub fn len(&self) -> usize {
        match self {
            Edge::Packed(bytes) => bytes.len(),
            Edge::Wide(chars) => chars.len(),
        }
    }

    /// Whether the label has no characters (the root only).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The character at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    pub fn char_at(&self, idx: usize) -> char {
        match self {
            Edge::Packed(bytes) => bytes[idx] as char,
            Edge::Wide(chars) => chars[idx],
        }
    }

    /// The first character, which is also the child's dispatch character.
    ///
    /// # Panics
    ///
    /// Panics on the empty root label.
    pub fn first_char(&self) -> char {
        self.char_at(0)
    }

    /// Iterate over the label's characters.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        (0..self.len()).map(move |i| self.char_at(i))
    }

    /// The first `len` characters as a new label.
    pub(crate) fn prefix(&self, len: usize) -> Edge {
        match self {
            Edge::Packed(bytes) => Edge::Packed(bytes[..len].into()),
            Edge::Wide(chars) => Edge::from_chars(&chars[..len]),
        }
    }

    /// The characters from `start` onward as a new label.
    pub(crate) fn suffix(&self, start: usize) -> Edge {
        match self {
            Edge::Packed(bytes) => Edge::Packed(bytes[start..].into()),
            Edge::Wide(chars) => Edge::from_chars(&chars[start..]),
        }
    }

    /// This label followed by `other`, as used when merging nodes.
    pub(crate) fn concat(&self, other: &Edge) -> Edge {
        if let (Edge::Packed(a), Edge::Packed(b)) = (self, other) {
            let mut bytes = Vec::with_capacity(a.len() + b.len());
            bytes.extend_from_slice(a);
            bytes.extend_from_slice(b);
            return Edge::Packed(bytes.into_boxed_slice());
        }
        let mut chars: Vec<char> = Vec::with_capacity(self.len() + other.len());
        chars.extend(self.chars());
        chars.extend(other.chars());
        Edge::from_chars(&chars)
    }
}

impl From<&str> for Edge {
    fn from(s: &str) -> Self {
        let chars: SmallVec<[char; 24]> = s.chars().collect();
        Edge::from_chars(&chars)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.chars() {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string())
    }
}

/// The outgoing children of a node.
///
/// Dispatch characters and slots are sorted ascending by each child's
/// first edge character and contain no duplicates. The array's shape and
/// dispatch characters are frozen when the node is built; only whole
/// child pointers can be swapped, atomically and one slot at a time.
pub struct ChildArray<V> {
    /// First edge character of the child in each slot.
    keys: Box<[char]>,
    /// Atomically replaceable child pointers, parallel to `keys`.
    slots: Box<[ArcSwap<Node<V>>]>,
}

impl<V> ChildArray<V> {
    /// Build a child array, sorting by first edge character.
    ///
    /// # Panics
    ///
    /// Panics if two children share a first edge character.
    pub(crate) fn new(mut children: ChildVec<V>) -> Self {
        children.sort_unstable_by_key(|child| child.edge().first_char());
        for pair in children.windows(2) {
            if pair[0].edge().first_char() == pair[1].edge().first_char() {
                panic!(
                    "duplicate outgoing edge '{}'",
                    pair[0].edge().first_char()
                );
            }
        }
        let keys: Box<[char]> = children
            .iter()
            .map(|child| child.edge().first_char())
            .collect();
        let slots: Box<[ArcSwap<Node<V>>]> =
            children.into_iter().map(ArcSwap::new).collect();
        ChildArray { keys, slots }
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether there are no children.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The sorted dispatch characters, one per slot.
    pub fn keys(&self) -> &[char] {
        &self.keys
    }

    /// The child whose edge starts with `c`, if any.
    pub fn get(&self, c: char) -> Option<Arc<Node<V>>> {
        let idx = self.keys.binary_search(&c).ok()?;
        Some(self.slots[idx].load_full())
    }

    /// Iterate over the children in dispatch order.
    ///
    /// Each child is loaded atomically at visit time, so a concurrent
    /// single-slot replacement is observed as either the old or the new
    /// child, never anything in between.
    pub fn iter(&self) -> impl Iterator<Item = Arc<Node<V>>> + '_ {
        self.slots.iter().map(|slot| slot.load_full())
    }

    /// Atomically replace the child sharing `child`'s first edge character.
    ///
    /// This is the single publication point for in-place structural edits:
    /// the replacement must begin with the same character as the child it
    /// supersedes.
    ///
    /// # Panics
    ///
    /// Panics if no slot matches, which means a structural invariant was
    /// broken upstream.
    pub(crate) fn update(&self, child: Arc<Node<V>>) {
        let c = child.edge().first_char();
        let idx = match self.keys.binary_search(&c) {
            Ok(idx) => idx,
            Err(_) => panic!("no outgoing edge starting with '{c}' to update"),
        };
        self.slots[idx].store(child);
    }

    /// Load every child, for copy-on-write rebuilds.
    pub(crate) fn snapshot(&self) -> ChildVec<V> {
        self.iter().collect()
    }
}

/// A tree node. Immutable after construction apart from atomic child-slot
/// replacement; see the module docs for the layout variants.
pub enum Node<V> {
    /// Edge, value, and children all present.
    Full {
        /// Incoming edge label.
        edge: Edge,
        /// The stored payload.
        value: Arc<V>,
        /// Outgoing children.
        children: ChildArray<V>,
    },
    /// A valueless interior node kept only for branching.
    Branch {
        /// Incoming edge label.
        edge: Edge,
        /// Outgoing children.
        children: ChildArray<V>,
    },
    /// A value-bearing node with no child array at all.
    Leaf {
        /// Incoming edge label.
        edge: Edge,
        /// The stored payload.
        value: Arc<V>,
    },
    /// A node with neither value nor children; only the root of an empty
    /// tree takes this shape.
    Bare {
        /// Incoming edge label (empty on the root).
        edge: Edge,
    },
}

impl<V> Node<V> {
    /// The node's storage layout.
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Full { .. } => NodeType::Full,
            Node::Branch { .. } => NodeType::Branch,
            Node::Leaf { .. } => NodeType::Leaf,
            Node::Bare { .. } => NodeType::Bare,
        }
    }

    /// The incoming edge label.
    pub fn edge(&self) -> &Edge {
        match self {
            Node::Full { edge, .. }
            | Node::Branch { edge, .. }
            | Node::Leaf { edge, .. }
            | Node::Bare { edge } => edge,
        }
    }

    /// The stored value, if a key ends at this node.
    pub fn value(&self) -> Option<&Arc<V>> {
        match self {
            Node::Full { value, .. } | Node::Leaf { value, .. } => Some(value),
            Node::Branch { .. } | Node::Bare { .. } => None,
        }
    }

    /// Whether a key explicitly ends at this node.
    pub fn is_explicit(&self) -> bool {
        self.value().is_some()
    }

    /// The outgoing children, if this layout carries any.
    pub fn children(&self) -> Option<&ChildArray<V>> {
        match self {
            Node::Full { children, .. } | Node::Branch { children, .. } => Some(children),
            Node::Leaf { .. } | Node::Bare { .. } => None,
        }
    }

    /// The child whose edge starts with `c`, if any.
    pub fn child(&self, c: char) -> Option<Arc<Node<V>>> {
        self.children().and_then(|children| children.get(c))
    }

    /// Number of outgoing children.
    pub fn child_count(&self) -> usize {
        self.children().map_or(0, ChildArray::len)
    }

    /// Load every child, for copy-on-write rebuilds.
    pub(crate) fn children_snapshot(&self) -> ChildVec<V> {
        self.children().map_or_else(SmallVec::new, ChildArray::snapshot)
    }
}

/// Build a node, selecting the cheapest layout for its contents.
///
/// Selection is pure: the same edge, value presence, and children always
/// produce the same layout. Children are sorted here, so callers may pass
/// them in any order.
///
/// # Panics
///
/// Panics on an empty edge for a non-root node, or on children with
/// duplicate first edge characters.
pub(crate) fn make_node<V>(
    edge: Edge,
    value: Option<Arc<V>>,
    children: ChildVec<V>,
    is_root: bool,
) -> Arc<Node<V>> {
    if edge.is_empty() && !is_root {
        panic!("non-root node built with an empty edge");
    }
    let node = match (children.is_empty(), value) {
        (true, Some(value)) => Node::Leaf { edge, value },
        (true, None) => Node::Bare { edge },
        (false, Some(value)) => Node::Full {
            edge,
            value,
            children: ChildArray::new(children),
        },
        (false, None) => Node::Branch {
            edge,
            children: ChildArray::new(children),
        },
    };
    Arc::new(node)
}

impl<V> fmt::Debug for Node<V>
where
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Full { edge, value, children } => f
                .debug_struct("Full")
                .field("edge", edge)
                .field("value", value)
                .field("children", &children.len())
                .finish(),
            Node::Branch { edge, children } => f
                .debug_struct("Branch")
                .field("edge", edge)
                .field("children", &children.len())
                .finish(),
            Node::Leaf { edge, value } => f
                .debug_struct("Leaf")
                .field("edge", edge)
                .field("value", value)
                .finish(),
            Node::Bare { edge } => {
                f.debug_struct("Bare").field("edge", edge).finish()
            }
        }
    }
}
