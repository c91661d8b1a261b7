//! # cowtrie - Concurrently Readable Radix Tree
//!
//! A map from string keys to values, stored as a compressed radix tree whose
//! readers never block.
//!
//! ## Features
//!
//! - **Lock-free reads**: lookups and scans take no lock and never wait on writers
//! - **Compressed paths**: chains without branches collapse into single edges
//! - **Ordered scans**: prefix and closest-key queries yield keys in lexicographic order
//! - **Lazy iterators**: scan results are produced on demand, not collected up front
//! - **Set membership**: a [`VoidValue`] payload stores key sets without per-key data
//!
//! ## Architecture
//!
//! Nodes are immutable once built. A mutation clones the affected path,
//! assembles replacement nodes bottom-up, and publishes them with exactly one
//! atomic pointer swap, so every state a reader can observe is a complete,
//! valid tree. Writers serialize on an internal lock; readers proceed against
//! whatever tree was current when they started.
//!
//! ## Example
//!
//! ```rust
//! use cowtrie::RadixTree;
//!
//! let tree = RadixTree::new();
//! tree.put("TEST", 1).unwrap();
//! tree.put("TEAM", 2).unwrap();
//!
//! assert_eq!(tree.get_value_for_exact_key("TEST").as_deref(), Some(&1));
//!
//! // Prefix scans yield keys in lexicographic order.
//! let keys: Vec<String> = tree.get_keys_starting_with("TE").collect();
//! assert_eq!(keys, ["TEAM", "TEST"]);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod debug;
mod error;
mod iter;
mod node;
mod search;
mod tree;

pub use error::{Error, Result};
pub use iter::{Keys, Pairs, Values};
pub use node::{ChildArray, Edge, Node, NodeType, VoidValue};
pub use tree::{KeyTransform, RadixTree};

#[cfg(test)]
mod proptests;
