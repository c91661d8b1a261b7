//! Debug utilities for tree troubleshooting.

use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::node::Node;
use crate::tree::RadixTree;

impl<V> RadixTree<V> {
    /// Snapshot of the current root node, for structural inspection.
    ///
    /// Nodes are immutable apart from atomic child replacement, so holding
    /// the snapshot never blocks writers; it just keeps the state it
    /// references alive.
    pub fn debug_root(&self) -> Arc<Node<V>> {
        self.root_snapshot()
    }

    /// Verify structural invariants, returning a list of issues found.
    ///
    /// An empty result means the tree is well formed. This walks every
    /// node, so it is meant for tests and troubleshooting, not hot paths.
    pub fn verify_integrity(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let root = self.root_snapshot();
        if !root.edge().is_empty() {
            issues.push(format!("root has non-empty edge {:?}", root.edge()));
        }
        if root.is_explicit() {
            issues.push("root stores a value".to_string());
        }
        for child in root.children_snapshot() {
            let path = child.edge().to_string();
            Self::verify_node(&child, &mut issues, &path);
        }
        issues
    }

    fn verify_node(node: &Node<V>, issues: &mut Vec<String>, path: &str) {
        if node.edge().is_empty() {
            issues.push(format!("node at path {path:?} has an empty edge"));
        }
        if !node.is_explicit() {
            match node.child_count() {
                0 => issues.push(format!(
                    "node at path {path:?} has neither value nor children"
                )),
                1 => issues.push(format!(
                    "valueless node at path {path:?} has a single child and should have merged"
                )),
                _ => {}
            }
        }
        if let Some(children) = node.children() {
            let keys = children.keys();
            for pair in keys.windows(2) {
                if pair[0] >= pair[1] {
                    issues.push(format!(
                        "children of node at path {path:?} are not in strictly ascending order"
                    ));
                }
            }
            for (key, child) in keys.iter().zip(children.iter()) {
                if child.edge().is_empty() {
                    issues.push(format!(
                        "child in slot {key:?} at path {path:?} has an empty edge"
                    ));
                    continue;
                }
                if child.edge().first_char() != *key {
                    issues.push(format!(
                        "child in slot {key:?} at path {path:?} starts with {:?}",
                        child.edge().first_char()
                    ));
                }
                let child_path = format!("{path}{}", child.edge());
                Self::verify_node(&child, issues, &child_path);
            }
        }
    }
}

impl<V: fmt::Debug> RadixTree<V> {
    /// Render the tree structure as an indented listing.
    pub fn debug_format(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== RadixTree ({} keys) ===", self.size());
        Self::format_node(&self.root_snapshot(), 0, &mut out);
        let _ = writeln!(out, "===========================");
        out
    }

    /// Print the tree structure for debugging.
    pub fn debug_print(&self) {
        print!("{}", self.debug_format());
    }

    fn format_node(node: &Node<V>, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}{:?} \"{}\"", node.node_type(), node.edge());
        if let Some(value) = node.value() {
            let _ = write!(out, " = {value:?}");
        }
        if node.child_count() > 0 {
            let _ = write!(out, " ({} children)", node.child_count());
        }
        let _ = writeln!(out);
        for child in node.children_snapshot() {
            Self::format_node(&child, depth + 1, out);
        }
    }
}
