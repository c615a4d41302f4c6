//! Structural dump and canonical hashing for diagnostics.

use sha2::{Digest, Sha256};

use crate::graph::Graph;

/// Human-readable structural dump: one line per node with its type, role and
/// child linkage. Intended for debugging; not a stable machine format.
pub fn structure_dump(graph: &Graph) -> String {
    let mut out = String::new();
    for node in graph.structure() {
        out.push_str(&node.name);
        out.push_str(" [");
        out.push_str(&node.kind);
        out.push_str("] ");
        out.push_str(&node.role);
        if !node.children.is_empty() {
            out.push_str(" <- (");
            out.push_str(&node.children.join(", "));
            out.push(')');
        }
        out.push('\n');
    }
    if let Some(head) = graph.head_name() {
        out.push_str("head: ");
        out.push_str(head);
        out.push('\n');
    }
    out
}

/// Canonical SHA-256 hash of the structural dump, hex encoded. Two graphs
/// with identical topology, types and bindings hash identically regardless of
/// cached values.
pub fn canonical_hash(graph: &Graph) -> String {
    let mut hasher = Sha256::new();
    hasher.update(structure_dump(graph).as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
