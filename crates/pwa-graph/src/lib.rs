#![deny(missing_docs)]
#![doc = include_str!("../docs/graph-api.md")]

mod dump;
mod graph;
mod strategy;
mod value;

pub use dump::{canonical_hash, structure_dump};
pub use graph::{Graph, LeafBinding, NodeDescription, NodeId};
pub use strategy::{arity_guard, common_width, AbsSquare, AddAll, Complexify, MultAll, Strategy};
pub use value::{Value, ValueKind};
