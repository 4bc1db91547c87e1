//! Shared utilities used across the analysis layers.
//!
//! - [`graph`] - Generic graph traits and algorithms (traversal, dominators)
//! - [`escape_dot`] - Escaping helper for Graphviz DOT output

mod dot;
pub mod graph;

pub use dot::escape_dot;
