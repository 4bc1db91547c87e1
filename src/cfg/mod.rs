//! Control flow graph over the IL.
//!
//! [`IlControlFlowGraph`] groups the root nodes of a function's [`IlGraph`](crate::il::IlGraph)
//! into [`IlBlock`]s connected by successor and predecessor edges, and provides the
//! analyses the code fixer and the structurer consume:
//!
//! - dominance ([`compute_dominance`](IlControlFlowGraph::compute_dominance),
//!   [`dominates`](IlControlFlowGraph::dominates)) and post-dominance
//!   ([`PostDominatorTree`])
//! - back edges, loop headers and [`NaturalLoop`]s
//! - interval decomposition and the derived sequence ([`IntervalGraph`])
//! - paired edge surgery and batch block removal
//! - DOT export for debugging
//!
//! # Usage Examples
//!
//! ```rust
//! use smxscope::cfg::IlControlFlowGraph;
//!
//! # fn main() -> smxscope::Result<()> {
//! let mut cfg = IlControlFlowGraph::new(0);
//! let entry = cfg.add_block(0x0)?;
//! let body = cfg.add_block(0x8)?;
//! cfg.add_edge(entry, body)?;
//! cfg.add_edge(body, body)?;
//!
//! cfg.compute_dominance();
//! assert!(cfg.dominates(entry, body));
//! assert!(cfg.natural_loop(body).is_some());
//! # Ok(())
//! # }
//! ```

mod block;
mod dominance;
mod dot;
mod graph;
mod interval;

pub use block::{BlockId, IlBlock};
pub use dominance::{NaturalLoop, PostDominatorTree};
pub use graph::IlControlFlowGraph;
pub use interval::{IntervalGraph, IntervalNode};
