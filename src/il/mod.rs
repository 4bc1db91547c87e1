//! IL node graph.
//!
//! The IL is the representation between lifted bytecode and structured source. Each
//! function owns one [`IlGraph`]: an arena of [`IlNode`]s addressed by [`NodeId`], with
//! operand edges stored inside each node's [`NodeKind`] and reverse edges in each
//! node's use list.
//!
//! # Key Components
//!
//! - [`IlGraph`] - Arena, constructors and the use-def mutation primitives
//!   ([`replace_uses_with`](IlGraph::replace_uses_with),
//!   [`replace_param`](IlGraph::replace_param), [`unlink`](IlGraph::unlink))
//! - [`NodeKind`] - The closed family of node variants
//! - [`UnaryOp`] / [`BinaryOp`] - Operators, integer and float
//!
//! # Usage Examples
//!
//! ```rust
//! use smxscope::il::{BinaryOp, IlGraph};
//!
//! let mut graph = IlGraph::new();
//! let a = graph.constant(1);
//! let b = graph.constant(2);
//! let sum = graph.binary(BinaryOp::Add, a, a);
//!
//! graph.replace_uses_with(a, b);
//! assert_eq!(graph.num_uses(a), 0);
//! assert_eq!(graph.uses(b), &[sum, sum]);
//! assert!(graph.check_use_def().is_ok());
//! ```

mod graph;
mod node;
mod render;

pub use graph::IlGraph;
pub use node::{BinaryOp, IlNode, NodeId, NodeKind, UnaryOp};
