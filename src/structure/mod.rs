//! Structured statements recovered from a fixed control flow graph.
//!
//! After the code fixer has run, [`structure`] turns a function's
//! [`IlControlFlowGraph`](crate::cfg::IlControlFlowGraph) into a [`Statement`]
//! tree of sequences, `if`/`else`, `while`, `do`/`while`, `switch` and `goto`.
//! Statements reference nodes of the function's [`IlGraph`](crate::il::IlGraph);
//! the emitter renders them from there.
//!
//! Edges that do not nest, such as those of irreducible regions or loop exits
//! from the middle of a body, become [`StatementKind::Goto`] statements whose
//! targets carry a [`Label`].
//!
//! # Example
//!
//! ```rust
//! use smxscope::{cfg::IlControlFlowGraph, structure::structure};
//!
//! let mut cfg = IlControlFlowGraph::new(0);
//! let entry = cfg.add_block(0)?;
//! let call = cfg.graph_mut().call(0x40, Vec::new());
//! let ret = cfg.graph_mut().ret(None);
//! cfg.append(entry, call);
//! cfg.append(entry, ret);
//!
//! let tree = structure(&mut cfg);
//! assert_eq!(tree.outline(cfg.graph()), "func_40()\nreturn\n");
//! # Ok::<(), smxscope::Error>(())
//! ```

mod statement;
mod structurer;

pub use statement::{BasicStatement, CaseStatement, Label, Statement, StatementKind};
pub use structurer::{structure, Structurer};
