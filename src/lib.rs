// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # smxscope
//!
//! The middle-end of a decompiler for SourcePawn `.smx` plugins. Built in pure Rust,
//! `smxscope` takes the intermediate language lifted from a function's stack-machine
//! bytecode and rewrites it, step by step, into a form that an emitter can print as
//! structured, readable source.
//!
//! ## Features
//!
//! - **🧩 IL node graph** - Arena of typed expression and statement nodes with exact
//!   use-def lists and replace-all-uses primitives
//! - **🔀 Control flow analysis** - Blocks and edges, dominance and post-dominance, back
//!   edges and natural loops, interval decomposition
//! - **🔧 Code fixer** - Nine ordered rewrite passes that undo compiler idioms: raw
//!   global addresses, pointer-style array access, float natives, `&&`/`||` diamonds
//! - **🌳 Structuring** - `if`, `while`, `do`/`while`, `switch` and labelled `goto`
//!   recovered from the fixed graph
//! - **⚡ Parallel batches** - Independent functions fixed concurrently with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use smxscope::prelude::*;
//!
//! // int f() { return g ? 1 : 0; } lifted as a diamond over a global at 0x40
//! let mut cfg = IlControlFlowGraph::new(0);
//! let entry = cfg.add_block(0x0)?;
//! let then_block = cfg.add_block(0x10)?;
//! let else_block = cfg.add_block(0x20)?;
//!
//! let graph = cfg.graph_mut();
//! let flag = graph.named_global(0x40, DebugSymbol::new("g", VarType::BOOL));
//! let load = graph.load(flag);
//! let zero = graph.constant(0);
//! let compare = graph.binary(BinaryOp::Ne, load, zero);
//! let branch = graph.jump_cond(compare);
//! let one = graph.constant(1);
//! let ret_one = graph.ret(Some(one));
//! let zero = graph.constant(0);
//! let ret_zero = graph.ret(Some(zero));
//!
//! cfg.append(entry, branch);
//! cfg.append(then_block, ret_one);
//! cfg.append(else_block, ret_zero);
//! cfg.add_edge(entry, then_block)?;
//! cfg.add_edge(entry, else_block)?;
//!
//! let mut function = IlFunction::new(FunctionSignature::new("f", Some(VarType::INT)), cfg)?;
//! let (events, tree) = function.decompile(&NativeTable::new(), &FixerConfig::default());
//!
//! assert!(events.has(EventKind::BoolCompareSimplified));
//! assert_eq!(
//!     tree.outline(function.cfg().graph()),
//!     "if (g)\n    return 1\nelse\n    return 0\n"
//! );
//! # Ok::<(), smxscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! lifted IlGraph ─► IlControlFlowGraph ─► CodeFixer (9 passes) ─► Structurer ─► Statement
//!                        │                      │                     │
//!                   dominance              EventLog            post-dominators,
//!                   intervals                                  natural loops
//! ```
//!
//! ### Core Components
//!
//! - [`symbols`] - Types, debug symbols, natives and signatures from the module tables
//! - [`il`] - The IL node graph and its mutation primitives
//! - [`cfg`] - Blocks, edges, dominance, loops, intervals and DOT export
//! - [`fixer`] - The code fixer pipeline and its change journal
//! - [`structure`] - The structured-statement tree and the structurer
//! - [`function`] - Per-function orchestration and parallel batches
//!
//! ## Error Handling
//!
//! Rewrites never fail; a pass whose pattern does not match leaves the graph as it
//! is. Fallible operations are limited to building graphs from lifter output and to
//! the verifiers, and return [`Result`]. Broken internal invariants panic.

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use smxscope::prelude::*;
///
/// let fixer = CodeFixer::new(FixerConfig::default().without(FixerPasses::SHORT_CIRCUIT));
/// assert_eq!(fixer.passes().count(), 8);
/// ```
pub mod prelude;

pub mod cfg;
pub mod fixer;
pub mod function;
pub mod il;
pub mod structure;
pub mod symbols;
pub mod utils;

/// `smxscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `smxscope` Error type
///
/// Returned by graph construction and the verifiers; rewrites never fail.
pub use error::Error;
