//! Graph algorithms for control flow analysis.
//!
//! # Available Algorithms
//!
//! ## Traversal
//!
//! - [`postorder`] - Postorder traversal
//! - [`reverse_postorder`] - Reverse postorder traversal (iteration order for forward problems)
//!
//! ## Dominator Analysis
//!
//! - [`compute_dominators`] - Dominator tree via the iterative reverse-postorder fixed point
//! - [`compute_dominators_in_order`] - Same, with a caller-supplied reverse postorder
//! - [`DominatorTree`] - Result of dominator computation
//!
//! | Algorithm | Time Complexity | Use Case |
//! |-----------|-----------------|----------|
//! | Postorder / RPO | O(V + E) | Iteration order, reachability |
//! | Dominators | O(V + E) per pass, few passes on reducible graphs | Loop and region analysis |

mod dominators;
mod traversal;

pub use dominators::{compute_dominators, compute_dominators_in_order, DominatorTree};
pub use traversal::{postorder, reverse_postorder};
