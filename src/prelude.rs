//! # smxscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the smxscope library. Import this module to get quick access to the essential
//! types for fixing and structuring lifted functions.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all smxscope operations
pub use crate::Error;

/// The result type used throughout smxscope
pub use crate::Result;

// ================================================================================================
// Module Tables
// ================================================================================================

/// Types, symbols, natives and signatures read from the module
pub use crate::symbols::{Cell, DebugSymbol, FunctionSignature, NativeTable, TypeTag, VarType};

// ================================================================================================
// IL and Control Flow
// ================================================================================================

/// The IL node graph
pub use crate::il::{BinaryOp, IlGraph, NodeId, NodeKind, UnaryOp};

/// Blocks and the control flow graph
pub use crate::cfg::{BlockId, IlBlock, IlControlFlowGraph, IntervalGraph, NaturalLoop};

// ================================================================================================
// Code Fixer
// ================================================================================================

/// The pass pipeline, its configuration and its journal
pub use crate::fixer::{
    CodeFixer, EventKind, EventLog, FixerConfig, FixerContext, FixerPass, FixerPasses,
};

// ================================================================================================
// Structuring and Orchestration
// ================================================================================================

/// The statement tree
pub use crate::structure::{structure, Label, Statement, StatementKind};

/// Per-function entry points
pub use crate::function::{fix_functions, IlFunction};
