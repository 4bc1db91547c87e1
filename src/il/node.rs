//! IL node definitions.
//!
//! Every value and instruction of a lifted function is an [`IlNode`] living in the
//! [`IlGraph`](crate::il::IlGraph) arena. The node family is closed: [`NodeKind`] is a
//! tagged enum and passes match on it exhaustively instead of dispatching through a
//! visitor hierarchy.
//!
//! # Operand Slots
//!
//! Operands are the [`NodeId`]s embedded in a kind. Two slots are optional: the value
//! of a `return` and the initializer of a local declaration. Control-transfer nodes
//! do not name their targets; the targets are the successor edges of the owning block
//! (`[true, false]` for a conditional jump, `[target]` for a jump,
//! `[case_0, .., case_n, default]` for a switch).

use std::fmt;

use strum::{Display, EnumIter, IntoStaticStr};

use crate::symbols::{Cell, DebugSymbol, VarType};

/// Stable identity of an IL node: its index in the owning [`IlGraph`](crate::il::IlGraph).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Creates a `NodeId` from a raw arena index.
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    /// Returns the arena index of this node.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum UnaryOp {
    /// Logical not (`!x`)
    #[strum(to_string = "!")]
    Not,
    /// Arithmetic negation (`-x`)
    #[strum(to_string = "-")]
    Neg,
    /// Bitwise complement (`~x`)
    #[strum(to_string = "~")]
    Invert,
    /// Pre-increment (`++x`); the store back into the variable is implied
    #[strum(to_string = "++")]
    Inc,
    /// Pre-decrement (`--x`); the store back into the variable is implied
    #[strum(to_string = "--")]
    Dec,
    /// Logical not of a float (`!f`)
    #[strum(to_string = "!")]
    FloatNot,
}

impl UnaryOp {
    /// Returns `true` for `++`/`--`, which write their operand.
    #[must_use]
    pub fn is_inc_dec(self) -> bool {
        matches!(self, UnaryOp::Inc | UnaryOp::Dec)
    }
}

/// Binary operators.
///
/// Float operators exist because the VM implements float arithmetic through natives;
/// the float-native pass rewrites those calls into these operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum BinaryOp {
    /// Integer addition (`a + b`)
    #[strum(to_string = "+")]
    Add,
    /// Integer subtraction (`a - b`)
    #[strum(to_string = "-")]
    Sub,
    /// Integer multiplication (`a * b`)
    #[strum(to_string = "*")]
    Mul,
    /// Integer division (`a / b`)
    #[strum(to_string = "/")]
    Div,
    /// Integer remainder (`a % b`)
    #[strum(to_string = "%")]
    Mod,
    /// Left shift (`a << b`)
    #[strum(to_string = "<<")]
    Shl,
    /// Arithmetic right shift (`a >> b`)
    #[strum(to_string = ">>")]
    Shr,
    /// Logical right shift (`a >>> b`)
    #[strum(to_string = ">>>")]
    Ushr,
    /// Bitwise and (`a & b`)
    #[strum(to_string = "&")]
    BitAnd,
    /// Bitwise or (`a | b`)
    #[strum(to_string = "|")]
    BitOr,
    /// Bitwise exclusive or (`a ^ b`)
    #[strum(to_string = "^")]
    BitXor,
    /// Equality (`a == b`)
    #[strum(to_string = "==")]
    Eq,
    /// Inequality (`a != b`)
    #[strum(to_string = "!=")]
    Ne,
    /// Signed less than (`a < b`)
    #[strum(to_string = "<")]
    Lt,
    /// Signed less than or equal (`a <= b`)
    #[strum(to_string = "<=")]
    Le,
    /// Signed greater than (`a > b`)
    #[strum(to_string = ">")]
    Gt,
    /// Signed greater than or equal (`a >= b`)
    #[strum(to_string = ">=")]
    Ge,
    /// Float addition
    #[strum(to_string = "+")]
    FloatAdd,
    /// Float subtraction
    #[strum(to_string = "-")]
    FloatSub,
    /// Float multiplication
    #[strum(to_string = "*")]
    FloatMul,
    /// Float division
    #[strum(to_string = "/")]
    FloatDiv,
    /// Float equality
    #[strum(to_string = "==")]
    FloatEq,
    /// Float inequality
    #[strum(to_string = "!=")]
    FloatNe,
    /// Float less than
    #[strum(to_string = "<")]
    FloatLt,
    /// Float less than or equal
    #[strum(to_string = "<=")]
    FloatLe,
    /// Float greater than
    #[strum(to_string = ">")]
    FloatGt,
    /// Float greater than or equal
    #[strum(to_string = ">=")]
    FloatGe,
}

impl BinaryOp {
    /// Returns `true` for operators producing a boolean.
    #[must_use]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::FloatEq
                | BinaryOp::FloatNe
                | BinaryOp::FloatLt
                | BinaryOp::FloatLe
                | BinaryOp::FloatGt
                | BinaryOp::FloatGe
        )
    }

    /// Returns `true` for float arithmetic producing a float.
    #[must_use]
    pub fn is_float_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::FloatAdd | BinaryOp::FloatSub | BinaryOp::FloatMul | BinaryOp::FloatDiv
        )
    }
}

/// The closed family of IL node variants.
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
pub enum NodeKind {
    /// Literal cell value
    Const {
        /// The value
        value: Cell,
    },
    /// Reference to a global variable by its data address
    GlobalVar {
        /// Address in the data section
        addr: Cell,
        /// Debug symbol, when the module carries one
        symbol: Option<DebugSymbol>,
    },
    /// Declaration of (and reference to) a local variable
    ///
    /// As a block node this is the declaration statement; loads and stores reference
    /// the same node as their variable.
    LocalVar {
        /// Frame offset of the variable
        offset: Cell,
        /// Initial value, if the declaration carries one
        value: Option<NodeId>,
        /// Debug symbol; `None` for compiler-introduced temporaries
        symbol: Option<DebugSymbol>,
    },
    /// Reference to one element of an array variable (`base[index]`)
    ArrayElementVar {
        /// The array variable
        base: NodeId,
        /// The index expression
        index: NodeId,
    },
    /// Read of a variable
    Load {
        /// The variable read
        var: NodeId,
    },
    /// Write of a value into a variable
    Store {
        /// The variable written
        var: NodeId,
        /// The value stored
        value: NodeId,
    },
    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        value: NodeId,
    },
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: NodeId,
        /// Right operand
        right: NodeId,
    },
    /// Call of a native by its index in the module's native table
    Native {
        /// Index into the [`NativeTable`](crate::symbols::NativeTable)
        index: u32,
        /// Arguments, in order
        args: Vec<NodeId>,
    },
    /// Direct call of a function in the same module
    Call {
        /// Code address of the callee
        addr: Cell,
        /// Arguments, in order
        args: Vec<NodeId>,
    },
    /// Return from the function
    Return {
        /// Returned value; stripped in void functions
        value: Option<NodeId>,
    },
    /// Unconditional jump to the block's single successor
    Jump,
    /// Conditional jump to successor 0 when `condition` holds, successor 1 otherwise
    JumpCond {
        /// Branch condition
        condition: NodeId,
    },
    /// Multi-way jump: successor `i` for `cases[i]`, the last successor as default
    Switch {
        /// The value switched on
        value: NodeId,
        /// Case values, parallel to the block's leading successors
        cases: Vec<Cell>,
    },
}

impl NodeKind {
    /// Returns the operand slots of this node in slot order.
    ///
    /// Empty optional slots are skipped. A node using the same operand twice lists it
    /// twice.
    #[must_use]
    pub fn operands(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Const { .. }
            | NodeKind::GlobalVar { .. }
            | NodeKind::Jump => Vec::new(),
            NodeKind::LocalVar { value, .. } | NodeKind::Return { value } => {
                value.iter().copied().collect()
            }
            NodeKind::ArrayElementVar { base, index } => vec![*base, *index],
            NodeKind::Load { var } => vec![*var],
            NodeKind::Store { var, value } => vec![*var, *value],
            NodeKind::Unary { value, .. } => vec![*value],
            NodeKind::Binary { left, right, .. } => vec![*left, *right],
            NodeKind::Native { args, .. } | NodeKind::Call { args, .. } => args.clone(),
            NodeKind::JumpCond { condition } => vec![*condition],
            NodeKind::Switch { value, .. } => vec![*value],
        }
    }

    /// Returns mutable references to the operand slots, in the same order as
    /// [`operands`](Self::operands).
    pub(crate) fn operands_mut(&mut self) -> Vec<&mut NodeId> {
        match self {
            NodeKind::Const { .. }
            | NodeKind::GlobalVar { .. }
            | NodeKind::Jump => Vec::new(),
            NodeKind::LocalVar { value, .. } | NodeKind::Return { value } => {
                value.iter_mut().collect()
            }
            NodeKind::ArrayElementVar { base, index } => vec![base, index],
            NodeKind::Load { var } => vec![var],
            NodeKind::Store { var, value } => vec![var, value],
            NodeKind::Unary { value, .. } => vec![value],
            NodeKind::Binary { left, right, .. } => vec![left, right],
            NodeKind::Native { args, .. } | NodeKind::Call { args, .. } => {
                args.iter_mut().collect()
            }
            NodeKind::JumpCond { condition } => vec![condition],
            NodeKind::Switch { value, .. } => vec![value],
        }
    }

    /// Returns `true` for control-transfer nodes, which must end their block.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            NodeKind::Return { .. }
                | NodeKind::Jump
                | NodeKind::JumpCond { .. }
                | NodeKind::Switch { .. }
        )
    }

    /// Returns `true` for variable references (local, global, array element).
    #[must_use]
    pub fn is_var(&self) -> bool {
        matches!(
            self,
            NodeKind::LocalVar { .. } | NodeKind::GlobalVar { .. } | NodeKind::ArrayElementVar { .. }
        )
    }

    /// Returns `true` for calls, whose evaluation must not be dropped.
    #[must_use]
    pub fn is_call(&self) -> bool {
        matches!(self, NodeKind::Native { .. } | NodeKind::Call { .. })
    }

    /// Returns `true` for nodes that write state when evaluated: calls, stores and
    /// `++`/`--`.
    #[must_use]
    pub fn has_side_effects(&self) -> bool {
        match self {
            NodeKind::Store { .. } => true,
            NodeKind::Unary { op, .. } => op.is_inc_dec(),
            _ => self.is_call(),
        }
    }

    /// Returns the kind name, e.g. `"Store"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// A node of the IL graph.
///
/// Besides its kind, a node keeps the reverse edges of the graph: one entry in
/// `uses` for every operand slot of another live node that references it.
#[derive(Debug, Clone)]
pub struct IlNode {
    pub(crate) kind: NodeKind,
    pub(crate) ty: Option<VarType>,
    pub(crate) uses: Vec<NodeId>,
    pub(crate) live: bool,
}

impl IlNode {
    /// Returns the node kind.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the semantic type, if one is known.
    #[must_use]
    pub fn ty(&self) -> Option<VarType> {
        self.ty
    }

    /// Returns the consumers of this node, one entry per referencing operand slot.
    #[must_use]
    pub fn uses(&self) -> &[NodeId] {
        &self.uses
    }

    /// Returns the number of operand slots referencing this node.
    #[must_use]
    pub fn num_uses(&self) -> usize {
        self.uses.len()
    }

    /// Returns the `i`-th consumer.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_uses()`.
    #[must_use]
    pub fn use_at(&self, i: usize) -> NodeId {
        self.uses[i]
    }

    /// Returns `false` once the node has been unlinked from the graph.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_operands_skip_empty_optional_slot() {
        assert!(NodeKind::Return { value: None }.operands().is_empty());
        let ret = NodeKind::Return {
            value: Some(NodeId::new(3)),
        };
        assert_eq!(ret.operands(), vec![NodeId::new(3)]);
    }

    #[test]
    fn test_operands_repeat_shared_operand() {
        let x = NodeId::new(1);
        let mul = NodeKind::Binary {
            op: BinaryOp::Mul,
            left: x,
            right: x,
        };
        assert_eq!(mul.operands(), vec![x, x]);
    }

    #[test]
    fn test_terminators() {
        assert!(NodeKind::Jump.is_terminator());
        assert!(NodeKind::Return { value: None }.is_terminator());
        assert!(!NodeKind::Const { value: 0 }.is_terminator());
    }

    #[test]
    fn test_comparisons_are_exactly_the_boolean_ops() {
        let comparisons: Vec<BinaryOp> = BinaryOp::iter().filter(|op| op.is_comparison()).collect();
        assert_eq!(comparisons.len(), 12);
        assert!(BinaryOp::iter().all(|op| !(op.is_comparison() && op.is_float_arithmetic())));
    }

    #[test]
    fn test_operator_tokens() {
        assert_eq!(BinaryOp::FloatGe.to_string(), ">=");
        assert_eq!(BinaryOp::Ushr.to_string(), ">>>");
        assert_eq!(UnaryOp::Inc.to_string(), "++");
    }

    #[test]
    fn test_kind_name() {
        assert_eq!(NodeKind::Jump.name(), "Jump");
        assert_eq!(NodeKind::Const { value: 1 }.name(), "Const");
    }
}
