//! The IL node arena and its use-def bookkeeping.
//!
//! [`IlGraph`] owns every node of one function. Operands are stored as [`NodeId`]s
//! inside each node's [`NodeKind`]; the reverse edges are kept in each node's use
//! list. Every mutation primitive in this module keeps the two sides symmetric:
//! `B` appears in `A.uses()` exactly as many times as `A` appears among `B`'s
//! operand slots.
//!
//! Calling a primitive with a relationship that does not exist (replacing an operand
//! a node does not have, unlinking a node that is still used) is a programming error
//! in the caller and panics.

use std::collections::{HashMap, HashSet};

use crate::{
    il::node::{BinaryOp, IlNode, NodeId, NodeKind, UnaryOp},
    symbols::{Cell, DebugSymbol, VarType},
    Error::GraphError,
    Result,
};

/// Arena of IL nodes for a single function.
#[derive(Debug, Clone, Default)]
pub struct IlGraph {
    nodes: Vec<IlNode>,
}

impl IlGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes ever allocated, dead ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this graph.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &IlNode {
        &self.nodes[id.index()]
    }

    /// Returns the node with the given id, or `None` if it was never allocated.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&IlNode> {
        self.nodes.get(id.index())
    }

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Returns the semantic type of a node, if known.
    #[must_use]
    pub fn ty(&self, id: NodeId) -> Option<VarType> {
        self.node(id).ty
    }

    /// Overrides the semantic type of a node.
    pub fn set_type(&mut self, id: NodeId, ty: Option<VarType>) {
        self.nodes[id.index()].ty = ty;
    }

    /// Returns the number of operand slots referencing `id`.
    #[must_use]
    pub fn num_uses(&self, id: NodeId) -> usize {
        self.node(id).uses.len()
    }

    /// Returns the `i`-th consumer of `id`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_uses(id)`.
    #[must_use]
    pub fn use_at(&self, id: NodeId, i: usize) -> NodeId {
        self.node(id).uses[i]
    }

    /// Returns all consumers of `id`, one entry per referencing slot.
    #[must_use]
    pub fn uses(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).uses
    }

    /// Returns `true` if `id` has not been unlinked.
    #[must_use]
    pub fn is_live(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(IlNode::is_live)
    }

    /// Iterates over the ids of all live nodes in allocation order.
    pub fn live_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.live)
            .map(|(index, _)| NodeId(index as u32))
    }

    /// Allocates a node, deriving its type from its operands.
    ///
    /// # Panics
    ///
    /// Panics if an operand is not a live node of this graph.
    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        let ty = self.derive_type(&kind);
        self.add_typed(kind, ty)
    }

    /// Allocates a node with an explicit type.
    ///
    /// # Panics
    ///
    /// Panics if an operand is not a live node of this graph.
    pub fn add_typed(&mut self, kind: NodeKind, ty: Option<VarType>) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        for operand in kind.operands() {
            assert!(
                self.is_live(operand),
                "operand {operand} of new {} node is not a live node",
                kind.name()
            );
            self.nodes[operand.index()].uses.push(id);
        }
        self.nodes.push(IlNode {
            kind,
            ty,
            uses: Vec::new(),
            live: true,
        });
        id
    }

    fn derive_type(&self, kind: &NodeKind) -> Option<VarType> {
        match kind {
            NodeKind::Load { var } => self.ty(*var),
            NodeKind::ArrayElementVar { base, .. } => self.ty(*base).and_then(|ty| ty.element()),
            NodeKind::Unary { op, value } => match op {
                UnaryOp::Not | UnaryOp::FloatNot => Some(VarType::BOOL),
                UnaryOp::Neg | UnaryOp::Invert | UnaryOp::Inc | UnaryOp::Dec => self.ty(*value),
            },
            NodeKind::Binary { op, .. } if op.is_comparison() => Some(VarType::BOOL),
            NodeKind::Binary { op, .. } if op.is_float_arithmetic() => Some(VarType::FLOAT),
            _ => None,
        }
    }

    /// Allocates a constant.
    pub fn constant(&mut self, value: Cell) -> NodeId {
        self.add(NodeKind::Const { value })
    }

    /// Allocates a reference to the global at `addr`.
    pub fn global_var(&mut self, addr: Cell, ty: Option<VarType>) -> NodeId {
        self.add_typed(NodeKind::GlobalVar { addr, symbol: None }, ty)
    }

    /// Allocates a reference to a global carrying debug information.
    pub fn named_global(&mut self, addr: Cell, symbol: DebugSymbol) -> NodeId {
        let ty = Some(symbol.ty);
        self.add_typed(
            NodeKind::GlobalVar {
                addr,
                symbol: Some(symbol),
            },
            ty,
        )
    }

    /// Allocates a declaration of a compiler temporary at frame `offset`.
    pub fn local_var(&mut self, offset: Cell, ty: Option<VarType>) -> NodeId {
        self.add_typed(
            NodeKind::LocalVar {
                offset,
                value: None,
                symbol: None,
            },
            ty,
        )
    }

    /// Allocates a declaration of a user-named local; its type is the symbol's.
    pub fn named_local(&mut self, offset: Cell, symbol: DebugSymbol) -> NodeId {
        let ty = Some(symbol.ty);
        self.add_typed(
            NodeKind::LocalVar {
                offset,
                value: None,
                symbol: Some(symbol),
            },
            ty,
        )
    }

    /// Allocates `base[index]`.
    pub fn array_element(&mut self, base: NodeId, index: NodeId) -> NodeId {
        self.add(NodeKind::ArrayElementVar { base, index })
    }

    /// Allocates a read of `var`.
    pub fn load(&mut self, var: NodeId) -> NodeId {
        self.add(NodeKind::Load { var })
    }

    /// Allocates `var = value`.
    pub fn store(&mut self, var: NodeId, value: NodeId) -> NodeId {
        self.add(NodeKind::Store { var, value })
    }

    /// Allocates a unary operation.
    pub fn unary(&mut self, op: UnaryOp, value: NodeId) -> NodeId {
        self.add(NodeKind::Unary { op, value })
    }

    /// Allocates a binary operation.
    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.add(NodeKind::Binary { op, left, right })
    }

    /// Allocates a call of native `index`.
    pub fn native(&mut self, index: u32, args: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::Native { index, args })
    }

    /// Allocates a direct call of the function at `addr`.
    pub fn call(&mut self, addr: Cell, args: Vec<NodeId>) -> NodeId {
        self.add(NodeKind::Call { addr, args })
    }

    /// Allocates a return.
    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        self.add(NodeKind::Return { value })
    }

    /// Allocates an unconditional jump.
    pub fn jump(&mut self) -> NodeId {
        self.add(NodeKind::Jump)
    }

    /// Allocates a conditional jump.
    pub fn jump_cond(&mut self, condition: NodeId) -> NodeId {
        self.add(NodeKind::JumpCond { condition })
    }

    /// Allocates a switch over `value` with the given case values.
    pub fn switch(&mut self, value: NodeId, cases: Vec<Cell>) -> NodeId {
        self.add(NodeKind::Switch { value, cases })
    }

    /// Rewrites up to `limit` slots of `user` from `old` to `new`.
    fn rewrite_slots(&mut self, user: NodeId, old: NodeId, new: NodeId, limit: usize) -> usize {
        let mut rewritten = 0;
        for slot in self.nodes[user.index()].kind.operands_mut() {
            if rewritten == limit {
                break;
            }
            if *slot == old {
                *slot = new;
                rewritten += 1;
            }
        }
        rewritten
    }

    /// Removes one use entry of `user` from `of`.
    fn remove_use(&mut self, of: NodeId, user: NodeId) {
        let uses = &mut self.nodes[of.index()].uses;
        let position = uses
            .iter()
            .position(|&u| u == user)
            .unwrap_or_else(|| panic!("{user} is not a use of {of}"));
        uses.remove(position);
    }

    /// Redirects every consumer of `old` to `new`.
    ///
    /// Every operand slot referencing `old` is rewritten, including repeated slots of
    /// one consumer, and the use entries move from `old` to `new`. A consumer equal to
    /// `new` keeps its reference to `old`, so wrapping a node in a new node that uses
    /// it and then redirecting the old node's uses to the wrapper does not create a
    /// cycle.
    ///
    /// # Panics
    ///
    /// Panics if either node is dead, or if the use list of `old` names a consumer
    /// without a matching operand slot.
    pub fn replace_uses_with(&mut self, old: NodeId, new: NodeId) {
        if old == new {
            return;
        }
        assert!(self.is_live(old), "cannot replace uses of dead node {old}");
        assert!(self.is_live(new), "cannot redirect uses to dead node {new}");

        let uses = std::mem::take(&mut self.nodes[old.index()].uses);
        let mut kept = Vec::new();
        let mut rewritten_users = HashSet::new();
        for user in uses {
            if user == new {
                kept.push(user);
                continue;
            }
            if !rewritten_users.insert(user) {
                continue;
            }
            let count = self.rewrite_slots(user, old, new, usize::MAX);
            assert!(count > 0, "{user} is listed as a use of {old} but has no such operand");
            for _ in 0..count {
                self.nodes[new.index()].uses.push(user);
            }
        }
        self.nodes[old.index()].uses = kept;
    }

    /// Rewrites the first operand slot of `node` referencing `old` to `new`.
    ///
    /// # Panics
    ///
    /// Panics if `node` has no operand `old` or `new` is dead.
    pub fn replace_param(&mut self, node: NodeId, old: NodeId, new: NodeId) {
        assert!(self.is_live(new), "cannot use dead node {new} as an operand");
        let count = self.rewrite_slots(node, old, new, 1);
        assert!(count == 1, "{node} has no operand {old}");
        self.remove_use(old, node);
        self.nodes[new.index()].uses.push(node);
    }

    /// Clears the optional slot of `node` holding `old`.
    ///
    /// Only the returned value of a return and the initializer of a local declaration
    /// are optional.
    ///
    /// # Panics
    ///
    /// Panics if `node` has no optional slot holding `old`.
    pub fn remove_param(&mut self, node: NodeId, old: NodeId) {
        match &mut self.nodes[node.index()].kind {
            NodeKind::Return { value } | NodeKind::LocalVar { value, .. } if *value == Some(old) => {
                *value = None;
            }
            kind => panic!("{node} ({}) has no optional operand {old}", kind.name()),
        }
        self.remove_use(old, node);
    }

    /// Attaches `value` as the initializer of the declaration `local`.
    ///
    /// # Panics
    ///
    /// Panics if `local` is not a local declaration without an initializer.
    pub fn set_value(&mut self, local: NodeId, value: NodeId) {
        assert!(self.is_live(value), "cannot use dead node {value} as an initializer");
        match &mut self.nodes[local.index()].kind {
            NodeKind::LocalVar { value: slot @ None, .. } => *slot = Some(value),
            kind => panic!("{local} ({}) is not an uninitialized declaration", kind.name()),
        }
        self.nodes[value.index()].uses.push(local);
    }

    /// Drops every operand edge of `node` and marks it dead.
    ///
    /// Unlinking an already dead node does nothing.
    ///
    /// # Panics
    ///
    /// Panics if `node` still has uses.
    pub fn unlink(&mut self, node: NodeId) {
        if !self.nodes[node.index()].live {
            return;
        }
        assert!(
            self.nodes[node.index()].uses.is_empty(),
            "cannot unlink {node} while it has {} uses",
            self.nodes[node.index()].uses.len()
        );
        for operand in self.nodes[node.index()].kind.operands() {
            self.remove_use(operand, node);
        }
        self.nodes[node.index()].live = false;
    }

    /// Unlinks `node` and every operand subtree left without uses.
    ///
    /// Local declarations reached as operands are never discarded; blocks own them.
    pub fn discard(&mut self, node: NodeId) {
        if !self.is_live(node) || self.num_uses(node) > 0 {
            return;
        }
        let operands = self.kind(node).operands();
        self.unlink(node);
        for operand in operands {
            if !matches!(self.kind(operand), NodeKind::LocalVar { .. }) {
                self.discard(operand);
            }
        }
    }

    /// Returns `!cond`, folding `!!x` back to `x`.
    pub fn negate(&mut self, cond: NodeId) -> NodeId {
        match self.kind(cond) {
            NodeKind::Unary {
                op: UnaryOp::Not,
                value,
            } => *value,
            _ => self.unary(UnaryOp::Not, cond),
        }
    }

    /// Returns the live nodes reachable from `roots` through operand edges,
    /// operands before their consumers, each node once.
    #[must_use]
    pub fn postorder(&self, roots: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<(NodeId, bool)> = Vec::new();
        for root in roots {
            stack.push((root, false));
            while let Some((id, expanded)) = stack.pop() {
                if expanded {
                    order.push(id);
                    continue;
                }
                if !self.is_live(id) || !seen.insert(id) {
                    continue;
                }
                stack.push((id, true));
                for operand in self.kind(id).operands().into_iter().rev() {
                    stack.push((operand, false));
                }
            }
        }
        order
    }

    /// Verifies that operand slots and use lists mirror each other.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GraphError`] describing the first mismatch found.
    pub fn check_use_def(&self) -> Result<()> {
        let mut expected: HashMap<(NodeId, NodeId), usize> = HashMap::new();
        for user in self.live_nodes() {
            for operand in self.kind(user).operands() {
                if !self.is_live(operand) {
                    return Err(GraphError(format!("{user} uses dead node {operand}")));
                }
                *expected.entry((operand, user)).or_default() += 1;
            }
        }

        let mut actual: HashMap<(NodeId, NodeId), usize> = HashMap::new();
        for node in self.live_nodes() {
            for &user in self.uses(node) {
                if !self.is_live(user) {
                    return Err(GraphError(format!("{node} lists dead node {user} as a use")));
                }
                *actual.entry((node, user)).or_default() += 1;
            }
        }

        for (&(operand, user), &count) in &expected {
            let listed = actual.get(&(operand, user)).copied().unwrap_or(0);
            if listed != count {
                return Err(GraphError(format!(
                    "{user} references {operand} {count} times but is listed {listed} times"
                )));
            }
        }
        for (&(node, user), &count) in &actual {
            if !expected.contains_key(&(node, user)) {
                return Err(GraphError(format!(
                    "{node} lists {user} as a use {count} times but is not its operand"
                )));
            }
        }
        Ok(())
    }
}
