//! The structured-statement tree.

use std::fmt::{self, Write};

use strum::IntoStaticStr;

use crate::{
    cfg::{BlockId, IlControlFlowGraph},
    il::{IlGraph, NodeId, NodeKind},
    symbols::Cell,
};

/// Jump target name of a statement, derived from the pc of the block it starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub Cell);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "label_{}", self.0)
    }
}

/// The statements of one block, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicStatement {
    /// Entry pc of the block.
    pub pc: Cell,
    /// Root nodes of the block, without the control transfer the tree expresses.
    pub nodes: Vec<NodeId>,
}

/// One arm of a switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseStatement {
    /// Case value.
    pub value: Cell,
    /// Body; empty when the case leaves the switch directly.
    pub body: Statement,
}

/// Shape of a statement.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum StatementKind {
    /// Straight-line code of one block.
    Basic(BasicStatement),
    /// Statements executed in order.
    Sequence(Vec<Statement>),
    /// `if (condition) then_branch else else_branch`
    If {
        /// Branch condition, a node of the function's graph.
        condition: NodeId,
        /// Taken when the condition holds.
        then_branch: Box<Statement>,
        /// Taken otherwise; `None` when nothing happens.
        else_branch: Option<Box<Statement>>,
    },
    /// `while (condition) body`
    While {
        /// Loop condition, tested before every iteration.
        condition: NodeId,
        /// Loop body.
        body: Box<Statement>,
    },
    /// `do body while (condition)`
    DoWhile {
        /// Loop condition, tested after every iteration.
        condition: NodeId,
        /// Loop body.
        body: Box<Statement>,
    },
    /// `switch (value)`
    Switch {
        /// Switched value.
        value: NodeId,
        /// Body of the default arm; `None` when the default falls out of the switch.
        default_case: Option<Box<Statement>>,
        /// Case arms in case-table order.
        cases: Vec<CaseStatement>,
    },
    /// `goto target`
    Goto {
        /// Label of the target statement.
        target: Label,
    },
}

/// A node of the structured-statement tree.
///
/// Statements reference IL nodes of the function's graph; they never own copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Shape and children.
    pub kind: StatementKind,
    /// Label, set only when a goto targets this statement.
    pub label: Option<Label>,
    /// Entry pc of the block this statement was built from, if any.
    pub pc: Option<Cell>,
}

impl Statement {
    /// Creates an unlabelled statement without an originating block.
    #[must_use]
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            label: None,
            pc: None,
        }
    }

    /// Sets the originating pc.
    #[must_use]
    pub fn with_pc(mut self, pc: Cell) -> Self {
        self.pc = Some(pc);
        self
    }

    /// Builds the basic statement of a block.
    ///
    /// The last node is left out when the block branches, jumps or switches, since
    /// the enclosing statement expresses that transfer. A return stays.
    #[must_use]
    pub fn basic(cfg: &IlControlFlowGraph, block: BlockId) -> Self {
        let data = cfg.block(block);
        let mut nodes = data.nodes().to_vec();
        let drop_last = data.num_out_edges() > 1
            || matches!(
                data.last().map(|node| cfg.graph().kind(node)),
                Some(NodeKind::Jump | NodeKind::Switch { .. })
            );
        if drop_last {
            nodes.pop();
        }
        Self::new(StatementKind::Basic(BasicStatement { pc: data.pc(), nodes })).with_pc(data.pc())
    }

    /// Builds a sequence, splicing in nested sequences that carry neither a label
    /// nor a pc.
    #[must_use]
    pub fn sequence(statements: Vec<Statement>) -> Self {
        let mut flat = Vec::with_capacity(statements.len());
        for statement in statements {
            match statement {
                Statement {
                    kind: StatementKind::Sequence(inner),
                    label: None,
                    pc: None,
                } => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Self::new(StatementKind::Sequence(flat))
    }

    /// Builds `goto target`.
    #[must_use]
    pub fn goto(target: Label) -> Self {
        Self::new(StatementKind::Goto { target })
    }

    /// Returns the variant name, e.g. `"DoWhile"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        (&self.kind).into()
    }

    /// Returns `true` for a sequence without statements or a block without nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let empty = match &self.kind {
            StatementKind::Sequence(statements) => statements.iter().all(Statement::is_empty),
            StatementKind::Basic(basic) => basic.nodes.is_empty(),
            _ => false,
        };
        empty && self.label.is_none()
    }

    /// Returns the direct children, in source order.
    #[must_use]
    pub fn children(&self) -> Vec<&Statement> {
        match &self.kind {
            StatementKind::Basic(_) | StatementKind::Goto { .. } => Vec::new(),
            StatementKind::Sequence(statements) => statements.iter().collect(),
            StatementKind::If {
                then_branch,
                else_branch,
                ..
            } => std::iter::once(then_branch.as_ref())
                .chain(else_branch.as_deref())
                .collect(),
            StatementKind::While { body, .. } | StatementKind::DoWhile { body, .. } => {
                vec![body.as_ref()]
            }
            StatementKind::Switch {
                default_case,
                cases,
                ..
            } => cases
                .iter()
                .map(|case| &case.body)
                .chain(default_case.as_deref())
                .collect(),
        }
    }

    pub(crate) fn children_mut(&mut self) -> Vec<&mut Statement> {
        match &mut self.kind {
            StatementKind::Basic(_) | StatementKind::Goto { .. } => Vec::new(),
            StatementKind::Sequence(statements) => statements.iter_mut().collect(),
            StatementKind::If {
                then_branch,
                else_branch,
                ..
            } => std::iter::once(then_branch.as_mut())
                .chain(else_branch.as_deref_mut())
                .collect(),
            StatementKind::While { body, .. } | StatementKind::DoWhile { body, .. } => {
                vec![body.as_mut()]
            }
            StatementKind::Switch {
                default_case,
                cases,
                ..
            } => cases
                .iter_mut()
                .map(|case| &mut case.body)
                .chain(default_case.as_deref_mut())
                .collect(),
        }
    }

    /// Returns this statement and all statements below it, in preorder.
    #[must_use]
    pub fn descendants(&self) -> Vec<&Statement> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(statement) = stack.pop() {
            out.push(statement);
            stack.extend(statement.children().into_iter().rev());
        }
        out
    }

    /// Returns the number of statements named `name` in this tree.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.descendants().into_iter().filter(|s| s.name() == name).count()
    }

    /// Returns the labels of every statement in the tree, in preorder.
    #[must_use]
    pub fn labels(&self) -> Vec<Label> {
        self.descendants().into_iter().filter_map(|s| s.label).collect()
    }

    /// Returns the targets of every goto in the tree, in preorder.
    #[must_use]
    pub fn goto_targets(&self) -> Vec<Label> {
        self.descendants()
            .into_iter()
            .filter_map(|s| match s.kind {
                StatementKind::Goto { target } => Some(target),
                _ => None,
            })
            .collect()
    }

    /// Renders an indented outline of the tree for logs and tests.
    ///
    /// Blocks render one statement per line with
    /// [`IlGraph::render_statement`]; conditions render as expressions.
    #[must_use]
    pub fn outline(&self, graph: &IlGraph) -> String {
        let mut out = String::new();
        self.write_outline(graph, &mut out, 0);
        out
    }

    fn write_outline(&self, graph: &IlGraph, out: &mut String, depth: usize) {
        let pad = "    ".repeat(depth);
        if let Some(label) = self.label {
            let _ = writeln!(out, "{pad}{label}:");
        }
        match &self.kind {
            StatementKind::Basic(basic) => {
                for &node in &basic.nodes {
                    let _ = writeln!(out, "{pad}{}", graph.render_statement(node, None));
                }
            }
            StatementKind::Sequence(statements) => {
                for statement in statements {
                    statement.write_outline(graph, out, depth);
                }
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let _ = writeln!(out, "{pad}if ({})", graph.render(*condition));
                then_branch.write_outline(graph, out, depth + 1);
                if let Some(else_branch) = else_branch {
                    let _ = writeln!(out, "{pad}else");
                    else_branch.write_outline(graph, out, depth + 1);
                }
            }
            StatementKind::While { condition, body } => {
                let _ = writeln!(out, "{pad}while ({})", graph.render(*condition));
                body.write_outline(graph, out, depth + 1);
            }
            StatementKind::DoWhile { condition, body } => {
                let _ = writeln!(out, "{pad}do");
                body.write_outline(graph, out, depth + 1);
                let _ = writeln!(out, "{pad}while ({})", graph.render(*condition));
            }
            StatementKind::Switch {
                value,
                default_case,
                cases,
            } => {
                let _ = writeln!(out, "{pad}switch ({})", graph.render(*value));
                for case in cases {
                    let _ = writeln!(out, "{pad}case {}:", case.value);
                    case.body.write_outline(graph, out, depth + 1);
                }
                if let Some(default_case) = default_case {
                    let _ = writeln!(out, "{pad}default:");
                    default_case.write_outline(graph, out, depth + 1);
                }
            }
            StatementKind::Goto { target } => {
                let _ = writeln!(out, "{pad}goto {target}");
            }
        }
    }
}
