//! Region structuring of a fixed CFG into a statement tree.
//!
//! Regions are structured recursively from the entry. Each block becomes a basic
//! statement, an `if`, a `switch` or a loop depending on its terminator and on
//! whether it heads a natural loop; the region continues at the block's merge
//! point until it reaches the region's stop block.
//!
//! Whenever an edge does not fit the nesting, the structurer emits a `goto`
//! instead: re-entering a block that was already emitted, reaching the header or
//! the follow block of an enclosing loop from anywhere but the loop's tail, and
//! leaving the innermost loop. Goto targets that were never emitted are structured
//! after the main body, and only statements some goto references receive a label.

use std::collections::{BTreeSet, HashMap};

use crate::{
    cfg::{BlockId, IlControlFlowGraph, IntervalGraph, NaturalLoop, PostDominatorTree},
    il::{NodeId, NodeKind},
    structure::statement::{CaseStatement, Label, Statement, StatementKind},
    symbols::Cell,
};

/// A loop whose body is being structured.
struct ActiveLoop {
    header: BlockId,
    follow: Option<BlockId>,
    /// Latch holding the exit test of a do/while.
    latch: Option<BlockId>,
    body: BTreeSet<BlockId>,
}

/// The exit test of a loop block.
struct ExitTest {
    condition: NodeId,
    stay: BlockId,
    exit: BlockId,
    stay_on_true: bool,
}

/// Builds the statement tree of one function.
///
/// Structuring may allocate nodes in the function's graph: negated conditions and
/// the constant of `while (1)`.
pub struct Structurer<'a> {
    cfg: &'a mut IlControlFlowGraph,
    post_dominators: PostDominatorTree,
    loops: HashMap<BlockId, NaturalLoop>,
    emitted: Vec<bool>,
    targets: BTreeSet<BlockId>,
    active: Vec<ActiveLoop>,
    always: Option<NodeId>,
}

impl<'a> Structurer<'a> {
    /// Prepares structuring of `cfg`, recomputing dominance and loop information.
    pub fn new(cfg: &'a mut IlControlFlowGraph) -> Self {
        cfg.compute_dominance();
        let post_dominators = cfg.post_dominator_tree();
        let loops = cfg.loops().into_iter().map(|l| (l.header, l)).collect();
        let emitted = vec![false; cfg.num_blocks()];
        Self {
            cfg,
            post_dominators,
            loops,
            emitted,
            targets: BTreeSet::new(),
            active: Vec::new(),
            always: None,
        }
    }

    /// Structures the whole function.
    pub fn structure(mut self) -> Statement {
        if self.cfg.is_empty() {
            return Statement::sequence(Vec::new());
        }
        let reducible = IntervalGraph::is_reducible(self.cfg);
        tracing::debug!(
            blocks = self.cfg.num_blocks(),
            loops = self.loops.len(),
            reducible,
            "structuring function"
        );

        let mut statements = Vec::new();
        let entry = self.cfg.entry();
        self.extend_region(&mut statements, Some(entry), None);
        loop {
            let pending = self
                .targets
                .iter()
                .copied()
                .find(|target| !self.emitted[target.index()]);
            let Some(target) = pending else {
                break;
            };
            tracing::trace!(%target, "structuring goto target outside the main body");
            self.extend_region(&mut statements, Some(target), None);
        }

        let mut root = Statement::sequence(statements);
        let mut pcs: BTreeSet<Cell> = self
            .targets
            .iter()
            .map(|&target| self.cfg.block(target).pc())
            .collect();
        attach_labels(&mut root, &mut pcs);
        tracing::debug!(gotos = root.count("Goto"), labels = self.targets.len(), "structuring finished");
        root
    }

    fn pc(&self, block: BlockId) -> Cell {
        self.cfg.block(block).pc()
    }

    fn structure_region(&mut self, start: BlockId, stop: Option<BlockId>) -> Statement {
        let mut statements = Vec::new();
        self.extend_region(&mut statements, Some(start), stop);
        Statement::sequence(statements)
    }

    fn extend_region(
        &mut self,
        statements: &mut Vec<Statement>,
        mut current: Option<BlockId>,
        stop: Option<BlockId>,
    ) {
        while let Some(block) = current {
            if Some(block) == stop {
                break;
            }
            if let Some(goto) = self.goto_for(block) {
                statements.push(goto);
                break;
            }
            let (statement, next) = self.structure_block(block, stop);
            statements.push(statement);
            current = next;
        }
    }

    /// Returns a goto if control reaching `block` cannot continue structurally.
    fn goto_for(&mut self, block: BlockId) -> Option<Statement> {
        let escapes = self.active.iter().any(|l| l.header == block || l.follow == Some(block))
            || self.active.last().is_some_and(|l| !l.body.contains(&block))
            || self.emitted[block.index()];
        if !escapes {
            return None;
        }
        self.targets.insert(block);
        Some(Statement::goto(Label(self.pc(block))))
    }

    fn structure_block(&mut self, block: BlockId, stop: Option<BlockId>) -> (Statement, Option<BlockId>) {
        if self.loops.contains_key(&block) && !self.active.iter().any(|l| l.header == block) {
            return self.structure_loop(block);
        }
        self.structure_plain(block, stop)
    }

    /// Structures a block by its terminator alone.
    fn structure_plain(&mut self, block: BlockId, stop: Option<BlockId>) -> (Statement, Option<BlockId>) {
        self.emitted[block.index()] = true;
        if self.active.last().is_some_and(|l| l.latch == Some(block)) {
            return (Statement::basic(self.cfg, block), None);
        }

        let terminator = self
            .cfg
            .terminator(block)
            .map(|node| self.cfg.graph().kind(node).clone());
        let succs = self.cfg.block(block).succs().to_vec();
        match (terminator, succs.as_slice()) {
            (Some(NodeKind::JumpCond { condition }), &[then_target, else_target]) => {
                self.structure_if(block, condition, then_target, else_target, stop)
            }
            (Some(NodeKind::Switch { value, cases }), _) => {
                self.structure_switch(block, value, &cases, &succs, stop)
            }
            (_, &[next]) => (Statement::basic(self.cfg, block), Some(next)),
            _ => (Statement::basic(self.cfg, block), None),
        }
    }

    /// Returns the block where the arms of a branch in `block` reconverge, if it
    /// lies in the innermost active loop.
    fn merge_point(&self, block: BlockId) -> Option<BlockId> {
        let merge = self.post_dominators.ipdom(block)?;
        match self.active.last() {
            Some(active) if !active.body.contains(&merge) => None,
            _ => Some(merge),
        }
    }

    /// Prefixes `statement` with the straight-line code of `block`.
    fn with_block_code(&self, block: BlockId, statement: Statement) -> Statement {
        let basic = Statement::basic(self.cfg, block);
        let pc = self.pc(block);
        if basic.is_empty() {
            statement.with_pc(pc)
        } else {
            Statement::sequence(vec![basic, statement]).with_pc(pc)
        }
    }

    fn structure_if(
        &mut self,
        block: BlockId,
        condition: NodeId,
        then_target: BlockId,
        else_target: BlockId,
        stop: Option<BlockId>,
    ) -> (Statement, Option<BlockId>) {
        if then_target == else_target {
            return (Statement::basic(self.cfg, block), Some(then_target));
        }
        let merge = self.merge_point(block);
        let region_stop = merge.or(stop);

        let statement = if Some(then_target) == merge {
            let condition = self.cfg.graph_mut().negate(condition);
            let body = self.structure_region(else_target, region_stop);
            StatementKind::If {
                condition,
                then_branch: Box::new(body),
                else_branch: None,
            }
        } else {
            let then_branch = self.structure_region(then_target, region_stop);
            let else_branch = (Some(else_target) != merge)
                .then(|| Box::new(self.structure_region(else_target, region_stop)));
            StatementKind::If {
                condition,
                then_branch: Box::new(then_branch),
                else_branch,
            }
        };
        (self.with_block_code(block, Statement::new(statement)), merge)
    }

    fn structure_switch(
        &mut self,
        block: BlockId,
        value: NodeId,
        case_values: &[Cell],
        succs: &[BlockId],
        stop: Option<BlockId>,
    ) -> (Statement, Option<BlockId>) {
        let merge = self.merge_point(block);
        let region_stop = merge.or(stop);

        let mut cases = Vec::with_capacity(case_values.len());
        for (&case_value, &target) in case_values.iter().zip(succs) {
            let body = if Some(target) == merge {
                Statement::sequence(Vec::new())
            } else {
                self.structure_region(target, region_stop)
            };
            cases.push(CaseStatement {
                value: case_value,
                body,
            });
        }
        let default_case = succs
            .get(case_values.len())
            .copied()
            .filter(|&target| Some(target) != merge)
            .map(|target| Box::new(self.structure_region(target, region_stop)));

        let statement = Statement::new(StatementKind::Switch {
            value,
            default_case,
            cases,
        });
        (self.with_block_code(block, statement), merge)
    }

    /// Returns the exit test of `block` if it branches to one block inside `body`
    /// and one outside.
    fn exit_test(&self, block: BlockId, body: &BTreeSet<BlockId>) -> Option<ExitTest> {
        let terminator = self.cfg.terminator(block)?;
        let NodeKind::JumpCond { condition } = *self.cfg.graph().kind(terminator) else {
            return None;
        };
        let &[then_target, else_target] = self.cfg.block(block).succs() else {
            return None;
        };
        match (body.contains(&then_target), body.contains(&else_target)) {
            (true, false) => Some(ExitTest {
                condition,
                stay: then_target,
                exit: else_target,
                stay_on_true: true,
            }),
            (false, true) => Some(ExitTest {
                condition,
                stay: else_target,
                exit: then_target,
                stay_on_true: false,
            }),
            _ => None,
        }
    }

    fn loop_condition(&mut self, test: &ExitTest) -> NodeId {
        if test.stay_on_true {
            test.condition
        } else {
            self.cfg.graph_mut().negate(test.condition)
        }
    }

    /// Structures the body of a loop from its header up to the back edges.
    fn structure_loop_body(&mut self, header: BlockId) -> Statement {
        let (first, next) = self.structure_plain(header, Some(header));
        let mut statements = vec![first];
        self.extend_region(&mut statements, next, Some(header));
        Statement::sequence(statements)
    }

    fn structure_loop(&mut self, header: BlockId) -> (Statement, Option<BlockId>) {
        let Some(natural) = self.loops.get(&header) else {
            return self.structure_plain(header, None);
        };
        let body = natural.body.clone();
        let back_edges = natural.back_edges.clone();
        let pc = self.pc(header);

        // while (c): the header holds nothing but the exit test
        if self.cfg.block(header).num_nodes() == 1 {
            if let Some(test) = self.exit_test(header, &body) {
                let condition = self.loop_condition(&test);
                self.emitted[header.index()] = true;
                self.active.push(ActiveLoop {
                    header,
                    follow: Some(test.exit),
                    latch: None,
                    body,
                });
                let body = self.structure_region(test.stay, Some(header));
                self.active.pop();
                let statement = Statement::new(StatementKind::While {
                    condition,
                    body: Box::new(body),
                });
                return (statement.with_pc(pc), Some(test.exit));
            }
        }

        // do { } while (c): the single latch holds the exit test
        if let &[latch] = back_edges.as_slice() {
            if let Some(test) = self.exit_test(latch, &body).filter(|t| t.stay == header) {
                let condition = self.loop_condition(&test);
                self.active.push(ActiveLoop {
                    header,
                    follow: Some(test.exit),
                    latch: Some(latch),
                    body,
                });
                let body = if latch == header {
                    self.emitted[header.index()] = true;
                    Statement::basic(self.cfg, header)
                } else {
                    self.structure_loop_body(header)
                };
                self.active.pop();
                let statement = Statement::new(StatementKind::DoWhile {
                    condition,
                    body: Box::new(body),
                });
                return (statement.with_pc(pc), Some(test.exit));
            }
        }

        // while (1), left through gotos
        let follow = body
            .iter()
            .flat_map(|&block| self.cfg.block(block).succs().to_vec())
            .filter(|succ| !body.contains(succ))
            .min();
        self.active.push(ActiveLoop {
            header,
            follow,
            latch: None,
            body,
        });
        let body = self.structure_loop_body(header);
        self.active.pop();
        let condition = self.always();
        let statement = Statement::new(StatementKind::While {
            condition,
            body: Box::new(body),
        });
        (statement.with_pc(pc), follow)
    }

    fn always(&mut self) -> NodeId {
        match self.always {
            Some(node) => node,
            None => {
                let node = self.cfg.graph_mut().constant(1);
                self.always = Some(node);
                node
            }
        }
    }
}

/// Labels the first statement, in preorder, built from each targeted pc.
fn attach_labels(statement: &mut Statement, pcs: &mut BTreeSet<Cell>) {
    if let Some(pc) = statement.pc {
        if pcs.remove(&pc) {
            statement.label = Some(Label(pc));
        }
    }
    for child in statement.children_mut() {
        attach_labels(child, pcs);
    }
}

/// Structures `cfg` into a statement tree.
///
/// Dominance is recomputed first.
pub fn structure(cfg: &mut IlControlFlowGraph) -> Statement {
    Structurer::new(cfg).structure()
}
