//! Graphviz export of the IL control flow graph.

use std::fmt::Write;

use crate::{
    cfg::IlControlFlowGraph,
    il::NodeKind,
    utils::escape_dot,
};

impl IlControlFlowGraph {
    /// Renders the CFG in Graphviz DOT format.
    ///
    /// Blocks are labelled with their index and entry pc and list their root nodes
    /// as source-like text. Conditional edges are labelled `true`/`false` and switch
    /// edges `case <v>`/`default`.
    ///
    /// # Arguments
    ///
    /// * `title` - Optional graph title, typically the function name
    #[must_use]
    pub fn to_dot(&self, title: Option<&str>) -> String {
        let mut dot = String::new();

        dot.push_str("digraph CFG {\n");
        if let Some(name) = title {
            let _ = writeln!(dot, "    label=\"CFG: {}\";", escape_dot(name));
        }
        dot.push_str("    labelloc=t;\n");
        dot.push_str("    node [shape=box, fontname=\"Courier\", fontsize=10];\n");
        dot.push_str("    edge [fontname=\"Courier\", fontsize=9];\n\n");

        let graph = self.graph();
        for block in self.blocks() {
            let is_entry = block.id() == self.entry();
            let is_exit = block.succs().is_empty();

            let mut label = format!("B{}_{:04X}", block.id().index(), block.pc());
            if is_entry {
                label.push_str(" (entry)");
            }
            label.push_str("\\l");
            for &node in block.nodes() {
                let _ = write!(label, "{}\\l", escape_dot(&graph.render_statement(node, None)));
            }

            let style = if is_entry {
                ", style=filled, fillcolor=lightgreen"
            } else if is_exit {
                ", style=filled, fillcolor=lightcoral"
            } else {
                ""
            };
            let _ = writeln!(
                dot,
                "    B{}_{:04X} [label=\"{label}\"{style}];",
                block.id().index(),
                block.pc()
            );
        }

        dot.push('\n');

        for block in self.blocks() {
            let terminator = self.terminator(block.id()).map(|node| graph.kind(node));
            for (index, &succ) in block.succs().iter().enumerate() {
                let (edge_label, color) = match terminator {
                    Some(NodeKind::JumpCond { .. }) if index == 0 => ("true".to_string(), "green"),
                    Some(NodeKind::JumpCond { .. }) => ("false".to_string(), "red"),
                    Some(NodeKind::Switch { cases, .. }) => (
                        cases
                            .get(index)
                            .map_or_else(|| "default".to_string(), |v| format!("case {v}")),
                        "blue",
                    ),
                    _ => (String::new(), "black"),
                };
                let target = self.block(succ);
                let _ = writeln!(
                    dot,
                    "    B{}_{:04X} -> B{}_{:04X} [label=\"{}\", color={color}];",
                    block.id().index(),
                    block.pc(),
                    succ.index(),
                    target.pc(),
                    escape_dot(&edge_label)
                );
            }
        }

        dot.push_str("}\n");
        dot
    }
}

#[cfg(test)]
mod tests {
    use crate::cfg::{BlockId, IlControlFlowGraph};

    #[test]
    fn test_to_dot_labels_branches() {
        let mut cfg = IlControlFlowGraph::new(0);
        let entry = cfg.add_block(0x10).unwrap();
        let then_block = cfg.add_block(0x20).unwrap();
        let else_block = cfg.add_block(0x30).unwrap();
        let cond = cfg.graph_mut().constant(1);
        let branch = cfg.graph_mut().jump_cond(cond);
        cfg.append(entry, branch);
        cfg.add_edge(entry, then_block).unwrap();
        cfg.add_edge(entry, else_block).unwrap();

        let dot = cfg.to_dot(Some("OnPluginStart"));
        assert!(dot.starts_with("digraph CFG {"));
        assert!(dot.contains("label=\"CFG: OnPluginStart\""));
        assert!(dot.contains("B0_0010 -> B1_0020 [label=\"true\", color=green]"));
        assert!(dot.contains("B0_0010 -> B2_0030 [label=\"false\", color=red]"));
        assert!(dot.contains("if (1) goto"));
        assert_eq!(cfg.block(BlockId::new(1)).pc(), 0x20);
    }
}
