//! Source-like text of IL expression trees, for logs and diagnostics.

use std::fmt::Write;

use crate::{
    il::{IlGraph, NodeId, NodeKind},
    symbols::NativeTable,
};

impl IlGraph {
    /// Renders the expression rooted at `id`.
    ///
    /// Variables render as their debug name when one exists, otherwise as
    /// `local_<offset>` or `global_<addr>`. Natives render as `native_<index>`; use
    /// [`render_with`](Self::render_with) to resolve their names.
    #[must_use]
    pub fn render(&self, id: NodeId) -> String {
        self.render_with(id, None)
    }

    /// Renders the expression rooted at `id`, resolving native names from `natives`.
    #[must_use]
    pub fn render_with(&self, id: NodeId, natives: Option<&NativeTable>) -> String {
        let mut out = String::new();
        self.write_expr(&mut out, id, natives, false);
        out
    }

    /// Renders a block-level node as a statement: declarations with their
    /// initializer, stores, control transfers and bare expressions.
    #[must_use]
    pub fn render_statement(&self, id: NodeId, natives: Option<&NativeTable>) -> String {
        match self.kind(id) {
            NodeKind::LocalVar { value, .. } => {
                let ty = self.ty(id).map_or_else(|| "any".to_string(), |ty| ty.to_string());
                match value {
                    Some(value) => format!(
                        "{ty} {} = {}",
                        self.render(id),
                        self.render_with(*value, natives)
                    ),
                    None => format!("{ty} {}", self.render(id)),
                }
            }
            NodeKind::Store { var, value } => format!(
                "{} = {}",
                self.render_with(*var, natives),
                self.render_with(*value, natives)
            ),
            NodeKind::Return { value: Some(value) } => {
                format!("return {}", self.render_with(*value, natives))
            }
            NodeKind::Return { value: None } => "return".to_string(),
            NodeKind::Jump => "goto".to_string(),
            NodeKind::JumpCond { condition } => {
                format!("if ({}) goto", self.render_with(*condition, natives))
            }
            NodeKind::Switch { value, .. } => {
                format!("switch ({})", self.render_with(*value, natives))
            }
            _ => self.render_with(id, natives),
        }
    }

    fn write_expr(&self, out: &mut String, id: NodeId, natives: Option<&NativeTable>, nested: bool) {
        if !self.is_live(id) {
            let _ = write!(out, "<dead {id}>");
            return;
        }
        match self.kind(id) {
            NodeKind::Const { value } => {
                let _ = write!(out, "{value}");
            }
            NodeKind::GlobalVar { addr, symbol } => match symbol {
                Some(symbol) => out.push_str(&symbol.name),
                None => {
                    let _ = write!(out, "global_{addr}");
                }
            },
            NodeKind::LocalVar { offset, symbol, .. } => match symbol {
                Some(symbol) => out.push_str(&symbol.name),
                None => {
                    let _ = write!(out, "local_{}", offset.unsigned_abs());
                }
            },
            NodeKind::ArrayElementVar { base, index } => {
                self.write_expr(out, *base, natives, true);
                out.push('[');
                self.write_expr(out, *index, natives, false);
                out.push(']');
            }
            NodeKind::Load { var } => self.write_expr(out, *var, natives, nested),
            NodeKind::Store { var, value } => {
                if nested {
                    out.push('(');
                }
                self.write_expr(out, *var, natives, false);
                out.push_str(" = ");
                self.write_expr(out, *value, natives, false);
                if nested {
                    out.push(')');
                }
            }
            NodeKind::Unary { op, value } => {
                out.push_str(&op.to_string());
                self.write_expr(out, *value, natives, true);
            }
            NodeKind::Binary { op, left, right } => {
                if nested {
                    out.push('(');
                }
                self.write_expr(out, *left, natives, true);
                let _ = write!(out, " {op} ");
                self.write_expr(out, *right, natives, true);
                if nested {
                    out.push(')');
                }
            }
            NodeKind::Native { index, args } => {
                match natives.and_then(|table| table.get(*index)) {
                    Some(native) => out.push_str(&native.name),
                    None => {
                        let _ = write!(out, "native_{index}");
                    }
                }
                self.write_args(out, args, natives);
            }
            NodeKind::Call { addr, args } => {
                let _ = write!(out, "func_{addr:x}");
                self.write_args(out, args, natives);
            }
            NodeKind::Return { .. }
            | NodeKind::Jump
            | NodeKind::JumpCond { .. }
            | NodeKind::Switch { .. } => out.push_str(&self.render_statement(id, natives)),
        }
    }

    fn write_args(&self, out: &mut String, args: &[NodeId], natives: Option<&NativeTable>) {
        out.push('(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_expr(out, *arg, natives, false);
        }
        out.push(')');
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        il::{BinaryOp, IlGraph, UnaryOp},
        symbols::{DebugSymbol, NativeTable, TypeTag, VarType},
    };

    #[test]
    fn test_render_nested_expression() {
        let mut graph = IlGraph::new();
        let name = graph.named_local(-12, DebugSymbol::new("name", VarType::array(TypeTag::Char, 1)));
        let i = graph.local_var(-16, Some(VarType::INT));
        let i_load = graph.load(i);
        let element = graph.array_element(name, i_load);
        let one = graph.constant(1);
        let sum = graph.binary(BinaryOp::Add, i_load, one);
        let product = graph.binary(BinaryOp::Mul, sum, one);
        let not = graph.unary(UnaryOp::Not, product);

        assert_eq!(graph.render(element), "name[local_16]");
        assert_eq!(graph.render(product), "(local_16 + 1) * 1");
        assert_eq!(graph.render(not), "!((local_16 + 1) * 1)");
    }

    #[test]
    fn test_render_native_names() {
        let mut graph = IlGraph::new();
        let natives: NativeTable = ["PrintToServer"].into_iter().collect();
        let fmt = graph.constant(0);
        let call = graph.native(0, vec![fmt]);
        assert_eq!(graph.render(call), "native_0(0)");
        assert_eq!(graph.render_with(call, Some(&natives)), "PrintToServer(0)");
    }

    #[test]
    fn test_render_declaration() {
        let mut graph = IlGraph::new();
        let x = graph.named_local(-4, DebugSymbol::new("x", VarType::FLOAT));
        let value = graph.constant(2);
        graph.set_value(x, value);
        assert_eq!(graph.render_statement(x, None), "float x = 2");
        let ret = graph.ret(None);
        assert_eq!(graph.render_statement(ret, None), "return");
    }
}
