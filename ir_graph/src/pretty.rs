//! Debug rendering of graphs in the textual IR format.

use std::fmt::{self, Display, Formatter, Write};

use crate::{attr, Attribute, BlockId, Graph, NodeId, NodeKind, ValueId};

impl<'ctx> Graph<'ctx> {
    /// `%name`, or `%unique` for unnamed values.
    pub fn display_value(&self, value: ValueId) -> String {
        format!("%{}", self.unique_name(value))
    }

    /// A short reference to `node` for diagnostics: its outputs, or its kind
    /// when it has none.
    pub fn display_node_ref(&self, node: NodeId) -> String {
        let outputs = self.outputs_of(node);
        if outputs.is_empty() {
            format!("{} {node:?}", self.kind(node))
        } else {
            self.display_values(outputs)
        }
    }

    /// The node on its own, nested blocks included.
    pub fn display_node(&self, node: NodeId) -> impl Display + use<'_, 'ctx> {
        DisplayNode { graph: self, node }
    }

    fn display_values(&self, values: &[ValueId]) -> String {
        values
            .iter()
            .map(|&value| self.display_value(value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn write_typed_values(
        &self,
        f: &mut impl Write,
        values: &[ValueId],
        separator: &str,
    ) -> fmt::Result {
        for (i, &value) in values.iter().enumerate() {
            if i > 0 {
                f.write_str(separator)?;
            }
            write!(f, "{} : {}", self.display_value(value), self.ty(value))?;
        }
        Ok(())
    }

    /// Subgraph holders are collected into `groups` when given and printed
    /// by reference.
    fn write_node(
        &self,
        f: &mut impl Write,
        level: usize,
        node: NodeId,
        mut groups: Option<&mut Vec<NodeId>>,
    ) -> fmt::Result {
        indent(f, level)?;
        self.write_typed_values(f, self.outputs_of(node), ", ")?;
        f.write_str(" = ")?;

        let kind = self.kind(node);
        match reborrow(&mut groups) {
            Some(groups) if self.attribute(node, attr::SUBGRAPH).is_some() => {
                write!(f, "{kind}_{}", groups.len())?;
                if kind != NodeKind::DifferentiableGraph {
                    self.write_attributes(f, node, true)?;
                }
                groups.push(node);
            }
            _ => {
                write!(f, "{kind}")?;
                self.write_attributes(f, node, false)?;
            }
        }

        write!(f, "({})", self.display_values(self.inputs_of(node)))?;
        let scope = self.scope_name(node);
        if !scope.is_empty() {
            write!(f, ", scope: {scope}")?;
        }
        f.write_char('\n')?;

        for (i, &block) in self.blocks_of(node).iter().enumerate() {
            indent(f, level + 1)?;
            write!(f, "block{i}(")?;
            self.write_typed_values(f, self.block_inputs(block), ", ")?;
            f.write_str(") {\n")?;
            self.write_block_body(f, level + 2, block, reborrow(&mut groups))?;
            indent(f, level + 2)?;
            writeln!(f, "-> ({})", self.display_values(self.block_outputs(block)))?;
            indent(f, level + 1)?;
            f.write_str("}\n")?;
        }
        Ok(())
    }

    fn write_block_body(
        &self,
        f: &mut impl Write,
        level: usize,
        block: BlockId,
        mut groups: Option<&mut Vec<NodeId>>,
    ) -> fmt::Result {
        for node in self.block_nodes(block) {
            self.write_node(f, level, node, reborrow(&mut groups))?;
        }
        Ok(())
    }

    /// Prints nothing for a node without attributes.
    fn write_attributes(&self, f: &mut impl Write, node: NodeId, skip_subgraph: bool) -> fmt::Result {
        let attributes = self.nodes[node]
            .attributes
            .iter()
            .filter(|(name, _)| !(skip_subgraph && **name == attr::SUBGRAPH))
            .collect::<Vec<_>>();
        if attributes.is_empty() {
            return Ok(());
        }
        f.write_char('[')?;
        for (i, (name, value)) in attributes.into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_char(']')
    }
}

fn reborrow<'a>(groups: &'a mut Option<&mut Vec<NodeId>>) -> Option<&'a mut Vec<NodeId>> {
    groups.as_mut().map(|groups| &mut **groups)
}

fn indent(f: &mut impl Write, level: usize) -> fmt::Result {
    for _ in 0..level {
        f.write_str("  ")?;
    }
    Ok(())
}

impl Display for Graph<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("graph(")?;
        self.write_typed_values(f, self.inputs(), ",\n      ")?;
        f.write_str(") {\n")?;
        let mut groups = Vec::new();
        self.write_block_body(f, 1, self.root, Some(&mut groups))?;
        writeln!(f, "  return ({});", self.display_values(self.outputs()))?;
        f.write_str("}\n")?;
        for (i, group) in groups.into_iter().enumerate() {
            let subgraph = self
                .subgraph(group)
                .expect("only subgraph holders are collected");
            write!(f, "with {}_{i} = {subgraph}", self.kind(group))?;
        }
        Ok(())
    }
}

struct DisplayNode<'a, 'ctx> {
    graph: &'a Graph<'ctx>,
    node: NodeId,
}

impl Display for DisplayNode<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.graph.write_node(f, 0, self.node, None)
    }
}

impl Display for Attribute<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Int(value) => write!(f, "{value}"),
            Attribute::Ints(values) => {
                let values = values.iter().map(i64::to_string).collect::<Vec<_>>();
                write!(f, "[{}]", values.join(", "))
            }
            Attribute::Float(value) => write!(f, "{value:?}"),
            Attribute::String(value) => write!(f, "{value:?}"),
            Attribute::Ty(ty) => write!(f, "{ty}"),
            Attribute::Graph(_) => f.write_str("<Graph>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::with_context;
    use crate::{Attribute, Graph, GraphOptions, NodeKind};

    #[test]
    fn prints_nested_blocks_scopes_and_attributes() {
        with_context(|ctx| {
            let mut g = Graph::new(ctx, GraphOptions::default());
            let cond = g.add_graph_input(ctx.common_types.bool);
            let x = g.add_graph_input(ctx.common_types.dynamic);
            g.set_debug_name(x, "x").unwrap();

            let one = g.create_constant(Attribute::Int(1), ctx.common_types.int);
            g.append_node(one);
            g.push_scope("layer1");
            let if_node = g.create_with_inputs(NodeKind::If, &[cond], 1);
            g.pop_scope();
            g.append_node(if_node);
            let then_block = g.add_block(if_node);
            let else_block = g.add_block(if_node);
            let add = g.create_with_inputs(
                NodeKind::Op(ctx.symbol("aten::add")),
                &[x, x, g.output(one)],
                1,
            );
            g.append_node_to(then_block, add);
            g.register_block_output(then_block, g.output(add));
            g.register_block_output(else_block, x);
            g.register_output(g.output(if_node));

            let expected = "\
graph(%0 : bool,
      %x : Tensor) {
  %2 : int = prim::Constant[value=1]()
  %3 : Tensor = prim::If(%0), scope: layer1
    block0() {
      %4 : Tensor = aten::add(%x, %x, %2)
      -> (%4)
    }
    block1() {
      -> (%x)
    }
  return (%3);
}
";
            assert_eq!(g.to_string(), expected);
            assert_eq!(g.display_node(add).to_string(), "%4 : Tensor = aten::add(%x, %x, %2)\n");
        });
    }

    #[test]
    fn fusion_groups_are_printed_after_the_graph() {
        with_context(|ctx| {
            let mut g = Graph::new(ctx, GraphOptions::default());
            let x = g.add_graph_input(ctx.common_types.dynamic);
            let group = g.create_fusion_group();
            g.add_input(group, x);
            let out = g.add_output(group, ctx.common_types.dynamic);
            g.append_node(group);
            g.register_output(out);

            let subgraph = g.subgraph_mut(group).unwrap();
            let inner = subgraph.add_graph_input(ctx.common_types.dynamic);
            subgraph.register_output(inner);

            let printed = g.to_string();
            assert!(printed.contains("  %1 : Tensor = prim::FusionGroup_0(%0)\n"));
            assert!(printed.ends_with("with prim::FusionGroup_0 = graph(%0 : Tensor) {\n  return (%0);\n}\n"));
        });
    }
}
