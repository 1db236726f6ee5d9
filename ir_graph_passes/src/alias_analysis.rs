//! May-alias analysis of graph values.
//!
//! Every value that can hold a reference to mutable memory (tensors, and
//! lists, tuples and optionals that may contain them) gets a set of alias
//! classes. Two values may alias when their sets intersect. Each class keeps
//! the nodes writing to it, so a pass can ask whether anything writes to the
//! memory a node touches before reordering or removing it.
//!
//! The analysis is a snapshot: recompute it after editing the graph.

use std::fmt;

use data_structure::{
    index::{vec::IndexVec, Indexable},
    newtype_index, FxHashMap, FxIndexSet,
};
use ir_graph::{BlockId, Graph, NodeId, NodeKind, ValueId};
use middleware::{GlobalContext, IrOptions};
use ty::{Ty, TyTag};

newtype_index! {
    pub struct ClassId;
}

impl Indexable<ClassId> for ClassData {}

/// A label shared by values that may refer to the same memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AliasClass {
    /// May alias anything. Conflicts with every class.
    Wildcard,
    Class(ClassId),
}

impl fmt::Display for AliasClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasClass::Wildcard => write!(f, "*"),
            AliasClass::Class(id) => write!(f, "{}", id.0),
        }
    }
}

#[derive(Debug, Default)]
struct ClassData {
    writers: FxIndexSet<NodeId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AliasOptions {
    /// Stops loop analysis early. The bound derived from the number of alias
    /// classes always applies.
    pub max_loop_iterations: Option<usize>,
}

impl From<&IrOptions> for AliasOptions {
    fn from(options: &IrOptions) -> Self {
        Self {
            max_loop_iterations: options.max_loop_iterations,
        }
    }
}

/// Whether values of this type can take part in aliasing.
pub fn should_annotate(ty: Ty<'_>) -> bool {
    ty.is_tensor()
        || ty.as_list().is_some()
        || ty.as_tuple().is_some()
        || ty.as_optional().is_some_and(should_annotate)
}

pub struct AliasDb<'a, 'ctx> {
    graph: &'a Graph<'ctx>,
    values: FxHashMap<ValueId, FxIndexSet<AliasClass>>,
    classes: IndexVec<ClassId, ClassData>,
    wildcard_writers: FxIndexSet<NodeId>,
    writers: FxIndexSet<NodeId>,
}

impl<'a, 'ctx> AliasDb<'a, 'ctx> {
    /// Analyzes `graph` with the options of the session.
    pub fn new(ctx: &'ctx GlobalContext<'ctx>, graph: &'a Graph<'ctx>) -> Self {
        Self::with_options(graph, AliasOptions::from(&ctx.session().ir_options))
    }

    pub fn with_options(graph: &'a Graph<'ctx>, options: AliasOptions) -> Self {
        let mut analyzer = Analyzer {
            options,
            classes: IndexVec::new(),
            wildcard_writers: FxIndexSet::default(),
            writers: FxIndexSet::default(),
        };
        let mut frame = Frame::new(graph, None);
        analyzer.analyze_graph_inputs(&mut frame);
        analyzer.analyze_block(&mut frame, graph.root_block());
        log::debug!(
            "{} alias classes, {} writers",
            analyzer.classes.len(),
            analyzer.writers.len()
        );

        Self {
            graph,
            values: frame.values,
            classes: analyzer.classes,
            wildcard_writers: analyzer.wildcard_writers,
            writers: analyzer.writers,
        }
    }

    pub fn graph(&self) -> &'a Graph<'ctx> {
        self.graph
    }

    /// Number of alias classes, the wildcard excluded.
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// `None` for values that cannot alias anything.
    pub fn alias_classes(&self, value: ValueId) -> Option<&FxIndexSet<AliasClass>> {
        self.values.get(&value)
    }

    pub fn may_alias(&self, lhs: ValueId, rhs: ValueId) -> bool {
        let (Some(lhs), Some(rhs)) = (self.alias_classes(lhs), self.alias_classes(rhs)) else {
            return false;
        };
        lhs.contains(&AliasClass::Wildcard)
            || rhs.contains(&AliasClass::Wildcard)
            || !lhs.is_disjoint(rhs)
    }

    /// Whether an input or output of `node` may alias anything.
    pub fn has_wildcard(&self, node: NodeId) -> bool {
        self.node_classes(node)
            .any(|class| class == AliasClass::Wildcard)
    }

    /// Whether `node` writes to memory one of its values may alias. A node
    /// holding a subgraph writes whatever its subgraph writes.
    pub fn has_writes(&self, node: NodeId) -> bool {
        self.writers.contains(&node)
    }

    /// Whether any node writes to memory a value of `node` may alias.
    pub fn has_writers(&self, node: NodeId) -> bool {
        !self.writers_for_node(node).is_empty()
    }

    /// Nodes writing to a class of an input or output of `node`, in the order
    /// they were found. Writes to the wildcard count for every class, and a
    /// node touching the wildcard sees every writer.
    pub fn writers_for_node(&self, node: NodeId) -> FxIndexSet<NodeId> {
        let classes = self.node_classes(node).collect::<FxIndexSet<_>>();
        if classes.is_empty() {
            return FxIndexSet::default();
        }
        if classes.contains(&AliasClass::Wildcard) {
            return self.writers.clone();
        }

        let mut writers = FxIndexSet::default();
        for class in classes {
            if let AliasClass::Class(id) = class {
                writers.extend(self.classes[id].writers.iter().copied());
            }
        }
        writers.extend(self.wildcard_writers.iter().copied());
        writers
    }

    fn node_classes(&self, node: NodeId) -> impl Iterator<Item = AliasClass> + use<'_, 'a, 'ctx> {
        let graph = self.graph;
        graph
            .inputs_of(node)
            .iter()
            .chain(graph.outputs_of(node))
            .filter_map(|value| self.values.get(value))
            .flatten()
            .copied()
    }
}

/// `===1. GRAPH===`, `===2. ALIAS SETS===` and `===3. WRITES===` sections.
impl fmt::Display for AliasDb<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.graph;
        writeln!(f, "===1. GRAPH===")?;
        write!(f, "{graph}")?;

        writeln!(f, "===2. ALIAS SETS===")?;
        let mut values = self.values.iter().collect::<Vec<_>>();
        values.sort_by_key(|(&value, _)| graph.unique(value));
        for (&value, classes) in values {
            let mut classes = classes.iter().copied().collect::<Vec<_>>();
            classes.sort();
            let classes = classes
                .iter()
                .map(AliasClass::to_string)
                .collect::<Vec<_>>();
            writeln!(f, "{} : ({})", graph.display_value(value), classes.join(", "))?;
        }

        writeln!(f, "\n===3. WRITES===")?;
        let classes = std::iter::once((AliasClass::Wildcard, &self.wildcard_writers)).chain(
            self.classes
                .iter_enumerated()
                .map(|(id, data)| (AliasClass::Class(id), &data.writers)),
        );
        for (class, writers) in classes {
            if writers.is_empty() {
                continue;
            }
            writeln!(f, "Alias set {class}:")?;
            for &writer in writers {
                write!(f, "  {}", graph.display_node(writer))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Alias classes of the values of one graph: the analyzed one, or the
/// subgraph of a fusion node.
struct Frame<'a, 'ctx> {
    graph: &'a Graph<'ctx>,
    values: FxHashMap<ValueId, FxIndexSet<AliasClass>>,
    /// The node of the analyzed graph writes of this frame are attributed to.
    owner: Option<NodeId>,
}

impl<'a, 'ctx> Frame<'a, 'ctx> {
    fn new(graph: &'a Graph<'ctx>, owner: Option<NodeId>) -> Self {
        Self {
            graph,
            values: FxHashMap::default(),
            owner,
        }
    }

    fn should_annotate(&self, value: ValueId) -> bool {
        should_annotate(self.graph.ty(value))
    }

    /// A copy of the classes of `value`. `None` if it cannot alias anything.
    fn aliases_of(&self, value: ValueId) -> Option<FxIndexSet<AliasClass>> {
        if !self.should_annotate(value) {
            return None;
        }
        let classes = self.values.get(&value).unwrap_or_else(|| {
            panic!(
                "{} is used before it was given alias classes",
                self.graph.display_value(value)
            )
        });
        Some(classes.clone())
    }

    fn add_classes(&mut self, value: ValueId, classes: impl IntoIterator<Item = AliasClass>) {
        if self.should_annotate(value) {
            self.values.entry(value).or_default().extend(classes);
        }
    }

    /// Unions `from`, the classes of another value, into those of `value`.
    fn alias_from(&mut self, value: ValueId, from: Option<FxIndexSet<AliasClass>>) {
        if !self.should_annotate(value) {
            assert!(
                from.is_none(),
                "{} of type {} cannot take the alias classes of a mutable value",
                self.graph.display_value(value),
                self.graph.ty(value)
            );
            return;
        }
        self.add_classes(value, from.unwrap_or_default());
    }

    fn map_aliases(&mut self, to: &[ValueId], from: Vec<Option<FxIndexSet<AliasClass>>>) {
        assert_eq!(to.len(), from.len(), "mismatched value counts");
        for (&value, from) in to.iter().zip(from) {
            self.alias_from(value, from);
        }
    }

    fn collect_aliases(&self, values: &[ValueId]) -> Vec<Option<FxIndexSet<AliasClass>>> {
        values.iter().map(|&value| self.aliases_of(value)).collect()
    }
}

/// State shared by all frames of one analysis.
struct Analyzer {
    options: AliasOptions,
    classes: IndexVec<ClassId, ClassData>,
    wildcard_writers: FxIndexSet<NodeId>,
    writers: FxIndexSet<NodeId>,
}

impl Analyzer {
    fn fresh_class(&mut self) -> AliasClass {
        AliasClass::Class(self.classes.push(ClassData::default()))
    }

    /// Values inside a loop body are visited once per iteration but keep the
    /// class they got first.
    fn give_fresh(&mut self, frame: &mut Frame<'_, '_>, value: ValueId) {
        if frame.values.contains_key(&value) || !frame.should_annotate(value) {
            return;
        }
        let class = self.fresh_class();
        frame.add_classes(value, [class]);
    }

    fn record_write(&mut self, frame: &Frame<'_, '_>, node: NodeId, class: AliasClass) {
        let writer = frame.owner.unwrap_or(node);
        log::trace!(
            "{} writes to alias class {class}",
            frame.graph.display_node_ref(node)
        );
        match class {
            AliasClass::Wildcard => self.wildcard_writers.insert(writer),
            AliasClass::Class(id) => self.classes[id].writers.insert(writer),
        };
        self.writers.insert(writer);
    }

    /// Inputs of one kind may alias each other: all tensors share a class,
    /// lists share one per element type and tuples one per tuple type.
    fn analyze_graph_inputs<'ctx>(&mut self, frame: &mut Frame<'_, 'ctx>) {
        let graph = frame.graph;
        let tensor_class = self.fresh_class();
        let mut list_classes: FxHashMap<TyTag, AliasClass> = FxHashMap::default();
        let mut tuple_classes: FxHashMap<Ty<'ctx>, AliasClass> = FxHashMap::default();

        for &input in graph.inputs() {
            let ty = graph.ty(input);
            let ty = ty.as_optional().unwrap_or(ty);
            if ty.is_tensor() {
                frame.add_classes(input, [tensor_class]);
            } else if let Some(elem) = ty.as_list() {
                let tag = if elem.is_tensor() {
                    TyTag::Dynamic
                } else {
                    elem.tag()
                };
                let class = *list_classes
                    .entry(tag)
                    .or_insert_with(|| self.fresh_class());
                frame.add_classes(input, [class]);
            } else if ty.as_tuple().is_some() {
                let class = *tuple_classes
                    .entry(ty)
                    .or_insert_with(|| self.fresh_class());
                frame.add_classes(input, [class]);
            } else {
                assert!(
                    !frame.should_annotate(input),
                    "no alias rule for graph input {} of type {}",
                    graph.display_value(input),
                    graph.ty(input)
                );
            }
        }
    }

    fn analyze_block(&mut self, frame: &mut Frame<'_, '_>, block: BlockId) {
        let graph = frame.graph;
        for node in graph.block_nodes(block) {
            self.analyze_node(frame, node);
        }
    }

    fn analyze_node(&mut self, frame: &mut Frame<'_, '_>, node: NodeId) {
        let graph = frame.graph;
        log::trace!("analyzing {} ({})", graph.display_node_ref(node), graph.kind(node));
        match graph.kind(node) {
            NodeKind::If => self.analyze_if(frame, node),
            NodeKind::Loop => self.analyze_loop(frame, node),
            NodeKind::FusionGroup | NodeKind::DifferentiableGraph => {
                self.analyze_subgraph(frame, node)
            }
            NodeKind::Constant
            | NodeKind::None
            | NodeKind::Undefined
            | NodeKind::ListConstruct
            | NodeKind::TupleConstruct
            | NodeKind::FusedConcat => self.analyze_creator(frame, node),
            NodeKind::TupleUnpack
            | NodeKind::TupleIndex
            | NodeKind::TupleSlice
            | NodeKind::ListUnpack
            | NodeKind::PythonOp => self.analyze_extractor(frame, node),
            NodeKind::ConstantChunk => self.analyze_chunk(frame, node),
            // Mixes of tensors and scalars may lack a schema.
            NodeKind::Op(symbol)
                if matches!(
                    symbol.as_str(),
                    "aten::add" | "aten::sub" | "aten::mul" | "aten::div"
                ) && graph.schema(node).is_none() =>
            {
                self.analyze_creator(frame, node)
            }
            NodeKind::Op(_) => self.analyze_schematized(frame, node),
            NodeKind::Param | NodeKind::Return => {
                unreachable!("sentinels are not part of block bodies")
            }
        }
    }

    /// Binds the alias annotations of the schema to the classes of the
    /// inputs and gives the outputs the classes bound to their annotations.
    fn analyze_schematized(&mut self, frame: &mut Frame<'_, '_>, node: NodeId) {
        let graph = frame.graph;
        let has_mutable_outputs = graph
            .outputs_of(node)
            .iter()
            .any(|&output| frame.should_annotate(output));
        let schema = match graph.schema(node) {
            Some(schema) if !schema.is_vararg && !schema.is_varret => schema,
            schema => {
                assert!(
                    !has_mutable_outputs,
                    "alias information not found for {} ({}): register a schema for it",
                    graph.display_node_ref(node),
                    graph.kind(node)
                );
                match schema {
                    Some(schema) => schema,
                    None => return,
                }
            }
        };

        let mut formal_to_actual = FxHashMap::default();
        formal_to_actual.insert(
            schema::FormalAliasSet::Wildcard,
            FxIndexSet::from_iter([AliasClass::Wildcard]),
        );
        for (formal, &actual) in schema.arguments.iter().zip(graph.inputs_of(node)) {
            let Some(alias_info) = &formal.alias_info else {
                continue;
            };
            assert!(
                alias_info.contained_types.is_empty(),
                "alias annotations of element types are not supported: {schema}"
            );
            assert!(
                !alias_info.is_wildcard(),
                "inputs cannot be annotated as wildcards: {schema}"
            );
            let formal_set = alias_info.set();
            if formal_to_actual.contains_key(&formal_set) {
                continue;
            }

            let classes = frame.aliases_of(actual).unwrap_or_default();
            if alias_info.is_write {
                for &class in &classes {
                    self.record_write(frame, node, class);
                }
            }
            formal_to_actual.insert(formal_set, classes);
        }

        for (formal, &output) in schema.returns.iter().zip(graph.outputs_of(node)) {
            let Some(alias_info) = &formal.alias_info else {
                self.give_fresh(frame, output);
                continue;
            };
            assert!(
                alias_info.contained_types.is_empty(),
                "alias annotations of element types are not supported: {schema}"
            );
            let classes = formal_to_actual
                .get(&alias_info.set())
                .unwrap_or_else(|| {
                    panic!("return annotation ({alias_info}) is not bound by any input: {schema}")
                })
                .clone();
            if alias_info.is_write {
                for &class in &classes {
                    self.record_write(frame, node, class);
                }
            }
            frame.add_classes(output, classes);
        }
    }

    /// Outputs may alias the outputs of either branch.
    fn analyze_if(&mut self, frame: &mut Frame<'_, '_>, node: NodeId) {
        let graph = frame.graph;
        let &[then_block, else_block] = graph.blocks_of(node) else {
            panic!("{} does not have two blocks", graph.display_node_ref(node));
        };
        self.analyze_block(frame, then_block);
        self.analyze_block(frame, else_block);

        for (i, &output) in graph.outputs_of(node).iter().enumerate() {
            for block in [then_block, else_block] {
                let from = frame.aliases_of(graph.block_outputs(block)[i]);
                frame.alias_from(output, from);
            }
        }
    }

    /// Iterates the body until the classes of the carried values stop
    /// growing. Sets only grow and no class is created twice for a value,
    /// which bounds the number of iterations.
    fn analyze_loop(&mut self, frame: &mut Frame<'_, '_>, node: NodeId) {
        let graph = frame.graph;
        let &[body] = graph.blocks_of(node) else {
            panic!("{} does not have exactly one block", graph.display_node_ref(node));
        };
        // Skip the trip count and the condition.
        let carried = graph.inputs_of(node).get(2..).unwrap_or_else(|| {
            panic!("{} lacks its trip count or condition", graph.display_node_ref(node))
        });
        let body_inputs = &graph.block_inputs(body)[1..];
        let body_outputs = &graph.block_outputs(body)[1..];
        let outputs = graph.outputs_of(node);
        assert_eq!(carried.len(), body_inputs.len());
        assert_eq!(body_outputs.len(), outputs.len());

        let mut iterations = 0;
        loop {
            iterations += 1;
            let bound = carried.len() * (self.classes.len() + 1) + 1;
            assert!(
                iterations <= bound,
                "alias analysis of {} did not converge within {bound} iterations",
                graph.display_node_ref(node)
            );
            if let Some(max) = self.options.max_loop_iterations {
                assert!(
                    iterations <= max,
                    "alias analysis of {} did not converge within {max} iterations",
                    graph.display_node_ref(node)
                );
            }

            let snapshot = frame.collect_aliases(carried);
            frame.map_aliases(body_inputs, snapshot.clone());
            self.analyze_block(frame, body);

            // A loop running zero times yields its initial values.
            frame.map_aliases(outputs, snapshot.clone());
            frame.map_aliases(outputs, frame.collect_aliases(body_outputs));
            frame.map_aliases(carried, frame.collect_aliases(body_outputs));

            if frame.collect_aliases(carried) == snapshot {
                break;
            }
        }
        log::debug!(
            "alias analysis of {} converged after {iterations} iterations",
            graph.display_node_ref(node)
        );
    }

    fn analyze_subgraph(&mut self, frame: &mut Frame<'_, '_>, node: NodeId) {
        let graph = frame.graph;
        let subgraph = graph
            .subgraph(node)
            .unwrap_or_else(|| panic!("{} has no subgraph", graph.display_node_ref(node)));
        let mut inner = Frame::new(subgraph, Some(frame.owner.unwrap_or(node)));

        inner.map_aliases(subgraph.inputs(), frame.collect_aliases(graph.inputs_of(node)));
        self.analyze_block(&mut inner, subgraph.root_block());
        frame.map_aliases(graph.outputs_of(node), inner.collect_aliases(subgraph.outputs()));
    }

    /// The outputs are new memory.
    fn analyze_creator(&mut self, frame: &mut Frame<'_, '_>, node: NodeId) {
        for &output in frame.graph.outputs_of(node) {
            self.give_fresh(frame, output);
        }
    }

    /// The outputs come out of a container and may alias anything.
    fn analyze_extractor(&mut self, frame: &mut Frame<'_, '_>, node: NodeId) {
        for &output in frame.graph.outputs_of(node) {
            frame.add_classes(output, [AliasClass::Wildcard]);
        }
    }

    /// Every chunk is a view of the input.
    fn analyze_chunk(&mut self, frame: &mut Frame<'_, '_>, node: NodeId) {
        let graph = frame.graph;
        let from = frame.aliases_of(graph.input(node));
        for &output in graph.outputs_of(node) {
            frame.alias_from(output, from.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use ir_graph::{Graph, NodeId, NodeKind, ValueId};
    use middleware::{Arena, GlobalContext, Session};

    use super::*;

    fn op<'ctx>(
        g: &mut Graph<'ctx>,
        name: &str,
        inputs: &[ValueId],
        output: Ty<'ctx>,
    ) -> NodeId {
        let kind = NodeKind::Op(g.ctx().symbol(name));
        let node = g.create_with_inputs(kind, inputs, 1);
        g.set_ty(g.output(node), output);
        g.append_node(node)
    }

    #[test]
    fn graph_inputs_share_a_class_per_type() {
        let arena = Arena::default();
        let ctx = GlobalContext::new(&arena, Session::default());
        let common = ctx.common_types();
        let tcx = ctx.typing_context();
        let mut g = ctx.new_graph();

        let x = g.add_graph_input(common.dynamic);
        let y = g.add_graph_input(Ty::mk_tensor(tcx, 2));
        let maybe = g.add_graph_input(Ty::mk_optional(tcx, common.dynamic));
        let ints = g.add_graph_input(Ty::mk_list(tcx, common.int));
        let more_ints = g.add_graph_input(Ty::mk_list(tcx, common.int));
        let floats = g.add_graph_input(Ty::mk_list(tcx, common.float));
        let tensors = g.add_graph_input(Ty::mk_list(tcx, Ty::mk_tensor(tcx, 1)));
        let dynamics = g.add_graph_input(Ty::mk_list(tcx, common.dynamic));
        let pair = g.add_graph_input(Ty::mk_tuple(tcx, vec![common.int, common.dynamic]));
        let same_pair = g.add_graph_input(Ty::mk_tuple(tcx, vec![common.int, common.dynamic]));
        let other_pair = g.add_graph_input(Ty::mk_tuple(tcx, vec![common.dynamic]));
        let n = g.add_graph_input(common.int);

        let db = AliasDb::new(&ctx, &g);
        assert!(db.may_alias(x, y));
        assert!(db.may_alias(x, maybe));
        assert!(db.may_alias(ints, more_ints));
        assert!(!db.may_alias(ints, floats));
        assert!(db.may_alias(tensors, dynamics));
        assert!(!db.may_alias(tensors, x));
        assert!(db.may_alias(pair, same_pair));
        assert!(!db.may_alias(pair, other_pair));
        assert_eq!(db.alias_classes(n), None);
        assert!(!db.may_alias(n, n));
    }

    #[test]
    fn unannotated_returns_are_fresh_and_annotated_ones_alias() {
        let arena = Arena::default();
        let ctx = GlobalContext::new(&arena, Session::default());
        ctx.register_operators([
            "aten::relu(Tensor self) -> Tensor",
            "aten::select(Tensor(a) self, int dim, int index) -> Tensor(a)",
            "aten::size(Tensor self, int dim) -> int",
        ])
        .unwrap();
        let common = ctx.common_types();
        let mut g = ctx.new_graph();
        let x = g.add_graph_input(common.dynamic);
        let i = g.add_graph_input(common.int);

        let relu = op(&mut g, "aten::relu", &[x], common.dynamic);
        let relu_out = g.output(relu);
        let select = op(&mut g, "aten::select", &[relu_out, i, i], common.dynamic);
        let size = op(&mut g, "aten::size", &[x, i], common.int);

        let db = AliasDb::new(&ctx, &g);
        assert!(!db.may_alias(x, g.output(relu)));
        assert!(db.may_alias(g.output(relu), g.output(select)));
        assert_eq!(db.alias_classes(g.output(size)), None);
        assert!(!db.has_writes(select));
        assert!(!db.has_writers(select));
        assert!(!db.has_wildcard(select));
    }

    #[test]
    fn structural_kinds_follow_their_rules() {
        let arena = Arena::default();
        let ctx = GlobalContext::new(&arena, Session::default());
        let common = ctx.common_types();
        let mut g = ctx.new_graph();
        let x = g.add_graph_input(common.dynamic);
        let y = g.add_graph_input(common.dynamic);

        let tuple = g.create_tuple(&[x, y]);
        g.append_node(tuple);
        let unpack = g.create_tuple_unpack(g.output(tuple));
        g.append_node(unpack);
        let chunk = g.create_with_inputs(NodeKind::ConstantChunk, &[x], 2);
        g.append_node(chunk);
        let undefined = g.create_undefined();
        g.append_node(undefined);
        // No schema is registered for these.
        let add = op(&mut g, "aten::add", &[x, y], common.dynamic);
        let python = g.create_with_inputs(NodeKind::PythonOp, &[x], 1);
        g.append_node(python);

        let db = AliasDb::new(&ctx, &g);
        assert!(!db.may_alias(g.output(tuple), x));
        assert!(db.has_wildcard(unpack));
        assert!(!db.has_wildcard(tuple));
        assert!(db.may_alias(g.outputs_of(unpack)[0], g.output(undefined)));
        for &output in g.outputs_of(chunk) {
            assert_eq!(db.alias_classes(output), db.alias_classes(x));
        }
        assert!(!db.may_alias(g.output(undefined), x));
        assert!(!db.may_alias(g.output(add), x));
        assert!(!db.may_alias(g.output(add), g.output(undefined)));
        assert!(db.has_wildcard(python));
    }

    #[test]
    #[should_panic(expected = "alias information not found")]
    fn mutable_output_without_a_rule_is_fatal() {
        let arena = Arena::default();
        let ctx = GlobalContext::new(&arena, Session::default());
        let common = ctx.common_types();
        let mut g = ctx.new_graph();
        let x = g.add_graph_input(common.dynamic);
        op(&mut g, "aten::mystery", &[x], common.dynamic);
        AliasDb::new(&ctx, &g);
    }

    #[test]
    fn unschematized_scalar_nodes_are_skipped() {
        let arena = Arena::default();
        let ctx = GlobalContext::new(&arena, Session::default());
        ctx.register_operator("aten::format(str self, ...) -> str").unwrap();
        let common = ctx.common_types();
        let mut g = ctx.new_graph();
        let x = g.add_graph_input(common.dynamic);
        let s = g.add_graph_input(common.string);
        let dim = op(&mut g, "aten::dim", &[x], common.int);
        let format = op(&mut g, "aten::format", &[s, x], common.string);

        let db = AliasDb::new(&ctx, &g);
        assert!(!db.has_writes(dim));
        assert!(!db.has_writes(format));
        assert_eq!(db.alias_classes(g.output(dim)), None);
    }

    #[test]
    fn dump_lists_sets_and_writers() {
        let arena = Arena::default();
        let ctx = GlobalContext::new(&arena, Session::default());
        ctx.register_operator("aten::relu_(Tensor(a!) self) -> Tensor(a!)")
            .unwrap();
        let common = ctx.common_types();
        let mut g = ctx.new_graph();
        let x = g.add_graph_input(common.dynamic);
        g.set_debug_name(x, "x").unwrap();
        op(&mut g, "aten::relu_", &[x], common.dynamic);

        let dump = AliasDb::new(&ctx, &g).to_string();
        let expected = "\
===1. GRAPH===
graph(%x : Tensor) {
  %1 : Tensor = aten::relu_(%x)
  return ();
}
===2. ALIAS SETS===
%x : (0)
%1 : (0)

===3. WRITES===
Alias set 0:
  %1 : Tensor = aten::relu_(%x)

";
        assert_eq!(dump, expected);
    }
}
