use data_structure::{
    index::{
        slots::IndexSlots,
        vec::{Idx, IndexVec},
    },
    FxHashMap,
};
use schema::FunctionSchema;
use ty::Ty;

use crate::{
    attr, Attribute, BlockData, BlockId, BlockNodes, Context, NodeData, NodeId, NodeKind, ScopeData,
    ScopeId, ValueData, ValueId,
};

/// Handles of the `n`th graph of a context start at `n << HANDLE_RANGE_BITS`,
/// so that a graph can tell its own handles from those of its siblings.
const HANDLE_RANGE_BITS: u32 = usize::BITS / 2;

/// Stride between the positions of consecutively appended nodes.
pub const DEFAULT_APPEND_INTERVAL: i64 = 1 << 40;

/// Largest stride accepted from configuration. Leaves room for `2^15` nodes
/// per block between reindexings.
pub const MAX_APPEND_INTERVAL: i64 = 1 << 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphOptions {
    /// See [`DEFAULT_APPEND_INTERVAL`]. Smaller values make blocks reindex
    /// sooner.
    pub topo_append_interval: i64,
    /// Run [`Graph::lint`] after [`Graph::try_move`] and
    /// [`Graph::destroy_node`].
    pub check_invariants: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            topo_append_interval: DEFAULT_APPEND_INTERVAL,
            check_invariants: false,
        }
    }
}

/// A dataflow graph of typed values and operations.
///
/// The graph owns every node, value and block created through it; everything
/// else refers to them by handle. Handles are never reused, so a handle to a
/// destroyed entity is reported instead of silently addressing a newer one.
/// Handing a graph a handle of another graph of the same context panics.
///
/// Cloning a graph keeps all handles valid in the clone.
#[derive(Clone)]
pub struct Graph<'ctx> {
    pub(crate) ctx: &'ctx Context<'ctx>,
    pub(crate) options: GraphOptions,
    pub(crate) nodes: IndexSlots<NodeId, NodeData<'ctx>>,
    pub(crate) values: IndexSlots<ValueId, ValueData<'ctx>>,
    pub(crate) blocks: IndexSlots<BlockId, BlockData>,
    pub(crate) root: BlockId,
    pub(crate) next_unique: usize,
    pub(crate) unique_names: FxHashMap<String, ValueId>,
    pub(crate) scopes: IndexVec<ScopeId, ScopeData<'ctx>>,
    pub(crate) current_scope: Option<ScopeId>,
}

impl<'ctx> Graph<'ctx> {
    pub fn new(ctx: &'ctx Context<'ctx>, options: GraphOptions) -> Self {
        assert!(
            options.topo_append_interval > 0,
            "append interval must be positive"
        );
        let base = ctx
            .fresh_graph_id()
            .checked_mul(1 << HANDLE_RANGE_BITS)
            .expect("too many graphs in one context");
        let mut graph = Self {
            ctx,
            options,
            nodes: IndexSlots::with_base(base),
            values: IndexSlots::with_base(base),
            blocks: IndexSlots::with_base(base),
            // Replaced right below.
            root: BlockId::new(0),
            next_unique: 0,
            unique_names: FxHashMap::default(),
            scopes: IndexVec::new(),
            current_scope: None,
        };
        graph.root = graph.alloc_block(None);
        graph
    }

    pub fn ctx(&self) -> &'ctx Context<'ctx> {
        self.ctx
    }

    pub fn options(&self) -> GraphOptions {
        self.options
    }

    pub fn root_block(&self) -> BlockId {
        self.root
    }

    /// Inputs of the graph, i.e. of its root block.
    pub fn inputs(&self) -> &[ValueId] {
        self.block_inputs(self.root)
    }

    pub fn outputs(&self) -> &[ValueId] {
        self.block_outputs(self.root)
    }

    pub fn add_graph_input(&mut self, ty: Ty<'ctx>) -> ValueId {
        self.add_block_input(self.root, ty)
    }

    /// Returns the index of the new output.
    pub fn register_output(&mut self, value: ValueId) -> usize {
        self.register_block_output(self.root, value)
    }

    /// Nodes of the root block in order.
    pub fn nodes(&self) -> BlockNodes<'_, 'ctx> {
        self.block_nodes(self.root)
    }

    /// Appends a detached node to the root block.
    pub fn append_node(&mut self, node: NodeId) -> NodeId {
        self.append_node_to(self.root, node)
    }

    pub fn prepend_node(&mut self, node: NodeId) -> NodeId {
        self.prepend_node_to(self.root, node)
    }

    /// Number of live nodes, including sentinels and detached nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(node)
    }

    pub fn contains_value(&self, value: ValueId) -> bool {
        self.values.contains(value)
    }

    pub(crate) fn assert_owns_node(&self, node: NodeId) {
        assert!(self.nodes.owns(node), "{node:?} belongs to another graph");
    }

    pub(crate) fn assert_owns_value(&self, value: ValueId) {
        assert!(self.values.owns(value), "{value:?} belongs to another graph");
    }

    pub(crate) fn alloc_node(&mut self, kind: NodeKind<'ctx>) -> NodeId {
        self.nodes.alloc(NodeData::new(kind, self.current_scope))
    }

    pub(crate) fn alloc_value(&mut self, node: NodeId, offset: usize, ty: Ty<'ctx>) -> ValueId {
        let unique = self.next_unique;
        self.next_unique += 1;
        self.values.alloc(ValueData {
            node,
            offset,
            ty,
            unique,
            name: None,
            uses: Vec::new(),
        })
    }

    pub(crate) fn free_value(&mut self, value: ValueId) {
        self.release_name(value);
        self.values.free(value);
    }

    // Factories. Created nodes are detached until inserted.

    /// Creates a node whose outputs are typed `Tensor`.
    pub fn create(&mut self, kind: NodeKind<'ctx>, num_outputs: usize) -> NodeId {
        let node = self.alloc_node(kind);
        for _ in 0..num_outputs {
            self.add_output(node, self.ctx.common_types.dynamic);
        }
        node
    }

    pub fn create_with_inputs(
        &mut self,
        kind: NodeKind<'ctx>,
        inputs: &[ValueId],
        num_outputs: usize,
    ) -> NodeId {
        let node = self.create(kind, num_outputs);
        for &input in inputs {
            self.add_input(node, input);
        }
        node
    }

    pub fn create_undefined(&mut self) -> NodeId {
        let node = self.create(NodeKind::Undefined, 1);
        self.set_ty(self.output(node), self.ctx.common_types.undefined_tensor);
        node
    }

    /// A `None` usable where `ty?` is expected.
    pub fn create_none(&mut self, ty: Ty<'ctx>) -> NodeId {
        let node = self.create(NodeKind::None, 1);
        let optional = Ty::mk_optional(self.ctx.typing_context(), ty);
        self.set_ty(self.output(node), optional);
        node
    }

    pub fn create_constant(&mut self, value: Attribute<'ctx>, ty: Ty<'ctx>) -> NodeId {
        let node = self.create(NodeKind::Constant, 1);
        self.set_ty(self.output(node), ty);
        self.set_attribute(node, attr::VALUE, value);
        node
    }

    /// A fusion group with an empty subgraph and no outputs.
    pub fn create_fusion_group(&mut self) -> NodeId {
        let node = self.create(NodeKind::FusionGroup, 0);
        let subgraph = Graph::new(self.ctx, self.options);
        self.set_attribute(node, attr::SUBGRAPH, Attribute::Graph(Box::new(subgraph)));
        node
    }

    pub fn create_tuple(&mut self, values: &[ValueId]) -> NodeId {
        let tys = values.iter().map(|&value| self.ty(value)).collect();
        let tuple = Ty::mk_tuple(self.ctx.typing_context(), tys);
        let node = self.create_with_inputs(NodeKind::TupleConstruct, values, 1);
        self.set_ty(self.output(node), tuple);
        node
    }

    pub fn create_tuple_unpack(&mut self, tuple: ValueId) -> NodeId {
        let elems = self.tuple_elements(tuple).to_vec();
        let node = self.create_with_inputs(NodeKind::TupleUnpack, &[tuple], 0);
        for elem in elems {
            self.add_output(node, elem);
        }
        node
    }

    pub fn create_tuple_index(&mut self, tuple: ValueId, index: usize) -> NodeId {
        let elem = *self
            .tuple_elements(tuple)
            .get(index)
            .unwrap_or_else(|| panic!("tuple index {index} out of range for {}", self.ty(tuple)));
        let node = self.create_with_inputs(NodeKind::TupleIndex, &[tuple], 1);
        self.set_attribute(node, attr::INDEX, Attribute::Int(index as i64));
        self.set_ty(self.output(node), elem);
        node
    }

    pub fn create_tuple_slice(&mut self, tuple: ValueId, beg: usize, end: usize) -> NodeId {
        let elems = self
            .tuple_elements(tuple)
            .get(beg..end)
            .unwrap_or_else(|| panic!("tuple slice {beg}..{end} out of range for {}", self.ty(tuple)))
            .to_vec();
        let sliced = Ty::mk_tuple(self.ctx.typing_context(), elems);
        let node = self.create_with_inputs(NodeKind::TupleSlice, &[tuple], 1);
        self.set_attribute(node, attr::BEG, Attribute::Int(beg as i64));
        self.set_attribute(node, attr::END, Attribute::Int(end as i64));
        self.set_ty(self.output(node), sliced);
        node
    }

    pub fn create_list(&mut self, elem: Ty<'ctx>, values: &[ValueId]) -> NodeId {
        for &value in values {
            assert!(
                self.ty(value).is_subtype_of(elem),
                "{} of type {} cannot be an element of {elem}[]",
                self.display_value(value),
                self.ty(value)
            );
        }
        let node = self.create_with_inputs(NodeKind::ListConstruct, values, 1);
        self.set_ty(self.output(node), Ty::mk_list(self.ctx.typing_context(), elem));
        node
    }

    pub fn create_list_unpack(&mut self, list: ValueId, size: usize) -> NodeId {
        let elem = self.ty(list).as_list().unwrap_or_else(|| {
            panic!("{} of type {} is not a list", self.display_value(list), self.ty(list))
        });
        let node = self.create_with_inputs(NodeKind::ListUnpack, &[list], 0);
        for _ in 0..size {
            self.add_output(node, elem);
        }
        node
    }

    /// Clones `node` of `src` into this graph, mapping its inputs through
    /// `value_map`. The clone is detached.
    ///
    /// To clone within one graph, pass a clone of it as `src`.
    pub fn create_clone(
        &mut self,
        src: &Graph<'ctx>,
        node: NodeId,
        value_map: &mut dyn FnMut(ValueId) -> ValueId,
        copy_blocks: bool,
    ) -> NodeId {
        let cloned = self.alloc_node(src.kind(node));
        for &output in src.outputs_of(node) {
            let new_output = self.add_output(cloned, src.ty(output));
            self.copy_metadata_from(new_output, src, output);
        }
        if let Some(scope) = src.nodes[node].scope {
            let scope = self.import_scope(src, scope);
            self.nodes[cloned].scope = Some(scope);
        }
        self.nodes[cloned].attributes = src.nodes[node].attributes.clone();
        for &input in src.inputs_of(node) {
            self.add_input(cloned, value_map(input));
        }
        if copy_blocks {
            for &block in src.blocks_of(node) {
                let new_block = self.add_block(cloned);
                self.clone_block_from(new_block, src, block, value_map);
            }
        }
        cloned
    }

    /// A structurally equal graph with compacted handles.
    pub fn copy(&self) -> Graph<'ctx> {
        let mut copied = Graph::new(self.ctx, self.options);
        let root = copied.root;
        copied.clone_block_from(root, self, self.root, &mut |value: ValueId| -> ValueId {
            panic!("{value:?} is used out of its scope; run lint")
        });
        copied
    }

    fn tuple_elements(&self, tuple: ValueId) -> &'ctx [Ty<'ctx>] {
        self.ty(tuple).kind().as_tuple().unwrap_or_else(|| {
            panic!("{} of type {} is not a tuple", self.display_value(tuple), self.ty(tuple))
        })
    }

    // Scopes.

    /// Nodes created from now on are tagged with a child of the current scope.
    pub fn push_scope(&mut self, name: &str) -> ScopeId {
        let name = self.ctx.intern_str(name);
        let scope = self.child_scope(self.current_scope, name);
        self.current_scope = Some(scope);
        scope
    }

    pub fn pop_scope(&mut self) {
        let scope = self.current_scope.expect("no scope to pop");
        self.current_scope = self.scopes[scope].parent;
    }

    pub fn current_scope(&self) -> Option<ScopeId> {
        self.current_scope
    }

    /// `a/b/c` for a node created in scope `c` pushed inside `b` inside `a`.
    /// Empty when the node has no scope.
    pub fn scope_name(&self, node: NodeId) -> String {
        let mut names = Vec::new();
        let mut scope = self.nodes[node].scope;
        while let Some(current) = scope {
            names.push(self.scopes[current].name);
            scope = self.scopes[current].parent;
        }
        names.reverse();
        names.join("/")
    }

    fn child_scope(&mut self, parent: Option<ScopeId>, name: &'ctx str) -> ScopeId {
        let existing = self
            .scopes
            .iter_enumerated()
            .find(|(_, scope)| scope.parent == parent && scope.name == name)
            .map(|(id, _)| id);
        existing.unwrap_or_else(|| self.scopes.push(ScopeData { parent, name }))
    }

    /// The scope of this graph with the same path as `scope` of `src`.
    fn import_scope(&mut self, src: &Graph<'ctx>, scope: ScopeId) -> ScopeId {
        let parent = src.scopes[scope]
            .parent
            .map(|parent| self.import_scope(src, parent));
        self.child_scope(parent, src.scopes[scope].name)
    }

    // Attributes and schemas.

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&Attribute<'ctx>> {
        self.nodes[node].attributes.get(name)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &'static str, value: Attribute<'ctx>) {
        self.nodes[node].attributes.insert(name, value);
    }

    pub fn attribute_names(
        &self,
        node: NodeId,
    ) -> impl Iterator<Item = &'static str> + use<'_, 'ctx> {
        self.nodes[node].attributes.keys().copied()
    }

    /// The subgraph of a fusion group or differentiable graph.
    pub fn subgraph(&self, node: NodeId) -> Option<&Graph<'ctx>> {
        self.attribute(node, attr::SUBGRAPH)
            .and_then(Attribute::as_graph)
    }

    pub fn subgraph_mut(&mut self, node: NodeId) -> Option<&mut Graph<'ctx>> {
        match self.nodes[node].attributes.get_mut(attr::SUBGRAPH) {
            Some(Attribute::Graph(graph)) => Some(&mut **graph),
            _ => None,
        }
    }

    /// The registered schema matching the node's kind, input types and
    /// number of outputs, if any. Cached until the node is edited.
    pub fn schema(&self, node: NodeId) -> Option<&'ctx FunctionSchema<'ctx>> {
        *self.nodes[node].schema.get_or_init(|| {
            let name = match self.kind(node) {
                NodeKind::Op(symbol) => symbol,
                kind => self.ctx.symbol(&kind.to_string()),
            };
            let inputs = self
                .inputs_of(node)
                .iter()
                .map(|&input| self.ty(input))
                .collect::<Vec<_>>();
            self.ctx.operators().find_schema(
                self.ctx.typing_context(),
                name,
                &inputs,
                self.outputs_of(node).len(),
            )
        })
    }

    pub(crate) fn invalidate_schema(&mut self, node: NodeId) {
        self.nodes[node].schema.take();
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::with_context;
    use crate::{attr, Attribute, Graph, GraphOptions};

    #[test]
    fn tuple_accessors_record_their_bounds() {
        with_context(|ctx| {
            let common = &ctx.common_types;
            let mut g = Graph::new(ctx, GraphOptions::default());
            let a = g.add_graph_input(common.int);
            let b = g.add_graph_input(common.float);
            let c = g.add_graph_input(common.bool);
            let tuple = g.create_tuple(&[a, b, c]);
            g.append_node(tuple);
            let tuple = g.output(tuple);

            let index = g.create_tuple_index(tuple, 1);
            g.append_node(index);
            assert_eq!(g.ty(g.output(index)), common.float);
            assert_eq!(g.attribute_names(index).collect::<Vec<_>>(), [attr::INDEX]);
            assert_eq!(g.attribute(index, attr::INDEX).and_then(Attribute::as_int), Some(1));

            let slice = g.create_tuple_slice(tuple, 1, 3);
            g.append_node(slice);
            let bounds = g
                .attribute_names(slice)
                .map(|name| g.attribute(slice, name).and_then(Attribute::as_int))
                .collect::<Vec<_>>();
            assert_eq!(bounds, [Some(1), Some(3)]);
            assert_eq!(
                g.ty(g.output(slice)).kind().as_tuple(),
                Some(&[common.float, common.bool][..])
            );
            g.lint();
        });
    }
}
