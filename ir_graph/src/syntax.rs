//! Entities of the graph and the handles addressing them.

use std::cell::OnceCell;

use data_structure::{index::Indexable, newtype_index, FxIndexMap};
use schema::{FunctionSchema, Symbol};
use ty::Ty;

use crate::Graph;

newtype_index! {
    /// An operation of a graph.
    pub struct NodeId;
}

newtype_index! {
    /// An output of a node, or an input of a block.
    pub struct ValueId;
}

newtype_index! {
    pub struct BlockId;
}

newtype_index! {
    pub struct ScopeId;
}

impl Indexable<NodeId> for NodeData<'_> {}
impl Indexable<ValueId> for ValueData<'_> {}
impl Indexable<BlockId> for BlockData {}
impl Indexable<ScopeId> for ScopeData<'_> {}

/// What a node computes.
///
/// Structural kinds are the ones the graph and its analyses have rules for;
/// every other operator is an [`NodeKind::Op`] and is described by a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind<'ctx> {
    /// Sentinel defining the inputs of a block.
    Param,
    /// Sentinel using the outputs of a block.
    Return,
    Constant,
    None,
    Undefined,
    ListConstruct,
    ListUnpack,
    TupleConstruct,
    TupleUnpack,
    TupleIndex,
    TupleSlice,
    /// `inputs = [cond]`, `blocks = [then, else]`.
    If,
    /// `inputs = [max_trip_count, cond, carried...]`,
    /// `blocks = [body]` with body inputs `[trip, carried...]` and
    /// body outputs `[cond, carried...]`.
    Loop,
    FusionGroup,
    DifferentiableGraph,
    FusedConcat,
    ConstantChunk,
    PythonOp,
    Op(Symbol<'ctx>),
}

impl NodeKind<'_> {
    pub fn is_sentinel(self) -> bool {
        matches!(self, NodeKind::Param | NodeKind::Return)
    }
}

impl std::fmt::Display for NodeKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prim = match self {
            NodeKind::Param => "Param",
            NodeKind::Return => "Return",
            NodeKind::Constant => "Constant",
            NodeKind::None => "None",
            NodeKind::Undefined => "Undefined",
            NodeKind::ListConstruct => "ListConstruct",
            NodeKind::ListUnpack => "ListUnpack",
            NodeKind::TupleConstruct => "TupleConstruct",
            NodeKind::TupleUnpack => "TupleUnpack",
            NodeKind::TupleIndex => "TupleIndex",
            NodeKind::TupleSlice => "TupleSlice",
            NodeKind::If => "If",
            NodeKind::Loop => "Loop",
            NodeKind::FusionGroup => "FusionGroup",
            NodeKind::DifferentiableGraph => "DifferentiableGraph",
            NodeKind::FusedConcat => "FusedConcat",
            NodeKind::ConstantChunk => "ConstantChunk",
            NodeKind::PythonOp => "PythonOp",
            NodeKind::Op(symbol) => return write!(f, "{symbol}"),
        };
        write!(f, "prim::{prim}")
    }
}

/// The `offset`-th input of `user`.
///
/// A value used twice by one node has two uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Use {
    pub user: NodeId,
    pub offset: usize,
}

impl Use {
    pub fn new(user: NodeId, offset: usize) -> Self {
        Self { user, offset }
    }
}

#[derive(Clone)]
pub struct ValueData<'ctx> {
    /// The defining node.
    pub(crate) node: NodeId,
    pub(crate) offset: usize,
    pub(crate) ty: Ty<'ctx>,
    pub(crate) unique: usize,
    pub(crate) name: Option<String>,
    pub(crate) uses: Vec<Use>,
}

#[derive(Clone)]
pub struct NodeData<'ctx> {
    pub(crate) kind: NodeKind<'ctx>,
    pub(crate) inputs: Vec<ValueId>,
    pub(crate) outputs: Vec<ValueId>,
    pub(crate) blocks: Vec<BlockId>,

    /// `None` while the node is detached. Sentinels always have one.
    pub(crate) owning_block: Option<BlockId>,
    /// Links of the ring closed by the return node of the owning block.
    /// Both are `None` for detached nodes and param nodes.
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) topo_position: i64,

    pub(crate) scope: Option<ScopeId>,
    pub(crate) attributes: FxIndexMap<&'static str, Attribute<'ctx>>,

    /// Cleared by every edit of inputs, outputs and blocks.
    pub(crate) schema: OnceCell<Option<&'ctx FunctionSchema<'ctx>>>,
}

impl<'ctx> NodeData<'ctx> {
    pub(crate) fn new(kind: NodeKind<'ctx>, scope: Option<ScopeId>) -> Self {
        Self {
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            blocks: Vec::new(),
            owning_block: None,
            prev: None,
            next: None,
            topo_position: 0,
            scope,
            attributes: FxIndexMap::default(),
            schema: OnceCell::new(),
        }
    }
}

/// A list of nodes between a param node and a return node.
#[derive(Debug, Clone)]
pub struct BlockData {
    pub(crate) param: NodeId,
    pub(crate) ret: NodeId,
    /// `None` for the root block of a graph.
    pub(crate) owning_node: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ScopeData<'ctx> {
    pub(crate) parent: Option<ScopeId>,
    pub(crate) name: &'ctx str,
}

/// Extra, non-value operands of a node.
#[derive(Clone)]
pub enum Attribute<'ctx> {
    Int(i64),
    Ints(Vec<i64>),
    Float(f64),
    String(String),
    Ty(Ty<'ctx>),
    /// A subgraph, as held by fusion groups.
    Graph(Box<Graph<'ctx>>),
}

impl<'ctx> Attribute<'ctx> {
    pub fn as_int(&self) -> Option<i64> {
        if let Self::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    pub fn as_graph(&self) -> Option<&Graph<'ctx>> {
        if let Self::Graph(graph) = self {
            Some(&**graph)
        } else {
            None
        }
    }
}

/// Well-known attribute names.
pub mod attr {
    pub const SUBGRAPH: &str = "Subgraph";
    pub const VALUE: &str = "value";
    pub const INDEX: &str = "index";
    pub const BEG: &str = "beg";
    pub const END: &str = "end";
}
