use data_structure::FxHashMap;
use ty::Ty;

use crate::{BlockData, BlockId, Graph, NodeId, NodeKind, ValueId};

impl<'ctx> Graph<'ctx> {
    /// Allocates a block with its two sentinels.
    pub(crate) fn alloc_block(&mut self, owning_node: Option<NodeId>) -> BlockId {
        let param = self.alloc_node(NodeKind::Param);
        let ret = self.alloc_node(NodeKind::Return);
        let block = self.blocks.alloc(BlockData {
            param,
            ret,
            owning_node,
        });
        self.init_sentinels(block, param, ret);
        block
    }

    pub fn param_node(&self, block: BlockId) -> NodeId {
        self.blocks[block].param
    }

    pub fn return_node(&self, block: BlockId) -> NodeId {
        self.blocks[block].ret
    }

    /// `None` for the root block.
    pub fn block_owning_node(&self, block: BlockId) -> Option<NodeId> {
        self.blocks[block].owning_node
    }

    pub fn block_inputs(&self, block: BlockId) -> &[ValueId] {
        self.outputs_of(self.param_node(block))
    }

    pub fn block_outputs(&self, block: BlockId) -> &[ValueId] {
        self.inputs_of(self.return_node(block))
    }

    pub fn add_block_input(&mut self, block: BlockId, ty: Ty<'ctx>) -> ValueId {
        self.add_output(self.param_node(block), ty)
    }

    pub fn insert_block_input(&mut self, block: BlockId, i: usize, ty: Ty<'ctx>) -> ValueId {
        self.insert_output(self.param_node(block), i, ty)
    }

    /// Panics if the input is still used.
    pub fn erase_block_input(&mut self, block: BlockId, i: usize) {
        self.erase_output(self.param_node(block), i);
    }

    /// Returns the index of the new output.
    pub fn register_block_output(&mut self, block: BlockId, value: ValueId) -> usize {
        let ret = self.return_node(block);
        self.add_input(ret, value);
        self.inputs_of(ret).len() - 1
    }

    pub fn erase_block_output(&mut self, block: BlockId, i: usize) {
        self.remove_input(self.return_node(block), i);
    }

    pub fn append_node_to(&mut self, block: BlockId, node: NodeId) -> NodeId {
        self.insert_before(node, self.return_node(block))
    }

    pub fn prepend_node_to(&mut self, block: BlockId, node: NodeId) -> NodeId {
        self.insert_after(node, self.return_node(block))
    }

    /// Nodes of `block` in order, sentinels excluded. Use `.rev()` for the
    /// reverse order.
    pub fn block_nodes(&self, block: BlockId) -> BlockNodes<'_, 'ctx> {
        let ret = self.return_node(block);
        BlockNodes {
            graph: self,
            front: self.next(ret),
            back: self.prev(ret),
            ret,
            done: false,
        }
    }

    pub fn first_node(&self, block: BlockId) -> Option<NodeId> {
        self.block_nodes(block).next()
    }

    pub fn last_node(&self, block: BlockId) -> Option<NodeId> {
        self.block_nodes(block).next_back()
    }

    pub(crate) fn destroy_block(&mut self, block: BlockId) {
        let ret = self.return_node(block);
        let param = self.param_node(block);
        // Outputs first: they may use values defined in the block.
        self.remove_all_inputs(ret);
        let nodes = self.block_nodes(block).rev().collect::<Vec<_>>();
        for node in nodes {
            self.destroy_node_unchecked(node);
        }
        self.destroy_sentinel(ret);
        self.destroy_sentinel(param);
        self.blocks.free(block);
    }

    fn destroy_sentinel(&mut self, node: NodeId) {
        while let Some(last) = self.nodes[node].outputs.len().checked_sub(1) {
            self.erase_output(node, last);
        }
        self.nodes.free(node);
    }

    /// Appends clones of the inputs, nodes and outputs of `src_block` of `src`
    /// to `block`. Values defined outside `src_block` are mapped through
    /// `value_map`.
    pub fn clone_block_from(
        &mut self,
        block: BlockId,
        src: &Graph<'ctx>,
        src_block: BlockId,
        value_map: &mut dyn FnMut(ValueId) -> ValueId,
    ) {
        let mut local_map = FxHashMap::default();

        for &input in src.block_inputs(src_block) {
            let new_input = self.add_block_input(block, src.ty(input));
            self.copy_metadata_from(new_input, src, input);
            local_map.insert(input, new_input);
        }

        for node in src.block_nodes(src_block) {
            let mut env = |value: ValueId| match local_map.get(&value) {
                Some(&mapped) => mapped,
                None => value_map(value),
            };
            let new_node = self.create_clone(src, node, &mut env, true);
            self.append_node_to(block, new_node);
            let new_outputs = self.outputs_of(new_node).to_vec();
            local_map.extend(src.outputs_of(node).iter().copied().zip(new_outputs));
        }

        for &output in src.block_outputs(src_block) {
            let mapped = match local_map.get(&output) {
                Some(&mapped) => mapped,
                None => value_map(output),
            };
            self.register_block_output(block, mapped);
        }
    }
}

/// Iterator over the ordinary nodes of a block.
pub struct BlockNodes<'a, 'ctx> {
    graph: &'a Graph<'ctx>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    ret: NodeId,
    done: bool,
}

impl Iterator for BlockNodes<'_, '_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.front.filter(|&node| !self.done && node != self.ret)?;
        if Some(node) == self.back {
            self.done = true;
        }
        self.front = self.graph.next(node);
        Some(node)
    }
}

impl DoubleEndedIterator for BlockNodes<'_, '_> {
    fn next_back(&mut self) -> Option<NodeId> {
        let node = self.back.filter(|&node| !self.done && node != self.ret)?;
        if Some(node) == self.front {
            self.done = true;
        }
        self.back = self.graph.prev(node);
        Some(node)
    }
}
