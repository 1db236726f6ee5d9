//! Node accessors and the edits of inputs, outputs and blocks.
//!
//! Every edit keeps the use lists of values consistent with the inputs of
//! their users.

use ty::Ty;

use crate::{BlockId, Graph, NodeId, NodeKind, ScopeId, Use, ValueId};

impl<'ctx> Graph<'ctx> {
    pub fn kind(&self, node: NodeId) -> NodeKind<'ctx> {
        self.nodes[node].kind
    }

    pub fn inputs_of(&self, node: NodeId) -> &[ValueId] {
        &self.nodes[node].inputs
    }

    pub fn outputs_of(&self, node: NodeId) -> &[ValueId] {
        &self.nodes[node].outputs
    }

    pub fn blocks_of(&self, node: NodeId) -> &[BlockId] {
        &self.nodes[node].blocks
    }

    /// The only input of `node`.
    pub fn input(&self, node: NodeId) -> ValueId {
        let inputs = self.inputs_of(node);
        assert_eq!(inputs.len(), 1, "{node:?} has {} inputs", inputs.len());
        inputs[0]
    }

    /// The only output of `node`.
    pub fn output(&self, node: NodeId) -> ValueId {
        let outputs = self.outputs_of(node);
        assert_eq!(outputs.len(), 1, "{node:?} has {} outputs", outputs.len());
        outputs[0]
    }

    pub fn scope(&self, node: NodeId) -> Option<ScopeId> {
        self.nodes[node].scope
    }

    pub fn add_input(&mut self, node: NodeId, value: ValueId) -> ValueId {
        self.assert_owns_node(node);
        self.assert_owns_value(value);
        self.invalidate_schema(node);
        let offset = self.nodes[node].inputs.len();
        self.values[value].uses.push(Use::new(node, offset));
        self.nodes[node].inputs.push(value);
        value
    }

    pub fn insert_input(&mut self, node: NodeId, i: usize, value: ValueId) -> ValueId {
        self.assert_owns_node(node);
        self.assert_owns_value(value);
        self.invalidate_schema(node);
        // Inputs at `i..` shift right by one.
        for offset in (i..self.nodes[node].inputs.len()).rev() {
            let (input, use_index) = self.find_use_for_input(node, offset);
            self.values[input].uses[use_index].offset += 1;
        }
        self.nodes[node].inputs.insert(i, value);
        self.values[value].uses.push(Use::new(node, i));
        value
    }

    /// Returns the replaced value.
    pub fn replace_input(&mut self, node: NodeId, i: usize, value: ValueId) -> ValueId {
        self.assert_owns_node(node);
        self.assert_owns_value(value);
        self.invalidate_schema(node);
        let old = self.drop_input(node, i);
        self.nodes[node].inputs[i] = value;
        self.values[value].uses.push(Use::new(node, i));
        old
    }

    /// Replaces every occurrence of `from` among the inputs of `node`.
    pub fn replace_input_with(&mut self, node: NodeId, from: ValueId, to: ValueId) {
        self.invalidate_schema(node);
        for i in 0..self.nodes[node].inputs.len() {
            if self.nodes[node].inputs[i] == from {
                self.replace_input(node, i, to);
            }
        }
    }

    pub fn remove_input(&mut self, node: NodeId, i: usize) {
        self.invalidate_schema(node);
        self.drop_input(node, i);
        // Inputs after `i` shift left by one.
        for offset in i + 1..self.nodes[node].inputs.len() {
            let (input, use_index) = self.find_use_for_input(node, offset);
            self.values[input].uses[use_index].offset -= 1;
        }
        self.nodes[node].inputs.remove(i);
    }

    pub fn remove_all_inputs(&mut self, node: NodeId) {
        self.invalidate_schema(node);
        for i in 0..self.nodes[node].inputs.len() {
            self.drop_input(node, i);
        }
        self.nodes[node].inputs.clear();
    }

    /// Removes the use of input `i` and returns the input. The slot itself is
    /// left for the caller to overwrite or remove.
    fn drop_input(&mut self, node: NodeId, i: usize) -> ValueId {
        assert!(
            i < self.nodes[node].inputs.len(),
            "{node:?} has no input {i}"
        );
        let (input, use_index) = self.find_use_for_input(node, i);
        self.values[input].uses.remove(use_index);
        input
    }

    /// The input `i` of `node` and the index of the matching use in its use
    /// list.
    fn find_use_for_input(&self, node: NodeId, i: usize) -> (ValueId, usize) {
        let input = self.nodes[node].inputs[i];
        let use_index = self.values[input]
            .uses
            .iter()
            .position(|u| *u == Use::new(node, i))
            .unwrap_or_else(|| {
                panic!(
                    "input {i} of {} ({}) is missing from the uses of {}",
                    self.display_node_ref(node),
                    self.kind(node),
                    self.display_value(input)
                )
            });
        (input, use_index)
    }

    pub fn add_output(&mut self, node: NodeId, ty: Ty<'ctx>) -> ValueId {
        self.invalidate_schema(node);
        let offset = self.nodes[node].outputs.len();
        let value = self.alloc_value(node, offset, ty);
        self.nodes[node].outputs.push(value);
        value
    }

    pub fn insert_output(&mut self, node: NodeId, i: usize, ty: Ty<'ctx>) -> ValueId {
        self.invalidate_schema(node);
        let value = self.alloc_value(node, i, ty);
        self.nodes[node].outputs.insert(i, value);
        for offset in i + 1..self.nodes[node].outputs.len() {
            let output = self.nodes[node].outputs[offset];
            self.values[output].offset = offset;
        }
        value
    }

    /// Panics if the output still has uses.
    pub fn erase_output(&mut self, node: NodeId, i: usize) {
        self.invalidate_schema(node);
        let output = *self.nodes[node]
            .outputs
            .get(i)
            .unwrap_or_else(|| panic!("{node:?} has no output {i}"));
        assert!(
            self.values[output].uses.is_empty(),
            "cannot erase {} of {}: it still has {} uses",
            self.display_value(output),
            self.kind(node),
            self.values[output].uses.len()
        );
        self.nodes[node].outputs.remove(i);
        self.free_value(output);
        for offset in i..self.nodes[node].outputs.len() {
            let output = self.nodes[node].outputs[offset];
            self.values[output].offset = offset;
        }
    }

    /// Adds an empty block owned by `node`.
    pub fn add_block(&mut self, node: NodeId) -> BlockId {
        self.invalidate_schema(node);
        let block = self.alloc_block(Some(node));
        self.nodes[node].blocks.push(block);
        block
    }

    pub fn erase_block(&mut self, node: NodeId, i: usize) {
        self.invalidate_schema(node);
        assert!(i < self.nodes[node].blocks.len(), "{node:?} has no block {i}");
        let block = self.nodes[node].blocks.remove(i);
        self.destroy_block(block);
    }

    /// Rewires every use of the outputs of `old` to the outputs of `new` at
    /// the same offsets.
    pub fn replace_all_uses_with(&mut self, old: NodeId, new: NodeId) {
        let old_outputs = self.outputs_of(old).to_vec();
        let new_outputs = self.outputs_of(new).to_vec();
        assert_eq!(
            old_outputs.len(),
            new_outputs.len(),
            "{} and {} have different numbers of outputs",
            self.kind(old),
            self.kind(new)
        );
        for (old, new) in old_outputs.into_iter().zip(new_outputs) {
            self.replace_all_uses_of_value_with(old, new);
        }
    }

    /// Destroys a node with unused outputs, together with its blocks.
    pub fn destroy_node(&mut self, node: NodeId) {
        assert!(
            !self.kind(node).is_sentinel(),
            "sentinels are destroyed with their block"
        );
        self.destroy_node_unchecked(node);
        if self.options.check_invariants {
            self.lint();
        }
    }

    pub(crate) fn destroy_node_unchecked(&mut self, node: NodeId) {
        while let Some(last) = self.nodes[node].outputs.len().checked_sub(1) {
            self.erase_output(node, last);
        }
        while let Some(last) = self.nodes[node].blocks.len().checked_sub(1) {
            self.erase_block(node, last);
        }
        self.remove_all_inputs(node);
        if self.in_block_list(node) {
            self.remove_from_list(node);
        }
        self.nodes.free(node);
    }
}
