//! Topological positions: sparse keys giving O(1) order queries between the
//! nodes of a block, and the linking of nodes into blocks.
//!
//! Appending advances a fixed interval past the last node, prepending steps
//! back one interval from the first one, and anything else takes the midpoint
//! of its neighbours. When there is no room left the whole block is spread
//! out again.

use crate::{BlockId, Graph, NodeId};

pub const LOWER_BOUND: i64 = i64::MIN;
pub const UPPER_BOUND: i64 = i64::MAX;
pub const MID_POINT: i64 = 0;

impl<'ctx> Graph<'ctx> {
    pub(crate) fn init_sentinels(&mut self, block: BlockId, param: NodeId, ret: NodeId) {
        let param = &mut self.nodes[param];
        param.owning_block = Some(block);
        param.topo_position = LOWER_BOUND;

        let ret_data = &mut self.nodes[ret];
        ret_data.owning_block = Some(block);
        ret_data.topo_position = UPPER_BOUND;
        // The ring of an empty block.
        ret_data.prev = Some(ret);
        ret_data.next = Some(ret);
    }

    /// `None` for detached nodes.
    pub fn owning_block(&self, node: NodeId) -> Option<BlockId> {
        self.nodes[node].owning_block
    }

    /// Whether the node is linked into a block. Param nodes never are.
    pub fn in_block_list(&self, node: NodeId) -> bool {
        self.nodes[node].next.is_some()
    }

    /// The next node in the ring of the owning block, wrapping through the
    /// return node.
    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].next
    }

    pub fn prev(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].prev
    }

    pub fn topo_position(&self, node: NodeId) -> i64 {
        self.nodes[node].topo_position
    }

    /// Whether `node` comes strictly before `other`. Nodes in different
    /// blocks are compared through their ancestors in the first common block.
    pub fn is_before(&self, node: NodeId, other: NodeId) -> bool {
        self.assert_owns_node(node);
        self.assert_owns_node(other);
        node != other && !self.is_after(node, other)
    }

    pub fn is_after(&self, node: NodeId, other: NodeId) -> bool {
        self.assert_owns_node(node);
        self.assert_owns_node(other);
        let block_of = |node: NodeId| {
            self.owning_block(node)
                .unwrap_or_else(|| panic!("{node:?} is not in a block"))
        };

        if block_of(node) == block_of(other) {
            return self.topo_position(node) > self.topo_position(other);
        }

        let mut lhs = Some(node);
        while let Some(l) = lhs {
            let mut rhs = Some(other);
            while let Some(r) = rhs {
                if block_of(l) == block_of(r) {
                    return self.topo_position(l) > self.topo_position(r);
                }
                rhs = self.block_owning_node(block_of(r));
            }
            lhs = self.block_owning_node(block_of(l));
        }
        unreachable!("{node:?} and {other:?} do not share a block")
    }

    /// Links a detached `node` right after `point`.
    pub fn insert_after(&mut self, node: NodeId, point: NodeId) -> NodeId {
        self.assert_owns_node(node);
        self.assert_owns_node(point);
        assert!(!self.in_block_list(node), "{node:?} is already in a block");
        assert!(self.in_block_list(point), "{point:?} is not in a block");
        let block = self.owning_block(point).expect("linked nodes have a block");
        let next = self.next(point).expect("checked above");

        self.nodes[node].owning_block = Some(block);
        self.nodes[point].next = Some(node);
        self.nodes[node].prev = Some(point);
        self.nodes[node].next = Some(next);
        self.nodes[next].prev = Some(node);
        self.assign_topo_position(node);
        node
    }

    /// Links a detached `node` right before `point`.
    pub fn insert_before(&mut self, node: NodeId, point: NodeId) -> NodeId {
        self.assert_owns_node(point);
        assert!(self.in_block_list(point), "{point:?} is not in a block");
        let prev = self.prev(point).expect("checked above");
        self.insert_after(node, prev)
    }

    /// Relinks `node` right after `point` without checking dependencies.
    pub fn move_after(&mut self, node: NodeId, point: NodeId) {
        self.remove_from_list(node);
        self.insert_after(node, point);
    }

    /// Relinks `node` right before `point` without checking dependencies.
    pub fn move_before(&mut self, node: NodeId, point: NodeId) {
        self.remove_from_list(node);
        self.insert_before(node, point);
    }

    /// Unlinks `node`, leaving it detached.
    pub fn remove_from_list(&mut self, node: NodeId) {
        assert!(self.in_block_list(node), "{node:?} is not in a block");
        assert!(!self.kind(node).is_sentinel(), "the return node cannot leave its block");
        let data = &mut self.nodes[node];
        data.owning_block = None;
        let next = data.next.take().expect("checked above");
        let prev = data.prev.take().expect("linked nodes have both links");
        self.nodes[prev].next = Some(next);
        self.nodes[next].prev = Some(prev);
    }

    /// Must be called right after `node` is linked.
    fn assign_topo_position(&mut self, node: NodeId) {
        let block = self.owning_block(node).expect("just linked");
        let ret = self.return_node(block);
        let prev = self.prev(node).expect("just linked");
        let next = self.next(node).expect("just linked");
        let prev_pos = self.topo_position(prev);
        let next_pos = self.topo_position(next);
        let interval = self.options.topo_append_interval;

        let position = if next == ret {
            if prev == ret {
                // The only node of the block.
                MID_POINT
            } else if prev_pos >= UPPER_BOUND - interval {
                self.reindex_topology(block);
                return;
            } else {
                prev_pos + interval
            }
        } else if prev == ret {
            if next_pos <= LOWER_BOUND + interval {
                self.reindex_topology(block);
                return;
            }
            next_pos - interval
        } else {
            let between = prev_pos as i128 + (next_pos as i128 - prev_pos as i128) / 2;
            if between == prev_pos as i128 {
                self.reindex_topology(block);
                return;
            }
            between as i64
        };
        self.nodes[node].topo_position = position;
    }

    /// Spreads the nodes of `block` evenly from the lower bound.
    fn reindex_topology(&mut self, block: BlockId) {
        let interval = self.options.topo_append_interval;
        let nodes = self.block_nodes(block).collect::<Vec<_>>();
        log::debug!("reindexing {} nodes of {block:?}", nodes.len());
        let mut position = LOWER_BOUND;
        for node in nodes {
            assert!(
                position <= UPPER_BOUND - interval,
                "{block:?} has too many nodes to index"
            );
            position += interval;
            self.nodes[node].topo_position = position;
        }
    }
}
