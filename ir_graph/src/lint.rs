//! Structural self-check of a graph.
//!
//! Lint assumes no node is detached: every live node has to be reachable from
//! the root block.

use data_structure::{BitVec, FxHashMap, FxHashSet};

use crate::{BlockId, Graph, NodeId, NodeKind, Use, ValueId};

impl Graph<'_> {
    /// Panics on the first broken invariant.
    pub fn lint(&self) {
        let mut linter = Linter {
            graph: self,
            scopes: vec![LintScope::default()],
            seen_uniques: BitVec::repeat(false, self.next_unique),
            anticipated_uses: FxHashMap::default(),
            reached: FxHashSet::default(),
        };
        linter.check_block(self.root);

        for (node, remaining) in linter.anticipated_uses {
            assert_eq!(
                remaining,
                None,
                "{} is a user of values but is not in the graph",
                self.display_node_ref(node)
            );
        }
        for node in self.nodes.indices() {
            assert!(
                linter.reached.contains(&node),
                "{} ({}) is not in any block",
                self.display_node_ref(node),
                self.kind(node)
            );
        }
    }

    /// Invariants local to one node.
    fn lint_node(&self, node: NodeId) {
        for (i, &input) in self.inputs_of(node).iter().enumerate() {
            assert!(
                self.uses(input).contains(&Use::new(node, i)),
                "input {i} of {} is missing from the uses of {}",
                self.display_node_ref(node),
                self.display_value(input)
            );
        }
        for &output in self.outputs_of(node) {
            for u in self.uses(output) {
                assert_eq!(
                    self.inputs_of(u.user).get(u.offset),
                    Some(&output),
                    "a use of {} does not match the inputs of {}",
                    self.display_value(output),
                    self.display_node_ref(u.user)
                );
            }
        }

        match self.kind(node) {
            NodeKind::Constant | NodeKind::Param => assert!(
                self.inputs_of(node).is_empty(),
                "{} has inputs",
                self.kind(node)
            ),
            NodeKind::Return => assert!(
                self.outputs_of(node).is_empty(),
                "{} has outputs",
                self.kind(node)
            ),
            NodeKind::FusionGroup => self
                .subgraph(node)
                .unwrap_or_else(|| panic!("{} has no subgraph", self.display_node_ref(node)))
                .lint(),
            _ => {}
        }
    }
}

#[derive(Default)]
struct LintScope {
    values: FxHashSet<ValueId>,
    nodes: FxHashSet<NodeId>,
}

struct Linter<'a, 'ctx> {
    graph: &'a Graph<'ctx>,
    /// Innermost last.
    scopes: Vec<LintScope>,
    seen_uniques: BitVec,
    /// Inputs still expected per user; `None` once the user was checked.
    anticipated_uses: FxHashMap<NodeId, Option<usize>>,
    reached: FxHashSet<NodeId>,
}

impl Linter<'_, '_> {
    fn value_in_scope(&self, value: ValueId) -> bool {
        self.scopes.iter().any(|scope| scope.values.contains(&value))
    }

    fn node_in_scope(&self, node: NodeId) -> bool {
        self.scopes.iter().any(|scope| scope.nodes.contains(&node))
    }

    fn innermost(&mut self) -> &mut LintScope {
        self.scopes.last_mut().expect("the root scope is never popped")
    }

    fn check_value(&mut self, value: ValueId) {
        let g = self.graph;
        assert!(
            !self.value_in_scope(value),
            "{} is defined twice",
            g.display_value(value)
        );
        self.innermost().values.insert(value);

        let unique = g.unique(value);
        assert!(
            unique < g.next_unique,
            "{} has a unique number beyond the counter",
            g.display_value(value)
        );
        assert!(
            !self.seen_uniques.replace(unique, true),
            "unique number {unique} is shared"
        );

        for u in g.uses(value) {
            assert!(
                !self.node_in_scope(u.user),
                "{} is used by {}, which comes before it",
                g.display_value(value),
                g.display_node_ref(u.user)
            );
            assert!(
                g.contains_node(u.user),
                "{} is used by a destroyed node",
                g.display_value(value)
            );
            *self
                .anticipated_uses
                .entry(u.user)
                .or_insert(Some(0))
                .get_or_insert(0) += 1;
        }
    }

    fn check_node(&mut self, node: NodeId) {
        let g = self.graph;
        self.reached.insert(node);
        for &input in g.inputs_of(node) {
            assert!(
                self.value_in_scope(input),
                "{} uses {}, which is not in scope",
                g.display_node_ref(node),
                g.display_value(input)
            );
        }
        let anticipated = self.anticipated_uses.insert(node, None).flatten();
        assert_eq!(
            anticipated.unwrap_or(0),
            g.inputs_of(node).len(),
            "uses recorded for {} do not match its inputs",
            g.display_node_ref(node)
        );

        assert!(
            !self.node_in_scope(node),
            "{} appears twice",
            g.display_node_ref(node)
        );
        self.innermost().nodes.insert(node);

        for &block in g.blocks_of(node) {
            assert_eq!(g.block_owning_node(block), Some(node));
            self.scopes.push(LintScope::default());
            self.check_block(block);
            self.scopes.pop();
        }

        for (i, &output) in g.outputs_of(node).iter().enumerate() {
            assert_eq!(g.defining_node(output), node);
            assert_eq!(
                g.offset(output),
                i,
                "offset of {} is out of sync",
                g.display_value(output)
            );
            self.check_value(output);
        }
        g.lint_node(node);
    }

    fn check_block(&mut self, block: BlockId) {
        let g = self.graph;
        let param = g.param_node(block);
        let ret = g.return_node(block);
        assert_eq!(g.kind(param), NodeKind::Param);
        assert_eq!(g.kind(ret), NodeKind::Return);
        assert!(
            !g.in_block_list(param),
            "the param node of {block:?} is linked into the block"
        );
        assert_eq!(g.owning_block(param), Some(block));
        assert_eq!(g.owning_block(ret), Some(block));

        // Positions strictly increase from the param node to the return node.
        let mut position = g.topo_position(param);
        let mut current = g.next(ret).expect("the return node closes the ring");
        loop {
            assert_eq!(g.owning_block(current), Some(block));
            let next_position = g.topo_position(current);
            assert!(
                position < next_position,
                "{} is out of topological order",
                g.display_node_ref(current)
            );
            position = next_position;
            if current == ret {
                break;
            }
            current = g.next(current).expect("linked nodes have both links");
        }

        self.reached.insert(param);
        for (i, &input) in g.block_inputs(block).iter().enumerate() {
            assert_eq!(g.defining_node(input), param);
            assert_eq!(g.offset(input), i);
            self.check_value(input);
        }
        g.lint_node(param);

        for node in g.block_nodes(block) {
            assert!(
                !g.kind(node).is_sentinel(),
                "{} is linked into {block:?}",
                g.kind(node)
            );
            self.check_node(node);
        }
        self.check_node(ret);
    }
}
