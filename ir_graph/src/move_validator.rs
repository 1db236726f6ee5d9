//! Moves that keep every value defined before its uses.

use std::collections::VecDeque;

use data_structure::{FxHashMap, FxHashSet};

use crate::{Graph, MoveError, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveSide {
    Before,
    After,
}

impl MoveSide {
    pub fn reversed(self) -> Self {
        match self {
            MoveSide::Before => MoveSide::After,
            MoveSide::After => MoveSide::Before,
        }
    }
}

impl std::fmt::Display for MoveSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveSide::Before => write!(f, "before"),
            MoveSide::After => write!(f, "after"),
        }
    }
}

/// The mover together with the nodes that have to travel with it.
struct WorkingSet {
    nodes: VecDeque<NodeId>,
    /// Same-block users of the set, with the number of members each uses.
    users: FxHashMap<NodeId, usize>,
}

impl WorkingSet {
    fn new(graph: &Graph<'_>, mover: NodeId) -> Self {
        let mut set = Self {
            nodes: VecDeque::new(),
            users: FxHashMap::default(),
        };
        set.add(graph, mover);
        set
    }

    fn add(&mut self, graph: &Graph<'_>, node: NodeId) {
        self.nodes.push_back(node);
        for user in graph.users_same_block(node) {
            *self.users.entry(user).or_default() += 1;
        }
    }

    /// Drops the mover, leaving only the nodes it drags along.
    fn erase_mover(&mut self, graph: &Graph<'_>) {
        let mover = self.nodes.pop_front().expect("the mover is always first");
        for user in graph.users_same_block(mover) {
            let count = self
                .users
                .get_mut(&user)
                .expect("users of members are counted");
            *count -= 1;
            if *count == 0 {
                self.users.remove(&user);
            }
        }
    }

    fn depends_on(&self, graph: &Graph<'_>, node: NodeId) -> bool {
        let Some(&front) = self.nodes.front() else {
            return false;
        };
        if graph.is_after(node, front) {
            self.produces_for(node)
        } else {
            self.consumes_from(graph, node)
        }
    }

    fn produces_for(&self, node: NodeId) -> bool {
        self.users.contains_key(&node)
    }

    fn consumes_from(&self, graph: &Graph<'_>, node: NodeId) -> bool {
        let users = graph.users_same_block(node);
        self.nodes.iter().any(|member| users.contains(member))
    }
}

impl<'ctx> Graph<'ctx> {
    /// Moves `mover` to `side` of `move_point`, dragging along the nodes
    /// between them that depend on it (or that it depends on, when moving
    /// backwards). Both nodes must be in the same block.
    ///
    /// On failure nothing is changed.
    pub fn try_move(
        &mut self,
        mover: NodeId,
        move_point: NodeId,
        side: MoveSide,
    ) -> Result<(), MoveError> {
        self.assert_owns_node(mover);
        self.assert_owns_node(move_point);
        assert!(
            self.in_block_list(mover) && self.in_block_list(move_point),
            "only nodes in a block can be moved"
        );
        assert_eq!(
            self.owning_block(mover),
            self.owning_block(move_point),
            "{} and {} are in different blocks",
            self.display_node_ref(mover),
            self.display_node_ref(move_point)
        );
        if mover == move_point {
            return Ok(());
        }

        let mut working_set = WorkingSet::new(self, mover);
        let backwards = self.is_after(mover, move_point);
        let step = |graph: &Self, node: NodeId| {
            let next = if backwards {
                graph.prev(node)
            } else {
                graph.next(node)
            };
            next.expect("nodes in a block are linked")
        };

        let mut current = step(self, mover);
        while current != move_point {
            if working_set.depends_on(self, current) {
                log::trace!("{} has to move along", self.display_node_ref(current));
                working_set.add(self, current);
            }
            current = step(self, current);
        }

        // Moving towards the point but ending on its near side separates the
        // mover from what it drags along.
        let split = match side {
            MoveSide::Before => self.is_before(mover, move_point),
            MoveSide::After => self.is_after(mover, move_point),
        };
        if split {
            working_set.erase_mover(self);
        }

        if working_set.depends_on(self, move_point) {
            log::debug!(
                "cannot move {} {side} {}",
                self.display_node_ref(mover),
                self.display_node_ref(move_point)
            );
            return Err(MoveError {
                mover,
                move_point,
                side,
            });
        }

        let mut anchor = move_point;
        if split {
            self.move_to(mover, move_point, side);
            for node in working_set.nodes {
                self.move_to(node, anchor, side.reversed());
                anchor = node;
            }
        } else {
            for node in working_set.nodes {
                self.move_to(node, anchor, side);
                anchor = node;
            }
        }
        log::debug!(
            "moved {} {side} {}",
            self.display_node_ref(mover),
            self.display_node_ref(move_point)
        );

        if self.options.check_invariants {
            self.lint();
        }
        Ok(())
    }

    pub fn move_after_topologically_valid(&mut self, node: NodeId, point: NodeId) -> bool {
        self.try_move(node, point, MoveSide::After).is_ok()
    }

    /// Unlike moving after the previous node of `point`, this may also put
    /// dependents of `node` after `point`.
    pub fn move_before_topologically_valid(&mut self, node: NodeId, point: NodeId) -> bool {
        self.try_move(node, point, MoveSide::Before).is_ok()
    }

    fn move_to(&mut self, node: NodeId, point: NodeId, side: MoveSide) {
        match side {
            MoveSide::Before => self.move_before(node, point),
            MoveSide::After => self.move_after(node, point),
        }
    }

    /// Users of the outputs of `node`, each replaced by its ancestor in the
    /// block of `node`. Detached users are ignored.
    fn users_same_block(&self, node: NodeId) -> FxHashSet<NodeId> {
        let block = self.owning_block(node);
        let mut users = FxHashSet::default();
        for &output in self.outputs_of(node) {
            'uses: for u in self.uses(output) {
                let mut user = u.user;
                while self.owning_block(user) != block {
                    let Some(user_block) = self.owning_block(user) else {
                        continue 'uses;
                    };
                    user = self
                        .block_owning_node(user_block)
                        .expect("a user is nested in the block of its input");
                }
                users.insert(user);
            }
        }
        users
    }
}
