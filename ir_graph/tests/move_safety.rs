use data_structure::arena::TypedArena;
use ir_graph::{Context, Graph, GraphOptions, NodeId, NodeKind, ValueId};

fn with_graph(options: GraphOptions, f: impl for<'ctx> FnOnce(&'ctx Context<'ctx>, Graph<'ctx>)) {
    let types = TypedArena::default();
    let strs = TypedArena::default();
    let schemas = TypedArena::default();
    let ctx = Context::new(&types, &strs, &schemas);
    f(&ctx, Graph::new(&ctx, options));
}

/// Linear congruential generator, enough to shuffle moves reproducibly.
struct Lcg(u64);

impl Lcg {
    fn below(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

/// A chain of diamonds: every node uses one or two earlier outputs.
fn build_dag(g: &mut Graph<'_>, rng: &mut Lcg, size: usize) -> Vec<NodeId> {
    let mut nodes: Vec<NodeId> = Vec::new();
    for i in 0..size {
        let mut inputs: Vec<ValueId> = Vec::new();
        if !nodes.is_empty() && i % 3 != 0 {
            inputs.push(g.output(nodes[rng.below(nodes.len())]));
            if i % 2 == 0 {
                inputs.push(g.output(nodes[rng.below(nodes.len())]));
            }
        }
        let kind = NodeKind::Op(g.ctx().symbol(&format!("aten::op{i}")));
        let node = g.create_with_inputs(kind, &inputs, 1);
        nodes.push(g.append_node(node));
    }
    nodes
}

fn assert_defs_precede_uses(g: &Graph<'_>) {
    for node in g.nodes() {
        for &input in g.inputs_of(node) {
            let def = g.defining_node(input);
            assert!(g.is_before(def, node), "{} is used before it is defined", g.display_value(input));
        }
    }
}

#[test]
fn random_moves_keep_definitions_before_uses() {
    with_graph(
        GraphOptions {
            // Small enough to force frequent reindexing.
            topo_append_interval: 8,
            check_invariants: true,
        },
        |_, mut g| {
            let mut rng = Lcg(0x5eed);
            let nodes = build_dag(&mut g, &mut rng, 24);
            let mut failures = 0;
            for _ in 0..500 {
                let mover = nodes[rng.below(nodes.len())];
                let point = nodes[rng.below(nodes.len())];
                let before = g.nodes().collect::<Vec<_>>();
                let moved = if rng.below(2) == 0 {
                    g.move_before_topologically_valid(mover, point)
                } else {
                    g.move_after_topologically_valid(mover, point)
                };
                if !moved {
                    failures += 1;
                    assert_eq!(g.nodes().collect::<Vec<_>>(), before);
                }
                assert_defs_precede_uses(&g);
            }
            assert!(failures > 0);
            assert_eq!(g.nodes().count(), nodes.len());
        },
    );
}

#[test]
fn unconstrained_nodes_always_move() {
    with_graph(GraphOptions::default(), |ctx, mut g| {
        let nodes = (0..6)
            .map(|i| {
                let node = g.create(NodeKind::Op(ctx.symbol(&format!("aten::free{i}"))), 1);
                g.append_node(node)
            })
            .collect::<Vec<_>>();
        for &mover in &nodes {
            for &point in &nodes {
                assert!(g.move_after_topologically_valid(mover, point));
                assert!(mover == point || g.next(point) == Some(mover));
            }
        }
        g.lint();
    });
}
