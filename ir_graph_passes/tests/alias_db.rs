use ir_graph::{Graph, NodeId, NodeKind, ValueId};
use ir_graph_passes::{AliasClass, AliasDb, AliasOptions};
use middleware::{Arena, GlobalContext, IrOptions, Session};
use ty::Ty;

const OPERATORS: &[&str] = &[
    "aten::relu(Tensor self) -> Tensor",
    "aten::relu_(Tensor(a!) self) -> Tensor(a!)",
    "aten::add_(Tensor(a!) self, Tensor other) -> Tensor(a!)",
    "aten::mm(Tensor self, Tensor mat2) -> Tensor",
    "aten::view(Tensor(a) self, int[] size) -> Tensor(a)",
    "aten::rand() -> Tensor",
    "aten::lt(int a, int b) -> bool",
];

fn context<'ctx>(arena: &'ctx Arena<'ctx>) -> GlobalContext<'ctx> {
    let ctx = GlobalContext::new(arena, Session::default());
    ctx.register_operators(OPERATORS.iter().copied()).unwrap();
    ctx
}

fn op<'ctx>(g: &mut Graph<'ctx>, name: &str, inputs: &[ValueId]) -> NodeId {
    let kind = NodeKind::Op(g.ctx().symbol(name));
    let node = g.create_with_inputs(kind, inputs, 1);
    g.append_node(node)
}

fn op_in<'ctx>(
    g: &mut Graph<'ctx>,
    block: ir_graph::BlockId,
    name: &str,
    inputs: &[ValueId],
) -> NodeId {
    let kind = NodeKind::Op(g.ctx().symbol(name));
    let node = g.create_with_inputs(kind, inputs, 1);
    g.append_node_to(block, node)
}

#[test]
fn writes_are_seen_by_readers_of_the_same_class() {
    let arena = Arena::default();
    let ctx = context(&arena);
    let mut g = ctx.new_graph();
    let x = g.add_graph_input(ctx.common_types().dynamic);

    let fresh = op(&mut g, "aten::rand", &[]);
    let write = op(&mut g, "aten::relu_", &[x]);
    let read = op(&mut g, "aten::mm", &[x, x]);
    let fresh_out = g.output(fresh);
    let unrelated = op(&mut g, "aten::relu", &[fresh_out]);

    let db = AliasDb::new(&ctx, &g);
    assert!(db.has_writes(write));
    assert!(!db.has_writes(read));
    assert!(db.writers_for_node(read).contains(&write));
    assert!(db.has_writers(read));
    // `write` writes to its own input, so it is one of its own writers.
    assert!(db.writers_for_node(write).contains(&write));
    assert!(db.may_alias(g.output(write), x));
    assert!(!db.has_writers(unrelated));
    assert!(!db.has_wildcard(read));
}

#[test]
fn views_share_the_writers_of_their_base() {
    let arena = Arena::default();
    let ctx = context(&arena);
    let common = ctx.common_types();
    let mut g = ctx.new_graph();
    let size = g.add_graph_input(Ty::mk_list(ctx.typing_context(), common.int));

    let base = op(&mut g, "aten::rand", &[]);
    let base_out = g.output(base);
    let view = op(&mut g, "aten::view", &[base_out, size]);
    let view_out = g.output(view);
    let write = op(&mut g, "aten::relu_", &[view_out]);
    let read_base = op(&mut g, "aten::relu", &[base_out]);

    let db = AliasDb::new(&ctx, &g);
    assert!(db.may_alias(g.output(base), g.output(view)));
    assert!(!db.may_alias(g.output(base), size));
    assert_eq!(db.writers_for_node(read_base).into_iter().collect::<Vec<_>>(), [write]);
}

#[test]
fn wildcard_conflicts_with_every_class() {
    let arena = Arena::default();
    let ctx = context(&arena);
    let mut g = ctx.new_graph();
    let x = g.add_graph_input(ctx.common_types().dynamic);
    let fresh = op(&mut g, "aten::rand", &[]);

    let tuple = g.create_tuple(&[x, g.output(fresh)]);
    g.append_node(tuple);
    let first = g.create_tuple_index(g.output(tuple), 0);
    g.append_node(first);
    // A write through a value that may alias anything.
    let first_out = g.output(first);
    let wild_write = op(&mut g, "aten::add_", &[first_out, x]);
    let precise_write = op(&mut g, "aten::relu_", &[x]);
    let fresh_out = g.output(fresh);
    let read_fresh = op(&mut g, "aten::relu", &[fresh_out]);
    let read_wild = op(&mut g, "aten::relu", &[first_out]);

    let db = AliasDb::new(&ctx, &g);
    assert!(db.has_wildcard(first));
    assert!(db.has_wildcard(wild_write));
    assert!(!db.has_wildcard(read_fresh));
    assert!(db
        .alias_classes(g.output(wild_write))
        .unwrap()
        .contains(&AliasClass::Wildcard));

    // Every reader sees writes to the wildcard.
    let writers = db.writers_for_node(read_fresh);
    assert!(writers.contains(&wild_write));
    assert!(!writers.contains(&precise_write));
    // A reader of the wildcard sees every writer.
    let writers = db.writers_for_node(read_wild);
    assert!(writers.contains(&wild_write));
    assert!(writers.contains(&precise_write));
    assert!(db.may_alias(g.output(first), g.output(fresh)));
}

#[test]
fn if_outputs_union_both_branches() {
    let arena = Arena::default();
    let ctx = context(&arena);
    let common = ctx.common_types();
    let mut g = ctx.new_graph();
    let cond = g.add_graph_input(common.bool);
    let x = g.add_graph_input(common.dynamic);

    let if_node = g.create_with_inputs(NodeKind::If, &[cond], 1);
    g.append_node(if_node);
    let then_block = g.add_block(if_node);
    let else_block = g.add_block(if_node);
    g.register_block_output(then_block, x);
    let fresh = op_in(&mut g, else_block, "aten::rand", &[]);
    g.register_block_output(else_block, g.output(fresh));

    let db = AliasDb::new(&ctx, &g);
    let merged = g.output(if_node);
    assert!(db.may_alias(merged, x));
    assert!(db.may_alias(merged, g.output(fresh)));
    assert!(!db.may_alias(x, g.output(fresh)));
    assert_eq!(db.alias_classes(merged).unwrap().len(), 2);
}

/// `p` and `q` swap places on every iteration.
fn swapping_loop<'ctx>(ctx: &'ctx GlobalContext<'ctx>) -> (Graph<'ctx>, NodeId, [ValueId; 2]) {
    let common = ctx.common_types();
    let mut g = ctx.new_graph();
    let trips = g.add_graph_input(common.int);
    let cond = g.add_graph_input(common.bool);
    let p = op(&mut g, "aten::rand", &[]);
    let q = op(&mut g, "aten::rand", &[]);
    let carried = [g.output(p), g.output(q)];

    let loop_node = g.create_with_inputs(NodeKind::Loop, &[trips, cond, carried[0], carried[1]], 2);
    g.append_node(loop_node);
    let body = g.add_block(loop_node);
    g.add_block_input(body, common.int);
    let p_in = g.add_block_input(body, common.dynamic);
    let q_in = g.add_block_input(body, common.dynamic);
    let relu = op_in(&mut g, body, "aten::relu", &[q_in]);
    g.register_block_output(body, cond);
    g.register_block_output(body, g.output(relu));
    g.register_block_output(body, p_in);
    (g, loop_node, carried)
}

#[test]
fn loop_classes_grow_to_a_fixed_point() {
    let arena = Arena::default();
    let ctx = context(&arena);
    let (g, loop_node, [p, q]) = swapping_loop(&ctx);

    let db = AliasDb::new(&ctx, &g);
    let body = g.blocks_of(loop_node)[0];
    let p_in = g.block_inputs(body)[1];
    let q_in = g.block_inputs(body)[2];
    // Both carried values may end up in either slot.
    assert!(db.may_alias(p, q));
    assert!(db.may_alias(p_in, q));
    assert!(db.may_alias(q_in, p));
    let outputs = g.outputs_of(loop_node);
    // The second output is `p_in`, which carries both initial values.
    assert!(db.may_alias(outputs[1], p));
    assert!(db.may_alias(outputs[1], q));
    // The first output is fresh on every iteration, or `p` when the body never runs.
    assert!(db.may_alias(outputs[0], p));

    // `q` may end up holding anything `p` holds.
    let p_classes = db.alias_classes(p).unwrap();
    let q_classes = db.alias_classes(q).unwrap();
    assert_eq!(p_classes.len(), 2);
    assert!(p_classes.iter().all(|class| q_classes.contains(class)));
}

#[test]
#[should_panic(expected = "did not converge within 1 iterations")]
fn loop_iterations_can_be_capped() {
    let arena = Arena::default();
    let ctx = context(&arena);
    let (g, _, _) = swapping_loop(&ctx);
    let _db = AliasDb::with_options(&g, AliasOptions {
        max_loop_iterations: Some(1),
    });
}

#[test]
fn loop_cap_is_read_from_the_session() {
    let arena = Arena::default();
    let ctx = GlobalContext::new(
        &arena,
        Session::new(IrOptions {
            max_loop_iterations: Some(8),
            ..Default::default()
        }),
    );
    ctx.register_operators(OPERATORS.iter().copied()).unwrap();
    let (g, loop_node, _) = swapping_loop(&ctx);
    let db = AliasDb::new(&ctx, &g);
    assert!(!db.has_writes(loop_node));
}

#[test]
fn writes_inside_a_fusion_group_belong_to_the_group() {
    let arena = Arena::default();
    let ctx = context(&arena);
    let common = ctx.common_types();
    let mut g = ctx.new_graph();
    let x = g.add_graph_input(common.dynamic);
    let y = op(&mut g, "aten::rand", &[]);

    let group = g.create_fusion_group();
    g.add_input(group, x);
    g.add_input(group, g.output(y));
    g.add_output(group, common.dynamic);
    g.append_node(group);
    let read = op(&mut g, "aten::relu", &[x]);
    let y_out = g.output(y);
    let read_y = op(&mut g, "aten::relu", &[y_out]);

    let subgraph = g.subgraph_mut(group).unwrap();
    let a = subgraph.add_graph_input(common.dynamic);
    let b = subgraph.add_graph_input(common.dynamic);
    let add = op(subgraph, "aten::add_", &[a, b]);
    subgraph.register_output(subgraph.output(add));

    let db = AliasDb::new(&ctx, &g);
    assert!(db.has_writes(group));
    assert!(db.may_alias(g.output(group), x));
    assert!(!db.may_alias(g.output(group), g.output(y)));
    assert_eq!(db.writers_for_node(read).into_iter().collect::<Vec<_>>(), [group]);
    assert!(!db.has_writers(read_y));
}

#[test]
fn differentiable_graphs_are_analyzed_like_fusion_groups() {
    let arena = Arena::default();
    let ctx = context(&arena);
    let common = ctx.common_types();
    let mut g = ctx.new_graph();
    let x = g.add_graph_input(common.dynamic);

    let mut subgraph = Graph::new(ctx.ir_context(), g.options());
    let inner = subgraph.add_graph_input(common.dynamic);
    let relu = op(&mut subgraph, "aten::relu", &[inner]);
    subgraph.register_output(subgraph.output(relu));

    let node = g.create_with_inputs(NodeKind::DifferentiableGraph, &[x], 1);
    g.set_attribute(
        node,
        ir_graph::attr::SUBGRAPH,
        ir_graph::Attribute::Graph(Box::new(subgraph)),
    );
    g.append_node(node);

    let db = AliasDb::new(&ctx, &g);
    assert!(!db.has_writes(node));
    assert!(!db.may_alias(g.output(node), x));
    assert!(g.to_string().contains("prim::DifferentiableGraph_0(%0)"));
}
