use data_structure::arena::TypedArena;
use ty::{
    eval_type_variables, match_type_variables, unify_types, CommonTypes, MatchTypeError, Ty,
    TypeEnv, TypingContext,
};

#[test]
fn tuple_of_lists_binds_every_variable() {
    let ty_arena = TypedArena::default();
    let str_arena = TypedArena::default();
    let ctx = TypingContext::new(&ty_arena, &str_arena);
    let common = CommonTypes::new(&ctx);

    let t = Ty::mk_var(&ctx, "t");
    let u = Ty::mk_var(&ctx, "u");
    let formal = Ty::mk_tuple(&ctx, vec![Ty::mk_list(&ctx, t), u]);
    let actual = Ty::mk_tuple(
        &ctx,
        vec![Ty::mk_list(&ctx, Ty::mk_tensor(&ctx, 3)), common.bool],
    );

    let mut env = TypeEnv::default();
    let matched = match_type_variables(&ctx, formal, actual, &mut env).unwrap();
    assert_eq!(matched, actual);
    assert_eq!(env.len(), 2);

    let ret = Ty::mk_future(&ctx, Ty::mk_tuple(&ctx, vec![u, t]));
    assert_eq!(eval_type_variables(&ctx, ret, &env).to_string(), "Future((bool, Tensor<3>))");
}

#[test]
fn repeated_variable_widens_to_the_common_supertype() {
    let ty_arena = TypedArena::default();
    let str_arena = TypedArena::default();
    let ctx = TypingContext::new(&ty_arena, &str_arena);
    let common = CommonTypes::new(&ctx);
    let t = Ty::mk_var(&ctx, "t");

    let mut env = TypeEnv::default();
    match_type_variables(&ctx, t, Ty::mk_tensor(&ctx, 1), &mut env).unwrap();
    match_type_variables(&ctx, t, Ty::mk_tensor(&ctx, 2), &mut env).unwrap();
    assert_eq!(env["t"], common.dynamic);

    match_type_variables(&ctx, t, common.undefined_tensor, &mut env).unwrap();
    assert_eq!(env["t"], common.dynamic);

    let short = Ty::mk_tuple(&ctx, vec![t]);
    let long = Ty::mk_tuple(&ctx, vec![common.int, common.int]);
    assert_eq!(
        match_type_variables(&ctx, short, long, &mut env),
        Err(MatchTypeError::TupleSizeMismatch {
            formal: 1,
            actual: 2
        })
    );
}

#[test]
fn unification_of_unrelated_types_fails() {
    let ty_arena = TypedArena::default();
    let str_arena = TypedArena::default();
    let ctx = TypingContext::new(&ty_arena, &str_arena);
    let common = CommonTypes::new(&ctx);

    assert_eq!(unify_types(&ctx, common.int, common.float), None);
    assert_eq!(unify_types(&ctx, common.int, common.number), Some(common.number));
    assert_eq!(
        unify_types(&ctx, Ty::mk_list(&ctx, common.int), Ty::mk_list(&ctx, common.float)),
        None
    );
}
