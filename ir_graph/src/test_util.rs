use data_structure::arena::TypedArena;

use crate::Context;

/// Runs `f` with a fresh context without registered operators.
pub fn with_context<R>(f: impl for<'ctx> FnOnce(&'ctx Context<'ctx>) -> R) -> R {
    let types = TypedArena::default();
    let strs = TypedArena::default();
    let schemas = TypedArena::default();
    let ctx = Context::new(&types, &strs, &schemas);
    f(&ctx)
}
