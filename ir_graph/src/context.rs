use std::cell::Cell;

use data_structure::arena::TypedArena;
use schema::{FunctionSchema, OperatorRegistry, Symbol};
use ty::{CommonTypes, TyKind, TypingContext};

/// Everything graphs of one compilation share: interned types and names,
/// and the operator schemas.
pub struct Context<'ctx> {
    typing_context: TypingContext<'ctx>,
    pub common_types: CommonTypes<'ctx>,
    operators: OperatorRegistry<'ctx>,
    graphs_created: Cell<usize>,
}

impl<'ctx> Context<'ctx> {
    pub fn new(
        ty_arena: &'ctx TypedArena<TyKind<'ctx>>,
        str_arena: &'ctx TypedArena<u8>,
        schema_arena: &'ctx TypedArena<FunctionSchema<'ctx>>,
    ) -> Self {
        let typing_context = TypingContext::new(ty_arena, str_arena);
        Self {
            common_types: CommonTypes::new(&typing_context),
            typing_context,
            operators: OperatorRegistry::new(schema_arena),
            graphs_created: Cell::new(0),
        }
    }

    /// A number no other graph of this context has.
    pub(crate) fn fresh_graph_id(&self) -> usize {
        let id = self.graphs_created.get();
        self.graphs_created.set(id + 1);
        id
    }

    pub fn typing_context(&self) -> &TypingContext<'ctx> {
        &self.typing_context
    }

    pub fn operators(&self) -> &OperatorRegistry<'ctx> {
        &self.operators
    }

    pub fn symbol(&self, qualified: &str) -> Symbol<'ctx> {
        Symbol::new(&self.typing_context, qualified)
    }

    pub fn intern_str(&self, value: &str) -> &'ctx str {
        self.typing_context.intern_str(value)
    }
}
