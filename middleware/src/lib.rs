pub use data_structure::{FxHashMap, FxHashSet};

mod session;

use data_structure::arena::TypedArena;
use ir_graph::Graph;
use schema::{FunctionSchema, ParseSchemaError};
use ty::{CommonTypes, TyKind, TypingContext};

pub use session::{IrOptions, Session};

#[derive(Default)]
pub struct Arena<'ctx> {
    str: TypedArena<u8>,
    type_: TypedArena<TyKind<'ctx>>,
    schema: TypedArena<FunctionSchema<'ctx>>,
}

pub struct GlobalContext<'ctx> {
    ir_context: ir_graph::Context<'ctx>,
    session: Session,
}

impl<'ctx> GlobalContext<'ctx> {
    pub fn new(arena: &'ctx Arena<'ctx>, session: Session) -> Self {
        let ir_context = ir_graph::Context::new(&arena.type_, &arena.str, &arena.schema);
        Self {
            ir_context,
            session,
        }
    }

    pub fn ir_context(&self) -> &ir_graph::Context<'ctx> {
        &self.ir_context
    }

    pub fn typing_context(&self) -> &TypingContext<'ctx> {
        self.ir_context.typing_context()
    }

    pub fn common_types(&self) -> &CommonTypes<'ctx> {
        &self.ir_context.common_types
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Registers an operator from its signature, e.g.
    /// `aten::relu_(Tensor(a!) self) -> Tensor(a!)`.
    pub fn register_operator(
        &self,
        signature: &str,
    ) -> Result<&'ctx FunctionSchema<'ctx>, ParseSchemaError> {
        self.ir_context
            .operators()
            .register_signature(self.typing_context(), signature)
    }

    /// Registers every signature, stopping at the first malformed one.
    pub fn register_operators<'a>(
        &self,
        signatures: impl IntoIterator<Item = &'a str>,
    ) -> anyhow::Result<()> {
        for signature in signatures {
            self.register_operator(signature)?;
        }
        log::debug!("{} operators registered", self.ir_context.operators().len());
        Ok(())
    }

    /// An empty graph configured by the session.
    pub fn new_graph(&'ctx self) -> Graph<'ctx> {
        Graph::new(&self.ir_context, self.session.graph_options())
    }
}
