use std::cell::RefCell;

use data_structure::{arena::TypedArena, FxIndexMap};
use ty::{Ty, TypingContext};

use crate::{parse_schema, FunctionSchema, ParseSchemaError, Symbol};

/// Every operator schema known to a compilation, grouped by operator name.
///
/// Schemas are allocated once and live as long as the context, so nodes can
/// cache a plain reference to theirs.
pub struct OperatorRegistry<'ctx> {
    arena: &'ctx TypedArena<FunctionSchema<'ctx>>,
    overloads: RefCell<FxIndexMap<Symbol<'ctx>, Vec<&'ctx FunctionSchema<'ctx>>>>,
}

impl<'ctx> OperatorRegistry<'ctx> {
    pub fn new(arena: &'ctx TypedArena<FunctionSchema<'ctx>>) -> Self {
        Self {
            arena,
            overloads: Default::default(),
        }
    }

    pub fn register(&self, schema: FunctionSchema<'ctx>) -> &'ctx FunctionSchema<'ctx> {
        let schema = &*self.arena.alloc(schema);
        log::trace!("registered {schema}");
        self.overloads
            .borrow_mut()
            .entry(schema.name)
            .or_default()
            .push(schema);
        schema
    }

    pub fn register_signature(
        &self,
        ctx: &TypingContext<'ctx>,
        signature: &str,
    ) -> Result<&'ctx FunctionSchema<'ctx>, ParseSchemaError> {
        Ok(self.register(parse_schema(ctx, signature)?))
    }

    /// Overloads of `name` in registration order.
    pub fn overloads(&self, name: Symbol<'ctx>) -> Vec<&'ctx FunctionSchema<'ctx>> {
        self.overloads
            .borrow()
            .get(&name)
            .cloned()
            .unwrap_or_default()
    }

    /// The first overload of `name` accepting these inputs and producing this
    /// many outputs.
    pub fn find_schema(
        &self,
        ctx: &TypingContext<'ctx>,
        name: Symbol<'ctx>,
        inputs: &[Ty<'ctx>],
        num_outputs: usize,
    ) -> Option<&'ctx FunctionSchema<'ctx>> {
        let found = self
            .overloads(name)
            .into_iter()
            .find(|schema| schema.matches(ctx, inputs, num_outputs));
        if found.is_none() {
            log::trace!("no schema of {name} matches {} inputs", inputs.len());
        }
        found
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.overloads.borrow().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
