use data_structure::{
    arena::TypedArena,
    interning::{HashSetInterner, Interned},
};

use crate::{Ty, TyKind};

/// The context owning every type tag and interned name of a compilation.
pub struct TypingContext<'ctx> {
    ty_arena: &'ctx TypedArena<TyKind<'ctx>>,
    str_arena: &'ctx TypedArena<u8>,
    ty_interner: HashSetInterner<&'ctx TyKind<'ctx>>,
    str_interner: HashSetInterner<&'ctx str>,
}

impl<'ctx> TypingContext<'ctx> {
    pub fn new(ty_arena: &'ctx TypedArena<TyKind<'ctx>>, str_arena: &'ctx TypedArena<u8>) -> Self {
        Self {
            ty_arena,
            str_arena,
            ty_interner: Default::default(),
            str_interner: Default::default(),
        }
    }

    pub fn mk_ty_from_kind(&self, kind: TyKind<'ctx>) -> Ty<'ctx> {
        Ty(Interned::new_unchecked(
            self.ty_interner
                .intern(kind, |kind| &*self.ty_arena.alloc(kind)),
        ))
    }

    /// Interns a string so that equal strings share one address.
    pub fn intern_str(&self, value: &str) -> &'ctx str {
        self.str_interner
            .intern_ref(value, || &*self.str_arena.alloc_str(value))
    }
}

/// Common, pre-interned types.
pub struct CommonTypes<'ctx> {
    pub dynamic: Ty<'ctx>,
    pub undefined_tensor: Ty<'ctx>,
    pub number: Ty<'ctx>,
    pub int: Ty<'ctx>,
    pub float: Ty<'ctx>,
    pub bool: Ty<'ctx>,
    pub none: Ty<'ctx>,
    pub string: Ty<'ctx>,
    pub generator: Ty<'ctx>,
}

impl<'ctx> CommonTypes<'ctx> {
    pub fn new(ctx: &TypingContext<'ctx>) -> Self {
        Self {
            dynamic: ctx.mk_ty_from_kind(TyKind::Dynamic),
            undefined_tensor: ctx.mk_ty_from_kind(TyKind::UndefinedTensor),
            number: ctx.mk_ty_from_kind(TyKind::Number),
            int: ctx.mk_ty_from_kind(TyKind::Int),
            float: ctx.mk_ty_from_kind(TyKind::Float),
            bool: ctx.mk_ty_from_kind(TyKind::Bool),
            none: ctx.mk_ty_from_kind(TyKind::None),
            string: ctx.mk_ty_from_kind(TyKind::String),
            generator: ctx.mk_ty_from_kind(TyKind::Generator),
        }
    }
}
