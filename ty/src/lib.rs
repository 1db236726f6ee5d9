//! Type tags attached to values of the graph IR.
//!
//! The graph core treats these as opaque: it only asks whether a type is a
//! subtype of another, whether two types are equal, and which types a container
//! type is made of. Unification and type-variable matching live here as well so
//! that operator schemas with generic signatures can be matched against nodes.

pub mod context;
mod error;
mod unify;

use data_structure::interning::Interned;

pub use context::{CommonTypes, TypingContext};
pub use error::MatchTypeError;
pub use unify::{eval_type_variables, match_type_variables, unify_types, TypeEnv};

/// Use this instead of `TyKind` whenever possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ty<'ctx>(pub Interned<'ctx, TyKind<'ctx>>);

impl<'ctx> std::ops::Deref for Ty<'ctx> {
    type Target = TyKind<'ctx>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for Ty<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TyKind<'ctx> {
    /// A tensor of unknown rank. Every tensor type is a subtype of this.
    Dynamic,
    /// A tensor whose rank is known.
    Tensor { dim: usize },
    UndefinedTensor,
    /// `int` or `float`.
    Number,
    Int,
    Float,
    Bool,
    None,
    String,
    Generator,
    List(Ty<'ctx>),
    Tuple(Vec<Ty<'ctx>>),
    Optional(Ty<'ctx>),
    Future(Ty<'ctx>),

    /// A type variable of a generic operator signature.
    Var(&'ctx str),
}

/// Field-less view of [`TyKind`], usable as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TyTag {
    Dynamic,
    Tensor,
    UndefinedTensor,
    Number,
    Int,
    Float,
    Bool,
    None,
    String,
    Generator,
    List,
    Tuple,
    Optional,
    Future,
    Var,
}

impl<'ctx> TyKind<'ctx> {
    pub fn tag(&self) -> TyTag {
        match self {
            TyKind::Dynamic => TyTag::Dynamic,
            TyKind::Tensor { .. } => TyTag::Tensor,
            TyKind::UndefinedTensor => TyTag::UndefinedTensor,
            TyKind::Number => TyTag::Number,
            TyKind::Int => TyTag::Int,
            TyKind::Float => TyTag::Float,
            TyKind::Bool => TyTag::Bool,
            TyKind::None => TyTag::None,
            TyKind::String => TyTag::String,
            TyKind::Generator => TyTag::Generator,
            TyKind::List(_) => TyTag::List,
            TyKind::Tuple(_) => TyTag::Tuple,
            TyKind::Optional(_) => TyTag::Optional,
            TyKind::Future(_) => TyTag::Future,
            TyKind::Var(_) => TyTag::Var,
        }
    }

    pub fn as_list(&self) -> Option<Ty<'ctx>> {
        if let Self::List(elem) = self {
            Some(*elem)
        } else {
            None
        }
    }

    pub fn as_tuple(&self) -> Option<&[Ty<'ctx>]> {
        if let Self::Tuple(elems) = self {
            Some(elems)
        } else {
            None
        }
    }

    pub fn as_optional(&self) -> Option<Ty<'ctx>> {
        if let Self::Optional(elem) = self {
            Some(*elem)
        } else {
            None
        }
    }

    pub fn as_future(&self) -> Option<Ty<'ctx>> {
        if let Self::Future(elem) = self {
            Some(*elem)
        } else {
            None
        }
    }

    pub fn as_var(&self) -> Option<&'ctx str> {
        if let Self::Var(name) = self {
            Some(*name)
        } else {
            None
        }
    }
}

impl std::fmt::Display for TyKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TyKind::Dynamic => write!(f, "Tensor"),
            TyKind::Tensor { dim } => write!(f, "Tensor<{dim}>"),
            TyKind::UndefinedTensor => write!(f, "Undefined"),
            TyKind::Number => write!(f, "Scalar"),
            TyKind::Int => write!(f, "int"),
            TyKind::Float => write!(f, "float"),
            TyKind::Bool => write!(f, "bool"),
            TyKind::None => write!(f, "None"),
            TyKind::String => write!(f, "str"),
            TyKind::Generator => write!(f, "Generator"),
            TyKind::List(elem) => write!(f, "{elem}[]"),
            TyKind::Tuple(elems) => {
                write!(f, "(")?;
                let mut first = true;
                for elem in elems {
                    if first {
                        first = false;
                    } else {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
            TyKind::Optional(elem) => write!(f, "{elem}?"),
            TyKind::Future(elem) => write!(f, "Future({elem})"),
            TyKind::Var(name) => write!(f, "{name}"),
        }
    }
}

impl<'ctx> Ty<'ctx> {
    pub fn new(ctx: &TypingContext<'ctx>, kind: TyKind<'ctx>) -> Self {
        ctx.mk_ty_from_kind(kind)
    }

    pub fn kind(self) -> &'ctx TyKind<'ctx> {
        self.0 .0
    }

    #[inline(always)]
    pub fn mk_tensor(ctx: &TypingContext<'ctx>, dim: usize) -> Self {
        Self::new(ctx, TyKind::Tensor { dim })
    }

    #[inline(always)]
    pub fn mk_list(ctx: &TypingContext<'ctx>, elem: Ty<'ctx>) -> Self {
        Self::new(ctx, TyKind::List(elem))
    }

    #[inline(always)]
    pub fn mk_tuple(ctx: &TypingContext<'ctx>, elems: Vec<Ty<'ctx>>) -> Self {
        Self::new(ctx, TyKind::Tuple(elems))
    }

    #[inline(always)]
    pub fn mk_optional(ctx: &TypingContext<'ctx>, elem: Ty<'ctx>) -> Self {
        Self::new(ctx, TyKind::Optional(elem))
    }

    #[inline(always)]
    pub fn mk_future(ctx: &TypingContext<'ctx>, elem: Ty<'ctx>) -> Self {
        Self::new(ctx, TyKind::Future(elem))
    }

    #[inline(always)]
    pub fn mk_var(ctx: &TypingContext<'ctx>, name: &str) -> Self {
        Self::new(ctx, TyKind::Var(ctx.intern_str(name)))
    }

    /// Any tensor type, i.e. a subtype of [`TyKind::Dynamic`].
    pub fn is_tensor(self) -> bool {
        matches!(
            self.kind(),
            TyKind::Dynamic | TyKind::Tensor { .. } | TyKind::UndefinedTensor
        )
    }

    pub fn is_none(self) -> bool {
        matches!(self.kind(), TyKind::None)
    }

    /// `self <: other`.
    ///
    /// Lists are invariant except that a list of tensors is a list of
    /// `Tensor`. Tuples, optionals and futures are covariant.
    pub fn is_subtype_of(self, other: Ty<'ctx>) -> bool {
        if self == other {
            return true;
        }
        match (self.kind(), other.kind()) {
            (_, TyKind::Dynamic) => self.is_tensor(),
            (TyKind::Int | TyKind::Float, TyKind::Number) => true,
            (TyKind::None, TyKind::Optional(_)) => true,
            (TyKind::Optional(lhs), TyKind::Optional(rhs)) => lhs.is_subtype_of(*rhs),
            (_, TyKind::Optional(rhs)) => self.is_subtype_of(*rhs),
            (TyKind::List(lhs), TyKind::List(rhs)) => {
                matches!(rhs.kind(), TyKind::Dynamic) && lhs.is_tensor()
            }
            (TyKind::Tuple(lhs), TyKind::Tuple(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs.iter().zip(rhs).all(|(lhs, rhs)| lhs.is_subtype_of(*rhs))
            }
            (TyKind::Future(lhs), TyKind::Future(rhs)) => lhs.is_subtype_of(*rhs),
            _ => false,
        }
    }

    /// Types this type is directly made of.
    pub fn contained_types(self) -> Vec<Ty<'ctx>> {
        match self.kind() {
            TyKind::List(elem) | TyKind::Optional(elem) | TyKind::Future(elem) => vec![*elem],
            TyKind::Tuple(elems) => elems.clone(),
            _ => Vec::new(),
        }
    }

    /// Rebuilds a container type around new contained types.
    ///
    /// Panics if the number of types does not match [`Ty::contained_types`].
    pub fn with_contained(self, ctx: &TypingContext<'ctx>, contained: Vec<Ty<'ctx>>) -> Self {
        let single = |contained: &[Ty<'ctx>]| {
            assert_eq!(contained.len(), 1, "{self} contains exactly one type");
            contained[0]
        };
        match self.kind() {
            TyKind::List(_) => Self::mk_list(ctx, single(&contained)),
            TyKind::Optional(_) => Self::mk_optional(ctx, single(&contained)),
            TyKind::Future(_) => Self::mk_future(ctx, single(&contained)),
            TyKind::Tuple(elems) => {
                assert_eq!(elems.len(), contained.len(), "arity of {self} changed");
                Self::mk_tuple(ctx, contained)
            }
            _ => {
                assert!(contained.is_empty(), "{self} does not contain types");
                self
            }
        }
    }

    pub fn has_free_variables(self) -> bool {
        match self.kind() {
            TyKind::Var(_) => true,
            _ => self
                .contained_types()
                .into_iter()
                .any(Ty::has_free_variables),
        }
    }
}

#[cfg(test)]
mod tests {
    use data_structure::arena::TypedArena;

    use super::*;

    #[test]
    fn subtyping_follows_the_tensor_and_number_hierarchy() {
        let ty_arena = TypedArena::default();
        let str_arena = TypedArena::default();
        let ctx = TypingContext::new(&ty_arena, &str_arena);
        let common = CommonTypes::new(&ctx);

        let t2 = Ty::mk_tensor(&ctx, 2);
        assert!(t2.is_subtype_of(common.dynamic));
        assert!(!common.dynamic.is_subtype_of(t2));
        assert!(common.int.is_subtype_of(common.number));
        assert!(!common.bool.is_subtype_of(common.number));

        let opt = Ty::mk_optional(&ctx, common.dynamic);
        assert!(common.none.is_subtype_of(opt));
        assert!(t2.is_subtype_of(opt));

        let list_t2 = Ty::mk_list(&ctx, t2);
        let list_dyn = Ty::mk_list(&ctx, common.dynamic);
        let list_int = Ty::mk_list(&ctx, common.int);
        assert!(list_t2.is_subtype_of(list_dyn));
        assert!(!list_int.is_subtype_of(Ty::mk_list(&ctx, common.number)));

        let tup = Ty::mk_tuple(&ctx, vec![t2, common.int]);
        assert!(tup.is_subtype_of(Ty::mk_tuple(&ctx, vec![common.dynamic, common.number])));
        assert!(!tup.is_subtype_of(Ty::mk_tuple(&ctx, vec![common.dynamic])));
    }

    #[test]
    fn structurally_equal_types_are_interned_once() {
        let ty_arena = TypedArena::default();
        let str_arena = TypedArena::default();
        let ctx = TypingContext::new(&ty_arena, &str_arena);
        let common = CommonTypes::new(&ctx);

        let a = Ty::mk_tuple(&ctx, vec![common.int, common.dynamic]);
        let b = Ty::mk_tuple(&ctx, vec![common.int, common.dynamic]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "(int, Tensor)");
        assert_eq!(Ty::mk_list(&ctx, Ty::mk_optional(&ctx, common.float)).to_string(), "float?[]");
        assert!(Ty::mk_list(&ctx, Ty::mk_var(&ctx, "t")).has_free_variables());
        assert!(!a.has_free_variables());
    }
}
