use data_structure::FxHashMap;

use crate::{error::MatchTypeError, Ty, TyKind, TypingContext};

/// Bindings of type variables, keyed by variable name.
pub type TypeEnv<'ctx> = FxHashMap<&'ctx str, Ty<'ctx>>;

/// Finds the least common supertype of `t1` and `t2`, if any.
///
/// Two different tensor types join to `Tensor`, `None` joins with any other
/// type `T` to `T?`, and lists and tuples are joined element-wise.
pub fn unify_types<'ctx>(
    ctx: &TypingContext<'ctx>,
    t1: Ty<'ctx>,
    t2: Ty<'ctx>,
) -> Option<Ty<'ctx>> {
    // N.B. this also covers `t1 == t2`.
    if t1.is_subtype_of(t2) {
        return Some(t2);
    } else if t2.is_subtype_of(t1) {
        return Some(t1);
    }

    if t1.is_tensor() && t2.is_tensor() {
        return Some(ctx.mk_ty_from_kind(TyKind::Dynamic));
    }

    if t1.is_none() && !t2.is_none() {
        return Some(Ty::mk_optional(ctx, t2));
    } else if t2.is_none() && !t1.is_none() {
        return Some(Ty::mk_optional(ctx, t1));
    }

    match (t1.kind(), t2.kind()) {
        (TyKind::List(e1), TyKind::List(e2)) => {
            unify_types(ctx, *e1, *e2).map(|elem| Ty::mk_list(ctx, elem))
        }
        (TyKind::Tuple(e1), TyKind::Tuple(e2)) => {
            if e1.len() != e2.len() {
                return None;
            }
            let elems = e1
                .iter()
                .zip(e2)
                .map(|(e1, e2)| unify_types(ctx, *e1, *e2))
                .collect::<Option<Vec<_>>>()?;
            Some(Ty::mk_tuple(ctx, elems))
        }
        _ => None,
    }
}

/// Matches a formal type containing type variables against an actual type,
/// extending `env` with the bindings found.
///
/// Returns the formal type with the variables it mentions resolved. A formal
/// type without free variables is returned unchanged; checking that the actual
/// type is a subtype of it is up to the caller.
///
/// Panics when an optional formal is matched against a bare `None`, since the
/// element type cannot be determined from it.
pub fn match_type_variables<'ctx>(
    ctx: &TypingContext<'ctx>,
    formal: Ty<'ctx>,
    actual: Ty<'ctx>,
    env: &mut TypeEnv<'ctx>,
) -> Result<Ty<'ctx>, MatchTypeError<'ctx>> {
    if !formal.has_free_variables() {
        return Ok(formal);
    }

    match formal.kind() {
        &TyKind::Var(var) => match env.get(var) {
            None => {
                env.insert(var, actual);
                Ok(actual)
            }
            Some(&previous) => {
                let unified = unify_types(ctx, previous, actual).ok_or(
                    MatchTypeError::ConflictingBinding {
                        var,
                        previous,
                        actual,
                    },
                )?;
                env.insert(var, unified);
                Ok(unified)
            }
        },
        TyKind::List(formal_elem) => {
            let actual_elem = actual
                .as_list()
                .ok_or(MatchTypeError::NotAList { actual })?;
            let elem = match_type_variables(ctx, *formal_elem, actual_elem, env)?;
            Ok(Ty::mk_list(ctx, elem))
        }
        TyKind::Tuple(formal_elems) => {
            let actual_elems = actual
                .as_tuple()
                .ok_or(MatchTypeError::NotATuple { actual })?;
            if formal_elems.len() != actual_elems.len() {
                return Err(MatchTypeError::TupleSizeMismatch {
                    formal: formal_elems.len(),
                    actual: actual_elems.len(),
                });
            }
            let elems = formal_elems
                .iter()
                .zip(actual_elems)
                .map(|(formal, actual)| match_type_variables(ctx, *formal, *actual, env))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Ty::mk_tuple(ctx, elems))
        }
        TyKind::Future(formal_elem) => {
            let actual_elem = actual
                .as_future()
                .ok_or(MatchTypeError::NotAFuture { actual })?;
            let elem = match_type_variables(ctx, *formal_elem, actual_elem, env)?;
            Ok(Ty::mk_future(ctx, elem))
        }
        TyKind::Optional(formal_elem) => {
            if let Some(actual_elem) = actual.as_optional() {
                let elem = match_type_variables(ctx, *formal_elem, actual_elem, env)?;
                Ok(Ty::mk_optional(ctx, elem))
            } else if !actual.is_none() {
                // A non-optional actual matches through the element type.
                match_type_variables(ctx, *formal_elem, actual, env)
            } else {
                panic!(
                    "cannot match {formal} to None, because there is no way to determine the element type from None"
                )
            }
        }
        _ => unreachable!("unhandled free variable container: {formal}"),
    }
}

/// Substitutes bound type variables, e.g. turns `t[][]` into `int[][]`.
///
/// Panics on an unbound variable: a schema must bind every variable of its
/// return types through its arguments.
pub fn eval_type_variables<'ctx>(
    ctx: &TypingContext<'ctx>,
    ty: Ty<'ctx>,
    env: &TypeEnv<'ctx>,
) -> Ty<'ctx> {
    if !ty.has_free_variables() {
        return ty;
    }
    if let Some(var) = ty.as_var() {
        return *env
            .get(var)
            .unwrap_or_else(|| panic!("schema has unbound type variable '{var}' in its return type"));
    }
    let contained = ty
        .contained_types()
        .into_iter()
        .map(|ty| eval_type_variables(ctx, ty, env))
        .collect();
    ty.with_contained(ctx, contained)
}
