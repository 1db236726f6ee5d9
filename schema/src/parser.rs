use ty::{Ty, TyKind, TypingContext};

use crate::{AliasInfo, Argument, FormalAliasSet, FunctionSchema, Symbol};

#[derive(Debug, thiserror::Error)]
#[error("invalid operator signature `{signature}`: {source}")]
pub struct ParseSchemaError {
    signature: String,
    source: peg::error::ParseError<peg::str::LineCol>,
}

/// Parses an operator signature such as
/// `aten::add_(Tensor(a!) self, Tensor other) -> Tensor(a!)`.
pub fn parse_schema<'ctx>(
    ctx: &TypingContext<'ctx>,
    signature: &str,
) -> Result<FunctionSchema<'ctx>, ParseSchemaError> {
    signature_grammar::schema(signature, ctx).map_err(|source| ParseSchemaError {
        signature: signature.to_string(),
        source,
    })
}

enum Item<'ctx> {
    Arg(Argument<'ctx>),
    /// `*`: every following argument is keyword-only.
    KwargOnlyMarker,
    /// `...`
    Ellipsis,
}

enum Suffix {
    List,
    Optional,
}

fn named_ty<'ctx>(ctx: &TypingContext<'ctx>, name: &str) -> Ty<'ctx> {
    let kind = match name {
        "Tensor" => TyKind::Dynamic,
        "Scalar" => TyKind::Number,
        "int" => TyKind::Int,
        "float" => TyKind::Float,
        "bool" => TyKind::Bool,
        "str" => TyKind::String,
        "Generator" => TyKind::Generator,
        "None" => TyKind::None,
        _ => return Ty::mk_var(ctx, name),
    };
    Ty::new(ctx, kind)
}

/// Wraps `base` with its suffixes and places the alias annotations.
///
/// `Tensor(a)[]` annotates the elements of the list, `Tensor[](a)` the list
/// itself.
fn annotate<'ctx>(
    ctx: &TypingContext<'ctx>,
    base: Ty<'ctx>,
    inner: Option<AliasInfo<'ctx>>,
    suffixes: Vec<Suffix>,
    outer: Option<AliasInfo<'ctx>>,
) -> Result<(Ty<'ctx>, Option<AliasInfo<'ctx>>), &'static str> {
    let has_list = suffixes.iter().any(|s| matches!(s, Suffix::List));
    let ty = suffixes.into_iter().fold(base, |ty, suffix| match suffix {
        Suffix::List => Ty::mk_list(ctx, ty),
        Suffix::Optional => Ty::mk_optional(ctx, ty),
    });
    let alias_info = match (inner, outer) {
        (Some(_), Some(_)) if !has_list => {
            return Err("at most one alias annotation per type");
        }
        (Some(inner), outer) if has_list => {
            let mut info = outer.unwrap_or_default();
            info.contained_types.push(inner);
            Some(info)
        }
        (inner, outer) => inner.or(outer),
    };
    Ok((ty, alias_info))
}

fn collect_arguments(items: Vec<Item<'_>>) -> Result<(Vec<Argument<'_>>, bool), &'static str> {
    let mut arguments = Vec::with_capacity(items.len());
    let mut kwarg_only = false;
    let mut is_vararg = false;
    for item in items {
        if is_vararg {
            return Err("`...` must be the last argument");
        }
        match item {
            Item::Arg(mut arg) => {
                arg.kwarg_only = kwarg_only;
                arguments.push(arg);
            }
            Item::KwargOnlyMarker if kwarg_only => return Err("duplicate `*`"),
            Item::KwargOnlyMarker => kwarg_only = true,
            Item::Ellipsis => is_vararg = true,
        }
    }
    Ok((arguments, is_vararg))
}

fn collect_returns(items: Vec<Item<'_>>) -> Result<(Vec<Argument<'_>>, bool), &'static str> {
    let mut returns = Vec::with_capacity(items.len());
    let mut is_varret = false;
    for item in items {
        if is_varret {
            return Err("`...` must be the last return");
        }
        match item {
            Item::Arg(ret) => returns.push(ret),
            Item::KwargOnlyMarker => return Err("`*` in returns"),
            Item::Ellipsis => is_varret = true,
        }
    }
    Ok((returns, is_varret))
}

peg::parser! {
    grammar signature_grammar<'ctx>(ctx: &TypingContext<'ctx>) for str {
        rule _() = quiet!{[' ' | '\t' | '\r' | '\n']*}

        rule ident() -> &'input str
            = quiet!{$(['a'..='z' | 'A'..='Z' | '_'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']*)}
            / expected!("identifier")

        rule qualified_name() -> Symbol<'ctx>
            = ns:ident() "::" name:ident() { Symbol::from_parts(ctx, ns, name) }

        rule alias_set() -> FormalAliasSet<'ctx>
            = "*" { FormalAliasSet::Wildcard }
            / name:ident() { FormalAliasSet::Named(Symbol::from_parts(ctx, "alias", name)) }

        rule alias() -> AliasInfo<'ctx>
            = "(" _ sets:(alias_set() ++ (_ "|" _)) _ write:"!"? _ ")" {
                AliasInfo {
                    sets: sets.into_iter().collect(),
                    is_write: write.is_some(),
                    contained_types: Vec::new(),
                }
            }

        rule suffix() -> Suffix
            = "[]" { Suffix::List }
            / "?" { Suffix::Optional }

        rule base_ty() -> Ty<'ctx>
            = "(" _ elems:(ty() ** (_ "," _)) _ ")" {
                Ty::mk_tuple(ctx, elems.into_iter().map(|(ty, _)| ty).collect())
            }
            / "Future" _ "(" _ elem:ty() _ ")" { Ty::mk_future(ctx, elem.0) }
            / name:ident() { named_ty(ctx, name) }

        rule ty() -> (Ty<'ctx>, Option<AliasInfo<'ctx>>)
            = base:base_ty() inner:alias()? suffixes:suffix()* outer:alias()? {?
                annotate(ctx, base, inner, suffixes, outer)
            }

        rule bracketed() = "[" [^ ']']* "]"

        rule default_value() -> &'input str
            = value:$((bracketed() / [^ ',' | ')' | '[' | ']'])+) { value.trim() }

        rule argument() -> Item<'ctx>
            = "..." { Item::Ellipsis }
            / "*" { Item::KwargOnlyMarker }
            / ty:ty() _ name:ident() default:(_ "=" _ v:default_value() { v })? {
                Item::Arg(Argument {
                    name: ctx.intern_str(name),
                    ty: ty.0,
                    default: default.map(|v| ctx.intern_str(v)),
                    alias_info: ty.1,
                    kwarg_only: false,
                })
            }

        rule return_() -> Item<'ctx>
            = "..." { Item::Ellipsis }
            / ty:ty() name:(_ n:ident() { n })? {
                Item::Arg(Argument {
                    name: ctx.intern_str(name.unwrap_or_default()),
                    ty: ty.0,
                    default: None,
                    alias_info: ty.1,
                    kwarg_only: false,
                })
            }

        rule returns() -> (Vec<Argument<'ctx>>, bool)
            = "(" _ items:(return_() ** (_ "," _)) _ ")" {? collect_returns(items) }
            / item:return_() {? collect_returns(vec![item]) }

        pub rule schema() -> FunctionSchema<'ctx>
            = _ name:qualified_name() _ "(" _ items:(argument() ** (_ "," _)) _ ")" _ "->" _
              returns:returns() _ {?
                let (arguments, is_vararg) = collect_arguments(items)?;
                let (returns, is_varret) = returns;
                Ok(FunctionSchema { name, arguments, returns, is_vararg, is_varret })
            }
    }
}
