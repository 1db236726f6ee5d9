//! Operator signatures and their alias annotations.
//!
//! A signature is written the way operators are declared, e.g.
//! `aten::add_(Tensor(a!) self, Tensor other, *, Scalar alpha=1) -> Tensor(a!)`.
//! The graph core only reads arities, argument types, the vararg/varret flags
//! and the alias annotations.

mod alias_info;
mod parser;
mod registry;
mod symbol;

use ty::{match_type_variables, Ty, TypeEnv, TypingContext};

pub use alias_info::{AliasInfo, FormalAliasSet};
pub use parser::{parse_schema, ParseSchemaError};
pub use registry::OperatorRegistry;
pub use symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument<'ctx> {
    /// Empty for unnamed returns.
    pub name: &'ctx str,
    pub ty: Ty<'ctx>,
    /// Default value, kept as written.
    pub default: Option<&'ctx str>,
    pub alias_info: Option<AliasInfo<'ctx>>,
    pub kwarg_only: bool,
}

impl<'ctx> Argument<'ctx> {
    pub fn new(name: &'ctx str, ty: Ty<'ctx>) -> Self {
        Self {
            name,
            ty,
            default: None,
            alias_info: None,
            kwarg_only: false,
        }
    }

    pub fn with_alias_info(mut self, alias_info: AliasInfo<'ctx>) -> Self {
        self.alias_info = Some(alias_info);
        self
    }

    pub fn is_write(&self) -> bool {
        self.alias_info.as_ref().is_some_and(|info| info.is_write)
    }
}

impl std::fmt::Display for Argument<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.alias_info, self.ty.as_list()) {
            (Some(info), Some(elem)) if !info.contained_types.is_empty() => {
                write!(f, "{elem}({})[]", info.contained_types[0])?;
                if !info.sets.is_empty() {
                    write!(f, "({info})")?;
                }
            }
            (Some(info), _) => write!(f, "{}({info})", self.ty)?,
            (None, _) => write!(f, "{}", self.ty)?,
        }
        if !self.name.is_empty() {
            write!(f, " {}", self.name)?;
        }
        if let Some(default) = self.default {
            write!(f, "={default}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSchema<'ctx> {
    pub name: Symbol<'ctx>,
    pub arguments: Vec<Argument<'ctx>>,
    pub returns: Vec<Argument<'ctx>>,
    /// Accepts any number of trailing inputs.
    pub is_vararg: bool,
    /// Produces any number of trailing outputs.
    pub is_varret: bool,
}

impl<'ctx> FunctionSchema<'ctx> {
    /// Whether a node with these input types and output count can be an
    /// instance of this schema.
    pub fn matches(
        &self,
        ctx: &TypingContext<'ctx>,
        inputs: &[Ty<'ctx>],
        num_outputs: usize,
    ) -> bool {
        let arity_ok = if self.is_vararg {
            inputs.len() >= self.arguments.len()
        } else {
            inputs.len() == self.arguments.len()
        };
        let coarity_ok = if self.is_varret {
            num_outputs >= self.returns.len()
        } else {
            num_outputs == self.returns.len()
        };
        if !arity_ok || !coarity_ok {
            return false;
        }

        let mut env = TypeEnv::default();
        self.arguments.iter().zip(inputs).all(|(formal, &actual)| {
            match match_type_variables(ctx, formal.ty, actual, &mut env) {
                Ok(formal) => actual.is_subtype_of(formal),
                Err(err) => {
                    log::trace!("{} does not match: {err}", self.name);
                    false
                }
            }
        })
    }

    pub fn has_mutable_arguments(&self) -> bool {
        self.arguments.iter().any(Argument::is_write)
    }
}

impl std::fmt::Display for FunctionSchema<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        let mut seen_kwarg_only = false;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if arg.kwarg_only && !seen_kwarg_only {
                seen_kwarg_only = true;
                write!(f, "*, ")?;
            }
            write!(f, "{arg}")?;
        }
        if self.is_vararg {
            if !self.arguments.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "...")?;
        }
        write!(f, ") -> ")?;

        let returns = self
            .returns
            .iter()
            .map(ToString::to_string)
            .chain(self.is_varret.then(|| "...".to_string()))
            .collect::<Vec<_>>();
        if returns.len() == 1 {
            write!(f, "{}", returns[0])
        } else {
            write!(f, "({})", returns.join(", "))
        }
    }
}
