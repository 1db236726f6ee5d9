use data_structure::FxIndexSet;

use crate::Symbol;

/// A set name used in an alias annotation of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormalAliasSet<'ctx> {
    /// `a` in `Tensor(a)`, stored as `alias::a`.
    Named(Symbol<'ctx>),
    /// `*`: may alias anything.
    Wildcard,
}

impl std::fmt::Display for FormalAliasSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormalAliasSet::Named(sym) => write!(f, "{}", sym.name()),
            FormalAliasSet::Wildcard => write!(f, "*"),
        }
    }
}

/// Alias annotation of an argument or a return, e.g. `(a!)` in `Tensor(a!)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AliasInfo<'ctx> {
    pub sets: FxIndexSet<FormalAliasSet<'ctx>>,
    pub is_write: bool,
    /// Annotations of the element types, e.g. `a` in `Tensor(a)[]`.
    pub contained_types: Vec<AliasInfo<'ctx>>,
}

impl<'ctx> AliasInfo<'ctx> {
    pub fn is_wildcard(&self) -> bool {
        self.sets.contains(&FormalAliasSet::Wildcard)
    }

    /// The only set of this annotation.
    ///
    /// Panics on unions like `(a|b)`.
    pub fn set(&self) -> FormalAliasSet<'ctx> {
        assert_eq!(
            self.sets.len(),
            1,
            "expected exactly one alias set in ({self})"
        );
        self.sets[0]
    }
}

impl std::fmt::Display for AliasInfo<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, set) in self.sets.iter().enumerate() {
            if i > 0 {
                write!(f, "|")?;
            }
            write!(f, "{set}")?;
        }
        if self.is_write {
            write!(f, "!")?;
        }
        Ok(())
    }
}
