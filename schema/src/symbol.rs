use data_structure::interning::Interned;
use ty::TypingContext;

/// An interned, namespace-qualified name such as `aten::add` or `alias::a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol<'ctx>(Interned<'ctx, str>);

impl<'ctx> Symbol<'ctx> {
    /// Panics if `qualified` has no `::` separator.
    pub fn new(ctx: &TypingContext<'ctx>, qualified: &str) -> Self {
        assert!(
            qualified.contains("::"),
            "symbol `{qualified}` is not namespace-qualified"
        );
        Self(Interned::new_unchecked(ctx.intern_str(qualified)))
    }

    pub fn from_parts(ctx: &TypingContext<'ctx>, ns: &str, name: &str) -> Self {
        Self::new(ctx, &format!("{ns}::{name}"))
    }

    pub fn as_str(self) -> &'ctx str {
        self.0 .0
    }

    pub fn ns(self) -> &'ctx str {
        self.split().0
    }

    /// The name without its namespace.
    pub fn name(self) -> &'ctx str {
        self.split().1
    }

    fn split(self) -> (&'ctx str, &'ctx str) {
        self.as_str()
            .split_once("::")
            .expect("checked at construction")
    }
}

impl std::fmt::Display for Symbol<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
