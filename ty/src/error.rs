use crate::Ty;

/// Why a generic signature could not be matched against an actual type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchTypeError<'ctx> {
    #[error("type variable '{var}' previously matched to type {previous} is matched to type {actual}")]
    ConflictingBinding {
        var: &'ctx str,
        previous: Ty<'ctx>,
        actual: Ty<'ctx>,
    },
    #[error("cannot match a list to {actual}")]
    NotAList { actual: Ty<'ctx> },
    #[error("cannot match a tuple to {actual}")]
    NotATuple { actual: Ty<'ctx> },
    #[error("cannot match tuples of mismatched size ({formal} vs {actual})")]
    TupleSizeMismatch { formal: usize, actual: usize },
    #[error("cannot match a future to {actual}")]
    NotAFuture { actual: Ty<'ctx> },
}
