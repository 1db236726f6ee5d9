use crate::{MoveSide, NodeId};

/// A relocation that would use a value before its definition.
///
/// The graph is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot move {mover:?} {side} {move_point:?} without breaking a data dependency")]
pub struct MoveError {
    pub mover: NodeId,
    pub move_point: NodeId,
    pub side: MoveSide,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("names may not be integers: {0}")]
    Numeric(String),
}
