mod block;
pub mod context;
mod error;
mod graph;
mod lint;
mod move_validator;
mod node;
mod pretty;
mod syntax;
pub mod topo;
mod value;

#[cfg(test)]
mod test_util;

pub use block::BlockNodes;
pub use context::*;
pub use error::*;
pub use graph::*;
pub use move_validator::MoveSide;
pub use syntax::*;
