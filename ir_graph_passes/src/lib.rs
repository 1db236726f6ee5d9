mod alias_analysis;

pub use alias_analysis::*;
