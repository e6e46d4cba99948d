//! Application layer: pattern matching, tree rendering, and prompt assembly.

pub mod assemble;
pub mod export;
pub mod ignore;
pub mod state;
pub mod tree;
