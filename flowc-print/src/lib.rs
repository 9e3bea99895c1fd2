//! Printers over the post-pipeline IR: a textual dump (`text`) and a
//! Graphviz DOT dump (`dot`), per §6 of the design notes. Both are pure
//! formatting — neither mutates nor re-analyzes the IR.

pub mod dot;
pub mod text;

pub use dot::to_dot;
pub use text::print_function;
