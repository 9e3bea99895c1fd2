//! flowc-sem - scope resolution, type checking, and shape checking for the
//! flowc source language.
//!
//! The checker validates a [`flowc_par::ast::Ast`] in place: it resolves
//! every identifier through lexical scoping, type-checks every expression,
//! checks array index arity and (best-effort) constant bounds, verifies
//! every value-returning function returns on every path, and confirms
//! `break`/`continue` only occur inside a loop. There is no separate HIR:
//! on success the checker hands the core the same AST it was given, along
//! with the function signature table the CFG builder needs to tell a
//! void call from a value-producing one.

pub mod analysis;
pub mod scope;
pub mod types;

pub use analysis::check;
pub use flowc_par::ast::{self, Ast, BinOp, Block, Expr, FnItem, Param, Place, Stmt, Type, UnOp};
pub use types::FnSig;

use flowc_util::{FxHashMap, Handler, Symbol};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SemError {
    #[error("semantic analysis failed with errors reported to the diagnostic handler")]
    Failed,
}

/// A source file whose functions have passed semantic checking.
pub struct CheckedProgram {
    pub ast: Ast,
    pub signatures: FxHashMap<Symbol, FnSig>,
}

/// Runs the semantic checker over a parsed program. Diagnostics are
/// reported to `handler`; on success the same AST is returned wrapped as a
/// [`CheckedProgram`].
pub fn check_program(ast: Ast, handler: &mut Handler) -> Result<CheckedProgram, SemError> {
    match check(&ast, handler) {
        Ok(signatures) => Ok(CheckedProgram { ast, signatures }),
        Err(()) => Err(SemError::Failed),
    }
}
