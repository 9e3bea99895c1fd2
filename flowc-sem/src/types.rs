//! Types used by the semantic checker.
//!
//! The checker works directly over [`flowc_par::ast::Type`] — there is no
//! separate HIR-level type representation at this scale. This module only
//! adds the function-signature bookkeeping the checker needs for call
//! resolution.

use flowc_par::ast::Type;
use flowc_util::Symbol;

/// Resolved signature of a declared function, used to check call arity,
/// argument types, and whether a call produces a value.
#[derive(Debug, Clone)]
pub struct FnSig {
    pub name: Symbol,
    pub params: Vec<Type>,
    pub ret_type: Option<Type>,
}

/// Total element count of an array shape (1 for a scalar).
pub fn shape_len(ty: &Type) -> usize {
    if ty.shape().is_empty() {
        1
    } else {
        ty.shape().iter().product()
    }
}
