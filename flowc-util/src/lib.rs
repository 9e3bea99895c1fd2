//! flowc-util - Core Utilities and Foundation Types
//!
//! Foundation types shared by every stage of the flowc pipeline: interned
//! identifiers ([`Symbol`]), source locations ([`Span`]), typed arenas
//! ([`IndexVec`]), definition identifiers ([`DefId`]), and diagnostic
//! reporting ([`diagnostic`]).

pub mod def_id;
pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use def_id::{DefId, DefIdGenerator};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level};
pub use error::{DiagnosticError, IndexVecError, SourceMapError, SymbolError};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::Symbol;

/// Macro to define index types easily
#[macro_export]
macro_rules! define_idx {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $crate::Idx for $name {
            fn from_usize(idx: usize) -> Self {
                assert!(idx <= u32::MAX as usize);
                $name(idx as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
