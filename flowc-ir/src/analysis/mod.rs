//! Derived, CFG-shape-dependent analyses: dominance and dominance frontiers.
//!
//! These are caches owned by the pipeline, not the IR itself — any pass
//! that changes block wiring invalidates them, and the pipeline recomputes
//! on demand (§5 of the design notes) rather than keeping them consistent
//! incrementally.

pub mod dominators;

pub use dominators::Dominance;
