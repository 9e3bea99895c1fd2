//! Lexical scope tracking for name resolution.
//!
//! A [`ScopeTree`] is a stack of "ribs" (one per function body, nested
//! block, or loop body) used by [`crate::analysis::Checker`] to resolve
//! identifiers and to reject shadowing of an identifier already live in an
//! outer scope.

use flowc_util::{DefId, Idx, Symbol};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RibId(pub u32);

impl Idx for RibId {
    fn from_usize(idx: usize) -> Self {
        RibId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RibKind {
    Function,
    Block,
    Loop,
}

#[derive(Debug)]
struct Rib {
    bindings: HashMap<Symbol, DefId>,
    parent: Option<RibId>,
    kind: RibKind,
}

/// A stack-shaped scope tree: each rib keeps its bindings and a link to its
/// parent, so resolution walks outward and shadowing checks can see every
/// enclosing rib without needing to track them in a separate `Vec`.
pub struct ScopeTree {
    ribs: Vec<Rib>,
    current: RibId,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            ribs: vec![Rib {
                bindings: HashMap::new(),
                parent: None,
                kind: RibKind::Function,
            }],
            current: RibId(0),
        }
    }

    pub fn enter(&mut self, kind: RibKind) {
        let parent = self.current;
        self.ribs.push(Rib {
            bindings: HashMap::new(),
            parent: Some(parent),
            kind,
        });
        self.current = RibId((self.ribs.len() - 1) as u32);
    }

    pub fn exit(&mut self) {
        if let Some(parent) = self.ribs[self.current.index()].parent {
            self.current = parent;
        }
    }

    /// Binds `name` in the current rib. Fails if `name` is already visible
    /// in the current rib or any enclosing one (shadowing is rejected).
    pub fn declare(&mut self, name: Symbol, def_id: DefId) -> Result<(), ()> {
        if self.resolve(name).is_some() {
            return Err(());
        }
        self.ribs[self.current.index()]
            .bindings
            .insert(name, def_id);
        Ok(())
    }

    pub fn resolve(&self, name: Symbol) -> Option<DefId> {
        let mut rib = self.current;
        loop {
            if let Some(&id) = self.ribs[rib.index()].bindings.get(&name) {
                return Some(id);
            }
            rib = self.ribs[rib.index()].parent?;
        }
    }

    pub fn in_loop(&self) -> bool {
        let mut rib = self.current;
        loop {
            match self.ribs[rib.index()].kind {
                RibKind::Loop => return true,
                RibKind::Function => return false,
                RibKind::Block => match self.ribs[rib.index()].parent {
                    Some(parent) => rib = parent,
                    None => return false,
                },
            }
        }
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
