//! The SSA IR model: typed values, instructions, basic blocks, and
//! functions.
//!
//! Instructions live in a dense per-function arena (`Function::instrs`) and
//! are referenced by id from both blocks and other instructions' operands —
//! reverse use-lists are rebuilt on demand by passes rather than kept
//! consistent at every mutation.

use flowc_sem::{BinOp, Type, UnOp};
use flowc_util::{define_idx, FxHashMap, Span, Symbol};

define_idx!(BlockId);
define_idx!(InstrId);

/// Either a literal 64-bit integer or a reference to an instruction's
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Const(i64),
    Reg(InstrId),
}

impl Value {
    pub fn as_const(self) -> Option<i64> {
        match self {
            Value::Const(k) => Some(k),
            Value::Reg(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstKind {
    /// Function parameter; only legal as the first instructions of the
    /// entry block, one per declared parameter, in order.
    Param(Symbol),
    Const(i64),
    Binop(BinOp, Value, Value),
    Unop(UnOp, Value),
    /// Declares local array storage of the given shape.
    Alloca(Type),
    /// Multi-dimensional array read: `base` must be an `Alloca` result.
    Load { base: Value, indices: Vec<Value> },
    /// Multi-dimensional array write; has no result.
    Store {
        base: Value,
        indices: Vec<Value>,
        value: Value,
    },
    /// Call to a (by-name) function; `void` iff the callee has no return
    /// type. Always treated as potentially side-effecting.
    Call { callee: Symbol, args: Vec<Value>, void: bool },
    /// SSA join: one incoming value per predecessor, in the same order as
    /// the containing block's `preds`.
    Phi(Vec<(Value, BlockId)>),
}

impl InstKind {
    pub fn is_phi(&self) -> bool {
        matches!(self, InstKind::Phi(_))
    }

    pub fn is_terminator_like(&self) -> bool {
        false
    }

    /// Deterministic, side-effect free, and trap-free.
    /// Division/modulo are only pure when the divisor can't be zero, which
    /// at this IR level we conservatively treat as never provably safe
    /// unless the divisor is a nonzero constant.
    pub fn is_pure(&self) -> bool {
        match self {
            InstKind::Param(_) | InstKind::Const(_) | InstKind::Unop(..) | InstKind::Phi(_) => true,
            InstKind::Binop(op, _, rhs) => {
                if matches!(op, BinOp::Div | BinOp::Mod) {
                    !matches!(rhs, Value::Const(0))
                } else {
                    true
                }
            }
            InstKind::Alloca(_) | InstKind::Load { .. } | InstKind::Call { .. } | InstKind::Store { .. } => false,
        }
    }

    pub fn is_store(&self) -> bool {
        matches!(self, InstKind::Store { .. })
    }

    pub fn is_call(&self) -> bool {
        matches!(self, InstKind::Call { .. })
    }

    pub fn is_alloca(&self) -> bool {
        matches!(self, InstKind::Alloca(_))
    }

    pub fn is_load(&self) -> bool {
        matches!(self, InstKind::Load { .. })
    }

    /// Whether this instruction defines a value (has an id usable by
    /// others). False only for `store` and `void` calls.
    pub fn defines_value(&self) -> bool {
        !matches!(self, InstKind::Store { .. })
            && !matches!(self, InstKind::Call { void: true, .. })
    }

    /// Operand values, in evaluation order (not including the containing
    /// block references inside phi pairs' predecessor ids, which aren't
    /// values).
    pub fn operands(&self) -> Vec<Value> {
        match self {
            InstKind::Param(_) | InstKind::Const(_) | InstKind::Alloca(_) => vec![],
            InstKind::Binop(_, a, b) => vec![*a, *b],
            InstKind::Unop(_, a) => vec![*a],
            InstKind::Load { base, indices } => {
                let mut v = vec![*base];
                v.extend(indices.iter().copied());
                v
            }
            InstKind::Store { base, indices, value } => {
                let mut v = vec![*base];
                v.extend(indices.iter().copied());
                v.push(*value);
                v
            }
            InstKind::Call { args, .. } => args.clone(),
            InstKind::Phi(incoming) => incoming.iter().map(|(v, _)| *v).collect(),
        }
    }

    /// Rewrites every occurrence of `from` to `to` among this instruction's
    /// value operands.
    pub fn replace_value(&mut self, from: Value, to: Value) {
        self.map_operands(|v| if v == from { to } else { v });
    }

    /// Applies `f` to every value operand in place. The general-purpose
    /// rewrite hook every pass that moves values around (SSA promotion,
    /// SCCP folding, LICM hoisting) builds on.
    pub fn map_operands(&mut self, mut f: impl FnMut(Value) -> Value) {
        match self {
            InstKind::Param(_) | InstKind::Const(_) | InstKind::Alloca(_) => {}
            InstKind::Binop(_, a, b) => {
                *a = f(*a);
                *b = f(*b);
            }
            InstKind::Unop(_, a) => *a = f(*a),
            InstKind::Load { base, indices } => {
                *base = f(*base);
                for idx in indices.iter_mut() {
                    *idx = f(*idx);
                }
            }
            InstKind::Store { base, indices, value } => {
                *base = f(*base);
                for idx in indices.iter_mut() {
                    *idx = f(*idx);
                }
                *value = f(*value);
            }
            InstKind::Call { args, .. } => {
                for a in args.iter_mut() {
                    *a = f(*a);
                }
            }
            InstKind::Phi(incoming) => {
                for (v, _) in incoming.iter_mut() {
                    *v = f(*v);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub id: InstrId,
    pub block: BlockId,
    pub span: Span,
    pub kind: InstKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Jump(BlockId),
    Branch {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Return(Option<Value>),
}

impl Terminator {
    /// Successor blocks in stable order (`then` before `else`).
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Jump(b) => vec![*b],
            Terminator::Branch { then_block, else_block, .. } => vec![*then_block, *else_block],
            Terminator::Return(_) => vec![],
        }
    }

    pub fn successors_mut(&mut self) -> Vec<&mut BlockId> {
        match self {
            Terminator::Jump(b) => vec![b],
            Terminator::Branch { then_block, else_block, .. } => vec![then_block, else_block],
            Terminator::Return(_) => vec![],
        }
    }

    /// Value operands carried directly by the terminator (branch condition,
    /// return value) — block targets aren't values.
    pub fn operands(&self) -> Vec<Value> {
        match self {
            Terminator::Branch { cond, .. } => vec![*cond],
            Terminator::Return(Some(v)) => vec![*v],
            Terminator::Return(None) | Terminator::Jump(_) => vec![],
        }
    }

    /// Value operands carried directly by the terminator (branch condition,
    /// return value) — block targets aren't values and are untouched.
    pub fn map_values_mut(&mut self, mut f: impl FnMut(Value) -> Value) {
        match self {
            Terminator::Branch { cond, .. } => *cond = f(*cond),
            Terminator::Return(Some(v)) => *v = f(*v),
            Terminator::Return(None) | Terminator::Jump(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub id: BlockId,
    /// Phi instructions, always first in the block.
    pub phis: Vec<InstrId>,
    /// Regular (non-phi, non-terminator) instructions.
    pub insts: Vec<InstrId>,
    pub terminator: Terminator,
    /// Derived from terminators across the function; recomputed by
    /// `Function::refresh_preds`, not maintained incrementally.
    pub preds: Vec<BlockId>,
    /// Set by dominator analysis; `None` for the entry block (or before
    /// dominators have been computed).
    pub idom: Option<BlockId>,
}

impl BasicBlock {
    fn new(id: BlockId) -> Self {
        Self {
            id,
            phis: Vec::new(),
            insts: Vec::new(),
            // Placeholder until the builder commits a real terminator;
            // any block still carrying this at cleanup time is dead.
            terminator: Terminator::Return(None),
            preds: Vec::new(),
            idom: None,
        }
    }

    /// All instruction ids in print/eval order: phis, then body.
    pub fn all_insts(&self) -> impl Iterator<Item = InstrId> + '_ {
        self.phis.iter().copied().chain(self.insts.iter().copied())
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub params: Vec<(Symbol, Type)>,
    pub ret_type: Option<Type>,
    pub entry: BlockId,
    pub blocks: Vec<BasicBlock>,
    pub instrs: Vec<Instruction>,
}

impl Function {
    pub fn new(name: Symbol, params: Vec<(Symbol, Type)>, ret_type: Option<Type>) -> Self {
        Self {
            name,
            params,
            ret_type,
            entry: BlockId(0),
            blocks: Vec::new(),
            instrs: Vec::new(),
        }
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(id));
        id
    }

    pub fn push_instr(&mut self, block: BlockId, span: Span, kind: InstKind) -> InstrId {
        let id = InstrId(self.instrs.len() as u32);
        let is_phi = kind.is_phi();
        self.instrs.push(Instruction { id, block, span, kind });
        if is_phi {
            self.blocks[block.index()].phis.push(id);
        } else {
            self.blocks[block.index()].insts.push(id);
        }
        id
    }

    pub fn inst(&self, id: InstrId) -> &Instruction {
        &self.instrs[id.index()]
    }

    pub fn inst_mut(&mut self, id: InstrId) -> &mut Instruction {
        &mut self.instrs[id.index()]
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.iter().map(|b| b.id)
    }

    /// Type produced by an instruction's result, if any.
    pub fn result_type(&self, id: InstrId) -> Option<Type> {
        let inst = self.inst(id);
        match &inst.kind {
            InstKind::Param(name) => self
                .params
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, ty)| ty.clone()),
            InstKind::Const(_) | InstKind::Binop(..) | InstKind::Unop(..) | InstKind::Load { .. } => {
                Some(Type::Int)
            }
            InstKind::Alloca(ty) => Some(ty.clone()),
            InstKind::Call { void, .. } => (!void).then_some(Type::Int),
            InstKind::Phi(_) => Some(Type::Int),
            InstKind::Store { .. } => None,
        }
    }

    /// Recomputes every block's `preds` from the current terminators. Must
    /// be called after any pass that changes the CFG shape before anything
    /// that reads `preds` (dominators, SSA renaming, phi predecessor
    /// order) runs.
    pub fn refresh_preds(&mut self) {
        for b in &mut self.blocks {
            b.preds.clear();
        }
        for b in self.blocks.clone() {
            for succ in b.terminator.successors() {
                self.blocks[succ.index()].preds.push(b.id);
            }
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Removes an instruction from its block's phi/inst list. The arena slot
    /// itself is left in place (ids are stable; nothing should reference a
    /// removed id afterwards) — passes must walk blocks' `all_insts`, not
    /// `instrs` directly, to avoid visiting tombstones.
    pub fn remove_instr(&mut self, id: InstrId) {
        let block = self.inst(id).block;
        let b = self.block_mut(block);
        b.phis.retain(|&i| i != id);
        b.insts.retain(|&i| i != id);
    }

    /// Rewrites every value operand across every live instruction, phi, and
    /// terminator in the function via `f`. Used by SSA promotion and SCCP to
    /// apply a batch of resolved substitutions in one pass.
    pub fn map_all_operands(&mut self, mut f: impl FnMut(Value) -> Value) {
        let ids: Vec<BlockId> = self.block_ids().collect();
        for b in ids {
            let inst_ids: Vec<InstrId> = self.block(b).all_insts().collect();
            for id in inst_ids {
                self.inst_mut(id).kind.map_operands(&mut f);
            }
            self.block_mut(b).terminator.map_values_mut(&mut f);
        }
    }
}

/// Map from block id to the set of blocks reachable from `entry` via
/// terminator edges. Shared by cleanup, SCCP rewriting, and dominators.
pub fn reachable_blocks(func: &Function) -> FxHashMap<BlockId, bool> {
    let mut seen = FxHashMap::default();
    let mut stack = vec![func.entry];
    seen.insert(func.entry, true);
    while let Some(b) = stack.pop() {
        for succ in func.block(b).terminator.successors() {
            if seen.insert(succ, true).is_none() {
                stack.push(succ);
            }
        }
    }
    seen
}
