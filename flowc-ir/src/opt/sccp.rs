//! Sparse Conditional Constant Propagation (Wegman & Zadeck): a joint
//! value/edge-reachability fixpoint that folds constants through phis while
//! only trusting definitions reached along CFG edges it has proven
//! executable — strictly more precise than folding constants block-by-block
//! and then separately asking "is this block reachable?".
//!
//! The lattice per SSA value is `Top` (not yet evaluated) → `Const(k)` →
//! `Bottom` (proven to vary), moving only downward so the two worklists
//! below always terminate. `array` loads, `call`s, and parameters start at
//! `Bottom` immediately — this pass has no alias or interprocedural
//! analysis, so memory and call results are always treated as unknown.

use crate::ir::{BlockId, Function, InstKind, InstrId, Terminator, Value};
use flowc_sem::{BinOp, UnOp};
use flowc_util::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Lat {
    Top,
    Const(i64),
    Bottom,
}

fn meet(a: Lat, b: Lat) -> Lat {
    match (a, b) {
        (Lat::Top, x) | (x, Lat::Top) => x,
        (Lat::Bottom, _) | (_, Lat::Bottom) => Lat::Bottom,
        (Lat::Const(x), Lat::Const(y)) => {
            if x == y {
                Lat::Const(x)
            } else {
                Lat::Bottom
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Work {
    Inst(InstrId),
    Term(BlockId),
}

struct Solver<'a> {
    func: &'a Function,
    lat: FxHashMap<InstrId, Lat>,
    reachable: FxHashSet<BlockId>,
    executable_edges: FxHashSet<(BlockId, BlockId)>,
    inst_users: FxHashMap<InstrId, Vec<Work>>,
    worklist: VecDeque<Work>,
}

impl<'a> Solver<'a> {
    fn new(func: &'a Function) -> Self {
        let mut lat = FxHashMap::default();
        let mut inst_users: FxHashMap<InstrId, Vec<Work>> = FxHashMap::default();
        for b in func.block_ids() {
            for id in func.block(b).all_insts() {
                let kind = &func.inst(id).kind;
                if kind.defines_value() {
                    let initial = match kind {
                        InstKind::Const(k) => Lat::Const(*k),
                        InstKind::Alloca(_) | InstKind::Load { .. } | InstKind::Call { .. } | InstKind::Param(_) => {
                            Lat::Bottom
                        }
                        _ => Lat::Top,
                    };
                    lat.insert(id, initial);
                }
                for operand in kind.operands() {
                    if let Value::Reg(def) = operand {
                        inst_users.entry(def).or_default().push(Work::Inst(id));
                    }
                }
            }
            for operand in func.block(b).terminator.operands() {
                if let Value::Reg(def) = operand {
                    inst_users.entry(def).or_default().push(Work::Term(b));
                }
            }
        }
        Self {
            func,
            lat,
            reachable: FxHashSet::default(),
            executable_edges: FxHashSet::default(),
            inst_users,
            worklist: VecDeque::new(),
        }
    }

    fn lookup(&self, v: Value) -> Lat {
        match v {
            Value::Const(k) => Lat::Const(k),
            Value::Reg(id) => self.lat.get(&id).copied().unwrap_or(Lat::Top),
        }
    }

    fn set_lat(&mut self, id: InstrId, candidate: Lat) {
        let old = self.lat.get(&id).copied().unwrap_or(Lat::Top);
        let new = meet(old, candidate);
        if new != old {
            self.lat.insert(id, new);
            if let Some(users) = self.inst_users.get(&id) {
                for &w in users {
                    self.worklist.push_back(w);
                }
            }
        }
    }

    fn mark_edge(&mut self, from: BlockId, to: BlockId) {
        if !self.executable_edges.insert((from, to)) {
            return;
        }
        if self.reachable.insert(to) {
            self.worklist.push_back(Work::Term(to));
            for id in self.func.block(to).all_insts() {
                self.worklist.push_back(Work::Inst(id));
            }
        } else {
            for &phi in &self.func.block(to).phis {
                self.worklist.push_back(Work::Inst(phi));
            }
        }
    }

    fn eval_inst(&mut self, id: InstrId) {
        let block = self.func.inst(id).block;
        if !self.reachable.contains(&block) {
            return;
        }
        let candidate = match &self.func.inst(id).kind {
            InstKind::Phi(incoming) => {
                let mut acc = Lat::Top;
                for &(v, src) in incoming {
                    if self.executable_edges.contains(&(src, block)) {
                        acc = meet(acc, self.lookup(v));
                    }
                }
                acc
            }
            InstKind::Const(k) => Lat::Const(*k),
            InstKind::Binop(op, a, b) => {
                let result = eval_binop(*op, self.lookup(*a), self.lookup(*b));
                if matches!(op, BinOp::Div | BinOp::Mod) && matches!(self.lookup(*b), Lat::Const(0)) {
                    let inst = self.func.inst(id);
                    tracing::warn!(
                        block = inst.block.index(),
                        inst = id.index(),
                        span = ?inst.span,
                        "constant division/modulo by zero left unfolded; will trap at runtime"
                    );
                }
                result
            }
            InstKind::Unop(op, a) => eval_unop(*op, self.lookup(*a)),
            InstKind::Alloca(_) | InstKind::Load { .. } | InstKind::Call { .. } | InstKind::Param(_) => Lat::Bottom,
            InstKind::Store { .. } => return,
        };
        self.set_lat(id, candidate);
    }

    fn eval_term(&mut self, b: BlockId) {
        if !self.reachable.contains(&b) {
            return;
        }
        match self.func.block(b).terminator {
            Terminator::Jump(t) => self.mark_edge(b, t),
            Terminator::Branch { cond, then_block, else_block } => match self.lookup(cond) {
                Lat::Const(k) if k != 0 => self.mark_edge(b, then_block),
                Lat::Const(_) => self.mark_edge(b, else_block),
                Lat::Bottom => {
                    self.mark_edge(b, then_block);
                    self.mark_edge(b, else_block);
                }
                Lat::Top => {}
            },
            Terminator::Return(_) => {}
        }
    }

    fn solve(mut self) -> Self {
        let entry = self.func.entry;
        self.reachable.insert(entry);
        self.worklist.push_back(Work::Term(entry));
        for id in self.func.block(entry).all_insts() {
            self.worklist.push_back(Work::Inst(id));
        }
        while let Some(w) = self.worklist.pop_front() {
            match w {
                Work::Inst(id) => self.eval_inst(id),
                Work::Term(b) => self.eval_term(b),
            }
        }
        self
    }
}

fn eval_binop(op: BinOp, a: Lat, b: Lat) -> Lat {
    match (a, b) {
        (Lat::Bottom, _) | (_, Lat::Bottom) => Lat::Bottom,
        (Lat::Top, _) | (_, Lat::Top) => Lat::Top,
        (Lat::Const(x), Lat::Const(y)) => fold_binop(op, x, y),
    }
}

fn fold_binop(op: BinOp, x: i64, y: i64) -> Lat {
    let as_bool = |b: bool| Lat::Const(b as i64);
    match op {
        BinOp::Add => Lat::Const(x.wrapping_add(y)),
        BinOp::Sub => Lat::Const(x.wrapping_sub(y)),
        BinOp::Mul => Lat::Const(x.wrapping_mul(y)),
        BinOp::Div => {
            if y == 0 {
                Lat::Bottom
            } else {
                Lat::Const(x.wrapping_div(y))
            }
        }
        BinOp::Mod => {
            if y == 0 {
                Lat::Bottom
            } else {
                Lat::Const(x.wrapping_rem(y))
            }
        }
        BinOp::Eq => as_bool(x == y),
        BinOp::Ne => as_bool(x != y),
        BinOp::Lt => as_bool(x < y),
        BinOp::Le => as_bool(x <= y),
        BinOp::Gt => as_bool(x > y),
        BinOp::Ge => as_bool(x >= y),
        BinOp::And => as_bool(x != 0 && y != 0),
        BinOp::Or => as_bool(x != 0 || y != 0),
    }
}

fn eval_unop(op: UnOp, a: Lat) -> Lat {
    match a {
        Lat::Bottom => Lat::Bottom,
        Lat::Top => Lat::Top,
        Lat::Const(x) => match op {
            UnOp::Neg => Lat::Const(x.wrapping_neg()),
            UnOp::Not => Lat::Const((x == 0) as i64),
        },
    }
}

/// Folds provably-constant values and provably-single-target branches in
/// place. Returns whether anything changed. Blocks SCCP proves unreachable
/// are left as-is for `opt::cleanup` to drop — this pass only ever narrows
/// a branch to a jump, never removes a block itself.
pub fn run(func: &mut Function) -> bool {
    let solver = Solver::new(func).solve();
    let lat = solver.lat;
    let executable_edges = solver.executable_edges;

    let mut changed = false;

    // Every value the solver proved constant: replace its uses (including
    // terminator operands) with the literal, then delete the defining
    // instruction — it's always pure, since `eval_inst` only ever lands a
    // load/call/alloca/store on `Bottom`, never `Const` (§4.4 Rewriting).
    let folded: FxHashMap<InstrId, i64> = lat
        .iter()
        .filter_map(|(&id, &l)| match l {
            Lat::Const(k) if !matches!(func.inst(id).kind, InstKind::Const(_)) => Some((id, k)),
            _ => None,
        })
        .collect();
    if !folded.is_empty() {
        func.map_all_operands(|v| match v {
            Value::Reg(id) => folded.get(&id).map(|&k| Value::Const(k)).unwrap_or(v),
            Value::Const(_) => v,
        });
        for &id in folded.keys() {
            func.remove_instr(id);
        }
        changed = true;
    }

    for b in func.block_ids().collect::<Vec<_>>() {
        if let Terminator::Branch { then_block, else_block, .. } = func.block(b).terminator {
            let then_exec = executable_edges.contains(&(b, then_block));
            let else_exec = executable_edges.contains(&(b, else_block));
            if then_exec && !else_exec {
                func.block_mut(b).terminator = Terminator::Jump(then_block);
                changed = true;
            } else if else_exec && !then_exec {
                func.block_mut(b).terminator = Terminator::Jump(else_block);
                changed = true;
            }
        }
    }
    changed
}
