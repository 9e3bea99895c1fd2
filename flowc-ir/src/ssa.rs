//! SSA construction: promotes scalar (`int`-shaped) locals held in
//! `alloca`+`load`/`store` form into direct SSA values.
//!
//! The CFG builder (`build.rs`) gives every local — scalar or array — a
//! memory slot, since it has no notion of "the current value of `x`" across
//! a branch. This pass is the classical Cytron et al. construction applied
//! to just the scalar slots: it places phis at the iterated dominance
//! frontier of each slot's store sites, then renames loads and stores to
//! direct SSA values in one dominator-tree-preorder walk with per-variable
//! value stacks.
//!
//! Array-shaped allocas are left untouched — with no static alias analysis
//! here, a `load`/`store` pair through a dynamically-indexed array base is
//! never rewritten to a phi value (§4.3 "Arrays").

use crate::analysis::dominators::iterated_dominance_frontier;
use crate::analysis::Dominance;
use crate::ir::{BlockId, Function, InstKind, InstrId, Value};
use flowc_util::{FxHashMap, FxHashSet};

/// Promotes every scalar alloca in `func` to SSA form in place.
///
/// Requires `func.refresh_preds()` to already be current (true right after
/// `build_function`, since nothing has touched the CFG shape yet) and `dom`
/// to have been computed over that same shape. Leaves the CFG shape itself
/// untouched, so `dom` stays valid for the caller's next analysis.
pub fn construct(func: &mut Function, dom: &Dominance) {
    let candidates = scalar_allocas(func);
    if candidates.is_empty() {
        return;
    }
    let candidate_set: FxHashSet<InstrId> = candidates.iter().copied().collect();

    let mut phi_of: FxHashMap<(InstrId, BlockId), InstrId> = FxHashMap::default();
    for &alloca in &candidates {
        let def_blocks = store_blocks(func, alloca);
        let frontier = iterated_dominance_frontier(dom, &def_blocks);
        let mut frontier: Vec<BlockId> = frontier.into_iter().collect();
        frontier.sort_by_key(|b| b.index());
        for block in frontier {
            if !dom.is_reachable(block) {
                continue;
            }
            let span = func.inst(alloca).span;
            let phi_id = func.push_instr(block, span, InstKind::Phi(Vec::new()));
            phi_of.insert((alloca, block), phi_id);
        }
    }

    let mut stacks: FxHashMap<InstrId, Vec<Value>> =
        candidates.iter().map(|&a| (a, Vec::new())).collect();
    let mut load_resolved: FxHashMap<InstrId, Value> = FxHashMap::default();
    let mut dead: Vec<InstrId> = Vec::new();

    rename_block(
        func,
        dom,
        func.entry,
        &candidates,
        &candidate_set,
        &phi_of,
        &mut stacks,
        &mut load_resolved,
        &mut dead,
    );

    // A stack value pushed for one variable can itself be an unresolved
    // reference to another promoted load (e.g. `x = y;`); chase through
    // until we land on a value that isn't itself slated for deletion.
    func.map_all_operands(|v| resolve(&load_resolved, v));

    for id in dead {
        func.remove_instr(id);
    }
    for alloca in candidates {
        func.remove_instr(alloca);
    }
}

fn resolve(map: &FxHashMap<InstrId, Value>, v: Value) -> Value {
    let mut v = v;
    let mut guard = 0;
    while let Value::Reg(id) = v {
        match map.get(&id) {
            Some(&next) if guard < 10_000 => {
                v = next;
                guard += 1;
            }
            _ => break,
        }
    }
    v
}

fn scalar_allocas(func: &Function) -> Vec<InstrId> {
    let mut out = Vec::new();
    for b in func.block_ids() {
        for id in func.block(b).insts.iter().copied() {
            if let InstKind::Alloca(ty) = &func.inst(id).kind {
                if !ty.is_array() {
                    out.push(id);
                }
            }
        }
    }
    out
}

fn store_blocks(func: &Function, alloca: InstrId) -> FxHashSet<BlockId> {
    let mut out = FxHashSet::default();
    for b in func.block_ids() {
        for id in func.block(b).insts.iter().copied() {
            if let InstKind::Store { base: Value::Reg(base), indices, .. } = &func.inst(id).kind {
                if *base == alloca && indices.is_empty() {
                    out.insert(b);
                }
            }
        }
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn rename_block(
    func: &mut Function,
    dom: &Dominance,
    block: BlockId,
    candidates: &[InstrId],
    candidate_set: &FxHashSet<InstrId>,
    phi_of: &FxHashMap<(InstrId, BlockId), InstrId>,
    stacks: &mut FxHashMap<InstrId, Vec<Value>>,
    load_resolved: &mut FxHashMap<InstrId, Value>,
    dead: &mut Vec<InstrId>,
) {
    let mut pushed: Vec<InstrId> = Vec::new();

    for &alloca in candidates {
        if let Some(&phi_id) = phi_of.get(&(alloca, block)) {
            stacks.get_mut(&alloca).unwrap().push(Value::Reg(phi_id));
            pushed.push(alloca);
        }
    }

    let inst_ids: Vec<InstrId> = func.block(block).insts.clone();
    for id in inst_ids {
        match func.inst(id).kind.clone() {
            InstKind::Load { base: Value::Reg(base), ref indices } if indices.is_empty() && candidate_set.contains(&base) => {
                let current = stacks[&base].last().copied().unwrap_or(Value::Const(0));
                load_resolved.insert(id, current);
                dead.push(id);
            }
            InstKind::Store { base: Value::Reg(base), ref indices, value } if indices.is_empty() && candidate_set.contains(&base) => {
                stacks.get_mut(&base).unwrap().push(value);
                pushed.push(base);
                dead.push(id);
            }
            _ => {}
        }
    }

    for succ in func.block(block).terminator.successors() {
        for &alloca in candidates {
            if let Some(&phi_id) = phi_of.get(&(alloca, succ)) {
                let current = stacks[&alloca].last().copied().unwrap_or(Value::Const(0));
                if let InstKind::Phi(incoming) = &mut func.inst_mut(phi_id).kind {
                    incoming.push((current, block));
                }
            }
        }
    }

    for &child in dom.dom_children(block) {
        rename_block(
            func,
            dom,
            child,
            candidates,
            candidate_set,
            phi_of,
            stacks,
            load_resolved,
            dead,
        );
    }

    for alloca in pushed {
        stacks.get_mut(&alloca).unwrap().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_function;
    use crate::ir::Terminator;
    use flowc_sem::check_program;
    use flowc_util::Handler;

    fn build(src: &str) -> Function {
        let mut handler = Handler::new();
        let ast = flowc_par::parse(src, &mut handler).expect("parses");
        let checked = check_program(ast, &mut handler).expect("checks");
        let sigs = checked.signatures.clone();
        let mut f = build_function(&checked.ast[0], &sigs);
        f.refresh_preds();
        f
    }

    fn no_scalar_mem_ops(f: &Function) -> bool {
        for b in f.block_ids() {
            for id in f.block(b).all_insts() {
                match &f.inst(id).kind {
                    InstKind::Alloca(ty) if !ty.is_array() => return false,
                    InstKind::Load { base: Value::Reg(base), indices } if indices.is_empty() => {
                        if let InstKind::Alloca(ty) = &f.inst(*base).kind {
                            if !ty.is_array() {
                                return false;
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        true
    }

    #[test]
    fn straight_line_scalar_has_no_surviving_loads_or_stores() {
        let mut f = build("func f() -> int { let x int = 1; let y int = x + 1; return y; }");
        let dom = Dominance::compute(&f);
        construct(&mut f, &dom);
        assert!(no_scalar_mem_ops(&f));
    }

    #[test]
    fn diamond_merge_inserts_a_phi() {
        let mut f = build(
            "func f(c int) -> int { let x int = 0; if (c) { x = 1; } else { x = 2; } return x; }",
        );
        let dom = Dominance::compute(&f);
        construct(&mut f, &dom);
        assert!(no_scalar_mem_ops(&f));
        let has_phi = f
            .block_ids()
            .any(|b| f.block(b).phis.iter().any(|&id| f.inst(id).kind.is_phi()));
        assert!(has_phi, "merging two scalar definitions should place a phi");
    }

    #[test]
    fn loop_variable_phi_has_two_incoming_edges() {
        let mut f = build(
            "func f(n int) -> int { let s int = 0; for (let i int = 0; i < n; i = i + 1) { s = s + i; } return s; }",
        );
        let dom = Dominance::compute(&f);
        construct(&mut f, &dom);
        assert!(no_scalar_mem_ops(&f));
        let phi_arities: Vec<usize> = f
            .block_ids()
            .flat_map(|b| f.block(b).phis.clone())
            .filter_map(|id| match &f.inst(id).kind {
                InstKind::Phi(incoming) => Some(incoming.len()),
                _ => None,
            })
            .collect();
        assert!(phi_arities.iter().any(|&n| n == 2));
    }

    #[test]
    fn array_alloca_is_never_promoted() {
        let mut f = build(
            "func f() -> int { let a [4]int = {}; a[0] = 9; return a[0]; }",
        );
        let dom = Dominance::compute(&f);
        construct(&mut f, &dom);
        let still_has_array_alloca = f
            .block_ids()
            .flat_map(|b| f.block(b).insts.clone())
            .any(|id| matches!(&f.inst(id).kind, InstKind::Alloca(ty) if ty.is_array()));
        assert!(still_has_array_alloca);
    }

    #[test]
    fn return_value_is_rewritten_to_the_final_definition() {
        let mut f = build("func f() -> int { let x int = 5; return x; }");
        let dom = Dominance::compute(&f);
        construct(&mut f, &dom);
        let ret_block = f
            .block_ids()
            .find(|&b| matches!(f.block(b).terminator, Terminator::Return(Some(_))))
            .expect("a return block exists");
        match f.block(ret_block).terminator {
            Terminator::Return(Some(Value::Const(5))) => {}
            ref other => panic!("expected the constant to fold through, got {other:?}"),
        }
    }
}
