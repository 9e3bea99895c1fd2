//! CFG cleanup: drop unreachable blocks, merge straight-line jumps, and
//! collapse trivial phis, iterated to a fixpoint.
//!
//! Runs after SCCP (which can turn a `branch` into an always-taken edge,
//! orphaning the other arm) and after DCE, to keep the IR's shape as small
//! and as close to the source's control structure as the optimizations
//! allow. None of these three steps changes program behavior on its own;
//! they only ever remove blocks/phis nothing can reach or nothing needs.

use crate::ir::{reachable_blocks, BlockId, Function, InstKind, InstrId, Terminator, Value};
use flowc_util::FxHashMap;

/// Runs drop-unreachable, collapse-trivial-phi, and merge-straight-line to
/// a fixpoint. Returns whether anything changed.
pub fn run(func: &mut Function) -> bool {
    func.refresh_preds();
    let mut changed = false;
    loop {
        let mut did = false;
        did |= drop_unreachable(func);
        did |= collapse_trivial_phis(func);
        did |= merge_straight_line(func);
        if did {
            changed = true;
            func.refresh_preds();
        } else {
            break;
        }
    }
    changed
}

/// Renumbers blocks to exclude anything not reachable from entry, dropping
/// stale phi-incoming entries and predecessor references that pointed at
/// them.
fn drop_unreachable(func: &mut Function) -> bool {
    let reachable = reachable_blocks(func);
    let old_ids: Vec<BlockId> = func.block_ids().filter(|b| reachable.contains_key(b)).collect();
    if old_ids.len() == func.block_count() {
        return false;
    }

    let remap: FxHashMap<BlockId, BlockId> = old_ids
        .iter()
        .enumerate()
        .map(|(i, &old)| (old, BlockId(i as u32)))
        .collect();

    let mut new_blocks = Vec::with_capacity(old_ids.len());
    for &old in &old_ids {
        let mut b = func.block(old).clone();
        b.id = remap[&old];
        b.preds.retain(|p| remap.contains_key(p));
        b.preds = b.preds.iter().map(|p| remap[p]).collect();
        b.idom = b.idom.and_then(|d| remap.get(&d).copied());
        for succ in b.terminator.successors_mut() {
            *succ = remap[succ];
        }
        new_blocks.push(b);
    }

    for b in &new_blocks {
        for &id in &b.insts {
            func.inst_mut(id).block = b.id;
        }
        for &phi_id in &b.phis {
            func.inst_mut(phi_id).block = b.id;
            if let InstKind::Phi(incoming) = &mut func.inst_mut(phi_id).kind {
                incoming.retain(|(_, src)| remap.contains_key(src));
                for (_, src) in incoming.iter_mut() {
                    *src = remap[src];
                }
            }
        }
    }

    func.blocks = new_blocks;
    func.entry = remap[&func.entry];
    true
}

/// A phi is trivial once every non-self-referential incoming value is the
/// same single value (including the degenerate single-predecessor case).
/// Rewrites every use to that value and removes the phi.
fn collapse_trivial_phis(func: &mut Function) -> bool {
    let mut changed = false;
    loop {
        let phi_ids: Vec<InstrId> = func.block_ids().flat_map(|b| func.block(b).phis.clone()).collect();
        let mut did = false;
        for id in phi_ids {
            let InstKind::Phi(incoming) = func.inst(id).kind.clone() else {
                continue;
            };
            let mut distinct: Option<Value> = None;
            let mut trivial = true;
            for (v, _) in &incoming {
                if *v == Value::Reg(id) {
                    continue;
                }
                match distinct {
                    None => distinct = Some(*v),
                    Some(d) if d == *v => {}
                    Some(_) => {
                        trivial = false;
                        break;
                    }
                }
            }
            if !trivial {
                continue;
            }
            let replacement = distinct.unwrap_or(Value::Const(0));
            func.map_all_operands(|v| if v == Value::Reg(id) { replacement } else { v });
            func.remove_instr(id);
            did = true;
            changed = true;
        }
        if !did {
            break;
        }
    }
    changed
}

/// Folds a block ending in an unconditional jump into its sole successor
/// when that successor has no other predecessor and no phis left to
/// reconcile.
fn merge_straight_line(func: &mut Function) -> bool {
    let mut changed = false;
    loop {
        let mut did = false;
        for b in func.block_ids().collect::<Vec<_>>() {
            let Terminator::Jump(target) = func.block(b).terminator else {
                continue;
            };
            if target == b || target == func.entry {
                continue;
            }
            if func.block(target).preds.len() != 1 || !func.block(target).phis.is_empty() {
                continue;
            }
            let target_insts = func.block(target).insts.clone();
            let new_term = func.block(target).terminator.clone();
            for &id in &target_insts {
                func.inst_mut(id).block = b;
            }
            func.block_mut(b).insts.extend(target_insts);
            func.block_mut(b).terminator = new_term;
            func.block_mut(target).insts.clear();
            did = true;
            changed = true;
        }
        if did {
            func.refresh_preds();
        } else {
            break;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Dominance;
    use crate::build::build_function;
    use crate::ssa;
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

    #[test]
    fn an_if_with_both_branches_returning_merges_nothing_unreachable() {
        let mut f = build(
            "func f(c int) -> int { if (c) { return 1; } else { return 2; } }",
        );
        let before = f.block_count();
        run(&mut f);
        assert!(f.block_count() <= before);
    }

    #[test]
    fn trivial_phi_from_a_diamond_merge_is_collapsed_to_the_common_value() {
        let mut f = build(
            "func f(c int) -> int { let x int = 0; if (c) { x = 5; } else { x = 5; } return x; }",
        );
        let dom = Dominance::compute(&f);
        ssa::construct(&mut f, &dom);
        run(&mut f);
        let has_phi = f.block_ids().any(|b| !f.block(b).phis.is_empty());
        assert!(!has_phi, "both arms define the same constant, the phi should collapse away");
    }

    #[test]
    fn straight_line_blocks_merge_into_one() {
        let mut f = build("func f() -> int { let x int = 1; let y int = 2; return x + y; }");
        run(&mut f);
        assert_eq!(f.block_count(), 1);
    }
}
