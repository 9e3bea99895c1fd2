//! Dead code elimination: backward essential-instruction marking.
//!
//! Terminators, `store`s, and `call`s are essential regardless of whether
//! their result is used — they have effects beyond producing a value.
//! Everything else (`const`, `binop`, `unop`, `load`, `alloca`, `phi`) is
//! essential only transitively, through being an operand of something
//! already marked. A single backward worklist pass from the always-essential
//! roots computes the fixpoint; anything left unmarked is dead and dropped.

use crate::ir::{Function, InstrId, Value};
use flowc_util::FxHashSet;

/// Removes every instruction in `func` that is neither essential nor
/// reachable (through value operands) from an essential instruction.
/// Returns whether anything changed, so callers can iterate passes to a
/// fixpoint.
pub fn run(func: &mut Function) -> bool {
    let mut essential: FxHashSet<InstrId> = FxHashSet::default();
    let mut worklist: Vec<InstrId> = Vec::new();

    for b in func.block_ids() {
        for id in func.block(b).all_insts() {
            let kind = &func.inst(id).kind;
            if kind.is_store() || kind.is_call() {
                if essential.insert(id) {
                    worklist.push(id);
                }
            }
        }
        for operand in func.block(b).terminator.operands() {
            if let Value::Reg(id) = operand {
                if essential.insert(id) {
                    worklist.push(id);
                }
            }
        }
    }

    while let Some(id) = worklist.pop() {
        for operand in func.inst(id).kind.operands() {
            if let Value::Reg(def) = operand {
                if essential.insert(def) {
                    worklist.push(def);
                }
            }
        }
    }

    let mut changed = false;
    let all_ids: Vec<InstrId> = func
        .block_ids()
        .flat_map(|b| func.block(b).all_insts().collect::<Vec<_>>())
        .collect();
    for id in all_ids {
        if !essential.contains(&id) {
            func.remove_instr(id);
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_function;
    use crate::ir::InstKind;
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
    fn unused_arithmetic_is_removed() {
        let mut f = build("func f() -> int { let x int = 1 + 2; return 0; }");
        run(&mut f);
        let has_binop = f
            .block_ids()
            .flat_map(|b| f.block(b).all_insts().collect::<Vec<_>>())
            .any(|id| matches!(f.inst(id).kind, InstKind::Binop(..)));
        assert!(!has_binop);
    }

    #[test]
    fn calls_survive_even_when_unused() {
        let mut h = Handler::new();
        let ast = flowc_par::parse(
            "func g() -> int { return 1; } func f() -> int { g(); return 0; }",
            &mut h,
        )
        .unwrap();
        let checked = check_program(ast, &mut h).unwrap();
        let mut f = build_function(&checked.ast[1], &checked.signatures);
        f.refresh_preds();
        run(&mut f);
        let has_call = f
            .block_ids()
            .flat_map(|b| f.block(b).all_insts().collect::<Vec<_>>())
            .any(|id| matches!(f.inst(id).kind, InstKind::Call { .. }));
        assert!(has_call, "a call must survive DCE even though its result is unused");
    }

    #[test]
    fn idempotent_on_an_already_minimal_function() {
        let mut f = build("func f() -> int { return 1; }");
        run(&mut f);
        let changed_again = run(&mut f);
        assert!(!changed_again, "a second DCE pass should find nothing left to remove");
    }
}
