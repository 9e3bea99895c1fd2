//! Property tests for the invariants the optimizer pipeline is supposed to
//! hold regardless of input shape: a phi's arity always tracks its block's
//! predecessor count, SSA construction never leaves a promoted scalar's
//! load/store behind, SCCP is monotone (re-running it after a fixpoint is a
//! no-op), and DCE is idempotent.

#[cfg(test)]
mod tests {
    use crate::{analysis::Dominance, build, ir::InstKind, optimize_function, Function, PassConfig};
    use flowc_sem::check_program;
    use flowc_util::Handler;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    /// A small, always well-typed `flowc` function body: one of a handful of
    /// templates (straight-line arithmetic, an if/else, a counted loop)
    /// parameterized by a few bounded constants so quickcheck can vary and
    /// shrink them without ever generating a program that fails to parse or
    /// type-check.
    #[derive(Debug, Clone)]
    struct SmallProgram(String);

    impl Arbitrary for SmallProgram {
        fn arbitrary(g: &mut Gen) -> Self {
            let a = (i32::arbitrary(g).rem_euclid(50)) as i64;
            let b = (i32::arbitrary(g).rem_euclid(50)) as i64 + 1;
            let n = (i32::arbitrary(g).rem_euclid(8)) as i64;
            let shape = u8::arbitrary(g) % 4;
            let src = match shape {
                0 => format!(
                    "func f(n int) -> int {{ let x int = {a}; let y int = {b}; return x + y * n - n / {b}; }}"
                ),
                1 => format!(
                    "func f(n int) -> int {{ let r int = 0; if (n > {a}) {{ r = n + {a}; }} else {{ r = n - {b}; }} return r; }}"
                ),
                2 => format!(
                    "func f(n int) -> int {{ let s int = 0; for (let i int = 0; i < {n}; i = i + 1) {{ s = s + (i * {b} + {a}); }} return s; }}"
                ),
                _ => format!(
                    "func f(n int) -> int {{ let s int = {a}; for (let i int = 0; i < {n}; i = i + 1) {{ if (i < {b}) {{ s = s + i; }} else {{ s = s - 1; }} }} return s; }}"
                ),
            };
            SmallProgram(src)
        }
    }

    fn build_from(src: &str) -> Function {
        let mut handler = Handler::new();
        let ast = flowc_par::parse(src, &mut handler).expect("generated program parses");
        let checked = check_program(ast, &mut handler).expect("generated program type-checks");
        let sigs = checked.signatures.clone();
        build::build_function(&checked.ast[0], &sigs)
    }

    /// Every phi's incoming-value count equals its own block's predecessor
    /// count, right after SSA construction (§8 "phi arity = pred count").
    #[quickcheck]
    fn phi_arity_matches_predecessor_count(p: SmallProgram) -> bool {
        let mut func = build_from(&p.0);
        func.refresh_preds();
        let dom = Dominance::compute(&func);
        crate::ssa::construct(&mut func, &dom);
        func.block_ids().all(|b| {
            let blk = func.block(b);
            blk.phis.iter().all(|&id| match &func.inst(id).kind {
                InstKind::Phi(incoming) => incoming.len() == blk.preds.len(),
                _ => false,
            })
        })
    }

    /// SSA construction removes every promoted scalar alloca and the
    /// load/store pairs through it — no direct reference to a scalar local's
    /// memory slot survives (§8 "single definition").
    #[quickcheck]
    fn ssa_construction_clears_scalar_memory_ops(p: SmallProgram) -> bool {
        let mut func = build_from(&p.0);
        func.refresh_preds();
        let dom = Dominance::compute(&func);
        crate::ssa::construct(&mut func, &dom);
        func.block_ids().all(|b| {
            func.block(b).all_insts().all(|id| match &func.inst(id).kind {
                InstKind::Alloca(ty) => ty.is_array(),
                InstKind::Load { indices, .. } => !indices.is_empty(),
                InstKind::Store { indices, .. } => !indices.is_empty(),
                _ => true,
            })
        })
    }

    /// Running the full pipeline's SCCP pass again after the pipeline has
    /// already reached a fixpoint makes no further change (§8 "SCCP
    /// monotonicity").
    #[quickcheck]
    fn sccp_is_a_noop_after_the_pipeline_converges(p: SmallProgram) -> bool {
        let mut func = build_from(&p.0);
        optimize_function(&mut func, PassConfig::default()).expect("pipeline converges");
        let before = format!("{:?}", func.instrs);
        crate::opt::sccp::run(&mut func);
        let after = format!("{:?}", func.instrs);
        before == after
    }

    /// Running DCE again after the pipeline has converged makes no further
    /// change (§8 "DCE idempotence").
    #[quickcheck]
    fn dce_is_idempotent_after_the_pipeline_converges(p: SmallProgram) -> bool {
        let mut func = build_from(&p.0);
        optimize_function(&mut func, PassConfig::default()).expect("pipeline converges");
        let before_blocks: Vec<_> = func.block_ids().map(|b| func.block(b).all_insts().count()).collect();
        crate::opt::dce::run(&mut func);
        let after_blocks: Vec<_> = func.block_ids().map(|b| func.block(b).all_insts().count()).collect();
        before_blocks == after_blocks
    }
}
