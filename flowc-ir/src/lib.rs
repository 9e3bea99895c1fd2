//! The flowc intermediate representation: CFG construction (`build`),
//! dominance analysis (`analysis`), SSA construction (`ssa`), and the
//! SSA-preserving optimizer (`opt`).
//!
//! [`optimize_function`] is the single entry point the driver calls per
//! function; everything else in this crate is public so each stage can
//! also be driven in isolation (`--disable-*`, tests, `--dump-ir` before a
//! given stage).

pub mod analysis;
pub mod build;
pub mod ir;
pub mod opt;
pub mod proptests;
pub mod ssa;

pub use analysis::Dominance;
pub use ir::{BasicBlock, BlockId, Function, InstKind, InstrId, Instruction, Terminator, Value};

use thiserror::Error;

/// Invariant violations and internal limits raised by the IR layer (§7) —
/// distinct from the front end's per-phase errors and always fatal (exit
/// code 2, per §6).
#[derive(Debug, Error)]
pub enum IrError {
    #[error("internal compiler error in b{block}, %{inst}: {message}")]
    Invariant { block: u32, inst: u32, message: String },
    #[error("internal limit exceeded: {0}")]
    Limit(String),
}

/// Which passes/analyses run, one field per `--disable-*` CLI flag (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassConfig {
    pub ssa: bool,
    pub licm: bool,
    pub sccp: bool,
    pub dce: bool,
    pub idom_tree: bool,
    pub df: bool,
    pub block_cleanup: bool,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            ssa: true,
            licm: true,
            sccp: true,
            dce: true,
            idom_tree: true,
            df: true,
            block_cleanup: true,
        }
    }
}

impl PassConfig {
    /// Enforces the disable cascade (§4.9, §6): no dominator tree means no
    /// dominance frontiers means no SSA means no SCCP/LICM, since both
    /// reason about phi values SSA construction introduces. DCE and block
    /// cleanup need no dominance and are gated only by their own flags.
    pub fn normalize(mut self) -> Self {
        if !self.idom_tree {
            self.df = false;
        }
        if !self.df {
            self.ssa = false;
        }
        if !self.ssa {
            self.licm = false;
            self.sccp = false;
        }
        self
    }
}

/// Backstop against a pipeline that never reaches a fixpoint on
/// pathological input; real functions converge in a handful of rounds.
const MAX_PIPELINE_ITERATIONS: usize = 64;

/// Runs the per-function pipeline: optional SSA construction, then SCCP,
/// LICM, DCE, and block cleanup iterated to a fixpoint. `cfg` is assumed
/// already [`PassConfig::normalize`]d — callers (the driver) normalize
/// once up front from the parsed CLI flags.
///
/// Returns `Err(IrError::Limit)` if the pipeline fails to reach a fixpoint
/// within [`MAX_PIPELINE_ITERATIONS`] rounds — the "internal limit" error
/// class of §7, fatal per the driver's exit-code policy.
pub fn optimize_function(func: &mut Function, cfg: PassConfig) -> Result<(), IrError> {
    func.refresh_preds();

    if cfg.ssa {
        let dom = Dominance::compute(func);
        ssa::construct(func, &dom);
    }

    let mut iterations = 0;
    loop {
        if iterations >= MAX_PIPELINE_ITERATIONS {
            tracing::error!(function = %func.name, iterations, "optimization pipeline did not converge");
            return Err(IrError::Limit(format!(
                "function `{}` did not reach a fixpoint within {MAX_PIPELINE_ITERATIONS} pipeline iterations",
                func.name
            )));
        }
        iterations += 1;

        let mut changed = false;
        if cfg.sccp {
            changed |= opt::sccp::run(func);
        }
        if cfg.licm {
            let dom = Dominance::compute(func);
            changed |= opt::licm::run(func, &dom);
        }
        if cfg.dce {
            changed |= opt::dce::run(func);
        }
        if cfg.block_cleanup {
            changed |= opt::cleanup::run(func);
        }
        if !changed {
            break;
        }
    }
    Ok(())
}
