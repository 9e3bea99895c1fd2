//! The `flowc` CLI: a thin shell around the front end (`flowc-par`,
//! `flowc-sem`), the CFG/SSA/optimizer core (`flowc-ir`), and the printers
//! (`flowc-print`).
//!
//! `Config` is the CLI surface (§6), `Session` owns the source map and
//! diagnostic handler across the whole run and orchestrates the pipeline
//! (§4.9): read source → lex/parse → check → per-function build CFG →
//! optionally construct SSA → run the enabled optimization passes to a
//! fixpoint → print.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use flowc_ir::{Function, IrError, PassConfig};
use flowc_util::{Handler, SourceMap};
use rayon::prelude::*;
use thiserror::Error;

/// CLI configuration (§6). Every `--disable-*` flag maps one-to-one onto a
/// [`flowc_ir::PassConfig`] field; [`Config::normalize`] enforces the
/// disable cascade before the pipeline ever sees it.
#[derive(Parser, Debug, Clone)]
#[command(name = "flowc", version, about = "An optimizing compiler for a small C-like language")]
pub struct Config {
    /// Source file to compile.
    #[arg(long, default_value = "input.txt")]
    pub input: PathBuf,

    /// Write the Graphviz DOT CFG to PATH; with no PATH, writes to stdout.
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "-")]
    pub dump_cfg_dot: Option<PathBuf>,

    /// Write the textual IR to PATH.
    #[arg(long, value_name = "PATH")]
    pub dump_ir: Option<PathBuf>,

    #[arg(long)]
    pub disable_ssa: bool,
    #[arg(long)]
    pub disable_licm: bool,
    #[arg(long)]
    pub disable_sccp: bool,
    #[arg(long)]
    pub disable_dce: bool,
    #[arg(long)]
    pub disable_idom_tree: bool,
    #[arg(long)]
    pub disable_df: bool,
    #[arg(long)]
    pub disable_block_cleanup: bool,

    /// Raise the tracing filter: once for `info`, twice for `debug`, three
    /// or more for `trace`. Default is `warn`.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    /// Enforces the disable cascade (§4.9, §6): disabling the dominator
    /// tree disables dominance frontiers disables SSA disables SCCP/LICM.
    pub fn normalize(&mut self) {
        if self.disable_idom_tree {
            self.disable_df = true;
        }
        if self.disable_df {
            self.disable_ssa = true;
        }
        if self.disable_ssa {
            self.disable_sccp = true;
            self.disable_licm = true;
        }
    }

    pub fn pass_config(&self) -> PassConfig {
        PassConfig {
            ssa: !self.disable_ssa,
            licm: !self.disable_licm,
            sccp: !self.disable_sccp,
            dce: !self.disable_dce,
            idom_tree: !self.disable_idom_tree,
            df: !self.disable_df,
            block_cleanup: !self.disable_block_cleanup,
        }
        .normalize()
    }
}

/// Top-level compile failure, distinguishing the exit-code classes of §6:
/// front-end diagnostics (lexical/syntax/semantic) exit 1, an `IrError`
/// exits 2.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{count} error(s) during {phase}")]
    FrontEnd { phase: &'static str, count: usize },
    #[error(transparent)]
    Ir(#[from] IrError),
    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    /// Exit code per §6: 2 for an internal core invariant violation, 1 for
    /// everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            CompileError::Ir(_) => 2,
            _ => 1,
        }
    }
}

/// Owns the source map and diagnostic handler for one compilation, and
/// orchestrates the pipeline end to end.
pub struct Session {
    config: Config,
    pub sources: SourceMap,
    pub handler: Handler,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config, sources: SourceMap::new(), handler: Handler::new() }
    }

    /// Runs the whole pipeline against `self.config.input`. On success,
    /// writes whichever of `--dump-ir`/`--dump-cfg-dot` were requested.
    pub fn compile(&mut self) -> Result<Vec<Function>, CompileError> {
        let content = fs::read_to_string(&self.config.input)
            .map_err(|source| CompileError::Io { path: self.config.input.clone(), source })?;
        self.sources.add_file(self.config.input.display().to_string(), content.clone());

        tracing::debug!(input = %self.config.input.display(), "parsing");
        let ast = flowc_par::parse(&content, &mut self.handler)
            .map_err(|count| CompileError::FrontEnd { phase: "parsing", count })?;

        tracing::debug!(functions = ast.len(), "checking");
        let checked = flowc_sem::check_program(ast, &mut self.handler).map_err(|_| CompileError::FrontEnd {
            phase: "semantic analysis",
            count: self.handler.error_count(),
        })?;

        let pass_cfg = self.config.pass_config();
        // Each function's CFG build + optimization pipeline only ever touches that
        // function's own IR, so the whole unit fans out across `rayon`'s pool;
        // `par_iter` preserves `checked.ast`'s order in the collected `Vec`.
        let funcs: Vec<Function> = checked
            .ast
            .par_iter()
            .map(|item| {
                tracing::debug!(function = %item.name, "building CFG");
                let mut func = flowc_ir::build::build_function(item, &checked.signatures);
                tracing::trace!(function = %item.name, ?pass_cfg, "running optimization pipeline");
                flowc_ir::optimize_function(&mut func, pass_cfg)?;
                Ok(func)
            })
            .collect::<Result<Vec<Function>, IrError>>()?;

        if let Some(path) = self.config.dump_ir.clone() {
            let text = flowc_print::text::print_program(&funcs);
            write_output(&path, &text)?;
        }
        if let Some(path) = self.config.dump_cfg_dot.clone() {
            let dot = funcs.iter().map(flowc_print::to_dot).collect::<Vec<_>>().join("\n");
            write_output(&path, &dot)?;
        }

        Ok(funcs)
    }
}

fn write_output(path: &Path, content: &str) -> Result<(), CompileError> {
    if path == Path::new("-") {
        print!("{content}");
        Ok(())
    } else {
        fs::write(path, content).map_err(|source| CompileError::Output { path: path.to_path_buf(), source })
    }
}

fn install_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Parses CLI arguments, installs logging, and runs the compiler. The
/// binary's entire `main` body; split out so integration tests could call
/// it directly if they ever need to (today they drive the built binary).
pub fn run() -> u8 {
    let mut config = Config::parse();
    config.normalize();
    install_tracing(config.verbose);

    let mut session = Session::new(config);
    match session.compile() {
        Ok(_) => 0,
        Err(e) => {
            let code = e.exit_code();
            eprintln!("error: {e}");
            code
        }
    }
}
