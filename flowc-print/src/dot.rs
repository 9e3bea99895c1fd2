//! Graphviz DOT printer.
//!
//! One node per block, labeled with its textual IR lines; edges labeled
//! `T`/`F` for conditional branches, unlabeled for plain jumps (§6).

use crate::text::block_body;
use flowc_ir::{Function, Terminator};
use std::fmt::Write;

/// Renders one function's CFG as a standalone DOT graph.
pub fn to_dot(func: &Function) -> String {
    let mut out = String::new();
    writeln!(out, "digraph {} {{", func.name).unwrap();
    writeln!(out, "  node [shape=box, fontname=monospace];").unwrap();

    for b in func.block_ids() {
        let label = dot_escape(&format!("b{}:\n{}", b.index(), block_body(func, b)));
        writeln!(out, "  b{} [label=\"{label}\"];", b.index()).unwrap();
    }

    for b in func.block_ids() {
        match &func.block(b).terminator {
            Terminator::Jump(t) => {
                writeln!(out, "  b{} -> b{};", b.index(), t.index()).unwrap();
            }
            Terminator::Branch { then_block, else_block, .. } => {
                writeln!(out, "  b{} -> b{} [label=\"T\"];", b.index(), then_block.index()).unwrap();
                writeln!(out, "  b{} -> b{} [label=\"F\"];", b.index(), else_block.index()).unwrap();
            }
            Terminator::Return(_) => {}
        }
    }

    out.push_str("}\n");
    out
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\l")
}
