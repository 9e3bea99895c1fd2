//! Textual IR printer.
//!
//! Format: a `func name(params) -> rettype` header, then one `bN:` section
//! per block with phis first, then instructions, then the terminator; every
//! definition prints as `%id = op args` (§6).

use flowc_ir::{BlockId, Function, InstKind, InstrId, Terminator, Value};
use flowc_sem::{BinOp, UnOp};
use std::fmt::Write;

/// Renders every function's full textual IR, separated by a blank line.
pub fn print_program(funcs: &[Function]) -> String {
    funcs.iter().map(print_function).collect::<Vec<_>>().join("\n")
}

/// Renders one function's textual IR.
pub fn print_function(func: &Function) -> String {
    let mut out = String::new();
    write!(out, "func {}(", func.name).unwrap();
    for (i, (name, ty)) in func.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write!(out, "{name} {ty}").unwrap();
    }
    out.push(')');
    if let Some(ret) = &func.ret_type {
        write!(out, " -> {ret}").unwrap();
    }
    out.push('\n');

    for b in func.block_ids() {
        write!(out, "b{}:\n", b.index()).unwrap();
        out.push_str(&block_body(func, b));
    }
    out
}

/// The lines for a single block's body (phis, instructions, terminator),
/// each indented two spaces — shared with the DOT printer's node labels.
pub(crate) fn block_body(func: &Function, b: BlockId) -> String {
    let mut out = String::new();
    for &id in &func.block(b).phis {
        writeln!(out, "  {}", format_inst(func, id)).unwrap();
    }
    for &id in &func.block(b).insts {
        writeln!(out, "  {}", format_inst(func, id)).unwrap();
    }
    writeln!(out, "  {}", format_terminator(&func.block(b).terminator)).unwrap();
    out
}

fn format_inst(func: &Function, id: InstrId) -> String {
    let kind = &func.inst(id).kind;
    let lhs = if kind.defines_value() { format!("%{} = ", id.index()) } else { String::new() };
    format!("{lhs}{}", format_kind(kind))
}

fn format_kind(kind: &InstKind) -> String {
    match kind {
        InstKind::Param(name) => format!("param {name}"),
        InstKind::Const(k) => format!("const {k}"),
        InstKind::Binop(op, a, b) => format!("{} {}, {}", binop_mnemonic(*op), format_value(*a), format_value(*b)),
        InstKind::Unop(op, a) => format!("{} {}", unop_mnemonic(*op), format_value(*a)),
        InstKind::Alloca(ty) => format!("alloca {ty}"),
        InstKind::Load { base, indices } => {
            if indices.is_empty() {
                format!("load {}", format_value(*base))
            } else {
                format!("load {}[{}]", format_value(*base), format_values(indices))
            }
        }
        InstKind::Store { base, indices, value } => {
            if indices.is_empty() {
                format!("store {}, {}", format_value(*base), format_value(*value))
            } else {
                format!("store {}[{}], {}", format_value(*base), format_values(indices), format_value(*value))
            }
        }
        InstKind::Call { callee, args, .. } => {
            format!("call {callee}({})", format_values(args))
        }
        InstKind::Phi(incoming) => {
            let parts: Vec<String> = incoming
                .iter()
                .map(|(v, b)| format!("[{}, b{}]", format_value(*v), b.index()))
                .collect();
            format!("phi {}", parts.join(", "))
        }
    }
}

fn format_terminator(term: &Terminator) -> String {
    match term {
        Terminator::Jump(b) => format!("jump b{}", b.index()),
        Terminator::Branch { cond, then_block, else_block } => {
            format!("branch {}, b{}, b{}", format_value(*cond), then_block.index(), else_block.index())
        }
        Terminator::Return(Some(v)) => format!("return {}", format_value(*v)),
        Terminator::Return(None) => "return".to_string(),
    }
}

fn format_value(v: Value) -> String {
    match v {
        Value::Const(k) => k.to_string(),
        Value::Reg(id) => format!("%{}", id.index()),
    }
}

fn format_values(vs: &[Value]) -> String {
    vs.iter().copied().map(format_value).collect::<Vec<_>>().join(", ")
}

fn binop_mnemonic(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Sub => "sub",
        BinOp::Mul => "mul",
        BinOp::Div => "div",
        BinOp::Mod => "mod",
        BinOp::Eq => "eq",
        BinOp::Ne => "ne",
        BinOp::Lt => "lt",
        BinOp::Le => "le",
        BinOp::Gt => "gt",
        BinOp::Ge => "ge",
        BinOp::And => "and",
        BinOp::Or => "or",
    }
}

fn unop_mnemonic(op: UnOp) -> &'static str {
    match op {
        UnOp::Neg => "neg",
        UnOp::Not => "not",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowc_sem::check_program;
    use flowc_util::Handler;

    fn build(src: &str) -> Function {
        let mut handler = Handler::new();
        let ast = flowc_par::parse(src, &mut handler).expect("parses");
        let checked = check_program(ast, &mut handler).expect("checks");
        let sigs = checked.signatures.clone();
        flowc_ir::build::build_function(&checked.ast[0], &sigs)
    }

    #[test]
    fn header_includes_params_and_return_type() {
        let f = build("func add(a int, b int) -> int { return a + b; }");
        let s = print_function(&f);
        assert!(s.starts_with("func add(a int, b int) -> int\n"));
    }

    #[test]
    fn every_block_is_labeled_and_terminated() {
        let f = build("func f(c int) -> int { if (c) { return 1; } return 2; }");
        let s = print_function(&f);
        assert!(s.contains("b0:"));
        assert!(s.matches("return").count() >= 2);
    }

    #[test]
    fn a_store_prints_with_no_result_register() {
        let f = build("func f() -> int { let x int = 1; return x; }");
        let s = print_function(&f);
        assert!(s.contains("store "));
        assert!(!s.contains("= store"));
    }
}
