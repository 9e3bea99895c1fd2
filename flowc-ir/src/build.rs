//! Lowers a checked AST function into a CFG of basic blocks (§4.1).
//!
//! Scalar locals (and reassignable parameters) are lowered to an `alloca`
//! plus `load`/`store` pair with zero indices, exactly like a one-element
//! array — the same memory-backed representation the data model already
//! gives arrays. [`crate::ssa`] later promotes the scalar-shaped allocas
//! via phi placement and deletes them; array allocas are left alone. This
//! sidesteps needing any ad-hoc "mutable SSA value" representation in the
//! builder itself, and is why `--disable-ssa` still yields well-formed,
//! just unoptimized-and-unpromoted, IR (§6).
//!
//! Short-circuit `&&`/`||` are the one place the builder inserts a phi
//! directly (a diamond producing a 0/1 value, §4.1); everything else about
//! merging control flow is handled by SSA construction downstream.

use flowc_par::ast::{BinOp, Block, Expr, FnItem, Place, Stmt, Type, UnOp};
use flowc_util::{FxHashMap, FxHashSet, Span, Symbol};

use crate::ir::{BlockId, Function, InstKind, Terminator, Value};
use flowc_sem::FnSig;

struct LoopTargets {
    break_block: BlockId,
    continue_block: BlockId,
}

struct FunctionBuilder<'a> {
    func: Function,
    cur: BlockId,
    /// name -> alloca instruction id backing that local.
    slots: FxHashMap<Symbol, crate::ir::InstrId>,
    loop_stack: Vec<LoopTargets>,
    terminated: FxHashSet<BlockId>,
    sigs: &'a FxHashMap<Symbol, FnSig>,
}

/// Builds the CFG for a single checked function. `sigs` is the whole
/// program's signature table (needed to tell a void call from a
/// value-producing one, per §3's `call` row).
pub fn build_function(item: &FnItem, sigs: &FxHashMap<Symbol, FnSig>) -> Function {
    let ret_type = item.ret_type.as_ref().map(ir_type);
    let params: Vec<_> = item.params.iter().map(|p| (p.name, ir_type(&p.ty))).collect();
    let mut func = Function::new(item.name, params.clone(), ret_type);
    let entry = func.new_block();
    func.entry = entry;

    let mut fb = FunctionBuilder {
        func,
        cur: entry,
        slots: FxHashMap::default(),
        loop_stack: Vec::new(),
        terminated: FxHashSet::default(),
        sigs,
    };

    for (name, ty) in &params {
        fb.bind_param(*name, ty, item.span);
    }
    fb.lower_block(&item.body);
    if !fb.is_terminated(fb.cur) {
        fb.terminate(Terminator::Return(None), item.span);
    }
    fb.func.refresh_preds();
    fb.func
}

fn ir_type(ty: &Type) -> flowc_sem::Type {
    ty.clone()
}

impl<'a> FunctionBuilder<'a> {
    fn bind_param(&mut self, name: Symbol, ty: &flowc_sem::Type, span: Span) {
        let slot = self.emit(span, InstKind::Alloca(ty.clone()));
        if !ty.is_array() {
            let p = self.emit(span, InstKind::Param(name));
            self.emit(
                span,
                InstKind::Store { base: Value::Reg(slot), indices: vec![], value: Value::Reg(p) },
            );
        }
        self.slots.insert(name, slot);
    }

    fn emit(&mut self, span: Span, kind: InstKind) -> crate::ir::InstrId {
        self.func.push_instr(self.cur, span, kind)
    }

    fn is_terminated(&self, b: BlockId) -> bool {
        self.terminated.contains(&b)
    }

    fn terminate(&mut self, term: Terminator, _span: Span) {
        self.func.block_mut(self.cur).terminator = term;
        self.terminated.insert(self.cur);
    }

    fn new_block(&mut self) -> BlockId {
        self.func.new_block()
    }

    fn jump(&mut self, target: BlockId, span: Span) {
        if !self.is_terminated(self.cur) {
            self.terminate(Terminator::Jump(target), span);
        }
    }

    fn slot(&self, name: Symbol) -> Value {
        Value::Reg(*self.slots.get(&name).expect("undeclared variable reached the CFG builder"))
    }

    fn lower_block(&mut self, block: &Block) {
        for (i, stmt) in block.iter().enumerate() {
            self.lower_stmt(stmt);
            if self.is_terminated(self.cur) && i + 1 < block.len() {
                // Remaining statements are unreachable; still lower them
                // into a fresh orphan block so nothing in the builder has
                // to special-case "no current block" (§4.1). Cleanup
                // drops it later.
                self.cur = self.new_block();
            }
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let { name, ty, init, span } => match ty {
                Type::Int => {
                    let v = self.lower_expr(init);
                    let slot = self.emit(*span, InstKind::Alloca(ty.clone()));
                    self.emit(
                        *span,
                        InstKind::Store { base: Value::Reg(slot), indices: vec![], value: v },
                    );
                    self.slots.insert(*name, slot);
                }
                Type::Array(..) => {
                    let slot = self.emit(*span, InstKind::Alloca(ty.clone()));
                    self.slots.insert(*name, slot);
                    // `{}` literal: zero-init is implementation-defined
                    // (§9 open question) — the builder emits no stores.
                }
            },
            Stmt::Assign { place, value, span } => {
                let v = self.lower_expr(value);
                match place {
                    Place::Var { name, .. } => {
                        let base = self.slot(*name);
                        self.emit(*span, InstKind::Store { base, indices: vec![], value: v });
                    }
                    Place::Index { name, indices, .. } => {
                        let base = self.slot(*name);
                        let idxs: Vec<Value> = indices.iter().map(|e| self.lower_expr(e)).collect();
                        self.emit(*span, InstKind::Store { base, indices: idxs, value: v });
                    }
                }
            }
            Stmt::Expr(e) => {
                self.lower_expr(e);
            }
            Stmt::If { cond, then_block, else_block, span } => {
                self.lower_if(cond, then_block, else_block.as_ref(), *span);
            }
            Stmt::Loop { body, span } => self.lower_loop(body, *span),
            Stmt::For { init, cond, step, body, span } => {
                self.lower_for(init, cond, step, body, *span);
            }
            Stmt::Break { span } => {
                let target = self.loop_stack.last().expect("`break` outside a loop").break_block;
                self.jump(target, *span);
            }
            Stmt::Continue { span } => {
                let target =
                    self.loop_stack.last().expect("`continue` outside a loop").continue_block;
                self.jump(target, *span);
            }
            Stmt::Return { value, span } => {
                let v = value.as_ref().map(|e| self.lower_expr(e));
                self.terminate(Terminator::Return(v), *span);
            }
            Stmt::Block(b) => self.lower_block(b),
        }
    }

    fn lower_if(&mut self, cond: &Expr, then_block: &Block, else_block: Option<&Block>, span: Span) {
        let cond_v = self.lower_expr(cond);
        let then_b = self.new_block();
        let join_b = self.new_block();
        let else_b = else_block.map(|_| self.new_block());
        let false_target = else_b.unwrap_or(join_b);
        self.terminate(
            Terminator::Branch { cond: cond_v, then_block: then_b, else_block: false_target },
            span,
        );

        self.cur = then_b;
        self.lower_block(then_block);
        self.jump(join_b, span);

        if let (Some(else_b), Some(else_block)) = (else_b, else_block) {
            self.cur = else_b;
            self.lower_block(else_block);
            self.jump(join_b, span);
        }

        self.cur = join_b;
    }

    fn lower_loop(&mut self, body: &Block, span: Span) {
        let header = self.new_block();
        let exit = self.new_block();
        self.jump(header, span);

        self.cur = header;
        self.loop_stack.push(LoopTargets { break_block: exit, continue_block: header });
        self.lower_block(body);
        self.jump(header, span);
        self.loop_stack.pop();

        self.cur = exit;
    }

    fn lower_for(&mut self, init: &Stmt, cond: &Expr, step: &Stmt, body: &Block, span: Span) {
        self.lower_stmt(init);
        let header = self.new_block();
        let body_b = self.new_block();
        let step_b = self.new_block();
        let exit = self.new_block();
        self.jump(header, span);

        self.cur = header;
        let cond_v = self.lower_expr(cond);
        self.terminate(Terminator::Branch { cond: cond_v, then_block: body_b, else_block: exit }, span);

        self.cur = body_b;
        self.loop_stack.push(LoopTargets { break_block: exit, continue_block: step_b });
        self.lower_block(body);
        self.jump(step_b, span);
        self.loop_stack.pop();

        self.cur = step_b;
        self.lower_stmt(step);
        self.jump(header, span);

        self.cur = exit;
    }

    fn lower_expr(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Literal { value, .. } => Value::Const(*value),
            Expr::Var { name, span } => {
                let base = self.slot(*name);
                Value::Reg(self.emit(*span, InstKind::Load { base, indices: vec![] }))
            }
            Expr::Unary { op, expr, span } => {
                let v = self.lower_expr(expr);
                Value::Reg(self.emit(*span, InstKind::Unop(ir_unop(*op), v)))
            }
            Expr::Binary { op, left, right, span } if op.is_short_circuit() => {
                self.lower_short_circuit(*op, left, right, *span)
            }
            Expr::Binary { op, left, right, span } => {
                let l = self.lower_expr(left);
                let r = self.lower_expr(right);
                Value::Reg(self.emit(*span, InstKind::Binop(ir_binop(*op), l, r)))
            }
            Expr::Call { callee, args, span } => {
                let argv: Vec<Value> = args.iter().map(|a| self.lower_expr(a)).collect();
                let void = self.sigs.get(callee).map(|s| s.ret_type.is_none()).unwrap_or(false);
                let id = self.emit(*span, InstKind::Call { callee: *callee, args: argv, void });
                if void {
                    Value::Const(0)
                } else {
                    Value::Reg(id)
                }
            }
            Expr::Index { name, indices, span } => {
                let base = self.slot(*name);
                let idxs: Vec<Value> = indices.iter().map(|e| self.lower_expr(e)).collect();
                Value::Reg(self.emit(*span, InstKind::Load { base, indices: idxs }))
            }
            Expr::ArrayLit { .. } => Value::Const(0),
        }
    }

    /// `a && b` / `a || b` as a diamond: evaluate `a`; only evaluate `b`
    /// when short-circuiting doesn't already decide the result; join on a
    /// phi producing the canonical 0/1 value (§4.1, §9 open question).
    fn lower_short_circuit(&mut self, op: BinOp, left: &Expr, right: &Expr, span: Span) -> Value {
        let lv = self.lower_expr(left);
        let entry_b = self.cur;
        let rhs_b = self.new_block();
        let join_b = self.new_block();
        let short_circuit_value = match op {
            BinOp::And => {
                self.terminate(
                    Terminator::Branch { cond: lv, then_block: rhs_b, else_block: join_b },
                    span,
                );
                0
            }
            BinOp::Or => {
                self.terminate(
                    Terminator::Branch { cond: lv, then_block: join_b, else_block: rhs_b },
                    span,
                );
                1
            }
            _ => unreachable!("only && and || are short-circuit operators"),
        };

        self.cur = rhs_b;
        let rv = self.lower_expr(right);
        let norm = self.emit(span, InstKind::Binop(flowc_sem::BinOp::Ne, rv, Value::Const(0)));
        let rhs_final = self.cur;
        self.jump(join_b, span);

        self.cur = join_b;
        let phi = self.emit(
            span,
            InstKind::Phi(vec![
                (Value::Const(short_circuit_value), entry_b),
                (Value::Reg(norm), rhs_final),
            ]),
        );
        Value::Reg(phi)
    }
}

fn ir_binop(op: BinOp) -> flowc_sem::BinOp {
    op
}

fn ir_unop(op: UnOp) -> flowc_sem::UnOp {
    op
}
