//! The semantic checker: scope resolution, type checking, array-shape
//! checking, and control-flow completeness.

use flowc_par::ast::*;
use flowc_util::{DefId, DefIdGenerator, FxHashMap, Handler, Span, Symbol};

use crate::scope::{RibKind, ScopeTree};
use crate::types::{shape_len, FnSig};

/// The type of a checked expression. Distinct from [`Type`] only in that a
/// `void`-returning call has no value type at all.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExprTy {
    Scalar,
    Array(Vec<usize>),
    Void,
}

impl ExprTy {
    fn from_ast(ty: &Type) -> Self {
        match ty {
            Type::Int => ExprTy::Scalar,
            Type::Array(_, dims) => ExprTy::Array(dims.clone()),
        }
    }

    fn is_scalar(&self) -> bool {
        matches!(self, ExprTy::Scalar)
    }
}

/// Checks a full program. Returns the function signature table (needed by
/// the CFG builder to know whether a call produces a value) on success, or
/// reports every error found to `handler` and returns `Err(())`.
pub fn check(ast: &Ast, handler: &mut Handler) -> Result<FxHashMap<Symbol, FnSig>, ()> {
    let mut sigs = FxHashMap::default();
    for f in ast {
        if sigs.contains_key(&f.name) {
            handler.error(
                format!("duplicate function definition `{}`", f.name.as_str()),
                f.span,
            );
            continue;
        }
        sigs.insert(
            f.name,
            FnSig {
                name: f.name,
                params: f.params.iter().map(|p| p.ty.clone()).collect(),
                ret_type: f.ret_type.clone(),
            },
        );
    }

    let had_errors_before = handler.has_errors();
    for f in ast {
        let mut checker = Checker {
            handler,
            sigs: &sigs,
            scopes: ScopeTree::new(),
            var_types: FxHashMap::default(),
            def_ids: DefIdGenerator::new(),
            ret_type: f.ret_type.clone(),
        };
        checker.check_function(f);
    }

    if handler.has_errors() || had_errors_before {
        Err(())
    } else {
        Ok(sigs)
    }
}

struct Checker<'a> {
    handler: &'a mut Handler,
    sigs: &'a FxHashMap<Symbol, FnSig>,
    scopes: ScopeTree,
    var_types: FxHashMap<Symbol, ExprTy>,
    def_ids: DefIdGenerator,
    ret_type: Option<Type>,
}

impl<'a> Checker<'a> {
    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.handler.error(message, span);
    }

    fn declare_var(&mut self, name: Symbol, ty: ExprTy, span: Span) {
        let id = self.def_ids.next();
        if self.scopes.declare(name, id).is_err() {
            self.error(
                format!(
                    "`{}` shadows a binding already in scope",
                    name.as_str()
                ),
                span,
            );
        }
        self.var_types.insert(name, ty);
    }

    fn check_function(&mut self, f: &FnItem) {
        for p in &f.params {
            let ty = ExprTy::from_ast(&p.ty);
            self.declare_var(p.name, ty, p.span);
        }
        self.check_block(&f.body);
        if f.ret_type.is_some() && !diverges(&f.body) {
            self.error(
                format!("function `{}` does not return a value on every path", f.name.as_str()),
                f.span,
            );
        }
    }

    fn check_block(&mut self, block: &Block) {
        self.scopes.enter(RibKind::Block);
        for stmt in block {
            self.check_stmt(stmt);
        }
        self.scopes.exit();
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let { name, ty, init, span } => {
                match ty {
                    Type::Int => {
                        let init_ty = self.check_expr(init);
                        if init_ty != ExprTy::Scalar {
                            self.error(
                                format!("cannot initialize `int` variable `{}` from a non-int value", name.as_str()),
                                *span,
                            );
                        }
                    }
                    Type::Array(..) => {
                        if !matches!(init, Expr::ArrayLit { .. }) {
                            self.error(
                                "array-typed `let` must be initialized with `{}`",
                                *span,
                            );
                            self.check_expr(init);
                        }
                    }
                }
                self.declare_var(*name, ExprTy::from_ast(ty), *span);
            }
            Stmt::Assign { place, value, span } => {
                let value_ty = self.check_expr(value);
                let place_ty = self.check_place(place);
                if place_ty != ExprTy::Void && place_ty != value_ty {
                    self.error(
                        format!("type mismatch assigning to `{}`", place.name().as_str()),
                        *span,
                    );
                }
            }
            Stmt::Expr(e) => {
                self.check_expr(e);
            }
            Stmt::If { cond, then_block, else_block, span } => {
                self.check_condition(cond, *span);
                self.check_block(then_block);
                if let Some(else_block) = else_block {
                    self.check_block(else_block);
                }
            }
            Stmt::Loop { body, .. } => {
                self.scopes.enter(RibKind::Loop);
                self.check_block(body);
                self.scopes.exit();
            }
            Stmt::For { init, cond, step, body, span } => {
                self.scopes.enter(RibKind::Block);
                self.check_stmt(init);
                self.check_condition(cond, *span);
                self.check_stmt(step);
                self.scopes.enter(RibKind::Loop);
                self.check_block(body);
                self.scopes.exit();
                self.scopes.exit();
            }
            Stmt::Break { span } => {
                if !self.scopes.in_loop() {
                    self.error("`break` outside of a loop", *span);
                }
            }
            Stmt::Continue { span } => {
                if !self.scopes.in_loop() {
                    self.error("`continue` outside of a loop", *span);
                }
            }
            Stmt::Return { value, span } => match (&self.ret_type, value) {
                (None, Some(_)) => self.error("`return` with a value in a void function", *span),
                (Some(_), None) => self.error("`return` without a value in a non-void function", *span),
                (Some(_), Some(e)) => {
                    let ty = self.check_expr(e);
                    if !ty.is_scalar() {
                        self.error("`return` value must be `int`", *span);
                    }
                }
                (None, None) => {}
            },
            Stmt::Block(b) => self.check_block(b),
        }
    }

    fn check_condition(&mut self, cond: &Expr, span: Span) {
        if self.check_expr(cond) != ExprTy::Scalar {
            self.error("condition must be an `int`", span);
        }
    }

    fn check_place(&mut self, place: &Place) -> ExprTy {
        match place {
            Place::Var { name, span } => self.lookup(*name, *span),
            Place::Index { name, indices, span } => {
                self.check_index(*name, indices, *span)
            }
        }
    }

    fn lookup(&mut self, name: Symbol, span: Span) -> ExprTy {
        if self.scopes.resolve(name).is_none() {
            self.error(format!("undefined variable `{}`", name.as_str()), span);
            return ExprTy::Void;
        }
        self.var_types.get(&name).cloned().unwrap_or(ExprTy::Void)
    }

    fn check_index(&mut self, name: Symbol, indices: &[Expr], span: Span) -> ExprTy {
        let base_ty = self.lookup(name, span);
        for idx in indices {
            if self.check_expr(idx) != ExprTy::Scalar {
                self.error("array index must be an `int`", idx.span());
            }
            if let Expr::Literal { value, span } = idx {
                if *value < 0 {
                    self.error("array index cannot be negative", *span);
                }
            }
        }
        match base_ty {
            ExprTy::Array(dims) => {
                if indices.len() != dims.len() {
                    self.error(
                        format!(
                            "wrong number of indices for `{}`: expected {}, found {}",
                            name.as_str(),
                            dims.len(),
                            indices.len()
                        ),
                        span,
                    );
                } else {
                    for (idx, &dim) in indices.iter().zip(dims.iter()) {
                        if let Expr::Literal { value, .. } = idx {
                            if *value >= 0 && (*value as usize) >= dim {
                                self.error(
                                    format!("index {value} out of bounds for dimension of size {dim}"),
                                    idx.span(),
                                );
                            }
                        }
                    }
                }
                ExprTy::Scalar
            }
            ExprTy::Scalar => {
                self.error(format!("`{}` is not an array", name.as_str()), span);
                ExprTy::Void
            }
            ExprTy::Void => ExprTy::Void,
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> ExprTy {
        match expr {
            Expr::Literal { .. } => ExprTy::Scalar,
            Expr::Var { name, span } => self.lookup(*name, *span),
            Expr::Unary { expr, span, .. } => {
                if self.check_expr(expr) != ExprTy::Scalar {
                    self.error("unary operator requires an `int` operand", *span);
                }
                ExprTy::Scalar
            }
            Expr::Binary { left, right, span, .. } => {
                let lt = self.check_expr(left);
                let rt = self.check_expr(right);
                if lt != ExprTy::Scalar || rt != ExprTy::Scalar {
                    self.error("binary operator requires `int` operands", *span);
                }
                ExprTy::Scalar
            }
            Expr::Call { callee, args, span } => self.check_call(*callee, args, *span),
            Expr::Index { name, indices, span } => self.check_index(*name, indices, *span),
            Expr::ArrayLit { span } => {
                self.error("`{}` is only valid as an array `let` initializer", *span);
                ExprTy::Void
            }
        }
    }

    fn check_call(&mut self, callee: Symbol, args: &[Expr], span: Span) -> ExprTy {
        let arg_tys: Vec<ExprTy> = args.iter().map(|a| self.check_expr(a)).collect();
        let Some(sig) = self.sigs.get(&callee).cloned() else {
            self.error(format!("undefined function `{}`", callee.as_str()), span);
            return ExprTy::Void;
        };
        if sig.params.len() != args.len() {
            self.error(
                format!(
                    "`{}` takes {} argument(s), found {}",
                    callee.as_str(),
                    sig.params.len(),
                    args.len()
                ),
                span,
            );
        } else {
            for (param_ty, arg_ty) in sig.params.iter().zip(arg_tys.iter()) {
                if ExprTy::from_ast(param_ty) != *arg_ty {
                    self.error(format!("argument type mismatch calling `{}`", callee.as_str()), span);
                }
            }
        }
        match &sig.ret_type {
            Some(ty) => ExprTy::from_ast(ty),
            None => ExprTy::Void,
        }
    }
}

/// True if every path through `block` ends in a `return` (or an unconditional
/// loop with no reachable `break`, which never falls through).
fn diverges(block: &Block) -> bool {
    block.iter().any(stmt_diverges)
}

fn stmt_diverges(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return { .. } => true,
        Stmt::If { then_block, else_block, .. } => {
            diverges(then_block) && else_block.as_ref().is_some_and(|e| diverges(e))
        }
        Stmt::Block(b) => diverges(b),
        Stmt::Loop { body, .. } => !contains_own_break(body),
        Stmt::For { .. } | Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Expr(_) | Stmt::Let { .. } | Stmt::Assign { .. } => false,
    }
}

/// Counts `break` statements that target this loop (does not descend into
/// nested loop bodies, whose breaks target themselves).
fn contains_own_break(block: &Block) -> bool {
    block.iter().any(|stmt| match stmt {
        Stmt::Break { .. } => true,
        Stmt::If { then_block, else_block, .. } => {
            contains_own_break(then_block) || else_block.as_ref().is_some_and(|e| contains_own_break(e))
        }
        Stmt::Block(b) => contains_own_break(b),
        Stmt::Loop { .. } | Stmt::For { .. } => false,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowc_util::Handler;

    fn check_source(source: &str) -> Result<FxHashMap<Symbol, FnSig>, ()> {
        let mut handler = Handler::new();
        let ast = flowc_par::parse(source, &mut handler).expect("parses");
        check(&ast, &mut handler)
    }

    #[test]
    fn accepts_a_well_typed_function() {
        assert!(check_source("func f(a int) -> int { return a + 1; }").is_ok());
    }

    #[test]
    fn rejects_missing_return_on_some_path() {
        assert!(check_source("func f(c int) -> int { if (c) { return 1; } }").is_err());
    }

    #[test]
    fn accepts_if_else_both_returning() {
        assert!(check_source("func f(c int) -> int { if (c) { return 1; } else { return 2; } }").is_ok());
    }

    #[test]
    fn rejects_break_outside_loop() {
        assert!(check_source("func f() { break; }").is_err());
    }

    #[test]
    fn accepts_break_inside_counted_for() {
        assert!(check_source(
            "func f(n int) -> int { for (let i int = 0; i < n; i = i + 1) { break; } return 0; }"
        )
        .is_ok());
    }

    #[test]
    fn rejects_shadowing_outer_binding() {
        assert!(check_source("func f(a int) -> int { let a int = 1; return a; }").is_err());
    }

    #[test]
    fn rejects_index_arity_mismatch() {
        assert!(check_source(
            "func f() -> int { let arr [4][4]int = {}; return arr[0]; }"
        )
        .is_err());
    }

    #[test]
    fn rejects_undefined_function_call() {
        assert!(check_source("func f() -> int { return g(); }").is_err());
    }

    #[test]
    fn accepts_mutual_forward_reference() {
        assert!(check_source(
            "func a() -> int { return b(); } func b() -> int { return 1; }"
        )
        .is_ok());
    }

    #[test]
    fn infinite_loop_without_break_satisfies_return_completeness() {
        assert!(check_source("func f() -> int { for { } }").is_ok());
    }
}
