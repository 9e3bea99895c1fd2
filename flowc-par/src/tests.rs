use crate::*;
use flowc_util::Handler;

fn parse_ok(source: &str) -> Ast {
    let mut handler = Handler::new();
    match parse(source, &mut handler) {
        Ok(ast) => ast,
        Err(n) => panic!("expected {source:?} to parse, got {n} error(s)"),
    }
}

fn parse_err(source: &str) {
    let mut handler = Handler::new();
    assert!(
        parse(source, &mut handler).is_err(),
        "expected {source:?} to fail to parse"
    );
}

#[test]
fn parses_empty_function() {
    let ast = parse_ok("func f() { }");
    assert_eq!(ast.len(), 1);
    assert_eq!(ast[0].params.len(), 0);
    assert!(ast[0].ret_type.is_none());
}

#[test]
fn parses_params_and_return_type() {
    let ast = parse_ok("func add(a int, b int) -> int { return a + b; }");
    let f = &ast[0];
    assert_eq!(f.params.len(), 2);
    assert_eq!(f.ret_type, Some(Type::Int));
}

#[test]
fn parses_array_type_and_index() {
    let ast = parse_ok(
        "func f() -> int { let arr [4][2]int = {}; arr[0][1] = 9; return arr[0][1]; }",
    );
    match &ast[0].body[0] {
        Stmt::Let { ty, .. } => assert_eq!(*ty, Type::Array(Box::new(Type::Int), vec![4, 2])),
        other => panic!("expected let, got {other:?}"),
    }
}

#[test]
fn parses_unconditional_and_counted_for() {
    let ast = parse_ok(
        "func f(n int) -> int { let s int = 0; for (let i int = 0; i < n; i = i + 1) { s = s + 1; } for { break; } return s; }",
    );
    let body = &ast[0].body;
    assert!(matches!(body[1], Stmt::For { .. }));
    assert!(matches!(body[2], Stmt::Loop { .. }));
}

#[test]
fn parses_if_else_chain() {
    let ast = parse_ok("func f(c int) -> int { if (c) { return 1; } else if (!c) { return 2; } else { return 3; } }");
    match &ast[0].body[0] {
        Stmt::If { else_block, .. } => {
            let else_block = else_block.as_ref().expect("else branch");
            assert!(matches!(else_block[0], Stmt::If { .. }));
        }
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn binary_operator_precedence_groups_mul_before_add() {
    let ast = parse_ok("func f() -> int { return 1 + 2 * 3; }");
    match &ast[0].body[0] {
        Stmt::Return {
            value: Some(Expr::Binary { op: BinOp::Add, right, .. }),
            ..
        } => {
            assert!(matches!(**right, Expr::Binary { op: BinOp::Mul, .. }));
        }
        other => panic!("unexpected return statement: {other:?}"),
    }
}

#[test]
fn short_circuit_operators_parse_with_lowest_precedence() {
    let ast = parse_ok("func f(a int, b int) -> int { return a < b && b < 10; }");
    match &ast[0].body[0] {
        Stmt::Return {
            value: Some(Expr::Binary { op: BinOp::And, .. }),
            ..
        } => {}
        other => panic!("unexpected return statement: {other:?}"),
    }
}

#[test]
fn call_expression_parses_arguments() {
    let ast = parse_ok("func f() -> int { return g(1, 2 + 3); }");
    match &ast[0].body[0] {
        Stmt::Return {
            value: Some(Expr::Call { args, .. }),
            ..
        } => assert_eq!(args.len(), 2),
        other => panic!("unexpected return statement: {other:?}"),
    }
}

#[test]
fn missing_semicolon_is_a_parse_error() {
    parse_err("func f() -> int { let x int = 1 return x; }");
}

#[test]
fn recovers_after_a_syntax_error_to_find_later_ones() {
    let mut handler = Handler::new();
    let source = "func f() -> int { let x int = ; let y int = ; return 0; }";
    let result = parse(source, &mut handler);
    assert!(result.is_err());
    assert!(handler.error_count() >= 2);
}

#[test]
fn array_literal_only_parses_for_array_typed_lets() {
    let ast = parse_ok("func f() -> int { let arr [2]int = {}; return arr[0]; }");
    match &ast[0].body[0] {
        Stmt::Let { init: Expr::ArrayLit { .. }, .. } => {}
        other => panic!("expected array literal init, got {other:?}"),
    }
}
