//! Unit tests for the type checker.
//!
//! This module contains tests for type compatibility, scopes and frame
//! layout, overload resolution, constant folding, return analysis and
//! liveness.

use crate::ast::{
    ast::{FunctionDecl, Parameter, Program},
    expressions::{BinaryOperator, Expr, UnaryOperator},
    statements::Stmt,
    types::TypeNode,
};
use crate::config::CompilerConfig;
use crate::errors::errors::{Diagnostics, ErrorSeverity};
use crate::type_checker::{
    functions::{Function, FunctionTable},
    scope::Scopes,
    type_checker::{type_check, TypeChecker},
    typed_ast::{walk_scope, TypedExpr, TypedExprKind, TypedStmt, TypedStmtKind, Visitor},
    types::Type,
};
use crate::Position;

fn line(number: u32) -> Position {
    Position(number)
}

fn check(program: Program) -> (TypeChecker, Diagnostics) {
    type_check(&program, &CompilerConfig::default()).unwrap()
}

fn main_only(statements: Vec<Stmt>) -> Program {
    Program::new(vec![], Stmt::sequence(statements))
}

fn error_names(diagnostics: &Diagnostics) -> Vec<String> {
    diagnostics
        .iter()
        .map(|error| error.get_error_name().to_string())
        .collect()
}

/// Collects what the tests inspect from a typed body.
#[derive(Default)]
struct Collector {
    int_literals: Vec<i32>,
    binary_count: usize,
    while_indices: Vec<usize>,
}

impl Visitor for Collector {
    fn visit_stmt(&mut self, stmt: &TypedStmt) {
        if let TypedStmtKind::While { .. } = stmt.kind {
            self.while_indices.push(stmt.index);
        }
    }

    fn visit_expr(&mut self, expr: &TypedExpr) {
        match expr.kind {
            TypedExprKind::IntLiteral(value) => self.int_literals.push(value),
            TypedExprKind::Binary { .. } => self.binary_count += 1,
            _ => {}
        }
    }
}

fn collect_main(type_checker: &TypeChecker) -> Collector {
    let mut collector = Collector::default();
    let main = type_checker.functions.main().unwrap();
    walk_scope(&mut collector, type_checker.functions.get(main).body.as_ref().unwrap());
    collector
}

#[test]
fn test_type_equality() {
    assert!(Type::Any.equals(&Type::Int));
    assert!(Type::Int.equals(&Type::Any));
    assert!(!Type::Int.equals(&Type::Char));

    assert!(Type::String.equals(&Type::array(Type::Char, 1)));
    assert!(Type::array(Type::Char, 1).equals(&Type::String));
    assert!(!Type::String.equals(&Type::array(Type::Char, 2)));
    assert!(Type::array(Type::String, 1).equals(&Type::array(Type::Char, 2)));
    assert!(Type::String.equals(&Type::any_array()));
    assert!(Type::any_array().equals(&Type::String));
    assert!(Type::String.equals(&Type::array(Type::Any, 1)));
    assert!(!Type::String.equals(&Type::array(Type::Int, 1)));

    assert!(Type::any_array().equals(&Type::array(Type::Int, 3)));
    assert!(Type::array(Type::Int, 3).equals(&Type::any_array()));
    assert!(!Type::array(Type::Int, 1).equals(&Type::array(Type::Int, 2)));

    assert!(Type::IntOrChar.equals(&Type::Char));
    assert!(Type::Int.equals(&Type::IntOrChar));
    assert!(!Type::IntOrChar.equals(&Type::Bool));

    assert!(Type::pair(Type::Int, Type::Any).equals(&Type::pair(Type::Int, Type::Bool)));
    assert!(!Type::pair(Type::Int, Type::Int).equals(&Type::pair(Type::Int, Type::Bool)));
}

#[test]
fn test_type_display_and_size() {
    assert_eq!(Type::array(Type::Int, 2).to_string(), "int[][]");
    assert_eq!(
        Type::pair(Type::Int, Type::array(Type::Char, 1)).to_string(),
        "pair(int, char[])"
    );
    assert_eq!(Type::Bool.size_in_bytes(), 1);
    assert_eq!(Type::Char.size_in_bytes(), 1);
    assert_eq!(Type::String.size_in_bytes(), 4);
    assert_eq!(Type::String.index_into(1), Some(Type::Char));
    assert_eq!(Type::array(Type::Int, 1).index_into(2), None);
}

#[test]
fn test_scope_declarations() {
    let mut scopes = Scopes::new();
    let root = scopes.new_scope(None);
    let child = scopes.new_scope(Some(root));

    let outer = scopes
        .get_mut(root)
        .unwrap()
        .declare_variable("x", Type::Int, line(1))
        .unwrap();
    let duplicate = scopes
        .get_mut(root)
        .unwrap()
        .declare_variable("x", Type::Bool, line(2))
        .unwrap_err();
    assert_eq!(duplicate.get_error_name(), "DuplicateDeclaration");

    let inner = scopes
        .get_mut(child)
        .unwrap()
        .declare_variable("x", Type::Char, line(3))
        .unwrap();

    assert_eq!(scopes.lookup(child, "x", line(4)).unwrap(), inner);
    assert_eq!(scopes.lookup(root, "x", line(4)).unwrap(), outer);
    assert!(scopes.lookup(root, "y", line(4)).is_err());
}

#[test]
fn test_frame_offsets() {
    let mut scopes = Scopes::new();
    let root = scopes.new_scope(None);
    let a = scopes
        .get_mut(root)
        .unwrap()
        .declare_variable("a", Type::Int, line(1))
        .unwrap();
    let b = scopes
        .get_mut(root)
        .unwrap()
        .declare_variable("b", Type::Bool, line(2))
        .unwrap();

    assert_eq!(scopes.get(root).unwrap().size(), 5);
    assert_eq!(scopes.frame_offset_of(root, a).unwrap(), 1);
    assert_eq!(scopes.frame_offset_of(root, b).unwrap(), 0);

    let child = scopes.new_scope(Some(root));
    scopes
        .get_mut(child)
        .unwrap()
        .declare_variable("c", Type::Int, line(3))
        .unwrap();
    assert_eq!(scopes.frame_offset_of(child, a).unwrap(), 5);

    // Repeated queries agree until sp moves
    assert_eq!(scopes.frame_offset_of(child, a).unwrap(), 5);
    scopes.get_mut(child).unwrap().adjust_stack_pointer(4);
    assert_eq!(scopes.frame_offset_of(child, a).unwrap(), 9);
    assert_eq!(scopes.total_size_including_ancestors(child).unwrap(), 9);

    let parameters = scopes.new_parameter_scope();
    let x = scopes
        .get_mut(parameters)
        .unwrap()
        .declare_variable("x", Type::Int, line(4))
        .unwrap();
    let body = scopes.new_scope(Some(parameters));
    assert_eq!(scopes.frame_offset_of(body, x).unwrap(), 4);
}

#[test]
fn test_function_table_overloads() {
    let mut table = FunctionTable::new();
    let parameters = |ty: Type| vec![(String::from("x"), ty)];

    let first = table
        .declare(Function::new("f", Type::Int, parameters(Type::Int), None, line(1)))
        .unwrap();
    let second = table
        .declare(Function::new("f", Type::Int, parameters(Type::Bool), None, line(2)))
        .unwrap();
    let duplicate = table
        .declare(Function::new("f", Type::Char, parameters(Type::Int), None, line(3)))
        .unwrap_err();

    assert_eq!(table.get(first).label, "f_f");
    assert_eq!(table.get(second).label, "f_1_f");
    assert_eq!(duplicate.get_error_name(), "DuplicateFunction");

    assert_eq!(table.resolve("f", &[Type::Bool], line(4)).unwrap(), second);
    assert_eq!(table.resolve("f", &[Type::Int], line(4)).unwrap(), first);
    assert!(table.resolve("f", &[Type::Char], line(4)).is_err());
    assert!(table.resolve("g", &[], line(4)).is_err());
    assert_eq!(table.declared(), &[first, second]);
}

#[test]
fn test_constant_folding() {
    let three_times_four = Expr::binary(BinaryOperator::Multiply, Expr::int(3, line(1)), Expr::int(4, line(1)), line(1));
    let sum = Expr::binary(BinaryOperator::Plus, Expr::int(2, line(1)), three_times_four, line(1));
    let (type_checker, diagnostics) = check(main_only(vec![Stmt::declare(TypeNode::Int, "x", sum, line(1))]));

    assert!(diagnostics.is_empty());
    let collector = collect_main(&type_checker);
    assert_eq!(collector.binary_count, 0);
    assert!(collector.int_literals.contains(&14));
    assert_eq!(type_checker.type_stack_depth(), 0);
}

#[test]
fn test_divide_by_zero_is_not_folded() {
    let division = Expr::binary(BinaryOperator::Divide, Expr::int(10, line(1)), Expr::int(0, line(1)), line(1));
    let (type_checker, diagnostics) = check(main_only(vec![Stmt::declare(TypeNode::Int, "x", division, line(1))]));

    assert_eq!(error_names(&diagnostics), vec!["DivideByZero"]);
    assert_eq!(diagnostics.severity(), Some(ErrorSeverity::Runtime));
    assert_eq!(diagnostics.exit_code(&CompilerConfig::default().exit_codes), 255);
    assert_eq!(collect_main(&type_checker).binary_count, 1);
}

#[test]
fn test_constant_overflow() {
    let sum = Expr::binary(
        BinaryOperator::Plus,
        Expr::int(2147483647, line(1)),
        Expr::int(1, line(1)),
        line(1),
    );
    let (_, diagnostics) = check(main_only(vec![Stmt::declare(TypeNode::Int, "x", sum, line(1))]));

    assert_eq!(error_names(&diagnostics), vec!["ConstantOverflow"]);
}

#[test]
fn test_integer_out_of_range() {
    let (_, diagnostics) = check(main_only(vec![Stmt::declare(
        TypeNode::Int,
        "x",
        Expr::int(1 << 40, line(1)),
        line(1),
    )]));

    assert_eq!(error_names(&diagnostics), vec!["IntegerOutOfRange"]);
    assert_eq!(diagnostics.exit_code(&CompilerConfig::default().exit_codes), 100);
}

#[test]
fn test_missing_return() {
    let function = FunctionDecl::new("f", TypeNode::Int, vec![], Stmt::print(Expr::int(1, line(2)), line(2)), line(1));
    let (_, diagnostics) = check(Program::new(vec![function], Stmt::skip(line(4))));

    assert_eq!(error_names(&diagnostics), vec!["MissingReturn"]);
    assert_eq!(diagnostics.exit_code(&CompilerConfig::default().exit_codes), 100);
}

#[test]
fn test_if_returns_only_when_both_branches_do() {
    let both = Stmt::if_else(
        Expr::bool(true, line(2)),
        Stmt::ret(Expr::int(1, line(2)), line(2)),
        Stmt::ret(Expr::int(2, line(2)), line(2)),
        line(2),
    );
    let one = Stmt::if_else(
        Expr::bool(true, line(6)),
        Stmt::ret(Expr::int(1, line(6)), line(6)),
        Stmt::skip(line(6)),
        line(6),
    );
    let program = Program::new(
        vec![
            FunctionDecl::new("both", TypeNode::Int, vec![], both, line(1)),
            FunctionDecl::new("one", TypeNode::Int, vec![], one, line(5)),
        ],
        Stmt::skip(line(9)),
    );
    let (_, diagnostics) = check(program);

    assert_eq!(error_names(&diagnostics), vec!["MissingReturn"]);
    assert_eq!(diagnostics.iter().next().unwrap().get_position().0, 5);
}

#[test]
fn test_while_body_does_not_return() {
    let body = Stmt::while_loop(
        Expr::bool(true, line(2)),
        Stmt::ret(Expr::int(1, line(2)), line(2)),
        line(2),
    );
    let function = FunctionDecl::new("f", TypeNode::Int, vec![], body, line(1));
    let (_, diagnostics) = check(Program::new(vec![function], Stmt::skip(line(4))));

    assert_eq!(error_names(&diagnostics), vec!["MissingReturn"]);
}

#[test]
fn test_statement_after_return() {
    let body = Stmt::sequence(vec![
        Stmt::ret(Expr::int(1, line(2)), line(2)),
        Stmt::ret(Expr::int(2, line(3)), line(3)),
    ]);
    let function = FunctionDecl::new("f", TypeNode::Int, vec![], body, line(1));
    let (_, diagnostics) = check(Program::new(vec![function], Stmt::skip(line(5))));

    assert_eq!(error_names(&diagnostics), vec!["StatementAfterReturn"]);
    assert_eq!(diagnostics.iter().next().unwrap().get_position().0, 3);
}

#[test]
fn test_return_outside_function() {
    let (_, diagnostics) = check(main_only(vec![Stmt::ret(Expr::int(1, line(1)), line(1))]));

    assert_eq!(error_names(&diagnostics), vec!["ReturnOutsideFunction"]);
    assert_eq!(diagnostics.exit_code(&CompilerConfig::default().exit_codes), 200);
}

#[test]
fn test_undeclared_function_reports_once() {
    let call = Expr::call("g", vec![], line(1));
    let (_, diagnostics) = check(main_only(vec![Stmt::declare(TypeNode::Int, "x", call, line(1))]));

    assert_eq!(error_names(&diagnostics), vec!["UndeclaredFunction"]);
}

#[test]
fn test_call_mismatches() {
    let identity = FunctionDecl::new(
        "f",
        TypeNode::Int,
        vec![Parameter::new(TypeNode::Int, "x", line(1))],
        Stmt::ret(Expr::ident("x", line(2)), line(2)),
        line(1),
    );
    let body = Stmt::sequence(vec![
        Stmt::declare(TypeNode::Int, "a", Expr::call("f", vec![Expr::bool(true, line(4))], line(4)), line(4)),
        Stmt::declare(
            TypeNode::Int,
            "b",
            Expr::call("f", vec![Expr::int(1, line(5)), Expr::int(2, line(5))], line(5)),
            line(5),
        ),
        Stmt::declare(TypeNode::Int, "c", Expr::call("f", vec![], line(6)), line(6)),
    ]);
    let (_, diagnostics) = check(Program::new(vec![identity], body));

    assert_eq!(
        error_names(&diagnostics),
        vec!["ArgumentTypeMismatch", "TooManyArguments", "TooFewArguments"]
    );
    assert_eq!(
        diagnostics.iter().next().unwrap().to_string(),
        "Function 'f' argument number '1' expected type 'int' got 'bool'"
    );
}

#[test]
fn test_arity_error_still_checks_overlapping_arguments() {
    let identity = FunctionDecl::new(
        "f",
        TypeNode::Int,
        vec![Parameter::new(TypeNode::Int, "x", line(1))],
        Stmt::ret(Expr::ident("x", line(2)), line(2)),
        line(1),
    );
    let call = Expr::call("f", vec![Expr::bool(true, line(4)), Expr::int(2, line(4))], line(4));
    let (_, diagnostics) = check(Program::new(
        vec![identity],
        Stmt::declare(TypeNode::Int, "a", call, line(4)),
    ));

    assert_eq!(error_names(&diagnostics), vec!["TooManyArguments", "ArgumentTypeMismatch"]);
}

#[test]
fn test_string_accepts_empty_array() {
    let function = FunctionDecl::new(
        "f",
        TypeNode::Int,
        vec![Parameter::new(TypeNode::String, "s", line(1))],
        Stmt::ret(Expr::int(0, line(2)), line(2)),
        line(1),
    );
    let body = Stmt::sequence(vec![
        Stmt::declare(TypeNode::String, "s", Expr::array_literal(vec![], line(4)), line(4)),
        Stmt::declare(
            TypeNode::Int,
            "n",
            Expr::call("f", vec![Expr::array_literal(vec![], line(5))], line(5)),
            line(5),
        ),
        Stmt::declare(
            TypeNode::Bool,
            "b",
            Expr::binary(
                BinaryOperator::Equal,
                Expr::ident("s", line(6)),
                Expr::array_literal(vec![], line(6)),
                line(6),
            ),
            line(6),
        ),
    ]);
    let (_, diagnostics) = check(Program::new(vec![function], body));

    assert!(diagnostics.is_empty());
}

#[test]
fn test_condition_not_bool() {
    let body = Stmt::sequence(vec![
        Stmt::if_else(Expr::int(1, line(1)), Stmt::skip(line(1)), Stmt::skip(line(1)), line(1)),
        Stmt::while_loop(Expr::char('c', line(2)), Stmt::skip(line(2)), line(2)),
    ]);
    let (_, diagnostics) = check(main_only(vec![body]));

    assert_eq!(error_names(&diagnostics), vec!["ConditionNotBool", "ConditionNotBool"]);
    assert_eq!(
        diagnostics.iter().next().unwrap().to_string(),
        "Expected 'bool' in 'if' conditional, got 'int'"
    );
}

#[test]
fn test_unary_operand_mismatches() {
    let unary = |operator, operand| Expr::unary(operator, operand, line(1));
    let body = Stmt::sequence(vec![
        Stmt::declare(TypeNode::Int, "a", unary(UnaryOperator::Len, Expr::int(1, line(1))), line(1)),
        Stmt::declare(TypeNode::Int, "b", unary(UnaryOperator::Ord, Expr::int(1, line(2))), line(2)),
        Stmt::declare(TypeNode::Char, "c", unary(UnaryOperator::Chr, Expr::char('a', line(3))), line(3)),
        Stmt::declare(TypeNode::Bool, "d", unary(UnaryOperator::Not, Expr::int(1, line(4))), line(4)),
        Stmt::declare(TypeNode::Int, "e", unary(UnaryOperator::Negate, Expr::bool(true, line(5))), line(5)),
        Stmt::declare(TypeNode::Int, "f", unary(UnaryOperator::Len, Expr::string("ab", line(6))), line(6)),
    ]);
    let (_, diagnostics) = check(main_only(vec![body]));

    assert_eq!(error_names(&diagnostics), vec!["UnaryOperandMismatch"; 5]);
    assert_eq!(
        diagnostics.iter().nth(1).unwrap().to_string(),
        "Invalid argument of 'ord', expected 'char' got 'int'"
    );
}

#[test]
fn test_return_type_mismatch() {
    let function = FunctionDecl::new(
        "f",
        TypeNode::Int,
        vec![],
        Stmt::ret(Expr::bool(true, line(2)), line(2)),
        line(1),
    );
    let (_, diagnostics) = check(Program::new(vec![function], Stmt::skip(line(4))));

    assert_eq!(error_names(&diagnostics), vec!["ReturnTypeMismatch"]);
    assert_eq!(
        diagnostics.iter().next().unwrap().to_string(),
        "Function expected return type 'int' but got 'bool'"
    );
}

#[test]
fn test_invalid_exit_code() {
    let (_, diagnostics) = check(main_only(vec![Stmt::exit(Expr::char('a', line(1)), line(1))]));

    assert_eq!(error_names(&diagnostics), vec!["InvalidExitCode"]);
}

#[test]
fn test_assign_type_mismatch() {
    let body = Stmt::sequence(vec![
        Stmt::declare(TypeNode::Int, "x", Expr::bool(true, line(1)), line(1)),
        Stmt::declare(TypeNode::Char, "c", Expr::char('a', line(2)), line(2)),
        Stmt::assign(Expr::ident("c", line(3)), Expr::int(1, line(3)), line(3)),
    ]);
    let (_, diagnostics) = check(main_only(vec![body]));

    assert_eq!(error_names(&diagnostics), vec!["AssignTypeMismatch", "AssignTypeMismatch"]);
    assert_eq!(
        diagnostics.iter().nth(1).unwrap().to_string(),
        "Unable to assign 'int' to 'char'"
    );
}

#[test]
fn test_operand_type_mismatch() {
    let body = Stmt::sequence(vec![
        Stmt::declare(
            TypeNode::Bool,
            "a",
            Expr::binary(BinaryOperator::Equal, Expr::int(1, line(1)), Expr::bool(true, line(1)), line(1)),
            line(1),
        ),
        Stmt::declare(
            TypeNode::Bool,
            "b",
            Expr::binary(BinaryOperator::Less, Expr::int(1, line(2)), Expr::char('a', line(2)), line(2)),
            line(2),
        ),
    ]);
    let (_, diagnostics) = check(main_only(vec![body]));

    assert_eq!(error_names(&diagnostics), vec!["OperandTypeMismatch", "OperandTypeMismatch"]);
    assert_eq!(diagnostics.iter().next().unwrap().to_string(), "Type mismatch in '=='");
}

#[test]
fn test_indexing_and_array_literal_errors() {
    let body = Stmt::sequence(vec![
        Stmt::declare(
            TypeNode::array_of(TypeNode::Int),
            "xs",
            Expr::array_literal(vec![Expr::int(1, line(1)), Expr::int(2, line(1))], line(1)),
            line(1),
        ),
        Stmt::declare(
            TypeNode::Int,
            "a",
            Expr::array_element("xs", vec![Expr::bool(true, line(2))], line(2)),
            line(2),
        ),
        Stmt::declare(TypeNode::Int, "n", Expr::int(1, line(3)), line(3)),
        Stmt::declare(
            TypeNode::Int,
            "b",
            Expr::array_element("n", vec![Expr::int(0, line(4))], line(4)),
            line(4),
        ),
        Stmt::declare(
            TypeNode::array_of(TypeNode::Int),
            "ys",
            Expr::array_literal(vec![Expr::int(1, line(5)), Expr::char('a', line(5))], line(5)),
            line(5),
        ),
    ]);
    let (_, diagnostics) = check(main_only(vec![body]));

    assert_eq!(
        error_names(&diagnostics),
        vec!["NonIntegerIndex", "IndexNonArray", "UnmatchedArrayLiteral"]
    );
    assert_eq!(
        diagnostics.iter().nth(1).unwrap().to_string(),
        "Tried to index a non-array type 'int'"
    );
}

#[test]
fn test_operand_mismatch_message() {
    let sum = Expr::binary(BinaryOperator::Plus, Expr::int(1, line(1)), Expr::bool(true, line(1)), line(1));
    let (_, diagnostics) = check(main_only(vec![Stmt::declare(TypeNode::Int, "x", sum, line(1))]));

    assert_eq!(error_names(&diagnostics), vec!["RightOperandMismatch"]);
    assert_eq!(
        diagnostics.iter().next().unwrap().to_string(),
        "Expected right argument of '+' to be 'int' but got 'bool'"
    );
}

#[test]
fn test_string_indexing_and_pairs() {
    let body = Stmt::sequence(vec![
        Stmt::declare(TypeNode::String, "s", Expr::string("hi", line(1)), line(1)),
        Stmt::declare(
            TypeNode::Char,
            "c",
            Expr::array_element("s", vec![Expr::int(0, line(2))], line(2)),
            line(2),
        ),
        Stmt::declare(TypeNode::Int, "n", Expr::int(1, line(3)), line(3)),
        Stmt::declare(TypeNode::Int, "m", Expr::fst(Expr::ident("n", line(4)), line(4)), line(4)),
    ]);
    let (_, diagnostics) = check(main_only(vec![body]));

    assert_eq!(error_names(&diagnostics), vec!["PairElementOfNonPair"]);
}

#[test]
fn test_invalid_read_and_free_targets() {
    let body = Stmt::sequence(vec![
        Stmt::declare(TypeNode::Bool, "b", Expr::bool(true, line(1)), line(1)),
        Stmt::read(Expr::ident("b", line(2)), line(2)),
        Stmt::free(Expr::ident("b", line(3)), line(3)),
        Stmt::read(Expr::ident("missing", line(4)), line(4)),
    ]);
    let (_, diagnostics) = check(main_only(vec![body]));

    assert_eq!(
        error_names(&diagnostics),
        vec!["InvalidReadTarget", "InvalidFreeTarget", "UndeclaredIdentifier"]
    );
}

#[test]
fn test_loop_extends_live_range() {
    let condition = Expr::binary(BinaryOperator::Less, Expr::ident("i", line(3)), Expr::ident("n", line(3)), line(3));
    let increment = Stmt::assign(
        Expr::ident("i", line(4)),
        Expr::binary(BinaryOperator::Plus, Expr::ident("i", line(4)), Expr::int(1, line(4)), line(4)),
        line(4),
    );
    let body = Stmt::sequence(vec![
        Stmt::declare(TypeNode::Int, "i", Expr::int(0, line(1)), line(1)),
        Stmt::declare(TypeNode::Int, "n", Expr::int(5, line(2)), line(2)),
        Stmt::while_loop(condition, increment, line(3)),
        Stmt::skip(line(6)),
    ]);
    let (type_checker, diagnostics) = check(main_only(vec![body]));
    assert!(diagnostics.is_empty());

    let while_index = collect_main(&type_checker).while_indices[0];
    let n = type_checker
        .scopes
        .lookup(type_checker.main_scope, "n", line(6))
        .unwrap();
    let range = type_checker.scopes.variable(n).unwrap().live_range.unwrap();

    assert!(range.birth < range.death);
    assert_eq!(range.death, while_index);
}
