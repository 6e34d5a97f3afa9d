//! Integration tests for end-to-end compilation.
//!
//! These tests verify that the complete pipeline works correctly, from a
//! syntax tree built the way a front-end would hand it over, through type
//! checking, to the rendered assembly or the diagnostic report.

use wacc::{
    ast::{
        ast::{FunctionDecl, Parameter, Program},
        expressions::{BinaryOperator, Expr},
        statements::Stmt,
        types::TypeNode,
    },
    compile_program,
    config::CompilerConfig,
    errors::errors::CompileFailure,
    Position, SourceText,
};

fn line(number: u32) -> Position {
    Position(number)
}

/// `int f(int x) is return x + 1 end`
fn increment() -> FunctionDecl {
    FunctionDecl::new(
        "f",
        TypeNode::Int,
        vec![Parameter::new(TypeNode::Int, "x", line(2))],
        Stmt::ret(
            Expr::binary(
                BinaryOperator::Plus,
                Expr::ident("x", line(3)),
                Expr::int(1, line(3)),
                line(3),
            ),
            line(3),
        ),
        line(2),
    )
}

#[test]
fn test_compile_function_call() {
    let body = Stmt::sequence(vec![
        Stmt::declare(
            TypeNode::Int,
            "y",
            Expr::call("f", vec![Expr::int(41, line(5))], line(5)),
            line(5),
        ),
        Stmt::println(Expr::ident("y", line(6)), line(6)),
    ]);
    let program = Program::new(vec![increment()], body);

    let assembly = compile_program(&program, &CompilerConfig::default()).unwrap();
    let text = assembly.to_string();

    assert!(text.contains(
        "f_f:\n\tPUSH {lr}\n\tLDR r4, [sp, #4]\n\tADDS r4, r4, #1\n\tBLVS p_throw_overflow_error\n\tMOV r0, r4\n\tPOP {pc}\n\t.ltorg\n"
    ));
    assert!(text.contains(concat!(
        "main:\n\tPUSH {lr}\n\tSUB sp, sp, #4\n",
        "\tLDR r4, =41\n\tSTR r4, [sp, #-4]!\n\tBL f_f\n\tADD sp, sp, #4\n\tMOV r4, r0\n\tSTR r4, [sp]\n",
        "\tLDR r4, [sp]\n\tMOV r0, r4\n\tBL p_print_int\n\tBL p_println\n",
        "\tLDR r4, =0\n\tMOV r0, r4\n\tADD sp, sp, #4\n\tPOP {pc}\n\t.ltorg\n",
    )));

    assert_eq!(text.matches("p_print_int:\n").count(), 1);
    assert_eq!(text.matches("p_println:\n").count(), 1);
    assert_eq!(text.matches("\tBL p_print_int\n").count(), 1);
    assert_eq!(text.matches("\tBL p_println\n").count(), 1);

    // Functions come first, then main, then the runtime routines
    let function = text.find("f_f:").unwrap();
    let main = text.find("main:").unwrap();
    let routines = text.find("p_throw_overflow_error:").unwrap();
    assert!(function < main && main < routines);
    assert!(text.starts_with(".data\n\n"));
}

#[test]
fn test_mutual_recursion() {
    // Each function calls the one declared after or before it
    let is_even = FunctionDecl::new(
        "even",
        TypeNode::Bool,
        vec![Parameter::new(TypeNode::Int, "n", line(1))],
        Stmt::if_else(
            Expr::binary(BinaryOperator::Equal, Expr::ident("n", line(2)), Expr::int(0, line(2)), line(2)),
            Stmt::ret(Expr::bool(true, line(2)), line(2)),
            Stmt::ret(
                Expr::call(
                    "odd",
                    vec![Expr::binary(
                        BinaryOperator::Minus,
                        Expr::ident("n", line(2)),
                        Expr::int(1, line(2)),
                        line(2),
                    )],
                    line(2),
                ),
                line(2),
            ),
            line(2),
        ),
        line(1),
    );
    let is_odd = FunctionDecl::new(
        "odd",
        TypeNode::Bool,
        vec![Parameter::new(TypeNode::Int, "n", line(4))],
        Stmt::if_else(
            Expr::binary(BinaryOperator::Equal, Expr::ident("n", line(5)), Expr::int(0, line(5)), line(5)),
            Stmt::ret(Expr::bool(false, line(5)), line(5)),
            Stmt::ret(
                Expr::call(
                    "even",
                    vec![Expr::binary(
                        BinaryOperator::Minus,
                        Expr::ident("n", line(5)),
                        Expr::int(1, line(5)),
                        line(5),
                    )],
                    line(5),
                ),
                line(5),
            ),
            line(5),
        ),
        line(4),
    );
    let body = Stmt::println(Expr::call("even", vec![Expr::int(4, line(7))], line(7)), line(7));

    let text = compile_program(&Program::new(vec![is_even, is_odd], body), &CompilerConfig::default())
        .unwrap()
        .to_string();

    assert!(text.contains("\tBL f_odd\n"));
    assert!(text.contains("\tBL f_even\n"));
    assert!(text.contains("\tBL p_print_bool\n"));
}

#[test]
fn test_overloads_get_distinct_labels() {
    let by_int = FunctionDecl::new(
        "show",
        TypeNode::Int,
        vec![Parameter::new(TypeNode::Int, "v", line(1))],
        Stmt::ret(Expr::ident("v", line(1)), line(1)),
        line(1),
    );
    let by_char = FunctionDecl::new(
        "show",
        TypeNode::Int,
        vec![Parameter::new(TypeNode::Char, "v", line(2))],
        Stmt::ret(Expr::int(0, line(2)), line(2)),
        line(2),
    );
    let body = Stmt::sequence(vec![
        Stmt::declare(TypeNode::Int, "a", Expr::call("show", vec![Expr::int(1, line(3))], line(3)), line(3)),
        Stmt::declare(
            TypeNode::Int,
            "b",
            Expr::call("show", vec![Expr::char('c', line(4))], line(4)),
            line(4),
        ),
    ]);

    let text = compile_program(&Program::new(vec![by_int, by_char], body), &CompilerConfig::default())
        .unwrap()
        .to_string();

    assert!(text.contains("f_show:\n"));
    assert!(text.contains("f_1_show:\n"));
    // The char argument is a single byte on the stack
    assert!(text.contains("\tMOV r4, #'c'\n\tSTRB r4, [sp, #-1]!\n\tBL f_1_show\n\tADD sp, sp, #1\n"));
}

#[test]
fn test_diagnostics_report() {
    let source = SourceText::new("begin\n  int x = true ;\n  println y\nend");
    let body = Stmt::sequence(vec![
        Stmt::declare(TypeNode::Int, "x", Expr::bool(true, line(2)), line(2)),
        Stmt::println(Expr::ident("y", line(3)), line(3)),
    ]);
    let config = CompilerConfig::default();

    let failure = compile_program(&Program::new(vec![], body), &config).unwrap_err();
    let CompileFailure::Diagnostics(diagnostics) = failure else {
        panic!("expected diagnostics");
    };

    assert_eq!(diagnostics.count(), 2);
    assert_eq!(diagnostics.exit_code(&config.exit_codes), 200);
    assert_eq!(
        diagnostics.render(&source),
        concat!(
            "Error on line 2:\n>>  int x = true ;\nUnable to assign 'bool' to 'int'\n",
            "Error on line 3:\n>>  println y\nIdentifier 'y' was not declared in the current scope\n",
            "2 error(s) detected\n",
        )
    );
}

#[test]
fn test_severity_precedence() {
    let function = FunctionDecl::new(
        "f",
        TypeNode::Int,
        vec![],
        Stmt::print(Expr::int(1, line(2)), line(2)),
        line(1),
    );
    let body = Stmt::declare(TypeNode::Bool, "b", Expr::int(1, line(4)), line(4));
    let config = CompilerConfig::default();

    let Err(CompileFailure::Diagnostics(diagnostics)) = compile_program(&Program::new(vec![function], body), &config)
    else {
        panic!("expected diagnostics");
    };

    // A missing return outranks the type error
    assert_eq!(diagnostics.count(), 2);
    assert_eq!(diagnostics.exit_code(&config.exit_codes), 100);
}

#[test]
fn test_nested_scopes_release_their_own_bytes() {
    let body = Stmt::sequence(vec![
        Stmt::declare(TypeNode::Int, "x", Expr::int(1, line(1)), line(1)),
        Stmt::block(
            Stmt::sequence(vec![
                Stmt::declare(TypeNode::Bool, "b", Expr::bool(true, line(2)), line(2)),
                Stmt::println(Expr::ident("x", line(3)), line(3)),
            ]),
            line(2),
        ),
    ]);

    let text = compile_program(&Program::new(vec![], body), &CompilerConfig::default())
        .unwrap()
        .to_string();

    assert!(text.contains(concat!(
        "\tSUB sp, sp, #1\n\tMOV r4, #1\n\tSTRB r4, [sp]\n",
        "\tLDR r4, [sp, #1]\n\tMOV r0, r4\n\tBL p_print_int\n\tBL p_println\n",
        "\tADD sp, sp, #1\n",
    )));
}
