// Parser robustness tests for NYAA-PL
//
// Every case is a complete program run through the lexer and parser. Failing
// cases may also pin a fragment of the diagnostic message.

use nyaa::ast::{BinaryOp, Expr, Literal, MainEntry, Program, Stmt};
use nyaa::error::NyaaError;
use nyaa::lexer::Lexer;
use nyaa::parser::Parser;

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_error_contains: Option<String>,
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    pub fn run(&self) -> TestSuiteResults {
        let mut results = TestSuiteResults::new(&self.name);

        println!("Running test suite: {}", self.name);
        println!("{}", "=".repeat(50));

        for test in &self.tests {
            let result = run_single_test(test);
            results.add_result(&test.name, result);
        }

        results.print_summary();
        results
    }
}

#[derive(Debug)]
pub struct TestSuiteResults {
    pub suite_name: String,
    pub results: Vec<(String, TestResult)>,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
}

impl TestSuiteResults {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            crashed: 0,
        }
    }

    pub fn add_result(&mut self, test_name: &str, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                println!("  ✓ {}", test_name);
            }
            TestResult::Fail(msg) => {
                self.failed += 1;
                println!("  ✗ {}: {}", test_name, msg);
            }
            TestResult::Crash(msg) => {
                self.crashed += 1;
                println!("  💥 {}: CRASHED - {}", test_name, msg);
            }
        }
        self.results.push((test_name.to_string(), result));
    }

    pub fn print_summary(&self) {
        println!();
        println!("Test Suite: {} - Summary", self.suite_name);
        println!("{}", "-".repeat(30));
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Crashed: {}", self.crashed);
        println!("Total:   {}", self.results.len());
        println!();
    }

    pub fn is_all_passed(&self) -> bool {
        self.crashed == 0 && self.failed == 0
    }
}

fn run_single_test(test: &TestCase) -> TestResult {
    // Catch any panics to detect crashes
    let result = std::panic::catch_unwind(|| parse_input(&test.input));

    match result {
        Ok(parse_result) => match (parse_result, test.should_succeed) {
            (Ok(_), true) => TestResult::Pass,
            (Ok(_), false) => {
                TestResult::Fail("Expected parsing to fail, but it succeeded".to_string())
            }
            (Err(error), false) => match &test.expected_error_contains {
                Some(expected) if !error.message.contains(expected) => TestResult::Fail(format!(
                    "Error message '{}' doesn't contain expected text '{}'",
                    error.message, expected
                )),
                _ => TestResult::Pass,
            },
            (Err(error), true) => TestResult::Fail(format!(
                "Expected parsing to succeed, but got error: {}",
                error.message
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

fn parse_input(input: &str) -> Result<Program, NyaaError> {
    let mut lexer = Lexer::new(input.to_string());
    let tokens = lexer.scan_tokens()?;
    let mut parser = Parser::new(tokens);
    parser.parse()
}

/// Wraps statements in a main block.
fn in_main(body: &str) -> String {
    format!("uWu_nyaa() => {{ {} }}", body)
}

impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_error_contains: None,
        }
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: None,
        }
    }

    pub fn should_fail_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: Some(expected_msg.to_string()),
        }
    }
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_program_shape_tests() -> TestSuite {
    let mut suite = TestSuite::new("Program Shape");

    suite.add_test(TestCase::should_succeed("empty_input", ""));
    suite.add_test(TestCase::should_succeed("only_whitespace", "   \n\t  "));
    suite.add_test(TestCase::should_succeed("only_comments", "# nothing here\n# nor here"));
    suite.add_test(TestCase::should_succeed("empty_main_block", "uWu_nyaa() => { }"));
    suite.add_test(TestCase::should_succeed(
        "single_statement_main",
        "uWu_nyaa() => purinto(\"nyaa\");",
    ));
    suite.add_test(TestCase::should_succeed(
        "functions_before_main",
        "kawaii f(a) => { sayonara a } kawaii g() { pasu } uWu_nyaa() => { f(1) }",
    ));
    suite.add_test(TestCase::should_succeed(
        "function_with_single_statement_body",
        "kawaii twice(n) => sayonara n * 2; uWu_nyaa() => purinto(twice(2))",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "missing_main",
        "kawaii f() { pasu }",
        "Expected 'uWu_nyaa' main entry",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "statement_without_main",
        "purinto(1)",
        "Expected 'uWu_nyaa' main entry",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "main_missing_arrow",
        "uWu_nyaa() { pasu }",
        "Expected '=>' after 'uWu_nyaa()'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "trailing_tokens_after_main",
        "uWu_nyaa() => { pasu } pasu",
        "Expected end of input after main entry",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "function_after_main",
        "uWu_nyaa() => { pasu } kawaii f() { pasu }",
        "Expected end of input after main entry",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "duplicate_parameter",
        "kawaii f(a, b, a) { pasu } uWu_nyaa() => { pasu }",
        "Duplicate parameter 'a' in function 'f'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "function_missing_name",
        "kawaii (a) { pasu } uWu_nyaa() => { pasu }",
        "Expected function name after 'kawaii'",
    ));

    suite
}

fn create_malformed_expressions_tests() -> TestSuite {
    let mut suite = TestSuite::new("Malformed Expressions");

    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren",
        &in_main("x asain (1 + 2"),
        "Expected ')' after expression",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren_nested",
        &in_main("x asain ((1 + 2)"),
        "Expected ')' after expression",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_closing_paren",
        &in_main("x asain 1 + 2)"),
        "Expected '}' after block",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "empty_parentheses",
        &in_main("x asain ()"),
        "Expected expression, found ')'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_right_operand",
        &in_main("x asain 1 +"),
        "Expected expression, found '}'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_main_block",
        "uWu_nyaa() => { x asain 1",
        "Expected '}' after block",
    ));

    let deep_parens = "(".repeat(100) + "1" + &")".repeat(100);
    suite.add_test(TestCase::should_succeed(
        "deeply_nested_parens",
        &in_main(&format!("x asain {}", deep_parens)),
    ));

    suite
}

fn create_operator_tests() -> TestSuite {
    let mut suite = TestSuite::new("Operator Tests");

    suite.add_test(TestCase::should_succeed("arithmetic", &in_main("x asain 1 + 2 * 3 / 4 - 5")));
    suite.add_test(TestCase::should_succeed("unary_minus", &in_main("x asain 1 - -2")));
    suite.add_test(TestCase::should_succeed("logic_words", &in_main("x asain HAI and not IIE or HAI")));
    suite.add_test(TestCase::should_succeed("comparison_equal", &in_main("x asain 1 == 2")));
    suite.add_test(TestCase::should_succeed("comparison_not_equal", &in_main("x asain 1 != 2")));
    suite.add_test(TestCase::should_succeed("comparison_chain", &in_main("x asain 1 < 2 <= 3")));
    suite.add_test(TestCase::should_succeed("string_concatenation", &in_main("x asain \"a\" + \"b\"")));

    suite.add_test(TestCase::should_fail("missing_left_operand", &in_main("x asain * 1")));
    suite.add_test(TestCase::should_fail("decrement_inside_expression", &in_main("x asain 1 -- 2")));
    suite.add_test(TestCase::should_fail_with_message(
        "single_equals_is_not_an_operator",
        &in_main("x = 1"),
        "Unexpected character: '='",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "lone_bang",
        &in_main("x asain !HAI"),
        "Unexpected character: '!'",
    ));

    suite
}

fn create_statement_tests() -> TestSuite {
    let mut suite = TestSuite::new("Statement Tests");

    suite.add_test(TestCase::should_succeed("assignment", &in_main("x asain 1")));
    suite.add_test(TestCase::should_succeed("postfix", &in_main("x asain 1; x++; x--")));
    suite.add_test(TestCase::should_succeed("semicolons_optional", &in_main("x asain 1 y asain 2; pasu")));
    suite.add_test(TestCase::should_succeed("bare_return", &in_main("sayonara")));
    suite.add_test(TestCase::should_succeed("bare_return_then_print", &in_main("sayonara purinto(1)")));
    suite.add_test(TestCase::should_succeed("print_many", &in_main("purinto(1, \"a\", HAI)")));
    suite.add_test(TestCase::should_succeed("print_nothing", &in_main("purinto()")));
    suite.add_test(TestCase::should_succeed("input_with_prompt", &in_main("name asain ohayo(\"? \")")));
    suite.add_test(TestCase::should_succeed("input_without_prompt", &in_main("ohayo()")));
    suite.add_test(TestCase::should_succeed("call_statement", &in_main("f(1, 2, 3)")));
    suite.add_test(TestCase::should_succeed("call_as_value", &in_main("x asain f(1) + g()")));

    suite.add_test(TestCase::should_fail_with_message(
        "bare_identifier",
        &in_main("x"),
        "Expected 'asain', '++', '--' or '(' after identifier 'x'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "assignment_missing_value",
        &in_main("x asain"),
        "Expected expression, found '}'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "literal_as_statement",
        &in_main("1 asain x"),
        "Expected '}' after block",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "trailing_comma",
        &in_main("f(1, 2,)"),
        "Expected expression, found ')'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_closing_paren",
        &in_main("f(1, 2"),
        "Expected ')' after arguments",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "input_prompt_must_be_string",
        &in_main("ohayo(1)"),
        "Expected ')' after input prompt",
    ));

    suite
}

fn create_control_flow_tests() -> TestSuite {
    let mut suite = TestSuite::new("Control Flow Tests");

    suite.add_test(TestCase::should_succeed("valid_if", &in_main("nyan (HAI) { x asain 1 }")));
    suite.add_test(TestCase::should_succeed(
        "if_elif_else",
        &in_main("nyan (x < 1) { pasu } nyanyan (x < 2) { pasu } nyanyan (x < 3) { pasu } baka { pasu }"),
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "if_missing_parens",
        &in_main("nyan HAI { pasu }"),
        "Expected '(' after 'nyan'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "else_needs_block",
        &in_main("nyan (HAI) { pasu } baka pasu"),
        "Expected '{' after 'baka'",
    ));

    suite.add_test(TestCase::should_succeed("valid_while", &in_main("nani (x < 3) { x++ }")));
    suite.add_test(TestCase::should_succeed("while_bare_break", &in_main("nani (HAI) yamete")));
    suite.add_test(TestCase::should_succeed(
        "break_and_continue_in_body",
        &in_main("nani (HAI) { nyan (x) { motto } yamete }"),
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "while_missing_condition",
        &in_main("nani { pasu }"),
        "Expected '(' after 'nani'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "while_missing_body",
        &in_main("nani (HAI)"),
        "Expected '{' before loop body",
    ));

    suite.add_test(TestCase::should_succeed(
        "try_except",
        &in_main("ganbatte { x asain 1 / 0 } gomenasai { purinto(\"oops\") }"),
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "try_without_except",
        &in_main("ganbatte { pasu }"),
        "Expected 'gomenasai' after 'ganbatte' block",
    ));

    suite
}

fn create_literal_tests() -> TestSuite {
    let mut suite = TestSuite::new("Literal Tests");

    suite.add_test(TestCase::should_succeed("integer_literal", &in_main("x asain 42")));
    suite.add_test(TestCase::should_succeed("float_literal", &in_main("x asain 3.14")));
    suite.add_test(TestCase::should_succeed("string_literal", &in_main("x asain \"hello\"")));
    suite.add_test(TestCase::should_succeed("string_escapes", &in_main("x asain \"a\\tb\\n\\\"c\\\"\"")));
    suite.add_test(TestCase::should_succeed("boolean_true", &in_main("x asain HAI")));
    suite.add_test(TestCase::should_succeed("boolean_false", &in_main("x asain IIE")));

    suite.add_test(TestCase::should_fail("multiple_dots", &in_main("x asain 3.14.159")));
    suite.add_test(TestCase::should_fail("trailing_dot", &in_main("x asain 42.")));
    suite.add_test(TestCase::should_fail("leading_dot", &in_main("x asain .42")));
    suite.add_test(TestCase::should_fail_with_message(
        "integer_too_large",
        &in_main("x asain 99999999999999999999"),
        "Invalid integer",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unterminated_string",
        "uWu_nyaa() => purinto(\"hello",
        "Unterminated string",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unterminated_string_with_newline",
        &in_main("x asain \"hello\nworld\""),
        "Unterminated string",
    ));

    suite
}

// ============================================================================
// Main Test Function
// ============================================================================

#[test]
fn comprehensive_parser_tests() {
    let suites = vec![
        create_program_shape_tests(),
        create_malformed_expressions_tests(),
        create_operator_tests(),
        create_statement_tests(),
        create_control_flow_tests(),
        create_literal_tests(),
    ];

    let mut failures = Vec::new();
    for suite in suites {
        let results = suite.run();
        if !results.is_all_passed() {
            failures.push(results.suite_name);
        }
    }

    assert!(failures.is_empty(), "Suites with failures: {:?}", failures);
}

fn main_statements(program: &Program) -> &[Stmt] {
    match &program.main {
        Some(MainEntry::Block(body)) => &body.statements,
        other => panic!("expected a main block, got {:?}", other),
    }
}

fn assigned_value(program: &Program) -> &Expr {
    match &main_statements(program)[0] {
        Stmt::Assignment { value, .. } => value,
        other => panic!("expected an assignment, got {:?}", other),
    }
}

fn int(expr: &Expr) -> i64 {
    match expr {
        Expr::Literal {
            value: Literal::Int(n),
            ..
        } => *n,
        other => panic!("expected an integer literal, got {:?}", other),
    }
}

#[test]
fn subtraction_groups_to_the_right() {
    let program = parse_input(&in_main("x asain 10 - 3 - 2")).unwrap();

    match assigned_value(&program) {
        Expr::Binary {
            left,
            operator: BinaryOp::Subtract,
            right,
            ..
        } => {
            assert_eq!(int(left), 10);
            match right.as_ref() {
                Expr::Binary {
                    left,
                    operator: BinaryOp::Subtract,
                    right,
                    ..
                } => {
                    assert_eq!(int(left), 3);
                    assert_eq!(int(right), 2);
                }
                other => panic!("expected nested subtraction, got {:?}", other),
            }
        }
        other => panic!("expected subtraction, got {:?}", other),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let program = parse_input(&in_main("x asain 1 + 2 * 3")).unwrap();

    match assigned_value(&program) {
        Expr::Binary {
            left,
            operator: BinaryOp::Add,
            right,
            ..
        } => {
            assert_eq!(int(left), 1);
            assert!(matches!(
                right.as_ref(),
                Expr::Binary {
                    operator: BinaryOp::Multiply,
                    ..
                }
            ));
        }
        other => panic!("expected addition at the root, got {:?}", other),
    }
}

#[test]
fn and_sits_on_the_multiplicative_tier() {
    // a or b and c  =>  a or (b and c)
    let program = parse_input(&in_main("x asain a or b and c")).unwrap();

    match assigned_value(&program) {
        Expr::Binary {
            operator: BinaryOp::Or,
            right,
            ..
        } => assert!(matches!(
            right.as_ref(),
            Expr::Binary {
                operator: BinaryOp::And,
                ..
            }
        )),
        other => panic!("expected 'or' at the root, got {:?}", other),
    }
}

#[test]
fn program_collects_functions_and_main() {
    let program = parse_input(
        "kawaii add(a, b) => { sayonara a + b }\nkawaii noop() { pasu }\nuWu_nyaa() => { purinto(add(1, 2)) }",
    )
    .unwrap();

    assert_eq!(program.functions.len(), 2);
    assert_eq!(program.functions[0].name, "add");
    assert_eq!(program.functions[0].params, vec!["a", "b"]);
    assert_eq!(program.functions[1].arity(), 0);
    assert_eq!(main_statements(&program).len(), 1);
}

#[test]
fn empty_source_is_an_empty_program() {
    let program = parse_input("").unwrap();
    assert!(program.is_empty());
    assert!(program.main.is_none());
}

#[test]
fn parse_errors_carry_position() {
    let error = parse_input("uWu_nyaa() => {\n  x asain\n}").unwrap_err();

    assert_eq!(error.kind, nyaa::ErrorKind::ParseError);
    let position = error.position.expect("parse errors have a position");
    assert_eq!(position.line, 3);
    assert_eq!(position.column, 1);
}

#[test]
fn function_definition_span_covers_its_body() {
    let program = nyaa::parse_program("kawaii f() { pasu } uWu_nyaa() => pasu").unwrap();

    assert_eq!(program.functions[0].span, nyaa::Span::new(0, 19));
    assert!(!program.is_empty());
}

#[test]
fn bare_return_leaves_print_as_its_own_statement() {
    let program = nyaa::parse_program("uWu_nyaa() => {\n  sayonara\n  purinto(1)\n}").unwrap();
    let statements = main_statements(&program);

    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[0], Stmt::Return { value: None, .. }));
    assert!(matches!(statements[1], Stmt::Print { .. }));
}
