// Comprehensive integration tests for the minipy pipeline
//
// Evaluation, diagnostic and REPL-session tests consolidated into a single
// integration test file to ensure proper Rust module organization.

use std::collections::HashMap;
use std::rc::Rc;

use minipy::ast::{Expr, Stmt, SyntaxTree};
use minipy::binder::BoundGlobalScope;
use minipy::compilation::{Compilation, EvaluationResult};
use minipy::diagnostics::RuntimeError;
use minipy::lexer::{Lexer, SyntaxKind};
use minipy::text::SourceText;
use minipy::value::Value;

/// What a test case expects a fresh submission to produce.
#[derive(Debug, Clone)]
pub enum Expected {
    Value(Value),
    Diagnostic(&'static str),
    Fault(&'static str),
}

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
    pub expected: Expected,
}

impl TestCase {
    pub fn yields_int(name: &str, input: &str, value: i64) -> Self {
        Self::new(name, input, Expected::Value(Value::Int(value)))
    }

    pub fn yields_bool(name: &str, input: &str, value: bool) -> Self {
        Self::new(name, input, Expected::Value(Value::Bool(value)))
    }

    pub fn yields_list(name: &str, input: &str, items: &[i64]) -> Self {
        Self::new(name, input, Expected::Value(Value::List(items.to_vec())))
    }

    pub fn reports(name: &str, input: &str, message: &'static str) -> Self {
        Self::new(name, input, Expected::Diagnostic(message))
    }

    pub fn faults(name: &str, input: &str, message: &'static str) -> Self {
        Self::new(name, input, Expected::Fault(message))
    }

    fn new(name: &str, input: &str, expected: Expected) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            expected,
        }
    }
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

    /// Run all tests in this suite
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

/// Results for a test suite run
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

/// Compile and evaluate one fresh submission against an empty store.
fn evaluate_submission(input: &str) -> Result<EvaluationResult, RuntimeError> {
    let mut variables = HashMap::new();
    Compilation::new(SyntaxTree::parse(input)).evaluate(&mut variables)
}

/// Run a single test case
fn run_single_test(test: &TestCase) -> TestResult {
    // Catch any panics to detect crashes
    let outcome = std::panic::catch_unwind(|| evaluate_submission(&test.input));

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            return TestResult::Crash(panic_msg);
        }
    };

    match (&test.expected, outcome) {
        (Expected::Value(want), Ok(result)) => {
            if let Some(diagnostic) = result.diagnostics.first() {
                TestResult::Fail(format!("unexpected diagnostic: {}", diagnostic))
            } else if result.value.as_ref() == Some(want) {
                TestResult::Pass
            } else {
                TestResult::Fail(format!("expected {}, got {:?}", want, result.value))
            }
        }
        (Expected::Value(want), Err(error)) => {
            TestResult::Fail(format!("expected {}, got runtime error: {}", want, error))
        }
        (Expected::Diagnostic(message), Ok(result)) => {
            if result
                .diagnostics
                .iter()
                .any(|diagnostic| diagnostic.message.contains(message))
            {
                TestResult::Pass
            } else if result.diagnostics.is_empty() {
                TestResult::Fail(format!("expected a diagnostic containing '{}'", message))
            } else {
                TestResult::Fail(format!(
                    "diagnostic '{}' doesn't contain expected text '{}'",
                    result.diagnostics[0], message
                ))
            }
        }
        (Expected::Diagnostic(message), Err(error)) => TestResult::Fail(format!(
            "expected a diagnostic containing '{}', got runtime error: {}",
            message, error
        )),
        (Expected::Fault(message), Err(error)) => {
            if error.message.contains(message) {
                TestResult::Pass
            } else {
                TestResult::Fail(format!(
                    "runtime error '{}' doesn't contain expected text '{}'",
                    error.message, message
                ))
            }
        }
        (Expected::Fault(message), Ok(_)) => TestResult::Fail(format!(
            "expected a runtime error containing '{}', but evaluation finished",
            message
        )),
    }
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_arithmetic_tests() -> TestSuite {
    let mut suite = TestSuite::new("Arithmetic and Precedence");

    suite.add_test(TestCase::yields_int("number_literal", "1", 1));
    suite.add_test(TestCase::yields_int("unary_identity", "+1", 1));
    suite.add_test(TestCase::yields_int("unary_negation", "-1", -1));
    suite.add_test(TestCase::yields_int("double_negation", "- -1", 1));
    suite.add_test(TestCase::yields_int("addition", "14 + 12", 26));
    suite.add_test(TestCase::yields_int("subtraction", "12 - 3", 9));
    suite.add_test(TestCase::yields_int("multiplication", "4 * 2", 8));
    suite.add_test(TestCase::yields_int("division", "9 / 3", 3));
    suite.add_test(TestCase::yields_int("division_truncates", "10 / 3", 3));
    suite.add_test(TestCase::yields_int("division_truncates_negative", "-7 / 2", -3));
    suite.add_test(TestCase::yields_int("parenthesized", "(10)", 10));
    suite.add_test(TestCase::yields_int("precedence_mul_over_add", "1 + 2 * 3", 7));
    suite.add_test(TestCase::yields_int("parens_override_precedence", "(1 + 2) * 3", 9));
    suite.add_test(TestCase::yields_int("left_associative_subtraction", "10 - 3 - 2", 5));
    suite.add_test(TestCase::yields_int("unary_binds_tighter", "-2 * 3", -6));

    suite
}

fn create_boolean_tests() -> TestSuite {
    let mut suite = TestSuite::new("Booleans and Comparisons");

    suite.add_test(TestCase::yields_bool("true_literal", "True", true));
    suite.add_test(TestCase::yields_bool("false_literal", "False", false));
    suite.add_test(TestCase::yields_bool("logical_not", "not True", false));
    suite.add_test(TestCase::yields_bool("logical_and", "True and False", false));
    suite.add_test(TestCase::yields_bool("logical_or", "False or True", true));
    suite.add_test(TestCase::yields_bool("or_binds_looser_than_and", "True or False and False", true));
    suite.add_test(TestCase::yields_bool("and_or_chain", "True and False or True", true));
    suite.add_test(TestCase::yields_bool("int_equality", "3 == 3", true));
    suite.add_test(TestCase::yields_bool("int_equality_false", "12 == 3", false));
    suite.add_test(TestCase::yields_bool("int_inequality", "12 != 3", true));
    suite.add_test(TestCase::yields_bool("bool_equality", "False == False", true));
    suite.add_test(TestCase::yields_bool("bool_inequality", "True != False", true));
    suite.add_test(TestCase::yields_bool("less", "3 < 4", true));
    suite.add_test(TestCase::yields_bool("less_or_equal", "5 <= 4", false));
    suite.add_test(TestCase::yields_bool("greater", "4 > 4", false));
    suite.add_test(TestCase::yields_bool("greater_or_equal", "4 >= 4", true));
    suite.add_test(TestCase::yields_bool("comparison_feeds_logic", "1 < 2 and 3 > 2", true));

    suite
}

fn create_identity_and_membership_tests() -> TestSuite {
    let mut suite = TestSuite::new("Identity and Membership");

    suite.add_test(TestCase::yields_bool("is_same_int", "1 is 1", true));
    suite.add_test(TestCase::yields_bool("is_different_int", "1 is 2", false));
    suite.add_test(TestCase::yields_bool("is_across_types", "1 is True", false));
    suite.add_test(TestCase::yields_bool("is_not_same_int", "1 is not 1", false));
    suite.add_test(TestCase::yields_bool("is_not_across_types", "1 is not True", true));
    suite.add_test(TestCase::yields_bool("membership_hit", "2 in range(5)", true));
    suite.add_test(TestCase::yields_bool("membership_miss", "7 in range(5)", false));
    suite.add_test(TestCase::yields_bool("membership_stepped", "4 in range(10, 0, -2)", true));
    suite.add_test(TestCase::yields_bool("membership_skips_steps", "3 in range(10, 0, -2)", false));

    suite
}

fn create_assignment_tests() -> TestSuite {
    let mut suite = TestSuite::new("Assignments");

    suite.add_test(TestCase::yields_int("assignment_is_expression", "x = 10", 10));
    suite.add_test(TestCase::yields_int("assignment_in_expression", "(x = 4) + 2", 6));
    suite.add_test(TestCase::yields_int("nested_assignment", "{x = (x = 12)}", 12));
    suite.add_test(TestCase::yields_int("chained_assignment", "{a = b = 7 a + b}", 14));
    suite.add_test(TestCase::yields_int("read_back", "{x = 10 x * x}", 100));
    suite.add_test(TestCase::yields_int("compound_add", "{x = 10 x += 5 x}", 15));
    suite.add_test(TestCase::yields_int("compound_subtract", "{x = 10 x -= 3 x}", 7));
    suite.add_test(TestCase::yields_int("compound_multiply", "{x = 10 x *= 2 x}", 20));
    suite.add_test(TestCase::yields_int("compound_divide", "{x = 10 x /= 4 x}", 2));
    suite.add_test(TestCase::yields_int("compound_is_expression", "{x = 10 x += 5}", 15));

    suite
}

fn create_control_flow_tests() -> TestSuite {
    let mut suite = TestSuite::new("Control Flow");

    suite.add_test(TestCase::yields_int("if_taken", "{x = 0 if True: x = 10 x}", 10));
    suite.add_test(TestCase::yields_int("if_skipped", "{x = 0 if False: x = 10 x}", 0));
    suite.add_test(TestCase::yields_int(
        "else_taken",
        "{x = 0 if False: x = 10 else: x = 20 x}",
        20,
    ));
    suite.add_test(TestCase::yields_int(
        "first_true_elif_wins",
        "{r = 0 x = 3 if x == 1: r = 1 elif x == 3: r = 3 elif x > 0: r = 9 else: r = 0 r}",
        3,
    ));
    suite.add_test(TestCase::yields_int(
        "else_after_elifs",
        "{r = 0 x = 5 if x == 1: r = 1 elif x == 2: r = 2 else: r = 99 r}",
        99,
    ));
    suite.add_test(TestCase::yields_int(
        "if_with_block_body",
        "{x = 0 if True: {x = 10} x}",
        10,
    ));
    suite.add_test(TestCase::yields_int(
        "while_accumulates",
        "{i = 0 result = 0 while i < 5: {result = result + i i = i + 1} result}",
        10,
    ));
    suite.add_test(TestCase::yields_int(
        "while_never_entered",
        "{result = 42 while False: result = 0 result}",
        42,
    ));
    suite.add_test(TestCase::yields_int(
        "for_sums_range",
        "{result = 0 for i in range(5): {result += i} result}",
        10,
    ));
    suite.add_test(TestCase::yields_int(
        "for_over_empty_range",
        "{result = 7 for i in range(0): result = 0 result}",
        7,
    ));
    suite.add_test(TestCase::yields_int(
        "for_counts_down",
        "{last = 0 for i in range(10, 0, -2): last = i last}",
        2,
    ));

    suite
}

fn create_range_tests() -> TestSuite {
    let mut suite = TestSuite::new("Range Expressions");

    suite.add_test(TestCase::yields_list("single_argument", "range(5)", &[0, 1, 2, 3, 4]));
    suite.add_test(TestCase::yields_list("two_arguments", "range(2, 5)", &[2, 3, 4]));
    suite.add_test(TestCase::yields_list(
        "negative_step",
        "range(10, 0, -2)",
        &[10, 8, 6, 4, 2],
    ));
    suite.add_test(TestCase::yields_list("explicit_step", "range(0, 10, 3)", &[0, 3, 6, 9]));
    suite.add_test(TestCase::yields_list(
        "counts_down_through_zero",
        "range(10, -1, -1)",
        &[10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
    ));
    suite.add_test(TestCase::yields_list("empty_when_equal", "range(5, 5)", &[]));
    suite.add_test(TestCase::yields_list("empty_when_inverted", "range(5, 2)", &[]));
    suite.add_test(TestCase::yields_list("computed_bounds", "range(1 + 1, 2 * 3)", &[2, 3, 4, 5]));

    suite
}

fn create_diagnostic_tests() -> TestSuite {
    let mut suite = TestSuite::new("Diagnostics");

    suite.add_test(TestCase::reports(
        "bad_character",
        "1 + $",
        "Bad character in input: '$'.",
    ));
    suite.add_test(TestCase::reports(
        "number_overflow",
        "9999999999999999999999",
        "The number 9999999999999999999999 isn't a valid int.",
    ));
    suite.add_test(TestCase::reports(
        "unclosed_parenthesis",
        "(1",
        "Unexpected token <EndOfFileToken>, expected <CloseParenthesisToken>.",
    ));
    suite.add_test(TestCase::reports(
        "missing_operand",
        "1 +",
        "Unexpected token <EndOfFileToken>, expected <IdentifierToken>.",
    ));
    suite.add_test(TestCase::reports(
        "trailing_tokens",
        "1 2",
        "Unexpected token <NumberToken>, expected <EndOfFileToken>.",
    ));
    suite.add_test(TestCase::reports(
        "undefined_name",
        "x",
        "Variable 'x' does not exist.",
    ));
    suite.add_test(TestCase::reports(
        "compound_needs_existing_variable",
        "x += 1",
        "Variable 'x' does not exist.",
    ));
    suite.add_test(TestCase::reports(
        "block_scope_does_not_leak",
        "{{y = 20} y}",
        "Variable 'y' does not exist.",
    ));
    suite.add_test(TestCase::reports(
        "undefined_unary_operator",
        "not 1",
        "Unary operator 'not' is not defined for type: int.",
    ));
    suite.add_test(TestCase::reports(
        "undefined_binary_operator",
        "1 + True",
        "Binary operator '+' is not defined for types: int and bool.",
    ));
    suite.add_test(TestCase::reports(
        "equality_requires_matching_types",
        "1 == True",
        "Binary operator '==' is not defined for types: int and bool.",
    ));
    suite.add_test(TestCase::reports(
        "membership_needs_list",
        "5 in 5",
        "Binary operator 'in' is not defined for types: int and int.",
    ));
    suite.add_test(TestCase::reports(
        "condition_must_be_bool",
        "if 1: 2",
        "Cannot convert type 'int' to 'bool'.",
    ));
    suite.add_test(TestCase::reports(
        "range_argument_must_be_int",
        "range(True)",
        "Cannot convert type 'bool' to 'int'.",
    ));
    suite.add_test(TestCase::reports(
        "for_needs_list",
        "for i in 5: i",
        "Cannot convert type 'int' to 'list'.",
    ));

    suite
}

fn create_runtime_fault_tests() -> TestSuite {
    let mut suite = TestSuite::new("Runtime Faults");

    suite.add_test(TestCase::faults("division_by_zero", "1 / 0", "Division by zero."));
    suite.add_test(TestCase::faults(
        "division_by_computed_zero",
        "10 / (5 - 5)",
        "Division by zero.",
    ));
    suite.add_test(TestCase::faults(
        "zero_range_step",
        "range(1, 5, 0)",
        "range() step argument must not be zero.",
    ));
    suite.add_test(TestCase::faults(
        "fault_inside_loop",
        "{x = 0 for i in range(3): x = 1 / (1 - i) x}",
        "Division by zero.",
    ));

    suite
}

// ============================================================================
// Main Test Function
// ============================================================================

#[test]
fn comprehensive_language_tests() {
    let mut all_passed = true;

    let suites = vec![
        create_arithmetic_tests(),
        create_boolean_tests(),
        create_identity_and_membership_tests(),
        create_assignment_tests(),
        create_control_flow_tests(),
        create_range_tests(),
        create_diagnostic_tests(),
        create_runtime_fault_tests(),
    ];

    for suite in suites {
        let results = suite.run();
        if !results.is_all_passed() {
            all_passed = false;
        }
    }

    assert!(all_passed, "some language tests failed; see output above");
}

// ============================================================================
// REPL Session Tests
// ============================================================================

/// A REPL-shaped session: submissions chain their global scopes and share
/// one variable store, and only clean submissions advance the chain.
struct Session {
    previous: Option<Rc<BoundGlobalScope>>,
    variables: HashMap<String, Value>,
}

impl Session {
    fn new() -> Self {
        Self {
            previous: None,
            variables: HashMap::new(),
        }
    }

    fn submit(&mut self, line: &str) -> Result<EvaluationResult, RuntimeError> {
        let syntax = SyntaxTree::parse(line);
        let compilation = match self.previous.clone() {
            Some(previous) => Compilation::continue_with(previous, syntax),
            None => Compilation::new(syntax),
        };

        let result = compilation.evaluate(&mut self.variables);
        if let Ok(evaluation) = &result {
            if evaluation.diagnostics.is_empty() {
                self.previous = Some(compilation.global_scope().clone());
            }
        }
        result
    }

    fn submit_value(&mut self, line: &str) -> Value {
        let result = self.submit(line).unwrap();
        assert!(
            result.diagnostics.is_empty(),
            "unexpected diagnostic for '{}': {}",
            line,
            result.diagnostics[0]
        );
        result.value.unwrap()
    }
}

#[test]
fn session_chains_submissions() {
    let mut session = Session::new();

    assert_eq!(session.submit_value("x = 10"), Value::Int(10));
    assert_eq!(session.submit_value("y = x * 2"), Value::Int(20));
    assert_eq!(session.submit_value("x + y"), Value::Int(30));
}

#[test]
fn session_rejects_block_locals_from_earlier_submissions() {
    let mut session = Session::new();

    assert_eq!(session.submit_value("{x = 20}"), Value::Int(20));

    let result = session.submit("x").unwrap();
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].message, "Variable 'x' does not exist.");
}

#[test]
fn session_allows_retyping_variables() {
    let mut session = Session::new();

    assert_eq!(session.submit_value("x = 10"), Value::Int(10));
    assert_eq!(session.submit_value("x = True"), Value::Bool(true));
    assert_eq!(session.submit_value("x and False"), Value::Bool(false));
}

#[test]
fn failed_binding_leaves_store_untouched() {
    let mut session = Session::new();
    session.submit_value("x = 10");

    let result = session.submit("x = y + 1").unwrap();
    assert!(!result.diagnostics.is_empty());

    assert_eq!(session.submit_value("x"), Value::Int(10));
}

#[test]
fn runtime_fault_leaves_store_untouched() {
    let mut session = Session::new();
    session.submit_value("x = 10");

    let error = session.submit("{x = 99 1 / 0}").unwrap_err();
    assert_eq!(error.message, "Division by zero.");

    assert_eq!(session.submit_value("x"), Value::Int(10));
}

#[test]
fn global_scope_is_computed_once() {
    let compilation = Compilation::new(SyntaxTree::parse("1 + 2"));
    let first = Rc::clone(compilation.global_scope());
    let second = Rc::clone(compilation.global_scope());
    assert!(Rc::ptr_eq(&first, &second));
}

// ============================================================================
// Lexer and Source Text Tests
// ============================================================================

fn lex_all(input: &str) -> Vec<minipy::lexer::Token> {
    let text = SourceText::from(input);
    let mut lexer = Lexer::new(&text);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let kind = token.kind;
        tokens.push(token);
        if kind == SyntaxKind::EndOfFile {
            break;
        }
    }
    tokens
}

#[test]
fn lexer_covers_every_position_exactly_once() {
    let input = "x = 10 + foo * (2 - 3)";
    let tokens = lex_all(input);

    let mut position = 0;
    for token in &tokens {
        assert_eq!(token.span.start, position, "gap before {}", token.kind);
        position = token.span.end();
    }
    assert_eq!(position, input.len());
}

#[test]
fn lexer_keeps_whitespace_as_tokens() {
    let tokens = lex_all("x = 10");
    let kinds: Vec<SyntaxKind> = tokens.iter().map(|token| token.kind).collect();

    assert_eq!(
        kinds,
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::Whitespace,
            SyntaxKind::Equals,
            SyntaxKind::Whitespace,
            SyntaxKind::Number,
            SyntaxKind::EndOfFile,
        ]
    );
    assert_eq!(tokens[4].value, Some(10));
}

#[test]
fn lexer_end_of_file_is_idempotent() {
    let text = SourceText::from("1");
    let mut lexer = Lexer::new(&text);

    assert_eq!(lexer.next_token().kind, SyntaxKind::Number);

    let first_eof = lexer.next_token();
    let second_eof = lexer.next_token();
    assert_eq!(first_eof.kind, SyntaxKind::EndOfFile);
    assert_eq!(second_eof.kind, SyntaxKind::EndOfFile);
    assert_eq!(first_eof.span, second_eof.span);
    assert_eq!(first_eof.span.start, 1);
}

#[test]
fn lexer_matches_two_character_operators_greedily() {
    let two_char = [
        ("==", SyntaxKind::EqualsEquals),
        ("!=", SyntaxKind::BangEquals),
        (">=", SyntaxKind::GreaterEquals),
        ("<=", SyntaxKind::LessEquals),
        ("+=", SyntaxKind::PlusEquals),
        ("-=", SyntaxKind::MinusEquals),
        ("*=", SyntaxKind::StarEquals),
        ("/=", SyntaxKind::SlashEquals),
    ];

    for (text, expected) in two_char {
        let tokens = lex_all(text);
        assert_eq!(tokens.len(), 2, "expected one token plus EOF for '{}'", text);
        assert_eq!(tokens[0].kind, expected);
        assert_eq!(tokens[0].text, text);
        assert_eq!(expected.fixed_text(), Some(text));
    }
}

#[test]
fn lexer_round_trips_every_fixed_token_text() {
    for &kind in SyntaxKind::all() {
        // `is not` is synthesized by the parser and lexes as two tokens.
        if kind == SyntaxKind::IsNotKeyword {
            continue;
        }
        let text = match kind.fixed_text() {
            Some(text) => text,
            None => continue,
        };

        let tokens = lex_all(text);
        assert_eq!(tokens.len(), 2, "expected one token plus EOF for '{}'", text);
        assert_eq!(tokens[0].kind, kind, "wrong kind for '{}'", text);
        assert_eq!(tokens[0].text, text);
    }
}

#[test]
fn lexer_distinguishes_keywords_from_identifiers() {
    let tokens = lex_all("while whilex True Truthy");
    let kinds: Vec<SyntaxKind> = tokens
        .iter()
        .filter(|token| token.kind != SyntaxKind::Whitespace)
        .map(|token| token.kind)
        .collect();

    assert_eq!(
        kinds,
        vec![
            SyntaxKind::WhileKeyword,
            SyntaxKind::Identifier,
            SyntaxKind::TrueKeyword,
            SyntaxKind::Identifier,
            SyntaxKind::EndOfFile,
        ]
    );
}

fn parse_expression(input: &str) -> Expr {
    let syntax = SyntaxTree::parse(input);
    assert!(
        syntax.diagnostics().is_empty(),
        "unexpected diagnostic for '{}': {}",
        input,
        syntax.diagnostics()[0]
    );
    match syntax.root() {
        Stmt::Expression { expr } => expr.clone(),
        other => panic!("expected an expression statement for '{}', got {:?}", input, other),
    }
}

fn assert_name(expr: &Expr, name: &str, input: &str) {
    match expr {
        Expr::Name { identifier } => {
            assert_eq!(identifier.text, name, "operand name for '{}'", input)
        }
        other => panic!("expected name '{}' for '{}', got {:?}", name, input, other),
    }
}

fn assert_binary(expr: &Expr, kind: SyntaxKind, left_name: &str, right_name: &str, input: &str) {
    match expr {
        Expr::Binary {
            left,
            operator,
            right,
            ..
        } => {
            assert_eq!(operator.kind, kind, "inner operator for '{}'", input);
            assert_name(left, left_name, input);
            assert_name(right, right_name, input);
        }
        other => panic!("expected a binary expression for '{}', got {:?}", input, other),
    }
}

#[test]
fn parser_honors_binary_operator_precedence_pairwise() {
    let binary_kinds: Vec<SyntaxKind> = SyntaxKind::all()
        .iter()
        .copied()
        .filter(|kind| kind.binary_operator_precedence() > 0)
        .collect();

    for &op1 in &binary_kinds {
        for &op2 in &binary_kinds {
            let input = format!(
                "a {} b {} c",
                op1.fixed_text().unwrap(),
                op2.fixed_text().unwrap()
            );
            let expr = parse_expression(&input);

            // The lower-precedence operator ends up as the outer node;
            // equal precedence nests left.
            match &expr {
                Expr::Binary {
                    left,
                    operator,
                    right,
                    ..
                } => {
                    if op1.binary_operator_precedence() >= op2.binary_operator_precedence() {
                        assert_eq!(operator.kind, op2, "outer operator for '{}'", input);
                        assert_binary(left, op1, "a", "b", &input);
                        assert_name(right, "c", &input);
                    } else {
                        assert_eq!(operator.kind, op1, "outer operator for '{}'", input);
                        assert_name(left, "a", &input);
                        assert_binary(right, op2, "b", "c", &input);
                    }
                }
                other => {
                    panic!("expected a binary expression for '{}', got {:?}", input, other)
                }
            }
        }
    }
}

#[test]
fn source_text_maps_positions_to_lines() {
    let text = SourceText::from("first\nsecond\r\nthird");

    assert_eq!(text.lines().len(), 3);
    assert_eq!(text.line_index(0), 0);
    assert_eq!(text.line_index(5), 0);
    assert_eq!(text.line_index(6), 1);
    assert_eq!(text.line_index(13), 1);
    assert_eq!(text.line_index(14), 2);
    assert_eq!(text.line_index(18), 2);

    let second = &text.lines()[1];
    assert_eq!(text.span_text(second.span()), "second");
}

#[test]
fn evaluation_is_idempotent_across_fresh_stores() {
    let input = "{sum = 0 for i in range(5): {sum = sum + i} sum}";

    let first = evaluate_submission(input).unwrap();
    let second = evaluate_submission(input).unwrap();
    assert!(first.diagnostics.is_empty());
    assert_eq!(first.value, Some(Value::Int(10)));
    assert_eq!(first.value, second.value);
}

#[test]
fn diagnostic_spans_cover_the_offending_text() {
    let cases = [
        ("1 + True", "+"),
        ("foo", "foo"),
        ("1 + $", "$"),
        ("if 1 + 1: 2", "1 + 1"),
    ];

    for (input, expected) in cases {
        let result = evaluate_submission(input).unwrap();
        let diagnostic = result
            .diagnostics
            .first()
            .unwrap_or_else(|| panic!("expected a diagnostic for '{}'", input));
        assert_eq!(
            &input[diagnostic.span.to_range()],
            expected,
            "span mismatch for '{}'",
            input
        );
    }
}

#[test]
fn parse_recovers_and_still_builds_a_tree() {
    let syntax = SyntaxTree::parse("(1 +");

    assert!(!syntax.diagnostics().is_empty());
    // The root still exists and spans the text even after recovery.
    assert!(syntax.root().span().end() <= syntax.text().len());
}
