use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::lexer::SyntaxKind;
use crate::text::TextSpan;
use crate::value::Type;

/// A located, recoverable source-level error. Diagnostics are collected,
/// never thrown: every stage keeps producing output after reporting one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: TextSpan,
    pub message: String,
}

impl Diagnostic {
    pub fn new(span: TextSpan, message: String) -> Self {
        Self { span, message }
    }

    /// Render this diagnostic against its source text with ariadne.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        print_report(
            &self.message,
            self.span,
            source,
            filename,
            "Error",
            Color::Yellow,
        );
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Collects diagnostics for one pipeline stage. Message wording lives here
/// so every stage reports through the same catalogue.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    fn report(&mut self, span: TextSpan, message: String) {
        self.diagnostics.push(Diagnostic::new(span, message));
    }

    pub fn report_invalid_number(&mut self, span: TextSpan, text: &str, ty: Type) {
        self.report(span, format!("The number {} isn't a valid {}.", text, ty));
    }

    pub fn report_bad_character(&mut self, position: usize, character: char) {
        self.report(
            TextSpan::new(position, character.len_utf8()),
            format!("Bad character in input: '{}'.", character),
        );
    }

    pub fn report_unexpected_token(
        &mut self,
        span: TextSpan,
        actual: SyntaxKind,
        expected: SyntaxKind,
    ) {
        self.report(
            span,
            format!("Unexpected token <{}>, expected <{}>.", actual, expected),
        );
    }

    pub fn report_undefined_unary_operator(&mut self, span: TextSpan, operator: &str, ty: Type) {
        self.report(
            span,
            format!("Unary operator '{}' is not defined for type: {}.", operator, ty),
        );
    }

    pub fn report_undefined_binary_operator(
        &mut self,
        span: TextSpan,
        operator: &str,
        left: Type,
        right: Type,
    ) {
        self.report(
            span,
            format!(
                "Binary operator '{}' is not defined for types: {} and {}.",
                operator, left, right
            ),
        );
    }

    pub fn report_undefined_name(&mut self, span: TextSpan, name: &str) {
        self.report(span, format!("Variable '{}' does not exist.", name));
    }

    pub fn report_cannot_convert(&mut self, span: TextSpan, from: Type, to: Type) {
        self.report(span, format!("Cannot convert type '{}' to '{}'.", from, to));
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn extend(&mut self, other: DiagnosticBag) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl IntoIterator for DiagnosticBag {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

/// An unrecoverable evaluation-time fault. Unlike a diagnostic this aborts
/// the submission immediately; it either reflects genuine runtime semantics
/// (division by zero, zero range step) or a broken binder invariant.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub span: TextSpan,
    pub message: String,
}

impl RuntimeError {
    pub fn division_by_zero(span: TextSpan) -> Self {
        Self {
            span,
            message: "Division by zero.".to_string(),
        }
    }

    pub fn zero_range_step(span: TextSpan) -> Self {
        Self {
            span,
            message: "range() step argument must not be zero.".to_string(),
        }
    }

    pub fn uninitialized_variable(span: TextSpan, name: &str) -> Self {
        Self {
            span,
            message: format!("Variable '{}' is not initialized.", name),
        }
    }

    pub fn unexpected_type(span: TextSpan, expected: Type, actual: Type) -> Self {
        Self {
            span,
            message: format!("Expected a value of type '{}', found '{}'.", expected, actual),
        }
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        print_report(
            &self.message,
            self.span,
            source,
            filename,
            "Runtime Error",
            Color::Magenta,
        );
    }
}

fn print_report(
    message: &str,
    span: TextSpan,
    source: &str,
    filename: Option<&str>,
    kind: &str,
    color: Color,
) {
    let filename = filename.unwrap_or("<repl>");

    let result = Report::build(ReportKind::Error, filename, span.start)
        .with_message(format!("{}: {}", kind.fg(color), message))
        .with_label(
            Label::new((filename, span.to_range()))
                .with_message(message)
                .with_color(color),
        )
        .finish()
        .print((filename, Source::from(source)));

    if let Err(error) = result {
        eprintln!("{}", error);
    }
}
