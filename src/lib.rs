// minipy interpreter library
//
// A small Python-flavored language compiled in stages: source text is
// lexed into tokens, parsed into a syntax tree, bound into a typed tree
// and walked by the evaluator. Errors are collected as located
// diagnostics along the way rather than aborting the pipeline.

pub mod ast;
pub mod binder;
pub mod compilation;
pub mod diagnostics;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod text;
pub mod value;

// Re-export commonly used items
pub use ast::{ElifClause, ElseClause, Expr, Stmt, SyntaxTree};
pub use binder::{Binder, BoundGlobalScope, VariableSymbol};
pub use compilation::{Compilation, EvaluationResult};
pub use diagnostics::{Diagnostic, DiagnosticBag, RuntimeError};
pub use evaluator::Evaluator;
pub use lexer::{Lexer, SyntaxKind, Token};
pub use parser::Parser;
pub use text::{SourceText, TextSpan};
pub use value::{Type, Value};

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::run;
