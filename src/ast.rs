use crate::diagnostics::Diagnostic;
use crate::lexer::Token;
use crate::parser::Parser;
use crate::text::{SourceText, TextSpan};
use crate::value::Value;

/// One parsed submission: the source it came from, a single top-level
/// statement, and every diagnostic the lexer and parser reported.
#[derive(Debug)]
pub struct SyntaxTree {
    text: SourceText,
    root: Stmt,
    diagnostics: Vec<Diagnostic>,
}

impl SyntaxTree {
    pub fn parse(text: impl Into<String>) -> Self {
        let text = SourceText::from(text);
        let mut parser = Parser::new(&text);
        let root = parser.parse_compilation_unit();
        let diagnostics = parser.take_diagnostics().into_vec();

        Self {
            text,
            root,
            diagnostics,
        }
    }

    pub fn text(&self) -> &SourceText {
        &self.text
    }

    pub fn root(&self) -> &Stmt {
        &self.root
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression {
        expr: Expr,
    },
    Block {
        statements: Vec<Stmt>,
        span: TextSpan,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        elif_clauses: Vec<ElifClause>,
        else_clause: Option<ElseClause>,
        span: TextSpan,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
        span: TextSpan,
    },
    For {
        identifier: Token,
        iterable: Expr,
        body: Box<Stmt>,
        span: TextSpan,
    },
}

#[derive(Debug, Clone)]
pub struct ElifClause {
    pub condition: Expr,
    pub statement: Stmt,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct ElseClause {
    pub statement: Box<Stmt>,
    pub span: TextSpan,
}

impl Stmt {
    pub fn span(&self) -> TextSpan {
        match self {
            Stmt::Expression { expr } => expr.span(),
            Stmt::Block { span, .. } => *span,
            Stmt::If { span, .. } => *span,
            Stmt::While { span, .. } => *span,
            Stmt::For { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: Value,
        span: TextSpan,
    },
    Name {
        identifier: Token,
    },
    /// `name = value`; right-associative and expression-valued.
    Assign {
        identifier: Token,
        value: Box<Expr>,
        span: TextSpan,
    },
    /// `name ⊕= value` for ⊕ in `+ - * /`.
    CompoundAssign {
        identifier: Token,
        operator: Token,
        value: Box<Expr>,
        span: TextSpan,
    },
    Unary {
        operator: Token,
        operand: Box<Expr>,
        span: TextSpan,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
        span: TextSpan,
    },
    Parenthesized {
        expression: Box<Expr>,
        span: TextSpan,
    },
    /// `range(lower)`, `range(lower, upper)` or `range(lower, upper, step)`.
    Range {
        lower: Box<Expr>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
        span: TextSpan,
    },
}

impl Expr {
    pub fn span(&self) -> TextSpan {
        match self {
            Expr::Literal { span, .. } => *span,
            Expr::Name { identifier } => identifier.span,
            Expr::Assign { span, .. } => *span,
            Expr::CompoundAssign { span, .. } => *span,
            Expr::Unary { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
            Expr::Parenthesized { span, .. } => *span,
            Expr::Range { span, .. } => *span,
        }
    }
}
