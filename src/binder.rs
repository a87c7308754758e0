use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{ElifClause, Expr, Stmt};
use crate::diagnostics::{Diagnostic, DiagnosticBag};
use crate::lexer::{SyntaxKind, Token};
use crate::text::TextSpan;
use crate::value::{Type, Value};

/// The logical identity of a variable. Scope and store lookups go by name,
/// so rebinding a name with a new type still resolves to the same variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSymbol {
    pub name: String,
    pub ty: Type,
}

impl VariableSymbol {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One lexical scope: a name→symbol map plus at most one parent. Scopes are
/// pushed and popped by swapping ownership, the same way block environments
/// nest in the evaluator of a plain tree-walker.
#[derive(Debug, Default)]
pub struct BoundScope {
    variables: HashMap<String, VariableSymbol>,
    parent: Option<Box<BoundScope>>,
}

impl BoundScope {
    pub fn new(parent: Option<Box<BoundScope>>) -> Self {
        Self {
            variables: HashMap::new(),
            parent,
        }
    }

    /// Declare in this scope. A name may be declared at most once per scope.
    pub fn try_declare(&mut self, variable: VariableSymbol) -> bool {
        if self.variables.contains_key(&variable.name) {
            return false;
        }
        self.variables.insert(variable.name.clone(), variable);
        true
    }

    /// Insert unconditionally, replacing any existing declaration.
    fn force_declare(&mut self, variable: VariableSymbol) {
        self.variables.insert(variable.name.clone(), variable);
    }

    /// Nearest-enclosing-scope lookup.
    pub fn lookup(&self, name: &str) -> Option<&VariableSymbol> {
        self.variables
            .get(name)
            .or_else(|| self.parent.as_ref().and_then(|parent| parent.lookup(name)))
    }

    /// Replace the symbol in whichever scope currently declares the name.
    /// Returns false if no enclosing scope declares it.
    pub fn try_update(&mut self, variable: VariableSymbol) -> bool {
        if self.variables.contains_key(&variable.name) {
            self.variables.insert(variable.name.clone(), variable);
            return true;
        }
        match &mut self.parent {
            Some(parent) => parent.try_update(variable),
            None => false,
        }
    }

    pub fn declared_variables(&self) -> Vec<VariableSymbol> {
        self.variables.values().cloned().collect()
    }
}

/// Immutable record of one submission's binding result, chained to the
/// previous submission so a REPL session accumulates declarations.
#[derive(Debug)]
pub struct BoundGlobalScope {
    pub previous: Option<Rc<BoundGlobalScope>>,
    pub diagnostics: Vec<Diagnostic>,
    pub variables: Vec<VariableSymbol>,
    pub statement: BoundStmt,
}

#[derive(Debug, Clone)]
pub enum BoundStmt {
    Expression {
        expression: BoundExpr,
    },
    Block {
        statements: Vec<BoundStmt>,
    },
    If {
        condition: BoundExpr,
        then_branch: Box<BoundStmt>,
        elif_clauses: Vec<BoundElifClause>,
        else_branch: Option<Box<BoundStmt>>,
    },
    While {
        condition: BoundExpr,
        body: Box<BoundStmt>,
    },
    For {
        variable: VariableSymbol,
        iterable: BoundExpr,
        body: Box<BoundStmt>,
    },
}

#[derive(Debug, Clone)]
pub struct BoundElifClause {
    pub condition: BoundExpr,
    pub statement: BoundStmt,
}

/// Typed counterpart of the syntax tree. Operators are resolved descriptors
/// and every node knows its type; the evaluator only reads this.
#[derive(Debug, Clone)]
pub enum BoundExpr {
    Literal {
        value: Value,
        span: TextSpan,
    },
    Variable {
        variable: VariableSymbol,
        span: TextSpan,
    },
    Assignment {
        variable: VariableSymbol,
        expression: Box<BoundExpr>,
        span: TextSpan,
    },
    CompoundAssignment {
        variable: VariableSymbol,
        operator: &'static BoundBinaryOperator,
        expression: Box<BoundExpr>,
        operator_span: TextSpan,
        span: TextSpan,
    },
    Unary {
        operator: &'static BoundUnaryOperator,
        operand: Box<BoundExpr>,
        span: TextSpan,
    },
    Binary {
        left: Box<BoundExpr>,
        operator: &'static BoundBinaryOperator,
        right: Box<BoundExpr>,
        operator_span: TextSpan,
        span: TextSpan,
    },
    Range {
        lower: Box<BoundExpr>,
        upper: Option<Box<BoundExpr>>,
        step: Option<Box<BoundExpr>>,
        span: TextSpan,
    },
}

impl BoundExpr {
    pub fn ty(&self) -> Type {
        match self {
            BoundExpr::Literal { value, .. } => value.ty(),
            BoundExpr::Variable { variable, .. } => variable.ty,
            BoundExpr::Assignment { expression, .. } => expression.ty(),
            BoundExpr::CompoundAssignment { operator, .. } => operator.result_type,
            BoundExpr::Unary { operator, .. } => operator.result_type,
            BoundExpr::Binary { operator, .. } => operator.result_type,
            BoundExpr::Range { .. } => Type::List,
        }
    }

    pub fn span(&self) -> TextSpan {
        match self {
            BoundExpr::Literal { span, .. }
            | BoundExpr::Variable { span, .. }
            | BoundExpr::Assignment { span, .. }
            | BoundExpr::CompoundAssignment { span, .. }
            | BoundExpr::Unary { span, .. }
            | BoundExpr::Binary { span, .. }
            | BoundExpr::Range { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundUnaryOperatorKind {
    Identity,
    Negation,
    LogicalNegation,
}

#[derive(Debug)]
pub struct BoundUnaryOperator {
    syntax_kind: SyntaxKind,
    pub kind: BoundUnaryOperatorKind,
    pub operand_type: Type,
    pub result_type: Type,
}

const UNARY_OPERATORS: &[BoundUnaryOperator] = &[
    BoundUnaryOperator {
        syntax_kind: SyntaxKind::Plus,
        kind: BoundUnaryOperatorKind::Identity,
        operand_type: Type::Int,
        result_type: Type::Int,
    },
    BoundUnaryOperator {
        syntax_kind: SyntaxKind::Minus,
        kind: BoundUnaryOperatorKind::Negation,
        operand_type: Type::Int,
        result_type: Type::Int,
    },
    BoundUnaryOperator {
        syntax_kind: SyntaxKind::NotKeyword,
        kind: BoundUnaryOperatorKind::LogicalNegation,
        operand_type: Type::Bool,
        result_type: Type::Bool,
    },
];

impl BoundUnaryOperator {
    pub fn bind(syntax_kind: SyntaxKind, operand_type: Type) -> Option<&'static Self> {
        UNARY_OPERATORS
            .iter()
            .find(|op| op.syntax_kind == syntax_kind && op.operand_type == operand_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundBinaryOperatorKind {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    LogicalAnd,
    LogicalOr,
    Equals,
    NotEquals,
    Identity,
    NonIdentity,
    Less,
    LessOrEquals,
    Greater,
    GreaterOrEquals,
    Membership,
}

/// A resolved binary operator: its token kind, its semantics, the operand
/// types it accepts (`None` matches any type) and the type it produces.
#[derive(Debug)]
pub struct BoundBinaryOperator {
    syntax_kind: SyntaxKind,
    pub kind: BoundBinaryOperatorKind,
    left_type: Option<Type>,
    right_type: Option<Type>,
    pub result_type: Type,
}

const fn arithmetic(syntax_kind: SyntaxKind, kind: BoundBinaryOperatorKind) -> BoundBinaryOperator {
    BoundBinaryOperator {
        syntax_kind,
        kind,
        left_type: Some(Type::Int),
        right_type: Some(Type::Int),
        result_type: Type::Int,
    }
}

const fn comparison(syntax_kind: SyntaxKind, kind: BoundBinaryOperatorKind) -> BoundBinaryOperator {
    BoundBinaryOperator {
        syntax_kind,
        kind,
        left_type: Some(Type::Int),
        right_type: Some(Type::Int),
        result_type: Type::Bool,
    }
}

const fn logical(syntax_kind: SyntaxKind, kind: BoundBinaryOperatorKind) -> BoundBinaryOperator {
    BoundBinaryOperator {
        syntax_kind,
        kind,
        left_type: Some(Type::Bool),
        right_type: Some(Type::Bool),
        result_type: Type::Bool,
    }
}

const BINARY_OPERATORS: &[BoundBinaryOperator] = &[
    arithmetic(SyntaxKind::Star, BoundBinaryOperatorKind::Multiplication),
    arithmetic(SyntaxKind::Slash, BoundBinaryOperatorKind::Division),
    arithmetic(SyntaxKind::Plus, BoundBinaryOperatorKind::Addition),
    arithmetic(SyntaxKind::Minus, BoundBinaryOperatorKind::Subtraction),
    comparison(SyntaxKind::EqualsEquals, BoundBinaryOperatorKind::Equals),
    comparison(SyntaxKind::BangEquals, BoundBinaryOperatorKind::NotEquals),
    logical(SyntaxKind::EqualsEquals, BoundBinaryOperatorKind::Equals),
    logical(SyntaxKind::BangEquals, BoundBinaryOperatorKind::NotEquals),
    logical(SyntaxKind::AndKeyword, BoundBinaryOperatorKind::LogicalAnd),
    logical(SyntaxKind::OrKeyword, BoundBinaryOperatorKind::LogicalOr),
    comparison(SyntaxKind::Greater, BoundBinaryOperatorKind::Greater),
    comparison(
        SyntaxKind::GreaterEquals,
        BoundBinaryOperatorKind::GreaterOrEquals,
    ),
    comparison(SyntaxKind::Less, BoundBinaryOperatorKind::Less),
    comparison(SyntaxKind::LessEquals, BoundBinaryOperatorKind::LessOrEquals),
    // `is` and `is not` accept operands of any type.
    BoundBinaryOperator {
        syntax_kind: SyntaxKind::IsKeyword,
        kind: BoundBinaryOperatorKind::Identity,
        left_type: None,
        right_type: None,
        result_type: Type::Bool,
    },
    BoundBinaryOperator {
        syntax_kind: SyntaxKind::IsNotKeyword,
        kind: BoundBinaryOperatorKind::NonIdentity,
        left_type: None,
        right_type: None,
        result_type: Type::Bool,
    },
    BoundBinaryOperator {
        syntax_kind: SyntaxKind::InKeyword,
        kind: BoundBinaryOperatorKind::Membership,
        left_type: Some(Type::Int),
        right_type: Some(Type::List),
        result_type: Type::Bool,
    },
];

impl BoundBinaryOperator {
    pub fn bind(syntax_kind: SyntaxKind, left: Type, right: Type) -> Option<&'static Self> {
        BINARY_OPERATORS.iter().find(|op| {
            op.syntax_kind == syntax_kind
                && op.left_type.map_or(true, |ty| ty == left)
                && op.right_type.map_or(true, |ty| ty == right)
        })
    }
}

/// Walks the syntax tree once, resolving names against the scope chain and
/// operators against the fixed tables. Every recoverable error is reported
/// as a diagnostic paired with a substitute bound value, so one pass always
/// yields a complete bound tree.
pub struct Binder {
    scope: BoundScope,
    diagnostics: DiagnosticBag,
}

impl Binder {
    fn new(root_scope: BoundScope) -> Self {
        Self {
            scope: root_scope,
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// Bind one submission against the chain of earlier ones.
    pub fn bind_global_scope(
        previous: Option<Rc<BoundGlobalScope>>,
        root: &Stmt,
    ) -> BoundGlobalScope {
        let mut binder = Binder::new(create_root_scope(previous.as_deref()));
        let statement = binder.bind_statement(root);

        BoundGlobalScope {
            previous,
            diagnostics: binder.diagnostics.into_vec(),
            variables: binder.scope.declared_variables(),
            statement,
        }
    }

    fn push_scope(&mut self) {
        let parent = std::mem::take(&mut self.scope);
        self.scope = BoundScope::new(Some(Box::new(parent)));
    }

    fn pop_scope(&mut self) {
        let parent = self.scope.parent.take();
        self.scope = parent.map(|boxed| *boxed).unwrap_or_default();
    }

    fn bind_statement(&mut self, statement: &Stmt) -> BoundStmt {
        match statement {
            Stmt::Expression { expr } => BoundStmt::Expression {
                expression: self.bind_expression(expr),
            },
            Stmt::Block { statements, .. } => self.bind_block_statement(statements),
            Stmt::If {
                condition,
                then_branch,
                elif_clauses,
                else_clause,
                ..
            } => {
                let condition = self.bind_condition(condition);
                let then_branch = Box::new(self.bind_statement(then_branch));
                let elif_clauses = elif_clauses
                    .iter()
                    .map(|clause| self.bind_elif_clause(clause))
                    .collect();
                let else_branch = else_clause
                    .as_ref()
                    .map(|clause| Box::new(self.bind_statement(&clause.statement)));

                BoundStmt::If {
                    condition,
                    then_branch,
                    elif_clauses,
                    else_branch,
                }
            }
            Stmt::While {
                condition, body, ..
            } => BoundStmt::While {
                condition: self.bind_condition(condition),
                body: Box::new(self.bind_statement(body)),
            },
            Stmt::For {
                identifier,
                iterable,
                body,
                ..
            } => self.bind_for_statement(identifier, iterable, body),
        }
    }

    fn bind_block_statement(&mut self, statements: &[Stmt]) -> BoundStmt {
        self.push_scope();
        let statements = statements
            .iter()
            .map(|statement| self.bind_statement(statement))
            .collect();
        self.pop_scope();

        BoundStmt::Block { statements }
    }

    fn bind_elif_clause(&mut self, clause: &ElifClause) -> BoundElifClause {
        BoundElifClause {
            condition: self.bind_condition(&clause.condition),
            statement: self.bind_statement(&clause.statement),
        }
    }

    fn bind_for_statement(&mut self, identifier: &Token, iterable: &Expr, body: &Stmt) -> BoundStmt {
        let iterable = self.bind_expression_of_type(iterable, Type::List);

        // The loop variable lives in its own scope enclosing the body, so it
        // shadows outer names and disappears after the loop.
        let variable = VariableSymbol::new(identifier.text.clone(), Type::Int);
        self.push_scope();
        self.scope.try_declare(variable.clone());
        let body = Box::new(self.bind_statement(body));
        self.pop_scope();

        BoundStmt::For {
            variable,
            iterable,
            body,
        }
    }

    fn bind_condition(&mut self, syntax: &Expr) -> BoundExpr {
        self.bind_expression_of_type(syntax, Type::Bool)
    }

    fn bind_expression_of_type(&mut self, syntax: &Expr, expected: Type) -> BoundExpr {
        let bound = self.bind_expression(syntax);
        if bound.ty() != expected {
            self.diagnostics
                .report_cannot_convert(syntax.span(), bound.ty(), expected);
        }
        bound
    }

    fn bind_expression(&mut self, syntax: &Expr) -> BoundExpr {
        match syntax {
            Expr::Literal { value, span } => BoundExpr::Literal {
                value: value.clone(),
                span: *span,
            },
            Expr::Parenthesized { expression, .. } => self.bind_expression(expression),
            Expr::Name { identifier } => self.bind_name_expression(identifier),
            Expr::Assign {
                identifier,
                value,
                span,
            } => self.bind_assignment_expression(identifier, value, *span),
            Expr::CompoundAssign {
                identifier,
                operator,
                value,
                span,
            } => self.bind_compound_assignment_expression(identifier, operator, value, *span),
            Expr::Unary {
                operator,
                operand,
                span,
            } => self.bind_unary_expression(operator, operand, *span),
            Expr::Binary {
                left,
                operator,
                right,
                span,
            } => self.bind_binary_expression(left, operator, right, *span),
            Expr::Range {
                lower,
                upper,
                step,
                span,
            } => self.bind_range_expression(lower, upper.as_deref(), step.as_deref(), *span),
        }
    }

    fn bind_name_expression(&mut self, identifier: &Token) -> BoundExpr {
        // A fabricated identifier means the parser already reported the
        // problem; stay quiet and recover with zero.
        if identifier.text.is_empty() {
            return BoundExpr::Literal {
                value: Value::Int(0),
                span: identifier.span,
            };
        }

        match self.scope.lookup(&identifier.text) {
            Some(variable) => BoundExpr::Variable {
                variable: variable.clone(),
                span: identifier.span,
            },
            None => {
                self.diagnostics
                    .report_undefined_name(identifier.span, &identifier.text);
                BoundExpr::Literal {
                    value: Value::Int(0),
                    span: identifier.span,
                }
            }
        }
    }

    fn bind_assignment_expression(
        &mut self,
        identifier: &Token,
        value: &Expr,
        span: TextSpan,
    ) -> BoundExpr {
        let expression = self.bind_expression(value);

        if identifier.text.is_empty() {
            return expression;
        }

        // Assigning re-types the variable wherever it is declared; an
        // unknown name is declared in the innermost scope.
        let variable = VariableSymbol::new(identifier.text.clone(), expression.ty());
        if !self.scope.try_update(variable.clone()) {
            self.scope.try_declare(variable.clone());
        }

        BoundExpr::Assignment {
            variable,
            expression: Box::new(expression),
            span,
        }
    }

    fn bind_compound_assignment_expression(
        &mut self,
        identifier: &Token,
        operator: &Token,
        value: &Expr,
        span: TextSpan,
    ) -> BoundExpr {
        let expression = self.bind_expression(value);

        if identifier.text.is_empty() {
            return expression;
        }

        let variable = match self.scope.lookup(&identifier.text) {
            Some(variable) => variable.clone(),
            None => {
                self.diagnostics
                    .report_undefined_name(identifier.span, &identifier.text);
                return expression;
            }
        };

        let base_kind = match operator.kind {
            SyntaxKind::PlusEquals => SyntaxKind::Plus,
            SyntaxKind::MinusEquals => SyntaxKind::Minus,
            SyntaxKind::StarEquals => SyntaxKind::Star,
            _ => SyntaxKind::Slash,
        };

        match BoundBinaryOperator::bind(base_kind, variable.ty, expression.ty()) {
            Some(bound_operator) => BoundExpr::CompoundAssignment {
                variable,
                operator: bound_operator,
                expression: Box::new(expression),
                operator_span: operator.span,
                span,
            },
            None => {
                self.diagnostics.report_undefined_binary_operator(
                    operator.span,
                    &operator.text,
                    variable.ty,
                    expression.ty(),
                );
                expression
            }
        }
    }

    fn bind_unary_expression(
        &mut self,
        operator: &Token,
        operand: &Expr,
        span: TextSpan,
    ) -> BoundExpr {
        let operand = self.bind_expression(operand);

        match BoundUnaryOperator::bind(operator.kind, operand.ty()) {
            Some(bound_operator) => BoundExpr::Unary {
                operator: bound_operator,
                operand: Box::new(operand),
                span,
            },
            None => {
                self.diagnostics.report_undefined_unary_operator(
                    operator.span,
                    &operator.text,
                    operand.ty(),
                );
                operand
            }
        }
    }

    fn bind_binary_expression(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
        span: TextSpan,
    ) -> BoundExpr {
        let left = self.bind_expression(left);
        let right = self.bind_expression(right);

        match BoundBinaryOperator::bind(operator.kind, left.ty(), right.ty()) {
            Some(bound_operator) => BoundExpr::Binary {
                left: Box::new(left),
                operator: bound_operator,
                right: Box::new(right),
                operator_span: operator.span,
                span,
            },
            None => {
                self.diagnostics.report_undefined_binary_operator(
                    operator.span,
                    &operator.text,
                    left.ty(),
                    right.ty(),
                );
                left
            }
        }
    }

    /// Every range argument must type as int; violations are reported
    /// per-argument, not short-circuited.
    fn bind_range_expression(
        &mut self,
        lower: &Expr,
        upper: Option<&Expr>,
        step: Option<&Expr>,
        span: TextSpan,
    ) -> BoundExpr {
        let lower = self.bind_expression_of_type(lower, Type::Int);
        let upper = upper.map(|expr| Box::new(self.bind_expression_of_type(expr, Type::Int)));
        let step = step.map(|expr| Box::new(self.bind_expression_of_type(expr, Type::Int)));

        BoundExpr::Range {
            lower: Box::new(lower),
            upper,
            step,
            span,
        }
    }
}

/// Rebuild the root scope for a new submission from the snapshot chain,
/// oldest first, so later submissions shadow earlier ones.
fn create_root_scope(mut previous: Option<&BoundGlobalScope>) -> BoundScope {
    let mut chain = Vec::new();
    while let Some(scope) = previous {
        chain.push(scope);
        previous = scope.previous.as_deref();
    }

    let mut root = BoundScope::default();
    for snapshot in chain.into_iter().rev() {
        for variable in &snapshot.variables {
            root.force_declare(variable.clone());
        }
    }

    root
}
