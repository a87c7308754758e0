use crate::ast::{ElifClause, ElseClause, Expr, Stmt};
use crate::diagnostics::DiagnosticBag;
use crate::lexer::{Lexer, SyntaxKind, Token};
use crate::text::SourceText;
use crate::value::Value;

/// Builds a syntax tree from the token stream: one top-level statement plus
/// end-of-file. Structural errors are reported and recovered from by
/// fabricating placeholder tokens, so parsing never backtracks and always
/// finishes in one pass.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    diagnostics: DiagnosticBag,
}

impl Parser {
    pub fn new(text: &SourceText) -> Self {
        let mut lexer = Lexer::new(text);
        let mut tokens = Vec::new();

        // Whitespace and bad tokens are dropped here; the lexer has already
        // accounted for their spans and diagnostics.
        loop {
            let token = lexer.next_token();
            let kind = token.kind;
            if kind != SyntaxKind::Whitespace && kind != SyntaxKind::Bad {
                tokens.push(token);
            }
            if kind == SyntaxKind::EndOfFile {
                break;
            }
        }

        let mut diagnostics = DiagnosticBag::new();
        diagnostics.extend(lexer.take_diagnostics());

        Self {
            tokens,
            position: 0,
            diagnostics,
        }
    }

    pub fn take_diagnostics(self) -> DiagnosticBag {
        self.diagnostics
    }

    fn peek(&self, offset: usize) -> &Token {
        let index = self.position + offset;
        if index >= self.tokens.len() {
            &self.tokens[self.tokens.len() - 1]
        } else {
            &self.tokens[index]
        }
    }

    fn current(&self) -> &Token {
        self.peek(0)
    }

    fn next_token(&mut self) -> Token {
        let current = self.current().clone();
        self.position += 1;
        current
    }

    /// Consume a token of the expected kind, or report it and fabricate a
    /// zero-length placeholder so parsing can continue without backtracking.
    fn match_token(&mut self, kind: SyntaxKind) -> Token {
        if self.current().kind == kind {
            return self.next_token();
        }

        let span = self.current().span;
        let actual = self.current().kind;
        self.diagnostics.report_unexpected_token(span, actual, kind);
        Token::missing(kind, span.start)
    }

    pub fn parse_compilation_unit(&mut self) -> Stmt {
        let statement = self.parse_statement();
        self.match_token(SyntaxKind::EndOfFile);
        statement
    }

    fn parse_statement(&mut self) -> Stmt {
        match self.current().kind {
            SyntaxKind::OpenBrace => self.parse_block_statement(),
            SyntaxKind::IfKeyword => self.parse_if_statement(),
            SyntaxKind::WhileKeyword => self.parse_while_statement(),
            SyntaxKind::ForKeyword => self.parse_for_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_block_statement(&mut self) -> Stmt {
        let open_brace = self.match_token(SyntaxKind::OpenBrace);
        let mut statements = Vec::new();

        while self.current().kind != SyntaxKind::EndOfFile
            && self.current().kind != SyntaxKind::CloseBrace
        {
            let start_position = self.position;
            statements.push(self.parse_statement());

            // If the statement consumed nothing we are looking at a token no
            // production wants; skip it rather than loop forever.
            if self.position == start_position {
                self.next_token();
            }
        }

        let close_brace = self.match_token(SyntaxKind::CloseBrace);

        Stmt::Block {
            statements,
            span: open_brace.span.union(close_brace.span),
        }
    }

    fn parse_if_statement(&mut self) -> Stmt {
        let if_keyword = self.match_token(SyntaxKind::IfKeyword);
        let condition = self.parse_expression();
        self.match_token(SyntaxKind::Colon);
        let then_branch = self.parse_statement();
        let elif_clauses = self.parse_elif_clauses();
        let else_clause = self.parse_else_clause();

        let end = else_clause
            .as_ref()
            .map(|clause| clause.span)
            .or_else(|| elif_clauses.last().map(|clause| clause.span))
            .unwrap_or_else(|| then_branch.span());

        Stmt::If {
            condition,
            then_branch: Box::new(then_branch),
            elif_clauses,
            else_clause,
            span: if_keyword.span.union(end),
        }
    }

    fn parse_elif_clauses(&mut self) -> Vec<ElifClause> {
        let mut clauses = Vec::new();

        while self.current().kind == SyntaxKind::ElifKeyword {
            let elif_keyword = self.match_token(SyntaxKind::ElifKeyword);
            let condition = self.parse_expression();
            self.match_token(SyntaxKind::Colon);
            let statement = self.parse_statement();
            let span = elif_keyword.span.union(statement.span());
            clauses.push(ElifClause {
                condition,
                statement,
                span,
            });
        }

        clauses
    }

    fn parse_else_clause(&mut self) -> Option<ElseClause> {
        if self.current().kind != SyntaxKind::ElseKeyword {
            return None;
        }

        let else_keyword = self.next_token();
        self.match_token(SyntaxKind::Colon);
        let statement = self.parse_statement();
        let span = else_keyword.span.union(statement.span());

        Some(ElseClause {
            statement: Box::new(statement),
            span,
        })
    }

    fn parse_while_statement(&mut self) -> Stmt {
        let while_keyword = self.match_token(SyntaxKind::WhileKeyword);
        let condition = self.parse_expression();
        self.match_token(SyntaxKind::Colon);
        let body = self.parse_statement();
        let span = while_keyword.span.union(body.span());

        Stmt::While {
            condition,
            body: Box::new(body),
            span,
        }
    }

    fn parse_for_statement(&mut self) -> Stmt {
        let for_keyword = self.match_token(SyntaxKind::ForKeyword);
        let identifier = self.match_token(SyntaxKind::Identifier);
        self.match_token(SyntaxKind::InKeyword);
        let iterable = self.parse_expression();
        self.match_token(SyntaxKind::Colon);
        let body = self.parse_statement();
        let span = for_keyword.span.union(body.span());

        Stmt::For {
            identifier,
            iterable,
            body: Box::new(body),
            span,
        }
    }

    fn parse_expression_statement(&mut self) -> Stmt {
        Stmt::Expression {
            expr: self.parse_expression(),
        }
    }

    fn parse_expression(&mut self) -> Expr {
        self.parse_assignment_expression()
    }

    /// Assignments are spotted with one token of lookahead and parsed
    /// right-associatively, so `a = b = 1` nests as `a = (b = 1)`.
    fn parse_assignment_expression(&mut self) -> Expr {
        if self.peek(0).kind == SyntaxKind::Identifier {
            let is_compound = matches!(
                self.peek(1).kind,
                SyntaxKind::PlusEquals
                    | SyntaxKind::MinusEquals
                    | SyntaxKind::StarEquals
                    | SyntaxKind::SlashEquals
            );

            if self.peek(1).kind == SyntaxKind::Equals || is_compound {
                let identifier = self.next_token();
                let operator = self.next_token();
                let value = self.parse_assignment_expression();
                let span = identifier.span.union(value.span());

                return if is_compound {
                    Expr::CompoundAssign {
                        identifier,
                        operator,
                        value: Box::new(value),
                        span,
                    }
                } else {
                    Expr::Assign {
                        identifier,
                        value: Box::new(value),
                        span,
                    }
                };
            }
        }

        self.parse_binary_expression(0)
    }

    fn parse_binary_expression(&mut self, parent_precedence: u8) -> Expr {
        let unary_precedence = self.current().kind.unary_operator_precedence();

        let mut left = if unary_precedence != 0 && unary_precedence >= parent_precedence {
            let operator = self.next_token();
            let operand = self.parse_binary_expression(unary_precedence);
            let span = operator.span.union(operand.span());
            Expr::Unary {
                operator,
                operand: Box::new(operand),
                span,
            }
        } else {
            self.parse_primary_expression()
        };

        loop {
            let precedence = self.current().kind.binary_operator_precedence();
            if precedence == 0 || precedence <= parent_precedence {
                break;
            }

            let mut operator = self.next_token();

            // `is` directly followed by `not` becomes one `is not` operator
            // token, keeping the span of `is` as its start.
            if operator.kind == SyntaxKind::IsKeyword
                && self.current().kind == SyntaxKind::NotKeyword
            {
                let not_token = self.next_token();
                operator = Token::new(
                    SyntaxKind::IsNotKeyword,
                    operator.span.union(not_token.span),
                    "is not".to_string(),
                    None,
                );
            }

            let right = self.parse_binary_expression(precedence);
            let span = left.span().union(right.span());
            left = Expr::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                span,
            };
        }

        left
    }

    fn parse_primary_expression(&mut self) -> Expr {
        match self.current().kind {
            SyntaxKind::OpenParenthesis => self.parse_parenthesized_expression(),
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => self.parse_boolean_literal(),
            SyntaxKind::Number => self.parse_number_literal(),
            SyntaxKind::RangeKeyword => self.parse_range_expression(),
            _ => self.parse_name_expression(),
        }
    }

    fn parse_parenthesized_expression(&mut self) -> Expr {
        let open = self.match_token(SyntaxKind::OpenParenthesis);
        let expression = self.parse_expression();
        let close = self.match_token(SyntaxKind::CloseParenthesis);

        Expr::Parenthesized {
            expression: Box::new(expression),
            span: open.span.union(close.span),
        }
    }

    fn parse_boolean_literal(&mut self) -> Expr {
        let keyword = self.next_token();
        Expr::Literal {
            value: Value::Bool(keyword.kind == SyntaxKind::TrueKeyword),
            span: keyword.span,
        }
    }

    fn parse_number_literal(&mut self) -> Expr {
        let number = self.match_token(SyntaxKind::Number);
        Expr::Literal {
            // A number that failed to parse already carries a diagnostic;
            // zero keeps the tree complete.
            value: Value::Int(number.value.unwrap_or(0)),
            span: number.span,
        }
    }

    fn parse_range_expression(&mut self) -> Expr {
        let range_keyword = self.match_token(SyntaxKind::RangeKeyword);
        self.match_token(SyntaxKind::OpenParenthesis);

        let lower = self.parse_expression();
        let mut upper = None;
        let mut step = None;

        if self.current().kind == SyntaxKind::Comma {
            self.match_token(SyntaxKind::Comma);
            upper = Some(Box::new(self.parse_expression()));

            if self.current().kind == SyntaxKind::Comma {
                self.match_token(SyntaxKind::Comma);
                step = Some(Box::new(self.parse_expression()));
            }
        }

        let close = self.match_token(SyntaxKind::CloseParenthesis);

        Expr::Range {
            lower: Box::new(lower),
            upper,
            step,
            span: range_keyword.span.union(close.span),
        }
    }

    fn parse_name_expression(&mut self) -> Expr {
        let identifier = self.match_token(SyntaxKind::Identifier);
        Expr::Name { identifier }
    }
}
