use std::fmt;

use crate::diagnostics::DiagnosticBag;
use crate::text::{SourceText, TextSpan};
use crate::value::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxKind {
    // Structural markers
    EndOfFile,
    Bad,
    Whitespace,

    // Literals
    Number,
    Identifier,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    Equals,
    EqualsEquals,
    BangEquals,
    Greater,
    GreaterEquals,
    Less,
    LessEquals,

    // Punctuation
    OpenParenthesis,
    CloseParenthesis,
    OpenBrace,
    CloseBrace,
    Colon,
    Comma,

    // Keywords
    TrueKeyword,
    FalseKeyword,
    AndKeyword,
    OrKeyword,
    NotKeyword,
    IsKeyword,
    /// Synthesized by the parser when `is` is immediately followed by `not`.
    IsNotKeyword,
    IfKeyword,
    ElifKeyword,
    ElseKeyword,
    WhileKeyword,
    ForKeyword,
    InKeyword,
    RangeKeyword,
}

impl SyntaxKind {
    /// Precedence of this kind as a unary operator; 0 means it is not one.
    pub fn unary_operator_precedence(self) -> u8 {
        match self {
            SyntaxKind::Plus | SyntaxKind::Minus | SyntaxKind::NotKeyword => 6,
            _ => 0,
        }
    }

    /// Precedence of this kind as a binary operator; 0 means it is not one
    /// and terminates the current expression.
    pub fn binary_operator_precedence(self) -> u8 {
        match self {
            SyntaxKind::Star | SyntaxKind::Slash => 5,
            SyntaxKind::Plus | SyntaxKind::Minus => 4,
            SyntaxKind::EqualsEquals
            | SyntaxKind::BangEquals
            | SyntaxKind::Greater
            | SyntaxKind::GreaterEquals
            | SyntaxKind::Less
            | SyntaxKind::LessEquals
            | SyntaxKind::IsKeyword
            | SyntaxKind::IsNotKeyword
            | SyntaxKind::InKeyword => 3,
            SyntaxKind::AndKeyword => 2,
            SyntaxKind::OrKeyword => 1,
            _ => 0,
        }
    }

    /// Keyword kind for an identifier-shaped run of letters.
    pub fn keyword_kind(text: &str) -> SyntaxKind {
        match text {
            "True" => SyntaxKind::TrueKeyword,
            "False" => SyntaxKind::FalseKeyword,
            "and" => SyntaxKind::AndKeyword,
            "or" => SyntaxKind::OrKeyword,
            "not" => SyntaxKind::NotKeyword,
            "is" => SyntaxKind::IsKeyword,
            "if" => SyntaxKind::IfKeyword,
            "elif" => SyntaxKind::ElifKeyword,
            "else" => SyntaxKind::ElseKeyword,
            "while" => SyntaxKind::WhileKeyword,
            "for" => SyntaxKind::ForKeyword,
            "in" => SyntaxKind::InKeyword,
            "range" => SyntaxKind::RangeKeyword,
            _ => SyntaxKind::Identifier,
        }
    }

    /// Every token kind, in declaration order.
    pub fn all() -> &'static [SyntaxKind] {
        &[
            SyntaxKind::EndOfFile,
            SyntaxKind::Bad,
            SyntaxKind::Whitespace,
            SyntaxKind::Number,
            SyntaxKind::Identifier,
            SyntaxKind::Plus,
            SyntaxKind::Minus,
            SyntaxKind::Star,
            SyntaxKind::Slash,
            SyntaxKind::PlusEquals,
            SyntaxKind::MinusEquals,
            SyntaxKind::StarEquals,
            SyntaxKind::SlashEquals,
            SyntaxKind::Equals,
            SyntaxKind::EqualsEquals,
            SyntaxKind::BangEquals,
            SyntaxKind::Greater,
            SyntaxKind::GreaterEquals,
            SyntaxKind::Less,
            SyntaxKind::LessEquals,
            SyntaxKind::OpenParenthesis,
            SyntaxKind::CloseParenthesis,
            SyntaxKind::OpenBrace,
            SyntaxKind::CloseBrace,
            SyntaxKind::Colon,
            SyntaxKind::Comma,
            SyntaxKind::TrueKeyword,
            SyntaxKind::FalseKeyword,
            SyntaxKind::AndKeyword,
            SyntaxKind::OrKeyword,
            SyntaxKind::NotKeyword,
            SyntaxKind::IsKeyword,
            SyntaxKind::IsNotKeyword,
            SyntaxKind::IfKeyword,
            SyntaxKind::ElifKeyword,
            SyntaxKind::ElseKeyword,
            SyntaxKind::WhileKeyword,
            SyntaxKind::ForKeyword,
            SyntaxKind::InKeyword,
            SyntaxKind::RangeKeyword,
        ]
    }

    /// Fixed surface text of this kind, if it has one.
    pub fn fixed_text(self) -> Option<&'static str> {
        match self {
            SyntaxKind::Plus => Some("+"),
            SyntaxKind::Minus => Some("-"),
            SyntaxKind::Star => Some("*"),
            SyntaxKind::Slash => Some("/"),
            SyntaxKind::PlusEquals => Some("+="),
            SyntaxKind::MinusEquals => Some("-="),
            SyntaxKind::StarEquals => Some("*="),
            SyntaxKind::SlashEquals => Some("/="),
            SyntaxKind::Equals => Some("="),
            SyntaxKind::EqualsEquals => Some("=="),
            SyntaxKind::BangEquals => Some("!="),
            SyntaxKind::Greater => Some(">"),
            SyntaxKind::GreaterEquals => Some(">="),
            SyntaxKind::Less => Some("<"),
            SyntaxKind::LessEquals => Some("<="),
            SyntaxKind::OpenParenthesis => Some("("),
            SyntaxKind::CloseParenthesis => Some(")"),
            SyntaxKind::OpenBrace => Some("{"),
            SyntaxKind::CloseBrace => Some("}"),
            SyntaxKind::Colon => Some(":"),
            SyntaxKind::Comma => Some(","),
            SyntaxKind::TrueKeyword => Some("True"),
            SyntaxKind::FalseKeyword => Some("False"),
            SyntaxKind::AndKeyword => Some("and"),
            SyntaxKind::OrKeyword => Some("or"),
            SyntaxKind::NotKeyword => Some("not"),
            SyntaxKind::IsKeyword => Some("is"),
            SyntaxKind::IsNotKeyword => Some("is not"),
            SyntaxKind::IfKeyword => Some("if"),
            SyntaxKind::ElifKeyword => Some("elif"),
            SyntaxKind::ElseKeyword => Some("else"),
            SyntaxKind::WhileKeyword => Some("while"),
            SyntaxKind::ForKeyword => Some("for"),
            SyntaxKind::InKeyword => Some("in"),
            SyntaxKind::RangeKeyword => Some("range"),
            _ => None,
        }
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SyntaxKind::EndOfFile => "EndOfFileToken",
            SyntaxKind::Bad => "BadToken",
            SyntaxKind::Whitespace => "WhitespaceToken",
            SyntaxKind::Number => "NumberToken",
            SyntaxKind::Identifier => "IdentifierToken",
            SyntaxKind::Plus => "PlusToken",
            SyntaxKind::Minus => "MinusToken",
            SyntaxKind::Star => "StarToken",
            SyntaxKind::Slash => "SlashToken",
            SyntaxKind::PlusEquals => "PlusEqualsToken",
            SyntaxKind::MinusEquals => "MinusEqualsToken",
            SyntaxKind::StarEquals => "StarEqualsToken",
            SyntaxKind::SlashEquals => "SlashEqualsToken",
            SyntaxKind::Equals => "EqualsToken",
            SyntaxKind::EqualsEquals => "EqualsEqualsToken",
            SyntaxKind::BangEquals => "BangEqualsToken",
            SyntaxKind::Greater => "GreaterToken",
            SyntaxKind::GreaterEquals => "GreaterEqualsToken",
            SyntaxKind::Less => "LessToken",
            SyntaxKind::LessEquals => "LessEqualsToken",
            SyntaxKind::OpenParenthesis => "OpenParenthesisToken",
            SyntaxKind::CloseParenthesis => "CloseParenthesisToken",
            SyntaxKind::OpenBrace => "OpenBraceToken",
            SyntaxKind::CloseBrace => "CloseBraceToken",
            SyntaxKind::Colon => "ColonToken",
            SyntaxKind::Comma => "CommaToken",
            SyntaxKind::TrueKeyword => "TrueKeyword",
            SyntaxKind::FalseKeyword => "FalseKeyword",
            SyntaxKind::AndKeyword => "AndKeyword",
            SyntaxKind::OrKeyword => "OrKeyword",
            SyntaxKind::NotKeyword => "NotKeyword",
            SyntaxKind::IsKeyword => "IsKeyword",
            SyntaxKind::IsNotKeyword => "IsNotKeyword",
            SyntaxKind::IfKeyword => "IfKeyword",
            SyntaxKind::ElifKeyword => "ElifKeyword",
            SyntaxKind::ElseKeyword => "ElseKeyword",
            SyntaxKind::WhileKeyword => "WhileKeyword",
            SyntaxKind::ForKeyword => "ForKeyword",
            SyntaxKind::InKeyword => "InKeyword",
            SyntaxKind::RangeKeyword => "RangeKeyword",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: TextSpan,
    pub text: String,
    /// Parsed literal value; only number tokens carry one.
    pub value: Option<i64>,
}

impl Token {
    pub fn new(kind: SyntaxKind, span: TextSpan, text: String, value: Option<i64>) -> Self {
        Self {
            kind,
            span,
            text,
            value,
        }
    }

    /// Placeholder fabricated by the parser during error recovery.
    pub fn missing(kind: SyntaxKind, position: usize) -> Self {
        Self {
            kind,
            span: TextSpan::new(position, 0),
            text: String::new(),
            value: None,
        }
    }
}

/// Converts source text into tokens, one per call. Whitespace comes back as
/// its own token kind so span accounting stays exact; unknown characters are
/// reported and consumed so the lexer always makes progress.
pub struct Lexer<'a> {
    text: &'a SourceText,
    position: usize,
    diagnostics: DiagnosticBag,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a SourceText) -> Self {
        Self {
            text,
            position: 0,
            diagnostics: DiagnosticBag::new(),
        }
    }

    pub fn take_diagnostics(self) -> DiagnosticBag {
        self.diagnostics
    }

    fn peek(&self, offset: usize) -> char {
        self.text.as_str()[self.position..]
            .chars()
            .nth(offset)
            .unwrap_or('\0')
    }

    fn current(&self) -> char {
        self.peek(0)
    }

    fn advance(&mut self) -> char {
        let c = self.current();
        self.position += c.len_utf8();
        c
    }

    fn consume_while(&mut self, condition: impl Fn(char) -> bool) -> &'a str {
        let start = self.position;
        while condition(self.current()) && self.position < self.text.len() {
            self.advance();
        }
        &self.text.as_str()[start..self.position]
    }

    /// Produce the next token. Once the text is exhausted this returns an
    /// end-of-file token forever.
    pub fn next_token(&mut self) -> Token {
        let start = self.position;
        let current = self.current();

        if current == '\0' {
            return Token::new(
                SyntaxKind::EndOfFile,
                TextSpan::new(self.text.len(), 0),
                String::new(),
                None,
            );
        }

        if current.is_whitespace() {
            let text = self.consume_while(char::is_whitespace);
            return Token::new(
                SyntaxKind::Whitespace,
                TextSpan::from_bounds(start, self.position),
                text.to_string(),
                None,
            );
        }

        if current.is_alphabetic() {
            let text = self.consume_while(char::is_alphabetic);
            let kind = SyntaxKind::keyword_kind(text);
            return Token::new(
                kind,
                TextSpan::from_bounds(start, self.position),
                text.to_string(),
                None,
            );
        }

        if current.is_ascii_digit() {
            return self.read_number(start);
        }

        if let Some(kind) = self.try_read_operator() {
            let span = TextSpan::from_bounds(start, self.position);
            return Token::new(kind, span, self.text.span_text(span).to_string(), None);
        }

        // Nothing matched: report the character and consume it so the next
        // call starts one past it.
        self.diagnostics.report_bad_character(start, current);
        let bad = self.advance();
        Token::new(
            SyntaxKind::Bad,
            TextSpan::from_bounds(start, self.position),
            bad.to_string(),
            None,
        )
    }

    fn read_number(&mut self, start: usize) -> Token {
        let text = self.consume_while(|c| c.is_ascii_digit());
        let span = TextSpan::from_bounds(start, self.position);

        match text.parse::<i64>() {
            Ok(value) => Token::new(SyntaxKind::Number, span, text.to_string(), Some(value)),
            Err(_) => {
                self.diagnostics.report_invalid_number(span, text, Type::Int);
                Token::new(SyntaxKind::Number, span, text.to_string(), None)
            }
        }
    }

    /// Two-character operators are matched greedily before their
    /// one-character prefixes.
    fn try_read_operator(&mut self) -> Option<SyntaxKind> {
        let kind = match (self.current(), self.peek(1)) {
            ('=', '=') => SyntaxKind::EqualsEquals,
            ('!', '=') => SyntaxKind::BangEquals,
            ('>', '=') => SyntaxKind::GreaterEquals,
            ('<', '=') => SyntaxKind::LessEquals,
            ('+', '=') => SyntaxKind::PlusEquals,
            ('-', '=') => SyntaxKind::MinusEquals,
            ('*', '=') => SyntaxKind::StarEquals,
            ('/', '=') => SyntaxKind::SlashEquals,
            (single, _) => {
                let kind = match single {
                    '=' => SyntaxKind::Equals,
                    '>' => SyntaxKind::Greater,
                    '<' => SyntaxKind::Less,
                    '+' => SyntaxKind::Plus,
                    '-' => SyntaxKind::Minus,
                    '*' => SyntaxKind::Star,
                    '/' => SyntaxKind::Slash,
                    '(' => SyntaxKind::OpenParenthesis,
                    ')' => SyntaxKind::CloseParenthesis,
                    '{' => SyntaxKind::OpenBrace,
                    '}' => SyntaxKind::CloseBrace,
                    ':' => SyntaxKind::Colon,
                    ',' => SyntaxKind::Comma,
                    _ => return None,
                };
                self.advance();
                return Some(kind);
            }
        };

        self.advance();
        self.advance();
        Some(kind)
    }
}
