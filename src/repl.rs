use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use crate::ast::{ElifClause, ElseClause, Expr, Stmt, SyntaxTree};
use crate::binder::BoundGlobalScope;
use crate::compilation::Compilation;
use crate::lexer::Token;
use crate::value::Value;

/// Interactive session. Each line is one submission compiled against the
/// chain of earlier ones; variables persist between submissions, but only
/// submissions that evaluate cleanly extend the chain.
pub fn start() {
    println!("minipy v0.1.0");
    println!("Type '#exit' or press Ctrl+D to quit");
    println!();

    let mut previous: Option<Rc<BoundGlobalScope>> = None;
    let mut variables: HashMap<String, Value> = HashMap::new();
    let mut show_tree = false;

    loop {
        print!("» ");
        io::stdout().flush().unwrap();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                match line {
                    "" => continue,
                    "#showTree" => {
                        show_tree = true;
                        println!("Showing parse trees.");
                    }
                    "#hideTree" => {
                        show_tree = false;
                        println!("Not showing parse trees.");
                    }
                    "#clear" => print!("\x1B[2J\x1B[H"),
                    "#reset" => {
                        previous = None;
                        variables.clear();
                    }
                    "#exit" => break,
                    _ => run_submission(line, &mut previous, &mut variables, show_tree),
                }
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn run_submission(
    source: &str,
    previous: &mut Option<Rc<BoundGlobalScope>>,
    variables: &mut HashMap<String, Value>,
    show_tree: bool,
) {
    let syntax = SyntaxTree::parse(source);
    let compilation = match previous.clone() {
        Some(previous) => Compilation::continue_with(previous, syntax),
        None => Compilation::new(syntax),
    };

    if show_tree {
        print_tree(compilation.syntax().root());
    }

    match compilation.evaluate(variables) {
        Ok(result) => {
            if result.diagnostics.is_empty() {
                if let Some(value) = result.value {
                    println!("{}", value);
                }
                *previous = Some(compilation.global_scope().clone());
            } else {
                for diagnostic in &result.diagnostics {
                    diagnostic.report(source, None);
                }
            }
        }
        Err(error) => error.report(source, None),
    }
}

/// One printable node of the syntax tree. Tokens show up as leaves so the
/// dump reads like the token stream interleaved with its structure.
#[derive(Clone, Copy)]
enum Node<'a> {
    Stmt(&'a Stmt),
    Elif(&'a ElifClause),
    Else(&'a ElseClause),
    Expr(&'a Expr),
    Token(&'a Token),
}

pub fn print_tree(root: &Stmt) {
    print_node(Node::Stmt(root), "", true);
}

fn print_node(node: Node, indent: &str, is_last: bool) {
    let marker = if is_last { "└──" } else { "├──" };
    println!("{}{}{}", indent, marker, node.label());

    let child_indent = format!("{}{}", indent, if is_last { "   " } else { "│  " });
    let children = node.children();
    for (index, child) in children.iter().enumerate() {
        print_node(*child, &child_indent, index == children.len() - 1);
    }
}

impl<'a> Node<'a> {
    fn label(&self) -> String {
        match self {
            Node::Stmt(statement) => match statement {
                Stmt::Expression { .. } => "ExpressionStatement".to_string(),
                Stmt::Block { .. } => "BlockStatement".to_string(),
                Stmt::If { .. } => "IfStatement".to_string(),
                Stmt::While { .. } => "WhileStatement".to_string(),
                Stmt::For { .. } => "ForStatement".to_string(),
            },
            Node::Elif(_) => "ElifClause".to_string(),
            Node::Else(_) => "ElseClause".to_string(),
            Node::Expr(expression) => match expression {
                Expr::Literal { value, .. } => format!("LiteralExpression {}", value),
                Expr::Name { .. } => "NameExpression".to_string(),
                Expr::Assign { .. } => "AssignmentExpression".to_string(),
                Expr::CompoundAssign { .. } => "CompoundAssignmentExpression".to_string(),
                Expr::Unary { .. } => "UnaryExpression".to_string(),
                Expr::Binary { .. } => "BinaryExpression".to_string(),
                Expr::Parenthesized { .. } => "ParenthesizedExpression".to_string(),
                Expr::Range { .. } => "RangeExpression".to_string(),
            },
            Node::Token(token) => {
                if token.text.is_empty() {
                    format!("{}", token.kind)
                } else {
                    format!("{} '{}'", token.kind, token.text)
                }
            }
        }
    }

    fn children(&self) -> Vec<Node<'a>> {
        match self {
            Node::Stmt(statement) => match statement {
                Stmt::Expression { expr } => vec![Node::Expr(expr)],
                Stmt::Block { statements, .. } => statements.iter().map(Node::Stmt).collect(),
                Stmt::If {
                    condition,
                    then_branch,
                    elif_clauses,
                    else_clause,
                    ..
                } => {
                    let mut children = vec![Node::Expr(condition), Node::Stmt(then_branch)];
                    children.extend(elif_clauses.iter().map(Node::Elif));
                    children.extend(else_clause.iter().map(Node::Else));
                    children
                }
                Stmt::While {
                    condition, body, ..
                } => vec![Node::Expr(condition), Node::Stmt(body)],
                Stmt::For {
                    identifier,
                    iterable,
                    body,
                    ..
                } => vec![
                    Node::Token(identifier),
                    Node::Expr(iterable),
                    Node::Stmt(body),
                ],
            },
            Node::Elif(clause) => {
                vec![Node::Expr(&clause.condition), Node::Stmt(&clause.statement)]
            }
            Node::Else(clause) => vec![Node::Stmt(&clause.statement)],
            Node::Expr(expression) => match expression {
                Expr::Literal { .. } => Vec::new(),
                Expr::Name { identifier } => vec![Node::Token(identifier)],
                Expr::Assign {
                    identifier, value, ..
                } => vec![Node::Token(identifier), Node::Expr(value)],
                Expr::CompoundAssign {
                    identifier,
                    operator,
                    value,
                    ..
                } => vec![
                    Node::Token(identifier),
                    Node::Token(operator),
                    Node::Expr(value),
                ],
                Expr::Unary {
                    operator, operand, ..
                } => vec![Node::Token(operator), Node::Expr(operand)],
                Expr::Binary {
                    left,
                    operator,
                    right,
                    ..
                } => vec![Node::Expr(left), Node::Token(operator), Node::Expr(right)],
                Expr::Parenthesized { expression, .. } => vec![Node::Expr(expression)],
                Expr::Range {
                    lower, upper, step, ..
                } => {
                    let mut children = vec![Node::Expr(lower)];
                    children.extend(upper.iter().map(|expr| Node::Expr(expr)));
                    children.extend(step.iter().map(|expr| Node::Expr(expr)));
                    children
                }
            },
            Node::Token(_) => Vec::new(),
        }
    }
}
