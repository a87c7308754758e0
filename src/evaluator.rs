use std::collections::HashMap;

use crate::binder::{
    BoundBinaryOperatorKind, BoundExpr, BoundStmt, BoundUnaryOperatorKind, VariableSymbol,
};
use crate::diagnostics::RuntimeError;
use crate::text::TextSpan;
use crate::value::{Type, Value};

/// Tree-walking interpreter over the bound tree. Statements run for their
/// effects on the variable store; the last evaluated expression statement is
/// kept in a register and becomes the submission's value.
pub struct Evaluator<'a> {
    variables: &'a mut HashMap<String, Value>,
    last_value: Option<Value>,
}

impl<'a> Evaluator<'a> {
    pub fn new(variables: &'a mut HashMap<String, Value>) -> Self {
        Self {
            variables,
            last_value: None,
        }
    }

    pub fn evaluate(mut self, root: &BoundStmt) -> Result<Option<Value>, RuntimeError> {
        self.evaluate_statement(root)?;
        Ok(self.last_value)
    }

    fn evaluate_statement(&mut self, statement: &BoundStmt) -> Result<(), RuntimeError> {
        match statement {
            BoundStmt::Expression { expression } => {
                self.last_value = Some(self.evaluate_expression(expression)?);
                Ok(())
            }
            BoundStmt::Block { statements } => {
                for statement in statements {
                    self.evaluate_statement(statement)?;
                }
                Ok(())
            }
            BoundStmt::If {
                condition,
                then_branch,
                elif_clauses,
                else_branch,
            } => {
                if self.evaluate_condition(condition)? {
                    return self.evaluate_statement(then_branch);
                }
                for clause in elif_clauses {
                    if self.evaluate_condition(&clause.condition)? {
                        return self.evaluate_statement(&clause.statement);
                    }
                }
                if let Some(else_branch) = else_branch {
                    return self.evaluate_statement(else_branch);
                }
                Ok(())
            }
            BoundStmt::While { condition, body } => {
                // No iteration cap: a non-terminating loop is a property of
                // the program, not of the evaluator.
                while self.evaluate_condition(condition)? {
                    self.evaluate_statement(body)?;
                }
                Ok(())
            }
            BoundStmt::For {
                variable,
                iterable,
                body,
            } => self.evaluate_for_statement(variable, iterable, body),
        }
    }

    fn evaluate_for_statement(
        &mut self,
        variable: &VariableSymbol,
        iterable: &BoundExpr,
        body: &BoundStmt,
    ) -> Result<(), RuntimeError> {
        let span = iterable.span();
        let items = match self.evaluate_expression(iterable)? {
            Value::List(items) => items,
            other => return Err(RuntimeError::unexpected_type(span, Type::List, other.ty())),
        };

        for item in items {
            self.variables
                .insert(variable.name.clone(), Value::Int(item));
            self.evaluate_statement(body)?;
        }
        Ok(())
    }

    fn evaluate_condition(&mut self, condition: &BoundExpr) -> Result<bool, RuntimeError> {
        let span = condition.span();
        match self.evaluate_expression(condition)? {
            Value::Bool(value) => Ok(value),
            other => Err(RuntimeError::unexpected_type(span, Type::Bool, other.ty())),
        }
    }

    fn evaluate_expression(&mut self, expression: &BoundExpr) -> Result<Value, RuntimeError> {
        match expression {
            BoundExpr::Literal { value, .. } => Ok(value.clone()),
            BoundExpr::Variable { variable, span } => self
                .variables
                .get(&variable.name)
                .cloned()
                .ok_or_else(|| RuntimeError::uninitialized_variable(*span, &variable.name)),
            BoundExpr::Assignment {
                variable,
                expression,
                ..
            } => {
                let value = self.evaluate_expression(expression)?;
                self.variables.insert(variable.name.clone(), value.clone());
                Ok(value)
            }
            BoundExpr::CompoundAssignment {
                variable,
                operator,
                expression,
                operator_span,
                ..
            } => {
                let current = self
                    .variables
                    .get(&variable.name)
                    .cloned()
                    .ok_or_else(|| {
                        RuntimeError::uninitialized_variable(*operator_span, &variable.name)
                    })?;
                let right = self.evaluate_expression(expression)?;
                let value = apply_binary(operator.kind, current, right, *operator_span)?;
                self.variables.insert(variable.name.clone(), value.clone());
                Ok(value)
            }
            BoundExpr::Unary {
                operator,
                operand,
                span,
            } => {
                let operand = self.evaluate_expression(operand)?;
                apply_unary(operator.kind, operand, *span)
            }
            BoundExpr::Binary {
                left,
                operator,
                right,
                operator_span,
                ..
            } => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                apply_binary(operator.kind, left, right, *operator_span)
            }
            BoundExpr::Range {
                lower,
                upper,
                step,
                ..
            } => self.evaluate_range_expression(lower, upper.as_deref(), step.as_deref()),
        }
    }

    /// Ranges materialize eagerly: `range(n)` is `[0, n)`, the two- and
    /// three-argument forms are `[lower, upper)` stepping by `step`.
    fn evaluate_range_expression(
        &mut self,
        lower: &BoundExpr,
        upper: Option<&BoundExpr>,
        step: Option<&BoundExpr>,
    ) -> Result<Value, RuntimeError> {
        let first = self.evaluate_int(lower)?;

        let (lower, upper) = match upper {
            Some(upper) => (first, self.evaluate_int(upper)?),
            None => (0, first),
        };

        let step_value = match step {
            Some(step_expr) => {
                let value = self.evaluate_int(step_expr)?;
                if value == 0 {
                    return Err(RuntimeError::zero_range_step(step_expr.span()));
                }
                value
            }
            None => 1,
        };

        let mut items = Vec::new();
        let mut current = lower;
        while (step_value > 0 && current < upper) || (step_value < 0 && current > upper) {
            items.push(current);
            current = current.wrapping_add(step_value);
        }

        Ok(Value::List(items))
    }

    fn evaluate_int(&mut self, expression: &BoundExpr) -> Result<i64, RuntimeError> {
        let span = expression.span();
        match self.evaluate_expression(expression)? {
            Value::Int(value) => Ok(value),
            other => Err(RuntimeError::unexpected_type(span, Type::Int, other.ty())),
        }
    }
}

fn apply_unary(
    kind: BoundUnaryOperatorKind,
    operand: Value,
    span: TextSpan,
) -> Result<Value, RuntimeError> {
    match (kind, operand) {
        (BoundUnaryOperatorKind::Identity, Value::Int(value)) => Ok(Value::Int(value)),
        (BoundUnaryOperatorKind::Negation, Value::Int(value)) => {
            Ok(Value::Int(value.wrapping_neg()))
        }
        (BoundUnaryOperatorKind::LogicalNegation, Value::Bool(value)) => Ok(Value::Bool(!value)),
        (_, operand) => Err(RuntimeError::unexpected_type(span, Type::Int, operand.ty())),
    }
}

fn apply_binary(
    kind: BoundBinaryOperatorKind,
    left: Value,
    right: Value,
    span: TextSpan,
) -> Result<Value, RuntimeError> {
    use BoundBinaryOperatorKind::*;

    // Identity and equality are defined for mismatched operand types.
    match kind {
        Equals => return Ok(Value::Bool(left == right)),
        NotEquals => return Ok(Value::Bool(left != right)),
        Identity => return Ok(Value::Bool(left == right)),
        NonIdentity => return Ok(Value::Bool(left != right)),
        _ => {}
    }

    match (kind, left, right) {
        (Addition, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_add(r))),
        (Subtraction, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_sub(r))),
        (Multiplication, Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.wrapping_mul(r))),
        (Division, Value::Int(l), Value::Int(r)) => {
            if r == 0 {
                Err(RuntimeError::division_by_zero(span))
            } else {
                Ok(Value::Int(l.wrapping_div(r)))
            }
        }
        (LogicalAnd, Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(l && r)),
        (LogicalOr, Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(l || r)),
        (Greater, Value::Int(l), Value::Int(r)) => Ok(Value::Bool(l > r)),
        (GreaterOrEquals, Value::Int(l), Value::Int(r)) => Ok(Value::Bool(l >= r)),
        (Less, Value::Int(l), Value::Int(r)) => Ok(Value::Bool(l < r)),
        (LessOrEquals, Value::Int(l), Value::Int(r)) => Ok(Value::Bool(l <= r)),
        (Membership, Value::Int(l), Value::List(items)) => Ok(Value::Bool(items.contains(&l))),
        (_, left, _) => Err(RuntimeError::unexpected_type(span, Type::Int, left.ty())),
    }
}
