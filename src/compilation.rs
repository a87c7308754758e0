use std::cell::OnceCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::SyntaxTree;
use crate::binder::{Binder, BoundGlobalScope};
use crate::diagnostics::{Diagnostic, RuntimeError};
use crate::evaluator::Evaluator;
use crate::value::Value;

/// What one submission produced: either diagnostics (and no value), or the
/// value of its last expression statement, if any.
#[derive(Debug)]
pub struct EvaluationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub value: Option<Value>,
}

/// One submission tied to the chain of submissions before it. Binding is
/// memoized, so the global scope is computed at most once per compilation
/// no matter how often it is asked for.
pub struct Compilation {
    syntax: SyntaxTree,
    previous: Option<Rc<BoundGlobalScope>>,
    global_scope: OnceCell<Rc<BoundGlobalScope>>,
}

impl Compilation {
    pub fn new(syntax: SyntaxTree) -> Self {
        Self {
            syntax,
            previous: None,
            global_scope: OnceCell::new(),
        }
    }

    pub fn continue_with(previous: Rc<BoundGlobalScope>, syntax: SyntaxTree) -> Self {
        Self {
            syntax,
            previous: Some(previous),
            global_scope: OnceCell::new(),
        }
    }

    pub fn syntax(&self) -> &SyntaxTree {
        &self.syntax
    }

    pub fn global_scope(&self) -> &Rc<BoundGlobalScope> {
        self.global_scope.get_or_init(|| {
            Rc::new(Binder::bind_global_scope(
                self.previous.clone(),
                self.syntax.root(),
            ))
        })
    }

    /// Run the submission against the store. Any syntax or binding
    /// diagnostic stops evaluation before it starts; a runtime fault aborts
    /// it. In both cases the store is left exactly as it was, so a broken
    /// submission never leaks partial state into the session.
    pub fn evaluate(
        &self,
        variables: &mut HashMap<String, Value>,
    ) -> Result<EvaluationResult, RuntimeError> {
        let global_scope = self.global_scope();

        let mut diagnostics = self.syntax.diagnostics().to_vec();
        diagnostics.extend(global_scope.diagnostics.iter().cloned());
        if !diagnostics.is_empty() {
            return Ok(EvaluationResult {
                diagnostics,
                value: None,
            });
        }

        let mut scratch = variables.clone();
        let value = Evaluator::new(&mut scratch).evaluate(&global_scope.statement)?;
        *variables = scratch;

        Ok(EvaluationResult {
            diagnostics: Vec::new(),
            value,
        })
    }
}
