use std::collections::HashMap;

use crate::ast::SyntaxTree;
use crate::compilation::Compilation;

/// Run a whole script as a single submission.
pub fn run(source: &str, filename: Option<&str>) {
    let syntax = SyntaxTree::parse(source);
    let compilation = Compilation::new(syntax);

    let mut variables = HashMap::new();
    match compilation.evaluate(&mut variables) {
        Ok(result) => {
            for diagnostic in &result.diagnostics {
                diagnostic.report(source, filename);
            }
            if let Some(value) = result.value {
                println!("{}", value);
            }
        }
        Err(error) => error.report(source, filename),
    }
}
