//! Top‑level pipeline: scan → parse → resolve → interpret.
//!
//! A [`Lox`] session owns one [`Interpreter`], so definitions made by one
//! call to [`Lox::run`] are visible to the next.  Every call gets its own
//! [`ErrorReporter`], which is handed back to the caller for display.

use std::io::Write;

use log::{debug, info};

use crate::ast::{ExprId, Stmt};
use crate::error::ErrorReporter;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::value::Value;

pub struct Lox {
    interpreter: Interpreter,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// Session printing to standard output.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// Session printing to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
        }
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Run a complete program.
    ///
    /// Static errors (lexing, parsing, resolution) prevent evaluation.  A
    /// program consisting of one bare expression statement has its value
    /// echoed to the output.
    pub fn run(&mut self, source: &str) -> ErrorReporter {
        info!("Running {} bytes of source", source.len());

        let mut reporter = ErrorReporter::new();
        let first_node = ExprId::watermark();

        let tokens = scan_tokens(source, &mut reporter);
        let statements = Parser::new(&tokens, &mut reporter).parse();

        if reporter.had_error() {
            debug!("Stopping after syntax errors");
            return reporter;
        }

        Resolver::new(&mut self.interpreter, &mut reporter).resolve(&statements);

        if reporter.had_error() {
            debug!("Stopping after resolution errors");
            self.interpreter.forget_resolutions_from(first_node);
            return reporter;
        }

        if let [Stmt::Expression(expr)] = statements.as_slice() {
            let echoed = self
                .interpreter
                .evaluate(expr)
                .and_then(|value| self.interpreter.write_line(&value.to_string()));

            if let Err(e) = echoed {
                reporter.error(e);
            }
        } else {
            self.interpreter.interpret(&statements, &mut reporter);
        }

        reporter
    }

    /// Parse `source` as a single expression and evaluate it.
    pub fn evaluate_expression(&mut self, source: &str) -> Result<Value, ErrorReporter> {
        let mut reporter = ErrorReporter::new();
        let first_node = ExprId::watermark();

        let tokens = scan_tokens(source, &mut reporter);
        let expr = Parser::new(&tokens, &mut reporter).parse_expression();

        let Some(expr) = expr.filter(|_| !reporter.had_error()) else {
            return Err(reporter);
        };

        Resolver::new(&mut self.interpreter, &mut reporter).resolve_expression(&expr);

        if reporter.had_error() {
            self.interpreter.forget_resolutions_from(first_node);
            return Err(reporter);
        }

        match self.interpreter.evaluate(&expr) {
            Ok(value) => Ok(value),

            Err(e) => {
                reporter.error(e);
                Err(reporter)
            }
        }
    }
}
