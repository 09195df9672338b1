//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! Static errors (scanner, parser, resolver) are never thrown across stage
//! boundaries; they are collected by an [`ErrorReporter`] that every stage
//! receives explicitly.  Runtime errors unwind to [`crate::lox::Lox::run`],
//! which records the single fatal one in the same reporter.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Span;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error.
    #[error("Error: {message}")]
    Lex { message: String, span: Span },

    /// Syntactic (parser) error.
    #[error("Error: {message}")]
    Parse { message: String, span: Span },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("Error: {message}")]
    Resolve { message: String, span: Span },

    /// Runtime evaluation error.
    #[error("Runtime error: {message}")]
    Runtime { message: String, span: Span },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(span: Span, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: span={:?}, msg={}", span, message);

        LoxError::Lex { message, span }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(span: Span, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: span={:?}, msg={}", span, message);

        LoxError::Parse { message, span }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(span: Span, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: span={:?}, msg={}", span, message);

        LoxError::Resolve { message, span }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(span: Span, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: span={:?}, msg={}", span, message);

        LoxError::Runtime { message, span }
    }

    /// Source range the error points at, if it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            LoxError::Lex { span, .. }
            | LoxError::Parse { span, .. }
            | LoxError::Resolve { span, .. }
            | LoxError::Runtime { span, .. } => Some(*span),
            LoxError::Io(_) | LoxError::Utf8(_) => None,
        }
    }

    /// Bare message without the `Error:` prefix.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. }
            | LoxError::Runtime { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Render the error against `source`: the message, the offending line
    /// with its number, and a caret under the start column.
    pub fn display(&self, source: &str) -> String {
        let Some(span) = self.span() else {
            return format!("Error: {}\n", self);
        };

        let loc = span.location(source);
        let line_start = span.start.min(source.len()) - loc.col;
        let line_text = source[line_start..]
            .split('\n')
            .next()
            .unwrap_or_default()
            .trim_end_matches('\r');

        // `col` counts bytes; the caret is placed by characters.
        let chars_before = source
            .get(line_start..line_start + loc.col)
            .map_or(loc.col, |before| before.chars().count());

        let prefix = format!("    {} | ", loc.line);
        let padding = " ".repeat(prefix.len() + chars_before);

        format!(
            "Error: {}\n\n{}{}\n{}^-- Here.\n",
            self.message(),
            prefix,
            line_text,
            padding
        )
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Error sink shared by every pipeline stage of one run.
///
/// Static and runtime errors land in separate buckets so that a syntax
/// error never hides behind a runtime error from a previous statement.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    static_errors: Vec<LoxError>,
    runtime_errors: Vec<LoxError>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error, routing it to the bucket matching its kind.
    pub fn error(&mut self, error: LoxError) {
        match error {
            LoxError::Runtime { .. } | LoxError::Io(_) => self.runtime_errors.push(error),
            _ => self.static_errors.push(error),
        }
    }

    /// Shorthand for recording a parse error at `span`.
    pub fn report<S: Into<String>>(&mut self, span: Span, message: S) {
        self.error(LoxError::parse(span, message));
    }

    pub fn had_error(&self) -> bool {
        !self.static_errors.is_empty()
    }

    pub fn had_runtime_error(&self) -> bool {
        !self.runtime_errors.is_empty()
    }

    pub fn static_errors(&self) -> &[LoxError] {
        &self.static_errors
    }

    pub fn runtime_errors(&self) -> &[LoxError] {
        &self.runtime_errors
    }

    /// Static errors sorted by position, with cascades collapsed: an error
    /// starting within one byte of the previously kept error is dropped.
    pub fn deduplicated(&self) -> Vec<&LoxError> {
        let mut sorted: Vec<&LoxError> = self.static_errors.iter().collect();
        sorted.sort_by_key(|e| e.span().map_or(0, |s| s.start));

        let mut kept: Vec<&LoxError> = Vec::with_capacity(sorted.len());
        let mut last: Option<usize> = None;

        for error in sorted {
            let start = error.span().map_or(0, |s| s.start);

            if let Some(prev) = last {
                if start <= prev + 1 {
                    continue;
                }
            }

            last = Some(start);
            kept.push(error);
        }

        kept
    }

    /// Human-readable listing of every reported error, static first.
    pub fn render(&self, source: &str) -> Vec<String> {
        self.deduplicated()
            .into_iter()
            .chain(self.runtime_errors.iter())
            .map(|e| e.display(source))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_errors_collapse() {
        let mut reporter = ErrorReporter::new();
        reporter.error(LoxError::lex(Span::point(5), "b"));
        reporter.error(LoxError::lex(Span::point(4), "a"));
        reporter.error(LoxError::lex(Span::point(6), "c"));
        reporter.error(LoxError::lex(Span::point(20), "d"));

        let kept: Vec<String> = reporter
            .deduplicated()
            .iter()
            .map(|e| e.message())
            .collect();

        assert_eq!(kept, vec!["a", "c", "d"]);
    }

    #[test]
    fn runtime_errors_use_their_own_bucket() {
        let mut reporter = ErrorReporter::new();
        reporter.error(LoxError::runtime(Span::point(0), "boom"));

        assert!(!reporter.had_error());
        assert!(reporter.had_runtime_error());
    }

    #[test]
    fn display_points_at_column() {
        let src = "var a = 1;\nprint a +;\n";
        let err = LoxError::parse(Span::new(20, 21), "Expected expression.");

        let caret = format!("{}^-- Here.", " ".repeat("    2 | ".len() + 9));

        assert_eq!(
            err.display(src),
            format!("Error: Expected expression.\n\n    2 | print a +;\n{}\n", caret)
        );
    }

    #[test]
    fn caret_counts_characters_not_bytes() {
        let src = "print \"é\" +;";
        let err = LoxError::parse(Span::new(12, 13), "Expected expression.");

        let caret = format!("{}^-- Here.", " ".repeat("    1 | ".len() + 11));

        assert_eq!(
            err.display(src),
            format!("Error: Expected expression.\n\n    1 | print \"é\" +;\n{}\n", caret)
        );
    }
}
