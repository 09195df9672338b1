#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::ErrorReporter;
use rox::Lox;

/// In‑memory output sink whose contents stay readable after the session
/// takes ownership of a clone.
#[derive(Clone, Default)]
pub struct Captured(Rc<RefCell<Vec<u8>>>);

impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_owned).collect()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session wired to a capture buffer.
pub fn session() -> (Lox, Captured) {
    let out = Captured::default();
    (Lox::with_output(Box::new(out.clone())), out)
}

/// Run `source` in a fresh session; return printed lines and the reporter.
pub fn run(source: &str) -> (Vec<String>, ErrorReporter) {
    let (mut lox, out) = session();
    let reporter = lox.run(source);
    (out.lines(), reporter)
}

/// Run a program that must succeed and return its printed lines.
pub fn run_ok(source: &str) -> Vec<String> {
    let (lines, reporter) = run(source);

    assert!(
        !reporter.had_error() && !reporter.had_runtime_error(),
        "unexpected errors: {:?}",
        reporter.render(source)
    );

    lines
}

/// Messages of every static error, deduplicated and in source order.
pub fn static_messages(reporter: &ErrorReporter) -> Vec<String> {
    reporter
        .deduplicated()
        .iter()
        .map(|e| e.message())
        .collect()
}

/// Message of the runtime error that stopped the run.
pub fn runtime_message(reporter: &ErrorReporter) -> Option<String> {
    reporter.runtime_errors().first().map(|e| e.message())
}
