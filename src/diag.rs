//! Diagnostic collection shared by the parser and the emitter.
//!
//! One sink is created per translation and threaded through both phases. In
//! fatal mode the first report halts the run; in warning mode reports
//! accumulate and are raised together once translation finishes.

use std::fmt;

use thiserror::Error;

/// A single parse or translation problem with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub context: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: usize, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            line,
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn unexpected(
        line: usize,
        context: impl Into<String>,
        actual: &str,
        expected: Option<&str>,
    ) -> Self {
        let message = match expected {
            Some(expected) => format!("Unexpected {actual}, expected {expected}"),
            None => format!("Unexpected {actual}"),
        };
        Self::new(line, context, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "line {}: {}", self.line, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if !self.context.is_empty() {
            write!(f, "\n    {}", self.context)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The first diagnostic halts translation.
    Fatal,
    /// Diagnostics accumulate; translation continues best-effort.
    Warn,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("{0}")]
    Fatal(Diagnostic),
    #[error(
        "{}",
        .0.iter().map(|d| d.to_string()).collect::<Vec<_>>().join("\n")
    )]
    Warnings(Vec<Diagnostic>),
}

#[derive(Debug)]
pub struct DiagnosticSink {
    mode: Mode,
    entries: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
        }
    }

    /// Record a diagnostic. Errors immediately in fatal mode, accumulates in
    /// warning mode.
    pub fn report(&mut self, diagnostic: Diagnostic) -> Result<(), TranslateError> {
        match self.mode {
            Mode::Fatal => Err(TranslateError::Fatal(diagnostic)),
            Mode::Warn => {
                self.entries.push(diagnostic);
                Ok(())
            }
        }
    }

    /// Finish the translation: the output survives only when nothing was
    /// reported along the way.
    pub fn finish(self, output: String) -> Result<String, TranslateError> {
        if self.entries.is_empty() {
            Ok(output)
        } else {
            Err(TranslateError::Warnings(self.entries))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_mode_errors_on_first_report() {
        let mut sink = DiagnosticSink::new(Mode::Fatal);
        let diagnostic = Diagnostic::new(3, "int x = ;", "Unexpected ;");
        let error = sink
            .report(diagnostic.clone())
            .expect_err("fatal mode must halt");
        assert_eq!(error, TranslateError::Fatal(diagnostic));
    }

    #[test]
    fn warn_mode_accumulates_and_raises_at_finish() {
        let mut sink = DiagnosticSink::new(Mode::Warn);
        sink.report(Diagnostic::new(1, "", "first"))
            .expect("warn mode accumulates");
        sink.report(Diagnostic::new(2, "", "second"))
            .expect("warn mode accumulates");
        let error = sink
            .finish("output".to_string())
            .expect_err("warnings must be raised");
        let rendered = error.to_string();
        assert!(rendered.contains("first"));
        assert!(rendered.contains("second"));
    }

    #[test]
    fn clean_sink_returns_output() {
        let sink = DiagnosticSink::new(Mode::Warn);
        assert_eq!(
            sink.finish("done".to_string()).expect("no diagnostics"),
            "done"
        );
    }

    #[test]
    fn display_includes_line_and_context() {
        let rendered = Diagnostic::unexpected(4, "int x = ;", ";", Some("expression")).to_string();
        assert_eq!(rendered, "line 4: Unexpected ;, expected expression\n    int x = ;");
    }
}
