//! `j2py` library crate.
//!
//! High-level layout:
//! - frontend: `lexer` (line-partitioned tokens) + `parser` build the class
//!   model (`model`)
//! - `emitter` walks the model and produces the target source text
//! - `diag` threads diagnostics through both phases in fatal or warning mode
//!
//! The whole pipeline is exposed as the single pure function [`translate`]:
//! one call builds its own token buffer, class model, and diagnostic sink,
//! and the output depends only on the source text and the options.

pub mod diag;
pub mod emitter;
pub mod lexer;
pub mod model;
pub mod parser;

pub use diag::TranslateError;

/// Translation switches recognized by [`translate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Halt on the first diagnostic instead of accumulating warnings.
    pub fatal: bool,
    /// Prefix emitted names of `private` variables with an underscore.
    pub private: bool,
    /// Emit `==` for source `==` instead of the corpus-default `is`.
    pub plain_eq: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fatal: true,
            private: false,
            plain_eq: false,
        }
    }
}

/// Translate a source program into target text, or fail with the collected
/// diagnostics.
pub fn translate(source: &str, options: &Options) -> Result<String, TranslateError> {
    let mode = if options.fatal {
        diag::Mode::Fatal
    } else {
        diag::Mode::Warn
    };
    let mut diags = diag::DiagnosticSink::new(mode);
    let classes = parser::Parser::new(source, &mut diags).parse()?;
    let output = emitter::Emitter::new(options, &mut diags).emit(&classes)?;
    diags.finish(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const SAMPLE: &str = indoc! {"
        class Counter {
            int value = 0;
            void bump() { value = value + 1; }
        }
    "};

    #[test]
    fn output_is_deterministic() {
        let options = Options::default();
        let first = translate(SAMPLE, &options).expect("first run");
        let second = translate(SAMPLE, &options).expect("second run");
        assert_eq!(first, second);
    }

    #[test]
    fn preserves_top_level_class_order() {
        let output = translate(
            "class B { } class A { } class C { }",
            &Options::default(),
        )
        .expect("translate failed");
        let b = output.find("class B").expect("B");
        let a = output.find("class A").expect("A");
        let c = output.find("class C").expect("C");
        assert!(b < a && a < c);
    }

    #[test]
    fn fatal_mode_stops_at_first_problem() {
        let error = translate("private class Ex { int x; int x; }", &Options::default())
            .expect_err("expected failure");
        let rendered = error.to_string();
        assert!(rendered.contains("Classes cannot be private"));
        assert!(!rendered.contains("already defined"));
    }

    #[test]
    fn warning_mode_reports_everything_at_once() {
        let options = Options {
            fatal: false,
            ..Options::default()
        };
        let error = translate("private class Ex { int x; int x; }", &options)
            .expect_err("expected accumulated warnings");
        let rendered = error.to_string();
        assert!(rendered.contains("Classes cannot be private"));
        assert!(rendered.contains("Variable x is already defined in class Ex"));
    }

    #[test]
    fn warning_mode_returns_output_when_clean() {
        let options = Options {
            fatal: false,
            ..Options::default()
        };
        let output = translate(SAMPLE, &options).expect("clean source must translate");
        assert!(output.contains("class Counter(object):"));
    }
}
