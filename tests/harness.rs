//! Fixture-driven integration harness.
//!
//! Each directory under `tests/programs/` holds one case: a `case.yaml`
//! spec, the input `program.java`, and either the exact expected output
//! (`expected.py`) or a fragment the error message must contain
//! (`error.txt`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use j2py::{Options, translate};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum CaseClass {
    TranslateSuccess,
    TranslateError,
}

#[derive(Debug, Deserialize, Clone)]
struct CaseOptions {
    #[serde(default = "default_fatal")]
    fatal: bool,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    plain_eq: bool,
}

fn default_fatal() -> bool {
    true
}

impl Default for CaseOptions {
    fn default() -> Self {
        Self {
            fatal: true,
            private: false,
            plain_eq: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
struct ExpectedOutcome {
    output_file: Option<String>,
    error_contains_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
struct CaseSpec {
    class: CaseClass,
    #[serde(default)]
    options: CaseOptions,
    expected: ExpectedOutcome,
}

#[derive(Debug, Clone)]
struct Case {
    name: String,
    dir: PathBuf,
    program_path: PathBuf,
    spec: CaseSpec,
}

impl Case {
    fn read_text(&self, relative_path: &str) -> Result<String> {
        fs::read_to_string(self.dir.join(relative_path))
            .with_context(|| format!("Reading {} fixture file {}", self.name, relative_path))
    }
}

fn load_cases(programs_dir: &Path) -> Result<Vec<Case>> {
    let mut cases = Vec::new();

    for entry in fs::read_dir(programs_dir)
        .with_context(|| format!("Reading {}", programs_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        let case_path = path.join("case.yaml");
        if !case_path.exists() {
            continue;
        }

        let program_path = path.join("program.java");
        ensure!(
            program_path.exists(),
            "Missing program.java for case {}",
            path.display()
        );

        let case_name = path
            .file_name()
            .and_then(|value| value.to_str())
            .map(str::to_string)
            .with_context(|| format!("Invalid case directory name {}", path.display()))?;
        let case_raw = fs::read_to_string(&case_path)
            .with_context(|| format!("Reading {}", case_path.display()))?;
        let spec: CaseSpec = serde_yaml::from_str(&case_raw)
            .with_context(|| format!("Parsing {}", case_path.display()))?;

        cases.push(Case {
            name: case_name,
            dir: path,
            program_path,
            spec,
        });
    }

    ensure!(
        !cases.is_empty(),
        "No test cases found in {}",
        programs_dir.display()
    );
    cases.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(cases)
}

fn normalize_output(output: &str) -> String {
    output.replace("\r\n", "\n").trim_end().to_string()
}

fn run_case(case: &Case) -> Result<()> {
    let source = fs::read_to_string(&case.program_path)
        .with_context(|| format!("Reading {}", case.name))?;
    let options = Options {
        fatal: case.spec.options.fatal,
        private: case.spec.options.private,
        plain_eq: case.spec.options.plain_eq,
    };
    let result = translate(&source, &options);

    match case.spec.class {
        CaseClass::TranslateSuccess => {
            let output_file = case
                .spec
                .expected
                .output_file
                .as_deref()
                .with_context(|| format!("Missing output_file in {}", case.name))?;
            let expected = case.read_text(output_file)?;
            let output = match result {
                Ok(output) => output,
                Err(error) => anyhow::bail!("Case {} failed to translate: {error}", case.name),
            };
            assert_eq!(
                normalize_output(&output),
                normalize_output(&expected),
                "Output mismatch for {}",
                case.name
            );
        }
        CaseClass::TranslateError => {
            let expected_file = case
                .spec
                .expected
                .error_contains_file
                .as_deref()
                .with_context(|| format!("Missing error expectation file in {}", case.name))?;
            let expected_error = case.read_text(expected_file)?;
            let expected_error = expected_error.trim();
            ensure!(
                result.is_err(),
                "Expected translation error in {}, but it succeeded",
                case.name
            );
            let actual = result.expect_err("result checked as err").to_string();
            ensure!(
                actual.contains(expected_error),
                "Expected error containing '{expected_error}' in {}, got '{actual}'",
                case.name
            );
        }
    }
    Ok(())
}

#[test]
fn runs_translation_cases() -> Result<()> {
    let cases = load_cases(Path::new("tests/programs"))?;
    for case in cases {
        run_case(&case)?;
    }
    Ok(())
}
