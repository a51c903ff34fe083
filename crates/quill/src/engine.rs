//! External engine adapters for the CLI.
//!
//! The pipeline treats script evaluation and XSLT transforms as external
//! services behind traits; these are the CLI's stand-ins. Stylesheet
//! transforms shell out to `xsltproc`; there is no embedded script
//! interpreter, so script expressions are preserved unevaluated and
//! reported.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use quill_pipeline::{EvalError, Evaluator, ProcessError, StylesheetEngine};

/// Script evaluator for hosts without an embedded interpreter.
///
/// Every expression fails, which the inline-script processor turns into
/// "span preserved, parse error reported" — the document still renders.
pub(crate) struct UnavailableEvaluator;

impl Evaluator for UnavailableEvaluator {
    fn eval(&mut self, _expression: &str) -> Result<String, EvalError> {
        Err(EvalError::new("no script engine available"))
    }
}

/// Stylesheet engine delegating to the `xsltproc` executable.
pub(crate) struct XsltprocEngine;

impl StylesheetEngine for XsltprocEngine {
    fn transform(&self, xml: &str, stylesheet: &Path) -> Result<String, ProcessError> {
        let mut child = Command::new("xsltproc")
            .arg(stylesheet)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProcessError::Transform(format!("failed to run xsltproc: {e}")))?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(xml.as_bytes())
                .map_err(|e| ProcessError::Transform(e.to_string()))?;
        }

        let result = child
            .wait_with_output()
            .map_err(|e| ProcessError::Transform(e.to_string()))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ProcessError::Transform(stderr.trim().to_owned()));
        }

        String::from_utf8(result.stdout)
            .map_err(|e| ProcessError::Transform(format!("non-utf8 transform output: {e}")))
    }
}
