//! Compilation of a project's contact summary into a single deployable
//! program.

use std::path::{Path, PathBuf};

use eyre::Result;
use log::{debug, error, info};

use crate::lint::{with_line_numbers, LintOptions, Linter};
use crate::minify::Minifier;
use crate::template::{expand_file, expand_includes, render_driver};
use crate::Error;

/// A freeform contact summary script, used as-is.
pub const FREEFORM_FILE: &str = "contact-summary.js";
/// A structured contact summary definition, declaring `fields` and `cards`.
pub const STRUCTURED_FILE: &str = "contact-summary.templated.js";
/// Helpers included ahead of a structured definition.
pub const EXTRAS_FILE: &str = "contact-summary-extras.js";

/// The form in which a project provides its contact summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarySource {
    Freeform(PathBuf),
    Structured(PathBuf),
}

/// Finds the project's contact summary source. A freeform script takes
/// precedence over a structured definition.
pub fn locate_source<P: AsRef<Path>>(project_dir: P) -> Result<SummarySource> {
    let project_dir = project_dir.as_ref();
    let freeform = project_dir.join(FREEFORM_FILE);
    let structured = project_dir.join(STRUCTURED_FILE);
    if freeform.is_file() {
        Ok(SummarySource::Freeform(freeform))
    } else if structured.is_file() {
        Ok(SummarySource::Structured(structured))
    } else {
        Err(Error::MissingContactSummary {
            freeform,
            structured,
        }
        .into())
    }
}

/// Produces the complete, unverified program for the project's contact
/// summary, with all includes expanded.
pub fn assemble<P: AsRef<Path>>(project_dir: P) -> Result<String> {
    let project_dir = project_dir.as_ref();
    match locate_source(project_dir)? {
        SummarySource::Freeform(path) => {
            debug!("Using freeform contact summary {}", path.display());
            expand_file(project_dir, path)
        }
        SummarySource::Structured(path) => {
            debug!("Using structured contact summary {}", path.display());
            let driver = render_driver(EXTRAS_FILE, STRUCTURED_FILE)?;
            expand_includes(project_dir, &driver)
        }
    }
}

/// Lints the given program, failing if any violations were found. All
/// violations are logged along with the offending program.
pub fn verify(code: &str, linter: &dyn Linter) -> Result<()> {
    let violations = linter.lint(code, &LintOptions::contact_summary())?;
    if violations.is_empty() {
        return Ok(());
    }
    error!("Generated code:\n{}", with_line_numbers(code));
    for violation in &violations {
        error!("{}", violation);
    }
    Err(Error::StaticCheck(violations).into())
}

/// Compiles the contact summary of the project in `project_dir`: assembles
/// it, verifies it with `linter` and finally minifies it with `minifier`.
pub fn compile_contact_summary<P: AsRef<Path>>(
    project_dir: P,
    linter: &dyn Linter,
    minifier: &dyn Minifier,
) -> Result<String> {
    let project_dir = project_dir.as_ref();
    let code = assemble(project_dir)?;
    verify(&code, linter)?;
    let minified = minifier.minify(&code)?;
    info!(
        "Compiled contact summary from {} ({} bytes)",
        project_dir.display(),
        minified.len()
    );
    Ok(minified)
}
