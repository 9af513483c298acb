//! Static verification of compiled JavaScript.

use std::io::Write;

use eyre::{Result, WrapErr};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::exec::{run, split_command};
use crate::js::check_function_body;
use crate::summary::BINDING_NAMES;
use crate::Error;

/// Linter options, named as JSHint names them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintOptions {
    pub esversion: u8,
    pub eqeqeq: bool,
    pub funcscope: bool,
    pub latedef: String,
    pub nonbsp: bool,
    /// Globals that scripts may use without declaring them.
    pub predef: Vec<String>,
    pub undef: bool,
    pub unused: bool,
}

impl LintOptions {
    /// The options applied to contact summary programs.
    pub fn contact_summary() -> Self {
        Self {
            esversion: 5,
            eqeqeq: true,
            funcscope: true,
            latedef: "nofunc".to_string(),
            nonbsp: true,
            predef: BINDING_NAMES.iter().map(|name| name.to_string()).collect(),
            undef: true,
            unused: true,
        }
    }
}

/// A single problem found by a linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub line: u32,
    pub character: u32,
    pub reason: String,
    pub code: Option<String>,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, col {}, {}", self.line, self.character, self.reason)?;
        if let Some(code) = &self.code {
            write!(f, " ({})", code)?;
        }
        Ok(())
    }
}

/// Checks JavaScript source code for problems.
pub trait Linter {
    /// Returns all of the problems found in `code`. An empty result means
    /// the code passed.
    fn lint(&self, code: &str, options: &LintOptions) -> Result<Vec<Violation>>;
}

/// Runs [JSHint](https://jshint.com/) as an external command.
#[derive(Debug, Clone)]
pub struct JsHint {
    command: String,
}

impl JsHint {
    pub fn new<S: Into<String>>(command: S) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for JsHint {
    fn default() -> Self {
        Self::new("jshint")
    }
}

impl Linter for JsHint {
    fn lint(&self, code: &str, options: &LintOptions) -> Result<Vec<Violation>> {
        let (program, mut args) = split_command(&self.command)?;

        let mut config = tempfile::Builder::new()
            .prefix("jshint-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| Error::Io("jshint config".to_string(), e))?;
        serde_json::to_writer(&mut config, options).map_err(Error::Json)?;
        config
            .flush()
            .map_err(|e| Error::Io(config.path().display().to_string(), e))?;
        let config_path = config.path().display().to_string();
        args.extend([
            "--verbose".to_string(),
            "--config".to_string(),
            config_path,
            "-".to_string(),
        ]);

        let output = run(&program, &args, Some(code))?;
        if output.status.success() {
            return Ok(Vec::new());
        }
        let violations = parse_jshint_output(&output.stdout);
        if violations.is_empty() {
            let message = if output.stderr.trim().is_empty() {
                output.stdout
            } else {
                output.stderr
            };
            return Err(Error::LintOutput(message.trim().to_string()))
                .wrap_err_with(|| format!("{} exited with {}", program, output.status));
        }
        debug!("{} reported {} violation(s)", program, violations.len());
        Ok(violations)
    }
}

lazy_static! {
    static ref REPORTER_LINE: Regex =
        Regex::new(r"^.*?: line (\d+), col (\d+), (.*?)(?: \(([EWI]\d+)\))?$").unwrap();
}

/// Parses the output of JSHint's default reporter, e.g.
///
/// ```text
/// stdin: line 3, col 5, 'x' is not defined. (W117)
/// ```
pub fn parse_jshint_output(output: &str) -> Vec<Violation> {
    output
        .lines()
        .filter_map(|line| {
            let caps = REPORTER_LINE.captures(line.trim_end())?;
            Some(Violation {
                line: caps[1].parse().ok()?,
                character: caps[2].parse().ok()?,
                reason: caps[3].to_string(),
                code: caps.get(4).map(|m| m.as_str().to_string()),
            })
        })
        .collect()
}

/// Checks only that the code parses, using the embedded JavaScript engine.
/// The code is parsed as the body of a function taking the predefined
/// globals, but is never executed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxCheck;

impl Linter for SyntaxCheck {
    fn lint(&self, code: &str, options: &LintOptions) -> Result<Vec<Violation>> {
        let params = options
            .predef
            .iter()
            .map(String::as_str)
            .collect::<Vec<&str>>();
        Ok(match check_function_body(&params, code) {
            Ok(()) => Vec::new(),
            Err(reason) => vec![Violation {
                line: 0,
                character: 0,
                reason,
                code: None,
            }],
        })
    }
}

/// Prefixes every line of `code` with its line number.
pub fn with_line_numbers(code: &str) -> String {
    let lines = code.lines().collect::<Vec<&str>>();
    let width = lines.len().to_string().len();
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$} {}", i + 1, line, width = width))
        .collect::<Vec<String>>()
        .join("\n")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_default_reporter_output() {
        let output = "stdin: line 3, col 5, 'x' is not defined. (W117)\n\
                      stdin: line 10, col 12, Expected '===' and instead saw '=='. (W116)\n\
                      stdin: line 11, col 1, Missing semicolon.\n\
                      \n\
                      3 errors\n";
        let violations = parse_jshint_output(output);
        assert_eq!(violations.len(), 3);
        assert_eq!(
            violations[0],
            Violation {
                line: 3,
                character: 5,
                reason: "'x' is not defined.".to_string(),
                code: Some("W117".to_string()),
            }
        );
        assert_eq!(violations[2].code, None);
        assert_eq!(
            violations[1].to_string(),
            "line 10, col 12, Expected '===' and instead saw '=='. (W116)"
        );
    }

    #[test]
    fn contact_summary_options_serialize_as_jshint_config() {
        let config = serde_json::to_value(LintOptions::contact_summary()).unwrap();
        assert_eq!(config["esversion"], 5);
        assert_eq!(config["latedef"], "nofunc");
        assert_eq!(
            config["predef"],
            serde_json::json!(["contact", "lineage", "reports"])
        );
    }

    #[test]
    fn syntax_check_reports_parse_errors() {
        let options = LintOptions::contact_summary();
        assert!(SyntaxCheck
            .lint("return { name: contact.name };", &options)
            .unwrap()
            .is_empty());
        assert_eq!(
            SyntaxCheck
                .lint("return { name: contact.name ;", &options)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn missing_jshint_is_an_error() {
        let linter = JsHint::new("jshint-does-not-exist");
        assert!(linter
            .lint("var a = 1;", &LintOptions::contact_summary())
            .is_err());
    }

    #[test]
    fn numbers_lines() {
        let numbered = with_line_numbers((1..=10).map(|i| i.to_string()).collect::<Vec<_>>().join("\n").as_str());
        let lines = numbered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], " 1 1");
        assert_eq!(lines[9], "10 10");
    }
}
