//! Minification of compiled JavaScript.

use eyre::{Result, WrapErr};

use crate::exec::{exec, split_command};
use crate::Error;

/// Reduces the size of JavaScript source code without changing its behavior.
pub trait Minifier {
    fn minify(&self, code: &str) -> Result<String>;
}

/// Pipes code through an external minifier such as `uglifyjs` or `terser`,
/// which must read the source from its standard input and write the result
/// to its standard output.
#[derive(Debug, Clone)]
pub struct CommandMinifier {
    command: String,
}

impl CommandMinifier {
    pub fn new<S: Into<String>>(command: S) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// Compiled programs end in a top-level `return`, which uglify-js only
/// accepts with `bare_returns` enabled.
pub const DEFAULT_MINIFIER: &str = "uglifyjs --parse bare_returns --compress --mangle";

impl Default for CommandMinifier {
    fn default() -> Self {
        Self::new(DEFAULT_MINIFIER)
    }
}

impl Minifier for CommandMinifier {
    fn minify(&self, code: &str) -> Result<String> {
        let (program, args) = split_command(&self.command)
            .wrap_err_with(|| Error::Minify("invalid minifier command".to_string()))?;
        let minified = exec(&program, args, Some(code))
            .wrap_err_with(|| Error::Minify(format!("{} failed", program)))?;
        if minified.trim().is_empty() && !code.trim().is_empty() {
            return Err(Error::Minify(format!("{} produced no output", program)).into());
        }
        Ok(minified.trim_end().to_string())
    }
}

/// Leaves code as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl Minifier for Verbatim {
    fn minify(&self, code: &str) -> Result<String> {
        Ok(code.to_string())
    }
}
