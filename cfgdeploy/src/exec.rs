//! Execution of external commands.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use eyre::Result;
use log::{debug, trace};

use crate::Error;

/// Runs the given program to completion, optionally feeding `stdin` to it,
/// and returns its standard output.
///
/// Fails if the program cannot be started or exits with a non-zero status,
/// in which case the error carries the program's standard error output.
pub fn exec<I, S>(program: &str, args: I, stdin: Option<&str>) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let output = run(program, args, stdin)?;
    if !output.status.success() {
        return Err(command_error(program, &output).into());
    }
    Ok(output.stdout)
}

/// Captured result of a command that ran to completion, whatever its exit
/// status.
#[derive(Debug)]
pub struct Output {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Like [`exec`], but leaves interpretation of the exit status to the
/// caller.
pub fn run<I, S>(program: &str, args: I, stdin: Option<&str>) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args = args
        .into_iter()
        .map(|arg| arg.as_ref().to_string())
        .collect::<Vec<String>>();
    trace!("Executing: {} {}", program, args.join(" "));
    let mut child = Command::new(program)
        .args(&args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Command {
            program: program.to_string(),
            message: e.to_string(),
        })?;

    // Feed stdin from a separate thread so that a chatty child can't block
    // on a full stdout pipe while we're still writing.
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_string();
            Some(thread::spawn(move || pipe.write_all(input.as_bytes())))
        }
        _ => None,
    };

    let output = child.wait_with_output().map_err(|e| Error::Command {
        program: program.to_string(),
        message: e.to_string(),
    })?;
    if let Some(writer) = writer {
        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Failed to write standard input of {}: {}", program, e),
            Err(_) => debug!("Standard input writer for {} panicked", program),
        }
    }
    Ok(Output {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

fn command_error(program: &str, output: &Output) -> Error {
    let stderr = output.stderr.trim();
    Error::Command {
        program: program.to_string(),
        message: if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr.to_string()
        },
    }
}

/// Splits a configured command line (e.g. `"uglifyjs --compress"`) into its
/// program and arguments, following shell quoting rules.
pub fn split_command(command: &str) -> Result<(String, Vec<String>)> {
    let mut parts = shell_words::split(command).map_err(|e| Error::Command {
        program: command.to_string(),
        message: e.to_string(),
    })?;
    if parts.is_empty() {
        return Err(Error::Command {
            program: command.to_string(),
            message: "no program given".to_string(),
        }
        .into());
    }
    let program = parts.remove(0);
    Ok((program, parts))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn returns_standard_output() {
        let output = exec("sh", ["-c", "echo Usage: sh"], None).unwrap();
        assert!(output.starts_with("Usage: sh"));
    }

    #[test]
    fn pipes_standard_input() {
        let output = exec("cat", Vec::<&str>::new(), Some("var a = 1;")).unwrap();
        assert_eq!(output, "var a = 1;");
    }

    #[test]
    fn non_zero_exit_carries_standard_error() {
        let err = exec("sh", ["-c", "echo 'sh: bad option' >&2; exit 2"], None).unwrap_err();
        assert!(err.to_string().contains("sh: bad option"), "{}", err);
    }

    #[test]
    fn missing_command_is_an_error() {
        let err = exec("cmd-dont-exist.sh", ["some-arg"], None).unwrap_err();
        assert!(err.to_string().contains("cmd-dont-exist.sh"), "{}", err);
    }

    #[test]
    fn child_ignoring_its_input_still_succeeds() {
        let input = "x".repeat(1 << 20);
        let output = exec("sh", ["-c", "exit 0"], Some(input.as_str())).unwrap();
        assert_eq!(output, "");
    }

    #[test]
    fn splits_command_lines() {
        assert_eq!(
            split_command("uglifyjs --compress --mangle").unwrap(),
            (
                "uglifyjs".to_string(),
                vec!["--compress".to_string(), "--mangle".to_string()]
            )
        );
    }

    #[test]
    fn quoted_arguments_stay_whole() {
        let (program, args) = split_command(r#"node "/opt/my tools/minify.js" --bare"#).unwrap();
        assert_eq!(program, "node");
        assert_eq!(args, vec!["/opt/my tools/minify.js", "--bare"]);
    }

    #[test]
    fn empty_or_malformed_command_lines_are_errors() {
        assert!(split_command("   ").is_err());
        let err = split_command(r#"jshint "unterminated"#).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::Command { program, .. }) => assert_eq!(program, r#"jshint "unterminated"#),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
