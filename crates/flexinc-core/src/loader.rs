//! Content loading: file reads and command execution.
//!
//! Both paths block the calling thread until done. Commands run through
//! `sh -c` without a timeout.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Failure, Missing};
use crate::resolver::ResolvedReference;

/// Load the content a reference points at.
///
/// # Errors
///
/// File references fail with [`Failure::NotFound`], [`Failure::NotReadable`]
/// or [`Failure::TypeMismatch`]; command references with
/// [`Failure::EmptyCommand`], [`Failure::RunFailure`] or
/// [`Failure::TypeMismatch`].
pub fn load(reference: &ResolvedReference) -> Result<String, Failure> {
    match reference {
        ResolvedReference::File(path) => read_file(path),
        ResolvedReference::Command(command) => run_command(command),
    }
}

/// Read a file as UTF-8 text.
pub fn read_file(path: &Path) -> Result<String, Failure> {
    tracing::debug!(path = %path.display(), "Reading include file");
    let bytes = std::fs::read(path).map_err(|e| classify_io_error(path, e))?;
    String::from_utf8(bytes).map_err(|_| Failure::TypeMismatch {
        what: format!("content of {}", path.display()),
    })
}

fn classify_io_error(path: &Path, error: io::Error) -> Failure {
    if error.kind() != io::ErrorKind::NotFound {
        return Failure::NotReadable {
            path: path.to_path_buf(),
            source: error,
        };
    }

    let missing = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Missing::Directory(parent.to_path_buf())
        }
        _ => Missing::File,
    };
    Failure::NotFound {
        path: path.to_path_buf(),
        missing,
    }
}

/// Run a command line through the shell and capture its standard output,
/// minus one trailing line ending.
pub fn run_command(command: &str) -> Result<String, Failure> {
    let command = command.trim();
    if command.is_empty() {
        return Err(Failure::EmptyCommand);
    }

    tracing::debug!(command, "Executing");
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Failure::RunFailure {
            command: command.to_owned(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let message = if stderr.is_empty() {
            output.status.to_string()
        } else {
            format!("{}: {stderr}", output.status)
        };
        return Err(Failure::RunFailure {
            command: command.to_owned(),
            message,
        });
    }

    let mut stdout = String::from_utf8(output.stdout).map_err(|_| Failure::TypeMismatch {
        what: format!("output of `{command}`"),
    })?;
    chomp(&mut stdout);
    Ok(stdout)
}

/// Remove one trailing `\n`, `\r\n` or `\r`.
fn chomp(s: &mut String) {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    } else if s.ends_with('\r') {
        s.pop();
    }
}
