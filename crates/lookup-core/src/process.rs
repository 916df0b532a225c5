//! Process helpers for external command-line tools

use std::ffi::OsStr;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

/// A finished child process with both output streams fully drained
#[derive(Debug, Clone)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Captured {
    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run a program to completion with stdin closed
///
/// stdout and stderr are read to the end before the exit status is
/// collected, so a chatty child cannot block on a full pipe.
pub fn run_captured<I, S>(program: &str, args: I) -> io::Result<Captured>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    Ok(Captured {
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Resolve a program name to the executable that would be run
///
/// Paths containing a separator are checked as-is; bare names are searched
/// on PATH.
pub fn find_program(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}
