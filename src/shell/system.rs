//! Runs commands through the platform shell.

use super::{CommandOutcome, ShellRunner};
use std::process::{Command, Stdio};
use tracing::debug;

/// [`ShellRunner`] backed by `sh -c` on Unix and `cmd /C` on Windows.
#[derive(Debug, Clone, Default)]
pub struct SystemShell;

impl SystemShell {
    pub fn new() -> Self {
        Self
    }

    fn command(command_line: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command_line);
            cmd
        }

        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command_line);
            cmd
        }
    }
}

impl ShellRunner for SystemShell {
    fn run(&self, command_line: &str) -> std::io::Result<CommandOutcome> {
        let output = Self::command(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        // A command killed by a signal has no exit code.
        let exit_code = output.status.code().unwrap_or(-1);
        debug!("`{}` exited with {}", command_line, exit_code);

        Ok(CommandOutcome {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
