//! External command execution.
//!
//! Configuration and device probing are done by `stty`, `mode` and
//! `setserial`. The [`ShellRunner`] trait lets the device run those commands
//! against the real shell or against a scripted runner in tests.

pub mod mock;
pub mod system;

pub use mock::ScriptedShell;
pub use system::SystemShell;

/// Exit status and captured output of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutcome {
    /// A successful outcome with no output.
    pub fn success() -> Self {
        Self::default()
    }

    /// A failed outcome with the given exit code and stderr text.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: Vec::new(),
            stderr: stderr.into().into_bytes(),
        }
    }

    /// Builder-style stdout setter.
    pub fn with_stdout(mut self, stdout: impl Into<Vec<u8>>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim_end().to_string()
    }
}

/// Runs a command line and collects its result.
///
/// Implementations must capture stdout and stderr completely before
/// returning. An `Err` means the command could not be started at all.
pub trait ShellRunner: std::fmt::Debug {
    fn run(&self, command_line: &str) -> std::io::Result<CommandOutcome>;
}

impl<T: ShellRunner + ?Sized> ShellRunner for Box<T> {
    fn run(&self, command_line: &str) -> std::io::Result<CommandOutcome> {
        (**self).run(command_line)
    }
}
